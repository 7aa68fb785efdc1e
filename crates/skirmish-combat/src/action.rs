//! Combat action records
//!
//! One exchange produces one [`CombatActionPack`]: exactly one attacker record
//! plus a target record per creature that was hit.

use std::sync::atomic::{AtomicU64, Ordering};

use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use skirmish_core::{CreatureHandle, CreatureId};

use crate::skill::SkillId;

/// Animation tag of a single record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CombatActionType {
    Hit,
    TakeHit,
    SimultaneousHit,
    CounteredHit,
    CounteredHit2,
    Defended,
    HardHit,
    RangeHit,
    SpecialHit,
}

bitflags! {
    /// Extra information on an attacker record
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct AttackerOptions: u8 {
        const RESULT = 1 << 0;
        const DUAL_WIELD = 1 << 1;
        const KNOCK_BACK_HIT1 = 1 << 2;
        const KNOCK_BACK_HIT2 = 1 << 3;
        const MISSED = 1 << 4;
        const FIRST_HIT = 1 << 5;
    }
}

bitflags! {
    /// Extra information on a target record
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct TargetOptions: u16 {
        const RESULT = 1 << 0;
        const CRITICAL = 1 << 1;
        const CLEAN_HIT = 1 << 2;
        const KNOCK_BACK = 1 << 3;
        const KNOCK_DOWN = 1 << 4;
        const SMASH = 1 << 5;
        const FINISHING_HIT = 1 << 6;
        const FINISHED = 1 << 7;
        const KNOCK_DOWN_FINISH = 1 << 8;
        const MANA_SHIELD = 1 << 9;
        const FINISHING_KNOCK_DOWN = Self::FINISHING_HIT.bits() | Self::KNOCK_DOWN.bits();
    }
}

/// Fields shared by attacker and target records
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionCore {
    pub creature: CreatureHandle,
    pub creature_id: CreatureId,
    pub action_type: CombatActionType,
    pub skill_id: SkillId,
    /// Stun in milliseconds
    pub stun: u32,
}

/// What the attacker did
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttackerAction {
    pub core: ActionCore,
    pub options: AttackerOptions,
    /// Entity id of the primary target
    pub target_id: Option<CreatureId>,
    /// Area id for ground-targeted skills
    pub target_area: Option<u64>,
}

impl AttackerAction {
    pub fn new(
        action_type: CombatActionType,
        creature: CreatureHandle,
        creature_id: CreatureId,
        skill_id: SkillId,
        target_id: Option<CreatureId>,
    ) -> Self {
        Self {
            core: ActionCore {
                creature,
                creature_id,
                action_type,
                skill_id,
                stun: 0,
            },
            options: AttackerOptions::empty(),
            target_id,
            target_area: None,
        }
    }

    /// The hit sent the target flying
    pub fn is_knock_back(&self) -> bool {
        self.options
            .intersects(AttackerOptions::KNOCK_BACK_HIT1 | AttackerOptions::KNOCK_BACK_HIT2)
    }

    pub fn set(&mut self, options: AttackerOptions) {
        self.options.insert(options);
    }
}

/// What happened to one target
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetAction {
    pub core: ActionCore,
    pub options: TargetOptions,
    pub attacker: CreatureHandle,
    pub attacker_id: CreatureId,
    /// Skill the attacker used
    pub attacker_skill_id: SkillId,
    pub damage: f32,
    pub mana_damage: f32,
    /// Animation delay in milliseconds
    pub delay: u32,
}

impl TargetAction {
    pub fn new(
        action_type: CombatActionType,
        creature: CreatureHandle,
        creature_id: CreatureId,
        attacker: CreatureHandle,
        attacker_id: CreatureId,
        skill_id: SkillId,
    ) -> Self {
        Self {
            core: ActionCore {
                creature,
                creature_id,
                action_type,
                skill_id,
                stun: 0,
            },
            options: TargetOptions::empty(),
            attacker,
            attacker_id,
            attacker_skill_id: skill_id,
            damage: 0.0,
            mana_damage: 0.0,
            delay: 0,
        }
    }

    /// The hit knocked this target back or down
    pub fn is_knock_back(&self) -> bool {
        self.options.intersects(
            TargetOptions::KNOCK_DOWN_FINISH
                | TargetOptions::SMASH
                | TargetOptions::KNOCK_BACK
                | TargetOptions::KNOCK_DOWN
                | TargetOptions::FINISHED,
        )
    }

    pub fn is_defended(&self) -> bool {
        self.core.action_type == CombatActionType::Defended
    }

    pub fn set(&mut self, options: TargetOptions) {
        self.options.insert(options);
    }

    pub fn has(&self, options: TargetOptions) -> bool {
        self.options.contains(options)
    }
}

/// Process-wide combat action id
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PackId(pub u64);

static NEXT_PACK_ID: AtomicU64 = AtomicU64::new(1);

impl PackId {
    /// Next id, strictly greater than every id handed out before
    pub fn next() -> Self {
        Self(NEXT_PACK_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// Everything one skill use did, broadcast as a unit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombatActionPack {
    pub id: PackId,
    /// Previous pack of the same combo (dual-wield second hit)
    pub prev_id: Option<PackId>,
    pub hit: u8,
    pub max_hits: u8,
    pub skill_id: SkillId,
    pub attacker: AttackerAction,
    pub targets: Vec<TargetAction>,
}

impl CombatActionPack {
    /// Start a pack around the attacker record
    pub fn new(skill_id: SkillId, attacker: AttackerAction) -> Self {
        Self {
            id: PackId::next(),
            prev_id: None,
            hit: 1,
            max_hits: 1,
            skill_id,
            attacker,
            targets: Vec::new(),
        }
    }

    /// Mark this pack as hit `hit` of `max_hits`, following `prev_id`
    pub fn with_hits(mut self, hit: u8, max_hits: u8, prev_id: Option<PackId>) -> Self {
        self.hit = hit;
        self.max_hits = max_hits;
        self.prev_id = prev_id.filter(|&prev| prev < self.id);
        self
    }

    pub fn add(&mut self, target: TargetAction) {
        self.targets.push(target);
    }

    /// Number of records, attacker included
    pub fn record_count(&self) -> usize {
        1 + self.targets.len()
    }
}
