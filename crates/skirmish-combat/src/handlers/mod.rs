//! Skill handlers
//!
//! Each skill id maps to one [`SkillHandler`] in the [`SkillRegistry`]. The
//! region drives skill state (preparing, ready, used) and calls into the
//! handler for side effects and for resolving a use.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use skirmish_core::{CreatureHandle, CreatureId};

use crate::exchange::Exchange;
use crate::notice::{Effect, Notice};
use crate::skill::SkillId;

pub mod combat_mastery;
pub mod counterattack;
pub mod defense;
pub mod magnum_shot;
pub mod mana_shield;
pub mod smash;
pub mod windmill;

pub use combat_mastery::CombatMastery;
pub use counterattack::Counterattack;
pub use defense::Defense;
pub use magnum_shot::MagnumShot;
pub use mana_shield::ManaShield;
pub use smash::Smash;
pub use windmill::Windmill;

/// Result of using a skill
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UseResult {
    Okay,
    OutOfRange,
    InvalidTarget,
}

/// What a skill is used on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UseTarget {
    Entity(CreatureId),
    /// Ground-targeted or self-centred area
    Area(u64),
}

impl UseTarget {
    pub fn entity(self) -> Option<CreatureId> {
        match self {
            Self::Entity(id) => Some(id),
            Self::Area(_) => None,
        }
    }
}

/// One skill's behaviour
///
/// Defaults send the standard notices and accept every transition, so a
/// handler only overrides what its skill does differently.
pub trait SkillHandler: Send + Sync {
    fn id(&self) -> SkillId;

    /// Start preparing. Returning `false` rejects the preparation.
    fn prepare(&self, ex: &mut Exchange<'_>, creature: CreatureHandle) -> bool {
        send_prepare(ex, creature, self.id());
        true
    }

    /// Preparation finished. Returning `false` rejects it.
    fn ready(&self, ex: &mut Exchange<'_>, creature: CreatureHandle) -> bool {
        if let Some(c) = ex.creatures.get(creature) {
            ex.outbox.broadcast(Notice::SkillReady {
                creature: c.id,
                skill: self.id(),
            });
        }
        true
    }

    /// Resolve a use against `target`
    fn use_skill(
        &self,
        _ex: &mut Exchange<'_>,
        _attacker: CreatureHandle,
        _target: UseTarget,
    ) -> UseResult {
        UseResult::InvalidTarget
    }

    /// The skill finished its animation
    fn complete(&self, ex: &mut Exchange<'_>, creature: CreatureHandle) {
        if let Some(c) = ex.creatures.get(creature) {
            ex.outbox.broadcast(Notice::SkillComplete {
                creature: c.id,
                skill: self.id(),
            });
        }
    }

    /// The skill was cancelled
    fn cancel(&self, _ex: &mut Exchange<'_>, _creature: CreatureHandle) {}

    /// Toggle on, for skills that stay active. Returns `false` when refused.
    fn start(&self, _ex: &mut Exchange<'_>, _creature: CreatureHandle) -> bool {
        false
    }

    /// Toggle off
    fn stop(&self, _ex: &mut Exchange<'_>, _creature: CreatureHandle) -> bool {
        false
    }

    /// Cancel this skill after its owner was knocked back. Returns `true`
    /// when the handler took care of it; the default cancel runs otherwise.
    fn custom_hit_cancel(&self, _ex: &mut Exchange<'_>, _creature: CreatureHandle) -> bool {
        false
    }
}

/// Flash effect plus the prepare notice
pub(crate) fn send_prepare(ex: &mut Exchange<'_>, creature: CreatureHandle, skill: SkillId) {
    let Some(c) = ex.creatures.get(creature) else {
        return;
    };
    let load_time = c.skills.get(skill).map(|s| s.data.load_time).unwrap_or(0);
    let id = c.id;
    ex.outbox.broadcast(Notice::Effect {
        creature: id,
        effect: Effect::SkillFlash(skill),
    });
    ex.outbox.broadcast(Notice::SkillPrepare {
        creature: id,
        skill,
        load_time,
    });
}

/// Skill id -> handler
#[derive(Clone, Default)]
pub struct SkillRegistry {
    handlers: HashMap<SkillId, Arc<dyn SkillHandler>>,
}

impl SkillRegistry {
    /// Empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every built-in combat skill
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(CombatMastery);
        registry.register(Smash);
        registry.register(Defense);
        registry.register(Counterattack);
        registry.register(Windmill);
        registry.register(MagnumShot);
        registry.register(ManaShield);
        registry
    }

    /// Register a handler, replacing any previous one for the same id
    pub fn register<H: SkillHandler + 'static>(&mut self, handler: H) {
        self.handlers.insert(handler.id(), Arc::new(handler));
    }

    pub fn get(&self, id: SkillId) -> Option<&Arc<dyn SkillHandler>> {
        self.handlers.get(&id)
    }

    pub fn contains(&self, id: SkillId) -> bool {
        self.handlers.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl std::fmt::Debug for SkillRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_set().entries(self.handlers.keys()).finish()
    }
}
