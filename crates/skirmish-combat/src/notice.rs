//! Outbound notices
//!
//! The engine never talks to clients. It queues [`Notice`]s with an
//! [`Audience`] and the protocol layer drains them after each exchange.

use serde::{Deserialize, Serialize};
use skirmish_core::CreatureId;

use crate::action::{CombatActionPack, PackId};
use crate::skill::SkillId;

/// Who a notice is for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Audience {
    /// Only the owner of this creature
    Private(CreatureId),
    /// Everyone in the region that can see the subject
    Region,
}

/// Visual effect toggles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Effect {
    SkillFlash(SkillId),
    ManaShield(bool),
    FireArrow(bool),
}

/// Something the protocol layer should send
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Notice {
    CombatAction(CombatActionPack),
    CombatUsedSkill {
        creature: CreatureId,
        skill: SkillId,
    },
    CombatActionEnd(PackId),
    /// Full vitals, for the owner
    StatUpdate {
        creature: CreatureId,
        life: f32,
        life_max: f32,
        mana: f32,
        stamina: f32,
    },
    /// Life only, for everyone else
    StatUpdatePublic {
        creature: CreatureId,
        life: f32,
        life_max: f32,
    },
    StabilityMeter {
        creature: CreatureId,
        stability: f32,
    },
    SkillPrepare {
        creature: CreatureId,
        skill: SkillId,
        load_time: u32,
    },
    SkillReady {
        creature: CreatureId,
        skill: SkillId,
    },
    SkillComplete {
        creature: CreatureId,
        skill: SkillId,
    },
    SkillCancel {
        creature: CreatureId,
        skill: SkillId,
    },
    SkillUse {
        creature: CreatureId,
        skill: SkillId,
        target: Option<CreatureId>,
    },
    SkillUseStun {
        creature: CreatureId,
        skill: SkillId,
        stun: u32,
    },
    SkillUseSilentCancel {
        creature: CreatureId,
    },
    ResetCooldown {
        creature: CreatureId,
        skill: SkillId,
    },
    SkillStart {
        creature: CreatureId,
        skill: SkillId,
    },
    SkillStop {
        creature: CreatureId,
        skill: SkillId,
    },
    Effect {
        creature: CreatureId,
        effect: Effect,
    },
    Text {
        creature: CreatureId,
        message: String,
    },
    RestStopped {
        creature: CreatureId,
    },
    GotUp {
        creature: CreatureId,
    },
}

/// Queue of notices produced by a region
#[derive(Debug, Clone, Default)]
pub struct Outbox {
    queue: Vec<(Audience, Notice)>,
}

impl Outbox {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a notice for the whole region
    pub fn broadcast(&mut self, notice: Notice) {
        self.queue.push((Audience::Region, notice));
    }

    /// Queue a notice for one creature's owner
    pub fn private(&mut self, creature: CreatureId, notice: Notice) {
        self.queue.push((Audience::Private(creature), notice));
    }

    /// Queue a plain text message
    pub fn text(&mut self, creature: CreatureId, message: impl Into<String>) {
        self.private(
            creature,
            Notice::Text {
                creature,
                message: message.into(),
            },
        );
    }

    /// Take everything queued so far
    pub fn drain(&mut self) -> Vec<(Audience, Notice)> {
        std::mem::take(&mut self.queue)
    }

    pub fn iter(&self) -> impl Iterator<Item = &(Audience, Notice)> {
        self.queue.iter()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}
