use skirmish_core::CreatureId;

use crate::equipment::EquipError;
use crate::skill::SkillId;

/// Errors raised by the combat engine
///
/// None of these escape an exchange. They're logged and the exchange
/// degrades to a no-op or skips the failing step.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CombatError {
    #[error("No handler registered for {0:?}")]
    HandlerNotFound(SkillId),

    #[error("Creature {creature} is missing skill {skill:?}")]
    MissingSkill { creature: CreatureId, skill: SkillId },

    #[error("Unknown creature {0}")]
    UnknownCreature(CreatureId),

    #[error("Creature {0} already exists in this region")]
    DuplicateCreature(CreatureId),

    #[error(transparent)]
    Equip(#[from] EquipError),
}
