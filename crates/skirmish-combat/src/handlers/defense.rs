//! Defense
//!
//! Nothing happens on use. A ready Defense is consumed by the damage
//! pipeline when a defendable hit comes in (see
//! [`crate::damage::active_defense`]).

use crate::handlers::SkillHandler;
use crate::skill::SkillId;

pub struct Defense;

impl SkillHandler for Defense {
    fn id(&self) -> SkillId {
        SkillId::Defense
    }
}
