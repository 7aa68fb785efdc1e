//! Skirmish Combat - Real-time combat resolution
//!
//! Resolves skill uses between creatures into Combat Action Packs:
//! - Creature combat state, equipment and skills
//! - The damage pipeline (crits, defense, protection, mana shield)
//! - Target lookup and splash selection
//! - Interception, where a defender's ready skill replaces the incoming hit
//! - Skill handlers and the pack commit that applies every outcome at once
//!
//! Regions serialize their exchanges; the [`World`] keeps each region
//! behind its own lock.

pub mod action;
pub mod commit;
pub mod config;
pub mod creature;
pub mod damage;
pub mod dice;
pub mod equipment;
pub mod error;
pub mod events;
pub mod exchange;
pub mod handlers;
pub mod interception;
pub mod notice;
pub mod recovery;
pub mod region;
pub mod skill;
pub mod store;
pub mod stun;
pub mod targeting;
pub mod weapon;
pub mod world;

#[cfg(test)]
pub(crate) mod testing;

pub use action::{
    AttackerAction, AttackerOptions, CombatActionPack, CombatActionType, PackId, TargetAction,
    TargetOptions,
};
pub use config::CombatConfig;
pub use creature::{CombatStats, Conditions, Creature, CreatureKind, Race};
pub use dice::{Dice, ScriptedDice};
pub use equipment::{EquipError, Equipment, Magazine};
pub use error::CombatError;
pub use events::CombatListener;
pub use exchange::Exchange;
pub use handlers::{SkillHandler, SkillRegistry, UseResult, UseTarget};
pub use notice::{Audience, Effect, Notice, Outbox};
pub use region::Region;
pub use skill::{RankData, Skill, SkillId, SkillRank, SkillState};
pub use weapon::{AttackSpeed, DamageRange, SplashArea, Weapon, WeaponGrip, WeaponType};
pub use world::{SharedRegion, World};

pub use skirmish_core::{CreatureHandle, CreatureId, RegionId, Timestamp, Vec2};
