//! Hooks for collaborators outside combat
//!
//! Training, titles and NPC AI react to exchanges through [`CombatListener`].
//! Combat calls them while committing a pack and ignores what they do.

use crate::action::{AttackerAction, CombatActionPack, TargetAction};
use crate::creature::Creature;

/// Observer of committed combat actions
///
/// Every method has an empty default so listeners only implement what they
/// care about.
pub trait CombatListener: Send + Sync {
    /// A creature was hit
    fn on_creature_attacked(&self, _pack: &CombatActionPack, _action: &TargetAction) {}

    /// A creature hit something
    fn on_creature_attacks(&self, _pack: &CombatActionPack, _action: &AttackerAction) {}

    /// An NPC was hit, for its AI
    fn on_hit(&self, _npc: &Creature, _action: &TargetAction) {}

    /// An NPC used a skill other than its basic attack, for its AI
    fn on_used_skill(&self, _npc: &Creature, _action: &AttackerAction) {}
}
