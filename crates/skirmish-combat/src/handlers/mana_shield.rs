//! Mana Shield
//!
//! Toggled skill. While up, damage is paid from mana first (see
//! [`crate::damage::mana_shield`]) and the region tick drains mana every
//! second.

use skirmish_core::CreatureHandle;
use tracing::debug;

use crate::creature::Conditions;
use crate::damage;
use crate::exchange::Exchange;
use crate::handlers::SkillHandler;
use crate::notice::{Effect, Notice};
use crate::skill::{SkillId, SkillState};

pub struct ManaShield;

impl SkillHandler for ManaShield {
    fn id(&self) -> SkillId {
        SkillId::ManaShield
    }

    fn start(&self, ex: &mut Exchange<'_>, creature: CreatureHandle) -> bool {
        let now = ex.now;
        let Some(c) = ex.creatures.get_mut(creature) else {
            return false;
        };
        let idle_skill = c.skills.active().is_some_and(|s| s.state == SkillState::None);
        if idle_skill || c.is_stunned(now) || c.is_knocked_down(now) {
            debug!("{} can't raise a mana shield right now", c.name);
            return false;
        }

        c.conditions.insert(Conditions::MANA_SHIELD);
        let id = c.id;
        ex.outbox.broadcast(Notice::Effect {
            creature: id,
            effect: Effect::ManaShield(true),
        });
        ex.outbox.broadcast(Notice::SkillStart {
            creature: id,
            skill: SkillId::ManaShield,
        });
        true
    }

    fn stop(&self, ex: &mut Exchange<'_>, creature: CreatureHandle) -> bool {
        let Some(c) = ex.creatures.get_mut(creature) else {
            return false;
        };
        let was_up = c.conditions.contains(Conditions::MANA_SHIELD);
        damage::deactivate_mana_shield(c, ex.outbox);
        was_up
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::TargetOptions;
    use crate::skill::{RankData, Skill, SkillRank};
    use crate::testing::Arena;
    use crate::weapon::DamageRange;
    use glam::Vec2;
    use skirmish_core::Timestamp;

    fn caster(arena: &mut Arena) -> CreatureHandle {
        let c = arena.npc(2, Vec2::new(100.0, 0.0));
        let caster = arena.creature_mut(c);
        caster.mana = 40.0;
        caster.mana_max = 40.0;
        caster.skills.add(
            Skill::new(SkillId::ManaShield, SkillRank::RF)
                .with_data(RankData::new([2.0, 1.0, 0.0, 0.0, 0.0, 0.0])),
        );
        c
    }

    #[test]
    fn test_start_and_stop() {
        let mut arena = Arena::new();
        let c = caster(&mut arena);
        assert!(arena.start(c, SkillId::ManaShield));
        assert!(arena.creature(c).conditions.contains(Conditions::MANA_SHIELD));

        assert!(arena.stop(c, SkillId::ManaShield));
        assert!(!arena.creature(c).conditions.contains(Conditions::MANA_SHIELD));
        let notices = arena.drain();
        assert!(notices
            .iter()
            .any(|(_, n)| matches!(n, Notice::SkillStart { skill: SkillId::ManaShield, .. })));
        assert!(notices
            .iter()
            .any(|(_, n)| matches!(n, Notice::SkillStop { skill: SkillId::ManaShield, .. })));
    }

    #[test]
    fn test_refused_while_stunned() {
        let mut arena = Arena::new();
        let c = caster(&mut arena);
        arena.creature_mut(c).set_stun(Timestamp(0), 1000);
        assert!(!arena.start(c, SkillId::ManaShield));
        assert!(!arena.creature(c).conditions.contains(Conditions::MANA_SHIELD));
    }

    #[test]
    fn test_shield_absorbs_basic_attack() {
        let mut arena = Arena::new();
        let a = arena.player(1, Vec2::ZERO);
        {
            let attacker = arena.creature_mut(a);
            attacker.stats.bare_hand = DamageRange::new(20.0, 20.0);
            attacker
                .skills
                .add(Skill::new(SkillId::CombatMastery, SkillRank::RF));
        }
        let c = caster(&mut arena);
        assert!(arena.start(c, SkillId::ManaShield));

        arena.use_skill(a, SkillId::CombatMastery, c);
        let packs = arena.packs();
        let record = &packs[0].targets[0];
        assert_eq!(record.damage, 0.0);
        assert_eq!(record.mana_damage, 10.0);
        assert!(record.has(TargetOptions::MANA_SHIELD));

        let target = arena.creature(c);
        assert_eq!(target.mana, 30.0);
        assert_eq!(target.life, target.life_max);
    }

    #[test]
    fn test_shield_breaks_when_mana_runs_out() {
        let mut arena = Arena::new();
        let a = arena.player(1, Vec2::ZERO);
        {
            let attacker = arena.creature_mut(a);
            attacker.stats.bare_hand = DamageRange::new(100.0, 100.0);
            attacker
                .skills
                .add(Skill::new(SkillId::CombatMastery, SkillRank::RF));
        }
        let c = caster(&mut arena);
        arena.creature_mut(c).life = 500.0;
        assert!(arena.start(c, SkillId::ManaShield));

        arena.use_skill(a, SkillId::CombatMastery, c);
        let packs = arena.packs();
        let record = &packs[0].targets[0];
        // 100 / 2 = 50 wanted, 40 available
        assert_eq!(record.mana_damage, 40.0);
        assert_eq!(record.damage, 60.0);

        let target = arena.creature(c);
        assert_eq!(target.mana, 0.0);
        assert!(!target.conditions.contains(Conditions::MANA_SHIELD));
    }
}
