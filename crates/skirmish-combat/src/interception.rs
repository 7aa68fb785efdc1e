//! Simultaneous attack arbitration
//!
//! When two creatures swing at each other in the same instant, exactly one
//! side's handler gets to resolve first. The loser's call either returns
//! without a pack (target wins, its own handler runs instead) or continues
//! as the interceptor.

use skirmish_core::Timestamp;
use tracing::debug;

use crate::creature::Creature;
use crate::dice::Dice;
use crate::skill::SkillId;
use crate::stun;

/// Outcome of an arbitration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arbitration {
    /// The target's handler runs against the attacker
    TargetWins,
    /// The attacker proceeds. `clean` is false when the target also lands
    /// its own hit first.
    AttackerWins { clean: bool },
}

/// Probability that the target wins when its weapon is faster
///
/// Falls linearly from ~1 at 225ms attacker stun. Clamped to `[0, 1]`.
pub fn target_win_probability(attacker_stun: u32) -> f32 {
    ((2725.0 - attacker_stun as f32) / 2500.0).clamp(0.0, 1.0)
}

/// Stun a creature's right hand would take as attacker
pub fn swing_stun(creature: &Creature) -> u32 {
    stun::attacker_stun(creature.hit_count(), creature.attack_speed(), false)
}

/// Whether `victim` was most recently knocked down by `by` and is still
/// inside that knockdown's stun window.
fn recently_knocked_down_by(
    now: Timestamp,
    victim: &Creature,
    victim_stun: u32,
    by: &Creature,
) -> bool {
    victim.last_knocked_back_by == Some(by.handle)
        && victim.knock_down_time > by.knock_down_time
        && now < victim.knock_down_time + victim_stun as u64
}

/// Knockdown tie-break: the side most recently knocked down by the other
/// loses outright.
pub fn knockdown_tie_break(
    now: Timestamp,
    attacker: &Creature,
    attacker_stun: u32,
    target: &Creature,
    target_stun: u32,
) -> Option<Arbitration> {
    if recently_knocked_down_by(now, target, target_stun, attacker) {
        return Some(Arbitration::AttackerWins { clean: true });
    }
    if recently_knocked_down_by(now, attacker, attacker_stun, target) {
        return Some(Arbitration::TargetWins);
    }
    None
}

/// Arbitrate basic attack against basic attack.
pub fn arbitrate_basic_attacks(
    dice: &mut dyn Dice,
    now: Timestamp,
    attacker: &Creature,
    target: &Creature,
) -> Arbitration {
    let attacker_stun = swing_stun(attacker);
    let target_stun = swing_stun(target);

    if let Some(decision) = knockdown_tie_break(now, attacker, attacker_stun, target, target_stun) {
        debug!(
            "{} vs {}: knockdown tie-break, {:?}",
            attacker.name, target.name, decision
        );
        return decision;
    }

    let p = target_win_probability(attacker_stun);
    if attacker_stun > target_stun && dice.chance(p) {
        debug!(
            "{} vs {}: target intercepts ({}ms > {}ms, p={:.2})",
            attacker.name, target.name, attacker_stun, target_stun, p
        );
        return Arbitration::TargetWins;
    }

    let clean = dice.chance(p);
    debug!(
        "{} vs {}: attacker intercepts, clean={}",
        attacker.name, target.name, clean
    );
    Arbitration::AttackerWins { clean }
}

/// Arbitrate Smash against Smash. Deterministic.
pub fn arbitrate_smashes(now: Timestamp, attacker: &Creature, target: &Creature) -> Arbitration {
    let attacker_stun = swing_stun(attacker);
    let target_stun = swing_stun(target);

    if let Some(decision) = knockdown_tie_break(now, attacker, attacker_stun, target, target_stun) {
        return decision;
    }
    if attacker_stun > target_stun {
        Arbitration::TargetWins
    } else {
        Arbitration::AttackerWins { clean: true }
    }
}

/// The target is in the middle of its own basic attack on the attacker and
/// could answer with it.
pub fn is_swinging_back(now: Timestamp, target: &Creature, attacker: &Creature) -> bool {
    target.skills.has(SkillId::CombatMastery)
        && target.skills.allows_basic_attack()
        && target.in_battle_stance
        && target.target == Some(attacker.handle)
        && target.attempting_attack
        && (!target.is_stunned(now) || target.is_knocked_down(now))
}

/// The target has a ready Smash aimed at the attacker.
pub fn is_smashing_back(now: Timestamp, target: &Creature, attacker: &Creature) -> bool {
    target.skills.is_ready(SkillId::Smash)
        && target.in_battle_stance
        && target.target == Some(attacker.handle)
        && !target.is_stunned(now)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::creature::CreatureKind;
    use crate::dice::ScriptedDice;
    use crate::skill::{Skill, SkillRank};
    use crate::weapon::{AttackSpeed, DamageRange, Weapon, WeaponType};
    use skirmish_core::{CreatureHandle, CreatureId};

    fn fighter(index: u32, speed: AttackSpeed) -> Creature {
        let mut c = Creature::new(CreatureId(index as u64 + 1), format!("f{index}"), CreatureKind::Npc);
        c.handle = CreatureHandle::from_raw(index, 0);
        let mut weapon = Weapon::new("Blade", WeaponType::Sword, DamageRange::new(10.0, 10.0));
        weapon.attack_speed = speed;
        c.equipment.equip_right(weapon).unwrap();
        c
    }

    #[test]
    fn test_probability_shape() {
        assert!((target_win_probability(225) - 1.0).abs() < 1e-6);
        assert!((target_win_probability(2500) - 0.09).abs() < 1e-4);
        assert_eq!(target_win_probability(0), 1.0);
        assert_eq!(target_win_probability(5000), 0.0);

        let mut last = f32::MAX;
        for stun in (0..=3000).step_by(25) {
            let p = target_win_probability(stun);
            assert!(p <= last, "not monotonic at {}", stun);
            assert!((0.0..=1.0).contains(&p));
            last = p;
        }
    }

    #[test]
    fn test_slow_attacker_loses_to_fast_target() {
        let attacker = fighter(0, AttackSpeed::VerySlow);
        let target = fighter(1, AttackSpeed::VeryFast);
        // p = (2725 - 1000) / 2500 = 0.69
        let mut dice = ScriptedDice::new(0.5);
        assert_eq!(
            arbitrate_basic_attacks(&mut dice, Timestamp(0), &attacker, &target),
            Arbitration::TargetWins
        );
    }

    #[test]
    fn test_faster_attacker_always_proceeds() {
        let attacker = fighter(0, AttackSpeed::VeryFast);
        let target = fighter(1, AttackSpeed::VerySlow);
        // p = (2725 - 450) / 2500 = 0.91
        let mut dice = ScriptedDice::new(0.95);
        assert_eq!(
            arbitrate_basic_attacks(&mut dice, Timestamp(0), &attacker, &target),
            Arbitration::AttackerWins { clean: false }
        );
        let mut dice = ScriptedDice::new(0.1);
        assert_eq!(
            arbitrate_basic_attacks(&mut dice, Timestamp(0), &attacker, &target),
            Arbitration::AttackerWins { clean: true }
        );
    }

    #[test]
    fn test_knockdown_tie_break_beats_probability() {
        let mut attacker = fighter(0, AttackSpeed::VeryFast);
        let target = fighter(1, AttackSpeed::VerySlow);
        attacker.last_knocked_back_by = Some(target.handle);
        attacker.knock_down_time = Timestamp(1000);

        let mut dice = ScriptedDice::new(0.0);
        assert_eq!(
            arbitrate_basic_attacks(&mut dice, Timestamp(1200), &attacker, &target),
            Arbitration::TargetWins
        );
        // Window over
        assert_ne!(
            arbitrate_basic_attacks(&mut dice, Timestamp(10_000), &attacker, &target),
            Arbitration::TargetWins
        );
    }

    #[test]
    fn test_smash_arbitration_is_deterministic() {
        let slow = fighter(0, AttackSpeed::VerySlow);
        let fast = fighter(1, AttackSpeed::VeryFast);
        assert_eq!(arbitrate_smashes(Timestamp(0), &slow, &fast), Arbitration::TargetWins);
        assert_eq!(
            arbitrate_smashes(Timestamp(0), &fast, &slow),
            Arbitration::AttackerWins { clean: true }
        );
    }

    #[test]
    fn test_swinging_back_conditions() {
        let attacker = fighter(0, AttackSpeed::Normal);
        let mut target = fighter(1, AttackSpeed::Normal);
        target.skills.add(Skill::new(SkillId::CombatMastery, SkillRank::RF));
        assert!(!is_swinging_back(Timestamp(0), &target, &attacker));

        target.in_battle_stance = true;
        target.target = Some(attacker.handle);
        target.attempting_attack = true;
        assert!(is_swinging_back(Timestamp(0), &target, &attacker));

        target.set_stun(Timestamp(0), 500);
        assert!(!is_swinging_back(Timestamp(100), &target, &attacker));
    }
}
