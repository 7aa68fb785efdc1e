//! Damage pipeline
//!
//! Stages applied in order to a rolled damage value and the target record:
//! critical hit -> defense/protection -> active defense -> mana shield ->
//! application. Skills roll their own base damage and multipliers, then hand
//! over to [`resolve_hit`].

use tracing::debug;

use crate::action::{AttackerAction, CombatActionType, TargetAction, TargetOptions};
use crate::creature::{Conditions, Creature};
use crate::dice::Dice;
use crate::notice::{Effect, Notice, Outbox};
use crate::skill::SkillId;

/// Stun on a creature that blocked with Defense
pub const DEFENDED_TARGET_STUN: u32 = 1000;
/// Stun on an attacker whose hit was blocked
pub const DEFENDED_ATTACKER_STUN: u32 = 2500;

/// How a single hit should be resolved
#[derive(Debug, Clone, Copy)]
pub struct HitParams {
    /// Critical chance in percent
    pub crit_chance: f32,
    /// Use this critical outcome instead of rolling (splash hits)
    pub inherited_crit: Option<bool>,
    /// Multiplier applied after the critical stage (splash reduction)
    pub multiplier: f32,
    /// Whether a ready Defense can block this hit
    pub defendable: bool,
}

impl HitParams {
    pub fn new(crit_chance: f32) -> Self {
        Self {
            crit_chance,
            inherited_crit: None,
            multiplier: 1.0,
            defendable: false,
        }
    }

    pub fn defendable(mut self) -> Self {
        self.defendable = true;
        self
    }

    /// Splash hit sharing the primary hit's critical outcome
    pub fn splash(mut self, critical: bool, multiplier: f32) -> Self {
        self.inherited_crit = Some(critical);
        self.multiplier = multiplier;
        self
    }
}

/// What a resolved hit did
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HitOutcome {
    /// Damage after the critical stage, before mitigation
    pub max_damage: f32,
    /// Life damage actually applied
    pub damage: f32,
    pub critical: bool,
    pub defended: bool,
}

/// Roll for a critical hit and scale `damage` on success.
///
/// Only creatures with Critical Hit can land criticals; the roll is skipped
/// for everyone else.
pub fn critical_hit(
    dice: &mut dyn Dice,
    attacker: &Creature,
    chance: f32,
    damage: &mut f32,
    action: &mut TargetAction,
) -> bool {
    if !attacker.skills.has(SkillId::CriticalHit) {
        return false;
    }
    if !dice.percent(chance) {
        return false;
    }
    apply_critical_bonus(attacker, damage, action);
    true
}

/// Scale `damage` by the attacker's critical bonus and flag the record.
pub fn apply_critical_bonus(attacker: &Creature, damage: &mut f32, action: &mut TargetAction) {
    let bonus = attacker
        .skills
        .get(SkillId::CriticalHit)
        .map(|s| s.var1() / 100.0)
        .unwrap_or(0.0);
    *damage += *damage * bonus;
    action.set(TargetOptions::CRITICAL);
}

/// Subtract flat protection and apply percentage defense, floored at zero.
pub fn defense_protection(target: &Creature, damage: f32) -> f32 {
    let reduced = (damage - target.stats.protection).max(0.0);
    (reduced * (1.0 - target.stats.defense / 100.0)).max(0.0)
}

/// Block with a ready Defense skill.
///
/// Reduces damage by the skill's rank amount, reclassifies the record as
/// defended and consumes the skill. The attacker record is only touched for
/// direct hits; splash hits pass `None`.
pub fn active_defense(
    target: &mut Creature,
    attacker_action: Option<&mut AttackerAction>,
    action: &mut TargetAction,
    damage: &mut f32,
) -> bool {
    if !target.skills.is_ready(SkillId::Defense) {
        return false;
    }

    let reduction = target
        .skills
        .get(SkillId::Defense)
        .map(|s| s.var1())
        .unwrap_or(0.0);
    *damage = (*damage - reduction).max(0.0);

    action.core.action_type = CombatActionType::Defended;
    action.core.stun = DEFENDED_TARGET_STUN;
    if let Some(attacker_action) = attacker_action {
        attacker_action.core.stun = DEFENDED_ATTACKER_STUN;
    }

    target.skills.clear_active();
    debug!("{} defended, damage reduced to {}", target.name, damage);
    true
}

/// Divert damage to mana while the shield is up.
///
/// `max_damage` is the pre-mitigation damage. The shield drops when mana
/// runs out.
pub fn mana_shield(
    target: &mut Creature,
    damage: &mut f32,
    action: &mut TargetAction,
    max_damage: f32,
    outbox: &mut Outbox,
) {
    if !target.conditions.contains(Conditions::MANA_SHIELD) {
        return;
    }

    let efficiency = target
        .skills
        .get(SkillId::ManaShield)
        .map(|s| s.var1())
        .filter(|&e| e > 0.0)
        .unwrap_or(1.0);

    let bonus = target.equipment.shield_melee_passive_bonus();
    let mut mana_damage = ((max_damage - bonus) / efficiency).max(0.0);
    if target.mana >= mana_damage {
        *damage = 0.0;
    } else {
        mana_damage = target.mana;
        *damage = (*damage - mana_damage).max(1.0);
    }

    // A lethal hit always deals something
    if *damage <= 0.0 && target.life <= 0.0 {
        *damage = 1.0;
    }

    target.mana = (target.mana - mana_damage).max(0.0);
    if target.mana <= 0.0 {
        deactivate_mana_shield(target, outbox);
    }

    action.mana_damage = mana_damage;
}

/// Drop the mana shield condition and tell the region
pub fn deactivate_mana_shield(target: &mut Creature, outbox: &mut Outbox) {
    if !target.conditions.contains(Conditions::MANA_SHIELD) {
        return;
    }
    target.conditions.remove(Conditions::MANA_SHIELD);
    outbox.broadcast(Notice::Effect {
        creature: target.id,
        effect: Effect::ManaShield(false),
    });
    outbox.broadcast(Notice::SkillStop {
        creature: target.id,
        skill: SkillId::ManaShield,
    });
}

/// Subtract life. Marks the record finishing when this hit kills.
pub fn apply_damage(target: &mut Creature, action: &mut TargetAction, damage: f32) {
    let life_before = target.life;
    if damage > 0.0 {
        target.take_damage(damage);
        action.damage = damage;
    }
    if life_before > 0.0 && target.life <= 0.0 {
        action.set(TargetOptions::FINISHING_HIT);
    }
}

/// Run every stage after the base roll.
#[allow(clippy::too_many_arguments)]
pub fn resolve_hit(
    dice: &mut dyn Dice,
    outbox: &mut Outbox,
    attacker: &Creature,
    target: &mut Creature,
    attacker_action: Option<&mut AttackerAction>,
    action: &mut TargetAction,
    base_damage: f32,
    params: HitParams,
) -> HitOutcome {
    let mut damage = base_damage.max(0.0);

    let critical = match params.inherited_crit {
        Some(true) => {
            apply_critical_bonus(attacker, &mut damage, action);
            true
        }
        Some(false) => false,
        None => critical_hit(dice, attacker, params.crit_chance, &mut damage, action),
    };

    damage *= params.multiplier;
    let max_damage = damage;

    damage = defense_protection(target, damage);

    let defended = params.defendable && active_defense(target, attacker_action, action, &mut damage);

    mana_shield(target, &mut damage, action, max_damage, outbox);
    apply_damage(target, action, damage);

    HitOutcome {
        max_damage,
        damage: damage.max(0.0),
        critical,
        defended,
    }
}

/// Undo a defended classification after a lethal hit
pub fn revert_defense_if_lethal(target: &Creature, action: &mut TargetAction, fallback: CombatActionType) {
    if action.is_defended() && target.is_dead() {
        action.core.action_type = fallback;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::creature::CreatureKind;
    use crate::dice::ScriptedDice;
    use crate::skill::{Skill, SkillRank, SkillState};
    use skirmish_core::{CreatureHandle, CreatureId};

    fn pair() -> (Creature, Creature) {
        let mut attacker = Creature::new(CreatureId(1), "Attacker", CreatureKind::Player);
        attacker.handle = CreatureHandle::from_raw(0, 0);
        let mut target =
            Creature::new(CreatureId(2), "Target", CreatureKind::Npc).with_vitals(1000.0, 40.0, 10.0);
        target.handle = CreatureHandle::from_raw(1, 0);
        (attacker, target)
    }

    fn record(attacker: &Creature, target: &Creature) -> TargetAction {
        TargetAction::new(
            CombatActionType::TakeHit,
            target.handle,
            target.id,
            attacker.handle,
            attacker.id,
            SkillId::CombatMastery,
        )
    }

    #[test]
    fn test_plain_hit_applies_roll() {
        let (attacker, mut target) = pair();
        let mut action = record(&attacker, &target);
        let mut dice = ScriptedDice::new(0.0);
        let mut outbox = Outbox::new();

        let outcome = resolve_hit(
            &mut dice,
            &mut outbox,
            &attacker,
            &mut target,
            None,
            &mut action,
            50.0,
            HitParams::new(100.0).defendable(),
        );

        assert_eq!(outcome.damage, 50.0);
        assert!(!outcome.critical);
        assert!(!outcome.defended);
        assert_eq!(target.life, 950.0);
        assert_eq!(action.damage, 50.0);
    }

    #[test]
    fn test_critical_requires_skill() {
        let (mut attacker, target) = pair();
        let mut action = record(&attacker, &target);
        let mut dice = ScriptedDice::new(0.0);
        let mut damage = 100.0;

        assert!(!critical_hit(&mut dice, &attacker, 100.0, &mut damage, &mut action));
        assert_eq!(damage, 100.0);

        let mut crit = Skill::new(SkillId::CriticalHit, SkillRank::R1);
        crit.data.vars[0] = 50.0;
        attacker.skills.add(crit);
        assert!(critical_hit(&mut dice, &attacker, 100.0, &mut damage, &mut action));
        assert_eq!(damage, 150.0);
        assert!(action.has(TargetOptions::CRITICAL));
    }

    #[test]
    fn test_protection_and_defense_floor() {
        let (_, mut target) = pair();
        target.stats.protection = 10.0;
        target.stats.defense = 50.0;
        assert_eq!(defense_protection(&target, 30.0), 10.0);
        assert_eq!(defense_protection(&target, 5.0), 0.0);
    }

    #[test]
    fn test_active_defense_blocks_and_consumes() {
        let (attacker, mut target) = pair();
        let mut defense = Skill::new(SkillId::Defense, SkillRank::R1);
        defense.data.vars[0] = 30.0;
        target.skills.add(defense);
        target.skills.activate(SkillId::Defense, SkillState::Ready);

        let mut action = record(&attacker, &target);
        let mut attacker_action = AttackerAction::new(
            CombatActionType::Hit,
            attacker.handle,
            attacker.id,
            SkillId::CombatMastery,
            Some(target.id),
        );
        let mut damage = 20.0;
        assert!(active_defense(&mut target, Some(&mut attacker_action), &mut action, &mut damage));
        assert_eq!(damage, 0.0);
        assert!(action.is_defended());
        assert_eq!(attacker_action.core.stun, DEFENDED_ATTACKER_STUN);
        assert!(!target.skills.is_ready(SkillId::Defense));
    }

    #[test]
    fn test_mana_shield_partial_drain() {
        let (_, mut target) = pair();
        let mut shield = Skill::new(SkillId::ManaShield, SkillRank::R1);
        shield.data.vars[0] = 2.0;
        target.skills.add(shield);
        target.conditions.insert(Conditions::MANA_SHIELD);
        target.mana = 40.0;

        let attacker = pair().0;
        let mut action = record(&attacker, &target);
        let mut outbox = Outbox::new();
        let mut damage = 100.0;
        mana_shield(&mut target, &mut damage, &mut action, 100.0, &mut outbox);

        assert_eq!(action.mana_damage, 40.0);
        assert_eq!(damage, 60.0);
        assert_eq!(target.mana, 0.0);
        assert!(!target.conditions.contains(Conditions::MANA_SHIELD));
        assert!(!outbox.is_empty());
    }

    #[test]
    fn test_mana_shield_absorbs_everything() {
        let (attacker, mut target) = pair();
        let mut shield = Skill::new(SkillId::ManaShield, SkillRank::R1);
        shield.data.vars[0] = 2.0;
        target.skills.add(shield);
        target.conditions.insert(Conditions::MANA_SHIELD);
        target.mana = 40.0;

        let mut action = record(&attacker, &target);
        let mut outbox = Outbox::new();
        let mut damage = 30.0;
        mana_shield(&mut target, &mut damage, &mut action, 30.0, &mut outbox);

        assert_eq!(damage, 0.0);
        assert_eq!(action.mana_damage, 15.0);
        assert_eq!(target.mana, 25.0);
        assert!(target.conditions.contains(Conditions::MANA_SHIELD));
    }

    #[test]
    fn test_finishing_flag_on_kill() {
        let (attacker, mut target) = pair();
        target.life = 30.0;
        let mut action = record(&attacker, &target);
        apply_damage(&mut target, &mut action, 30.0);
        assert!(action.has(TargetOptions::FINISHING_HIT));

        let mut again = record(&attacker, &target);
        apply_damage(&mut target, &mut again, 10.0);
        assert!(!again.has(TargetOptions::FINISHING_HIT));
    }

    #[test]
    fn test_damage_never_negative() {
        let (attacker, mut target) = pair();
        target.stats.protection = 500.0;
        let mut action = record(&attacker, &target);
        let mut dice = ScriptedDice::new(0.9);
        let mut outbox = Outbox::new();
        let outcome = resolve_hit(
            &mut dice,
            &mut outbox,
            &attacker,
            &mut target,
            None,
            &mut action,
            40.0,
            HitParams::new(0.0),
        );
        assert_eq!(outcome.damage, 0.0);
        assert_eq!(target.life, 1000.0);
    }
}
