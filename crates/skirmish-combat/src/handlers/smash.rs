//! Smash
//!
//! A prepared hard hit that always knocks the target back. Loses to a
//! target already swinging a basic attack at the user, is answered by an
//! NPC's ready Windmill, and settles Smash against Smash by weapon speed.

use skirmish_core::CreatureHandle;
use tracing::debug;

use crate::action::{
    AttackerAction, AttackerOptions, CombatActionPack, CombatActionType, TargetAction,
    TargetOptions,
};
use crate::creature::MIN_STABILITY;
use crate::damage::{self, HitParams};
use crate::exchange::Exchange;
use crate::handlers::counterattack;
use crate::handlers::{SkillHandler, UseResult, UseTarget};
use crate::interception::{self, Arbitration};
use crate::notice::Notice;
use crate::skill::{SkillId, SkillState};
use crate::targeting::{self, TargetLookup};

/// Stun on both sides
const STUN: u32 = 3000;
/// Stun the user takes right after swinging
const AFTER_USE_STUN: u32 = 600;
const TWO_HANDED_DAMAGE: f32 = 1.2;
const TWO_HANDED_CRITICAL: f32 = 1.05;

pub struct Smash;

impl SkillHandler for Smash {
    fn id(&self) -> SkillId {
        SkillId::Smash
    }

    fn use_skill(
        &self,
        ex: &mut Exchange<'_>,
        attacker: CreatureHandle,
        target: UseTarget,
    ) -> UseResult {
        let Some(target_id) = target.entity() else {
            return UseResult::InvalidTarget;
        };
        let target = match targeting::find_target(ex.creatures, target_id, ex.now) {
            TargetLookup::Found(handle) => handle,
            TargetLookup::NotReady(_) => return UseResult::Okay,
            TargetLookup::Missing => return UseResult::InvalidTarget,
        };
        smash(ex, attacker, target)
    }
}

fn smash(ex: &mut Exchange<'_>, a: CreatureHandle, t: CreatureHandle) -> UseResult {
    let Some((attacker, target)) = ex.creatures.pair_mut(a, t) else {
        return UseResult::InvalidTarget;
    };
    if !attacker.ignore_attack_range && !attacker.in_attack_range(target) {
        return UseResult::OutOfRange;
    }
    attacker.ignore_attack_range = false;

    if intercepted(ex, a, t) {
        return UseResult::Okay;
    }
    if let Some(target) = ex.creatures.get_mut(t) {
        target.ignore_attack_range = false;
    }
    if counterattack::try_counter(ex, t, a) {
        return UseResult::Okay;
    }

    hit(ex, a, t);
    UseResult::Okay
}

/// Let the target answer first. Returns `true` when its handler took over.
fn intercepted(ex: &mut Exchange<'_>, a: CreatureHandle, t: CreatureHandle) -> bool {
    let now = ex.now;
    let Some((attacker, target)) = ex.creatures.pair_mut(a, t) else {
        return false;
    };

    if interception::is_swinging_back(now, target, attacker) {
        debug!("{} swings into {}'s Smash", target.name, attacker.name);
        if ex
            .redirect(t, SkillId::CombatMastery, SkillId::Smash, a)
            .is_some()
        {
            return true;
        }
    }

    let Some((attacker, target)) = ex.creatures.pair_mut(a, t) else {
        return false;
    };
    if !attacker.is_player() && target.skills.is_ready(SkillId::Windmill) {
        debug!("{} answers {}'s Smash with Windmill", target.name, attacker.name);
        if ex
            .redirect(t, SkillId::Windmill, SkillId::Smash, a)
            .is_some()
        {
            return true;
        }
    }

    let Some((attacker, target)) = ex.creatures.pair_mut(a, t) else {
        return false;
    };
    if interception::is_smashing_back(now, target, attacker) {
        match interception::arbitrate_smashes(now, attacker, target) {
            Arbitration::TargetWins => {
                if ex
                    .redirect(t, SkillId::Smash, SkillId::Smash, a)
                    .is_some()
                {
                    return true;
                }
            }
            Arbitration::AttackerWins { .. } => {
                attacker.intercepting_skill_id = Some(SkillId::Smash);
            }
        }
    }
    false
}

fn hit(ex: &mut Exchange<'_>, a: CreatureHandle, t: CreatureHandle) {
    let knockback_distance = ex.config.knockback_distance;
    let Some((attacker, target)) = ex.creatures.pair_mut(a, t) else {
        return;
    };
    let Some(skill) = attacker.skills.get(SkillId::Smash) else {
        return;
    };
    let damage_rate = skill.var1() / 100.0;

    let mut attacker_action = AttackerAction::new(
        CombatActionType::HardHit,
        a,
        attacker.id,
        SkillId::Smash,
        Some(target.id),
    );
    attacker_action.set(AttackerOptions::RESULT | AttackerOptions::KNOCK_BACK_HIT2);

    let target_type = if attacker.intercepting_skill_id == Some(SkillId::Smash) {
        CombatActionType::CounteredHit
    } else {
        CombatActionType::TakeHit
    };
    let mut action = TargetAction::new(target_type, t, target.id, a, attacker.id, SkillId::Smash);
    action.set(TargetOptions::RESULT | TargetOptions::SMASH);
    attacker.intercepting_skill_id = None;

    let two_handed = attacker.equipment.has_two_handed();
    let mut base = attacker.rnd_total_damage(&mut *ex.dice) * damage_rate;
    let mut crit_chance = attacker.total_crit_chance(target.stats.protection);
    if two_handed {
        base *= TWO_HANDED_DAMAGE;
        crit_chance *= TWO_HANDED_CRITICAL;
    }

    let outcome = damage::resolve_hit(
        &mut *ex.dice,
        ex.outbox,
        attacker,
        target,
        None,
        &mut action,
        base,
        HitParams::new(crit_chance),
    );
    target.aggro(a);
    if target.is_dead() {
        action.set(TargetOptions::FINISHING_HIT | TargetOptions::FINISHED);
    }

    attacker_action.core.stun = STUN;
    action.core.stun = STUN;
    target.stability = MIN_STABILITY;
    target.shove(attacker.position, knockback_distance);

    attacker.equipment.update_weapon_wear(false);
    if attacker.is_dual_wielding() {
        attacker.equipment.update_weapon_wear(true);
    }
    if let Some(skill) = attacker.skills.get_mut(SkillId::Smash) {
        skill.state = SkillState::Used;
    }

    let attacker_id = attacker.id;
    let target_alive = !target.is_dead();
    debug!(
        "{} smashes {} for {:.1}",
        attacker.name, target.name, outcome.damage
    );

    ex.outbox.broadcast(Notice::SkillUseStun {
        creature: attacker_id,
        skill: SkillId::Smash,
        stun: AFTER_USE_STUN,
    });

    let mut pack = CombatActionPack::new(SkillId::Smash, attacker_action);
    pack.add(action);
    pack.handle(ex);

    if target_alive {
        ex.schedule_get_up(t, STUN + AFTER_USE_STUN);
    }
}
