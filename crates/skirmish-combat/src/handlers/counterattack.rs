//! Counterattack
//!
//! Never used directly. A ready Counterattack answers the next melee hit
//! aimed at its owner before that hit lands.

use skirmish_core::CreatureHandle;
use tracing::debug;

use crate::action::{
    AttackerAction, AttackerOptions, CombatActionPack, CombatActionType, TargetAction,
    TargetOptions,
};
use crate::creature::{Conditions, MIN_STABILITY};
use crate::damage::{self, HitParams};
use crate::exchange::Exchange;
use crate::handlers::{send_prepare, SkillHandler};
use crate::notice::Notice;
use crate::skill::{SkillId, SkillState};

/// Stun on both sides of a counter
const STUN: u32 = 3000;
/// Counterer stun for players under renewal rules
const RENEWAL_PLAYER_STUN: u32 = 2000;
/// Cooldown under renewal rules (ms)
const RENEWAL_COOLDOWN: u64 = 7000;

pub struct Counterattack;

impl SkillHandler for Counterattack {
    fn id(&self) -> SkillId {
        SkillId::Counterattack
    }

    fn prepare(&self, ex: &mut Exchange<'_>, creature: CreatureHandle) -> bool {
        send_prepare(ex, creature, SkillId::Counterattack);
        if let Some(c) = ex.creatures.get_mut(creature) {
            c.conditions.insert(Conditions::LOCK_RUN);
        }
        true
    }

    fn cancel(&self, ex: &mut Exchange<'_>, creature: CreatureHandle) {
        if let Some(c) = ex.creatures.get_mut(creature) {
            c.conditions.remove(Conditions::LOCK_RUN);
        }
    }
}

/// Let `defender` counter `attacker` if it is waiting with a ready
/// Counterattack. Returns `true` when the counter happened, in which case
/// the incoming attack is void.
pub fn try_counter(ex: &mut Exchange<'_>, defender: CreatureHandle, attacker: CreatureHandle) -> bool {
    let now = ex.now;
    let Some(creature) = ex.creatures.get_mut(defender) else {
        return false;
    };
    if !creature.skills.is_ready(SkillId::Counterattack) {
        return false;
    }
    let Some(skill) = creature.skills.get_mut(SkillId::Counterattack) else {
        return false;
    };
    if skill.is_on_cooldown(now) {
        return false;
    }
    skill.state = SkillState::Used;

    if !counter(ex, defender, attacker) {
        return false;
    }

    if let Some(active) = ex
        .creatures
        .get_mut(defender)
        .and_then(|c| c.skills.active_mut())
    {
        active.state = SkillState::Used;
    }
    true
}

fn counter(ex: &mut Exchange<'_>, c: CreatureHandle, t: CreatureHandle) -> bool {
    let now = ex.now;
    let knockback_distance = ex.config.knockback_distance;
    let renewal = ex.config.combat_renewal;

    let Some((counterer, target)) = ex.creatures.pair_mut(c, t) else {
        return false;
    };
    let Some(skill) = counterer.skills.get(SkillId::Counterattack) else {
        return false;
    };
    let (own_share, reflected, crit_bonus) = (skill.var2(), skill.var1(), skill.var3());
    counterer.conditions.remove(Conditions::LOCK_RUN);

    let mut attacker_action = AttackerAction::new(
        CombatActionType::RangeHit,
        c,
        counterer.id,
        SkillId::Counterattack,
        Some(target.id),
    );
    attacker_action.set(AttackerOptions::RESULT | AttackerOptions::KNOCK_BACK_HIT2);

    let target_skill = if target.skills.is_ready(SkillId::Smash) {
        SkillId::Smash
    } else {
        SkillId::CombatMastery
    };
    let mut action = TargetAction::new(
        CombatActionType::CounteredHit2,
        t,
        target.id,
        c,
        counterer.id,
        target_skill,
    );
    action.attacker_skill_id = SkillId::Counterattack;
    action.set(TargetOptions::RESULT | TargetOptions::SMASH);

    // Part of the counterer's own swing plus the attacker's swing turned back
    let own = if counterer.equipment.has_gun() {
        counterer.rnd_bare_hand_damage(&mut *ex.dice)
    } else {
        counterer.rnd_total_damage(&mut *ex.dice)
    };
    let base = own * own_share / 100.0 + target.rnd_total_damage(&mut *ex.dice) * reflected / 100.0;
    let protection = target.stats.protection + target.equipment.shield_defense_critical();
    let crit_chance = counterer.total_crit_chance(protection) + crit_bonus;

    let outcome = damage::resolve_hit(
        &mut *ex.dice,
        ex.outbox,
        counterer,
        target,
        None,
        &mut action,
        base,
        HitParams::new(crit_chance),
    );
    target.aggro(c);

    if target.is_dead() {
        action.set(TargetOptions::FINISHING_KNOCK_DOWN);
    }
    attacker_action.core.stun = if counterer.is_player() && renewal {
        RENEWAL_PLAYER_STUN
    } else {
        STUN
    };
    action.core.stun = STUN;

    target.stability = MIN_STABILITY;
    target.shove(counterer.position, knockback_distance);
    counterer.equipment.update_weapon_wear(false);
    if counterer.is_dual_wielding() {
        counterer.equipment.update_weapon_wear(true);
    }

    let counterer_id = counterer.id;
    let target_alive = !target.is_dead();
    debug!(
        "{} counters {} for {:.1}",
        counterer.name, target.name, outcome.damage
    );

    if renewal {
        if let Some(skill) = counterer.skills.get_mut(SkillId::Counterattack) {
            skill.set_cooldown(now, RENEWAL_COOLDOWN);
        }
    } else {
        ex.outbox.private(
            counterer_id,
            Notice::ResetCooldown {
                creature: counterer_id,
                skill: SkillId::Counterattack,
            },
        );
    }
    ex.outbox.broadcast(Notice::SkillUseStun {
        creature: counterer_id,
        skill: SkillId::Counterattack,
        stun: attacker_action.core.stun,
    });

    let mut pack = CombatActionPack::new(SkillId::Counterattack, attacker_action);
    pack.add(action);
    pack.handle(ex);

    if target_alive {
        ex.schedule_get_up(t, STUN);
    }
    true
}
