//! Combat Mastery, the basic attack
//!
//! One or two packs per use (two when dual wielding), each with the primary
//! target record and any weapon splash records. Arbitrates against a target
//! swinging back and lets a ready Counterattack preempt the whole thing.

use skirmish_core::{CreatureHandle, Timestamp};
use tracing::debug;

use crate::action::{
    AttackerAction, AttackerOptions, CombatActionPack, CombatActionType, PackId, TargetAction,
    TargetOptions,
};
use crate::creature::Creature;
use crate::damage::{self, HitParams};
use crate::exchange::Exchange;
use crate::handlers::counterattack;
use crate::handlers::{SkillHandler, UseResult, UseTarget};
use crate::interception::{self, Arbitration};
use crate::skill::SkillId;
use crate::stun;
use crate::targeting::{self, TargetLookup};
use crate::weapon::{AttackSpeed, SplashArea};

/// Share of the rolled damage splash targets take
const SPLASH_DAMAGE: f32 = 0.5;

const DEFAULT_STAMINA_USAGE: f32 = 0.7;

pub struct CombatMastery;

impl SkillHandler for CombatMastery {
    fn id(&self) -> SkillId {
        SkillId::CombatMastery
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
            TargetLookup::Missing | TargetLookup::NotReady(_) => return UseResult::Okay,
        };
        attack(ex, attacker, target)
    }
}

/// Weapon figures for one hand
#[derive(Debug, Clone, Copy)]
struct Swing {
    hit_count: u8,
    speed: AttackSpeed,
    splash: Option<SplashArea>,
}

fn swing(creature: &Creature, hit: u8) -> Swing {
    let weapon = if hit == 1 {
        creature.right_hand()
    } else {
        creature.left_hand()
    };
    match weapon {
        Some(w) => Swing {
            hit_count: w.hit_count(),
            speed: w.attack_speed,
            splash: w.splash,
        },
        None => Swing {
            hit_count: creature.race_knock_count.saturating_add(1),
            speed: creature.race_attack_speed,
            splash: None,
        },
    }
}

fn stamina_usage(creature: &Creature) -> f32 {
    let right = creature
        .right_hand()
        .map(|w| w.stamina_usage)
        .filter(|&u| u != 0.0)
        .unwrap_or(DEFAULT_STAMINA_USAGE);
    let left = match creature.left_hand() {
        Some(w) if creature.is_dual_wielding() => w.stamina_usage,
        _ => 0.0,
    };
    right + left
}

fn crit_reduction(target: &Creature) -> f32 {
    target.stats.protection + target.equipment.shield_defense_critical()
}

fn attack(ex: &mut Exchange<'_>, a: CreatureHandle, t: CreatureHandle) -> UseResult {
    let now = ex.now;
    let Some((attacker, target)) = ex.creatures.pair_mut(a, t) else {
        return UseResult::Okay;
    };

    if (attacker.is_stunned(now) || attacker.is_on_attack_delay(now))
        && attacker.intercepting_skill_id.is_none()
    {
        return UseResult::Okay;
    }
    if !attacker.ignore_attack_range {
        if !attacker.in_attack_range(target) {
            return UseResult::OutOfRange;
        }
        if target.is_invisible() {
            return UseResult::Okay;
        }
    }
    attacker.ignore_attack_range = false;

    if target.skills.is_ready(SkillId::Smash) && attacker.can_attack(target) {
        attacker.intercepting_skill_id = Some(SkillId::Smash);
    }

    let dual_wield = attacker.is_dual_wielding();
    let usage = stamina_usage(attacker);
    let low_stamina = attacker.stamina < usage;
    attacker.stamina = (attacker.stamina - usage).max(0.0);
    let attacker_id = attacker.id;
    if low_stamina {
        ex.outbox
            .text(attacker_id, "Your stamina is too low to attack properly!");
    }
    ex.send_stat_update(a);

    let simultaneous_stun = match arbitrate(ex, a, t) {
        Some(Interception::Redirected) => return UseResult::Okay,
        Some(Interception::Simultaneous(stun)) => stun,
        None => 0,
    };

    if counterattack::try_counter(ex, t, a) {
        return UseResult::Okay;
    }

    let splash_targets = splash_targets(ex, a, t);
    for &s in &splash_targets {
        if counterattack::try_counter(ex, s, a) {
            return UseResult::Okay;
        }
    }

    let max_hits: u8 = if dual_wield { 2 } else { 1 };
    let mut prev_id: Option<PackId> = None;
    let mut defense_stun = 0;

    for hit in 1..=max_hits {
        let Some(outcome) = swing_once(
            ex,
            a,
            t,
            SwingContext {
                hit,
                max_hits,
                dual_wield,
                low_stamina,
                simultaneous_stun,
                prev_id,
                defense_stun,
                splash_targets: &splash_targets,
            },
        ) else {
            break;
        };
        prev_id = Some(outcome.pack);
        if hit == 1 {
            defense_stun = outcome.defense_stun;
        }
        if outcome.stop {
            break;
        }
    }

    if let Some(attacker) = ex.creatures.get_mut(a) {
        attacker.attempting_attack = false;
    }
    UseResult::Okay
}

enum Interception {
    /// The target's handler took over
    Redirected,
    /// Both land; carries the stun the target's hit put on the attacker
    Simultaneous(u32),
}

/// Settle a target swinging back at the attacker
fn arbitrate(ex: &mut Exchange<'_>, a: CreatureHandle, t: CreatureHandle) -> Option<Interception> {
    let now = ex.now;
    let (attacker, target) = ex.creatures.pair_mut(a, t)?;

    if attacker.intercepting_skill_id == Some(SkillId::CombatMastery)
        || target.intercepting_skill_id == Some(SkillId::CombatMastery)
    {
        return None;
    }
    if !interception::is_swinging_back(now, target, attacker) || !attacker.can_attack(target) {
        return None;
    }

    let target_can_answer = target.can_attack(attacker);
    match interception::arbitrate_basic_attacks(&mut *ex.dice, now, attacker, target) {
        Arbitration::TargetWins => {
            if !target_can_answer {
                return None;
            }
            ex.redirect(t, SkillId::CombatMastery, SkillId::CombatMastery, a)
                .map(|_| Interception::Redirected)
        }
        Arbitration::AttackerWins { clean: true } => {
            attacker.intercepting_skill_id = Some(SkillId::CombatMastery);
            None
        }
        Arbitration::AttackerWins { clean: false } => {
            attacker.intercepting_skill_id = Some(SkillId::CombatMastery);
            if !target_can_answer {
                return None;
            }
            ex.redirect(t, SkillId::CombatMastery, SkillId::CombatMastery, a)?;
            let attacker = ex.creatures.get_mut(a)?;
            let stun = attacker.stun_remaining(now);
            attacker.set_stun(now, 0);
            debug!("{} and target hit simultaneously", attacker.name);
            Some(Interception::Simultaneous(stun))
        }
    }
}

/// Creatures caught in the attacker's swing besides the target
fn splash_targets(ex: &mut Exchange<'_>, a: CreatureHandle, t: CreatureHandle) -> Vec<CreatureHandle> {
    let bare_hand_area = ex.config.bare_hand_splash;
    let Some((attacker, target)) = ex.creatures.pair_mut(a, t) else {
        return Vec::new();
    };
    let area = match attacker.right_hand() {
        Some(weapon) => match weapon.splash {
            Some(area) => area,
            None => return Vec::new(),
        },
        None => bare_hand_area,
    };
    attacker.turn_to(target.position);
    let facing = (target.position - attacker.position).normalize_or_zero();

    let store = &*ex.creatures;
    let Some(attacker) = store.get(a) else {
        return Vec::new();
    };
    targeting::find_splash_targets(store, attacker, facing, area, &[t])
}

struct SwingContext<'s> {
    hit: u8,
    max_hits: u8,
    dual_wield: bool,
    low_stamina: bool,
    simultaneous_stun: u32,
    prev_id: Option<PackId>,
    defense_stun: u32,
    splash_targets: &'s [CreatureHandle],
}

struct SwingOutcome {
    pack: PackId,
    defense_stun: u32,
    /// No further hit this use
    stop: bool,
}

fn swing_once(
    ex: &mut Exchange<'_>,
    a: CreatureHandle,
    t: CreatureHandle,
    ctx: SwingContext<'_>,
) -> Option<SwingOutcome> {
    let now = ex.now;
    let knockback_distance = ex.config.knockback_distance;
    let renewal = ex.config.combat_renewal;
    let mut get_ups = Vec::new();

    let (attacker, target) = ex.creatures.pair_mut(a, t)?;
    let profile = swing(attacker, ctx.hit);
    let target_final_hit = target.skills.is_ready(SkillId::FinalHit);
    let target_skill = if target_final_hit {
        SkillId::FinalHit
    } else {
        SkillId::CombatMastery
    };

    let (attacker_type, target_type, target_skill) = match attacker.intercepting_skill_id {
        Some(SkillId::Smash) => (
            CombatActionType::SimultaneousHit,
            CombatActionType::CounteredHit,
            SkillId::Smash,
        ),
        Some(SkillId::CombatMastery) => (
            CombatActionType::SimultaneousHit,
            CombatActionType::CounteredHit,
            target_skill,
        ),
        _ => (CombatActionType::Hit, CombatActionType::TakeHit, target_skill),
    };
    attacker.intercepting_skill_id = None;

    let mut attacker_action = AttackerAction::new(
        attacker_type,
        a,
        attacker.id,
        SkillId::CombatMastery,
        Some(target.id),
    );
    attacker_action.set(AttackerOptions::RESULT);
    if ctx.dual_wield {
        attacker_action.set(AttackerOptions::DUAL_WIELD);
    }
    let mut action = TargetAction::new(target_type, t, target.id, a, attacker.id, target_skill);
    action.attacker_skill_id = SkillId::CombatMastery;
    action.set(TargetOptions::RESULT);

    // Base damage
    let base = if ctx.low_stamina {
        attacker.rnd_bare_hand_damage(&mut *ex.dice)
    } else if ctx.hit == 1 {
        attacker.rnd_right_hand_damage(&mut *ex.dice)
    } else {
        attacker.rnd_left_hand_damage(&mut *ex.dice)
    };
    let crit_chance = if ctx.hit == 1 {
        attacker.right_crit_chance(crit_reduction(target))
    } else {
        attacker.left_crit_chance(crit_reduction(target))
    };

    let original_type = action.core.action_type;
    let outcome = damage::resolve_hit(
        &mut *ex.dice,
        ex.outbox,
        attacker,
        target,
        Some(&mut attacker_action),
        &mut action,
        base,
        HitParams::new(crit_chance).defendable(),
    );
    damage::revert_defense_if_lethal(target, &mut action, original_type);
    let defended = action.is_defended();
    let defense_stun = if defended { action.core.stun } else { 0 };

    target.aggro(a);

    let stability_loss = stun::stability_reduction(profile.hit_count, profile.speed);
    if target.is_dead() {
        action.set(TargetOptions::FINISHING_KNOCK_DOWN);
    } else if !defended && !target_final_hit {
        target.reduce_stability(stability_loss / ctx.max_hits as f32);
        if target.is_unstable() && !target.knockdown_immune {
            action.set(TargetOptions::KNOCK_DOWN);
        }
    }

    let knock_back = action.is_knock_back();
    if knock_back && !defended {
        if !target_final_hit {
            target.shove(attacker.position, knockback_distance);
        }
        attacker_action.set(AttackerOptions::KNOCK_BACK_HIT2);
    }
    if (knock_back || defended) && ctx.max_hits != ctx.hit {
        attacker_action.options.remove(AttackerOptions::DUAL_WIELD);
    }

    if !defended {
        attacker_action.core.stun = if ctx.simultaneous_stun == 0 {
            let knocked = knock_back && (!target.is_dead() || renewal);
            stun::attacker_stun(profile.hit_count, profile.speed, knocked)
        } else {
            ctx.simultaneous_stun
        };
        if !target_final_hit {
            action.core.stun = stun::target_stun(profile.hit_count, profile.speed, knock_back);
        }
        if target.is_dead() {
            let delay = stun::attacker_stun(profile.hit_count, profile.speed, true);
            attacker.attack_delay_time = now + delay as u64;
        }
    }
    if ctx.hit == 2 && !knock_back {
        attacker_action.core.stun *= 2;
    }
    if action.has(TargetOptions::KNOCK_DOWN) && !target.is_dead() {
        get_ups.push((t, action.core.stun));
    }

    attacker.equipment.update_weapon_wear(ctx.hit == 2);
    debug!(
        "{} hits {} for {:.1} (hit {}/{})",
        attacker.name, target.name, outcome.damage, ctx.hit, ctx.max_hits
    );

    let mut pack = CombatActionPack::new(SkillId::CombatMastery, attacker_action)
        .with_hits(ctx.hit, ctx.max_hits, ctx.prev_id);
    pack.add(action);

    if profile.splash.is_some() {
        for &s in ctx.splash_targets {
            if let Some(record) = splash_hit(ex, a, s, &profile, &ctx, outcome.critical, &mut get_ups) {
                pack.add(record);
            }
        }
    }

    let stop = knock_back || defended;
    let pack_id = pack.handle(ex);
    for (handle, stun) in get_ups {
        ex.schedule_get_up(handle, stun);
    }

    Some(SwingOutcome {
        pack: pack_id,
        defense_stun,
        stop,
    })
}

fn splash_hit(
    ex: &mut Exchange<'_>,
    a: CreatureHandle,
    s: CreatureHandle,
    profile: &Swing,
    ctx: &SwingContext<'_>,
    critical: bool,
    get_ups: &mut Vec<(CreatureHandle, u32)>,
) -> Option<TargetAction> {
    let now: Timestamp = ex.now;
    let knockback_distance = ex.config.knockback_distance;
    let (attacker, splashed) = ex.creatures.pair_mut(a, s)?;
    if splashed.is_not_ready_to_be_hit(now) || splashed.is_dead() {
        return None;
    }

    let mut action = TargetAction::new(
        CombatActionType::TakeHit,
        s,
        splashed.id,
        a,
        attacker.id,
        SkillId::CombatMastery,
    );
    let base = if ctx.low_stamina {
        attacker.rnd_bare_hand_damage(&mut *ex.dice)
    } else if ctx.hit == 1 {
        attacker.rnd_right_hand_damage(&mut *ex.dice)
    } else {
        attacker.rnd_left_hand_damage(&mut *ex.dice)
    };

    let original_type = action.core.action_type;
    damage::resolve_hit(
        &mut *ex.dice,
        ex.outbox,
        attacker,
        splashed,
        None,
        &mut action,
        base,
        HitParams::new(0.0).defendable().splash(critical, SPLASH_DAMAGE),
    );
    damage::revert_defense_if_lethal(splashed, &mut action, original_type);
    let defended = action.is_defended();
    let final_hit = splashed.skills.is_ready(SkillId::FinalHit);

    splashed.aggro(a);

    if splashed.is_dead() {
        action.set(TargetOptions::FINISHING_KNOCK_DOWN);
    } else if !defended && !final_hit {
        // Splash shakes the footing half as much
        let loss = stun::stability_reduction(profile.hit_count, profile.speed);
        splashed.reduce_stability(loss / ctx.max_hits as f32 / 2.0);
        if splashed.is_unstable() && !splashed.knockdown_immune {
            action.set(TargetOptions::KNOCK_DOWN);
        }
    }

    if action.is_knock_back() && !defended && !final_hit {
        splashed.shove(attacker.position, knockback_distance);
    }
    if !defended && !final_hit {
        action.core.stun = if ctx.defense_stun != 0 {
            ctx.defense_stun
        } else {
            stun::target_stun(profile.hit_count, profile.speed, action.is_knock_back())
        };
    }
    if action.has(TargetOptions::KNOCK_DOWN) && !splashed.is_dead() {
        get_ups.push((s, action.core.stun));
    }
    Some(action)
}
