//! Magnum Shot
//!
//! A charged ranged shot. The hit chance grows with the time spent aiming
//! and shrinks with distance. A hit knocks the target down; from rank 5 the
//! shot also clips creatures in the weapon's splash cone. Arrows lit at a
//! nearby fire deal extra damage.

use skirmish_core::geometry::in_range;
use skirmish_core::{CreatureHandle, CreatureId, Timestamp};
use tracing::debug;

use crate::action::{
    AttackerAction, AttackerOptions, CombatActionPack, CombatActionType, TargetAction,
    TargetOptions,
};
use crate::creature::{Conditions, Creature};
use crate::damage::{self, HitParams};
use crate::exchange::Exchange;
use crate::handlers::{send_prepare, SkillHandler, UseResult, UseTarget};
use crate::notice::{Effect, Notice};
use crate::skill::{SkillId, SkillRank, SkillState};
use crate::targeting::{self, TargetLookup};
use crate::weapon::SplashArea;

const ATTACKER_STUN: u32 = 600;
const TARGET_STUN: u32 = 3000;
/// Damage multiplier for lit arrows
pub const FIRE_BONUS: f32 = 1.5;
/// How close a fire must be to light arrows
const FIRE_RANGE: f32 = 500.0;

/// Aim time needed for a certain hit at point blank (ms)
const AIM_BASE_MS: f32 = 500.0;
/// Extra aim time per unit of distance (ms)
const AIM_MS_PER_DISTANCE: f32 = 1.0;

const SPLASH_DAMAGE: f32 = 0.1;
const SPLASH_DAMAGE_R1: f32 = 0.2;

pub struct MagnumShot;

impl SkillHandler for MagnumShot {
    fn id(&self) -> SkillId {
        SkillId::MagnumShot
    }

    fn prepare(&self, ex: &mut Exchange<'_>, creature: CreatureHandle) -> bool {
        send_prepare(ex, creature, SkillId::MagnumShot);
        if let Some(c) = ex.creatures.get_mut(creature) {
            c.conditions.insert(Conditions::LOCK_RUN);
        }
        true
    }

    fn ready(&self, ex: &mut Exchange<'_>, creature: CreatureHandle) -> bool {
        let now = ex.now;
        let fire_sources = ex.fire_sources;
        let Some(c) = ex.creatures.get_mut(creature) else {
            return false;
        };
        c.fire_arrow = fire_sources
            .iter()
            .any(|&fire| in_range(fire, c.position, FIRE_RANGE));
        c.aiming_since = Some(now);
        let (id, fire) = (c.id, c.fire_arrow);

        if fire {
            ex.outbox.broadcast(Notice::Effect {
                creature: id,
                effect: Effect::FireArrow(true),
            });
        }
        ex.outbox.broadcast(Notice::SkillReady {
            creature: id,
            skill: SkillId::MagnumShot,
        });
        true
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
        shoot(ex, attacker, target, target_id);
        UseResult::Okay
    }

    fn complete(&self, ex: &mut Exchange<'_>, creature: CreatureHandle) {
        self.cancel(ex, creature);
        if let Some(c) = ex.creatures.get(creature) {
            ex.outbox.broadcast(Notice::SkillComplete {
                creature: c.id,
                skill: SkillId::MagnumShot,
            });
        }
    }

    fn cancel(&self, ex: &mut Exchange<'_>, creature: CreatureHandle) {
        let Some(c) = ex.creatures.get_mut(creature) else {
            return;
        };
        c.aiming_since = None;
        c.conditions.remove(Conditions::LOCK_RUN);
        if c.fire_arrow {
            c.fire_arrow = false;
            ex.outbox.broadcast(Notice::Effect {
                creature: c.id,
                effect: Effect::FireArrow(false),
            });
        }
    }
}

/// Chance in percent that a shot fired now hits `target`
pub fn aim_chance(shooter: &Creature, target: &Creature, now: Timestamp) -> f32 {
    let Some(since) = shooter.aiming_since else {
        return 0.0;
    };
    let distance = shooter.position.distance(target.position);
    let full_aim = AIM_BASE_MS + distance * AIM_MS_PER_DISTANCE;
    (now.since(since) as f32 / full_aim * 100.0).clamp(0.0, 100.0)
}

/// Damage share taken by splash targets
fn splash_multiplier(rank: SkillRank) -> f32 {
    if rank >= SkillRank::R1 {
        SPLASH_DAMAGE_R1
    } else {
        SPLASH_DAMAGE
    }
}

fn shoot(ex: &mut Exchange<'_>, a: CreatureHandle, t: CreatureHandle, target_id: CreatureId) {
    let now = ex.now;
    let knockback_distance = ex.config.knockback_distance;
    let infinite_arrows = ex.config.infinite_arrows;
    let default_splash = ex.config.ranged_splash;
    let mut get_ups = Vec::new();

    let Some((attacker, target)) = ex.creatures.pair_mut(a, t) else {
        return;
    };
    let Some(skill) = attacker.skills.get(SkillId::MagnumShot) else {
        return;
    };
    let (rank, damage_rate) = (skill.rank, skill.var1() / 100.0);
    let attacker_id = attacker.id;

    let mut attacker_action = AttackerAction::new(
        CombatActionType::RangeHit,
        a,
        attacker_id,
        SkillId::MagnumShot,
        Some(target_id),
    );
    attacker_action.set(AttackerOptions::RESULT);
    attacker_action.core.stun = ATTACKER_STUN;

    let chance = aim_chance(attacker, target, now);
    let mut records = Vec::new();
    let mut splash: Option<(Vec<CreatureHandle>, bool)> = None;

    if ex.dice.percent(chance) {
        attacker_action.set(AttackerOptions::KNOCK_BACK_HIT2);

        let mut action =
            TargetAction::new(CombatActionType::TakeHit, t, target.id, a, attacker_id, SkillId::MagnumShot);
        action.set(TargetOptions::RESULT | TargetOptions::CLEAN_HIT);
        action.core.stun = TARGET_STUN;

        let mut base = attacker.rnd_ranged_damage(&mut *ex.dice) * damage_rate;
        if attacker.fire_arrow {
            base *= FIRE_BONUS;
        }
        let protection = target.stats.protection + target.equipment.shield_defense_critical();
        let crit_chance = attacker.right_crit_chance(protection);

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
        damage::revert_defense_if_lethal(target, &mut action, CombatActionType::TakeHit);
        let defended = action.is_defended();

        target.aggro(a);
        action.set(TargetOptions::KNOCK_DOWN_FINISH);
        if target.is_dead() {
            attacker_action.set(AttackerOptions::KNOCK_BACK_HIT1);
            action.set(TargetOptions::FINISHED);
        } else if !defended {
            action.set(TargetOptions::KNOCK_DOWN);
            get_ups.push((t, action.core.stun));
        }
        if !defended {
            target.shove(attacker.position, knockback_distance);
        }
        debug!(
            "{} shoots {} for {:.1} ({:.0}% aim)",
            attacker.name, target.name, outcome.damage, chance
        );
        records.push(action);

        if rank >= SkillRank::R5 {
            let area = match attacker.right_hand() {
                Some(weapon) => weapon.splash,
                None => Some(default_splash),
            };
            if let Some(area) = area {
                splash = Some((splash_targets(ex, a, t, area), outcome.critical));
            }
        }
    } else {
        attacker_action.set(AttackerOptions::MISSED);
        debug!("{} misses ({:.0}% aim)", attacker_id, chance);
    }

    if let Some((handles, critical)) = splash {
        let multiplier = splash_multiplier(rank);
        for s in handles {
            let record = splash_hit(
                ex,
                a,
                s,
                damage_rate,
                multiplier,
                critical,
                &mut attacker_action,
                &mut get_ups,
            );
            records.extend(record);
        }
    }

    if let Some(attacker) = ex.creatures.get_mut(a) {
        if !infinite_arrows {
            attacker.equipment.consume_ammo();
        }
        attacker.aiming_since = None;
        if attacker.fire_arrow {
            attacker.fire_arrow = false;
            ex.outbox.broadcast(Notice::Effect {
                creature: attacker_id,
                effect: Effect::FireArrow(false),
            });
        }
        if let Some(skill) = attacker.skills.get_mut(SkillId::MagnumShot) {
            skill.state = SkillState::Used;
        }
    }
    ex.outbox.broadcast(Notice::SkillUse {
        creature: attacker_id,
        skill: SkillId::MagnumShot,
        target: Some(target_id),
    });

    let mut pack = CombatActionPack::new(SkillId::MagnumShot, attacker_action);
    for record in records {
        pack.add(record);
    }
    pack.handle(ex);
    for (handle, stun) in get_ups {
        ex.schedule_get_up(handle, stun);
    }
}

fn splash_targets(
    ex: &mut Exchange<'_>,
    a: CreatureHandle,
    t: CreatureHandle,
    area: SplashArea,
) -> Vec<CreatureHandle> {
    let store = &*ex.creatures;
    let (Some(attacker), Some(target)) = (store.get(a), store.get(t)) else {
        return Vec::new();
    };
    let facing = (target.position - attacker.position).normalize_or_zero();
    targeting::find_splash_targets(store, attacker, facing, area, &[t])
}

#[allow(clippy::too_many_arguments)]
fn splash_hit(
    ex: &mut Exchange<'_>,
    a: CreatureHandle,
    s: CreatureHandle,
    damage_rate: f32,
    multiplier: f32,
    critical: bool,
    attacker_action: &mut AttackerAction,
    get_ups: &mut Vec<(CreatureHandle, u32)>,
) -> Option<TargetAction> {
    let now = ex.now;
    let knockback_distance = ex.config.knockback_distance;
    let (attacker, splashed) = ex.creatures.pair_mut(a, s)?;
    if splashed.is_not_ready_to_be_hit(now) || splashed.is_dead() {
        return None;
    }

    let mut action =
        TargetAction::new(CombatActionType::TakeHit, s, splashed.id, a, attacker.id, SkillId::MagnumShot);
    action.set(TargetOptions::RESULT | TargetOptions::CLEAN_HIT);
    action.core.stun = TARGET_STUN;

    let base = attacker.rnd_ranged_damage(&mut *ex.dice) * damage_rate;
    damage::resolve_hit(
        &mut *ex.dice,
        ex.outbox,
        attacker,
        splashed,
        None,
        &mut action,
        base,
        HitParams::new(0.0).defendable().splash(critical, multiplier),
    );
    damage::revert_defense_if_lethal(splashed, &mut action, CombatActionType::TakeHit);
    let defended = action.is_defended();

    if splashed.is_dead() {
        attacker_action.set(AttackerOptions::KNOCK_BACK_HIT1);
        action.set(TargetOptions::KNOCK_DOWN_FINISH | TargetOptions::FINISHED);
    } else if !defended {
        action.set(TargetOptions::KNOCK_DOWN);
        get_ups.push((s, action.core.stun));
    }
    if !defended {
        splashed.shove(attacker.position, knockback_distance);
    }
    splashed.in_battle_stance = true;
    Some(action)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::equipment::Magazine;
    use crate::skill::{RankData, Skill};
    use crate::testing::Arena;
    use crate::weapon::{DamageRange, Weapon, WeaponType};
    use glam::Vec2;

    fn archer(arena: &mut Arena, rank: SkillRank) -> CreatureHandle {
        let a = arena.player(1, Vec2::ZERO);
        let archer = arena.creature_mut(a);
        archer.stats.bare_hand = DamageRange::new(10.0, 10.0);
        archer
            .equipment
            .equip_right(Weapon::new("Short Bow", WeaponType::Bow, DamageRange::new(20.0, 20.0)))
            .unwrap();
        archer.equipment.load(Magazine {
            name: "Arrow".into(),
            count: 10,
        });
        archer.skills.add(
            Skill::new(SkillId::MagnumShot, rank)
                .with_data(RankData::new([200.0, 0.0, 0.0, 0.0, 0.0, 0.0])),
        );
        a
    }

    fn mark(arena: &mut Arena, id: u64, position: Vec2) -> CreatureHandle {
        let t = arena.npc(id, position);
        let target = arena.creature_mut(t);
        target.life = 500.0;
        target.life_max = 500.0;
        t
    }

    fn aim(arena: &mut Arena, a: CreatureHandle, ms: u64) {
        assert!(arena.prepare(a, SkillId::MagnumShot));
        assert!(arena.ready(a, SkillId::MagnumShot));
        arena.advance(ms);
    }

    #[test]
    fn test_aimed_shot_knocks_down() {
        let mut arena = Arena::new();
        let a = archer(&mut arena, SkillRank::RF);
        let t = mark(&mut arena, 2, Vec2::new(500.0, 0.0));
        aim(&mut arena, a, 2000);

        assert_eq!(arena.use_skill(a, SkillId::MagnumShot, t), UseResult::Okay);
        let packs = arena.packs();
        assert_eq!(packs.len(), 1);
        let pack = &packs[0];
        assert_eq!(pack.attacker.core.action_type, CombatActionType::RangeHit);
        assert_eq!(pack.attacker.core.stun, ATTACKER_STUN);
        assert!(pack.attacker.options.contains(AttackerOptions::KNOCK_BACK_HIT2));

        let record = &pack.targets[0];
        assert_eq!(record.damage, 60.0);
        assert_eq!(record.core.stun, TARGET_STUN);
        assert!(record.has(TargetOptions::CLEAN_HIT | TargetOptions::KNOCK_DOWN));

        let target = arena.creature(t);
        assert_eq!(target.life, 440.0);
        assert!((target.position.x - 950.0).abs() < 1e-3);
        assert_eq!(arena.region().pending_recoveries(), 1);

        let archer = arena.creature(a);
        assert_eq!(archer.equipment.ammo(), 9);
        assert!(archer.aiming_since.is_none());
    }

    #[test]
    fn test_unaimed_shot_misses() {
        let mut arena = Arena::new();
        let a = archer(&mut arena, SkillRank::RF);
        let t = mark(&mut arena, 2, Vec2::new(500.0, 0.0));
        aim(&mut arena, a, 0);

        arena.use_skill(a, SkillId::MagnumShot, t);
        let packs = arena.packs();
        assert!(packs[0].attacker.options.contains(AttackerOptions::MISSED));
        assert!(packs[0].targets.is_empty());
        assert_eq!(arena.creature(t).life, 500.0);
        assert_eq!(arena.creature(a).equipment.ammo(), 9);
    }

    #[test]
    fn test_fire_arrow_bonus() {
        let mut arena = Arena::new();
        arena.region_mut().add_fire_source(Vec2::new(0.0, 100.0));
        let a = archer(&mut arena, SkillRank::RF);
        let t = mark(&mut arena, 2, Vec2::new(500.0, 0.0));
        aim(&mut arena, a, 2000);
        assert!(arena.creature(a).fire_arrow);

        arena.use_skill(a, SkillId::MagnumShot, t);
        let notices = arena.drain();
        assert!(notices.iter().any(|(_, n)| matches!(
            n,
            Notice::Effect { effect: Effect::FireArrow(true), .. }
        )));
        assert!(notices.iter().any(|(_, n)| matches!(
            n,
            Notice::Effect { effect: Effect::FireArrow(false), .. }
        )));
        let record = notices
            .iter()
            .find_map(|(_, n)| match n {
                Notice::CombatAction(pack) => Some(pack.targets[0].clone()),
                _ => None,
            })
            .unwrap();
        assert_eq!(record.damage, 90.0);
        assert!(!arena.creature(a).fire_arrow);
    }

    #[test]
    fn test_infinite_arrows() {
        let mut arena = Arena::new();
        arena.region_mut().config_mut().infinite_arrows = true;
        let a = archer(&mut arena, SkillRank::RF);
        let t = mark(&mut arena, 2, Vec2::new(500.0, 0.0));
        aim(&mut arena, a, 2000);
        arena.use_skill(a, SkillId::MagnumShot, t);
        assert_eq!(arena.creature(a).equipment.ammo(), 10);
    }

    #[test]
    fn test_splash_from_rank_five() {
        let mut arena = Arena::new();
        let a = archer(&mut arena, SkillRank::R5);
        arena
            .creature_mut(a)
            .equipment
            .right_hand
            .as_mut()
            .unwrap()
            .splash = Some(SplashArea {
            radius: 700.0,
            angle: 20.0,
        });
        let t = mark(&mut arena, 2, Vec2::new(500.0, 0.0));
        let near = mark(&mut arena, 3, Vec2::new(550.0, 40.0));
        let _off_cone = mark(&mut arena, 4, Vec2::new(100.0, 400.0));
        aim(&mut arena, a, 2000);

        arena.use_skill(a, SkillId::MagnumShot, t);
        let packs = arena.packs();
        assert_eq!(packs[0].targets.len(), 2);
        let record = &packs[0].targets[1];
        assert_eq!(record.core.creature, near);
        assert!((record.damage - 6.0).abs() < 1e-3);
        assert_eq!(record.core.stun, TARGET_STUN);
        assert_eq!(arena.region().pending_recoveries(), 2);
    }

    #[test]
    fn test_missing_target_is_invalid() {
        let mut arena = Arena::new();
        let a = archer(&mut arena, SkillRank::RF);
        aim(&mut arena, a, 2000);
        let result = arena.use_skill_on_id(a, SkillId::MagnumShot, CreatureId(42));
        assert_eq!(result, UseResult::InvalidTarget);
    }

    #[test]
    fn test_cancel_clears_aim_and_lock() {
        let mut arena = Arena::new();
        let a = archer(&mut arena, SkillRank::RF);
        aim(&mut arena, a, 100);
        assert!(arena.creature(a).conditions.contains(Conditions::LOCK_RUN));
        arena.cancel(a);
        let archer = arena.creature(a);
        assert!(archer.aiming_since.is_none());
        assert!(!archer.conditions.contains(Conditions::LOCK_RUN));
    }

    #[test]
    fn test_aim_chance_grows_with_time() {
        let mut shooter = Creature::new(CreatureId(1), "s", crate::creature::CreatureKind::Player);
        let target = Creature::new(CreatureId(2), "t", crate::creature::CreatureKind::Npc)
            .at(Vec2::new(500.0, 0.0));
        assert_eq!(aim_chance(&shooter, &target, Timestamp(1000)), 0.0);

        shooter.aiming_since = Some(Timestamp(0));
        assert!((aim_chance(&shooter, &target, Timestamp(500)) - 50.0).abs() < 1e-3);
        assert_eq!(aim_chance(&shooter, &target, Timestamp(5000)), 100.0);

        let far = target.clone().at(Vec2::new(1500.0, 0.0));
        assert!(aim_chance(&shooter, &far, Timestamp(500)) < 50.0);
    }
}
