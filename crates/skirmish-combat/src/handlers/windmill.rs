//! Windmill
//!
//! Spins and knocks down every targetable creature around the user.

use skirmish_core::CreatureHandle;
use tracing::debug;

use crate::action::{
    AttackerAction, AttackerOptions, CombatActionPack, CombatActionType, TargetAction,
    TargetOptions,
};
use crate::creature::{Creature, Race, MIN_STABILITY};
use crate::damage::{self, HitParams};
use crate::exchange::Exchange;
use crate::handlers::{SkillHandler, UseResult, UseTarget};
use crate::notice::Notice;
use crate::skill::{SkillId, SkillRank, SkillState};
use crate::stun::{ATTACKER_KNOCKBACK_STUN, TARGET_KNOCKBACK_STUN};
use crate::targeting;

/// Animation delay on every target record
const HIT_DELAY: u32 = 300;

const NO_TARGET: &str = "There isn't a target nearby to use that on.";

pub struct Windmill;

impl SkillHandler for Windmill {
    fn id(&self) -> SkillId {
        SkillId::Windmill
    }

    fn ready(&self, ex: &mut Exchange<'_>, creature: CreatureHandle) -> bool {
        let Some(c) = ex.creatures.get_mut(creature) else {
            return false;
        };
        if let Some(skill) = c.skills.get_mut(SkillId::Windmill) {
            skill.stacks = 1;
        }
        let id = c.id;
        ex.outbox.broadcast(Notice::SkillReady {
            creature: id,
            skill: SkillId::Windmill,
        });
        true
    }

    fn use_skill(
        &self,
        ex: &mut Exchange<'_>,
        attacker: CreatureHandle,
        target: UseTarget,
    ) -> UseResult {
        let area = match target {
            UseTarget::Area(area) => Some(area),
            UseTarget::Entity(_) => None,
        };
        spin(ex, attacker, area)
    }
}

/// Radius of the spin
pub fn range(creature: &Creature, rank: SkillRank) -> f32 {
    let (range, knuckle_factor) = if rank >= SkillRank::R1 {
        (500.0, 0.6)
    } else if rank >= SkillRank::R5 {
        (400.0, 0.5)
    } else {
        (300.0, 0.4)
    };
    if creature.equipment.has_knuckles() {
        range * knuckle_factor
    } else {
        range
    }
}

/// Cooldown after a spin (ms). Monsters spin without one.
pub fn cooldown(race: Race, rank: SkillRank) -> u64 {
    let advanced = rank >= SkillRank::R9;
    match (race, advanced) {
        (Race::Elf, true) => 4000,
        (Race::Elf, false) => 4500,
        (Race::Giant, true) => 3000,
        (Race::Giant, false) => 3500,
        (Race::Human, true) => 3500,
        (Race::Human, false) => 4000,
        (Race::Monster, _) => 0,
    }
}

fn spin(ex: &mut Exchange<'_>, a: CreatureHandle, area: Option<u64>) -> UseResult {
    let now = ex.now;
    let Some(attacker) = ex.creatures.get(a) else {
        return UseResult::InvalidTarget;
    };
    if attacker.is_on_attack_delay(now) {
        ex.silent_cancel(a);
        return UseResult::Okay;
    }
    let Some(skill) = attacker.skills.get(SkillId::Windmill) else {
        return UseResult::InvalidTarget;
    };
    let rank = skill.rank;
    let damage_rate = skill.var1() / 100.0;
    let attacker_id = attacker.id;
    let race = attacker.race;

    let radius = range(attacker, rank);
    let targets: Vec<CreatureHandle> = targeting::targetable_in_range(ex.creatures, attacker, radius)
        .into_iter()
        .filter(|&h| {
            ex.creatures
                .get(h)
                .is_some_and(|c| !c.is_not_ready_to_be_hit(now))
        })
        .collect();
    if targets.is_empty() {
        ex.outbox.text(attacker_id, NO_TARGET);
        ex.silent_cancel(a);
        return UseResult::Okay;
    }

    let mut attacker_action =
        AttackerAction::new(CombatActionType::SpecialHit, a, attacker_id, SkillId::Windmill, None);
    attacker_action.target_area = area;
    attacker_action.set(AttackerOptions::RESULT);

    let mut records = Vec::with_capacity(targets.len());
    let mut survivors = Vec::new();
    let mut get_ups = Vec::new();
    for &t in &targets {
        let Some(record) = hit(ex, a, t, damage_rate, &mut attacker_action) else {
            continue;
        };
        if let Some(target) = ex.creatures.get(t) {
            if !target.is_dead() {
                survivors.push(t);
                if record.has(TargetOptions::KNOCK_DOWN) {
                    get_ups.push((t, record.core.stun));
                }
            }
        }
        records.push(record);
    }
    attacker_action.core.stun = ATTACKER_KNOCKBACK_STUN;

    // Only one creature picks a fight with the spinner
    let already_aggroed = ex.creatures.iter().any(|c| c.aggro_target == Some(a));
    if !survivors.is_empty() && !already_aggroed {
        let pick = survivors[ex.dice.pick(survivors.len())];
        if let Some(creature) = ex.creatures.get_mut(pick) {
            creature.aggro(a);
        }
    }

    debug!("Windmill by {} hits {} creatures", attacker_id, records.len());
    let mut pack = CombatActionPack::new(SkillId::Windmill, attacker_action);
    for record in records {
        pack.add(record);
    }
    pack.handle(ex);
    for (handle, stun) in get_ups {
        ex.schedule_get_up(handle, stun);
    }

    if let Some(skill) = ex
        .creatures
        .get_mut(a)
        .and_then(|c| c.skills.get_mut(SkillId::Windmill))
    {
        skill.set_cooldown(now, cooldown(race, rank));
        skill.stacks = 0;
        if skill.state == SkillState::Ready {
            skill.state = SkillState::Used;
        }
    }
    ex.outbox.broadcast(Notice::SkillUse {
        creature: attacker_id,
        skill: SkillId::Windmill,
        target: None,
    });
    UseResult::Okay
}

fn hit(
    ex: &mut Exchange<'_>,
    a: CreatureHandle,
    t: CreatureHandle,
    damage_rate: f32,
    attacker_action: &mut AttackerAction,
) -> Option<TargetAction> {
    let knockback_distance = ex.config.knockback_distance;
    let (attacker, target) = ex.creatures.pair_mut(a, t)?;

    let countered = target.skills.is_ready(SkillId::Smash);
    let mut action = if countered {
        let mut action = TargetAction::new(
            CombatActionType::CounteredHit,
            t,
            target.id,
            a,
            attacker.id,
            SkillId::Smash,
        );
        action.set(TargetOptions::RESULT);
        action
    } else {
        TargetAction::new(CombatActionType::TakeHit, t, target.id, a, attacker.id, SkillId::Windmill)
    };
    action.attacker_skill_id = SkillId::Windmill;
    action.delay = HIT_DELAY;
    attacker.intercepting_skill_id = None;

    let roll = match attacker.right_hand() {
        Some(w) if w.weapon_type.is_ranged() => attacker.rnd_bare_hand_damage(&mut *ex.dice),
        _ => attacker.rnd_total_damage(&mut *ex.dice),
    };
    let crit_chance = attacker.total_crit_chance(0.0);
    let outcome = damage::resolve_hit(
        &mut *ex.dice,
        ex.outbox,
        attacker,
        target,
        Some(attacker_action),
        &mut action,
        roll * damage_rate,
        HitParams::new(crit_chance).defendable(),
    );

    if !outcome.defended && !outcome.critical {
        action.set(TargetOptions::CLEAN_HIT);
    }
    if target.is_dead() {
        action.set(TargetOptions::KNOCK_DOWN_FINISH);
    } else if !outcome.defended {
        action.set(TargetOptions::KNOCK_DOWN);
    }
    target.in_battle_stance = true;

    if !outcome.defended {
        action.core.stun = TARGET_KNOCKBACK_STUN;
        target.stability = MIN_STABILITY;
        target.shove(attacker.position, knockback_distance);
    }
    Some(action)
}
