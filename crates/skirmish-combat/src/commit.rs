//! Committing a combat action pack
//!
//! Writes every record's stun and side effects onto the combatants, runs
//! the listener hooks and broadcasts the pack exactly once.

use skirmish_core::CreatureHandle;
use tracing::trace;

use crate::action::{AttackerAction, CombatActionPack, PackId, TargetAction, TargetOptions};
use crate::creature::Conditions;
use crate::exchange::Exchange;
use crate::notice::Notice;
use crate::skill::SkillId;

impl CombatActionPack {
    /// Apply the pack to the region and broadcast it. Consumes the pack.
    pub fn handle(mut self, ex: &mut Exchange<'_>) -> PackId {
        for action in &mut self.targets {
            if let Some(target) = ex.creatures.get(action.core.creature) {
                action.core.stun = ex.capped_target_stun(target, action.core.stun);
            }
            if action.mana_damage > 0.0 && action.damage == 0.0 {
                action.set(TargetOptions::MANA_SHIELD);
            }
        }

        for action in &self.targets {
            apply_target(ex, &self, action);
        }
        apply_attacker(ex, &self, &self.attacker);

        let id = self.id;
        let skill = self.skill_id;
        let attacker_id = self.attacker.core.creature_id;
        trace!(
            "Pack {:?}: {} by {} with {} records",
            id,
            skill.name(),
            attacker_id,
            self.record_count()
        );

        ex.outbox.broadcast(Notice::CombatAction(self));
        if skill != SkillId::CombatMastery {
            ex.outbox.broadcast(Notice::CombatUsedSkill {
                creature: attacker_id,
                skill,
            });
        }
        ex.outbox.broadcast(Notice::CombatActionEnd(id));
        id
    }
}

fn apply_target(ex: &mut Exchange<'_>, pack: &CombatActionPack, action: &TargetAction) {
    let handle = action.core.creature;
    let now = ex.now;
    let Some(target) = ex.creatures.get_mut(handle) else {
        return;
    };
    target.set_stun(now, action.core.stun);
    ex.send_stat_update(handle);

    let listeners = ex.listeners;
    for listener in listeners {
        listener.on_creature_attacked(pack, action);
    }
    if let Some(target) = ex.creatures.get(handle) {
        if !target.is_player() {
            for listener in listeners {
                listener.on_hit(target, action);
            }
        }
    }

    cancel_on_hit(ex, handle, action.is_knock_back());

    let Some(target) = ex.creatures.get_mut(handle) else {
        return;
    };
    let id = target.id;
    let was_resting = target.conditions.contains(Conditions::RESTING);
    target.conditions.remove(Conditions::RESTING);

    target.was_knocked_back = action.options.intersects(
        TargetOptions::KNOCK_BACK | TargetOptions::KNOCK_DOWN | TargetOptions::SMASH,
    );
    if action.options.intersects(TargetOptions::KNOCK_DOWN | TargetOptions::SMASH) {
        let stun = action.core.stun as u64;
        target.knock_down_time = now + stun;
        let not_ready = (stun as f32 * ex.config.not_ready_to_be_hit_factor) as u64;
        target.not_ready_to_be_hit_time = now + not_ready;
    }
    if target.was_knocked_back {
        target.last_knocked_back_by = Some(action.attacker);
    }
    let stability = target.stability;

    if was_resting {
        ex.outbox.broadcast(Notice::RestStopped { creature: id });
    }
    ex.outbox.broadcast(Notice::StabilityMeter {
        creature: id,
        stability,
    });
}

/// Drop the target's active skill after a hit.
///
/// Stackable skills survive plain hits and only go on knockback; their
/// handler may cancel them its own way. A ready Final Hit survives anything
/// short of a knockback.
fn cancel_on_hit(ex: &mut Exchange<'_>, handle: CreatureHandle, knock_back: bool) {
    let Some(target) = ex.creatures.get(handle) else {
        return;
    };
    if target.skills.is_ready(SkillId::FinalHit) && !knock_back {
        return;
    }
    let Some(active) = target.skills.active() else {
        return;
    };
    let skill = active.id;

    if target.is_dead() || active.data.stack_max <= 1 {
        ex.cancel_active_skill(handle);
        return;
    }
    if !knock_back {
        return;
    }
    let custom = ex
        .handler(skill)
        .is_some_and(|handler| handler.custom_hit_cancel(ex, handle));
    if !custom {
        ex.cancel_active_skill(handle);
    }
}

fn apply_attacker(ex: &mut Exchange<'_>, pack: &CombatActionPack, action: &AttackerAction) {
    let handle = action.core.creature;
    let now = ex.now;
    let Some(attacker) = ex.creatures.get_mut(handle) else {
        return;
    };
    attacker.set_stun(now, action.core.stun);
    ex.send_stat_update(handle);

    let listeners = ex.listeners;
    if let Some(attacker) = ex.creatures.get(handle) {
        if !attacker.is_player() && action.core.skill_id != SkillId::CombatMastery {
            for listener in listeners {
                listener.on_used_skill(attacker, action);
            }
        }
    }
    for listener in listeners {
        listener.on_creature_attacks(pack, action);
    }
}
