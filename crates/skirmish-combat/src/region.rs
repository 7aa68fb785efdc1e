//! Region: the unit of combat serialization
//!
//! A region owns its creatures, clock, dice, outbox and recovery queue.
//! Every skill request borrows the whole region for the duration of the
//! exchange, so two exchanges in one region never interleave.

use std::sync::Arc;

use glam::Vec2;
use skirmish_core::{ClockConfig, ClockError, CreatureHandle, CreatureId, GameClock, RegionId, Timestamp};
use tracing::{debug, error, info, trace, warn};

use crate::config::CombatConfig;
use crate::creature::{Conditions, Creature};
use crate::damage;
use crate::dice::{self, Dice};
use crate::error::CombatError;
use crate::events::CombatListener;
use crate::exchange::Exchange;
use crate::handlers::{SkillHandler, SkillRegistry, UseResult, UseTarget};
use crate::notice::{Audience, Notice, Outbox};
use crate::recovery::{RecoveryKind, RecoveryQueue};
use crate::skill::{SkillId, SkillState};
use crate::store::CreatureStore;

/// One spatial region and everything fighting in it
pub struct Region {
    id: RegionId,
    creatures: CreatureStore,
    clock: GameClock,
    dice: Box<dyn Dice>,
    outbox: Outbox,
    recovery: RecoveryQueue,
    registry: Arc<SkillRegistry>,
    config: Arc<CombatConfig>,
    listeners: Vec<Arc<dyn CombatListener>>,
    /// Open flames that light arrows
    fire_sources: Vec<Vec2>,
    /// Last time mana shields were drained
    last_drain: Timestamp,
}

impl Region {
    pub fn new(id: RegionId, config: Arc<CombatConfig>, registry: Arc<SkillRegistry>) -> Self {
        let dice = dice::region_dice(config.rng_seed);
        Self {
            id,
            creatures: CreatureStore::new(),
            clock: GameClock::new(ClockConfig::default()),
            dice,
            outbox: Outbox::new(),
            recovery: RecoveryQueue::new(),
            registry,
            config,
            listeners: Vec::new(),
            fire_sources: Vec::new(),
            last_drain: Timestamp::ZERO,
        }
    }

    pub fn id(&self) -> RegionId {
        self.id
    }

    /// Current region time
    pub fn now(&self) -> Timestamp {
        self.clock.now()
    }

    /// Replace the region RNG
    pub fn set_dice(&mut self, dice: impl Dice + 'static) {
        self.dice = Box::new(dice);
    }

    pub fn config(&self) -> &CombatConfig {
        &self.config
    }

    /// Region-local configuration, copied on first write
    pub fn config_mut(&mut self) -> &mut CombatConfig {
        Arc::make_mut(&mut self.config)
    }

    pub fn registry(&self) -> &SkillRegistry {
        &self.registry
    }

    // ---- Creatures ----

    /// Add a creature to the region
    pub fn spawn(&mut self, creature: Creature) -> Result<CreatureHandle, CombatError> {
        let name = creature.name.clone();
        let id = creature.id;
        let handle = self.creatures.insert(creature)?;
        info!("{} ({}) entered {}", name, id, self.id);
        Ok(handle)
    }

    /// Remove a creature, dropping its pending recoveries
    pub fn despawn(&mut self, id: CreatureId) -> Option<Creature> {
        let handle = self.creatures.resolve(id)?;
        let cancelled = self.recovery.cancel_for(handle);
        let creature = self.creatures.remove(handle)?;
        info!(
            "{} left {} ({} recoveries cancelled)",
            creature.name, self.id, cancelled
        );
        Some(creature)
    }

    pub fn resolve(&self, id: CreatureId) -> Option<CreatureHandle> {
        self.creatures.resolve(id)
    }

    pub fn get(&self, handle: CreatureHandle) -> Option<&Creature> {
        self.creatures.get(handle)
    }

    pub fn get_mut(&mut self, handle: CreatureHandle) -> Option<&mut Creature> {
        self.creatures.get_mut(handle)
    }

    /// Creature by protocol id
    pub fn creature(&self, id: CreatureId) -> Option<&Creature> {
        self.creatures.get(self.creatures.resolve(id)?)
    }

    pub fn creatures(&self) -> &CreatureStore {
        &self.creatures
    }

    // ---- Collaborators ----

    pub fn add_listener(&mut self, listener: impl CombatListener + 'static) {
        self.listeners.push(Arc::new(listener));
    }

    pub fn add_fire_source(&mut self, position: Vec2) {
        self.fire_sources.push(position);
    }

    pub fn outbox(&self) -> &Outbox {
        &self.outbox
    }

    /// Take every queued notice
    pub fn drain_notices(&mut self) -> Vec<(Audience, Notice)> {
        self.outbox.drain()
    }

    pub fn pending_recoveries(&self) -> usize {
        self.recovery.len()
    }

    /// Run `f` with exclusive access to the region's combat state
    pub fn with_exchange<R>(&mut self, f: impl FnOnce(&mut Exchange<'_>) -> R) -> R {
        let now = self.clock.now();
        let mut ex = Exchange::new(
            &mut self.creatures,
            &mut *self.dice,
            &mut self.outbox,
            &mut self.recovery,
            &self.registry,
            &self.config,
            &self.listeners,
            &self.fire_sources,
            now,
        );
        f(&mut ex)
    }

    // ---- Skill requests ----

    fn handler(&self, skill: SkillId) -> Option<Arc<dyn SkillHandler>> {
        let handler = self.registry.get(skill).cloned();
        if handler.is_none() {
            error!("{}", CombatError::HandlerNotFound(skill));
        }
        handler
    }

    /// Resolve a creature that must know `skill`
    fn skill_owner(&self, creature: CreatureId, skill: SkillId) -> Option<CreatureHandle> {
        let Some(handle) = self.creatures.resolve(creature) else {
            debug!("{}", CombatError::UnknownCreature(creature));
            return None;
        };
        let c = self.creatures.get(handle)?;
        if !c.skills.has(skill) {
            warn!("{}", CombatError::MissingSkill { creature, skill });
            return None;
        }
        Some(handle)
    }

    fn silent_cancel(&mut self, creature: CreatureId) {
        self.outbox
            .private(creature, Notice::SkillUseSilentCancel { creature });
    }

    /// Start preparing a skill, cancelling whatever was active
    pub fn prepare_skill(&mut self, creature: CreatureId, skill: SkillId) -> bool {
        let now = self.now();
        let Some(h) = self.skill_owner(creature, skill) else {
            return false;
        };
        let on_cooldown = self
            .creatures
            .get(h)
            .and_then(|c| c.skills.get(skill))
            .is_some_and(|s| s.is_on_cooldown(now));
        if on_cooldown {
            debug!("{} tried to prepare {} on cooldown", creature, skill.name());
            return false;
        }
        let Some(handler) = self.handler(skill) else {
            return false;
        };

        let prepared = self.with_exchange(|ex| {
            ex.cancel_active_skill(h);
            handler.prepare(ex, h)
        });
        if prepared {
            if let Some(c) = self.creatures.get_mut(h) {
                c.skills.activate(skill, SkillState::Preparing);
            }
        }
        prepared
    }

    /// Finish preparing the active skill
    pub fn ready_skill(&mut self, creature: CreatureId, skill: SkillId) -> bool {
        let Some(h) = self.skill_owner(creature, skill) else {
            return false;
        };
        let preparing = self.creatures.get(h).is_some_and(|c| {
            c.skills.active_id() == Some(skill)
                && c.skills.get(skill).is_some_and(|s| s.state == SkillState::Preparing)
        });
        if !preparing {
            debug!("{} readied {} without preparing it", creature, skill.name());
            return false;
        }
        let Some(handler) = self.handler(skill) else {
            return false;
        };

        let ready = self.with_exchange(|ex| handler.ready(ex, h));
        if let Some(s) = self
            .creatures
            .get_mut(h)
            .and_then(|c| c.skills.get_mut(skill))
        {
            if ready {
                s.state = SkillState::Ready;
            }
        }
        ready
    }

    /// Use a skill. The basic attack needs no preparation; everything else
    /// must be ready.
    pub fn use_skill(&mut self, attacker: CreatureId, skill: SkillId, target: UseTarget) -> UseResult {
        let now = self.now();
        let Some(a) = self.skill_owner(attacker, skill) else {
            return UseResult::InvalidTarget;
        };
        let Some(c) = self.creatures.get(a) else {
            return UseResult::InvalidTarget;
        };
        let on_cooldown = c.skills.get(skill).is_some_and(|s| s.is_on_cooldown(now));
        if on_cooldown {
            debug!("{} used {} on cooldown", attacker, skill.name());
            self.silent_cancel(attacker);
            return UseResult::Okay;
        }
        if skill != SkillId::CombatMastery && !c.skills.is_ready(skill) {
            debug!("{} used {} before it was ready", attacker, skill.name());
            self.silent_cancel(attacker);
            return UseResult::Okay;
        }
        let Some(handler) = self.handler(skill) else {
            return UseResult::Okay;
        };

        let result = self.with_exchange(|ex| handler.use_skill(ex, a, target));
        for creature in self.creatures.iter_mut() {
            creature.reset_interception();
        }
        trace!("{} used {} on {:?}: {:?}", attacker, skill.name(), target, result);
        result
    }

    /// The client finished the skill's animation
    pub fn complete_skill(&mut self, creature: CreatureId, skill: SkillId) -> bool {
        let Some(h) = self.skill_owner(creature, skill) else {
            return false;
        };
        if self.creatures.get(h).and_then(|c| c.skills.active_id()) != Some(skill) {
            return false;
        }
        let Some(handler) = self.handler(skill) else {
            return false;
        };

        self.with_exchange(|ex| handler.complete(ex, h));
        if let Some(c) = self.creatures.get_mut(h) {
            let stacks = c.skills.get(skill).map(|s| s.stacks).unwrap_or(0);
            if stacks > 0 {
                c.skills.activate(skill, SkillState::Ready);
            } else {
                c.skills.clear_active();
            }
        }
        true
    }

    /// Cancel the active skill. Returns `false` when nothing was active.
    pub fn cancel_skill(&mut self, creature: CreatureId) -> bool {
        let Some(h) = self.creatures.resolve(creature) else {
            return false;
        };
        if self.creatures.get(h).and_then(|c| c.skills.active_id()).is_none() {
            return false;
        }
        self.with_exchange(|ex| ex.cancel_active_skill(h));
        true
    }

    /// Toggle a skill on
    pub fn start_skill(&mut self, creature: CreatureId, skill: SkillId) -> bool {
        let Some(h) = self.skill_owner(creature, skill) else {
            return false;
        };
        let Some(handler) = self.handler(skill) else {
            return false;
        };
        self.with_exchange(|ex| handler.start(ex, h))
    }

    /// Toggle a skill off
    pub fn stop_skill(&mut self, creature: CreatureId, skill: SkillId) -> bool {
        let Some(h) = self.skill_owner(creature, skill) else {
            return false;
        };
        let Some(handler) = self.handler(skill) else {
            return false;
        };
        self.with_exchange(|ex| handler.stop(ex, h))
    }

    // ---- Time ----

    /// Advance the region clock to `now` and run everything that came due
    pub fn tick(&mut self, now: Timestamp) -> Result<(), ClockError> {
        let now = self.clock.advance_to(now)?;

        for task in self.recovery.take_due(now) {
            let Some(creature) = self.creatures.get_mut(task.creature) else {
                trace!("Recovery for a removed creature skipped");
                continue;
            };
            match task.kind {
                RecoveryKind::GetUp => {
                    if creature.is_dead() {
                        continue;
                    }
                    creature.get_back_up(now);
                    let (id, stability) = (creature.id, creature.stability);
                    self.outbox.broadcast(Notice::GotUp { creature: id });
                    self.outbox
                        .broadcast(Notice::StabilityMeter { creature: id, stability });
                }
            }
        }

        self.drain_mana_shields(now);
        Ok(())
    }

    /// Mana shields cost their Var2 in mana every second
    fn drain_mana_shields(&mut self, now: Timestamp) {
        let elapsed = now.since(self.last_drain);
        self.last_drain = now;
        if elapsed == 0 {
            return;
        }
        let seconds = elapsed as f32 / 1000.0;

        for creature in self.creatures.iter_mut() {
            if !creature.conditions.contains(Conditions::MANA_SHIELD) {
                continue;
            }
            let per_second = creature
                .skills
                .get(SkillId::ManaShield)
                .map(|s| s.var2())
                .unwrap_or(0.0);
            creature.mana = (creature.mana - per_second * seconds).max(0.0);
            if creature.mana <= 0.0 {
                debug!("{} ran out of mana, shield drops", creature.name);
                damage::deactivate_mana_shield(creature, &mut self.outbox);
            }
        }
    }
}

impl std::fmt::Debug for Region {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Region")
            .field("id", &self.id)
            .field("now", &self.clock.now())
            .field("creatures", &self.creatures.len())
            .field("pending_recoveries", &self.recovery.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::creature::{CreatureKind, MAX_STABILITY};
    use crate::skill::{RankData, Skill, SkillRank};
    use crate::testing::Arena;
    use glam::Vec2;

    #[test]
    fn test_duplicate_spawn_rejected() {
        let mut arena = Arena::new();
        arena.npc(5, Vec2::ZERO);
        let dup = Creature::new(CreatureId(5), "Again", CreatureKind::Npc);
        assert_eq!(
            arena.region_mut().spawn(dup),
            Err(CombatError::DuplicateCreature(CreatureId(5)))
        );
    }

    #[test]
    fn test_despawn_cancels_recovery() {
        let mut arena = Arena::new();
        let t = arena.npc(5, Vec2::ZERO);
        arena.with_exchange(|ex| ex.schedule_get_up(t, 3000));
        assert_eq!(arena.region().pending_recoveries(), 1);

        let removed = arena.region_mut().despawn(CreatureId(5));
        assert!(removed.is_some());
        assert_eq!(arena.region().pending_recoveries(), 0);
        assert!(arena.region().get(t).is_none());
        arena.advance(5000);
    }

    #[test]
    fn test_get_up_fires_on_tick() {
        let mut arena = Arena::new();
        let t = arena.npc(5, Vec2::ZERO);
        {
            let target = arena.creature_mut(t);
            target.stability = -10.0;
            target.knock_down_time = Timestamp(3000);
        }
        arena.with_exchange(|ex| ex.schedule_get_up(t, 3000));

        arena.advance(1999);
        assert_eq!(arena.region().pending_recoveries(), 1);
        arena.advance(1);
        assert_eq!(arena.region().pending_recoveries(), 0);

        let target = arena.creature(t);
        assert_eq!(target.stability, MAX_STABILITY);
        assert!(!target.is_knocked_down(Timestamp(2000)));
        let notices = arena.drain();
        assert!(notices.iter().any(|(_, n)| matches!(n, Notice::GotUp { .. })));
    }

    #[test]
    fn test_clock_never_goes_back() {
        let mut arena = Arena::new();
        arena.advance(100);
        assert!(arena.region_mut().tick(Timestamp(50)).is_err());
    }

    #[test]
    fn test_missing_skill_is_invalid() {
        let mut arena = Arena::new();
        let a = arena.player(1, Vec2::ZERO);
        let t = arena.npc(2, Vec2::new(50.0, 0.0));
        assert_eq!(arena.use_skill(a, SkillId::Smash, t), UseResult::InvalidTarget);
        assert!(!arena.prepare(a, SkillId::Smash));
    }

    #[test]
    fn test_cooldown_silently_cancels() {
        let mut arena = Arena::new();
        let a = arena.player(1, Vec2::ZERO);
        let t = arena.npc(2, Vec2::new(50.0, 0.0));
        let mut skill = Skill::new(SkillId::CombatMastery, SkillRank::RF);
        skill.set_cooldown(Timestamp(0), 1000);
        arena.creature_mut(a).skills.add(skill);

        assert_eq!(arena.use_skill(a, SkillId::CombatMastery, t), UseResult::Okay);
        let notices = arena.drain();
        assert_eq!(notices.len(), 1);
        assert!(matches!(notices[0].1, Notice::SkillUseSilentCancel { .. }));
    }

    #[test]
    fn test_prepare_ready_complete_cycle() {
        let mut arena = Arena::new();
        let a = arena.player(1, Vec2::ZERO);
        arena
            .creature_mut(a)
            .skills
            .add(Skill::new(SkillId::Smash, SkillRank::RF));

        assert!(!arena.ready(a, SkillId::Smash));
        assert!(arena.prepare(a, SkillId::Smash));
        assert_eq!(
            arena.creature(a).skills.get(SkillId::Smash).unwrap().state,
            SkillState::Preparing
        );
        assert!(arena.ready(a, SkillId::Smash));
        assert!(arena.creature(a).skills.is_ready(SkillId::Smash));

        let id = arena.creature(a).id;
        assert!(arena.region_mut().complete_skill(id, SkillId::Smash));
        assert!(arena.creature(a).skills.active_id().is_none());
    }

    #[test]
    fn test_preparing_replaces_active_skill() {
        let mut arena = Arena::new();
        let a = arena.player(1, Vec2::ZERO);
        {
            let c = arena.creature_mut(a);
            c.skills.add(Skill::new(SkillId::Smash, SkillRank::RF));
            c.skills.add(Skill::new(SkillId::Defense, SkillRank::RF));
        }
        assert!(arena.prepare(a, SkillId::Smash));
        assert!(arena.prepare(a, SkillId::Defense));
        assert_eq!(arena.creature(a).skills.active_id(), Some(SkillId::Defense));
        let notices = arena.drain();
        assert!(notices
            .iter()
            .any(|(_, n)| matches!(n, Notice::SkillCancel { skill: SkillId::Smash, .. })));
    }

    #[test]
    fn test_mana_shield_drains_per_second() {
        let mut arena = Arena::new();
        let c = arena.npc(2, Vec2::ZERO);
        {
            let caster = arena.creature_mut(c);
            caster.mana = 3.0;
            caster.skills.add(
                Skill::new(SkillId::ManaShield, SkillRank::RF)
                    .with_data(RankData::new([1.0, 1.0, 0.0, 0.0, 0.0, 0.0])),
            );
        }
        assert!(arena.start(c, SkillId::ManaShield));

        arena.advance(2000);
        assert!((arena.creature(c).mana - 1.0).abs() < 1e-4);
        assert!(arena.creature(c).conditions.contains(Conditions::MANA_SHIELD));

        arena.advance(1000);
        assert_eq!(arena.creature(c).mana, 0.0);
        assert!(!arena.creature(c).conditions.contains(Conditions::MANA_SHIELD));
    }

    #[test]
    fn test_interception_reset_after_use() {
        let mut arena = Arena::new();
        let a = arena.player(1, Vec2::ZERO);
        let t = arena.npc(2, Vec2::new(50.0, 0.0));
        arena
            .creature_mut(a)
            .skills
            .add(Skill::new(SkillId::CombatMastery, SkillRank::RF));
        arena.creature_mut(t).intercepting_skill_id = Some(SkillId::Smash);
        arena.creature_mut(t).ignore_attack_range = true;

        arena.use_skill(a, SkillId::CombatMastery, t);
        let target = arena.creature(t);
        assert!(target.intercepting_skill_id.is_none());
        assert!(!target.ignore_attack_range);
    }
}
