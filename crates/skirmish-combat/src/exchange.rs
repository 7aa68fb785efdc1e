//! Exchange context
//!
//! An [`Exchange`] borrows everything a region owns for the duration of one
//! top-level skill use, including any redirect into the target's handler.
//! Nothing else can touch the region while it is alive.

use std::sync::Arc;

use glam::Vec2;
use skirmish_core::{CreatureHandle, Timestamp};
use tracing::{debug, error};

use crate::config::CombatConfig;
use crate::creature::Creature;
use crate::dice::Dice;
use crate::error::CombatError;
use crate::events::CombatListener;
use crate::handlers::{SkillHandler, SkillRegistry, UseResult, UseTarget};
use crate::notice::{Notice, Outbox};
use crate::recovery::RecoveryQueue;
use crate::skill::SkillId;
use crate::store::CreatureStore;

/// Mutable view of a region during one exchange
pub struct Exchange<'a> {
    pub creatures: &'a mut CreatureStore,
    pub dice: &'a mut dyn Dice,
    pub outbox: &'a mut Outbox,
    pub recovery: &'a mut RecoveryQueue,
    pub registry: &'a SkillRegistry,
    pub config: &'a CombatConfig,
    pub listeners: &'a [Arc<dyn CombatListener>],
    /// Open flames that light arrows
    pub fire_sources: &'a [Vec2],
    pub now: Timestamp,
    redirects: u8,
}

impl<'a> Exchange<'a> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        creatures: &'a mut CreatureStore,
        dice: &'a mut dyn Dice,
        outbox: &'a mut Outbox,
        recovery: &'a mut RecoveryQueue,
        registry: &'a SkillRegistry,
        config: &'a CombatConfig,
        listeners: &'a [Arc<dyn CombatListener>],
        fire_sources: &'a [Vec2],
        now: Timestamp,
    ) -> Self {
        Self {
            creatures,
            dice,
            outbox,
            recovery,
            registry,
            config,
            listeners,
            fire_sources,
            now,
            redirects: 0,
        }
    }

    /// Handler for a skill, logging when none is registered
    pub fn handler(&self, skill: SkillId) -> Option<&'a Arc<dyn SkillHandler>> {
        let registry = self.registry;
        let handler = registry.get(skill);
        if handler.is_none() {
            error!("{}", CombatError::HandlerNotFound(skill));
        }
        handler
    }

    /// Whether a redirect already happened in this exchange
    pub fn has_redirected(&self) -> bool {
        self.redirects > 0
    }

    /// Hand the exchange over to `interceptor`, which answers `against`
    /// with its own `skill`.
    ///
    /// Only one redirect happens per exchange. Returns `None` when the
    /// redirect was refused, in which case the caller carries on.
    pub fn redirect(
        &mut self,
        interceptor: CreatureHandle,
        skill: SkillId,
        intercepting: SkillId,
        against: CreatureHandle,
    ) -> Option<UseResult> {
        if self.has_redirected() {
            debug!("Redirect to {:?} refused, exchange already redirected", skill);
            return None;
        }
        let against_id = self.creatures.get(against)?.id;
        let creature = self.creatures.get_mut(interceptor)?;
        creature.intercepting_skill_id = Some(intercepting);
        creature.ignore_attack_range = true;
        debug!("{} intercepts with {}", creature.name, skill.name());
        self.redirects += 1;

        let Some(handler) = self.handler(skill) else {
            return Some(UseResult::Okay);
        };
        Some(handler.use_skill(self, interceptor, UseTarget::Entity(against_id)))
    }

    /// Cancel whatever skill `creature` has active
    pub fn cancel_active_skill(&mut self, creature: CreatureHandle) {
        let Some(c) = self.creatures.get(creature) else {
            return;
        };
        let Some(skill) = c.skills.active_id() else {
            return;
        };
        let id = c.id;

        if let Some(handler) = self.handler(skill) {
            handler.cancel(self, creature);
        }
        if let Some(c) = self.creatures.get_mut(creature) {
            c.skills.clear_active();
        }
        self.outbox.broadcast(Notice::SkillCancel { creature: id, skill });
    }

    /// Stun after the player cap
    pub fn capped_target_stun(&self, creature: &Creature, stun: u32) -> u32 {
        if creature.is_player() {
            stun.min(self.config.max_player_target_stun)
        } else {
            stun
        }
    }

    /// Get `creature` back up once `stun` has almost run out. The stun is
    /// capped the same way the commit caps it.
    pub fn schedule_get_up(&mut self, creature: CreatureHandle, stun: u32) {
        let Some(c) = self.creatures.get(creature) else {
            return;
        };
        let stun = self.capped_target_stun(c, stun);
        let delay = stun.saturating_sub(self.config.get_up_lead);
        self.recovery.schedule_get_up(creature, self.now, delay as u64);
    }

    /// Private and public vitals of one creature
    pub fn send_stat_update(&mut self, creature: CreatureHandle) {
        let Some(c) = self.creatures.get(creature) else {
            return;
        };
        self.outbox.private(
            c.id,
            Notice::StatUpdate {
                creature: c.id,
                life: c.life,
                life_max: c.life_max,
                mana: c.mana,
                stamina: c.stamina,
            },
        );
        self.outbox.broadcast(Notice::StatUpdatePublic {
            creature: c.id,
            life: c.life,
            life_max: c.life_max,
        });
    }

    /// Tell the client its skill use went nowhere
    pub fn silent_cancel(&mut self, creature: CreatureHandle) {
        if let Some(c) = self.creatures.get(creature) {
            self.outbox
                .private(c.id, Notice::SkillUseSilentCancel { creature: c.id });
        }
    }
}
