//! Test fixtures: a one-region arena and a counting listener

use std::sync::Arc;

use glam::Vec2;
use parking_lot::Mutex;
use skirmish_core::{CreatureHandle, CreatureId, RegionId};

use crate::action::{AttackerAction, CombatActionPack, TargetAction};
use crate::config::CombatConfig;
use crate::creature::{Creature, CreatureKind};
use crate::dice::ScriptedDice;
use crate::events::CombatListener;
use crate::exchange::Exchange;
use crate::handlers::{SkillRegistry, UseResult, UseTarget};
use crate::notice::{Audience, Notice};
use crate::region::Region;
use crate::skill::SkillId;

/// A region with a fixed dice roll of 0.5, driven by creature handles
pub struct Arena {
    region: Region,
}

impl Arena {
    pub fn new() -> Self {
        let mut region = Region::new(
            RegionId(1),
            Arc::new(CombatConfig::default()),
            Arc::new(SkillRegistry::with_defaults()),
        );
        region.set_dice(ScriptedDice::new(0.5));
        Self { region }
    }

    pub fn region(&self) -> &Region {
        &self.region
    }

    pub fn region_mut(&mut self) -> &mut Region {
        &mut self.region
    }

    pub fn set_dice(&mut self, dice: ScriptedDice) {
        self.region.set_dice(dice);
    }

    pub fn spawn(&mut self, id: u64, kind: CreatureKind, position: Vec2) -> CreatureHandle {
        let creature = Creature::new(CreatureId(id), format!("{kind:?} {id}"), kind).at(position);
        self.region.spawn(creature).expect("fresh creature id")
    }

    pub fn player(&mut self, id: u64, position: Vec2) -> CreatureHandle {
        self.spawn(id, CreatureKind::Player, position)
    }

    pub fn npc(&mut self, id: u64, position: Vec2) -> CreatureHandle {
        self.spawn(id, CreatureKind::Npc, position)
    }

    pub fn creature(&self, handle: CreatureHandle) -> &Creature {
        self.region.get(handle).expect("live creature")
    }

    pub fn creature_mut(&mut self, handle: CreatureHandle) -> &mut Creature {
        self.region.get_mut(handle).expect("live creature")
    }

    fn id(&self, handle: CreatureHandle) -> CreatureId {
        self.creature(handle).id
    }

    pub fn use_skill(&mut self, attacker: CreatureHandle, skill: SkillId, target: CreatureHandle) -> UseResult {
        let target = self.id(target);
        self.use_skill_on_id(attacker, skill, target)
    }

    pub fn use_skill_on_id(&mut self, attacker: CreatureHandle, skill: SkillId, target: CreatureId) -> UseResult {
        let attacker = self.id(attacker);
        self.region.use_skill(attacker, skill, UseTarget::Entity(target))
    }

    pub fn use_skill_area(&mut self, attacker: CreatureHandle, skill: SkillId, area: u64) -> UseResult {
        let attacker = self.id(attacker);
        self.region.use_skill(attacker, skill, UseTarget::Area(area))
    }

    pub fn prepare(&mut self, handle: CreatureHandle, skill: SkillId) -> bool {
        let id = self.id(handle);
        self.region.prepare_skill(id, skill)
    }

    pub fn ready(&mut self, handle: CreatureHandle, skill: SkillId) -> bool {
        let id = self.id(handle);
        self.region.ready_skill(id, skill)
    }

    pub fn cancel(&mut self, handle: CreatureHandle) -> bool {
        let id = self.id(handle);
        self.region.cancel_skill(id)
    }

    pub fn start(&mut self, handle: CreatureHandle, skill: SkillId) -> bool {
        let id = self.id(handle);
        self.region.start_skill(id, skill)
    }

    pub fn stop(&mut self, handle: CreatureHandle, skill: SkillId) -> bool {
        let id = self.id(handle);
        self.region.stop_skill(id, skill)
    }

    pub fn with_exchange<R>(&mut self, f: impl FnOnce(&mut Exchange<'_>) -> R) -> R {
        self.region.with_exchange(f)
    }

    /// Move the region clock forward and run the tick
    pub fn advance(&mut self, ms: u64) {
        let now = self.region.now() + ms;
        self.region.tick(now).expect("clock moves forward");
    }

    pub fn drain(&mut self) -> Vec<(Audience, Notice)> {
        self.region.drain_notices()
    }

    /// Drain the outbox, keeping only the committed packs
    pub fn packs(&mut self) -> Vec<CombatActionPack> {
        self.drain()
            .into_iter()
            .filter_map(|(_, notice)| match notice {
                Notice::CombatAction(pack) => Some(pack),
                _ => None,
            })
            .collect()
    }
}

/// Listener callback counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Seen {
    pub attacked: usize,
    pub attacks: usize,
    pub on_hit: usize,
    pub used_skill: usize,
}

/// Counts listener callbacks. Clones share the counts.
#[derive(Debug, Clone, Default)]
pub struct RecordingListener {
    seen: Arc<Mutex<Seen>>,
}

impl RecordingListener {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> Seen {
        *self.seen.lock()
    }
}

impl CombatListener for RecordingListener {
    fn on_creature_attacked(&self, _pack: &CombatActionPack, _action: &TargetAction) {
        self.seen.lock().attacked += 1;
    }

    fn on_creature_attacks(&self, _pack: &CombatActionPack, _action: &AttackerAction) {
        self.seen.lock().attacks += 1;
    }

    fn on_hit(&self, _npc: &Creature, _action: &TargetAction) {
        self.seen.lock().on_hit += 1;
    }

    fn on_used_skill(&self, _npc: &Creature, _action: &AttackerAction) {
        self.seen.lock().used_skill += 1;
    }
}
