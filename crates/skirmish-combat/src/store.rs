//! Region creature storage

use std::collections::HashMap;

use skirmish_core::{CreatureHandle, CreatureId, HandleAllocator};

use crate::creature::Creature;
use crate::error::CombatError;

/// Creatures of one region, addressed by generational handle.
#[derive(Debug, Default)]
pub struct CreatureStore {
    handles: HandleAllocator,
    slots: Vec<Option<Creature>>,
    by_id: HashMap<CreatureId, CreatureHandle>,
}

impl CreatureStore {
    pub fn new() -> Self {
        Self::default()
    }

    // ---- Membership ----

    /// Add a creature, assigning its handle.
    pub fn insert(&mut self, mut creature: Creature) -> Result<CreatureHandle, CombatError> {
        if self.by_id.contains_key(&creature.id) {
            return Err(CombatError::DuplicateCreature(creature.id));
        }

        let handle = self.handles.allocate();
        creature.handle = handle;
        self.by_id.insert(creature.id, handle);

        let idx = handle.index() as usize;
        if idx >= self.slots.len() {
            self.slots.resize_with(idx + 1, || None);
        }
        self.slots[idx] = Some(creature);
        Ok(handle)
    }

    /// Remove a creature. Its handle never resolves again.
    pub fn remove(&mut self, handle: CreatureHandle) -> Option<Creature> {
        if !self.handles.deallocate(handle) {
            return None;
        }
        let creature = self.slots[handle.index() as usize].take()?;
        self.by_id.remove(&creature.id);
        Some(creature)
    }

    pub fn contains(&self, handle: CreatureHandle) -> bool {
        self.handles.is_alive(handle)
    }

    /// Handle of the creature with a protocol id
    pub fn resolve(&self, id: CreatureId) -> Option<CreatureHandle> {
        self.by_id.get(&id).copied()
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    // ---- Access ----

    pub fn get(&self, handle: CreatureHandle) -> Option<&Creature> {
        if !self.handles.is_alive(handle) {
            return None;
        }
        self.slots.get(handle.index() as usize)?.as_ref()
    }

    pub fn get_mut(&mut self, handle: CreatureHandle) -> Option<&mut Creature> {
        if !self.handles.is_alive(handle) {
            return None;
        }
        self.slots.get_mut(handle.index() as usize)?.as_mut()
    }

    /// Two distinct creatures at once.
    pub fn pair_mut(
        &mut self,
        a: CreatureHandle,
        b: CreatureHandle,
    ) -> Option<(&mut Creature, &mut Creature)> {
        if a.index() == b.index() || !self.contains(a) || !self.contains(b) {
            return None;
        }
        let (ia, ib) = (a.index() as usize, b.index() as usize);
        if ia < ib {
            let (lo, hi) = self.slots.split_at_mut(ib);
            Some((lo[ia].as_mut()?, hi[0].as_mut()?))
        } else {
            let (lo, hi) = self.slots.split_at_mut(ia);
            let (first, second) = (hi[0].as_mut()?, lo[ib].as_mut()?);
            Some((first, second))
        }
    }

    /// All live creatures
    pub fn iter(&self) -> impl Iterator<Item = &Creature> {
        self.slots.iter().filter_map(|slot| slot.as_ref())
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Creature> {
        self.slots.iter_mut().filter_map(|slot| slot.as_mut())
    }

    /// Handles of all live creatures
    pub fn handles(&self) -> Vec<CreatureHandle> {
        self.iter().map(|c| c.handle).collect()
    }
}
