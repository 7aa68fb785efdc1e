//! Deferred recovery
//!
//! Knocked down creatures get back up some time after the hit. Tasks sit in
//! a per-region delay queue ordered by fire time, then by insertion order,
//! and are drained by the region tick. Tasks only hold generational handles,
//! so a creature removed in the meantime is simply skipped.

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

use skirmish_core::{CreatureHandle, Timestamp};

/// What to do when a task fires
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecoveryKind {
    /// Stand back up after a knockdown
    GetUp,
}

/// A scheduled recovery
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecoveryTask {
    pub fire_at: Timestamp,
    pub creature: CreatureHandle,
    pub kind: RecoveryKind,
    seq: u64,
}

impl PartialOrd for RecoveryTask {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for RecoveryTask {
    fn cmp(&self, other: &Self) -> Ordering {
        self.fire_at
            .cmp(&other.fire_at)
            .then(self.seq.cmp(&other.seq))
    }
}

/// Region-owned delay queue
#[derive(Debug, Default)]
pub struct RecoveryQueue {
    pending: BinaryHeap<Reverse<RecoveryTask>>,
    next_seq: u64,
}

impl RecoveryQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule a task
    pub fn schedule(&mut self, creature: CreatureHandle, kind: RecoveryKind, fire_at: Timestamp) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.pending.push(Reverse(RecoveryTask {
            fire_at,
            creature,
            kind,
            seq,
        }));
    }

    /// Schedule a get-up `delay_ms` after `now`
    pub fn schedule_get_up(&mut self, creature: CreatureHandle, now: Timestamp, delay_ms: u64) {
        self.schedule(creature, RecoveryKind::GetUp, now + delay_ms);
    }

    /// Remove and return every task due at `now`, in firing order
    pub fn take_due(&mut self, now: Timestamp) -> Vec<RecoveryTask> {
        let mut due = Vec::new();
        while let Some(Reverse(task)) = self.pending.peek() {
            if task.fire_at > now {
                break;
            }
            let task = *task;
            self.pending.pop();
            due.push(task);
        }
        due
    }

    /// Drop every task for a creature. Returns how many were cancelled.
    pub fn cancel_for(&mut self, creature: CreatureHandle) -> usize {
        let before = self.pending.len();
        self.pending.retain(|Reverse(task)| task.creature != creature);
        before - self.pending.len()
    }

    /// Fire time of the earliest task
    pub fn next_due(&self) -> Option<Timestamp> {
        self.pending.peek().map(|Reverse(task)| task.fire_at)
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tasks_fire_in_time_order() {
        let mut queue = RecoveryQueue::new();
        let a = CreatureHandle::from_raw(0, 0);
        let b = CreatureHandle::from_raw(1, 0);
        queue.schedule_get_up(a, Timestamp(0), 2000);
        queue.schedule_get_up(b, Timestamp(0), 1000);

        assert_eq!(queue.next_due(), Some(Timestamp(1000)));
        assert!(queue.take_due(Timestamp(999)).is_empty());

        let due = queue.take_due(Timestamp(2500));
        assert_eq!(due.len(), 2);
        assert_eq!(due[0].creature, b);
        assert_eq!(due[1].creature, a);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_same_time_keeps_insertion_order() {
        let mut queue = RecoveryQueue::new();
        let handles: Vec<_> = (0..4).map(|i| CreatureHandle::from_raw(i, 0)).collect();
        for &h in &handles {
            queue.schedule_get_up(h, Timestamp(100), 500);
        }
        let fired: Vec<_> = queue.take_due(Timestamp(600)).iter().map(|t| t.creature).collect();
        assert_eq!(fired, handles);
    }

    #[test]
    fn test_cancel_for_creature() {
        let mut queue = RecoveryQueue::new();
        let a = CreatureHandle::from_raw(0, 0);
        let b = CreatureHandle::from_raw(1, 0);
        queue.schedule_get_up(a, Timestamp(0), 100);
        queue.schedule_get_up(a, Timestamp(0), 200);
        queue.schedule_get_up(b, Timestamp(0), 300);

        assert_eq!(queue.cancel_for(a), 2);
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.take_due(Timestamp(1000))[0].creature, b);
    }
}
