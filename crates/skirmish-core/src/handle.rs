use std::fmt;

use serde::{Deserialize, Serialize};

/// A generational creature handle. Compact u32 index + generation.
///
/// A handle outliving its creature never resolves to whoever reuses the slot,
/// so it doubles as a weak back-reference.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CreatureHandle {
    index: u32,
    generation: u32,
}

impl CreatureHandle {
    /// Create a handle from raw parts (mainly for testing).
    pub fn from_raw(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    /// The slot index of this handle.
    pub fn index(&self) -> u32 {
        self.index
    }

    /// The generation of this handle (incremented on reuse).
    pub fn generation(&self) -> u32 {
        self.generation
    }
}

impl fmt::Debug for CreatureHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Creature({}v{})", self.index, self.generation)
    }
}

impl fmt::Display for CreatureHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}v{}", self.index, self.generation)
    }
}

/// Allocates and recycles creature slots with generational tracking.
#[derive(Debug, Clone)]
pub struct HandleAllocator {
    generations: Vec<u32>,
    alive: Vec<bool>,
    free_list: Vec<u32>,
    len: usize,
}

impl HandleAllocator {
    pub fn new() -> Self {
        Self {
            generations: Vec::new(),
            alive: Vec::new(),
            free_list: Vec::new(),
            len: 0,
        }
    }

    /// Allocate a new handle, reusing a freed slot if available.
    pub fn allocate(&mut self) -> CreatureHandle {
        self.len += 1;
        if let Some(index) = self.free_list.pop() {
            self.alive[index as usize] = true;
            CreatureHandle {
                index,
                generation: self.generations[index as usize],
            }
        } else {
            let index = self.generations.len() as u32;
            self.generations.push(0);
            self.alive.push(true);
            CreatureHandle {
                index,
                generation: 0,
            }
        }
    }

    /// Release a handle. Returns `true` if it was alive.
    pub fn deallocate(&mut self, handle: CreatureHandle) -> bool {
        if !self.is_alive(handle) {
            return false;
        }
        let idx = handle.index as usize;
        self.alive[idx] = false;
        self.generations[idx] += 1;
        self.free_list.push(handle.index);
        self.len -= 1;
        true
    }

    /// Check if a handle still refers to a live slot.
    pub fn is_alive(&self, handle: CreatureHandle) -> bool {
        let idx = handle.index as usize;
        idx < self.alive.len() && self.alive[idx] && self.generations[idx] == handle.generation
    }

    /// Number of live handles.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether there are no live handles.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl Default for HandleAllocator {
    fn default() -> Self {
        Self::new()
    }
}
