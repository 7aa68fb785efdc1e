//! World: every live region behind its own lock
//!
//! Exchanges in different regions run in parallel; within a region the
//! mutex serializes them.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use skirmish_core::{RegionId, Timestamp};
use tracing::{info, warn};

use crate::config::CombatConfig;
use crate::handlers::SkillRegistry;
use crate::region::Region;

/// Shared handle to a region
pub type SharedRegion = Arc<Mutex<Region>>;

/// All regions of one server
pub struct World {
    regions: HashMap<RegionId, SharedRegion>,
    config: Arc<CombatConfig>,
    registry: Arc<SkillRegistry>,
}

impl World {
    pub fn new(config: CombatConfig) -> Self {
        Self {
            regions: HashMap::new(),
            config: Arc::new(config),
            registry: Arc::new(SkillRegistry::with_defaults()),
        }
    }

    /// Use a custom skill registry for regions created from now on
    pub fn with_registry(mut self, registry: SkillRegistry) -> Self {
        self.registry = Arc::new(registry);
        self
    }

    pub fn config(&self) -> &CombatConfig {
        &self.config
    }

    /// Create an empty region, or return the existing one
    pub fn create_region(&mut self, id: RegionId) -> SharedRegion {
        let config = Arc::clone(&self.config);
        let registry = Arc::clone(&self.registry);
        let region = self.regions.entry(id).or_insert_with(|| {
            info!("Created {}", id);
            Arc::new(Mutex::new(Region::new(id, config, registry)))
        });
        Arc::clone(region)
    }

    /// Add a prepared region, replacing any region with the same id
    pub fn insert(&mut self, region: Region) -> SharedRegion {
        let id = region.id();
        let shared = Arc::new(Mutex::new(region));
        if self.regions.insert(id, Arc::clone(&shared)).is_some() {
            warn!("Replaced {}", id);
        }
        shared
    }

    pub fn remove(&mut self, id: RegionId) -> Option<SharedRegion> {
        self.regions.remove(&id)
    }

    pub fn region(&self, id: RegionId) -> Option<SharedRegion> {
        self.regions.get(&id).cloned()
    }

    /// Lock a region and run `f` on it
    pub fn with_region<R>(&self, id: RegionId, f: impl FnOnce(&mut Region) -> R) -> Option<R> {
        let region = self.regions.get(&id)?;
        let mut guard = region.lock();
        Some(f(&mut guard))
    }

    /// Tick every region to `now`. Returns how many ticked cleanly.
    pub fn tick_all(&self, now: Timestamp) -> usize {
        let mut ticked = 0;
        for (id, region) in &self.regions {
            match region.lock().tick(now) {
                Ok(()) => ticked += 1,
                Err(e) => warn!("{} skipped tick: {}", id, e),
            }
        }
        ticked
    }

    pub fn region_ids(&self) -> Vec<RegionId> {
        let mut ids: Vec<_> = self.regions.keys().copied().collect();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new(CombatConfig::default())
    }
}
