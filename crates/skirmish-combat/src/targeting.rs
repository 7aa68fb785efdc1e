//! Target lookup and area discovery

use glam::Vec2;
use skirmish_core::geometry::{in_range, is_point_inside_cone};
use skirmish_core::{CreatureHandle, CreatureId, Timestamp};

use crate::creature::Creature;
use crate::store::CreatureStore;
use crate::weapon::SplashArea;

/// Result of resolving a target id
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetLookup {
    Found(CreatureHandle),
    /// No such creature in this region
    Missing,
    /// Just knocked down and can't be hit yet
    NotReady(CreatureHandle),
}

/// Resolve a target id in the region
pub fn find_target(store: &CreatureStore, id: CreatureId, now: Timestamp) -> TargetLookup {
    let Some(handle) = store.resolve(id) else {
        return TargetLookup::Missing;
    };
    match store.get(handle) {
        Some(target) if target.is_not_ready_to_be_hit(now) => TargetLookup::NotReady(handle),
        Some(_) => TargetLookup::Found(handle),
        None => TargetLookup::Missing,
    }
}

/// Whether `attacker` may hit `candidate` with an area attack
fn is_targetable(attacker: &Creature, candidate: &Creature) -> bool {
    attacker.can_attack(candidate) && !candidate.is_invisible()
}

/// Creatures inside a cone in front of `attacker`, excluding `exclude`.
///
/// `facing` must be a unit vector; `area.angle` is the half angle in degrees.
pub fn find_splash_targets(
    store: &CreatureStore,
    attacker: &Creature,
    facing: Vec2,
    area: SplashArea,
    exclude: &[CreatureHandle],
) -> Vec<CreatureHandle> {
    let half_angle = area.angle.to_radians();
    store
        .iter()
        .filter(|c| !exclude.contains(&c.handle))
        .filter(|c| is_targetable(attacker, c))
        .filter(|c| is_point_inside_cone(attacker.position, facing, c.position, half_angle, area.radius))
        .map(|c| c.handle)
        .collect()
}

/// Creatures within `radius` of `attacker`
pub fn targetable_in_range(store: &CreatureStore, attacker: &Creature, radius: f32) -> Vec<CreatureHandle> {
    store
        .iter()
        .filter(|c| is_targetable(attacker, c))
        .filter(|c| in_range(attacker.position, c.position, radius))
        .map(|c| c.handle)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::creature::CreatureKind;

    fn spawn(store: &mut CreatureStore, id: u64, kind: CreatureKind, pos: Vec2) -> CreatureHandle {
        store
            .insert(Creature::new(CreatureId(id), format!("c{id}"), kind).at(pos))
            .unwrap()
    }

    #[test]
    fn test_find_target_states() {
        let mut store = CreatureStore::new();
        let h = spawn(&mut store, 5, CreatureKind::Npc, Vec2::ZERO);
        assert_eq!(find_target(&store, CreatureId(5), Timestamp(0)), TargetLookup::Found(h));
        assert_eq!(find_target(&store, CreatureId(6), Timestamp(0)), TargetLookup::Missing);

        store.get_mut(h).unwrap().not_ready_to_be_hit_time = Timestamp(500);
        assert_eq!(find_target(&store, CreatureId(5), Timestamp(100)), TargetLookup::NotReady(h));
        assert_eq!(find_target(&store, CreatureId(5), Timestamp(500)), TargetLookup::Found(h));
    }

    #[test]
    fn test_cone_splash_excludes_primary_and_outsiders() {
        let mut store = CreatureStore::new();
        let attacker = spawn(&mut store, 1, CreatureKind::Player, Vec2::ZERO);
        let primary = spawn(&mut store, 2, CreatureKind::Npc, Vec2::new(100.0, 0.0));
        let left = spawn(&mut store, 3, CreatureKind::Npc, Vec2::new(120.0, 60.0));
        let right = spawn(&mut store, 4, CreatureKind::Npc, Vec2::new(120.0, -60.0));
        let _outside = spawn(&mut store, 5, CreatureKind::Npc, Vec2::new(20.0, 150.0));

        let attacker_ref = store.get(attacker).unwrap();
        let area = SplashArea {
            radius: 200.0,
            angle: 60.0,
        };
        let mut splash = find_splash_targets(&store, attacker_ref, Vec2::X, area, &[primary]);
        splash.sort_by_key(|h| h.index());
        assert_eq!(splash, vec![left, right]);
    }

    #[test]
    fn test_area_skips_allies_and_invisible() {
        let mut store = CreatureStore::new();
        let attacker = spawn(&mut store, 1, CreatureKind::Player, Vec2::ZERO);
        let foe = spawn(&mut store, 2, CreatureKind::Npc, Vec2::new(100.0, 0.0));
        let _ally = spawn(&mut store, 3, CreatureKind::Player, Vec2::new(0.0, 100.0));
        let hidden = spawn(&mut store, 4, CreatureKind::Npc, Vec2::new(-100.0, 0.0));
        let _far = spawn(&mut store, 5, CreatureKind::Npc, Vec2::new(900.0, 0.0));
        store
            .get_mut(hidden)
            .unwrap()
            .conditions
            .insert(crate::creature::Conditions::INVISIBLE);

        let attacker_ref = store.get(attacker).unwrap();
        assert_eq!(targetable_in_range(&store, attacker_ref, 300.0), vec![foe]);
    }
}
