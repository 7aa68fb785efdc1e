//! Stun and stability tables
//!
//! Closed lookup tables keyed by (hit count, attack speed). Hit count is the
//! weapon's knock count plus one, or the race's when fighting bare-handed.

use tracing::warn;

use crate::weapon::AttackSpeed;

/// Attacker stun when the hit knocks the target back
pub const ATTACKER_KNOCKBACK_STUN: u32 = 2500;
/// Target stun when the hit knocks the target back
pub const TARGET_KNOCKBACK_STUN: u32 = 3000;

const DEFAULT_ATTACKER_STUN: u32 = 600;
const DEFAULT_TARGET_STUN: u32 = 2000;
const DEFAULT_STABILITY_REDUCTION: f32 = 105.0;

// Same for every hit count from 2 to 5, columns VerySlow..VeryFast
const ATTACKER_STUN: [u32; 5] = [1000, 800, 600, 520, 450];

// Rows are hit counts 2-5
const TARGET_STUN: [[u32; 5]; 4] = [
    [3000, 2800, 2600, 2400, 2200],
    [2200, 2100, 2000, 1700, 1500],
    [1900, 1800, 1700, 1500, 1300],
    [1700, 1600, 1500, 1400, 1200],
];

const STABILITY_REDUCTION: [[f32; 5]; 4] = [
    [67.0, 65.0, 65.0, 65.0, 65.0],
    [55.0, 52.0, 50.0, 49.0, 48.0],
    [42.0, 40.0, 39.0, 36.0, 37.0],
    [36.0, 33.0, 31.5, 30.0, 29.5],
];

/// Stun applied to the attacker after a hit
pub fn attacker_stun(hit_count: u8, speed: AttackSpeed, knockback: bool) -> u32 {
    if knockback {
        return ATTACKER_KNOCKBACK_STUN;
    }
    match hit_count {
        1 if speed == AttackSpeed::VerySlow => ATTACKER_KNOCKBACK_STUN,
        2..=5 => ATTACKER_STUN[speed.index()],
        _ => {
            warn!(
                "No attacker stun for {} hits at {:?}, using {}ms",
                hit_count, speed, DEFAULT_ATTACKER_STUN
            );
            DEFAULT_ATTACKER_STUN
        }
    }
}

/// Stun applied to the target of a hit
pub fn target_stun(hit_count: u8, speed: AttackSpeed, knockback: bool) -> u32 {
    if knockback {
        return TARGET_KNOCKBACK_STUN;
    }
    match hit_count {
        1 if speed == AttackSpeed::VerySlow => TARGET_KNOCKBACK_STUN,
        2..=5 => TARGET_STUN[hit_count as usize - 2][speed.index()],
        _ => {
            warn!(
                "No target stun for {} hits at {:?}, using {}ms",
                hit_count, speed, DEFAULT_TARGET_STUN
            );
            DEFAULT_TARGET_STUN
        }
    }
}

/// Stability a target loses per full combo
pub fn stability_reduction(hit_count: u8, speed: AttackSpeed) -> f32 {
    match hit_count {
        2..=5 => STABILITY_REDUCTION[hit_count as usize - 2][speed.index()],
        _ => DEFAULT_STABILITY_REDUCTION,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_knockback_overrides() {
        assert_eq!(attacker_stun(3, AttackSpeed::Fast, true), 2500);
        assert_eq!(target_stun(3, AttackSpeed::Fast, true), 3000);
    }

    #[test]
    fn test_table_lookups() {
        assert_eq!(attacker_stun(3, AttackSpeed::Normal, false), 600);
        assert_eq!(attacker_stun(5, AttackSpeed::VeryFast, false), 450);
        assert_eq!(target_stun(2, AttackSpeed::Normal, false), 2600);
        assert_eq!(target_stun(5, AttackSpeed::VeryFast, false), 1200);
        assert_eq!(stability_reduction(5, AttackSpeed::Normal), 31.5);
        assert_eq!(stability_reduction(1, AttackSpeed::Normal), 105.0);
    }

    #[test]
    fn test_single_hit_very_slow() {
        assert_eq!(attacker_stun(1, AttackSpeed::VerySlow, false), 2500);
        assert_eq!(target_stun(1, AttackSpeed::VerySlow, false), 3000);
    }

    #[test]
    fn test_unknown_combination_falls_back() {
        assert_eq!(attacker_stun(9, AttackSpeed::Normal, false), 600);
        assert_eq!(target_stun(1, AttackSpeed::Fast, false), 2000);
    }

    #[test]
    fn test_faster_weapons_stun_less() {
        for hits in 2..=5 {
            let slow = target_stun(hits, AttackSpeed::VerySlow, false);
            let fast = target_stun(hits, AttackSpeed::VeryFast, false);
            assert!(slow > fast, "{} hits: {} <= {}", hits, slow, fast);
        }
    }
}
