//! Combat tuning shared by every region

use serde::{Deserialize, Serialize};

use crate::weapon::SplashArea;

/// Server-wide combat configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CombatConfig {
    /// Upper bound for stun applied to player targets (ms)
    pub max_player_target_stun: u32,
    /// How far a knocked back target is shoved
    pub knockback_distance: f32,
    /// Fraction of a knockdown stun during which the target can't be hit again
    pub not_ready_to_be_hit_factor: f32,
    /// Recovery fires this long before the knockdown stun runs out (ms)
    pub get_up_lead: u32,
    /// Cone in front of a bare-handed attacker checked for ready
    /// Counterattacks. Bare hands never splash damage.
    pub bare_hand_splash: SplashArea,
    /// Splash cone for ranged shots without one on the weapon
    pub ranged_splash: SplashArea,
    /// Ranged skills don't use up ammunition
    pub infinite_arrows: bool,
    /// Renewal-era rules (shorter counter stun, counter cooldowns)
    pub combat_renewal: bool,
    /// Seed for region dice, entropy when unset
    pub rng_seed: Option<u64>,
}

impl Default for CombatConfig {
    fn default() -> Self {
        Self {
            max_player_target_stun: 2000,
            knockback_distance: 450.0,
            not_ready_to_be_hit_factor: 0.55,
            get_up_lead: 1000,
            bare_hand_splash: SplashArea {
                radius: 204.0,
                angle: 60.0,
            },
            ranged_splash: SplashArea {
                radius: 200.0,
                angle: 20.0,
            },
            infinite_arrows: false,
            combat_renewal: true,
            rng_seed: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = CombatConfig::default();
        assert_eq!(config.max_player_target_stun, 2000);
        assert_eq!(config.bare_hand_splash.radius, 204.0);
        assert!(config.rng_seed.is_none());
    }
}
