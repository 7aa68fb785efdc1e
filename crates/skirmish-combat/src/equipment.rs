//! Equipped hands and ammunition
//!
//! Validates two-handed conflicts and exposes the weapon queries combat needs:
//! dual wielding, ranged checks, shield bonuses, wear and ammunition.

use serde::{Deserialize, Serialize};

use crate::weapon::{Weapon, WeaponType};

/// Error when equipping a weapon
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EquipError {
    #[error("Two-handed weapon requires both hands")]
    TwoHandedConflict,

    #[error("Cannot equip off-hand with a two-handed main weapon")]
    MainHandIsTwoHanded,

    #[error("{0:?} cannot be held in the left hand")]
    NotOffHand(WeaponType),
}

/// Arrows, bolts or bullets
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Magazine {
    pub name: String,
    pub count: u32,
}

/// A combatant's hands and magazine
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Equipment {
    pub right_hand: Option<Weapon>,
    pub left_hand: Option<Weapon>,
    pub magazine: Option<Magazine>,
}

impl Equipment {
    /// Create empty hands
    pub fn new() -> Self {
        Self::default()
    }

    /// Equip the right hand. Returns the previously held weapon.
    pub fn equip_right(&mut self, weapon: Weapon) -> Result<Option<Weapon>, EquipError> {
        if weapon.is_two_handed() && self.left_hand.is_some() {
            return Err(EquipError::TwoHandedConflict);
        }
        Ok(self.right_hand.replace(weapon))
    }

    /// Equip the left hand. Returns the previously held weapon.
    pub fn equip_left(&mut self, weapon: Weapon) -> Result<Option<Weapon>, EquipError> {
        if self.right_hand.as_ref().is_some_and(|w| w.is_two_handed()) {
            return Err(EquipError::MainHandIsTwoHanded);
        }
        if weapon.is_two_handed() || weapon.weapon_type.is_ranged() {
            return Err(EquipError::NotOffHand(weapon.weapon_type));
        }
        Ok(self.left_hand.replace(weapon))
    }

    /// Load ammunition
    pub fn load(&mut self, magazine: Magazine) -> Option<Magazine> {
        self.magazine.replace(magazine)
    }

    /// Both hands hold swingable weapons
    pub fn is_dual_wielding(&self) -> bool {
        match (&self.right_hand, &self.left_hand) {
            (Some(_), Some(left)) => left.weapon_type.is_edged() || left.weapon_type.is_blunt(),
            _ => false,
        }
    }

    /// Main weapon is a bow, crossbow or gun
    pub fn has_ranged_weapon(&self) -> bool {
        self.right_hand
            .as_ref()
            .is_some_and(|w| w.weapon_type.is_ranged())
    }

    pub fn has_gun(&self) -> bool {
        self.right_hand
            .as_ref()
            .is_some_and(|w| w.weapon_type == WeaponType::Gun)
    }

    pub fn has_knuckles(&self) -> bool {
        self.right_hand
            .as_ref()
            .is_some_and(|w| w.weapon_type == WeaponType::Knuckle)
    }

    pub fn has_two_handed(&self) -> bool {
        self.right_hand.as_ref().is_some_and(|w| w.is_two_handed())
    }

    /// The shield in the left hand, if any
    pub fn shield(&self) -> Option<&Weapon> {
        self.left_hand
            .as_ref()
            .filter(|w| w.weapon_type == WeaponType::Shield)
    }

    /// Critical defense granted by a shield
    pub fn shield_defense_critical(&self) -> f32 {
        self.shield().map(|s| s.defense_critical).unwrap_or(0.0)
    }

    /// Mana shield bonus granted by a shield
    pub fn shield_melee_passive_bonus(&self) -> f32 {
        self.shield().map(|s| s.melee_passive_bonus).unwrap_or(0.0)
    }

    /// Wear the weapons that took part in a hit
    pub fn update_weapon_wear(&mut self, left_hand_used: bool) {
        if let Some(right) = self.right_hand.as_mut() {
            right.wear(WEAR_PER_HIT);
        }
        if left_hand_used {
            if let Some(left) = self.left_hand.as_mut() {
                left.wear(WEAR_PER_HIT);
            }
        }
    }

    /// Use up one round. Returns `false` when the magazine is empty.
    pub fn consume_ammo(&mut self) -> bool {
        match self.magazine.as_mut() {
            Some(mag) if mag.count > 0 => {
                mag.count -= 1;
                true
            }
            _ => false,
        }
    }

    /// Rounds left
    pub fn ammo(&self) -> u32 {
        self.magazine.as_ref().map(|m| m.count).unwrap_or(0)
    }
}

/// Durability lost per landed hit
pub const WEAR_PER_HIT: f32 = 1.0;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::weapon::DamageRange;

    fn make_weapon(weapon_type: WeaponType) -> Weapon {
        Weapon::new(weapon_type.name(), weapon_type, DamageRange::new(10.0, 20.0))
    }

    #[test]
    fn test_dual_wield_detection() {
        let mut eq = Equipment::new();
        eq.equip_right(make_weapon(WeaponType::Sword)).unwrap();
        assert!(!eq.is_dual_wielding());

        eq.equip_left(make_weapon(WeaponType::Shield)).unwrap();
        assert!(!eq.is_dual_wielding());

        eq.equip_left(make_weapon(WeaponType::Dagger)).unwrap();
        assert!(eq.is_dual_wielding());
    }

    #[test]
    fn test_two_handed_conflicts() {
        let mut eq = Equipment::new();
        eq.equip_right(make_weapon(WeaponType::Greatsword)).unwrap();
        assert_eq!(
            eq.equip_left(make_weapon(WeaponType::Dagger)).map(|_| ()),
            Err(EquipError::MainHandIsTwoHanded)
        );

        let mut eq = Equipment::new();
        eq.equip_left(make_weapon(WeaponType::Shield)).unwrap();
        assert_eq!(
            eq.equip_right(make_weapon(WeaponType::Hammer)).map(|_| ()),
            Err(EquipError::TwoHandedConflict)
        );
    }

    #[test]
    fn test_shield_bonuses() {
        let mut eq = Equipment::new();
        let mut shield = make_weapon(WeaponType::Shield);
        shield.defense_critical = 5.0;
        shield.melee_passive_bonus = 12.0;
        eq.equip_left(shield).unwrap();
        assert_eq!(eq.shield_defense_critical(), 5.0);
        assert_eq!(eq.shield_melee_passive_bonus(), 12.0);
    }

    #[test]
    fn test_ammo_consumption() {
        let mut eq = Equipment::new();
        eq.load(Magazine {
            name: "Arrow".into(),
            count: 1,
        });
        assert!(eq.consume_ammo());
        assert!(!eq.consume_ammo());
        assert_eq!(eq.ammo(), 0);
    }
}
