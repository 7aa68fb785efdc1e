//! Weapon types and properties
//!
//! Weapon kind, grip, speed class, knock count and splash shape feed the
//! stun tables, interception arbitration and area targeting.

use serde::{Deserialize, Serialize};

/// The weapon kinds combat cares about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WeaponType {
    Sword,
    Axe,
    Mace,
    Dagger,
    Knuckle,
    Greatsword,
    Hammer,
    Bow,
    Crossbow,
    Gun,
    Shield,
}

/// Whether the weapon is one-handed or two-handed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WeaponGrip {
    OneHanded,
    TwoHanded,
}

/// Attack speed class, one of the stun table keys
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AttackSpeed {
    VerySlow,
    Slow,
    Normal,
    Fast,
    VeryFast,
}

impl AttackSpeed {
    /// Column index into the stun tables
    pub fn index(self) -> usize {
        match self {
            Self::VerySlow => 0,
            Self::Slow => 1,
            Self::Normal => 2,
            Self::Fast => 3,
            Self::VeryFast => 4,
        }
    }

    /// Speed class whose column index is closest to `index`
    pub fn from_index(index: usize) -> Self {
        match index {
            0 => Self::VerySlow,
            1 => Self::Slow,
            2 => Self::Normal,
            3 => Self::Fast,
            _ => Self::VeryFast,
        }
    }
}

impl WeaponType {
    /// Whether this weapon is one-handed or two-handed
    pub fn grip(self) -> WeaponGrip {
        match self {
            Self::Greatsword | Self::Hammer | Self::Bow | Self::Crossbow => WeaponGrip::TwoHanded,
            _ => WeaponGrip::OneHanded,
        }
    }

    /// Bladed weapons
    pub fn is_edged(self) -> bool {
        matches!(self, Self::Sword | Self::Axe | Self::Dagger | Self::Greatsword)
    }

    /// Blunt weapons
    pub fn is_blunt(self) -> bool {
        matches!(self, Self::Mace | Self::Hammer | Self::Knuckle)
    }

    /// Bows and crossbows
    pub fn is_bow(self) -> bool {
        matches!(self, Self::Bow | Self::Crossbow)
    }

    /// Weapons that can't be swung in melee
    pub fn is_ranged(self) -> bool {
        self.is_bow() || self == Self::Gun
    }

    /// Display name
    pub fn name(self) -> &'static str {
        match self {
            Self::Sword => "Sword",
            Self::Axe => "Axe",
            Self::Mace => "Mace",
            Self::Dagger => "Dagger",
            Self::Knuckle => "Knuckle",
            Self::Greatsword => "Greatsword",
            Self::Hammer => "Hammer",
            Self::Bow => "Bow",
            Self::Crossbow => "Crossbow",
            Self::Gun => "Gun",
            Self::Shield => "Shield",
        }
    }
}

/// Inclusive damage range
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct DamageRange {
    pub min: f32,
    pub max: f32,
}

impl DamageRange {
    pub fn new(min: f32, max: f32) -> Self {
        Self {
            min: min.min(max),
            max: max.max(min),
        }
    }

    /// Midpoint of the range
    pub fn average(&self) -> f32 {
        (self.min + self.max) / 2.0
    }

    /// Sum of two ranges
    pub fn plus(self, other: DamageRange) -> DamageRange {
        DamageRange::new(self.min + other.min, self.max + other.max)
    }
}

/// Splash cone of a weapon
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SplashArea {
    /// Reach of the cone
    pub radius: f32,
    /// Half angle in degrees
    pub angle: f32,
}

/// A single equipped weapon (or shield)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Weapon {
    pub name: String,
    pub weapon_type: WeaponType,
    pub damage: DamageRange,
    /// Critical rate bonus in percent
    pub critical: f32,
    pub attack_speed: AttackSpeed,
    /// Extra hits per combo; hit count is this plus one
    pub knock_count: u8,
    /// Stamina used per swing
    pub stamina_usage: f32,
    pub splash: Option<SplashArea>,
    /// Critical defense from shields, in percent
    pub defense_critical: f32,
    /// Flat mana shield bonus from shields
    pub melee_passive_bonus: f32,
    /// Remaining durability points
    pub durability: f32,
}

impl Weapon {
    /// Create a weapon with the usual defaults for its type
    pub fn new(name: impl Into<String>, weapon_type: WeaponType, damage: DamageRange) -> Self {
        let (attack_speed, knock_count) = match weapon_type.grip() {
            WeaponGrip::TwoHanded => (AttackSpeed::Slow, 1),
            WeaponGrip::OneHanded => (AttackSpeed::Normal, 2),
        };
        Self {
            name: name.into(),
            weapon_type,
            damage,
            critical: 0.0,
            attack_speed,
            knock_count,
            stamina_usage: 0.7,
            splash: None,
            defense_critical: 0.0,
            melee_passive_bonus: 0.0,
            durability: 10_000.0,
        }
    }

    /// Number of hits before a combo finisher
    pub fn hit_count(&self) -> u8 {
        self.knock_count.saturating_add(1)
    }

    pub fn is_two_handed(&self) -> bool {
        self.weapon_type.grip() == WeaponGrip::TwoHanded
    }

    /// Wear from one landed hit
    pub fn wear(&mut self, amount: f32) {
        self.durability = (self.durability - amount).max(0.0);
    }
}
