//! Combatant state
//!
//! Everything a combat exchange reads or writes on a creature: vitals,
//! stun and knockdown timers, stability, position, equipment, skills, and the
//! transient interception fields.

use bitflags::bitflags;
use glam::Vec2;
use serde::{Deserialize, Serialize};
use skirmish_core::geometry::{self, byte_to_direction, direction_to_byte};
use skirmish_core::{CreatureHandle, CreatureId, Timestamp};

use crate::dice::Dice;
use crate::equipment::Equipment;
use crate::skill::{SkillId, SkillSet};
use crate::weapon::{AttackSpeed, DamageRange, Weapon};

/// Lowest stability a creature can drop to
pub const MIN_STABILITY: f32 = -10.0;
/// Highest stability, restored on getting up
pub const MAX_STABILITY: f32 = 100.0;
/// Below this a creature is unstable and further hits knock it down
pub const UNSTABLE_THRESHOLD: f32 = 30.0;

/// Players and NPCs differ in stun caps and AI hooks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CreatureKind {
    Player,
    Npc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Race {
    Human,
    Elf,
    Giant,
    Monster,
}

bitflags! {
    /// Ongoing conditions relevant to combat
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct Conditions: u8 {
        const MANA_SHIELD = 1 << 0;
        const INVISIBLE = 1 << 1;
        const RESTING = 1 << 2;
        const LOCK_RUN = 1 << 3;
    }
}

/// Base damage and defense figures
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CombatStats {
    /// Unarmed damage, added to every weapon roll
    pub bare_hand: DamageRange,
    /// Critical rate in percent
    pub critical: f32,
    /// Flat damage reduction, also lowers the attacker's critical chance
    pub protection: f32,
    /// Percentage damage reduction
    pub defense: f32,
}

impl Default for CombatStats {
    fn default() -> Self {
        Self {
            bare_hand: DamageRange::new(5.0, 10.0),
            critical: 10.0,
            protection: 0.0,
            defense: 0.0,
        }
    }
}

/// A creature taking part in combat
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Creature {
    pub id: CreatureId,
    /// Assigned by the region on spawn
    pub handle: CreatureHandle,
    pub name: String,
    pub kind: CreatureKind,
    pub race: Race,
    /// Creatures of the same faction can't attack each other
    pub faction: u32,

    pub position: Vec2,
    /// Byte direction, 0-255 for a full turn
    pub direction: u8,
    pub body_radius: f32,
    /// Melee reach before the target's body radius
    pub attack_range: f32,

    pub life: f32,
    pub life_max: f32,
    pub mana: f32,
    pub mana_max: f32,
    pub stamina: f32,
    pub stamina_max: f32,
    pub stats: CombatStats,

    pub stability: f32,
    stun: u32,
    stun_set_at: Timestamp,
    pub knock_down_time: Timestamp,
    pub not_ready_to_be_hit_time: Timestamp,
    pub attack_delay_time: Timestamp,
    pub was_knocked_back: bool,
    pub last_knocked_back_by: Option<CreatureHandle>,
    pub knockdown_immune: bool,

    /// Skill this creature is intercepting with, cleared after the exchange
    pub intercepting_skill_id: Option<SkillId>,
    /// Skip the next range check, cleared after the exchange
    pub ignore_attack_range: bool,

    pub in_battle_stance: bool,
    pub target: Option<CreatureHandle>,
    pub attempting_attack: bool,
    pub aggro_target: Option<CreatureHandle>,

    pub conditions: Conditions,
    pub equipment: Equipment,
    pub skills: SkillSet,

    /// Hit count and speed when fighting without a weapon
    pub race_knock_count: u8,
    pub race_attack_speed: AttackSpeed,

    /// When the current aim started, for ranged skills
    pub aiming_since: Option<Timestamp>,
    /// Next ranged shot is a fire arrow
    pub fire_arrow: bool,
}

impl Creature {
    /// Create a creature with full vitals and default stats
    pub fn new(id: CreatureId, name: impl Into<String>, kind: CreatureKind) -> Self {
        Self {
            id,
            handle: CreatureHandle::from_raw(u32::MAX, 0),
            name: name.into(),
            kind,
            race: if kind == CreatureKind::Player {
                Race::Human
            } else {
                Race::Monster
            },
            faction: if kind == CreatureKind::Player { 0 } else { 1 },
            position: Vec2::ZERO,
            direction: 0,
            body_radius: 25.0,
            attack_range: 100.0,
            life: 100.0,
            life_max: 100.0,
            mana: 50.0,
            mana_max: 50.0,
            stamina: 50.0,
            stamina_max: 50.0,
            stats: CombatStats::default(),
            stability: MAX_STABILITY,
            stun: 0,
            stun_set_at: Timestamp::ZERO,
            knock_down_time: Timestamp::ZERO,
            not_ready_to_be_hit_time: Timestamp::ZERO,
            attack_delay_time: Timestamp::ZERO,
            was_knocked_back: false,
            last_knocked_back_by: None,
            knockdown_immune: false,
            intercepting_skill_id: None,
            ignore_attack_range: false,
            in_battle_stance: false,
            target: None,
            attempting_attack: false,
            aggro_target: None,
            conditions: Conditions::empty(),
            equipment: Equipment::new(),
            skills: SkillSet::new(),
            race_knock_count: 2,
            race_attack_speed: AttackSpeed::Normal,
            aiming_since: None,
            fire_arrow: false,
        }
    }

    /// Set life, mana and stamina maxima and fill them up
    pub fn with_vitals(mut self, life: f32, mana: f32, stamina: f32) -> Self {
        self.life = life;
        self.life_max = life;
        self.mana = mana;
        self.mana_max = mana;
        self.stamina = stamina;
        self.stamina_max = stamina;
        self
    }

    pub fn at(mut self, position: Vec2) -> Self {
        self.position = position;
        self
    }

    pub fn is_player(&self) -> bool {
        self.kind == CreatureKind::Player
    }

    pub fn is_dead(&self) -> bool {
        self.life <= 0.0
    }

    pub fn is_invisible(&self) -> bool {
        self.conditions.contains(Conditions::INVISIBLE)
    }

    // ---- Timers ----

    /// Write a stun of `ms` milliseconds starting now
    pub fn set_stun(&mut self, now: Timestamp, ms: u32) {
        self.stun = ms;
        self.stun_set_at = now;
    }

    /// Stun left at `now`
    pub fn stun_remaining(&self, now: Timestamp) -> u32 {
        let end = self.stun_set_at + self.stun as u64;
        now.until(end) as u32
    }

    pub fn is_stunned(&self, now: Timestamp) -> bool {
        self.stun_remaining(now) > 0
    }

    pub fn is_knocked_down(&self, now: Timestamp) -> bool {
        now < self.knock_down_time
    }

    /// Just knocked down, can't be hit yet
    pub fn is_not_ready_to_be_hit(&self, now: Timestamp) -> bool {
        now < self.not_ready_to_be_hit_time
    }

    pub fn is_on_attack_delay(&self, now: Timestamp) -> bool {
        now < self.attack_delay_time
    }

    pub fn is_unstable(&self) -> bool {
        self.stability < UNSTABLE_THRESHOLD
    }

    /// Lower stability, never below [`MIN_STABILITY`]
    pub fn reduce_stability(&mut self, amount: f32) {
        self.stability = (self.stability - amount).max(MIN_STABILITY);
    }

    /// Stand up after a knockdown
    pub fn get_back_up(&mut self, now: Timestamp) {
        if self.knock_down_time > now {
            self.knock_down_time = now;
        }
        self.stability = MAX_STABILITY;
        self.was_knocked_back = false;
    }

    // ---- Relations ----

    /// Whether this creature may attack `other`
    pub fn can_attack(&self, other: &Creature) -> bool {
        self.handle != other.handle
            && !self.is_dead()
            && !other.is_dead()
            && self.faction != other.faction
    }

    /// Reach against `other`, measured center to center
    pub fn attack_range_for(&self, other: &Creature) -> f32 {
        let reach = if self.equipment.has_ranged_weapon() {
            RANGED_ATTACK_RANGE
        } else {
            self.attack_range
        };
        reach + self.body_radius + other.body_radius
    }

    pub fn in_attack_range(&self, other: &Creature) -> bool {
        geometry::in_range(self.position, other.position, self.attack_range_for(other))
    }

    /// Face a point
    pub fn turn_to(&mut self, point: Vec2) {
        let offset = point - self.position;
        if offset != Vec2::ZERO {
            self.direction = direction_to_byte(offset);
        }
    }

    /// Unit vector of the current facing
    pub fn facing(&self) -> Vec2 {
        byte_to_direction(self.direction)
    }

    /// Push this creature away from `from`
    pub fn shove(&mut self, from: Vec2, distance: f32) {
        self.position = geometry::push_away(from, self.position, distance);
    }

    pub fn aggro(&mut self, attacker: CreatureHandle) {
        self.aggro_target = Some(attacker);
    }

    // ---- Damage rolls ----

    pub fn right_hand(&self) -> Option<&Weapon> {
        self.equipment.right_hand.as_ref()
    }

    pub fn left_hand(&self) -> Option<&Weapon> {
        self.equipment.left_hand.as_ref()
    }

    pub fn is_dual_wielding(&self) -> bool {
        self.equipment.is_dual_wielding()
    }

    /// Hit count of the right hand (or bare hands)
    pub fn hit_count(&self) -> u8 {
        self.right_hand()
            .map(|w| w.hit_count())
            .unwrap_or(self.race_knock_count.saturating_add(1))
    }

    /// Attack speed of the right hand (or bare hands)
    pub fn attack_speed(&self) -> AttackSpeed {
        self.right_hand()
            .map(|w| w.attack_speed)
            .unwrap_or(self.race_attack_speed)
    }

    pub fn rnd_bare_hand_damage(&self, dice: &mut dyn Dice) -> f32 {
        let range = self.stats.bare_hand;
        dice.between(range.min, range.max)
    }

    pub fn rnd_right_hand_damage(&self, dice: &mut dyn Dice) -> f32 {
        let range = match self.right_hand() {
            Some(w) => self.stats.bare_hand.plus(w.damage),
            None => self.stats.bare_hand,
        };
        dice.between(range.min, range.max)
    }

    pub fn rnd_left_hand_damage(&self, dice: &mut dyn Dice) -> f32 {
        let range = match self.left_hand() {
            Some(w) => self.stats.bare_hand.plus(w.damage),
            None => self.stats.bare_hand,
        };
        dice.between(range.min, range.max)
    }

    /// One roll covering both hands
    pub fn rnd_total_damage(&self, dice: &mut dyn Dice) -> f32 {
        let mut range = match self.right_hand() {
            Some(w) => self.stats.bare_hand.plus(w.damage),
            None => self.stats.bare_hand,
        };
        if self.is_dual_wielding() {
            if let Some(left) = self.left_hand() {
                range = range.plus(left.damage);
            }
        }
        dice.between(range.min, range.max)
    }

    /// Roll for bows, crossbows and guns; bare hands otherwise
    pub fn rnd_ranged_damage(&self, dice: &mut dyn Dice) -> f32 {
        match self.right_hand() {
            Some(w) if w.weapon_type.is_ranged() => {
                let range = self.stats.bare_hand.plus(w.damage);
                dice.between(range.min, range.max)
            }
            _ => self.rnd_bare_hand_damage(dice),
        }
    }

    /// Critical chance of the right hand against `protection`
    pub fn right_crit_chance(&self, protection: f32) -> f32 {
        let bonus = self.right_hand().map(|w| w.critical).unwrap_or(0.0);
        (self.stats.critical + bonus - protection).max(0.0)
    }

    /// Critical chance of the left hand against `protection`
    pub fn left_crit_chance(&self, protection: f32) -> f32 {
        let bonus = self.left_hand().map(|w| w.critical).unwrap_or(0.0);
        (self.stats.critical + bonus - protection).max(0.0)
    }

    /// Critical chance for attacks using both hands
    pub fn total_crit_chance(&self, protection: f32) -> f32 {
        if self.is_dual_wielding() {
            (self.right_crit_chance(protection) + self.left_crit_chance(protection)) / 2.0
        } else {
            self.right_crit_chance(protection)
        }
    }

    /// Subtract life; life may go negative
    pub fn take_damage(&mut self, amount: f32) {
        self.life -= amount;
    }

    /// Use stamina. Returns `false` without spending when there isn't enough.
    pub fn spend_stamina(&mut self, amount: f32) -> bool {
        if self.stamina < amount {
            return false;
        }
        self.stamina -= amount;
        true
    }

    /// Clear the transient interception fields
    pub fn reset_interception(&mut self) {
        self.intercepting_skill_id = None;
        self.ignore_attack_range = false;
    }
}

/// Reach of bows, crossbows and guns
pub const RANGED_ATTACK_RANGE: f32 = 1500.0;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dice::ScriptedDice;
    use crate::weapon::WeaponType;

    fn fighter() -> Creature {
        Creature::new(CreatureId(1), "Fighter", CreatureKind::Player).with_vitals(100.0, 40.0, 30.0)
    }

    #[test]
    fn test_stun_window() {
        let mut c = fighter();
        c.set_stun(Timestamp(1000), 600);
        assert!(c.is_stunned(Timestamp(1599)));
        assert_eq!(c.stun_remaining(Timestamp(1200)), 400);
        assert!(!c.is_stunned(Timestamp(1600)));
    }

    #[test]
    fn test_stability_floor_and_recovery() {
        let mut c = fighter();
        c.reduce_stability(500.0);
        assert_eq!(c.stability, MIN_STABILITY);
        assert!(c.is_unstable());

        c.knock_down_time = Timestamp(5000);
        c.get_back_up(Timestamp(4000));
        assert!(!c.is_knocked_down(Timestamp(4000)));
        assert_eq!(c.stability, MAX_STABILITY);
    }

    #[test]
    fn test_rolls_combine_hands() {
        let mut c = fighter();
        c.stats.bare_hand = DamageRange::new(5.0, 5.0);
        c.equipment
            .equip_right(Weapon::new("Sword", WeaponType::Sword, DamageRange::new(10.0, 10.0)))
            .unwrap();
        c.equipment
            .equip_left(Weapon::new("Dagger", WeaponType::Dagger, DamageRange::new(3.0, 3.0)))
            .unwrap();

        let mut dice = ScriptedDice::new(0.5);
        assert_eq!(c.rnd_right_hand_damage(&mut dice), 15.0);
        assert_eq!(c.rnd_left_hand_damage(&mut dice), 8.0);
        assert_eq!(c.rnd_total_damage(&mut dice), 18.0);
        assert_eq!(c.rnd_ranged_damage(&mut dice), 5.0);
    }

    #[test]
    fn test_crit_chance_reduced_by_protection() {
        let mut c = fighter();
        c.stats.critical = 20.0;
        assert_eq!(c.right_crit_chance(5.0), 15.0);
        assert_eq!(c.right_crit_chance(50.0), 0.0);
    }

    #[test]
    fn test_attack_relations() {
        let mut a = fighter();
        a.handle = CreatureHandle::from_raw(0, 0);
        let mut b = Creature::new(CreatureId(2), "Wolf", CreatureKind::Npc).at(Vec2::new(120.0, 0.0));
        b.handle = CreatureHandle::from_raw(1, 0);

        assert!(a.can_attack(&b));
        assert!(a.in_attack_range(&b));
        b.position = Vec2::new(400.0, 0.0);
        assert!(!a.in_attack_range(&b));

        b.faction = a.faction;
        assert!(!a.can_attack(&b));
        assert!(!a.can_attack(&a.clone()));
    }

    #[test]
    fn test_turn_and_shove() {
        let mut c = fighter();
        c.turn_to(Vec2::new(0.0, 10.0));
        assert_eq!(c.direction, 64);
        c.shove(Vec2::new(0.0, -10.0), 100.0);
        assert!((c.position - Vec2::new(0.0, 100.0)).length() < 1e-3);
    }
}
