//! Skills owned by combatants
//!
//! A skill instance carries its rank data (numeric `Var` slots whose meaning
//! depends on the skill), its prepare/ready state, a cooldown end and a small
//! stack counter. A [`SkillSet`] tracks which skill is currently active.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use skirmish_core::Timestamp;

/// Closed set of skill identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SkillId {
    CombatMastery,
    Smash,
    Defense,
    Counterattack,
    Windmill,
    MagnumShot,
    ManaShield,
    FinalHit,
    CriticalHit,
    Rest,
}

impl SkillId {
    /// Display name
    pub fn name(self) -> &'static str {
        match self {
            Self::CombatMastery => "Combat Mastery",
            Self::Smash => "Smash",
            Self::Defense => "Defense",
            Self::Counterattack => "Counterattack",
            Self::Windmill => "Windmill",
            Self::MagnumShot => "Magnum Shot",
            Self::ManaShield => "Mana Shield",
            Self::FinalHit => "Final Hit",
            Self::CriticalHit => "Critical Hit",
            Self::Rest => "Rest",
        }
    }
}

/// Skill rank, Novice lowest, R1 highest
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SkillRank {
    Novice,
    RF,
    RE,
    RD,
    RC,
    RB,
    RA,
    R9,
    R8,
    R7,
    R6,
    R5,
    R4,
    R3,
    R2,
    R1,
}

impl SkillRank {
    /// 0 for Novice up to 15 for R1
    pub fn index(self) -> usize {
        self as usize
    }

    /// Fraction of the way from Novice to R1
    pub fn progress(self) -> f32 {
        self.index() as f32 / Self::R1.index() as f32
    }
}

/// Lifecycle of an active skill
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SkillState {
    #[default]
    None,
    Preparing,
    Ready,
    Used,
    Completed,
}

/// Per-rank skill data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankData {
    /// Skill-specific values, `vars[0]` is Var1
    pub vars: [f32; 6],
    /// How many uses one preparation grants
    pub stack_max: u8,
    /// Preparation time in milliseconds
    pub load_time: u32,
}

impl RankData {
    pub fn new(vars: [f32; 6]) -> Self {
        Self {
            vars,
            stack_max: 1,
            load_time: 0,
        }
    }

    /// Var slot by 1-based number, 0.0 when out of range
    pub fn var(&self, n: usize) -> f32 {
        n.checked_sub(1)
            .and_then(|i| self.vars.get(i))
            .copied()
            .unwrap_or(0.0)
    }

    pub fn var1(&self) -> f32 {
        self.var(1)
    }

    pub fn var2(&self) -> f32 {
        self.var(2)
    }

    pub fn var3(&self) -> f32 {
        self.var(3)
    }

    /// Reference values for a skill at a rank, interpolated from Novice to R1
    pub fn for_rank(id: SkillId, rank: SkillRank) -> Self {
        let t = rank.progress();
        let lerp = |from: f32, to: f32| from + (to - from) * t;
        let (vars, load_time) = match id {
            // Var1: damage percent
            SkillId::Smash => ([lerp(200.0, 500.0), 0.0, 0.0, 0.0, 0.0, 0.0], 1000),
            // Var1: flat damage reduction
            SkillId::Defense => ([lerp(5.0, 35.0), 0.0, 0.0, 0.0, 0.0, 0.0], 1000),
            // Var1: target damage rate, Var2: attacker damage rate, Var3: crit bonus
            SkillId::Counterattack => (
                [lerp(100.0, 250.0), lerp(100.0, 150.0), lerp(0.0, 30.0), 0.0, 0.0, 0.0],
                1500,
            ),
            // Var1: damage percent
            SkillId::Windmill => ([lerp(100.0, 200.0), 0.0, 0.0, 0.0, 0.0, 0.0], 1000),
            // Var1: damage percent
            SkillId::MagnumShot => ([lerp(200.0, 500.0), 0.0, 0.0, 0.0, 0.0, 0.0], 2000),
            // Var1: efficiency, Var2: mana per second
            SkillId::ManaShield => ([lerp(1.0, 3.0), lerp(0.5, 0.2), 0.0, 0.0, 0.0, 0.0], 0),
            // Var1: critical damage bonus percent
            SkillId::CriticalHit => ([lerp(30.0, 150.0), 0.0, 0.0, 0.0, 0.0, 0.0], 0),
            SkillId::CombatMastery | SkillId::FinalHit | SkillId::Rest => ([0.0; 6], 0),
        };
        Self {
            vars,
            stack_max: 1,
            load_time,
        }
    }
}

/// A skill owned by one combatant
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Skill {
    pub id: SkillId,
    pub rank: SkillRank,
    pub data: RankData,
    pub state: SkillState,
    /// Skill can't be used before this time
    pub cooldown_end: Timestamp,
    pub stacks: u8,
}

impl Skill {
    /// Create a skill with reference rank data
    pub fn new(id: SkillId, rank: SkillRank) -> Self {
        Self {
            id,
            rank,
            data: RankData::for_rank(id, rank),
            state: SkillState::None,
            cooldown_end: Timestamp::ZERO,
            stacks: 0,
        }
    }

    /// Replace the rank data
    pub fn with_data(mut self, data: RankData) -> Self {
        self.data = data;
        self
    }

    pub fn is_on_cooldown(&self, now: Timestamp) -> bool {
        now < self.cooldown_end
    }

    /// Start a cooldown of `ms` milliseconds
    pub fn set_cooldown(&mut self, now: Timestamp, ms: u64) {
        self.cooldown_end = now + ms;
    }

    pub fn reset_cooldown(&mut self) {
        self.cooldown_end = Timestamp::ZERO;
    }

    pub fn var1(&self) -> f32 {
        self.data.var1()
    }

    pub fn var2(&self) -> f32 {
        self.data.var2()
    }

    pub fn var3(&self) -> f32 {
        self.data.var3()
    }
}

/// All skills of a combatant plus the currently active one
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SkillSet {
    skills: HashMap<SkillId, Skill>,
    active: Option<SkillId>,
}

impl SkillSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Learn (or replace) a skill
    pub fn add(&mut self, skill: Skill) {
        self.skills.insert(skill.id, skill);
    }

    pub fn has(&self, id: SkillId) -> bool {
        self.skills.contains_key(&id)
    }

    pub fn get(&self, id: SkillId) -> Option<&Skill> {
        self.skills.get(&id)
    }

    pub fn get_mut(&mut self, id: SkillId) -> Option<&mut Skill> {
        self.skills.get_mut(&id)
    }

    /// Rank of a skill, if known
    pub fn rank(&self, id: SkillId) -> Option<SkillRank> {
        self.get(id).map(|s| s.rank)
    }

    pub fn active_id(&self) -> Option<SkillId> {
        self.active
    }

    pub fn active(&self) -> Option<&Skill> {
        self.active.and_then(|id| self.skills.get(&id))
    }

    pub fn active_mut(&mut self) -> Option<&mut Skill> {
        let id = self.active?;
        self.skills.get_mut(&id)
    }

    /// Make a skill active in the given state. Returns `false` for unknown skills.
    pub fn activate(&mut self, id: SkillId, state: SkillState) -> bool {
        match self.skills.get_mut(&id) {
            Some(skill) => {
                skill.state = state;
                self.active = Some(id);
                true
            }
            None => false,
        }
    }

    /// Drop the active skill, resetting its state. Returns the skill that was active.
    pub fn clear_active(&mut self) -> Option<SkillId> {
        let id = self.active.take()?;
        if let Some(skill) = self.skills.get_mut(&id) {
            skill.state = SkillState::None;
            skill.stacks = 0;
        }
        Some(id)
    }

    /// The active skill is `id` and is ready to be used
    pub fn is_ready(&self, id: SkillId) -> bool {
        self.active == Some(id) && self.skills.get(&id).is_some_and(|s| s.state == SkillState::Ready)
    }

    /// Nothing is active, or the active skill doesn't block a basic attack
    pub fn allows_basic_attack(&self) -> bool {
        match self.active {
            None | Some(SkillId::CombatMastery) => true,
            Some(SkillId::FinalHit) => self.is_ready(SkillId::FinalHit),
            Some(_) => false,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Skill> {
        self.skills.values()
    }
}
