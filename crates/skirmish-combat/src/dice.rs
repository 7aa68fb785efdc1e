//! Random rolls
//!
//! Every random decision in an exchange goes through [`Dice`], so a region
//! can run on a seeded RNG and tests can script the outcome of each roll.

use std::collections::VecDeque;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Source of random rolls
pub trait Dice: Send {
    /// Uniform value in `[0, 1)`
    fn next_f32(&mut self) -> f32;

    /// Uniform value between `min` and `max`
    fn between(&mut self, min: f32, max: f32) -> f32 {
        if max <= min {
            return min;
        }
        min + (max - min) * self.next_f32()
    }

    /// True with the given probability (0.0 - 1.0)
    fn chance(&mut self, probability: f32) -> bool {
        self.next_f32() < probability
    }

    /// True with the given percentage (0 - 100)
    fn percent(&mut self, percent: f32) -> bool {
        self.chance(percent / 100.0)
    }

    /// Index in `0..len`
    fn pick(&mut self, len: usize) -> usize {
        if len == 0 {
            return 0;
        }
        ((self.next_f32() * len as f32) as usize).min(len - 1)
    }
}

impl Dice for StdRng {
    fn next_f32(&mut self) -> f32 {
        self.gen::<f32>()
    }
}

/// Create the region RNG, seeded when a seed is configured
pub fn region_dice(seed: Option<u64>) -> Box<dyn Dice> {
    match seed {
        Some(seed) => Box::new(StdRng::seed_from_u64(seed)),
        None => Box::new(StdRng::from_entropy()),
    }
}

/// Replays queued rolls, then repeats a fallback value
#[derive(Debug, Clone)]
pub struct ScriptedDice {
    rolls: VecDeque<f32>,
    fallback: f32,
}

impl ScriptedDice {
    /// Dice that always rolls `fallback`
    pub fn new(fallback: f32) -> Self {
        Self {
            rolls: VecDeque::new(),
            fallback: fallback.clamp(0.0, 0.999_999),
        }
    }

    /// Queue the next roll
    pub fn then(mut self, roll: f32) -> Self {
        self.rolls.push_back(roll.clamp(0.0, 0.999_999));
        self
    }

    /// Rolls still queued
    pub fn remaining(&self) -> usize {
        self.rolls.len()
    }
}

impl Dice for ScriptedDice {
    fn next_f32(&mut self) -> f32 {
        self.rolls.pop_front().unwrap_or(self.fallback)
    }
}
