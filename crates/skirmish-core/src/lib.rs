//! Skirmish Core - Core types and utilities for the Skirmish combat server
//!
//! This crate provides the foundational types used throughout the server:
//! - Protocol-visible ids and region-local generational handles
//! - Planar geometry helpers (range, cones, byte directions)
//! - The millisecond game clock

pub mod geometry;
pub mod handle;
pub mod time;
pub mod types;

pub use glam::Vec2;
pub use handle::{CreatureHandle, HandleAllocator};
pub use time::{ClockConfig, ClockError, GameClock, Timestamp};
pub use types::{CreatureId, RegionId};
