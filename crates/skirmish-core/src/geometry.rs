//! Planar geometry helpers
//!
//! Creatures move on a 2D plane. Facing is sent over the wire as a byte
//! (0-255 covering a full turn), so conversions live here too.

use std::f32::consts::TAU;

use glam::Vec2;

/// Radians covered by one step of a byte direction
const BYTE_STEP: f32 = TAU / 256.0;

/// Convert a byte direction into radians.
pub fn byte_to_radian(direction: u8) -> f32 {
    BYTE_STEP * direction as f32
}

/// Convert a vector direction into a byte direction.
pub fn direction_to_byte(direction: Vec2) -> u8 {
    let angle = direction.y.atan2(direction.x).rem_euclid(TAU);
    ((angle / BYTE_STEP + 1e-4).floor() as u32 % 256) as u8
}

/// Convert degrees into a byte direction.
pub fn degree_to_byte(degree: i32) -> u8 {
    (degree.rem_euclid(360) * 255 / 360) as u8
}

/// Convert degrees into radians.
pub fn degree_to_radian(degree: f32) -> f32 {
    degree.to_radians()
}

/// Convert a byte direction into a unit vector.
pub fn byte_to_direction(direction: u8) -> Vec2 {
    let theta = byte_to_radian(direction);
    Vec2::new(theta.cos(), theta.sin())
}

/// Whether `b` lies within `range` of `a` (inclusive).
pub fn in_range(a: Vec2, b: Vec2, range: f32) -> bool {
    a.distance_squared(b) <= range * range
}

/// Whether `point` lies inside the cone at `origin` facing `direction`.
///
/// `half_angle` is measured in radians from the facing axis. A point is
/// inside iff it is at most `max_distance` away and the normalized vector to
/// it has `dot(direction) >= cos(half_angle)`. `direction` must be a unit
/// vector. A point coincident with the origin has no direction and only
/// falls inside cones of at least 90 degrees.
pub fn is_point_inside_cone(
    origin: Vec2,
    direction: Vec2,
    point: Vec2,
    half_angle: f32,
    max_distance: f32,
) -> bool {
    let offset = point - origin;
    let length = offset.length();
    if length > max_distance {
        return false;
    }

    let to_point = offset.normalize_or_zero();
    direction.dot(to_point) >= half_angle.cos()
}

/// Move `point` away from `from` by `distance` along the line between them.
pub fn push_away(from: Vec2, point: Vec2, distance: f32) -> Vec2 {
    let dir = (point - from).normalize_or_zero();
    if dir == Vec2::ZERO {
        return point;
    }
    point + dir * distance
}
