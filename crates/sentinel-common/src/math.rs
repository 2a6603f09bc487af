//! Ground-plane helpers.
//!
//! Agents live in a Y-up world but steer on the XZ plane only. These helpers
//! flatten vectors onto that plane so callers never mix vertical motion into
//! steering or range checks.

use glam::Vec3;

/// Length below which a direction is treated as zero.
pub const DIRECTION_EPSILON: f32 = 1e-4;

/// Projects a vector onto the ground (XZ) plane.
#[must_use]
pub fn horizontal(v: Vec3) -> Vec3 {
    Vec3::new(v.x, 0.0, v.z)
}

/// Horizontal distance between two points.
#[must_use]
pub fn horizontal_distance(a: Vec3, b: Vec3) -> f32 {
    horizontal(b - a).length()
}

/// Horizontal speed of a velocity vector.
#[must_use]
pub fn horizontal_speed(velocity: Vec3) -> f32 {
    horizontal(velocity).length()
}

/// Unit direction on the ground plane from `from` toward `to`.
///
/// Returns `Vec3::ZERO` when the points coincide horizontally.
#[must_use]
pub fn ground_direction(from: Vec3, to: Vec3) -> Vec3 {
    let flat = horizontal(to - from);
    if flat.length() < DIRECTION_EPSILON {
        Vec3::ZERO
    } else {
        flat.normalize()
    }
}

/// Yaw angle (radians, around +Y) that faces along `direction`.
///
/// Zero yaw faces +Z. Returns `None` for a zero direction.
#[must_use]
pub fn yaw_of(direction: Vec3) -> Option<f32> {
    let flat = horizontal(direction);
    if flat.length() < DIRECTION_EPSILON {
        None
    } else {
        Some(flat.x.atan2(flat.z))
    }
}

/// Point on a horizontal ring around `center`.
#[must_use]
pub fn ring_point(center: Vec3, radius: f32, index: usize, count: usize) -> Vec3 {
    let count = count.max(1);
    let angle = std::f32::consts::TAU * index as f32 / count as f32;
    center + Vec3::new(angle.cos() * radius, 0.0, angle.sin() * radius)
}
