//! Physics-body contract consumed from the external physics engine.
//!
//! Agents never own their position or velocity. They hold a [`BodyHandle`]
//! into a [`PhysicsWorld`] and steer by applying forces; the engine integrates
//! and the agent reads the result back on the next tick.

use ahash::AHashMap;
use glam::Vec3;
use serde::{Deserialize, Serialize};
use sentinel_common::BodyHandle;

/// Surface material of a body.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BodyMaterial {
    /// Friction coefficient (0-1)
    pub friction: f32,
    /// Restitution/bounciness (0-1)
    pub restitution: f32,
}

impl Default for BodyMaterial {
    fn default() -> Self {
        Self {
            friction: 0.5,
            restitution: 0.0,
        }
    }
}

/// The narrow body surface agent logic depends on.
pub trait PhysicsBody {
    /// Center of mass in world space.
    fn position(&self) -> Vec3;
    /// Linear velocity.
    fn velocity(&self) -> Vec3;
    /// Applies a force for the next integration step at a world-space point.
    fn apply_force(&mut self, force: Vec3, at_point: Vec3);
    /// Surface material.
    fn material(&self) -> BodyMaterial;
    /// Mutable surface material.
    fn material_mut(&mut self) -> &mut BodyMaterial;
    /// Free-form data attached by the owner.
    fn user_data(&self) -> &serde_json::Value;
    /// Mutable free-form data.
    fn user_data_mut(&mut self) -> &mut serde_json::Value;
}

/// Parameters for creating an agent body.
#[derive(Debug, Clone, PartialEq)]
pub struct BodyDesc {
    /// Initial center position
    pub position: Vec3,
    /// Collision radius
    pub radius: f32,
    /// Mass (kg)
    pub mass: f32,
    /// Linear damping
    pub linear_damping: f32,
    /// Angular damping
    pub angular_damping: f32,
    /// Surface material
    pub material: BodyMaterial,
    /// Initial user data
    pub user_data: serde_json::Value,
}

/// Body storage owned by the physics engine.
pub trait PhysicsWorld {
    /// Concrete body type.
    type Body: PhysicsBody;

    /// Creates a body and returns its handle.
    fn create_body(&mut self, desc: BodyDesc) -> BodyHandle;
    /// Removes a body. Returns whether it existed.
    fn remove_body(&mut self, handle: BodyHandle) -> bool;
    /// Borrows a body.
    fn body(&self, handle: BodyHandle) -> Option<&Self::Body>;
    /// Mutably borrows a body.
    fn body_mut(&mut self, handle: BodyHandle) -> Option<&mut Self::Body>;
}

/// Axis-aligned walkable surface (a platform top).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CollisionSurface {
    /// Minimum corner
    pub min: Vec3,
    /// Maximum corner; `max.y` is the walkable top
    pub max: Vec3,
}

impl CollisionSurface {
    /// Creates a surface from two corners.
    #[must_use]
    pub fn new(a: Vec3, b: Vec3) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    /// Flat square platform centered on `center` with its top at `center.y`.
    #[must_use]
    pub fn platform(center: Vec3, half_extent: f32, thickness: f32) -> Self {
        Self::new(
            center - Vec3::new(half_extent, thickness, half_extent),
            center + Vec3::new(half_extent, 0.0, half_extent),
        )
    }

    /// Whether a foot position rests on this surface's top.
    #[must_use]
    pub fn supports(&self, foot: Vec3, tolerance: f32) -> bool {
        foot.x >= self.min.x
            && foot.x <= self.max.x
            && foot.z >= self.min.z
            && foot.z <= self.max.z
            && (foot.y - self.max.y).abs() <= tolerance
    }
}

// ============================================================================
// Point-mass reference world
// ============================================================================

/// Body in a [`PointMassWorld`].
#[derive(Debug, Clone)]
pub struct PointMassBody {
    position: Vec3,
    velocity: Vec3,
    angular_velocity: Vec3,
    mass: f32,
    radius: f32,
    linear_damping: f32,
    angular_damping: f32,
    material: BodyMaterial,
    user_data: serde_json::Value,
    force: Vec3,
    torque: Vec3,
}

impl PointMassBody {
    fn from_desc(desc: BodyDesc) -> Self {
        Self {
            position: desc.position,
            velocity: Vec3::ZERO,
            angular_velocity: Vec3::ZERO,
            mass: desc.mass.max(f32::EPSILON),
            radius: desc.radius,
            linear_damping: desc.linear_damping.max(0.0),
            angular_damping: desc.angular_damping.max(0.0),
            material: desc.material,
            user_data: desc.user_data,
            force: Vec3::ZERO,
            torque: Vec3::ZERO,
        }
    }

    /// Mass of the body.
    #[must_use]
    pub fn mass(&self) -> f32 {
        self.mass
    }

    /// Angular velocity.
    #[must_use]
    pub fn angular_velocity(&self) -> Vec3 {
        self.angular_velocity
    }

    /// Force accumulated since the last step.
    #[must_use]
    pub fn pending_force(&self) -> Vec3 {
        self.force
    }

    /// Moment of inertia of a solid sphere.
    fn inertia(&self) -> f32 {
        (0.4 * self.mass * self.radius * self.radius).max(f32::EPSILON)
    }

    fn integrate(&mut self, dt: f32) {
        self.velocity += self.force / self.mass * dt;
        self.velocity /= 1.0 + self.linear_damping * dt;
        self.position += self.velocity * dt;

        self.angular_velocity += self.torque / self.inertia() * dt;
        self.angular_velocity /= 1.0 + self.angular_damping * dt;

        self.force = Vec3::ZERO;
        self.torque = Vec3::ZERO;
    }
}

impl PhysicsBody for PointMassBody {
    fn position(&self) -> Vec3 {
        self.position
    }

    fn velocity(&self) -> Vec3 {
        self.velocity
    }

    fn apply_force(&mut self, force: Vec3, at_point: Vec3) {
        self.force += force;
        self.torque += (at_point - self.position).cross(force);
    }

    fn material(&self) -> BodyMaterial {
        self.material
    }

    fn material_mut(&mut self) -> &mut BodyMaterial {
        &mut self.material
    }

    fn user_data(&self) -> &serde_json::Value {
        &self.user_data
    }

    fn user_data_mut(&mut self) -> &mut serde_json::Value {
        &mut self.user_data
    }
}

/// Minimal semi-implicit Euler world with damping and no collisions.
///
/// Stands in for the real engine in tests and the headless runner. Bodies only
/// move when [`PointMassWorld::step`] is called.
#[derive(Debug, Default)]
pub struct PointMassWorld {
    bodies: AHashMap<BodyHandle, PointMassBody>,
    next_handle: u64,
}

impl PointMassWorld {
    /// Creates an empty world.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live bodies.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    /// Whether the world has no bodies.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }

    /// Integrates every body by `dt` seconds.
    pub fn step(&mut self, dt: f32) {
        if dt <= 0.0 {
            return;
        }
        for body in self.bodies.values_mut() {
            body.integrate(dt);
        }
    }

    /// Teleports a body, zeroing its velocity.
    pub fn teleport(&mut self, handle: BodyHandle, position: Vec3) -> bool {
        match self.bodies.get_mut(&handle) {
            Some(body) => {
                body.position = position;
                body.velocity = Vec3::ZERO;
                true
            },
            None => false,
        }
    }

    /// Overrides a body's velocity.
    pub fn set_velocity(&mut self, handle: BodyHandle, velocity: Vec3) -> bool {
        match self.bodies.get_mut(&handle) {
            Some(body) => {
                body.velocity = velocity;
                true
            },
            None => false,
        }
    }
}

impl PhysicsWorld for PointMassWorld {
    type Body = PointMassBody;

    fn create_body(&mut self, desc: BodyDesc) -> BodyHandle {
        self.next_handle += 1;
        let handle = BodyHandle::from_raw(self.next_handle);
        self.bodies.insert(handle, PointMassBody::from_desc(desc));
        handle
    }

    fn remove_body(&mut self, handle: BodyHandle) -> bool {
        self.bodies.remove(&handle).is_some()
    }

    fn body(&self, handle: BodyHandle) -> Option<&PointMassBody> {
        self.bodies.get(&handle)
    }

    fn body_mut(&mut self, handle: BodyHandle) -> Option<&mut PointMassBody> {
        self.bodies.get_mut(&handle)
    }
}
