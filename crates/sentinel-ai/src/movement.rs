//! Steering: turns a desired direction and speed into a body force.

use glam::Vec3;
use sentinel_common::{ground_direction, horizontal};

use crate::body::{CollisionSurface, PhysicsBody};
use crate::config::AiConfig;

/// What an agent wants to do with its body this tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MoveIntent {
    /// Horizontal unit direction, or zero to stand still
    pub direction: Vec3,
    /// Desired speed (m/s)
    pub speed: f32,
    /// Direction to face when not moving
    pub face: Option<Vec3>,
}

impl MoveIntent {
    /// Stand still.
    pub const STOP: Self = Self {
        direction: Vec3::ZERO,
        speed: 0.0,
        face: None,
    };

    /// Move in a straight line from `from` toward `to`.
    #[must_use]
    pub fn toward(from: Vec3, to: Vec3, speed: f32) -> Self {
        Self {
            direction: ground_direction(from, to),
            speed,
            face: None,
        }
    }

    /// Stand still, turned toward `to`.
    #[must_use]
    pub fn face_toward(from: Vec3, to: Vec3) -> Self {
        let direction = ground_direction(from, to);
        Self {
            face: (direction != Vec3::ZERO).then_some(direction),
            ..Self::STOP
        }
    }

    /// Whether this intent pushes the body.
    #[must_use]
    pub fn is_moving(&self) -> bool {
        self.speed > 0.0 && self.direction != Vec3::ZERO
    }

    /// Direction the agent should face: movement first, then the explicit facing.
    #[must_use]
    pub fn facing(&self) -> Option<Vec3> {
        if self.is_moving() {
            Some(self.direction)
        } else {
            self.face
        }
    }
}

/// Converts move intents into forces on agent bodies.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MovementResolver {
    /// Fraction of force available while airborne (0-1)
    pub air_control: f32,
    /// Vertical slack for the ground check
    pub ground_tolerance: f32,
}

impl Default for MovementResolver {
    fn default() -> Self {
        Self::from_config(&AiConfig::default())
    }
}

impl MovementResolver {
    /// Creates a resolver from the global config.
    #[must_use]
    pub fn from_config(config: &AiConfig) -> Self {
        Self {
            air_control: config.air_control.clamp(0.0, 1.0),
            ground_tolerance: config.ground_tolerance.max(0.0),
        }
    }

    /// Checks if a body rests on any surface.
    ///
    /// With no surfaces supplied the agent is treated as grounded.
    #[must_use]
    pub fn is_grounded(&self, center: Vec3, body_radius: f32, surfaces: &[CollisionSurface]) -> bool {
        if surfaces.is_empty() {
            return true;
        }
        let feet = center - Vec3::Y * body_radius;
        surfaces
            .iter()
            .any(|surface| surface.supports(feet, self.ground_tolerance))
    }

    /// Force for an intent: direction x speed x multiplier, reduced while airborne.
    #[must_use]
    pub fn force_for(&self, intent: &MoveIntent, force_multiplier: f32, grounded: bool) -> Vec3 {
        if !intent.is_moving() {
            return Vec3::ZERO;
        }
        let direction = horizontal(intent.direction).normalize_or_zero();
        let force = direction * intent.speed * force_multiplier;
        if grounded {
            force
        } else {
            force * self.air_control
        }
    }

    /// Applies an intent to a body at its center. Returns the applied force.
    pub fn apply<B: PhysicsBody + ?Sized>(
        &self,
        body: &mut B,
        intent: &MoveIntent,
        force_multiplier: f32,
        grounded: bool,
    ) -> Vec3 {
        let force = self.force_for(intent, force_multiplier, grounded);
        if force != Vec3::ZERO {
            let center = body.position();
            body.apply_force(force, center);
        }
        force
    }
}
