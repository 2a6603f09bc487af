//! # Sentinel AI
//!
//! Per-tick behavior for the autonomous agents of a level.
//!
//! This crate provides:
//! - Agent kinds and validated archetype tables
//! - Hostile combat state machine (detect, chase, telegraph, attack, enrage)
//! - Waypoint patrols for passive agents
//! - Force-based steering on an external physics body
//! - Animation clip selection with crossfades
//! - The agent registry: spawn, update, area damage, removal
//! - Event bus for defeat and level-complete notifications
//!
//! Physics, rendering and the player are external; the crate talks to them
//! through [`PhysicsWorld`], [`SceneBackend`] and [`Target`].

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod agent;
pub mod animation;
pub mod archetype;
pub mod body;
pub mod combat;
pub mod config;
pub mod error;
pub mod events;
pub mod manifest;
pub mod movement;
pub mod patrol;
pub mod registry;
pub mod scene;
pub mod target;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::agent::*;
    pub use crate::animation::*;
    pub use crate::archetype::*;
    pub use crate::body::*;
    pub use crate::combat::*;
    pub use crate::config::*;
    pub use crate::error::*;
    pub use crate::events::*;
    pub use crate::manifest::*;
    pub use crate::movement::*;
    pub use crate::patrol::*;
    pub use crate::registry::*;
    pub use crate::scene::*;
    pub use crate::target::*;
}

pub use prelude::*;

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    #[test]
    fn test_chasing_boss_closes_distance_under_physics() {
        let mut registry = AgentRegistry::with_defaults();
        let mut physics = PointMassWorld::new();
        let mut scene = HeadlessScene::new();
        let handle = registry
            .spawn("boss", SpawnOptions::at(0.0, 1.2, 0.0), &mut physics, &mut scene)
            .expect("boss spawns");
        let mut player = PlayerTarget::new(Vec3::new(0.0, 1.2, 12.0), 500.0);

        let dt = 1.0 / 60.0;
        for _ in 0..120 {
            registry.update(dt, &mut player, &[], &mut physics, &mut scene);
            physics.step(dt);
        }

        let boss = registry.get(handle).expect("boss");
        let position = physics.body(boss.body()).expect("body").position();
        assert!(position.z > 1.0, "boss should have moved toward the player");
        assert_eq!(position.x, 0.0);
        assert!(boss.yaw().abs() < 1e-6, "boss should face +Z");
    }

    #[test]
    fn test_guard_watches_nearby_player() {
        let mut registry = AgentRegistry::with_defaults();
        let mut physics = PointMassWorld::new();
        let mut scene = HeadlessScene::new();
        let handle = registry
            .spawn("guard", SpawnOptions::at(0.0, 0.0, 0.0), &mut physics, &mut scene)
            .expect("guard spawns");
        let mut player = PlayerTarget::new(Vec3::new(3.0, 0.0, 0.0), 100.0);

        registry.update(0.25, &mut player, &[], &mut physics, &mut scene);

        let guard = registry.get(handle).expect("guard");
        assert!(guard.patrol().expect("guard patrols").is_noticing());
        assert_eq!(guard.behavior(), BehaviorState::Idle);
        assert!((guard.yaw() - std::f32::consts::FRAC_PI_2).abs() < 1e-5);
    }

    #[test]
    fn test_airborne_agent_gets_reduced_force() {
        let mut registry = AgentRegistry::with_defaults();
        let mut physics = PointMassWorld::new();
        let mut scene = HeadlessScene::new();
        let platform = CollisionSurface::platform(Vec3::ZERO, 20.0, 1.0);

        let grounded = registry
            .spawn("grunt", SpawnOptions::at(0.0, 0.5, 0.0), &mut physics, &mut scene)
            .expect("grunt");
        let airborne = registry
            .spawn("grunt", SpawnOptions::at(0.0, 4.0, 0.0), &mut physics, &mut scene)
            .expect("grunt");
        let mut player = PlayerTarget::new(Vec3::new(0.0, 0.0, 5.0), 100.0);

        registry.update(0.25, &mut player, &[platform], &mut physics, &mut scene);

        let force = |handle| {
            let agent = registry.get(handle).expect("agent");
            physics.body(agent.body()).expect("body").pending_force().length()
        };
        let ratio = force(airborne) / force(grounded);
        assert!((ratio - registry.config().air_control).abs() < 1e-4);
    }
}
