//! Scripted level run: a player walks at the boss and fights back.

use glam::Vec3;
use sentinel_ai::{
    AgentEvent, AgentRegistry, CollisionSurface, HeadlessScene, PatrolBehavior, PhysicsBody,
    PhysicsWorld, PlayerTarget, PointMassWorld, SpawnManifest, SpawnOptions,
};
use sentinel_common::ground_direction;
use tracing::{debug, info, warn};

/// Fixed simulation step (60 Hz).
pub const TICK: f32 = 1.0 / 60.0;

/// Player stand-in behavior.
#[derive(Debug, Clone, Copy)]
pub struct PlayerScript {
    /// Walking speed (m/s)
    pub speed: f32,
    /// Radius of the player's area attack
    pub attack_radius: f32,
    /// Damage per area attack
    pub attack_damage: f32,
    /// Seconds between area attacks
    pub attack_interval: f32,
    /// Player stops walking this close to the goal
    pub stop_distance: f32,
}

impl Default for PlayerScript {
    fn default() -> Self {
        Self {
            speed: 3.0,
            attack_radius: 4.0,
            attack_damage: 45.0,
            attack_interval: 0.75,
            stop_distance: 2.0,
        }
    }
}

/// How a run ended.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// The boss fell
    LevelComplete(String),
    /// The player ran out of health
    PlayerDefeated,
    /// Time limit reached
    TimedOut,
}

/// Totals for a finished run.
#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    /// How the run ended
    pub outcome: Outcome,
    /// Simulated seconds
    pub elapsed: f32,
    /// Damage the player took
    pub damage_taken: f32,
    /// Agents defeated
    pub defeated: usize,
}

/// Built-in level used when no manifest is given.
#[must_use]
pub fn default_manifest() -> SpawnManifest {
    let mut manifest = SpawnManifest {
        level_id: Some("proving-grounds".into()),
        ..SpawnManifest::default()
    };
    manifest.push("boss", SpawnOptions::at(0.0, 1.2, 24.0).with_label("warden"));
    manifest.push("grunt", SpawnOptions::at(-4.0, 0.5, 10.0));
    manifest.push("grunt", SpawnOptions::at(4.0, 0.5, 10.0).with_speed(2.5));
    manifest.push(
        "villager",
        SpawnOptions::at(-10.0, 0.45, 0.0)
            .with_patrol_points(vec![
                vec![-10.0, 0.45, 0.0],
                vec![-10.0, 0.45, 8.0, 1.0],
                vec![-14.0, 0.45, 8.0],
            ])
            .with_wait_time(1.0)
            .with_label("farmer"),
    );
    manifest.push(
        "guard",
        SpawnOptions::at(8.0, 0.5, -2.0)
            .with_patrol_behavior(PatrolBehavior::PingPong)
            .with_label("gatekeeper"),
    );
    manifest
}

/// Everything a run needs.
pub struct Scenario {
    registry: AgentRegistry,
    physics: PointMassWorld,
    scene: HeadlessScene,
    platforms: Vec<CollisionSurface>,
    player: PlayerTarget,
    script: PlayerScript,
    goal: Vec3,
}

impl Scenario {
    /// Spawns the manifest and places the player.
    pub fn new(mut registry: AgentRegistry, manifest: &SpawnManifest, script: PlayerScript) -> Self {
        let mut physics = PointMassWorld::new();
        let mut scene = HeadlessScene::new();
        let handles = registry.spawn_manifest(manifest, &mut physics, &mut scene);
        info!("Spawned {} of {} manifest agents", handles.len(), manifest.agents.len());

        let goal = registry
            .iter()
            .find(|(_, agent)| agent.is_boss())
            .and_then(|(_, agent)| physics.body(agent.body()).map(|body| body.position()))
            .unwrap_or(Vec3::new(0.0, 1.0, 20.0));

        Self {
            registry,
            physics,
            scene,
            platforms: vec![CollisionSurface::platform(Vec3::ZERO, 60.0, 1.0)],
            player: PlayerTarget::new(Vec3::new(0.0, 1.0, -10.0), 300.0),
            script,
            goal,
        }
    }

    /// Runs fixed ticks until the level completes, the player falls or time runs out.
    pub fn run(&mut self, max_seconds: f32) -> Summary {
        let mut elapsed = 0.0;
        let mut since_attack = 0.0;
        let mut defeated = 0;

        while elapsed < max_seconds {
            self.step_player(TICK);

            since_attack += TICK;
            if since_attack >= self.script.attack_interval {
                since_attack = 0.0;
                let hits = self.registry.damage_in_radius(
                    self.player.position,
                    self.script.attack_radius,
                    self.script.attack_damage,
                    &self.physics,
                );
                if hits > 0 {
                    debug!("Player area attack hit {hits} agents");
                }
            }

            self.registry.update(
                TICK,
                &mut self.player,
                &self.platforms,
                &mut self.physics,
                &mut self.scene,
            );
            self.physics.step(TICK);
            elapsed += TICK;

            for event in self.registry.drain_events() {
                match event {
                    AgentEvent::LevelComplete { level_id } => {
                        info!("Level {level_id} complete after {elapsed:.2}s");
                        return self.summary(Outcome::LevelComplete(level_id), elapsed, defeated);
                    },
                    AgentEvent::Defeated { id, kind } => {
                        defeated += 1;
                        info!("{id} ({kind}) defeated");
                    },
                    AgentEvent::AttackLanded { id, damage, .. } => {
                        info!("{id} hit the player for {damage}, health {}", self.player.health);
                    },
                    AgentEvent::Enraged { id } => warn!("{id} is enraged"),
                    other => debug!("{other:?}"),
                }
            }

            if self.player.health <= 0.0 {
                info!("Player defeated after {elapsed:.2}s");
                return self.summary(Outcome::PlayerDefeated, elapsed, defeated);
            }
        }

        self.summary(Outcome::TimedOut, elapsed, defeated)
    }

    fn step_player(&mut self, dt: f32) {
        let to_goal = ground_direction(self.player.position, self.goal);
        let remaining = (self.goal - self.player.position).length();
        if remaining > self.script.stop_distance {
            self.player.position += to_goal * self.script.speed * dt;
        }
    }

    fn summary(&self, outcome: Outcome, elapsed: f32, defeated: usize) -> Summary {
        Summary {
            outcome,
            elapsed,
            damage_taken: self.player.damage_taken(),
            defeated,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_manifest_spawns_everything() {
        let manifest = default_manifest();
        let scenario = Scenario::new(AgentRegistry::with_defaults(), &manifest, PlayerScript::default());
        assert_eq!(scenario.registry.len(), manifest.agents.len());
        assert_eq!(scenario.goal, Vec3::new(0.0, 1.2, 24.0));
    }

    #[test]
    fn test_run_finishes() {
        let mut scenario = Scenario::new(
            AgentRegistry::with_defaults(),
            &default_manifest(),
            PlayerScript::default(),
        );
        let summary = scenario.run(90.0);
        assert!(summary.elapsed > 0.0);
        assert!(summary.elapsed <= 90.0 + TICK);
    }
}
