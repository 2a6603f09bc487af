//! Agent registry.
//!
//! The registry is the only owner of agents. It spawns them (body, visual,
//! controller), ticks them in registration order, applies area damage and
//! tears them down. Slots are reused; handles carry a generation so a handle
//! to a removed agent never reaches its replacement.

use ahash::AHashMap;
use glam::Vec3;
use sentinel_common::{AgentId, AgentIdAllocator, ConfigResult};
use tracing::{info, warn};

use crate::agent::{Agent, TickReport};
use crate::archetype::{AgentKind, ArchetypeTable};
use crate::body::{BodyDesc, BodyMaterial, CollisionSurface, PhysicsBody, PhysicsWorld};
use crate::config::AiConfig;
use crate::error::{AgentError, AgentResult};
use crate::events::{AgentEvent, EventBus};
use crate::manifest::{SpawnManifest, SpawnOptions};
use crate::movement::MovementResolver;
use crate::scene::SceneBackend;
use crate::target::Target;

/// Generational handle to a registered agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AgentHandle {
    index: u32,
    generation: u32,
}

impl AgentHandle {
    /// Slot index.
    #[must_use]
    pub const fn index(self) -> u32 {
        self.index
    }

    /// Slot generation.
    #[must_use]
    pub const fn generation(self) -> u32 {
        self.generation
    }
}

#[derive(Debug, Default)]
struct Slot {
    generation: u32,
    agent: Option<Agent>,
}

/// Owns every agent in a level.
#[derive(Debug)]
pub struct AgentRegistry {
    /// Storage slots
    slots: Vec<Slot>,
    /// Free slot indices for reuse
    free_list: Vec<usize>,
    /// Live handles in registration order
    order: Vec<AgentHandle>,
    /// Map from AgentId to handle for fast lookup
    id_to_handle: AHashMap<AgentId, AgentHandle>,
    ids: AgentIdAllocator,
    archetypes: ArchetypeTable,
    config: AiConfig,
    movement: MovementResolver,
    events: EventBus,
}

impl AgentRegistry {
    /// Creates a registry, building and validating the archetype table.
    pub fn new(config: AiConfig) -> ConfigResult<Self> {
        let archetypes = ArchetypeTable::from_config(&config)?;
        Ok(Self {
            slots: Vec::new(),
            free_list: Vec::new(),
            order: Vec::new(),
            id_to_handle: AHashMap::new(),
            ids: AgentIdAllocator::new(),
            archetypes,
            movement: MovementResolver::from_config(&config),
            events: EventBus::new(config.event_capacity),
            config,
        })
    }

    /// Creates a registry with default config and built-in archetypes.
    #[must_use]
    pub fn with_defaults() -> Self {
        let config = AiConfig::default();
        Self {
            slots: Vec::new(),
            free_list: Vec::new(),
            order: Vec::new(),
            id_to_handle: AHashMap::new(),
            ids: AgentIdAllocator::new(),
            archetypes: ArchetypeTable::builtin(),
            movement: MovementResolver::from_config(&config),
            events: EventBus::new(config.event_capacity),
            config,
        }
    }

    /// Active configuration.
    #[must_use]
    pub fn config(&self) -> &AiConfig {
        &self.config
    }

    /// Validated archetype table.
    #[must_use]
    pub fn archetypes(&self) -> &ArchetypeTable {
        &self.archetypes
    }

    /// Event bus agents publish on.
    #[must_use]
    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// Drains pending events.
    pub fn drain_events(&self) -> Vec<AgentEvent> {
        self.events.drain()
    }

    /// Spawns an agent by type name.
    ///
    /// Unknown types are logged and yield `None`.
    pub fn spawn<P: PhysicsWorld, S: SceneBackend>(
        &mut self,
        kind: &str,
        options: SpawnOptions,
        physics: &mut P,
        scene: &mut S,
    ) -> Option<AgentHandle> {
        match self.try_spawn(kind, options, physics, scene) {
            Ok(handle) => Some(handle),
            Err(e) => {
                warn!("Cannot spawn agent: {e}");
                None
            },
        }
    }

    /// Spawns an agent by type name, reporting unknown types as errors.
    pub fn try_spawn<P: PhysicsWorld, S: SceneBackend>(
        &mut self,
        kind: &str,
        options: SpawnOptions,
        physics: &mut P,
        scene: &mut S,
    ) -> AgentResult<AgentHandle> {
        let kind: AgentKind = kind.parse()?;
        Ok(self.spawn_kind(kind, options, physics, scene))
    }

    /// Spawns an agent of a known kind.
    pub fn spawn_kind<P: PhysicsWorld, S: SceneBackend>(
        &mut self,
        kind: AgentKind,
        options: SpawnOptions,
        physics: &mut P,
        scene: &mut S,
    ) -> AgentHandle {
        let id = self.ids.next();
        let archetype = self.archetypes.get(kind);
        let position = options.position();

        let body = physics.create_body(BodyDesc {
            position,
            radius: archetype.body_radius,
            mass: archetype.mass,
            linear_damping: archetype.linear_damping,
            angular_damping: archetype.angular_damping,
            material: BodyMaterial {
                friction: archetype.friction,
                restitution: archetype.restitution,
            },
            user_data: serde_json::json!({
                "agentId": id.raw(),
                "kind": kind.as_str(),
                "label": options.id,
            }),
        });

        let mut agent = Agent::new(
            id,
            archetype,
            &options,
            &self.config,
            body,
            self.events.publisher(),
        );

        let scale = options
            .scale
            .filter(|s| s.is_finite() && *s > 0.0)
            .unwrap_or(archetype.scale);
        match scene.load_model(&archetype.model, scale) {
            Ok(visual) => {
                scene.set_transform(visual, position, 0.0);
                agent.visual = Some(visual);
            },
            Err(e) => warn!("{id} ({kind}) continues without a visual: {e}"),
        }

        let handle = self.insert(agent);
        self.id_to_handle.insert(id, handle);
        self.order.push(handle);

        info!("Spawned {id} ({kind}) at {position}");
        self.events.publish(AgentEvent::Spawned { id, kind });
        handle
    }

    /// Spawns every manifest entry, skipping unknown types.
    ///
    /// A manifest level id replaces the configured one for agents spawned
    /// from now on.
    pub fn spawn_manifest<P: PhysicsWorld, S: SceneBackend>(
        &mut self,
        manifest: &SpawnManifest,
        physics: &mut P,
        scene: &mut S,
    ) -> Vec<AgentHandle> {
        if let Some(level_id) = &manifest.level_id {
            self.config.level_id.clone_from(level_id);
        }
        manifest
            .agents
            .iter()
            .filter_map(|entry| self.spawn(&entry.kind, entry.options.clone(), physics, scene))
            .collect()
    }

    fn insert(&mut self, agent: Agent) -> AgentHandle {
        let index = if let Some(free_index) = self.free_list.pop() {
            // Reuse a free slot
            self.slots[free_index].agent = Some(agent);
            free_index
        } else {
            // Allocate a new slot
            let index = self.slots.len();
            self.slots.push(Slot {
                generation: 0,
                agent: Some(agent),
            });
            index
        };
        AgentHandle {
            index: index as u32,
            generation: self.slots[index].generation,
        }
    }

    /// Ticks every agent once, in registration order, and syncs visuals.
    pub fn update<P, S, T>(
        &mut self,
        dt: f32,
        player: &mut T,
        platforms: &[CollisionSurface],
        physics: &mut P,
        scene: &mut S,
    ) where
        P: PhysicsWorld,
        S: SceneBackend,
        T: Target + ?Sized,
    {
        for handle in &self.order {
            let Some(agent) = self.slots[handle.index as usize].agent.as_mut() else {
                continue;
            };
            if let Some(report) = agent.tick(dt, player, platforms, physics, &self.movement) {
                sync_visual(agent, &report, scene);
            }
        }
    }

    /// Damages every alive agent within `radius` of `center`. Returns the hit count.
    pub fn damage_in_radius<P: PhysicsWorld>(
        &mut self,
        center: Vec3,
        radius: f32,
        damage: f32,
        physics: &P,
    ) -> usize {
        let mut hits = 0;
        for handle in &self.order {
            let Some(agent) = self.slots[handle.index as usize].agent.as_mut() else {
                continue;
            };
            if !agent.is_alive() {
                continue;
            }
            let Some(body) = physics.body(agent.body()) else {
                continue;
            };
            if body.position().distance(center) <= radius {
                agent.take_damage(damage);
                hits += 1;
            }
        }
        hits
    }

    /// Damages one agent. Returns its remaining health.
    pub fn damage(&mut self, handle: AgentHandle, amount: f32) -> AgentResult<f32> {
        self.get_mut(handle)
            .map(|agent| agent.take_damage(amount))
            .ok_or(AgentError::NotFound(handle))
    }

    /// Removes an agent, detaching its body, health bar and visual.
    pub fn remove<P: PhysicsWorld, S: SceneBackend>(
        &mut self,
        handle: AgentHandle,
        physics: &mut P,
        scene: &mut S,
    ) -> AgentResult<Agent> {
        let slot = self
            .slots
            .get_mut(handle.index as usize)
            .filter(|slot| slot.generation == handle.generation)
            .ok_or(AgentError::NotFound(handle))?;
        let agent = slot.agent.take().ok_or(AgentError::NotFound(handle))?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free_list.push(handle.index as usize);
        self.order.retain(|h| *h != handle);
        self.id_to_handle.remove(&agent.id());

        physics.remove_body(agent.body());
        if let Some(bar) = agent.health_bar() {
            scene.remove_health_bar(bar);
        }
        if let Some(visual) = agent.visual() {
            scene.remove_visual(visual);
        }

        info!("Removed {} ({})", agent.id(), agent.kind());
        self.events.publish(AgentEvent::Removed { id: agent.id() });
        Ok(agent)
    }

    /// Removes every agent.
    pub fn clear<P: PhysicsWorld, S: SceneBackend>(&mut self, physics: &mut P, scene: &mut S) {
        let handles = self.order.clone();
        let count = handles.len();
        for handle in handles {
            if let Err(e) = self.remove(handle, physics, scene) {
                warn!("Failed to remove agent during clear: {e}");
            }
        }
        info!("Cleared {count} agents");
    }

    /// Borrows an agent.
    #[must_use]
    pub fn get(&self, handle: AgentHandle) -> Option<&Agent> {
        self.slots
            .get(handle.index as usize)
            .filter(|slot| slot.generation == handle.generation)
            .and_then(|slot| slot.agent.as_ref())
    }

    /// Mutably borrows an agent.
    pub fn get_mut(&mut self, handle: AgentHandle) -> Option<&mut Agent> {
        self.slots
            .get_mut(handle.index as usize)
            .filter(|slot| slot.generation == handle.generation)
            .and_then(|slot| slot.agent.as_mut())
    }

    /// Handle for an agent ID.
    #[must_use]
    pub fn handle_of(&self, id: AgentId) -> Option<AgentHandle> {
        self.id_to_handle.get(&id).copied()
    }

    /// First agent spawned with `label`.
    #[must_use]
    pub fn find_by_label(&self, label: &str) -> Option<AgentHandle> {
        self.iter()
            .find(|(_, agent)| agent.label() == Some(label))
            .map(|(handle, _)| handle)
    }

    /// Iterates over agents in registration order.
    pub fn iter(&self) -> impl Iterator<Item = (AgentHandle, &Agent)> {
        self.order
            .iter()
            .filter_map(|handle| self.get(*handle).map(|agent| (*handle, agent)))
    }

    /// Number of registered agents, dead or alive.
    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Returns true if no agents are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Number of living agents.
    #[must_use]
    pub fn alive_count(&self) -> usize {
        self.iter().filter(|(_, agent)| agent.is_alive()).count()
    }
}

impl Default for AgentRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

fn sync_visual<S: SceneBackend>(agent: &mut Agent, report: &TickReport, scene: &mut S) {
    let Some(visual) = agent.visual else {
        return;
    };
    scene.set_transform(visual, report.position, report.yaw);
    if let Some(clip) = &report.clip {
        scene.play_clip(visual, clip);
    }

    if agent.shows_health_bar() && agent.health_bar.is_none() && !agent.health_bar_failed {
        match scene.attach_health_bar(visual) {
            Ok(bar) => agent.health_bar = Some(bar),
            Err(e) => {
                warn!("{} has no health bar: {e}", agent.id());
                agent.health_bar_failed = true;
            },
        }
    }
    if let Some(bar) = agent.health_bar {
        scene.update_health_bar(bar, agent.health().fraction(), agent.health_bar_style());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::{BehaviorState, Enrageable};
    use crate::animation::AnimationClip;
    use crate::body::PointMassWorld;
    use crate::patrol::PatrolBehavior;
    use crate::scene::{HeadlessScene, HealthBarStyle};
    use crate::target::PlayerTarget;

    const DT: f32 = 0.25;

    struct Level {
        registry: AgentRegistry,
        physics: PointMassWorld,
        scene: HeadlessScene,
    }

    impl Level {
        fn new() -> Self {
            Self {
                registry: AgentRegistry::with_defaults(),
                physics: PointMassWorld::new(),
                scene: HeadlessScene::new(),
            }
        }

        fn spawn(&mut self, kind: &str, options: SpawnOptions) -> Option<AgentHandle> {
            self.registry
                .spawn(kind, options, &mut self.physics, &mut self.scene)
        }

        fn tick(&mut self, player: &mut PlayerTarget) {
            self.registry
                .update(DT, player, &[], &mut self.physics, &mut self.scene);
        }

        fn agent(&self, handle: AgentHandle) -> &Agent {
            self.registry.get(handle).expect("agent should exist")
        }
    }

    #[test]
    fn test_spawn_registers_agent() {
        let mut level = Level::new();
        let handle = level
            .spawn("boss", SpawnOptions::at(0.0, 1.0, 0.0).with_label("warden"))
            .expect("boss spawns");

        assert_eq!(level.registry.len(), 1);
        let boss = level.agent(handle);
        assert_eq!(boss.kind(), AgentKind::Boss);
        assert_eq!(boss.label(), Some("warden"));
        assert!(boss.visual().is_some());
        assert_eq!(level.registry.handle_of(boss.id()), Some(handle));
        assert_eq!(level.registry.find_by_label("warden"), Some(handle));

        let body = level.physics.body(boss.body()).expect("body");
        assert_eq!(body.position(), Vec3::new(0.0, 1.0, 0.0));
        assert_eq!(body.user_data()["agentId"], boss.id().raw());
        assert_eq!(body.user_data()["kind"], "boss");
        assert_eq!(body.material().friction, 0.8);

        assert_eq!(
            level.registry.drain_events(),
            vec![AgentEvent::Spawned {
                id: boss.id(),
                kind: AgentKind::Boss
            }]
        );
    }

    #[test]
    fn test_unknown_type_returns_none() {
        let mut level = Level::new();
        level.spawn("grunt", SpawnOptions::default()).expect("grunt");
        assert!(level.spawn("unknown_type", SpawnOptions::default()).is_none());
        assert_eq!(level.registry.len(), 1);
        assert_eq!(level.physics.len(), 1);

        let result = level.registry.try_spawn(
            "unknown_type",
            SpawnOptions::default(),
            &mut level.physics,
            &mut level.scene,
        );
        assert!(matches!(result, Err(AgentError::UnknownKind(_))));
    }

    #[test]
    fn test_boss_scenario() {
        let mut level = Level::new();
        let handle = level.spawn("boss", SpawnOptions::default()).expect("boss");

        let mut player = PlayerTarget::new(Vec3::new(0.0, 0.0, 10.0), 1000.0);
        level.tick(&mut player);
        assert_eq!(level.agent(handle).behavior(), BehaviorState::Chase);

        player.position = Vec3::new(0.0, 0.0, 2.0);
        level.tick(&mut player);
        assert_eq!(level.agent(handle).behavior(), BehaviorState::PreAttack);

        // Grace period is 1 s: four ticks of 0.25
        for _ in 0..3 {
            level.tick(&mut player);
            assert!(player.hits.is_empty());
        }
        level.tick(&mut player);
        assert_eq!(level.agent(handle).behavior(), BehaviorState::Attack);
        assert_eq!(player.hits.len(), 1);
        assert_eq!(player.hits[0].1, 25.0);

        // 600 -> 150 crosses the enrage threshold
        assert_eq!(level.registry.damage(handle, 450.0).expect("alive"), 150.0);
        assert!(level.agent(handle).is_enraged());

        // Chained follow-up after the 1.5 s chain cooldown
        for _ in 0..6 {
            level.tick(&mut player);
        }
        assert_eq!(player.hits.len(), 2);
        assert_eq!(player.hits[1].1, 35.0);

        let events = level.registry.drain_events();
        assert!(events.iter().any(|e| matches!(e, AgentEvent::Enraged { .. })));
        assert_eq!(
            events
                .iter()
                .filter(|e| matches!(e, AgentEvent::AttackLanded { .. }))
                .count(),
            2
        );
    }

    #[test]
    fn test_visual_and_health_bar_sync() {
        let mut level = Level::new();
        let handle = level.spawn("boss", SpawnOptions::default()).expect("boss");
        let mut player = PlayerTarget::new(Vec3::new(0.0, 0.0, 50.0), 100.0);
        level.tick(&mut player);

        let boss = level.agent(handle);
        let visual = level.scene.visual(boss.visual().expect("visual")).expect("scene visual");
        assert_eq!(visual.path, "models/bosses/warden.glb");
        assert_eq!(visual.scale, 2.0);
        assert_eq!(visual.clips.last().map(|c| c.clip), Some(AnimationClip::Idle));

        let bar = boss.health_bar().expect("health bar attached");
        level.registry.damage(handle, 500.0).expect("alive");
        level.tick(&mut player);
        let bar = level.scene.health_bar(bar).expect("scene bar");
        assert!((bar.fraction - 100.0 / 600.0).abs() < 1e-6);
        assert_eq!(bar.style, HealthBarStyle::Enraged);
    }

    #[test]
    fn test_model_failure_keeps_agent() {
        let mut level = Level::new();
        level.scene.fail_model("models/bosses/warden.glb");
        let handle = level.spawn("boss", SpawnOptions::default()).expect("boss");
        assert!(level.agent(handle).visual().is_none());

        let mut player = PlayerTarget::new(Vec3::new(0.0, 0.0, 10.0), 100.0);
        level.tick(&mut player);
        assert_eq!(level.agent(handle).behavior(), BehaviorState::Chase);
        assert_eq!(level.scene.visual_count(), 0);
    }

    #[test]
    fn test_health_bar_failure_does_not_stop_others() {
        let mut level = Level::new();
        level.scene.fail_health_bars(true);
        let a = level.spawn("grunt", SpawnOptions::at(0.0, 0.0, 0.0)).expect("a");
        let b = level.spawn("grunt", SpawnOptions::at(2.0, 0.0, 0.0)).expect("b");

        let mut player = PlayerTarget::new(Vec3::new(1.0, 0.0, 5.0), 100.0);
        level.tick(&mut player);
        level.tick(&mut player);
        for handle in [a, b] {
            let agent = level.agent(handle);
            assert_eq!(agent.behavior(), BehaviorState::Chase);
            assert!(agent.health_bar().is_none());
            assert!(agent.health_bar_failed);
        }
    }

    #[test]
    fn test_damage_in_radius_counts_alive_only() {
        let mut level = Level::new();
        let near = level.spawn("grunt", SpawnOptions::at(1.0, 0.0, 0.0)).expect("near");
        let villager = level.spawn("villager", SpawnOptions::at(0.0, 0.0, 4.0)).expect("villager");
        let far = level.spawn("grunt", SpawnOptions::at(6.0, 0.0, 0.0)).expect("far");
        let edge = level.spawn("grunt", SpawnOptions::at(0.0, 0.0, -5.0)).expect("edge");
        let dead = level.spawn("grunt", SpawnOptions::at(2.0, 0.0, 0.0)).expect("dead");
        level.registry.damage(dead, 1000.0).expect("exists");

        let hits = level
            .registry
            .damage_in_radius(Vec3::ZERO, 5.0, 10.0, &level.physics);
        assert_eq!(hits, 3);
        assert_eq!(level.agent(near).health().current(), 50.0);
        assert_eq!(level.agent(edge).health().current(), 50.0);
        assert_eq!(level.agent(villager).health().current(), 40.0);
        assert_eq!(level.agent(far).health().current(), 60.0);
        assert_eq!(level.agent(dead).health().current(), 0.0);
        assert_eq!(level.registry.alive_count(), 4);
    }

    #[test]
    fn test_boss_defeat_reported_once() {
        let mut level = Level::new();
        level.spawn("boss", SpawnOptions::default()).expect("boss");
        level.registry.drain_events();

        level.registry.damage_in_radius(Vec3::ZERO, 5.0, 700.0, &level.physics);
        level.registry.damage_in_radius(Vec3::ZERO, 5.0, 700.0, &level.physics);

        let events = level.registry.drain_events();
        let level_complete = events
            .iter()
            .filter(|e| matches!(e, AgentEvent::LevelComplete { .. }))
            .count();
        let boss_defeated = events
            .iter()
            .filter(|e| matches!(e, AgentEvent::BossDefeated { .. }))
            .count();
        assert_eq!(level_complete, 1);
        assert_eq!(boss_defeated, 1);
        // Dead agents stay registered
        assert_eq!(level.registry.len(), 1);
        assert_eq!(level.registry.alive_count(), 0);
    }

    #[test]
    fn test_boss_defeat_survives_full_bus() {
        let config = AiConfig {
            event_capacity: 16,
            ..AiConfig::default()
        };
        let mut level = Level::new();
        level.registry = AgentRegistry::new(config).expect("valid config");
        let boss = level.spawn("boss", SpawnOptions::at(0.0, 1.0, 0.0)).expect("boss");
        for i in 0..30_u8 {
            level
                .spawn("villager", SpawnOptions::at(40.0 + f32::from(i), 0.0, 0.0))
                .expect("villager");
        }
        let capacity = level.registry.events().capacity();
        assert_eq!(level.registry.events().pending_count(), capacity);

        level.registry.damage(boss, 10_000.0).expect("exists");

        let events = level.registry.drain_events();
        let count = |pred: fn(&AgentEvent) -> bool| events.iter().filter(|e| pred(e)).count();
        assert_eq!(count(|e| matches!(e, AgentEvent::Defeated { .. })), 1);
        assert_eq!(count(|e| matches!(e, AgentEvent::BossDefeated { .. })), 1);
        assert_eq!(count(|e| matches!(e, AgentEvent::LevelComplete { .. })), 1);
        assert!(matches!(events.last(), Some(AgentEvent::LevelComplete { .. })));
    }

    #[test]
    fn test_enraged_boss_chases_with_chase_multiplier() {
        let mut level = Level::new();
        let calm = level.spawn("boss", SpawnOptions::at(-3.0, 0.0, 0.0)).expect("calm");
        let angry = level.spawn("boss", SpawnOptions::at(3.0, 0.0, 0.0)).expect("angry");
        level.registry.damage(angry, 450.0).expect("exists");
        assert!(level.agent(angry).is_enraged());

        let mut player = PlayerTarget::new(Vec3::new(0.0, 0.0, 10.0), 100.0);
        level.tick(&mut player);

        let force = |handle| {
            let body = level.agent(handle).body();
            level.physics.body(body).expect("body").pending_force().length()
        };
        assert_eq!(level.agent(calm).behavior(), BehaviorState::Chase);
        assert_eq!(level.agent(angry).behavior(), BehaviorState::Chase);
        assert!((force(angry) / force(calm) - 1.2).abs() < 1e-4);
    }

    #[test]
    fn test_dead_agent_stops_acting() {
        let mut level = Level::new();
        let handle = level.spawn("grunt", SpawnOptions::default()).expect("grunt");
        level.registry.damage(handle, 1000.0).expect("exists");

        let mut player = PlayerTarget::new(Vec3::new(0.0, 0.0, 1.0), 100.0);
        for _ in 0..20 {
            level.tick(&mut player);
        }
        assert!(player.hits.is_empty());
        let grunt = level.agent(handle);
        assert_eq!(grunt.behavior(), BehaviorState::Dead);
        assert_eq!(grunt.animation().current(), Some(AnimationClip::Death));
    }

    #[test]
    fn test_remove_detaches_everything() {
        let mut level = Level::new();
        let handle = level.spawn("boss", SpawnOptions::default()).expect("boss");
        let mut player = PlayerTarget::new(Vec3::new(0.0, 0.0, 50.0), 100.0);
        level.tick(&mut player);
        assert_eq!(level.scene.health_bar_count(), 1);
        level.registry.drain_events();

        let removed = level
            .registry
            .remove(handle, &mut level.physics, &mut level.scene)
            .expect("remove");
        assert!(level.physics.is_empty());
        assert_eq!(level.scene.visual_count(), 0);
        assert_eq!(level.scene.health_bar_count(), 0);
        assert!(level.registry.is_empty());
        assert!(level.registry.get(handle).is_none());
        assert!(level.registry.handle_of(removed.id()).is_none());
        assert_eq!(
            level.registry.drain_events(),
            vec![AgentEvent::Removed { id: removed.id() }]
        );

        let again = level
            .registry
            .remove(handle, &mut level.physics, &mut level.scene);
        assert!(matches!(again, Err(AgentError::NotFound(_))));
    }

    #[test]
    fn test_stale_handle_after_slot_reuse() {
        let mut level = Level::new();
        let old = level.spawn("grunt", SpawnOptions::default()).expect("old");
        level
            .registry
            .remove(old, &mut level.physics, &mut level.scene)
            .expect("remove");
        let new = level.spawn("villager", SpawnOptions::default()).expect("new");

        assert_eq!(old.index(), new.index());
        assert_ne!(old.generation(), new.generation());
        assert!(level.registry.get(old).is_none());
        assert_eq!(level.agent(new).kind(), AgentKind::Villager);
    }

    #[test]
    fn test_registration_order_survives_reuse() {
        let mut level = Level::new();
        for label in ["a", "b", "c"] {
            level.spawn("villager", SpawnOptions::default().with_label(label));
        }
        let b = level.registry.find_by_label("b").expect("b");
        level
            .registry
            .remove(b, &mut level.physics, &mut level.scene)
            .expect("remove");
        level.spawn("villager", SpawnOptions::default().with_label("d"));

        let labels: Vec<_> = level
            .registry
            .iter()
            .filter_map(|(_, agent)| agent.label())
            .collect();
        assert_eq!(labels, vec!["a", "c", "d"]);
    }

    #[test]
    fn test_clear() {
        let mut level = Level::new();
        level.spawn("boss", SpawnOptions::default());
        level.spawn("villager", SpawnOptions::default());
        level
            .registry
            .clear(&mut level.physics, &mut level.scene);
        assert!(level.registry.is_empty());
        assert!(level.physics.is_empty());
        assert_eq!(level.scene.visual_count(), 0);
    }

    #[test]
    fn test_villager_patrols_through_registry() {
        let mut level = Level::new();
        let handle = level
            .spawn(
                "villager",
                SpawnOptions::at(0.0, 0.0, 0.0)
                    .with_patrol_points(vec![vec![0.0, 0.0, 0.0], vec![8.0, 0.0, 0.0]])
                    .with_wait_time(0.5)
                    .with_patrol_behavior(PatrolBehavior::Loop),
            )
            .expect("villager");
        let mut player = PlayerTarget::new(Vec3::new(100.0, 0.0, 100.0), 100.0);

        // Starts on waypoint 0: arrives, dwells 0.5 s, heads for waypoint 1
        for _ in 0..3 {
            level.tick(&mut player);
        }
        let villager = level.agent(handle);
        assert_eq!(villager.patrol().expect("patrol").index(), 1);
        assert_eq!(villager.behavior(), BehaviorState::Moving);

        let body = level.physics.body(villager.body()).expect("body");
        assert!(body.pending_force().x > 0.0);
    }

    #[test]
    fn test_spawn_manifest() {
        let mut level = Level::new();
        let manifest = SpawnManifest::from_ron_str(
            r#"(
                level_id: Some("crypt"),
                agents: [
                    (kind: "boss"),
                    (kind: "dragon"),
                    (kind: "npc", options: (id: Some("baker"))),
                ],
            )"#,
        )
        .expect("manifest");

        let handles =
            level
                .registry
                .spawn_manifest(&manifest, &mut level.physics, &mut level.scene);
        assert_eq!(handles.len(), 2);
        assert_eq!(level.registry.config().level_id, "crypt");
        assert!(level.registry.find_by_label("baker").is_some());

        level.registry.damage(handles[0], 1000.0).expect("boss");
        assert!(level.registry.drain_events().contains(&AgentEvent::LevelComplete {
            level_id: "crypt".into()
        }));
    }

    #[test]
    fn test_config_overrides_reach_agents() {
        let mut config = AiConfig::default();
        config.archetypes.insert(
            "grunt".into(),
            crate::config::ArchetypeOverrides {
                max_health: Some(75.0),
                ..Default::default()
            },
        );
        let mut registry = AgentRegistry::new(config).expect("valid config");
        let mut physics = PointMassWorld::new();
        let mut scene = HeadlessScene::new();
        let handle = registry.spawn_kind(
            AgentKind::Grunt,
            SpawnOptions::default(),
            &mut physics,
            &mut scene,
        );
        assert_eq!(registry.get(handle).expect("grunt").health().max(), 75.0);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = AiConfig::default();
        config.archetypes.insert(
            "boss".into(),
            crate::config::ArchetypeOverrides {
                attack_range: Some(40.0),
                ..Default::default()
            },
        );
        assert!(AgentRegistry::new(config).is_err());
    }
}
