//! Agent state and the per-agent tick.
//!
//! An [`Agent`] is a plain record plus one controller:
//! - passive kinds carry a [`PatrolController`]
//! - hostile kinds carry a [`CombatController`]
//!
//! Position and velocity live on the physics body; the agent only holds a
//! handle, reads the body back every tick and steers it with forces.

use glam::Vec3;
use serde::{Deserialize, Serialize};
use sentinel_common::{horizontal_speed, yaw_of, AgentId, BodyHandle, HealthBarHandle, VisualHandle};
use tracing::{debug, info, warn};

use crate::animation::{AnimationSelector, ClipRequest};
use crate::archetype::{AgentKind, Archetype, Disposition, EnrageProfile};
use crate::body::{CollisionSurface, PhysicsBody, PhysicsWorld};
use crate::combat::{Attacker, CombatController, Strike, CHASE_ESCAPE_FACTOR};
use crate::config::AiConfig;
use crate::events::{AgentEvent, EventPublisher};
use crate::manifest::SpawnOptions;
use crate::movement::{MoveIntent, MovementResolver};
use crate::patrol::{normalize_patrol_points, PatrolController, Patroller};
use crate::scene::HealthBarStyle;
use crate::target::Target;

/// Behavior state shared by both controllers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BehaviorState {
    /// Standing still (dwelling or waiting for a target)
    #[default]
    Idle,
    /// Walking to a waypoint
    Moving,
    /// Running at the target
    Chase,
    /// Telegraphing the first attack
    PreAttack,
    /// Swinging
    Attack,
    /// Health reached zero
    Dead,
}

impl BehaviorState {
    /// Lowercase name for logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Moving => "moving",
            Self::Chase => "chase",
            Self::PreAttack => "pre_attack",
            Self::Attack => "attack",
            Self::Dead => "dead",
        }
    }
}

impl std::fmt::Display for BehaviorState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Health component. Never increases.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Health {
    current: f32,
    max: f32,
}

impl Health {
    /// Creates full health.
    #[must_use]
    pub fn new(max: f32) -> Self {
        let max = max.max(0.0);
        Self { current: max, max }
    }

    /// Current health.
    #[must_use]
    pub fn current(&self) -> f32 {
        self.current
    }

    /// Maximum health.
    #[must_use]
    pub fn max(&self) -> f32 {
        self.max
    }

    /// Health as a fraction of max (0-1).
    #[must_use]
    pub fn fraction(&self) -> f32 {
        if self.max > 0.0 {
            self.current / self.max
        } else {
            0.0
        }
    }

    /// Checks if health is depleted.
    #[must_use]
    pub fn is_dead(&self) -> bool {
        self.current <= 0.0
    }

    /// Applies damage and returns the remaining health.
    ///
    /// Negative and NaN amounts are ignored.
    pub fn damage(&mut self, amount: f32) -> f32 {
        if amount > 0.0 {
            self.current = (self.current - amount).max(0.0);
        }
        self.current
    }
}

/// Tunables fixed at spawn. Only enrage modifies them afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Tunables {
    /// Distance at which an idle agent starts chasing
    pub detection_range: f32,
    /// Chase range; escape radius is this times [`CHASE_ESCAPE_FACTOR`]
    pub chase_range: f32,
    /// Distance at which an attack lands
    pub attack_range: f32,
    /// Seconds between attack sequences
    pub attack_cooldown: f32,
    /// Telegraph window before the first attack
    pub attack_grace_period: f32,
    /// Length of one swing
    pub attack_duration: f32,
    /// Patrol speed
    pub move_speed: f32,
    /// Chase speed
    pub chase_speed: f32,
    /// Damage per hit
    pub attack_damage: f32,
    /// Damage per hit while enraged
    pub enraged_damage: f32,
    /// Attacks per chained sequence
    pub max_chain_attacks: u32,
    /// Seconds between chained attacks
    pub chain_cooldown: f32,
    /// Steering force multiplier
    pub force_multiplier: f32,
    /// Body radius (center to feet)
    pub body_radius: f32,
}

impl Tunables {
    /// Tunables straight from an archetype.
    #[must_use]
    pub fn from_archetype(archetype: &Archetype) -> Self {
        Self {
            detection_range: archetype.detection_range,
            chase_range: archetype.chase_range,
            attack_range: archetype.attack_range,
            attack_cooldown: archetype.attack_cooldown,
            attack_grace_period: archetype.attack_grace_period,
            attack_duration: archetype.attack_duration,
            move_speed: archetype.move_speed,
            chase_speed: archetype.chase_speed,
            attack_damage: archetype.attack_damage,
            enraged_damage: archetype.enraged_damage,
            max_chain_attacks: archetype.max_chain_attacks,
            chain_cooldown: archetype.chain_cooldown,
            force_multiplier: archetype.force_multiplier,
            body_radius: archetype.body_radius,
        }
    }

    /// Archetype tunables with per-spawn overrides applied.
    ///
    /// A `speed` override also scales chase speed by the same ratio. Detection
    /// range is clamped to the escape radius.
    #[must_use]
    pub fn for_spawn(archetype: &Archetype, options: &SpawnOptions) -> Self {
        let mut tunables = Self::from_archetype(archetype);

        if let Some(speed) = options.speed.filter(|s| s.is_finite() && *s >= 0.0) {
            if archetype.move_speed > 0.0 {
                tunables.chase_speed = archetype.chase_speed * speed / archetype.move_speed;
            }
            tunables.move_speed = speed;
        }
        if let Some(range) = options.chase_range.filter(|r| r.is_finite() && *r > 0.0) {
            tunables.chase_range = range;
        }

        let escape = tunables.chase_range * CHASE_ESCAPE_FACTOR;
        if archetype.kind.disposition() == Disposition::Hostile && tunables.detection_range > escape {
            warn!(
                "{} detection range {} exceeds escape radius {escape}, clamping",
                archetype.kind, tunables.detection_range
            );
            tunables.detection_range = escape;
        }
        tunables
    }
}

/// Plain per-agent data the controllers read and write.
#[derive(Debug, Clone, PartialEq)]
pub struct AgentState {
    /// Owning agent
    pub id: AgentId,
    /// Health
    pub health: Health,
    /// False once health reaches zero; never true again
    pub alive: bool,
    /// Current behavior
    pub behavior: BehaviorState,
    /// Seconds since the last behavior change
    pub state_timer: f32,
    /// Seconds of simulation this agent has lived through
    pub clock: f32,
    /// One-way enrage flag
    pub enraged: bool,
    /// Spawn-time tunables
    pub tunables: Tunables,
    /// Set when the defeat notification has been published
    pub death_event_fired: bool,
}

impl AgentState {
    /// Creates a living state.
    #[must_use]
    pub fn new(id: AgentId, tunables: Tunables, max_health: f32, behavior: BehaviorState) -> Self {
        Self {
            id,
            health: Health::new(max_health),
            alive: true,
            behavior,
            state_timer: 0.0,
            clock: 0.0,
            enraged: false,
            tunables,
            death_event_fired: false,
        }
    }

    /// Advances the agent clock and the state timer.
    pub fn advance_clock(&mut self, dt: f32) {
        let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };
        self.clock += dt;
        self.state_timer += dt;
    }

    /// Switches behavior, resetting the state timer. Returns whether it changed.
    pub fn set_behavior(&mut self, to: BehaviorState) -> bool {
        if self.behavior == to || self.behavior == BehaviorState::Dead {
            return false;
        }
        debug!("{} {} -> {}", self.id, self.behavior, to);
        self.behavior = to;
        self.state_timer = 0.0;
        true
    }
}

/// Controller chosen by the agent's disposition.
#[derive(Debug, Clone)]
pub enum Controller {
    /// Waypoint patrol
    Patrol(PatrolController),
    /// Hostile state machine
    Combat(CombatController),
}

/// One-way escalation when health runs low.
pub trait Enrageable {
    /// Whether the agent has enraged.
    fn is_enraged(&self) -> bool;

    /// Enrages if health is at or below the threshold. Returns whether it
    /// enraged on this call.
    fn check_enrage(&mut self) -> bool;
}

/// What a tick produced for the scene.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickReport {
    /// Body position after the last physics step
    pub position: Vec3,
    /// Facing yaw (radians)
    pub yaw: f32,
    /// Clip change, if any
    pub clip: Option<ClipRequest>,
    /// Attack executed this tick
    pub strike: Option<Strike>,
    /// Force applied to the body
    pub force: Vec3,
}

/// An autonomous agent.
#[derive(Debug)]
pub struct Agent {
    id: AgentId,
    kind: AgentKind,
    label: Option<String>,
    body: BodyHandle,
    pub(crate) visual: Option<VisualHandle>,
    pub(crate) health_bar: Option<HealthBarHandle>,
    pub(crate) health_bar_failed: bool,
    show_health_bar: bool,
    state: AgentState,
    controller: Controller,
    animation: AnimationSelector,
    enrage: Option<EnrageProfile>,
    level_id: String,
    yaw: f32,
    events: EventPublisher,
}

impl Agent {
    /// Builds an agent around an existing body.
    #[must_use]
    pub fn new(
        id: AgentId,
        archetype: &Archetype,
        options: &SpawnOptions,
        config: &AiConfig,
        body: BodyHandle,
        events: EventPublisher,
    ) -> Self {
        let tunables = Tunables::for_spawn(archetype, options);
        let max_health = options
            .health
            .filter(|h| h.is_finite() && *h > 0.0)
            .unwrap_or(archetype.max_health);

        let (controller, behavior) = match archetype.kind.disposition() {
            Disposition::Hostile => (
                Controller::Combat(CombatController::new(tunables.attack_grace_period)),
                BehaviorState::Idle,
            ),
            Disposition::Passive => {
                let points = normalize_patrol_points(
                    &options.patrol_points,
                    options.position(),
                    config.patrol_ring_radius,
                    config.patrol_ring_points,
                );
                let dwell = options
                    .wait_time
                    .filter(|w| w.is_finite() && *w >= 0.0)
                    .unwrap_or(config.default_dwell_time);
                let patrol = PatrolController::new(
                    points,
                    options.patrol_behavior,
                    dwell,
                    config.arrival_threshold,
                )
                .with_notice_range(options.notice_range.or(archetype.notice_range));
                (Controller::Patrol(patrol), BehaviorState::Moving)
            },
        };

        Self {
            id,
            kind: archetype.kind,
            label: options.id.clone(),
            body,
            visual: None,
            health_bar: None,
            health_bar_failed: false,
            show_health_bar: archetype.show_health_bar,
            state: AgentState::new(id, tunables, max_health, behavior),
            controller,
            animation: AnimationSelector::from_config(config),
            enrage: archetype.enrage,
            level_id: config.level_id.clone(),
            yaw: 0.0,
            events,
        }
    }

    /// Agent ID.
    #[must_use]
    pub fn id(&self) -> AgentId {
        self.id
    }

    /// Agent kind.
    #[must_use]
    pub fn kind(&self) -> AgentKind {
        self.kind
    }

    /// Spawn label.
    #[must_use]
    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    /// Physics body handle.
    #[must_use]
    pub fn body(&self) -> BodyHandle {
        self.body
    }

    /// Visual handle, if the model loaded.
    #[must_use]
    pub fn visual(&self) -> Option<VisualHandle> {
        self.visual
    }

    /// Health bar handle, if attached.
    #[must_use]
    pub fn health_bar(&self) -> Option<HealthBarHandle> {
        self.health_bar
    }

    /// Whether this agent wants a health bar.
    #[must_use]
    pub fn shows_health_bar(&self) -> bool {
        self.show_health_bar
    }

    /// Full state.
    #[must_use]
    pub fn state(&self) -> &AgentState {
        &self.state
    }

    /// Current behavior.
    #[must_use]
    pub fn behavior(&self) -> BehaviorState {
        self.state.behavior
    }

    /// Health.
    #[must_use]
    pub fn health(&self) -> Health {
        self.state.health
    }

    /// Whether the agent is alive.
    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.state.alive
    }

    /// Whether defeating this agent completes the level.
    #[must_use]
    pub fn is_boss(&self) -> bool {
        self.kind.is_boss()
    }

    /// Facing yaw (radians).
    #[must_use]
    pub fn yaw(&self) -> f32 {
        self.yaw
    }

    /// Controller.
    #[must_use]
    pub fn controller(&self) -> &Controller {
        &self.controller
    }

    /// Patrol controller for passive agents.
    #[must_use]
    pub fn patrol(&self) -> Option<&PatrolController> {
        match &self.controller {
            Controller::Patrol(patrol) => Some(patrol),
            Controller::Combat(_) => None,
        }
    }

    /// Combat controller for hostile agents.
    #[must_use]
    pub fn combat(&self) -> Option<&CombatController> {
        match &self.controller {
            Controller::Combat(combat) => Some(combat),
            Controller::Patrol(_) => None,
        }
    }

    /// Animation selector.
    #[must_use]
    pub fn animation(&self) -> &AnimationSelector {
        &self.animation
    }

    /// Health bar look for the current state.
    #[must_use]
    pub fn health_bar_style(&self) -> HealthBarStyle {
        if self.state.enraged {
            HealthBarStyle::Enraged
        } else {
            HealthBarStyle::Normal
        }
    }

    /// Applies damage and returns the remaining health.
    ///
    /// Damage to a dead agent is ignored.
    pub fn take_damage(&mut self, amount: f32) -> f32 {
        if !self.state.alive {
            return self.state.health.current();
        }

        let remaining = self.state.health.damage(amount);
        debug!("{} took {amount}, health {remaining}", self.id);

        if self.state.health.is_dead() {
            self.die();
        } else {
            self.check_enrage();
        }
        remaining
    }

    fn die(&mut self) {
        self.state.alive = false;
        let from = self.state.behavior;
        if self.state.set_behavior(BehaviorState::Dead) {
            self.events.publish(AgentEvent::StateChanged {
                id: self.id,
                from,
                to: BehaviorState::Dead,
            });
        }

        if self.state.death_event_fired {
            return;
        }
        self.state.death_event_fired = true;
        info!("{} ({}) defeated", self.id, self.kind);
        self.events.publish(AgentEvent::Defeated {
            id: self.id,
            kind: self.kind,
        });
        if self.is_boss() {
            self.events.publish(AgentEvent::BossDefeated {
                level_id: self.level_id.clone(),
            });
            self.events.publish(AgentEvent::LevelComplete {
                level_id: self.level_id.clone(),
            });
        }
    }

    /// Runs one simulation tick.
    ///
    /// Returns `None` if the agent's body no longer exists.
    pub fn tick<P, T>(
        &mut self,
        dt: f32,
        target: &mut T,
        surfaces: &[CollisionSurface],
        physics: &mut P,
        movement: &MovementResolver,
    ) -> Option<TickReport>
    where
        P: PhysicsWorld,
        T: Target + ?Sized,
    {
        let (position, velocity) = match physics.body(self.body) {
            Some(body) => (body.position(), body.velocity()),
            None => {
                warn!("{} has no physics body", self.id);
                return None;
            },
        };

        self.state.advance_clock(dt);
        let from = self.state.behavior;

        let (intent, strike) = if self.state.alive {
            match &mut self.controller {
                Controller::Patrol(patrol) => {
                    let seen = target.is_detectable().then(|| target.position());
                    (patrol.patrol(&mut self.state, position, seen), None)
                },
                Controller::Combat(combat) => {
                    let outcome = combat.engage(&mut self.state, position, target);
                    (outcome.intent, outcome.strike)
                },
            }
        } else {
            (MoveIntent::STOP, None)
        };

        if let Some(strike) = strike {
            self.events.publish(if strike.hit {
                AgentEvent::AttackLanded {
                    id: self.id,
                    damage: strike.damage,
                    distance: strike.distance,
                }
            } else {
                AgentEvent::AttackMissed {
                    id: self.id,
                    distance: strike.distance,
                }
            });
        }
        if self.state.behavior != from {
            self.events.publish(AgentEvent::StateChanged {
                id: self.id,
                from,
                to: self.state.behavior,
            });
        }

        if let Some(yaw) = intent.facing().and_then(yaw_of) {
            self.yaw = yaw;
        }

        let grounded = movement.is_grounded(position, self.state.tunables.body_radius, surfaces);
        let force = match physics.body_mut(self.body) {
            Some(body) => movement.apply(body, &intent, self.state.tunables.force_multiplier, grounded),
            None => Vec3::ZERO,
        };

        let restart = strike.is_some_and(|s| s.chained);
        let clip = self
            .animation
            .update(self.state.behavior, horizontal_speed(velocity), dt, restart);

        Some(TickReport {
            position,
            yaw: self.yaw,
            clip,
            strike,
            force,
        })
    }
}

impl Enrageable for Agent {
    fn is_enraged(&self) -> bool {
        self.state.enraged
    }

    fn check_enrage(&mut self) -> bool {
        if self.state.enraged || !self.state.alive {
            return false;
        }
        let Some(profile) = self.enrage else {
            return false;
        };
        if self.state.health.current() > profile.threshold(self.state.health.max()) {
            return false;
        }

        self.state.enraged = true;
        let t = &mut self.state.tunables;
        t.move_speed *= profile.speed_multiplier;
        t.chase_speed *= profile.chase_speed_multiplier;
        t.attack_cooldown *= profile.cooldown_multiplier;

        info!("{} ({}) is enraged", self.id, self.kind);
        self.events.publish(AgentEvent::Enraged { id: self.id });
        true
    }
}
