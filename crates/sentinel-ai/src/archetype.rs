//! Agent kinds and their archetype defaults.
//!
//! Every spawnable agent is one of a closed set of [`AgentKind`]s. Each kind
//! maps to an [`Archetype`]: the tunables, physics parameters and visual asset
//! it spawns with. The table is built once (built-ins plus config overrides)
//! and validated before any agent is spawned, so a bad value surfaces at load
//! time instead of as odd behavior mid-level.

use serde::{Deserialize, Serialize};
use sentinel_common::{ConfigError, ConfigResult};
use std::str::FromStr;

use crate::combat::CHASE_ESCAPE_FACTOR;
use crate::config::{AiConfig, ArchetypeOverrides};
use crate::error::AgentError;

/// Closed set of spawnable agent types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentKind {
    /// Basic melee enemy
    Grunt,
    /// Heavy enemy, slow to turn and hard to push
    Brute,
    /// Level boss; its defeat completes the level
    Boss,
    /// Wandering townsperson
    Villager,
    /// Patrolling sentry that stops to watch the player
    Guard,
}

impl AgentKind {
    /// Get all agent kinds.
    #[must_use]
    pub const fn all() -> [Self; 5] {
        [Self::Grunt, Self::Brute, Self::Boss, Self::Villager, Self::Guard]
    }

    /// Stable lowercase name used in manifests and logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Grunt => "grunt",
            Self::Brute => "brute",
            Self::Boss => "boss",
            Self::Villager => "villager",
            Self::Guard => "guard",
        }
    }

    /// Get display name.
    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Grunt => "Grunt",
            Self::Brute => "Brute",
            Self::Boss => "Boss",
            Self::Villager => "Villager",
            Self::Guard => "Guard",
        }
    }

    /// Whether this kind fights or patrols.
    #[must_use]
    pub const fn disposition(self) -> Disposition {
        match self {
            Self::Grunt | Self::Brute | Self::Boss => Disposition::Hostile,
            Self::Villager | Self::Guard => Disposition::Passive,
        }
    }

    /// Whether defeating this kind signals level completion.
    #[must_use]
    pub const fn is_boss(self) -> bool {
        matches!(self, Self::Boss)
    }

    const fn index(self) -> usize {
        self as usize
    }
}

impl std::fmt::Display for AgentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AgentKind {
    type Err = AgentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "grunt" | "enemy" => Ok(Self::Grunt),
            "brute" => Ok(Self::Brute),
            "boss" => Ok(Self::Boss),
            "villager" | "npc" => Ok(Self::Villager),
            "guard" => Ok(Self::Guard),
            _ => Err(AgentError::UnknownKind(s.to_string())),
        }
    }
}

/// Which controller drives an agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Disposition {
    /// Detects, chases and attacks the target
    Hostile,
    /// Walks a patrol route
    Passive,
}

/// One-way escalation parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EnrageProfile {
    /// Fraction of max health at or below which enrage triggers
    pub threshold_fraction: f32,
    /// Multiplier applied to patrol movement speed
    pub speed_multiplier: f32,
    /// Multiplier applied to chase speed, the only speed a hostile agent steers with
    pub chase_speed_multiplier: f32,
    /// Multiplier applied to the attack cooldown
    pub cooldown_multiplier: f32,
}

impl Default for EnrageProfile {
    fn default() -> Self {
        Self {
            threshold_fraction: 0.25,
            speed_multiplier: 1.3,
            chase_speed_multiplier: 1.2,
            cooldown_multiplier: 0.75,
        }
    }
}

impl EnrageProfile {
    /// Health value at which enrage triggers for a given max health.
    #[must_use]
    pub fn threshold(&self, max_health: f32) -> f32 {
        max_health * self.threshold_fraction
    }
}

/// Spawn-time defaults for one agent kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Archetype {
    /// Kind this archetype describes
    pub kind: AgentKind,
    /// Model asset path handed to the scene
    pub model: String,
    /// Visual scale
    pub scale: f32,
    /// Starting and maximum health
    pub max_health: f32,
    /// Walking/patrol speed (m/s)
    pub move_speed: f32,
    /// Chase speed (m/s)
    pub chase_speed: f32,
    /// Idle agents notice the target within this distance
    pub detection_range: f32,
    /// Chasing agents give up beyond this distance times [`CHASE_ESCAPE_FACTOR`]
    pub chase_range: f32,
    /// Distance at which an attack can land
    pub attack_range: f32,
    /// Seconds between attacks
    pub attack_cooldown: f32,
    /// Telegraph window before the first attack (seconds)
    pub attack_grace_period: f32,
    /// Length of one attack swing (seconds)
    pub attack_duration: f32,
    /// Damage per hit
    pub attack_damage: f32,
    /// Damage per hit while enraged
    pub enraged_damage: f32,
    /// Maximum attacks in one chained sequence
    pub max_chain_attacks: u32,
    /// Cooldown between chained attacks (seconds)
    pub chain_cooldown: f32,
    /// Enrage parameters, if this kind can enrage
    pub enrage: Option<EnrageProfile>,
    /// Passive agents halt and watch a target within this distance
    pub notice_range: Option<f32>,
    /// Body mass (kg)
    pub mass: f32,
    /// Steering force per unit of desired speed
    pub force_multiplier: f32,
    /// Linear damping on the body
    pub linear_damping: f32,
    /// Angular damping on the body
    pub angular_damping: f32,
    /// Surface friction
    pub friction: f32,
    /// Surface restitution
    pub restitution: f32,
    /// Collision radius; also the offset from body center to feet
    pub body_radius: f32,
    /// Whether a health bar is shown above the agent
    pub show_health_bar: bool,
}

impl Archetype {
    /// Built-in defaults for a kind.
    #[must_use]
    pub fn builtin(kind: AgentKind) -> Self {
        match kind {
            AgentKind::Grunt => Self {
                kind,
                model: "models/enemies/grunt.glb".into(),
                scale: 1.0,
                max_health: 60.0,
                move_speed: 2.0,
                chase_speed: 3.5,
                detection_range: 10.0,
                chase_range: 12.0,
                attack_range: 1.8,
                attack_cooldown: 1.5,
                attack_grace_period: 0.6,
                attack_duration: 0.5,
                attack_damage: 10.0,
                enraged_damage: 10.0,
                max_chain_attacks: 1,
                chain_cooldown: 1.5,
                enrage: None,
                notice_range: None,
                mass: 60.0,
                force_multiplier: 240.0,
                linear_damping: 4.0,
                angular_damping: 6.0,
                friction: 0.4,
                restitution: 0.0,
                body_radius: 0.5,
                show_health_bar: true,
            },
            AgentKind::Brute => Self {
                kind,
                model: "models/enemies/brute.glb".into(),
                scale: 1.4,
                max_health: 180.0,
                move_speed: 1.5,
                chase_speed: 2.6,
                detection_range: 12.0,
                chase_range: 14.0,
                attack_range: 2.4,
                attack_cooldown: 2.5,
                attack_grace_period: 0.8,
                attack_duration: 0.8,
                attack_damage: 18.0,
                enraged_damage: 24.0,
                max_chain_attacks: 2,
                chain_cooldown: 1.2,
                enrage: Some(EnrageProfile {
                    threshold_fraction: 0.3,
                    ..EnrageProfile::default()
                }),
                notice_range: None,
                mass: 150.0,
                force_multiplier: 450.0,
                linear_damping: 3.0,
                angular_damping: 8.0,
                friction: 0.6,
                restitution: 0.0,
                body_radius: 0.8,
                show_health_bar: true,
            },
            AgentKind::Boss => Self {
                kind,
                model: "models/bosses/warden.glb".into(),
                scale: 2.0,
                max_health: 600.0,
                move_speed: 2.5,
                chase_speed: 4.0,
                detection_range: 15.0,
                chase_range: 20.0,
                attack_range: 3.0,
                attack_cooldown: 4.0,
                attack_grace_period: 1.0,
                attack_duration: 1.0,
                attack_damage: 25.0,
                enraged_damage: 35.0,
                max_chain_attacks: 3,
                chain_cooldown: 1.5,
                enrage: Some(EnrageProfile::default()),
                notice_range: None,
                mass: 400.0,
                force_multiplier: 1000.0,
                linear_damping: 2.5,
                angular_damping: 10.0,
                friction: 0.8,
                restitution: 0.0,
                body_radius: 1.2,
                show_health_bar: true,
            },
            AgentKind::Villager => Self {
                kind,
                model: "models/npcs/villager.glb".into(),
                scale: 1.0,
                max_health: 50.0,
                move_speed: 1.5,
                chase_speed: 1.5,
                detection_range: 0.0,
                chase_range: 0.0,
                attack_range: 0.0,
                attack_cooldown: 0.0,
                attack_grace_period: 0.0,
                attack_duration: 0.0,
                attack_damage: 0.0,
                enraged_damage: 0.0,
                max_chain_attacks: 0,
                chain_cooldown: 0.0,
                enrage: None,
                notice_range: None,
                mass: 60.0,
                force_multiplier: 300.0,
                linear_damping: 5.0,
                angular_damping: 6.0,
                friction: 0.5,
                restitution: 0.0,
                body_radius: 0.45,
                show_health_bar: false,
            },
            AgentKind::Guard => Self {
                kind,
                model: "models/npcs/guard.glb".into(),
                scale: 1.1,
                max_health: 100.0,
                move_speed: 1.8,
                chase_speed: 1.8,
                detection_range: 0.0,
                chase_range: 0.0,
                attack_range: 0.0,
                attack_cooldown: 0.0,
                attack_grace_period: 0.0,
                attack_duration: 0.0,
                attack_damage: 0.0,
                enraged_damage: 0.0,
                max_chain_attacks: 0,
                chain_cooldown: 0.0,
                enrage: None,
                notice_range: Some(4.0),
                mass: 80.0,
                force_multiplier: 400.0,
                linear_damping: 5.0,
                angular_damping: 6.0,
                friction: 0.5,
                restitution: 0.0,
                body_radius: 0.5,
                show_health_bar: false,
            },
        }
    }

    /// Applies config overrides in place.
    pub fn apply(&mut self, o: &ArchetypeOverrides) {
        fn set<T: Clone>(slot: &mut T, value: &Option<T>) {
            if let Some(v) = value {
                *slot = v.clone();
            }
        }

        set(&mut self.model, &o.model);
        set(&mut self.scale, &o.scale);
        set(&mut self.max_health, &o.max_health);
        set(&mut self.move_speed, &o.move_speed);
        set(&mut self.chase_speed, &o.chase_speed);
        set(&mut self.detection_range, &o.detection_range);
        set(&mut self.chase_range, &o.chase_range);
        set(&mut self.attack_range, &o.attack_range);
        set(&mut self.attack_cooldown, &o.attack_cooldown);
        set(&mut self.attack_grace_period, &o.attack_grace_period);
        set(&mut self.attack_duration, &o.attack_duration);
        set(&mut self.attack_damage, &o.attack_damage);
        set(&mut self.enraged_damage, &o.enraged_damage);
        set(&mut self.max_chain_attacks, &o.max_chain_attacks);
        set(&mut self.chain_cooldown, &o.chain_cooldown);
        set(&mut self.mass, &o.mass);
        set(&mut self.force_multiplier, &o.force_multiplier);
        set(&mut self.linear_damping, &o.linear_damping);
        set(&mut self.angular_damping, &o.angular_damping);

        if let Some(fraction) = o.enrage_threshold {
            let mut profile = self.enrage.unwrap_or_default();
            profile.threshold_fraction = fraction;
            self.enrage = Some(profile);
        }
        if o.notice_range.is_some() {
            self.notice_range = o.notice_range;
        }
    }

    /// Checks every tunable; hostile kinds get the combat checks too.
    pub fn validate(&self) -> ConfigResult<()> {
        let name = self.kind.as_str();
        let field = |f: &str| format!("{name}.{f}");

        let positive = |value: f32, f: &str| -> ConfigResult<()> {
            if value.is_finite() && value > 0.0 {
                Ok(())
            } else {
                Err(ConfigError::invalid(field(f), format!("must be positive, got {value}")))
            }
        };
        let non_negative = |value: f32, f: &str| -> ConfigResult<()> {
            if value.is_finite() && value >= 0.0 {
                Ok(())
            } else {
                Err(ConfigError::invalid(field(f), format!("must be >= 0, got {value}")))
            }
        };
        let unit = |value: f32, f: &str| -> ConfigResult<()> {
            if (0.0..=1.0).contains(&value) {
                Ok(())
            } else {
                Err(ConfigError::invalid(field(f), format!("must be within [0, 1], got {value}")))
            }
        };

        if self.model.trim().is_empty() {
            return Err(ConfigError::invalid(field("model"), "asset path is empty"));
        }
        positive(self.scale, "scale")?;
        positive(self.max_health, "max_health")?;
        non_negative(self.move_speed, "move_speed")?;
        positive(self.mass, "mass")?;
        non_negative(self.force_multiplier, "force_multiplier")?;
        non_negative(self.linear_damping, "linear_damping")?;
        non_negative(self.angular_damping, "angular_damping")?;
        unit(self.friction, "friction")?;
        unit(self.restitution, "restitution")?;
        positive(self.body_radius, "body_radius")?;
        if let Some(range) = self.notice_range {
            non_negative(range, "notice_range")?;
        }

        if self.kind.disposition() == Disposition::Passive {
            return Ok(());
        }

        positive(self.chase_speed, "chase_speed")?;
        positive(self.detection_range, "detection_range")?;
        positive(self.chase_range, "chase_range")?;
        positive(self.attack_range, "attack_range")?;
        non_negative(self.attack_cooldown, "attack_cooldown")?;
        non_negative(self.attack_grace_period, "attack_grace_period")?;
        positive(self.attack_duration, "attack_duration")?;
        non_negative(self.attack_damage, "attack_damage")?;
        non_negative(self.chain_cooldown, "chain_cooldown")?;

        if self.detection_range > self.chase_range * CHASE_ESCAPE_FACTOR {
            return Err(ConfigError::invalid(
                field("detection_range"),
                format!(
                    "{} exceeds the escape radius {} (chase_range x {CHASE_ESCAPE_FACTOR})",
                    self.detection_range,
                    self.chase_range * CHASE_ESCAPE_FACTOR
                ),
            ));
        }
        if self.attack_range > self.detection_range {
            return Err(ConfigError::invalid(
                field("attack_range"),
                "must not exceed detection_range",
            ));
        }
        if self.enraged_damage < self.attack_damage {
            return Err(ConfigError::invalid(
                field("enraged_damage"),
                "must be at least attack_damage",
            ));
        }
        if self.max_chain_attacks == 0 {
            return Err(ConfigError::invalid(field("max_chain_attacks"), "must be at least 1"));
        }
        if self.chain_cooldown > self.attack_cooldown {
            return Err(ConfigError::invalid(
                field("chain_cooldown"),
                "must not exceed attack_cooldown",
            ));
        }
        if let Some(enrage) = &self.enrage {
            if !(enrage.threshold_fraction > 0.0 && enrage.threshold_fraction < 1.0) {
                return Err(ConfigError::invalid(
                    field("enrage_threshold"),
                    format!("must be within (0, 1), got {}", enrage.threshold_fraction),
                ));
            }
            positive(enrage.speed_multiplier, "enrage.speed_multiplier")?;
            positive(enrage.chase_speed_multiplier, "enrage.chase_speed_multiplier")?;
            positive(enrage.cooldown_multiplier, "enrage.cooldown_multiplier")?;

            let enraged_cooldown = self.attack_cooldown * enrage.cooldown_multiplier;
            if self.chain_cooldown > enraged_cooldown {
                return Err(ConfigError::invalid(
                    field("chain_cooldown"),
                    format!("must not exceed the enraged attack_cooldown {enraged_cooldown}"),
                ));
            }
        }

        Ok(())
    }
}

/// Validated archetype for every [`AgentKind`].
#[derive(Debug, Clone)]
pub struct ArchetypeTable {
    entries: Vec<Archetype>,
}

impl ArchetypeTable {
    /// Built-in archetypes with no overrides.
    #[must_use]
    pub fn builtin() -> Self {
        Self {
            entries: AgentKind::all().into_iter().map(Archetype::builtin).collect(),
        }
    }

    /// Built-ins with the config's per-kind overrides applied, then validated.
    pub fn from_config(config: &AiConfig) -> ConfigResult<Self> {
        let mut table = Self::builtin();
        for (name, overrides) in &config.archetypes {
            let kind: AgentKind = name.parse().map_err(|_| {
                ConfigError::invalid(format!("archetypes.{name}"), "unknown agent kind")
            })?;
            table.entries[kind.index()].apply(overrides);
        }
        table.validate()?;
        Ok(table)
    }

    /// Validates every entry.
    pub fn validate(&self) -> ConfigResult<()> {
        self.entries.iter().try_for_each(Archetype::validate)
    }

    /// Archetype for a kind.
    #[must_use]
    pub fn get(&self, kind: AgentKind) -> &Archetype {
        &self.entries[kind.index()]
    }

    /// Iterates over all archetypes.
    pub fn iter(&self) -> impl Iterator<Item = &Archetype> {
        self.entries.iter()
    }
}

impl Default for ArchetypeTable {
    fn default() -> Self {
        Self::builtin()
    }
}
