//! AI configuration.
//!
//! Global tunables shared by every agent plus per-kind archetype overrides.
//! Configuration can be loaded from and saved to a TOML file.

use serde::{Deserialize, Serialize};
use sentinel_common::{ConfigError, ConfigResult};
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::Path;
use tracing::{info, warn};

/// Configuration file name.
pub const CONFIG_FILE: &str = "sentinel.toml";

/// AI configuration parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AiConfig {
    // === Level ===
    /// Level id reported with boss-defeat and level-complete events
    pub level_id: String,

    // === Patrol ===
    /// Distance at which a patrol waypoint counts as reached
    pub arrival_threshold: f32,
    /// Dwell time at each waypoint when a spawn gives none (seconds)
    pub default_dwell_time: f32,
    /// Radius of the ring generated when a patroller has no waypoints
    pub patrol_ring_radius: f32,
    /// Number of points in the generated ring
    pub patrol_ring_points: usize,

    // === Animation ===
    /// Crossfade duration between clips (seconds)
    pub crossfade_duration: f32,
    /// Horizontal speed above which the walk clip plays
    pub walk_speed_threshold: f32,
    /// Horizontal speed above which the run clip plays
    pub run_speed_threshold: f32,

    // === Movement ===
    /// Fraction of steering force available while airborne
    pub air_control: f32,
    /// Vertical slack when checking whether an agent stands on a surface
    pub ground_tolerance: f32,

    // === Events ===
    /// Event bus capacity
    pub event_capacity: usize,

    // === Archetypes ===
    /// Per-kind overrides of the built-in archetypes, keyed by kind name
    pub archetypes: BTreeMap<String, ArchetypeOverrides>,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            level_id: "level-1".into(),

            arrival_threshold: 0.5,
            default_dwell_time: 2.0,
            patrol_ring_radius: 3.0,
            patrol_ring_points: 4,

            crossfade_duration: 0.2,
            walk_speed_threshold: 0.15,
            run_speed_threshold: 3.0,

            air_control: 0.3,
            ground_tolerance: 0.25,

            event_capacity: 1024,

            archetypes: BTreeMap::new(),
        }
    }
}

/// Optional replacements for archetype fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ArchetypeOverrides {
    /// Model asset path
    pub model: Option<String>,
    /// Visual scale
    pub scale: Option<f32>,
    /// Max health
    pub max_health: Option<f32>,
    /// Walking speed
    pub move_speed: Option<f32>,
    /// Chase speed
    pub chase_speed: Option<f32>,
    /// Detection range
    pub detection_range: Option<f32>,
    /// Chase range
    pub chase_range: Option<f32>,
    /// Attack range
    pub attack_range: Option<f32>,
    /// Attack cooldown (seconds)
    pub attack_cooldown: Option<f32>,
    /// Telegraph window (seconds)
    pub attack_grace_period: Option<f32>,
    /// Attack swing duration (seconds)
    pub attack_duration: Option<f32>,
    /// Damage per hit
    pub attack_damage: Option<f32>,
    /// Damage per hit while enraged
    pub enraged_damage: Option<f32>,
    /// Max chained attacks
    pub max_chain_attacks: Option<u32>,
    /// Chained-attack cooldown (seconds)
    pub chain_cooldown: Option<f32>,
    /// Enrage threshold as a fraction of max health; enables enrage
    pub enrage_threshold: Option<f32>,
    /// Notice range for passive agents
    pub notice_range: Option<f32>,
    /// Body mass
    pub mass: Option<f32>,
    /// Steering force multiplier
    pub force_multiplier: Option<f32>,
    /// Linear damping
    pub linear_damping: Option<f32>,
    /// Angular damping
    pub angular_damping: Option<f32>,
}

impl AiConfig {
    /// Parses a TOML document.
    pub fn from_toml_str(contents: &str) -> ConfigResult<Self> {
        toml::from_str(contents).map_err(|e| ConfigError::Parse {
            format: "toml",
            message: e.to_string(),
        })
    }

    /// Load configuration from the working directory.
    /// Returns default config if the file doesn't exist.
    pub fn load() -> Self {
        Self::load_from(CONFIG_FILE)
    }

    /// Load configuration from a specific path.
    /// Returns default config if the file doesn't exist or is invalid.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();

        if !path.exists() {
            info!("Config file not found, using defaults");
            return Self::default();
        }

        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) => {
                warn!("Failed to read config file: {e}");
                return Self::default();
            },
        };

        match Self::from_toml_str(&contents) {
            Ok(mut config) => {
                config.validate();
                info!("Loaded config from {}", path.display());
                config
            },
            Err(e) => {
                warn!("Failed to parse config file: {e}");
                Self::default()
            },
        }
    }

    /// Save configuration to a specific path.
    pub fn save_to<P: AsRef<Path>>(&self, path: P) -> io::Result<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        fs::write(path, contents)?;

        info!("Saved config to {}", path.display());
        Ok(())
    }

    /// Validate and clamp configuration values to sensible ranges.
    ///
    /// Archetype overrides are not touched here; they are checked when the
    /// archetype table is built.
    pub fn validate(&mut self) {
        if self.level_id.trim().is_empty() {
            self.level_id = Self::default().level_id;
        }

        self.arrival_threshold = self.arrival_threshold.clamp(0.05, 5.0);
        self.default_dwell_time = self.default_dwell_time.clamp(0.0, 60.0);
        self.patrol_ring_radius = self.patrol_ring_radius.clamp(0.5, 50.0);
        self.patrol_ring_points = self.patrol_ring_points.clamp(2, 32);

        self.crossfade_duration = self.crossfade_duration.clamp(0.0, 2.0);
        self.walk_speed_threshold = self.walk_speed_threshold.clamp(0.0, 10.0);
        self.run_speed_threshold = self
            .run_speed_threshold
            .clamp(self.walk_speed_threshold, 50.0);

        self.air_control = self.air_control.clamp(0.0, 1.0);
        self.ground_tolerance = self.ground_tolerance.clamp(0.0, 2.0);

        self.event_capacity = self.event_capacity.clamp(16, 65_536);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AiConfig::default();
        assert_eq!(config.default_dwell_time, 2.0);
        assert!(config.arrival_threshold > 0.0);
        assert!(config.archetypes.is_empty());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config = AiConfig::from_toml_str(
            r#"
            level_id = "crypt"
            arrival_threshold = 0.75

            [archetypes.boss]
            max_health = 800.0
            "#,
        )
        .expect("valid toml");

        assert_eq!(config.level_id, "crypt");
        assert_eq!(config.arrival_threshold, 0.75);
        assert_eq!(config.default_dwell_time, 2.0);
        assert_eq!(config.archetypes["boss"].max_health, Some(800.0));
    }

    #[test]
    fn test_unknown_override_field_rejected() {
        let result = AiConfig::from_toml_str(
            r#"
            [archetypes.grunt]
            hit_points = 10.0
            "#,
        );
        assert!(matches!(result, Err(ConfigError::Parse { format: "toml", .. })));
    }

    #[test]
    fn test_validate_clamps() {
        let mut config = AiConfig {
            arrival_threshold: 0.0,
            air_control: 3.0,
            walk_speed_threshold: 2.0,
            run_speed_threshold: 1.0,
            level_id: "  ".into(),
            ..AiConfig::default()
        };
        config.validate();
        assert_eq!(config.arrival_threshold, 0.05);
        assert_eq!(config.air_control, 1.0);
        assert_eq!(config.run_speed_threshold, 2.0);
        assert_eq!(config.level_id, "level-1");
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("nested").join(CONFIG_FILE);

        let mut config = AiConfig {
            level_id: "harbor".into(),
            crossfade_duration: 0.35,
            ..AiConfig::default()
        };
        config.archetypes.insert(
            "guard".into(),
            ArchetypeOverrides {
                notice_range: Some(6.0),
                ..ArchetypeOverrides::default()
            },
        );
        config.save_to(&path).expect("save should succeed");

        let loaded = AiConfig::load_from(&path);
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_load_missing_and_invalid_fall_back() {
        let dir = tempfile::tempdir().expect("temp dir");
        let missing = AiConfig::load_from(dir.path().join("absent.toml"));
        assert_eq!(missing, AiConfig::default());

        let broken = dir.path().join("broken.toml");
        fs::write(&broken, "level_id = [").expect("write");
        assert_eq!(AiConfig::load_from(&broken), AiConfig::default());
    }
}
