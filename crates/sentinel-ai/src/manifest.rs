//! Spawn options and RON level manifests.

use glam::Vec3;
use serde::{Deserialize, Serialize};
use sentinel_common::{ConfigError, ConfigResult, SentinelError, SentinelResult};
use std::fs;
use std::path::Path;
use tracing::info;

use crate::patrol::PatrolBehavior;

/// Per-spawn overrides. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpawnOptions {
    /// Spawn position `[x, y, z]`
    pub position: [f32; 3],
    /// Patrol speed; chase speed scales by the same ratio
    pub speed: Option<f32>,
    /// Max health
    pub health: Option<f32>,
    /// Chase range
    pub chase_range: Option<f32>,
    /// Waypoints as `[x, y, z]` or `[x, y, z, wait]`
    pub patrol_points: Vec<Vec<f32>>,
    /// Dwell time at each waypoint (seconds)
    pub wait_time: Option<f32>,
    /// What happens after the last waypoint
    pub patrol_behavior: PatrolBehavior,
    /// Visual scale
    pub scale: Option<f32>,
    /// Label for lookups
    pub id: Option<String>,
    /// Passive agents halt within this distance of the target
    pub notice_range: Option<f32>,
}

impl SpawnOptions {
    /// Options with only a position set.
    #[must_use]
    pub fn at(x: f32, y: f32, z: f32) -> Self {
        Self {
            position: [x, y, z],
            ..Self::default()
        }
    }

    /// Spawn position as a vector.
    #[must_use]
    pub fn position(&self) -> Vec3 {
        Vec3::from_array(self.position)
    }

    /// Sets the patrol speed.
    #[must_use]
    pub fn with_speed(mut self, speed: f32) -> Self {
        self.speed = Some(speed);
        self
    }

    /// Sets max health.
    #[must_use]
    pub fn with_health(mut self, health: f32) -> Self {
        self.health = Some(health);
        self
    }

    /// Sets the chase range.
    #[must_use]
    pub fn with_chase_range(mut self, range: f32) -> Self {
        self.chase_range = Some(range);
        self
    }

    /// Sets waypoint records.
    #[must_use]
    pub fn with_patrol_points(mut self, points: Vec<Vec<f32>>) -> Self {
        self.patrol_points = points;
        self
    }

    /// Sets the dwell time.
    #[must_use]
    pub fn with_wait_time(mut self, wait: f32) -> Self {
        self.wait_time = Some(wait);
        self
    }

    /// Sets the patrol behavior.
    #[must_use]
    pub fn with_patrol_behavior(mut self, behavior: PatrolBehavior) -> Self {
        self.patrol_behavior = behavior;
        self
    }

    /// Sets the visual scale.
    #[must_use]
    pub fn with_scale(mut self, scale: f32) -> Self {
        self.scale = Some(scale);
        self
    }

    /// Sets the label.
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.id = Some(label.into());
        self
    }

    /// Sets the notice range.
    #[must_use]
    pub fn with_notice_range(mut self, range: f32) -> Self {
        self.notice_range = Some(range);
        self
    }
}

/// One agent to spawn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManifestEntry {
    /// Agent type name, resolved at spawn time
    pub kind: String,
    /// Spawn options
    #[serde(default)]
    pub options: SpawnOptions,
}

/// Agents placed in a level.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpawnManifest {
    /// Level id; overrides the configured one when set
    pub level_id: Option<String>,
    /// Agents in spawn order
    pub agents: Vec<ManifestEntry>,
}

impl SpawnManifest {
    /// Parses a RON document.
    pub fn from_ron_str(contents: &str) -> ConfigResult<Self> {
        ron::from_str(contents).map_err(|e| ConfigError::Parse {
            format: "ron",
            message: e.to_string(),
        })
    }

    /// Loads a manifest file.
    pub fn load_from<P: AsRef<Path>>(path: P) -> SentinelResult<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)?;
        let manifest = Self::from_ron_str(&contents)?;
        info!(
            "Loaded spawn manifest from {} ({} agents)",
            path.display(),
            manifest.agents.len()
        );
        Ok(manifest)
    }

    /// Writes the manifest as pretty RON.
    pub fn save_to<P: AsRef<Path>>(&self, path: P) -> SentinelResult<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let contents = ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
            .map_err(|e| SentinelError::Serialization(e.to_string()))?;
        fs::write(path, contents)?;
        Ok(())
    }

    /// Adds an entry.
    pub fn push(&mut self, kind: impl Into<String>, options: SpawnOptions) {
        self.agents.push(ManifestEntry {
            kind: kind.into(),
            options,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LEVEL: &str = r#"
        (
            level_id: Some("crypt"),
            agents: [
                (kind: "boss", options: (position: (0.0, 0.0, 20.0), health: Some(800.0))),
                (
                    kind: "villager",
                    options: (
                        position: (5.0, 0.0, 5.0),
                        patrol_points: [[5.0, 0.0, 5.0], [9.0, 0.0, 5.0, 1.0]],
                        wait_time: Some(0.5),
                        patrol_behavior: once,
                        id: Some("baker"),
                    ),
                ),
                (kind: "grunt"),
            ],
        )
    "#;

    #[test]
    fn test_parse_manifest() {
        let manifest = SpawnManifest::from_ron_str(LEVEL).expect("valid manifest");
        assert_eq!(manifest.level_id.as_deref(), Some("crypt"));
        assert_eq!(manifest.agents.len(), 3);

        let boss = &manifest.agents[0];
        assert_eq!(boss.options.position(), Vec3::new(0.0, 0.0, 20.0));
        assert_eq!(boss.options.health, Some(800.0));

        let villager = &manifest.agents[1].options;
        assert_eq!(villager.patrol_points[1].len(), 4);
        assert_eq!(villager.patrol_behavior, PatrolBehavior::Once);
        assert_eq!(villager.id.as_deref(), Some("baker"));

        assert_eq!(manifest.agents[2].options, SpawnOptions::default());
    }

    #[test]
    fn test_parse_error_is_reported() {
        let result = SpawnManifest::from_ron_str("(agents: [(kind: 3)])");
        assert!(matches!(result, Err(ConfigError::Parse { format: "ron", .. })));
    }

    #[test]
    fn test_builder() {
        let options = SpawnOptions::at(1.0, 2.0, 3.0)
            .with_speed(4.0)
            .with_label("gate")
            .with_patrol_behavior(PatrolBehavior::PingPong);
        assert_eq!(options.position(), Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(options.speed, Some(4.0));
        assert_eq!(options.id.as_deref(), Some("gate"));
        assert_eq!(options.patrol_behavior, PatrolBehavior::PingPong);
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("levels").join("harbor.ron");

        let mut manifest = SpawnManifest {
            level_id: Some("harbor".into()),
            ..SpawnManifest::default()
        };
        manifest.push("guard", SpawnOptions::at(1.0, 0.0, 1.0).with_notice_range(5.0));
        manifest.save_to(&path).expect("save");

        let loaded = SpawnManifest::load_from(&path).expect("load");
        assert_eq!(loaded, manifest);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempfile::tempdir().expect("temp dir");
        let result = SpawnManifest::load_from(dir.path().join("absent.ron"));
        assert!(matches!(result, Err(SentinelError::Io(_))));
    }
}
