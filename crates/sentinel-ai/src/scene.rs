//! Visual backend contract: model instances, animation clips, health bars.

use ahash::AHashMap;
use ahash::AHashSet;
use glam::Vec3;
use sentinel_common::{HealthBarHandle, VisualHandle};
use thiserror::Error;

use crate::animation::ClipRequest;

/// Errors reported by a scene backend.
#[derive(Debug, Error)]
pub enum SceneError {
    /// Model asset could not be loaded
    #[error("failed to load model {path:?}: {reason}")]
    ModelLoad {
        /// Asset path
        path: String,
        /// Backend message
        reason: String,
    },
    /// Health bar could not be attached
    #[error("failed to attach health bar: {0}")]
    HealthBar(String),
}

/// Result type for scene operations.
pub type SceneResult<T> = Result<T, SceneError>;

/// Health bar look.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HealthBarStyle {
    /// Default bar
    Normal,
    /// Agent is enraged
    Enraged,
}

impl HealthBarStyle {
    /// RGBA fill color.
    #[must_use]
    pub const fn color(self) -> [f32; 4] {
        match self {
            Self::Normal => [0.85, 0.15, 0.15, 1.0],
            Self::Enraged => [1.0, 0.45, 0.0, 1.0],
        }
    }
}

/// Scene graph and renderer as seen by agents.
pub trait SceneBackend {
    /// Instantiates a model.
    fn load_model(&mut self, path: &str, scale: f32) -> SceneResult<VisualHandle>;
    /// Removes a model instance.
    fn remove_visual(&mut self, visual: VisualHandle);
    /// Moves and turns a model instance.
    fn set_transform(&mut self, visual: VisualHandle, position: Vec3, yaw: f32);
    /// Starts or crossfades to a clip.
    fn play_clip(&mut self, visual: VisualHandle, request: &ClipRequest);
    /// Attaches a health bar above a model instance.
    fn attach_health_bar(&mut self, visual: VisualHandle) -> SceneResult<HealthBarHandle>;
    /// Updates a health bar's fill and look.
    fn update_health_bar(&mut self, bar: HealthBarHandle, fraction: f32, style: HealthBarStyle);
    /// Removes a health bar.
    fn remove_health_bar(&mut self, bar: HealthBarHandle);
}

/// Recorded state of one model instance in a [`HeadlessScene`].
#[derive(Debug, Clone, PartialEq)]
pub struct HeadlessVisual {
    /// Asset path
    pub path: String,
    /// Visual scale
    pub scale: f32,
    /// Last position
    pub position: Vec3,
    /// Last yaw
    pub yaw: f32,
    /// Every clip request, in order
    pub clips: Vec<ClipRequest>,
}

/// Recorded state of one health bar in a [`HeadlessScene`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeadlessHealthBar {
    /// Owning visual
    pub visual: VisualHandle,
    /// Last fill fraction
    pub fraction: f32,
    /// Last style
    pub style: HealthBarStyle,
}

/// Scene backend that renders nothing and records every call.
#[derive(Debug, Default)]
pub struct HeadlessScene {
    visuals: AHashMap<VisualHandle, HeadlessVisual>,
    health_bars: AHashMap<HealthBarHandle, HeadlessHealthBar>,
    failing_models: AHashSet<String>,
    fail_health_bars: bool,
    next_handle: u64,
}

impl HeadlessScene {
    /// Creates an empty scene.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes loads of `path` fail.
    pub fn fail_model(&mut self, path: impl Into<String>) {
        self.failing_models.insert(path.into());
    }

    /// Makes every health-bar attach fail.
    pub fn fail_health_bars(&mut self, fail: bool) {
        self.fail_health_bars = fail;
    }

    /// Looks up a visual.
    #[must_use]
    pub fn visual(&self, visual: VisualHandle) -> Option<&HeadlessVisual> {
        self.visuals.get(&visual)
    }

    /// Looks up a health bar.
    #[must_use]
    pub fn health_bar(&self, bar: HealthBarHandle) -> Option<&HeadlessHealthBar> {
        self.health_bars.get(&bar)
    }

    /// Number of live visuals.
    #[must_use]
    pub fn visual_count(&self) -> usize {
        self.visuals.len()
    }

    /// Number of live health bars.
    #[must_use]
    pub fn health_bar_count(&self) -> usize {
        self.health_bars.len()
    }

    fn next(&mut self) -> u64 {
        self.next_handle += 1;
        self.next_handle
    }
}

impl SceneBackend for HeadlessScene {
    fn load_model(&mut self, path: &str, scale: f32) -> SceneResult<VisualHandle> {
        if self.failing_models.contains(path) {
            return Err(SceneError::ModelLoad {
                path: path.to_string(),
                reason: "asset not found".into(),
            });
        }
        let handle = VisualHandle::from_raw(self.next());
        self.visuals.insert(
            handle,
            HeadlessVisual {
                path: path.to_string(),
                scale,
                position: Vec3::ZERO,
                yaw: 0.0,
                clips: Vec::new(),
            },
        );
        Ok(handle)
    }

    fn remove_visual(&mut self, visual: VisualHandle) {
        self.visuals.remove(&visual);
    }

    fn set_transform(&mut self, visual: VisualHandle, position: Vec3, yaw: f32) {
        if let Some(v) = self.visuals.get_mut(&visual) {
            v.position = position;
            v.yaw = yaw;
        }
    }

    fn play_clip(&mut self, visual: VisualHandle, request: &ClipRequest) {
        if let Some(v) = self.visuals.get_mut(&visual) {
            v.clips.push(*request);
        }
    }

    fn attach_health_bar(&mut self, visual: VisualHandle) -> SceneResult<HealthBarHandle> {
        if self.fail_health_bars {
            return Err(SceneError::HealthBar("overlay unavailable".into()));
        }
        if !self.visuals.contains_key(&visual) {
            return Err(SceneError::HealthBar(format!("no visual {}", visual.raw())));
        }
        let handle = HealthBarHandle::from_raw(self.next());
        self.health_bars.insert(
            handle,
            HeadlessHealthBar {
                visual,
                fraction: 1.0,
                style: HealthBarStyle::Normal,
            },
        );
        Ok(handle)
    }

    fn update_health_bar(&mut self, bar: HealthBarHandle, fraction: f32, style: HealthBarStyle) {
        if let Some(b) = self.health_bars.get_mut(&bar) {
            b.fraction = fraction;
            b.style = style;
        }
    }

    fn remove_health_bar(&mut self, bar: HealthBarHandle) {
        self.health_bars.remove(&bar);
    }
}
