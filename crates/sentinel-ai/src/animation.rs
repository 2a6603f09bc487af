//! Animation clip selection with crossfades.
//!
//! The selector turns behavior state plus measured horizontal speed into a
//! clip. Attack and death are one-shots: they clamp on their last frame and
//! locomotion selection cannot replace them until the state machine leaves
//! the attacking state. Death is never left.

use serde::{Deserialize, Serialize};

use crate::agent::BehaviorState;
use crate::config::AiConfig;

/// Clips every agent model provides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AnimationClip {
    /// Standing
    Idle,
    /// Walking
    Walk,
    /// Running
    Run,
    /// Attack telegraph
    Windup,
    /// Attack swing
    Attack,
    /// Death
    Death,
}

impl AnimationClip {
    /// Clip name in the model file.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Walk => "walk",
            Self::Run => "run",
            Self::Windup => "windup",
            Self::Attack => "attack",
            Self::Death => "death",
        }
    }

    /// Whether the clip plays once and holds its last frame.
    #[must_use]
    pub const fn is_one_shot(self) -> bool {
        matches!(self, Self::Attack | Self::Death)
    }
}

/// Instruction for the scene to start a clip.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClipRequest {
    /// Clip to play
    pub clip: AnimationClip,
    /// Crossfade duration (seconds)
    pub fade: f32,
    /// Repeat forever
    pub looping: bool,
    /// Hold the final frame when done
    pub clamp_when_finished: bool,
    /// Start from frame zero even if already playing
    pub restart: bool,
}

impl ClipRequest {
    /// Looping clip request.
    #[must_use]
    pub fn looping(clip: AnimationClip, fade: f32) -> Self {
        Self {
            clip,
            fade,
            looping: true,
            clamp_when_finished: false,
            restart: false,
        }
    }

    /// One-shot clip request that clamps on its last frame.
    #[must_use]
    pub fn one_shot(clip: AnimationClip, fade: f32) -> Self {
        Self {
            clip,
            fade,
            looping: false,
            clamp_when_finished: true,
            restart: true,
        }
    }

    fn for_clip(clip: AnimationClip, fade: f32) -> Self {
        if clip.is_one_shot() {
            Self::one_shot(clip, fade)
        } else {
            Self::looping(clip, fade)
        }
    }
}

/// Picks the clip for each tick and tracks the current crossfade.
#[derive(Debug, Clone)]
pub struct AnimationSelector {
    current: Option<AnimationClip>,
    previous: Option<AnimationClip>,
    blend_elapsed: f32,
    blend_duration: f32,
    walk_threshold: f32,
    run_threshold: f32,
}

impl AnimationSelector {
    /// Creates a selector with explicit thresholds.
    #[must_use]
    pub fn new(blend_duration: f32, walk_threshold: f32, run_threshold: f32) -> Self {
        Self {
            current: None,
            previous: None,
            blend_elapsed: 0.0,
            blend_duration: blend_duration.max(0.0),
            walk_threshold,
            run_threshold: run_threshold.max(walk_threshold),
        }
    }

    /// Creates a selector from the global config.
    #[must_use]
    pub fn from_config(config: &AiConfig) -> Self {
        Self::new(
            config.crossfade_duration,
            config.walk_speed_threshold,
            config.run_speed_threshold,
        )
    }

    /// Clip for a state and measured horizontal speed, ignoring one-shot locks.
    #[must_use]
    pub fn target_clip(&self, state: BehaviorState, speed: f32) -> AnimationClip {
        match state {
            BehaviorState::Dead => AnimationClip::Death,
            BehaviorState::Attack => AnimationClip::Attack,
            BehaviorState::PreAttack => AnimationClip::Windup,
            BehaviorState::Idle | BehaviorState::Moving | BehaviorState::Chase => {
                if speed >= self.run_threshold {
                    AnimationClip::Run
                } else if speed >= self.walk_threshold {
                    AnimationClip::Walk
                } else {
                    AnimationClip::Idle
                }
            },
        }
    }

    /// Advances the crossfade and returns a request when the clip changes.
    ///
    /// `restart` replays the current clip from the start (chained attacks).
    pub fn update(
        &mut self,
        state: BehaviorState,
        speed: f32,
        dt: f32,
        restart: bool,
    ) -> Option<ClipRequest> {
        self.blend_elapsed = (self.blend_elapsed + dt.max(0.0)).min(self.blend_duration);

        let target = self.target_clip(state, speed);

        if self.current == Some(AnimationClip::Death) {
            return None;
        }
        if self.current == Some(target) {
            if restart && target.is_one_shot() {
                self.blend_elapsed = 0.0;
                return Some(ClipRequest::one_shot(target, self.blend_duration));
            }
            return None;
        }

        self.previous = self.current;
        self.current = Some(target);
        self.blend_elapsed = 0.0;
        Some(ClipRequest::for_clip(target, self.blend_duration))
    }

    /// Clip currently playing.
    #[must_use]
    pub fn current(&self) -> Option<AnimationClip> {
        self.current
    }

    /// Clip being faded out, while a crossfade is in progress.
    #[must_use]
    pub fn previous(&self) -> Option<AnimationClip> {
        if self.blend_weight() < 1.0 {
            self.previous
        } else {
            None
        }
    }

    /// Weight of the current clip in the crossfade (0-1).
    #[must_use]
    pub fn blend_weight(&self) -> f32 {
        if self.blend_duration <= 0.0 || self.previous.is_none() {
            1.0
        } else {
            (self.blend_elapsed / self.blend_duration).clamp(0.0, 1.0)
        }
    }
}

impl Default for AnimationSelector {
    fn default() -> Self {
        Self::from_config(&AiConfig::default())
    }
}
