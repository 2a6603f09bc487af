//! The target side of agent perception and combat.

use glam::Vec3;
use sentinel_common::AgentId;
use tracing::debug;

/// Something agents can perceive.
pub trait Detectable {
    /// World position.
    fn position(&self) -> Vec3;

    /// Whether agents can currently perceive this target.
    fn is_detectable(&self) -> bool {
        true
    }
}

/// Something agents can perceive and strike.
pub trait Target: Detectable {
    /// Applies damage dealt by an agent.
    fn receive_damage(&mut self, amount: f32, source: AgentId);
}

/// Simple player stand-in with health and a hide toggle.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerTarget {
    /// World position
    pub position: Vec3,
    /// Current health; never below zero
    pub health: f32,
    /// Hidden players are not detectable
    pub hidden: bool,
    /// Every hit received, in order
    pub hits: Vec<(AgentId, f32)>,
}

impl PlayerTarget {
    /// Creates a visible player at a position.
    #[must_use]
    pub fn new(position: Vec3, health: f32) -> Self {
        Self {
            position,
            health,
            hidden: false,
            hits: Vec::new(),
        }
    }

    /// Total damage received.
    #[must_use]
    pub fn damage_taken(&self) -> f32 {
        self.hits.iter().map(|(_, amount)| amount).sum()
    }
}

impl Detectable for PlayerTarget {
    fn position(&self) -> Vec3 {
        self.position
    }

    fn is_detectable(&self) -> bool {
        !self.hidden
    }
}

impl Target for PlayerTarget {
    fn receive_damage(&mut self, amount: f32, source: AgentId) {
        self.health = (self.health - amount).max(0.0);
        self.hits.push((source, amount));
        debug!("Player took {amount} from {source}, health {}", self.health);
    }
}
