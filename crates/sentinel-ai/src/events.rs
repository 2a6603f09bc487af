//! Event bus for agent notifications.

use crossbeam_channel::{unbounded, Receiver, Sender};
use serde::{Deserialize, Serialize};
use sentinel_common::AgentId;
use tracing::warn;

use crate::agent::BehaviorState;
use crate::archetype::AgentKind;

/// Event types published by agents and the registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AgentEvent {
    /// Agent spawned
    Spawned {
        /// Agent ID
        id: AgentId,
        /// Agent kind
        kind: AgentKind,
    },
    /// Agent removed from the registry
    Removed {
        /// Agent ID
        id: AgentId,
    },
    /// Behavior state changed
    StateChanged {
        /// Agent ID
        id: AgentId,
        /// Previous state
        from: BehaviorState,
        /// New state
        to: BehaviorState,
    },
    /// An attack connected with the target
    AttackLanded {
        /// Attacking agent
        id: AgentId,
        /// Damage dealt
        damage: f32,
        /// Distance at the moment of impact
        distance: f32,
    },
    /// An attack resolved with the target out of range
    AttackMissed {
        /// Attacking agent
        id: AgentId,
        /// Distance at the moment of impact
        distance: f32,
    },
    /// Agent became enraged
    Enraged {
        /// Agent ID
        id: AgentId,
    },
    /// Agent health reached zero
    Defeated {
        /// Agent ID
        id: AgentId,
        /// Agent kind
        kind: AgentKind,
    },
    /// A boss was defeated
    BossDefeated {
        /// Level the boss belonged to
        level_id: String,
    },
    /// The level's completion condition was met
    LevelComplete {
        /// Level that completed
        level_id: String,
    },
}

impl AgentEvent {
    /// Defeat and level events. These are never dropped by a full bus.
    #[must_use]
    pub const fn is_lifecycle(&self) -> bool {
        matches!(
            self,
            Self::Defeated { .. } | Self::BossDefeated { .. } | Self::LevelComplete { .. }
        )
    }
}

/// Event bus for broadcasting agent events to the game.
///
/// Routine events are dropped once `capacity` events are pending.
/// Lifecycle events are always queued, so the pending count may exceed
/// the capacity while they wait to be drained.
#[derive(Debug)]
pub struct EventBus {
    /// Sender for broadcasting events
    sender: Sender<AgentEvent>,
    /// Receiver for collecting events
    receiver: Receiver<AgentEvent>,
    /// Channel capacity
    capacity: usize,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(1024)
    }
}

impl EventBus {
    /// Creates a new event bus with the given capacity.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let (sender, receiver) = unbounded();
        Self {
            sender,
            receiver,
            capacity,
        }
    }

    /// Publishes an event to the bus.
    pub fn publish(&self, event: AgentEvent) {
        publish_on(&self.sender, self.capacity, event);
    }

    /// Drains all pending events.
    pub fn drain(&self) -> Vec<AgentEvent> {
        self.receiver.try_iter().collect()
    }

    /// Returns the number of pending events.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.receiver.len()
    }

    /// Returns the channel capacity.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Creates a publishing handle that agents keep.
    #[must_use]
    pub fn publisher(&self) -> EventPublisher {
        EventPublisher {
            sender: self.sender.clone(),
            capacity: self.capacity,
        }
    }
}

/// Cloneable publish-only end of an [`EventBus`].
#[derive(Debug, Clone)]
pub struct EventPublisher {
    sender: Sender<AgentEvent>,
    capacity: usize,
}

impl EventPublisher {
    /// Publishes an event. Routine events are dropped if the bus is full.
    pub fn publish(&self, event: AgentEvent) {
        publish_on(&self.sender, self.capacity, event);
    }
}

fn publish_on(sender: &Sender<AgentEvent>, capacity: usize, event: AgentEvent) {
    // Non-blocking send - routine events are dropped when full
    if !event.is_lifecycle() && sender.len() >= capacity {
        warn!("Event bus full ({capacity}), dropped {event:?}");
        return;
    }
    if let Err(err) = sender.try_send(event) {
        warn!("Event bus disconnected, dropped {:?}", err.into_inner());
    }
}
