//! ID types for agents and the external resources they hold.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier for an agent.
///
/// Ids are handed out by an [`AgentIdAllocator`] owned by the registry, so a
/// fresh registry always produces the same sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AgentId(u64);

impl AgentId {
    /// Null/invalid agent ID.
    pub const NULL: Self = Self(0);

    /// Creates an agent ID from a raw value.
    #[must_use]
    pub const fn from_raw(value: u64) -> Self {
        Self(value)
    }

    /// Returns the raw ID value.
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }

    /// Checks if this is a valid (non-null) agent ID.
    #[must_use]
    pub const fn is_valid(self) -> bool {
        self.0 != 0
    }
}

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "agent#{}", self.0)
    }
}

/// Sequential allocator for [`AgentId`]s.
#[derive(Debug, Clone)]
pub struct AgentIdAllocator {
    next: u64,
}

impl AgentIdAllocator {
    /// Creates an allocator starting at the first valid ID.
    #[must_use]
    pub const fn new() -> Self {
        Self { next: 1 }
    }

    /// Returns the next unused ID.
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> AgentId {
        let id = AgentId(self.next);
        self.next += 1;
        id
    }
}

impl Default for AgentIdAllocator {
    fn default() -> Self {
        Self::new()
    }
}

/// Handle to a body owned by the external physics world.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BodyHandle(u64);

impl BodyHandle {
    /// Creates a body handle from a raw value.
    #[must_use]
    pub const fn from_raw(value: u64) -> Self {
        Self(value)
    }

    /// Returns the raw handle value.
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

/// Handle to a visual (model instance) owned by the external scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VisualHandle(u64);

impl VisualHandle {
    /// Creates a visual handle from a raw value.
    #[must_use]
    pub const fn from_raw(value: u64) -> Self {
        Self(value)
    }

    /// Returns the raw handle value.
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

/// Handle to a health bar widget attached to a visual.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HealthBarHandle(u64);

impl HealthBarHandle {
    /// Creates a health bar handle from a raw value.
    #[must_use]
    pub const fn from_raw(value: u64) -> Self {
        Self(value)
    }

    /// Returns the raw handle value.
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_id_is_invalid() {
        assert!(!AgentId::NULL.is_valid());
        assert!(AgentId::from_raw(7).is_valid());
    }

    #[test]
    fn test_allocator_is_deterministic() {
        let mut a = AgentIdAllocator::new();
        let mut b = AgentIdAllocator::new();
        for _ in 0..5 {
            assert_eq!(a.next(), b.next());
        }
    }

    #[test]
    fn test_agent_id_display() {
        assert_eq!(AgentId::from_raw(12).to_string(), "agent#12");
    }
}
