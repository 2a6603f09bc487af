//! Error types for agent operations.

use thiserror::Error;

use crate::registry::AgentHandle;

/// Error types for agent operations.
#[derive(Debug, Error)]
pub enum AgentError {
    /// Requested agent type is not a known kind
    #[error("unknown agent kind: {0:?}")]
    UnknownKind(String),
    /// Handle does not refer to a live registry entry
    #[error("agent not found: {0:?}")]
    NotFound(AgentHandle),
}

/// Result type for agent operations.
pub type AgentResult<T> = Result<T, AgentError>;
