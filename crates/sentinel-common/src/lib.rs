//! # Sentinel Common
//!
//! Common types, utilities, and shared abstractions for the Sentinel agent AI.
//!
//! This crate provides foundational types used across all Sentinel crates:
//! - ID types (AgentId, BodyHandle, VisualHandle)
//! - Ground-plane math on top of `glam`
//! - Common error types
//! - Prelude for convenient imports

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod error;
pub mod ids;
pub mod math;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::error::*;
    pub use crate::ids::*;
    pub use crate::math::*;
}

pub use glam::Vec3;
pub use prelude::*;
