//! Core types for autoloop.
//!
//! Shared error taxonomy, agent definitions, and the traits through which the
//! runtime reaches its external collaborators (persistence, definition
//! sources, wall clock).

pub mod error;
pub mod traits;
pub mod types;

pub use error::{Error, LifecycleError, Result};
