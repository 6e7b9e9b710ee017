//! Core type definitions for autoloop.
//!
//! Agent definitions as they arrive from a definition source, the records the
//! runtime writes to its persistence sink, and the lifecycle views surfaced to
//! the control plane.

mod activity;
mod agent;
mod connection;
mod task;

pub use activity::{ActivityRecord, ChatRecord};
pub use agent::{AgentDefinition, AgentProfile, AgentSnapshot, AgentStatus};
pub use connection::ConnectionConfig;
pub use task::{InputSource, TaskCategories, TaskSpec, TimeMultipliers};

/// String-keyed argument bag handed to actions and providers.
pub type Args = serde_json::Map<String, serde_json::Value>;

/// Milliseconds since the Unix epoch.
pub fn timestamp_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
