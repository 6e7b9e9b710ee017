use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use super::timestamp_ms;

// =============================================================================
// Persistence Records
// =============================================================================

/// Outcome of one successful cycle, written to the `activities` collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityRecord {
    /// Record id.
    pub id: String,
    /// Agent that performed the action.
    pub initiator: String,
    /// Action name.
    pub action: String,
    /// Milliseconds since the Unix epoch.
    pub timestamp: i64,
    /// Handler result, e.g. a transaction hash.
    pub result: Option<Value>,
}

impl ActivityRecord {
    /// Collection name in the persistence sink.
    pub const COLLECTION: &'static str = "activities";

    /// Create a record stamped with the current time.
    pub fn new(initiator: impl Into<String>, action: impl Into<String>, result: Option<Value>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            initiator: initiator.into(),
            action: action.into(),
            timestamp: timestamp_ms(),
            result,
        }
    }
}

/// One chat message between a user and an agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatRecord {
    pub sender: String,
    pub receiver: String,
    pub text: String,
    pub timestamp: i64,
}

impl ChatRecord {
    /// Collection name in the persistence sink.
    pub const COLLECTION: &'static str = "chats";

    pub fn new(sender: impl Into<String>, receiver: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            sender: sender.into(),
            receiver: receiver.into(),
            text: text.into(),
            timestamp: timestamp_ms(),
        }
    }
}
