use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::Args;

// =============================================================================
// Connection Types
// =============================================================================

/// Configuration for one capability provider of an agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectionConfig {
    /// Connection name used by `perform(provider, ...)`.
    pub name: String,

    /// Provider kind. Defaults to `name` when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,

    /// Provider-specific settings.
    #[serde(flatten)]
    pub settings: Args,
}

impl ConnectionConfig {
    /// Create a config with no settings.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: None,
            settings: Args::new(),
        }
    }

    /// Set the provider kind.
    pub fn with_kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = Some(kind.into());
        self
    }

    /// Add a setting.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.settings.insert(key.into(), value.into());
        self
    }

    /// Provider kind this config resolves to.
    pub fn kind(&self) -> &str {
        self.kind.as_deref().unwrap_or(&self.name)
    }

    /// String setting, if present and a string.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.settings.get(key).and_then(Value::as_str)
    }
}
