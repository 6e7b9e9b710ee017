use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{ConnectionConfig, InputSource, TaskCategories, TaskSpec, TimeMultipliers};

// =============================================================================
// Agent Definition Types
// =============================================================================

/// Static definition of an agent, as stored by a definition source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentDefinition {
    /// Unique agent id.
    pub id: String,

    /// Display name.
    pub name: String,

    /// Seconds between cycles.
    pub loop_delay: f64,

    /// Capability providers, in priority order.
    pub config: Vec<ConnectionConfig>,

    /// Candidate tasks with base weights.
    pub tasks: Vec<TaskSpec>,

    /// Apply time-of-day multipliers when selecting.
    #[serde(default)]
    pub use_time_based_weights: bool,

    /// Multiplier overrides.
    #[serde(default)]
    pub time_based_multipliers: TimeMultipliers,

    /// Category membership for the time-of-day adjustment.
    #[serde(default)]
    pub task_categories: TaskCategories,

    /// External inputs gathered before each decision.
    #[serde(default)]
    pub inputs: Vec<InputSource>,

    /// Persona and strategy description used to build prompts.
    #[serde(default)]
    pub profile: AgentProfile,
}

/// Persona and strategy metadata of an agent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AgentProfile {
    #[serde(default)]
    pub bio: Vec<String>,
    #[serde(default)]
    pub traits: Vec<String>,
    #[serde(default)]
    pub examples: Vec<String>,
    /// Token addresses the strategy may trade.
    #[serde(default)]
    pub tokens: Vec<String>,
    /// Strategy action name -> description lines.
    #[serde(default)]
    pub strategies: Value,
    #[serde(default)]
    pub strategy_address: Option<String>,
    #[serde(default)]
    pub visibility: Option<String>,
    #[serde(default)]
    pub minimum_deposit: Option<f64>,
    #[serde(default)]
    pub fork_cost: Option<f64>,
}

// =============================================================================
// Lifecycle Types
// =============================================================================

/// Lifecycle state of a supervised agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentStatus {
    /// Agent constructed, no worker.
    Loaded,
    /// Worker is driving cycles.
    Running,
    /// Worker was stopped.
    Stopped,
}

impl AgentStatus {
    /// Value written to the `agents` collection.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Loaded => "loaded",
            Self::Running => "running",
            Self::Stopped => "stopped",
        }
    }
}

/// Point-in-time view of a supervised agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentSnapshot {
    pub id: String,
    pub name: String,
    pub status: AgentStatus,
    /// Completed cycles, successful or not.
    pub cycles: u64,
    /// Cycles that ended in error backoff.
    pub failures: u64,
    /// Workers spawned over the handle's lifetime.
    pub workers_spawned: u64,
    pub last_error: Option<String>,
}
