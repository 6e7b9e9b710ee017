use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

use super::Args;

// =============================================================================
// Task Types
// =============================================================================

/// Candidate behavior as declared in an agent definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskSpec {
    /// Action name dispatched through the action registry.
    pub name: String,

    /// Base selection weight. Zero makes the task unselectable.
    #[serde(default)]
    pub weight: f64,

    /// Static argument payload passed to the action handler.
    #[serde(default)]
    pub args: Args,
}

impl TaskSpec {
    /// Create a task without arguments.
    pub fn new(name: impl Into<String>, weight: f64) -> Self {
        Self {
            name: name.into(),
            weight,
            args: Args::new(),
        }
    }
}

/// Explicit category membership used by time-of-day weight adjustment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskCategories {
    /// Tasks damped during night hours.
    #[serde(default)]
    pub low_activity: BTreeSet<String>,

    /// Tasks boosted during day hours.
    #[serde(default)]
    pub high_engagement: BTreeSet<String>,
}

impl Default for TaskCategories {
    fn default() -> Self {
        Self {
            low_activity: ["post-tweet"].into_iter().map(String::from).collect(),
            high_engagement: ["reply-to-tweet", "like-tweet"]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}

/// Named multipliers applied by time-of-day weight adjustment.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TimeMultipliers(pub HashMap<String, f64>);

impl TimeMultipliers {
    /// Key of the night damping factor.
    pub const NIGHT: &'static str = "tweet_night_multiplier";
    /// Key of the day boost factor.
    pub const DAY: &'static str = "engagement_day_multiplier";

    const DEFAULT_NIGHT: f64 = 0.4;
    const DEFAULT_DAY: f64 = 1.5;

    /// Factor for low-activity tasks between 01:00 and 05:59.
    pub fn night(&self) -> f64 {
        self.0.get(Self::NIGHT).copied().unwrap_or(Self::DEFAULT_NIGHT)
    }

    /// Factor for high-engagement tasks between 08:00 and 20:59.
    pub fn day(&self) -> f64 {
        self.0.get(Self::DAY).copied().unwrap_or(Self::DEFAULT_DAY)
    }

    /// Override one multiplier.
    pub fn with(mut self, key: impl Into<String>, factor: f64) -> Self {
        self.0.insert(key.into(), factor);
        self
    }
}

/// External context fetched into scratch state before deciding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputSource {
    /// Scratch state key the result is stored under.
    pub state_key: String,

    /// Connection to read from.
    pub connection: String,

    /// Read action on that connection, e.g. `read-timeline`.
    pub action: String,

    /// Arguments for the read action.
    #[serde(default)]
    pub args: Args,

    /// Task names that need this input. Empty means always gathered.
    #[serde(default)]
    pub tasks: BTreeSet<String>,
}

impl InputSource {
    /// Whether any of the given task names depends on this input.
    pub fn is_needed_by<'a>(&self, mut task_names: impl Iterator<Item = &'a str>) -> bool {
        self.tasks.is_empty() || task_names.any(|name| self.tasks.contains(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_multiplier_defaults() {
        let multipliers = TimeMultipliers::default();
        assert_eq!(multipliers.night(), 0.4);
        assert_eq!(multipliers.day(), 1.5);

        let multipliers = multipliers.with(TimeMultipliers::NIGHT, 0.1);
        assert_eq!(multipliers.night(), 0.1);
    }

    #[test]
    fn test_task_spec_deserialize_defaults() {
        let task: TaskSpec = serde_json::from_str(r#"{"name": "post", "weight": 2}"#).unwrap();
        assert_eq!(task.weight, 2.0);
        assert!(task.args.is_empty());
    }

    #[test]
    fn test_input_source_membership() {
        let source = InputSource {
            state_key: "timeline".into(),
            connection: "feed".into(),
            action: "read-timeline".into(),
            args: Args::new(),
            tasks: ["reply-to-tweet".to_string()].into_iter().collect(),
        };
        assert!(source.is_needed_by(["post", "reply-to-tweet"].into_iter()));
        assert!(!source.is_needed_by(["post"].into_iter()));
    }
}
