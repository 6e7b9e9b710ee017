//! Weighted task selection.
//!
//! Each cycle picks one task at random in proportion to its weight. When time
//! adjustment is on, low-activity tasks are damped at night (01:00-05:59) and
//! high-engagement tasks are boosted during the day (08:00-20:59).

use rand::distributions::{Distribution, WeightedError, WeightedIndex};
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};

use autoloop_core::types::{TaskCategories, TaskSpec, TimeMultipliers};
use autoloop_core::{Error, Result};

/// Random source used for selection.
pub type DecisionRng = Box<dyn RngCore + Send + Sync>;

/// Picks the next task of an agent.
pub struct DecisionEngine {
    categories: TaskCategories,
    multipliers: TimeMultipliers,
    rng: DecisionRng,
}

impl DecisionEngine {
    /// Engine seeded from OS entropy.
    pub fn new(categories: TaskCategories, multipliers: TimeMultipliers) -> Self {
        Self {
            categories,
            multipliers,
            rng: Box::new(StdRng::from_entropy()),
        }
    }

    /// Replace the random source.
    pub fn with_rng(mut self, rng: impl RngCore + Send + Sync + 'static) -> Self {
        self.rng = Box::new(rng);
        self
    }

    /// Final weights for `tasks` at `hour`, in task order.
    pub fn adjusted_weights(&self, tasks: &[TaskSpec], use_time_adjustment: bool, hour: u32) -> Vec<f64> {
        let night = use_time_adjustment && (1..=5).contains(&hour);
        let day = use_time_adjustment && (8..=20).contains(&hour);

        tasks
            .iter()
            .map(|task| {
                let mut weight = task.weight;
                if night && self.categories.low_activity.contains(&task.name) {
                    weight *= self.multipliers.night();
                }
                if day && self.categories.high_engagement.contains(&task.name) {
                    weight *= self.multipliers.day();
                }
                weight
            })
            .collect()
    }

    /// Draw one task.
    pub fn select<'t>(
        &mut self,
        tasks: &'t [TaskSpec],
        use_time_adjustment: bool,
        hour: u32,
    ) -> Result<&'t TaskSpec> {
        let weights = self.adjusted_weights(tasks, use_time_adjustment, hour);
        let index = WeightedIndex::new(&weights).map_err(|e| match e {
            WeightedError::NoItem | WeightedError::AllWeightsZero => Error::NoSelectableTask,
            other => Error::config(format!("invalid task weights: {other}")),
        })?;
        Ok(&tasks[index.sample(&mut self.rng)])
    }
}

impl std::fmt::Debug for DecisionEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DecisionEngine")
            .field("categories", &self.categories)
            .field("multipliers", &self.multipliers)
            .finish_non_exhaustive()
    }
}

/// Load-time weight check: every weight finite and non-negative, at least one positive.
pub fn validate_weights(tasks: &[TaskSpec]) -> Result<()> {
    if let Some(task) = tasks.iter().find(|t| !t.weight.is_finite() || t.weight < 0.0) {
        return Err(Error::config(format!(
            "task '{}' has invalid weight {}",
            task.name, task.weight
        )));
    }
    if !tasks.iter().any(|t| t.weight > 0.0) {
        return Err(Error::config("at least one task needs a positive weight"));
    }
    Ok(())
}

/// Load-time multiplier check: every factor finite and non-negative.
pub fn validate_multipliers(multipliers: &TimeMultipliers) -> Result<()> {
    match multipliers
        .0
        .iter()
        .find(|(_, factor)| !factor.is_finite() || **factor < 0.0)
    {
        Some((key, factor)) => Err(Error::config(format!(
            "time multiplier '{key}' has invalid value {factor}"
        ))),
        None => Ok(()),
    }
}
