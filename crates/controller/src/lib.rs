//! Agent runtime for autoloop.
//!
//! This crate provides the weighted decision engine, the per-agent
//! decide-act-record cycle, the action registry, and the supervisor that runs
//! many agents side by side.

pub mod actions;
pub mod agent;
pub mod decision;
pub mod prompt;
pub mod registry;
mod runtime;
pub mod supervisor;

pub use agent::{Agent, AgentContext, CyclePhase, CycleStats};
pub use decision::{validate_multipliers, validate_weights, DecisionEngine};
pub use registry::{ActionFn, ActionRegistry, ActionRegistryBuilder};
pub use supervisor::{AgentSupervisor, SupervisorConfig};
