//! Action name to handler registry.

use std::collections::HashMap;

use futures::future::BoxFuture;
use serde_json::Value;

use autoloop_core::types::Args;
use autoloop_core::Result;

use crate::agent::Agent;

/// Handler for one agent action. Gets the agent and the task's argument bag.
pub type ActionFn = for<'a> fn(&'a mut Agent, Args) -> BoxFuture<'a, Result<Option<Value>>>;

/// Immutable action table shared by every agent of a process.
#[derive(Clone, Default)]
pub struct ActionRegistry {
    handlers: HashMap<String, ActionFn>,
}

impl ActionRegistry {
    pub fn builder() -> ActionRegistryBuilder {
        ActionRegistryBuilder::default()
    }

    /// Registry with every built-in action.
    pub fn builtin() -> Self {
        crate::actions::register_builtin_actions(Self::builder()).build()
    }

    pub fn get(&self, name: &str) -> Option<ActionFn> {
        self.handlers.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.handlers.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl std::fmt::Debug for ActionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActionRegistry")
            .field("actions", &self.names())
            .finish()
    }
}

/// Collects handlers before the registry is frozen.
#[derive(Default)]
pub struct ActionRegistryBuilder {
    handlers: HashMap<String, ActionFn>,
}

impl ActionRegistryBuilder {
    /// Register `handler` under `name`, replacing any previous handler.
    pub fn register(mut self, name: impl Into<String>, handler: ActionFn) -> Self {
        let name = name.into();
        if self.handlers.insert(name.clone(), handler).is_some() {
            tracing::debug!(action = %name, "Replaced action handler");
        }
        self
    }

    pub fn build(self) -> ActionRegistry {
        ActionRegistry {
            handlers: self.handlers,
        }
    }
}
