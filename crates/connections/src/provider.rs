//! Capability provider contract.
//!
//! A provider declares a name, a configuration check, and a table of named
//! actions. Each provider builds a static [`ActionTable`] at construction that
//! maps action names to typed handler functions; [`CapabilityProvider::perform`]
//! is the only way those handlers are reached.

use std::collections::BTreeMap;

use async_trait::async_trait;
use futures::future::BoxFuture;
use serde_json::Value;

use autoloop_core::types::{Args, ConnectionConfig};
use autoloop_core::{Error, Result};

use crate::action::Action;

/// Typed handler for one action of provider `P`.
pub type ActionHandler<P> = for<'a> fn(&'a P, &'a Args) -> BoxFuture<'a, anyhow::Result<Value>>;

/// Static dispatch table of a provider.
pub struct ActionTable<P> {
    entries: BTreeMap<String, (Action, ActionHandler<P>)>,
}

impl<P> Default for ActionTable<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P> ActionTable<P> {
    pub fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    /// Register an action. Re-registering a name replaces the previous entry.
    pub fn register(&mut self, action: Action, handler: ActionHandler<P>) -> &mut Self {
        self.entries.insert(action.name.clone(), (action, handler));
        self
    }

    /// Schema of `name`.
    pub fn get(&self, name: &str) -> Option<&Action> {
        self.entries.get(name).map(|(action, _)| action)
    }

    /// All schemas, ordered by name.
    pub fn actions(&self) -> Vec<&Action> {
        self.entries.values().map(|(action, _)| action).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Run the handler registered for `name`.
    pub fn dispatch<'a>(
        &self,
        provider: &'a P,
        name: &str,
        args: &'a Args,
    ) -> BoxFuture<'a, anyhow::Result<Value>> {
        match self.entries.get(name) {
            Some((_, handler)) => handler(provider, args),
            None => {
                let name = name.to_string();
                Box::pin(async move { Err(anyhow::anyhow!("no handler for action '{name}'")) })
            }
        }
    }
}

/// External-facing component exposing named, schema-validated actions.
#[async_trait]
pub trait CapabilityProvider: Send + Sync {
    /// Connection name this provider was configured under.
    fn name(&self) -> &str;

    /// Whether this provider is a language-model backend.
    fn is_llm_provider(&self) -> bool {
        false
    }

    /// Schema of one action.
    fn action(&self, name: &str) -> Option<&Action>;

    /// Every declared action.
    fn actions(&self) -> Vec<&Action>;

    /// Cheap credential check. Never fails; logs details when `verbose`.
    fn is_configured(&self, verbose: bool) -> bool;

    /// Apply runtime settings such as credentials. Returns [`Self::is_configured`].
    async fn configure(&mut self, params: Args) -> Result<bool>;

    /// Provider-specific handler. Reached only through [`Self::perform`].
    async fn invoke(&self, action: &str, args: &Args) -> anyhow::Result<Value>;

    /// Validate and dispatch one action.
    async fn perform(&self, action: &str, args: &Args) -> Result<Value> {
        let Some(schema) = self.action(action) else {
            return Err(Error::UnknownAction {
                provider: self.name().to_string(),
                action: action.to_string(),
            });
        };

        let errors = schema.validate(args);
        if !errors.is_empty() {
            tracing::warn!(
                provider = self.name(),
                action = action,
                errors = ?errors,
                "Rejected action with invalid parameters"
            );
            return Err(Error::InvalidParameters {
                action: action.to_string(),
                errors,
            });
        }

        if !self.is_configured(true) {
            return Err(Error::NotConfigured(self.name().to_string()));
        }

        tracing::debug!(provider = self.name(), action = action, "Dispatching provider action");
        self.invoke(action, args)
            .await
            .map_err(|e| Error::provider(self.name(), e))
    }
}

// =============================================================================
// Config validation helpers
// =============================================================================

/// Required string setting.
pub fn require_str<'a>(config: &'a ConnectionConfig, key: &str) -> Result<&'a str> {
    match config.settings.get(key) {
        None | Some(Value::Null) => Err(Error::config(format!(
            "connection '{}': missing required field '{key}'",
            config.name
        ))),
        Some(Value::String(s)) => Ok(s),
        Some(_) => Err(Error::config(format!(
            "connection '{}': '{key}' must be a string",
            config.name
        ))),
    }
}

/// Optional string setting; present values must be strings.
pub fn optional_str<'a>(config: &'a ConnectionConfig, key: &str) -> Result<Option<&'a str>> {
    match config.settings.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(_) => Err(Error::config(format!(
            "connection '{}': '{key}' must be a string",
            config.name
        ))),
    }
}

/// String argument that schema validation already guaranteed.
pub fn arg_str<'a>(args: &'a Args, key: &str) -> Option<&'a str> {
    args.get(key).and_then(Value::as_str)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::{ActionParameter, ParamType};
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Counter {
        calls: AtomicUsize,
        configured: bool,
        table: ActionTable<Counter>,
    }

    impl Counter {
        fn new(configured: bool) -> Self {
            let mut table = ActionTable::new();
            table.register(
                Action::new("bump", "Increment the counter")
                    .param(ActionParameter::required("by", ParamType::Integer, "Step")),
                Self::bump,
            );
            table.register(Action::new("fail", "Always fails"), Self::fail);
            Self {
                calls: AtomicUsize::new(0),
                configured,
                table,
            }
        }

        fn bump<'a>(&'a self, args: &'a Args) -> BoxFuture<'a, anyhow::Result<Value>> {
            Box::pin(async move {
                let by = args.get("by").and_then(Value::as_u64).unwrap_or(0) as usize;
                Ok(json!(self.calls.fetch_add(by, Ordering::SeqCst) + by))
            })
        }

        fn fail<'a>(&'a self, _args: &'a Args) -> BoxFuture<'a, anyhow::Result<Value>> {
            Box::pin(async move { Err(anyhow::anyhow!("upstream exploded")) })
        }
    }

    #[async_trait]
    impl CapabilityProvider for Counter {
        fn name(&self) -> &str {
            "counter"
        }

        fn action(&self, name: &str) -> Option<&Action> {
            self.table.get(name)
        }

        fn actions(&self) -> Vec<&Action> {
            self.table.actions()
        }

        fn is_configured(&self, _verbose: bool) -> bool {
            self.configured
        }

        async fn configure(&mut self, _params: Args) -> Result<bool> {
            self.configured = true;
            Ok(true)
        }

        async fn invoke(&self, action: &str, args: &Args) -> anyhow::Result<Value> {
            self.table.dispatch(self, action, args).await
        }
    }

    fn args(value: Value) -> Args {
        value.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn test_perform_dispatches() {
        let provider = Counter::new(true);
        let result = provider.perform("bump", &args(json!({"by": 2}))).await.unwrap();
        assert_eq!(result, json!(2));
    }

    #[tokio::test]
    async fn test_unknown_action() {
        let provider = Counter::new(true);
        let err = provider.perform("launch", &Args::new()).await.unwrap_err();
        assert!(matches!(err, Error::UnknownAction { ref action, .. } if action == "launch"));
    }

    #[tokio::test]
    async fn test_invalid_parameters_never_reach_handler() {
        let provider = Counter::new(true);
        let err = provider.perform("bump", &Args::new()).await.unwrap_err();
        assert!(matches!(err, Error::InvalidParameters { .. }));
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_not_configured() {
        let mut provider = Counter::new(false);
        let err = provider.perform("bump", &args(json!({"by": 1}))).await.unwrap_err();
        assert!(matches!(err, Error::NotConfigured(_)));

        assert!(provider.configure(Args::new()).await.unwrap());
        assert!(provider.perform("bump", &args(json!({"by": 1}))).await.is_ok());
    }

    #[tokio::test]
    async fn test_handler_failure_is_wrapped() {
        let provider = Counter::new(true);
        let err = provider.perform("fail", &Args::new()).await.unwrap_err();
        assert!(err.is_retryable());
        assert!(err.to_string().contains("upstream exploded"));
    }

    #[test]
    fn test_register_is_idempotent() {
        let mut table: ActionTable<Counter> = ActionTable::new();
        table.register(Action::new("fail", "first"), Counter::fail);
        table.register(Action::new("fail", "second"), Counter::fail);
        assert_eq!(table.len(), 1);
        assert_eq!(table.get("fail").map(|a| a.description.as_str()), Some("second"));
    }

    #[test]
    fn test_config_helpers() {
        let config = ConnectionConfig::new("xai").with("model", "grok").with("port", 80);
        assert_eq!(require_str(&config, "model").unwrap(), "grok");
        assert!(require_str(&config, "api_key").is_err());
        assert!(require_str(&config, "port").is_err());
        assert_eq!(optional_str(&config, "api_key").unwrap(), None);
        assert!(optional_str(&config, "port").is_err());
    }
}
