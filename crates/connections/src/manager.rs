//! Per-agent connection manager.

use serde_json::Value;

use autoloop_core::types::{Args, ConnectionConfig};
use autoloop_core::{Error, Result};

use crate::factory::ProviderFactory;
use crate::provider::CapabilityProvider;

/// Owns the configured capability providers of one agent.
///
/// The sole entry point through which an agent reaches any external
/// capability.
pub struct ConnectionManager {
    /// Providers in configuration order.
    connections: Vec<Box<dyn CapabilityProvider>>,
}

impl ConnectionManager {
    /// Construct every configured provider, failing on the first invalid config.
    pub fn new(configs: &[ConnectionConfig], factory: &ProviderFactory) -> Result<Self> {
        let mut connections: Vec<Box<dyn CapabilityProvider>> = Vec::with_capacity(configs.len());
        for config in configs {
            if connections.iter().any(|c| c.name() == config.name) {
                return Err(Error::config(format!(
                    "duplicate connection name '{}'",
                    config.name
                )));
            }
            connections.push(factory.build(config)?);
        }
        Ok(Self { connections })
    }

    /// Build from already constructed providers.
    pub fn from_providers(connections: Vec<Box<dyn CapabilityProvider>>) -> Self {
        Self { connections }
    }

    /// Look up a provider by connection name.
    pub fn get(&self, name: &str) -> Option<&dyn CapabilityProvider> {
        self.connections
            .iter()
            .find(|c| c.name() == name)
            .map(|c| &**c)
    }

    /// Connection names in configuration order.
    pub fn names(&self) -> Vec<&str> {
        self.connections.iter().map(|c| c.name()).collect()
    }

    /// Names of language-model providers, in configuration order.
    pub fn model_providers(&self) -> Vec<String> {
        self.connections
            .iter()
            .filter(|c| c.is_llm_provider())
            .map(|c| c.name().to_string())
            .collect()
    }

    /// First connection, in configuration order, that declares `action`.
    pub fn find_with_action(&self, action: &str) -> Option<&str> {
        self.connections
            .iter()
            .find(|c| c.action(action).is_some())
            .map(|c| c.name())
    }

    /// Run `action` on `provider`.
    pub async fn perform(&self, provider: &str, action: &str, args: &Args) -> Result<Value> {
        let connection = self
            .get(provider)
            .ok_or_else(|| Error::UnknownProvider(provider.to_string()))?;
        connection.perform(action, args).await
    }

    /// Apply runtime settings to `provider`.
    pub async fn configure(&mut self, provider: &str, params: Args) -> Result<bool> {
        let connection = self
            .connections
            .iter_mut()
            .find(|c| c.name() == provider)
            .ok_or_else(|| Error::UnknownProvider(provider.to_string()))?;
        let configured = connection.configure(params).await?;
        tracing::info!(provider = provider, configured = configured, "Connection configured");
        Ok(configured)
    }
}

impl std::fmt::Debug for ConnectionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionManager")
            .field("connections", &self.names())
            .finish()
    }
}
