//! Provider constructors keyed by provider kind.

use std::collections::HashMap;
use std::sync::Arc;

use autoloop_core::types::ConnectionConfig;
use autoloop_core::{Error, Result};

use crate::provider::CapabilityProvider;
use crate::providers::{ChainProvider, FeedProvider, OpenAiCompatibleProvider, Preset};

type Constructor = dyn Fn(&ConnectionConfig) -> Result<Box<dyn CapabilityProvider>> + Send + Sync;

/// Registry of provider constructors.
///
/// Built once at process start and shared by every agent; constructors must
/// validate their config and perform no I/O.
#[derive(Clone, Default)]
pub struct ProviderFactory {
    constructors: HashMap<String, Arc<Constructor>>,
}

impl ProviderFactory {
    /// Factory with no registered kinds.
    pub fn new() -> Self {
        Self::default()
    }

    /// Factory with every built-in provider kind registered.
    pub fn builtin() -> Self {
        let mut factory = Self::new();
        for preset in [Preset::OPENAI, Preset::HYPERBOLIC, Preset::XAI] {
            factory.register(preset.kind, move |config| {
                Ok(Box::new(OpenAiCompatibleProvider::new(config, preset)?))
            });
        }
        for kind in ["chain", "sonic"] {
            factory.register(kind, |config| Ok(Box::new(ChainProvider::new(config)?)));
        }
        factory.register("feed", |config| Ok(Box::new(FeedProvider::new(config)?)));
        factory
    }

    /// Register a constructor for `kind`, replacing any previous one.
    pub fn register<F>(&mut self, kind: impl Into<String>, constructor: F) -> &mut Self
    where
        F: Fn(&ConnectionConfig) -> Result<Box<dyn CapabilityProvider>> + Send + Sync + 'static,
    {
        self.constructors.insert(kind.into(), Arc::new(constructor));
        self
    }

    /// Registered kinds, sorted.
    pub fn kinds(&self) -> Vec<&str> {
        let mut kinds: Vec<&str> = self.constructors.keys().map(String::as_str).collect();
        kinds.sort_unstable();
        kinds
    }

    /// Construct and validate a provider for `config`.
    pub fn build(&self, config: &ConnectionConfig) -> Result<Box<dyn CapabilityProvider>> {
        let constructor = self.constructors.get(config.kind()).ok_or_else(|| {
            Error::config(format!(
                "connection '{}': unknown provider kind '{}'",
                config.name,
                config.kind()
            ))
        })?;
        constructor(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_kinds() {
        let factory = ProviderFactory::builtin();
        assert_eq!(
            factory.kinds(),
            vec!["chain", "feed", "hyperbolic", "openai", "sonic", "xai"]
        );
    }

    #[test]
    fn test_unknown_kind() {
        let factory = ProviderFactory::builtin();
        let err = factory.build(&ConnectionConfig::new("twitter")).err().unwrap();
        assert!(matches!(err, Error::Configuration(_)));
    }

    #[test]
    fn test_build_validates_config() {
        let factory = ProviderFactory::builtin();
        assert!(factory.build(&ConnectionConfig::new("xai")).is_err());

        let provider = factory
            .build(&ConnectionConfig::new("brain").with_kind("xai").with("model", "grok-2"))
            .unwrap();
        assert_eq!(provider.name(), "brain");
        assert!(provider.is_llm_provider());
    }
}
