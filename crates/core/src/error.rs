//! Error taxonomy shared by every autoloop crate.

use thiserror::Error as ThisError;

/// Boxed cause carried by provider and persistence failures.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Result alias using the autoloop [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Supervisor lifecycle misuse. Caller mistakes, never retried by the runtime.
#[derive(Debug, Clone, PartialEq, Eq, ThisError)]
pub enum LifecycleError {
    /// No handle exists for this agent id.
    #[error("agent not found: {0}")]
    NotFound(String),

    /// A handle already exists for this agent id.
    #[error("agent already loaded: {0}")]
    AlreadyLoaded(String),
}

/// Errors raised by the autoloop runtime.
#[derive(Debug, ThisError)]
pub enum Error {
    /// Bad or missing static configuration. Fatal at load time.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Argument bag failed schema validation. Never reaches a provider.
    #[error("invalid parameters for '{action}': {}", .errors.join(", "))]
    InvalidParameters {
        /// Action whose schema was violated.
        action: String,
        /// Every violation found, in declaration order.
        errors: Vec<String>,
    },

    /// No connection is configured under this name.
    #[error("unknown provider: {0}")]
    UnknownProvider(String),

    /// The provider does not declare this action.
    #[error("unknown action '{action}' on provider '{provider}'")]
    UnknownAction {
        /// Provider that was asked.
        provider: String,
        /// Missing action name.
        action: String,
    },

    /// The decision picked an action with no registered handler.
    #[error("no handler registered for action: {0}")]
    UnregisteredAction(String),

    /// The provider is missing runtime credentials.
    #[error("provider '{0}' is not configured")]
    NotConfigured(String),

    /// Failure inside a capability provider.
    #[error("provider '{provider}' failed: {source}")]
    Provider {
        /// Provider that failed.
        provider: String,
        /// Original cause.
        #[source]
        source: BoxError,
    },

    /// Every task ended up with a zero weight.
    #[error("no selectable task: all weights are zero")]
    NoSelectableTask,

    /// Supervisor lifecycle misuse.
    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),

    /// Building an agent from its definition failed.
    #[error("could not load agent '{id}': {source}")]
    Load {
        /// Agent id being loaded.
        id: String,
        /// Underlying construction failure.
        #[source]
        source: Box<Error>,
    },

    /// Persistence sink or definition source failure.
    #[error("persistence error: {0}")]
    Persistence(String),

    /// JSON (de)serialization failure.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Create a persistence error.
    pub fn persistence(msg: impl Into<String>) -> Self {
        Self::Persistence(msg.into())
    }

    /// Wrap a provider-internal failure.
    pub fn provider(provider: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self::Provider {
            provider: provider.into(),
            source: source.into(),
        }
    }

    /// Wrap a construction failure for `id`.
    pub fn load(id: impl Into<String>, source: Error) -> Self {
        Self::Load {
            id: id.into(),
            source: Box::new(source),
        }
    }

    /// Shorthand for [`LifecycleError::NotFound`].
    pub fn not_found(id: impl Into<String>) -> Self {
        Self::Lifecycle(LifecycleError::NotFound(id.into()))
    }

    /// Shorthand for [`LifecycleError::AlreadyLoaded`].
    pub fn already_loaded(id: impl Into<String>) -> Self {
        Self::Lifecycle(LifecycleError::AlreadyLoaded(id.into()))
    }

    /// Only provider failures may be transient.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Provider { .. })
    }

    /// Short machine-readable code for logs and API responses.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Configuration(_) => "CONFIGURATION_ERROR",
            Self::InvalidParameters { .. } => "INVALID_PARAMETERS",
            Self::UnknownProvider(_) => "UNKNOWN_PROVIDER",
            Self::UnknownAction { .. } => "UNKNOWN_ACTION",
            Self::UnregisteredAction(_) => "UNREGISTERED_ACTION",
            Self::NotConfigured(_) => "NOT_CONFIGURED",
            Self::Provider { .. } => "PROVIDER_ERROR",
            Self::NoSelectableTask => "NO_SELECTABLE_TASK",
            Self::Lifecycle(LifecycleError::NotFound(_)) => "NOT_FOUND",
            Self::Lifecycle(LifecycleError::AlreadyLoaded(_)) => "ALREADY_LOADED",
            Self::Load { .. } => "LOAD_ERROR",
            Self::Persistence(_) => "PERSISTENCE_ERROR",
            Self::Serialization(_) => "SERIALIZATION_ERROR",
        }
    }
}
