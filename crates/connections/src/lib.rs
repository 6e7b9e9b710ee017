//! Capability dispatch layer.
//!
//! Agents reach every external system through a [`ConnectionManager`], which
//! routes `(provider, action, args)` calls to [`CapabilityProvider`]s built by a
//! [`ProviderFactory`].

pub mod action;
pub mod factory;
pub mod manager;
pub mod provider;
pub mod providers;

pub use action::{Action, ActionParameter, ParamType};
pub use factory::ProviderFactory;
pub use manager::ConnectionManager;
pub use provider::{ActionHandler, ActionTable, CapabilityProvider};
