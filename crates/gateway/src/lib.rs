//! HTTP control surface for autoloop.
//!
//! Thin axum layer over the [`AgentSupervisor`] and the persistence sink.

mod error;
mod routes;

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::trace::TraceLayer;

use autoloop_controller::AgentSupervisor;
use autoloop_core::traits::PersistenceSink;

pub use error::ApiError;

/// Shared state of every handler.
#[derive(Clone)]
pub struct AppState {
    pub supervisor: Arc<AgentSupervisor>,
    pub sink: Arc<dyn PersistenceSink>,
    /// Prometheus exporter; `/metrics` is 404 without one.
    pub metrics: Option<PrometheusHandle>,
}

impl AppState {
    pub fn new(supervisor: Arc<AgentSupervisor>, sink: Arc<dyn PersistenceSink>) -> Self {
        Self {
            supervisor,
            sink,
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(routes::health))
        .route("/metrics", get(routes::metrics))
        .route("/agents", post(routes::create_agent).get(routes::list_agents))
        .route(
            "/agents/:id",
            get(routes::get_agent).delete(routes::remove_agent),
        )
        .route("/agents/:id/load", post(routes::load_agent))
        .route("/agents/:id/start", post(routes::start_agent))
        .route("/agents/:id/stop", post(routes::stop_agent))
        .route("/agents/:id/action", post(routes::perform_action))
        .route(
            "/agents/:id/connections/:connection/configure",
            post(routes::configure_connection),
        )
        .route("/agents/:id/chat", post(routes::chat))
        .route("/agents/:id/chats", get(routes::list_chats))
        .route("/activities", get(routes::list_activities))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
