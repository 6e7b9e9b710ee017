mod config;

use std::sync::Arc;

use anyhow::{Context, Result};
use metrics_exporter_prometheus::PrometheusBuilder;
use tracing_subscriber::EnvFilter;

use autoloop_connections::ProviderFactory;
use autoloop_controller::{ActionRegistry, AgentContext, AgentSupervisor, SupervisorConfig};
use autoloop_gateway::{build_router, AppState};
use autoloop_store::{FileAgentSource, InMemorySink};

use crate::config::AppConfig;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = AppConfig::load()?;
    tracing::info!(
        addr = %config.addr,
        agents_dir = %config.agents_dir.display(),
        "Starting autoloop"
    );

    let metrics = PrometheusBuilder::new()
        .install_recorder()
        .context("failed to install metrics recorder")?;

    let sink = Arc::new(InMemorySink::new());
    let context = AgentContext::new(
        ProviderFactory::builtin(),
        Arc::new(ActionRegistry::builtin()),
        sink.clone(),
    );
    let supervisor = Arc::new(AgentSupervisor::new(
        Arc::new(FileAgentSource::new(&config.agents_dir)),
        context,
        SupervisorConfig {
            stop_timeout: config.stop_timeout(),
        },
    ));

    for id in &config.autostart {
        let started = async {
            supervisor.load(id).await?;
            supervisor.start(id).await
        };
        if let Err(e) = started.await {
            tracing::error!(agent_id = %id, error = %e, "Autostart failed");
        }
    }

    let app = build_router(AppState::new(supervisor.clone(), sink).with_metrics(metrics));
    let listener = tokio::net::TcpListener::bind(&config.addr)
        .await
        .with_context(|| format!("failed to bind {}", config.addr))?;
    tracing::info!(addr = %config.addr, "Control surface listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    supervisor.shutdown().await;
    tracing::info!("Shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
