//! Multi-agent supervisor.
//!
//! Owns one handle per loaded agent id. Map shards serialize insertion and
//! removal, and each handle's mutex serializes lifecycle calls and status
//! writes for one id. A handle leaves the map only after its worker has been
//! joined. A map guard is never held across an `.await`.

use std::sync::Arc;
use std::time::Duration;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use futures::future::BoxFuture;
use serde_json::{json, Value};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use autoloop_core::traits::AgentSource;
use autoloop_core::types::{AgentDefinition, AgentSnapshot, AgentStatus, Args};
use autoloop_core::{Error, Result};

use crate::agent::{Agent, AgentContext, CycleStats};
use crate::runtime::run_worker;

/// Collection holding agent status documents.
pub const AGENTS_COLLECTION: &str = "agents";

/// Supervisor settings.
#[derive(Debug, Clone)]
pub struct SupervisorConfig {
    /// How long `stop` waits for a worker before aborting it.
    pub stop_timeout: Duration,
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            stop_timeout: Duration::from_secs(5),
        }
    }
}

/// Runtime state of one loaded agent.
struct AgentRuntimeHandle {
    name: String,
    agent: Arc<Mutex<Agent>>,
    stats: Arc<CycleStats>,
    status: AgentStatus,
    cancel: Option<CancellationToken>,
    worker: Option<JoinHandle<()>>,
    workers_spawned: u64,
    /// Set once the handle left the map; later calls treat the id as unknown.
    removed: bool,
}

impl AgentRuntimeHandle {
    /// Running with a live worker. A worker that died no longer counts.
    fn is_running(&self) -> bool {
        self.status == AgentStatus::Running
            && self.worker.as_ref().is_some_and(|w| !w.is_finished())
    }

    fn snapshot(&self, id: &str) -> AgentSnapshot {
        AgentSnapshot {
            id: id.to_string(),
            name: self.name.clone(),
            status: self.status,
            cycles: self.stats.cycles(),
            failures: self.stats.failures(),
            workers_spawned: self.workers_spawned,
            last_error: self.stats.last_error(),
        }
    }
}

/// Loads, starts, stops and removes agents by id.
pub struct AgentSupervisor {
    agents: DashMap<String, Arc<Mutex<AgentRuntimeHandle>>>,
    source: Arc<dyn AgentSource>,
    context: AgentContext,
    config: SupervisorConfig,
}

impl AgentSupervisor {
    pub fn new(source: Arc<dyn AgentSource>, context: AgentContext, config: SupervisorConfig) -> Self {
        Self {
            agents: DashMap::new(),
            source,
            context,
            config,
        }
    }

    fn handle(&self, id: &str) -> Result<Arc<Mutex<AgentRuntimeHandle>>> {
        self.agents
            .get(id)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or_else(|| Error::not_found(id))
    }

    /// Validate and store a new definition. Returns its id.
    pub async fn create(&self, definition: AgentDefinition) -> Result<String> {
        Agent::validate_definition(&definition)?;
        let id = self.source.create(definition).await?;
        tracing::info!(agent_id = %id, "Agent definition created");
        Ok(id)
    }

    /// Build the agent for `id` from its definition.
    pub async fn load(&self, id: &str) -> Result<()> {
        if self.agents.contains_key(id) {
            return Err(Error::already_loaded(id));
        }

        let definition = self
            .source
            .fetch(id)
            .await
            .map_err(|e| Error::load(id, e))?;
        let agent = Agent::new(definition, &self.context).map_err(|e| Error::load(id, e))?;

        let name = agent.name().to_string();
        let handle = AgentRuntimeHandle {
            name: name.clone(),
            stats: agent.stats(),
            agent: Arc::new(Mutex::new(agent)),
            status: AgentStatus::Loaded,
            cancel: None,
            worker: None,
            workers_spawned: 0,
            removed: false,
        };
        let handle = Arc::new(Mutex::new(handle));
        // Locked before it becomes visible so the first status write wins.
        let guard = Arc::clone(&handle).lock_owned().await;
        match self.agents.entry(id.to_string()) {
            Entry::Occupied(_) => return Err(Error::already_loaded(id)),
            Entry::Vacant(slot) => {
                slot.insert(handle);
            }
        }

        tracing::info!(agent_id = %id, "Agent loaded");
        self.record_status(id, &name, AgentStatus::Loaded).await;
        drop(guard);
        Ok(())
    }

    /// Spawn the worker. No-op when already running.
    pub async fn start(&self, id: &str) -> Result<()> {
        let handle = self.handle(id)?;
        let mut handle = handle.lock().await;
        if handle.removed {
            return Err(Error::not_found(id));
        }
        if handle.is_running() {
            tracing::debug!(agent_id = %id, "Agent already running");
            return Ok(());
        }

        let cancel = CancellationToken::new();
        handle.worker = Some(tokio::spawn(run_worker(
            Arc::clone(&handle.agent),
            cancel.clone(),
        )));
        handle.cancel = Some(cancel);
        handle.workers_spawned += 1;
        handle.status = AgentStatus::Running;

        tracing::info!(agent_id = %id, "Agent started");
        self.record_status(id, &handle.name, AgentStatus::Running).await;
        Ok(())
    }

    /// Stop the worker. No-op when not running.
    pub async fn stop(&self, id: &str) -> Result<()> {
        let handle = self.handle(id)?;
        let mut handle = handle.lock().await;
        if handle.removed {
            return Err(Error::not_found(id));
        }
        if handle.status != AgentStatus::Running {
            tracing::debug!(agent_id = %id, "Agent not running");
            return Ok(());
        }
        self.stop_worker(id, &mut handle).await;

        self.record_status(id, &handle.name, AgentStatus::Stopped).await;
        Ok(())
    }

    /// Cancel and join the worker, aborting it after the stop timeout.
    async fn stop_worker(&self, id: &str, handle: &mut AgentRuntimeHandle) {
        if let Some(cancel) = handle.cancel.take() {
            cancel.cancel();
        }
        if let Some(mut worker) = handle.worker.take() {
            match tokio::time::timeout(self.config.stop_timeout, &mut worker).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => tracing::error!(agent_id = %id, error = %e, "Agent worker panicked"),
                Err(_) => {
                    tracing::warn!(
                        agent_id = %id,
                        timeout_secs = self.config.stop_timeout.as_secs_f64(),
                        "Agent worker did not stop in time, aborting"
                    );
                    worker.abort();
                    // Wait for the abort so a restart cannot overlap the old worker.
                    let _ = worker.await;
                }
            }
        }
        handle.status = AgentStatus::Stopped;
        tracing::info!(agent_id = %id, "Agent stopped");
    }

    /// Stop if running and forget the agent.
    ///
    /// The id stays taken until the worker has been joined, so a concurrent
    /// `load` sees `AlreadyLoaded` instead of racing the old worker.
    pub async fn remove(&self, id: &str) -> Result<()> {
        let entry = self.handle(id)?;
        let mut handle = entry.lock().await;
        if handle.removed {
            return Err(Error::not_found(id));
        }
        if handle.status == AgentStatus::Running {
            self.stop_worker(id, &mut handle).await;
        }
        handle.removed = true;
        self.record_status(id, &handle.name, AgentStatus::Stopped).await;
        self.agents
            .remove_if(id, |_, current| Arc::ptr_eq(current, &entry));
        drop(handle);

        tracing::info!(agent_id = %id, "Agent removed");
        Ok(())
    }

    /// Run `f` with exclusive access to the agent. Waits for an in-flight cycle.
    pub async fn with_agent<R>(
        &self,
        id: &str,
        f: impl for<'a> FnOnce(&'a mut Agent) -> BoxFuture<'a, R>,
    ) -> Result<R> {
        let agent = {
            let handle = self.handle(id)?;
            let handle = handle.lock().await;
            if handle.removed {
                return Err(Error::not_found(id));
            }
            Arc::clone(&handle.agent)
        };
        let mut agent = agent.lock().await;
        Ok(f(&mut *agent).await)
    }

    /// Run one provider action on behalf of an agent.
    pub async fn perform_action(
        &self,
        id: &str,
        connection: &str,
        action: &str,
        args: Args,
    ) -> Result<Value> {
        let (connection, action) = (connection.to_string(), action.to_string());
        self.with_agent(id, move |agent| {
            Box::pin(async move {
                agent
                    .connections()
                    .perform(&connection, &action, &args)
                    .await
            })
        })
        .await?
    }

    /// Apply runtime settings to one of an agent's connections.
    pub async fn configure_connection(&self, id: &str, connection: &str, params: Args) -> Result<bool> {
        let connection = connection.to_string();
        self.with_agent(id, move |agent| {
            Box::pin(async move { agent.connections_mut().configure(&connection, params).await })
        })
        .await?
    }

    /// Send a chat message to an agent and return its reply.
    pub async fn chat(&self, id: &str, user: &str, text: &str) -> Result<String> {
        let (user, text) = (user.to_string(), text.to_string());
        self.with_agent(id, move |agent| {
            Box::pin(async move { agent.chat(&user, &text).await })
        })
        .await?
    }

    pub async fn snapshot(&self, id: &str) -> Result<AgentSnapshot> {
        let handle = self.handle(id)?;
        let handle = handle.lock().await;
        if handle.removed {
            return Err(Error::not_found(id));
        }
        Ok(handle.snapshot(id))
    }

    /// Snapshots of every loaded agent, sorted by id.
    pub async fn list(&self) -> Vec<AgentSnapshot> {
        let mut handles: Vec<(String, Arc<Mutex<AgentRuntimeHandle>>)> = self
            .agents
            .iter()
            .map(|entry| (entry.key().clone(), Arc::clone(entry.value())))
            .collect();
        handles.sort_by(|a, b| a.0.cmp(&b.0));

        let mut snapshots = Vec::with_capacity(handles.len());
        for (id, handle) in handles {
            let handle = handle.lock().await;
            if !handle.removed {
                snapshots.push(handle.snapshot(&id));
            }
        }
        snapshots
    }

    /// Stop every running agent.
    pub async fn shutdown(&self) {
        let ids: Vec<String> = self.agents.iter().map(|e| e.key().clone()).collect();
        tracing::info!(agents = ids.len(), "Shutting down supervisor");
        for id in ids {
            if let Err(e) = self.stop(&id).await {
                tracing::warn!(agent_id = %id, error = %e, "Failed to stop agent during shutdown");
            }
        }
    }

    /// Upsert the status document of `id`. Callers hold the handle lock.
    async fn record_status(&self, id: &str, name: &str, status: AgentStatus) {
        let sink = &self.context.sink;
        let result = match sink
            .update(
                AGENTS_COLLECTION,
                json!({"id": id}),
                json!({"status": status.as_str()}),
            )
            .await
        {
            Ok(0) => {
                sink.insert(
                    AGENTS_COLLECTION,
                    json!({"id": id, "name": name, "status": status.as_str()}),
                )
                .await
            }
            Ok(_) => Ok(()),
            Err(e) => Err(e),
        };
        if let Err(e) = result {
            tracing::warn!(agent_id = %id, status = status.as_str(), error = %e, "Failed to record agent status");
        }
    }
}

impl std::fmt::Debug for AgentSupervisor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentSupervisor")
            .field("agents", &self.agents.len())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
