//! A running agent and its decide-act-record cycle.
//!
//! One cycle gathers missing inputs into scratch state, draws a task, runs the
//! task's action handler, and records the outcome. The cycle never sleeps; the
//! worker that drives it owns the inter-cycle delay.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, OnceLock};
use std::time::Duration;

use rand::RngCore;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use autoloop_connections::{ConnectionManager, ProviderFactory};
use autoloop_core::traits::{Clock, PersistenceSink, SystemClock};
use autoloop_core::types::{
    ActivityRecord, AgentDefinition, AgentProfile, Args, ChatRecord, InputSource, TaskSpec,
};
use autoloop_core::{Error, Result};

use crate::decision::{validate_multipliers, validate_weights, DecisionEngine};
use crate::prompt::{build_system_prompt, TEXT_ONLY_NOTE};
use crate::registry::ActionRegistry;

/// Step of the cycle an agent is in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CyclePhase {
    #[default]
    Idle,
    GatheringInputs,
    Deciding,
    Executing,
    Recording,
    /// Last cycle failed; the worker waits one delay before retrying.
    ErrorBackoff,
}

/// Process-wide collaborators every agent is built with.
#[derive(Clone)]
pub struct AgentContext {
    pub factory: ProviderFactory,
    pub registry: Arc<ActionRegistry>,
    pub sink: Arc<dyn PersistenceSink>,
    pub clock: Arc<dyn Clock>,
}

impl AgentContext {
    /// Context reading the system clock.
    pub fn new(
        factory: ProviderFactory,
        registry: Arc<ActionRegistry>,
        sink: Arc<dyn PersistenceSink>,
    ) -> Self {
        Self {
            factory,
            registry,
            sink,
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }
}

/// Cycle counters, readable without locking the agent.
#[derive(Debug, Default)]
pub struct CycleStats {
    cycles: AtomicU64,
    failures: AtomicU64,
    last_error: Mutex<Option<String>>,
}

impl CycleStats {
    /// Completed cycles, successful or not.
    pub fn cycles(&self) -> u64 {
        self.cycles.load(Ordering::Relaxed)
    }

    pub fn failures(&self) -> u64 {
        self.failures.load(Ordering::Relaxed)
    }

    pub fn last_error(&self) -> Option<String> {
        match self.last_error.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn record_success(&self) {
        self.cycles.fetch_add(1, Ordering::Relaxed);
    }

    fn record_failure(&self, error: String) {
        self.cycles.fetch_add(1, Ordering::Relaxed);
        self.failures.fetch_add(1, Ordering::Relaxed);
        match self.last_error.lock() {
            Ok(mut guard) => *guard = Some(error),
            Err(poisoned) => *poisoned.into_inner() = Some(error),
        }
    }
}

/// An autonomous agent built from its definition.
pub struct Agent {
    id: String,
    name: String,
    loop_delay: Duration,
    tasks: Vec<TaskSpec>,
    use_time_based_weights: bool,
    inputs: Vec<InputSource>,
    profile: AgentProfile,
    connections: ConnectionManager,
    decision: DecisionEngine,
    registry: Arc<ActionRegistry>,
    sink: Arc<dyn PersistenceSink>,
    clock: Arc<dyn Clock>,
    /// Scratch state gathered for the current cycle.
    state: Args,
    phase: CyclePhase,
    stats: Arc<CycleStats>,
    system_prompt: OnceLock<String>,
}

impl Agent {
    /// Build an agent, constructing every configured connection.
    pub fn new(definition: AgentDefinition, context: &AgentContext) -> Result<Self> {
        let connections = ConnectionManager::new(&definition.config, &context.factory)?;
        Self::with_connections(definition, connections, context)
    }

    /// Build an agent around already constructed connections.
    pub fn with_connections(
        definition: AgentDefinition,
        connections: ConnectionManager,
        context: &AgentContext,
    ) -> Result<Self> {
        let loop_delay = Self::validate_definition(&definition)?;
        if let Some(input) = definition
            .inputs
            .iter()
            .find(|i| connections.get(&i.connection).is_none())
        {
            return Err(Error::config(format!(
                "input '{}' reads from unknown connection '{}'",
                input.state_key, input.connection
            )));
        }

        let decision = DecisionEngine::new(
            definition.task_categories.clone(),
            definition.time_based_multipliers.clone(),
        );

        tracing::info!(
            agent_id = %definition.id,
            connections = ?connections.names(),
            tasks = definition.tasks.len(),
            "Agent constructed"
        );

        Ok(Self {
            id: definition.id,
            name: definition.name,
            loop_delay,
            tasks: definition.tasks,
            use_time_based_weights: definition.use_time_based_weights,
            inputs: definition.inputs,
            profile: definition.profile,
            connections,
            decision,
            registry: Arc::clone(&context.registry),
            sink: Arc::clone(&context.sink),
            clock: Arc::clone(&context.clock),
            state: Args::new(),
            phase: CyclePhase::Idle,
            stats: Arc::new(CycleStats::default()),
            system_prompt: OnceLock::new(),
        })
    }

    /// Static checks on a definition. Returns the loop delay.
    pub fn validate_definition(definition: &AgentDefinition) -> Result<Duration> {
        if definition.id.trim().is_empty() {
            return Err(Error::config("agent id must not be empty"));
        }
        validate_weights(&definition.tasks)?;
        validate_multipliers(&definition.time_based_multipliers)?;
        Duration::try_from_secs_f64(definition.loop_delay).map_err(|_| {
            Error::config(format!("invalid loop_delay {}", definition.loop_delay))
        })
    }

    /// Replace the random source of the decision step.
    pub fn with_rng(mut self, rng: impl RngCore + Send + Sync + 'static) -> Self {
        self.decision = self.decision.with_rng(rng);
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn loop_delay(&self) -> Duration {
        self.loop_delay
    }

    pub fn phase(&self) -> CyclePhase {
        self.phase
    }

    pub fn stats(&self) -> Arc<CycleStats> {
        Arc::clone(&self.stats)
    }

    pub fn profile(&self) -> &AgentProfile {
        &self.profile
    }

    pub fn state(&self) -> &Args {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut Args {
        &mut self.state
    }

    pub fn connections(&self) -> &ConnectionManager {
        &self.connections
    }

    pub fn connections_mut(&mut self) -> &mut ConnectionManager {
        &mut self.connections
    }

    /// Cached system prompt built from the profile.
    pub fn system_prompt(&self) -> &str {
        self.system_prompt
            .get_or_init(|| build_system_prompt(&self.profile))
    }

    /// First configured language-model connection.
    pub fn model_provider(&self) -> Result<String> {
        self.connections
            .model_providers()
            .into_iter()
            .next()
            .ok_or_else(|| Error::config(format!("agent '{}' has no LLM provider", self.id)))
    }

    /// Run one full cycle.
    pub async fn run_cycle(&mut self) -> Result<ActivityRecord> {
        let outcome = self.cycle().await;
        match &outcome {
            Ok(record) => {
                self.stats.record_success();
                self.phase = CyclePhase::Idle;
                tracing::info!(
                    agent_id = %self.id,
                    action = %record.action,
                    "Cycle completed"
                );
            }
            Err(e) => {
                tracing::error!(
                    agent_id = %self.id,
                    phase = ?self.phase,
                    error = %e,
                    "Cycle failed"
                );
                self.stats.record_failure(e.to_string());
                self.phase = CyclePhase::ErrorBackoff;
            }
        }
        outcome
    }

    /// Account for a cycle that panicked instead of returning.
    pub(crate) fn record_panic(&mut self, message: &str) {
        tracing::error!(
            agent_id = %self.id,
            phase = ?self.phase,
            panic = %message,
            "Cycle panicked"
        );
        self.stats.record_failure(format!("cycle panicked: {message}"));
        self.phase = CyclePhase::ErrorBackoff;
    }

    async fn cycle(&mut self) -> Result<ActivityRecord> {
        self.phase = CyclePhase::GatheringInputs;
        self.gather_inputs().await?;

        self.phase = CyclePhase::Deciding;
        let hour = self.clock.hour();
        let task = self
            .decision
            .select(&self.tasks, self.use_time_based_weights, hour)?;
        let (action, args) = (task.name.clone(), task.args.clone());
        tracing::debug!(agent_id = %self.id, action = %action, hour = hour, "Task selected");

        self.phase = CyclePhase::Executing;
        let result = self.execute(&action, args).await?;

        self.phase = CyclePhase::Recording;
        let record = ActivityRecord::new(self.id.as_str(), action, result);
        self.persist(ActivityRecord::COLLECTION, &record).await;
        self.state.clear();
        Ok(record)
    }

    /// Fill scratch state from every input source a task needs and that is
    /// not already populated. All sources are tried before the first failure
    /// is returned.
    async fn gather_inputs(&mut self) -> Result<()> {
        let mut first_error = None;
        for input in &self.inputs {
            if !input.is_needed_by(self.tasks.iter().map(|t| t.name.as_str()))
                || has_value(self.state.get(&input.state_key))
            {
                continue;
            }
            tracing::debug!(
                agent_id = %self.id,
                key = %input.state_key,
                connection = %input.connection,
                "Gathering input"
            );
            match self
                .connections
                .perform(&input.connection, &input.action, &input.args)
                .await
            {
                Ok(value) => {
                    self.state.insert(input.state_key.clone(), value);
                }
                Err(e) => {
                    tracing::warn!(
                        agent_id = %self.id,
                        key = %input.state_key,
                        error = %e,
                        "Input gathering failed"
                    );
                    if first_error.is_none() {
                        first_error = Some(e);
                    }
                }
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    /// Run the handler registered for `action`.
    pub async fn execute(&mut self, action: &str, args: Args) -> Result<Option<Value>> {
        let handler = self
            .registry
            .get(action)
            .ok_or_else(|| Error::UnregisteredAction(action.to_string()))?;
        handler(self, args).await
    }

    /// Free-text generation with the agent's system prompt.
    pub async fn prompt_llm(&self, prompt: &str) -> Result<String> {
        let provider = self.model_provider()?;
        let mut args = Args::new();
        args.insert("prompt".into(), Value::from(prompt));
        args.insert(
            "system_prompt".into(),
            Value::from(format!("{} {TEXT_ONLY_NOTE}", self.system_prompt())),
        );
        match self.connections.perform(&provider, "generate-text", &args).await? {
            Value::String(text) => Ok(text),
            other => Ok(other.to_string()),
        }
    }

    /// Ask the model which strategy action to take. Returns its name and arguments.
    pub async fn perform_strategy(&self, prompt: &str) -> Result<(String, Args)> {
        let provider = self.model_provider()?;
        let strategies = match &self.profile.strategies {
            Value::Object(map) => Value::Object(map.clone()),
            _ => Value::Object(Args::new()),
        };
        let mut args = Args::new();
        args.insert("prompt".into(), Value::from(prompt));
        args.insert("strategies".into(), strategies);
        args.insert("system_prompt".into(), Value::from(self.system_prompt()));

        let call = self
            .connections
            .perform(&provider, "generate-strategy-action", &args)
            .await?;
        let name = call["name"]
            .as_str()
            .ok_or_else(|| Error::provider(provider.as_str(), "tool call has no name"))?
            .to_string();
        let arguments = match call.get("arguments") {
            None | Some(Value::Null) => Args::new(),
            Some(Value::Object(map)) => map.clone(),
            Some(_) => {
                return Err(Error::provider(
                    provider.as_str(),
                    "tool call arguments are not an object",
                ))
            }
        };
        Ok((name, arguments))
    }

    /// Answer a user message, recording both sides of the exchange.
    pub async fn chat(&self, user: &str, text: &str) -> Result<String> {
        self.persist(ChatRecord::COLLECTION, &ChatRecord::new(user, self.id.as_str(), text))
            .await;
        let reply = self.prompt_llm(text).await?;
        self.persist(
            ChatRecord::COLLECTION,
            &ChatRecord::new(self.id.as_str(), user, reply.as_str()),
        )
        .await;
        Ok(reply)
    }

    /// Best-effort write; sink failures never fail the caller.
    async fn persist(&self, collection: &str, record: &(impl Serialize + Sync)) {
        let outcome = match serde_json::to_value(record) {
            Ok(value) => self.sink.insert(collection, value).await,
            Err(e) => Err(e.into()),
        };
        if let Err(e) = outcome {
            tracing::warn!(
                agent_id = %self.id,
                collection = collection,
                error = %e,
                "Failed to persist record"
            );
        }
    }
}

impl std::fmt::Debug for Agent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Agent")
            .field("id", &self.id)
            .field("phase", &self.phase)
            .field("connections", &self.connections)
            .finish_non_exhaustive()
    }
}

fn has_value(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Array(items)) => !items.is_empty(),
        Some(Value::Object(map)) => !map.is_empty(),
        Some(Value::String(s)) => !s.is_empty(),
        Some(_) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use autoloop_connections::{Action, ActionParameter, CapabilityProvider, ParamType};
    use autoloop_core::traits::{FixedClock, Page};
    use autoloop_core::types::TimeMultipliers;
    use futures::future::BoxFuture;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use serde_json::json;
    use std::sync::atomic::AtomicUsize;

    /// In-test sink collecting inserts.
    #[derive(Default)]
    struct VecSink {
        records: Mutex<Vec<(String, Value)>>,
    }

    impl VecSink {
        fn collection(&self, name: &str) -> Vec<Value> {
            self.records
                .lock()
                .unwrap()
                .iter()
                .filter(|(c, _)| c == name)
                .map(|(_, v)| v.clone())
                .collect()
        }
    }

    #[async_trait]
    impl PersistenceSink for VecSink {
        async fn insert(&self, collection: &str, record: Value) -> Result<()> {
            self.records
                .lock()
                .unwrap()
                .push((collection.to_string(), record));
            Ok(())
        }

        async fn update(&self, _collection: &str, _filter: Value, _patch: Value) -> Result<u64> {
            Ok(0)
        }

        async fn find(
            &self,
            _collection: &str,
            _filter: Value,
            _sort_desc: Option<&str>,
            _page: Page,
        ) -> Result<Vec<Value>> {
            Ok(Vec::new())
        }
    }

    /// Scripted provider: `read` returns a timeline or fails, `think` returns
    /// a fixed tool call or text.
    struct Scripted {
        name: &'static str,
        llm: bool,
        fail_reads: bool,
        reads: Arc<AtomicUsize>,
        actions: Vec<Action>,
    }

    impl Scripted {
        fn feed(fail_reads: bool, reads: Arc<AtomicUsize>) -> Box<dyn CapabilityProvider> {
            Box::new(Self {
                name: "feed",
                llm: false,
                fail_reads,
                reads,
                actions: vec![Action::new("read-timeline", "Timeline")],
            })
        }

        fn model() -> Box<dyn CapabilityProvider> {
            Box::new(Self {
                name: "brain",
                llm: true,
                fail_reads: false,
                reads: Arc::default(),
                actions: vec![
                    Action::new("generate-text", "Text")
                        .param(ActionParameter::required("prompt", ParamType::String, "Prompt")),
                    Action::new("generate-strategy-action", "Tool call")
                        .param(ActionParameter::required("prompt", ParamType::String, "Prompt"))
                        .param(ActionParameter::required("strategies", ParamType::Object, "Tools"))
                        .param(ActionParameter::required("system_prompt", ParamType::String, "System")),
                ],
            })
        }
    }

    #[async_trait]
    impl CapabilityProvider for Scripted {
        fn name(&self) -> &str {
            self.name
        }

        fn is_llm_provider(&self) -> bool {
            self.llm
        }

        fn action(&self, name: &str) -> Option<&Action> {
            self.actions.iter().find(|a| a.name == name)
        }

        fn actions(&self) -> Vec<&Action> {
            self.actions.iter().collect()
        }

        fn is_configured(&self, _verbose: bool) -> bool {
            true
        }

        async fn configure(&mut self, _params: Args) -> Result<bool> {
            Ok(true)
        }

        async fn invoke(&self, action: &str, args: &Args) -> anyhow::Result<Value> {
            match action {
                "read-timeline" => {
                    self.reads.fetch_add(1, Ordering::SeqCst);
                    if self.fail_reads {
                        anyhow::bail!("timeline unavailable");
                    }
                    Ok(json!(["gm", "wagmi"]))
                }
                "generate-text" => Ok(json!(format!("echo: {}", args["prompt"].as_str().unwrap_or("")))),
                _ => Ok(json!({"name": "none", "arguments": {"message": "hold"}})),
            }
        }
    }

    fn echo(agent: &mut Agent, args: Args) -> BoxFuture<'_, Result<Option<Value>>> {
        Box::pin(async move {
            Ok(Some(json!({
                "args": args,
                "timeline": agent.state().get("timeline").cloned(),
            })))
        })
    }

    fn quiet(_agent: &mut Agent, _args: Args) -> BoxFuture<'_, Result<Option<Value>>> {
        Box::pin(async { Ok(None) })
    }

    fn definition(tasks: Vec<TaskSpec>) -> AgentDefinition {
        serde_json::from_value(json!({
            "id": "agent-1",
            "name": "Edgar",
            "loop_delay": 0.5,
            "config": [],
            "tasks": tasks,
            "inputs": [{
                "state_key": "timeline",
                "connection": "feed",
                "action": "read-timeline",
                "tasks": ["echo"]
            }]
        }))
        .unwrap()
    }

    fn agent(tasks: Vec<TaskSpec>, fail_reads: bool) -> (Agent, Arc<VecSink>, Arc<AtomicUsize>) {
        let sink = Arc::new(VecSink::default());
        let reads = Arc::new(AtomicUsize::new(0));
        let registry = crate::actions::register_builtin_actions(ActionRegistry::builder())
            .register("echo", echo)
            .register("post", quiet)
            .register("reply", quiet)
            .build();
        let context = AgentContext::new(ProviderFactory::new(), Arc::new(registry), sink.clone())
            .with_clock(Arc::new(FixedClock(12)));
        let connections = ConnectionManager::from_providers(vec![
            Scripted::feed(fail_reads, reads.clone()),
            Scripted::model(),
        ]);
        let agent = Agent::with_connections(definition(tasks), connections, &context)
            .unwrap()
            .with_rng(StdRng::seed_from_u64(3));
        (agent, sink, reads)
    }

    #[tokio::test]
    async fn test_cycle_records_and_clears_state() {
        let mut echo_task = TaskSpec::new("echo", 1.0);
        echo_task.args.insert("mood".into(), json!("calm"));
        let (mut agent, sink, reads) = agent(vec![echo_task], false);

        let record = agent.run_cycle().await.unwrap();
        assert_eq!(record.initiator, "agent-1");
        assert_eq!(record.action, "echo");
        let result = record.result.unwrap();
        assert_eq!(result["args"]["mood"], "calm");
        assert_eq!(result["timeline"], json!(["gm", "wagmi"]));

        assert_eq!(reads.load(Ordering::SeqCst), 1);
        assert!(agent.state().is_empty());
        assert_eq!(agent.phase(), CyclePhase::Idle);
        assert_eq!(agent.stats().cycles(), 1);

        let activities = sink.collection(ActivityRecord::COLLECTION);
        assert_eq!(activities.len(), 1);
        assert_eq!(activities[0]["action"], "echo");
    }

    #[tokio::test]
    async fn test_cycles_follow_task_weights() {
        let tasks = vec![TaskSpec::new("post", 1.0), TaskSpec::new("reply", 3.0)];
        let (mut agent, sink, reads) = agent(tasks, false);
        let cycles = 2000;
        for _ in 0..cycles {
            agent.run_cycle().await.unwrap();
        }

        let activities = sink.collection(ActivityRecord::COLLECTION);
        assert_eq!(activities.len(), cycles);
        let replies = activities.iter().filter(|a| a["action"] == "reply").count();
        let share = replies as f64 / cycles as f64;
        assert!((share - 0.75).abs() < 0.05, "share of 'reply' was {share}");
        assert_eq!(reads.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_populated_state_skips_gathering() {
        let (mut agent, _sink, reads) = agent(vec![TaskSpec::new("echo", 1.0)], false);
        agent.state_mut().insert("timeline".into(), json!(["cached"]));
        let record = agent.run_cycle().await.unwrap();
        assert_eq!(record.result.unwrap()["timeline"], json!(["cached"]));
        assert_eq!(reads.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_inputs_only_for_dependent_tasks() {
        let (mut agent, _sink, reads) = agent(vec![TaskSpec::new("none", 1.0)], false);
        agent.run_cycle().await.unwrap();
        assert_eq!(reads.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_failed_gathering_enters_backoff() {
        let (mut agent, sink, _reads) = agent(vec![TaskSpec::new("echo", 1.0)], true);
        let err = agent.run_cycle().await.unwrap_err();
        assert!(err.is_retryable());
        assert_eq!(agent.phase(), CyclePhase::ErrorBackoff);
        assert_eq!(agent.stats().failures(), 1);
        assert!(agent.stats().last_error().unwrap().contains("timeline unavailable"));
        assert!(sink.collection(ActivityRecord::COLLECTION).is_empty());
    }

    #[tokio::test]
    async fn test_unregistered_action() {
        let (mut agent, _sink, _reads) = agent(vec![TaskSpec::new("post-tweet", 1.0)], false);
        let err = agent.run_cycle().await.unwrap_err();
        assert!(matches!(err, Error::UnregisteredAction(ref a) if a == "post-tweet"));
    }

    #[tokio::test]
    async fn test_execute_strategy_uses_model_choice() {
        let (mut agent, sink, _reads) = agent(vec![TaskSpec::new("execute-strategy", 1.0)], false);
        let record = agent.run_cycle().await.unwrap();
        assert_eq!(record.action, "execute-strategy");
        assert_eq!(record.result.unwrap()["action"], "none");
        assert_eq!(sink.collection(ActivityRecord::COLLECTION).len(), 1);
    }

    #[tokio::test]
    async fn test_chat_records_both_sides() {
        let (agent, sink, _reads) = agent(vec![TaskSpec::new("none", 1.0)], false);
        let reply = agent.chat("0xuser", "hello").await.unwrap();
        assert_eq!(reply, "echo: hello");
        let chats = sink.collection(ChatRecord::COLLECTION);
        assert_eq!(chats.len(), 2);
        assert_eq!(chats[0]["sender"], "0xuser");
        assert_eq!(chats[1]["receiver"], "0xuser");
    }

    #[test]
    fn test_definition_validation() {
        let mut def = definition(vec![TaskSpec::new("none", 1.0)]);
        assert_eq!(Agent::validate_definition(&def).unwrap(), Duration::from_millis(500));

        def.loop_delay = -1.0;
        assert!(Agent::validate_definition(&def).is_err());

        let def = definition(vec![TaskSpec::new("none", 0.0)]);
        assert!(Agent::validate_definition(&def).is_err());
    }

    #[test]
    fn test_invalid_multiplier_fails_validation() {
        let mut def = definition(vec![TaskSpec::new("none", 1.0)]);
        def.use_time_based_weights = true;
        def.time_based_multipliers = TimeMultipliers::default().with(TimeMultipliers::NIGHT, -1.0);
        assert!(matches!(
            Agent::validate_definition(&def),
            Err(Error::Configuration(ref msg)) if msg.contains("tweet_night_multiplier")
        ));

        def.time_based_multipliers = TimeMultipliers::default().with(TimeMultipliers::DAY, f64::NAN);
        assert!(Agent::validate_definition(&def).is_err());
    }

    #[test]
    fn test_unknown_input_connection() {
        let context = AgentContext::new(
            ProviderFactory::new(),
            Arc::new(ActionRegistry::builtin()),
            Arc::new(VecSink::default()),
        );
        let result = Agent::with_connections(
            definition(vec![TaskSpec::new("none", 1.0)]),
            ConnectionManager::from_providers(Vec::new()),
            &context,
        );
        assert!(matches!(result, Err(Error::Configuration(_))));
    }

    #[test]
    fn test_has_value() {
        assert!(!has_value(None));
        assert!(!has_value(Some(&json!(null))));
        assert!(!has_value(Some(&json!([]))));
        assert!(!has_value(Some(&json!(""))));
        assert!(has_value(Some(&json!(0))));
        assert!(has_value(Some(&json!(["x"]))));
    }
}
