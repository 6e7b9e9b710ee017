//! Built-in agent actions.
//!
//! `execute-strategy` lets the model pick one of the strategy actions below;
//! each strategy action relays a typed payload to the strategy contract
//! through whichever connection exposes the `strategy` action.

use futures::future::BoxFuture;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use autoloop_connections::providers::StrategyKind;
use autoloop_core::types::Args;
use autoloop_core::{Error, Result};

use crate::agent::Agent;
use crate::registry::ActionRegistryBuilder;

/// Actions the model may choose from.
const STRATEGY_ACTIONS: [&str; 4] = ["swap-to-single", "swap-to-many", "adjust-split-ratio", "none"];

/// Split ratios are expressed in basis points.
const SPLIT_RATIO_TOTAL: u64 = 10_000;

pub fn register_builtin_actions(builder: ActionRegistryBuilder) -> ActionRegistryBuilder {
    builder
        .register("execute-strategy", execute_strategy)
        .register("swap-to-single", swap_to_single)
        .register("swap-to-many", swap_to_many)
        .register("adjust-split-ratio", adjust_split_ratio)
        .register("none", none)
}

#[derive(Debug, Serialize, Deserialize)]
struct SwapToSingle {
    tokens_in: Vec<String>,
    token_out: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct SwapToMany {
    token_in: String,
    tokens_out: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct SplitRatio {
    ratio: Vec<u64>,
}

#[derive(Debug, Deserialize)]
struct NoAction {
    #[serde(default)]
    message: Option<String>,
}

fn execute_strategy(agent: &mut Agent, _args: Args) -> BoxFuture<'_, Result<Option<Value>>> {
    Box::pin(async move {
        let events = serde_json::to_string(agent.state())?;
        let (action, arguments) = agent.perform_strategy(&format!("Events: {events}")).await?;
        if !STRATEGY_ACTIONS.contains(&action.as_str()) {
            return Err(Error::UnregisteredAction(action));
        }
        tracing::info!(agent_id = %agent.id(), action = %action, "Strategy action chosen");

        let result = agent.execute(&action, arguments).await?;
        Ok(Some(json!({"action": action, "result": result})))
    })
}

fn swap_to_single(agent: &mut Agent, args: Args) -> BoxFuture<'_, Result<Option<Value>>> {
    Box::pin(async move {
        let call: SwapToSingle = parse("swap-to-single", args)?;
        let mut tokens = call.tokens_in.clone();
        tokens.push(call.token_out.clone());
        check_tokens(agent, "swap-to-single", &tokens)?;
        relay(agent, StrategyKind::SwapToSingle, json!(call)).await
    })
}

fn swap_to_many(agent: &mut Agent, args: Args) -> BoxFuture<'_, Result<Option<Value>>> {
    Box::pin(async move {
        let call: SwapToMany = parse("swap-to-many", args)?;
        let mut tokens = call.tokens_out.clone();
        tokens.push(call.token_in.clone());
        check_tokens(agent, "swap-to-many", &tokens)?;
        relay(agent, StrategyKind::SwapToMany, json!(call)).await
    })
}

fn adjust_split_ratio(agent: &mut Agent, args: Args) -> BoxFuture<'_, Result<Option<Value>>> {
    Box::pin(async move {
        let call: SplitRatio = parse("adjust-split-ratio", args)?;
        let total: u64 = call.ratio.iter().sum();
        if total != SPLIT_RATIO_TOTAL {
            return Err(Error::InvalidParameters {
                action: "adjust-split-ratio".into(),
                errors: vec![format!("ratio must sum to {SPLIT_RATIO_TOTAL}, got {total}")],
            });
        }
        relay(agent, StrategyKind::AdjustSplitRatio, json!(call)).await
    })
}

fn none(agent: &mut Agent, args: Args) -> BoxFuture<'_, Result<Option<Value>>> {
    Box::pin(async move {
        let call: NoAction = parse("none", args)?;
        tracing::info!(
            agent_id = %agent.id(),
            reason = call.message.as_deref().unwrap_or(""),
            "No strategy action taken"
        );
        Ok(None)
    })
}

fn parse<T: DeserializeOwned>(action: &str, args: Args) -> Result<T> {
    serde_json::from_value(Value::Object(args)).map_err(|e| Error::InvalidParameters {
        action: action.to_string(),
        errors: vec![e.to_string()],
    })
}

/// Every token must be non-empty and, when the profile lists tokens, supported.
fn check_tokens(agent: &Agent, action: &str, tokens: &[String]) -> Result<()> {
    let supported = &agent.profile().tokens;
    let errors: Vec<String> = tokens
        .iter()
        .filter_map(|token| {
            if token.trim().is_empty() {
                Some("token address must not be empty".to_string())
            } else if !supported.is_empty()
                && !supported.iter().any(|s| s.eq_ignore_ascii_case(token))
            {
                Some(format!("unsupported token '{token}'"))
            } else {
                None
            }
        })
        .collect();
    if errors.is_empty() {
        Ok(())
    } else {
        Err(Error::InvalidParameters {
            action: action.to_string(),
            errors,
        })
    }
}

async fn relay(agent: &Agent, kind: StrategyKind, payload: Value) -> Result<Option<Value>> {
    let address = agent.profile().strategy_address.clone().ok_or_else(|| {
        Error::config(format!("agent '{}' has no strategy address", agent.id()))
    })?;
    let connection = agent
        .connections()
        .find_with_action("strategy")
        .ok_or_else(|| Error::config("no connection provides the 'strategy' action"))?
        .to_string();

    let mut args = Args::new();
    args.insert("strategy_address".into(), Value::String(address));
    args.insert("kind".into(), json!(kind.code()));
    args.insert("payload".into(), payload);

    let tx_hash = agent.connections().perform(&connection, "strategy", &args).await?;
    tracing::info!(
        agent_id = %agent.id(),
        kind = ?kind,
        tx_hash = %tx_hash,
        "Strategy executed"
    );
    Ok(Some(tx_hash))
}
