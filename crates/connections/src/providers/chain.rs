//! Strategy transaction relay.
//!
//! Payloads are posted as JSON to a relay endpoint that owns signing and ABI
//! encoding; the relay answers with the transaction hash.

use anyhow::{anyhow, Context};
use async_trait::async_trait;
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use autoloop_core::types::{Args, ConnectionConfig};
use autoloop_core::Result;

use super::{http_client, non_empty};
use crate::action::{Action, ActionParameter, ParamType};
use crate::provider::{arg_str, optional_str, require_str, ActionTable, CapabilityProvider};

const TOKEN_ENV: &str = "CHAIN_RELAY_TOKEN";

/// On-chain strategy function selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum StrategyKind {
    AdjustSplitRatio = 0,
    SwapToSingle = 1,
    SwapToMany = 2,
}

impl StrategyKind {
    pub fn code(self) -> u8 {
        self as u8
    }
}

pub struct ChainProvider {
    name: String,
    rpc_url: String,
    network: String,
    token: Option<String>,
    client: reqwest::Client,
    table: ActionTable<Self>,
}

impl ChainProvider {
    pub fn new(config: &ConnectionConfig) -> Result<Self> {
        Self::validate_config(config)?;
        let mut table = ActionTable::new();
        table.register(
            Action::new("strategy", "Submit a strategy call to the on-chain contract")
                .param(ActionParameter::required(
                    "strategy_address",
                    ParamType::String,
                    "Strategy contract address",
                ))
                .param(ActionParameter::required(
                    "kind",
                    ParamType::Integer,
                    "Strategy function selector",
                ))
                .param(ActionParameter::required(
                    "payload",
                    ParamType::Object,
                    "Typed call arguments",
                )),
            Self::strategy,
        );
        Ok(Self {
            name: config.name.clone(),
            rpc_url: require_str(config, "rpc_url")?.to_string(),
            network: optional_str(config, "network")?
                .unwrap_or("mainnet")
                .to_string(),
            token: non_empty(optional_str(config, "token")?.map(String::from)),
            client: http_client()?,
            table,
        })
    }

    /// `rpc_url` is required; `network` and `token` must be strings when set.
    pub fn validate_config(config: &ConnectionConfig) -> Result<()> {
        require_str(config, "rpc_url")?;
        optional_str(config, "network")?;
        optional_str(config, "token")?;
        Ok(())
    }

    fn token(&self) -> Option<String> {
        self.token
            .clone()
            .or_else(|| non_empty(std::env::var(TOKEN_ENV).ok()))
    }

    fn strategy<'a>(&'a self, args: &'a Args) -> BoxFuture<'a, anyhow::Result<Value>> {
        Box::pin(async move {
            let address = arg_str(args, "strategy_address").unwrap_or_default();
            let body = json!({
                "network": self.network,
                "strategy_address": address,
                "kind": args.get("kind"),
                "payload": args.get("payload"),
            });

            let mut request = self.client.post(&self.rpc_url).json(&body);
            if let Some(token) = self.token() {
                request = request.bearer_auth(token);
            }
            let response: Value = request
                .send()
                .await
                .context("relay request failed")?
                .error_for_status()
                .context("relay rejected strategy call")?
                .json()
                .await
                .context("invalid relay response")?;

            let tx_hash = relay_tx_hash(&response)?;
            tracing::info!(
                provider = %self.name,
                strategy = address,
                tx_hash = %tx_hash,
                "Strategy call submitted"
            );
            Ok(Value::String(tx_hash))
        })
    }
}

fn relay_tx_hash(response: &Value) -> anyhow::Result<String> {
    response["tx_hash"]
        .as_str()
        .or_else(|| response["hash"].as_str())
        .map(String::from)
        .ok_or_else(|| anyhow!("relay response has no transaction hash"))
}

#[async_trait]
impl CapabilityProvider for ChainProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn action(&self, name: &str) -> Option<&Action> {
        self.table.get(name)
    }

    fn actions(&self) -> Vec<&Action> {
        self.table.actions()
    }

    fn is_configured(&self, verbose: bool) -> bool {
        if verbose && self.token().is_none() {
            tracing::debug!(provider = %self.name, "Relay token not set, sending unauthenticated");
        }
        true
    }

    async fn configure(&mut self, params: Args) -> Result<bool> {
        if let Some(token) = params.get("token").and_then(Value::as_str) {
            self.token = non_empty(Some(token.to_string()));
        }
        if let Some(network) = params.get("network").and_then(Value::as_str) {
            self.network = network.to_string();
        }
        Ok(self.is_configured(true))
    }

    async fn invoke(&self, action: &str, args: &Args) -> anyhow::Result<Value> {
        self.table.dispatch(self, action, args).await
    }
}
