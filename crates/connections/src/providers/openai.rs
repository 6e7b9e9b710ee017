//! OpenAI-compatible chat-completions provider (OpenAI, Hyperbolic, xAI).

use anyhow::{anyhow, Context};
use async_trait::async_trait;
use futures::future::BoxFuture;
use serde_json::{json, Value};

use autoloop_core::types::{Args, ConnectionConfig};
use autoloop_core::Result;

use super::{http_client, non_empty};
use crate::action::{Action, ActionParameter, ParamType};
use crate::provider::{arg_str, optional_str, require_str, ActionTable, CapabilityProvider};

/// Endpoint defaults for one OpenAI-compatible vendor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Preset {
    /// Provider kind in connection configs.
    pub kind: &'static str,
    pub base_url: &'static str,
    /// Environment variable holding the API key.
    pub api_key_env: &'static str,
}

impl Preset {
    pub const OPENAI: Preset = Preset {
        kind: "openai",
        base_url: "https://api.openai.com/v1",
        api_key_env: "OPENAI_API_KEY",
    };
    pub const HYPERBOLIC: Preset = Preset {
        kind: "hyperbolic",
        base_url: "https://api.hyperbolic.xyz/v1",
        api_key_env: "HYPERBOLIC_API_KEY",
    };
    pub const XAI: Preset = Preset {
        kind: "xai",
        base_url: "https://api.x.ai/v1",
        api_key_env: "XAI_API_KEY",
    };
}

/// Language-model provider speaking the chat-completions protocol.
pub struct OpenAiCompatibleProvider {
    name: String,
    model: String,
    base_url: String,
    api_key: Option<String>,
    preset: Preset,
    client: reqwest::Client,
    table: ActionTable<Self>,
}

impl OpenAiCompatibleProvider {
    pub fn new(config: &ConnectionConfig, preset: Preset) -> Result<Self> {
        Self::validate_config(config)?;
        let mut provider = Self {
            name: config.name.clone(),
            model: require_str(config, "model")?.to_string(),
            base_url: optional_str(config, "base_url")?
                .unwrap_or(preset.base_url)
                .trim_end_matches('/')
                .to_string(),
            api_key: non_empty(optional_str(config, "api_key")?.map(String::from)),
            preset,
            client: http_client()?,
            table: ActionTable::new(),
        };
        provider.register_actions();
        Ok(provider)
    }

    /// `model` is required; `api_key` and `base_url` must be strings when set.
    pub fn validate_config(config: &ConnectionConfig) -> Result<()> {
        require_str(config, "model")?;
        optional_str(config, "api_key")?;
        optional_str(config, "base_url")?;
        Ok(())
    }

    fn register_actions(&mut self) {
        self.table
            .register(
                Action::new("generate-text", "Generate text with the configured model")
                    .param(ActionParameter::required("prompt", ParamType::String, "The input prompt"))
                    .param(ActionParameter::optional(
                        "system_prompt",
                        ParamType::String,
                        "System prompt to guide the model",
                    ))
                    .param(ActionParameter::optional("model", ParamType::String, "Model override"))
                    .param(ActionParameter::optional(
                        "temperature",
                        ParamType::Number,
                        "Degree of randomness in the response",
                    )),
                Self::generate_text,
            )
            .register(
                Action::new(
                    "generate-strategy-action",
                    "Pick one strategy action and its arguments via tool calling",
                )
                .param(ActionParameter::required("prompt", ParamType::String, "Events to react to"))
                .param(ActionParameter::required(
                    "strategies",
                    ParamType::Object,
                    "Strategy action name to description lines",
                ))
                .param(ActionParameter::required(
                    "system_prompt",
                    ParamType::String,
                    "System prompt to guide the model",
                ))
                .param(ActionParameter::optional("model", ParamType::String, "Model override")),
                Self::generate_strategy_action,
            )
            .register(
                Action::new("check-model", "Check whether a model is available")
                    .param(ActionParameter::required("model", ParamType::String, "Model id")),
                Self::check_model,
            )
            .register(
                Action::new("list-models", "List available models"),
                Self::list_models,
            );
    }

    fn api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .or_else(|| non_empty(std::env::var(self.preset.api_key_env).ok()))
    }

    fn model_for<'a>(&'a self, args: &'a Args) -> &'a str {
        arg_str(args, "model").unwrap_or(&self.model)
    }

    async fn post_chat(&self, body: Value) -> anyhow::Result<Value> {
        let api_key = self.api_key().ok_or_else(|| anyhow!("API key not set"))?;
        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .context("chat completion request failed")?
            .error_for_status()
            .context("chat completion rejected")?;
        response.json().await.context("invalid chat completion response")
    }

    async fn fetch_models(&self) -> anyhow::Result<Vec<String>> {
        let api_key = self.api_key().ok_or_else(|| anyhow!("API key not set"))?;
        let body: Value = self
            .client
            .get(format!("{}/models", self.base_url))
            .bearer_auth(api_key)
            .send()
            .await
            .context("model listing request failed")?
            .error_for_status()
            .context("model listing rejected")?
            .json()
            .await
            .context("invalid model listing response")?;
        Ok(body["data"]
            .as_array()
            .map(|models| {
                models
                    .iter()
                    .filter_map(|m| m["id"].as_str().map(String::from))
                    .collect()
            })
            .unwrap_or_default())
    }

    fn generate_text<'a>(&'a self, args: &'a Args) -> BoxFuture<'a, anyhow::Result<Value>> {
        Box::pin(async move {
            let mut messages = Vec::new();
            if let Some(system) = arg_str(args, "system_prompt") {
                messages.push(json!({"role": "system", "content": system}));
            }
            messages.push(json!({"role": "user", "content": arg_str(args, "prompt").unwrap_or_default()}));

            let mut body = json!({"model": self.model_for(args), "messages": messages});
            if let Some(temperature) = args.get("temperature").and_then(Value::as_f64) {
                body["temperature"] = json!(temperature);
            }

            let response = self.post_chat(body).await?;
            let content = response["choices"][0]["message"]["content"]
                .as_str()
                .ok_or_else(|| anyhow!("completion has no text content"))?;
            Ok(Value::String(content.to_string()))
        })
    }

    fn generate_strategy_action<'a>(&'a self, args: &'a Args) -> BoxFuture<'a, anyhow::Result<Value>> {
        Box::pin(async move {
            let body = json!({
                "model": self.model_for(args),
                "messages": [
                    {"role": "system", "content": arg_str(args, "system_prompt").unwrap_or_default()},
                    {"role": "user", "content": arg_str(args, "prompt").unwrap_or_default()},
                ],
                "tools": strategy_tools(args.get("strategies").unwrap_or(&Value::Null)),
            });
            let response = self.post_chat(body).await?;
            parse_tool_call(&response)
        })
    }

    fn check_model<'a>(&'a self, args: &'a Args) -> BoxFuture<'a, anyhow::Result<Value>> {
        Box::pin(async move {
            let wanted = arg_str(args, "model").unwrap_or_default();
            let models = self.fetch_models().await?;
            Ok(Value::Bool(models.iter().any(|m| m == wanted)))
        })
    }

    fn list_models<'a>(&'a self, _args: &'a Args) -> BoxFuture<'a, anyhow::Result<Value>> {
        Box::pin(async move {
            let models = self.fetch_models().await?;
            tracing::info!(provider = %self.name, count = models.len(), "Listed models");
            Ok(json!(models))
        })
    }
}

#[async_trait]
impl CapabilityProvider for OpenAiCompatibleProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_llm_provider(&self) -> bool {
        true
    }

    fn action(&self, name: &str) -> Option<&Action> {
        self.table.get(name)
    }

    fn actions(&self) -> Vec<&Action> {
        self.table.actions()
    }

    fn is_configured(&self, verbose: bool) -> bool {
        let configured = self.api_key().is_some();
        if !configured && verbose {
            tracing::debug!(
                provider = %self.name,
                env = self.preset.api_key_env,
                "No API key in config or environment"
            );
        }
        configured
    }

    async fn configure(&mut self, params: Args) -> Result<bool> {
        if let Some(key) = params.get("api_key").and_then(Value::as_str) {
            self.api_key = non_empty(Some(key.to_string()));
        }
        if let Some(model) = params.get("model").and_then(Value::as_str) {
            self.model = model.to_string();
        }
        Ok(self.is_configured(true))
    }

    async fn invoke(&self, action: &str, args: &Args) -> anyhow::Result<Value> {
        self.table.dispatch(self, action, args).await
    }
}

/// Tool definitions offered to the model when picking a strategy action.
///
/// `strategies` maps each action name (underscored) to description lines.
pub fn strategy_tools(strategies: &Value) -> Value {
    let describe = |key: &str| -> String {
        match &strategies[key] {
            Value::Array(lines) => lines
                .iter()
                .filter_map(Value::as_str)
                .collect::<Vec<_>>()
                .join(" "),
            Value::String(line) => line.clone(),
            _ => String::new(),
        }
    };
    let tool = |name: &str, key: &str, properties: Value, required: &[&str]| {
        json!({
            "type": "function",
            "function": {
                "name": name,
                "description": describe(key),
                "parameters": {
                    "type": "object",
                    "properties": properties,
                    "required": required,
                    "additionalProperties": false,
                },
                "strict": true,
            }
        })
    };
    json!([
        tool(
            "swap-to-single",
            "swap_to_single",
            json!({
                "tokens_in": {"type": "array", "items": {"type": "string"}, "description": "Token addresses to sell. Each must be a supported token."},
                "token_out": {"type": "string", "description": "Token address to buy. Must be a supported token."},
            }),
            &["tokens_in", "token_out"],
        ),
        tool(
            "swap-to-many",
            "swap_to_many",
            json!({
                "token_in": {"type": "string", "description": "Token address to sell. Must be a supported token."},
                "tokens_out": {"type": "array", "items": {"type": "string"}, "description": "Token addresses to buy. Each must be a supported token."},
            }),
            &["token_in", "tokens_out"],
        ),
        tool(
            "adjust-split-ratio",
            "adjust_split_ratio",
            json!({
                "ratio": {"type": "array", "items": {"type": "number"}, "description": "Sum must always be 10000."},
            }),
            &["ratio"],
        ),
        tool(
            "none",
            "none",
            json!({
                "message": {"type": "string", "description": "The reason no action was taken."},
            }),
            &["message"],
        ),
    ])
}

/// First tool call of a completion as `{"name", "arguments"}`.
pub fn parse_tool_call(response: &Value) -> anyhow::Result<Value> {
    let function = &response["choices"][0]["message"]["tool_calls"][0]["function"];
    let name = function["name"]
        .as_str()
        .ok_or_else(|| anyhow!("completion has no tool call"))?;
    let arguments = match &function["arguments"] {
        Value::String(raw) if raw.trim().is_empty() => json!({}),
        Value::String(raw) => serde_json::from_str(raw).context("tool call arguments are not JSON")?,
        Value::Null => json!({}),
        other => other.clone(),
    };
    Ok(json!({"name": name, "arguments": arguments}))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider(api_key: Option<&str>) -> OpenAiCompatibleProvider {
        let mut config = ConnectionConfig::new("brain")
            .with_kind("hyperbolic")
            .with("model", "meta-llama/Llama-3.3-70B-Instruct");
        if let Some(key) = api_key {
            config = config.with("api_key", key);
        }
        OpenAiCompatibleProvider::new(&config, Preset::HYPERBOLIC).unwrap()
    }

    #[test]
    fn test_validate_config() {
        assert!(OpenAiCompatibleProvider::validate_config(&ConnectionConfig::new("xai")).is_err());
        let bad = ConnectionConfig::new("xai").with("model", 42);
        assert!(OpenAiCompatibleProvider::validate_config(&bad).is_err());
        let bad_key = ConnectionConfig::new("xai").with("model", "grok").with("api_key", true);
        assert!(OpenAiCompatibleProvider::validate_config(&bad_key).is_err());
    }

    #[test]
    fn test_registered_actions() {
        let names: Vec<_> = provider(Some("k")).actions().iter().map(|a| a.name.clone()).collect();
        assert_eq!(
            names,
            vec!["check-model", "generate-strategy-action", "generate-text", "list-models"]
        );
    }

    #[test]
    fn test_configured_with_inline_key() {
        let provider = provider(Some("sk-test"));
        assert!(provider.is_configured(false));
        assert_eq!(provider.base_url, "https://api.hyperbolic.xyz/v1");
    }

    #[tokio::test]
    async fn test_configure_sets_key() {
        let mut provider = provider(Some(""));
        provider.api_key = None;
        provider.preset.api_key_env = "AUTOLOOP_TEST_UNSET_KEY";
        assert!(!provider.is_configured(true));

        let mut params = Args::new();
        params.insert("api_key".into(), json!("sk-live"));
        assert!(provider.configure(params).await.unwrap());
    }

    #[tokio::test]
    async fn test_unconfigured_perform_fails_before_network() {
        let mut provider = provider(None);
        provider.preset.api_key_env = "AUTOLOOP_TEST_UNSET_KEY";
        let mut args = Args::new();
        args.insert("prompt".into(), json!("hello"));
        let err = provider.perform("generate-text", &args).await.unwrap_err();
        assert!(matches!(err, autoloop_core::Error::NotConfigured(_)));
    }

    #[test]
    fn test_strategy_tools_descriptions() {
        let strategies = json!({
            "swap_to_single": ["Sell everything", "into one token."],
            "none": "Do nothing.",
        });
        let tools = strategy_tools(&strategies);
        assert_eq!(tools.as_array().map(Vec::len), Some(4));
        assert_eq!(tools[0]["function"]["name"], "swap-to-single");
        assert_eq!(tools[0]["function"]["description"], "Sell everything into one token.");
        assert_eq!(tools[2]["function"]["description"], "");
        assert_eq!(tools[3]["function"]["description"], "Do nothing.");
    }

    #[test]
    fn test_parse_tool_call() {
        let response = json!({
            "choices": [{"message": {"tool_calls": [{"function": {
                "name": "adjust-split-ratio",
                "arguments": "{\"ratio\": [5000, 5000]}"
            }}]}}]
        });
        let call = parse_tool_call(&response).unwrap();
        assert_eq!(call["name"], "adjust-split-ratio");
        assert_eq!(call["arguments"]["ratio"], json!([5000, 5000]));
    }

    #[test]
    fn test_parse_tool_call_missing() {
        let response = json!({"choices": [{"message": {"content": "I refuse."}}]});
        assert!(parse_tool_call(&response).is_err());
    }
}
