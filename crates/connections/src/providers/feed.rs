//! Read-only timeline and message feed.

use anyhow::{anyhow, Context};
use async_trait::async_trait;
use futures::future::BoxFuture;
use serde_json::Value;

use autoloop_core::types::{Args, ConnectionConfig};
use autoloop_core::Result;

use super::http_client;
use crate::action::{Action, ActionParameter, ParamType};
use crate::provider::{arg_str, require_str, ActionTable, CapabilityProvider};

const DEFAULT_COUNT: u64 = 10;

pub struct FeedProvider {
    name: String,
    url: String,
    client: reqwest::Client,
    table: ActionTable<Self>,
}

impl FeedProvider {
    pub fn new(config: &ConnectionConfig) -> Result<Self> {
        Self::validate_config(config)?;
        let mut table = ActionTable::new();
        table
            .register(
                Action::new("read-timeline", "Read the most recent timeline entries").param(
                    ActionParameter::optional("count", ParamType::Integer, "Number of entries"),
                ),
                Self::read_timeline,
            )
            .register(
                Action::new("read-messages", "Read recent messages from a channel").param(
                    ActionParameter::required("channel", ParamType::String, "Channel id"),
                ),
                Self::read_messages,
            );
        Ok(Self {
            name: config.name.clone(),
            url: require_str(config, "url")?.trim_end_matches('/').to_string(),
            client: http_client()?,
            table,
        })
    }

    pub fn validate_config(config: &ConnectionConfig) -> Result<()> {
        require_str(config, "url")?;
        Ok(())
    }

    async fn fetch(&self, path: &str, query: &[(&str, String)]) -> anyhow::Result<Value> {
        let body: Value = self
            .client
            .get(format!("{}/{path}", self.url))
            .query(query)
            .send()
            .await
            .with_context(|| format!("feed request to {path} failed"))?
            .error_for_status()?
            .json()
            .await
            .context("invalid feed response")?;
        entries(body)
    }

    fn read_timeline<'a>(&'a self, args: &'a Args) -> BoxFuture<'a, anyhow::Result<Value>> {
        Box::pin(async move {
            let count = args
                .get("count")
                .and_then(Value::as_u64)
                .unwrap_or(DEFAULT_COUNT);
            self.fetch("timeline", &[("count", count.to_string())]).await
        })
    }

    fn read_messages<'a>(&'a self, args: &'a Args) -> BoxFuture<'a, anyhow::Result<Value>> {
        Box::pin(async move {
            let channel = arg_str(args, "channel").unwrap_or_default();
            self.fetch("messages", &[("channel", channel.to_string())])
                .await
        })
    }
}

/// Normalize a feed body to a JSON array: bare arrays or `{"data": [...]}`.
fn entries(body: Value) -> anyhow::Result<Value> {
    match body {
        Value::Array(_) => Ok(body),
        Value::Object(mut map) => match map.remove("data") {
            Some(data @ Value::Array(_)) => Ok(data),
            _ => Err(anyhow!("feed response has no entry list")),
        },
        _ => Err(anyhow!("feed response has no entry list")),
    }
}

#[async_trait]
impl CapabilityProvider for FeedProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn action(&self, name: &str) -> Option<&Action> {
        self.table.get(name)
    }

    fn actions(&self) -> Vec<&Action> {
        self.table.actions()
    }

    fn is_configured(&self, _verbose: bool) -> bool {
        true
    }

    async fn configure(&mut self, params: Args) -> Result<bool> {
        if let Some(url) = params.get("url").and_then(Value::as_str) {
            self.url = url.trim_end_matches('/').to_string();
        }
        Ok(true)
    }

    async fn invoke(&self, action: &str, args: &Args) -> anyhow::Result<Value> {
        self.table.dispatch(self, action, args).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_requires_url() {
        assert!(FeedProvider::new(&ConnectionConfig::new("feed")).is_err());
        let provider =
            FeedProvider::new(&ConnectionConfig::new("feed").with("url", "http://localhost/")).unwrap();
        assert_eq!(provider.url, "http://localhost");
        assert_eq!(provider.actions().len(), 2);
    }

    #[test]
    fn test_entries_shapes() {
        assert_eq!(entries(json!([1, 2])).unwrap(), json!([1, 2]));
        assert_eq!(entries(json!({"data": ["a"]})).unwrap(), json!(["a"]));
        assert!(entries(json!({"data": "a"})).is_err());
        assert!(entries(json!("a")).is_err());
    }

    #[tokio::test]
    async fn test_read_messages_needs_channel() {
        let provider =
            FeedProvider::new(&ConnectionConfig::new("feed").with("url", "http://localhost")).unwrap();
        let err = provider.perform("read-messages", &Args::new()).await.unwrap_err();
        assert!(matches!(err, autoloop_core::Error::InvalidParameters { .. }));
    }
}
