//! Built-in capability providers.

mod chain;
mod feed;
mod openai;

pub use chain::{ChainProvider, StrategyKind};
pub use feed::FeedProvider;
pub use openai::{parse_tool_call, strategy_tools, OpenAiCompatibleProvider, Preset};

use std::time::Duration;

use autoloop_core::{Error, Result};

/// Per-request timeout for provider HTTP calls.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

fn http_client() -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .build()
        .map_err(|e| Error::config(format!("failed to build HTTP client: {e}")))
}

/// Treat blank strings as unset.
fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
