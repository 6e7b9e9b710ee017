//! Process configuration: optional YAML file, then environment overrides.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Runtime settings of the `autoloop` binary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Listen address of the control surface.
    pub addr: String,
    /// Directory of `<id>.json` agent definitions.
    pub agents_dir: PathBuf,
    /// Seconds `stop` waits for a worker before aborting it.
    pub stop_timeout_secs: u64,
    /// Agents loaded and started at boot.
    pub autostart: Vec<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            addr: "0.0.0.0:8000".to_string(),
            agents_dir: PathBuf::from("agents"),
            stop_timeout_secs: 5,
            autostart: Vec::new(),
        }
    }
}

impl AppConfig {
    /// Load from `AUTOLOOP_CONFIG` when set, then apply `AUTOLOOP_*` overrides.
    pub fn load() -> Result<Self> {
        let base = match std::env::var("AUTOLOOP_CONFIG") {
            Ok(path) => {
                let raw = std::fs::read_to_string(&path)
                    .with_context(|| format!("failed to read config file {path}"))?;
                Self::from_yaml(&raw).with_context(|| format!("invalid config file {path}"))?
            }
            Err(_) => Self::default(),
        };
        base.with_overrides(|key| std::env::var(key).ok())
    }

    pub fn from_yaml(raw: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(raw)?)
    }

    /// Apply overrides read through `lookup`.
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        if let Some(addr) = lookup("AUTOLOOP_ADDR") {
            self.addr = addr;
        }
        if let Some(dir) = lookup("AUTOLOOP_AGENTS_DIR") {
            self.agents_dir = PathBuf::from(dir);
        }
        if let Some(secs) = lookup("AUTOLOOP_STOP_TIMEOUT_SECS") {
            self.stop_timeout_secs = secs
                .trim()
                .parse()
                .with_context(|| format!("invalid AUTOLOOP_STOP_TIMEOUT_SECS '{secs}'"))?;
        }
        if let Some(ids) = lookup("AUTOLOOP_AUTOSTART") {
            self.autostart = ids
                .split(',')
                .map(str::trim)
                .filter(|id| !id.is_empty())
                .map(String::from)
                .collect();
        }
        Ok(self)
    }

    pub fn stop_timeout(&self) -> Duration {
        Duration::from_secs(self.stop_timeout_secs)
    }
}
