//! Definition source backed by a directory of JSON files.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;

use autoloop_core::traits::AgentSource;
use autoloop_core::types::AgentDefinition;
use autoloop_core::{Error, Result};

/// Reads and writes `<dir>/<id>.json`.
#[derive(Debug, Clone)]
pub struct FileAgentSource {
    dir: PathBuf,
}

impl FileAgentSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, id: &str) -> Result<PathBuf> {
        let valid = !id.is_empty()
            && !id.starts_with('.')
            && id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
        if !valid {
            return Err(Error::config(format!("invalid agent id '{id}'")));
        }
        Ok(self.dir.join(format!("{id}.json")))
    }
}

#[async_trait]
impl AgentSource for FileAgentSource {
    async fn fetch(&self, id: &str) -> Result<AgentDefinition> {
        let path = self.path_for(id)?;
        let raw = tokio::fs::read_to_string(&path).await.map_err(|e| {
            Error::persistence(format!("failed to read {}: {e}", path.display()))
        })?;
        let definition: AgentDefinition = serde_json::from_str(&raw)
            .map_err(|e| Error::config(format!("invalid definition in {}: {e}", path.display())))?;
        if definition.id != id {
            return Err(Error::config(format!(
                "{} declares id '{}'",
                path.display(),
                definition.id
            )));
        }
        tracing::debug!(agent_id = %id, path = %path.display(), "Loaded agent definition");
        Ok(definition)
    }

    async fn create(&self, definition: AgentDefinition) -> Result<String> {
        let path = self.path_for(&definition.id)?;
        let body = serde_json::to_vec_pretty(&definition)?;

        tokio::fs::create_dir_all(&self.dir).await.map_err(|e| {
            Error::persistence(format!("failed to create {}: {e}", self.dir.display()))
        })?;
        let mut file = tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
            .map_err(|e| match e.kind() {
                ErrorKind::AlreadyExists => Error::persistence(format!(
                    "definition for agent '{}' already exists",
                    definition.id
                )),
                _ => Error::persistence(format!("failed to create {}: {e}", path.display())),
            })?;
        file.write_all(&body)
            .await
            .map_err(|e| Error::persistence(format!("failed to write {}: {e}", path.display())))?;
        file.flush()
            .await
            .map_err(|e| Error::persistence(format!("failed to write {}: {e}", path.display())))?;

        tracing::info!(agent_id = %definition.id, path = %path.display(), "Stored agent definition");
        Ok(definition.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use autoloop_core::types::TaskSpec;

    fn temp_dir() -> PathBuf {
        std::env::temp_dir().join(format!("autoloop-agents-{}", uuid::Uuid::new_v4()))
    }

    fn definition(id: &str) -> AgentDefinition {
        serde_json::from_value(serde_json::json!({
            "id": id,
            "name": "Edgar",
            "loop_delay": 900,
            "config": [{"name": "xai", "model": "grok-2"}],
            "tasks": [{"name": "execute-strategy", "weight": 1}]
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn test_create_then_fetch() {
        let dir = temp_dir();
        let source = FileAgentSource::new(&dir);

        assert_eq!(source.create(definition("edgar")).await.unwrap(), "edgar");
        assert!(dir.join("edgar.json").exists());
        let fetched = source.fetch("edgar").await.unwrap();
        assert_eq!(fetched.tasks, vec![TaskSpec::new("execute-strategy", 1.0)]);

        assert!(source.create(definition("edgar")).await.is_err());
        let _ = tokio::fs::remove_dir_all(&dir).await;
    }

    #[tokio::test]
    async fn test_missing_and_malformed() {
        let dir = temp_dir();
        tokio::fs::create_dir_all(&dir).await.unwrap();
        let source = FileAgentSource::new(&dir);

        assert!(matches!(source.fetch("ghost").await, Err(Error::Persistence(_))));

        tokio::fs::write(dir.join("broken.json"), r#"{"id": "broken", "name": "B"}"#)
            .await
            .unwrap();
        assert!(matches!(source.fetch("broken").await, Err(Error::Configuration(_))));

        let other = serde_json::to_vec(&definition("other")).unwrap();
        tokio::fs::write(dir.join("alias.json"), other).await.unwrap();
        assert!(matches!(source.fetch("alias").await, Err(Error::Configuration(_))));

        let _ = tokio::fs::remove_dir_all(&dir).await;
    }

    #[tokio::test]
    async fn test_rejects_path_like_ids() {
        let source = FileAgentSource::new(temp_dir());
        for id in ["", "../etc/passwd", ".hidden", "a/b"] {
            assert!(matches!(source.fetch(id).await, Err(Error::Configuration(_))), "{id}");
        }
    }
}
