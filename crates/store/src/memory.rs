//! In-memory sink and definition source.

use std::cmp::Ordering;

use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::Value;

use autoloop_core::traits::{AgentSource, Page, PersistenceSink};
use autoloop_core::types::AgentDefinition;
use autoloop_core::{Error, Result};

/// Document collections kept in process memory.
#[derive(Debug, Default)]
pub struct InMemorySink {
    collections: DashMap<String, Vec<Value>>,
}

impl InMemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records in `collection`.
    pub fn len(&self, collection: &str) -> usize {
        self.collections.get(collection).map_or(0, |c| c.len())
    }
}

/// Field-by-field equality against a filter object. `{}` or `null` match everything.
fn matches(record: &Value, filter: &Value) -> bool {
    match filter {
        Value::Null => true,
        Value::Object(fields) => fields.iter().all(|(k, v)| record.get(k) == Some(v)),
        _ => false,
    }
}

/// Order two JSON values for sorting: numbers numerically, strings lexically.
fn compare(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Null, Value::Null) => Ordering::Equal,
        (Value::Null, _) => Ordering::Less,
        (_, Value::Null) => Ordering::Greater,
        _ => Ordering::Equal,
    }
}

#[async_trait]
impl PersistenceSink for InMemorySink {
    async fn insert(&self, collection: &str, record: Value) -> Result<()> {
        if !record.is_object() {
            return Err(Error::persistence("records must be JSON objects"));
        }
        self.collections
            .entry(collection.to_string())
            .or_default()
            .push(record);
        Ok(())
    }

    async fn update(&self, collection: &str, filter: Value, patch: Value) -> Result<u64> {
        let Value::Object(patch) = patch else {
            return Err(Error::persistence("update patch must be a JSON object"));
        };
        let Some(mut records) = self.collections.get_mut(collection) else {
            return Ok(0);
        };
        let mut matched = 0;
        for record in records.iter_mut().filter(|r| matches(r, &filter)) {
            if let Value::Object(fields) = record {
                for (k, v) in &patch {
                    fields.insert(k.clone(), v.clone());
                }
            }
            matched += 1;
        }
        Ok(matched)
    }

    async fn find(
        &self,
        collection: &str,
        filter: Value,
        sort_desc: Option<&str>,
        page: Page,
    ) -> Result<Vec<Value>> {
        let mut found: Vec<Value> = match self.collections.get(collection) {
            Some(records) => records
                .iter()
                .filter(|r| matches(r, &filter))
                .cloned()
                .collect(),
            None => return Ok(Vec::new()),
        };
        if let Some(field) = sort_desc {
            found.sort_by(|a, b| compare(&b[field], &a[field]));
        }
        Ok(found
            .into_iter()
            .skip(page.offset())
            .take(page.limit)
            .collect())
    }
}

/// Definitions kept in process memory.
#[derive(Debug, Default)]
pub struct InMemoryAgentSource {
    definitions: DashMap<String, AgentDefinition>,
}

impl InMemoryAgentSource {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AgentSource for InMemoryAgentSource {
    async fn fetch(&self, id: &str) -> Result<AgentDefinition> {
        self.definitions
            .get(id)
            .map(|d| d.value().clone())
            .ok_or_else(|| Error::persistence(format!("no definition for agent '{id}'")))
    }

    async fn create(&self, definition: AgentDefinition) -> Result<String> {
        let id = definition.id.clone();
        match self.definitions.entry(id.clone()) {
            dashmap::mapref::entry::Entry::Occupied(_) => Err(Error::persistence(format!(
                "definition for agent '{id}' already exists"
            ))),
            dashmap::mapref::entry::Entry::Vacant(slot) => {
                slot.insert(definition);
                Ok(id)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_find_filters_sorts_and_pages() {
        let sink = InMemorySink::new();
        for (initiator, ts) in [("a", 1), ("b", 2), ("a", 3), ("a", 2)] {
            sink.insert("activities", json!({"initiator": initiator, "timestamp": ts}))
                .await
                .unwrap();
        }

        let newest = sink
            .find("activities", json!({"initiator": "a"}), Some("timestamp"), Page::default())
            .await
            .unwrap();
        let stamps: Vec<_> = newest.iter().map(|r| r["timestamp"].clone()).collect();
        assert_eq!(stamps, vec![json!(3), json!(2), json!(1)]);

        let second = sink
            .find("activities", json!({}), Some("timestamp"), Page { page: 2, limit: 3 })
            .await
            .unwrap();
        assert_eq!(second.len(), 1);
        assert_eq!(second[0]["timestamp"], 1);

        assert!(sink
            .find("missing", json!({}), None, Page::default())
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_update_merges_patch() {
        let sink = InMemorySink::new();
        sink.insert("agents", json!({"id": "x", "status": "loaded"})).await.unwrap();
        sink.insert("agents", json!({"id": "y", "status": "loaded"})).await.unwrap();

        let matched = sink
            .update("agents", json!({"id": "x"}), json!({"status": "running"}))
            .await
            .unwrap();
        assert_eq!(matched, 1);

        let docs = sink
            .find("agents", json!({"status": "running"}), None, Page::default())
            .await
            .unwrap();
        assert_eq!(docs, vec![json!({"id": "x", "status": "running"})]);
        assert_eq!(sink.update("nope", json!({}), json!({})).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_rejects_non_object_records() {
        let sink = InMemorySink::new();
        assert!(sink.insert("agents", json!("x")).await.is_err());
        assert!(sink.update("agents", json!({}), json!(1)).await.is_err());
    }

    #[tokio::test]
    async fn test_concurrent_inserts() {
        let sink = Arc::new(InMemorySink::new());
        let writers: Vec<_> = (0..8)
            .map(|n| {
                let sink = sink.clone();
                tokio::spawn(async move {
                    for i in 0..50 {
                        sink.insert("activities", json!({"writer": n, "i": i}))
                            .await
                            .unwrap();
                    }
                })
            })
            .collect();
        for writer in writers {
            writer.await.unwrap();
        }
        assert_eq!(sink.len("activities"), 400);
    }

    #[tokio::test]
    async fn test_agent_source_roundtrip() {
        let source = InMemoryAgentSource::new();
        let definition: AgentDefinition = serde_json::from_value(json!({
            "id": "edgar",
            "name": "Edgar",
            "loop_delay": 5,
            "config": [],
            "tasks": [{"name": "none", "weight": 1}]
        }))
        .unwrap();

        assert_eq!(source.create(definition.clone()).await.unwrap(), "edgar");
        assert!(source.create(definition.clone()).await.is_err());
        assert_eq!(source.fetch("edgar").await.unwrap(), definition);
        assert!(source.fetch("ghost").await.is_err());
    }
}
