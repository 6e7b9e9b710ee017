//! Traits for the runtime's external collaborators.
//!
//! Implementations are constructed once at process start and injected into
//! the supervisor; nothing in the runtime reaches a global client.

use async_trait::async_trait;
use chrono::Timelike;
use serde_json::Value;

use crate::types::AgentDefinition;
use crate::Result;

/// Pagination for [`PersistenceSink::find`]. Pages start at 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub page: usize,
    pub limit: usize,
}

impl Page {
    /// Number of records skipped before this page.
    pub fn offset(&self) -> usize {
        self.page.saturating_sub(1).saturating_mul(self.limit)
    }
}

impl Default for Page {
    fn default() -> Self {
        Self { page: 1, limit: 10 }
    }
}

/// Document-style persistence sink.
///
/// Filters are JSON objects matched field-by-field for equality. Implementations
/// must accept concurrent writers from any number of agent workers.
#[async_trait]
pub trait PersistenceSink: Send + Sync {
    /// Append a record to a collection.
    async fn insert(&self, collection: &str, record: Value) -> Result<()>;

    /// Merge `patch` into every record matching `filter`. Returns the match count.
    async fn update(&self, collection: &str, filter: Value, patch: Value) -> Result<u64>;

    /// Records matching `filter`, optionally sorted descending by `sort_desc`.
    async fn find(
        &self,
        collection: &str,
        filter: Value,
        sort_desc: Option<&str>,
        page: Page,
    ) -> Result<Vec<Value>>;
}

/// Source of agent definitions.
#[async_trait]
pub trait AgentSource: Send + Sync {
    /// Fetch the definition for `id`.
    async fn fetch(&self, id: &str) -> Result<AgentDefinition>;

    /// Store a definition and return its id.
    async fn create(&self, definition: AgentDefinition) -> Result<String>;
}

/// Wall clock reading used by the decision step.
pub trait Clock: Send + Sync {
    /// Local hour of day, 0..=23.
    fn hour(&self) -> u32;
}

/// Local system time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn hour(&self) -> u32 {
        chrono::Local::now().hour()
    }
}

/// Clock pinned to one hour.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub u32);

impl Clock for FixedClock {
    fn hour(&self) -> u32 {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_offset() {
        assert_eq!(Page::default().offset(), 0);
        assert_eq!(Page { page: 3, limit: 20 }.offset(), 40);
        assert_eq!(Page { page: 0, limit: 20 }.offset(), 0);
        assert_eq!(Page { page: usize::MAX, limit: 100 }.offset(), usize::MAX);
    }

    #[test]
    fn test_clocks() {
        assert_eq!(FixedClock(14).hour(), 14);
        assert!(SystemClock.hour() < 24);
    }
}
