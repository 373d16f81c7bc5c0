//! In-memory record store
//!
//! Serves fixed tables with real pagination. Used by the tests and by
//! `serve --dry-run` style wiring where no directory is reachable.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use contracts::{ContinuationToken, ContractError, Record, RecordStore, ScanPage, ScanQuery};
use serde_json::Value;

/// Table contents held in memory, paged `page_size` records at a time
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: HashMap<String, Vec<Record>>,
    page_size: usize,
    scans: AtomicUsize,
}

impl MemoryStore {
    /// Create an empty store; a `page_size` of zero is treated as one
    pub fn new(page_size: usize) -> Self {
        Self {
            tables: HashMap::new(),
            page_size: page_size.max(1),
            scans: AtomicUsize::new(0),
        }
    }

    /// Add a table; non-object values are ignored
    pub fn with_table(
        mut self,
        name: impl Into<String>,
        records: impl IntoIterator<Item = Value>,
    ) -> Self {
        let records = records
            .into_iter()
            .filter_map(|value| match value {
                Value::Object(map) => Some(map),
                _ => None,
            })
            .collect();
        self.tables.insert(name.into(), records);
        self
    }

    /// Number of pages served so far
    pub fn scan_count(&self) -> usize {
        self.scans.load(Ordering::Relaxed)
    }
}

impl RecordStore for MemoryStore {
    async fn scan_page(
        &self,
        query: &ScanQuery,
        start: Option<&ContinuationToken>,
    ) -> Result<ScanPage, ContractError> {
        self.scans.fetch_add(1, Ordering::Relaxed);

        let table = self
            .tables
            .get(&query.table)
            .ok_or_else(|| ContractError::directory_page(&query.table, "table not found"))?;

        let offset = match start {
            None => 0,
            Some(ContinuationToken(token)) => token
                .as_u64()
                .and_then(|n| usize::try_from(n).ok())
                .ok_or_else(|| {
                    ContractError::directory_page(&query.table, "invalid continuation token")
                })?,
        };
        let page_size = query
            .limit
            .and_then(|n| usize::try_from(n).ok())
            .unwrap_or(self.page_size)
            .max(1);
        let end = (offset + page_size).min(table.len());

        // Filter after paging, like a store-side scan with a filter expression
        let records = table
            .iter()
            .skip(offset)
            .take(page_size)
            .filter(|record| query.matches(record))
            .map(|record| query.project(record))
            .collect();

        let continuation = (end < table.len()).then(|| ContinuationToken(Value::from(end)));
        Ok(ScanPage {
            records,
            continuation,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_pages_until_exhausted() {
        let store = MemoryStore::new(2).with_table(
            "t",
            vec![json!({"k": 1}), json!({"k": 2}), json!({"k": 3})],
        );
        let query = ScanQuery::new("t");

        let first = store.scan_page(&query, None).await.unwrap();
        assert_eq!(first.records.len(), 2);
        let token = first.continuation.unwrap();

        let second = store.scan_page(&query, Some(&token)).await.unwrap();
        assert_eq!(second.records.len(), 1);
        assert!(second.continuation.is_none());
        assert_eq!(store.scan_count(), 2);
    }

    #[tokio::test]
    async fn test_filtered_page_may_be_empty_but_continues() {
        let store = MemoryStore::new(1).with_table(
            "t",
            vec![json!({"k": "no"}), json!({"k": "yes"})],
        );
        let query = ScanQuery::new("t").with_condition("k", "yes");

        let first = store.scan_page(&query, None).await.unwrap();
        assert!(first.records.is_empty());
        assert!(first.continuation.is_some());
    }

    #[tokio::test]
    async fn test_query_limit_overrides_page_size() {
        let store = MemoryStore::new(10).with_table("t", (0..5).map(|i| json!({"k": i})));
        let query = ScanQuery::new("t").with_limit(Some(3));
        let page = store.scan_page(&query, None).await.unwrap();
        assert_eq!(page.records.len(), 3);
    }

    #[tokio::test]
    async fn test_unknown_table() {
        let store = MemoryStore::new(10);
        let err = store.scan_page(&ScanQuery::new("nope"), None).await.unwrap_err();
        assert!(err.to_string().contains("nope"));
    }
}
