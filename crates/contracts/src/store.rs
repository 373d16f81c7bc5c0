//! RecordStore trait - paginated key-value query service
//!
//! The directory only ever issues filtered scans and follows continuation
//! tokens until the store reports none.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::ContractError;

/// One stored item: attribute name -> value
pub type Record = Map<String, Value>;

/// Equality condition on a single attribute
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    pub attribute: String,
    pub value: Value,
}

/// A filtered, projected scan over one table
///
/// Conditions are combined with AND. An empty projection returns whole records.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScanQuery {
    pub table: String,
    pub filter: Vec<Condition>,
    pub projection: Vec<String>,
    /// Store-side page size hint
    pub limit: Option<u32>,
}

impl ScanQuery {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            ..Default::default()
        }
    }

    /// Add an equality condition
    pub fn with_condition(mut self, attribute: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filter.push(Condition {
            attribute: attribute.into(),
            value: value.into(),
        });
        self
    }

    /// Restrict returned attributes
    pub fn with_projection(mut self, attributes: &[&str]) -> Self {
        self.projection = attributes.iter().map(|a| a.to_string()).collect();
        self
    }

    pub fn with_limit(mut self, limit: Option<u32>) -> Self {
        self.limit = limit;
        self
    }

    /// Check a record against every condition
    pub fn matches(&self, record: &Record) -> bool {
        self.filter
            .iter()
            .all(|c| record.get(&c.attribute) == Some(&c.value))
    }

    /// Apply the projection to a record
    pub fn project(&self, record: &Record) -> Record {
        if self.projection.is_empty() {
            return record.clone();
        }
        self.projection
            .iter()
            .filter_map(|name| record.get(name).map(|v| (name.clone(), v.clone())))
            .collect()
    }
}

/// Opaque position to resume a scan from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContinuationToken(pub Value);

/// One page of scan results
#[derive(Debug, Clone, Default)]
pub struct ScanPage {
    pub records: Vec<Record>,
    /// `Some` while more pages remain
    pub continuation: Option<ContinuationToken>,
}

/// Paginated query service behind the connection directory
#[trait_variant::make(RecordStore: Send)]
pub trait LocalRecordStore {
    /// Fetch one page of `query`, starting after `start` when given
    ///
    /// # Errors
    /// Returns the store failure for this page
    async fn scan_page(
        &self,
        query: &ScanQuery,
        start: Option<&ContinuationToken>,
    ) -> Result<ScanPage, ContractError>;
}
