//! Directory error types

use contracts::ContractError;
use thiserror::Error;

/// Directory-specific errors
#[derive(Debug, Error)]
pub enum DirectoryError {
    /// A page of the scan failed; no partial result is returned
    #[error("scan of '{table}' failed on page {page}: {source}")]
    Scan {
        table: String,
        page: usize,
        #[source]
        source: ContractError,
    },

    /// Chat-config table has no chat-type record
    #[error("no config for chat type found in '{table}'")]
    NoChatType { table: String },
}

impl DirectoryError {
    /// Create a scan error
    pub fn scan(table: impl Into<String>, page: usize, source: ContractError) -> Self {
        Self::Scan {
            table: table.into(),
            page,
            source,
        }
    }
}
