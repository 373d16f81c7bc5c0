//! # Directory
//!
//! Connection directory: resolves a tenant's audience into delivery targets and
//! lists the configured peer servers.
//!
//! Responsibilities:
//! - Build filtered scans over the users / servers / chat-config tables
//! - Follow continuation tokens until the store reports the last page
//! - Skip malformed records instead of failing the whole lookup
//!
//! Stores:
//! - [`DynamoScanStore`]: DynamoDB scans through the AWS SDK
//! - [`MemoryStore`]: in-process tables with fixed-size pages

pub mod directory;
pub mod dynamo;
pub mod error;
pub mod memory;

pub use contracts::{RecordStore, ScanPage, ScanQuery};
pub use directory::{ConnectionDirectory, DirectoryTables};
pub use dynamo::DynamoScanStore;
pub use error::DirectoryError;
pub use memory::MemoryStore;
