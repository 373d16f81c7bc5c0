//! ConnectionDirectory - paginated target and peer resolution

use contracts::{
    AudienceSelector, ContinuationToken, DeliveryTarget, DirectoryConfig, PeerServer, PeerSet,
    Record, RecordStore, ScanQuery,
};
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use crate::error::DirectoryError;

/// Users table: connection handle
pub const CONNECTION_ID: &str = "connection_id";
/// Users table: owning tenant
pub const EVENT_SUBDOMAIN: &str = "event_subdomain";
/// Users table: privileged-audience flag
pub const IS_ORGANIZER: &str = "is_organizer";
/// Servers table: peer address
pub const SERVER_ADDRESS: &str = "ip";
/// Servers table: peer port
pub const SERVER_PORT: &str = "port";
/// Chat-config table: key attribute and the key of the chat-type record
pub const CONFIG_LABEL: &str = "label";
pub const CHAT_TYPE_LABEL: &str = "chat-type";
/// Chat-config table: value attribute
pub const CONFIG_VALUE: &str = "value";

/// Table names the directory scans
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryTables {
    pub users: String,
    pub servers: String,
    pub chat_config: String,
}

impl From<&DirectoryConfig> for DirectoryTables {
    fn from(config: &DirectoryConfig) -> Self {
        Self {
            users: config.users_table.clone(),
            servers: config.servers_table.clone(),
            chat_config: config.chat_config_table.clone(),
        }
    }
}

/// Connection directory over a paginated record store
pub struct ConnectionDirectory<S> {
    store: S,
    tables: DirectoryTables,
    page_size: Option<u32>,
}

impl<S> ConnectionDirectory<S> {
    /// Create a directory over `store`
    pub fn new(store: S, tables: DirectoryTables) -> Self {
        Self {
            store,
            tables,
            page_size: None,
        }
    }

    /// Create a directory from configuration
    pub fn from_config(store: S, config: &DirectoryConfig) -> Self {
        Self::new(store, DirectoryTables::from(config)).with_page_size(config.page_size)
    }

    /// Set the page size hint passed to every scan
    pub fn with_page_size(mut self, page_size: Option<u32>) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn tables(&self) -> &DirectoryTables {
        &self.tables
    }
}

impl<S: RecordStore + Sync> ConnectionDirectory<S> {
    /// Resolve every connection of `tenant_key` matching `audience`
    ///
    /// Records without a string `connection_id` are skipped.
    ///
    /// # Errors
    /// Any failed page aborts the whole resolution.
    #[instrument(
        name = "directory_resolve_targets",
        skip(self),
        fields(table = %self.tables.users, audience = audience.as_str())
    )]
    pub async fn resolve_targets(
        &self,
        tenant_key: &str,
        audience: AudienceSelector,
    ) -> Result<Vec<DeliveryTarget>, DirectoryError> {
        let mut query =
            ScanQuery::new(&self.tables.users).with_condition(EVENT_SUBDOMAIN, tenant_key);
        if let Some(privileged) = audience.privileged_flag() {
            query = query.with_condition(IS_ORGANIZER, privileged);
        }
        let query = query
            .with_projection(&[CONNECTION_ID])
            .with_limit(self.page_size);

        let records = self.scan_all(&query).await?;
        let total = records.len();
        let targets: Vec<DeliveryTarget> = records
            .iter()
            .filter_map(|record| record.get(CONNECTION_ID).and_then(Value::as_str))
            .map(DeliveryTarget::from)
            .collect();

        if targets.len() < total {
            warn!(
                skipped = total - targets.len(),
                "records without connection_id skipped"
            );
        }
        info!(tenant = tenant_key, connections = targets.len(), "connections resolved");
        Ok(targets)
    }

    /// Resolve the configured peer servers
    ///
    /// Entries with an empty address or a non-positive port are skipped.
    ///
    /// # Errors
    /// Any failed page aborts the whole resolution.
    #[instrument(
        name = "directory_resolve_peers",
        skip(self),
        fields(table = %self.tables.servers)
    )]
    pub async fn resolve_peers(&self) -> Result<PeerSet, DirectoryError> {
        let query = ScanQuery::new(&self.tables.servers)
            .with_projection(&[SERVER_ADDRESS, SERVER_PORT])
            .with_limit(self.page_size);

        let records = self.scan_all(&query).await?;
        let mut peers = PeerSet::new();
        for record in &records {
            match peer_from_record(record) {
                Some(peer) => peers.insert(peer),
                None => warn!(record = ?record, "malformed peer entry skipped"),
            }
        }

        info!(peers = peers.len(), "peer servers resolved");
        Ok(peers)
    }

    /// Look up the configured chat type
    ///
    /// # Errors
    /// Scan failure, or [`DirectoryError::NoChatType`] when no record carries a value.
    #[instrument(
        name = "directory_resolve_chat_type",
        skip(self),
        fields(table = %self.tables.chat_config)
    )]
    pub async fn resolve_chat_type(&self) -> Result<String, DirectoryError> {
        let query = ScanQuery::new(&self.tables.chat_config)
            .with_condition(CONFIG_LABEL, CHAT_TYPE_LABEL)
            .with_projection(&[CONFIG_VALUE])
            .with_limit(self.page_size);

        let records = self.scan_all(&query).await?;
        records
            .iter()
            .find_map(|record| record.get(CONFIG_VALUE).and_then(Value::as_str))
            .map(str::to_string)
            .ok_or_else(|| DirectoryError::NoChatType {
                table: self.tables.chat_config.clone(),
            })
    }

    /// Scan every page of `query`, accumulating records in page order
    async fn scan_all(&self, query: &ScanQuery) -> Result<Vec<Record>, DirectoryError> {
        let mut records = Vec::new();
        let mut start: Option<ContinuationToken> = None;
        let mut page = 0usize;

        loop {
            let result = self
                .store
                .scan_page(query, start.as_ref())
                .await
                .map_err(|e| DirectoryError::scan(&query.table, page, e))?;

            debug!(
                table = %query.table,
                page,
                records = result.records.len(),
                more = result.continuation.is_some(),
                "Scan page received"
            );

            records.extend(result.records);
            page += 1;

            match result.continuation {
                Some(token) => start = Some(token),
                None => break,
            }
        }

        Ok(records)
    }
}

/// Peer from an `{ip, port}` record; the port may be a number or a numeric string
fn peer_from_record(record: &Record) -> Option<PeerServer> {
    let address = record.get(SERVER_ADDRESS)?.as_str()?;
    let port = match record.get(SERVER_PORT)? {
        Value::Number(n) => n.as_i64()?,
        Value::String(s) => s.trim().parse().ok()?,
        _ => return None,
    };
    PeerServer::new(address, port)
}
