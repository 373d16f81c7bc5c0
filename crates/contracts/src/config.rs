//! DispatcherConfig - Config Loader output
//!
//! Built once at startup and injected into the directory, sinks and ingress.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::ContractError;

/// Complete service configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct DispatcherConfig {
    /// Connection directory (key-value store) settings
    #[serde(default, alias = "dynamodb")]
    #[validate(nested)]
    pub directory: DirectoryConfig,

    /// Invocation backend settings
    #[serde(default, alias = "lambda")]
    #[validate(nested)]
    pub invocation: InvocationConfig,

    /// Peer-broadcast backend settings
    #[serde(default)]
    #[validate(nested)]
    pub broadcast: BroadcastConfig,

    /// Inbound HTTP listener settings
    #[serde(default)]
    #[validate(nested)]
    pub http: HttpConfig,
}

/// Directory tables and endpoint
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct DirectoryConfig {
    #[serde(default = "default_region")]
    #[validate(length(min = 1, message = "empty dynamo region"))]
    pub region: String,

    /// Endpoint override for local or mock services
    #[serde(default)]
    #[validate(url(message = "endpoint must be a URL"))]
    pub endpoint: Option<String>,

    #[serde(default = "default_users_table", alias = "users-table")]
    #[validate(length(min = 1, message = "missing users table"))]
    pub users_table: String,

    #[serde(default = "default_servers_table", alias = "servers-table")]
    #[validate(length(min = 1, message = "missing servers table"))]
    pub servers_table: String,

    #[serde(default = "default_chat_config_table", alias = "chat-config-table")]
    #[validate(length(min = 1, message = "missing chat config table"))]
    pub chat_config_table: String,

    /// Page size hint for scans (None = store default)
    #[serde(default, alias = "page-size")]
    #[validate(range(min = 1))]
    pub page_size: Option<u32>,
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self {
            region: default_region(),
            endpoint: None,
            users_table: default_users_table(),
            servers_table: default_servers_table(),
            chat_config_table: default_chat_config_table(),
            page_size: None,
        }
    }
}

/// Invocation backend function and batching policy
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct InvocationConfig {
    #[serde(default = "default_region")]
    #[validate(length(min = 1, message = "empty lambda region"))]
    pub region: String,

    /// Function receiving batches (required)
    #[serde(default)]
    #[validate(length(min = 1, message = "lambda function is not set"))]
    pub function: String,

    /// Endpoint override for local or mock services
    #[serde(default)]
    #[validate(url(message = "endpoint must be a URL"))]
    pub endpoint: Option<String>,

    /// Maximum targets per call
    #[serde(default = "default_batch_limit", alias = "batch-limit")]
    #[validate(range(min = 1))]
    pub batch_limit: usize,

    /// Single-batch grace, as a fraction of `batch_limit`
    #[serde(default = "default_grace_fraction", alias = "grace-fraction")]
    #[validate(range(min = 0.0, max = 1.0))]
    pub grace_fraction: f64,
}

impl Default for InvocationConfig {
    fn default() -> Self {
        Self {
            region: default_region(),
            function: String::new(),
            endpoint: None,
            batch_limit: default_batch_limit(),
            grace_fraction: default_grace_fraction(),
        }
    }
}

/// Peer-broadcast deadline and route
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct BroadcastConfig {
    /// Shared deadline for all peers of one dispatch
    #[serde(default = "default_deadline_ms", alias = "deadline-ms")]
    #[validate(range(min = 1))]
    pub deadline_ms: u64,

    #[serde(default = "default_publish_path", alias = "publish-path")]
    #[validate(length(min = 1))]
    pub publish_path: String,
}

impl Default for BroadcastConfig {
    fn default() -> Self {
        Self {
            deadline_ms: default_deadline_ms(),
            publish_path: default_publish_path(),
        }
    }
}

impl BroadcastConfig {
    pub fn deadline(&self) -> Duration {
        Duration::from_millis(self.deadline_ms)
    }
}

/// Inbound HTTP listener
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct HttpConfig {
    /// `host:port`, or `:port` to listen on every interface
    #[serde(default = "default_http_host")]
    #[validate(length(min = 1))]
    pub host: String,

    /// Time to let detached dispatches finish on shutdown
    #[serde(default = "default_drain_timeout_ms", alias = "drain-timeout-ms")]
    pub drain_timeout_ms: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            host: default_http_host(),
            drain_timeout_ms: default_drain_timeout_ms(),
        }
    }
}

impl HttpConfig {
    /// `host:port` to bind; a bare `:port` binds every interface
    ///
    /// Host names are kept as given and resolved when binding.
    pub fn listen_addr(&self) -> Result<String, ContractError> {
        let invalid = |reason: &str| {
            ContractError::config_validation(
                "http.host",
                format!("invalid address '{}': {reason}", self.host),
            )
        };

        let (host, port) = self
            .host
            .rsplit_once(':')
            .ok_or_else(|| invalid("expected host:port"))?;
        port.parse::<u16>().map_err(|_| invalid("port is not a number"))?;

        if host.is_empty() {
            Ok(format!("0.0.0.0:{port}"))
        } else {
            Ok(self.host.clone())
        }
    }

    pub fn drain_timeout(&self) -> Duration {
        Duration::from_millis(self.drain_timeout_ms)
    }
}

fn default_region() -> String {
    "us-east-1".to_string()
}

fn default_users_table() -> String {
    "streaming-users-online".to_string()
}

fn default_servers_table() -> String {
    "chat-servers".to_string()
}

fn default_chat_config_table() -> String {
    "streaming-dispatcher-config".to_string()
}

fn default_batch_limit() -> usize {
    100
}

fn default_grace_fraction() -> f64 {
    0.2
}

fn default_deadline_ms() -> u64 {
    5_000
}

fn default_publish_path() -> String {
    "/publish/chat/".to_string()
}

fn default_http_host() -> String {
    ":8888".to_string()
}

fn default_drain_timeout_ms() -> u64 {
    10_000
}
