//! Layered error definitions
//!
//! Categorized by source: request / config / directory / delivery

use thiserror::Error;

/// Unified error type
#[derive(Debug, Error)]
pub enum ContractError {
    // ===== Request Errors =====
    /// Inbound event without a tenant key
    #[error("missing tenant key (event_subdomain)")]
    MissingTenantKey,

    // ===== Configuration Errors =====
    /// Configuration parse error
    #[error("config parse error: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration validation error
    #[error("config validation error at '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    // ===== Directory Errors =====
    /// Query expression could not be built
    #[error("expression error for table '{table}': {message}")]
    Expression { table: String, message: String },

    /// A page of a directory scan failed
    #[error("directory scan of '{table}' failed: {message}")]
    DirectoryPage { table: String, message: String },

    // ===== Delivery Errors =====
    /// Payload serialization error
    #[error("serialize error for {context}: {message}")]
    Serialize { context: String, message: String },

    /// Invocation backend error
    #[error("invoke of '{function}' failed: {message}")]
    Invoke { function: String, message: String },

    /// Peer request error
    #[error("publish to peer '{peer}' failed: {message}")]
    Publish { peer: String, message: String },

    /// Peer response could not be decoded
    #[error("response decode error from peer '{peer}': {message}")]
    ResponseDecode { peer: String, message: String },

    /// Shared broadcast deadline elapsed
    #[error("deadline exceeded for peer '{peer}' after {waited_ms}ms")]
    DeadlineExceeded { peer: String, waited_ms: u64 },

    // ===== General Errors =====
    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl ContractError {
    /// Create configuration parse error
    pub fn config_parse(message: impl Into<String>) -> Self {
        Self::ConfigParse {
            message: message.into(),
            source: None,
        }
    }

    /// Create configuration validation error
    pub fn config_validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create expression construction error
    pub fn expression(table: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Expression {
            table: table.into(),
            message: message.into(),
        }
    }

    /// Create directory page error
    pub fn directory_page(table: impl Into<String>, message: impl Into<String>) -> Self {
        Self::DirectoryPage {
            table: table.into(),
            message: message.into(),
        }
    }

    /// Create serialization error
    pub fn serialize(context: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Serialize {
            context: context.into(),
            message: message.into(),
        }
    }

    /// Create invoke error
    pub fn invoke(function: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Invoke {
            function: function.into(),
            message: message.into(),
        }
    }

    /// Create publish error
    pub fn publish(peer: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Publish {
            peer: peer.into(),
            message: message.into(),
        }
    }

    /// Create response decode error
    pub fn response_decode(peer: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ResponseDecode {
            peer: peer.into(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_helpers_fill_context() {
        let err = ContractError::directory_page("chat-servers", "throttled");
        assert_eq!(
            err.to_string(),
            "directory scan of 'chat-servers' failed: throttled"
        );

        let err = ContractError::publish("10.0.0.1:7000", "hub closed");
        assert!(matches!(err, ContractError::Publish { ref peer, .. } if peer == "10.0.0.1:7000"));
    }

    #[test]
    fn test_io_errors_convert() {
        fn read() -> Result<String, ContractError> {
            Ok(std::fs::read_to_string("/nonexistent/ws-message-dispatcher.toml")?)
        }
        assert!(matches!(read(), Err(ContractError::Io(_))));
    }
}
