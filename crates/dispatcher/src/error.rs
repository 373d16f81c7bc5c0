//! Dispatcher error types

use contracts::ContractError;
use directory::DirectoryError;
use thiserror::Error;

/// Reasons a dispatch cycle is aborted before any delivery
#[derive(Debug, Error)]
pub enum DispatchError {
    /// Directory lookup failed
    #[error("resolution failed: {0}")]
    Resolution(#[from] DirectoryError),

    /// Peer table resolved to nothing
    #[error("no chat servers configured")]
    NoPeers,

    /// Sink could not be created
    #[error("failed to create sink '{name}': {message}")]
    SinkCreation { name: String, message: String },

    /// Contract-level failure (serialization, config)
    #[error("dispatch error: {0}")]
    Contract(#[from] ContractError),
}

impl DispatchError {
    /// Create a sink creation error
    pub fn sink_creation(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SinkCreation {
            name: name.into(),
            message: message.into(),
        }
    }
}
