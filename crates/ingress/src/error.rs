//! Ingress error types

use thiserror::Error;

/// HTTP listener errors
#[derive(Debug, Error)]
pub enum IngressError {
    /// Listener could not be bound
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    /// Server loop failed
    #[error("http server error: {0}")]
    Serve(#[source] std::io::Error),
}
