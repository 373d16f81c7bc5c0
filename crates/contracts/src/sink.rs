//! Delivery sink traits - dispatcher output interfaces
//!
//! Two backend shapes: a size-bounded invocation backend and a set of peer
//! servers reached over request/response.

use bytes::Bytes;

use crate::{ContractError, InvokeResult, PeerReport, PeerServer};

/// Invocation-style backend (e.g. a serverless function)
#[trait_variant::make(Invoker: Send)]
pub trait LocalInvoker {
    /// Configured function name (used for logging/metrics)
    fn name(&self) -> &str;

    /// Invoke the function with an already serialized batch payload
    ///
    /// # Errors
    /// Returns network or remote failure
    async fn invoke(&self, payload: Bytes) -> Result<InvokeResult, ContractError>;
}

/// Peer-server backend
#[trait_variant::make(PeerPublisher: Send)]
pub trait LocalPeerPublisher {
    /// Post a serialized event to one peer and decode its summary
    ///
    /// # Errors
    /// Returns request failure or response decode failure
    async fn publish(&self, peer: &PeerServer, body: Bytes) -> Result<PeerReport, ContractError>;
}
