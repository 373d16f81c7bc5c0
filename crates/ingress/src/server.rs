//! Listener lifecycle: bind, serve until shutdown, drain

use std::future::Future;
use std::time::Duration;

use contracts::EventDispatcher;
use tokio::net::TcpListener;
use tracing::{info, instrument};

use crate::error::IngressError;
use crate::routes::build_router;
use crate::state::AppState;

/// Bind the listener to `host:port`, resolving host names
pub async fn bind(addr: &str) -> Result<TcpListener, IngressError> {
    TcpListener::bind(addr)
        .await
        .map_err(|source| IngressError::Bind {
            addr: addr.to_string(),
            source,
        })
}

/// Serve until `shutdown` resolves, then drain detached dispatches
///
/// Dispatches still running after `drain_timeout` are cancelled.
#[instrument(name = "ingress_serve", skip_all)]
pub async fn serve<D, F>(
    listener: TcpListener,
    state: AppState<D>,
    shutdown: F,
    drain_timeout: Duration,
) -> Result<(), IngressError>
where
    D: EventDispatcher + Send + Sync + 'static,
    F: Future<Output = ()> + Send + 'static,
{
    if let Ok(addr) = listener.local_addr() {
        info!(%addr, "HTTP ingress listening");
    }

    axum::serve(listener, build_router(state.clone()))
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(IngressError::Serve)?;

    info!(pending = state.pending(), "Listener closed");
    state.drain(drain_timeout).await;
    info!("Ingress shutdown complete");
    Ok(())
}
