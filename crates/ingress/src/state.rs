//! Shared handler state and detached dispatch tasks

use std::sync::Arc;
use std::time::Duration;

use contracts::{EventDispatcher, InboundEvent};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, info, warn, Instrument};

/// State shared by every request
pub struct AppState<D> {
    dispatcher: Arc<D>,
    tasks: TaskTracker,
    cancel: CancellationToken,
}

impl<D> Clone for AppState<D> {
    fn clone(&self) -> Self {
        Self {
            dispatcher: Arc::clone(&self.dispatcher),
            tasks: self.tasks.clone(),
            cancel: self.cancel.clone(),
        }
    }
}

impl<D> AppState<D> {
    pub fn new(dispatcher: D) -> Self {
        Self::from_arc(Arc::new(dispatcher))
    }

    pub fn from_arc(dispatcher: Arc<D>) -> Self {
        Self {
            dispatcher,
            tasks: TaskTracker::new(),
            cancel: CancellationToken::new(),
        }
    }

    pub fn dispatcher(&self) -> &D {
        &self.dispatcher
    }

    /// Dispatches still running
    pub fn pending(&self) -> usize {
        self.tasks.len()
    }

    /// Stop accepting dispatches and wait for the running ones.
    ///
    /// Tasks still running after `timeout` are cancelled. Returns `true` when
    /// everything finished on its own.
    pub async fn drain(&self, timeout: Duration) -> bool {
        self.tasks.close();
        info!(pending = self.tasks.len(), timeout_ms = timeout.as_millis() as u64, "Draining dispatches");

        if tokio::time::timeout(timeout, self.tasks.wait()).await.is_ok() {
            info!("All dispatches finished");
            return true;
        }

        warn!(pending = self.tasks.len(), "Drain timeout, cancelling dispatches");
        self.cancel.cancel();
        self.tasks.wait().await;
        false
    }
}

impl<D> AppState<D>
where
    D: EventDispatcher + Send + Sync + 'static,
{
    /// Run `event` on a detached task; the caller is not kept waiting
    pub fn spawn_dispatch(&self, event: InboundEvent) {
        let dispatcher = Arc::clone(&self.dispatcher);
        let cancel = self.cancel.clone();
        let span = tracing::info_span!("dispatch", tenant = %event.tenant_key);

        self.tasks.spawn(
            async move {
                tokio::select! {
                    _ = dispatcher.dispatch(event) => debug!("Dispatch task finished"),
                    _ = cancel.cancelled() => warn!("Dispatch cancelled by shutdown"),
                }
            }
            .instrument(span),
        );
    }
}
