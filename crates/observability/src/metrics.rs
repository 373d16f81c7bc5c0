//! Dispatch metrics
//!
//! Recorded through the `metrics` facade; a no-op until a recorder is installed.

use contracts::BackendSelector;
use metrics::{counter, histogram};

/// Result of one delivery (batch or peer)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    Failure,
    /// The shared peer deadline elapsed
    Timeout,
    /// Serialization failed, nothing was sent
    Skipped,
}

impl Outcome {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Failure => "failure",
            Self::Timeout => "timeout",
            Self::Skipped => "skipped",
        }
    }
}

/// Record an accepted event (validated and handed to a background task)
pub fn record_event_accepted(backend: Option<BackendSelector>) {
    counter!(
        "ws_dispatcher_events_total",
        "backend" => backend_label(backend)
    )
    .increment(1);
}

/// Record a rejected request (400)
pub fn record_event_rejected() {
    counter!("ws_dispatcher_events_rejected_total").increment(1);
}

/// Record the number of resolved connections
pub fn record_targets_resolved(count: usize) {
    histogram!("ws_dispatcher_targets_resolved").record(count as f64);
}

/// Record one invocation batch outcome
pub fn record_batch(outcome: Outcome) {
    counter!(
        "ws_dispatcher_batches_total",
        "outcome" => outcome.as_str()
    )
    .increment(1);
}

/// Record one peer delivery outcome
pub fn record_peer_delivery(outcome: Outcome) {
    counter!(
        "ws_dispatcher_peer_deliveries_total",
        "outcome" => outcome.as_str()
    )
    .increment(1);
}

/// Record an aborted dispatch cycle (resolution failure, no peers)
pub fn record_dispatch_aborted(backend: BackendSelector) {
    counter!(
        "ws_dispatcher_dispatch_aborted_total",
        "backend" => backend.as_str()
    )
    .increment(1);
}

/// Record how long one dispatch cycle took
pub fn record_dispatch_duration_ms(backend: BackendSelector, elapsed_ms: f64) {
    histogram!(
        "ws_dispatcher_dispatch_duration_ms",
        "backend" => backend.as_str()
    )
    .record(elapsed_ms);
}

/// Missing or unrecognized backends are labelled "default"
fn backend_label(backend: Option<BackendSelector>) -> &'static str {
    backend.map_or("default", |b| b.as_str())
}
