//! Fan-out executor - concurrent delivery to the invocation backend or the peers
//!
//! Every batch / peer runs as its own task on a `JoinSet`; the executor
//! returns once all of them finished (or, for peers, the shared deadline
//! cancelled the rest). Failures are isolated and only aggregated for logging.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use contracts::{
    ContractError, DeliveryTarget, DispatchOutcome, InvocationPayload, Invoker, PeerPublisher,
    PeerSet,
};
use observability::{record_batch, record_peer_delivery, Outcome};
use serde_json::Value;
use tokio::task::JoinSet;
use tokio::time::{timeout_at, Instant};
use tracing::{debug, error, info, instrument, warn};

use crate::planner::{plan, BatchPolicy};

/// Aggregated outcomes of one fan-out
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FanOutSummary {
    /// One entry per attempted batch or peer, in completion order
    pub outcomes: Vec<DispatchOutcome>,
    /// Batches dropped before sending (serialization failure)
    pub skipped: usize,
}

impl FanOutSummary {
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.success).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.iter().filter(|o| !o.success).count()
    }

    fn push_joined(&mut self, joined: Result<DispatchOutcome, tokio::task::JoinError>) {
        match joined {
            Ok(outcome) => self.outcomes.push(outcome),
            Err(e) => {
                error!(error = %e, "Delivery task panicked");
                self.outcomes.push(DispatchOutcome::failed("task", e));
            }
        }
    }
}

/// Batches targets and invokes the function once per batch
pub struct InvocationFanOut<I> {
    invoker: Arc<I>,
    policy: BatchPolicy,
}

impl<I> InvocationFanOut<I> {
    pub fn new(invoker: I, policy: BatchPolicy) -> Self {
        Self {
            invoker: Arc::new(invoker),
            policy,
        }
    }

    pub fn invoker(&self) -> &I {
        &self.invoker
    }

    pub fn policy(&self) -> &BatchPolicy {
        &self.policy
    }
}

impl<I> InvocationFanOut<I>
where
    I: Invoker + Send + Sync + 'static,
{
    /// Deliver `message` to every target
    ///
    /// A single-batch plan is invoked inline; otherwise one task per batch.
    /// Returns after every invocation finished.
    #[instrument(
        name = "invocation_fanout_deliver",
        skip(self, message, targets),
        fields(function = %self.invoker.name(), targets = targets.len())
    )]
    pub async fn deliver(&self, message: &Value, targets: &[DeliveryTarget]) -> FanOutSummary {
        let plan = plan(targets, &self.policy);
        let mut summary = FanOutSummary::default();

        if plan.is_single() {
            info!(targets = targets.len(), "Sending to only one batch");
            match encode_batch(message, targets) {
                Ok(body) => {
                    let outcome = invoke_batch(self.invoker.as_ref(), 0, targets.len(), body).await;
                    summary.outcomes.push(outcome);
                }
                Err(e) => skip_batch(&mut summary, 0, &e),
            }
            return summary;
        }

        info!(batches = plan.len(), limit = self.policy.limit, "Sending in batches");
        let mut tasks = JoinSet::new();
        for (index, batch) in plan.into_batches().into_iter().enumerate() {
            let body = match encode_batch(message, batch) {
                Ok(body) => body,
                Err(e) => {
                    skip_batch(&mut summary, index, &e);
                    continue;
                }
            };
            let invoker = Arc::clone(&self.invoker);
            let size = batch.len();
            tasks.spawn(async move { invoke_batch(invoker.as_ref(), index, size, body).await });
        }

        while let Some(joined) = tasks.join_next().await {
            summary.push_joined(joined);
        }
        summary
    }
}

/// Serialize `{message, connection_ids}` for one batch
fn encode_batch(message: &Value, batch: &[DeliveryTarget]) -> Result<Bytes, ContractError> {
    let payload = InvocationPayload {
        message,
        connection_ids: batch,
    };
    serde_json::to_vec(&payload)
        .map(Bytes::from)
        .map_err(|e| ContractError::serialize("invocation payload", e.to_string()))
}

fn skip_batch(summary: &mut FanOutSummary, index: usize, error: &ContractError) {
    error!(batch = index, error = %error, "Batch payload not serialized, skipping");
    record_batch(Outcome::Skipped);
    summary.skipped += 1;
}

async fn invoke_batch<I: Invoker>(
    invoker: &I,
    index: usize,
    size: usize,
    body: Bytes,
) -> DispatchOutcome {
    let label = format!("batch-{index}");
    debug!(batch = index, targets = size, "Sending batch");

    match invoker.invoke(body).await {
        Ok(result) => {
            info!(
                batch = index,
                targets = size,
                status = result.status,
                response = %result.body,
                "Invocation result"
            );
            record_batch(Outcome::Success);
            DispatchOutcome::ok(label)
        }
        Err(e) => {
            error!(batch = index, targets = size, error = %e, "Error invoking function");
            record_batch(Outcome::Failure);
            DispatchOutcome::failed(label, e)
        }
    }
}

/// Posts the event to every peer under one shared deadline
pub struct PeerFanOut<P> {
    publisher: Arc<P>,
    deadline: Duration,
}

impl<P> PeerFanOut<P> {
    pub fn new(publisher: P, deadline: Duration) -> Self {
        Self {
            publisher: Arc::new(publisher),
            deadline,
        }
    }

    pub fn publisher(&self) -> &P {
        &self.publisher
    }

    pub fn deadline(&self) -> Duration {
        self.deadline
    }
}

impl<P> PeerFanOut<P>
where
    P: PeerPublisher + Send + Sync + 'static,
{
    /// Send `body` to every peer concurrently
    ///
    /// The deadline starts now; calls still in flight when it elapses are dropped.
    #[instrument(
        name = "peer_fanout_broadcast",
        skip(self, peers, body),
        fields(peers = peers.len(), deadline_ms = self.deadline.as_millis() as u64)
    )]
    pub async fn broadcast(&self, peers: &PeerSet, body: Bytes) -> FanOutSummary {
        let deadline = Instant::now() + self.deadline;
        let waited_ms = u64::try_from(self.deadline.as_millis()).unwrap_or(u64::MAX);
        let mut tasks = JoinSet::new();

        for peer in peers.iter() {
            let publisher = Arc::clone(&self.publisher);
            let body = body.clone();
            tasks.spawn(async move {
                let label = peer.to_string();
                debug!(peer = %label, "Sending to chat server");

                match timeout_at(deadline, publisher.publish(&peer, body)).await {
                    Ok(Ok(report)) => {
                        info!(
                            peer = %label,
                            success = report.success,
                            delivered = report.delivered,
                            elapse = %report.elapse,
                            error = %report.error,
                            "Chat server response"
                        );
                        if report.success {
                            record_peer_delivery(Outcome::Success);
                            DispatchOutcome::ok(label)
                        } else {
                            let reason = if report.error.is_empty() {
                                "chat server reported failure".to_string()
                            } else {
                                format!("chat server reported failure: {}", report.error)
                            };
                            record_peer_delivery(Outcome::Failure);
                            let e = ContractError::publish(label.clone(), reason);
                            DispatchOutcome::failed(label, e)
                        }
                    }
                    Ok(Err(e)) => {
                        error!(peer = %label, error = %e, "Error sending to chat server");
                        record_peer_delivery(Outcome::Failure);
                        DispatchOutcome::failed(label, e)
                    }
                    Err(_) => {
                        let e = ContractError::DeadlineExceeded {
                            peer: label.clone(),
                            waited_ms,
                        };
                        warn!(peer = %label, error = %e, "Chat server call cancelled");
                        record_peer_delivery(Outcome::Timeout);
                        DispatchOutcome::failed(label, e)
                    }
                }
            });
        }

        let mut summary = FanOutSummary::default();
        while let Some(joined) = tasks.join_next().await {
            summary.push_joined(joined);
        }
        summary
    }
}
