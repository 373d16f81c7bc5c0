//! Recording fakes for the sink traits

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use bytes::Bytes;
use contracts::{ContractError, InvokeResult, Invoker, PeerPublisher, PeerReport, PeerServer};
use serde_json::Value;

/// Records every batch body; fails batches containing `fail_on`
#[derive(Default)]
pub struct RecordingInvoker {
    calls: Mutex<Vec<Value>>,
    fail_on: Option<String>,
}

impl RecordingInvoker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_on(target: &str) -> Self {
        Self {
            fail_on: Some(target.to_string()),
            ..Default::default()
        }
    }

    pub fn calls(&self) -> Vec<Value> {
        self.calls.lock().unwrap().clone()
    }

    /// Sorted batch sizes
    pub fn batch_sizes(&self) -> Vec<usize> {
        let mut sizes: Vec<usize> = self
            .calls()
            .iter()
            .map(|c| c["connection_ids"].as_array().map_or(0, Vec::len))
            .collect();
        sizes.sort_unstable();
        sizes
    }
}

impl Invoker for RecordingInvoker {
    fn name(&self) -> &str {
        "recording"
    }

    async fn invoke(&self, payload: Bytes) -> Result<InvokeResult, ContractError> {
        let body: Value = serde_json::from_slice(&payload)
            .map_err(|e| ContractError::serialize("recorded batch", e.to_string()))?;

        let fail = self.fail_on.as_deref().is_some_and(|target| {
            body["connection_ids"]
                .as_array()
                .is_some_and(|ids| ids.iter().any(|id| id.as_str() == Some(target)))
        });
        self.calls.lock().unwrap().push(body);

        if fail {
            return Err(ContractError::invoke("recording", "injected failure"));
        }
        Ok(InvokeResult {
            status: 202,
            body: String::new(),
        })
    }
}

/// Records every publish; peers can be made slow or failing by address
#[derive(Default)]
pub struct RecordingPublisher {
    calls: Mutex<Vec<(String, Value)>>,
    delays: HashMap<String, Duration>,
    failing: Vec<String>,
    rejecting: HashMap<String, String>,
}

impl RecordingPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delay(mut self, address: &str, delay: Duration) -> Self {
        self.delays.insert(address.to_string(), delay);
        self
    }

    pub fn with_failure(mut self, address: &str) -> Self {
        self.failing.push(address.to_string());
        self
    }

    /// Peer answers, but reports `success: false` with `error`
    pub fn with_rejection(mut self, address: &str, error: &str) -> Self {
        self.rejecting.insert(address.to_string(), error.to_string());
        self
    }

    /// (peer, decoded body) for every completed publish
    pub fn calls(&self) -> Vec<(String, Value)> {
        self.calls.lock().unwrap().clone()
    }
}

impl PeerPublisher for RecordingPublisher {
    async fn publish(&self, peer: &PeerServer, body: Bytes) -> Result<PeerReport, ContractError> {
        if let Some(delay) = self.delays.get(&peer.address) {
            tokio::time::sleep(*delay).await;
        }

        let decoded: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);
        self.calls.lock().unwrap().push((peer.to_string(), decoded));

        if self.failing.contains(&peer.address) {
            return Err(ContractError::publish(peer.to_string(), "connection refused"));
        }
        if let Some(error) = self.rejecting.get(&peer.address) {
            return Ok(PeerReport {
                success: false,
                error: error.clone(),
                ..Default::default()
            });
        }
        Ok(PeerReport {
            success: true,
            delivered: 1,
            elapse: "1ms".to_string(),
            ..Default::default()
        })
    }
}

/// AWS configuration with fixed credentials, so nothing probes the environment
pub async fn static_aws_config() -> aws_config::SdkConfig {
    use aws_sdk_lambda::config::{Credentials, Region};

    aws_config::defaults(aws_config::BehaviorVersion::latest())
        .region(Region::new("us-east-1"))
        .credentials_provider(Credentials::new("AKIDTEST", "secret", None, None, "test"))
        .load()
        .await
}
