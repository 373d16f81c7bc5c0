//! Delivery payloads and results

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::DeliveryTarget;

/// Body sent to the invocation backend for one batch
#[derive(Debug, Clone, Serialize)]
pub struct InvocationPayload<'a> {
    pub message: &'a Value,
    pub connection_ids: &'a [DeliveryTarget],
}

/// Opaque invocation result, kept for logging
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvokeResult {
    pub status: u16,
    pub body: String,
}

/// Summary a peer server returns for a publish request
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeerReport {
    #[serde(default)]
    pub success: bool,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub error: String,
    #[serde(rename = "delivered_messages", default)]
    pub delivered: u64,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub elapse: String,
}

/// Result of one batch or one peer delivery
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchOutcome {
    /// Batch index or peer address
    pub label: String,
    pub success: bool,
    pub error: Option<String>,
}

impl DispatchOutcome {
    pub fn ok(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            success: true,
            error: None,
        }
    }

    pub fn failed(label: impl Into<String>, error: impl ToString) -> Self {
        Self {
            label: label.into(),
            success: false,
            error: Some(error.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_invocation_payload_shape() {
        let message = json!({"text": "hello"});
        let targets = vec![DeliveryTarget::from("c1"), DeliveryTarget::from("c2")];
        let payload = InvocationPayload {
            message: &message,
            connection_ids: &targets,
        };

        let value = serde_json::to_value(&payload).unwrap();
        assert_eq!(
            value,
            json!({"message": {"text": "hello"}, "connection_ids": ["c1", "c2"]})
        );
    }

    #[test]
    fn test_peer_report_partial_body() {
        let report: PeerReport =
            serde_json::from_str(r#"{"success": true, "delivered_messages": 42}"#).unwrap();
        assert!(report.success);
        assert_eq!(report.delivered, 42);
        assert!(report.error.is_empty());
    }
}
