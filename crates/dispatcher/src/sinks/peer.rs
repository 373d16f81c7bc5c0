//! HttpPeerPublisher - POSTs the event to one chat server

use bytes::Bytes;
use contracts::{BroadcastConfig, ContractError, PeerPublisher, PeerReport, PeerServer};
use reqwest::header::CONTENT_TYPE;
use tracing::{debug, instrument};

/// Publisher posting to `http://{address}:{port}{publish_path}`
#[derive(Debug, Clone)]
pub struct HttpPeerPublisher {
    client: reqwest::Client,
    publish_path: String,
}

impl HttpPeerPublisher {
    pub fn new(client: reqwest::Client, publish_path: impl Into<String>) -> Self {
        Self {
            client,
            publish_path: publish_path.into(),
        }
    }

    pub fn from_config(client: reqwest::Client, config: &BroadcastConfig) -> Self {
        Self::new(client, &config.publish_path)
    }
}

impl PeerPublisher for HttpPeerPublisher {
    #[instrument(
        name = "http_peer_publish",
        skip(self, body),
        fields(peer = %peer, bytes = body.len())
    )]
    async fn publish(&self, peer: &PeerServer, body: Bytes) -> Result<PeerReport, ContractError> {
        let url = peer.url(&self.publish_path);
        let response = self
            .client
            .post(&url)
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await
            .map_err(|e| ContractError::publish(peer.to_string(), e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| ContractError::publish(peer.to_string(), e.to_string()))?;

        // Error responses carry a report too
        let report = serde_json::from_str::<PeerReport>(&text);
        debug!(
            status = status.as_u16(),
            decoded = report.is_ok(),
            "Chat server answered"
        );

        if !status.is_success() {
            let detail = match report {
                Ok(report) if !report.error.is_empty() => report.error,
                _ => text,
            };
            return Err(ContractError::publish(
                peer.to_string(),
                format!("status {status}: {detail}"),
            ));
        }

        report.map_err(|e| ContractError::response_decode(peer.to_string(), e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn peer_for(server: &MockServer) -> PeerServer {
        let addr = server.address();
        PeerServer::new(addr.ip().to_string(), i64::from(addr.port())).unwrap()
    }

    #[tokio::test]
    async fn test_publish_decodes_report() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/publish/chat/"))
            .and(header("content-type", "application/json"))
            .and(body_json(serde_json::json!({"event_subdomain": "show"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "success": true,
                "delivered_messages": 42,
                "elapse": "3.2ms"
            })))
            .mount(&server)
            .await;

        let publisher = HttpPeerPublisher::new(reqwest::Client::new(), "/publish/chat/");
        let report = publisher
            .publish(
                &peer_for(&server),
                Bytes::from_static(br#"{"event_subdomain":"show"}"#),
            )
            .await
            .unwrap();

        assert!(report.success);
        assert_eq!(report.delivered, 42);
        assert_eq!(report.elapse, "3.2ms");
    }

    #[tokio::test]
    async fn test_undecodable_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
            .mount(&server)
            .await;

        let publisher = HttpPeerPublisher::new(reqwest::Client::new(), "/publish/chat/");
        let err = publisher
            .publish(&peer_for(&server), Bytes::from_static(b"{}"))
            .await
            .unwrap_err();
        assert!(matches!(err, ContractError::ResponseDecode { .. }));
    }

    #[tokio::test]
    async fn test_error_status_is_publish_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let publisher = HttpPeerPublisher::new(reqwest::Client::new(), "/publish/chat/");
        let err = publisher
            .publish(&peer_for(&server), Bytes::from_static(b"{}"))
            .await
            .unwrap_err();
        assert!(matches!(err, ContractError::Publish { .. }));
    }

    #[tokio::test]
    async fn test_error_status_surfaces_reported_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_json(serde_json::json!({
                "success": false,
                "error": "hub closed",
                "delivered_messages": 0
            })))
            .mount(&server)
            .await;

        let publisher = HttpPeerPublisher::new(reqwest::Client::new(), "/publish/chat/");
        let err = publisher
            .publish(&peer_for(&server), Bytes::from_static(b"{}"))
            .await
            .unwrap_err();

        assert!(matches!(err, ContractError::Publish { .. }));
        let message = err.to_string();
        assert!(message.contains("500"));
        assert!(message.contains("hub closed"));
    }
}
