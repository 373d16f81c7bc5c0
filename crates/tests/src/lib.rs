//! # Integration Tests
//!
//! End-to-end tests across the workspace crates.
//!
//! Covers:
//! - HTTP ingress -> dispatch engine -> directory -> sinks
//! - wiremock stand-ins for chat servers, function invocation and the directory

#[cfg(test)]
mod support {
    use std::sync::Mutex;

    use axum::body::Body;
    use axum::http::Request;
    use bytes::Bytes;
    use contracts::{ContractError, InvokeResult, Invoker};
    use serde_json::{json, Value};

    /// Invoker recording each batch's connection ids
    #[derive(Default)]
    pub struct RecordingInvoker {
        batches: Mutex<Vec<Vec<String>>>,
    }

    impl RecordingInvoker {
        pub fn batches(&self) -> Vec<Vec<String>> {
            self.batches.lock().unwrap().clone()
        }
    }

    impl Invoker for RecordingInvoker {
        fn name(&self) -> &str {
            "recording"
        }

        async fn invoke(&self, payload: Bytes) -> Result<InvokeResult, ContractError> {
            let body: Value = serde_json::from_slice(&payload)
                .map_err(|e| ContractError::serialize("batch", e.to_string()))?;
            let ids = body["connection_ids"]
                .as_array()
                .map(|ids| {
                    ids.iter()
                        .filter_map(|id| id.as_str().map(str::to_string))
                        .collect()
                })
                .unwrap_or_default();
            self.batches.lock().unwrap().push(ids);
            Ok(InvokeResult {
                status: 202,
                body: String::new(),
            })
        }
    }

    pub fn users(tenant: &str, n: usize) -> Vec<Value> {
        (0..n)
            .map(|i| {
                json!({
                    "connection_id": format!("{tenant}-{i:04}"),
                    "event_subdomain": tenant,
                    "is_organizer": i % 10 == 0
                })
            })
            .collect()
    }

    pub fn post_event(body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }
}

#[cfg(test)]
mod e2e_tests {
    use std::time::Duration;

    use axum::http::StatusCode;
    use contracts::PEER_BROADCAST_BACKEND;
    use directory::{ConnectionDirectory, DirectoryTables, MemoryStore};
    use dispatcher::{
        BatchPolicy, DispatchEngine, HttpPeerPublisher, InvocationFanOut, PeerFanOut,
    };
    use ingress::{build_router, AppState};
    use serde_json::{json, Value};
    use tower::ServiceExt;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use crate::support::{post_event, users, RecordingInvoker};

    type Engine = DispatchEngine<MemoryStore, RecordingInvoker, HttpPeerPublisher>;

    fn tables() -> DirectoryTables {
        DirectoryTables {
            users: "streaming-users-online".into(),
            servers: "chat-servers".into(),
            chat_config: "streaming-dispatcher-config".into(),
        }
    }

    fn engine(store: MemoryStore) -> Engine {
        DispatchEngine::new(
            ConnectionDirectory::new(store, tables()),
            InvocationFanOut::new(RecordingInvoker::default(), BatchPolicy::default()),
            PeerFanOut::new(
                HttpPeerPublisher::new(reqwest::Client::new(), "/publish/chat/"),
                Duration::from_secs(5),
            ),
        )
    }

    /// End-to-end: POST / -> engine -> paginated directory -> batched invocations
    #[tokio::test]
    async fn test_e2e_invocation_path() {
        let store = MemoryStore::new(40)
            .with_table("streaming-users-online", users("show", 250))
            .with_table("chat-servers", Vec::<Value>::new());
        let state = AppState::new(engine(store));

        let response = build_router(state.clone())
            .oneshot(post_event(json!({
                "event_subdomain": "show",
                "message": {"type": "poll", "id": 7}
            })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        assert!(state.drain(Duration::from_secs(5)).await);

        let batches = state.dispatcher().invocation().invoker().batches();
        let mut sizes: Vec<usize> = batches.iter().map(Vec::len).collect();
        sizes.sort_unstable();
        assert_eq!(sizes, vec![50, 100, 100]);

        let mut all: Vec<String> = batches.into_iter().flatten().collect();
        all.sort();
        all.dedup();
        assert_eq!(all.len(), 250);
    }

    #[tokio::test]
    async fn test_e2e_audience_filter() {
        let store = MemoryStore::new(7).with_table(
            "streaming-users-online",
            users("show", 30).into_iter().chain(users("other", 30)),
        );
        let state = AppState::new(engine(store));

        build_router(state.clone())
            .oneshot(post_event(json!({
                "event_subdomain": "show",
                "audience_type": "organizer",
                "gateway_type": "api-gateway",
                "message": "hello"
            })))
            .await
            .unwrap();
        state.drain(Duration::from_secs(5)).await;

        let batches = state.dispatcher().invocation().invoker().batches();
        assert_eq!(
            batches,
            vec![vec!["show-0000", "show-0010", "show-0020"]
                .into_iter()
                .map(String::from)
                .collect::<Vec<_>>()]
        );
    }

    /// End-to-end: peer broadcast reaches a live chat server; a dead one is isolated
    #[tokio::test]
    async fn test_e2e_peer_broadcast() {
        let chat_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/publish/chat/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "delivered_messages": 12,
                "elapse": "2ms"
            })))
            .expect(1)
            .mount(&chat_server)
            .await;

        let store = MemoryStore::new(10).with_table(
            "chat-servers",
            vec![
                json!({"ip": "127.0.0.1", "port": chat_server.address().port()}),
                // Nothing listens here
                json!({"ip": "127.0.0.2", "port": 9}),
                json!({"ip": "", "port": 8080}),
            ],
        );
        let state = AppState::new(engine(store));

        let event = json!({
            "event_subdomain": "show",
            "audience_type": "attendance",
            "gateway_type": PEER_BROADCAST_BACKEND,
            "message": {"text": "hi"}
        });
        let response = build_router(state.clone())
            .oneshot(post_event(event.clone()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(state.drain(Duration::from_secs(10)).await);

        let received = chat_server.received_requests().await.unwrap();
        assert_eq!(received.len(), 1);
        let body: Value = serde_json::from_slice(&received[0].body).unwrap();
        assert_eq!(body, event);
        assert!(state.dispatcher().invocation().invoker().batches().is_empty());
    }

    #[tokio::test]
    async fn test_e2e_zero_peers_still_acknowledged() {
        let store = MemoryStore::new(10).with_table("chat-servers", Vec::<Value>::new());
        let state = AppState::new(engine(store));

        let response = build_router(state.clone())
            .oneshot(post_event(json!({
                "event_subdomain": "show",
                "gateway_type": PEER_BROADCAST_BACKEND,
                "message": 1
            })))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(state.drain(Duration::from_secs(5)).await);
        assert!(state.dispatcher().invocation().invoker().batches().is_empty());
    }

    #[tokio::test]
    async fn test_e2e_directory_failure_still_acknowledged() {
        // No tables: every scan fails
        let state = AppState::new(engine(MemoryStore::new(10)));

        let response = build_router(state.clone())
            .oneshot(post_event(json!({"event_subdomain": "show", "message": 1})))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(state.drain(Duration::from_secs(5)).await);
        assert!(state.dispatcher().invocation().invoker().batches().is_empty());
    }

    #[tokio::test]
    async fn test_e2e_missing_tenant_rejected() {
        let state = AppState::new(engine(MemoryStore::new(10)));

        let response = build_router(state.clone())
            .oneshot(post_event(json!({"audience_type": "organizer", "message": 1})))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(state.pending(), 0);
    }
}

#[cfg(test)]
mod production_stack_tests {
    use std::time::Duration;

    use axum::http::StatusCode;
    use config_loader::{ConfigFormat, ConfigLoader};
    use ingress::{build_router, AppState};
    use serde_json::{json, Value};
    use tower::ServiceExt;
    use wiremock::matchers::{body_partial_json, header, header_exists, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use crate::support::post_event;

    async fn static_aws_config() -> aws_config::SdkConfig {
        use aws_sdk_dynamodb::config::{Credentials, Region};

        aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(Region::new("us-east-1"))
            .credentials_provider(Credentials::new("AKIDTEST", "secret", None, None, "test"))
            .load()
            .await
    }

    /// Config file -> DynamoScanStore -> LambdaInvoker, against mocked services
    #[tokio::test]
    async fn test_configured_engine_scans_and_invokes() {
        let dynamo = MockServer::start().await;
        Mock::given(method("POST"))
            .and(header("x-amz-target", "DynamoDB_20120810.Scan"))
            .and(header_exists("authorization"))
            .and(body_partial_json(json!({
                "TableName": "users-test",
                "ExpressionAttributeValues": {":f0": {"S": "show"}}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_raw(
                json!({
                    "Items": [
                        {"connection_id": {"S": "a"}},
                        {"connection_id": {"S": "b"}},
                        {"connection_id": {"S": "c"}}
                    ],
                    "Count": 3
                })
                .to_string(),
                "application/x-amz-json-1.0",
            ))
            .expect(1)
            .mount(&dynamo)
            .await;

        let lambda = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/2015-03-31/functions/ws-message-sender/invocations"))
            .and(header("x-amz-invocation-type", "Event"))
            .and(header_exists("authorization"))
            .respond_with(ResponseTemplate::new(202))
            .expect(1)
            .mount(&lambda)
            .await;

        let toml = format!(
            r#"
[directory]
endpoint = "{}"
users_table = "users-test"

[invocation]
function = "ws-message-sender"
endpoint = "{}"
"#,
            dynamo.uri(),
            lambda.uri()
        );
        let config = ConfigLoader::load_from_str(&toml, ConfigFormat::Toml).unwrap();
        let sdk = static_aws_config().await;
        let engine = dispatcher::create_engine(&config, &sdk).unwrap();
        let state = AppState::new(engine);

        let response = build_router(state.clone())
            .oneshot(post_event(json!({
                "event_subdomain": "show",
                "message": {"text": "hello"}
            })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(state.drain(Duration::from_secs(5)).await);

        let invocations = lambda.received_requests().await.unwrap();
        assert_eq!(invocations.len(), 1);
        let body: Value = serde_json::from_slice(&invocations[0].body).unwrap();
        assert_eq!(
            body,
            json!({"message": {"text": "hello"}, "connection_ids": ["a", "b", "c"]})
        );
    }
}
