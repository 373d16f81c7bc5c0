//! DispatchEngine - routes one event to exactly one delivery path

use std::time::Instant;

use aws_config::{BehaviorVersion, SdkConfig};
use aws_sdk_lambda::config::Region;
use bytes::Bytes;
use contracts::{
    BackendSelector, ContractError, DispatcherConfig, EventDispatcher, InboundEvent, Invoker,
    PeerPublisher,
};
use directory::{ConnectionDirectory, DynamoScanStore, RecordStore};
use observability::{record_dispatch_aborted, record_dispatch_duration_ms, record_targets_resolved};
use tracing::{error, info, instrument, warn};

use crate::error::DispatchError;
use crate::fanout::{FanOutSummary, InvocationFanOut, PeerFanOut};
use crate::planner::BatchPolicy;
use crate::sinks::{HttpPeerPublisher, LambdaInvoker, LogInvoker};

/// What one dispatch cycle did, for logging and tests
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchReport {
    Invocation {
        targets: usize,
        summary: FanOutSummary,
    },
    PeerBroadcast {
        peers: usize,
        summary: FanOutSummary,
    },
    /// Resolution failed or nothing to broadcast to; no delivery attempted
    Aborted {
        backend: BackendSelector,
        reason: String,
    },
}

impl DispatchReport {
    pub fn backend(&self) -> BackendSelector {
        match self {
            Self::Invocation { .. } => BackendSelector::Invocation,
            Self::PeerBroadcast { .. } => BackendSelector::PeerBroadcast,
            Self::Aborted { backend, .. } => *backend,
        }
    }

    pub fn summary(&self) -> Option<&FanOutSummary> {
        match self {
            Self::Invocation { summary, .. } | Self::PeerBroadcast { summary, .. } => Some(summary),
            Self::Aborted { .. } => None,
        }
    }
}

/// Directory + both delivery paths
pub struct DispatchEngine<S, I, P> {
    directory: ConnectionDirectory<S>,
    invocation: InvocationFanOut<I>,
    broadcast: PeerFanOut<P>,
}

impl<S, I, P> DispatchEngine<S, I, P> {
    pub fn new(
        directory: ConnectionDirectory<S>,
        invocation: InvocationFanOut<I>,
        broadcast: PeerFanOut<P>,
    ) -> Self {
        Self {
            directory,
            invocation,
            broadcast,
        }
    }

    pub fn directory(&self) -> &ConnectionDirectory<S> {
        &self.directory
    }

    pub fn invocation(&self) -> &InvocationFanOut<I> {
        &self.invocation
    }

    pub fn broadcast(&self) -> &PeerFanOut<P> {
        &self.broadcast
    }
}

impl<S, I, P> DispatchEngine<S, I, P>
where
    S: RecordStore + Send + Sync + 'static,
    I: Invoker + Send + Sync + 'static,
    P: PeerPublisher + Send + Sync + 'static,
{
    /// Run one dispatch cycle for `event`
    ///
    /// Empty or unrecognized backend selectors take the invocation path.
    /// Failures are logged and folded into the report, never returned.
    #[instrument(
        name = "dispatch_engine_route",
        skip(self, event),
        fields(tenant = %event.tenant_key, gateway_type = %event.backend)
    )]
    pub async fn route(&self, event: &InboundEvent) -> DispatchReport {
        let backend = match event.backend_selector() {
            Some(backend) => backend,
            None => {
                info!(gateway_type = %event.backend, "using default backend");
                BackendSelector::default()
            }
        };
        info!(backend = backend.as_str(), "Routing event");

        let started = Instant::now();
        let result = match backend {
            BackendSelector::Invocation => self.run_invocation(event).await,
            BackendSelector::PeerBroadcast => self.run_broadcast(event).await,
        };
        record_dispatch_duration_ms(backend, started.elapsed().as_secs_f64() * 1000.0);

        match result {
            Ok(report) => {
                if let Some(summary) = report.summary() {
                    info!(
                        backend = backend.as_str(),
                        succeeded = summary.succeeded(),
                        failed = summary.failed(),
                        skipped = summary.skipped,
                        "Dispatch finished"
                    );
                }
                report
            }
            Err(e) => {
                error!(backend = backend.as_str(), error = %e, "Dispatch aborted");
                record_dispatch_aborted(backend);
                DispatchReport::Aborted {
                    backend,
                    reason: e.to_string(),
                }
            }
        }
    }

    async fn run_invocation(&self, event: &InboundEvent) -> Result<DispatchReport, DispatchError> {
        let targets = self
            .directory
            .resolve_targets(&event.tenant_key, event.audience_selector())
            .await?;
        record_targets_resolved(targets.len());
        info!(connections = targets.len(), "Connections found");

        let summary = self.invocation.deliver(&event.payload, &targets).await;
        Ok(DispatchReport::Invocation {
            targets: targets.len(),
            summary,
        })
    }

    async fn run_broadcast(&self, event: &InboundEvent) -> Result<DispatchReport, DispatchError> {
        let peers = self.directory.resolve_peers().await?;
        if peers.is_empty() {
            return Err(DispatchError::NoPeers);
        }

        let body = serde_json::to_vec(event)
            .map(Bytes::from)
            .map_err(|e| ContractError::serialize("chat server event", e.to_string()))?;

        let summary = self.broadcast.broadcast(&peers, body).await;
        if summary.failed() > 0 {
            warn!(
                failed = summary.failed(),
                peers = peers.len(),
                "Some chat servers did not receive the event"
            );
        }
        Ok(DispatchReport::PeerBroadcast {
            peers: peers.len(),
            summary,
        })
    }
}

impl<S, I, P> EventDispatcher for DispatchEngine<S, I, P>
where
    S: RecordStore + Send + Sync + 'static,
    I: Invoker + Send + Sync + 'static,
    P: PeerPublisher + Send + Sync + 'static,
{
    async fn dispatch(&self, event: InboundEvent) {
        self.route(&event).await;
    }
}

/// Engine wired to the production collaborators
pub type AwsDispatchEngine<I = LambdaInvoker> = DispatchEngine<DynamoScanStore, I, HttpPeerPublisher>;

/// Load the shared AWS configuration (credential chain, retries, timeouts)
///
/// The directory region is the base region; each client sets its own.
pub async fn load_aws_config(config: &DispatcherConfig) -> SdkConfig {
    aws_config::defaults(BehaviorVersion::latest())
        .region(Region::new(config.directory.region.clone()))
        .load()
        .await
}

/// Build the production engine from configuration
#[instrument(name = "dispatcher_create_engine", skip(config, sdk))]
pub fn create_engine(
    config: &DispatcherConfig,
    sdk: &SdkConfig,
) -> Result<AwsDispatchEngine, DispatchError> {
    let invoker = LambdaInvoker::from_sdk_config(sdk, &config.invocation);
    assemble(config, sdk, invoker)
}

/// Same as [`create_engine`], but batches are only logged
#[instrument(name = "dispatcher_create_dry_run_engine", skip(config, sdk))]
pub fn create_dry_run_engine(
    config: &DispatcherConfig,
    sdk: &SdkConfig,
) -> Result<AwsDispatchEngine<LogInvoker>, DispatchError> {
    let invoker = LogInvoker::new(&config.invocation.function);
    assemble(config, sdk, invoker)
}

fn assemble<I>(
    config: &DispatcherConfig,
    sdk: &SdkConfig,
    invoker: I,
) -> Result<AwsDispatchEngine<I>, DispatchError> {
    let client = reqwest::Client::builder()
        .build()
        .map_err(|e| DispatchError::sink_creation("http-client", e.to_string()))?;

    let store = DynamoScanStore::from_sdk_config(sdk, &config.directory);
    let directory = ConnectionDirectory::from_config(store, &config.directory);
    let invocation = InvocationFanOut::new(invoker, BatchPolicy::from(&config.invocation));
    let publisher = HttpPeerPublisher::from_config(client, &config.broadcast);
    let broadcast = PeerFanOut::new(publisher, config.broadcast.deadline());

    info!(
        function = %config.invocation.function,
        users_table = %config.directory.users_table,
        servers_table = %config.directory.servers_table,
        "Dispatch engine created"
    );
    Ok(DispatchEngine::new(directory, invocation, broadcast))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{static_aws_config, RecordingInvoker, RecordingPublisher};
    use contracts::{AudienceSelector, INVOCATION_BACKEND, PEER_BROADCAST_BACKEND};
    use directory::{DirectoryTables, MemoryStore};
    use serde_json::{json, Value};
    use std::time::Duration;

    type TestEngine = DispatchEngine<MemoryStore, RecordingInvoker, RecordingPublisher>;

    fn tables() -> DirectoryTables {
        DirectoryTables {
            users: "users".into(),
            servers: "servers".into(),
            chat_config: "config".into(),
        }
    }

    fn users(n: usize) -> Vec<Value> {
        (0..n)
            .map(|i| {
                json!({
                    "connection_id": format!("c{i}"),
                    "event_subdomain": "show",
                    "is_organizer": i == 0
                })
            })
            .collect()
    }

    fn engine(store: MemoryStore, invoker: RecordingInvoker) -> TestEngine {
        DispatchEngine::new(
            ConnectionDirectory::new(store, tables()),
            InvocationFanOut::new(invoker, BatchPolicy::default()),
            PeerFanOut::new(RecordingPublisher::new(), Duration::from_secs(5)),
        )
    }

    fn store_with(users_n: usize, servers: Vec<Value>) -> MemoryStore {
        MemoryStore::new(40)
            .with_table("users", users(users_n))
            .with_table("servers", servers)
    }

    #[tokio::test]
    async fn test_default_unknown_and_explicit_invocation_are_equivalent() {
        for selector in ["", INVOCATION_BACKEND, "carrier-pigeon"] {
            let engine = engine(store_with(5, vec![]), RecordingInvoker::new());
            let event = InboundEvent::new("show", json!({"n": 1})).with_backend(selector);

            let report = engine.route(&event).await;

            assert!(
                matches!(report, DispatchReport::Invocation { targets: 5, .. }),
                "selector {selector:?}"
            );
            let calls = engine.invocation().invoker().calls();
            assert_eq!(calls.len(), 1);
            assert_eq!(calls[0]["message"], json!({"n": 1}));
            assert!(engine.broadcast().publisher().calls().is_empty());
        }
    }

    #[tokio::test]
    async fn test_audience_is_passed_to_directory() {
        let engine = engine(store_with(5, vec![]), RecordingInvoker::new());
        let event = InboundEvent::new("show", json!(null)).with_audience("organizer");
        assert_eq!(event.audience_selector(), AudienceSelector::Organizer);

        engine.route(&event).await;

        let calls = engine.invocation().invoker().calls();
        assert_eq!(calls[0]["connection_ids"], json!(["c0"]));
    }

    #[tokio::test]
    async fn test_no_connections_still_invokes_once() {
        let engine = engine(store_with(0, vec![]), RecordingInvoker::new());
        let report = engine.route(&InboundEvent::new("show", json!(1))).await;

        match report {
            DispatchReport::Invocation { targets, summary } => {
                assert_eq!(targets, 0);
                assert_eq!(summary.succeeded(), 1);
            }
            other => panic!("unexpected report {other:?}"),
        }
        let calls = engine.invocation().invoker().calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0], json!({"message": 1, "connection_ids": []}));
    }

    #[tokio::test]
    async fn test_resolution_failure_aborts() {
        // No users table at all
        let engine = engine(MemoryStore::new(10), RecordingInvoker::new());
        let report = engine.route(&InboundEvent::new("show", json!(1))).await;

        assert!(matches!(
            report,
            DispatchReport::Aborted {
                backend: BackendSelector::Invocation,
                ..
            }
        ));
        assert!(engine.invocation().invoker().calls().is_empty());
    }

    #[tokio::test]
    async fn test_zero_peers_aborts_without_calls() {
        let engine = engine(store_with(3, vec![]), RecordingInvoker::new());
        let event = InboundEvent::new("show", json!(1)).with_backend(PEER_BROADCAST_BACKEND);

        let report = engine.route(&event).await;

        match report {
            DispatchReport::Aborted { backend, reason } => {
                assert_eq!(backend, BackendSelector::PeerBroadcast);
                assert!(reason.contains("no chat servers"));
            }
            other => panic!("unexpected report {other:?}"),
        }
        assert!(engine.broadcast().publisher().calls().is_empty());
        assert!(engine.invocation().invoker().calls().is_empty());
    }

    #[tokio::test]
    async fn test_broadcast_posts_full_event_to_each_peer() {
        let servers = vec![
            json!({"ip": "10.0.0.1", "port": 7000}),
            json!({"ip": "10.0.0.2", "port": 7000}),
        ];
        let engine = engine(store_with(3, servers), RecordingInvoker::new());
        let event = InboundEvent::new("show", json!({"text": "hello"}))
            .with_audience("attendance")
            .with_backend(PEER_BROADCAST_BACKEND);

        let report = engine.route(&event).await;

        assert!(matches!(report, DispatchReport::PeerBroadcast { peers: 2, .. }));
        let calls = engine.broadcast().publisher().calls();
        assert_eq!(calls.len(), 2);
        for (_, body) in calls {
            assert_eq!(
                body,
                json!({
                    "event_subdomain": "show",
                    "audience_type": "attendance",
                    "gateway_type": "chat-server-v2",
                    "message": {"text": "hello"}
                })
            );
        }
        assert!(engine.invocation().invoker().calls().is_empty());
    }

    #[tokio::test]
    async fn test_dispatch_trait_runs_route() {
        let engine = engine(store_with(2, vec![]), RecordingInvoker::new());
        engine.dispatch(InboundEvent::new("show", json!(1))).await;
        assert_eq!(engine.invocation().invoker().calls().len(), 1);
    }

    #[tokio::test]
    async fn test_create_engine_from_config() {
        let mut config = DispatcherConfig::default();
        config.invocation.function = "ws-message-sender".into();
        config.invocation.batch_limit = 50;
        let sdk = static_aws_config().await;

        let engine = create_engine(&config, &sdk).unwrap();
        assert_eq!(engine.invocation().invoker().name(), "ws-message-sender");
        assert_eq!(engine.invocation().policy().limit, 50);
        assert_eq!(engine.broadcast().deadline(), Duration::from_secs(5));

        let dry = create_dry_run_engine(&config, &sdk).unwrap();
        assert_eq!(dry.invocation().invoker().invocations(), 0);
    }
}
