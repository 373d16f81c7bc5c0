//! Request handlers

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use bytes::Bytes;
use contracts::{EventDispatcher, InboundEvent};
use observability::{record_event_accepted, record_event_rejected};
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::state::AppState;

/// Body of every `POST /` response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Ack {
    pub success: bool,
}

impl Ack {
    fn accepted() -> (StatusCode, Json<Ack>) {
        (StatusCode::OK, Json(Ack { success: true }))
    }

    fn rejected() -> (StatusCode, Json<Ack>) {
        record_event_rejected();
        (StatusCode::BAD_REQUEST, Json(Ack { success: false }))
    }
}

/// POST / - decode, validate, hand off, acknowledge
///
/// The body is decoded as JSON whatever the declared content type.
pub async fn take_in<D>(State(state): State<AppState<D>>, body: Bytes) -> (StatusCode, Json<Ack>)
where
    D: EventDispatcher + Send + Sync + 'static,
{
    let event: InboundEvent = match serde_json::from_slice(&body) {
        Ok(event) => event,
        Err(e) => {
            warn!(error = %e, "Unable to decode request body");
            return Ack::rejected();
        }
    };

    if let Err(e) = event.validate() {
        warn!(error = %e, "Rejecting event");
        return Ack::rejected();
    }

    info!(
        tenant = %event.tenant_key,
        audience = %event.audience,
        gateway_type = %event.backend,
        "Request decoded"
    );
    record_event_accepted(event.backend_selector());
    state.spawn_dispatch(event);

    Ack::accepted()
}

/// GET /health
pub async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
