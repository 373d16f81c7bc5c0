use axum::routing::{get, post};
use axum::Router;
use contracts::EventDispatcher;

use crate::handlers;
use crate::state::AppState;

/// Build the ingress router
pub fn build_router<D>(state: AppState<D>) -> Router
where
    D: EventDispatcher + Send + Sync + 'static,
{
    Router::new()
        .route("/", post(handlers::take_in::<D>))
        .route("/health", get(handlers::health))
        .with_state(state)
}
