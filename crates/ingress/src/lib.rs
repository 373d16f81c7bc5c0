//! # Ingress
//!
//! HTTP surface of the dispatcher.
//!
//! Responsibilities:
//! - Decode and validate inbound events, answer `{"success": bool}` at once
//! - Hand every accepted event to a detached, cancellable dispatch task
//! - Drain those tasks on shutdown
//!
//! Routes:
//! - `POST /`: accept an event
//! - `GET /health`: liveness and version

pub mod error;
pub mod handlers;
pub mod routes;
pub mod server;
pub mod state;

pub use error::IngressError;
pub use handlers::Ack;
pub use routes::build_router;
pub use server::{bind, serve};
pub use state::AppState;
