//! # Dispatcher
//!
//! Dispatch-and-fan-out engine.
//!
//! Responsibilities:
//! - Route each event to the invocation path or the peer-broadcast path
//! - Plan invocation batches under the per-call limit
//! - Fan out concurrently, isolating failed batches and slow peers
//!
//! Nothing here reports back to the HTTP caller; outcomes are logged and counted.

pub mod error;
pub mod fanout;
pub mod planner;
pub mod router;
pub mod sinks;

#[cfg(test)]
mod testing;

pub use contracts::{EventDispatcher, Invoker, PeerPublisher};
pub use error::DispatchError;
pub use fanout::{FanOutSummary, InvocationFanOut, PeerFanOut};
pub use planner::{plan, BatchPlan, BatchPolicy};
pub use router::{
    create_dry_run_engine, create_engine, load_aws_config, AwsDispatchEngine, DispatchEngine,
    DispatchReport,
};
pub use sinks::{HttpPeerPublisher, LambdaInvoker, LogInvoker};
