//! Sink implementations
//!
//! Contains LambdaInvoker, LogInvoker, and HttpPeerPublisher.

mod invoker;
mod log;
mod peer;

pub use self::invoker::LambdaInvoker;
pub use self::log::LogInvoker;
pub use self::peer::HttpPeerPublisher;
