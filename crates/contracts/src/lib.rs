//! # Contracts
//!
//! Frozen interface contracts shared by every crate of the dispatcher.
//! Business crates depend on this crate only; reverse dependencies are prohibited.
//!
//! ## Dispatch model
//! - An [`InboundEvent`] names a tenant, an audience and a delivery backend
//! - The directory turns it into [`DeliveryTarget`]s or a [`PeerSet`]
//! - Sinks ([`Invoker`], [`PeerPublisher`]) deliver; outcomes are only logged

mod config;
mod delivery;
mod dispatch;
mod error;
mod event;
mod sink;
mod store;
mod target;

pub use config::*;
pub use delivery::*;
pub use dispatch::{EventDispatcher, LocalEventDispatcher};
pub use error::*;
pub use event::*;
pub use sink::{Invoker, LocalInvoker, LocalPeerPublisher, PeerPublisher};
pub use store::*;
pub use target::*;
