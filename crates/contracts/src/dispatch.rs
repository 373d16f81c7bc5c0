//! EventDispatcher trait - seam between the HTTP ingress and the engine

use crate::InboundEvent;

/// Consumes a validated event after the caller has been acknowledged.
///
/// Implementations log failures; nothing is returned to the caller.
#[trait_variant::make(EventDispatcher: Send)]
pub trait LocalEventDispatcher {
    async fn dispatch(&self, event: InboundEvent);
}
