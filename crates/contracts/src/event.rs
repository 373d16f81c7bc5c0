//! InboundEvent - HTTP ingress output
//!
//! Wire field names follow the connector that posts events:
//! `event_subdomain`, `audience_type`, `gateway_type`, `message`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::ContractError;

/// Selector value for the invocation backend
pub const INVOCATION_BACKEND: &str = "api-gateway";

/// Selector value for the peer-broadcast backend
pub const PEER_BROADCAST_BACKEND: &str = "chat-server-v2";

/// Audience value selecting privileged connections
pub const AUDIENCE_ORGANIZER: &str = "organizer";

/// Audience value selecting regular connections
pub const AUDIENCE_ATTENDANCE: &str = "attendance";

/// A message for an audience of a tenant
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InboundEvent {
    /// Owning tenant (required, non-empty)
    #[serde(rename = "event_subdomain", default)]
    pub tenant_key: String,

    /// Raw audience selector (empty = everyone)
    #[serde(rename = "audience_type", default)]
    pub audience: String,

    /// Raw backend selector (empty = default backend)
    #[serde(
        rename = "gateway_type",
        default,
        skip_serializing_if = "String::is_empty"
    )]
    pub backend: String,

    /// Opaque payload, forwarded unmodified
    #[serde(rename = "message", default)]
    pub payload: Value,
}

impl InboundEvent {
    /// Create an event for a tenant with the given payload
    pub fn new(tenant_key: impl Into<String>, payload: Value) -> Self {
        Self {
            tenant_key: tenant_key.into(),
            payload,
            ..Default::default()
        }
    }

    /// Set the raw audience selector
    pub fn with_audience(mut self, audience: impl Into<String>) -> Self {
        self.audience = audience.into();
        self
    }

    /// Set the raw backend selector
    pub fn with_backend(mut self, backend: impl Into<String>) -> Self {
        self.backend = backend.into();
        self
    }

    /// The only hard precondition: a non-empty tenant key
    pub fn validate(&self) -> Result<(), ContractError> {
        if self.tenant_key.is_empty() {
            return Err(ContractError::MissingTenantKey);
        }
        Ok(())
    }

    /// Parsed audience selector
    pub fn audience_selector(&self) -> AudienceSelector {
        AudienceSelector::parse(&self.audience)
    }

    /// Parsed backend selector, `None` when empty or unrecognized
    pub fn backend_selector(&self) -> Option<BackendSelector> {
        BackendSelector::parse(&self.backend)
    }
}

/// Audience sub-population of a tenant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AudienceSelector {
    /// No audience filter
    #[default]
    All,
    /// Privileged connections only
    Organizer,
    /// Regular connections only
    Attendance,
}

impl AudienceSelector {
    /// Parse a raw selector. Unrecognized values mean "no filter".
    pub fn parse(raw: &str) -> Self {
        match raw {
            AUDIENCE_ORGANIZER => Self::Organizer,
            AUDIENCE_ATTENDANCE => Self::Attendance,
            _ => Self::All,
        }
    }

    /// Value of the privileged-audience flag to filter on, if any
    pub fn privileged_flag(&self) -> Option<bool> {
        match self {
            Self::All => None,
            Self::Organizer => Some(true),
            Self::Attendance => Some(false),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Organizer => AUDIENCE_ORGANIZER,
            Self::Attendance => AUDIENCE_ATTENDANCE,
        }
    }
}

/// Delivery backend an event is routed to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BackendSelector {
    /// Size-bounded invocation backend
    #[default]
    Invocation,
    /// Fixed set of peer servers
    PeerBroadcast,
}

impl BackendSelector {
    /// Parse a raw selector, `None` when empty or unrecognized
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            INVOCATION_BACKEND => Some(Self::Invocation),
            PEER_BROADCAST_BACKEND => Some(Self::PeerBroadcast),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Invocation => INVOCATION_BACKEND,
            Self::PeerBroadcast => PEER_BROADCAST_BACKEND,
        }
    }
}
