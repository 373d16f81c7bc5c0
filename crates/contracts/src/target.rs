//! Delivery targets and peer servers produced by the directory

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque recipient handle (e.g. a websocket connection id)
///
/// Never interpreted; only batched and forwarded.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeliveryTarget(String);

impl DeliveryTarget {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for DeliveryTarget {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for DeliveryTarget {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl fmt::Display for DeliveryTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A directly addressable peer server
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct PeerServer {
    pub address: String,
    pub port: u16,
}

impl PeerServer {
    /// Build a peer from raw directory values.
    ///
    /// Returns `None` for an empty address or a port outside `1..=65535`.
    pub fn new(address: impl Into<String>, port: i64) -> Option<Self> {
        let address = address.into();
        if address.is_empty() {
            return None;
        }
        let port = u16::try_from(port).ok().filter(|p| *p > 0)?;
        Some(Self { address, port })
    }

    /// `http://{address}:{port}{path}`
    pub fn url(&self, path: &str) -> String {
        format!("http://{}:{}{}", self.address, self.port, path)
    }
}

impl fmt::Display for PeerServer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.address, self.port)
    }
}

/// Resolved peer servers keyed by address
///
/// Inserting an address twice keeps the last port.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PeerSet {
    servers: BTreeMap<String, u16>,
}

impl PeerSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a peer, overwriting any previous port for the same address
    pub fn insert(&mut self, peer: PeerServer) {
        self.servers.insert(peer.address, peer.port);
    }

    pub fn len(&self) -> usize {
        self.servers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.servers.is_empty()
    }

    pub fn port_of(&self, address: &str) -> Option<u16> {
        self.servers.get(address).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = PeerServer> + '_ {
        self.servers.iter().map(|(address, port)| PeerServer {
            address: address.clone(),
            port: *port,
        })
    }
}

impl FromIterator<PeerServer> for PeerSet {
    fn from_iter<T: IntoIterator<Item = PeerServer>>(iter: T) -> Self {
        let mut set = Self::new();
        for peer in iter {
            set.insert(peer);
        }
        set
    }
}
