//! Core chat types
//!
//! All serialized types use camelCase JSON for wire compatibility.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque, transport-assigned token for one live connection
///
/// Generated as `conn-<uuid>` so identifiers are never reused within
/// the lifetime of a process.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConnectionId(String);

impl ConnectionId {
    /// Allocate a fresh identifier
    pub fn generate() -> Self {
        Self(format!("conn-{}", uuid::Uuid::new_v4()))
    }

    /// Wrap an existing token (tests, external transports)
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ConnectionId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// A display name registered for a connection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub connection_id: ConnectionId,
    pub display_name: String,
}

/// One directed half of a session: who the partner is and the partner's
/// display name as it was when the pair formed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionEntry {
    pub partner: ConnectionId,
    pub partner_name: String,
}

/// Snapshot of hub occupancy
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HubStats {
    /// Registered live connections
    pub connections: usize,

    /// Connections with a display name
    pub identities: usize,

    /// Connections in the waiting pool
    pub waiting: usize,

    /// Active pairs
    pub sessions: usize,
}
