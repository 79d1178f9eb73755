//! Outbox — the boundary between chat state and the transport
//!
//! The chat state never talks to sockets. It asks an `Outbox` whether a
//! connection is still reachable and hands it outbound events. The
//! production implementation is a table of tokio channels, one per
//! connection; `MemoryOutbox` records events for tests.

use crate::protocol::ServerEvent;
use crate::types::ConnectionId;
use std::collections::{HashMap, HashSet};
use tokio::sync::mpsc;

/// Delivery and liveness for connections
pub trait Outbox: Send {
    /// Handle returned to the transport when a connection is registered
    type Receiver;

    /// Register a connection and return its outbound handle
    fn attach(&mut self, conn: &ConnectionId) -> Self::Receiver;

    /// Forget a connection; later deliveries to it are dropped
    fn detach(&mut self, conn: &ConnectionId);

    /// Whether `conn` is registered, reachable or not
    fn is_attached(&self, conn: &ConnectionId) -> bool;

    /// Whether events sent to `conn` can still reach it
    fn is_live(&self, conn: &ConnectionId) -> bool;

    /// Queue an event for `conn`. Returns false if it could not be delivered.
    fn deliver(&mut self, conn: &ConnectionId, event: ServerEvent) -> bool;

    /// Number of registered connections
    fn connections(&self) -> usize;
}

/// Channel-backed outbox used by the hub
///
/// A connection is live while it is registered and the transport still
/// holds the receiving half of its channel.
#[derive(Debug, Default)]
pub struct ConnectionTable {
    senders: HashMap<ConnectionId, mpsc::UnboundedSender<ServerEvent>>,
}

impl ConnectionTable {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Outbox for ConnectionTable {
    type Receiver = mpsc::UnboundedReceiver<ServerEvent>;

    fn attach(&mut self, conn: &ConnectionId) -> Self::Receiver {
        let (tx, rx) = mpsc::unbounded_channel();
        if self.senders.insert(conn.clone(), tx).is_some() {
            tracing::warn!(conn = %conn, "Connection re-attached, previous channel dropped");
        }
        rx
    }

    fn detach(&mut self, conn: &ConnectionId) {
        self.senders.remove(conn);
    }

    fn is_attached(&self, conn: &ConnectionId) -> bool {
        self.senders.contains_key(conn)
    }

    fn is_live(&self, conn: &ConnectionId) -> bool {
        self.senders.get(conn).is_some_and(|tx| !tx.is_closed())
    }

    fn deliver(&mut self, conn: &ConnectionId, event: ServerEvent) -> bool {
        match self.senders.get(conn) {
            Some(tx) => tx.send(event).is_ok(),
            None => {
                tracing::debug!(conn = %conn, "Dropping event for unknown connection");
                false
            }
        }
    }

    fn connections(&self) -> usize {
        self.senders.len()
    }
}

/// In-memory outbox for testing
///
/// Records every delivered event per connection. A connection can be
/// marked unreachable with [`MemoryOutbox::sever`] to simulate a socket
/// that died before its disconnect was processed.
#[derive(Debug, Default)]
pub struct MemoryOutbox {
    attached: HashSet<ConnectionId>,
    severed: HashSet<ConnectionId>,
    delivered: HashMap<ConnectionId, Vec<ServerEvent>>,
}

impl MemoryOutbox {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make a connection unreachable without detaching it
    pub fn sever(&mut self, conn: &ConnectionId) {
        self.severed.insert(conn.clone());
    }

    /// Drain the events delivered to `conn` so far
    pub fn take(&mut self, conn: &ConnectionId) -> Vec<ServerEvent> {
        self.delivered.remove(conn).unwrap_or_default()
    }

    /// Events delivered to `conn` so far, without draining
    pub fn events(&self, conn: &ConnectionId) -> &[ServerEvent] {
        self.delivered.get(conn).map(Vec::as_slice).unwrap_or(&[])
    }
}

impl Outbox for MemoryOutbox {
    type Receiver = ();

    fn attach(&mut self, conn: &ConnectionId) -> Self::Receiver {
        self.attached.insert(conn.clone());
        self.severed.remove(conn);
    }

    fn detach(&mut self, conn: &ConnectionId) {
        self.attached.remove(conn);
    }

    fn is_attached(&self, conn: &ConnectionId) -> bool {
        self.attached.contains(conn)
    }

    fn is_live(&self, conn: &ConnectionId) -> bool {
        self.is_attached(conn) && !self.severed.contains(conn)
    }

    fn deliver(&mut self, conn: &ConnectionId, event: ServerEvent) -> bool {
        if !self.is_live(conn) {
            return false;
        }
        self.delivered.entry(conn.clone()).or_default().push(event);
        true
    }

    fn connections(&self) -> usize {
        self.attached.len()
    }
}
