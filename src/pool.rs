//! Waiting pool — FIFO queue of connections seeking a partner

use crate::types::ConnectionId;
use std::collections::VecDeque;

/// Ordered queue of waiting connections
///
/// A connection appears at most once; `push` on a queued connection
/// keeps its original position.
#[derive(Debug, Default)]
pub struct WaitingPool {
    queue: VecDeque<ConnectionId>,
}

impl WaitingPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enqueue at the tail. Returns false if the connection was already queued.
    pub fn push(&mut self, conn: ConnectionId) -> bool {
        if self.contains(&conn) {
            return false;
        }
        self.queue.push_back(conn);
        true
    }

    /// Take the longest-waiting connection
    pub fn pop(&mut self) -> Option<ConnectionId> {
        self.queue.pop_front()
    }

    /// Remove a connection wherever it sits. Returns whether it was queued.
    pub fn remove(&mut self, conn: &ConnectionId) -> bool {
        let before = self.queue.len();
        self.queue.retain(|c| c != conn);
        self.queue.len() != before
    }

    pub fn contains(&self, conn: &ConnectionId) -> bool {
        self.queue.iter().any(|c| c == conn)
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Queued connections, head first
    pub fn iter(&self) -> impl Iterator<Item = &ConnectionId> {
        self.queue.iter()
    }
}
