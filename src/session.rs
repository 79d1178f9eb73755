//! Session table — bidirectional partner map
//!
//! Every session is stored as two directed entries (A→B and B→A). Both
//! are written by [`SessionTable::pair`] and removed by
//! [`SessionTable::teardown`]; no other method mutates the table, so a
//! half-entry can never be observed.

use crate::types::{ConnectionId, SessionEntry};
use std::collections::HashMap;

#[derive(Debug, Default)]
pub struct SessionTable {
    entries: HashMap<ConnectionId, SessionEntry>,
}

impl SessionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a session between `a` and `b`, caching each side's view of
    /// the other's display name
    ///
    /// Callers must ensure neither side is already paired.
    pub fn pair(&mut self, a: &ConnectionId, a_name: &str, b: &ConnectionId, b_name: &str) {
        debug_assert!(a != b, "a connection cannot pair with itself");
        debug_assert!(!self.contains(a) && !self.contains(b));

        self.entries.insert(
            a.clone(),
            SessionEntry {
                partner: b.clone(),
                partner_name: b_name.to_string(),
            },
        );
        self.entries.insert(
            b.clone(),
            SessionEntry {
                partner: a.clone(),
                partner_name: a_name.to_string(),
            },
        );
    }

    pub fn contains(&self, conn: &ConnectionId) -> bool {
        self.entries.contains_key(conn)
    }

    pub fn get(&self, conn: &ConnectionId) -> Option<&SessionEntry> {
        self.entries.get(conn)
    }

    pub fn partner_of(&self, conn: &ConnectionId) -> Option<&ConnectionId> {
        self.entries.get(conn).map(|e| &e.partner)
    }

    /// Remove both directed entries of `conn`'s session, returning the
    /// entry that belonged to `conn`
    pub fn teardown(&mut self, conn: &ConnectionId) -> Option<SessionEntry> {
        let entry = self.entries.remove(conn)?;
        if let Some(back) = self.entries.get(&entry.partner) {
            if &back.partner == conn {
                self.entries.remove(&entry.partner);
            }
        }
        Some(entry)
    }

    /// Number of active pairs
    pub fn sessions(&self) -> usize {
        self.entries.len() / 2
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Check the symmetry invariant across the whole table
    pub fn is_symmetric(&self) -> bool {
        self.entries.iter().all(|(conn, entry)| {
            self.entries
                .get(&entry.partner)
                .is_some_and(|back| &back.partner == conn)
        })
    }
}
