//! Matchmaker — pairs waiting connections first-come, first-served

use crate::error::{ChatError, Result};
use crate::outbox::Outbox;
use crate::protocol::ServerEvent;
use crate::state::ChatState;
use crate::types::ConnectionId;

impl<O: Outbox> ChatState<O> {
    /// Pair `conn` with the longest-waiting connection, or queue it
    ///
    /// Fails with `IdentityRequired` before `AlreadyInSession`. Queued
    /// candidates that have gone unreachable, lost their identity, or are
    /// otherwise unusable are discarded and the next one is tried; the
    /// pool shrinks on every pass so the loop is bounded by its length.
    pub fn request_match(&mut self, conn: &ConnectionId) -> Result<()> {
        let name = self
            .identities
            .name_of(conn)
            .ok_or(ChatError::IdentityRequired)?
            .to_string();

        if self.sessions.contains(conn) {
            return Err(ChatError::AlreadyInSession);
        }

        if self.pool.contains(conn) {
            tracing::debug!(conn = %conn, "Already waiting");
            self.outbox.deliver(conn, ServerEvent::waiting());
            return Ok(());
        }

        while let Some(candidate) = self.pool.pop() {
            let Some(partner_name) = self.usable_partner(conn, &candidate) else {
                tracing::warn!(
                    conn = %conn,
                    candidate = %candidate,
                    "Discarding stale waiting entry"
                );
                continue;
            };

            self.sessions.pair(conn, &name, &candidate, &partner_name);
            self.outbox
                .deliver(conn, ServerEvent::chat_started(partner_name.as_str()));
            self.outbox
                .deliver(&candidate, ServerEvent::chat_started(name.as_str()));

            tracing::info!(
                conn = %conn,
                partner = %candidate,
                name = %name,
                partner_name = %partner_name,
                "Chat started"
            );
            return Ok(());
        }

        self.pool.push(conn.clone());
        self.outbox.deliver(conn, ServerEvent::waiting());
        tracing::debug!(conn = %conn, waiting = self.pool.len(), "Waiting for partner");
        Ok(())
    }

    /// Remove `conn` from the waiting pool; no-op if it is not queued
    pub fn cancel_wait(&mut self, conn: &ConnectionId) -> bool {
        let removed = self.pool.remove(conn);
        if removed {
            tracing::debug!(conn = %conn, "Left waiting pool");
        }
        removed
    }

    /// Display name of `candidate` if it can be paired with `conn`
    fn usable_partner(&self, conn: &ConnectionId, candidate: &ConnectionId) -> Option<String> {
        if candidate == conn
            || self.sessions.contains(candidate)
            || !self.outbox.is_live(candidate)
        {
            return None;
        }
        self.identities.name_of(candidate).map(str::to_string)
    }
}
