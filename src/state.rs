//! Chat state — the single owner of all matchmaking tables
//!
//! `ChatState` holds the identity registry, the waiting pool, the session
//! table, and the outbox. Every operation takes `&mut self` and runs to
//! completion without awaiting, so two handlers can never interleave.
//! The matchmaker, relay, and lifecycle operations live in their own
//! modules as further `impl` blocks on this type.

use crate::config::ServerConfig;
use crate::error::{ChatError, Result};
use crate::outbox::Outbox;
use crate::pool::WaitingPool;
use crate::protocol::{ClientEvent, ServerEvent};
use crate::registry::IdentityRegistry;
use crate::session::SessionTable;
use crate::types::{ConnectionId, HubStats};

/// Where a connection currently sits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Membership {
    /// Neither waiting nor paired
    Idle,
    Waiting,
    InSession,
}

pub struct ChatState<O: Outbox> {
    pub(crate) identities: IdentityRegistry,
    pub(crate) pool: WaitingPool,
    pub(crate) sessions: SessionTable,
    pub(crate) outbox: O,
}

impl<O: Outbox> ChatState<O> {
    /// Create state with the default identity rules
    pub fn new(outbox: O) -> Self {
        Self::with_registry(outbox, IdentityRegistry::default())
    }

    /// Create state using the identity rules from `config`
    pub fn from_config(config: &ServerConfig, outbox: O) -> Self {
        Self::with_registry(
            outbox,
            IdentityRegistry::new(config.default_display_name.clone(), config.max_name_len),
        )
    }

    pub fn with_registry(outbox: O, identities: IdentityRegistry) -> Self {
        Self {
            identities,
            pool: WaitingPool::new(),
            sessions: SessionTable::new(),
            outbox,
        }
    }

    /// Register or overwrite the display name and acknowledge it
    ///
    /// A partner's cached copy of the old name is left untouched.
    pub fn set_identity(&mut self, conn: &ConnectionId, name: Option<&str>) {
        let identity = self.identities.set(conn, name);
        tracing::info!(conn = %conn, name = %identity.display_name, "Identity set");
        self.outbox
            .deliver(conn, ServerEvent::IdentitySet { success: true });
    }

    /// Route one inbound event to its operation
    ///
    /// Precondition failures are reported to `conn` as an `error` event
    /// before being returned. Events for a connection that is not attached
    /// (typically one already disconnected) are dropped untouched.
    pub fn dispatch(&mut self, conn: &ConnectionId, event: ClientEvent) -> Result<()> {
        if !self.outbox.is_attached(conn) {
            tracing::debug!(conn = %conn, event = event.name(), "Dropping event for detached connection");
            return Err(ChatError::NotConnected(conn.to_string()));
        }
        tracing::trace!(conn = %conn, event = event.name(), "Dispatching");

        let result = match event {
            ClientEvent::SetIdentity { name } => {
                self.set_identity(conn, name.as_deref());
                Ok(())
            }
            ClientEvent::RequestMatch => self.request_match(conn),
            ClientEvent::CancelMatch => {
                self.cancel_wait(conn);
                Ok(())
            }
            ClientEvent::SendMessage { text, .. } => self.send_message(conn, &text),
            ClientEvent::EndSession => {
                self.end_session(conn);
                Ok(())
            }
        };

        if let Err(ref e) = result {
            self.report(conn, e);
        }
        result
    }

    /// Send an `error` event for reportable failures; others are logged only
    pub fn report(&mut self, conn: &ConnectionId, err: &ChatError) {
        if err.is_reportable() {
            tracing::debug!(conn = %conn, error = %err, "Reporting error to client");
            self.outbox.deliver(conn, ServerEvent::error(err));
        } else {
            tracing::debug!(conn = %conn, error = %err, "Handled without client error");
        }
    }

    pub fn membership(&self, conn: &ConnectionId) -> Membership {
        if self.sessions.contains(conn) {
            Membership::InSession
        } else if self.pool.contains(conn) {
            Membership::Waiting
        } else {
            Membership::Idle
        }
    }

    /// Verify the table invariants: the session table is symmetric, no
    /// waiting connection is also paired, and the pool holds no duplicates
    pub fn check_invariants(&self) -> bool {
        let mut seen = std::collections::HashSet::new();
        let pool_ok = self
            .pool
            .iter()
            .all(|c| seen.insert(c) && !self.sessions.contains(c));
        pool_ok && self.sessions.is_symmetric()
    }

    pub fn stats(&self) -> HubStats {
        HubStats {
            connections: self.outbox.connections(),
            identities: self.identities.len(),
            waiting: self.pool.len(),
            sessions: self.sessions.sessions(),
        }
    }

    pub fn identities(&self) -> &IdentityRegistry {
        &self.identities
    }

    pub fn pool(&self) -> &WaitingPool {
        &self.pool
    }

    pub fn sessions(&self) -> &SessionTable {
        &self.sessions
    }

    pub fn outbox(&self) -> &O {
        &self.outbox
    }

    pub fn outbox_mut(&mut self) -> &mut O {
        &mut self.outbox
    }
}
