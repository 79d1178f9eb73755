//! Relay — forwards messages to the sender's current partner

use crate::error::{ChatError, Result};
use crate::outbox::Outbox;
use crate::protocol::ServerEvent;
use crate::state::ChatState;
use crate::types::ConnectionId;
use chrono::Utc;

impl<O: Outbox> ChatState<O> {
    /// Forward `text` to `conn`'s partner, stamped with the server clock
    ///
    /// The sender never receives its own message back. If the partner is
    /// no longer reachable the session is torn down, the sender is told
    /// its partner disconnected, and `PartnerUnreachable` is returned.
    pub fn send_message(&mut self, conn: &ConnectionId, text: &str) -> Result<()> {
        let partner = self
            .sessions
            .partner_of(conn)
            .cloned()
            .ok_or(ChatError::NotInSession)?;

        let sender_display_name = self
            .identities
            .name_of(conn)
            .unwrap_or_else(|| self.identities.default_name())
            .to_string();

        let delivered = self.outbox.is_live(&partner)
            && self.outbox.deliver(
                &partner,
                ServerEvent::ReceiveMessage {
                    text: text.to_string(),
                    timestamp: Utc::now(),
                    sender_display_name,
                },
            );

        if !delivered {
            tracing::info!(conn = %conn, partner = %partner, "Partner unreachable, ending chat");
            self.teardown_session(conn);
            self.outbox.deliver(conn, ServerEvent::partner_left());
            return Err(ChatError::PartnerUnreachable);
        }

        tracing::trace!(conn = %conn, partner = %partner, len = text.len(), "Message relayed");
        Ok(())
    }
}
