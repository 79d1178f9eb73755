//! Connection lifecycle — registration, session teardown, and full cleanup

use crate::outbox::Outbox;
use crate::protocol::ServerEvent;
use crate::state::ChatState;
use crate::types::{ConnectionId, SessionEntry};

impl<O: Outbox> ChatState<O> {
    /// Register a new connection under a fresh identifier
    ///
    /// The connection is greeted with a `connected` event carrying its id.
    pub fn connect(&mut self) -> (ConnectionId, O::Receiver) {
        let conn = ConnectionId::generate();
        let receiver = self.outbox.attach(&conn);
        self.outbox.deliver(
            &conn,
            ServerEvent::Connected {
                connection_id: conn.clone(),
            },
        );
        tracing::info!(conn = %conn, "User connected");
        (conn, receiver)
    }

    /// Leave the current session, if any, and acknowledge
    ///
    /// The partner (if still reachable) is told its partner left. The
    /// caller always receives a `session-ended` acknowledgment, even when
    /// it had no session.
    pub fn end_session(&mut self, conn: &ConnectionId) {
        self.teardown_session(conn);
        self.outbox.deliver(conn, ServerEvent::session_ended());
    }

    /// Transport-level close: end the session, leave the pool, forget the name
    ///
    /// The connection is detached first, so no acknowledgment is sent to
    /// a socket that is already gone.
    pub fn disconnect(&mut self, conn: &ConnectionId) {
        self.outbox.detach(conn);
        self.teardown_session(conn);
        self.pool.remove(conn);
        self.identities.remove(conn);
        tracing::info!(conn = %conn, "User disconnected");
    }

    /// Remove both halves of `conn`'s session and notify the partner
    pub(crate) fn teardown_session(&mut self, conn: &ConnectionId) -> Option<SessionEntry> {
        let entry = self.sessions.teardown(conn)?;
        if self.outbox.is_live(&entry.partner) {
            self.outbox.deliver(&entry.partner, ServerEvent::partner_left());
        }
        tracing::info!(conn = %conn, partner = %entry.partner, "Chat ended");
        Some(entry)
    }
}

#[cfg(test)]
mod tests {
    use crate::outbox::{MemoryOutbox, Outbox};
    use crate::protocol::ServerEvent;
    use crate::state::{ChatState, Membership};
    use crate::types::ConnectionId;

    fn named(state: &mut ChatState<MemoryOutbox>, name: &str) -> ConnectionId {
        let (conn, _) = state.connect();
        state.set_identity(&conn, Some(name));
        state.outbox_mut().take(&conn);
        conn
    }

    fn paired(state: &mut ChatState<MemoryOutbox>) -> (ConnectionId, ConnectionId) {
        let a = named(state, "Alice");
        let b = named(state, "Bob");
        state.request_match(&a).unwrap();
        state.request_match(&b).unwrap();
        state.outbox_mut().take(&a);
        state.outbox_mut().take(&b);
        (a, b)
    }

    #[test]
    fn test_connect_greets_with_id() {
        let mut state = ChatState::new(MemoryOutbox::new());
        let (a, _) = state.connect();

        assert!(state.outbox().is_live(&a));
        assert_eq!(
            state.outbox_mut().take(&a),
            vec![ServerEvent::Connected {
                connection_id: a.clone()
            }]
        );
        assert_eq!(state.membership(&a), Membership::Idle);
    }

    #[test]
    fn test_end_session_notifies_both() {
        let mut state = ChatState::new(MemoryOutbox::new());
        let (a, b) = paired(&mut state);

        state.end_session(&a);

        assert_eq!(state.outbox_mut().take(&a), vec![ServerEvent::session_ended()]);
        assert_eq!(state.outbox_mut().take(&b), vec![ServerEvent::partner_left()]);
        assert!(state.sessions().is_empty());
        assert!(state.identities().has(&a));
        assert!(state.identities().has(&b));
    }

    #[test]
    fn test_end_session_without_session_is_benign() {
        let mut state = ChatState::new(MemoryOutbox::new());
        let a = named(&mut state, "Alice");
        let before = state.stats();

        state.end_session(&a);
        state.end_session(&a);

        assert_eq!(state.stats(), before);
        assert_eq!(
            state.outbox_mut().take(&a),
            vec![ServerEvent::session_ended(), ServerEvent::session_ended()]
        );
    }

    #[test]
    fn test_end_session_does_not_leave_pool() {
        let mut state = ChatState::new(MemoryOutbox::new());
        let a = named(&mut state, "Alice");
        state.request_match(&a).unwrap();

        state.end_session(&a);
        assert_eq!(state.membership(&a), Membership::Waiting);
    }

    #[test]
    fn test_disconnect_in_session() {
        let mut state = ChatState::new(MemoryOutbox::new());
        let (a, b) = paired(&mut state);

        state.disconnect(&a);

        assert!(state.outbox().events(&a).is_empty());
        assert_eq!(state.outbox_mut().take(&b), vec![ServerEvent::partner_left()]);
        assert_eq!(state.membership(&b), Membership::Idle);
        assert!(!state.identities().has(&a));
        assert!(state.identities().has(&b));
        assert_eq!(state.stats().connections, 1);
        assert!(state.check_invariants());
    }

    #[test]
    fn test_disconnect_while_waiting() {
        let mut state = ChatState::new(MemoryOutbox::new());
        let a = named(&mut state, "Alice");
        state.request_match(&a).unwrap();

        state.disconnect(&a);
        assert!(state.pool().is_empty());
        assert!(state.identities().is_empty());

        // The next requester waits rather than pairing with the departed one
        let b = named(&mut state, "Bob");
        state.request_match(&b).unwrap();
        assert_eq!(state.outbox_mut().take(&b), vec![ServerEvent::waiting()]);
    }

    #[test]
    fn test_disconnect_is_idempotent() {
        let mut state = ChatState::new(MemoryOutbox::new());
        let a = named(&mut state, "Alice");
        state.disconnect(&a);
        state.disconnect(&a);
        assert_eq!(state.stats().connections, 0);
    }

    #[test]
    fn test_partner_gone_before_teardown_gets_no_notice() {
        let mut state = ChatState::new(MemoryOutbox::new());
        let (a, b) = paired(&mut state);
        state.outbox_mut().sever(&b);

        state.end_session(&a);
        assert!(state.outbox().events(&b).is_empty());
        assert_eq!(state.outbox_mut().take(&a), vec![ServerEvent::session_ended()]);
    }
}
