//! Chat hub — one task that owns all chat state
//!
//! Transports never touch the tables. They send commands to the hub over
//! a channel and the hub applies them one at a time against its
//! `ChatState`, which keeps the session symmetry and pool exclusivity
//! invariants without any locking. Commands from one connection are
//! applied in the order that connection sent them.

use crate::config::ServerConfig;
use crate::error::{ChatError, Result};
use crate::outbox::ConnectionTable;
use crate::protocol::{ClientEvent, ServerEvent};
use crate::state::ChatState;
use crate::types::{ConnectionId, HubStats};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

enum Command {
    Connect {
        reply: oneshot::Sender<HubConnection>,
    },
    Event {
        conn: ConnectionId,
        event: ClientEvent,
    },
    Report {
        conn: ConnectionId,
        error: ChatError,
    },
    Disconnect {
        conn: ConnectionId,
    },
    Stats {
        reply: oneshot::Sender<HubStats>,
    },
    Shutdown,
}

/// A registered connection: its id and the stream of events addressed to it
#[derive(Debug)]
pub struct HubConnection {
    id: ConnectionId,
    events: mpsc::UnboundedReceiver<ServerEvent>,
}

impl HubConnection {
    pub fn id(&self) -> &ConnectionId {
        &self.id
    }

    /// Next outbound event; `None` once the hub has dropped the connection
    pub async fn recv(&mut self) -> Option<ServerEvent> {
        self.events.recv().await
    }

    /// Next outbound event if one is already queued
    pub fn try_recv(&mut self) -> Option<ServerEvent> {
        self.events.try_recv().ok()
    }

    pub fn into_parts(self) -> (ConnectionId, mpsc::UnboundedReceiver<ServerEvent>) {
        (self.id, self.events)
    }
}

/// The actor that owns the chat state
pub struct Hub {
    state: ChatState<ConnectionTable>,
    commands: mpsc::UnboundedReceiver<Command>,
}

impl Hub {
    /// Start the hub on the current tokio runtime
    pub fn spawn(config: &ServerConfig) -> HubHandle {
        let (tx, rx) = mpsc::unbounded_channel();
        let hub = Hub {
            state: ChatState::from_config(config, ConnectionTable::new()),
            commands: rx,
        };
        let task = tokio::spawn(hub.run());
        HubHandle {
            commands: tx,
            task: std::sync::Arc::new(std::sync::Mutex::new(Some(task))),
        }
    }

    async fn run(mut self) {
        tracing::debug!("Chat hub started");

        while let Some(command) = self.commands.recv().await {
            match command {
                Command::Connect { reply } => {
                    let (id, events) = self.state.connect();
                    if reply.send(HubConnection { id: id.clone(), events }).is_err() {
                        // Caller went away before it got its connection
                        self.state.disconnect(&id);
                    }
                }
                Command::Event { conn, event } => {
                    if let Err(e) = self.state.dispatch(&conn, event) {
                        tracing::debug!(conn = %conn, error = %e, "Event rejected");
                    }
                }
                Command::Report { conn, error } => self.state.report(&conn, &error),
                Command::Disconnect { conn } => self.state.disconnect(&conn),
                Command::Stats { reply } => {
                    let _ = reply.send(self.state.stats());
                }
                Command::Shutdown => break,
            }
        }

        tracing::debug!(stats = ?self.state.stats(), "Chat hub stopped");
    }
}

/// Cloneable handle for sending commands to the hub
#[derive(Clone)]
pub struct HubHandle {
    commands: mpsc::UnboundedSender<Command>,
    task: std::sync::Arc<std::sync::Mutex<Option<JoinHandle<()>>>>,
}

impl HubHandle {
    /// Register a new connection
    pub async fn connect(&self) -> Result<HubConnection> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Connect { reply })?;
        rx.await.map_err(|_| ChatError::HubClosed)
    }

    /// Submit an inbound event for `conn`
    pub fn dispatch(&self, conn: &ConnectionId, event: ClientEvent) -> Result<()> {
        self.send(Command::Event {
            conn: conn.clone(),
            event,
        })
    }

    /// Report a transport-level failure (e.g. a malformed frame) to `conn`
    pub fn report(&self, conn: &ConnectionId, error: ChatError) -> Result<()> {
        self.send(Command::Report {
            conn: conn.clone(),
            error,
        })
    }

    /// Transport-level close of `conn`
    pub fn disconnect(&self, conn: &ConnectionId) -> Result<()> {
        self.send(Command::Disconnect { conn: conn.clone() })
    }

    /// Occupancy snapshot, taken after every previously sent command
    pub async fn stats(&self) -> Result<HubStats> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Stats { reply })?;
        rx.await.map_err(|_| ChatError::HubClosed)
    }

    /// Stop the hub and wait for it to exit
    ///
    /// Dropping the state closes every connection's event stream.
    pub async fn shutdown(&self) {
        let _ = self.commands.send(Command::Shutdown);
        let task = self.task.lock().ok().and_then(|mut t| t.take());
        if let Some(task) = task {
            if let Err(e) = task.await {
                tracing::warn!(error = %e, "Chat hub task failed");
            }
        }
    }

    pub fn is_closed(&self) -> bool {
        self.commands.is_closed()
    }

    fn send(&self, command: Command) -> Result<()> {
        self.commands.send(command).map_err(|_| ChatError::HubClosed)
    }
}
