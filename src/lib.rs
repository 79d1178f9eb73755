//! # chitchat
//!
//! Anonymous one-on-one chat: users connect, pick a display name, get
//! paired with a stranger, and exchange messages until either side leaves.
//!
//! ## Overview
//!
//! All matchmaking state lives in a single [`ChatState`]: the identity
//! registry, the FIFO waiting pool, and the symmetric session table. A
//! [`Hub`] task owns that state and applies commands one at a time, so
//! the tables are never mutated concurrently. Transports talk to the hub
//! through a cloneable [`HubHandle`].
//!
//! ## Quick Start
//!
//! ```rust
//! use chitchat::{ClientEvent, Hub, ServerConfig, ServerEvent};
//!
//! # async fn example() -> chitchat::Result<()> {
//! let hub = Hub::spawn(&ServerConfig::default());
//!
//! let mut alice = hub.connect().await?;
//! hub.dispatch(alice.id(), ClientEvent::SetIdentity { name: Some("Alice".into()) })?;
//! hub.dispatch(alice.id(), ClientEvent::RequestMatch)?;
//!
//! let mut bob = hub.connect().await?;
//! hub.dispatch(bob.id(), ClientEvent::SetIdentity { name: Some("Bob".into()) })?;
//! hub.dispatch(bob.id(), ClientEvent::RequestMatch)?;
//!
//! while let Some(event) = bob.recv().await {
//!     if let ServerEvent::ChatStarted { partner_display_name, .. } = event {
//!         assert_eq!(partner_display_name, "Alice");
//!         break;
//!     }
//! }
//! # let _ = alice.try_recv();
//! # hub.shutdown().await;
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - **IdentityRegistry** — connection → display name
//! - **WaitingPool** — FIFO queue of connections seeking a partner
//! - **SessionTable** — connection → partner, always stored in both directions
//! - **Matchmaker / Relay / Lifecycle** — operations on `ChatState`
//! - **Outbox** trait — liveness and delivery at the transport boundary
//! - **server** — axum WebSocket endpoint in front of the hub

pub mod config;
pub mod error;
pub mod hub;
mod lifecycle;
mod matchmaker;
pub mod outbox;
pub mod pool;
pub mod protocol;
pub mod registry;
mod relay;
pub mod server;
pub mod session;
pub mod state;
pub mod types;

// Re-export core types
pub use config::ServerConfig;
pub use error::{ChatError, Result};
pub use hub::{Hub, HubConnection, HubHandle};
pub use outbox::{ConnectionTable, MemoryOutbox, Outbox};
pub use pool::WaitingPool;
pub use protocol::{ClientEvent, ServerEvent};
pub use registry::IdentityRegistry;
pub use server::ChatServer;
pub use session::SessionTable;
pub use state::{ChatState, Membership};
pub use types::{ConnectionId, HubStats, Identity, SessionEntry};
