//! Error types for chitchat

use thiserror::Error;

/// Errors that can occur while handling chat events
#[derive(Debug, Error)]
pub enum ChatError {
    /// Match requested before a display name was registered
    #[error("Please set a username first")]
    IdentityRequired,

    /// Match requested while already paired
    #[error("You are already in a chat")]
    AlreadyInSession,

    /// Message sent or session operation attempted without a partner
    #[error("You are not in a chat")]
    NotInSession,

    /// The partner's connection is gone; the session is torn down instead
    /// of surfacing this to the client
    #[error("Your chat partner disconnected")]
    PartnerUnreachable,

    /// Inbound frame could not be decoded into a client event
    #[error("Malformed event: {0}")]
    Malformed(String),

    /// Event arrived for a connection that is no longer attached
    #[error("Connection {0} is not attached")]
    NotConnected(String),

    /// The hub task has stopped and no longer accepts commands
    #[error("Chat hub is closed")]
    HubClosed,

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization failure
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ChatError {
    /// Whether this error is reported back to the originating connection
    /// as an `error` event
    pub fn is_reportable(&self) -> bool {
        matches!(
            self,
            ChatError::IdentityRequired
                | ChatError::AlreadyInSession
                | ChatError::NotInSession
                | ChatError::Malformed(_)
        )
    }
}

/// Result type alias for chat operations
pub type Result<T> = std::result::Result<T, ChatError>;
