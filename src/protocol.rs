//! Wire events exchanged with clients
//!
//! Every frame is a JSON object tagged by `type` with kebab-case event
//! names; payload fields are camelCase.

use crate::error::{ChatError, Result};
use crate::types::ConnectionId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Notice sent when a connection is queued without a partner
pub const WAITING_MESSAGE: &str = "Looking for someone to chat with...";

/// Notice sent to the side whose partner went away
pub const PARTNER_LEFT_MESSAGE: &str = "Your chat partner disconnected";

/// Acknowledgment sent to the side that ended its own session
pub const SESSION_ENDED_MESSAGE: &str = "Chat ended";

/// Events a client sends to the server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ClientEvent {
    /// Register or overwrite the display name
    SetIdentity {
        #[serde(default)]
        name: Option<String>,
    },

    /// Enter matchmaking
    RequestMatch,

    /// Leave the waiting pool
    CancelMatch,

    /// Relay text to the current partner
    ///
    /// A client-supplied timestamp is parsed so such frames stay valid,
    /// but it is never forwarded.
    SendMessage {
        text: String,
        #[serde(default, skip_serializing)]
        timestamp: Option<serde_json::Value>,
    },

    /// Voluntarily leave the current session
    EndSession,
}

impl ClientEvent {
    /// Decode a text frame
    pub fn parse(frame: &str) -> Result<Self> {
        serde_json::from_str(frame).map_err(|e| ChatError::Malformed(e.to_string()))
    }

    /// Event name as it appears on the wire
    pub fn name(&self) -> &'static str {
        match self {
            ClientEvent::SetIdentity { .. } => "set-identity",
            ClientEvent::RequestMatch => "request-match",
            ClientEvent::CancelMatch => "cancel-match",
            ClientEvent::SendMessage { .. } => "send-message",
            ClientEvent::EndSession => "end-session",
        }
    }
}

/// Events the server sends to a client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ServerEvent {
    /// Sent once when the socket opens
    #[serde(rename_all = "camelCase")]
    Connected { connection_id: ConnectionId },

    IdentitySet { success: bool },

    Waiting { message: String },

    #[serde(rename_all = "camelCase")]
    ChatStarted {
        message: String,
        partner_display_name: String,
    },

    #[serde(rename_all = "camelCase")]
    ReceiveMessage {
        text: String,
        timestamp: DateTime<Utc>,
        sender_display_name: String,
    },

    SessionEnded { message: String },

    Error { message: String },
}

impl ServerEvent {
    pub fn waiting() -> Self {
        ServerEvent::Waiting {
            message: WAITING_MESSAGE.to_string(),
        }
    }

    pub fn chat_started(partner_display_name: impl Into<String>) -> Self {
        let partner_display_name = partner_display_name.into();
        ServerEvent::ChatStarted {
            message: format!("You are now connected with {}", partner_display_name),
            partner_display_name,
        }
    }

    pub fn partner_left() -> Self {
        ServerEvent::SessionEnded {
            message: PARTNER_LEFT_MESSAGE.to_string(),
        }
    }

    pub fn session_ended() -> Self {
        ServerEvent::SessionEnded {
            message: SESSION_ENDED_MESSAGE.to_string(),
        }
    }

    pub fn error(err: &ChatError) -> Self {
        ServerEvent::Error {
            message: err.to_string(),
        }
    }

    /// Encode as a text frame
    pub fn to_frame(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}
