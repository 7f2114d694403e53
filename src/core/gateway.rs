//! Messaging gateway seam.
//!
//! The core never talks to a chat network directly. Inbound events arrive as
//! [`IncomingMessage`] values and replies leave through a [`MessageGateway`]
//! implementation; the Discord one lives in `bot::gateway`.

use crate::{core::settings::ConversationKind, errors::Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// One inbound message, already classified by the gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncomingMessage {
    /// Conversation the message was posted in; replies go back here
    pub conversation_id: String,
    /// Whether the operator wrote it
    pub sender_is_self: bool,
    /// Personal or group conversation
    pub kind: ConversationKind,
    /// Raw message text
    pub text: String,
    /// When the message was received; used as "now" for the reply decision
    pub timestamp: DateTime<Utc>,
}

/// Outbound side of the chat network.
#[async_trait]
pub trait MessageGateway: Send + Sync {
    /// Delivers `text` to `conversation_id`.
    ///
    /// # Errors
    /// Returns [`crate::errors::Error::GatewaySend`] when delivery was not confirmed.
    async fn send_message(&self, conversation_id: &str, text: &str) -> Result<()>;
}
