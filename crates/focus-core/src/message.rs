use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// What kind of event a channel delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IncomingKind {
    /// A regular text message.
    Text,
    /// The user opened a dialog with the bot for the first time.
    BotStarted,
}

/// An incoming event from a channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IncomingMessage {
    pub id: Uuid,
    pub kind: IncomingKind,
    /// Platform chat ID — also the user key for scheduler and sync state.
    pub chat_id: i64,
    /// Platform user ID, when the platform distinguishes it from the chat.
    pub user_id: Option<i64>,
    /// Human-readable sender name.
    pub sender_name: Option<String>,
    /// Message text content. Empty for `BotStarted`.
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

/// An outgoing message to send back through a channel.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutgoingMessage {
    pub chat_id: i64,
    pub text: String,
}

/// A role-tagged chat message for LLM backends.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".into(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".into(),
            content: content.into(),
        }
    }
}
