//! Serde types for the Max Bot API.

use serde::Deserialize;

/// Response of `GET /updates`.
#[derive(Debug, Deserialize)]
pub(crate) struct MaxUpdateBatch {
    #[serde(default)]
    pub updates: Vec<MaxUpdate>,
    /// Pass this back as the `marker` query param on the next poll.
    pub marker: Option<i64>,
}

/// One update event.
#[derive(Debug, Deserialize)]
pub(crate) struct MaxUpdate {
    pub update_type: String,
    pub message: Option<MaxMessage>,
    /// Present on `bot_started` updates.
    pub chat_id: Option<i64>,
    /// Present on `bot_started` updates.
    pub user: Option<MaxUser>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct MaxMessage {
    pub sender: Option<MaxUser>,
    pub recipient: Option<MaxRecipient>,
    pub body: Option<MaxBody>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct MaxUser {
    pub user_id: i64,
    pub name: Option<String>,
    pub username: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct MaxRecipient {
    pub chat_id: Option<i64>,
    pub chat_type: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct MaxBody {
    pub text: Option<String>,
}

/// Error body returned with non-success statuses.
#[derive(Debug, Deserialize)]
pub(crate) struct MaxApiError {
    pub code: Option<String>,
    pub message: Option<String>,
}
