//! Message sending and delivery-error classification.

use super::types::MaxApiError;
use super::MaxChannel;
use focus_core::error::FocusError;

impl MaxChannel {
    /// Send a text message to a specific chat.
    ///
    /// A paused dialog (`chat.denied` / HTTP 403) is classified as
    /// [`FocusError::RecipientUnreachable`] so callers can skip the user
    /// without treating the failure as fatal.
    pub(crate) async fn send_text(&self, chat_id: i64, text: &str) -> Result<(), FocusError> {
        let url = format!(
            "{}/messages?access_token={}&chat_id={chat_id}",
            self.base_url, self.config.bot_token
        );
        let body = serde_json::json!({ "text": text });

        let resp = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| FocusError::Channel(format!("max send failed: {e}")))?;

        let status = resp.status();
        if status.is_success() {
            return Ok(());
        }

        let error_text = resp.text().await.unwrap_or_default();
        let api_err: Option<MaxApiError> = serde_json::from_str(&error_text).ok();
        let code = api_err.as_ref().and_then(|e| e.code.as_deref());

        if status.as_u16() == 403 || code == Some("chat.denied") {
            let detail = api_err.and_then(|e| e.message).unwrap_or(error_text);
            return Err(FocusError::RecipientUnreachable(format!(
                "dialog paused for chat {chat_id}: {detail}"
            )));
        }

        Err(FocusError::Channel(format!(
            "max send failed ({status}): {error_text}"
        )))
    }
}
