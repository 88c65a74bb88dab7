//! Long-polling update loop and Channel trait implementation.

use super::types::{MaxUpdate, MaxUpdateBatch};
use super::MaxChannel;
use async_trait::async_trait;
use focus_core::{
    error::FocusError,
    message::{IncomingKind, IncomingMessage, OutgoingMessage},
    traits::Channel,
};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

#[async_trait]
impl Channel for MaxChannel {
    fn name(&self) -> &str {
        "max"
    }

    async fn start(&self) -> Result<mpsc::Receiver<IncomingMessage>, FocusError> {
        let (tx, rx) = mpsc::channel(64);
        let client = self.client.clone();
        let base_url = self.base_url.clone();
        let token = self.config.bot_token.clone();
        let allowed_users = self.config.allowed_users.clone();
        let marker = self.marker.clone();

        info!("Max channel starting long polling...");

        tokio::spawn(async move {
            let mut backoff_secs: u64 = 1;

            loop {
                let last = marker.lock().await;
                let offset = *last;
                drop(last);

                let mut url =
                    format!("{base_url}/updates?timeout=30&access_token={token}");
                if let Some(m) = offset {
                    url.push_str(&format!("&marker={m}"));
                }

                let resp = match client
                    .get(&url)
                    .timeout(std::time::Duration::from_secs(35))
                    .send()
                    .await
                {
                    Ok(r) => r,
                    Err(e) => {
                        error!("max poll error (retry in {backoff_secs}s): {e}");
                        tokio::time::sleep(std::time::Duration::from_secs(backoff_secs)).await;
                        backoff_secs = (backoff_secs * 2).min(60);
                        continue;
                    }
                };

                if !resp.status().is_success() {
                    let status = resp.status();
                    let body = resp.text().await.unwrap_or_default();
                    error!("max API error {status} (retry in {backoff_secs}s): {body}");
                    tokio::time::sleep(std::time::Duration::from_secs(backoff_secs)).await;
                    backoff_secs = (backoff_secs * 2).min(60);
                    continue;
                }

                let batch: MaxUpdateBatch = match resp.json().await {
                    Ok(b) => b,
                    Err(e) => {
                        error!("max parse error (retry in {backoff_secs}s): {e}");
                        tokio::time::sleep(std::time::Duration::from_secs(backoff_secs)).await;
                        backoff_secs = (backoff_secs * 2).min(60);
                        continue;
                    }
                };

                // Successful poll -- reset backoff.
                backoff_secs = 1;

                if let Some(m) = batch.marker {
                    *marker.lock().await = Some(m);
                }

                for update in batch.updates {
                    let Some(incoming) = map_update(update, &allowed_users) else {
                        continue;
                    };

                    if tx.send(incoming).await.is_err() {
                        info!("max channel receiver dropped, stopping poll");
                        return;
                    }
                }
            }
        });

        Ok(rx)
    }

    async fn send(&self, message: OutgoingMessage) -> Result<(), FocusError> {
        self.send_text(message.chat_id, &message.text).await
    }

    async fn stop(&self) -> Result<(), FocusError> {
        info!("Max channel stopped");
        Ok(())
    }
}

/// Map one raw update to an incoming message, or `None` to drop it.
pub(crate) fn map_update(update: MaxUpdate, allowed_users: &[i64]) -> Option<IncomingMessage> {
    match update.update_type.as_str() {
        "bot_started" => {
            let chat_id = update.chat_id?;
            Some(IncomingMessage {
                id: Uuid::new_v4(),
                kind: IncomingKind::BotStarted,
                chat_id,
                user_id: update.user.as_ref().map(|u| u.user_id),
                sender_name: update.user.and_then(|u| u.name),
                text: String::new(),
                timestamp: chrono::Utc::now(),
            })
        }
        "message_created" => {
            let msg = update.message?;
            let text = msg.body.and_then(|b| b.text)?;
            let recipient = msg.recipient?;
            let chat_id = recipient.chat_id?;

            // The bot only talks person-to-person.
            if recipient.chat_type.as_deref() == Some("chat") {
                debug!("max: ignoring group message from chat {chat_id}");
                return None;
            }

            let user = msg.sender?;

            // Auth check.
            if !allowed_users.is_empty() && !allowed_users.contains(&user.user_id) {
                warn!("ignoring message from unauthorized user {}", user.user_id);
                return None;
            }

            let sender_name = user
                .username
                .map(|un| format!("@{un}"))
                .or(user.name);

            Some(IncomingMessage {
                id: Uuid::new_v4(),
                kind: IncomingKind::Text,
                chat_id,
                user_id: Some(user.user_id),
                sender_name,
                text,
                timestamp: chrono::Utc::now(),
            })
        }
        other => {
            debug!("max: ignoring update type '{other}'");
            None
        }
    }
}
