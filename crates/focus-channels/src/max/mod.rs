//! Max messenger Bot API channel.
//!
//! Uses long polling via `GET /updates` and `POST /messages` for responses.
//! Docs: <https://dev.max.ru/docs/botapi>

mod polling;
pub(crate) mod send;
pub(crate) mod types;

#[cfg(test)]
mod tests;

use focus_core::config::MaxConfig;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Max messenger channel using the Bot API with long polling.
pub struct MaxChannel {
    config: MaxConfig,
    client: reqwest::Client,
    base_url: String,
    /// Tracks the last update marker to avoid reprocessing.
    marker: Arc<Mutex<Option<i64>>>,
}

impl MaxChannel {
    /// Create a new Max channel from config.
    pub fn new(config: MaxConfig) -> Self {
        let base_url = config.base_url.trim_end_matches('/').to_string();
        Self {
            config,
            client: reqwest::Client::new(),
            base_url,
            marker: Arc::new(Mutex::new(None)),
        }
    }
}
