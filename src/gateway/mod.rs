//! Gateway — the event loop connecting the messaging channel, conversation
//! state, the reminder scheduler, the sync store, and the AI providers.

mod reminders;
mod routing;

pub use reminders::ReminderScheduler;

use focus_core::traits::{Channel, Provider};
use focus_memory::ContextStore;
use focus_sync::SyncStore;
use std::sync::Arc;
use tracing::{error, info};

/// The central gateway that routes messages between the channel and the
/// bot's handlers.
pub struct Gateway {
    pub(super) channel: Arc<dyn Channel>,
    /// Q&A assistant — the fallback model chain.
    pub(super) assistant: Arc<dyn Provider>,
    /// Task-decomposition backend.
    pub(super) decomposer: Arc<dyn Provider>,
    pub(super) contexts: Arc<ContextStore>,
    pub(super) scheduler: Arc<ReminderScheduler>,
    pub(super) sync: Arc<SyncStore>,
}

impl Gateway {
    pub fn new(
        channel: Arc<dyn Channel>,
        assistant: Arc<dyn Provider>,
        decomposer: Arc<dyn Provider>,
        contexts: Arc<ContextStore>,
        scheduler: Arc<ReminderScheduler>,
        sync: Arc<SyncStore>,
    ) -> Self {
        Self {
            channel,
            assistant,
            decomposer,
            contexts,
            scheduler,
            sync,
        }
    }

    /// Run the main event loop. Starts the channel and the reminder
    /// scheduler, then routes incoming events until the channel closes.
    pub async fn run(self: Arc<Self>) -> anyhow::Result<()> {
        info!(
            "FocusHelper gateway running | channel: {} | assistant: {}",
            self.channel.name(),
            self.assistant.name(),
        );

        let mut rx = self
            .channel
            .start()
            .await
            .map_err(|e| anyhow::anyhow!("failed to start channel: {e}"))?;

        self.scheduler.clone().start();

        while let Some(msg) = rx.recv().await {
            // Per-message failures are logged and isolated; the loop
            // itself never dies on a handler error.
            if let Err(e) = self.handle(msg).await {
                error!("handler error: {e}");
            }
        }

        info!("channel closed, gateway shutting down");
        self.scheduler.stop();
        self.channel.stop().await.ok();
        Ok(())
    }
}
