use crate::{
    error::FocusError,
    message::{ChatMessage, IncomingMessage, OutgoingMessage},
};
use async_trait::async_trait;

/// AI Provider trait — a chat-completion capability.
///
/// Every backend (OpenRouter fallback chain, LM Studio, ...) implements this
/// trait to provide a uniform interface: role-tagged messages in, text out.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Human-readable provider name.
    fn name(&self) -> &str;

    /// Send a conversation to the backend and get the reply text.
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String, FocusError>;

    /// Check if the provider is available and ready.
    async fn is_available(&self) -> bool;
}

/// Messaging Channel trait — the connection to the chat platform.
#[async_trait]
pub trait Channel: Send + Sync {
    /// Human-readable channel name.
    fn name(&self) -> &str;

    /// Start listening for incoming events.
    /// Returns a receiver that yields incoming messages.
    async fn start(&self) -> Result<tokio::sync::mpsc::Receiver<IncomingMessage>, FocusError>;

    /// Send a message back through this channel.
    ///
    /// A paused or blocked conversation surfaces as
    /// [`FocusError::RecipientUnreachable`]; callers treat that as expected
    /// and must not escalate it.
    async fn send(&self, message: OutgoingMessage) -> Result<(), FocusError>;

    /// Graceful shutdown.
    async fn stop(&self) -> Result<(), FocusError>;
}
