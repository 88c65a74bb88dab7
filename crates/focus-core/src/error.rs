use thiserror::Error;

/// Top-level error type for FocusHelper.
#[derive(Debug, Error)]
pub enum FocusError {
    /// Error from an AI provider (malformed response, unexpected shape).
    #[error("provider error: {0}")]
    Provider(String),

    /// The AI backend is unreachable, timed out, or every fallback model
    /// was exhausted. Maps to 502 at the HTTP surface.
    #[error("provider unavailable: {0}")]
    ProviderUnavailable(String),

    /// Error from a messaging channel.
    #[error("channel error: {0}")]
    Channel(String),

    /// The recipient cannot be reached (conversation paused, bot blocked).
    /// Expected and recoverable — logged, never fatal.
    #[error("recipient unreachable: {0}")]
    RecipientUnreachable(String),

    /// Configuration error.
    #[error("config error: {0}")]
    Config(String),

    /// Sync store error (lock poisoned).
    #[error("store error: {0}")]
    Store(String),

    /// I/O error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
