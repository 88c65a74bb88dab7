mod defaults;

#[cfg(test)]
mod tests;

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::FocusError;
use defaults::*;

/// Top-level FocusHelper configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub bot: BotConfig,
    #[serde(default)]
    pub channel: ChannelConfig,
    #[serde(default)]
    pub assistant: AssistantConfig,
    #[serde(default)]
    pub lm: LmConfig,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
}

/// General bot settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotConfig {
    #[serde(default = "default_name")]
    pub name: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            log_level: default_log_level(),
        }
    }
}

/// Channel configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ChannelConfig {
    pub max: Option<MaxConfig>,
}

/// Max messenger bot config.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaxConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub bot_token: String,
    #[serde(default = "default_max_base_url")]
    pub base_url: String,
    /// Allowed user IDs. Empty = allow all.
    #[serde(default)]
    pub allowed_users: Vec<i64>,
}

impl Default for MaxConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            bot_token: String::new(),
            base_url: default_max_base_url(),
            allowed_users: Vec::new(),
        }
    }
}

/// Assistant Q&A configuration — the OpenRouter fallback chain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssistantConfig {
    #[serde(default)]
    pub api_key: String,
    /// Models tried in order until one answers.
    #[serde(default = "default_assistant_models")]
    pub models: Vec<String>,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            models: default_assistant_models(),
        }
    }
}

/// Local LLM endpoint config (OpenAI-compatible, e.g. LM Studio) used for
/// task decomposition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LmConfig {
    #[serde(default = "default_lm_base_url")]
    pub base_url: String,
    #[serde(default = "default_lm_model")]
    pub model: String,
    #[serde(default)]
    pub api_key: String,
}

impl Default for LmConfig {
    fn default() -> Self {
        Self {
            base_url: default_lm_base_url(),
            model: default_lm_model(),
            api_key: String::new(),
        }
    }
}

/// Sync/forwarder HTTP service config.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_api_host")]
    pub host: String,
    #[serde(default = "default_api_port")]
    pub port: u16,
    /// Cross-origin caller allowed to hit the API. `*` = any.
    #[serde(default = "default_allowed_origin")]
    pub allowed_origin: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            host: default_api_host(),
            port: default_api_port(),
            allowed_origin: default_allowed_origin(),
        }
    }
}

/// Daily reminder scheduler config.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Local hour/minute the daily reminder targets.
    #[serde(default = "default_reminder_hour")]
    pub reminder_hour: u32,
    #[serde(default = "default_reminder_minute")]
    pub reminder_minute: u32,
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            reminder_hour: default_reminder_hour(),
            reminder_minute: default_reminder_minute(),
            poll_interval_secs: default_poll_interval(),
        }
    }
}

/// Load configuration from a TOML file, then apply environment overrides.
///
/// Falls back to defaults if the file does not exist.
pub fn load(path: &str) -> Result<Config, FocusError> {
    let path = Path::new(path);
    let mut config = if path.exists() {
        let content = std::fs::read_to_string(path)
            .map_err(|e| FocusError::Config(format!("failed to read {}: {e}", path.display())))?;
        toml::from_str(&content)
            .map_err(|e| FocusError::Config(format!("failed to parse config: {e}")))?
    } else {
        tracing::info!("Config file not found at {}, using defaults", path.display());
        Config::default()
    };

    apply_env_overrides(&mut config);
    Ok(config)
}

/// Deploy-time overrides: secrets and knobs that usually arrive via the
/// environment rather than the config file.
fn apply_env_overrides(config: &mut Config) {
    if let Ok(token) = std::env::var("BOT_TOKEN") {
        config.channel.max.get_or_insert_with(MaxConfig::default).bot_token = token;
    }
    if let Ok(key) = std::env::var("OPENROUTER_API_KEY") {
        config.assistant.api_key = key;
    }
    if let Ok(url) = std::env::var("LM_BASE_URL") {
        config.lm.base_url = url;
    }
    if let Ok(model) = std::env::var("LM_MODEL") {
        config.lm.model = model;
    }
    if let Ok(key) = std::env::var("LM_API_KEY") {
        config.lm.api_key = key;
    }
    if let Ok(port) = std::env::var("SYNC_API_PORT") {
        match port.parse() {
            Ok(p) => config.api.port = p,
            Err(_) => tracing::warn!("ignoring non-numeric SYNC_API_PORT: {port}"),
        }
    }
    if let Ok(origin) = std::env::var("WEBAPP_ORIGIN") {
        config.api.allowed_origin = origin;
    }
}
