//! LM Studio provider — an OpenAI-compatible endpoint on the local network,
//! usually exposed through a tunnel. Backs the task-decomposition path.

use async_trait::async_trait;
use focus_core::{config::LmConfig, error::FocusError, message::ChatMessage, traits::Provider};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

/// Total request budget for a completion.
const COMPLETION_TIMEOUT_SECS: u64 = 45;
/// Connect budget — the tunnel either answers fast or not at all.
const CONNECT_TIMEOUT_SECS: u64 = 10;
/// Budget for the `/models` availability probe.
const HEALTH_TIMEOUT_SECS: u64 = 12;

const TEMPERATURE: f64 = 0.2;
const MAX_TOKENS: u32 = 800;

/// LM Studio provider backed by a local OpenAI-compatible server.
pub struct LmStudioProvider {
    client: reqwest::Client,
    base_url: String,
    model: String,
    api_key: String,
}

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f64,
    max_tokens: u32,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Option<Vec<ChatChoice>>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: Option<ChoiceMessage>,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

/// Result of the `/models` probe, as reported by `GET /lm/health`.
#[derive(Debug)]
pub struct LmHealth {
    pub ok: bool,
    pub status: u16,
    pub models: Value,
}

impl LmStudioProvider {
    /// Create from config values.
    pub fn from_config(config: &LmConfig) -> Self {
        Self {
            client: reqwest::Client::builder()
                .connect_timeout(std::time::Duration::from_secs(CONNECT_TIMEOUT_SECS))
                .build()
                .unwrap_or_default(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key: config.api_key.clone(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Probe `GET /models` and report status + body for the health endpoint.
    pub async fn health(&self) -> Result<LmHealth, FocusError> {
        if self.base_url.is_empty() {
            return Err(FocusError::Config("lm base_url is empty".into()));
        }
        let url = format!("{}/models", self.base_url);
        let resp = self
            .client
            .get(&url)
            .timeout(std::time::Duration::from_secs(HEALTH_TIMEOUT_SECS))
            .send()
            .await
            .map_err(|e| FocusError::ProviderUnavailable(format!("lm health probe failed: {e}")))?;

        let status = resp.status().as_u16();
        let models: Value = resp.json().await.unwrap_or(Value::Null);
        Ok(LmHealth {
            ok: status == 200,
            status,
            models,
        })
    }
}

#[async_trait]
impl Provider for LmStudioProvider {
    fn name(&self) -> &str {
        "lmstudio"
    }

    async fn complete(&self, messages: &[ChatMessage]) -> Result<String, FocusError> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = ChatCompletionRequest {
            model: &self.model,
            messages,
            temperature: TEMPERATURE,
            max_tokens: MAX_TOKENS,
        };

        debug!("lmstudio: POST {url} model={}", self.model);

        let mut req = self
            .client
            .post(&url)
            .timeout(std::time::Duration::from_secs(COMPLETION_TIMEOUT_SECS))
            .json(&body);
        if !self.api_key.is_empty() {
            req = req.header("Authorization", format!("Bearer {}", self.api_key));
        }

        let resp = req
            .send()
            .await
            .map_err(|e| FocusError::ProviderUnavailable(format!("lm request failed: {e}")))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            return Err(FocusError::ProviderUnavailable(format!(
                "lm returned {status}: {text}"
            )));
        }

        let parsed: ChatCompletionResponse = resp
            .json()
            .await
            .map_err(|e| FocusError::Provider(format!("lm: failed to parse response: {e}")))?;

        parsed
            .choices
            .as_ref()
            .and_then(|c| c.first())
            .and_then(|c| c.message.as_ref())
            .and_then(|m| m.content.clone())
            .ok_or_else(|| FocusError::Provider("lm: response carried no content".into()))
    }

    async fn is_available(&self) -> bool {
        match self.health().await {
            Ok(h) => h.ok,
            Err(e) => {
                warn!("lm not available: {e}");
                false
            }
        }
    }
}
