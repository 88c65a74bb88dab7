//! OpenRouter proxy provider with sequential model fallback.
//!
//! Tries an ordered, configurable list of models until one returns a
//! structurally valid response. Region restrictions, missing models,
//! timeouts, and malformed replies all skip to the next model; only when
//! the whole list is exhausted does the call fail.

use async_trait::async_trait;
use focus_core::{config::AssistantConfig, error::FocusError, message::ChatMessage, traits::Provider};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

const OPENROUTER_BASE_URL: &str = "https://openrouter.ai/api/v1";

/// Per-attempt timeout. Each model in the chain gets its own budget.
const ATTEMPT_TIMEOUT_SECS: u64 = 30;

const REFERER: &str = "https://max.ru/focushelper_bot";
const TITLE: &str = "FocusHelper Bot";

/// OpenRouter provider — routes requests through the fallback model chain.
pub struct OpenRouterProvider {
    client: reqwest::Client,
    api_key: String,
    models: Vec<String>,
}

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
}

#[derive(Deserialize)]
pub(crate) struct ChatCompletionResponse {
    pub choices: Option<Vec<ChatChoice>>,
}

#[derive(Deserialize)]
pub(crate) struct ChatChoice {
    pub message: Option<ChoiceMessage>,
}

#[derive(Deserialize)]
pub(crate) struct ChoiceMessage {
    pub content: Option<String>,
}

impl OpenRouterProvider {
    /// Create from config values.
    pub fn from_config(config: &AssistantConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: config.api_key.clone(),
            models: config.models.clone(),
        }
    }

    /// One attempt against a single model. `Err` means "try the next one".
    async fn try_model(
        &self,
        model: &str,
        messages: &[ChatMessage],
    ) -> Result<String, FocusError> {
        let url = format!("{OPENROUTER_BASE_URL}/chat/completions");
        let body = ChatCompletionRequest { model, messages };

        debug!("openrouter: POST {url} model={model}");

        let resp = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("HTTP-Referer", REFERER)
            .header("X-Title", TITLE)
            .timeout(std::time::Duration::from_secs(ATTEMPT_TIMEOUT_SECS))
            .json(&body)
            .send()
            .await
            .map_err(|e| FocusError::ProviderUnavailable(format!("openrouter request failed: {e}")))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            if is_region_restricted(&text) {
                return Err(FocusError::Provider(format!(
                    "model {model} not served in this region"
                )));
            }
            return Err(FocusError::Provider(format!(
                "openrouter returned {status} for {model}: {text}"
            )));
        }

        let parsed: ChatCompletionResponse = resp.json().await.map_err(|e| {
            FocusError::Provider(format!("openrouter: failed to parse response: {e}"))
        })?;

        parsed
            .choices
            .as_ref()
            .and_then(|c| c.first())
            .and_then(|c| c.message.as_ref())
            .and_then(|m| m.content.clone())
            .ok_or_else(|| {
                FocusError::Provider(format!("openrouter: empty choices from {model}"))
            })
    }
}

/// Whether an error body indicates a regional availability block.
fn is_region_restricted(error_text: &str) -> bool {
    let msg = serde_json::from_str::<serde_json::Value>(error_text)
        .ok()
        .and_then(|v| {
            v.get("error")
                .and_then(|e| e.get("message"))
                .and_then(|m| m.as_str())
                .map(str::to_lowercase)
        })
        .unwrap_or_default();
    msg.contains("country") || msg.contains("region") || msg.contains("territory")
}

#[async_trait]
impl Provider for OpenRouterProvider {
    fn name(&self) -> &str {
        "openrouter"
    }

    async fn complete(&self, messages: &[ChatMessage]) -> Result<String, FocusError> {
        if self.api_key.is_empty() {
            return Err(FocusError::ProviderUnavailable(
                "openrouter: no API key configured".into(),
            ));
        }

        for model in &self.models {
            match self.try_model(model, messages).await {
                Ok(text) => {
                    info!("openrouter: answered by {model}");
                    return Ok(text);
                }
                Err(e) => {
                    warn!("openrouter: {model} failed, trying next: {e}");
                }
            }
        }

        Err(FocusError::ProviderUnavailable(
            "openrouter: all configured models failed".into(),
        ))
    }

    async fn is_available(&self) -> bool {
        if self.api_key.is_empty() {
            warn!("openrouter: no API key configured");
            return false;
        }
        let url = format!("{OPENROUTER_BASE_URL}/models");
        match self
            .client
            .get(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .send()
            .await
        {
            Ok(resp) => resp.status().is_success(),
            Err(e) => {
                warn!("openrouter not available: {e}");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider_with_models(models: Vec<String>) -> OpenRouterProvider {
        OpenRouterProvider::from_config(&AssistantConfig {
            api_key: "sk-or-test".into(),
            models,
        })
    }

    #[test]
    fn test_provider_name() {
        let p = provider_with_models(vec!["anthropic/claude-3-haiku".into()]);
        assert_eq!(p.name(), "openrouter");
    }

    #[test]
    fn test_request_serialization() {
        let messages = vec![
            ChatMessage::system("Be helpful."),
            ChatMessage::user("Hello"),
        ];
        let body = ChatCompletionRequest {
            model: "anthropic/claude-3-haiku",
            messages: &messages,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["model"], "anthropic/claude-3-haiku");
        assert_eq!(json["messages"].as_array().unwrap().len(), 2);
        assert_eq!(json["messages"][0]["role"], "system");
    }

    #[test]
    fn test_response_parsing() {
        let json = r#"{"choices":[{"message":{"role":"assistant","content":"Hi there!"}}]}"#;
        let resp: ChatCompletionResponse = serde_json::from_str(json).unwrap();
        let content = resp.choices.unwrap()[0]
            .message
            .as_ref()
            .unwrap()
            .content
            .clone();
        assert_eq!(content.as_deref(), Some("Hi there!"));
    }

    #[test]
    fn test_region_restriction_detection() {
        let body = r#"{"error":{"message":"This model is not available in your country"}}"#;
        assert!(is_region_restricted(body));
        assert!(is_region_restricted(
            r#"{"error":{"message":"Unsupported region"}}"#
        ));
        assert!(!is_region_restricted(r#"{"error":{"message":"rate limit"}}"#));
        assert!(!is_region_restricted("not json"));
    }

    #[tokio::test]
    async fn test_missing_api_key_is_unavailable() {
        let p = OpenRouterProvider::from_config(&AssistantConfig {
            api_key: String::new(),
            models: vec!["anthropic/claude-3-haiku".into()],
        });
        let err = p.complete(&[ChatMessage::user("hi")]).await.unwrap_err();
        assert!(matches!(err, FocusError::ProviderUnavailable(_)));
    }
}
