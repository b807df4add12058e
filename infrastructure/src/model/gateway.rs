//! HTTP model gateway: an OpenAI-compatible chat-completions adapter.
//!
//! One client per distinct model reference. `complete_json` runs the
//! domain's tolerant extraction over the returned text and reports parse
//! failures as the recoverable envelope; everything HTTP-shaped (connect
//! errors, auth rejections, non-2xx statuses, undecodable bodies) is a
//! fatal [`ModelError`].

use async_trait::async_trait;
use council_application::ports::{CompletionOptions, ModelClient, ModelError};
use council_domain::{JsonOutcome, ModelRef};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(600);

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
}

/// Client for one model endpoint.
pub struct HttpModelClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    model: String,
    default_temperature: Option<f64>,
    default_max_tokens: Option<u32>,
}

impl HttpModelClient {
    /// Build a client from a member's model reference. The API key is read
    /// from the environment variable the reference names; naming a missing
    /// variable is an authentication error up front, not at first call.
    pub fn from_ref(model_ref: &ModelRef) -> Result<Self, ModelError> {
        let api_key = match &model_ref.api_key_env {
            Some(var) => Some(std::env::var(var).map_err(|_| {
                ModelError::Auth(format!("environment variable {} is not set", var))
            })?),
            None => None,
        };

        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| ModelError::Transport(e.to_string()))?;

        Ok(Self {
            http,
            base_url: model_ref
                .base_url
                .clone()
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            api_key,
            model: model_ref.model.clone(),
            default_temperature: model_ref.temperature,
            default_max_tokens: model_ref.max_tokens,
        })
    }
}

#[async_trait]
impl ModelClient for HttpModelClient {
    async fn complete_text(
        &self,
        system: &str,
        user: &str,
        opts: &CompletionOptions,
    ) -> Result<String, ModelError> {
        let body = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: user,
                },
            ],
            temperature: opts.temperature.or(self.default_temperature),
            max_tokens: opts.max_tokens.or(self.default_max_tokens),
        };

        let url = format!("{}/chat/completions", self.base_url.trim_end_matches('/'));
        let mut request = self.http.post(&url).json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| ModelError::Transport(e.to_string()))?;

        let status = response.status();
        if status.as_u16() == 401 || status.as_u16() == 403 {
            return Err(ModelError::Auth(format!(
                "provider rejected credentials (status {})",
                status.as_u16()
            )));
        }
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ModelError::Provider {
                status: status.as_u16(),
                message: message.chars().take(400).collect(),
            });
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| ModelError::Transport(format!("undecodable response body: {}", e)))?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| ModelError::Other("response contained no completion".to_string()))?;

        debug!(model = %self.model, chars = content.len(), "completion received");
        Ok(content)
    }

    async fn complete_json(
        &self,
        system: &str,
        user: &str,
        opts: &CompletionOptions,
    ) -> Result<JsonOutcome, ModelError> {
        let raw = self.complete_text(system, user, opts).await?;
        Ok(JsonOutcome::from_raw(&raw))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model_ref() -> ModelRef {
        ModelRef {
            provider: "openai-compatible".into(),
            model: "test-model".into(),
            temperature: Some(0.2),
            max_tokens: Some(800),
            base_url: Some("https://example.invalid/v1/".into()),
            api_key_env: None,
        }
    }

    #[test]
    fn test_client_builds_without_api_key() {
        assert!(HttpModelClient::from_ref(&model_ref()).is_ok());
    }

    #[test]
    fn test_missing_api_key_env_is_auth_error() {
        let mut r = model_ref();
        r.api_key_env = Some("COUNCIL_TEST_KEY_THAT_DOES_NOT_EXIST".into());
        match HttpModelClient::from_ref(&r) {
            Err(ModelError::Auth(message)) => {
                assert!(message.contains("COUNCIL_TEST_KEY_THAT_DOES_NOT_EXIST"));
            }
            other => panic!("expected auth error, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_request_body_shape() {
        let body = ChatRequest {
            model: "m",
            messages: vec![ChatMessage {
                role: "system",
                content: "s",
            }],
            temperature: Some(0.2),
            max_tokens: None,
        };
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value["model"], "m");
        assert_eq!(value["messages"][0]["role"], "system");
        assert!(value.get("max_tokens").is_none());
    }
}
