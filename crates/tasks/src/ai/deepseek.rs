//! DeepSeek chat-completion provider (OpenAI-compatible wire format).

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::provider::{AIMessage, AIProvider, GenerateOptions, ModelError};

/// DeepSeek API endpoint
pub const DEEPSEEK_API_URL: &str = "https://api.deepseek.com/chat/completions";

/// Default model
pub const DEFAULT_MODEL: &str = "deepseek-chat";

/// Default bound on a single request, connection to last byte.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Connection settings for the chat-completion endpoint.
#[derive(Clone)]
pub struct DeepSeekConfig {
    /// Bearer key; requests are refused locally when absent.
    pub api_key: Option<String>,
    /// Full chat-completions URL
    pub api_url: String,
    /// Model name sent with every request
    pub model: String,
    /// Request timeout
    pub timeout: Duration,
}

impl std::fmt::Debug for DeepSeekConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeepSeekConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("api_url", &self.api_url)
            .field("model", &self.model)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl Default for DeepSeekConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_url: DEEPSEEK_API_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

/// Chat-completion request body
#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [AIMessage],
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

/// Chat-completion response choice message
#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

/// Chat-completion response choice
#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

/// Chat-completion response
#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

fn transport_error(err: &reqwest::Error) -> ModelError {
    if err.is_timeout() {
        ModelError::Timeout
    } else {
        ModelError::Transport(err.to_string())
    }
}

/// DeepSeek provider.
pub struct DeepSeekProvider {
    client: Client,
    config: DeepSeekConfig,
}

impl DeepSeekProvider {
    /// Create a provider whose HTTP client enforces `config.timeout`.
    pub fn new(config: DeepSeekConfig) -> Result<Self, ModelError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ModelError::Transport(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self { client, config })
    }
}

#[async_trait]
impl AIProvider for DeepSeekProvider {
    fn name(&self) -> &'static str {
        "deepseek"
    }

    fn is_configured(&self) -> bool {
        self.config.api_key.is_some()
    }

    async fn generate_text(
        &self,
        messages: &[AIMessage],
        options: &GenerateOptions,
    ) -> Result<String, ModelError> {
        let api_key = self
            .config
            .api_key
            .as_ref()
            .ok_or_else(|| ModelError::NotConfigured {
                provider: self.name().to_string(),
            })?;

        let request = ChatRequest {
            model: &self.config.model,
            messages,
            temperature: options.temperature,
            max_tokens: options.max_tokens,
        };

        debug!(
            url = %self.config.api_url,
            model = %self.config.model,
            messages = messages.len(),
            "Sending chat completion request"
        );

        let response = self
            .client
            .post(&self.config.api_url)
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| transport_error(&e))?;

        let status = response.status();
        let body = response.text().await.map_err(|e| transport_error(&e))?;

        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(ModelError::RateLimited);
        }
        if !status.is_success() {
            return Err(ModelError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: ChatResponse = serde_json::from_str(&body)
            .map_err(|e| ModelError::InvalidResponse(format!("Failed to parse response: {e}")))?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| ModelError::InvalidResponse("response has no message content".into()))
    }
}
