//! AI Provider trait and common types.
//!
//! Defines the interface the assistant uses to ask a model.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Role of a message in a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AIRole {
    /// System message (sets context/behavior)
    System,
    /// User message (input)
    User,
}

/// A message in a conversation with an AI model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AIMessage {
    /// Role of the message sender
    pub role: AIRole,
    /// Content of the message
    pub content: String,
}

impl AIMessage {
    /// Create a new system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: AIRole::System,
            content: content.into(),
        }
    }

    /// Create a new user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: AIRole::User,
            content: content.into(),
        }
    }
}

/// Options for text generation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GenerateOptions {
    /// Temperature for sampling (0.0 to 1.0)
    pub temperature: Option<f32>,
    /// Maximum tokens to generate
    pub max_tokens: Option<u32>,
}

/// Why a model call produced no answer.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ModelError {
    #[error("AI request timeout")]
    Timeout,

    #[error("AI rate limit exceeded")]
    RateLimited,

    #[error("AI API error ({status}): {body}")]
    Status { status: u16, body: String },

    #[error("AI request failed: {0}")]
    Transport(String),

    #[error("AI response parse error: {0}")]
    InvalidResponse(String),

    #[error("AI provider not configured: {provider}")]
    NotConfigured { provider: String },
}

impl ModelError {
    /// Short label for structured logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Timeout => "timeout",
            Self::RateLimited => "rate_limited",
            Self::Status { .. } => "http_status",
            Self::Transport(_) => "transport",
            Self::InvalidResponse(_) => "invalid_response",
            Self::NotConfigured { .. } => "not_configured",
        }
    }
}

/// Trait for AI providers.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AIProvider: Send + Sync {
    /// Get the provider name (e.g., "deepseek").
    fn name(&self) -> &'static str;

    /// Check if the provider is configured (has API key).
    fn is_configured(&self) -> bool;

    /// Generate text from messages. One outbound call, no retries.
    async fn generate_text(
        &self,
        messages: &[AIMessage],
        options: &GenerateOptions,
    ) -> Result<String, ModelError>;
}
