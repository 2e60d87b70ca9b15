//! Chat assistant: answers a free-text question from the task store.
//!
//! Flow per question: detect intent, fetch the matching tasks, fall back to
//! every task when nothing matched, then ask the model once. Model failures
//! never surface as errors; they become a fixed apology string.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Serialize;
use tracing::{debug, warn};

use super::prompts::{build_prompt, SYSTEM_PROMPT};
use super::provider::{AIMessage, AIProvider, GenerateOptions, ModelError};
use crate::entities::Task;
use crate::intent::{detect_intent, Intent};
use crate::query::TaskQuery;

pub const BUSY_APOLOGY: &str = "Maaf, server sedang sibuk. Silakan coba lagi dalam beberapa saat.";
pub const RATE_LIMIT_APOLOGY: &str =
    "Maaf, terlalu banyak permintaan. Silakan tunggu sebentar dan coba lagi.";
pub const STATUS_APOLOGY: &str =
    "Maaf, terjadi kesalahan saat memproses pertanyaan Anda. Silakan coba lagi.";
pub const GENERIC_APOLOGY: &str = "Maaf, terjadi kesalahan. Silakan coba lagi.";

/// Answer given when the store holds no tasks at all.
pub const NO_TASKS_ANSWER: &str =
    "Saat ini tidak ada task yang tersedia di sistem. Silakan tambahkan task terlebih dahulu.";

/// Default sampling temperature for task answers.
pub const DEFAULT_TEMPERATURE: f32 = 0.3;

/// Default answer length bound.
pub const DEFAULT_MAX_TOKENS: u32 = 1000;

/// Map a model failure to the apology shown to the user.
#[must_use]
pub fn apology_for(err: &ModelError) -> &'static str {
    match err {
        ModelError::Timeout => BUSY_APOLOGY,
        ModelError::RateLimited => RATE_LIMIT_APOLOGY,
        ModelError::Status { .. } => STATUS_APOLOGY,
        ModelError::Transport(_)
        | ModelError::InvalidResponse(_)
        | ModelError::NotConfigured { .. } => GENERIC_APOLOGY,
    }
}

/// Read access to tasks, filtered by a [`TaskQuery`].
#[async_trait]
pub trait TaskLookup: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Tasks matching `query`, ordered and capped as the query specifies.
    async fn find_tasks(&self, query: &TaskQuery) -> Result<Vec<Task>, Self::Error>;
}

/// Result of answering one question.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatOutcome {
    pub answer: String,
    pub intent: Intent,
    /// The intent matched nothing and every task was used instead.
    pub used_fallback: bool,
    /// Tasks handed to the model as context.
    pub task_count: usize,
}

/// Question answering over a model provider.
#[derive(Clone)]
pub struct Assistant {
    provider: Arc<dyn AIProvider>,
    options: GenerateOptions,
}

impl Assistant {
    pub fn new(provider: Arc<dyn AIProvider>) -> Self {
        Self {
            provider,
            options: GenerateOptions {
                temperature: Some(DEFAULT_TEMPERATURE),
                max_tokens: Some(DEFAULT_MAX_TOKENS),
            },
        }
    }

    pub fn provider_name(&self) -> &'static str {
        self.provider.name()
    }

    /// Whether questions can reach a model at all.
    pub fn is_configured(&self) -> bool {
        self.provider.is_configured()
    }

    /// Ask the model about `tasks`. An empty slice short-circuits to the
    /// no-tasks answer without an outbound call.
    pub async fn answer(&self, question: &str, tasks: &[Task], today: NaiveDate) -> String {
        if tasks.is_empty() {
            return NO_TASKS_ANSWER.to_string();
        }

        let messages = [
            AIMessage::system(SYSTEM_PROMPT),
            AIMessage::user(build_prompt(question, tasks, today)),
        ];

        match self.provider.generate_text(&messages, &self.options).await {
            Ok(text) => text,
            Err(e) => {
                warn!(
                    provider = self.provider.name(),
                    kind = e.kind(),
                    error = %e,
                    "Model call failed, answering with apology"
                );
                apology_for(&e).to_string()
            }
        }
    }

    /// Full question flow against a task store.
    ///
    /// Only store errors propagate; model errors are folded into the answer.
    pub async fn respond<L>(
        &self,
        question: &str,
        lookup: &L,
        today: NaiveDate,
    ) -> Result<ChatOutcome, L::Error>
    where
        L: TaskLookup + ?Sized,
    {
        let intent = detect_intent(question);
        let query = TaskQuery::for_intent(&intent, today);

        let mut tasks = lookup.find_tasks(&query).await?;
        let mut used_fallback = false;
        if tasks.is_empty() && !query.is_unfiltered() {
            tasks = lookup.find_tasks(&TaskQuery::unfiltered()).await?;
            used_fallback = true;
        }

        debug!(
            status = ?intent.status,
            deadline = ?intent.deadline,
            used_fallback,
            tasks = tasks.len(),
            "Resolved chat context"
        );

        let answer = self.answer(question, &tasks, today).await;
        Ok(ChatOutcome {
            answer,
            intent,
            used_fallback,
            task_count: tasks.len(),
        })
    }
}
