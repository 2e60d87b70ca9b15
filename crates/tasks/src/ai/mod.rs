//! AI integration for the task chat.
//!
//! This module provides:
//! - AI provider abstraction and the upstream error taxonomy
//! - The DeepSeek (OpenAI-compatible) chat-completion provider
//! - Prompt formatting with task statistics
//! - The assistant that selects context, asks the model and degrades to
//!   fixed apologies on failure

pub mod assistant;
pub mod deepseek;
pub mod prompts;
pub mod provider;

// Re-exports
pub use assistant::{apology_for, Assistant, ChatOutcome, TaskLookup};
pub use deepseek::{DeepSeekConfig, DeepSeekProvider};
pub use prompts::{build_prompt, SYSTEM_PROMPT};
pub use provider::{AIMessage, AIProvider, AIRole, GenerateOptions, ModelError};
