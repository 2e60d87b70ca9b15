#![warn(clippy::pedantic)]
// Allow common pedantic lints that don't affect correctness
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::uninlined_format_args)]

//! # Tasks
//!
//! Task domain model and chat assistant for the Taskboard service.
//!
//! This crate provides:
//! - Task entities and status values shared with the HTTP layer
//! - Keyword-based intent detection for free-text questions
//! - Storage-agnostic task queries derived from an intent
//! - Prompt formatting with aggregate task statistics
//! - A chat-completion client and the assistant that ties it together
//!
//! ## Example
//!
//! ```rust,ignore
//! use tasks::{detect_intent, TaskQuery};
//!
//! let intent = detect_intent("task apa yang terlambat?");
//! let query = TaskQuery::for_intent(&intent, chrono::Local::now().date_naive());
//! let tasks = storage.find_tasks(&query).await?;
//! ```

// Core entities
pub mod entities;

// Error types
pub mod errors;

// Intent detection
pub mod intent;

// Task filtering
pub mod query;

// AI integration
pub mod ai;

pub use entities::{Task, TaskStatus};
pub use errors::{TasksError, TasksResult};
pub use intent::{detect_intent, DeadlineBucket, Intent};
pub use query::{sort_for_chat, TaskQuery, CHAT_TASK_LIMIT};

pub use ai::{
    AIMessage, AIProvider, AIRole, Assistant, ChatOutcome, DeepSeekConfig, DeepSeekProvider,
    GenerateOptions, ModelError, TaskLookup,
};
