//! # Taskboard
//!
//! HTTP API for a small task board: users, tasks, bearer-token auth and a
//! chat endpoint that answers questions about the tasks through an external
//! language model.
//!
//! The task domain and the chat assistant live in the `tasks` crate; this
//! crate adds configuration, persistence, authentication and the axum
//! router.

pub mod auth;
pub mod config;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod seed;
pub mod server;
pub mod storage;

pub use config::{Config, ConfigError, LogFormat};
pub use errors::{ApiError, ApiResult};
pub use server::{build_router, open_storage, run_server, AppState};
pub use storage::{MemoryStorage, PostgresStorage, Storage, StorageError};
