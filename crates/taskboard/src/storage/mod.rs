//! Persistence for users and tasks.
//!
//! Two backends implement [`Storage`]: an in-memory store used for local
//! runs and tests, and PostgreSQL via sqlx.

mod memory;
mod postgres;

pub use memory::MemoryStorage;
pub use postgres::PostgresStorage;

use async_trait::async_trait;
use tasks::{Task, TaskLookup, TaskQuery};
use thiserror::Error;

use crate::models::{NewTask, NewUser, TaskChanges, User};

/// Storage errors.
#[derive(Debug, Error)]
pub enum StorageError {
    /// A unique column already holds this value.
    #[error("{field} already exists")]
    Conflict { field: &'static str },

    #[error("database error: {0}")]
    Database(String),

    /// A stored row could not be mapped back into a domain value.
    #[error("corrupt record: {0}")]
    Corrupt(String),
}

impl From<sqlx::Error> for StorageError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.is_unique_violation() {
                let field = match db_err.constraint() {
                    Some(c) if c.contains("name") => "name",
                    _ => "email",
                };
                return Self::Conflict { field };
            }
        }
        Self::Database(err.to_string())
    }
}

impl From<sqlx::migrate::MigrateError> for StorageError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        Self::Database(err.to_string())
    }
}

/// Result type alias for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Data access used by the HTTP handlers.
///
/// Listings are ordered newest first. Tasks come back with `assignee_name`
/// filled from the assigned user.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Backend label for logs.
    fn backend(&self) -> &'static str;

    async fn create_user(&self, user: NewUser) -> StorageResult<User>;

    async fn get_user(&self, id: i64) -> StorageResult<Option<User>>;

    async fn find_user_by_email(&self, email: &str) -> StorageResult<Option<User>>;

    async fn list_users(&self) -> StorageResult<Vec<User>>;

    async fn create_task(&self, task: NewTask) -> StorageResult<Task>;

    async fn get_task(&self, id: i64) -> StorageResult<Option<Task>>;

    async fn list_tasks(&self) -> StorageResult<Vec<Task>>;

    /// Apply a partial update atomically. `None` when the task does not exist.
    async fn update_task(&self, id: i64, changes: &TaskChanges) -> StorageResult<Option<Task>>;

    /// `false` when the task did not exist.
    async fn delete_task(&self, id: i64) -> StorageResult<bool>;

    /// Tasks matching a chat query, ordered and capped by it.
    async fn query_tasks(&self, query: &TaskQuery) -> StorageResult<Vec<Task>>;
}

#[async_trait]
impl<'a> TaskLookup for dyn Storage + 'a {
    type Error = StorageError;

    async fn find_tasks(&self, query: &TaskQuery) -> Result<Vec<Task>, Self::Error> {
        self.query_tasks(query).await
    }
}
