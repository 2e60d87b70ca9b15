//! Request and response payloads plus the stored user record.

use chrono::{NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use tasks::entities::{deadline, validate_title};
use tasks::{Task, TaskStatus};

use crate::errors::ApiError;

pub const MAX_NAME_LEN: usize = 100;
pub const MAX_EMAIL_LEN: usize = 255;
pub const MIN_PASSWORD_LEN: usize = 6;

/// Stored user, including the password hash.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub created_at: NaiveDateTime,
}

/// Public view of a user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRead {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub created_at: NaiveDateTime,
}

impl From<User> for UserRead {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            created_at: user.created_at,
        }
    }
}

/// `POST /users` body.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateUser {
    pub name: String,
    pub email: String,
    pub password: String,
}

impl CreateUser {
    /// Trim and check field limits.
    pub fn validate(mut self) -> Result<Self, ApiError> {
        self.name = self.name.trim().to_string();
        self.email = self.email.trim().to_string();

        if self.name.is_empty() {
            return Err(ApiError::Validation("name cannot be empty".to_string()));
        }
        if self.name.chars().count() > MAX_NAME_LEN {
            return Err(ApiError::Validation(format!(
                "name cannot exceed {MAX_NAME_LEN} characters"
            )));
        }
        if !is_plausible_email(&self.email) {
            return Err(ApiError::Validation(
                "email is not a valid email address".to_string(),
            ));
        }
        if self.email.chars().count() > MAX_EMAIL_LEN {
            return Err(ApiError::Validation(format!(
                "email cannot exceed {MAX_EMAIL_LEN} characters"
            )));
        }
        if self.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(ApiError::Validation(format!(
                "password must be at least {MIN_PASSWORD_LEN} characters"
            )));
        }
        Ok(self)
    }
}

/// One `@` with a non-empty local part and a dotted domain.
fn is_plausible_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !email.chars().any(char::is_whitespace)
}

/// User ready for insertion.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
}

/// `POST /tasks` body.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateTask {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: Option<TaskStatus>,
    #[serde(default, deserialize_with = "deadline::deserialize_optional")]
    pub deadline: Option<NaiveDateTime>,
    #[serde(default)]
    pub assignee_id: Option<i64>,
}

/// Task ready for insertion.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTask {
    pub title: String,
    pub description: String,
    pub status: TaskStatus,
    pub deadline: Option<NaiveDateTime>,
    pub assignee_id: Option<i64>,
}

impl CreateTask {
    pub fn validate(self) -> Result<NewTask, ApiError> {
        validate_title(&self.title)?;
        Ok(NewTask {
            title: self.title,
            description: self.description.unwrap_or_default(),
            status: self.status.unwrap_or_default(),
            deadline: self.deadline,
            assignee_id: self.assignee_id,
        })
    }
}

impl NewTask {
    /// Build the stored task; the store assigns the id and assignee name.
    pub fn into_task(self, id: i64, assignee_name: Option<String>) -> Task {
        let now = Utc::now().naive_utc();
        Task {
            id,
            title: self.title,
            description: self.description,
            status: self.status,
            deadline: self.deadline,
            assignee_id: self.assignee_id,
            assignee_name,
            created_at: now,
            updated_at: now,
        }
    }
}

fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// `PUT /tasks/{id}` body.
///
/// Outer `None` means the field was omitted. For `deadline` and
/// `assignee_id`, `Some(None)` clears the value; an explicit `null` for the
/// other fields is ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaskUpdate {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: Option<TaskStatus>,
    #[serde(default, deserialize_with = "deadline::deserialize_patch")]
    pub deadline: Option<Option<NaiveDateTime>>,
    #[serde(default, deserialize_with = "nullable")]
    pub assignee_id: Option<Option<i64>>,
}

/// Validated partial update.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
    pub deadline: Option<Option<NaiveDateTime>>,
    pub assignee_id: Option<Option<i64>>,
}

impl TaskUpdate {
    pub fn validate(self) -> Result<TaskChanges, ApiError> {
        if let Some(title) = &self.title {
            validate_title(title)?;
        }
        Ok(TaskChanges {
            title: self.title,
            description: self.description,
            status: self.status,
            deadline: self.deadline,
            assignee_id: self.assignee_id,
        })
    }
}

impl TaskChanges {
    /// Assignee id the update will leave on the task, if it touches it.
    pub fn new_assignee(&self) -> Option<i64> {
        self.assignee_id.flatten()
    }

    /// Apply to a task. The caller refreshes `assignee_name`.
    pub fn apply(&self, task: &mut Task) {
        if let Some(title) = &self.title {
            task.title.clone_from(title);
        }
        if let Some(description) = &self.description {
            task.description.clone_from(description);
        }
        if let Some(status) = self.status {
            task.status = status;
        }
        if let Some(deadline) = self.deadline {
            task.deadline = deadline;
        }
        if let Some(assignee_id) = self.assignee_id {
            task.assignee_id = assignee_id;
        }
        task.updated_at = Utc::now().naive_utc();
    }
}

/// `POST /auth/login` form body.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginForm {
    /// The user's email.
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
}

impl TokenResponse {
    pub fn bearer(access_token: String) -> Self {
        Self {
            access_token,
            token_type: "bearer".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatRequest {
    pub question: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    pub answer: String,
}
