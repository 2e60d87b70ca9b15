//! Task entity and related types.

use chrono::{NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::TasksError;

/// Maximum number of characters in a task title.
pub const MAX_TITLE_LEN: usize = 150;

/// Task status values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum TaskStatus {
    #[default]
    Todo,
    #[serde(rename = "In Progress")]
    InProgress,
    Done,
}

impl TaskStatus {
    /// Wire and storage representation.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Todo => "Todo",
            Self::InProgress => "In Progress",
            Self::Done => "Done",
        }
    }

    /// Marker used when listing tasks in a prompt.
    pub fn emoji(self) -> &'static str {
        match self {
            Self::Todo => "⬜",
            Self::InProgress => "🔄",
            Self::Done => "✅",
        }
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TaskStatus {
    type Err = TasksError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "todo" | "to do" => Ok(Self::Todo),
            "in progress" | "in-progress" | "in_progress" | "inprogress" => Ok(Self::InProgress),
            "done" => Ok(Self::Done),
            _ => Err(TasksError::InvalidStatus {
                status: s.to_string(),
            }),
        }
    }
}

/// Core task structure, as stored and as returned over the API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: i64,

    pub title: String,

    pub description: String,

    #[serde(default)]
    pub status: TaskStatus,

    /// Wall-clock deadline, if any
    #[serde(default)]
    pub deadline: Option<NaiveDateTime>,

    /// Assigned user, if any
    #[serde(default)]
    pub assignee_id: Option<i64>,

    /// Display name of the assigned user (joined, never written)
    #[serde(default)]
    pub assignee_name: Option<String>,

    pub created_at: NaiveDateTime,

    pub updated_at: NaiveDateTime,
}

impl Task {
    /// Create a new unassigned `Todo` task stamped with the current UTC time.
    pub fn new(id: i64, title: impl Into<String>, description: impl Into<String>) -> Self {
        let now = Utc::now().naive_utc();
        Self {
            id,
            title: title.into(),
            description: description.into(),
            status: TaskStatus::default(),
            deadline: None,
            assignee_id: None,
            assignee_name: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_status(mut self, status: TaskStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_deadline(mut self, deadline: NaiveDateTime) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn with_assignee(mut self, id: i64, name: impl Into<String>) -> Self {
        self.assignee_id = Some(id);
        self.assignee_name = Some(name.into());
        self
    }

    pub fn with_created_at(mut self, created_at: NaiveDateTime) -> Self {
        self.created_at = created_at;
        self.updated_at = created_at;
        self
    }

    /// Calendar date of the deadline.
    pub fn deadline_date(&self) -> Option<NaiveDate> {
        self.deadline.map(|d| d.date())
    }

    /// Deadline falls on a day before `today` and the task is not done.
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        self.status != TaskStatus::Done && self.deadline_date().is_some_and(|d| d < today)
    }

    /// Deadline falls on `day`, whatever the status.
    pub fn is_due_on(&self, day: NaiveDate) -> bool {
        self.deadline_date() == Some(day)
    }

    pub fn is_assigned(&self) -> bool {
        self.assignee_id.is_some()
    }
}

/// Check a task title against the storage limits.
pub fn validate_title(title: &str) -> Result<(), TasksError> {
    if title.trim().is_empty() {
        return Err(TasksError::Validation {
            field: "title".to_string(),
            reason: "cannot be empty".to_string(),
        });
    }
    if title.chars().count() > MAX_TITLE_LEN {
        return Err(TasksError::Validation {
            field: "title".to_string(),
            reason: format!("cannot exceed {MAX_TITLE_LEN} characters"),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(date: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(date, "%Y-%m-%d %H:%M").unwrap()
    }

    #[test]
    fn test_task_new() {
        let task = Task::new(1, "Test Task", "A test task description");
        assert_eq!(task.id, 1);
        assert_eq!(task.title, "Test Task");
        assert_eq!(task.status, TaskStatus::Todo);
        assert!(task.deadline.is_none());
        assert!(!task.is_assigned());
        assert_eq!(task.created_at, task.updated_at);
    }

    #[test]
    fn test_task_status_parsing() {
        assert_eq!("Todo".parse::<TaskStatus>().unwrap(), TaskStatus::Todo);
        assert_eq!(
            "In Progress".parse::<TaskStatus>().unwrap(),
            TaskStatus::InProgress
        );
        assert_eq!(
            "in_progress".parse::<TaskStatus>().unwrap(),
            TaskStatus::InProgress
        );
        assert_eq!("DONE".parse::<TaskStatus>().unwrap(), TaskStatus::Done);
        assert!("blocked".parse::<TaskStatus>().is_err());
    }

    #[test]
    fn test_task_status_wire_names() {
        assert_eq!(
            serde_json::to_string(&TaskStatus::InProgress).unwrap(),
            "\"In Progress\""
        );
        let status: TaskStatus = serde_json::from_str("\"Done\"").unwrap();
        assert_eq!(status, TaskStatus::Done);
        assert!(serde_json::from_str::<TaskStatus>("\"in-progress\"").is_err());
    }

    #[test]
    fn test_overdue_ignores_done_tasks() {
        let today = NaiveDate::from_ymd_opt(2026, 10, 16).unwrap();
        let late = Task::new(1, "Late", "").with_deadline(at("2026-10-15 23:59"));
        assert!(late.is_overdue(today));

        let finished = late.clone().with_status(TaskStatus::Done);
        assert!(!finished.is_overdue(today));

        let due_today = Task::new(2, "Today", "").with_deadline(at("2026-10-16 00:00"));
        assert!(!due_today.is_overdue(today));
        assert!(due_today.is_due_on(today));
    }

    #[test]
    fn test_validate_title() {
        assert!(validate_title("Write report").is_ok());
        assert!(validate_title("   ").is_err());
        assert!(validate_title(&"a".repeat(MAX_TITLE_LEN)).is_ok());

        let err = validate_title(&"a".repeat(MAX_TITLE_LEN + 1)).unwrap_err();
        assert_eq!(err.to_string(), "title cannot exceed 150 characters");
    }
}
