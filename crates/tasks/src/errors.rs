//! Error types for the tasks crate.

use thiserror::Error;

/// Errors raised by the task domain.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TasksError {
    #[error("Invalid status: '{status}'")]
    InvalidStatus { status: String },

    #[error("{field} {reason}")]
    Validation { field: String, reason: String },
}

/// Result type alias for tasks operations
pub type TasksResult<T> = Result<T, TasksError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = TasksError::InvalidStatus {
            status: "Blocked".to_string(),
        };
        assert_eq!(err.to_string(), "Invalid status: 'Blocked'");

        let err = TasksError::Validation {
            field: "title".to_string(),
            reason: "cannot be empty".to_string(),
        };
        assert_eq!(err.to_string(), "title cannot be empty");
    }
}
