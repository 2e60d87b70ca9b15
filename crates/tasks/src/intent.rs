//! Intent detection - infer which tasks a chat question is about.
//!
//! Keyword rules over the lower-cased question decide an optional status
//! filter and an optional deadline bucket. Within each category the rule
//! lists are checked in order and the first hit wins, so "belum selesai"
//! resolves to `Todo` before the bare "selesai" rule for `Done` is reached.

use serde::{Deserialize, Serialize};

use crate::entities::TaskStatus;

/// Calendar window a question refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeadlineBucket {
    Today,
    Tomorrow,
    Overdue,
    ThisWeek,
}

impl DeadlineBucket {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Today => "today",
            Self::Tomorrow => "tomorrow",
            Self::Overdue => "overdue",
            Self::ThisWeek => "this_week",
        }
    }
}

impl std::fmt::Display for DeadlineBucket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured filter inferred from a question.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Intent {
    pub status: Option<TaskStatus>,
    pub deadline: Option<DeadlineBucket>,
}

impl Intent {
    /// No rule matched.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.status.is_none() && self.deadline.is_none()
    }
}

const STATUS_RULES: &[(TaskStatus, &[&str])] = &[
    (
        TaskStatus::Todo,
        &["belum selesai", "belum dikerjakan", "todo", "to do", "pending"],
    ),
    (
        TaskStatus::InProgress,
        &["sedang dikerjakan", "in progress", "ongoing", "proses"],
    ),
    (TaskStatus::Done, &["selesai", "done", "completed", "sudah"]),
];

const DEADLINE_RULES: &[(DeadlineBucket, &[&str])] = &[
    (DeadlineBucket::Today, &["hari ini", "today"]),
    (DeadlineBucket::Tomorrow, &["besok", "tomorrow"]),
    (DeadlineBucket::Overdue, &["terlambat", "overdue", "lewat"]),
    (DeadlineBucket::ThisWeek, &["minggu ini", "this week"]),
];

fn first_match<T: Copy>(text: &str, rules: &[(T, &[&str])]) -> Option<T> {
    rules
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|k| text.contains(k)))
        .map(|(value, _)| *value)
}

/// Detect the status and deadline filters a question asks for.
#[must_use]
pub fn detect_intent(question: &str) -> Intent {
    let text = question.to_lowercase();
    Intent {
        status: first_match(&text, STATUS_RULES),
        deadline: first_match(&text, DEADLINE_RULES),
    }
}
