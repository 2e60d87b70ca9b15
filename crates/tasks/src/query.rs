//! Task queries derived from a chat intent.
//!
//! A [`TaskQuery`] is a storage-agnostic predicate: the in-memory store
//! evaluates it with [`TaskQuery::apply`], the SQL store translates it into a
//! `WHERE` clause. Both must agree on ordering (deadline ascending with nulls
//! last, then newest first) and on the result cap.

use std::cmp::Ordering;

use chrono::{Datelike, Days, NaiveDate, NaiveDateTime, NaiveTime};

use crate::entities::{Task, TaskStatus};
use crate::intent::{DeadlineBucket, Intent};

/// Maximum number of tasks handed to the model as context.
pub const CHAT_TASK_LIMIT: usize = 50;

/// Filter, ordering and cap applied when fetching tasks for a question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskQuery {
    /// Exact status match
    pub status: Option<TaskStatus>,
    /// Inclusive lower bound on the deadline
    pub deadline_from: Option<NaiveDateTime>,
    /// Exclusive upper bound on the deadline
    pub deadline_until: Option<NaiveDateTime>,
    /// Drop tasks already marked done
    pub exclude_done: bool,
    /// Result cap
    pub limit: usize,
}

impl Default for TaskQuery {
    fn default() -> Self {
        Self::unfiltered()
    }
}

fn start_of(day: NaiveDate) -> NaiveDateTime {
    day.and_time(NaiveTime::MIN)
}

fn add_days(day: NaiveDate, days: u64) -> NaiveDate {
    day.checked_add_days(Days::new(days)).unwrap_or(NaiveDate::MAX)
}

impl TaskQuery {
    /// Every task, ordered and capped.
    #[must_use]
    pub fn unfiltered() -> Self {
        Self {
            status: None,
            deadline_from: None,
            deadline_until: None,
            exclude_done: false,
            limit: CHAT_TASK_LIMIT,
        }
    }

    /// Build the query for an intent, with bucket windows relative to `today`.
    #[must_use]
    pub fn for_intent(intent: &Intent, today: NaiveDate) -> Self {
        let mut query = Self {
            status: intent.status,
            ..Self::unfiltered()
        };

        match intent.deadline {
            Some(DeadlineBucket::Today) => {
                query.deadline_from = Some(start_of(today));
                query.deadline_until = Some(start_of(add_days(today, 1)));
            }
            Some(DeadlineBucket::Tomorrow) => {
                query.deadline_from = Some(start_of(add_days(today, 1)));
                query.deadline_until = Some(start_of(add_days(today, 2)));
            }
            Some(DeadlineBucket::Overdue) => {
                query.deadline_until = Some(start_of(today));
                query.exclude_done = true;
            }
            Some(DeadlineBucket::ThisWeek) => {
                // Monday-based weeks: Sunday is the last day.
                let to_sunday = 6 - u64::from(today.weekday().num_days_from_monday());
                query.deadline_from = Some(start_of(today));
                query.deadline_until = Some(start_of(add_days(today, to_sunday + 1)));
            }
            None => {}
        }

        query
    }

    /// Whether the query selects every task.
    #[must_use]
    pub fn is_unfiltered(&self) -> bool {
        self.status.is_none()
            && self.deadline_from.is_none()
            && self.deadline_until.is_none()
            && !self.exclude_done
    }

    /// Whether any deadline bound is present (tasks without one never match).
    #[must_use]
    pub fn has_deadline_bound(&self) -> bool {
        self.deadline_from.is_some() || self.deadline_until.is_some()
    }

    /// Evaluate the filter part of the query against one task.
    #[must_use]
    pub fn matches(&self, task: &Task) -> bool {
        if self.status.is_some_and(|s| s != task.status) {
            return false;
        }
        if self.exclude_done && task.status == TaskStatus::Done {
            return false;
        }
        if !self.has_deadline_bound() {
            return true;
        }
        let Some(deadline) = task.deadline else {
            return false;
        };
        self.deadline_from.is_none_or(|from| deadline >= from)
            && self.deadline_until.is_none_or(|until| deadline < until)
    }

    /// Filter, order and cap an in-memory task collection.
    pub fn apply(&self, tasks: impl IntoIterator<Item = Task>) -> Vec<Task> {
        let mut selected: Vec<Task> = tasks.into_iter().filter(|t| self.matches(t)).collect();
        sort_for_chat(&mut selected);
        selected.truncate(self.limit);
        selected
    }
}

/// Order by deadline ascending (tasks without a deadline last), then by
/// creation time, newest first, then by id, highest first.
pub fn sort_for_chat(tasks: &mut [Task]) {
    tasks.sort_by(|a, b| {
        let by_deadline = match (a.deadline, b.deadline) {
            (Some(x), Some(y)) => x.cmp(&y),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        };
        by_deadline
            .then_with(|| b.created_at.cmp(&a.created_at))
            .then_with(|| b.id.cmp(&a.id))
    });
}
