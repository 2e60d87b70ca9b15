//! Core data structures for task management.

pub mod deadline;
mod task;

pub use task::{validate_title, Task, TaskStatus, MAX_TITLE_LEN};
