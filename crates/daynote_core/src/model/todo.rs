//! Todo note model.
//!
//! # Responsibility
//! - Define the persisted note shape and its editable field set.
//!
//! # Invariants
//! - `id` is assigned by storage and never reused.
//! - `author` is written once at creation and never reassigned by updates.

use crate::model::user::UserId;
use serde::{Deserialize, Serialize};

/// Storage-assigned identifier of a todo note.
pub type TodoId = i64;

/// Maximum length of `Todo::day` in characters.
pub const DAY_MAX_CHARS: usize = 25;
/// Maximum length of `Todo::task` in characters.
pub const TASK_MAX_CHARS: usize = 200;

/// Persisted todo note.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Todo {
    pub id: TodoId,
    /// Short day label, usually a weekday name.
    pub day: String,
    pub month: i32,
    pub year: i32,
    /// `None` means no time was set.
    pub time: Option<i32>,
    pub task: String,
    /// Creator of the note. Only `None` for rows written outside the workflow.
    pub author: Option<UserId>,
}

/// Editable field set of a note, as produced by a validated note form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoFields {
    pub day: String,
    pub month: i32,
    pub year: i32,
    pub time: Option<i32>,
    pub task: String,
}

impl Todo {
    /// Returns the editable fields of this note.
    pub fn fields(&self) -> TodoFields {
        TodoFields {
            day: self.day.clone(),
            month: self.month,
            year: self.year,
            time: self.time,
            task: self.task.clone(),
        }
    }

    /// Returns whether `user_id` created this note.
    pub fn is_authored_by(&self, user_id: UserId) -> bool {
        self.author == Some(user_id)
    }
}
