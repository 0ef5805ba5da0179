//! Note create/update form.

use crate::forms::{
    clean_optional_integer, clean_required_integer, clean_required_text, Form, FormErrors,
};
use crate::model::todo::{Todo, TodoFields, DAY_MAX_CHARS, TASK_MAX_CHARS};
use serde::{Deserialize, Serialize};

/// Raw note submission as received from the client.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NoteForm {
    pub day: Option<String>,
    pub month: Option<String>,
    pub year: Option<String>,
    pub time: Option<String>,
    pub task: Option<String>,
}

impl NoteForm {
    /// Builds a form pre-filled with the current values of `todo`.
    pub fn from_todo(todo: &Todo) -> Self {
        Self {
            day: Some(todo.day.clone()),
            month: Some(todo.month.to_string()),
            year: Some(todo.year.to_string()),
            time: todo.time.map(|time| time.to_string()),
            task: Some(todo.task.clone()),
        }
    }
}

impl Form for NoteForm {
    type Cleaned = TodoFields;

    fn validate(&self) -> Result<TodoFields, FormErrors> {
        let mut errors = FormErrors::new();
        let day = clean_required_text(&mut errors, "day", self.day.as_deref(), DAY_MAX_CHARS);
        let month = clean_required_integer(&mut errors, "month", self.month.as_deref());
        let year = clean_required_integer(&mut errors, "year", self.year.as_deref());
        let time = clean_optional_integer(&mut errors, "time", self.time.as_deref());
        let task = clean_required_text(&mut errors, "task", self.task.as_deref(), TASK_MAX_CHARS);

        match (day, month, year, time, task) {
            (Some(day), Some(month), Some(year), Some(time), Some(task)) if errors.is_empty() => {
                Ok(TodoFields {
                    day,
                    month,
                    year,
                    time,
                    task,
                })
            }
            _ => Err(errors),
        }
    }
}
