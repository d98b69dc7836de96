// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use std::time::Duration;

use chrono::NaiveDate;

use crate::schema::{DATE_FORMAT, InsertTask, Task, TaskPatch, TaskPriority, TaskStatus};
use crate::validation::FieldError;

/// Select value meaning "no assignee".
pub const UNASSIGNED: &str = "unassigned";

/// State of the task editor dialog. Text inputs are kept as typed.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TaskForm {
    pub name: String,
    pub description: String,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub assignee: String,
    pub due_date: Option<NaiveDate>,
    pub start_date: String,
    pub estimated_hours: String,
}

impl TaskForm {
    /// The form pre-filled from an existing task.
    pub fn from_task(task: &Task) -> Self {
        Self {
            name: task.name.clone(),
            description: task.description.clone().unwrap_or_default(),
            status: task.status,
            priority: task.priority,
            assignee: task
                .assignee_id
                .map(|id| id.to_string())
                .unwrap_or_else(|| UNASSIGNED.to_string()),
            due_date: task.due(),
            start_date: task.start_date.clone().unwrap_or_default(),
            estimated_hours: task.estimated_hours.to_string(),
        }
    }

    fn assignee_id(&self) -> Result<Option<i32>, FieldError> {
        if self.assignee.is_empty() || self.assignee == UNASSIGNED {
            return Ok(None);
        }
        self.assignee
            .parse()
            .map(Some)
            .map_err(|_| FieldError::new("assigneeId", "must be a user id"))
    }

    fn estimated_hours(&self) -> Result<Option<i32>, FieldError> {
        let raw = self.estimated_hours.trim();
        if raw.is_empty() {
            return Ok(None);
        }
        raw.parse()
            .map(Some)
            .map_err(|_| FieldError::new("estimatedHours", "must be a whole number"))
    }

    fn text(value: &str) -> Option<String> {
        (!value.is_empty()).then(|| value.to_string())
    }

    /// Payload for creating a task on `board_id`.
    pub fn to_insert(&self, board_id: i32) -> Result<InsertTask, FieldError> {
        if self.name.trim().is_empty() {
            return Err(FieldError::new("name", "Task name is required"));
        }
        Ok(InsertTask {
            board_id,
            name: self.name.clone(),
            description: Self::text(&self.description),
            status: self.status,
            priority: self.priority,
            assignee_id: self.assignee_id()?,
            due_date: self.due_date.map(|d| d.format(DATE_FORMAT).to_string()),
            start_date: Self::text(&self.start_date),
            estimated_hours: self.estimated_hours()?,
            actual_hours: Some(0),
            position: Some(0),
            completed: false,
        })
    }

    /// Patch for saving the dialog over `existing`.
    ///
    /// Hours and position are carried over from the stored task and `completed`
    /// is reset, as the dialog has no control for it.
    pub fn to_patch(&self, existing: &Task) -> Result<TaskPatch, FieldError> {
        let insert = self.to_insert(existing.board_id)?;
        Ok(TaskPatch {
            board_id: Some(insert.board_id),
            name: Some(insert.name),
            description: Some(insert.description),
            status: Some(insert.status),
            priority: Some(insert.priority),
            assignee_id: Some(insert.assignee_id),
            due_date: Some(insert.due_date),
            start_date: Some(insert.start_date),
            estimated_hours: Some(insert.estimated_hours),
            actual_hours: Some(existing.actual_hours),
            position: Some(existing.position),
            completed: Some(false),
        })
    }
}

/// Converts a duration typed in hours to the whole minutes stored in a time entry.
pub fn hours_to_minutes(hours: f64) -> i32 {
    (hours * 60.0).round() as i32
}

/// Hours elapsed on the stopwatch, rounded down to two decimals.
pub fn elapsed_hours(elapsed: Duration) -> f64 {
    (elapsed.as_secs_f64() / 3600.0 * 100.0).floor() / 100.0
}

/// Stopwatch display, `HH:MM:SS`.
pub fn format_elapsed(seconds: u64) -> String {
    format!(
        "{:02}:{:02}:{:02}",
        seconds / 3600,
        (seconds % 3600) / 60,
        seconds % 60
    )
}

/// Avatar initials, one letter per word of the name.
pub fn initials(name: &str) -> String {
    name.split_whitespace()
        .filter_map(|word| word.chars().next())
        .collect()
}
