// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use chrono::NaiveDate;
use serde::Serialize;

use crate::schema::{Task, TaskPatch, TaskStatus, TaskWithAssignee};

/// One status column of the Kanban board.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KanbanColumn<'a> {
    pub status: TaskStatus,
    pub title: &'static str,
    pub tasks: Vec<&'a TaskWithAssignee>,
}

impl KanbanColumn<'_> {
    /// Text shown in an empty column.
    pub fn empty_message(&self) -> String {
        format!("No tasks in {}", self.title.to_lowercase())
    }
}

/// Groups tasks into the three status columns, keeping input order inside each column.
pub fn columns(tasks: &[TaskWithAssignee]) -> Vec<KanbanColumn<'_>> {
    TaskStatus::ALL
        .into_iter()
        .map(|status| KanbanColumn {
            status,
            title: status.label(),
            tasks: tasks.iter().filter(|t| t.status == status).collect(),
        })
        .collect()
}

/// The patch sent when a card is dropped on `target`.
/// Dropping a card on its own column changes nothing.
pub fn drop_on_column(task: &Task, target: TaskStatus) -> Option<TaskPatch> {
    if task.status == target {
        None
    } else {
        Some(TaskPatch::status(target))
    }
}

/// A task is overdue once its due date has passed and its status is not completed.
pub fn is_overdue(task: &Task, today: NaiveDate) -> bool {
    task.status != TaskStatus::Completed && task.due().is_some_and(|due| due < today)
}

/// Header counters of a board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardStats {
    pub total: usize,
    pub completed: usize,
    pub in_progress: usize,
    pub overdue: usize,
}

pub fn board_stats(tasks: &[TaskWithAssignee], today: NaiveDate) -> BoardStats {
    tasks.iter().fold(BoardStats::default(), |mut stats, task| {
        stats.total += 1;
        match task.status {
            TaskStatus::Completed => stats.completed += 1,
            TaskStatus::InProgress => stats.in_progress += 1,
            TaskStatus::NotStarted => {}
        }
        if is_overdue(task, today) {
            stats.overdue += 1;
        }
        stats
    })
}
