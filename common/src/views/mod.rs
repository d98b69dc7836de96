// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.

//! Derived state of the board, calendar, timeline and report screens.
//!
//! Everything here is a pure function of a task list (plus "today" where dates
//! matter); nothing filters or sorts on the server.
pub mod calendar;
pub mod forms;
pub mod kanban;
pub mod list;
pub mod report;

pub use calendar::{month_grid, week_timeline, CalendarMonth, TimelineWeek};
pub use forms::{format_elapsed, hours_to_minutes, initials, TaskForm};
pub use kanban::{board_stats, columns, drop_on_column, BoardStats, KanbanColumn};
pub use list::{filter_and_sort, SortKey, StatusFilter, TableColumn, TableSort};
pub use report::{build_report, Report};

#[cfg(test)]
pub(crate) mod tests {
    use chrono::NaiveDate;

    use crate::schema::{InsertTask, TaskPriority, TaskStatus, TaskWithAssignee};

    pub(crate) fn date(value: &str) -> NaiveDate {
        crate::schema::parse_date(value).unwrap()
    }

    pub(crate) fn task(
        id: i32,
        name: &str,
        status: TaskStatus,
        priority: TaskPriority,
        due: Option<&str>,
    ) -> TaskWithAssignee {
        let mut payload = InsertTask::named(1, name);
        payload.status = status;
        payload.priority = priority;
        payload.due_date = due.map(str::to_string);
        payload.position = Some(id);
        TaskWithAssignee {
            task: payload.into_task(id),
            assignee: None,
        }
    }
}
