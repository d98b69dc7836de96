// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use chrono::{Datelike, Days, Months, NaiveDate, Weekday};

use crate::schema::{TaskStatus, TaskWithAssignee};
use crate::views::kanban::is_overdue;
use crate::views::report::percent;

/// Cards shown per calendar cell before the "+N more" marker.
pub const CELL_LIMIT: usize = 3;

/// Tasks whose due date is exactly `day`.
pub fn tasks_due_on(tasks: &[TaskWithAssignee], day: NaiveDate) -> Vec<&TaskWithAssignee> {
    tasks.iter().filter(|t| t.due() == Some(day)).collect()
}

/// Tasks whose due date falls in `[start, end]`.
pub fn tasks_due_between(
    tasks: &[TaskWithAssignee],
    start: NaiveDate,
    end: NaiveDate,
) -> Vec<&TaskWithAssignee> {
    tasks
        .iter()
        .filter(|t| t.due().is_some_and(|due| due >= start && due <= end))
        .collect()
}

fn first_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

fn last_of_month(date: NaiveDate) -> NaiveDate {
    first_of_month(date)
        .checked_add_months(Months::new(1))
        .and_then(|next| next.pred_opt())
        .unwrap_or(date)
}

fn days_between(start: NaiveDate, end: NaiveDate) -> impl Iterator<Item = NaiveDate> {
    start.iter_days().take_while(move |d| *d <= end)
}

#[derive(Debug, Clone, PartialEq)]
pub struct CalendarDay<'a> {
    pub date: NaiveDate,
    pub in_current_month: bool,
    pub is_today: bool,
    pub tasks: Vec<&'a TaskWithAssignee>,
}

impl<'a> CalendarDay<'a> {
    /// The cards rendered in the cell.
    pub fn visible(&self) -> &[&'a TaskWithAssignee] {
        &self.tasks[..self.tasks.len().min(CELL_LIMIT)]
    }

    /// Number of tasks hidden behind "+N more".
    pub fn overflow(&self) -> usize {
        self.tasks.len().saturating_sub(CELL_LIMIT)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MonthSummary {
    pub due_this_month: usize,
    pub due_today: usize,
    pub overdue: usize,
}

/// A month grid padded to whole Sunday-to-Saturday weeks.
#[derive(Debug, Clone, PartialEq)]
pub struct CalendarMonth<'a> {
    pub month: NaiveDate,
    pub days: Vec<CalendarDay<'a>>,
    pub summary: MonthSummary,
}

impl<'a> CalendarMonth<'a> {
    pub fn weeks(&self) -> impl Iterator<Item = &[CalendarDay<'a>]> {
        self.days.chunks(7)
    }

    /// Title such as "December 2024".
    pub fn title(&self) -> String {
        self.month.format("%B %Y").to_string()
    }
}

/// Builds the calendar for the month containing `anchor`.
pub fn month_grid(
    tasks: &[TaskWithAssignee],
    anchor: NaiveDate,
    today: NaiveDate,
) -> CalendarMonth<'_> {
    let month = first_of_month(anchor);
    let month_end = last_of_month(anchor);
    let grid_start = month.week(Weekday::Sun).first_day();
    let grid_end = month_end.week(Weekday::Sun).last_day();

    let days = days_between(grid_start, grid_end)
        .map(|date| CalendarDay {
            date,
            in_current_month: date.month() == month.month() && date.year() == month.year(),
            is_today: date == today,
            tasks: tasks_due_on(tasks, date),
        })
        .collect();

    let summary = MonthSummary {
        due_this_month: tasks_due_between(tasks, month, month_end).len(),
        due_today: tasks_due_on(tasks, today).len(),
        overdue: tasks.iter().filter(|t| is_overdue(t, today)).count(),
    };

    CalendarMonth {
        month,
        days,
        summary,
    }
}

pub fn next_month(anchor: NaiveDate) -> NaiveDate {
    first_of_month(anchor)
        .checked_add_months(Months::new(1))
        .unwrap_or(anchor)
}

pub fn previous_month(anchor: NaiveDate) -> NaiveDate {
    first_of_month(anchor)
        .checked_sub_months(Months::new(1))
        .unwrap_or(anchor)
}

#[derive(Debug, Clone, PartialEq)]
pub struct TimelineDay<'a> {
    pub date: NaiveDate,
    pub is_today: bool,
    pub tasks: Vec<&'a TaskWithAssignee>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WeekSummary {
    pub total: usize,
    pub completed: usize,
    pub completion_rate: u32,
    pub estimated_hours: i64,
    pub actual_hours: i64,
}

/// A Monday-to-Sunday week of due tasks.
#[derive(Debug, Clone, PartialEq)]
pub struct TimelineWeek<'a> {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub days: Vec<TimelineDay<'a>>,
    pub summary: WeekSummary,
}

pub fn week_timeline(
    tasks: &[TaskWithAssignee],
    anchor: NaiveDate,
    today: NaiveDate,
) -> TimelineWeek<'_> {
    let week = anchor.week(Weekday::Mon);
    let (start, end) = (week.first_day(), week.last_day());

    let days = days_between(start, end)
        .map(|date| TimelineDay {
            date,
            is_today: date == today,
            tasks: tasks_due_on(tasks, date),
        })
        .collect();

    let in_week = tasks_due_between(tasks, start, end);
    let completed = in_week
        .iter()
        .filter(|t| t.status == TaskStatus::Completed)
        .count();
    let summary = WeekSummary {
        total: in_week.len(),
        completed,
        completion_rate: percent(completed, in_week.len()),
        estimated_hours: in_week.iter().map(|t| i64::from(t.estimated_hours)).sum(),
        actual_hours: in_week.iter().map(|t| i64::from(t.actual_hours)).sum(),
    };

    TimelineWeek {
        start,
        end,
        days,
        summary,
    }
}

pub fn next_week(anchor: NaiveDate) -> NaiveDate {
    anchor.checked_add_days(Days::new(7)).unwrap_or(anchor)
}

pub fn previous_week(anchor: NaiveDate) -> NaiveDate {
    anchor.checked_sub_days(Days::new(7)).unwrap_or(anchor)
}
