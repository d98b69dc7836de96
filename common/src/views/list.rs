// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use std::cmp::Ordering;
use std::str::FromStr;

use crate::schema::{ParseEnumError, TaskStatus, TaskWithAssignee};

/// Status filter of the dashboard list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusFilter {
    #[default]
    All,
    Only(TaskStatus),
}

impl StatusFilter {
    pub fn matches(&self, task: &TaskWithAssignee) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Only(status) => task.status == *status,
        }
    }
}

impl FromStr for StatusFilter {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "all" {
            Ok(StatusFilter::All)
        } else {
            s.parse().map(StatusFilter::Only)
        }
    }
}

/// Sort key of the dashboard list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortKey {
    #[default]
    Name,
    /// Highest priority first.
    Priority,
    /// Earliest due date first, undated tasks last.
    DueDate,
    Status,
}

impl FromStr for SortKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "name" => Ok(SortKey::Name),
            "priority" => Ok(SortKey::Priority),
            "dueDate" => Ok(SortKey::DueDate),
            "status" => Ok(SortKey::Status),
            other => Err(format!("unknown sort key '{other}'")),
        }
    }
}

/// Case-insensitive first, so "alpha" and "Alpha" sit next to each other.
fn compare_names(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

impl SortKey {
    pub fn compare(&self, a: &TaskWithAssignee, b: &TaskWithAssignee) -> Ordering {
        match self {
            SortKey::Name => compare_names(&a.name, &b.name),
            SortKey::Priority => b.priority.rank().cmp(&a.priority.rank()),
            SortKey::DueDate => match (a.due(), b.due()) {
                (None, None) => Ordering::Equal,
                (None, Some(_)) => Ordering::Greater,
                (Some(_), None) => Ordering::Less,
                (Some(x), Some(y)) => x.cmp(&y),
            },
            SortKey::Status => a.status.as_str().cmp(b.status.as_str()),
        }
    }
}

/// Applies the status filter then a stable sort by `sort`.
pub fn filter_and_sort(
    tasks: &[TaskWithAssignee],
    filter: StatusFilter,
    sort: SortKey,
) -> Vec<TaskWithAssignee> {
    let mut filtered: Vec<TaskWithAssignee> =
        tasks.iter().filter(|t| filter.matches(t)).cloned().collect();
    filtered.sort_by(|a, b| sort.compare(a, b));
    filtered
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableColumn {
    Name,
    Assignee,
    Status,
    Priority,
    DueDate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

/// Column sort state of the board table view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TableSort {
    pub column: Option<TableColumn>,
    pub direction: SortDirection,
}

impl TableSort {
    /// Header click: the active column flips direction, a new column starts ascending.
    pub fn toggle(&mut self, column: TableColumn) {
        if self.column == Some(column) {
            self.direction = match self.direction {
                SortDirection::Asc => SortDirection::Desc,
                SortDirection::Desc => SortDirection::Asc,
            };
        } else {
            self.column = Some(column);
            self.direction = SortDirection::Asc;
        }
    }

    fn compare(column: TableColumn, a: &TaskWithAssignee, b: &TaskWithAssignee) -> Ordering {
        match column {
            TableColumn::Name => a.name.cmp(&b.name),
            TableColumn::Assignee => {
                let name = |t: &TaskWithAssignee| {
                    t.assignee.as_ref().map(|u| u.name.clone()).unwrap_or_default()
                };
                name(a).cmp(&name(b))
            }
            TableColumn::Status => a.status.as_str().cmp(b.status.as_str()),
            TableColumn::Priority => a.priority.rank().cmp(&b.priority.rank()),
            // Undated rows sort as the epoch, i.e. before every dated row.
            TableColumn::DueDate => a.due().cmp(&b.due()),
        }
    }

    /// Sorted copy of `tasks`; without an active column the input order is kept.
    pub fn apply(&self, tasks: &[TaskWithAssignee]) -> Vec<TaskWithAssignee> {
        let mut sorted = tasks.to_vec();
        if let Some(column) = self.column {
            sorted.sort_by(|a, b| {
                let ordering = Self::compare(column, a, b);
                match self.direction {
                    SortDirection::Asc => ordering,
                    SortDirection::Desc => ordering.reverse(),
                }
            });
        }
        sorted
    }
}
