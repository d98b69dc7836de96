// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use chrono::NaiveDate;
use serde::Serialize;

use crate::schema::{TaskPriority, TaskStatus, TaskWithAssignee, User};

/// Rounded percentage of `part` in `whole`; 0 when `whole` is 0.
pub fn percent(part: usize, whole: usize) -> u32 {
    if whole == 0 {
        return 0;
    }
    (part as f64 / whole as f64 * 100.0).round() as u32
}

/// A bucket of a distribution chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Share<K> {
    pub key: K,
    pub count: usize,
    pub percentage: u32,
}

/// Counts per key, in order of first appearance.
fn distribution<K: PartialEq + Copy>(keys: impl Iterator<Item = K>, total: usize) -> Vec<Share<K>> {
    let mut shares: Vec<Share<K>> = Vec::new();
    for key in keys {
        match shares.iter_mut().find(|s| s.key == key) {
            Some(share) => share.count += 1,
            None => shares.push(Share {
                key,
                count: 1,
                percentage: 0,
            }),
        }
    }
    for share in &mut shares {
        share.percentage = percent(share.count, total);
    }
    shares
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserStats {
    pub user_id: i32,
    pub name: String,
    pub total_tasks: usize,
    pub completed_tasks: usize,
    pub completion_rate: u32,
    pub hours: i64,
}

/// Figures of the reports page.
///
/// Unlike the board header, completion here is read from the `completed` flag.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub total_tasks: usize,
    pub completed_tasks: usize,
    pub overdue_tasks: usize,
    pub completion_rate: u32,
    pub estimated_hours: i64,
    pub actual_hours: i64,
    pub status_counts: Vec<Share<TaskStatus>>,
    pub priority_counts: Vec<Share<TaskPriority>>,
    pub user_stats: Vec<UserStats>,
}

/// Builds the report over `tasks`, restricted to `board` when given.
/// Users without any task in scope are left out of `user_stats`.
pub fn build_report(
    tasks: &[TaskWithAssignee],
    users: &[User],
    board: Option<i32>,
    today: NaiveDate,
) -> Report {
    let scoped: Vec<&TaskWithAssignee> = tasks
        .iter()
        .filter(|t| board.is_none_or(|id| t.board_id == id))
        .collect();
    let total = scoped.len();
    let completed = scoped.iter().filter(|t| t.completed).count();
    let overdue = scoped
        .iter()
        .filter(|t| !t.completed && t.due().is_some_and(|due| due < today))
        .count();

    let user_stats = users
        .iter()
        .filter_map(|user| {
            let owned: Vec<&&TaskWithAssignee> = scoped
                .iter()
                .filter(|t| t.assignee_id == Some(user.id))
                .collect();
            if owned.is_empty() {
                return None;
            }
            let done = owned.iter().filter(|t| t.completed).count();
            Some(UserStats {
                user_id: user.id,
                name: user.name.clone(),
                total_tasks: owned.len(),
                completed_tasks: done,
                completion_rate: percent(done, owned.len()),
                hours: owned.iter().map(|t| i64::from(t.actual_hours)).sum(),
            })
        })
        .collect();

    Report {
        total_tasks: total,
        completed_tasks: completed,
        overdue_tasks: overdue,
        completion_rate: percent(completed, total),
        estimated_hours: scoped.iter().map(|t| i64::from(t.estimated_hours)).sum(),
        actual_hours: scoped.iter().map(|t| i64::from(t.actual_hours)).sum(),
        status_counts: distribution(scoped.iter().map(|t| t.status), total),
        priority_counts: distribution(scoped.iter().map(|t| t.priority), total),
        user_stats,
    }
}
