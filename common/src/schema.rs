// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use std::fmt;
use std::ops::Deref;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Wire and storage format of every date-only field (`dueDate`, `startDate`, `date`).
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Color given to boards created without one.
pub const DEFAULT_BOARD_COLOR: &str = "#0073EA";

/// Status given to boards created without one.
pub const DEFAULT_BOARD_STATUS: &str = "active";

/// Board that receives tasks created without a `boardId`.
pub const DEFAULT_BOARD_ID: i32 = 1;

/// Parses a `YYYY-MM-DD` string, returning `None` for anything else.
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value, DATE_FORMAT).ok()
}

/// Error returned when a status or priority string is not one of the known values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseEnumError {
    kind: &'static str,
    value: String,
}

impl fmt::Display for ParseEnumError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown {} '{}'", self.kind, self.value)
    }
}

impl std::error::Error for ParseEnumError {}

/// Workflow state of a task. Serialized in kebab-case (`not-started`, ...).
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "kebab-case")]
pub enum TaskStatus {
    #[default]
    NotStarted,
    InProgress,
    Completed,
}

impl TaskStatus {
    /// Column order used by the Kanban view.
    pub const ALL: [TaskStatus; 3] = [
        TaskStatus::NotStarted,
        TaskStatus::InProgress,
        TaskStatus::Completed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::NotStarted => "not-started",
            TaskStatus::InProgress => "in-progress",
            TaskStatus::Completed => "completed",
        }
    }

    /// Human readable label.
    pub fn label(&self) -> &'static str {
        match self {
            TaskStatus::NotStarted => "Not Started",
            TaskStatus::InProgress => "In Progress",
            TaskStatus::Completed => "Completed",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TaskStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| ParseEnumError {
                kind: "status",
                value: s.to_string(),
            })
    }
}

impl TryFrom<String> for TaskStatus {
    type Error = ParseEnumError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Urgency of a task. Serialized in lowercase.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum TaskPriority {
    Low,
    #[default]
    Medium,
    High,
}

impl TaskPriority {
    pub const ALL: [TaskPriority; 3] = [TaskPriority::Low, TaskPriority::Medium, TaskPriority::High];

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskPriority::Low => "low",
            TaskPriority::Medium => "medium",
            TaskPriority::High => "high",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TaskPriority::Low => "Low",
            TaskPriority::Medium => "Medium",
            TaskPriority::High => "High",
        }
    }

    /// Sort rank: high = 3, medium = 2, low = 1.
    pub fn rank(&self) -> u8 {
        match self {
            TaskPriority::Low => 1,
            TaskPriority::Medium => 2,
            TaskPriority::High => 3,
        }
    }
}

impl fmt::Display for TaskPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskPriority {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TaskPriority::ALL
            .into_iter()
            .find(|priority| priority.as_str() == s)
            .ok_or_else(|| ParseEnumError {
                kind: "priority",
                value: s.to_string(),
            })
    }
}

impl TryFrom<String> for TaskPriority {
    type Error = ParseEnumError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// A person who creates boards and gets tasks assigned.
///
/// The password is accepted when reading (creation, storage rows) but never
/// written back out in API responses.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i32,
    pub username: String,
    #[serde(default, skip_serializing)]
    pub password: String,
    pub name: String,
    pub email: String,
    pub avatar: Option<String>,
}

/// A named collection of tasks.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Board {
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
    pub color: String,
    pub status: String,
    pub created_by: i32,
}

/// A unit of work on a board.
///
/// `completed` and `status` are stored independently; nothing keeps
/// `completed == (status == Completed)`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: i32,
    pub board_id: i32,
    pub name: String,
    pub description: Option<String>,
    #[sqlx(try_from = "String")]
    pub status: TaskStatus,
    #[sqlx(try_from = "String")]
    pub priority: TaskPriority,
    pub assignee_id: Option<i32>,
    pub due_date: Option<String>,
    pub start_date: Option<String>,
    pub estimated_hours: i32,
    pub actual_hours: i32,
    pub position: i32,
    pub completed: bool,
}

impl Task {
    /// The due date, if set and well formed.
    pub fn due(&self) -> Option<NaiveDate> {
        self.due_date.as_deref().and_then(parse_date)
    }
}

/// Time logged against a task, in whole minutes.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct TimeEntry {
    pub id: i32,
    pub task_id: i32,
    pub user_id: i32,
    pub description: Option<String>,
    pub minutes: i32,
    pub date: String,
    pub created_at: DateTime<Utc>,
}

/// A task joined with its assignee. The join is computed, never persisted.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct TaskWithAssignee {
    #[serde(flatten)]
    pub task: Task,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignee: Option<User>,
}

impl Deref for TaskWithAssignee {
    type Target = Task;

    fn deref(&self) -> &Task {
        &self.task
    }
}

/// A board together with its tasks in position order.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct BoardWithTasks {
    #[serde(flatten)]
    pub board: Board,
    pub tasks: Vec<TaskWithAssignee>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InsertUser {
    pub username: String,
    pub password: String,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub avatar: Option<String>,
}

impl InsertUser {
    pub fn into_user(self, id: i32) -> User {
        User {
            id,
            username: self.username,
            password: self.password,
            name: self.name,
            email: self.email,
            avatar: self.avatar.filter(|a| !a.is_empty()),
        }
    }
}

fn default_board_color() -> String {
    DEFAULT_BOARD_COLOR.to_string()
}

fn default_board_status() -> String {
    DEFAULT_BOARD_STATUS.to_string()
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InsertBoard {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default = "default_board_color")]
    pub color: String,
    #[serde(default = "default_board_status")]
    pub status: String,
    pub created_by: i32,
}

impl InsertBoard {
    pub fn into_board(self, id: i32) -> Board {
        Board {
            id,
            name: self.name,
            description: self.description.filter(|d| !d.is_empty()),
            color: self.color,
            status: self.status,
            created_by: self.created_by,
        }
    }
}

fn default_board_id() -> i32 {
    DEFAULT_BOARD_ID
}

/// Payload for creating a task. Everything except `name` has a default.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InsertTask {
    #[serde(default = "default_board_id")]
    pub board_id: i32,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: TaskStatus,
    #[serde(default)]
    pub priority: TaskPriority,
    #[serde(default)]
    pub assignee_id: Option<i32>,
    #[serde(default)]
    pub due_date: Option<String>,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub estimated_hours: Option<i32>,
    #[serde(default)]
    pub actual_hours: Option<i32>,
    #[serde(default)]
    pub position: Option<i32>,
    #[serde(default)]
    pub completed: bool,
}

impl InsertTask {
    /// A payload with the given name and every other field defaulted.
    pub fn named(board_id: i32, name: impl Into<String>) -> Self {
        Self {
            board_id,
            name: name.into(),
            description: None,
            status: TaskStatus::default(),
            priority: TaskPriority::default(),
            assignee_id: None,
            due_date: None,
            start_date: None,
            estimated_hours: None,
            actual_hours: None,
            position: None,
            completed: false,
        }
    }

    /// Builds the stored task. Empty strings and a zero assignee id count as unset.
    pub fn into_task(self, id: i32) -> Task {
        Task {
            id,
            board_id: self.board_id,
            name: self.name,
            description: self.description.filter(|d| !d.is_empty()),
            status: self.status,
            priority: self.priority,
            assignee_id: self.assignee_id.filter(|&a| a != 0),
            due_date: self.due_date.filter(|d| !d.is_empty()),
            start_date: self.start_date.filter(|d| !d.is_empty()),
            estimated_hours: self.estimated_hours.unwrap_or(0),
            actual_hours: self.actual_hours.unwrap_or(0),
            position: self.position.unwrap_or(0),
            completed: self.completed,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InsertTimeEntry {
    pub task_id: i32,
    pub user_id: i32,
    #[serde(default)]
    pub description: Option<String>,
    pub minutes: i32,
    pub date: String,
}

impl InsertTimeEntry {
    pub fn into_entry(self, id: i32, created_at: DateTime<Utc>) -> TimeEntry {
        TimeEntry {
            id,
            task_id: self.task_id,
            user_id: self.user_id,
            description: self.description.filter(|d| !d.is_empty()),
            minutes: self.minutes,
            date: self.date,
            created_at,
        }
    }
}

/// Distinguishes an explicit `null` (`Some(None)`) from an absent field (`None`).
fn nullable<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Fields of a board that may change through `PATCH /api/boards/{id}`.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BoardPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub description: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_by: Option<i32>,
}

impl BoardPatch {
    pub fn apply(self, board: &mut Board) {
        if let Some(name) = self.name {
            board.name = name;
        }
        if let Some(description) = self.description {
            board.description = description.filter(|d| !d.is_empty());
        }
        if let Some(color) = self.color {
            board.color = color;
        }
        if let Some(status) = self.status {
            board.status = status;
        }
        if let Some(created_by) = self.created_by {
            board.created_by = created_by;
        }
    }
}

/// Fields of a task that may change through `PATCH /api/tasks/{id}`.
///
/// Nullable columns use `Option<Option<_>>`: `Some(None)` clears the value.
/// A cleared estimate goes back to 0. Empty strings and a zero assignee id
/// clear too, as they do on creation.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TaskPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub board_id: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub description: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<TaskStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<TaskPriority>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub assignee_id: Option<Option<i32>>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub due_date: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub start_date: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub estimated_hours: Option<Option<i32>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actual_hours: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
}

impl TaskPatch {
    /// A patch that only moves the task to another status.
    pub fn status(status: TaskStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    pub fn apply(self, task: &mut Task) {
        if let Some(board_id) = self.board_id {
            task.board_id = board_id;
        }
        if let Some(name) = self.name {
            task.name = name;
        }
        if let Some(description) = self.description {
            task.description = description.filter(|d| !d.is_empty());
        }
        if let Some(status) = self.status {
            task.status = status;
        }
        if let Some(priority) = self.priority {
            task.priority = priority;
        }
        if let Some(assignee_id) = self.assignee_id {
            task.assignee_id = assignee_id.filter(|&a| a != 0);
        }
        if let Some(due_date) = self.due_date {
            task.due_date = due_date.filter(|d| !d.is_empty());
        }
        if let Some(start_date) = self.start_date {
            task.start_date = start_date.filter(|d| !d.is_empty());
        }
        if let Some(estimated_hours) = self.estimated_hours {
            task.estimated_hours = estimated_hours.unwrap_or(0);
        }
        if let Some(actual_hours) = self.actual_hours {
            task.actual_hours = actual_hours;
        }
        if let Some(position) = self.position {
            task.position = position;
        }
        if let Some(completed) = self.completed {
            task.completed = completed;
        }
    }
}

/// Body of `PATCH /api/tasks/positions`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TaskPositions {
    pub task_ids: Vec<i32>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_task() -> Task {
        InsertTask::named(1, "Write docs").into_task(7)
    }

    #[test]
    fn test_status_and_priority_wire_names() {
        assert_eq!(json!(TaskStatus::NotStarted), json!("not-started"));
        assert_eq!(json!(TaskStatus::InProgress), json!("in-progress"));
        assert_eq!(json!(TaskPriority::High), json!("high"));
        assert_eq!("completed".parse::<TaskStatus>(), Ok(TaskStatus::Completed));
        assert!("done".parse::<TaskStatus>().is_err());
        assert!(TaskPriority::try_from("urgent".to_string()).is_err());
    }

    #[test]
    fn test_insert_task_defaults() {
        let payload: InsertTask = serde_json::from_value(json!({ "name": "X" })).unwrap();
        assert_eq!(payload.board_id, DEFAULT_BOARD_ID);
        assert_eq!(payload.status, TaskStatus::NotStarted);
        assert_eq!(payload.priority, TaskPriority::Medium);

        let task = payload.into_task(3);
        assert_eq!(task.id, 3);
        assert_eq!(task.estimated_hours, 0);
        assert_eq!(task.position, 0);
        assert!(!task.completed);
    }

    #[test]
    fn test_insert_task_normalizes_empty_values() {
        let payload: InsertTask = serde_json::from_value(json!({
            "boardId": 2,
            "name": "X",
            "description": "",
            "assigneeId": 0,
            "dueDate": ""
        }))
        .unwrap();
        let task = payload.into_task(1);
        assert_eq!(task.description, None);
        assert_eq!(task.assignee_id, None);
        assert_eq!(task.due_date, None);
    }

    #[test]
    fn test_task_with_assignee_omits_missing_assignee() {
        let joined = TaskWithAssignee {
            task: sample_task(),
            assignee: None,
        };
        let value = serde_json::to_value(&joined).unwrap();
        assert_eq!(value["name"], "Write docs");
        assert_eq!(value["boardId"], 1);
        assert!(value.get("assignee").is_none());
    }

    #[test]
    fn test_user_password_is_not_serialized() {
        let user = InsertUser {
            username: "ada".into(),
            password: "secret".into(),
            name: "Ada".into(),
            email: "ada@example.com".into(),
            avatar: None,
        }
        .into_user(1);
        let value = serde_json::to_value(&user).unwrap();
        assert!(value.get("password").is_none());
        let back: User = serde_json::from_value(value).unwrap();
        assert_eq!(back.password, "");
    }

    #[test]
    fn test_task_patch_distinguishes_null_from_absent() {
        let mut task = sample_task();
        task.description = Some("old".into());
        task.assignee_id = Some(4);
        task.estimated_hours = 5;

        let patch: TaskPatch = serde_json::from_value(json!({
            "description": null,
            "estimatedHours": null,
            "status": "in-progress",
            "id": 99
        }))
        .unwrap();
        patch.apply(&mut task);

        assert_eq!(task.id, 7);
        assert_eq!(task.description, None);
        assert_eq!(task.assignee_id, Some(4));
        assert_eq!(task.estimated_hours, 0);
        assert_eq!(task.status, TaskStatus::InProgress);
        assert!(!task.completed);
    }

    #[test]
    fn test_patches_normalize_empty_values() {
        let mut task = sample_task();
        task.description = Some("old".into());
        task.assignee_id = Some(4);
        task.due_date = Some("2024-12-15".into());

        let patch: TaskPatch = serde_json::from_value(json!({
            "description": "",
            "assigneeId": 0,
            "dueDate": "",
            "startDate": ""
        }))
        .unwrap();
        patch.apply(&mut task);

        assert_eq!(task.description, None);
        assert_eq!(task.assignee_id, None);
        assert_eq!(task.due_date, None);
        assert_eq!(task.start_date, None);

        let mut board = InsertBoard {
            name: "Ops".into(),
            description: Some("infra".into()),
            color: "#112233".into(),
            status: "active".into(),
            created_by: 1,
        }
        .into_board(2);
        let patch: BoardPatch = serde_json::from_value(json!({ "description": "" })).unwrap();
        patch.apply(&mut board);
        assert_eq!(board.description, None);
    }

    #[test]
    fn test_status_patch_serializes_single_field() {
        let value = serde_json::to_value(TaskPatch::status(TaskStatus::Completed)).unwrap();
        assert_eq!(value, json!({ "status": "completed" }));
    }

    #[test]
    fn test_board_patch_apply() {
        let mut board = InsertBoard {
            name: "Ops".into(),
            description: Some("infra".into()),
            color: "#112233".into(),
            status: "active".into(),
            created_by: 1,
        }
        .into_board(5);

        BoardPatch {
            name: Some("Operations".into()),
            description: Some(None),
            ..BoardPatch::default()
        }
        .apply(&mut board);

        assert_eq!(board.id, 5);
        assert_eq!(board.name, "Operations");
        assert_eq!(board.description, None);
        assert_eq!(board.color, "#112233");
    }
}
