// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use common::{
    Board, BoardPatch, BoardWithTasks, InsertBoard, InsertTask, InsertTimeEntry, InsertUser, Task,
    TaskPatch, TaskWithAssignee, TimeEntry, User,
};

/// Handle injected into every request handler.
pub type SharedStorage = Arc<dyn Storage>;

/// CRUD contract shared by the in-memory and database backends.
///
/// Lookups, updates and deletes report a missing id as `None` / `false`;
/// `Err` is reserved for backend failures.
#[async_trait]
pub trait Storage: Send + Sync + 'static {
    /// Short backend name used in logs.
    fn backend_tag(&self) -> &'static str;

    async fn get_user(&self, id: i32) -> Result<Option<User>>;
    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>>;
    /// Fails if the username is already taken.
    async fn create_user(&self, user: InsertUser) -> Result<User>;
    async fn get_all_users(&self) -> Result<Vec<User>>;

    async fn get_board(&self, id: i32) -> Result<Option<Board>>;
    async fn get_all_boards(&self) -> Result<Vec<Board>>;
    async fn create_board(&self, board: InsertBoard) -> Result<Board>;
    async fn update_board(&self, id: i32, patch: BoardPatch) -> Result<Option<Board>>;
    async fn delete_board(&self, id: i32) -> Result<bool>;

    async fn get_task(&self, id: i32) -> Result<Option<Task>>;
    /// Tasks of a board joined with their assignee, by ascending position.
    async fn get_tasks_by_board(&self, board_id: i32) -> Result<Vec<TaskWithAssignee>>;
    async fn create_task(&self, task: InsertTask) -> Result<Task>;
    async fn update_task(&self, id: i32, patch: TaskPatch) -> Result<Option<Task>>;
    async fn delete_task(&self, id: i32) -> Result<bool>;
    /// Sets each listed task's position to its index in `task_ids`.
    /// Ids that match no task are skipped.
    async fn update_task_positions(&self, task_ids: &[i32]) -> Result<()>;

    async fn create_time_entry(&self, entry: InsertTimeEntry) -> Result<TimeEntry>;
    async fn get_time_entries_by_task(&self, task_id: i32) -> Result<Vec<TimeEntry>>;

    async fn get_board_with_tasks(&self, id: i32) -> Result<Option<BoardWithTasks>> {
        let Some(board) = self.get_board(id).await? else {
            return Ok(None);
        };
        let tasks = self.get_tasks_by_board(id).await?;
        Ok(Some(BoardWithTasks { board, tasks }))
    }

    async fn get_task_with_assignee(&self, id: i32) -> Result<Option<TaskWithAssignee>> {
        let Some(task) = self.get_task(id).await? else {
            return Ok(None);
        };
        let assignee = match task.assignee_id {
            Some(user_id) => self.get_user(user_id).await?,
            None => None,
        };
        Ok(Some(TaskWithAssignee { task, assignee }))
    }
}

/// Orders tasks the way every backend returns them: position, then id.
pub fn sort_by_position(tasks: &mut [TaskWithAssignee]) {
    tasks.sort_by_key(|t| (t.position, t.id));
}
