// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use std::collections::BTreeMap;

use anyhow::{bail, Result};
use async_trait::async_trait;
use chrono::{SubsecRound, Utc};
use common::{
    Board, BoardPatch, InsertBoard, InsertTask, InsertTimeEntry, InsertUser, Task, TaskPatch,
    TaskPriority, TaskStatus, TaskWithAssignee, TimeEntry, User,
};
use parking_lot::RwLock;
use tracing::debug;

use crate::storage::{sort_by_position, Storage};

/// Maps plus their id counters. Ordered maps keep listings in id order.
struct MemState {
    users: BTreeMap<i32, User>,
    boards: BTreeMap<i32, Board>,
    tasks: BTreeMap<i32, Task>,
    time_entries: BTreeMap<i32, TimeEntry>,
    next_user_id: i32,
    next_board_id: i32,
    next_task_id: i32,
    next_time_entry_id: i32,
}

impl Default for MemState {
    fn default() -> Self {
        Self {
            users: BTreeMap::new(),
            boards: BTreeMap::new(),
            tasks: BTreeMap::new(),
            time_entries: BTreeMap::new(),
            next_user_id: 1,
            next_board_id: 1,
            next_task_id: 1,
            next_time_entry_id: 1,
        }
    }
}

impl MemState {
    fn insert_user(&mut self, user: InsertUser) -> Result<User> {
        if self.users.values().any(|u| u.username == user.username) {
            bail!("username '{}' is already taken", user.username);
        }
        Ok(self.push_user(user))
    }

    /// Stores the user without the username check.
    fn push_user(&mut self, user: InsertUser) -> User {
        let id = self.next_user_id;
        self.next_user_id += 1;
        let user = user.into_user(id);
        self.users.insert(id, user.clone());
        user
    }

    fn insert_board(&mut self, board: InsertBoard) -> Board {
        let id = self.next_board_id;
        self.next_board_id += 1;
        let board = board.into_board(id);
        self.boards.insert(id, board.clone());
        board
    }

    fn insert_task(&mut self, task: InsertTask) -> Task {
        let id = self.next_task_id;
        self.next_task_id += 1;
        let task = task.into_task(id);
        self.tasks.insert(id, task.clone());
        task
    }

    fn with_assignee(&self, task: &Task) -> TaskWithAssignee {
        TaskWithAssignee {
            task: task.clone(),
            assignee: task.assignee_id.and_then(|id| self.users.get(&id).cloned()),
        }
    }
}

/// Process-lifetime storage used for development and tests.
///
/// All maps sit behind one lock that is never held across an `.await`.
#[derive(Default)]
pub struct MemStorage {
    state: RwLock<MemState>,
}

impl MemStorage {
    /// Empty storage; the first id of every entity is 1.
    pub fn new() -> Self {
        Self::default()
    }

    /// Storage pre-filled with the demo workspace: five users, four boards
    /// and five tasks on the first board.
    pub fn seeded() -> Self {
        let storage = Self::new();
        {
            let mut state = storage.state.write();
            seed(&mut state);
        }
        storage
    }
}

fn seed(state: &mut MemState) {
    let users = [
        ("sarah.wilson", "Sarah Wilson", "sarah@company.com"),
        ("mike.chen", "Mike Chen", "mike@company.com"),
        ("emma.davis", "Emma Davis", "emma@company.com"),
        ("john.doe", "John Doe", "john@company.com"),
        ("lisa.johnson", "Lisa Johnson", "lisa@company.com"),
    ];
    for (username, name, email) in users {
        state.push_user(InsertUser {
            username: username.to_string(),
            password: "password".to_string(),
            name: name.to_string(),
            email: email.to_string(),
            avatar: None,
        });
    }

    let boards = [
        ("Marketing Campaign", "Q4 marketing initiatives", "#0073EA", 1),
        ("Product Development", "New feature development", "#00C875", 2),
        ("Design System", "UI/UX design components", "#FF5AC4", 3),
        ("Sales Pipeline", "Lead management and conversion", "#FDAB3D", 4),
    ];
    for (name, description, color, created_by) in boards {
        state.insert_board(InsertBoard {
            name: name.to_string(),
            description: Some(description.to_string()),
            color: color.to_string(),
            status: "active".to_string(),
            created_by,
        });
    }

    let tasks = [
        (
            "Launch social media campaign",
            "Create engaging content for Q4 launch",
            TaskStatus::NotStarted,
            TaskPriority::High,
            1,
            "2024-12-15",
        ),
        (
            "Design banner assets",
            "Create visual assets for campaign",
            TaskStatus::Completed,
            TaskPriority::Medium,
            2,
            "2024-12-10",
        ),
        (
            "Write copy for landing page",
            "Create compelling copy for campaign landing",
            TaskStatus::InProgress,
            TaskPriority::Low,
            3,
            "2024-12-20",
        ),
        (
            "Set up email automation",
            "Configure email sequences for campaign",
            TaskStatus::NotStarted,
            TaskPriority::High,
            4,
            "2024-12-08",
        ),
        (
            "Research target audience",
            "Analyze demographics and preferences",
            TaskStatus::Completed,
            TaskPriority::Medium,
            5,
            "2024-12-05",
        ),
    ];
    for (position, (name, description, status, priority, assignee, due)) in
        tasks.into_iter().enumerate()
    {
        let mut task = InsertTask::named(1, name);
        task.description = Some(description.to_string());
        task.status = status;
        task.priority = priority;
        task.assignee_id = Some(assignee);
        task.due_date = Some(due.to_string());
        task.position = Some(position as i32);
        task.completed = status == TaskStatus::Completed;
        state.insert_task(task);
    }
}

#[async_trait]
impl Storage for MemStorage {
    fn backend_tag(&self) -> &'static str {
        "memory"
    }

    async fn get_user(&self, id: i32) -> Result<Option<User>> {
        Ok(self.state.read().users.get(&id).cloned())
    }

    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        Ok(self
            .state
            .read()
            .users
            .values()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn create_user(&self, user: InsertUser) -> Result<User> {
        self.state.write().insert_user(user)
    }

    async fn get_all_users(&self) -> Result<Vec<User>> {
        Ok(self.state.read().users.values().cloned().collect())
    }

    async fn get_board(&self, id: i32) -> Result<Option<Board>> {
        Ok(self.state.read().boards.get(&id).cloned())
    }

    async fn get_all_boards(&self) -> Result<Vec<Board>> {
        Ok(self.state.read().boards.values().cloned().collect())
    }

    async fn create_board(&self, board: InsertBoard) -> Result<Board> {
        Ok(self.state.write().insert_board(board))
    }

    async fn update_board(&self, id: i32, patch: BoardPatch) -> Result<Option<Board>> {
        let mut state = self.state.write();
        Ok(state.boards.get_mut(&id).map(|board| {
            patch.apply(board);
            board.clone()
        }))
    }

    async fn delete_board(&self, id: i32) -> Result<bool> {
        Ok(self.state.write().boards.remove(&id).is_some())
    }

    async fn get_task(&self, id: i32) -> Result<Option<Task>> {
        Ok(self.state.read().tasks.get(&id).cloned())
    }

    async fn get_tasks_by_board(&self, board_id: i32) -> Result<Vec<TaskWithAssignee>> {
        let state = self.state.read();
        let mut tasks: Vec<TaskWithAssignee> = state
            .tasks
            .values()
            .filter(|t| t.board_id == board_id)
            .map(|t| state.with_assignee(t))
            .collect();
        sort_by_position(&mut tasks);
        Ok(tasks)
    }

    async fn create_task(&self, task: InsertTask) -> Result<Task> {
        Ok(self.state.write().insert_task(task))
    }

    async fn update_task(&self, id: i32, patch: TaskPatch) -> Result<Option<Task>> {
        let mut state = self.state.write();
        Ok(state.tasks.get_mut(&id).map(|task| {
            patch.apply(task);
            task.clone()
        }))
    }

    async fn delete_task(&self, id: i32) -> Result<bool> {
        Ok(self.state.write().tasks.remove(&id).is_some())
    }

    async fn update_task_positions(&self, task_ids: &[i32]) -> Result<()> {
        let mut state = self.state.write();
        for (index, task_id) in task_ids.iter().enumerate() {
            match state.tasks.get_mut(task_id) {
                Some(task) => task.position = index as i32,
                None => debug!("Skipping unknown task {} while reordering.", task_id),
            }
        }
        Ok(())
    }

    async fn create_time_entry(&self, entry: InsertTimeEntry) -> Result<TimeEntry> {
        let mut state = self.state.write();
        let id = state.next_time_entry_id;
        state.next_time_entry_id += 1;
        // Second precision, matching the TIMESTAMP column of the database backend.
        let entry = entry.into_entry(id, Utc::now().trunc_subsecs(0));
        state.time_entries.insert(id, entry.clone());
        Ok(entry)
    }

    async fn get_time_entries_by_task(&self, task_id: i32) -> Result<Vec<TimeEntry>> {
        let mut entries: Vec<TimeEntry> = self
            .state
            .read()
            .time_entries
            .values()
            .filter(|e| e.task_id == task_id)
            .cloned()
            .collect();
        entries.sort_by(|a, b| a.date.cmp(&b.date).then(a.id.cmp(&b.id)));
        Ok(entries)
    }
}
