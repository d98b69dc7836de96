// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use std::collections::HashMap;
use std::fmt;

use parking_lot::RwLock;
use serde_json::Value;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum KeyPart {
    Text(String),
    Id(i32),
}

impl fmt::Display for KeyPart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyPart::Text(text) => f.write_str(text),
            KeyPart::Id(id) => write!(f, "{}", id),
        }
    }
}

/// Cache key of a read query: the segments of its resource path.
///
/// `["/api/boards", 1, "tasks"]` is the key of `GET /api/boards/1/tasks`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryKey(Vec<KeyPart>);

impl QueryKey {
    pub fn new(root: &str) -> Self {
        QueryKey(vec![KeyPart::Text(root.to_string())])
    }

    pub fn id(mut self, id: i32) -> Self {
        self.0.push(KeyPart::Id(id));
        self
    }

    pub fn segment(mut self, segment: &str) -> Self {
        self.0.push(KeyPart::Text(segment.to_string()));
        self
    }

    pub fn boards() -> Self {
        Self::new("/api/boards")
    }

    pub fn board(id: i32) -> Self {
        Self::boards().id(id)
    }

    pub fn board_tasks(id: i32) -> Self {
        Self::board(id).segment("tasks")
    }

    pub fn tasks() -> Self {
        Self::new("/api/tasks")
    }

    pub fn task(id: i32) -> Self {
        Self::tasks().id(id)
    }

    pub fn time_entries(task_id: i32) -> Self {
        Self::task(task_id).segment("time-entries")
    }

    pub fn users() -> Self {
        Self::new("/api/users")
    }

    pub fn user(id: i32) -> Self {
        Self::users().id(id)
    }

    pub fn user_tasks(id: i32) -> Self {
        Self::user(id).segment("tasks")
    }

    /// Request path of the query, segments joined with `/`.
    pub fn path(&self) -> String {
        self.to_string()
    }

    pub fn starts_with(&self, prefix: &QueryKey) -> bool {
        self.0.starts_with(&prefix.0)
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, part) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("/")?;
            }
            write!(f, "{}", part)?;
        }
        Ok(())
    }
}

/// A write against the API, described by what it touches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mutation {
    CreateBoard,
    UpdateBoard { id: i32 },
    DeleteBoard,
    CreateTask { board_id: i32 },
    /// `board_id` is `None` when the caller does not know the task's board.
    UpdateTask { board_id: Option<i32> },
    DeleteTask { board_id: i32 },
    UpdatePositions { board_id: i32 },
    LogTime { task_id: i32 },
}

impl Mutation {
    /// Queries made stale by a successful round trip.
    pub fn invalidates(&self) -> Vec<QueryKey> {
        match *self {
            Mutation::CreateBoard | Mutation::DeleteBoard => vec![QueryKey::boards()],
            Mutation::UpdateBoard { id } => vec![QueryKey::boards(), QueryKey::board(id)],
            Mutation::CreateTask { board_id } | Mutation::DeleteTask { board_id } => vec![
                QueryKey::board(board_id),
                QueryKey::board_tasks(board_id),
                QueryKey::tasks(),
            ],
            Mutation::UpdateTask {
                board_id: Some(board_id),
            } => vec![
                QueryKey::board(board_id),
                QueryKey::board_tasks(board_id),
                QueryKey::boards(),
                QueryKey::tasks(),
                QueryKey::users(),
            ],
            Mutation::UpdateTask { board_id: None } => {
                vec![QueryKey::boards(), QueryKey::tasks(), QueryKey::users()]
            }
            Mutation::UpdatePositions { board_id } => {
                vec![QueryKey::board(board_id), QueryKey::board_tasks(board_id)]
            }
            Mutation::LogTime { task_id } => vec![QueryKey::time_entries(task_id)],
        }
    }
}

#[derive(Debug, Default)]
struct CacheState {
    entries: HashMap<QueryKey, Value>,
    /// Bumped by every invalidation.
    generation: u64,
}

/// Responses of read queries, keyed by [`QueryKey`].
#[derive(Debug, Default)]
pub struct QueryCache {
    state: RwLock<CacheState>,
}

impl QueryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &QueryKey) -> Option<Value> {
        self.state.read().entries.get(key).cloned()
    }

    pub fn insert(&self, key: QueryKey, value: Value) {
        self.state.write().entries.insert(key, value);
    }

    /// Invalidation count observed before a fetch starts.
    pub fn generation(&self) -> u64 {
        self.state.read().generation
    }

    /// Stores a fetched response unless an invalidation ran since `generation`
    /// was read. A response that raced a mutation may predate it.
    pub fn insert_if_current(&self, key: QueryKey, value: Value, generation: u64) -> bool {
        let mut state = self.state.write();
        if state.generation != generation {
            debug!("Discarding response for {} fetched before an invalidation", key);
            return false;
        }
        state.entries.insert(key, value);
        true
    }

    pub fn contains(&self, key: &QueryKey) -> bool {
        self.state.read().entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.state.read().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.read().entries.is_empty()
    }

    /// Drops every entry whose key starts with `prefix`. Returns how many went.
    pub fn invalidate(&self, prefix: &QueryKey) -> usize {
        let mut state = self.state.write();
        state.generation += 1;
        let before = state.entries.len();
        state.entries.retain(|key, _| !key.starts_with(prefix));
        let dropped = before - state.entries.len();
        debug!("Invalidated {} cached queries under {}", dropped, prefix);
        dropped
    }

    pub fn apply(&self, mutation: &Mutation) {
        for key in mutation.invalidates() {
            self.invalidate(&key);
        }
    }
}
