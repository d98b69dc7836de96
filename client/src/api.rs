// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use std::time::Duration;

use common::views::hours_to_minutes;
use common::{
    Board, BoardPatch, BoardWithTasks, InsertBoard, InsertTask, InsertTimeEntry, Task, TaskPatch,
    TaskPositions, TaskWithAssignee, TimeEntry, User,
};
use reqwest::{Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::cache::{Mutation, QueryCache, QueryKey};
use crate::error::ClientError;

/// Typed access to the API. Reads go through the query cache; writes
/// invalidate the queries they make stale once the server accepts them.
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    cache: QueryCache,
}

impl ApiClient {
    /// `base_url` is the server origin, e.g. `http://127.0.0.1:5000`.
    pub fn new(base_url: impl Into<String>) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            cache: QueryCache::new(),
        })
    }

    pub fn cache(&self) -> &QueryCache {
        &self.cache
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.http.request(method, format!("{}{}", self.base_url, path))
    }

    /// Sends the request and returns the JSON body of a successful response.
    async fn send(&self, request: RequestBuilder) -> Result<Value, ClientError> {
        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<Value>(&body)
                .ok()
                .and_then(|v| v.get("message").and_then(Value::as_str).map(str::to_string))
                .unwrap_or_else(|| {
                    status.canonical_reason().unwrap_or("Request failed").to_string()
                });
            return Err(ClientError::Api {
                status: status.as_u16(),
                message,
            });
        }
        Ok(serde_json::from_str(&body)?)
    }

    async fn query<T: DeserializeOwned>(&self, key: QueryKey) -> Result<T, ClientError> {
        if let Some(cached) = self.cache.get(&key) {
            debug!("Cache hit for {}", key);
            return Ok(serde_json::from_value(cached)?);
        }

        debug!("Fetching {}", key);
        let generation = self.cache.generation();
        let value = self.send(self.request(Method::GET, &key.path())).await?;
        let decoded = serde_json::from_value(value.clone())?;
        self.cache.insert_if_current(key, value, generation);
        Ok(decoded)
    }

    async fn mutate<T: DeserializeOwned>(
        &self,
        mutation: Mutation,
        request: RequestBuilder,
    ) -> Result<T, ClientError> {
        match self.send(request).await {
            Ok(value) => {
                self.cache.apply(&mutation);
                Ok(serde_json::from_value(value)?)
            }
            Err(err) => {
                warn!("{:?} failed: {}", mutation, err);
                Err(err)
            }
        }
    }

    fn with_json<B: Serialize>(&self, method: Method, path: &str, body: &B) -> RequestBuilder {
        self.request(method, path).json(body)
    }

    // --- Queries ---

    pub async fn boards(&self) -> Result<Vec<Board>, ClientError> {
        self.query(QueryKey::boards()).await
    }

    pub async fn board(&self, id: i32) -> Result<BoardWithTasks, ClientError> {
        self.query(QueryKey::board(id)).await
    }

    pub async fn board_tasks(&self, board_id: i32) -> Result<Vec<TaskWithAssignee>, ClientError> {
        self.query(QueryKey::board_tasks(board_id)).await
    }

    pub async fn tasks(&self) -> Result<Vec<TaskWithAssignee>, ClientError> {
        self.query(QueryKey::tasks()).await
    }

    pub async fn task(&self, id: i32) -> Result<TaskWithAssignee, ClientError> {
        self.query(QueryKey::task(id)).await
    }

    pub async fn time_entries(&self, task_id: i32) -> Result<Vec<TimeEntry>, ClientError> {
        self.query(QueryKey::time_entries(task_id)).await
    }

    pub async fn users(&self) -> Result<Vec<User>, ClientError> {
        self.query(QueryKey::users()).await
    }

    pub async fn user(&self, id: i32) -> Result<User, ClientError> {
        self.query(QueryKey::user(id)).await
    }

    pub async fn user_tasks(&self, user_id: i32) -> Result<Vec<TaskWithAssignee>, ClientError> {
        self.query(QueryKey::user_tasks(user_id)).await
    }

    // --- Mutations ---

    pub async fn create_board(&self, board: &InsertBoard) -> Result<Board, ClientError> {
        let request = self.with_json(Method::POST, "/api/boards", board);
        self.mutate(Mutation::CreateBoard, request).await
    }

    pub async fn update_board(&self, id: i32, patch: &BoardPatch) -> Result<Board, ClientError> {
        let request = self.with_json(Method::PATCH, &QueryKey::board(id).path(), patch);
        self.mutate(Mutation::UpdateBoard { id }, request).await
    }

    pub async fn delete_board(&self, id: i32) -> Result<(), ClientError> {
        let request = self.request(Method::DELETE, &QueryKey::board(id).path());
        let _: Value = self.mutate(Mutation::DeleteBoard, request).await?;
        Ok(())
    }

    pub async fn create_task(&self, task: &InsertTask) -> Result<Task, ClientError> {
        let request = self.with_json(Method::POST, "/api/tasks", task);
        let mutation = Mutation::CreateTask {
            board_id: task.board_id,
        };
        self.mutate(mutation, request).await
    }

    /// Pass the task's board when known; otherwise every board query is dropped.
    pub async fn update_task(
        &self,
        id: i32,
        board_id: Option<i32>,
        patch: &TaskPatch,
    ) -> Result<Task, ClientError> {
        let request = self.with_json(Method::PATCH, &QueryKey::task(id).path(), patch);
        self.mutate(Mutation::UpdateTask { board_id }, request).await
    }

    pub async fn delete_task(&self, id: i32, board_id: i32) -> Result<(), ClientError> {
        let request = self.request(Method::DELETE, &QueryKey::task(id).path());
        let _: Value = self.mutate(Mutation::DeleteTask { board_id }, request).await?;
        Ok(())
    }

    /// Stores the given order of a board's tasks.
    pub async fn update_task_positions(
        &self,
        board_id: i32,
        task_ids: &[i32],
    ) -> Result<(), ClientError> {
        let body = TaskPositions {
            task_ids: task_ids.to_vec(),
        };
        let request = self.with_json(Method::PATCH, "/api/tasks/positions", &body);
        let _: Value = self
            .mutate(Mutation::UpdatePositions { board_id }, request)
            .await?;
        Ok(())
    }

    /// Logs `hours` of work on a task, stored as whole minutes.
    pub async fn log_time(
        &self,
        task_id: i32,
        user_id: i32,
        hours: f64,
        date: &str,
        description: Option<String>,
    ) -> Result<TimeEntry, ClientError> {
        let entry = InsertTimeEntry {
            task_id,
            user_id,
            description,
            minutes: hours_to_minutes(hours),
            date: date.to_string(),
        };
        let request = self.with_json(Method::POST, "/api/time-entries", &entry);
        self.mutate(Mutation::LogTime { task_id }, request).await
    }
}
