// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use crate::storage::{SharedStorage, Storage};
use axum::{
    extract::{FromRequest, FromRequestParts, Json, Path, Request, State},
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Response},
};
use common::{
    Board, BoardPatch, BoardWithTasks, FieldError, InsertBoard, InsertTask, InsertTimeEntry,
    InsertUser, Task, TaskPatch, TaskWithAssignee, TimeEntry, User, Validate,
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, error, info, warn};

/// Handler for listing every board.
pub async fn list_boards(
    State(storage): State<SharedStorage>, // State injection (storage handle)
) -> Result<Json<Vec<Board>>, AppError> {
    let boards = storage.get_all_boards().await?;
    info!("Successfully retrieved {} boards.", boards.len());
    Ok(Json(boards))
}

/// Handler for a single board with its tasks.
pub async fn get_board(
    State(storage): State<SharedStorage>,
    EntityId(board_id): EntityId,
) -> Result<Json<BoardWithTasks>, AppError> {
    debug!("Fetching board with ID: {}", board_id);
    storage
        .get_board_with_tasks(board_id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::not_found("Board"))
}

/// Handler for creating a new board.
pub async fn create_board(
    State(storage): State<SharedStorage>,
    ValidJson(payload): ValidJson<InsertBoard>, // Extracting the request body as JSON
) -> Result<(StatusCode, Json<Board>), AppError> {
    debug!("Received request to create board: {}", payload.name);
    payload
        .validate()
        .map_err(|errors| AppError::validation("Invalid board data", errors))?;

    let board = storage.create_board(payload).await?;
    info!("Board created successfully with ID: {}", board.id);

    // Return a 201 Created status with the new board as JSON.
    Ok((StatusCode::CREATED, Json(board)))
}

/// Handler for a partial board update.
pub async fn update_board(
    State(storage): State<SharedStorage>,
    EntityId(board_id): EntityId,
    ValidJson(patch): ValidJson<BoardPatch>,
) -> Result<Json<Board>, AppError> {
    debug!("Attempting to update board with ID: {}", board_id);
    patch
        .validate()
        .map_err(|errors| AppError::validation("Invalid board data", errors))?;

    match storage.update_board(board_id, patch).await? {
        Some(board) => {
            info!("Board with ID {} updated successfully.", board_id);
            Ok(Json(board))
        }
        None => Err(AppError::not_found("Board")),
    }
}

/// Handler for deleting a board by ID.
pub async fn delete_board(
    State(storage): State<SharedStorage>,
    EntityId(board_id): EntityId, // Extract board ID from the URL path
) -> Result<Json<Value>, AppError> {
    debug!("Attempting to delete board with ID: {}", board_id);

    if storage.delete_board(board_id).await? {
        info!("Board with ID {} deleted successfully.", board_id);
        Ok(message("Board deleted successfully"))
    } else {
        Err(AppError::not_found("Board"))
    }
}

/// Handler for the tasks of one board, by position.
pub async fn list_board_tasks(
    State(storage): State<SharedStorage>,
    EntityId(board_id): EntityId,
) -> Result<Json<Vec<TaskWithAssignee>>, AppError> {
    let tasks = storage.get_tasks_by_board(board_id).await?;
    info!(
        "Successfully retrieved {} tasks for board {}.",
        tasks.len(),
        board_id
    );
    Ok(Json(tasks))
}

/// Reads board after board and concatenates their tasks.
/// The first failing read aborts the whole listing.
async fn tasks_across_boards(
    storage: &dyn Storage,
    keep: impl Fn(&TaskWithAssignee) -> bool,
) -> anyhow::Result<Vec<TaskWithAssignee>> {
    let boards = storage.get_all_boards().await?;
    let mut all = Vec::new();
    for board in boards {
        let tasks = storage.get_tasks_by_board(board.id).await?;
        all.extend(tasks.into_iter().filter(|task| keep(task)));
    }
    Ok(all)
}

/// Handler for every task assigned to a user, across all boards.
pub async fn list_user_tasks(
    State(storage): State<SharedStorage>,
    EntityId(user_id): EntityId,
) -> Result<Json<Vec<TaskWithAssignee>>, AppError> {
    let tasks =
        tasks_across_boards(storage.as_ref(), |task| task.assignee_id == Some(user_id)).await?;
    info!(
        "Successfully retrieved {} tasks assigned to user {}.",
        tasks.len(),
        user_id
    );
    Ok(Json(tasks))
}

/// Handler for every task of every board.
pub async fn list_tasks(
    State(storage): State<SharedStorage>,
) -> Result<Json<Vec<TaskWithAssignee>>, AppError> {
    let tasks = tasks_across_boards(storage.as_ref(), |_| true).await?;
    info!("Successfully retrieved {} tasks.", tasks.len());
    Ok(Json(tasks))
}

/// Handler for a single task with its assignee.
pub async fn get_task(
    State(storage): State<SharedStorage>,
    EntityId(task_id): EntityId,
) -> Result<Json<TaskWithAssignee>, AppError> {
    storage
        .get_task_with_assignee(task_id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::not_found("Task"))
}

/// Handler for creating a new task. A missing `boardId` means board 1.
pub async fn create_task(
    State(storage): State<SharedStorage>,
    ValidJson(payload): ValidJson<InsertTask>,
) -> Result<(StatusCode, Json<Task>), AppError> {
    debug!(
        "Received request to create task '{}' on board {}",
        payload.name, payload.board_id
    );
    if let Err(errors) = payload.validate() {
        warn!("Validation errors: {:?}", errors);
        return Err(AppError::validation("Invalid task data", errors));
    }

    let task = storage.create_task(payload).await?;
    info!("Task created successfully with ID: {}", task.id);
    Ok((StatusCode::CREATED, Json(task)))
}

/// Handler for a partial task update (also used by Kanban drops).
pub async fn update_task(
    State(storage): State<SharedStorage>,
    EntityId(task_id): EntityId,
    ValidJson(patch): ValidJson<TaskPatch>,
) -> Result<Json<Task>, AppError> {
    debug!("Attempting to update task with ID: {}", task_id);
    patch
        .validate()
        .map_err(|errors| AppError::validation("Invalid task data", errors))?;

    match storage.update_task(task_id, patch).await? {
        Some(task) => {
            info!("Task with ID {} updated successfully.", task_id);
            Ok(Json(task))
        }
        None => Err(AppError::not_found("Task")),
    }
}

/// Handler for deleting a task by ID.
pub async fn delete_task(
    State(storage): State<SharedStorage>,
    EntityId(task_id): EntityId,
) -> Result<Json<Value>, AppError> {
    debug!("Attempting to delete task with ID: {}", task_id);

    if storage.delete_task(task_id).await? {
        info!("Task with ID {} deleted successfully.", task_id);
        Ok(message("Task deleted successfully"))
    } else {
        error!("Task with ID {} not found for deletion.", task_id);
        Err(AppError::not_found("Task"))
    }
}

/// Handler for reordering tasks: `{ "taskIds": [3, 1, 2] }`.
pub async fn update_task_positions(
    State(storage): State<SharedStorage>,
    ValidJson(body): ValidJson<Value>,
) -> Result<Json<Value>, AppError> {
    let Some(raw_ids) = body.get("taskIds").and_then(Value::as_array) else {
        return Err(AppError::new(
            StatusCode::BAD_REQUEST,
            "taskIds must be an array",
        ));
    };
    let task_ids = raw_ids
        .iter()
        .map(|id| id.as_i64().and_then(|id| i32::try_from(id).ok()))
        .collect::<Option<Vec<i32>>>()
        .ok_or_else(|| {
            AppError::new(StatusCode::BAD_REQUEST, "taskIds must contain task ids")
        })?;

    debug!("Received request to reorder tasks: {:?}", task_ids);
    storage.update_task_positions(&task_ids).await?;
    info!("Task positions updated for {} tasks.", task_ids.len());
    Ok(message("Task positions updated"))
}

/// Handler for the time logged on a task.
pub async fn list_time_entries(
    State(storage): State<SharedStorage>,
    EntityId(task_id): EntityId,
) -> Result<Json<Vec<TimeEntry>>, AppError> {
    let entries = storage.get_time_entries_by_task(task_id).await?;
    info!(
        "Successfully retrieved {} time entries for task {}.",
        entries.len(),
        task_id
    );
    Ok(Json(entries))
}

/// Handler for logging time against an existing task.
pub async fn create_time_entry(
    State(storage): State<SharedStorage>,
    ValidJson(payload): ValidJson<InsertTimeEntry>,
) -> Result<(StatusCode, Json<TimeEntry>), AppError> {
    debug!(
        "Received request to log {} minutes on task {}",
        payload.minutes, payload.task_id
    );
    payload
        .validate()
        .map_err(|errors| AppError::validation("Invalid time entry data", errors))?;
    if storage.get_task(payload.task_id).await?.is_none() {
        return Err(AppError::not_found("Task"));
    }

    let entry = storage.create_time_entry(payload).await?;
    info!("Time entry created successfully with ID: {}", entry.id);
    Ok((StatusCode::CREATED, Json(entry)))
}

/// Handler for listing every user.
pub async fn list_users(
    State(storage): State<SharedStorage>,
) -> Result<Json<Vec<User>>, AppError> {
    let users = storage.get_all_users().await?;
    info!("Successfully retrieved {} users.", users.len());
    Ok(Json(users))
}

pub async fn get_user(
    State(storage): State<SharedStorage>,
    EntityId(user_id): EntityId,
) -> Result<Json<User>, AppError> {
    storage
        .get_user(user_id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::not_found("User"))
}

/// Handler for registering a user. Usernames are unique.
pub async fn create_user(
    State(storage): State<SharedStorage>,
    ValidJson(payload): ValidJson<InsertUser>,
) -> Result<(StatusCode, Json<User>), AppError> {
    debug!("Received request to create user: {}", payload.username);
    payload
        .validate()
        .map_err(|errors| AppError::validation("Invalid user data", errors))?;
    if storage
        .get_user_by_username(&payload.username)
        .await?
        .is_some()
    {
        return Err(AppError::new(
            StatusCode::CONFLICT,
            &format!("Username '{}' is already taken", payload.username),
        ));
    }

    let user = storage.create_user(payload).await?;
    info!("User created successfully with ID: {}", user.id);
    Ok((StatusCode::CREATED, Json(user)))
}

fn message(text: &str) -> Json<Value> {
    Json(serde_json::json!({ "message": text }))
}

// --- Request extraction ---

/// Integer id taken from the `{id}` path segment. Anything else is a 400.
pub struct EntityId(pub i32);

impl<S> FromRequestParts<S> for EntityId
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(id) = Path::<i32>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| {
                AppError::new(
                    StatusCode::BAD_REQUEST,
                    &format!("Invalid id: {}", rejection.body_text()),
                )
            })?;
        Ok(EntityId(id))
    }
}

/// JSON body whose parse failures are reported as 400 in the API's error format.
pub struct ValidJson<T>(pub T);

impl<S, T> FromRequest<S> for ValidJson<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(ValidJson(value)),
            Err(rejection) => {
                warn!("Rejected request body: {}", rejection.body_text());
                Err(AppError::validation(
                    "Invalid request body",
                    vec![FieldError::new("body", rejection.body_text())],
                ))
            }
        }
    }
}

// --- Custom Error Handling ---

/// Our custom error type for the application.
#[derive(Debug)]
pub struct AppError {
    code: StatusCode,
    message: String,
    errors: Vec<FieldError>,
}

impl AppError {
    fn new(code: StatusCode, message: &str) -> Self {
        Self {
            code,
            message: message.to_string(),
            errors: Vec::new(),
        }
    }

    fn not_found(entity: &str) -> Self {
        Self::new(StatusCode::NOT_FOUND, &format!("{} not found", entity))
    }

    fn validation(message: &str, errors: Vec<FieldError>) -> Self {
        Self {
            code: StatusCode::BAD_REQUEST,
            message: message.to_string(),
            errors,
        }
    }
}

/// Allows converting an `anyhow::Error` (coming from a storage backend)
/// into our `AppError`.
impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        // Log the internal error for debugging.
        tracing::error!("Internal server error: {:?}", err);
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "An internal error occurred.",
        )
    }
}

/// Allows Axum to convert our `AppError` into an HTTP `Response`.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        tracing::debug!(
            "Responding with error: status_code={}, message={}",
            self.code.as_u16(),
            self.message
        );
        let body = if self.errors.is_empty() {
            serde_json::json!({ "message": self.message })
        } else {
            serde_json::json!({ "message": self.message, "errors": self.errors })
        };
        (self.code, Json(body)).into_response()
    }
}
