// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use crate::handlers;
use crate::storage::SharedStorage;
use axum::{
    routing::{get, patch, post},
    Router,
};

/// Creates and configures the application router.
pub fn create_router(storage: SharedStorage) -> Router {
    Router::new()
        // Boards
        .route(
            "/api/boards",
            get(handlers::list_boards).post(handlers::create_board),
        )
        .route(
            "/api/boards/{id}",
            get(handlers::get_board)
                .patch(handlers::update_board)
                .delete(handlers::delete_board),
        )
        .route("/api/boards/{id}/tasks", get(handlers::list_board_tasks))
        // Tasks. The static `positions` segment takes precedence over `{id}`.
        .route(
            "/api/tasks",
            get(handlers::list_tasks).post(handlers::create_task),
        )
        .route("/api/tasks/positions", patch(handlers::update_task_positions))
        .route(
            "/api/tasks/{id}",
            get(handlers::get_task)
                .patch(handlers::update_task)
                .delete(handlers::delete_task),
        )
        .route("/api/tasks/{id}/time-entries", get(handlers::list_time_entries))
        .route("/api/time-entries", post(handlers::create_time_entry))
        // Users
        .route(
            "/api/users",
            get(handlers::list_users).post(handlers::create_user),
        )
        .route("/api/users/{id}", get(handlers::get_user))
        .route("/api/users/{id}/tasks", get(handlers::list_user_tasks))
        // Adds the storage backend to the application state
        .with_state(storage)
}
