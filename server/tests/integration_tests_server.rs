use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use common::{Board, BoardWithTasks, Task, TaskWithAssignee, TimeEntry, User};
use http_body_util::BodyExt; // For `collect`
use serde_json::{json, Value};
use server::memory::MemStorage;
use server::routes::create_router;
use std::sync::Arc;
use tower::ServiceExt; // For `oneshot`

/// Router over a fresh, empty in-memory store.
fn empty_app() -> Router {
    create_router(Arc::new(MemStorage::new()))
}

/// Router over the demo workspace (five users, four boards, five tasks on board 1).
fn seeded_app() -> Router {
    create_router(Arc::new(MemStorage::seeded()))
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

#[tokio::test]
async fn test_create_and_list_boards() {
    let app = seeded_app();

    // Act: Create a new board via POST request
    let (status, body) = send(
        &app,
        "POST",
        "/api/boards",
        Some(json!({ "name": "Ops", "createdBy": 1 })),
    )
    .await;

    // Assert: Created with the default color and status
    assert_eq!(status, StatusCode::CREATED);
    let created: Board = serde_json::from_value(body).unwrap();
    assert_eq!(created.name, "Ops");
    assert_eq!(created.color, "#0073EA");
    assert_eq!(created.status, "active");
    assert_eq!(created.id, 5);

    // Act: List boards via GET request
    let (status, body) = send(&app, "GET", "/api/boards", None).await;
    assert_eq!(status, StatusCode::OK);
    let boards: Vec<Board> = serde_json::from_value(body).unwrap();
    assert_eq!(boards.len(), 5);
    assert!(boards.iter().any(|b| b.id == created.id && b.name == "Ops"));
}

#[tokio::test]
async fn test_get_board_includes_tasks() {
    let app = seeded_app();

    let (status, body) = send(&app, "GET", "/api/boards/1", None).await;
    assert_eq!(status, StatusCode::OK);
    let board: BoardWithTasks = serde_json::from_value(body).unwrap();
    assert_eq!(board.board.name, "Marketing Campaign");
    let positions: Vec<i32> = board.tasks.iter().map(|t| t.position).collect();
    assert_eq!(positions, vec![0, 1, 2, 3, 4]);
    assert_eq!(
        board.tasks[0].assignee.as_ref().map(|u| u.name.as_str()),
        Some("Sarah Wilson")
    );

    let (status, body) = send(&app, "GET", "/api/boards/42", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Board not found");
}

#[tokio::test]
async fn test_get_task_with_assignee() {
    let app = seeded_app();

    let (status, body) = send(&app, "GET", "/api/tasks/1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Launch social media campaign");
    assert_eq!(body["assignee"]["name"], "Sarah Wilson");
    assert!(body["assignee"].get("password").is_none());

    let (status, body) = send(&app, "GET", "/api/tasks/999", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({ "message": "Task not found" }));

    // `positions` is its own route and only accepts PATCH.
    let (status, _) = send(&app, "GET", "/api/tasks/positions", None).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn test_update_and_delete_board() {
    let app = seeded_app();

    let (status, body) = send(
        &app,
        "PATCH",
        "/api/boards/2",
        Some(json!({ "description": null, "color": "#111111" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let board: Board = serde_json::from_value(body).unwrap();
    assert_eq!(board.name, "Product Development");
    assert_eq!(board.description, None);
    assert_eq!(board.color, "#111111");

    let (status, body) = send(&app, "DELETE", "/api/boards/2", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Board deleted successfully");

    // Deleting the same board again reports it missing.
    let (status, _) = send(&app, "DELETE", "/api/boards/2", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_create_task_appears_in_board_listing() {
    let app = empty_app();
    let (status, _) = send(
        &app,
        "POST",
        "/api/boards",
        Some(json!({ "name": "Ops", "createdBy": 1 })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    // Act: No `boardId`, so the task lands on board 1
    let (status, body) = send(&app, "POST", "/api/tasks", Some(json!({ "name": "X" }))).await;

    // Assert: Defaults are filled in
    assert_eq!(status, StatusCode::CREATED);
    let created: Task = serde_json::from_value(body).unwrap();
    assert_eq!(created.board_id, 1);
    assert_eq!(created.status.as_str(), "not-started");
    assert_eq!(created.priority.as_str(), "medium");
    assert!(!created.completed);

    let (status, body) = send(&app, "GET", "/api/boards/1/tasks", None).await;
    assert_eq!(status, StatusCode::OK);
    let tasks: Vec<TaskWithAssignee> = serde_json::from_value(body.clone()).unwrap();
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].id, created.id);
    assert!(tasks[0].assignee.is_none());
    assert!(body[0].get("assignee").is_none());
}

#[tokio::test]
async fn test_create_task_empty_name() {
    let app = seeded_app();
    let payload = json!({ "name": "", "boardId": 1 });

    let (status, body) = send(&app, "POST", "/api/tasks", Some(payload)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Invalid task data");
    assert_eq!(body["errors"][0]["field"], "name");
}

#[tokio::test]
async fn test_malformed_bodies_are_rejected() {
    let app = seeded_app();

    // Unknown status value.
    let (status, body) = send(
        &app,
        "POST",
        "/api/tasks",
        Some(json!({ "name": "Bad", "status": "blocked" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Invalid request body");

    // Missing required field.
    let (status, _) = send(&app, "POST", "/api/boards", Some(json!({ "name": "No owner" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Non-numeric path id.
    let (status, _) = send(&app, "GET", "/api/boards/abc", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_update_task_status_and_missing_task() {
    let app = seeded_app();

    let (status, body) = send(
        &app,
        "PATCH",
        "/api/tasks/1",
        Some(json!({ "status": "in-progress", "dueDate": null })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let task: Task = serde_json::from_value(body).unwrap();
    assert_eq!(task.status.as_str(), "in-progress");
    assert_eq!(task.due_date, None);
    assert_eq!(task.name, "Launch social media campaign");

    let (status, body) = send(
        &app,
        "PATCH",
        "/api/tasks/999",
        Some(json!({ "status": "completed" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Task not found");
}

#[tokio::test]
async fn test_delete_task() {
    let app = seeded_app();

    let (status, body) = send(&app, "DELETE", "/api/tasks/3", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Task deleted successfully");

    let (status, body) = send(&app, "GET", "/api/tasks", None).await;
    assert_eq!(status, StatusCode::OK);
    let tasks: Vec<TaskWithAssignee> = serde_json::from_value(body).unwrap();
    assert_eq!(tasks.len(), 4);
    assert!(tasks.iter().all(|t| t.id != 3));

    let (status, _) = send(&app, "DELETE", "/api/tasks/3", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_update_task_positions() {
    let app = seeded_app();

    let (status, body) = send(
        &app,
        "PATCH",
        "/api/tasks/positions",
        Some(json!({ "taskIds": [5, 4, 3, 2, 1] })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Task positions updated");

    let (_, body) = send(&app, "GET", "/api/boards/1/tasks", None).await;
    let tasks: Vec<TaskWithAssignee> = serde_json::from_value(body).unwrap();
    let ids: Vec<i32> = tasks.iter().map(|t| t.id).collect();
    assert_eq!(ids, vec![5, 4, 3, 2, 1]);

    let (status, body) = send(
        &app,
        "PATCH",
        "/api/tasks/positions",
        Some(json!({ "taskIds": 7 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "taskIds must be an array");
}

#[tokio::test]
async fn test_aggregate_task_listings() {
    let app = seeded_app();
    let (status, _) = send(
        &app,
        "POST",
        "/api/tasks",
        Some(json!({ "name": "Roadmap review", "boardId": 2, "assigneeId": 3 })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (_, body) = send(&app, "GET", "/api/tasks", None).await;
    let all: Vec<TaskWithAssignee> = serde_json::from_value(body).unwrap();
    assert_eq!(all.len(), 6);
    assert_eq!(all.last().map(|t| t.board_id), Some(2));

    let (status, body) = send(&app, "GET", "/api/users/3/tasks", None).await;
    assert_eq!(status, StatusCode::OK);
    let mine: Vec<TaskWithAssignee> = serde_json::from_value(body).unwrap();
    let names: Vec<&str> = mine.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, vec!["Write copy for landing page", "Roadmap review"]);
    assert!(mine.iter().all(|t| t.assignee_id == Some(3)));
}

#[tokio::test]
async fn test_time_entries() {
    let app = seeded_app();

    let (status, body) = send(
        &app,
        "POST",
        "/api/time-entries",
        Some(json!({ "taskId": 2, "userId": 2, "minutes": 90, "date": "2024-12-09" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let entry: TimeEntry = serde_json::from_value(body).unwrap();
    assert_eq!(entry.minutes, 90);

    let (_, body) = send(&app, "GET", "/api/tasks/2/time-entries", None).await;
    let entries: Vec<TimeEntry> = serde_json::from_value(body).unwrap();
    assert_eq!(entries, vec![entry]);

    // Unknown task.
    let (status, _) = send(
        &app,
        "POST",
        "/api/time-entries",
        Some(json!({ "taskId": 99, "userId": 2, "minutes": 10, "date": "2024-12-09" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_users() {
    let app = seeded_app();

    let (_, body) = send(&app, "GET", "/api/users", None).await;
    let users: Vec<User> = serde_json::from_value(body.clone()).unwrap();
    assert_eq!(users.len(), 5);
    assert!(body[0].get("password").is_none());

    let payload = json!({
        "username": "new.person",
        "password": "secret",
        "name": "New Person",
        "email": "new@company.com"
    });
    let (status, body) = send(&app, "POST", "/api/users", Some(payload.clone())).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["id"], 6);

    let (status, _) = send(&app, "POST", "/api/users", Some(payload)).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = send(&app, "GET", "/api/users/6", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["username"], "new.person");
}
