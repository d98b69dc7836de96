use axum::{
    extract::{Json, State},
    http::StatusCode,
    routing::get,
    Router,
};
use client::{ApiClient, ClientError, QueryKey};
use common::views::{columns, drop_on_column, filter_and_sort, SortKey, StatusFilter, TaskForm};
use common::{Board, BoardPatch, InsertBoard, TaskStatus};
use parking_lot::Mutex;
use server::memory::MemStorage;
use server::routes::create_router;
use std::sync::Arc;
use std::time::Duration;

/// Serves the demo workspace on an ephemeral port and returns its origin.
async fn spawn_server() -> String {
    serve(create_router(Arc::new(MemStorage::seeded()))).await
}

/// Serves `app` on an ephemeral port and returns its origin.
async fn serve(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

fn ops_board() -> InsertBoard {
    InsertBoard {
        name: "Ops".to_string(),
        description: None,
        color: "#112233".to_string(),
        status: "active".to_string(),
        created_by: 1,
    }
}

/// Board list whose reads snapshot the data, then answer slowly.
#[derive(Clone, Default)]
struct SlowBoards {
    boards: Arc<Mutex<Vec<Board>>>,
}

async fn slow_list_boards(State(stub): State<SlowBoards>) -> Json<Vec<Board>> {
    let snapshot = stub.boards.lock().clone();
    tokio::time::sleep(Duration::from_millis(300)).await;
    Json(snapshot)
}

async fn quick_create_board(
    State(stub): State<SlowBoards>,
    Json(payload): Json<InsertBoard>,
) -> (StatusCode, Json<Board>) {
    let mut boards = stub.boards.lock();
    let board = payload.into_board(boards.len() as i32 + 1);
    boards.push(board.clone());
    (StatusCode::CREATED, Json(board))
}

#[tokio::test]
async fn test_board_queries_are_cached_until_invalidated() {
    let api = ApiClient::new(spawn_server().await).unwrap();

    let boards = api.boards().await.unwrap();
    assert_eq!(boards.len(), 4);
    api.board(1).await.unwrap();
    assert!(api.cache().contains(&QueryKey::boards()));
    assert!(api.cache().contains(&QueryKey::board(1)));

    let created = api.create_board(&ops_board()).await.unwrap();

    // The board list and everything under it was dropped.
    assert!(!api.cache().contains(&QueryKey::boards()));
    assert!(!api.cache().contains(&QueryKey::board(1)));

    let boards = api.boards().await.unwrap();
    assert_eq!(boards.len(), 5);
    assert!(boards.iter().any(|b| b.id == created.id));
}

#[tokio::test]
async fn test_kanban_drop_updates_board() {
    let api = ApiClient::new(spawn_server().await).unwrap();

    let tasks = api.board_tasks(1).await.unwrap();
    let card = &tasks[0];
    assert_eq!(card.status, TaskStatus::NotStarted);
    let users_before = api.users().await.unwrap();

    let patch = drop_on_column(card, TaskStatus::InProgress).unwrap();
    api.update_task(card.id, Some(card.board_id), &patch)
        .await
        .unwrap();
    assert!(!api.cache().contains(&QueryKey::board_tasks(1)));
    assert!(!api.cache().contains(&QueryKey::users()));

    let tasks = api.board_tasks(1).await.unwrap();
    let in_progress = columns(&tasks)
        .into_iter()
        .find(|c| c.status == TaskStatus::InProgress)
        .unwrap();
    let ids: Vec<i32> = in_progress.tasks.iter().map(|t| t.id).collect();
    assert_eq!(ids, vec![1, 3]);
    assert_eq!(api.users().await.unwrap(), users_before);
}

#[tokio::test]
async fn test_failed_mutation_keeps_cache() {
    let api = ApiClient::new(spawn_server().await).unwrap();
    api.tasks().await.unwrap();

    let err = api
        .update_board(77, &BoardPatch::default())
        .await
        .unwrap_err();
    match err {
        ClientError::Api { status, message } => {
            assert_eq!(status, 404);
            assert_eq!(message, "Board not found");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(api.cache().contains(&QueryKey::tasks()));

    let err = api.delete_task(77, 1).await.unwrap_err();
    assert_eq!(err.status(), Some(404));
}

#[tokio::test]
async fn test_create_task_from_form() {
    let api = ApiClient::new(spawn_server().await).unwrap();
    api.board_tasks(2).await.unwrap();

    let form = TaskForm {
        name: "Roadmap sync".to_string(),
        assignee: "4".to_string(),
        estimated_hours: "6".to_string(),
        ..TaskForm::default()
    };
    let created = api.create_task(&form.to_insert(2).unwrap()).await.unwrap();
    assert_eq!(created.board_id, 2);
    assert_eq!(created.assignee_id, Some(4));
    assert_eq!(created.estimated_hours, 6);

    let tasks = api.board_tasks(2).await.unwrap();
    assert_eq!(tasks.len(), 1);
    assert_eq!(
        tasks[0].assignee.as_ref().map(|u| u.username.as_str()),
        Some("john.doe")
    );

    let mine = api.user_tasks(4).await.unwrap();
    let names: Vec<&str> = mine.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, vec!["Set up email automation", "Roadmap sync"]);
}

#[tokio::test]
async fn test_reorder_and_delete() {
    let api = ApiClient::new(spawn_server().await).unwrap();

    api.update_task_positions(1, &[3, 1, 2]).await.unwrap();
    let tasks = api.board_tasks(1).await.unwrap();
    let order: Vec<(i32, i32)> = tasks.iter().map(|t| (t.id, t.position)).collect();
    // Tasks 4 and 5 keep positions 3 and 4.
    assert_eq!(order, vec![(3, 0), (1, 1), (2, 2), (4, 3), (5, 4)]);

    api.delete_task(2, 1).await.unwrap();
    let remaining = api.tasks().await.unwrap();
    let completed = filter_and_sort(
        &remaining,
        StatusFilter::Only(TaskStatus::Completed),
        SortKey::Name,
    );
    let names: Vec<&str> = completed.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, vec!["Research target audience"]);
}

#[tokio::test]
async fn test_log_time_in_minutes() {
    let api = ApiClient::new(spawn_server().await).unwrap();
    assert!(api.time_entries(2).await.unwrap().is_empty());
    api.time_entries(3).await.unwrap();

    let entry = api
        .log_time(2, 2, 1.25, "2024-12-09", Some("Banner revisions".to_string()))
        .await
        .unwrap();
    assert_eq!(entry.minutes, 75);
    assert!(api.cache().contains(&QueryKey::time_entries(3)));

    let entries = api.time_entries(2).await.unwrap();
    assert_eq!(entries, vec![entry]);
}

#[tokio::test]
async fn test_read_started_before_mutation_is_not_cached() {
    let app = Router::new()
        .route("/api/boards", get(slow_list_boards).post(quick_create_board))
        .with_state(SlowBoards::default());
    let api = Arc::new(ApiClient::new(serve(app).await).unwrap());

    let in_flight = tokio::spawn({
        let api = api.clone();
        async move { api.boards().await }
    });
    // Let the read take its snapshot before the board exists.
    tokio::time::sleep(Duration::from_millis(100)).await;
    let created = api.create_board(&ops_board()).await.unwrap();

    let stale = in_flight.await.unwrap().unwrap();
    assert!(stale.is_empty());
    assert!(!api.cache().contains(&QueryKey::boards()));

    let boards = api.boards().await.unwrap();
    assert_eq!(boards, vec![created]);
    assert!(api.cache().contains(&QueryKey::boards()));
}

#[tokio::test]
async fn test_single_task_query() {
    let api = ApiClient::new(spawn_server().await).unwrap();

    let task = api.task(1).await.unwrap();
    assert_eq!(task.name, "Launch social media campaign");
    assert_eq!(
        task.assignee.as_ref().map(|u| u.name.as_str()),
        Some("Sarah Wilson")
    );
    assert!(api.cache().contains(&QueryKey::task(1)));

    let err = api.task(999).await.unwrap_err();
    assert_eq!(err.status(), Some(404));
    assert!(!api.cache().contains(&QueryKey::task(999)));
}
