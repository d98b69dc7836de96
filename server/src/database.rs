// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use crate::config::DatabaseConfig;
use crate::storage::Storage;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{SubsecRound, Utc};
use common::{
    Board, BoardPatch, InsertBoard, InsertTask, InsertTimeEntry, InsertUser, Task, TaskPatch,
    TaskWithAssignee, TimeEntry, User,
};
use sqlx::mysql::{MySqlConnectOptions, MySqlPoolOptions, MySqlSslMode};
use sqlx::MySqlPool;
use tracing::{debug, info};

const MAX_CONNECTIONS: u32 = 10;

const USER_COLUMNS: &str = "id, username, password, name, email, avatar";
const BOARD_COLUMNS: &str = "id, name, description, color, status, created_by";
const TASK_COLUMNS: &str = "id, board_id, name, description, status, priority, assignee_id, \
     due_date, start_date, estimated_hours, actual_hours, position, completed";
const TIME_ENTRY_COLUMNS: &str = "id, task_id, user_id, description, minutes, date, created_at";

const SCHEMA: [(&str, &str); 4] = [
    (
        "users",
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id INT AUTO_INCREMENT PRIMARY KEY,
            username VARCHAR(255) NOT NULL UNIQUE,
            password VARCHAR(255) NOT NULL,
            name VARCHAR(255) NOT NULL,
            email VARCHAR(255) NOT NULL,
            avatar VARCHAR(500) NULL
        );
        "#,
    ),
    (
        "boards",
        r#"
        CREATE TABLE IF NOT EXISTS boards (
            id INT AUTO_INCREMENT PRIMARY KEY,
            name VARCHAR(255) NOT NULL,
            description VARCHAR(1000) NULL,
            color VARCHAR(7) NOT NULL DEFAULT '#0073EA',
            status VARCHAR(50) NOT NULL DEFAULT 'active',
            created_by INT NOT NULL
        );
        "#,
    ),
    (
        "tasks",
        r#"
        CREATE TABLE IF NOT EXISTS tasks (
            id INT AUTO_INCREMENT PRIMARY KEY,
            board_id INT NOT NULL,
            name VARCHAR(255) NOT NULL,
            description VARCHAR(1000) NULL,
            status VARCHAR(50) NOT NULL DEFAULT 'not-started',
            priority VARCHAR(50) NOT NULL DEFAULT 'medium',
            assignee_id INT NULL,
            due_date VARCHAR(10) NULL,
            start_date VARCHAR(10) NULL,
            estimated_hours INT NOT NULL DEFAULT 0,
            actual_hours INT NOT NULL DEFAULT 0,
            position INT NOT NULL DEFAULT 0,
            completed BOOLEAN NOT NULL DEFAULT FALSE
        );
        "#,
    ),
    (
        "time_entries",
        r#"
        CREATE TABLE IF NOT EXISTS time_entries (
            id INT AUTO_INCREMENT PRIMARY KEY,
            task_id INT NOT NULL,
            user_id INT NOT NULL,
            description VARCHAR(1000) NULL,
            minutes INT NOT NULL,
            date VARCHAR(10) NOT NULL,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        );
        "#,
    ),
];

/// Establishes the MySQL connection pool described by `config` and makes sure
/// every table exists.
pub async fn establish_connection_pool(config: &DatabaseConfig) -> Result<MySqlPool> {
    let ssl_mode = if config.ssl {
        MySqlSslMode::Required
    } else {
        MySqlSslMode::Disabled
    };
    let mut options = MySqlConnectOptions::new()
        .host(&config.host)
        .port(config.port)
        .username(&config.user)
        .database(&config.name)
        .ssl_mode(ssl_mode);
    if !config.password.is_empty() {
        options = options.password(&config.password);
    }

    info!(
        "Connecting to database {} on {}:{}",
        config.name, config.host, config.port
    );
    let pool = MySqlPoolOptions::new()
        .max_connections(MAX_CONNECTIONS)
        .connect_with(options)
        .await
        .context("Failed to connect to database")?;

    create_schema(&pool).await?;
    Ok(pool)
}

/// Creates the four tables if they are missing.
pub async fn create_schema(pool: &MySqlPool) -> Result<()> {
    for (table, ddl) in SCHEMA {
        sqlx::query(ddl)
            .execute(pool)
            .await
            .with_context(|| format!("Failed to create '{}' table", table))?;
        info!("'{}' table is ready.", table);
    }
    Ok(())
}

fn inserted_id(id: u64) -> Result<i32> {
    i32::try_from(id).context("Inserted id does not fit in an INT column")
}

/// A task row left-joined with the columns of its assignee.
#[derive(sqlx::FromRow)]
struct TaskAssigneeRow {
    #[sqlx(flatten)]
    task: Task,
    user_id: Option<i32>,
    user_username: Option<String>,
    user_password: Option<String>,
    user_name: Option<String>,
    user_email: Option<String>,
    user_avatar: Option<String>,
}

impl TaskAssigneeRow {
    fn into_joined(self) -> TaskWithAssignee {
        let assignee = match (self.user_id, self.user_username, self.user_name, self.user_email) {
            (Some(id), Some(username), Some(name), Some(email)) => Some(User {
                id,
                username,
                password: self.user_password.unwrap_or_default(),
                name,
                email,
                avatar: self.user_avatar,
            }),
            _ => None,
        };
        TaskWithAssignee {
            task: self.task,
            assignee,
        }
    }
}

/// Storage backed by MySQL.
#[derive(Clone)]
pub struct DatabaseStorage {
    pool: MySqlPool,
}

impl DatabaseStorage {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    async fn save_board(&self, board: &Board) -> Result<()> {
        sqlx::query(
            "UPDATE boards SET name = ?, description = ?, color = ?, status = ?, created_by = ? WHERE id = ?",
        )
        .bind(&board.name)
        .bind(&board.description)
        .bind(&board.color)
        .bind(&board.status)
        .bind(board.created_by)
        .bind(board.id)
        .execute(&self.pool)
        .await
        .with_context(|| format!("Failed to update board with ID: {}", board.id))?;
        Ok(())
    }

    async fn save_task(&self, task: &Task) -> Result<()> {
        sqlx::query(
            "UPDATE tasks SET board_id = ?, name = ?, description = ?, status = ?, priority = ?, \
             assignee_id = ?, due_date = ?, start_date = ?, estimated_hours = ?, actual_hours = ?, \
             position = ?, completed = ? WHERE id = ?",
        )
        .bind(task.board_id)
        .bind(&task.name)
        .bind(&task.description)
        .bind(task.status.as_str())
        .bind(task.priority.as_str())
        .bind(task.assignee_id)
        .bind(&task.due_date)
        .bind(&task.start_date)
        .bind(task.estimated_hours)
        .bind(task.actual_hours)
        .bind(task.position)
        .bind(task.completed)
        .bind(task.id)
        .execute(&self.pool)
        .await
        .with_context(|| format!("Failed to update task with ID: {}", task.id))?;
        Ok(())
    }
}

#[async_trait]
impl Storage for DatabaseStorage {
    fn backend_tag(&self) -> &'static str {
        "mysql"
    }

    async fn get_user(&self, id: i32) -> Result<Option<User>> {
        sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .with_context(|| format!("Failed to retrieve user with ID: {}", id))
    }

    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE username = ?"))
            .bind(username)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to retrieve user by username")
    }

    async fn create_user(&self, user: InsertUser) -> Result<User> {
        let mut user = user.into_user(0);
        let id = sqlx::query(
            "INSERT INTO users (username, password, name, email, avatar) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&user.username)
        .bind(&user.password)
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.avatar)
        .execute(&self.pool)
        .await
        .context("Failed to insert user into DB")?
        .last_insert_id();

        user.id = inserted_id(id)?;
        Ok(user)
    }

    async fn get_all_users(&self) -> Result<Vec<User>> {
        sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users ORDER BY id ASC"))
            .fetch_all(&self.pool)
            .await
            .context("Failed to retrieve users from DB")
    }

    async fn get_board(&self, id: i32) -> Result<Option<Board>> {
        sqlx::query_as::<_, Board>(&format!("SELECT {BOARD_COLUMNS} FROM boards WHERE id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .with_context(|| format!("Failed to retrieve board with ID: {}", id))
    }

    async fn get_all_boards(&self) -> Result<Vec<Board>> {
        sqlx::query_as::<_, Board>(&format!("SELECT {BOARD_COLUMNS} FROM boards ORDER BY id ASC"))
            .fetch_all(&self.pool)
            .await
            .context("Failed to retrieve boards from DB")
    }

    async fn create_board(&self, board: InsertBoard) -> Result<Board> {
        let mut board = board.into_board(0);
        let id = sqlx::query(
            "INSERT INTO boards (name, description, color, status, created_by) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&board.name)
        .bind(&board.description)
        .bind(&board.color)
        .bind(&board.status)
        .bind(board.created_by)
        .execute(&self.pool)
        .await
        .context("Failed to insert board into DB")?
        .last_insert_id();

        board.id = inserted_id(id)?;
        debug!("Inserted board {} ({})", board.id, board.name);
        Ok(board)
    }

    async fn update_board(&self, id: i32, patch: BoardPatch) -> Result<Option<Board>> {
        let Some(mut board) = self.get_board(id).await? else {
            return Ok(None);
        };
        patch.apply(&mut board);
        self.save_board(&board).await?;
        Ok(Some(board))
    }

    async fn delete_board(&self, id: i32) -> Result<bool> {
        let result = sqlx::query("DELETE FROM boards WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .with_context(|| format!("Failed to delete board with ID: {}", id))?;
        Ok(result.rows_affected() > 0)
    }

    async fn get_task(&self, id: i32) -> Result<Option<Task>> {
        sqlx::query_as::<_, Task>(&format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .with_context(|| format!("Failed to retrieve task with ID: {}", id))
    }

    async fn get_tasks_by_board(&self, board_id: i32) -> Result<Vec<TaskWithAssignee>> {
        let rows = sqlx::query_as::<_, TaskAssigneeRow>(
            r#"
            SELECT t.id, t.board_id, t.name, t.description, t.status, t.priority,
                   t.assignee_id, t.due_date, t.start_date, t.estimated_hours,
                   t.actual_hours, t.position, t.completed,
                   u.id AS user_id, u.username AS user_username, u.password AS user_password,
                   u.name AS user_name, u.email AS user_email, u.avatar AS user_avatar
            FROM tasks t
            LEFT JOIN users u ON u.id = t.assignee_id
            WHERE t.board_id = ?
            ORDER BY t.position ASC, t.id ASC
            "#,
        )
        .bind(board_id)
        .fetch_all(&self.pool)
        .await
        .with_context(|| format!("Failed to retrieve tasks of board {}", board_id))?;

        Ok(rows.into_iter().map(TaskAssigneeRow::into_joined).collect())
    }

    async fn create_task(&self, task: InsertTask) -> Result<Task> {
        let mut task = task.into_task(0);
        let id = sqlx::query(
            "INSERT INTO tasks (board_id, name, description, status, priority, assignee_id, \
             due_date, start_date, estimated_hours, actual_hours, position, completed) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(task.board_id)
        .bind(&task.name)
        .bind(&task.description)
        .bind(task.status.as_str())
        .bind(task.priority.as_str())
        .bind(task.assignee_id)
        .bind(&task.due_date)
        .bind(&task.start_date)
        .bind(task.estimated_hours)
        .bind(task.actual_hours)
        .bind(task.position)
        .bind(task.completed)
        .execute(&self.pool)
        .await
        .context("Failed to insert task into DB")?
        .last_insert_id();

        task.id = inserted_id(id)?;
        debug!("Inserted task {} on board {}", task.id, task.board_id);
        Ok(task)
    }

    async fn update_task(&self, id: i32, patch: TaskPatch) -> Result<Option<Task>> {
        let Some(mut task) = self.get_task(id).await? else {
            return Ok(None);
        };
        patch.apply(&mut task);
        self.save_task(&task).await?;
        Ok(Some(task))
    }

    async fn delete_task(&self, id: i32) -> Result<bool> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .with_context(|| format!("Failed to delete task with ID: {}", id))?;
        Ok(result.rows_affected() > 0)
    }

    async fn update_task_positions(&self, task_ids: &[i32]) -> Result<()> {
        let mut tx = self
            .pool
            .begin()
            .await
            .context("Failed to start position update")?;
        for (index, task_id) in task_ids.iter().enumerate() {
            sqlx::query("UPDATE tasks SET position = ? WHERE id = ?")
                .bind(index as i32)
                .bind(task_id)
                .execute(&mut *tx)
                .await
                .with_context(|| format!("Failed to move task {} to position {}", task_id, index))?;
        }
        tx.commit()
            .await
            .context("Failed to commit position update")?;
        info!("Reordered {} tasks.", task_ids.len());
        Ok(())
    }

    async fn create_time_entry(&self, entry: InsertTimeEntry) -> Result<TimeEntry> {
        let mut entry = entry.into_entry(0, Utc::now().trunc_subsecs(0));
        let id = sqlx::query(
            "INSERT INTO time_entries (task_id, user_id, description, minutes, date, created_at) \
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(entry.task_id)
        .bind(entry.user_id)
        .bind(&entry.description)
        .bind(entry.minutes)
        .bind(&entry.date)
        .bind(entry.created_at)
        .execute(&self.pool)
        .await
        .context("Failed to insert time entry into DB")?
        .last_insert_id();

        entry.id = inserted_id(id)?;
        Ok(entry)
    }

    async fn get_time_entries_by_task(&self, task_id: i32) -> Result<Vec<TimeEntry>> {
        sqlx::query_as::<_, TimeEntry>(&format!(
            "SELECT {TIME_ENTRY_COLUMNS} FROM time_entries WHERE task_id = ? ORDER BY date ASC, id ASC"
        ))
        .bind(task_id)
        .fetch_all(&self.pool)
        .await
        .with_context(|| format!("Failed to retrieve time entries of task {}", task_id))
    }
}
