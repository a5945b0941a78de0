use std::{str::FromStr, time::Duration};

use chrono::{DateTime, Utc};
use cronkeep_models::core::{Task, TaskChanges, TaskId};
use log::debug;
use sqlx::{
    ConnectOptions, Executor, SqlitePool,
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
};

use crate::{
    StoreError,
    interfaces::{TaskFilter, TaskQuery, TaskStore},
    mappers::{TASK_COLUMNS, row_to_task, schedule_data_json},
};

const TASKS_TABLE_SQL: &str = "CREATE TABLE IF NOT EXISTS tasks (
    seq INTEGER PRIMARY KEY AUTOINCREMENT,
    id TEXT NOT NULL UNIQUE,
    name TEXT NOT NULL,
    schedule_type TEXT NOT NULL,
    cron_expression TEXT NOT NULL,
    schedule_data TEXT NOT NULL,
    next_run_time INTEGER NOT NULL,
    is_deleted BOOLEAN NOT NULL DEFAULT 0,
    deleted_at INTEGER NULL,
    created_at INTEGER NOT NULL,
    updated_at INTEGER NOT NULL,
    CHECK ((is_deleted = 0 AND deleted_at IS NULL) OR (is_deleted = 1 AND deleted_at IS NOT NULL))
)";

const TASKS_INDEX_SQL: &str =
    "CREATE INDEX IF NOT EXISTS idx_tasks_active_created ON tasks (is_deleted, created_at)";

pub struct SqliteDb {
    pub pool: SqlitePool,
}

impl SqliteDb {
    pub async fn new(filename: &str) -> Result<Self, StoreError> {
        let mut options = SqliteConnectOptions::new()
            .filename(filename)
            .create_if_missing(true);
        let options_with_logs = options
            .log_statements(log::LevelFilter::Debug)
            .log_slow_statements(log::LevelFilter::Warn, Duration::from_secs(1));
        let connection = SqlitePool::connect_with(options_with_logs.clone()).await?;
        Ok(SqliteDb { pool: connection })
    }

    /// A private database that lives as long as the pool. The pool is held
    /// to a single connection because every sqlite memory connection is its
    /// own database.
    pub async fn in_memory() -> Result<Self, StoreError> {
        let mut options = SqliteConnectOptions::from_str("sqlite::memory:")?;
        let options_with_logs = options.log_statements(log::LevelFilter::Debug);
        let connection = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options_with_logs.clone())
            .await?;
        Ok(SqliteDb { pool: connection })
    }
}

fn filter_clause(filter: TaskFilter) -> &'static str {
    match filter {
        TaskFilter::Active => "WHERE is_deleted = 0",
        TaskFilter::All => "",
    }
}

fn to_i64(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

impl TaskStore for SqliteDb {
    async fn initialize(&self) -> Result<(), StoreError> {
        self.pool.execute(TASKS_TABLE_SQL).await?;
        self.pool.execute(TASKS_INDEX_SQL).await?;
        Ok(())
    }

    async fn create(&self, task: &Task) -> Result<Task, StoreError> {
        let sql = format!(
            "INSERT INTO tasks (id, name, schedule_type, cron_expression, schedule_data,
                next_run_time, is_deleted, deleted_at, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
             RETURNING {}",
            TASK_COLUMNS
        );
        let row = sqlx::query(&sql)
            .bind(task.id.to_string())
            .bind(&task.name)
            .bind(task.schedule.schedule_type().as_str())
            .bind(task.schedule.cron_expression())
            .bind(schedule_data_json(&task.schedule))
            .bind(task.next_run_time.timestamp_millis())
            .bind(task.state.is_deleted())
            .bind(task.state.deleted_at().map(|dt| dt.timestamp_millis()))
            .bind(task.created_at.timestamp_millis())
            .bind(task.updated_at.timestamp_millis())
            .fetch_one(&self.pool)
            .await
            .map_err(|err| {
                let duplicate = matches!(
                    &err,
                    sqlx::Error::Database(db_err) if db_err.message().contains("UNIQUE")
                );
                if duplicate {
                    StoreError::Conflict(task.id)
                } else {
                    StoreError::Database(err)
                }
            })?;
        debug!("Inserted task {}", task.id);
        row_to_task(&row)
    }

    async fn find_by_id(&self, id: TaskId) -> Result<Option<Task>, StoreError> {
        let sql = format!("SELECT {} FROM tasks WHERE id = ?", TASK_COLUMNS);
        let row = sqlx::query(&sql)
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(row_to_task).transpose()
    }

    async fn update_by_id(&self, id: TaskId, changes: &TaskChanges) -> Result<Task, StoreError> {
        let sql = format!(
            "UPDATE tasks SET
                name = ?,
                schedule_type = ?,
                cron_expression = ?,
                schedule_data = ?,
                next_run_time = ?,
                updated_at = ?
             WHERE id = ? AND is_deleted = 0
             RETURNING {}",
            TASK_COLUMNS
        );
        let row = sqlx::query(&sql)
            .bind(&changes.name)
            .bind(changes.schedule.schedule_type().as_str())
            .bind(changes.schedule.cron_expression())
            .bind(schedule_data_json(&changes.schedule))
            .bind(changes.next_run_time.timestamp_millis())
            .bind(changes.updated_at.timestamp_millis())
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;
        match row {
            Some(row) => row_to_task(&row),
            None => Err(StoreError::NotFound(id)),
        }
    }

    async fn mark_deleted(&self, id: TaskId, at: DateTime<Utc>) -> Result<Task, StoreError> {
        let sql = format!(
            "UPDATE tasks SET is_deleted = 1, deleted_at = ?
             WHERE id = ? AND is_deleted = 0
             RETURNING {}",
            TASK_COLUMNS
        );
        let row = sqlx::query(&sql)
            .bind(at.timestamp_millis())
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;
        match row {
            Some(row) => row_to_task(&row),
            None => Err(StoreError::NotFound(id)),
        }
    }

    async fn find_many(&self, query: &TaskQuery) -> Result<Vec<Task>, StoreError> {
        let sql = format!(
            "SELECT {} FROM tasks {} ORDER BY created_at DESC, seq DESC LIMIT ? OFFSET ?",
            TASK_COLUMNS,
            filter_clause(query.filter)
        );
        let rows = sqlx::query(&sql)
            .bind(to_i64(query.take))
            .bind(to_i64(query.skip))
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(row_to_task).collect()
    }

    async fn count(&self, filter: TaskFilter) -> Result<u64, StoreError> {
        let sql = format!("SELECT COUNT(*) FROM tasks {}", filter_clause(filter));
        let (total,) = sqlx::query_as::<_, (i64,)>(&sql).fetch_one(&self.pool).await?;
        Ok(u64::try_from(total).unwrap_or_default())
    }
}
