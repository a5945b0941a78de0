use cronkeep_models::core::TaskId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("task {0} not found")]
    NotFound(TaskId),
    #[error("task {0} already exists")]
    Conflict(TaskId),
    #[error("stored task row is unreadable: {0}")]
    Corrupt(String),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}
