use std::future::Future;

use chrono::{DateTime, Utc};
use cronkeep_models::core::{Task, TaskChanges, TaskId};

use crate::StoreError;

/// Which records a read operation sees.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskFilter {
    /// Records that have not been soft-deleted.
    Active,
    All,
}

/// A page of records, always ordered newest first by creation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskQuery {
    pub filter: TaskFilter,
    pub skip: u64,
    pub take: u64,
}

/// Durable storage for task records. Records are never physically removed;
/// deletion only flips them to the deleted state.
pub trait TaskStore: Send + Sync + 'static {
    fn initialize(&self) -> impl Future<Output = Result<(), StoreError>> + Send;
    fn create(&self, task: &Task) -> impl Future<Output = Result<Task, StoreError>> + Send;
    fn find_by_id(&self, id: TaskId) -> impl Future<Output = Result<Option<Task>, StoreError>> + Send;
    /// Applies `changes` to an active record. Deleted records are `NotFound`.
    fn update_by_id(
        &self,
        id: TaskId,
        changes: &TaskChanges,
    ) -> impl Future<Output = Result<Task, StoreError>> + Send;
    /// Soft-deletes an active record. Deleted records are `NotFound`.
    fn mark_deleted(
        &self,
        id: TaskId,
        at: DateTime<Utc>,
    ) -> impl Future<Output = Result<Task, StoreError>> + Send;
    fn find_many(&self, query: &TaskQuery) -> impl Future<Output = Result<Vec<Task>, StoreError>> + Send;
    fn count(&self, filter: TaskFilter) -> impl Future<Output = Result<u64, StoreError>> + Send;
}
