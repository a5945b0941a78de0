use std::sync::Arc;

use chrono::{DateTime, Utc};
use cronkeep_models::core::{Task, TaskChanges, TaskId, TaskState};
use parking_lot::Mutex;

use crate::{
    StoreError,
    interfaces::{TaskFilter, TaskQuery, TaskStore},
};

#[derive(Default)]
struct StoreState {
    // insertion order
    tasks: Vec<Task>,
}

impl StoreState {
    fn active_mut(&mut self, id: TaskId) -> Option<&mut Task> {
        self.tasks
            .iter_mut()
            .find(|task| task.id == id && !task.state.is_deleted())
    }
}

fn matches_filter(task: &Task, filter: TaskFilter) -> bool {
    match filter {
        TaskFilter::Active => !task.state.is_deleted(),
        TaskFilter::All => true,
    }
}

/// Process-local task store. Clones share the same records.
#[derive(Clone, Default)]
pub struct InMemoryDb {
    state: Arc<Mutex<StoreState>>,
}

impl InMemoryDb {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TaskStore for InMemoryDb {
    async fn initialize(&self) -> Result<(), StoreError> {
        Ok(())
    }

    async fn create(&self, task: &Task) -> Result<Task, StoreError> {
        let mut guard = self.state.lock();
        if guard.tasks.iter().any(|existing| existing.id == task.id) {
            return Err(StoreError::Conflict(task.id));
        }
        guard.tasks.push(task.clone());
        Ok(task.clone())
    }

    async fn find_by_id(&self, id: TaskId) -> Result<Option<Task>, StoreError> {
        let guard = self.state.lock();
        Ok(guard.tasks.iter().find(|task| task.id == id).cloned())
    }

    async fn update_by_id(&self, id: TaskId, changes: &TaskChanges) -> Result<Task, StoreError> {
        let mut guard = self.state.lock();
        let task = guard.active_mut(id).ok_or(StoreError::NotFound(id))?;
        task.name = changes.name.clone();
        task.schedule = changes.schedule.clone();
        task.next_run_time = changes.next_run_time;
        task.updated_at = changes.updated_at;
        Ok(task.clone())
    }

    async fn mark_deleted(&self, id: TaskId, at: DateTime<Utc>) -> Result<Task, StoreError> {
        let mut guard = self.state.lock();
        let task = guard.active_mut(id).ok_or(StoreError::NotFound(id))?;
        task.state = TaskState::Deleted { at };
        Ok(task.clone())
    }

    async fn find_many(&self, query: &TaskQuery) -> Result<Vec<Task>, StoreError> {
        let guard = self.state.lock();
        // newest insertions first so the stable sort breaks created_at ties the same way
        let mut tasks: Vec<Task> = guard
            .tasks
            .iter()
            .rev()
            .filter(|task| matches_filter(task, query.filter))
            .cloned()
            .collect();
        drop(guard);

        tasks.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        let skip = usize::try_from(query.skip).unwrap_or(usize::MAX);
        let take = usize::try_from(query.take).unwrap_or(usize::MAX);
        Ok(tasks.into_iter().skip(skip).take(take).collect())
    }

    async fn count(&self, filter: TaskFilter) -> Result<u64, StoreError> {
        let guard = self.state.lock();
        let total = guard
            .tasks
            .iter()
            .filter(|task| matches_filter(task, filter))
            .count();
        Ok(total as u64)
    }
}
