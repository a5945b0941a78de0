use std::sync::Arc;

use cronkeep_database::interfaces::{TaskFilter, TaskQuery, TaskStore};
use cronkeep_models::{
    core::{CustomSchedule, Schedule, Task, TaskChanges, TaskId, TaskState},
    errors::ActionError,
    web::{ActionResult, TaskForm, TaskPage, TaskRecord},
};
use futures_util::future::try_join;
use log::{error, info};
use serde_json::Map;
use uuid::Uuid;

use crate::{
    ServiceError,
    clock::Clock,
    next_run::{ReferenceZone, compute_next_run},
    schedule::canonicalize,
    validator::{ValidatedTask, ValidationError, validate},
};

pub const DEFAULT_PAGE_SIZE: u64 = 10;
pub const MAX_PAGE_SIZE: u64 = 100;

/// Cron used for a CUSTOM task created without an expression.
pub const DEFAULT_CUSTOM_CRON: &str = "0 0 * * *";

/// Validates, schedules and persists task records.
///
/// Every mutating operation returns an [`ActionResult`]; failures are logged
/// and reported in the result, never raised.
pub struct TaskService<S> {
    store: Arc<S>,
    clock: Arc<dyn Clock>,
    zone: ReferenceZone,
}

impl<S> Clone for TaskService<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            clock: Arc::clone(&self.clock),
            zone: self.zone,
        }
    }
}

impl<S: TaskStore> TaskService<S> {
    pub fn new(store: Arc<S>, clock: Arc<dyn Clock>, zone: ReferenceZone) -> Self {
        Self { store, clock, zone }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub async fn create_task(&self, form: &TaskForm) -> ActionResult {
        into_action("add", self.try_create_task(form).await)
    }

    pub async fn update_task(&self, id: TaskId, form: &TaskForm) -> ActionResult {
        into_action("update", self.try_update_task(id, form).await)
    }

    pub async fn delete_task(&self, id: TaskId) -> ActionResult {
        into_action("delete", self.try_delete_task(id).await)
    }

    pub async fn list_tasks(&self, page: u64, page_size: u64) -> Result<TaskPage, ActionError> {
        self.try_list_tasks(page, page_size).await.map_err(|err| {
            error!("Failed to fetch tasks: {}", err);
            ActionError::from(err)
        })
    }

    async fn try_create_task(&self, form: &TaskForm) -> Result<Task, ServiceError> {
        let validated = validate(form)?;
        let default_custom = CustomSchedule {
            cron_expression: DEFAULT_CUSTOM_CRON.to_string(),
            data: Map::new(),
        };
        let schedule = schedule_for(&validated, default_custom);

        let now = self.clock.now();
        let next_run_time = compute_next_run(&schedule.cron_expression(), now, self.zone)?;

        let task = Task {
            id: Uuid::new_v4(),
            name: validated.name,
            schedule,
            next_run_time,
            state: TaskState::Active,
            created_at: now,
            updated_at: now,
        };
        let created = self.store.create(&task).await?;
        info!(
            "Added task {} '{}' ({}), next run at {}",
            created.id,
            created.name,
            created.schedule.cron_expression(),
            created.next_run_time
        );
        Ok(created)
    }

    async fn try_update_task(&self, id: TaskId, form: &TaskForm) -> Result<Task, ServiceError> {
        let validated = validate(form)?;
        let existing = self
            .store
            .find_by_id(id)
            .await?
            .filter(|task| !task.state.is_deleted())
            .ok_or(ServiceError::NotFound(id))?;
        let schedule = schedule_for(&validated, existing.schedule.to_custom());

        let now = self.clock.now();
        let next_run_time = compute_next_run(&schedule.cron_expression(), now, self.zone)?;

        let changes = TaskChanges {
            name: validated.name,
            schedule,
            next_run_time,
            updated_at: now,
        };
        let updated = self.store.update_by_id(id, &changes).await?;
        info!(
            "Updated task {} ({}), next run at {}",
            updated.id,
            updated.schedule.cron_expression(),
            updated.next_run_time
        );
        Ok(updated)
    }

    async fn try_delete_task(&self, id: TaskId) -> Result<Task, ServiceError> {
        let deleted = self.store.mark_deleted(id, self.clock.now()).await?;
        info!("Deleted task {}", deleted.id);
        Ok(deleted)
    }

    async fn try_list_tasks(&self, page: u64, page_size: u64) -> Result<TaskPage, ServiceError> {
        let mut invalid = Vec::new();
        if page == 0 {
            invalid.push(ValidationError::single("page", "must be at least 1"));
        }
        if page_size == 0 {
            invalid.push(ValidationError::single("pageSize", "must be at least 1"));
        }
        if !invalid.is_empty() {
            let fields = invalid.into_iter().flat_map(|err| err.fields).collect();
            return Err(ValidationError { fields }.into());
        }

        let page_size = page_size.min(MAX_PAGE_SIZE);
        let query = TaskQuery {
            filter: TaskFilter::Active,
            skip: (page - 1).saturating_mul(page_size),
            take: page_size,
        };
        let (tasks, total) = try_join(
            self.store.find_many(&query),
            self.store.count(TaskFilter::Active),
        )
        .await?;

        Ok(TaskPage {
            tasks: tasks.iter().map(TaskRecord::from).collect(),
            total,
            page,
            page_size,
            total_pages: total.div_ceil(page_size),
        })
    }
}

fn schedule_for(validated: &ValidatedTask, fallback: CustomSchedule) -> Schedule {
    canonicalize(validated.schedule_type, validated.custom_schedule(fallback))
}

fn into_action(operation: &str, result: Result<Task, ServiceError>) -> ActionResult {
    match result {
        Ok(task) => ActionResult::Success(task),
        Err(err) => {
            error!("Failed to {} task: {}", operation, err);
            ActionResult::Failure(err.into())
        }
    }
}
