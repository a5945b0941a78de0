use cronkeep_database::interfaces::{TaskFilter, TaskStore};
use cronkeep_models::{
    core::{ScheduleType, Task},
    errors::ActionError,
    web::TaskForm,
};
use log::info;

use crate::{ServiceError, TaskService};

pub fn sample_tasks() -> Vec<TaskForm> {
    vec![
        TaskForm::new("Daily Backup", ScheduleType::Daily),
        TaskForm::new("Hourly Health Check", ScheduleType::Hourly),
        TaskForm::new("Weekly Report", ScheduleType::Weekly),
    ]
}

/// Fills an empty store with the sample tasks. A store that already holds
/// records, deleted ones included, is left alone.
pub async fn seed_sample_tasks<S: TaskStore>(
    service: &TaskService<S>,
) -> Result<Vec<Task>, ActionError> {
    let existing = service
        .store()
        .count(TaskFilter::All)
        .await
        .map_err(|err| ActionError::from(ServiceError::from(err)))?;
    if existing > 0 {
        info!("Store already holds {} task(s), skipping seed", existing);
        return Ok(Vec::new());
    }

    let mut created = Vec::new();
    for form in sample_tasks() {
        created.push(service.create_task(&form).await.into_result()?);
    }
    info!("Seeded {} sample task(s)", created.len());
    Ok(created)
}
