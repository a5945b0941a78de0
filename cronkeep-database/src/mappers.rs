use chrono::{DateTime, Utc};
use cronkeep_models::core::{Schedule, ScheduleType, Task, TaskState};
use serde_json::{Map, Value};
use sqlx::{Row, sqlite::SqliteRow};
use uuid::Uuid;

use crate::StoreError;

pub(crate) const TASK_COLUMNS: &str = "id, name, schedule_type, cron_expression, schedule_data, \
     next_run_time, is_deleted, deleted_at, created_at, updated_at";

pub(crate) fn row_to_task(row: &SqliteRow) -> Result<Task, StoreError> {
    let raw_id = row.try_get::<String, _>("id")?;
    let id = Uuid::parse_str(&raw_id)
        .map_err(|err| StoreError::Corrupt(format!("id '{}': {}", raw_id, err)))?;

    let kind = row
        .try_get::<String, _>("schedule_type")?
        .parse::<ScheduleType>()
        .map_err(|err| StoreError::Corrupt(format!("task {}: {}", id, err)))?;

    let raw_data = row.try_get::<String, _>("schedule_data")?;
    let data = match serde_json::from_str::<Value>(&raw_data) {
        Ok(Value::Object(map)) => map,
        Ok(Value::Null) => Map::new(),
        Ok(other) => {
            return Err(StoreError::Corrupt(format!(
                "task {}: schedule data is not an object: {}",
                id, other
            )));
        }
        Err(err) => return Err(StoreError::Corrupt(format!("task {}: {}", id, err))),
    };

    let schedule = Schedule::from_parts(kind, row.try_get("cron_expression")?, data)
        .map_err(|err| StoreError::Corrupt(format!("task {}: {}", id, err)))?;

    let state = if row.try_get::<bool, _>("is_deleted")? {
        let at = row
            .try_get::<Option<i64>, _>("deleted_at")?
            .ok_or_else(|| StoreError::Corrupt(format!("task {}: deleted without timestamp", id)))?;
        TaskState::Deleted {
            at: millis_to_datetime(at)?,
        }
    } else {
        TaskState::Active
    };

    Ok(Task {
        id,
        name: row.try_get("name")?,
        schedule,
        next_run_time: millis_to_datetime(row.try_get("next_run_time")?)?,
        state,
        created_at: millis_to_datetime(row.try_get("created_at")?)?,
        updated_at: millis_to_datetime(row.try_get("updated_at")?)?,
    })
}

pub(crate) fn schedule_data_json(schedule: &Schedule) -> String {
    Value::Object(schedule.schedule_data()).to_string()
}

fn millis_to_datetime(millis: i64) -> Result<DateTime<Utc>, StoreError> {
    DateTime::<Utc>::from_timestamp_millis(millis)
        .ok_or_else(|| StoreError::Corrupt(format!("timestamp out of range: {}", millis)))
}
