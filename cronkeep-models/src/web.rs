use chrono::{DateTime, Local, Utc};
use serde::{
    Deserialize, Serialize, Serializer,
    ser::SerializeStruct,
};
use serde_json::{Map, Value};

use crate::{
    core::{ScheduleType, Task, TaskId},
    errors::ActionError,
};

/// Task fields as submitted by a form. The schedule type stays a string
/// until validation so unknown values are reported as field errors.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub schedule_type: String,
    #[serde(default)]
    pub cron_expression: Option<String>,
    #[serde(default)]
    pub schedule_data: Option<Value>,
}

impl TaskForm {
    pub fn new(name: impl Into<String>, schedule_type: ScheduleType) -> Self {
        Self {
            name: name.into(),
            schedule_type: schedule_type.to_string(),
            cron_expression: None,
            schedule_data: None,
        }
    }

    pub fn with_cron(mut self, cron_expression: impl Into<String>) -> Self {
        self.cron_expression = Some(cron_expression.into());
        self
    }

    pub fn with_data(mut self, schedule_data: Value) -> Self {
        self.schedule_data = Some(schedule_data);
        self
    }
}

/// Wire shape of a task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskRecord {
    pub id: TaskId,
    pub name: String,
    pub schedule_type: ScheduleType,
    pub cron_expression: String,
    pub schedule_data: Map<String, Value>,
    pub next_run_time: DateTime<Utc>,
    pub next_run_time_local: String,
    pub is_deleted: bool,
    pub deleted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Task> for TaskRecord {
    fn from(task: &Task) -> Self {
        Self {
            id: task.id,
            name: task.name.clone(),
            schedule_type: task.schedule.schedule_type(),
            cron_expression: task.schedule.cron_expression(),
            schedule_data: task.schedule.schedule_data(),
            next_run_time: task.next_run_time,
            next_run_time_local: task.next_run_time.with_timezone(&Local).to_rfc3339(),
            is_deleted: task.state.is_deleted(),
            deleted_at: task.state.deleted_at(),
            created_at: task.created_at,
            updated_at: task.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskPage {
    pub tasks: Vec<TaskRecord>,
    pub total: u64,
    pub page: u64,
    pub page_size: u64,
    pub total_pages: u64,
}

/// Outcome of a mutating task operation.
///
/// Serializes as `{"success": true, "task": {..}}` or
/// `{"success": false, "error": "..", "code": ".."}`.
#[derive(Debug, Clone)]
pub enum ActionResult {
    Success(Task),
    Failure(ActionError),
}

impl ActionResult {
    pub fn is_success(&self) -> bool {
        matches!(self, ActionResult::Success(_))
    }

    pub fn task(&self) -> Option<&Task> {
        match self {
            ActionResult::Success(task) => Some(task),
            ActionResult::Failure(_) => None,
        }
    }

    pub fn error(&self) -> Option<&ActionError> {
        match self {
            ActionResult::Success(_) => None,
            ActionResult::Failure(err) => Some(err),
        }
    }

    pub fn into_result(self) -> Result<Task, ActionError> {
        match self {
            ActionResult::Success(task) => Ok(task),
            ActionResult::Failure(err) => Err(err),
        }
    }
}

impl Serialize for ActionResult {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            ActionResult::Success(task) => {
                let mut state = serializer.serialize_struct("ActionResult", 2)?;
                state.serialize_field("success", &true)?;
                state.serialize_field("task", &TaskRecord::from(task))?;
                state.end()
            }
            ActionResult::Failure(err) => {
                let mut state = serializer.serialize_struct("ActionResult", 3)?;
                state.serialize_field("success", &false)?;
                state.serialize_field("error", &err.message)?;
                state.serialize_field("code", &err.code)?;
                state.end()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{DailySchedule, Schedule, TaskState};
    use chrono::TimeZone;
    use serde_json::json;
    use uuid::Uuid;

    fn sample_task() -> Task {
        let created = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        Task {
            id: Uuid::new_v4(),
            name: "Daily Backup".into(),
            schedule: Schedule::Daily(DailySchedule { hour: 0, minute: 0 }),
            next_run_time: Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap(),
            state: TaskState::Active,
            created_at: created,
            updated_at: created,
        }
    }

    #[test]
    fn form_deserializes_camel_case_fields() {
        let form: TaskForm = serde_json::from_value(json!({
            "name": "Report",
            "scheduleType": "CUSTOM",
            "cronExpression": "*/5 * * * *",
            "scheduleData": {"anything": true}
        }))
        .unwrap();

        assert_eq!(form.schedule_type, "CUSTOM");
        assert_eq!(form.cron_expression.as_deref(), Some("*/5 * * * *"));
        assert_eq!(form.schedule_data, Some(json!({"anything": true})));
    }

    #[test]
    fn success_result_serializes_task_record() {
        let task = sample_task();
        let result = ActionResult::Success(task.clone());
        assert_eq!(result.task(), Some(&task));
        let value = serde_json::to_value(&result).unwrap();

        assert_eq!(value["success"], json!(true));
        assert_eq!(value["task"]["id"], json!(task.id.to_string()));
        assert_eq!(value["task"]["scheduleType"], json!("DAILY"));
        assert_eq!(value["task"]["cronExpression"], json!("0 0 * * *"));
        assert_eq!(value["task"]["scheduleData"], json!({"hour": 0, "minute": 0}));
        assert_eq!(value["task"]["isDeleted"], json!(false));
        assert_eq!(value["task"]["deletedAt"], Value::Null);
    }

    #[test]
    fn failure_result_serializes_message_and_code() {
        let result = ActionResult::Failure(ActionError::new("not_found", "task missing"));
        let value = serde_json::to_value(&result).unwrap();

        assert_eq!(value, json!({"success": false, "error": "task missing", "code": "not_found"}));
        assert!(!result.is_success());
        assert_eq!(result.task(), None);
    }
}
