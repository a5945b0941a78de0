use cronkeep_models::{
    core::{CustomSchedule, ScheduleType},
    web::TaskForm,
};
use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

pub const MAX_NAME_LENGTH: usize = 250;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("validation failed: {}", describe(.fields))]
pub struct ValidationError {
    pub fields: Vec<FieldError>,
}

impl ValidationError {
    pub fn single(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            fields: vec![FieldError {
                field,
                message: message.into(),
            }],
        }
    }

    pub fn has_field(&self, field: &str) -> bool {
        self.fields.iter().any(|f| f.field == field)
    }
}

fn describe(fields: &[FieldError]) -> String {
    fields
        .iter()
        .map(|f| format!("{} {}", f.field, f.message))
        .collect::<Vec<_>>()
        .join("; ")
}

/// A form that passed validation. Cron syntax has not been checked yet.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedTask {
    pub name: String,
    pub schedule_type: ScheduleType,
    pub cron_expression: Option<String>,
    pub schedule_data: Option<Map<String, Value>>,
}

impl ValidatedTask {
    /// The submitted CUSTOM fields, with anything left out taken from `fallback`.
    pub fn custom_schedule(&self, fallback: CustomSchedule) -> CustomSchedule {
        CustomSchedule {
            cron_expression: self
                .cron_expression
                .clone()
                .unwrap_or(fallback.cron_expression),
            data: self.schedule_data.clone().unwrap_or(fallback.data),
        }
    }
}

pub fn validate(form: &TaskForm) -> Result<ValidatedTask, ValidationError> {
    let mut fields = Vec::new();
    let mut reject = |field: &'static str, message: String| fields.push(FieldError { field, message });

    let name_length = form.name.chars().count();
    if name_length == 0 {
        reject("name", "must not be empty".into());
    } else if name_length > MAX_NAME_LENGTH {
        reject(
            "name",
            format!("must be at most {} characters, got {}", MAX_NAME_LENGTH, name_length),
        );
    }

    let schedule_type = match form.schedule_type.parse::<ScheduleType>() {
        Ok(kind) => Some(kind),
        Err(_) => {
            let allowed = ScheduleType::ALL.map(|kind| kind.as_str()).join(", ");
            reject(
                "scheduleType",
                format!("must be one of {}, got '{}'", allowed, form.schedule_type),
            );
            None
        }
    };

    let schedule_data = match &form.schedule_data {
        None | Some(Value::Null) => None,
        Some(Value::Object(map)) => Some(map.clone()),
        Some(_) => {
            reject("scheduleData", "must be an object".into());
            None
        }
    };

    if form.cron_expression.as_deref().is_some_and(|cron| cron.trim().is_empty()) {
        reject("cronExpression", "must not be empty".into());
    }

    match schedule_type {
        Some(schedule_type) if fields.is_empty() => Ok(ValidatedTask {
            name: form.name.clone(),
            schedule_type,
            cron_expression: form.cron_expression.clone(),
            schedule_data,
        }),
        _ => Err(ValidationError { fields }),
    }
}
