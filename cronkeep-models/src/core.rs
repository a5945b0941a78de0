use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::{Map, Value};
use thiserror::Error;
use uuid::Uuid;

pub type TaskId = Uuid;

/// The closed set of schedule kinds a task can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ScheduleType {
    Daily,
    Hourly,
    Weekly,
    Monthly,
    Custom,
}

impl ScheduleType {
    pub const ALL: [ScheduleType; 5] = [
        ScheduleType::Daily,
        ScheduleType::Hourly,
        ScheduleType::Weekly,
        ScheduleType::Monthly,
        ScheduleType::Custom,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ScheduleType::Daily => "DAILY",
            ScheduleType::Hourly => "HOURLY",
            ScheduleType::Weekly => "WEEKLY",
            ScheduleType::Monthly => "MONTHLY",
            ScheduleType::Custom => "CUSTOM",
        }
    }
}

impl fmt::Display for ScheduleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown schedule type '{0}'")]
pub struct UnknownScheduleType(pub String);

impl FromStr for ScheduleType {
    type Err = UnknownScheduleType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ScheduleType::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| UnknownScheduleType(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailySchedule {
    pub hour: u8,
    pub minute: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HourlySchedule {
    pub minute: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeeklySchedule {
    pub day_of_week: u8,
    pub hour: u8,
    pub minute: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlySchedule {
    pub day_of_month: u8,
    pub hour: u8,
    pub minute: u8,
}

/// Caller-owned schedule: the cron expression is taken verbatim and the
/// data map is stored as given.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomSchedule {
    pub cron_expression: String,
    #[serde(default)]
    pub data: Map<String, Value>,
}

/// A task schedule. The cron expression and the schedule data of the fixed
/// kinds are both derived from the variant, so they always agree.
#[derive(Debug, Clone, PartialEq)]
pub enum Schedule {
    Daily(DailySchedule),
    Hourly(HourlySchedule),
    Weekly(WeeklySchedule),
    Monthly(MonthlySchedule),
    Custom(CustomSchedule),
}

#[derive(Debug, Error)]
pub enum ScheduleDataError {
    #[error("schedule data does not fit a {kind} schedule: {source}")]
    Malformed {
        kind: ScheduleType,
        #[source]
        source: serde_json::Error,
    },
    #[error("{kind} schedule is not canonical: '{cron_expression}'")]
    NotCanonical {
        kind: ScheduleType,
        cron_expression: String,
    },
}

impl ScheduleDataError {
    pub fn kind(&self) -> ScheduleType {
        match self {
            ScheduleDataError::Malformed { kind, .. } => *kind,
            ScheduleDataError::NotCanonical { kind, .. } => *kind,
        }
    }
}

impl Schedule {
    /// The only schedule a fixed kind may hold: the start of its period.
    /// CUSTOM has no canonical form.
    pub fn canonical(kind: ScheduleType) -> Option<Schedule> {
        let schedule = match kind {
            ScheduleType::Daily => Schedule::Daily(DailySchedule { hour: 0, minute: 0 }),
            ScheduleType::Hourly => Schedule::Hourly(HourlySchedule { minute: 0 }),
            ScheduleType::Weekly => Schedule::Weekly(WeeklySchedule {
                day_of_week: 1,
                hour: 0,
                minute: 0,
            }),
            ScheduleType::Monthly => Schedule::Monthly(MonthlySchedule {
                day_of_month: 1,
                hour: 0,
                minute: 0,
            }),
            ScheduleType::Custom => return None,
        };
        Some(schedule)
    }

    pub fn schedule_type(&self) -> ScheduleType {
        match self {
            Schedule::Daily(_) => ScheduleType::Daily,
            Schedule::Hourly(_) => ScheduleType::Hourly,
            Schedule::Weekly(_) => ScheduleType::Weekly,
            Schedule::Monthly(_) => ScheduleType::Monthly,
            Schedule::Custom(_) => ScheduleType::Custom,
        }
    }

    pub fn cron_expression(&self) -> String {
        match self {
            Schedule::Daily(s) => format!("{} {} * * *", s.minute, s.hour),
            Schedule::Hourly(s) => format!("{} * * * *", s.minute),
            Schedule::Weekly(s) => format!("{} {} * * {}", s.minute, s.hour, s.day_of_week),
            Schedule::Monthly(s) => format!("{} {} {} * *", s.minute, s.hour, s.day_of_month),
            Schedule::Custom(s) => s.cron_expression.clone(),
        }
    }

    pub fn schedule_data(&self) -> Map<String, Value> {
        match self {
            Schedule::Daily(s) => to_map(s),
            Schedule::Hourly(s) => to_map(s),
            Schedule::Weekly(s) => to_map(s),
            Schedule::Monthly(s) => to_map(s),
            Schedule::Custom(s) => s.data.clone(),
        }
    }

    /// Rebuilds a schedule from its stored columns. Fixed kinds must match
    /// their canonical form in both the cron expression and the data map.
    pub fn from_parts(
        kind: ScheduleType,
        cron_expression: String,
        data: Map<String, Value>,
    ) -> Result<Self, ScheduleDataError> {
        let schedule = match kind {
            ScheduleType::Daily => Schedule::Daily(from_map(kind, data)?),
            ScheduleType::Hourly => Schedule::Hourly(from_map(kind, data)?),
            ScheduleType::Weekly => Schedule::Weekly(from_map(kind, data)?),
            ScheduleType::Monthly => Schedule::Monthly(from_map(kind, data)?),
            ScheduleType::Custom => {
                return Ok(Schedule::Custom(CustomSchedule {
                    cron_expression,
                    data,
                }));
            }
        };

        if Schedule::canonical(kind).as_ref() != Some(&schedule)
            || cron_expression != schedule.cron_expression()
        {
            return Err(ScheduleDataError::NotCanonical {
                kind,
                cron_expression,
            });
        }
        Ok(schedule)
    }

    /// The cron expression and data pair, in the shape CUSTOM schedules use.
    pub fn to_custom(&self) -> CustomSchedule {
        CustomSchedule {
            cron_expression: self.cron_expression(),
            data: self.schedule_data(),
        }
    }
}

fn to_map<T: Serialize>(value: &T) -> Map<String, Value> {
    match serde_json::to_value(value) {
        Ok(Value::Object(map)) => map,
        _ => Map::new(),
    }
}

fn from_map<T: DeserializeOwned>(
    kind: ScheduleType,
    data: Map<String, Value>,
) -> Result<T, ScheduleDataError> {
    serde_json::from_value(Value::Object(data))
        .map_err(|source| ScheduleDataError::Malformed { kind, source })
}

/// Soft-delete lifecycle of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    Active,
    Deleted { at: DateTime<Utc> },
}

impl TaskState {
    pub fn is_deleted(&self) -> bool {
        matches!(self, TaskState::Deleted { .. })
    }

    pub fn deleted_at(&self) -> Option<DateTime<Utc>> {
        match self {
            TaskState::Active => None,
            TaskState::Deleted { at } => Some(*at),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Task {
    pub id: TaskId,
    pub name: String,
    pub schedule: Schedule,
    pub next_run_time: DateTime<Utc>,
    pub state: TaskState,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields an update is allowed to touch.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskChanges {
    pub name: String,
    pub schedule: Schedule,
    pub next_run_time: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
