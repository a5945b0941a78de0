use cronkeep_models::core::{CustomSchedule, Schedule, ScheduleType};

/// Maps a schedule type onto its canonical schedule. The fixed kinds always
/// fire at the start of their period; CUSTOM takes `supplied` as is.
pub fn canonicalize(schedule_type: ScheduleType, supplied: CustomSchedule) -> Schedule {
    Schedule::canonical(schedule_type).unwrap_or(Schedule::Custom(supplied))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Map, Value, json};

    fn unused() -> CustomSchedule {
        CustomSchedule {
            cron_expression: "*/5 * * * *".into(),
            data: Map::new(),
        }
    }

    fn canonical(schedule_type: ScheduleType) -> (String, Value) {
        let schedule = canonicalize(schedule_type, unused());
        assert_eq!(schedule.schedule_type(), schedule_type);
        (schedule.cron_expression(), Value::Object(schedule.schedule_data()))
    }

    #[test]
    fn fixed_types_have_documented_canonical_forms() {
        assert_eq!(
            canonical(ScheduleType::Daily),
            ("0 0 * * *".to_string(), json!({"hour": 0, "minute": 0}))
        );
        assert_eq!(
            canonical(ScheduleType::Hourly),
            ("0 * * * *".to_string(), json!({"minute": 0}))
        );
        assert_eq!(
            canonical(ScheduleType::Weekly),
            ("0 0 * * 1".to_string(), json!({"dayOfWeek": 1, "hour": 0, "minute": 0}))
        );
        assert_eq!(
            canonical(ScheduleType::Monthly),
            ("0 0 1 * *".to_string(), json!({"dayOfMonth": 1, "hour": 0, "minute": 0}))
        );
    }

    #[test]
    fn custom_passes_supplied_schedule_through() {
        let mut data = Map::new();
        data.insert("note".into(), json!("weekdays at nine"));
        let supplied = CustomSchedule {
            cron_expression: "0 9 * * 1-5".into(),
            data,
        };

        let schedule = canonicalize(ScheduleType::Custom, supplied.clone());
        assert_eq!(schedule, Schedule::Custom(supplied));
    }
}
