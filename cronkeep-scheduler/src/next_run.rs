use chrono::{DateTime, Local, TimeZone, Utc};
use croner::Cron;
use thiserror::Error;

/// minute, hour, day of month, month, day of week
pub const CRON_FIELD_COUNT: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScheduleError {
    #[error("invalid cron expression '{expression}': {reason}")]
    InvalidExpression { expression: String, reason: String },
    #[error("cron expression '{0}' never fires")]
    NoOccurrence(String),
}

/// The single frame of reference next-run times are computed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReferenceZone {
    #[default]
    Local,
    Utc,
}

pub fn parse_cron(expression: &str) -> Result<Cron, ScheduleError> {
    let invalid = |reason: String| ScheduleError::InvalidExpression {
        expression: expression.to_string(),
        reason,
    };

    let fields = expression.split_whitespace().count();
    if fields != CRON_FIELD_COUNT {
        return Err(invalid(format!(
            "expected {} fields, found {}",
            CRON_FIELD_COUNT, fields
        )));
    }

    Cron::new(expression)
        .parse()
        .map_err(|err| invalid(err.to_string()))
}

/// First occurrence of `expression` strictly after `from`, in `from`'s zone.
pub fn next_run_after<Tz: TimeZone>(
    expression: &str,
    from: &DateTime<Tz>,
) -> Result<DateTime<Tz>, ScheduleError> {
    let cron = parse_cron(expression)?;
    cron.find_next_occurrence(from, false)
        .map_err(|_| ScheduleError::NoOccurrence(expression.to_string()))
}

pub fn compute_next_run(
    expression: &str,
    now: DateTime<Utc>,
    zone: ReferenceZone,
) -> Result<DateTime<Utc>, ScheduleError> {
    match zone {
        ReferenceZone::Utc => next_run_after(expression, &now),
        ReferenceZone::Local => next_run_after(expression, &now.with_timezone(&Local))
            .map(|next| next.with_timezone(&Utc)),
    }
}
