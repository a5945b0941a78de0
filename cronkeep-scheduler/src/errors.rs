use cronkeep_database::StoreError;
use cronkeep_models::{core::TaskId, errors::ActionError};
use thiserror::Error;

use crate::{next_run::ScheduleError, validator::ValidationError};

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    InvalidScheduleExpression(#[from] ScheduleError),
    #[error("task {0} not found")]
    NotFound(TaskId),
    #[error("task store failure: {0}")]
    Store(StoreError),
}

impl ServiceError {
    pub fn code(&self) -> &'static str {
        match self {
            ServiceError::Validation(_) => "validation_error",
            ServiceError::InvalidScheduleExpression(_) => "invalid_schedule_expression",
            ServiceError::NotFound(_) => "not_found",
            ServiceError::Store(_) => "store_error",
        }
    }
}

impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(id) => ServiceError::NotFound(id),
            other => ServiceError::Store(other),
        }
    }
}

impl From<ServiceError> for ActionError {
    fn from(err: ServiceError) -> Self {
        let message = match &err {
            // store details stay in the log
            ServiceError::Store(_) => "task store is unavailable".to_string(),
            other => other.to_string(),
        };
        ActionError::new(err.code(), message)
    }
}
