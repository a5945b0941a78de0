pub mod clock;
mod errors;
pub mod next_run;
pub mod schedule;
pub mod seed;
pub mod service;
pub mod validator;

pub use errors::ServiceError;
pub use service::TaskService;
