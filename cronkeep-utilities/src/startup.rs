use log::info;

use crate::logger::{self, LoggerConfig, print_env};
use cronkeep_models::errors::SendableError;

pub fn startup(name: &str, logger_config: &LoggerConfig) -> Result<(), SendableError> {
    logger::setup_logger(logger_config)?;
    log_panics::init();

    info!("--- {} ---", name);
    print_env()?;

    Ok(())
}
