use std::{env, path::PathBuf, time::SystemTime};

use log::{LevelFilter, info};
use cronkeep_models::errors::SendableError;

#[derive(Debug, Clone)]
pub struct LoggerConfig {
    pub level: LevelFilter,
    /// Also append log lines to this file when set.
    pub file: Option<PathBuf>,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            level: LevelFilter::Info,
            file: None,
        }
    }
}

pub fn setup_logger(config: &LoggerConfig) -> Result<(), SendableError> {
    let mut dispatch = fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "[{} {} {}] {}",
                humantime::format_rfc3339_seconds(SystemTime::now()),
                record.level(),
                record.target(),
                message
            ))
        })
        .level(config.level)
        .chain(std::io::stdout());
    if let Some(path) = &config.file {
        dispatch = dispatch.chain(fern::log_file(path)?);
    }
    dispatch.apply()?;
    Ok(())
}

pub fn print_env() -> std::io::Result<()> {
    let path = env::current_dir()?;
    info!("The current directory is {}", path.display());
    Ok(())
}
