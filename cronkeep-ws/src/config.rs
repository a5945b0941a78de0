use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use cronkeep_scheduler::next_run::ReferenceZone;
use cronkeep_utilities::logger::LoggerConfig;
use log::LevelFilter;

#[derive(Clone, Debug, ValueEnum)]
pub(crate) enum DatabaseKind {
    Sqlite,
    Memory,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub(crate) enum TimezoneKind {
    Local,
    Utc,
}

impl From<TimezoneKind> for ReferenceZone {
    fn from(kind: TimezoneKind) -> Self {
        match kind {
            TimezoneKind::Local => ReferenceZone::Local,
            TimezoneKind::Utc => ReferenceZone::Utc,
        }
    }
}

#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
pub(crate) struct CliArgs {
    /// Webservice port to bind to, defaults to 8080
    #[arg(long, default_value_t = 8080)]
    pub port: u16,

    /// Address to bind the webservice to
    #[arg(long, default_value = "0.0.0.0")]
    pub bind: String,

    /// Task store backend to use
    #[arg(long, value_enum, default_value_t = DatabaseKind::Sqlite)]
    pub database: DatabaseKind,

    /// Path to the SQLite database file (used when --database=sqlite)
    #[arg(long, default_value = "cronkeep.db")]
    pub sqlite_path: String,

    /// Frame of reference cron expressions are evaluated in
    #[arg(long, value_enum, default_value_t = TimezoneKind::Local)]
    pub timezone: TimezoneKind,

    /// Create the sample tasks when the store is empty
    #[arg(long)]
    pub seed: bool,

    /// Minimum level written to the log
    #[arg(long, default_value = "info")]
    pub log_level: LevelFilter,

    /// Also write the log to this file
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

impl CliArgs {
    pub fn logger_config(&self) -> LoggerConfig {
        LoggerConfig {
            level: self.log_level,
            file: self.log_file.clone(),
        }
    }
}
