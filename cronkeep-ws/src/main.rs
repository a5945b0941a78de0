mod config;

use std::{net::SocketAddr, sync::Arc};

use clap::Parser;
use cronkeep_database::{
    initialize_database, interfaces::TaskStore, memory::InMemoryDb, sqlite::SqliteDb,
};
use cronkeep_models::errors::SendableError;
use cronkeep_scheduler::{TaskService, clock::SystemClock, seed::seed_sample_tasks};
use log::info;
use tokio::sync::Notify;

use cronkeep_utilities::startup;
use cronkeep_ws::run_webserver;

use crate::config::{CliArgs, DatabaseKind};

#[tokio::main]
async fn main() -> Result<(), SendableError> {
    let args = CliArgs::parse();
    startup::startup("Cronkeep Web Service", &args.logger_config())?;

    let notify = Arc::new(Notify::new());
    let shutdown_listener = notify.clone();
    tokio::spawn(async move {
        if let Err(err) = tokio::signal::ctrl_c().await {
            log::error!("Failed to listen for shutdown signal: {}", err);
            return;
        }
        info!("Shutdown signal received, stopping web server...");
        shutdown_listener.notify_waiters();
    });

    let addr: SocketAddr = format!("{}:{}", args.bind, args.port).parse()?;

    match args.database {
        DatabaseKind::Sqlite => {
            info!(
                "Starting Cronkeep webservice with SQLite database at {}",
                args.sqlite_path
            );
            let db = Arc::new(SqliteDb::new(&args.sqlite_path).await?);
            serve(db, &args, addr, notify).await?;
        }
        DatabaseKind::Memory => {
            info!("Starting Cronkeep webservice with an in-memory store");
            serve(Arc::new(InMemoryDb::new()), &args, addr, notify).await?;
        }
    }

    info!("Web service shutdown complete.");
    Ok(())
}

async fn serve<S: TaskStore>(
    store: Arc<S>,
    args: &CliArgs,
    addr: SocketAddr,
    notify: Arc<Notify>,
) -> Result<(), SendableError> {
    initialize_database(&store).await?;
    let service = TaskService::new(store, Arc::new(SystemClock), args.timezone.into());

    if args.seed {
        seed_sample_tasks(&service).await?;
    }

    run_webserver(service, addr, notify).await?;
    Ok(())
}
