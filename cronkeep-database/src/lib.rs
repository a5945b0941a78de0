use std::sync::Arc;

use interfaces::TaskStore;
use log::info;

mod errors;
pub mod interfaces;
mod mappers;
pub mod memory;
pub mod sqlite;


pub use errors::StoreError;

pub async fn initialize_database(store: &Arc<impl TaskStore>) -> Result<(), StoreError> {
    info!("Initializing task store schema");
    store.initialize().await?;
    Ok(())
}
