//! Application state and initialization
//!
//! This module manages the central application state and lifecycle.
//! All services are initialized here and made available through AppState.

use crate::config::Config;
use crate::database::{create_pool, Repository};
use crate::error::Result;
use crate::services::UsersService;
use crate::storage::DiskBlobStore;
use std::sync::Arc;

/// Central application state holding all services
#[derive(Clone)]
pub struct AppState {
    pub users_service: UsersService,
}

impl AppState {
    pub fn new(users_service: UsersService) -> Self {
        Self { users_service }
    }
}

/// Application setup - called once on startup
pub async fn setup(config: &Config) -> Result<AppState> {
    tracing::info!("Initializing application");
    tracing::info!("Data directory: {:?}", config.data_dir);

    std::fs::create_dir_all(&config.data_dir)?;

    let pool = create_pool(&config.database_path()).await?;
    let repo = Repository::new(pool);

    let blob_store = DiskBlobStore::new(config.public_disk_path());
    blob_store.initialize().await?;

    let users_service = UsersService::new(Arc::new(repo), Arc::new(blob_store));
    let state = AppState::new(users_service);

    tracing::info!("Application initialized successfully");

    Ok(state)
}
