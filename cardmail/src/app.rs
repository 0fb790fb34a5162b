//! Application state and initialization
//!
//! This module manages the central application state and lifecycle.
//! All services are initialized here and made available through AppState.

use crate::ai::{GeminiClient, GenerativeModel};
use crate::cache::ReadCache;
use crate::config::{DATABASE_FILE, DATA_DIR_ENV, DEFAULT_DATA_DIR};
use crate::database::{create_pool, Repository};
use crate::error::Result;
use crate::feed::ChangeFeed;
use crate::services::{
    ContactsService, CredentialManager, DraftingService, FoldersService, ProfileService,
    SettingsService, SharingService,
};
use crate::storage::ImageStore;
use sqlx::SqlitePool;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Central application state holding all services
#[derive(Clone)]
pub struct AppState {
    pub app_data_dir: PathBuf,
    pub settings_service: SettingsService,
    pub contacts: ContactsService,
    pub folders: FoldersService,
    pub drafting: DraftingService,
    pub sharing: SharingService,
    pub profile: ProfileService,
    pub cache: ReadCache,
    pub feed: ChangeFeed,
}

impl AppState {
    /// Wire services over an open pool and a model
    pub async fn build(
        app_data_dir: PathBuf,
        pool: SqlitePool,
        model: Arc<dyn GenerativeModel>,
    ) -> Result<Self> {
        let repo = Repository::new(pool);
        let images = ImageStore::new(app_data_dir.join("images"));
        images.initialize().await?;

        let cache = ReadCache::new();
        let feed = ChangeFeed::new();
        let contacts = ContactsService::new(repo.clone(), images, cache.clone(), feed.clone());

        Ok(Self {
            settings_service: SettingsService::new(app_data_dir.clone()),
            folders: FoldersService::new(repo.clone(), cache.clone(), feed.clone()),
            drafting: DraftingService::new(model),
            sharing: SharingService::new(repo.clone(), contacts.clone()),
            profile: ProfileService::new(repo),
            contacts,
            cache,
            feed,
            app_data_dir,
        })
    }
}

/// Data directory from the environment, or the default
pub fn data_dir_from_env() -> PathBuf {
    std::env::var_os(DATA_DIR_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR))
}

/// Application setup - called once on startup
pub async fn initialize(app_data_dir: &Path) -> Result<AppState> {
    tracing::info!("Initializing application");
    tracing::info!("App data directory: {:?}", app_data_dir);

    std::fs::create_dir_all(app_data_dir)?;

    let settings = SettingsService::new(app_data_dir.to_path_buf())
        .load()
        .await?;

    let pool = create_pool(&app_data_dir.join(DATABASE_FILE)).await?;

    let api_key = CredentialManager::resolve_api_key();
    if api_key.is_none() {
        tracing::warn!("No AI API key configured; drafting is unavailable until one is set");
    }
    let model = GeminiClient::new(&settings.ai, api_key)?;

    let state = AppState::build(app_data_dir.to_path_buf(), pool, Arc::new(model)).await?;

    tracing::info!("Application initialized successfully");

    Ok(state)
}
