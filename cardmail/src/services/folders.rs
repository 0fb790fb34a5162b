//! Folders service
//!
//! User-defined folders. "drafts", "sent" and "trash" are virtual and
//! never stored here.

use crate::cache::ReadCache;
use crate::config::MAX_FOLDER_NAME_LENGTH;
use crate::database::{Folder, Repository};
use crate::error::{AppError, Result};
use crate::feed::ChangeFeed;

#[derive(Clone)]
pub struct FoldersService {
    repo: Repository,
    cache: ReadCache,
    feed: ChangeFeed,
}

impl FoldersService {
    pub fn new(repo: Repository, cache: ReadCache, feed: ChangeFeed) -> Self {
        Self { repo, cache, feed }
    }

    /// Folders in creation order, served from cache when present
    pub async fn list(&self, user_id: &str) -> Result<Vec<Folder>> {
        if let Some(folders) = self.cache.folders(user_id) {
            tracing::debug!("Cache hit for folders of user: {}", user_id);
            return Ok(folders);
        }

        let folders = self.repo.list_folders(user_id).await?;
        self.cache.put_folders(user_id, folders.clone());
        Ok(folders)
    }

    pub async fn create(&self, user_id: &str, name: &str) -> Result<Folder> {
        let name = validate_folder_name(name)?;

        tracing::info!("Creating folder: {}", name);
        let folder = self.repo.create_folder(user_id, name).await?;
        self.cache.invalidate_folders(user_id);

        Ok(folder)
    }

    /// Delete a folder; its contacts fall back to drafts
    pub async fn delete(&self, user_id: &str, folder_id: &str) -> Result<()> {
        tracing::info!("Deleting folder: {}", folder_id);

        let moved = self.repo.delete_folder(user_id, folder_id).await?;
        self.cache.invalidate_folders(user_id);

        for contact_id in &moved {
            self.cache.invalidate_contact(user_id, contact_id);
        }
        if !moved.is_empty() {
            self.feed.publish(user_id);
        }

        tracing::info!("Folder {} deleted, {} contact(s) moved to drafts", folder_id, moved.len());
        Ok(())
    }
}

fn validate_folder_name(name: &str) -> Result<&str> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::InvalidInput("Folder name must not be empty".to_string()));
    }
    if name.chars().count() > MAX_FOLDER_NAME_LENGTH {
        return Err(AppError::InvalidInput(format!(
            "Folder name exceeds {} characters",
            MAX_FOLDER_NAME_LENGTH
        )));
    }
    Ok(name)
}
