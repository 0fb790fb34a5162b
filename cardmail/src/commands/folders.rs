//! Folder commands

use crate::app::AppState;
use crate::database::Folder;
use crate::error::Result;

/// List user-defined folders
pub async fn list_folders(state: &AppState, user_id: String) -> Result<Vec<Folder>> {
    state.folders.list(&user_id).await
}

/// Create a folder
pub async fn create_folder(state: &AppState, user_id: String, name: String) -> Result<Folder> {
    let folder = state.folders.create(&user_id, &name).await?;
    tracing::info!("Folder created: {}", folder.id);
    Ok(folder)
}

/// Delete a folder; its contacts move to drafts
pub async fn delete_folder(state: &AppState, user_id: String, folder_id: String) -> Result<()> {
    state.folders.delete(&user_id, &folder_id).await
}
