//! Settings-related commands
//!
//! Application settings, the user signature and the AI API key.

use crate::app::AppState;
use crate::error::Result;
use crate::services::settings::{AiSettings, DraftingSettings, ShareSettings};
use crate::services::{AppSettings, CredentialManager};

// ===== Application Settings =====

pub async fn get_settings(state: &AppState) -> Result<AppSettings> {
    state.settings_service.load().await
}

/// Update AI settings
/// Note: takes effect on the next start
pub async fn update_ai_settings(state: &AppState, ai: AiSettings) -> Result<AppSettings> {
    let settings = state.settings_service.update_ai(ai).await?;
    tracing::warn!("AI settings updated. Restart required for changes to take effect.");
    Ok(settings)
}

pub async fn update_share_settings(state: &AppState, share: ShareSettings) -> Result<AppSettings> {
    state.settings_service.update_share(share).await
}

pub async fn update_drafting_settings(
    state: &AppState,
    drafting: DraftingSettings,
) -> Result<AppSettings> {
    state.settings_service.update_drafting(drafting).await
}

// ===== Signature =====

pub async fn get_signature(state: &AppState, user_id: String) -> Result<String> {
    state.profile.get_signature(&user_id).await
}

pub async fn save_signature(state: &AppState, user_id: String, signature: String) -> Result<()> {
    state.profile.save_signature(&user_id, &signature).await
}

// ===== API Key =====

/// Store the AI API key in the credential manager
/// Note: takes effect on the next start
pub async fn set_api_key(key: String) -> Result<()> {
    CredentialManager::store_api_key(&key)
}

pub async fn delete_api_key() -> Result<()> {
    CredentialManager::delete_api_key()
}

/// Whether a key is available from the environment or the credential manager
pub async fn has_api_key() -> Result<bool> {
    Ok(CredentialManager::resolve_api_key().is_some())
}
