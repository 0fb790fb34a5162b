//! Share link commands

use crate::app::AppState;
use crate::database::SharedItem;
use crate::error::Result;
use crate::services::ShareLink;

/// Create a public snapshot link for a contact.
///
/// Without `ttl_days` the configured default lifetime applies.
pub async fn share_contact(
    state: &AppState,
    user_id: String,
    id: String,
    ttl_days: Option<u32>,
) -> Result<ShareLink> {
    let settings = state.settings_service.load().await?;
    let ttl_days = ttl_days.or(settings.share.default_ttl_days);

    state
        .sharing
        .share(&user_id, &id, &settings.share.base_url, ttl_days)
        .await
}

/// Resolve a public share (read-only)
pub async fn get_shared_item(state: &AppState, id: String) -> Result<SharedItem> {
    state.sharing.get_shared(&id).await
}
