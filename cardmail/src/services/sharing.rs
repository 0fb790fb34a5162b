//! Public share links
//!
//! Sharing stores an immutable snapshot of a contact. Later edits to
//! the contact are not visible through the link.

use crate::database::{Repository, SharedItem};
use crate::error::{AppError, Result};
use crate::services::contacts::ContactsService;
use chrono::{Duration, Utc};
use serde::Serialize;

/// A created share and its public URL
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShareLink {
    pub item: SharedItem,
    pub url: String,
}

#[derive(Clone)]
pub struct SharingService {
    repo: Repository,
    contacts: ContactsService,
}

impl SharingService {
    pub fn new(repo: Repository, contacts: ContactsService) -> Self {
        Self { repo, contacts }
    }

    /// Snapshot a contact; `ttl_days` of `None` never expires
    pub async fn share(
        &self,
        user_id: &str,
        contact_id: &str,
        base_url: &str,
        ttl_days: Option<u32>,
    ) -> Result<ShareLink> {
        if ttl_days == Some(0) {
            return Err(AppError::InvalidInput("Share lifetime must be at least one day".to_string()));
        }

        let contact = self.contacts.get(user_id, contact_id).await?;
        if contact.is_trashed() {
            return Err(AppError::InvalidInput(format!(
                "Contact {} is in trash and cannot be shared",
                contact_id
            )));
        }

        let expires_at = ttl_days.map(|days| Utc::now() + Duration::days(i64::from(days)));
        let item = self.repo.create_shared_item(user_id, &contact, expires_at).await?;
        let url = share_url(base_url, &item.id);

        tracing::info!("Shared contact {} as {}", contact_id, item.id);
        Ok(ShareLink { item, url })
    }

    /// Resolve a public share; expired shares are not found
    pub async fn get_shared(&self, id: &str) -> Result<SharedItem> {
        let item = self.repo.get_shared_item(id).await?;

        if item.is_expired(Utc::now()) {
            tracing::debug!("Shared item expired: {}", id);
            return Err(AppError::SharedItemNotFound(id.to_string()));
        }
        Ok(item)
    }
}

fn share_url(base_url: &str, id: &str) -> String {
    format!("{}/share/{}", base_url.trim_end_matches('/'), id)
}
