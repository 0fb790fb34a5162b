//! Contacts service
//!
//! Contact lifecycle on top of the repository:
//! save → edit/move/send → trash → restore or purge.
//!
//! Every write refreshes the read cache and publishes a change event
//! for the owning user.

use crate::cache::ReadCache;
use crate::config::{
    is_reserved_folder, DRAFTS_FOLDER, SENT_FOLDER, TRASH_FOLDER, TRASH_RETENTION_DAYS,
    UNKNOWN_COMPANY,
};
use crate::database::{Contact, ContactUpdate, FolderCount, NewContact, Repository};
use crate::error::{AppError, Result};
use crate::feed::{ChangeFeed, ContactSubscription, SubscriptionScope};
use crate::storage::{CardImage, ImageStore};
use chrono::{DateTime, Duration, Utc};

/// Service for managing contacts
#[derive(Clone)]
pub struct ContactsService {
    repo: Repository,
    images: ImageStore,
    cache: ReadCache,
    feed: ChangeFeed,
}

impl ContactsService {
    pub fn new(repo: Repository, images: ImageStore, cache: ReadCache, feed: ChangeFeed) -> Self {
        Self {
            repo,
            images,
            cache,
            feed,
        }
    }

    /// Save a new contact, storing its card image separately
    pub async fn save(&self, user_id: &str, new: NewContact) -> Result<Contact> {
        let folder_id = match new.folder_id.trim() {
            "" => DRAFTS_FOLDER.to_string(),
            id => id.to_string(),
        };
        if folder_id == TRASH_FOLDER {
            return Err(AppError::InvalidInput(
                "Contacts cannot be saved directly to trash".to_string(),
            ));
        }
        self.ensure_target_folder(user_id, &folder_id).await?;

        let company = match new.company.trim() {
            "" => UNKNOWN_COMPANY,
            company => company,
        };

        tracing::info!("Saving contact for user: {} in folder: {}", user_id, folder_id);

        let contact = self
            .repo
            .insert_contact(
                user_id,
                &folder_id,
                new.name.trim(),
                company,
                new.email.trim(),
                &new.context,
                &new.generated_email,
            )
            .await?;

        if let Some(image) = &new.image {
            if let Err(e) = self.store_image(user_id, &contact.id, image).await {
                tracing::warn!("Failed to store card image for {}: {}", contact.id, e);
            }
        }

        self.cache.put_contact(user_id, &contact);
        self.feed.publish(user_id);

        tracing::info!("Contact saved: {}", contact.id);
        Ok(contact)
    }

    async fn store_image(&self, user_id: &str, contact_id: &str, image: &CardImage) -> Result<()> {
        let bytes = image.decode()?;
        let hash = self.images.write(&bytes).await?;
        self.repo
            .put_contact_image(user_id, contact_id, &hash, &image.mime_type, bytes.len() as i64)
            .await?;
        Ok(())
    }

    /// Get a contact, consulting the cache first
    pub async fn get(&self, user_id: &str, id: &str) -> Result<Contact> {
        if let Some(contact) = self.cache.contact(user_id, id) {
            tracing::debug!("Cache hit for contact: {}", id);
            return Ok(contact);
        }

        let contact = self.repo.get_contact(user_id, id).await?;
        self.cache.put_contact(user_id, &contact);
        Ok(contact)
    }

    /// All contacts outside trash, newest first
    pub async fn list(&self, user_id: &str) -> Result<Vec<Contact>> {
        let contacts = self.repo.list_contacts(user_id).await?;
        self.cache.put_contacts(user_id, &contacts);
        Ok(contacts)
    }

    /// Contacts in one folder, newest first
    pub async fn list_in_folder(&self, user_id: &str, folder_id: &str) -> Result<Vec<Contact>> {
        let contacts = self.repo.list_contacts_in_folder(user_id, folder_id).await?;
        self.cache.put_contacts(user_id, &contacts);
        Ok(contacts)
    }

    pub async fn update(&self, user_id: &str, id: &str, update: ContactUpdate) -> Result<Contact> {
        tracing::debug!("Updating contact: {}", id);

        let contact = self.repo.update_contact(user_id, id, &update).await?;

        if !update.is_empty() {
            self.cache.put_contact(user_id, &contact);
            self.feed.publish(user_id);
        }
        Ok(contact)
    }

    /// Move a contact to drafts, sent or a user folder
    pub async fn move_to_folder(&self, user_id: &str, id: &str, folder_id: &str) -> Result<Contact> {
        if folder_id == TRASH_FOLDER {
            return Err(AppError::InvalidInput(
                "Use delete to move a contact to trash".to_string(),
            ));
        }
        self.ensure_target_folder(user_id, folder_id).await?;

        let contact = self.repo.set_contact_folder(user_id, id, folder_id).await?;
        self.cache.put_contact(user_id, &contact);
        self.feed.publish(user_id);

        tracing::info!("Moved contact {} to {}", id, folder_id);
        Ok(contact)
    }

    /// Move a contact to "sent" unless it is already there or trashed
    pub async fn mark_sent(&self, user_id: &str, id: &str) -> Result<Contact> {
        let contact = self.repo.get_contact(user_id, id).await?;
        if contact.folder_id == SENT_FOLDER || contact.is_trashed() {
            self.cache.put_contact(user_id, &contact);
            return Ok(contact);
        }
        self.move_to_folder(user_id, id, SENT_FOLDER).await
    }

    /// Soft delete: move to trash with a deletion timestamp
    pub async fn delete(&self, user_id: &str, id: &str) -> Result<Contact> {
        self.delete_at(user_id, id, Utc::now()).await
    }

    /// Soft delete with an explicit clock
    pub async fn delete_at(&self, user_id: &str, id: &str, now: DateTime<Utc>) -> Result<Contact> {
        tracing::info!("Moving contact to trash: {}", id);

        let contact = self.repo.trash_contact(user_id, id, now).await?;
        self.cache.put_contact(user_id, &contact);
        self.feed.publish(user_id);
        Ok(contact)
    }

    /// Restore a trashed contact to drafts; a no-op for other contacts
    pub async fn restore(&self, user_id: &str, id: &str) -> Result<Contact> {
        let current = self.repo.get_contact(user_id, id).await?;
        if !current.is_trashed() {
            tracing::debug!("Contact {} is not in trash, nothing to restore", id);
            self.cache.put_contact(user_id, &current);
            return Ok(current);
        }

        let contact = self.repo.restore_contact(user_id, id).await?;
        self.cache.put_contact(user_id, &contact);
        self.feed.publish(user_id);

        tracing::info!("Restored contact: {}", id);
        Ok(contact)
    }

    /// Irrecoverably remove a trashed contact and its card image
    pub async fn permanent_delete(&self, user_id: &str, id: &str) -> Result<()> {
        let contact = self.repo.get_contact(user_id, id).await?;
        if !contact.is_trashed() {
            return Err(AppError::InvalidInput(format!(
                "Contact {} must be in trash before permanent deletion",
                id
            )));
        }

        self.purge(user_id, id).await?;
        self.feed.publish(user_id);

        tracing::info!("Permanently deleted contact: {}", id);
        Ok(())
    }

    async fn purge(&self, user_id: &str, id: &str) -> Result<()> {
        let blob_hash = self.repo.delete_contact(user_id, id).await?;
        self.cache.invalidate_contact(user_id, id);

        if let Some(hash) = blob_hash {
            if self.repo.count_image_refs(&hash).await? == 0 {
                if let Err(e) = self.images.delete(&hash).await {
                    tracing::warn!("Failed to delete card image {}: {}", hash, e);
                }
            }
        }
        Ok(())
    }

    /// Purge trashed contacts deleted more than the retention window ago
    pub async fn cleanup_trash(&self, user_id: &str) -> Result<usize> {
        self.cleanup_trash_at(user_id, Utc::now()).await
    }

    /// Trash cleanup with an explicit clock
    pub async fn cleanup_trash_at(&self, user_id: &str, now: DateTime<Utc>) -> Result<usize> {
        let cutoff = now - Duration::days(TRASH_RETENTION_DAYS);
        let expired = self.repo.list_trash_before(user_id, cutoff).await?;

        if expired.is_empty() {
            return Ok(0);
        }

        for id in &expired {
            self.purge(user_id, id).await?;
        }
        self.feed.publish(user_id);

        tracing::info!(
            "Trash cleanup purged {} contact(s) for user: {}",
            expired.len(),
            user_id
        );
        Ok(expired.len())
    }

    /// The stored card image, if any; read failures yield `None`
    pub async fn get_image(&self, user_id: &str, id: &str) -> Option<CardImage> {
        match self.load_image(user_id, id).await {
            Ok(image) => image,
            Err(e) => {
                tracing::warn!("Failed to load card image for {}: {}", id, e);
                None
            }
        }
    }

    async fn load_image(&self, user_id: &str, id: &str) -> Result<Option<CardImage>> {
        let Some(record) = self.repo.get_contact_image(user_id, id).await? else {
            return Ok(None);
        };
        let bytes = self.images.read(&record.blob_hash).await?;
        Ok(Some(CardImage::from_bytes(&record.mime_type, &bytes)?))
    }

    /// Contact counts per folder
    pub async fn counts(&self, user_id: &str) -> Result<Vec<FolderCount>> {
        self.repo.count_by_folder(user_id).await
    }

    /// Live snapshots of a user's contacts
    pub fn subscribe(&self, user_id: &str, scope: SubscriptionScope) -> ContactSubscription {
        ContactSubscription::new(
            user_id,
            scope,
            self.repo.clone(),
            self.cache.clone(),
            self.feed.subscribe(),
        )
    }

    async fn ensure_target_folder(&self, user_id: &str, folder_id: &str) -> Result<()> {
        if is_reserved_folder(folder_id) || self.repo.folder_exists(user_id, folder_id).await? {
            Ok(())
        } else {
            Err(AppError::FolderNotFound(folder_id.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::{create_memory_pool, GeneratedEmail};
    use tempfile::TempDir;

    async fn create_test_service() -> (ContactsService, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let repo = Repository::new(create_memory_pool().await.unwrap());
        let images = ImageStore::new(temp_dir.path().join("images"));
        images.initialize().await.unwrap();

        let service = ContactsService::new(repo, images, ReadCache::new(), ChangeFeed::new());
        (service, temp_dir)
    }

    fn yamada() -> NewContact {
        NewContact {
            folder_id: "drafts".to_string(),
            name: "Yamada".to_string(),
            company: "Acme".to_string(),
            email: "y@acme.com".to_string(),
            context: String::new(),
            generated_email: GeneratedEmail {
                subject: "Hello".to_string(),
                body: "Nice to meet you".to_string(),
                cc: None,
                bcc: None,
            },
            image: None,
        }
    }

    #[tokio::test]
    async fn test_save_defaults() {
        let (service, _temp) = create_test_service().await;

        let contact = service
            .save(
                "u1",
                NewContact {
                    folder_id: "  ".to_string(),
                    company: String::new(),
                    ..yamada()
                },
            )
            .await
            .unwrap();

        assert_eq!(contact.folder_id, "drafts");
        assert_eq!(contact.company, "Unknown");
        assert!(contact.deleted_at.is_none());
    }

    #[tokio::test]
    async fn test_save_rejects_trash_and_unknown_folder() {
        let (service, _temp) = create_test_service().await;

        let trash = service
            .save(
                "u1",
                NewContact {
                    folder_id: "trash".to_string(),
                    ..yamada()
                },
            )
            .await;
        assert!(matches!(trash, Err(AppError::InvalidInput(_))));

        let missing = service
            .save(
                "u1",
                NewContact {
                    folder_id: "no-such-folder".to_string(),
                    ..yamada()
                },
            )
            .await;
        assert!(matches!(missing, Err(AppError::FolderNotFound(_))));
    }

    #[tokio::test]
    async fn test_delete_and_restore() {
        let (service, _temp) = create_test_service().await;
        let contact = service.save("u1", yamada()).await.unwrap();

        let trashed = service.delete("u1", &contact.id).await.unwrap();
        assert_eq!(trashed.folder_id, "trash");
        assert!(trashed.deleted_at.is_some());

        let restored = service.restore("u1", &contact.id).await.unwrap();
        assert_eq!(restored.folder_id, "drafts");
        assert!(restored.deleted_at.is_none());

        let again = service.restore("u1", &contact.id).await.unwrap();
        assert_eq!(again, restored);
    }

    #[tokio::test]
    async fn test_restore_leaves_sent_contact_alone() {
        let (service, _temp) = create_test_service().await;
        let contact = service.save("u1", yamada()).await.unwrap();
        service.mark_sent("u1", &contact.id).await.unwrap();

        let restored = service.restore("u1", &contact.id).await.unwrap();
        assert_eq!(restored.folder_id, "sent");
    }

    #[tokio::test]
    async fn test_permanent_delete_requires_trash() {
        let (service, _temp) = create_test_service().await;
        let contact = service.save("u1", yamada()).await.unwrap();

        let result = service.permanent_delete("u1", &contact.id).await;
        assert!(matches!(result, Err(AppError::InvalidInput(_))));

        service.delete("u1", &contact.id).await.unwrap();
        service.permanent_delete("u1", &contact.id).await.unwrap();

        let result = service.get("u1", &contact.id).await;
        assert!(matches!(result, Err(AppError::ContactNotFound(_))));
    }

    #[tokio::test]
    async fn test_cleanup_trash_retention_window() {
        let (service, _temp) = create_test_service().await;
        let now = Utc::now();

        let old = service.save("u1", yamada()).await.unwrap();
        let recent = service.save("u1", yamada()).await.unwrap();
        let live = service.save("u1", yamada()).await.unwrap();

        service
            .delete_at("u1", &old.id, now - Duration::days(7) - Duration::minutes(1))
            .await
            .unwrap();
        service
            .delete_at("u1", &recent.id, now - Duration::days(6))
            .await
            .unwrap();

        let purged = service.cleanup_trash_at("u1", now).await.unwrap();
        assert_eq!(purged, 1);

        let trash = service.list_in_folder("u1", "trash").await.unwrap();
        assert_eq!(trash.len(), 1);
        assert_eq!(trash[0].id, recent.id);

        assert!(service.get("u1", &live.id).await.is_ok());
        assert!(matches!(
            service.get("u1", &old.id).await,
            Err(AppError::ContactNotFound(_))
        ));

        assert_eq!(service.cleanup_trash_at("u1", now).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_image_stored_and_removed_with_contact() {
        let (service, _temp) = create_test_service().await;

        let image = CardImage::from_bytes("image/png", b"card-bytes").unwrap();
        let contact = service
            .save(
                "u1",
                NewContact {
                    image: Some(image.clone()),
                    ..yamada()
                },
            )
            .await
            .unwrap();

        assert_eq!(service.get_image("u1", &contact.id).await, Some(image));
        assert_eq!(service.get_image("u2", &contact.id).await, None);

        service.delete("u1", &contact.id).await.unwrap();
        service.permanent_delete("u1", &contact.id).await.unwrap();

        assert_eq!(service.get_image("u1", &contact.id).await, None);
        let hash = crate::storage::image_store::hash_bytes(b"card-bytes");
        assert!(!service.images.exists(&hash).await.unwrap());
    }

    #[tokio::test]
    async fn test_bad_image_does_not_fail_save() {
        let (service, _temp) = create_test_service().await;

        let contact = service
            .save(
                "u1",
                NewContact {
                    image: Some(CardImage {
                        mime_type: "image/png".to_string(),
                        data: "%%%not-base64".to_string(),
                    }),
                    ..yamada()
                },
            )
            .await
            .unwrap();

        assert_eq!(service.get_image("u1", &contact.id).await, None);
    }

    #[tokio::test]
    async fn test_move_rules() {
        let (service, _temp) = create_test_service().await;
        let contact = service.save("u1", yamada()).await.unwrap();

        let result = service.move_to_folder("u1", &contact.id, "trash").await;
        assert!(matches!(result, Err(AppError::InvalidInput(_))));

        let result = service.move_to_folder("u1", &contact.id, "missing").await;
        assert!(matches!(result, Err(AppError::FolderNotFound(_))));

        let folder = service.repo.create_folder("u1", "Tokyo Expo").await.unwrap();
        let moved = service
            .move_to_folder("u1", &contact.id, &folder.id)
            .await
            .unwrap();
        assert_eq!(moved.folder_id, folder.id);
    }

    #[tokio::test]
    async fn test_mark_sent_skips_trash() {
        let (service, _temp) = create_test_service().await;
        let contact = service.save("u1", yamada()).await.unwrap();
        service.delete("u1", &contact.id).await.unwrap();

        let result = service.mark_sent("u1", &contact.id).await.unwrap();
        assert_eq!(result.folder_id, "trash");
    }

    #[tokio::test]
    async fn test_get_uses_cache_and_updates_refresh_it() {
        let (service, _temp) = create_test_service().await;
        let contact = service.save("u1", yamada()).await.unwrap();

        assert_eq!(service.cache.contact("u1", &contact.id), Some(contact.clone()));
        assert!(service.cache.contact("u2", &contact.id).is_none());

        let updated = service
            .update(
                "u1",
                &contact.id,
                ContactUpdate {
                    subject: Some("Follow-up".to_string()),
                    ..ContactUpdate::default()
                },
            )
            .await
            .unwrap();

        let cached = service.get("u1", &contact.id).await.unwrap();
        assert_eq!(cached, updated);
        assert_eq!(cached.generated_email.subject, "Follow-up");
    }

    #[tokio::test]
    async fn test_list_excludes_trash_and_counts() {
        let (service, _temp) = create_test_service().await;
        let a = service.save("u1", yamada()).await.unwrap();
        service.save("u1", yamada()).await.unwrap();
        service.delete("u1", &a.id).await.unwrap();

        assert_eq!(service.list("u1").await.unwrap().len(), 1);

        let counts = service.counts("u1").await.unwrap();
        assert_eq!(
            counts,
            vec![
                FolderCount {
                    folder_id: "drafts".to_string(),
                    count: 1
                },
                FolderCount {
                    folder_id: "trash".to_string(),
                    count: 1
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_subscription_sees_writes() {
        let (service, _temp) = create_test_service().await;
        let mut subscription = service.subscribe("u1", SubscriptionScope::All);

        let first = subscription.next().await.unwrap().unwrap();
        assert!(first.is_empty());

        service.save("u1", yamada()).await.unwrap();
        let second = subscription.next().await.unwrap().unwrap();
        assert_eq!(second.len(), 1);
        assert_eq!(second[0].name, "Yamada");
    }
}
