//! Repository layer for database operations
//!
//! Per-user CRUD for folders, contacts and card images, plus the
//! root-level shared item snapshots. Every contact and folder query
//! is scoped by `user_id`.

use super::models::*;
use crate::config::{DRAFTS_FOLDER, TRASH_FOLDER};
use crate::error::{AppError, Result};
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use uuid::Uuid;

/// Repository for database operations
#[derive(Clone)]
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    // ===== Folders =====

    /// Create a folder for a user
    pub async fn create_folder(&self, user_id: &str, name: &str) -> Result<Folder> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now();

        let folder = sqlx::query_as::<_, Folder>(
            r#"
            INSERT INTO folders (id, user_id, name, created_at)
            VALUES (?, ?, ?, ?)
            RETURNING id, name, created_at
            "#,
        )
        .bind(&id)
        .bind(user_id)
        .bind(name)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        tracing::debug!("Created folder: {} for user: {}", id, user_id);
        Ok(folder)
    }

    /// List a user's folders, oldest first
    pub async fn list_folders(&self, user_id: &str) -> Result<Vec<Folder>> {
        let folders = sqlx::query_as::<_, Folder>(
            r#"
            SELECT id, name, created_at FROM folders
            WHERE user_id = ?
            ORDER BY created_at ASC, rowid ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(folders)
    }

    /// Whether a user folder exists
    pub async fn folder_exists(&self, user_id: &str, folder_id: &str) -> Result<bool> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM folders WHERE id = ? AND user_id = ?")
                .bind(folder_id)
                .bind(user_id)
                .fetch_one(&self.pool)
                .await?;

        Ok(count > 0)
    }

    /// Delete a folder and move its contacts to drafts.
    ///
    /// Returns the ids of the contacts that were moved.
    pub async fn delete_folder(&self, user_id: &str, folder_id: &str) -> Result<Vec<String>> {
        let mut tx = self.pool.begin().await?;

        let moved: Vec<String> =
            sqlx::query_scalar("SELECT id FROM contacts WHERE user_id = ? AND folder_id = ?")
                .bind(user_id)
                .bind(folder_id)
                .fetch_all(&mut *tx)
                .await?;

        sqlx::query("UPDATE contacts SET folder_id = ? WHERE user_id = ? AND folder_id = ?")
            .bind(DRAFTS_FOLDER)
            .bind(user_id)
            .bind(folder_id)
            .execute(&mut *tx)
            .await?;

        let rows = sqlx::query("DELETE FROM folders WHERE id = ? AND user_id = ?")
            .bind(folder_id)
            .bind(user_id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        if rows == 0 {
            return Err(AppError::FolderNotFound(folder_id.to_string()));
        }

        tx.commit().await?;

        tracing::debug!(
            "Deleted folder: {} (moved {} contacts to drafts)",
            folder_id,
            moved.len()
        );
        Ok(moved)
    }

    // ===== Contacts =====

    /// Insert a contact
    #[allow(clippy::too_many_arguments)]
    pub async fn insert_contact(
        &self,
        user_id: &str,
        folder_id: &str,
        name: &str,
        company: &str,
        email: &str,
        context: &str,
        generated: &GeneratedEmail,
    ) -> Result<Contact> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now();

        let contact = sqlx::query_as::<_, Contact>(
            r#"
            INSERT INTO contacts
                (id, user_id, folder_id, name, company, email, context,
                 subject, body, cc, bcc, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(&id)
        .bind(user_id)
        .bind(folder_id)
        .bind(name)
        .bind(company)
        .bind(email)
        .bind(context)
        .bind(&generated.subject)
        .bind(&generated.body)
        .bind(&generated.cc)
        .bind(&generated.bcc)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        tracing::debug!("Created contact: {} for user: {}", id, user_id);
        Ok(contact)
    }

    /// Get a contact by ID, including trashed contacts
    pub async fn get_contact(&self, user_id: &str, id: &str) -> Result<Contact> {
        sqlx::query_as::<_, Contact>("SELECT * FROM contacts WHERE id = ? AND user_id = ?")
            .bind(id)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::ContactNotFound(id.to_string()))
    }

    /// List all non-trashed contacts, newest first
    pub async fn list_contacts(&self, user_id: &str) -> Result<Vec<Contact>> {
        let contacts = sqlx::query_as::<_, Contact>(
            r#"
            SELECT * FROM contacts
            WHERE user_id = ? AND folder_id != ?
            ORDER BY created_at DESC, rowid DESC
            "#,
        )
        .bind(user_id)
        .bind(TRASH_FOLDER)
        .fetch_all(&self.pool)
        .await?;

        Ok(contacts)
    }

    /// List contacts in one folder (user or virtual), newest first
    pub async fn list_contacts_in_folder(
        &self,
        user_id: &str,
        folder_id: &str,
    ) -> Result<Vec<Contact>> {
        let contacts = sqlx::query_as::<_, Contact>(
            r#"
            SELECT * FROM contacts
            WHERE user_id = ? AND folder_id = ?
            ORDER BY created_at DESC, rowid DESC
            "#,
        )
        .bind(user_id)
        .bind(folder_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(contacts)
    }

    /// Apply a partial update to a contact
    pub async fn update_contact(
        &self,
        user_id: &str,
        id: &str,
        update: &ContactUpdate,
    ) -> Result<Contact> {
        let fields: [(&str, &Option<String>); 8] = [
            ("name", &update.name),
            ("company", &update.company),
            ("email", &update.email),
            ("context", &update.context),
            ("subject", &update.subject),
            ("body", &update.body),
            ("cc", &update.cc),
            ("bcc", &update.bcc),
        ];

        let mut assignments = Vec::new();
        let mut params: Vec<&str> = Vec::new();

        for (column, value) in fields.iter() {
            if let Some(value) = value {
                assignments.push(format!("{} = ?", column));
                params.push(value.as_str());
            }
        }

        if assignments.is_empty() {
            return self.get_contact(user_id, id).await;
        }

        let query = format!(
            "UPDATE contacts SET {} WHERE id = ? AND user_id = ? RETURNING *",
            assignments.join(", ")
        );

        let mut q = sqlx::query_as::<_, Contact>(&query);
        for param in &params {
            q = q.bind(*param);
        }

        q.bind(id)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::ContactNotFound(id.to_string()))
    }

    /// Move a contact to a folder, clearing any deletion mark
    pub async fn set_contact_folder(
        &self,
        user_id: &str,
        id: &str,
        folder_id: &str,
    ) -> Result<Contact> {
        let contact = sqlx::query_as::<_, Contact>(
            r#"
            UPDATE contacts SET folder_id = ?, deleted_at = NULL
            WHERE id = ? AND user_id = ?
            RETURNING *
            "#,
        )
        .bind(folder_id)
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::ContactNotFound(id.to_string()))?;

        tracing::debug!("Moved contact: {} to folder: {}", id, folder_id);
        Ok(contact)
    }

    /// Soft delete: move a contact to trash and stamp the deletion time
    pub async fn trash_contact(
        &self,
        user_id: &str,
        id: &str,
        deleted_at: DateTime<Utc>,
    ) -> Result<Contact> {
        let contact = sqlx::query_as::<_, Contact>(
            r#"
            UPDATE contacts SET folder_id = ?, deleted_at = ?
            WHERE id = ? AND user_id = ?
            RETURNING *
            "#,
        )
        .bind(TRASH_FOLDER)
        .bind(deleted_at)
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::ContactNotFound(id.to_string()))?;

        tracing::debug!("Soft deleted contact: {}", id);
        Ok(contact)
    }

    /// Restore a trashed contact to drafts
    pub async fn restore_contact(&self, user_id: &str, id: &str) -> Result<Contact> {
        let contact = sqlx::query_as::<_, Contact>(
            r#"
            UPDATE contacts SET folder_id = ?, deleted_at = NULL
            WHERE id = ? AND user_id = ? AND folder_id = ?
            RETURNING *
            "#,
        )
        .bind(DRAFTS_FOLDER)
        .bind(id)
        .bind(user_id)
        .bind(TRASH_FOLDER)
        .fetch_optional(&self.pool)
        .await?;

        match contact {
            Some(contact) => {
                tracing::debug!("Restored contact: {}", id);
                Ok(contact)
            }
            // Not in trash: leave it untouched
            None => self.get_contact(user_id, id).await,
        }
    }

    /// Permanently delete a contact and its image record.
    ///
    /// Returns the blob hash of the removed image, if there was one.
    pub async fn delete_contact(&self, user_id: &str, id: &str) -> Result<Option<String>> {
        let mut tx = self.pool.begin().await?;

        let blob_hash: Option<String> = sqlx::query_scalar(
            "SELECT blob_hash FROM contact_images WHERE contact_id = ? AND user_id = ?",
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM contact_images WHERE contact_id = ? AND user_id = ?")
            .bind(id)
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        let rows = sqlx::query("DELETE FROM contacts WHERE id = ? AND user_id = ?")
            .bind(id)
            .bind(user_id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        if rows == 0 {
            return Err(AppError::ContactNotFound(id.to_string()));
        }

        tx.commit().await?;

        tracing::debug!("Hard deleted contact: {}", id);
        Ok(blob_hash)
    }

    /// Ids of trashed contacts deleted strictly before `cutoff`
    pub async fn list_trash_before(
        &self,
        user_id: &str,
        cutoff: DateTime<Utc>,
    ) -> Result<Vec<String>> {
        let ids = sqlx::query_scalar::<_, String>(
            r#"
            SELECT id FROM contacts
            WHERE user_id = ? AND folder_id = ?
              AND deleted_at IS NOT NULL AND deleted_at < ?
            "#,
        )
        .bind(user_id)
        .bind(TRASH_FOLDER)
        .bind(cutoff)
        .fetch_all(&self.pool)
        .await?;

        Ok(ids)
    }

    /// Contact counts grouped by folder
    pub async fn count_by_folder(&self, user_id: &str) -> Result<Vec<FolderCount>> {
        let counts = sqlx::query_as::<_, FolderCount>(
            r#"
            SELECT folder_id, COUNT(*) AS count FROM contacts
            WHERE user_id = ?
            GROUP BY folder_id
            ORDER BY folder_id
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(counts)
    }

    // ===== Card images =====

    /// Record (or replace) the card image for a contact
    pub async fn put_contact_image(
        &self,
        user_id: &str,
        contact_id: &str,
        blob_hash: &str,
        mime_type: &str,
        size: i64,
    ) -> Result<ContactImage> {
        let now = Utc::now();

        let image = sqlx::query_as::<_, ContactImage>(
            r#"
            INSERT INTO contact_images (contact_id, user_id, blob_hash, mime_type, size, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            ON CONFLICT(contact_id) DO UPDATE SET
                blob_hash = excluded.blob_hash,
                mime_type = excluded.mime_type,
                size = excluded.size,
                created_at = excluded.created_at
            RETURNING contact_id, blob_hash, mime_type, size, created_at
            "#,
        )
        .bind(contact_id)
        .bind(user_id)
        .bind(blob_hash)
        .bind(mime_type)
        .bind(size)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        tracing::debug!("Stored image record for contact: {}", contact_id);
        Ok(image)
    }

    /// Card image record for a contact
    pub async fn get_contact_image(
        &self,
        user_id: &str,
        contact_id: &str,
    ) -> Result<Option<ContactImage>> {
        let image = sqlx::query_as::<_, ContactImage>(
            r#"
            SELECT contact_id, blob_hash, mime_type, size, created_at
            FROM contact_images WHERE contact_id = ? AND user_id = ?
            "#,
        )
        .bind(contact_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(image)
    }

    /// Number of image records pointing at a blob
    pub async fn count_image_refs(&self, blob_hash: &str) -> Result<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM contact_images WHERE blob_hash = ?")
                .bind(blob_hash)
                .fetch_one(&self.pool)
                .await?;

        Ok(count)
    }

    // ===== Shared items =====

    /// Store an immutable snapshot of a contact
    pub async fn create_shared_item(
        &self,
        owner_id: &str,
        contact: &Contact,
        expires_at: Option<DateTime<Utc>>,
    ) -> Result<SharedItem> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now();
        let data_json = serde_json::to_string(contact)?;

        let row = sqlx::query_as::<_, SharedItemRow>(
            r#"
            INSERT INTO shared_items (id, owner_id, original_contact_id, data_json, created_at, expires_at)
            VALUES (?, ?, ?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(&id)
        .bind(owner_id)
        .bind(&contact.id)
        .bind(&data_json)
        .bind(now)
        .bind(expires_at)
        .fetch_one(&self.pool)
        .await?;

        tracing::debug!("Created shared item: {} for contact: {}", id, contact.id);
        Ok(SharedItem::try_from(row)?)
    }

    /// Resolve a shared item by its public id
    pub async fn get_shared_item(&self, id: &str) -> Result<SharedItem> {
        let row = sqlx::query_as::<_, SharedItemRow>("SELECT * FROM shared_items WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::SharedItemNotFound(id.to_string()))?;

        Ok(SharedItem::try_from(row)?)
    }

    // ===== User settings =====

    pub async fn get_user_setting(&self, user_id: &str, key: &str) -> Result<Option<String>> {
        let value: Option<String> =
            sqlx::query_scalar("SELECT value FROM user_settings WHERE user_id = ? AND key = ?")
                .bind(user_id)
                .bind(key)
                .fetch_optional(&self.pool)
                .await?;

        Ok(value)
    }

    pub async fn set_user_setting(&self, user_id: &str, key: &str, value: &str) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO user_settings (user_id, key, value) VALUES (?, ?, ?)
            ON CONFLICT(user_id, key) DO UPDATE SET value = excluded.value
            "#,
        )
        .bind(user_id)
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await?;

        tracing::debug!("Set user setting: {} for user: {}", key, user_id);
        Ok(())
    }
}
