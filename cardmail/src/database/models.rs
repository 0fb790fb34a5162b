//! Database models
//!
//! Rust structs representing stored documents.
//! All models use serde (camelCase) for serialization to the frontend.

use crate::config::{DRAFTS_FOLDER, TRASH_FOLDER};
use crate::storage::CardImage;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// The drafted message attached to a contact
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct GeneratedEmail {
    pub subject: String,
    pub body: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cc: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bcc: Option<String>,
}

/// A contact captured from a business card, with its drafted email
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Contact {
    pub id: String,
    /// User folder id, or one of "drafts", "sent", "trash"
    pub folder_id: String,
    pub name: String,
    pub company: String,
    pub email: String,
    /// Free-form notes about the meeting, often a voice transcript
    pub context: String,
    #[sqlx(flatten)]
    pub generated_email: GeneratedEmail,
    pub created_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Contact {
    pub fn is_trashed(&self) -> bool {
        self.folder_id == TRASH_FOLDER
    }
}

/// User-defined folder
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Folder {
    pub id: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// Public read-only snapshot of a contact
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SharedItem {
    pub id: String,
    pub owner_id: String,
    pub original_contact_id: String,
    pub data: Contact,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}

impl SharedItem {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.map(|at| at <= now).unwrap_or(false)
    }
}

/// Row shape of `shared_items`; the snapshot is stored as JSON text
#[derive(Debug, FromRow)]
pub(crate) struct SharedItemRow {
    pub id: String,
    pub owner_id: String,
    pub original_contact_id: String,
    pub data_json: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl TryFrom<SharedItemRow> for SharedItem {
    type Error = serde_json::Error;

    fn try_from(row: SharedItemRow) -> Result<Self, Self::Error> {
        Ok(SharedItem {
            id: row.id,
            owner_id: row.owner_id,
            original_contact_id: row.original_contact_id,
            data: serde_json::from_str(&row.data_json)?,
            created_at: row.created_at,
            expires_at: row.expires_at,
        })
    }
}

/// Metadata for the card photo kept alongside a contact
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ContactImage {
    pub contact_id: String,
    /// SHA-256 hash of the image bytes in the image store
    pub blob_hash: String,
    pub mime_type: String,
    pub size: i64,
    pub created_at: DateTime<Utc>,
}

fn default_folder() -> String {
    DRAFTS_FOLDER.to_string()
}

/// Save contact request
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewContact {
    #[serde(default = "default_folder")]
    pub folder_id: String,
    pub name: String,
    #[serde(default)]
    pub company: String,
    pub email: String,
    #[serde(default)]
    pub context: String,
    #[serde(default)]
    pub generated_email: GeneratedEmail,
    /// Original card photo, stored separately from the contact document
    #[serde(default)]
    pub image: Option<CardImage>,
}

/// Partial contact update; `None` leaves a field unchanged
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactUpdate {
    pub name: Option<String>,
    pub company: Option<String>,
    pub email: Option<String>,
    pub context: Option<String>,
    pub subject: Option<String>,
    pub body: Option<String>,
    pub cc: Option<String>,
    pub bcc: Option<String>,
}

impl ContactUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.company.is_none()
            && self.email.is_none()
            && self.context.is_none()
            && self.subject.is_none()
            && self.body.is_none()
            && self.cc.is_none()
            && self.bcc.is_none()
    }
}

/// Number of contacts in one folder
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct FolderCount {
    pub folder_id: String,
    pub count: i64,
}
