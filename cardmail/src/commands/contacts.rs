//! Contact commands
//!
//! Save, edit, move, send and the trash lifecycle.

use crate::app::AppState;
use crate::config::TRASH_FOLDER;
use crate::database::{Contact, ContactUpdate, FolderCount, NewContact};
use crate::error::Result;
use crate::mailto;
use serde::Serialize;

/// Save a new contact
pub async fn save_contact(state: &AppState, user_id: String, contact: NewContact) -> Result<Contact> {
    state.contacts.save(&user_id, contact).await
}

/// Get a contact by ID
pub async fn get_contact(state: &AppState, user_id: String, id: String) -> Result<Contact> {
    state.contacts.get(&user_id, &id).await
}

/// List contacts, optionally limited to one folder.
///
/// Opening the trash purges expired contacts first.
pub async fn list_contacts(
    state: &AppState,
    user_id: String,
    folder_id: Option<String>,
) -> Result<Vec<Contact>> {
    match folder_id.as_deref() {
        None => state.contacts.list(&user_id).await,
        Some(folder_id) => {
            if folder_id == TRASH_FOLDER {
                if let Err(e) = state.contacts.cleanup_trash(&user_id).await {
                    tracing::warn!("Trash cleanup failed: {}", e);
                }
            }
            state.contacts.list_in_folder(&user_id, folder_id).await
        }
    }
}

/// Update contact fields or the drafted email
pub async fn update_contact(
    state: &AppState,
    user_id: String,
    id: String,
    update: ContactUpdate,
) -> Result<Contact> {
    state.contacts.update(&user_id, &id, update).await
}

/// Move a contact to another folder
pub async fn move_contact(
    state: &AppState,
    user_id: String,
    id: String,
    folder_id: String,
) -> Result<Contact> {
    state.contacts.move_to_folder(&user_id, &id, &folder_id).await
}

/// Soft delete a contact (move to trash)
pub async fn delete_contact(state: &AppState, user_id: String, id: String) -> Result<Contact> {
    state.contacts.delete(&user_id, &id).await
}

/// Restore a contact from trash to drafts
pub async fn restore_contact(state: &AppState, user_id: String, id: String) -> Result<Contact> {
    state.contacts.restore(&user_id, &id).await
}

/// Permanently delete a trashed contact
pub async fn permanent_delete_contact(state: &AppState, user_id: String, id: String) -> Result<()> {
    state.contacts.permanent_delete(&user_id, &id).await
}

/// Purge expired trash; returns the number of contacts removed
pub async fn cleanup_trash(state: &AppState, user_id: String) -> Result<usize> {
    state.contacts.cleanup_trash(&user_id).await
}

/// Card image as a data URL
pub async fn get_contact_image(
    state: &AppState,
    user_id: String,
    id: String,
) -> Result<Option<String>> {
    Ok(state
        .contacts
        .get_image(&user_id, &id)
        .await
        .map(|image| image.to_data_url()))
}

pub async fn folder_counts(state: &AppState, user_id: String) -> Result<Vec<FolderCount>> {
    state.contacts.counts(&user_id).await
}

/// Mail handoff result
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SendResult {
    pub mailto: String,
    pub contact: Contact,
}

/// Build the `mailto:` link for a contact and file it under "sent"
pub async fn send_contact(state: &AppState, user_id: String, id: String) -> Result<SendResult> {
    let contact = state.contacts.get(&user_id, &id).await?;
    let mailto = mailto::for_contact(&contact);

    let contact = state.contacts.mark_sent(&user_id, &id).await?;
    tracing::info!("Handed contact {} to the mail client", id);

    Ok(SendResult { mailto, contact })
}
