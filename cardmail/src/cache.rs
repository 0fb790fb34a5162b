//! Read cache for contacts and folder lists
//!
//! One `ReadCache` is owned by `AppState` and shared by the services.
//! Every read and write of a contact records the latest copy under
//! `(user_id, contact_id)`. Single-contact lookups consult it before
//! the database. Writes that produce a fresh record replace the entry;
//! writes that remove or bulk-move records invalidate the affected keys.
//! Folder lists are cached per user and invalidated on folder
//! create/delete. Nothing expires by time.
//!
//! Changes made by other processes are not observed here; live views
//! use the change feed instead.

use crate::database::{Contact, Folder};
use dashmap::DashMap;
use std::sync::Arc;

type ContactKey = (String, String);

#[derive(Clone, Default)]
pub struct ReadCache {
    contacts: Arc<DashMap<ContactKey, Contact>>,
    folders: Arc<DashMap<String, Vec<Folder>>>,
}

impl ReadCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contact(&self, user_id: &str, contact_id: &str) -> Option<Contact> {
        self.contacts
            .get(&(user_id.to_string(), contact_id.to_string()))
            .map(|entry| entry.value().clone())
    }

    pub fn put_contact(&self, user_id: &str, contact: &Contact) {
        self.contacts
            .insert((user_id.to_string(), contact.id.clone()), contact.clone());
    }

    pub fn put_contacts(&self, user_id: &str, contacts: &[Contact]) {
        for contact in contacts {
            self.put_contact(user_id, contact);
        }
    }

    pub fn invalidate_contact(&self, user_id: &str, contact_id: &str) {
        self.contacts
            .remove(&(user_id.to_string(), contact_id.to_string()));
    }

    pub fn folders(&self, user_id: &str) -> Option<Vec<Folder>> {
        self.folders.get(user_id).map(|entry| entry.value().clone())
    }

    pub fn put_folders(&self, user_id: &str, folders: Vec<Folder>) {
        self.folders.insert(user_id.to_string(), folders);
    }

    pub fn invalidate_folders(&self, user_id: &str) {
        self.folders.remove(user_id);
    }

    /// Number of cached contacts across all users
    pub fn contact_count(&self) -> usize {
        self.contacts.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::GeneratedEmail;
    use chrono::Utc;

    fn contact(id: &str, name: &str) -> Contact {
        Contact {
            id: id.to_string(),
            folder_id: "drafts".to_string(),
            name: name.to_string(),
            company: "Acme".to_string(),
            email: "y@acme.com".to_string(),
            context: String::new(),
            generated_email: GeneratedEmail::default(),
            created_at: Utc::now(),
            deleted_at: None,
        }
    }

    #[test]
    fn test_contacts_keyed_by_user() {
        let cache = ReadCache::new();
        cache.put_contact("u1", &contact("c1", "Yamada"));

        assert_eq!(cache.contact("u1", "c1").unwrap().name, "Yamada");
        assert!(cache.contact("u2", "c1").is_none());
    }

    #[test]
    fn test_put_replaces_and_invalidate_removes() {
        let cache = ReadCache::new();
        cache.put_contact("u1", &contact("c1", "Old"));
        cache.put_contact("u1", &contact("c1", "New"));
        assert_eq!(cache.contact("u1", "c1").unwrap().name, "New");
        assert_eq!(cache.contact_count(), 1);

        cache.invalidate_contact("u1", "c1");
        assert!(cache.contact("u1", "c1").is_none());
    }

    #[test]
    fn test_folder_lists_per_user() {
        let cache = ReadCache::new();
        let folder = Folder {
            id: "f1".to_string(),
            name: "Clients".to_string(),
            created_at: Utc::now(),
        };

        cache.put_folders("u1", vec![folder]);
        assert_eq!(cache.folders("u1").unwrap().len(), 1);
        assert!(cache.folders("u2").is_none());

        cache.invalidate_folders("u1");
        assert!(cache.folders("u1").is_none());
    }

    #[test]
    fn test_clones_share_storage() {
        let cache = ReadCache::new();
        let other = cache.clone();

        other.put_contact("u1", &contact("c1", "Shared"));
        assert!(cache.contact("u1", "c1").is_some());
    }
}
