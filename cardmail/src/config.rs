//! Application configuration constants
//!
//! Central location for reserved folder ids, retention windows,
//! AI service defaults and validation boundaries.

// ===== Reserved Folders =====

/// Default folder for new and restored contacts
pub const DRAFTS_FOLDER: &str = "drafts";
/// Folder for contacts whose email has been handed to the mail client
pub const SENT_FOLDER: &str = "sent";
/// Lifecycle state for soft-deleted contacts
pub const TRASH_FOLDER: &str = "trash";

/// Folder ids that are never persisted as folder records
pub const RESERVED_FOLDERS: &[&str] = &[DRAFTS_FOLDER, SENT_FOLDER, TRASH_FOLDER];

/// Whether a folder id is one of the virtual folders
pub fn is_reserved_folder(id: &str) -> bool {
    RESERVED_FOLDERS.contains(&id)
}

// ===== Trash =====

/// Days a trashed contact is kept before cleanup purges it
pub const TRASH_RETENTION_DAYS: i64 = 7;

// ===== Contacts =====

/// Company recorded when a contact is saved without one
pub const UNKNOWN_COMPANY: &str = "Unknown";

/// Maximum folder name length in characters
pub const MAX_FOLDER_NAME_LENGTH: usize = 100;

/// Maximum length of the free-form context passed to the drafting prompt
pub const MAX_CONTEXT_LENGTH: usize = 4_000;

/// Maximum length of a refine instruction
pub const MAX_INSTRUCTION_LENGTH: usize = 1_000;

/// Maximum decoded card image size (10 MiB)
pub const MAX_IMAGE_BYTES: usize = 10 * 1024 * 1024;

/// MIME type assumed when an image arrives as bare base64
pub const DEFAULT_IMAGE_MIME: &str = "image/jpeg";

// ===== AI Service =====

/// Default generative model
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";

/// Default REST endpoint for the generative-AI service
pub const DEFAULT_AI_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Default per-request timeout in seconds
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;

/// Environment variable consulted first for the API key
pub const API_KEY_ENV: &str = "CARDMAIL_API_KEY";

// ===== Sharing =====

/// Base URL used to build public share links
pub const DEFAULT_SHARE_BASE_URL: &str = "http://localhost:3000";

// ===== Data Directory =====

/// Environment variable overriding the data directory
pub const DATA_DIR_ENV: &str = "CARDMAIL_DATA_DIR";

/// Data directory used when the environment does not name one
pub const DEFAULT_DATA_DIR: &str = "cardmail-data";

/// Database file name inside the data directory
pub const DATABASE_FILE: &str = "cardmail.db";
