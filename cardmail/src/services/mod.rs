//! Services module
//!
//! Business logic services that coordinate between commands and repository.

pub mod contacts;
pub mod credentials;
pub mod drafting;
pub mod folders;
pub mod profile;
pub mod settings;
pub mod sharing;

pub use contacts::ContactsService;
pub use credentials::CredentialManager;
pub use drafting::{DraftRequest, DraftingService, RecognitionEvent};
pub use folders::FoldersService;
pub use profile::ProfileService;
pub use settings::{AppSettings, SettingsService};
pub use sharing::{ShareLink, SharingService};
