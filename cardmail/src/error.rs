//! Error types for cardmail
//!
//! All errors use thiserror for structured error handling.
//! These errors can be serialized to the calling frontend.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API key is not configured. Set CARDMAIL_API_KEY or store a key with `cardmail set_api_key`.")]
    MissingApiKey,

    #[error("AI service error: {0}")]
    AiService(String),

    #[error("AI service blocked the request: {0}")]
    AiSafetyBlocked(String),

    #[error("Unexpected AI response: {0}")]
    InvalidAiResponse(String),

    #[error("Generation error: {0}")]
    Generation(String),

    #[error("Refinement error: {0}")]
    Refinement(String),

    #[error("Speech recognition error: {0}")]
    Recognition(String),

    #[error("Contact not found: {0}")]
    ContactNotFound(String),

    #[error("Folder not found: {0}")]
    FolderNotFound(String),

    #[error("Shared item not found: {0}")]
    SharedItemNotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Image store error: {0}")]
    ImageStore(String),

    #[error("Credential error: {0}")]
    Credential(String),

    #[error("{0}")]
    Generic(String),
}

impl AppError {
    /// Whether the user can fix this error by changing local configuration
    pub fn is_configuration(&self) -> bool {
        matches!(self, AppError::MissingApiKey)
    }

    /// Follow-up the command line prints under a configuration error
    pub fn hint(&self) -> Option<&'static str> {
        if self.is_configuration() {
            Some("set CARDMAIL_API_KEY, or run `cardmail set_api_key '{\"key\":\"...\"}'`")
        } else {
            None
        }
    }
}

impl serde::Serialize for AppError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
