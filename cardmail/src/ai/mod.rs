//! Generative-AI collaborator
//!
//! - `prompts`: prompt templates, platform and tone enums
//! - `schema`: typed JSON response contracts and the decode step
//! - `gemini`: HTTP client for the hosted model
//!
//! Services talk to the model only through the `GenerativeModel` trait.

pub mod gemini;
pub mod prompts;
pub mod schema;

pub use gemini::GeminiClient;
pub use prompts::{Platform, Recipient, ToneLevel};
pub use schema::{ContactFields, DraftedEmail, ExtractionOutcome, RefinedBody};

use crate::error::Result;
use crate::storage::CardImage;
use async_trait::async_trait;

/// One request to the model: prompt text plus an optional image
#[derive(Debug, Clone)]
pub struct GenerateRequest {
    pub prompt: String,
    pub image: Option<CardImage>,
}

impl GenerateRequest {
    pub fn text(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            image: None,
        }
    }

    pub fn with_image(prompt: impl Into<String>, image: CardImage) -> Self {
        Self {
            prompt: prompt.into(),
            image: Some(image),
        }
    }
}

/// A text/vision model that answers with JSON text
#[async_trait]
pub trait GenerativeModel: Send + Sync {
    async fn generate(&self, request: GenerateRequest) -> Result<String>;
}
