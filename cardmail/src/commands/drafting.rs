//! AI drafting commands

use crate::ai::{ContactFields, DraftedEmail, ExtractionOutcome};
use crate::app::AppState;
use crate::error::Result;
use crate::services::{DraftRequest, RecognitionEvent};
use crate::storage::CardImage;
use serde::Serialize;
use serde_json::Value;

/// Extracted fields plus how complete they are
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Extraction {
    #[serde(flatten)]
    pub fields: ContactFields,
    pub outcome: ExtractionOutcome,
}

/// Read name, company and email from a card photo. Never fails.
///
/// The photo arrives as raw JSON so that an unreadable, oversized or
/// missing image also yields empty fields instead of an argument error.
pub async fn extract_contact(state: &AppState, image: Value) -> Result<Extraction> {
    let fields = match serde_json::from_value::<CardImage>(image) {
        Ok(image) => state.drafting.extract(image).await,
        Err(e) => {
            tracing::warn!("Card image rejected, falling back to manual entry: {}", e);
            ContactFields::default()
        }
    };
    let outcome = fields.outcome();
    Ok(Extraction { fields, outcome })
}

/// Draft a message and append the user's signature.
/// Platform and tone default to the stored drafting settings.
pub async fn generate_draft(
    state: &AppState,
    user_id: String,
    request: DraftRequest,
) -> Result<DraftedEmail> {
    let defaults = state.settings_service.load().await?.drafting;
    let request = request.with_defaults(defaults.platform, defaults.tone);
    let signature = state.profile.get_signature(&user_id).await?;
    state.drafting.draft(request, &signature).await
}

/// Rewrite a draft body following an instruction
pub async fn refine_draft(
    state: &AppState,
    current_body: String,
    instruction: String,
) -> Result<String> {
    state.drafting.refine(&current_body, &instruction).await
}

/// Feed one speech-recognition event into the refine cycle
pub async fn apply_voice_event(
    state: &AppState,
    current_body: String,
    event: RecognitionEvent,
) -> Result<Option<String>> {
    state.drafting.apply_voice_event(&current_body, event).await
}
