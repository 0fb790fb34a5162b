//! Drafting service
//!
//! Orchestrates the three model calls: card extraction, message
//! drafting and body refinement. Extraction never fails; drafting and
//! refinement surface a generic error except for a missing API key,
//! which the user can fix.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::ai::prompts::{draft_prompt, extraction_prompt, refine_prompt};
use crate::ai::schema::{decode, decode_contact_fields};
use crate::ai::{
    ContactFields, DraftedEmail, GenerateRequest, GenerativeModel, Platform, Recipient,
    RefinedBody, ToneLevel,
};
use crate::config::{MAX_CONTEXT_LENGTH, MAX_INSTRUCTION_LENGTH};
use crate::error::{AppError, Result};
use crate::storage::CardImage;

/// Input for a draft. Platform and tone left unset fall back to the
/// stored drafting defaults, then to email at level 2.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftRequest {
    #[serde(default)]
    pub image: Option<CardImage>,
    #[serde(default)]
    pub manual: Option<ContactFields>,
    #[serde(default)]
    pub context: String,
    #[serde(default)]
    pub platform: Option<Platform>,
    #[serde(default)]
    pub tone: Option<ToneLevel>,
}

impl DraftRequest {
    /// Fill platform and tone the caller left unset
    pub fn with_defaults(mut self, platform: Platform, tone: ToneLevel) -> Self {
        self.platform.get_or_insert(platform);
        self.tone.get_or_insert(tone);
        self
    }
}

/// Event from a speech recognizer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum RecognitionEvent {
    /// A recognized utterance
    Result(String),
    /// Recognizer error code, e.g. "not-allowed"
    Error(String),
    /// Listening stopped
    End,
}

#[derive(Clone)]
pub struct DraftingService {
    model: Arc<dyn GenerativeModel>,
}

impl DraftingService {
    pub fn new(model: Arc<dyn GenerativeModel>) -> Self {
        Self { model }
    }

    /// Best-effort field extraction; any failure yields empty fields
    pub async fn extract(&self, image: CardImage) -> ContactFields {
        let request = GenerateRequest::with_image(extraction_prompt(), image);

        let result = match self.model.generate(request).await {
            Ok(raw) => decode_contact_fields(&raw),
            Err(e) => Err(e),
        };

        match result {
            Ok(fields) => {
                tracing::info!("Card extraction finished: {:?}", fields.outcome());
                fields
            }
            Err(e) => {
                tracing::warn!("Card extraction failed, falling back to manual entry: {}", e);
                ContactFields::default()
            }
        }
    }

    /// Draft a message; the signature is appended after generation
    pub async fn draft(&self, request: DraftRequest, signature: &str) -> Result<DraftedEmail> {
        if request.context.chars().count() > MAX_CONTEXT_LENGTH {
            return Err(AppError::InvalidInput(format!(
                "Context exceeds {} characters",
                MAX_CONTEXT_LENGTH
            )));
        }

        let (recipient, image) = match (request.image, request.manual) {
            (Some(image), _) => (Recipient::CardImage, Some(image)),
            (None, Some(fields)) => (Recipient::Manual(fields), None),
            (None, None) => {
                return Err(AppError::InvalidInput(
                    "Either a card image or manual recipient details are required".to_string(),
                ))
            }
        };

        let platform = request.platform.unwrap_or_default();
        let tone = request.tone.unwrap_or_default();
        tracing::info!("Drafting {} message at tone level {}", platform, tone.level());

        let prompt = draft_prompt(platform, tone, &request.context, &recipient);
        let generate = GenerateRequest { prompt, image };

        let mut drafted: DraftedEmail = self
            .call(generate)
            .await
            .and_then(|raw| decode(&raw))
            .map_err(|e| user_facing(e, AppError::Generation))?;

        drafted.body = append_signature(&drafted.body, signature);
        Ok(drafted)
    }

    /// Rewrite a body following an instruction; blank instructions are a no-op
    pub async fn refine(&self, current_body: &str, instruction: &str) -> Result<String> {
        let instruction = instruction.trim();
        if instruction.is_empty() {
            return Ok(current_body.to_string());
        }
        if instruction.chars().count() > MAX_INSTRUCTION_LENGTH {
            return Err(AppError::InvalidInput(format!(
                "Instruction exceeds {} characters",
                MAX_INSTRUCTION_LENGTH
            )));
        }

        tracing::info!("Refining draft body");

        let refined: RefinedBody = self
            .call(GenerateRequest::text(refine_prompt(current_body, instruction)))
            .await
            .and_then(|raw| decode(&raw))
            .map_err(|e| user_facing(e, AppError::Refinement))?;

        Ok(refined.body)
    }

    /// One step of the voice refine cycle.
    ///
    /// Returns the rewritten body for an utterance, `None` when nothing
    /// was said.
    pub async fn apply_voice_event(
        &self,
        current_body: &str,
        event: RecognitionEvent,
    ) -> Result<Option<String>> {
        match event {
            RecognitionEvent::Result(utterance) => {
                self.refine(current_body, &utterance).await.map(Some)
            }
            RecognitionEvent::End => Ok(None),
            RecognitionEvent::Error(code) => match code.as_str() {
                "no-speech" | "aborted" => Ok(None),
                "not-allowed" => Err(AppError::Recognition(
                    "Microphone access is not allowed".to_string(),
                )),
                "service-not-allowed" => Err(AppError::Recognition(
                    "Speech recognition is not available in this environment".to_string(),
                )),
                other => Err(AppError::Recognition(other.to_string())),
            },
        }
    }

    async fn call(&self, request: GenerateRequest) -> Result<String> {
        self.model.generate(request).await
    }
}

/// Keep user-actionable errors, wrap everything else
fn user_facing(error: AppError, wrap: fn(String) -> AppError) -> AppError {
    match error {
        AppError::MissingApiKey | AppError::InvalidInput(_) => error,
        other => {
            tracing::warn!("Model call failed: {}", other);
            wrap(other.to_string())
        }
    }
}

fn append_signature(body: &str, signature: &str) -> String {
    if signature.trim().is_empty() {
        body.to_string()
    } else {
        format!("{}\n\n{}", body, signature)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Replays canned responses and records prompts
    struct ScriptedModel {
        responses: Mutex<Vec<Result<String>>>,
        requests: Mutex<Vec<GenerateRequest>>,
    }

    impl ScriptedModel {
        fn new(responses: Vec<Result<String>>) -> Arc<Self> {
            Arc::new(Self {
                responses: Mutex::new(responses),
                requests: Mutex::new(Vec::new()),
            })
        }

        fn requests(&self) -> Vec<GenerateRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl GenerativeModel for ScriptedModel {
        async fn generate(&self, request: GenerateRequest) -> Result<String> {
            self.requests.lock().unwrap().push(request);
            self.responses.lock().unwrap().remove(0)
        }
    }

    fn card() -> CardImage {
        CardImage::from_bytes("image/jpeg", b"card").unwrap()
    }

    fn manual_request() -> DraftRequest {
        DraftRequest {
            manual: Some(ContactFields {
                name: "Yamada".to_string(),
                company: "Acme".to_string(),
                email: "y@acme.com".to_string(),
            }),
            context: "Met at the expo".to_string(),
            ..DraftRequest::default()
        }
    }

    #[tokio::test]
    async fn test_extract_success() {
        let model = ScriptedModel::new(vec![Ok(
            r#"{"name":"Yamada","company":"Acme","email":"y@acme.com"}"#.to_string(),
        )]);
        let service = DraftingService::new(model.clone());

        let fields = service.extract(card()).await;
        assert_eq!(fields.name, "Yamada");
        assert!(model.requests()[0].image.is_some());
    }

    #[tokio::test]
    async fn test_extract_swallows_every_failure() {
        let model = ScriptedModel::new(vec![
            Err(AppError::AiSafetyBlocked("SAFETY".to_string())),
            Ok("not json".to_string()),
            Err(AppError::MissingApiKey),
        ]);
        let service = DraftingService::new(model);

        for _ in 0..3 {
            assert_eq!(service.extract(card()).await, ContactFields::default());
        }
    }

    #[tokio::test]
    async fn test_draft_appends_signature() {
        let model = ScriptedModel::new(vec![Ok(
            r#"{"email":"y@acme.com","name":"Yamada","subject":"Thanks","body":"Great to meet you."}"#
                .to_string(),
        )]);
        let service = DraftingService::new(model.clone());

        let drafted = service
            .draft(manual_request(), "Taro Suzuki\nExample Corp.")
            .await
            .unwrap();

        assert_eq!(drafted.body, "Great to meet you.\n\nTaro Suzuki\nExample Corp.");
        let prompt = &model.requests()[0].prompt;
        assert!(prompt.contains("Name: Yamada"));
        assert!(!prompt.contains("Taro Suzuki"));
        assert!(model.requests()[0].image.is_none());
    }

    #[tokio::test]
    async fn test_unset_platform_and_tone_use_email_polite() {
        let model = ScriptedModel::new(vec![Ok(
            r#"{"email":"y@acme.com","name":"Yamada","subject":"Thanks","body":"Hi"}"#.to_string(),
        )]);
        let service = DraftingService::new(model.clone());

        service.draft(manual_request(), "").await.unwrap();

        let prompt = &model.requests()[0].prompt;
        assert!(prompt.contains("subject line"));
        assert!(prompt.contains("level 2"));
    }

    #[test]
    fn test_with_defaults_keeps_explicit_values() {
        let request = DraftRequest {
            platform: Some(Platform::Linkedin),
            ..DraftRequest::default()
        }
        .with_defaults(Platform::Slack, ToneLevel::Formal);

        assert_eq!(request.platform, Some(Platform::Linkedin));
        assert_eq!(request.tone, Some(ToneLevel::Formal));
    }

    #[tokio::test]
    async fn test_draft_requires_recipient() {
        let service = DraftingService::new(ScriptedModel::new(vec![]));

        let result = service.draft(DraftRequest::default(), "").await;
        assert!(matches!(result, Err(AppError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_draft_error_mapping() {
        let model = ScriptedModel::new(vec![
            Err(AppError::MissingApiKey),
            Err(AppError::AiService("status 500: oops".to_string())),
            Ok(r#"{"subject":"only"}"#.to_string()),
        ]);
        let service = DraftingService::new(model);

        assert!(matches!(
            service.draft(manual_request(), "").await,
            Err(AppError::MissingApiKey)
        ));
        assert!(matches!(
            service.draft(manual_request(), "").await,
            Err(AppError::Generation(_))
        ));
        assert!(matches!(
            service.draft(manual_request(), "").await,
            Err(AppError::Generation(_))
        ));
    }

    #[tokio::test]
    async fn test_refine_blank_instruction_skips_model() {
        let model = ScriptedModel::new(vec![]);
        let service = DraftingService::new(model.clone());

        let body = service.refine("Hello", "   ").await.unwrap();
        assert_eq!(body, "Hello");
        assert!(model.requests().is_empty());
    }

    #[tokio::test]
    async fn test_refine_errors_are_generic() {
        let model = ScriptedModel::new(vec![Err(AppError::AiSafetyBlocked("SAFETY".to_string()))]);
        let service = DraftingService::new(model);

        assert!(matches!(
            service.refine("Hello", "shorter").await,
            Err(AppError::Refinement(_))
        ));
    }

    #[tokio::test]
    async fn test_voice_events() {
        let model = ScriptedModel::new(vec![Ok(r#"{"body":"Hi!"}"#.to_string())]);
        let service = DraftingService::new(model);

        let refined = service
            .apply_voice_event("Hello", RecognitionEvent::Result("more casual".to_string()))
            .await
            .unwrap();
        assert_eq!(refined, Some("Hi!".to_string()));

        assert_eq!(
            service.apply_voice_event("Hello", RecognitionEvent::End).await.unwrap(),
            None
        );
        assert!(matches!(
            service
                .apply_voice_event("Hello", RecognitionEvent::Error("not-allowed".to_string()))
                .await,
            Err(AppError::Recognition(msg)) if msg.contains("Microphone")
        ));
        assert!(matches!(
            service
                .apply_voice_event("Hello", RecognitionEvent::Error("network".to_string()))
                .await,
            Err(AppError::Recognition(msg)) if msg.contains("network")
        ));
    }
}
