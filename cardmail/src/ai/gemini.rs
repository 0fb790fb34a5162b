//! Gemini `generateContent` REST client.
//!
//! One POST per request: the prompt text plus an optional inline image,
//! with the response MIME type pinned to JSON. The API key travels in
//! the `x-goog-api-key` header and is never logged.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{GenerateRequest, GenerativeModel};
use crate::error::{AppError, Result};
use crate::services::settings::AiSettings;

/// Finish reasons that mean the output was withheld
const BLOCKED_FINISH_REASONS: &[&str] = &["SAFETY", "PROHIBITED_CONTENT", "BLOCKLIST", "SPII"];

/// Longest error body kept in an error message
const MAX_ERROR_BODY: usize = 500;

// ============================================================================
// Wire types
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentBody<'a> {
    contents: Vec<RequestContent<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct RequestContent<'a> {
    role: &'static str,
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum RequestPart<'a> {
    Text {
        text: &'a str,
    },
    #[serde(rename_all = "camelCase")]
    InlineData {
        inline_data: InlineData<'a>,
    },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct InlineData<'a> {
    mime_type: &'a str,
    data: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: &'static str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<ResponseContent>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

// ============================================================================
// Client
// ============================================================================

/// HTTP client for one Gemini model
pub struct GeminiClient {
    http: reqwest::Client,
    endpoint: String,
    model: String,
    api_key: Option<String>,
}

impl GeminiClient {
    /// Build a client; a missing key is reported per request, not here
    pub fn new(settings: &AiSettings, api_key: Option<String>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("cardmail/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            endpoint: settings.endpoint.trim_end_matches('/').to_string(),
            model: settings.model.clone(),
            api_key: api_key
                .map(|key| key.trim().to_string())
                .filter(|key| !key.is_empty()),
        })
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    fn url(&self) -> String {
        format!("{}/models/{}:generateContent", self.endpoint, self.model)
    }
}

#[async_trait]
impl GenerativeModel for GeminiClient {
    async fn generate(&self, request: GenerateRequest) -> Result<String> {
        let api_key = self.api_key.as_deref().ok_or(AppError::MissingApiKey)?;

        tracing::debug!(
            "Calling {} (prompt {} chars, image: {})",
            self.model,
            request.prompt.len(),
            request.image.is_some()
        );

        let response = self
            .http
            .post(self.url())
            .header("x-goog-api-key", api_key)
            .json(&request_body(&request))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let body: String = body.chars().take(MAX_ERROR_BODY).collect();
            tracing::warn!("Generative API returned status {}", status);
            return Err(AppError::AiService(format!("status {}: {}", status.as_u16(), body)));
        }

        let parsed: GenerateContentResponse = response.json().await?;
        response_text(parsed)
    }
}

fn request_body(request: &GenerateRequest) -> GenerateContentBody<'_> {
    let mut parts = vec![RequestPart::Text {
        text: &request.prompt,
    }];

    if let Some(image) = &request.image {
        parts.push(RequestPart::InlineData {
            inline_data: InlineData {
                mime_type: &image.mime_type,
                data: &image.data,
            },
        });
    }

    GenerateContentBody {
        contents: vec![RequestContent {
            role: "user",
            parts,
        }],
        generation_config: GenerationConfig {
            response_mime_type: "application/json",
        },
    }
}

/// Pull the text out of a response, surfacing safety blocks
fn response_text(response: GenerateContentResponse) -> Result<String> {
    if let Some(reason) = response.prompt_feedback.and_then(|f| f.block_reason) {
        return Err(AppError::AiSafetyBlocked(reason));
    }

    let candidate = response
        .candidates
        .into_iter()
        .next()
        .ok_or_else(|| AppError::InvalidAiResponse("no candidates".to_string()))?;

    if let Some(reason) = candidate.finish_reason.as_deref() {
        if BLOCKED_FINISH_REASONS.contains(&reason) {
            return Err(AppError::AiSafetyBlocked(reason.to_string()));
        }
    }

    let text: String = candidate
        .content
        .map(|content| {
            content
                .parts
                .into_iter()
                .filter_map(|part| part.text)
                .collect()
        })
        .unwrap_or_default();

    if text.trim().is_empty() {
        return Err(AppError::InvalidAiResponse("empty response".to_string()));
    }

    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::CardImage;

    fn parse(json: &str) -> Result<String> {
        response_text(serde_json::from_str(json).unwrap())
    }

    #[test]
    fn test_request_body_with_image() {
        let request = GenerateRequest {
            prompt: "Extract".to_string(),
            image: Some(CardImage::from_data_url("data:image/png;base64,aGVsbG8=").unwrap()),
        };

        let body = serde_json::to_value(request_body(&request)).unwrap();

        assert_eq!(body["generationConfig"]["responseMimeType"], "application/json");
        assert_eq!(body["contents"][0]["role"], "user");
        assert_eq!(body["contents"][0]["parts"][0]["text"], "Extract");
        assert_eq!(
            body["contents"][0]["parts"][1]["inlineData"]["mimeType"],
            "image/png"
        );
        assert_eq!(body["contents"][0]["parts"][1]["inlineData"]["data"], "aGVsbG8=");
    }

    #[test]
    fn test_request_body_text_only() {
        let request = GenerateRequest::text("Refine");
        let body = serde_json::to_value(request_body(&request)).unwrap();

        assert_eq!(body["contents"][0]["parts"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn test_response_text_joins_parts() {
        let text = parse(
            r#"{"candidates":[{"content":{"parts":[{"text":"{\"body\":"},{"text":"\"x\"}"}]},"finishReason":"STOP"}]}"#,
        )
        .unwrap();

        assert_eq!(text, r#"{"body":"x"}"#);
    }

    #[test]
    fn test_prompt_block_is_safety_error() {
        let result = parse(r#"{"promptFeedback":{"blockReason":"SAFETY"}}"#);
        assert!(matches!(result, Err(AppError::AiSafetyBlocked(reason)) if reason == "SAFETY"));
    }

    #[test]
    fn test_safety_finish_reason_is_safety_error() {
        let result = parse(r#"{"candidates":[{"finishReason":"SAFETY"}]}"#);
        assert!(matches!(result, Err(AppError::AiSafetyBlocked(_))));
    }

    #[test]
    fn test_empty_response_is_invalid() {
        assert!(matches!(parse("{}"), Err(AppError::InvalidAiResponse(_))));
        assert!(matches!(
            parse(r#"{"candidates":[{"content":{"parts":[]}}]}"#),
            Err(AppError::InvalidAiResponse(_))
        ));
    }

    #[tokio::test]
    async fn test_missing_key_fails_before_network() {
        let client = GeminiClient::new(&AiSettings::default(), Some("   ".to_string())).unwrap();
        assert!(!client.has_api_key());

        let result = client.generate(GenerateRequest::text("hello")).await;
        assert!(matches!(result, Err(AppError::MissingApiKey)));
    }

    #[test]
    fn test_url() {
        let settings = AiSettings {
            endpoint: "https://example.test/v1beta/".to_string(),
            ..AiSettings::default()
        };
        let client = GeminiClient::new(&settings, None).unwrap();

        assert_eq!(
            client.url(),
            "https://example.test/v1beta/models/gemini-2.0-flash:generateContent"
        );
    }
}
