//! Typed response contracts for the generative model
//!
//! The model is asked for strict JSON. Responses are decoded into these
//! structs; a missing field or a wrong type is an `InvalidAiResponse`
//! rather than a silently empty value.

use crate::error::{AppError, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Name, company and email of a card holder
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactFields {
    pub name: String,
    pub company: String,
    pub email: String,
}

/// How much of a card the extractor could read
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtractionOutcome {
    /// Every field was read
    Complete,
    /// Some fields are empty and should be filled in by hand
    Partial,
    /// Nothing was read; fall back to manual entry
    Failed,
}

impl ContactFields {
    pub fn is_empty(&self) -> bool {
        self.name.is_empty() && self.company.is_empty() && self.email.is_empty()
    }

    pub fn outcome(&self) -> ExtractionOutcome {
        if self.is_empty() {
            ExtractionOutcome::Failed
        } else if self.name.is_empty() || self.company.is_empty() || self.email.is_empty() {
            ExtractionOutcome::Partial
        } else {
            ExtractionOutcome::Complete
        }
    }

    fn trimmed(self) -> Self {
        Self {
            name: self.name.trim().to_string(),
            company: self.company.trim().to_string(),
            email: self.email.trim().to_string(),
        }
    }
}

/// A drafted message as returned by the model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DraftedEmail {
    pub email: String,
    pub name: String,
    pub subject: String,
    pub body: String,
}

/// A rewritten body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefinedBody {
    pub body: String,
}

/// Decode a model response into `T`.
///
/// Accepts surrounding whitespace and a Markdown code fence; anything
/// else that does not match the shape of `T` is rejected.
pub fn decode<T: DeserializeOwned>(raw: &str) -> Result<T> {
    let json = strip_code_fence(raw.trim());

    if json.is_empty() {
        return Err(AppError::InvalidAiResponse("empty response".to_string()));
    }

    serde_json::from_str(json).map_err(|e| AppError::InvalidAiResponse(e.to_string()))
}

/// Decode an extraction response, trimming the field values
pub fn decode_contact_fields(raw: &str) -> Result<ContactFields> {
    decode::<ContactFields>(raw).map(ContactFields::trimmed)
}

fn strip_code_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };

    // Drop an optional language tag on the opening fence line
    let rest = match rest.find('\n') {
        Some(newline) => &rest[newline + 1..],
        None => rest,
    };

    rest.trim_end().strip_suffix("```").unwrap_or(rest).trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_contact_fields() {
        let fields = decode_contact_fields(
            r#"{"name":" Taro Yamada ","company":"Acme","email":"y@acme.com"}"#,
        )
        .unwrap();

        assert_eq!(fields.name, "Taro Yamada");
        assert_eq!(fields.outcome(), ExtractionOutcome::Complete);
    }

    #[test]
    fn test_outcome_classification() {
        assert_eq!(ContactFields::default().outcome(), ExtractionOutcome::Failed);

        let partial = ContactFields {
            name: "Yamada".to_string(),
            company: String::new(),
            email: "y@acme.com".to_string(),
        };
        assert_eq!(partial.outcome(), ExtractionOutcome::Partial);
    }

    #[test]
    fn test_decode_strips_code_fence() {
        let raw = "```json\n{\"body\": \"Rewritten\"}\n```";
        let refined: RefinedBody = decode(raw).unwrap();
        assert_eq!(refined.body, "Rewritten");
    }

    #[test]
    fn test_decode_rejects_missing_field() {
        let result: Result<DraftedEmail> =
            decode(r#"{"email":"y@acme.com","name":"Yamada","body":"Hi"}"#);
        assert!(matches!(result, Err(AppError::InvalidAiResponse(_))));
    }

    #[test]
    fn test_decode_rejects_wrong_type() {
        let result: Result<RefinedBody> = decode(r#"{"body": 42}"#);
        assert!(matches!(result, Err(AppError::InvalidAiResponse(_))));
    }

    #[test]
    fn test_decode_rejects_non_json() {
        let result: Result<RefinedBody> = decode("Sure! Here is your email.");
        assert!(matches!(result, Err(AppError::InvalidAiResponse(_))));

        let empty: Result<RefinedBody> = decode("   ");
        assert!(matches!(empty, Err(AppError::InvalidAiResponse(_))));
    }
}
