//! Prompt templates for extraction, drafting and refinement
//!
//! Drafting uses one template per platform, parameterized by tone.
//! Every prompt ends by asking for JSON only; the signature is never
//! requested from the model.

use super::schema::ContactFields;
use crate::error::AppError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Target channel for a drafted message
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    #[default]
    Email,
    #[serde(alias = "LinkedIn")]
    Linkedin,
    /// Chat tools such as Slack or Teams
    #[serde(alias = "chat")]
    Slack,
}

impl Platform {
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Email => "email",
            Platform::Linkedin => "linkedin",
            Platform::Slack => "slack",
        }
    }

    fn label(&self) -> &'static str {
        match self {
            Platform::Email => "Email",
            Platform::Linkedin => "LinkedIn",
            Platform::Slack => "Chat (Slack/Teams)",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "email" => Ok(Platform::Email),
            "linkedin" => Ok(Platform::Linkedin),
            "slack" | "chat" | "teams" => Ok(Platform::Slack),
            other => Err(AppError::InvalidInput(format!("Unknown platform: {}", other))),
        }
    }
}

/// Formality of the generated text, 3 being the most formal
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "ToneRepr", into = "String")]
pub enum ToneLevel {
    Formal,
    #[default]
    Polite,
    Casual,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ToneRepr {
    Number(u8),
    Text(String),
}

impl TryFrom<ToneRepr> for ToneLevel {
    type Error = AppError;

    fn try_from(repr: ToneRepr) -> Result<Self, Self::Error> {
        match repr {
            ToneRepr::Number(level) => ToneLevel::from_level(level),
            ToneRepr::Text(text) => text.parse(),
        }
    }
}

impl From<ToneLevel> for String {
    fn from(tone: ToneLevel) -> Self {
        tone.level().to_string()
    }
}

impl ToneLevel {
    pub fn from_level(level: u8) -> Result<Self, AppError> {
        match level {
            3 => Ok(ToneLevel::Formal),
            2 => Ok(ToneLevel::Polite),
            1 => Ok(ToneLevel::Casual),
            other => Err(AppError::InvalidInput(format!(
                "Tone level must be 1, 2 or 3 (got {})",
                other
            ))),
        }
    }

    pub fn level(&self) -> u8 {
        match self {
            ToneLevel::Formal => 3,
            ToneLevel::Polite => 2,
            ToneLevel::Casual => 1,
        }
    }

    fn definition(&self) -> &'static str {
        match self {
            ToneLevel::Formal => {
                "### Level 3: Very formal\n\
                 - Audience: business partners, executives, senior people, apologies, first contact.\n\
                 - Style: correct honorific and humble language throughout. Include cushioning phrases \
                 and set greetings and closings where appropriate.\n\
                 - Mood: strict, sincere, courteous."
            }
            ToneLevel::Polite => {
                "### Level 2: Polite\n\
                 - Audience: your manager, senior colleagues, other departments, ordinary external contacts.\n\
                 - Style: standard polite business register. Avoid excessive honorifics; balance clarity and courtesy.\n\
                 - Mood: clean, professional, smooth."
            }
            ToneLevel::Casual => {
                "### Level 1: Friendly\n\
                 - Audience: peers, close teammates, direct reports, casual social posts.\n\
                 - Style: soft polite register, or relaxed phrasing where the situation allows \
                 (\"Let's do it!\"). Emoji are allowed on some platforms.\n\
                 - Mood: approachable, upbeat, quick."
            }
        }
    }
}

impl FromStr for ToneLevel {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let level = s
            .trim()
            .parse::<u8>()
            .map_err(|_| AppError::InvalidInput(format!("Invalid tone level: {}", s)))?;
        ToneLevel::from_level(level)
    }
}

/// What the draft is written from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Recipient {
    /// Read the recipient from an attached card image
    CardImage,
    /// Recipient typed in by the user
    Manual(ContactFields),
}

/// Extraction prompt sent alongside a card photo
pub fn extraction_prompt() -> String {
    r#"Extract the following information from the business card image.
Output JSON in this shape:

{
    "name": "full name (e.g. Taro Yamada)",
    "company": "company name (e.g. Sample Inc.)",
    "email": "email address"
}

Use an empty string for anything you cannot read."#
        .to_string()
}

fn platform_format(platform: Platform, tone: ToneLevel) -> String {
    match platform {
        Platform::Email => "## Format: Email\n\
             - Subject: write a specific, easy-to-understand subject line.\n\
             - Structure: greeting -> body -> closing."
            .to_string(),
        Platform::Linkedin => {
            let decoration = match tone {
                ToneLevel::Formal => "add hashtags (#) that suit the tone",
                ToneLevel::Polite | ToneLevel::Casual => {
                    "add hashtags (#) that suit the tone, and emoji where they fit"
                }
            };
            format!(
                "## Format: LinkedIn / social\n\
                 - Subject: not needed. Put a hook first line in the subject field instead.\n\
                 - Structure: an opening that catches the reader's interest -> body (use line breaks \
                 generously for readability) -> call to action.\n\
                 - Decoration: {}.",
                decoration
            )
        }
        Platform::Slack => "## Format: Chat (Slack/Teams)\n\
             - Subject: not needed. Put a one-line summary or an empty string in the subject field.\n\
             - Structure: open with a short greeting and state the request concisely. \
             Skip long preambles."
            .to_string(),
    }
}

fn subject_field_description(platform: Platform) -> &'static str {
    match platform {
        Platform::Email => "the subject you wrote",
        Platform::Linkedin => "the hook first line",
        Platform::Slack => "a one-line summary, or an empty string",
    }
}

/// Drafting prompt for one platform and tone
pub fn draft_prompt(
    platform: Platform,
    tone: ToneLevel,
    context: &str,
    recipient: &Recipient,
) -> String {
    let mut prompt = format!(
        r#"You are an excellent business writing assistant who can handle any business situation.
Write the best message for the information the user provides.

## Input
1. **Platform**: {platform}
2. **Tone (politeness level)**: level {level}
3. **Points to convey (context)**: "{context}"

## Tone rules
Control the writing style strictly according to the given level.

{tone}

{format}

## Output format (JSON)
Output only JSON in exactly this shape.
{{
  "email": "recipient email address (empty string if not found)",
  "name": "recipient name (e.g. Taro Yamada)",
  "subject": "{subject}",
  "body": "the message body (do not include a signature)"
}}"#,
        platform = platform.label(),
        level = tone.level(),
        context = context,
        tone = tone.definition(),
        format = platform_format(platform, tone),
        subject = subject_field_description(platform),
    );

    match recipient {
        Recipient::CardImage => {
            prompt.push_str(
                "\n\n**Business card image**: read the recipient's name, company and email \
                 address accurately from the attached business card image.",
            );
        }
        Recipient::Manual(fields) => {
            prompt.push_str(&format!(
                "\n\n**Recipient details (entered manually)**:\n- Name: {}\n- Company: {}\n- Email: {}",
                fields.name, fields.company, fields.email
            ));
        }
    }

    prompt.push_str("\n\nFollow the instructions above and output JSON only.");
    prompt
}

/// Refinement prompt: rewrite `current_body` following `instruction`
pub fn refine_prompt(current_body: &str, instruction: &str) -> String {
    format!(
        r#"You are an excellent business writing assistant.
Rewrite the "current email body" below following the user's "edit instruction".

## Current email body
"{current_body}"

## Edit instruction
"{instruction}"

## Rules
- Apply the instruction precisely.
- Keep the wording natural for a business email.
- Do not include a signature (body only).
- Output JSON.

## Output format (JSON)
{{
  "body": "the rewritten body"
}}"#
    )
}
