//! Settings service
//!
//! Persists application settings as `settings.json` in the data directory.

use crate::ai::{Platform, ToneLevel};
use crate::config::{
    DEFAULT_AI_ENDPOINT, DEFAULT_MODEL, DEFAULT_REQUEST_TIMEOUT_SECS, DEFAULT_SHARE_BASE_URL,
};
use crate::error::{AppError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tokio::fs;

/// Generative-AI service settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AiSettings {
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_endpoint() -> String {
    DEFAULT_AI_ENDPOINT.to_string()
}

fn default_timeout_secs() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}

impl Default for AiSettings {
    fn default() -> Self {
        Self {
            model: default_model(),
            endpoint: default_endpoint(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Public share link settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShareSettings {
    #[serde(default = "default_share_base_url")]
    pub base_url: String,
    /// Lifetime of new share links; `None` keeps them forever
    #[serde(default)]
    pub default_ttl_days: Option<u32>,
}

fn default_share_base_url() -> String {
    DEFAULT_SHARE_BASE_URL.to_string()
}

impl Default for ShareSettings {
    fn default() -> Self {
        Self {
            base_url: default_share_base_url(),
            default_ttl_days: None,
        }
    }
}

/// Defaults preselected when drafting
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DraftingSettings {
    #[serde(default)]
    pub platform: Platform,
    #[serde(default)]
    pub tone: ToneLevel,
}

/// Application settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppSettings {
    #[serde(default)]
    pub ai: AiSettings,
    #[serde(default)]
    pub share: ShareSettings,
    #[serde(default)]
    pub drafting: DraftingSettings,
}

impl AppSettings {
    /// Reject values that would break requests or links
    pub fn validate(&self) -> Result<()> {
        if self.ai.model.trim().is_empty() {
            return Err(AppError::InvalidInput("AI model must not be empty".to_string()));
        }
        if !self.ai.endpoint.starts_with("http://") && !self.ai.endpoint.starts_with("https://") {
            return Err(AppError::InvalidInput(format!(
                "AI endpoint must be an http(s) URL: {}",
                self.ai.endpoint
            )));
        }
        if self.ai.timeout_secs == 0 {
            return Err(AppError::InvalidInput("Request timeout must be positive".to_string()));
        }
        if !self.share.base_url.starts_with("http://")
            && !self.share.base_url.starts_with("https://")
        {
            return Err(AppError::InvalidInput(format!(
                "Share base URL must be an http(s) URL: {}",
                self.share.base_url
            )));
        }
        if self.share.default_ttl_days == Some(0) {
            return Err(AppError::InvalidInput("Share lifetime must be at least one day".to_string()));
        }
        Ok(())
    }
}

/// Service for managing application settings
#[derive(Clone)]
pub struct SettingsService {
    settings_path: PathBuf,
}

impl SettingsService {
    pub fn new(data_dir: PathBuf) -> Self {
        Self {
            settings_path: data_dir.join("settings.json"),
        }
    }

    /// Load settings from disk or create the defaults
    pub async fn load(&self) -> Result<AppSettings> {
        if !self.settings_path.exists() {
            tracing::info!("Settings file not found, creating default settings");
            let default = AppSettings::default();
            self.save(&default).await?;
            return Ok(default);
        }

        let content = fs::read_to_string(&self.settings_path).await?;
        let settings: AppSettings = serde_json::from_str(&content)
            .map_err(|e| AppError::Generic(format!("Failed to parse settings: {}", e)))?;

        Ok(settings)
    }

    /// Save settings to disk
    pub async fn save(&self, settings: &AppSettings) -> Result<()> {
        settings.validate()?;

        let content = serde_json::to_string_pretty(settings)?;

        if let Some(parent) = self.settings_path.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::write(&self.settings_path, content).await?;
        tracing::info!("Settings saved to {:?}", self.settings_path);

        Ok(())
    }

    pub async fn update_ai(&self, ai: AiSettings) -> Result<AppSettings> {
        let mut settings = self.load().await?;
        settings.ai = ai;
        self.save(&settings).await?;
        Ok(settings)
    }

    pub async fn update_share(&self, share: ShareSettings) -> Result<AppSettings> {
        let mut settings = self.load().await?;
        settings.share = share;
        self.save(&settings).await?;
        Ok(settings)
    }

    pub async fn update_drafting(&self, drafting: DraftingSettings) -> Result<AppSettings> {
        let mut settings = self.load().await?;
        settings.drafting = drafting;
        self.save(&settings).await?;
        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_test_service() -> (SettingsService, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let service = SettingsService::new(temp_dir.path().to_path_buf());
        (service, temp_dir)
    }

    #[tokio::test]
    async fn test_default_settings_created_on_load() {
        let (service, temp) = create_test_service();

        let settings = service.load().await.unwrap();

        assert_eq!(settings.ai.model, "gemini-2.0-flash");
        assert_eq!(settings.ai.timeout_secs, 60);
        assert_eq!(settings.share.base_url, "http://localhost:3000");
        assert_eq!(settings.drafting.platform, Platform::Email);
        assert_eq!(settings.drafting.tone, ToneLevel::Polite);
        assert!(temp.path().join("settings.json").exists());
    }

    #[tokio::test]
    async fn test_partial_file_fills_defaults() {
        let (service, temp) = create_test_service();

        std::fs::write(
            temp.path().join("settings.json"),
            r#"{"share":{"base_url":"https://cards.example.com"},"drafting":{"platform":"chat","tone":"3"}}"#,
        )
        .unwrap();

        let settings = service.load().await.unwrap();
        assert_eq!(settings.share.base_url, "https://cards.example.com");
        assert_eq!(settings.drafting.platform, Platform::Slack);
        assert_eq!(settings.drafting.tone, ToneLevel::Formal);
        assert_eq!(settings.ai, AiSettings::default());
    }

    #[tokio::test]
    async fn test_update_preserves_other_sections() {
        let (service, _temp) = create_test_service();

        service
            .update_share(ShareSettings {
                base_url: "https://share.example.com".to_string(),
                default_ttl_days: Some(30),
            })
            .await
            .unwrap();

        service
            .update_drafting(DraftingSettings {
                platform: Platform::Linkedin,
                tone: ToneLevel::Casual,
            })
            .await
            .unwrap();

        let loaded = service.load().await.unwrap();
        assert_eq!(loaded.share.default_ttl_days, Some(30));
        assert_eq!(loaded.drafting.platform, Platform::Linkedin);
    }

    #[tokio::test]
    async fn test_invalid_settings_rejected() {
        let (service, _temp) = create_test_service();

        let result = service
            .update_ai(AiSettings {
                endpoint: "ftp://nope".to_string(),
                ..AiSettings::default()
            })
            .await;

        assert!(matches!(result, Err(AppError::InvalidInput(_))));
        assert_eq!(service.load().await.unwrap().ai, AiSettings::default());
    }
}
