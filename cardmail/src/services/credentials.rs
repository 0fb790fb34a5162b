/// Credential Manager Service
/// Stores the generative-AI API key in the OS credential store
use crate::config::API_KEY_ENV;
use crate::error::{AppError, Result};
use keyring::Entry;

const SERVICE_NAME: &str = "cardmail";
const API_KEY_ENTRY: &str = "ai_api_key";

/// Credential manager for the AI API key
pub struct CredentialManager;

impl CredentialManager {
    fn entry() -> Result<Entry> {
        Entry::new(SERVICE_NAME, API_KEY_ENTRY)
            .map_err(|e| AppError::Credential(format!("Failed to create keyring entry: {}", e)))
    }

    /// Store the API key in the OS credential store
    pub fn store_api_key(key: &str) -> Result<()> {
        let key = key.trim();
        if key.is_empty() {
            return Err(AppError::InvalidInput("API key must not be empty".to_string()));
        }

        Self::entry()?
            .set_password(key)
            .map_err(|e| AppError::Credential(format!("Failed to store API key: {}", e)))?;

        tracing::info!("API key stored in credential manager");
        Ok(())
    }

    /// Read the API key from the OS credential store
    pub fn get_api_key() -> Result<String> {
        Self::entry()?
            .get_password()
            .map_err(|e| AppError::Credential(format!("Failed to retrieve API key: {}", e)))
    }

    /// Remove the API key from the OS credential store
    pub fn delete_api_key() -> Result<()> {
        Self::entry()?
            .delete_credential()
            .map_err(|e| AppError::Credential(format!("Failed to delete API key: {}", e)))?;

        tracing::info!("API key deleted from credential manager");
        Ok(())
    }

    /// Resolve the key to use: environment first, then the credential store
    pub fn resolve_api_key() -> Option<String> {
        if let Some(key) = api_key_from_env(std::env::var(API_KEY_ENV).ok()) {
            return Some(key);
        }

        match Self::get_api_key() {
            Ok(key) if !key.trim().is_empty() => Some(key.trim().to_string()),
            Ok(_) => None,
            Err(e) => {
                tracing::debug!("No API key in credential store: {}", e);
                None
            }
        }
    }
}

fn api_key_from_env(value: Option<String>) -> Option<String> {
    value
        .map(|key| key.trim().to_string())
        .filter(|key| !key.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_key_trimmed_and_blank_ignored() {
        assert_eq!(
            api_key_from_env(Some("  abc \n".to_string())),
            Some("abc".to_string())
        );
        assert_eq!(api_key_from_env(Some("   ".to_string())), None);
        assert_eq!(api_key_from_env(None), None);
    }

    #[test]
    fn test_store_rejects_blank_key() {
        assert!(matches!(
            CredentialManager::store_api_key("  "),
            Err(AppError::InvalidInput(_))
        ));
    }
}
