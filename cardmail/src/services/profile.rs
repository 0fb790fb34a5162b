//! Per-user profile values
//!
//! Currently the email signature appended to generated drafts.

use crate::database::Repository;
use crate::error::Result;

const SIGNATURE_KEY: &str = "signature";

#[derive(Clone)]
pub struct ProfileService {
    repo: Repository,
}

impl ProfileService {
    pub fn new(repo: Repository) -> Self {
        Self { repo }
    }

    /// The user's signature, empty if never set
    pub async fn get_signature(&self, user_id: &str) -> Result<String> {
        Ok(self
            .repo
            .get_user_setting(user_id, SIGNATURE_KEY)
            .await?
            .unwrap_or_default())
    }

    pub async fn save_signature(&self, user_id: &str, signature: &str) -> Result<()> {
        self.repo
            .set_user_setting(user_id, SIGNATURE_KEY, signature)
            .await?;
        tracing::info!("Saved signature for user: {}", user_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::create_memory_pool;

    #[tokio::test]
    async fn test_signature_defaults_to_empty() {
        let service = ProfileService::new(Repository::new(create_memory_pool().await.unwrap()));

        assert_eq!(service.get_signature("u1").await.unwrap(), "");

        service.save_signature("u1", "Taro Suzuki\nAcme Inc.").await.unwrap();
        assert_eq!(service.get_signature("u1").await.unwrap(), "Taro Suzuki\nAcme Inc.");
    }
}
