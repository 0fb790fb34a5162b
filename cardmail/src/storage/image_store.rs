//! Content-addressed card image storage
//!
//! Card photos are kept out of the contact rows. The bytes are stored
//! under their SHA-256 hash in a two-level directory layout, and the
//! `contact_images` table maps a contact to its hash.
//!
//! Example: hash "abcd1234..." is stored at "images/ab/cd/abcd1234..."

use crate::config::{DEFAULT_IMAGE_MIME, MAX_IMAGE_BYTES};
use crate::error::{AppError, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

/// A card photo in transport form: base64 payload plus declared MIME type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "CardImageRepr")]
pub struct CardImage {
    pub mime_type: String,
    /// Base64 (standard alphabet) without a data URL prefix
    pub data: String,
}

/// Accepted wire shapes: a data URL string or an explicit object
#[derive(Deserialize)]
#[serde(untagged)]
enum CardImageRepr {
    DataUrl(String),
    #[serde(rename_all = "camelCase")]
    Inline {
        #[serde(default)]
        mime_type: Option<String>,
        data: String,
    },
}

impl TryFrom<CardImageRepr> for CardImage {
    type Error = AppError;

    fn try_from(repr: CardImageRepr) -> Result<Self> {
        match repr {
            CardImageRepr::DataUrl(url) => CardImage::from_data_url(&url),
            CardImageRepr::Inline { mime_type, data } => CardImage::new(
                mime_type.as_deref().unwrap_or(DEFAULT_IMAGE_MIME),
                data.trim(),
            ),
        }
    }
}

impl CardImage {
    /// Build from a MIME type and base64 payload, validating both
    pub fn new(mime_type: &str, data: &str) -> Result<Self> {
        let mime_type = mime_type.trim().to_ascii_lowercase();
        if !mime_type.starts_with("image/") {
            return Err(AppError::InvalidInput(format!(
                "Unsupported image type: {}",
                mime_type
            )));
        }

        let image = Self {
            mime_type,
            data: data.to_string(),
        };
        image.decode()?;
        Ok(image)
    }

    /// Parse `data:<mime>;base64,<payload>`; bare base64 is taken as JPEG
    pub fn from_data_url(url: &str) -> Result<Self> {
        let url = url.trim();

        let Some(rest) = url.strip_prefix("data:") else {
            return Self::new(DEFAULT_IMAGE_MIME, url);
        };

        let (header, payload) = rest
            .split_once(',')
            .ok_or_else(|| AppError::InvalidInput("Malformed data URL".to_string()))?;

        let mime_type = header
            .strip_suffix(";base64")
            .ok_or_else(|| AppError::InvalidInput("Data URL is not base64 encoded".to_string()))?;

        Self::new(
            if mime_type.is_empty() {
                DEFAULT_IMAGE_MIME
            } else {
                mime_type
            },
            payload,
        )
    }

    /// Wrap raw bytes
    pub fn from_bytes(mime_type: &str, bytes: &[u8]) -> Result<Self> {
        Self::new(mime_type, &STANDARD.encode(bytes))
    }

    /// Decoded image bytes
    pub fn decode(&self) -> Result<Vec<u8>> {
        let bytes = STANDARD
            .decode(self.data.as_bytes())
            .map_err(|e| AppError::InvalidInput(format!("Invalid base64 image data: {}", e)))?;

        if bytes.is_empty() {
            return Err(AppError::InvalidInput("Image is empty".to_string()));
        }
        if bytes.len() > MAX_IMAGE_BYTES {
            return Err(AppError::InvalidInput(format!(
                "Image exceeds {} bytes",
                MAX_IMAGE_BYTES
            )));
        }

        Ok(bytes)
    }

    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.data)
    }
}

/// Content-addressed image store
#[derive(Clone)]
pub struct ImageStore {
    root: PathBuf,
}

impl ImageStore {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// Create the root directory if needed
    pub async fn initialize(&self) -> Result<()> {
        fs::create_dir_all(&self.root).await?;
        tracing::info!("Image store initialized at: {:?}", self.root);
        Ok(())
    }

    /// Write bytes, returning their SHA-256 hash
    pub async fn write(&self, data: &[u8]) -> Result<String> {
        let hash = hash_bytes(data);
        let path = self.get_path(&hash)?;

        if path.exists() {
            tracing::debug!("Image already stored: {}", hash);
            return Ok(hash);
        }

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }

        // Temp file then rename so readers never see a partial image
        let temp_path = path.with_extension("tmp");
        let mut file = fs::File::create(&temp_path).await?;
        file.write_all(data).await?;
        file.sync_all().await?;
        fs::rename(temp_path, &path).await?;

        tracing::debug!("Wrote image: {} ({} bytes)", hash, data.len());

        Ok(hash)
    }

    pub async fn read(&self, hash: &str) -> Result<Vec<u8>> {
        let path = self.get_path(hash)?;

        if !path.exists() {
            return Err(AppError::ImageStore(format!("Image not found: {}", hash)));
        }

        let data = fs::read(&path).await?;
        tracing::debug!("Read image: {} ({} bytes)", hash, data.len());

        Ok(data)
    }

    pub async fn exists(&self, hash: &str) -> Result<bool> {
        Ok(self.get_path(hash)?.exists())
    }

    /// Delete an image; missing images are not an error
    pub async fn delete(&self, hash: &str) -> Result<()> {
        let path = self.get_path(hash)?;

        if !path.exists() {
            return Ok(());
        }

        fs::remove_file(&path).await?;
        tracing::debug!("Deleted image: {}", hash);

        Ok(())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Two-level layout: images/ab/cd/abcd1234...
    fn get_path(&self, hash: &str) -> Result<PathBuf> {
        if hash.len() != 64 || !hash.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(AppError::ImageStore(format!("Invalid image hash: {}", hash)));
        }

        Ok(self.root.join(&hash[0..2]).join(&hash[2..4]).join(hash))
    }
}

pub(crate) fn hash_bytes(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn create_test_store() -> (ImageStore, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let store = ImageStore::new(temp_dir.path().join("images"));
        store.initialize().await.unwrap();
        (store, temp_dir)
    }

    #[tokio::test]
    async fn test_write_read_delete() {
        let (store, _temp) = create_test_store().await;

        let hash = store.write(b"card bytes").await.unwrap();
        assert_eq!(hash.len(), 64);
        assert_eq!(store.read(&hash).await.unwrap(), b"card bytes");

        // Same content, same hash
        assert_eq!(store.write(b"card bytes").await.unwrap(), hash);

        store.delete(&hash).await.unwrap();
        assert!(!store.exists(&hash).await.unwrap());
        store.delete(&hash).await.unwrap();
    }

    #[tokio::test]
    async fn test_directory_structure() {
        let (store, _temp) = create_test_store().await;

        let hash = store.write(b"layout").await.unwrap();
        let path = store.get_path(&hash).unwrap();
        assert!(path.exists());

        let parent = path.parent().unwrap();
        assert_eq!(parent.file_name().unwrap(), &hash[2..4]);
        assert_eq!(parent.parent().unwrap().file_name().unwrap(), &hash[0..2]);
    }

    #[tokio::test]
    async fn test_rejects_malformed_hash() {
        let (store, _temp) = create_test_store().await;

        assert!(store.exists("../../etc/passwd").await.is_err());
        assert!(matches!(
            store.read("abc").await,
            Err(AppError::ImageStore(_))
        ));
    }

    #[test]
    fn test_parse_data_url() {
        let image = CardImage::from_data_url("data:image/png;base64,aGVsbG8=").unwrap();
        assert_eq!(image.mime_type, "image/png");
        assert_eq!(image.decode().unwrap(), b"hello");
        assert_eq!(image.to_data_url(), "data:image/png;base64,aGVsbG8=");
    }

    #[test]
    fn test_bare_base64_defaults_to_jpeg() {
        let image = CardImage::from_data_url("aGVsbG8=").unwrap();
        assert_eq!(image.mime_type, "image/jpeg");
    }

    #[test]
    fn test_rejects_non_image_and_bad_payload() {
        assert!(CardImage::from_data_url("data:text/plain;base64,aGVsbG8=").is_err());
        assert!(CardImage::from_data_url("data:image/png,hello").is_err());
        assert!(CardImage::from_data_url("data:image/png;base64,***").is_err());
        assert!(CardImage::from_data_url("").is_err());
    }

    #[test]
    fn test_deserialize_both_shapes() {
        let from_url: CardImage =
            serde_json::from_str(r#""data:image/png;base64,aGVsbG8=""#).unwrap();
        let from_object: CardImage =
            serde_json::from_str(r#"{"mimeType":"image/png","data":"aGVsbG8="}"#).unwrap();

        assert_eq!(from_url, from_object);
    }
}
