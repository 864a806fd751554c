use async_trait::async_trait;
use std::path::PathBuf;
use tracing::debug;
use uuid::Uuid;

use crate::core::config::LocalStorageConfig;
use crate::core::error::AppError;
use crate::modules::storage::{sanitize_file_name, UploadStorage};

/// Subdirectory of the media root that uploads land in
const UPLOAD_DIR: &str = "files";

/// Writes uploads below a media directory on the local filesystem
pub struct LocalUploadStorage {
    media_root: PathBuf,
    media_url: String,
}

impl LocalUploadStorage {
    pub fn new(config: LocalStorageConfig) -> Self {
        Self {
            media_root: config.media_root,
            media_url: config.media_url,
        }
    }
}

#[async_trait]
impl UploadStorage for LocalUploadStorage {
    async fn save(
        &self,
        original_name: &str,
        data: Vec<u8>,
        _content_type: &str,
    ) -> Result<String, AppError> {
        let dir = self.media_root.join(UPLOAD_DIR);
        tokio::fs::create_dir_all(&dir).await.map_err(|e| {
            AppError::Storage(format!("Failed to create '{}': {}", dir.display(), e))
        })?;

        // the id prefix keeps same-named uploads from overwriting each other
        let file_name = format!("{}-{}", Uuid::now_v7(), sanitize_file_name(original_name));
        let path = dir.join(&file_name);

        tokio::fs::write(&path, &data).await.map_err(|e| {
            AppError::Storage(format!("Failed to write '{}': {}", path.display(), e))
        })?;
        debug!("Stored upload {} ({} bytes)", path.display(), data.len());

        Ok(format!("{}/{}/{}", self.media_url, UPLOAD_DIR, file_name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_save_writes_file_and_returns_url() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalUploadStorage::new(LocalStorageConfig {
            media_root: dir.path().to_path_buf(),
            media_url: "/media".to_string(),
        });

        let url = storage
            .save("my cv.pdf", b"%PDF-1.4".to_vec(), "application/pdf")
            .await
            .unwrap();

        assert!(url.starts_with("/media/files/"));
        assert!(url.ends_with("-my_cv.pdf"));

        let stored_name = url.rsplit('/').next().unwrap();
        let bytes = std::fs::read(dir.path().join("files").join(stored_name)).unwrap();
        assert_eq!(bytes, b"%PDF-1.4");
    }

    #[tokio::test]
    async fn test_same_name_does_not_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalUploadStorage::new(LocalStorageConfig {
            media_root: dir.path().to_path_buf(),
            media_url: "/media".to_string(),
        });

        let a = storage.save("cv.pdf", vec![1], "application/pdf").await.unwrap();
        let b = storage.save("cv.pdf", vec![2], "application/pdf").await.unwrap();
        assert_ne!(a, b);
    }
}
