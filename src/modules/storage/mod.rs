//! Storage for uploaded files
//!
//! Uploads are written either to a local media directory served by the app
//! or to a MinIO/S3-compatible bucket. Both hand back the URL that is stored
//! on the record.

mod local;
mod minio_client;

use async_trait::async_trait;

use crate::core::error::AppError;

pub use local::LocalUploadStorage;
pub use minio_client::MinIOClient;

#[async_trait]
pub trait UploadStorage: Send + Sync {
    /// Persist the bytes and return the URL they are reachable under
    async fn save(
        &self,
        original_name: &str,
        data: Vec<u8>,
        content_type: &str,
    ) -> Result<String, AppError>;
}

/// Reduce an uploaded filename to a safe single path segment
pub(crate) fn sanitize_file_name(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_start_matches('.');

    if cleaned.is_empty() {
        "upload".to_string()
    } else {
        cleaned.to_string()
    }
}
