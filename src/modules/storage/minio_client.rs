//! MinIO/S3-compatible upload storage
//!
//! Uses rust-s3 crate for lightweight S3 operations.

use async_trait::async_trait;
use s3::creds::Credentials;
use s3::{Bucket, BucketConfiguration, Region};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::core::config::MinIOConfig;
use crate::core::error::AppError;
use crate::modules::storage::{sanitize_file_name, UploadStorage};

/// MinIO/S3-compatible storage client
pub struct MinIOClient {
    bucket: Box<Bucket>,
    region: Region,
    credentials: Credentials,
    public_endpoint: String,
    prefix: String,
}

impl MinIOClient {
    /// Create a new MinIO client from configuration and make sure the bucket
    /// exists
    pub async fn new(config: MinIOConfig) -> Result<Self, AppError> {
        let credentials = Credentials::new(
            Some(&config.access_key),
            Some(&config.secret_key),
            None,
            None,
            None,
        )
        .map_err(|e| AppError::Internal(format!("Failed to create MinIO credentials: {}", e)))?;

        let region = Region::Custom {
            region: config.region.clone(),
            endpoint: config.endpoint.clone(),
        };

        let mut bucket = Bucket::new(&config.bucket, region.clone(), credentials.clone())
            .map_err(|e| AppError::Internal(format!("Failed to create MinIO bucket: {}", e)))?;

        // Use path-style URLs for MinIO (http://endpoint/bucket instead of http://bucket.endpoint)
        bucket.set_path_style();

        let client = Self {
            bucket,
            region,
            credentials,
            public_endpoint: config.public_endpoint.trim_end_matches('/').to_string(),
            prefix: config.prefix.trim_matches('/').to_string(),
        };

        client.ensure_bucket_exists().await;

        info!(
            "MinIO client initialized for endpoint: {}, bucket: {}, prefix: {}",
            config.endpoint,
            client.bucket.name(),
            client.prefix
        );

        Ok(client)
    }

    /// Create the bucket unless it is already there
    async fn ensure_bucket_exists(&self) {
        let result = Bucket::create_with_path_style(
            &self.bucket.name(),
            self.region.clone(),
            self.credentials.clone(),
            BucketConfiguration::default(),
        )
        .await;

        match result {
            Ok(_) => info!("Bucket '{}' created successfully", self.bucket.name()),
            Err(e) => {
                let error_str = e.to_string();
                if error_str.contains("BucketAlreadyOwnedByYou")
                    || error_str.contains("BucketAlreadyExists")
                    || error_str.contains("already own it")
                {
                    debug!("Bucket '{}' already exists", self.bucket.name());
                } else {
                    warn!(
                        "Could not create bucket '{}': {}. Assuming it exists.",
                        self.bucket.name(),
                        e
                    );
                }
            }
        }
    }

    /// Object key for an upload, unique per call
    pub fn generate_key(&self, original_name: &str) -> String {
        object_key(&self.prefix, Uuid::now_v7(), original_name)
    }

    pub fn get_file_url(&self, key: &str) -> String {
        format!("{}/{}/{}", self.public_endpoint, self.bucket.name(), key)
    }

    pub fn bucket_name(&self) -> String {
        self.bucket.name()
    }
}

fn object_key(prefix: &str, id: Uuid, original_name: &str) -> String {
    let name = format!("{}-{}", id, sanitize_file_name(original_name));
    if prefix.is_empty() {
        name
    } else {
        format!("{}/{}", prefix, name)
    }
}

#[async_trait]
impl UploadStorage for MinIOClient {
    async fn save(
        &self,
        original_name: &str,
        data: Vec<u8>,
        content_type: &str,
    ) -> Result<String, AppError> {
        let key = self.generate_key(original_name);

        self.bucket
            .put_object_with_content_type(&key, &data, content_type)
            .await
            .map_err(|e| AppError::Storage(format!("Failed to upload file '{}': {}", key, e)))?;

        debug!("Uploaded file '{}' to bucket '{}'", key, self.bucket.name());
        Ok(self.get_file_url(&key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_key_layout() {
        let id = Uuid::nil();
        assert_eq!(
            object_key("files", id, "cv.pdf"),
            "files/00000000-0000-0000-0000-000000000000-cv.pdf"
        );
        assert_eq!(
            object_key("", id, "a b.pdf"),
            "00000000-0000-0000-0000-000000000000-a_b.pdf"
        );
    }
}
