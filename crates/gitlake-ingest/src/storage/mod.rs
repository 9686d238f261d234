//! Blob object storage
//!
//! S3-compatible store for mirrored file blobs. Uploads are
//! overwrite-idempotent: re-putting the same key replaces the object and is
//! never an error.

use async_trait::async_trait;
use aws_sdk_s3::{
    config::{Credentials, Region},
    primitives::ByteStream,
    Client,
};
use tracing::{debug, info};

use gitlake_common::{GitLakeError, Result};

pub mod config;

/// Object storage operations the blob extractor needs
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Create the configured bucket if it does not exist.
    async fn ensure_bucket(&self) -> Result<()>;

    /// Put `data` at `key`, overwriting any existing object.
    async fn put(&self, key: &str, data: Vec<u8>, content_type: &str) -> Result<UploadResult>;
}

#[derive(Debug, Clone)]
pub struct UploadResult {
    pub key: String,
    pub checksum: String,
    pub size: i64,
}

/// S3-backed object store
#[derive(Clone)]
pub struct S3Storage {
    client: Client,
    bucket: String,
}

impl S3Storage {
    pub fn new(config: config::StorageConfig) -> Self {
        debug!("Initializing storage with config: {:?}", config);

        let credentials = Credentials::new(
            &config.access_key,
            &config.secret_key,
            None,
            None,
            "gitlake-storage",
        );

        let mut s3_config_builder = aws_sdk_s3::Config::builder()
            .credentials_provider(credentials)
            .region(Region::new(config.region.clone()))
            .force_path_style(config.path_style);

        if let Some(endpoint) = &config.endpoint {
            s3_config_builder = s3_config_builder.endpoint_url(endpoint);
        }

        let client = Client::from_conf(s3_config_builder.build());

        info!("Storage client initialized for bucket: {}", config.bucket);

        Self {
            client,
            bucket: config.bucket,
        }
    }
}

#[async_trait]
impl ObjectStore for S3Storage {
    async fn ensure_bucket(&self) -> Result<()> {
        if self
            .client
            .head_bucket()
            .bucket(&self.bucket)
            .send()
            .await
            .is_ok()
        {
            return Ok(());
        }

        match self.client.create_bucket().bucket(&self.bucket).send().await {
            Ok(_) => {
                info!("Created bucket: {}", self.bucket);
                Ok(())
            }
            Err(e) => {
                // Concurrent runs may race on creation.
                let service = e.into_service_error();
                if service.is_bucket_already_owned_by_you() || service.is_bucket_already_exists() {
                    Ok(())
                } else {
                    Err(GitLakeError::Storage(format!(
                        "failed to create bucket {}: {}",
                        self.bucket, service
                    )))
                }
            }
        }
    }

    async fn put(&self, key: &str, data: Vec<u8>, content_type: &str) -> Result<UploadResult> {
        let checksum = calculate_sha256(&data);
        let size = data.len() as i64;

        debug!("Uploading {} bytes to s3://{}/{}", size, self.bucket, key);

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type(content_type)
            .body(ByteStream::from(data))
            .send()
            .await
            .map_err(|e| {
                GitLakeError::Storage(format!("failed to upload s3://{}/{}: {}", self.bucket, key, e))
            })?;

        debug!("Uploaded s3://{}/{}", self.bucket, key);

        Ok(UploadResult {
            key: key.to_string(),
            checksum,
            size,
        })
    }
}

fn calculate_sha256(data: &[u8]) -> String {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(data);
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_calculate_sha256() {
        let data = b"Hello, World!";
        let checksum = calculate_sha256(data);
        assert_eq!(
            checksum,
            "dffd6021bb2bd5b0af676290809ec3a53191dd81c7f70a4b28688a362182986f"
        );
    }
}
