use crate::traits::{Storage, StorageError, StorageResult};
use crate::StorageBackend;
use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_s3::config::Region;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use std::path::Path;
use tokio::fs;
use tokio::io::AsyncWriteExt;

/// S3 storage implementation
///
/// One client serves every bucket; requests name their bucket explicitly.
#[derive(Clone)]
pub struct S3Storage {
    client: Client,
}

impl S3Storage {
    /// Create a new S3Storage instance
    ///
    /// Credentials come from the standard AWS provider chain.
    ///
    /// # Arguments
    /// * `region` - AWS region; falls back to the provider chain when `None`
    /// * `endpoint_url` - Optional custom endpoint for S3-compatible providers
    ///   (e.g., "http://localhost:9000" for MinIO). Path-style addressing is used
    ///   whenever an endpoint is given.
    pub async fn new(region: Option<String>, endpoint_url: Option<String>) -> StorageResult<Self> {
        let mut loader = aws_config::defaults(BehaviorVersion::latest());
        if let Some(region) = region {
            loader = loader.region(Region::new(region));
        }
        let shared = loader.load().await;

        if shared.region().is_none() {
            return Err(StorageError::ConfigError(
                "No AWS region configured (set S3_REGION or AWS_REGION)".to_string(),
            ));
        }

        let mut builder = aws_sdk_s3::config::Builder::from(&shared);
        if let Some(ref endpoint) = endpoint_url {
            builder = builder.endpoint_url(endpoint).force_path_style(true);
        }

        tracing::info!(
            endpoint = endpoint_url.as_deref().unwrap_or("aws"),
            "S3 client initialized"
        );

        Ok(S3Storage {
            client: Client::from_conf(builder.build()),
        })
    }
}

#[async_trait]
impl Storage for S3Storage {
    async fn download(&self, bucket: &str, key: &str, destination: &Path) -> StorageResult<u64> {
        let start = std::time::Instant::now();

        let response = self
            .client
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| {
                if e.as_service_error().is_some_and(|se| se.is_no_such_key()) {
                    return StorageError::NotFound(format!("{}/{}", bucket, key));
                }
                let message = DisplayErrorContext(&e).to_string();
                tracing::error!(
                    error = %message,
                    bucket = %bucket,
                    key = %key,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "S3 download failed"
                );
                StorageError::DownloadFailed(message)
            })?;

        let mut reader = response.body.into_async_read();
        let mut file = fs::File::create(destination).await.map_err(|e| {
            StorageError::DownloadFailed(format!(
                "Failed to create file {}: {}",
                destination.display(),
                e
            ))
        })?;

        let size = tokio::io::copy(&mut reader, &mut file).await.map_err(|e| {
            StorageError::DownloadFailed(format!("Failed to read object body: {}", e))
        })?;
        file.flush().await?;

        tracing::info!(
            bucket = %bucket,
            key = %key,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "S3 download successful"
        );

        Ok(size)
    }

    async fn upload(
        &self,
        bucket: &str,
        key: &str,
        content_type: &str,
        source: &Path,
    ) -> StorageResult<u64> {
        let start = std::time::Instant::now();
        let size = fs::metadata(source).await?.len();

        let body = ByteStream::from_path(source).await.map_err(|e| {
            StorageError::UploadFailed(format!("Failed to open {}: {}", source.display(), e))
        })?;

        self.client
            .put_object()
            .bucket(bucket)
            .key(key)
            .content_type(content_type)
            .body(body)
            .send()
            .await
            .map_err(|e| {
                let message = DisplayErrorContext(&e).to_string();
                tracing::error!(
                    error = %message,
                    bucket = %bucket,
                    key = %key,
                    size_bytes = size,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "S3 upload failed"
                );
                StorageError::UploadFailed(message)
            })?;

        tracing::info!(
            bucket = %bucket,
            key = %key,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "S3 upload successful"
        );

        Ok(size)
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::S3
    }
}
