use super::{ObjectLocation, ObjectStore, StorageError, StorageResult};
use async_trait::async_trait;
use aws_sdk_s3::config::Builder;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::{Client, config::BehaviorVersion, config::Credentials, config::Region};
use std::time::{Duration, Instant};
use tracing::{error, info};

#[derive(Clone)]
pub struct StorageService {
    client: Client,
    bucket: String,
}

impl StorageService {
    /// Builds a client with static credentials. A custom `endpoint` switches to
    /// path-style addressing, which MinIO and most S3 clones require.
    pub fn new(
        endpoint: Option<&str>,
        region: &str,
        bucket: &str,
        access_key: &str,
        secret_key: &str,
    ) -> Self {
        let credentials = Credentials::new(access_key, secret_key, None, None, "static");

        let mut config = Builder::new()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new(region.to_string()))
            .credentials_provider(credentials);

        if let Some(endpoint) = endpoint {
            config = config.endpoint_url(endpoint).force_path_style(true);
        }

        let client = Client::from_conf(config.build());

        info!(bucket, region, endpoint = ?endpoint, "✅ S3 client configured");

        Self {
            client,
            bucket: bucket.to_string(),
        }
    }
}

#[async_trait]
impl ObjectStore for StorageService {
    async fn put_object(
        &self,
        key: &str,
        body: ByteStream,
        content_type: &str,
    ) -> StorageResult<ObjectLocation> {
        let start = Instant::now();

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(body)
            .content_type(content_type)
            .send()
            .await
            .map_err(|e| {
                error!(bucket = %self.bucket, key, error = %DisplayErrorContext(&e), "S3 upload failed");
                StorageError::UploadFailed {
                    key: key.to_string(),
                    message: DisplayErrorContext(&e).to_string(),
                }
            })?;

        info!(
            bucket = %self.bucket,
            key,
            duration_ms = start.elapsed().as_millis() as u64,
            "S3 upload successful"
        );

        Ok(ObjectLocation::new(&self.bucket, key))
    }

    async fn presign_get(
        &self,
        location: &ObjectLocation,
        expires_in: Duration,
    ) -> StorageResult<String> {
        let presign_failed = |message: String| StorageError::PresignFailed {
            key: location.key.clone(),
            message,
        };

        let presigning_config =
            PresigningConfig::expires_in(expires_in).map_err(|e| presign_failed(e.to_string()))?;

        let request = self
            .client
            .get_object()
            .bucket(&location.bucket)
            .key(&location.key)
            .presigned(presigning_config)
            .await
            .map_err(|e| presign_failed(DisplayErrorContext(&e).to_string()))?;

        Ok(request.uri().to_string())
    }
}
