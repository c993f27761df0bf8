//! Object storage seam.
//!
//! Uploaded media lives in an S3-compatible bucket. Records in the database
//! only hold an [`ObjectLocation`]; a browsable URL is minted from it at read
//! time by [`ObjectStore::presign_get`].

pub mod s3;

use async_trait::async_trait;
use aws_sdk_s3::primitives::ByteStream;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("upload of {key} failed: {message}")]
    UploadFailed { key: String, message: String },

    #[error("couldn't read upload body: {0}")]
    Body(String),

    #[error("couldn't create presigned URL for {key}: {message}")]
    PresignFailed { key: String, message: String },
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Bucket and key of a stored object.
///
/// Persisted in a single text column as `"<bucket>,<key>"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectLocation {
    pub bucket: String,
    pub key: String,
}

impl ObjectLocation {
    pub fn new(bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            key: key.into(),
        }
    }

    pub fn encode(&self) -> String {
        format!("{},{}", self.bucket, self.key)
    }

    /// Splits on the first comma. Returns `None` for anything that is not a
    /// `bucket,key` pair, e.g. a plain URL written by an older deployment.
    pub fn parse(value: &str) -> Option<Self> {
        let (bucket, key) = value.split_once(',')?;
        Some(Self::new(bucket, key))
    }
}

impl fmt::Display for ObjectLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.bucket, self.key)
    }
}

#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Writes to the store's own bucket and returns where the object landed.
    async fn put_object(
        &self,
        key: &str,
        body: ByteStream,
        content_type: &str,
    ) -> StorageResult<ObjectLocation>;

    /// Signed GET URL for `location`, valid for `expires_in`.
    async fn presign_get(
        &self,
        location: &ObjectLocation,
        expires_in: Duration,
    ) -> StorageResult<String>;
}
