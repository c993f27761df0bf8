//! The video upload pipeline.
//!
//! ```text
//! ReceivingUpload -> Staged -> Transcoding -> Transcoded -> Classifying
//!     -> Classified -> Uploading -> Persisted
//! ```
//!
//! Any step may fail. The staged upload and the remuxed copy are both owned
//! by drop guards, so they are removed however the pipeline exits.

use super::aspect::classify_video;
use super::model::Video;
use super::naming::{object_key, random_file_name};
use super::repository::VideoStore;
use crate::common::upload::{UploadedMedia, stage_upload};
use crate::infrastructure::media::{MediaError, MediaToolkit};
use crate::infrastructure::storage::{ObjectStore, StorageError};
use crate::state::AppState;
use aws_sdk_s3::primitives::ByteStream;
use std::fmt;
use std::path::Path;
use thiserror::Error;
use tokio::io::AsyncRead;
use tracing::{info, warn};

pub const SUPPORTED_VIDEO_TYPE: &str = "video/mp4";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadStage {
    ReceivingUpload,
    Staged,
    Transcoding,
    Transcoded,
    Classifying,
    Classified,
    Uploading,
    Persisted,
}

impl UploadStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            UploadStage::ReceivingUpload => "receiving_upload",
            UploadStage::Staged => "staged",
            UploadStage::Transcoding => "transcoding",
            UploadStage::Transcoded => "transcoded",
            UploadStage::Classifying => "classifying",
            UploadStage::Classified => "classified",
            UploadStage::Uploading => "uploading",
            UploadStage::Persisted => "persisted",
        }
    }
}

impl fmt::Display for UploadStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum UploadFailure {
    #[error("invalid Content-Type {0:?}")]
    InvalidContentType(String),

    #[error("invalid media type {0}, only mp4 is supported")]
    UnsupportedMediaType(String),

    #[error("couldn't write upload to disk: {0}")]
    Staging(#[from] std::io::Error),

    #[error(transparent)]
    Media(#[from] MediaError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("couldn't update video information: {0}")]
    Database(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// A pipeline run that ended in the `Failed` state.
#[derive(Debug, Error)]
#[error("video upload failed before reaching {failed_at}: {failure}")]
pub struct UploadError {
    /// The state the pipeline was unable to reach.
    pub failed_at: UploadStage,
    pub failure: UploadFailure,
}

impl UploadError {
    pub fn new(failed_at: UploadStage, failure: impl Into<UploadFailure>) -> Self {
        Self {
            failed_at,
            failure: failure.into(),
        }
    }
}

fn failed_at<E: Into<UploadFailure>>(stage: UploadStage) -> impl FnOnce(E) -> UploadError {
    move |e| UploadError::new(stage, e)
}

/// Validates the declared content type and returns its essence
/// (`type/subtype`, parameters dropped).
fn accepted_media_type(content_type: Option<&str>) -> Result<String, UploadFailure> {
    let raw = content_type.unwrap_or_default();
    let parsed: mime::Mime = raw
        .parse()
        .map_err(|_| UploadFailure::InvalidContentType(raw.to_string()))?;

    let essence = parsed.essence_str();
    if essence != SUPPORTED_VIDEO_TYPE {
        return Err(UploadFailure::UnsupportedMediaType(essence.to_string()));
    }
    Ok(essence.to_string())
}

pub struct UploadOrchestrator<'a> {
    media: &'a dyn MediaToolkit,
    storage: &'a dyn ObjectStore,
    videos: &'a dyn VideoStore,
    staging_dir: &'a Path,
}

impl<'a> UploadOrchestrator<'a> {
    pub fn new(
        media: &'a dyn MediaToolkit,
        storage: &'a dyn ObjectStore,
        videos: &'a dyn VideoStore,
        staging_dir: &'a Path,
    ) -> Self {
        Self {
            media,
            storage,
            videos,
            staging_dir,
        }
    }

    pub fn from_state(state: &'a AppState) -> Self {
        Self::new(
            state.media.as_ref(),
            state.storage.as_ref(),
            state.videos.as_ref(),
            &state.config.staging_dir,
        )
    }

    /// Runs one upload through to a persisted `video_url` and returns the
    /// updated record.
    #[tracing::instrument(skip_all, fields(video_id = %video.id))]
    pub async fn process<R>(&self, mut video: Video, upload: UploadedMedia<R>) -> Result<Video, UploadError>
    where
        R: AsyncRead + Unpin + Send,
    {
        let media_type = accepted_media_type(upload.content_type.as_deref())
            .map_err(failed_at(UploadStage::Staged))?;

        let staged = stage_upload(self.staging_dir, upload.body)
            .await
            .map_err(failed_at(UploadStage::Staged))?;
        info!(
            stage = %UploadStage::Staged,
            path = %staged.path().display(),
            bytes = staged.size(),
            "Upload staged"
        );

        info!(stage = %UploadStage::Transcoding, "Remuxing for fast start");
        let transcoded = self
            .media
            .remux_fast_start(staged.path())
            .await
            .map_err(failed_at(UploadStage::Transcoded))?;
        info!(stage = %UploadStage::Transcoded, bytes = transcoded.size(), "Remux complete");

        // Stream-copy keeps dimensions, so the original upload is probed.
        info!(stage = %UploadStage::Classifying, "Probing aspect ratio");
        let bucket = classify_video(self.media, staged.path())
            .await
            .map_err(failed_at(UploadStage::Classified))?;
        info!(stage = %UploadStage::Classified, aspect = %bucket, "Aspect ratio classified");

        let key = object_key(bucket.as_str(), &random_file_name(&media_type));
        info!(stage = %UploadStage::Uploading, %key, "Uploading to object store");
        let body = ByteStream::from_path(transcoded.path())
            .await
            .map_err(|e| StorageError::Body(e.to_string()))
            .map_err(failed_at(UploadStage::Uploading))?;
        let location = self
            .storage
            .put_object(&key, body, &media_type)
            .await
            .map_err(failed_at(UploadStage::Uploading))?;

        video.video_url = Some(location.encode());
        if let Err(e) = self.videos.update_video(&video).await {
            warn!(%location, "Uploaded object is not referenced by any video");
            return Err(UploadError::new(
                UploadStage::Persisted,
                UploadFailure::Database(e.into()),
            ));
        }
        info!(stage = %UploadStage::Persisted, %location, "Video upload persisted");

        Ok(video)
    }
}
