use super::model::Video;
use super::naming::{object_key, random_file_name};
use crate::infrastructure::storage::{ObjectLocation, ObjectStore, StorageResult};
use crate::state::AppState;
use anyhow::Result;
use aws_sdk_s3::primitives::ByteStream;
use bytes::Bytes;
use std::time::Duration;
use tracing::info;
use uuid::Uuid;

pub const THUMBNAIL_PREFIX: &str = "thumbnails";

pub struct VideoService;

impl VideoService {
    /// Replaces stored object references on `video` with presigned URLs.
    ///
    /// Fields that are empty or not a `bucket,key` pair are left as they are.
    pub async fn sign_video(
        storage: &dyn ObjectStore,
        mut video: Video,
        expires_in: Duration,
    ) -> StorageResult<Video> {
        video.video_url = Self::sign_reference(storage, video.video_url.take(), expires_in).await?;
        video.thumbnail_url =
            Self::sign_reference(storage, video.thumbnail_url.take(), expires_in).await?;
        Ok(video)
    }

    async fn sign_reference(
        storage: &dyn ObjectStore,
        reference: Option<String>,
        expires_in: Duration,
    ) -> StorageResult<Option<String>> {
        let Some(reference) = reference else {
            return Ok(None);
        };
        match ObjectLocation::parse(&reference) {
            Some(location) => storage.presign_get(&location, expires_in).await.map(Some),
            None => Ok(Some(reference)),
        }
    }

    pub async fn get_video(state: &AppState, id: Uuid) -> Result<Option<Video>> {
        let Some(video) = state.videos.get_video(id).await? else {
            return Ok(None);
        };
        let video =
            Self::sign_video(state.storage.as_ref(), video, state.config.presign_expiry()).await?;
        Ok(Some(video))
    }

    pub async fn list_videos(state: &AppState, user_id: Uuid) -> Result<Vec<Video>> {
        let videos = state.videos.list_videos_for_user(user_id).await?;

        let mut signed = Vec::with_capacity(videos.len());
        for video in videos {
            signed.push(
                Self::sign_video(state.storage.as_ref(), video, state.config.presign_expiry())
                    .await?,
            );
        }
        Ok(signed)
    }

    /// Stores a thumbnail image and points `video.thumbnail_url` at it.
    pub async fn attach_thumbnail(
        state: &AppState,
        mut video: Video,
        media_type: &str,
        data: Bytes,
    ) -> Result<Video> {
        let key = object_key(THUMBNAIL_PREFIX, &random_file_name(media_type));
        let size = data.len();

        let location = state
            .storage
            .put_object(&key, ByteStream::from(data), media_type)
            .await?;
        info!(video_id = %video.id, %location, bytes = size, "Thumbnail stored");

        video.thumbnail_url = Some(location.encode());
        state.videos.update_video(&video).await?;
        Ok(video)
    }
}
