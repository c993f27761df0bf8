use super::model::Video;
use crate::infrastructure::db::pool::DbPool;
use anyhow::{Result, anyhow};
use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

const VIDEO_COLUMNS: &str =
    "id, created_at, updated_at, title, description, thumbnail_url, video_url, user_id";

/// Video metadata persistence as seen by the upload pipeline and handlers.
#[async_trait]
pub trait VideoStore: Send + Sync {
    async fn get_video(&self, id: Uuid) -> Result<Option<Video>>;

    async fn list_videos_for_user(&self, user_id: Uuid) -> Result<Vec<Video>>;

    /// Writes every mutable column of `video`. Fails if the row is gone.
    async fn update_video(&self, video: &Video) -> Result<()>;
}

pub struct VideoRepository;

impl VideoRepository {
    pub async fn get_video_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Video>> {
        let video = sqlx::query_as::<_, Video>(&format!(
            "SELECT {VIDEO_COLUMNS} FROM videos WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(pool)
        .await?;
        Ok(video)
    }

    pub async fn list_videos_by_user(pool: &PgPool, user_id: Uuid) -> Result<Vec<Video>> {
        let videos = sqlx::query_as::<_, Video>(&format!(
            "SELECT {VIDEO_COLUMNS} FROM videos WHERE user_id = $1 ORDER BY created_at DESC"
        ))
        .bind(user_id)
        .fetch_all(pool)
        .await?;
        Ok(videos)
    }

    pub async fn update_video(pool: &PgPool, video: &Video) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE videos
            SET title = $1, description = $2, thumbnail_url = $3, video_url = $4, updated_at = NOW()
            WHERE id = $5
            "#,
        )
        .bind(&video.title)
        .bind(&video.description)
        .bind(&video.thumbnail_url)
        .bind(&video.video_url)
        .bind(video.id)
        .execute(pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(anyhow!("Video {} not found", video.id));
        }
        Ok(())
    }
}

#[derive(Clone)]
pub struct PgVideoStore {
    pool: DbPool,
}

impl PgVideoStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl VideoStore for PgVideoStore {
    async fn get_video(&self, id: Uuid) -> Result<Option<Video>> {
        VideoRepository::get_video_by_id(&self.pool, id).await
    }

    async fn list_videos_for_user(&self, user_id: Uuid) -> Result<Vec<Video>> {
        VideoRepository::list_videos_by_user(&self.pool, user_id).await
    }

    async fn update_video(&self, video: &Video) -> Result<()> {
        VideoRepository::update_video(&self.pool, video).await
    }
}
