//! In-memory collaborators for tests.

use crate::config::settings::AppConfig;
use crate::infrastructure::media::{MediaError, MediaToolkit, StreamInfo, TranscodedFile};
use crate::infrastructure::storage::{ObjectLocation, ObjectStore, StorageError, StorageResult};
use crate::middleware::auth::{TOKEN_ISSUER, TokenClaims};
use crate::modules::video::model::Video;
use crate::modules::video::repository::VideoStore;
use crate::state::AppState;
use anyhow::{Result, anyhow};
use async_trait::async_trait;
use aws_sdk_s3::primitives::ByteStream;
use jsonwebtoken::{EncodingKey, Header, encode, get_current_timestamp};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempPath;
use time::OffsetDateTime;
use uuid::Uuid;

pub const TEST_JWT_SECRET: &str = "test-secret";

pub fn test_config(staging_dir: &Path) -> AppConfig {
    AppConfig {
        server_port: 0,
        database_url: "postgres://unused".into(),
        s3_bucket: "tubely-test".into(),
        s3_region: "us-east-1".into(),
        s3_endpoint: None,
        s3_access_key: "access".into(),
        s3_secret_key: "secret".into(),
        jwt_secret: TEST_JWT_SECRET.into(),
        ffmpeg_path: "ffmpeg".into(),
        ffprobe_path: "ffprobe".into(),
        media_tool_timeout_secs: 5,
        presign_expiry_secs: 600,
        staging_dir: staging_dir.to_path_buf(),
    }
}

pub fn test_state(
    staging_dir: &Path,
    media: Arc<FakeMedia>,
    storage: Arc<MemoryObjectStore>,
    videos: Arc<MemoryVideoStore>,
) -> AppState {
    AppState::new(test_config(staging_dir), videos, storage, media)
}

pub fn access_token(user_id: Uuid) -> String {
    let now = get_current_timestamp() as usize;
    let claims = TokenClaims {
        sub: user_id,
        iss: TOKEN_ISSUER.to_string(),
        iat: now,
        exp: now + 3600,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(TEST_JWT_SECRET.as_bytes()),
    )
    .unwrap()
}

pub fn sample_video(user_id: Uuid) -> Video {
    let now = OffsetDateTime::now_utc().replace_nanosecond(0).unwrap();
    Video {
        id: Uuid::new_v4(),
        created_at: now,
        updated_at: now,
        title: "Boots of the sea".into(),
        description: "A short clip".into(),
        thumbnail_url: None,
        video_url: None,
        user_id,
    }
}

/// Media toolkit that writes a fixed remux output next to the source and
/// reports fixed dimensions. Every path it sees is recorded.
pub struct FakeMedia {
    info: StreamInfo,
    empty_remux: bool,
    failing_probe: bool,
    probed: Mutex<Vec<PathBuf>>,
    remuxed: Mutex<Vec<PathBuf>>,
    outputs: Mutex<Vec<PathBuf>>,
}

impl FakeMedia {
    pub const REMUXED_BYTES: &'static [u8] = b"fast start mp4";

    pub fn new(info: StreamInfo) -> Self {
        Self {
            info,
            empty_remux: false,
            failing_probe: false,
            probed: Mutex::default(),
            remuxed: Mutex::default(),
            outputs: Mutex::default(),
        }
    }

    pub fn with_empty_remux(mut self) -> Self {
        self.empty_remux = true;
        self
    }

    pub fn with_failing_probe(mut self) -> Self {
        self.failing_probe = true;
        self
    }

    pub fn probed_paths(&self) -> Vec<PathBuf> {
        self.probed.lock().unwrap().clone()
    }

    pub fn remuxed_sources(&self) -> Vec<PathBuf> {
        self.remuxed.lock().unwrap().clone()
    }

    pub fn touched_paths(&self) -> Vec<PathBuf> {
        let mut paths = self.probed_paths();
        paths.extend(self.remuxed_sources());
        paths.extend(self.outputs.lock().unwrap().iter().cloned());
        paths
    }
}

#[async_trait]
impl MediaToolkit for FakeMedia {
    async fn probe(&self, path: &Path) -> Result<StreamInfo, MediaError> {
        self.probed.lock().unwrap().push(path.to_path_buf());
        if self.failing_probe || !path.exists() {
            return Err(MediaError::NoVideoStreams);
        }
        Ok(self.info)
    }

    async fn remux_fast_start(&self, source: &Path) -> Result<TranscodedFile, MediaError> {
        self.remuxed.lock().unwrap().push(source.to_path_buf());

        let mut output = source.as_os_str().to_owned();
        output.push(".processing");
        let output = PathBuf::from(output);

        let bytes: &[u8] = if self.empty_remux { b"" } else { Self::REMUXED_BYTES };
        tokio::fs::write(&output, bytes)
            .await
            .map_err(|source| MediaError::OutputUnreadable {
                path: output.clone(),
                source,
            })?;
        self.outputs.lock().unwrap().push(output.clone());

        let guard = TempPath::from_path(&output);
        if bytes.is_empty() {
            return Err(MediaError::EmptyOutput { path: output });
        }
        Ok(TranscodedFile::new(guard, bytes.len() as u64))
    }
}

/// Object store keeping bodies in memory. Presigned URLs embed a counter so
/// every call yields a different URL.
pub struct MemoryObjectStore {
    bucket: String,
    objects: Mutex<HashMap<String, (Vec<u8>, String)>>,
    failing_puts: bool,
    failing_presigns: bool,
    puts: AtomicUsize,
    presigns: AtomicUsize,
}

impl MemoryObjectStore {
    pub fn new(bucket: &str) -> Self {
        Self {
            bucket: bucket.to_string(),
            objects: Mutex::default(),
            failing_puts: false,
            failing_presigns: false,
            puts: AtomicUsize::new(0),
            presigns: AtomicUsize::new(0),
        }
    }

    pub fn failing_puts(mut self) -> Self {
        self.failing_puts = true;
        self
    }

    pub fn failing_presigns(mut self) -> Self {
        self.failing_presigns = true;
        self
    }

    pub fn put_count(&self) -> usize {
        self.puts.load(Ordering::SeqCst)
    }

    /// Body and content type stored under `key`.
    pub fn object(&self, key: &str) -> Option<(Vec<u8>, String)> {
        self.objects.lock().unwrap().get(key).cloned()
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn put_object(
        &self,
        key: &str,
        body: ByteStream,
        content_type: &str,
    ) -> StorageResult<ObjectLocation> {
        self.puts.fetch_add(1, Ordering::SeqCst);
        if self.failing_puts {
            return Err(StorageError::UploadFailed {
                key: key.to_string(),
                message: "simulated outage".into(),
            });
        }

        let data = body
            .collect()
            .await
            .map_err(|e| StorageError::Body(e.to_string()))?
            .into_bytes();
        self.objects
            .lock()
            .unwrap()
            .insert(key.to_string(), (data.to_vec(), content_type.to_string()));

        Ok(ObjectLocation::new(&self.bucket, key))
    }

    async fn presign_get(
        &self,
        location: &ObjectLocation,
        _expires_in: Duration,
    ) -> StorageResult<String> {
        if self.failing_presigns {
            return Err(StorageError::PresignFailed {
                key: location.key.clone(),
                message: "signing key unavailable".into(),
            });
        }
        let n = self.presigns.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(format!(
            "https://storage.test/{}/{}?X-Amz-Signature=sig{n}",
            location.bucket, location.key
        ))
    }
}

#[derive(Default)]
pub struct MemoryVideoStore {
    videos: Mutex<HashMap<Uuid, Video>>,
    failing_updates: bool,
}

impl MemoryVideoStore {
    pub fn failing_updates(mut self) -> Self {
        self.failing_updates = true;
        self
    }

    pub fn insert(&self, video: Video) {
        self.videos.lock().unwrap().insert(video.id, video);
    }

    pub fn get(&self, id: Uuid) -> Option<Video> {
        self.videos.lock().unwrap().get(&id).cloned()
    }
}

#[async_trait]
impl VideoStore for MemoryVideoStore {
    async fn get_video(&self, id: Uuid) -> Result<Option<Video>> {
        Ok(self.get(id))
    }

    async fn list_videos_for_user(&self, user_id: Uuid) -> Result<Vec<Video>> {
        let mut videos: Vec<Video> = self
            .videos
            .lock()
            .unwrap()
            .values()
            .filter(|v| v.user_id == user_id)
            .cloned()
            .collect();
        videos.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(videos)
    }

    async fn update_video(&self, video: &Video) -> Result<()> {
        if self.failing_updates {
            return Err(anyhow!("database unavailable"));
        }
        let mut videos = self.videos.lock().unwrap();
        if !videos.contains_key(&video.id) {
            return Err(anyhow!("Video {} not found", video.id));
        }
        videos.insert(video.id, video.clone());
        Ok(())
    }
}
