use std::env;
use std::str::FromStr;

#[derive(Debug, Clone, Copy)]
pub enum EnvKey {
    ServerPort,
    DatabaseUrl,
    S3Bucket,
    S3Region,
    S3Endpoint,
    S3AccessKey,
    S3SecretKey,
    JwtSecret,
    FfmpegPath,
    FfprobePath,
    MediaToolTimeoutSecs,
    PresignExpirySecs,
    StagingDir,
}

impl EnvKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            EnvKey::ServerPort => "APP_PORT",
            EnvKey::DatabaseUrl => "DATABASE_URL",
            EnvKey::S3Bucket => "S3_BUCKET",
            EnvKey::S3Region => "S3_REGION",
            EnvKey::S3Endpoint => "S3_ENDPOINT",
            EnvKey::S3AccessKey => "AWS_ACCESS_KEY_ID",
            EnvKey::S3SecretKey => "AWS_SECRET_ACCESS_KEY",
            EnvKey::JwtSecret => "JWT_SECRET",
            EnvKey::FfmpegPath => "FFMPEG_PATH",
            EnvKey::FfprobePath => "FFPROBE_PATH",
            EnvKey::MediaToolTimeoutSecs => "MEDIA_TOOL_TIMEOUT_SECS",
            EnvKey::PresignExpirySecs => "PRESIGN_EXPIRY_SECS",
            EnvKey::StagingDir => "STAGING_DIR",
        }
    }
}

pub fn get(key: EnvKey) -> Result<String, env::VarError> {
    env::var(key.as_str())
}

/// Unset and empty values both read as `None`.
pub fn get_optional(key: EnvKey) -> Option<String> {
    env::var(key.as_str()).ok().filter(|v| !v.trim().is_empty())
}

pub fn get_or(key: EnvKey, default: &str) -> String {
    env::var(key.as_str()).unwrap_or_else(|_| default.to_string())
}

pub fn get_parsed<T: FromStr>(key: EnvKey, default: T) -> T {
    match get(key) {
        Ok(val) => val.parse::<T>().unwrap_or(default),
        Err(_) => default,
    }
}
