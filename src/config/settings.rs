use crate::config::env::{self, EnvKey};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use url::Url;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),

    #[error("{key} is not a valid URL: {source}")]
    InvalidUrl {
        key: &'static str,
        #[source]
        source: url::ParseError,
    },

    #[error("{key} has invalid value {value:?}: {expected}")]
    Invalid {
        key: &'static str,
        value: String,
        expected: String,
    },
}

/// SigV4 presigned URLs cannot outlive seven days.
pub const MAX_PRESIGN_EXPIRY_SECS: u64 = 7 * 24 * 60 * 60;

#[derive(Clone, Debug, Deserialize)]
pub struct AppConfig {
    pub server_port: u16,
    pub database_url: String,
    pub s3_bucket: String,
    pub s3_region: String,
    pub s3_endpoint: Option<String>,
    pub s3_access_key: String,
    pub s3_secret_key: String,
    pub jwt_secret: String,
    pub ffmpeg_path: String,
    pub ffprobe_path: String,
    pub media_tool_timeout_secs: u64,
    pub presign_expiry_secs: u64,
    pub staging_dir: PathBuf,
}

impl AppConfig {
    pub fn new() -> Result<Self, ConfigError> {
        let s3_endpoint = env::get_optional(EnvKey::S3Endpoint);
        if let Some(endpoint) = &s3_endpoint {
            Url::parse(endpoint).map_err(|source| ConfigError::InvalidUrl {
                key: EnvKey::S3Endpoint.as_str(),
                source,
            })?;
        }

        Ok(Self {
            server_port: env::get_parsed(EnvKey::ServerPort, 8091),
            database_url: required(EnvKey::DatabaseUrl)?,
            s3_bucket: required(EnvKey::S3Bucket)?,
            s3_region: required(EnvKey::S3Region)?,
            s3_endpoint,
            s3_access_key: required(EnvKey::S3AccessKey)?,
            s3_secret_key: required(EnvKey::S3SecretKey)?,
            jwt_secret: required(EnvKey::JwtSecret)?,
            ffmpeg_path: env::get_or(EnvKey::FfmpegPath, "ffmpeg"),
            ffprobe_path: env::get_or(EnvKey::FfprobePath, "ffprobe"),
            media_tool_timeout_secs: seconds(EnvKey::MediaToolTimeoutSecs, 300, u64::MAX)?,
            presign_expiry_secs: seconds(EnvKey::PresignExpirySecs, 600, MAX_PRESIGN_EXPIRY_SECS)?,
            staging_dir: env::get_optional(EnvKey::StagingDir)
                .map(PathBuf::from)
                .unwrap_or_else(std::env::temp_dir),
        })
    }

    pub fn media_tool_timeout(&self) -> Duration {
        Duration::from_secs(self.media_tool_timeout_secs)
    }

    pub fn presign_expiry(&self) -> Duration {
        Duration::from_secs(self.presign_expiry_secs)
    }
}

fn required(key: EnvKey) -> Result<String, ConfigError> {
    env::get_optional(key).ok_or(ConfigError::Missing(key.as_str()))
}

fn seconds(key: EnvKey, default: u64, max: u64) -> Result<u64, ConfigError> {
    parse_seconds(key.as_str(), env::get_optional(key).as_deref(), default, max)
}

/// Unset means `default`. Anything else must be a whole number of seconds in
/// `1..=max`.
fn parse_seconds(
    key: &'static str,
    raw: Option<&str>,
    default: u64,
    max: u64,
) -> Result<u64, ConfigError> {
    let Some(raw) = raw else {
        return Ok(default);
    };
    match raw.trim().parse::<u64>() {
        Ok(secs) if (1..=max).contains(&secs) => Ok(secs),
        _ => Err(ConfigError::Invalid {
            key,
            value: raw.to_string(),
            expected: format!("whole seconds between 1 and {max}"),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: &str = "PRESIGN_EXPIRY_SECS";

    #[test]
    fn unset_seconds_use_default() {
        assert_eq!(parse_seconds(KEY, None, 600, MAX_PRESIGN_EXPIRY_SECS).unwrap(), 600);
    }

    #[test]
    fn accepts_values_within_range() {
        assert_eq!(parse_seconds(KEY, Some("1"), 600, MAX_PRESIGN_EXPIRY_SECS).unwrap(), 1);
        assert_eq!(parse_seconds(KEY, Some(" 3600 "), 600, MAX_PRESIGN_EXPIRY_SECS).unwrap(), 3600);
        assert_eq!(
            parse_seconds(KEY, Some("604800"), 600, MAX_PRESIGN_EXPIRY_SECS).unwrap(),
            MAX_PRESIGN_EXPIRY_SECS
        );
    }

    #[test]
    fn zero_is_rejected() {
        let err = parse_seconds("MEDIA_TOOL_TIMEOUT_SECS", Some("0"), 300, u64::MAX).unwrap_err();
        match err {
            ConfigError::Invalid { key, value, .. } => {
                assert_eq!(key, "MEDIA_TOOL_TIMEOUT_SECS");
                assert_eq!(value, "0");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn unparseable_values_are_rejected_not_defaulted() {
        for raw in ["five", "-1", "1.5", "300s"] {
            assert!(
                matches!(
                    parse_seconds("MEDIA_TOOL_TIMEOUT_SECS", Some(raw), 300, u64::MAX),
                    Err(ConfigError::Invalid { .. })
                ),
                "{raw} was accepted"
            );
        }
    }

    #[test]
    fn presign_expiry_is_capped_at_seven_days() {
        let err = parse_seconds(KEY, Some("604801"), 600, MAX_PRESIGN_EXPIRY_SECS).unwrap_err();
        assert!(err.to_string().contains("between 1 and 604800"));
    }
}
