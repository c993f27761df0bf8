//! Media inspection and remuxing capabilities.
//!
//! The upload pipeline only needs two things from a media toolkit: the
//! dimensions of the first video stream, and a fast-start copy of a file.

pub mod ffmpeg;

use async_trait::async_trait;
use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitStatus;
use std::time::Duration;
use tempfile::TempPath;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MediaError {
    #[error("couldn't run {tool}: {source}")]
    Spawn {
        tool: String,
        #[source]
        source: io::Error,
    },

    #[error("{tool} error ({status}): {stderr}")]
    ToolFailed {
        tool: String,
        status: ExitStatus,
        stderr: String,
    },

    #[error("{tool} did not finish within {}s", .timeout.as_secs())]
    TimedOut { tool: String, timeout: Duration },

    #[error("couldn't parse ffprobe output: {0}")]
    InvalidProbeOutput(#[from] serde_json::Error),

    #[error("no video streams found")]
    NoVideoStreams,

    #[error("video stream reports no dimensions")]
    MissingDimensions,

    #[error("couldn't stat processed file {}: {source}", .path.display())]
    OutputUnreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("processed file {} is empty", .path.display())]
    EmptyOutput { path: PathBuf },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamInfo {
    pub width: u32,
    pub height: u32,
}

/// Output of a fast-start remux. The file is deleted when this is dropped.
#[derive(Debug)]
pub struct TranscodedFile {
    path: TempPath,
    size: u64,
}

impl TranscodedFile {
    pub fn new(path: TempPath, size: u64) -> Self {
        Self { path, size }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn size(&self) -> u64 {
        self.size
    }
}

#[async_trait]
pub trait MediaToolkit: Send + Sync {
    /// Dimensions of the first video stream in `path`.
    async fn probe(&self, path: &Path) -> Result<StreamInfo, MediaError>;

    /// Stream-copies `source` into an MP4 whose index precedes the media data.
    async fn remux_fast_start(&self, source: &Path) -> Result<TranscodedFile, MediaError>;
}
