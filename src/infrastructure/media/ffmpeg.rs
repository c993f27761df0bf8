use super::{MediaError, MediaToolkit, StreamInfo, TranscodedFile};
use async_trait::async_trait;
use serde::Deserialize;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::{Output, Stdio};
use std::time::Duration;
use tempfile::TempPath;
use tokio::process::Command;
use tracing::{error, info};

#[derive(Debug, Deserialize)]
struct ProbeOutput {
    #[serde(default)]
    streams: Vec<ProbeStream>,
}

#[derive(Debug, Deserialize)]
struct ProbeStream {
    codec_type: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
}

/// [`MediaToolkit`] backed by the `ffprobe` and `ffmpeg` binaries.
///
/// Every invocation is bounded by `timeout`; a child that overruns it is
/// killed.
#[derive(Debug, Clone)]
pub struct FfmpegToolkit {
    ffmpeg_path: String,
    ffprobe_path: String,
    timeout: Duration,
}

impl FfmpegToolkit {
    pub fn new(ffmpeg_path: impl Into<String>, ffprobe_path: impl Into<String>, timeout: Duration) -> Self {
        Self {
            ffmpeg_path: ffmpeg_path.into(),
            ffprobe_path: ffprobe_path.into(),
            timeout,
        }
    }

    async fn run_tool(&self, program: &str, args: &[&OsStr]) -> Result<Output, MediaError> {
        let spawn_failed = |source| MediaError::Spawn {
            tool: program.to_string(),
            source,
        };

        let child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(spawn_failed)?;

        let output = match tokio::time::timeout(self.timeout, child.wait_with_output()).await {
            Ok(result) => result.map_err(spawn_failed)?,
            Err(_) => {
                error!(tool = program, timeout_secs = self.timeout.as_secs(), "Media tool timed out");
                return Err(MediaError::TimedOut {
                    tool: program.to_string(),
                    timeout: self.timeout,
                });
            }
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            error!(tool = program, status = %output.status, %stderr, "Media tool failed");
            return Err(MediaError::ToolFailed {
                tool: program.to_string(),
                status: output.status,
                stderr,
            });
        }

        Ok(output)
    }
}

#[async_trait]
impl MediaToolkit for FfmpegToolkit {
    async fn probe(&self, path: &Path) -> Result<StreamInfo, MediaError> {
        let args = [
            OsStr::new("-v"),
            OsStr::new("error"),
            OsStr::new("-print_format"),
            OsStr::new("json"),
            OsStr::new("-show_streams"),
            path.as_os_str(),
        ];
        let output = self.run_tool(&self.ffprobe_path, &args).await?;
        parse_probe_output(&output.stdout)
    }

    async fn remux_fast_start(&self, source: &Path) -> Result<TranscodedFile, MediaError> {
        info!(source = %source.display(), "Beginning fast start remux");
        let output_path = processing_path(source);

        let args = [
            OsStr::new("-i"),
            source.as_os_str(),
            OsStr::new("-c"),
            OsStr::new("copy"),
            OsStr::new("-movflags"),
            OsStr::new("faststart"),
            OsStr::new("-f"),
            OsStr::new("mp4"),
            output_path.as_os_str(),
        ];
        let result = self.run_tool(&self.ffmpeg_path, &args).await;

        // Owns whatever the tool left behind, so failures below still clean up.
        let output = TempPath::from_path(&output_path);
        result?;

        let size = tokio::fs::metadata(&output)
            .await
            .map_err(|source| MediaError::OutputUnreadable {
                path: output_path.clone(),
                source,
            })?
            .len();

        if size == 0 {
            return Err(MediaError::EmptyOutput { path: output_path });
        }

        info!(output = %output_path.display(), bytes = size, "Fast start remux complete");
        Ok(TranscodedFile::new(output, size))
    }
}

fn processing_path(source: &Path) -> PathBuf {
    let mut path = source.as_os_str().to_owned();
    path.push(".processing");
    PathBuf::from(path)
}

fn parse_probe_output(stdout: &[u8]) -> Result<StreamInfo, MediaError> {
    let probe: ProbeOutput = serde_json::from_slice(stdout)?;

    let stream = probe
        .streams
        .into_iter()
        .find(|s| match s.codec_type.as_deref() {
            Some(kind) => kind == "video",
            None => s.width.is_some() || s.height.is_some(),
        })
        .ok_or(MediaError::NoVideoStreams)?;

    match (stream.width, stream.height) {
        (Some(width), Some(height)) => Ok(StreamInfo { width, height }),
        _ => Err(MediaError::MissingDimensions),
    }
}
