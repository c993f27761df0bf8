use crate::infrastructure::media::{MediaError, MediaToolkit, StreamInfo};
use std::fmt;
use std::path::Path;

/// Coarse orientation of a video frame, used as the storage key prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AspectBucket {
    Landscape,
    Portrait,
    Other,
}

impl AspectBucket {
    /// Exact 16:9 or 9:16 under integer division; there is no tolerance band.
    pub fn classify(width: u32, height: u32) -> Self {
        let (width, height) = (u64::from(width), u64::from(height));
        if width == 16 * height / 9 {
            AspectBucket::Landscape
        } else if height == 16 * width / 9 {
            AspectBucket::Portrait
        } else {
            AspectBucket::Other
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AspectBucket::Landscape => "landscape",
            AspectBucket::Portrait => "portrait",
            AspectBucket::Other => "other",
        }
    }
}

impl From<StreamInfo> for AspectBucket {
    fn from(info: StreamInfo) -> Self {
        Self::classify(info.width, info.height)
    }
}

impl fmt::Display for AspectBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub async fn classify_video(media: &dyn MediaToolkit, path: &Path) -> Result<AspectBucket, MediaError> {
    let info = media.probe(path).await?;
    Ok(info.into())
}
