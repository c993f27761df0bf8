use std::io;
use std::path::Path;
use tempfile::NamedTempFile;
use tokio::io::{AsyncRead, AsyncWriteExt};

const STAGED_FILE_PREFIX: &str = "tubely-upload_";
const STAGED_FILE_SUFFIX: &str = ".mp4";

/// An incoming file as read from a request: the declared content type and
/// the body.
pub struct UploadedMedia<R> {
    pub content_type: Option<String>,
    pub body: R,
}

/// On-disk copy of an upload. The file is removed when this is dropped.
#[derive(Debug)]
pub struct StagedFile {
    file: NamedTempFile,
    size: u64,
}

impl StagedFile {
    pub fn path(&self) -> &Path {
        self.file.path()
    }

    pub fn size(&self) -> u64 {
        self.size
    }
}

/// Streams `body` into a fresh, uniquely named file under `dir`.
pub async fn stage_upload<R>(dir: &Path, mut body: R) -> io::Result<StagedFile>
where
    R: AsyncRead + Unpin,
{
    let file = tempfile::Builder::new()
        .prefix(STAGED_FILE_PREFIX)
        .suffix(STAGED_FILE_SUFFIX)
        .tempfile_in(dir)?;

    let mut writer = tokio::fs::File::from_std(file.reopen()?);
    let size = tokio::io::copy(&mut body, &mut writer).await?;
    writer.flush().await?;

    Ok(StagedFile { file, size })
}
