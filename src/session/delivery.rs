use bytes::Bytes;
use futures_util::Stream;
use std::path::{Path, PathBuf};
use tokio_util::io::ReaderStream;
use tracing::{info, warn};

use crate::audio::ExportFormat;
use crate::error::Result;

/// The combined audiobook, offered as a download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    pub file_name: String,
    pub mime_type: &'static str,
    pub path: PathBuf,
    pub len: u64,
}

impl Delivery {
    pub async fn open(path: &Path) -> Result<Self> {
        let len = tokio::fs::metadata(path).await?.len();
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Ok(Self {
            file_name,
            mime_type: ExportFormat::for_path(path).mime_type(),
            path: path.to_path_buf(),
            len,
        })
    }

    /// Byte stream over the file contents.
    pub async fn stream(&self) -> Result<impl Stream<Item = std::io::Result<Bytes>>> {
        let file = tokio::fs::File::open(&self.path).await?;
        Ok(ReaderStream::new(file))
    }

    pub async fn bytes(&self) -> Result<Vec<u8>> {
        Ok(tokio::fs::read(&self.path).await?)
    }

    /// Copies the download to `dest` and returns the bytes written.
    pub async fn save_to(&self, dest: &Path) -> Result<u64> {
        let mut reader = tokio_util::io::StreamReader::new(self.stream().await?);
        let mut file = tokio::fs::File::create(dest).await?;
        let written = tokio::io::copy(&mut reader, &mut file).await?;
        info!(dest = %dest.display(), bytes = written, "download saved");
        Ok(written)
    }
}

/// What happened to each intermediate artifact.
#[derive(Debug, Default)]
pub struct CleanupReport {
    pub deleted: Vec<PathBuf>,
    pub failed: Vec<(PathBuf, std::io::Error)>,
}

impl CleanupReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Deletes every path, carrying on past failures.
pub async fn remove_artifacts(paths: &[PathBuf]) -> CleanupReport {
    let mut report = CleanupReport::default();
    for path in paths {
        match tokio::fs::remove_file(path).await {
            Ok(()) => report.deleted.push(path.clone()),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to delete artifact");
                report.failed.push((path.clone(), e));
            }
        }
    }
    report
}
