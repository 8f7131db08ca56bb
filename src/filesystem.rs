//! Filesystem capability used to persist screenshots

use crate::CrawlError;
use async_trait::async_trait;
use std::path::Path;
use tokio::fs;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Filesystem: Send + Sync {
    /// Create `path` and any missing parents. Succeeds if it already exists.
    async fn ensure_directory(&self, path: &Path) -> Result<(), CrawlError>;

    /// Write `bytes` to `path`, replacing any existing file.
    async fn write_file(&self, path: &Path, bytes: &[u8]) -> Result<(), CrawlError>;
}

/// The local disk, through `tokio::fs`
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFilesystem;

#[async_trait]
impl Filesystem for LocalFilesystem {
    async fn ensure_directory(&self, path: &Path) -> Result<(), CrawlError> {
        fs::create_dir_all(path)
            .await
            .map_err(|e| CrawlError::Io(format!("creating {}: {}", path.display(), e)))
    }

    async fn write_file(&self, path: &Path, bytes: &[u8]) -> Result<(), CrawlError> {
        fs::write(path, bytes)
            .await
            .map_err(|e| CrawlError::Io(format!("writing {}: {}", path.display(), e)))
    }
}
