use std::io::ErrorKind;
use std::path::PathBuf;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::io::AsyncReadExt;

use super::RangeReader;
use crate::error::IoError;

/// Local filesystem implementation of RangeReader.
///
/// Each read opens a fresh `tokio::fs::File`, which is closed when the read
/// future completes or is dropped.
#[derive(Debug, Clone)]
pub struct FileRangeReader {
    path: PathBuf,
    identifier: String,
}

impl FileRangeReader {
    /// Create a reader for a local path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let identifier = path.display().to_string();
        Self { path, identifier }
    }
}

#[async_trait]
impl RangeReader for FileRangeReader {
    async fn read_prefix(&self, len: usize) -> Result<Bytes, IoError> {
        let file = tokio::fs::File::open(&self.path)
            .await
            .map_err(|e| match e.kind() {
                ErrorKind::NotFound => IoError::NotFound(self.identifier.clone()),
                _ => IoError::File(format!("{}: {}", self.identifier, e)),
            })?;

        let mut buf = Vec::with_capacity(len);
        file.take(len as u64)
            .read_to_end(&mut buf)
            .await
            .map_err(|e| IoError::File(format!("{}: {}", self.identifier, e)))?;

        Ok(Bytes::from(buf))
    }

    fn identifier(&self) -> &str {
        &self.identifier
    }
}
