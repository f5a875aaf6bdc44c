use async_trait::async_trait;
use bytes::Bytes;

use crate::error::IoError;

/// Trait for reading the leading bytes of a raster resource.
///
/// Format detection only ever needs a small prefix of a file, so readers
/// fetch at most `len` bytes from the start instead of the whole object.
/// Implementations must be thread-safe; each reader owns its own handle and
/// releases it when dropped.
#[async_trait]
pub trait RangeReader: Send + Sync {
    /// Read up to `len` bytes from the start of the resource.
    ///
    /// Returns fewer bytes when the resource is shorter than `len`.
    async fn read_prefix(&self, len: usize) -> Result<Bytes, IoError>;

    /// Get a unique identifier for this resource (for logging).
    ///
    /// For S3, this would typically be `s3://bucket/key`.
    fn identifier(&self) -> &str;
}

/// Build an inclusive HTTP range header value covering the first `len` bytes.
///
/// `len` must be non-zero.
pub fn prefix_range(len: usize) -> String {
    format!("bytes=0-{}", len.saturating_sub(1))
}
