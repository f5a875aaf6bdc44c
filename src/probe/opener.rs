use async_trait::async_trait;
use tracing::debug;

use super::detect::{detect_driver, RasterDriver, DETECTION_BYTES};
use super::location::ResourceLocation;
use crate::error::ProbeError;
use crate::io::{FileRangeReader, HttpRangeReader, RangeReader, S3RangeReader};

/// Metadata returned by a successful open.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RasterInfo {
    /// Driver short name, as reported by the raster library (e.g. `GTiff`)
    pub driver: String,
}

impl RasterInfo {
    /// Create info for a detected driver.
    pub fn new(driver: impl Into<String>) -> Self {
        Self {
            driver: driver.into(),
        }
    }
}

impl From<RasterDriver> for RasterInfo {
    fn from(driver: RasterDriver) -> Self {
        Self::new(driver.name())
    }
}

/// Resource-open oracle.
///
/// Opens the resource named by `identifier` with a handle owned by the call
/// (never shared or cached) and reports its driver. Implementations release
/// the handle before returning, and when the returned future is dropped.
#[async_trait]
pub trait RasterOpener: Send + Sync {
    /// Open the resource and report its driver.
    async fn open(&self, identifier: &str) -> Result<RasterInfo, ProbeError>;
}

/// Raster opener that identifies drivers by sniffing leading bytes.
///
/// Supports local paths, `http(s)://` URLs, `s3://` objects (when an S3
/// client is configured) and the inline VRT forms the raster library accepts
/// as dataset names.
#[derive(Clone)]
pub struct SniffingOpener {
    http: reqwest::Client,
    s3: Option<aws_sdk_s3::Client>,
    detection_bytes: usize,
}

impl SniffingOpener {
    /// Create an opener without S3 support.
    pub fn new(http: reqwest::Client) -> Self {
        Self {
            http,
            s3: None,
            detection_bytes: DETECTION_BYTES,
        }
    }

    /// Enable `s3://` and `/vsis3/` identifiers.
    pub fn with_s3_client(mut self, client: aws_sdk_s3::Client) -> Self {
        self.s3 = Some(client);
        self
    }

    /// Override how many leading bytes are read for detection.
    pub fn with_detection_bytes(mut self, bytes: usize) -> Self {
        self.detection_bytes = bytes.max(16);
        self
    }

    async fn sniff<R: RangeReader>(&self, reader: R) -> Result<RasterInfo, ProbeError> {
        let head = reader.read_prefix(self.detection_bytes).await?;
        let driver = detect_driver(&head)
            .ok_or_else(|| ProbeError::Unrecognized(reader.identifier().to_string()))?;

        debug!(
            resource = reader.identifier(),
            driver = driver.name(),
            "Detected raster driver"
        );
        Ok(driver.into())
    }
}

#[async_trait]
impl RasterOpener for SniffingOpener {
    async fn open(&self, identifier: &str) -> Result<RasterInfo, ProbeError> {
        match ResourceLocation::parse(identifier)? {
            ResourceLocation::InlineVrt => Ok(RasterDriver::Vrt.into()),
            ResourceLocation::Local(path) => self.sniff(FileRangeReader::new(path)).await,
            ResourceLocation::Http(url) => {
                self.sniff(HttpRangeReader::new(self.http.clone(), url))
                    .await
            }
            ResourceLocation::S3 { bucket, key } => match &self.s3 {
                Some(client) => {
                    self.sniff(S3RangeReader::new(client.clone(), bucket, key))
                        .await
                }
                None => Err(ProbeError::UnsupportedScheme("s3".to_string())),
            },
        }
    }
}
