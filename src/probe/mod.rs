//! Content probing for raster identifiers.
//!
//! The format guard uses a probe to learn the real driver behind a `url`
//! parameter instead of trusting its extension.
//!
//! # Architecture
//!
//! ```text
//! identifier ──► ResourceLocation::parse ──► RangeReader (file / http / s3)
//!                                                    │
//!                                        leading bytes ▼
//!                                             detect_driver ──► RasterInfo
//! ```
//!
//! [`probe`] wraps any [`RasterOpener`] with a timeout and collapses every
//! failure into [`ProbeOutcome::Unknown`].

mod detect;
mod location;
mod opener;

use std::time::Duration;

use tracing::debug;

use crate::error::ProbeError;

pub use detect::{detect_driver, is_tiff_header, is_vrt_document, RasterDriver, DETECTION_BYTES};
pub use location::ResourceLocation;
pub use opener::{RasterInfo, RasterOpener, SniffingOpener};

/// Default bound on a single probe.
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Result of probing a resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    /// The resource opened and reported this driver
    MatchedFormat(String),

    /// The resource could not be opened or identified
    Unknown,
}

impl ProbeOutcome {
    /// Whether the probe identified the given driver (exact match).
    pub fn is_driver(&self, driver: &str) -> bool {
        matches!(self, ProbeOutcome::MatchedFormat(d) if d == driver)
    }
}

/// Open `identifier` through `opener`, bounded by `timeout`.
///
/// Errors and timeouts are logged at debug level and reported as
/// [`ProbeOutcome::Unknown`]. If the timeout fires, the in-flight open is
/// dropped, which releases whatever handle it had acquired.
pub async fn probe<O>(opener: &O, identifier: &str, timeout: Duration) -> ProbeOutcome
where
    O: RasterOpener + ?Sized,
{
    let result = match tokio::time::timeout(timeout, opener.open(identifier)).await {
        Ok(result) => result,
        Err(_) => Err(ProbeError::Timeout(timeout)),
    };

    match result {
        Ok(info) => ProbeOutcome::MatchedFormat(info.driver),
        Err(e) => {
            debug!(resource = identifier, error = %e, "Probe failed, format unknown");
            ProbeOutcome::Unknown
        }
    }
}
