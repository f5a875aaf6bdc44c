//! Resolution of raster identifiers into concrete locations.
//!
//! Identifiers arrive exactly as clients send them in the `url` parameter and
//! follow the conventions of the raster library:
//!
//! ```text
//! https://host/data.tif        - HTTP(S) object
//! /vsicurl/https://host/a.tif  - GDAL virtual curl path
//! s3://bucket/key.tif          - S3 object
//! /vsis3/bucket/key.tif        - GDAL virtual S3 path
//! file:///data/a.tif           - local file URL
//! /data/a.tif                  - local path
//! <VRTDataset>...</VRTDataset> - inline VRT XML
//! vrt://path?bands=1           - VRT connection string
//! ```

use std::path::PathBuf;

use url::Url;

use crate::error::ProbeError;

const VSICURL_PREFIX: &str = "/vsicurl/";
const VSIS3_PREFIX: &str = "/vsis3/";
const VRT_CONNECTION_PREFIX: &str = "vrt://";
const INLINE_VRT_MARKER: &str = "<vrtdataset";

/// Where a raster identifier points.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceLocation {
    /// Local filesystem path
    Local(PathBuf),

    /// HTTP or HTTPS URL
    Http(String),

    /// Object in S3-compatible storage
    S3 { bucket: String, key: String },

    /// The identifier itself is a virtual raster (inline XML or `vrt://`)
    InlineVrt,
}

impl ResourceLocation {
    /// Parse a raster identifier.
    pub fn parse(identifier: &str) -> Result<Self, ProbeError> {
        let trimmed = identifier.trim();
        if trimmed.is_empty() {
            return Err(ProbeError::EmptyIdentifier);
        }

        let lowered = trimmed.to_ascii_lowercase();
        if lowered.starts_with(VRT_CONNECTION_PREFIX)
            || (lowered.starts_with('<') && lowered.contains(INLINE_VRT_MARKER))
        {
            return Ok(ResourceLocation::InlineVrt);
        }

        if let Some(rest) = strip_prefix_ignore_case(trimmed, VSICURL_PREFIX) {
            return match Self::parse(rest)? {
                http @ ResourceLocation::Http(_) => Ok(http),
                _ => Err(invalid(trimmed, "/vsicurl/ requires an http(s) URL")),
            };
        }

        if let Some(rest) = strip_prefix_ignore_case(trimmed, VSIS3_PREFIX) {
            return split_bucket_key(rest)
                .map(|(bucket, key)| ResourceLocation::S3 { bucket, key })
                .ok_or_else(|| invalid(trimmed, "expected /vsis3/<bucket>/<key>"));
        }

        match Url::parse(trimmed) {
            Ok(url) => Self::from_url(trimmed, url),
            // Relative references such as "data/a.tif" have no scheme
            Err(url::ParseError::RelativeUrlWithoutBase) => {
                Ok(ResourceLocation::Local(PathBuf::from(trimmed)))
            }
            Err(e) => Err(invalid(trimmed, &e.to_string())),
        }
    }

    fn from_url(identifier: &str, url: Url) -> Result<Self, ProbeError> {
        match url.scheme() {
            "http" | "https" => Ok(ResourceLocation::Http(url.to_string())),
            "s3" => {
                let bucket = url
                    .host_str()
                    .filter(|h| !h.is_empty())
                    .ok_or_else(|| invalid(identifier, "missing bucket"))?;
                let key = url.path().trim_start_matches('/');
                if key.is_empty() {
                    return Err(invalid(identifier, "missing key"));
                }
                Ok(ResourceLocation::S3 {
                    bucket: bucket.to_string(),
                    key: key.to_string(),
                })
            }
            "file" => url
                .to_file_path()
                .map(ResourceLocation::Local)
                .map_err(|_| invalid(identifier, "not a valid file URL")),
            other => Err(ProbeError::UnsupportedScheme(other.to_string())),
        }
    }
}

fn strip_prefix_ignore_case<'a>(value: &'a str, prefix: &str) -> Option<&'a str> {
    let head = value.get(..prefix.len())?;
    if head.eq_ignore_ascii_case(prefix) {
        Some(&value[prefix.len()..])
    } else {
        None
    }
}

fn split_bucket_key(path: &str) -> Option<(String, String)> {
    let (bucket, key) = path.split_once('/')?;
    if bucket.is_empty() || key.is_empty() {
        return None;
    }
    Some((bucket.to_string(), key.to_string()))
}

fn invalid(identifier: &str, reason: &str) -> ProbeError {
    ProbeError::InvalidIdentifier {
        identifier: identifier.to_string(),
        reason: reason.to_string(),
    }
}
