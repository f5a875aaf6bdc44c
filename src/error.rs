use std::time::Duration;

use thiserror::Error;

/// I/O errors that can occur when reading the head of a raster resource
#[derive(Debug, Clone, Error)]
pub enum IoError {
    /// Error from S3 or S3-compatible storage
    #[error("S3 error: {0}")]
    S3(String),

    /// HTTP request completed with a non-success status
    #[error("HTTP {status} while reading {url}")]
    Http { url: String, status: u16 },

    /// Network or connection error
    #[error("Connection error: {0}")]
    Connection(String),

    /// Local filesystem error (permission denied, is a directory, ...)
    #[error("File error: {0}")]
    File(String),

    /// Object not found
    #[error("Object not found: {0}")]
    NotFound(String),
}

/// Errors returned by a raster opener.
///
/// The format guard never surfaces these to clients; every variant is
/// downgraded to "format unknown" at the probe call site.
#[derive(Debug, Clone, Error)]
pub enum ProbeError {
    /// The identifier is empty
    #[error("Empty resource identifier")]
    EmptyIdentifier,

    /// The identifier uses a scheme the opener cannot read
    #[error("Unsupported scheme: {0}")]
    UnsupportedScheme(String),

    /// The identifier could not be parsed
    #[error("Invalid identifier {identifier}: {reason}")]
    InvalidIdentifier { identifier: String, reason: String },

    /// Reading the resource failed
    #[error("I/O error: {0}")]
    Io(#[from] IoError),

    /// The resource was read but no known raster signature matched
    #[error("Unrecognized raster format for {0}")]
    Unrecognized(String),

    /// Opening took longer than the configured bound
    #[error("Probe timed out after {0:?}")]
    Timeout(Duration),
}

/// Errors raised while assembling the middleware pipeline
#[derive(Debug, Clone, Error)]
pub enum PipelineError {
    /// The configured Cache-Control value is not a valid header value
    #[error("Invalid Cache-Control value: {0:?}")]
    InvalidCacheControl(String),

    /// An exclusion pattern is not a valid regular expression
    #[error("Invalid exclusion pattern {pattern:?}: {reason}")]
    InvalidExcludePattern { pattern: String, reason: String },
}
