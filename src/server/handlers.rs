//! HTTP request handlers for the tile gateway.
//!
//! # Endpoints
//!
//! - `GET /` - Landing page
//! - `GET /healthz` - Health check
//! - `GET /cog/info?url=...` - Driver detected for a raster resource

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, error, warn};

use crate::error::{IoError, ProbeError};
use crate::probe::{RasterOpener, DEFAULT_PROBE_TIMEOUT};

// =============================================================================
// Application State
// =============================================================================

/// Shared application state.
///
/// This is passed to all handlers via Axum's State extractor.
#[derive(Clone)]
pub struct AppState {
    /// Opener used to inspect raster resources
    pub opener: Arc<dyn RasterOpener>,

    /// Bound on a single open
    pub probe_timeout: Duration,
}

impl AppState {
    /// Create application state around `opener`.
    pub fn new(opener: Arc<dyn RasterOpener>) -> Self {
        Self {
            opener,
            probe_timeout: DEFAULT_PROBE_TIMEOUT,
        }
    }

    /// Set the open timeout.
    pub fn with_probe_timeout(mut self, timeout: Duration) -> Self {
        self.probe_timeout = timeout;
        self
    }
}

// =============================================================================
// Request Parameters
// =============================================================================

/// Query parameters for `/cog/info`.
#[derive(Debug, Deserialize)]
pub struct InfoQueryParams {
    /// Raster identifier (path, http(s) URL or s3 URL)
    #[serde(default)]
    pub url: Option<String>,
}

// =============================================================================
// Response Types
// =============================================================================

/// JSON error response returned for all error conditions.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error type identifier (e.g., "not_found", "invalid_request")
    pub error: String,

    /// Human-readable error message
    pub message: String,

    /// HTTP status code (included for convenience)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
}

impl ErrorResponse {
    /// Create an error response with status code.
    pub fn with_status(
        error: impl Into<String>,
        message: impl Into<String>,
        status: StatusCode,
    ) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
            status: Some(status.as_u16()),
        }
    }
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub ping: String,
}

/// Response of `/cog/info`.
#[derive(Debug, Serialize)]
pub struct InfoResponse {
    /// The identifier as requested
    pub url: String,

    /// Driver short name (e.g. `GTiff`)
    pub driver: String,
}

// =============================================================================
// Errors
// =============================================================================

/// Errors surfaced by API handlers.
#[derive(Debug, Error)]
pub enum ApiError {
    /// A required query parameter is absent or empty
    #[error("Missing required query parameter: {0}")]
    MissingParameter(&'static str),

    /// Opening the resource failed
    #[error(transparent)]
    Probe(#[from] ProbeError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_type) = match &self {
            ApiError::MissingParameter(_) => (StatusCode::BAD_REQUEST, "invalid_request"),
            ApiError::Probe(probe_err) => match probe_err {
                ProbeError::EmptyIdentifier
                | ProbeError::UnsupportedScheme(_)
                | ProbeError::InvalidIdentifier { .. } => {
                    (StatusCode::BAD_REQUEST, "invalid_request")
                }
                ProbeError::Unrecognized(_) => {
                    (StatusCode::UNSUPPORTED_MEDIA_TYPE, "unsupported_format")
                }
                ProbeError::Timeout(_) => (StatusCode::GATEWAY_TIMEOUT, "timeout"),
                ProbeError::Io(IoError::NotFound(_)) => (StatusCode::NOT_FOUND, "not_found"),
                ProbeError::Io(IoError::File(_)) => {
                    (StatusCode::INTERNAL_SERVER_ERROR, "io_error")
                }
                ProbeError::Io(_) => (StatusCode::BAD_GATEWAY, "upstream_error"),
            },
        };
        let message = self.to_string();

        // Log errors based on severity
        if status.is_server_error() {
            error!(
                error_type = error_type,
                status = status.as_u16(),
                "Server error: {}",
                message
            );
        } else if status == StatusCode::NOT_FOUND {
            debug!(
                error_type = error_type,
                status = status.as_u16(),
                "Resource not found: {}",
                message
            );
        } else {
            warn!(
                error_type = error_type,
                status = status.as_u16(),
                "Client error: {}",
                message
            );
        }

        let error_response = ErrorResponse::with_status(error_type, message, status);
        (status, Json(error_response)).into_response()
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// Health check endpoint.
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        ping: "pong!".to_string(),
    })
}

/// Report the driver of the raster named by `url`.
pub async fn cog_info_handler(
    State(state): State<AppState>,
    Query(params): Query<InfoQueryParams>,
) -> Result<Json<InfoResponse>, ApiError> {
    let url = params
        .url
        .filter(|u| !u.is_empty())
        .ok_or(ApiError::MissingParameter("url"))?;

    let info = tokio::time::timeout(state.probe_timeout, state.opener.open(&url))
        .await
        .map_err(|_| ProbeError::Timeout(state.probe_timeout))??;

    Ok(Json(InfoResponse {
        url,
        driver: info.driver,
    }))
}

/// Fallback for unmatched paths.
pub async fn not_found_handler() -> Response {
    let status = StatusCode::NOT_FOUND;
    (
        status,
        Json(ErrorResponse::with_status("not_found", "Not Found", status)),
    )
        .into_response()
}

/// Landing page listing the available endpoints.
pub async fn landing_handler() -> Html<&'static str> {
    Html(LANDING_HTML)
}

const LANDING_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <title>Tile Gateway</title>
  <style>
    body { font-family: system-ui, sans-serif; max-width: 720px; margin: 3rem auto; color: #222; }
    code { background: #f2f2f2; padding: 0.1rem 0.3rem; border-radius: 3px; }
    li { margin: 0.4rem 0; }
  </style>
</head>
<body>
  <h1>Tile Gateway</h1>
  <p>Dynamic map tiles from cloud-optimized rasters.</p>
  <ul>
    <li><code>GET healthz</code> - service health</li>
    <li><code>GET cog/info?url=&lt;dataset&gt;</code> - driver detected for a dataset</li>
  </ul>
  <p>VRT datasets are not accepted, whether referenced by path or by <code>url</code> parameter.</p>
</body>
</html>
"#;

// =============================================================================
// Tests
// =============================================================================
