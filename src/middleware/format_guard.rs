//! Rejection of requests that reference VRT datasets.
//!
//! A VRT is an XML document that can point the raster library at arbitrary
//! files and URLs, so the gateway refuses to open one on behalf of a client.
//! The checks run in order and the first match wins:
//!
//! 1. the percent-decoded request path contains `.vrt` (any case)
//! 2. a `url` query parameter contains `.vrt` (any case)
//! 3. opening the `url` resource reports the `VRT` driver
//!
//! Step 3 catches VRTs hidden behind another extension. Any probe failure
//! (missing file, unsupported scheme, timeout) lets the request through.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    extract::Request,
    http::{header, StatusCode, Uri},
    middleware::Next,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::debug;
use url::form_urlencoded;

use super::Stage;
use crate::probe::{probe, ProbeOutcome, RasterOpener, DEFAULT_PROBE_TIMEOUT};

/// Extension rejected in paths and `url` parameters.
pub const FORBIDDEN_EXTENSION: &str = ".vrt";

/// Driver name rejected by the content probe.
pub const FORBIDDEN_DRIVER: &str = "VRT";

/// Query parameter naming the raster resource.
const URL_PARAM: &str = "url";

/// Why a request was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum GuardRejection {
    /// The request path names a VRT file
    #[error("VRT files are not supported.")]
    Path,

    /// A `url` parameter names or resolves to a VRT dataset
    #[error("VRT files are not supported in URL parameters.")]
    UrlParameter,
}

impl IntoResponse for GuardRejection {
    fn into_response(self) -> Response {
        (
            StatusCode::FORBIDDEN,
            [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
            self.to_string(),
        )
            .into_response()
    }
}

/// Configuration for [`FormatGuardStage`].
#[derive(Debug, Clone)]
pub struct FormatGuardConfig {
    /// Upper bound on the content probe of one request
    pub probe_timeout: Duration,
}

impl Default for FormatGuardConfig {
    fn default() -> Self {
        Self {
            probe_timeout: DEFAULT_PROBE_TIMEOUT,
        }
    }
}

impl FormatGuardConfig {
    /// Set the probe timeout.
    pub fn with_probe_timeout(mut self, timeout: Duration) -> Self {
        self.probe_timeout = timeout;
        self
    }
}

/// Short-circuits requests that reference VRT datasets with a 403.
#[derive(Clone)]
pub struct FormatGuardStage {
    opener: Arc<dyn RasterOpener>,
    config: FormatGuardConfig,
}

impl FormatGuardStage {
    /// Create a guard probing resources through `opener`.
    pub fn new(opener: Arc<dyn RasterOpener>, config: FormatGuardConfig) -> Self {
        Self { opener, config }
    }

    /// Run every check against `uri`.
    pub async fn inspect(&self, uri: &Uri) -> Result<(), GuardRejection> {
        if path_names_vrt(uri.path()) {
            return Err(GuardRejection::Path);
        }

        let urls = url_parameters(uri.query().unwrap_or(""));
        if urls
            .iter()
            .any(|value| value.to_lowercase().contains(FORBIDDEN_EXTENSION))
        {
            return Err(GuardRejection::UrlParameter);
        }

        let candidates = probe_candidates(&urls);
        if candidates.is_empty() {
            return Ok(());
        }

        // Any candidate reporting VRT rejects, whatever the others report
        let probe_all = async {
            for candidate in &candidates {
                let outcome = probe(self.opener.as_ref(), candidate, self.config.probe_timeout).await;
                if let ProbeOutcome::MatchedFormat(ref driver) = outcome {
                    if driver == FORBIDDEN_DRIVER {
                        return Err(GuardRejection::UrlParameter);
                    }
                }
            }
            Ok(())
        };

        match tokio::time::timeout(self.config.probe_timeout, probe_all).await {
            Ok(result) => result,
            Err(_) => {
                debug!(
                    timeout = ?self.config.probe_timeout,
                    "Format probe timed out, letting request through"
                );
                Ok(())
            }
        }
    }
}

#[async_trait]
impl Stage for FormatGuardStage {
    fn name(&self) -> &'static str {
        "format-guard"
    }

    async fn handle(&self, request: Request, next: Next) -> Response {
        match self.inspect(request.uri()).await {
            Ok(()) => next.run(request).await,
            Err(rejection) => {
                debug!(
                    method = %request.method(),
                    path = request.uri().path(),
                    reason = %rejection,
                    "Rejected request"
                );
                rejection.into_response()
            }
        }
    }
}

/// Invalid UTF-8 in the decoded path becomes replacement characters.
fn path_names_vrt(path: &str) -> bool {
    let bytes = urlencoding::decode_binary(path.as_bytes());
    String::from_utf8_lossy(&bytes)
        .to_lowercase()
        .contains(FORBIDDEN_EXTENSION)
}

/// Decoded values of every `url` parameter, the key matched in any case.
fn url_parameters(query: &str) -> Vec<String> {
    form_urlencoded::parse(query.as_bytes())
        .filter(|(key, _)| key.eq_ignore_ascii_case(URL_PARAM))
        .map(|(_, value)| value.into_owned())
        .collect()
}

/// Identifiers to probe: each value lower-cased, then as sent if different.
fn probe_candidates(urls: &[String]) -> Vec<String> {
    let mut candidates: Vec<String> = Vec::new();
    for value in urls.iter().filter(|v| !v.is_empty()) {
        let lowered = value.to_lowercase();
        if !candidates.contains(&lowered) {
            candidates.push(lowered.clone());
        }
        if *value != lowered && !candidates.contains(value) {
            candidates.push(value.clone());
        }
    }
    candidates
}
