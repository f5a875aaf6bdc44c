//! Debug-level request logging.

use std::collections::BTreeMap;

use async_trait::async_trait;
use axum::{extract::Request, middleware::Next, response::Response};
use http::header::HOST;
use http::HeaderMap;
use tracing::{debug, Dispatch};
use url::form_urlencoded;

use super::headers::joined_value;
use super::Stage;

/// Configuration for [`RequestLoggingStage`].
#[derive(Debug, Clone, Default)]
pub struct RequestLoggingConfig {
    /// Also log the decoded query parameters
    pub query_params: bool,

    /// Also log the request headers
    pub headers: bool,

    /// Log to this dispatcher instead of the global one
    pub dispatch: Option<Dispatch>,
}

impl RequestLoggingConfig {
    /// Log only the request URL.
    pub fn new() -> Self {
        Self::default()
    }

    /// Log query parameters too.
    pub fn with_query_params(mut self, enabled: bool) -> Self {
        self.query_params = enabled;
        self
    }

    /// Log request headers too.
    pub fn with_headers(mut self, enabled: bool) -> Self {
        self.headers = enabled;
        self
    }

    /// Route log records to `dispatch`.
    pub fn with_dispatch(mut self, dispatch: Dispatch) -> Self {
        self.dispatch = Some(dispatch);
        self
    }
}

/// Logs each incoming request at debug level.
///
/// Never alters the request or the response.
#[derive(Debug, Clone, Default)]
pub struct RequestLoggingStage {
    config: RequestLoggingConfig,
}

impl RequestLoggingStage {
    /// Create the stage.
    pub fn new(config: RequestLoggingConfig) -> Self {
        Self { config }
    }

    fn log(&self, request: &Request) {
        let url = full_url(request);
        let query = self
            .config
            .query_params
            .then(|| query_map(request.uri().query().unwrap_or("")));
        let headers = self.config.headers.then(|| header_map(request.headers()));

        let emit = || match (&query, &headers) {
            (Some(query), Some(headers)) => {
                debug!(method = %request.method(), %url, ?query, ?headers, "Request")
            }
            (Some(query), None) => debug!(method = %request.method(), %url, ?query, "Request"),
            (None, Some(headers)) => {
                debug!(method = %request.method(), %url, ?headers, "Request")
            }
            (None, None) => debug!(method = %request.method(), %url, "Request"),
        };

        match &self.config.dispatch {
            Some(dispatch) => tracing::dispatcher::with_default(dispatch, emit),
            None => emit(),
        }
    }
}

#[async_trait]
impl Stage for RequestLoggingStage {
    fn name(&self) -> &'static str {
        "request-logging"
    }

    async fn handle(&self, request: Request, next: Next) -> Response {
        self.log(&request);
        next.run(request).await
    }
}

/// Reconstruct the absolute URL the client asked for.
///
/// Scheme comes from `X-Forwarded-Proto`, then the request URI, then `http`.
/// Host comes from the `Host` header, then the request URI authority.
pub(crate) fn full_url(request: &Request) -> String {
    let headers = request.headers();
    let uri = request.uri();

    let scheme = headers
        .get("x-forwarded-proto")
        .and_then(|v| v.to_str().ok())
        .map(|v| v.split(',').next().unwrap_or(v).trim().to_string())
        .or_else(|| uri.scheme_str().map(str::to_string))
        .unwrap_or_else(|| "http".to_string());

    let host = headers
        .get(HOST)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .or_else(|| uri.authority().map(|a| a.to_string()));

    let path_and_query = uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or_else(|| uri.path());

    match host {
        Some(host) => format!("{}://{}{}", scheme, host, path_and_query),
        None => path_and_query.to_string(),
    }
}

/// Decoded query parameters; the last value of a repeated key wins.
pub(crate) fn query_map(query: &str) -> BTreeMap<String, String> {
    form_urlencoded::parse(query.as_bytes())
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect()
}

/// Request headers keyed by lower-case name, repeated values joined.
pub(crate) fn header_map(headers: &HeaderMap) -> BTreeMap<String, String> {
    headers
        .keys()
        .filter_map(|name| {
            joined_value(headers, name).map(|value| (name.as_str().to_string(), value))
        })
        .collect()
}
