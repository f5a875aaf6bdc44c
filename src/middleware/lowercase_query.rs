//! Case-insensitive query parameter names.
//!
//! Rewrites `?Bbox=1,2,3,4&URL=x` into `?bbox=1%2C2%2C3%2C4&url=x` before any
//! extractor parses the query. Values are never altered (only re-encoded),
//! duplicate keys and their order are preserved, and blank values survive as
//! `key=`.

use async_trait::async_trait;
use axum::{extract::Request, middleware::Next, response::Response};
use http::uri::{PathAndQuery, Uri};
use tracing::debug;
use url::form_urlencoded;

use super::Stage;

/// The query string as received, before normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OriginalQuery(pub String);

/// Marker set once a request's query has been normalized.
#[derive(Debug, Clone, Copy)]
struct QueryNormalized;

/// Lower-case every key of a raw query string.
///
/// Pairs are percent-decoded, keys lower-cased, and the result re-encoded
/// with `application/x-www-form-urlencoded` rules joined by `&`.
pub fn lowercase_query_keys(query: &str) -> String {
    let mut serializer = form_urlencoded::Serializer::new(String::new());
    for (key, value) in form_urlencoded::parse(query.as_bytes()) {
        serializer.append_pair(&key.to_lowercase(), &value);
    }
    serializer.finish()
}

fn with_query(uri: &Uri, query: &str) -> Option<Uri> {
    let path_and_query = if query.is_empty() {
        uri.path().to_string()
    } else {
        format!("{}?{}", uri.path(), query)
    };

    let mut parts = uri.clone().into_parts();
    parts.path_and_query = Some(PathAndQuery::try_from(path_and_query).ok()?);
    Uri::from_parts(parts).ok()
}

/// Rewrites the request URI so query parameter names are lower-case.
#[derive(Debug, Clone, Copy, Default)]
pub struct QueryNormalizationStage;

impl QueryNormalizationStage {
    /// Create the stage.
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Stage for QueryNormalizationStage {
    fn name(&self) -> &'static str {
        "lowercase-query"
    }

    async fn handle(&self, mut request: Request, next: Next) -> Response {
        if request.extensions().get::<QueryNormalized>().is_some() {
            return next.run(request).await;
        }
        request.extensions_mut().insert(QueryNormalized);

        let original = match request.uri().query() {
            Some(query) if !query.is_empty() => query.to_string(),
            _ => return next.run(request).await,
        };

        let normalized = lowercase_query_keys(&original);
        match with_query(request.uri(), &normalized) {
            Some(uri) => *request.uri_mut() = uri,
            None => debug!(query = %original, "Could not rebuild URI, query left as is"),
        }
        request.extensions_mut().insert(OriginalQuery(original));

        next.run(request).await
    }
}
