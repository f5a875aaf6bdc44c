//! Test utilities for integration tests.
//!
//! Mock raster openers and helpers for driving a router with one request.

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tower::ServiceExt;

use tile_gateway::error::{IoError, ProbeError};
use tile_gateway::probe::{RasterInfo, RasterOpener};

// =============================================================================
// Mock Opener with Request Tracking
// =============================================================================

/// A raster opener serving drivers from a table and recording every open.
///
/// Identifiers not in the table fail with `NotFound`.
#[derive(Clone, Default)]
pub struct MockOpener {
    drivers: HashMap<String, String>,
    delay: Option<Duration>,
    open_count: Arc<AtomicUsize>,
    opened: Arc<Mutex<Vec<String>>>,
}

impl MockOpener {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_raster(mut self, identifier: impl Into<String>, driver: impl Into<String>) -> Self {
        self.drivers.insert(identifier.into(), driver.into());
        self
    }

    /// Make every open take `delay` before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn open_count(&self) -> usize {
        self.open_count.load(Ordering::SeqCst)
    }

    pub fn opened(&self) -> Vec<String> {
        self.opened.lock().unwrap().clone()
    }
}

#[async_trait]
impl RasterOpener for MockOpener {
    async fn open(&self, identifier: &str) -> Result<RasterInfo, ProbeError> {
        self.open_count.fetch_add(1, Ordering::SeqCst);
        self.opened.lock().unwrap().push(identifier.to_string());

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        match self.drivers.get(identifier) {
            Some(driver) => Ok(RasterInfo::new(driver.clone())),
            None => Err(IoError::NotFound(identifier.to_string()).into()),
        }
    }
}

/// An opener that always fails with the given error.
pub struct FailingOpener(pub ProbeError);

#[async_trait]
impl RasterOpener for FailingOpener {
    async fn open(&self, _identifier: &str) -> Result<RasterInfo, ProbeError> {
        Err(self.0.clone())
    }
}

// =============================================================================
// Request Helpers
// =============================================================================

/// Send a GET request through `router`.
pub async fn get(router: Router, uri: &str) -> Response<Body> {
    send(router, Request::builder().uri(uri).body(Body::empty()).unwrap()).await
}

/// Send an arbitrary request through `router`.
pub async fn send(router: Router, request: Request<Body>) -> Response<Body> {
    router.oneshot(request).await.unwrap()
}

/// Collect a response body as UTF-8 text.
pub async fn body_text(response: Response<Body>) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

/// Collect a response body as JSON.
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// A header value as a string, if present.
pub fn header(response: &Response<Body>, name: &str) -> Option<String> {
    response
        .headers()
        .get(name)
        .map(|v| v.to_str().unwrap().to_string())
}
