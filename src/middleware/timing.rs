//! Server-Timing instrumentation.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use axum::{extract::Request, middleware::Next, response::Response};
use http::header::HeaderName;

use super::headers::append_list_value;
use super::Stage;

/// `Server-Timing` response header.
pub const SERVER_TIMING: HeaderName = HeaderName::from_static("server-timing");

/// Format a `total;dur=<ms>` metric with two decimal places.
pub fn format_timing_entry(elapsed: Duration) -> String {
    format!("total;dur={:.2}", elapsed.as_secs_f64() * 1000.0)
}

/// Appends the time spent inside this stage to `Server-Timing`.
///
/// Uses the monotonic clock; stacked timing stages each add their own entry.
#[derive(Debug, Clone, Copy, Default)]
pub struct TimingStage;

impl TimingStage {
    /// Create the stage.
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Stage for TimingStage {
    fn name(&self) -> &'static str {
        "timing"
    }

    async fn handle(&self, request: Request, next: Next) -> Response {
        let start = Instant::now();
        let mut response = next.run(request).await;
        let entry = format_timing_entry(start.elapsed());
        append_list_value(response.headers_mut(), SERVER_TIMING, &entry);
        response
    }
}
