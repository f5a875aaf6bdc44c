//! HTTP middleware pipeline.
//!
//! Every tile endpoint is wrapped by an ordered chain of [`Stage`]s. Each
//! stage receives the request and a [`Next`] continuation and may:
//!
//! - pass the request through and return the downstream response unchanged,
//! - call `next` and then mutate the returned response's headers, or
//! - return its own response without calling `next` (short-circuit).
//!
//! # Ordering
//!
//! [`compose`] makes the **first stage in the list the outermost one**. The
//! request visits stages front to back on the way in and the response visits
//! them back to front on the way out:
//!
//! ```text
//! request ──► stages[0] ──► stages[1] ──► ... ──► router
//! response ◄── stages[0] ◄── stages[1] ◄── ... ◄──┘
//! ```
//!
//! The default order (see [`PipelineConfig`]) is:
//!
//! ```text
//! FormatGuard ► QueryNormalization ► Timing ► RequestLogging ► CacheControl ► router
//! ```
//!
//! The format guard is outermost so that rejected requests never touch
//! anything downstream. Cache control is innermost so it sees the status code
//! chosen by the handler.

pub mod cache_control;
pub mod format_guard;
pub mod headers;
pub mod lowercase_query;
pub mod pipeline;
pub mod request_logging;
pub mod timing;

use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    extract::{Request, State},
    middleware::{self, Next},
    response::Response,
    Router,
};
use tracing::trace;

pub use cache_control::{
    CacheControlConfig, CacheControlStage, ExclusionSet, DEFAULT_CACHE_CONTROL_MAX_STATUS,
};
pub use format_guard::{
    FormatGuardConfig, FormatGuardStage, GuardRejection, FORBIDDEN_DRIVER, FORBIDDEN_EXTENSION,
};
pub use headers::{append_list_value, insert_if_absent, joined_value};
pub use lowercase_query::{lowercase_query_keys, OriginalQuery, QueryNormalizationStage};
pub use pipeline::{PipelineConfig, StageKind};
pub use request_logging::{RequestLoggingConfig, RequestLoggingStage};
pub use timing::{format_timing_entry, TimingStage, SERVER_TIMING};

/// One unit of the middleware pipeline.
#[async_trait]
pub trait Stage: Send + Sync + 'static {
    /// Short stage name used in logs.
    fn name(&self) -> &'static str;

    /// Process a request, optionally delegating to `next`.
    async fn handle(&self, request: Request, next: Next) -> Response;
}

/// A type-erased stage that can be stored in a list.
pub type BoxedStage = Arc<dyn Stage>;

/// Wrap `router` with `stages`, the first stage being outermost.
pub fn compose(router: Router, stages: Vec<BoxedStage>) -> Router {
    // Router::layer wraps everything added before it, so apply back to front
    stages.into_iter().rev().fold(router, |router, stage| {
        router.layer(middleware::from_fn_with_state(stage, run_stage))
    })
}

async fn run_stage(State(stage): State<BoxedStage>, request: Request, next: Next) -> Response {
    trace!(stage = stage.name(), path = request.uri().path(), "Entering stage");
    stage.handle(request, next).await
}

// =============================================================================
// Tests
// =============================================================================
