//! Router configuration for the tile gateway.
//!
//! This module defines the HTTP routes and wraps them in the middleware
//! pipeline, CORS and compression.
//!
//! # Route Structure
//!
//! ```text
//! {prefix}/                 - Landing page
//! {prefix}/healthz          - Health check (never cached)
//! {prefix}/cog/info?url=    - Raster driver info (unless disabled)
//! ```
//!
//! # Layering
//!
//! ```text
//! TraceLayer ► pipeline stages ► Compression ► CORS ► routes / fallback
//! ```
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use tile_gateway::probe::SniffingOpener;
//! use tile_gateway::server::{create_router, RouterConfig};
//!
//! let opener = Arc::new(SniffingOpener::new(reqwest::Client::new()));
//! let config = RouterConfig::new()
//!     .with_path_prefix("/api")
//!     .with_cors_origins(vec!["https://example.com".to_string()]);
//!
//! let router = create_router(opener, config);
//!
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:8000").await?;
//! axum::serve(listener, router).await?;
//! ```

use std::sync::Arc;
use std::time::Duration;

use axum::{routing::get, Router};
use http::header::CONTENT_TYPE;
use http::Method;
use tower_http::compression::CompressionLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::handlers::{
    cog_info_handler, health_handler, landing_handler, not_found_handler, AppState,
};
use crate::middleware::{compose, PipelineConfig};
use crate::probe::RasterOpener;

// =============================================================================
// Router Configuration
// =============================================================================

/// Configuration for the HTTP router.
#[derive(Debug, Clone)]
pub struct RouterConfig {
    /// Prefix in front of every route, without trailing slash
    pub path_prefix: String,

    /// Allowed CORS origins (None = allow any origin)
    pub cors_origins: Option<Vec<String>>,

    /// Whether to enable request tracing
    pub enable_tracing: bool,

    /// Whether to mount the `/cog` routes
    pub enable_cog: bool,

    /// Middleware stages and their settings
    pub pipeline: PipelineConfig,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            path_prefix: String::new(),
            cors_origins: None,
            enable_tracing: true,
            enable_cog: true,
            pipeline: PipelineConfig::default(),
        }
    }
}

impl RouterConfig {
    /// Create a router configuration with defaults.
    ///
    /// By default:
    /// - No path prefix
    /// - CORS allows any origin
    /// - Tracing is enabled
    /// - `/cog` routes are mounted
    /// - Pipeline is format guard plus (disabled) cache control
    pub fn new() -> Self {
        Self::default()
    }

    /// Mount every route under `prefix`. A trailing slash is ignored.
    pub fn with_path_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.path_prefix = prefix.into().trim_end_matches('/').to_string();
        self
    }

    /// Set specific allowed CORS origins.
    ///
    /// Pass an empty vec to disallow all cross-origin requests.
    pub fn with_cors_origins(mut self, origins: Vec<String>) -> Self {
        self.cors_origins = Some(origins);
        self
    }

    /// Allow any CORS origin.
    pub fn with_cors_any_origin(mut self) -> Self {
        self.cors_origins = None;
        self
    }

    /// Enable or disable request tracing.
    pub fn with_tracing(mut self, enabled: bool) -> Self {
        self.enable_tracing = enabled;
        self
    }

    /// Mount or skip the `/cog` routes.
    pub fn with_cog(mut self, enabled: bool) -> Self {
        self.enable_cog = enabled;
        self
    }

    /// Set the middleware pipeline.
    pub fn with_pipeline(mut self, pipeline: PipelineConfig) -> Self {
        self.pipeline = pipeline;
        self
    }
}

// =============================================================================
// Router Builder
// =============================================================================

/// Create the main application router.
///
/// The health endpoint is always added to the cache-control exclusions.
pub fn create_router(opener: Arc<dyn RasterOpener>, config: RouterConfig) -> Router {
    let prefix = config.path_prefix.as_str();

    let app_state = AppState::new(Arc::clone(&opener))
        .with_probe_timeout(config.pipeline.format_guard.probe_timeout);

    let mut routes = Router::new()
        .route(&format!("{}/", prefix), get(landing_handler))
        .route(&format!("{}/healthz", prefix), get(health_handler));

    if !prefix.is_empty() {
        routes = routes.route(prefix, get(landing_handler));
    }

    if config.enable_cog {
        routes = routes.route(&format!("{}/cog/info", prefix), get(cog_info_handler));
    }

    let routes = routes
        .fallback(not_found_handler)
        .with_state(app_state)
        .layer(build_cors_layer(&config))
        .layer(CompressionLayer::new());

    let mut pipeline = config.pipeline.clone();
    pipeline
        .cache_control
        .exclude
        .push_prefix(&format!("{}/healthz", prefix));

    let router = compose(routes, pipeline.build_stages(opener));

    // Add tracing if enabled
    if config.enable_tracing {
        router.layer(TraceLayer::new_for_http())
    } else {
        router
    }
}

/// Build the CORS layer based on configuration.
fn build_cors_layer(config: &RouterConfig) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET])
        .allow_headers([CONTENT_TYPE])
        .max_age(Duration::from_secs(86400)); // 24 hours

    match &config.cors_origins {
        None => cors.allow_origin(Any),
        Some(origins) if origins.is_empty() => cors,
        Some(origins) => {
            let parsed_origins: Vec<_> = origins.iter().filter_map(|o| o.parse().ok()).collect();
            cors.allow_origin(parsed_origins)
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
