//! # Tile Gateway
//!
//! The HTTP front of a dynamic map-tile server for cloud-optimized rasters.
//!
//! Every request passes through an ordered pipeline of middleware stages
//! before it reaches a tile handler:
//!
//! - **Format guard**: refuses VRT datasets named in the path or in a `url`
//!   parameter, and probes the `url` resource to catch disguised ones
//! - **Query normalization**: accepts query parameter names in any case
//! - **Timing**: reports handler time in `Server-Timing`
//! - **Request logging**: debug-level request records
//! - **Cache control**: a configured `Cache-Control` on cacheable responses
//!
//! ## Architecture
//!
//! - [`middleware`] - Stage trait, the stages and pipeline assembly
//! - [`probe`] - Raster driver detection behind the format guard
//! - [`io`] - Range readers for local files, HTTP and S3
//! - [`server`] - Axum routes and handlers
//! - [`config`] - CLI and configuration types
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use tile_gateway::{create_router, PipelineConfig, RouterConfig, SniffingOpener};
//!
//! #[tokio::main]
//! async fn main() {
//!     let opener = Arc::new(SniffingOpener::new(reqwest::Client::new()));
//!     let pipeline = PipelineConfig::new().with_debug(true);
//!     let router = create_router(opener, RouterConfig::new().with_pipeline(pipeline));
//!
//!     let listener = tokio::net::TcpListener::bind("0.0.0.0:8000").await.unwrap();
//!     axum::serve(listener, router).await.unwrap();
//! }
//! ```

pub mod config;
pub mod error;
pub mod io;
pub mod middleware;
pub mod probe;
pub mod server;

// Re-export commonly used types
pub use config::{CheckConfig, Cli, Command, Config};
pub use error::{IoError, PipelineError, ProbeError};
pub use io::{create_s3_client, RangeReader};
pub use middleware::{
    compose, BoxedStage, CacheControlConfig, CacheControlStage, ExclusionSet, FormatGuardConfig,
    FormatGuardStage, GuardRejection, PipelineConfig, QueryNormalizationStage,
    RequestLoggingConfig, RequestLoggingStage, Stage, StageKind, TimingStage,
};
pub use probe::{probe, ProbeOutcome, RasterInfo, RasterOpener, SniffingOpener};
pub use server::{create_router, AppState, ErrorResponse, RouterConfig};
