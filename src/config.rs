//! Configuration management for the tile gateway.
//!
//! Settings come from command-line arguments via clap, with `TILER_`
//! environment variable fallbacks and defaults for everything.
//!
//! # Environment Variables
//!
//! - `TILER_HOST` - Server bind address (default: 0.0.0.0)
//! - `TILER_PORT` - Server port (default: 8000)
//! - `TILER_PATH_PREFIX` - Prefix mounted in front of every route (default: none)
//! - `TILER_CACHE_CONTROL` - Cache-Control value for cacheable responses
//! - `TILER_CACHE_CONTROL_MAX_STATUS` - Responses at or above this status are not cached (default: 500)
//! - `TILER_CACHE_CONTROL_EXCLUDE` - Extra comma-separated path patterns never cached
//! - `TILER_DEBUG` - Log requests and add Server-Timing headers
//! - `TILER_LOWER_CASE_QUERY_PARAMETERS` - Accept query parameter names in any case
//! - `TILER_PROBE_TIMEOUT_MS` - Bound on the VRT content probe (default: 5000)
//! - `TILER_S3_ENDPOINT` - Custom S3 endpoint for S3-compatible services
//! - `TILER_S3_REGION` - AWS region (default: us-east-1)
//! - `TILER_CORS_ORIGINS` - Allowed CORS origins (comma-separated)
//! - `TILER_DISABLE_COG` - Do not mount the `/cog` routes

use std::time::Duration;

use clap::{Args, Parser, Subcommand};

use crate::error::PipelineError;
use crate::middleware::{
    CacheControlConfig, ExclusionSet, FormatGuardConfig, PipelineConfig,
    DEFAULT_CACHE_CONTROL_MAX_STATUS,
};
use crate::server::RouterConfig;

// =============================================================================
// Default Values
// =============================================================================

/// Default server host.
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Default server port.
pub const DEFAULT_PORT: u16 = 8000;

/// Default AWS region.
pub const DEFAULT_REGION: &str = "us-east-1";

/// Default Cache-Control value.
pub const DEFAULT_CACHE_CONTROL: &str = "public, max-age=3600";

/// Default probe timeout in milliseconds.
pub const DEFAULT_PROBE_TIMEOUT_MS: u64 = 5000;

// =============================================================================
// CLI
// =============================================================================

/// Tile gateway - dynamic map tiles from cloud-optimized rasters.
#[derive(Parser, Debug, Clone)]
#[command(name = "tile-gateway")]
#[command(author, version, about, long_about = None)]
#[command(args_conflicts_with_subcommands = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Server options, used when no subcommand is given
    #[command(flatten)]
    pub serve: Config,
}

impl Cli {
    /// The command to run; bare invocation means `serve`.
    pub fn into_command(self) -> Command {
        self.command.unwrap_or(Command::Serve(self.serve))
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Start the HTTP server (default)
    Serve(Config),

    /// Probe a raster identifier and report whether the gateway would accept it
    Check(CheckConfig),
}

// =============================================================================
// Serve Configuration
// =============================================================================

/// Server configuration.
#[derive(Args, Debug, Clone)]
pub struct Config {
    // =========================================================================
    // Server Configuration
    // =========================================================================
    /// Host address to bind the server to.
    #[arg(long, default_value = DEFAULT_HOST, env = "TILER_HOST")]
    pub host: String,

    /// Port to listen on.
    #[arg(short, long, default_value_t = DEFAULT_PORT, env = "TILER_PORT")]
    pub port: u16,

    /// Prefix mounted in front of every route (e.g. `/api`).
    #[arg(long, default_value = "", env = "TILER_PATH_PREFIX")]
    pub path_prefix: String,

    // =========================================================================
    // Middleware Configuration
    // =========================================================================
    /// Cache-Control value for cacheable responses. Empty disables it.
    #[arg(long, default_value = DEFAULT_CACHE_CONTROL, env = "TILER_CACHE_CONTROL")]
    pub cache_control: String,

    /// Responses with a status at or above this are never cached.
    #[arg(long, default_value_t = DEFAULT_CACHE_CONTROL_MAX_STATUS, env = "TILER_CACHE_CONTROL_MAX_STATUS")]
    pub cache_control_max_status: u16,

    /// Extra path patterns (regular expressions matched from the start of
    /// the path) that never receive Cache-Control.
    #[arg(long, env = "TILER_CACHE_CONTROL_EXCLUDE", value_delimiter = ',')]
    pub cache_control_exclude: Vec<String>,

    /// Log every request and add Server-Timing headers.
    #[arg(long, default_value_t = false, env = "TILER_DEBUG")]
    pub debug: bool,

    /// Accept query parameter names in any case.
    #[arg(long, default_value_t = false, env = "TILER_LOWER_CASE_QUERY_PARAMETERS")]
    pub lower_case_query_parameters: bool,

    /// Upper bound on the content probe of `url` parameters, in milliseconds.
    #[arg(long, default_value_t = DEFAULT_PROBE_TIMEOUT_MS, env = "TILER_PROBE_TIMEOUT_MS")]
    pub probe_timeout_ms: u64,

    // =========================================================================
    // S3 Configuration
    // =========================================================================
    /// Custom S3 endpoint URL for S3-compatible services (MinIO, etc.).
    #[arg(long, env = "TILER_S3_ENDPOINT")]
    pub s3_endpoint: Option<String>,

    /// AWS region for S3.
    #[arg(long, default_value = DEFAULT_REGION, env = "TILER_S3_REGION")]
    pub s3_region: String,

    // =========================================================================
    // Routes
    // =========================================================================
    /// Allowed CORS origins (comma-separated).
    ///
    /// If not specified, allows any origin.
    #[arg(long, env = "TILER_CORS_ORIGINS", value_delimiter = ',')]
    pub cors_origins: Option<Vec<String>>,

    /// Do not mount the `/cog` routes.
    #[arg(long, default_value_t = false, env = "TILER_DISABLE_COG")]
    pub disable_cog: bool,

    // =========================================================================
    // Logging Configuration
    // =========================================================================
    /// Enable verbose logging (debug level).
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,

    /// Disable request tracing.
    #[arg(long, default_value_t = false)]
    pub no_tracing: bool,
}

impl Config {
    /// Validate the configuration and return an error message if invalid.
    pub fn validate(&self) -> Result<(), String> {
        if !self.path_prefix.is_empty()
            && (!self.path_prefix.starts_with('/') || self.path_prefix.ends_with('/'))
        {
            return Err(format!(
                "path_prefix must start with '/' and not end with '/', got {:?}",
                self.path_prefix
            ));
        }

        if !(100..=600).contains(&self.cache_control_max_status) {
            return Err("cache_control_max_status must be between 100 and 600".to_string());
        }

        if self.probe_timeout_ms == 0 {
            return Err("probe_timeout_ms must be greater than 0".to_string());
        }

        self.pipeline_config().map_err(|e| e.to_string())?;

        Ok(())
    }

    /// Get the server bind address as "host:port".
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Probe timeout as a duration.
    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }

    /// Build the middleware pipeline settings.
    pub fn pipeline_config(&self) -> Result<PipelineConfig, PipelineError> {
        let cache_control = if self.cache_control.trim().is_empty() {
            CacheControlConfig::disabled()
        } else {
            CacheControlConfig::new(&self.cache_control)?
        };
        let exclude = ExclusionSet::from_patterns(
            self.cache_control_exclude.iter().filter(|p| !p.is_empty()),
        )?;

        Ok(PipelineConfig::new()
            .with_cache_control(
                cache_control
                    .with_max_status(self.cache_control_max_status)
                    .with_exclude(exclude),
            )
            .with_format_guard(FormatGuardConfig::default().with_probe_timeout(self.probe_timeout()))
            .with_debug(self.debug)
            .with_lower_case_query(self.lower_case_query_parameters))
    }

    /// Build the router settings.
    pub fn router_config(&self) -> Result<RouterConfig, PipelineError> {
        let mut router_config = RouterConfig::new()
            .with_path_prefix(self.path_prefix.clone())
            .with_cog(!self.disable_cog)
            .with_tracing(!self.no_tracing)
            .with_pipeline(self.pipeline_config()?);

        if let Some(ref origins) = self.cors_origins {
            router_config = router_config.with_cors_origins(origins.clone());
        }

        Ok(router_config)
    }
}

// =============================================================================
// Check Configuration
// =============================================================================

/// Options for the `check` subcommand.
#[derive(Args, Debug, Clone)]
pub struct CheckConfig {
    /// Raster identifier: local path, http(s) URL or s3://bucket/key.
    pub identifier: String,

    /// Custom S3 endpoint URL.
    #[arg(long, env = "TILER_S3_ENDPOINT")]
    pub s3_endpoint: Option<String>,

    /// AWS region for S3.
    #[arg(long, default_value = DEFAULT_REGION, env = "TILER_S3_REGION")]
    pub s3_region: String,

    /// Probe timeout in milliseconds.
    #[arg(long, default_value_t = DEFAULT_PROBE_TIMEOUT_MS, env = "TILER_PROBE_TIMEOUT_MS")]
    pub probe_timeout_ms: u64,

    /// Enable verbose logging.
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,
}

impl CheckConfig {
    /// Probe timeout as a duration.
    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }
}

// =============================================================================
// Tests
// =============================================================================
