//! Tile gateway server binary.
//!
//! Starts the HTTP server, or probes a single raster with `check`.

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing::{error, info, warn, Dispatch};
use tracing_subscriber::layer::SubscriberExt;

use tile_gateway::{
    config::{CheckConfig, Cli, Command, Config},
    create_s3_client,
    middleware::{FORBIDDEN_DRIVER, FORBIDDEN_EXTENSION},
    probe::{probe, ProbeOutcome, SniffingOpener},
    server::create_router,
};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match cli.into_command() {
        Command::Serve(config) => run_serve(config).await,
        Command::Check(config) => run_check(config).await,
    }
}

// =============================================================================
// Serve Command
// =============================================================================

async fn run_serve(config: Config) -> ExitCode {
    let dispatch = init_logging(config.verbose || config.debug);

    if let Err(e) = config.validate() {
        error!("Configuration error: {}", e);
        return ExitCode::FAILURE;
    }

    let mut router_config = match config.router_config() {
        Ok(router_config) => router_config,
        Err(e) => {
            error!("Configuration error: {}", e);
            return ExitCode::FAILURE;
        }
    };
    router_config.pipeline.request_logging.dispatch = Some(dispatch);

    info!("Configuration:");
    if !config.path_prefix.is_empty() {
        info!("  Path prefix: {}", config.path_prefix);
    }
    let stages: Vec<&str> = router_config
        .pipeline
        .order
        .iter()
        .map(|kind| kind.name())
        .collect();
    info!("  Middleware: {}", stages.join(" > "));
    if config.cache_control.trim().is_empty() {
        info!("  Cache-Control: disabled");
    } else {
        info!(
            "  Cache-Control: {} (status < {})",
            config.cache_control, config.cache_control_max_status
        );
    }
    info!("  Probe timeout: {}ms", config.probe_timeout_ms);
    if let Some(ref endpoint) = config.s3_endpoint {
        info!("  S3 endpoint: {}", endpoint);
    }
    info!("  S3 region: {}", config.s3_region);
    if config.debug {
        warn!("  Debug mode: requests are logged with their headers");
    }

    let opener = match build_opener(config.s3_endpoint.as_deref(), &config.s3_region).await {
        Ok(opener) => opener,
        Err(e) => {
            error!("Failed to create HTTP client: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let router = create_router(Arc::new(opener), router_config);

    let addr = config.bind_address();
    let prefix = &config.path_prefix;

    info!("");
    info!("  Server listening on: http://{}{}/", addr, prefix);
    info!("    curl http://{}{}/healthz", addr, prefix);
    if !config.disable_cog {
        info!("    curl 'http://{}{}/cog/info?url=<dataset>'", addr, prefix);
    }
    info!("");

    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind to {}: {}", addr, e);
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = axum::serve(listener, router).await {
        error!("Server error: {}", e);
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

// =============================================================================
// Check Command
// =============================================================================

async fn run_check(config: CheckConfig) -> ExitCode {
    if config.verbose {
        init_logging(true);
    }

    let opener = match build_opener(config.s3_endpoint.as_deref(), &config.s3_region).await {
        Ok(opener) => opener,
        Err(e) => {
            println!("✗ Failed to create HTTP client: {}", e);
            return ExitCode::FAILURE;
        }
    };

    println!("Checking {}", config.identifier);

    if config
        .identifier
        .to_lowercase()
        .contains(FORBIDDEN_EXTENSION)
    {
        println!("✗ rejected: the identifier names a VRT file");
        return ExitCode::FAILURE;
    }

    match probe(&opener, &config.identifier, config.probe_timeout()).await {
        ProbeOutcome::MatchedFormat(driver) if driver == FORBIDDEN_DRIVER => {
            println!("✗ rejected: the resource is a VRT dataset");
            ExitCode::FAILURE
        }
        ProbeOutcome::MatchedFormat(driver) => {
            println!("✓ driver: {}", driver);
            ExitCode::SUCCESS
        }
        ProbeOutcome::Unknown => {
            println!("? format unknown (the gateway would let the request through)");
            println!("  Run with --verbose to see why the probe failed");
            ExitCode::SUCCESS
        }
    }
}

// =============================================================================
// Helpers
// =============================================================================

/// Build the content-sniffing opener with HTTP and S3 support.
async fn build_opener(
    s3_endpoint: Option<&str>,
    s3_region: &str,
) -> Result<SniffingOpener, reqwest::Error> {
    let http = reqwest::Client::builder()
        .user_agent(concat!("tile-gateway/", env!("CARGO_PKG_VERSION")))
        .build()?;
    let s3_client = create_s3_client(s3_endpoint, s3_region).await;
    Ok(SniffingOpener::new(http).with_s3_client(s3_client))
}

/// Initialize the tracing/logging subsystem.
///
/// The returned dispatcher is also installed as the global default.
fn init_logging(verbose: bool) -> Dispatch {
    let env_filter = if verbose {
        "tile_gateway=debug,tower_http=debug"
    } else {
        "tile_gateway=info,tower_http=info"
    };

    let subscriber = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| env_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer());

    let dispatch = Dispatch::new(subscriber);
    if let Err(e) = tracing::dispatcher::set_global_default(dispatch.clone()) {
        eprintln!("Failed to install the global logger: {}", e);
    }
    dispatch
}
