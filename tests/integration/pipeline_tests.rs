//! Pipeline integration tests.
//!
//! Tests verify the stages working together in their default order:
//! - Cache-Control injection, exclusions and handler precedence
//! - Server-Timing accumulation
//! - Query normalization ahead of extractors
//! - Short-circuited requests skipping inner stages

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::extract::Query;
use axum::http::{header::CACHE_CONTROL, Request, StatusCode};
use axum::routing::{get, post};
use axum::Router;
use serde::Deserialize;

use tile_gateway::{
    compose, create_router, CacheControlConfig, ExclusionSet, PipelineConfig, RouterConfig,
    StageKind,
};

use super::test_utils::{body_json, body_text, get as get_uri, header, send, MockOpener};

const CACHE_VALUE: &str = "public, max-age=3600";

#[derive(Deserialize)]
struct TileParams {
    url: String,
    #[serde(default)]
    rescale: Option<String>,
}

fn tile_router() -> Router {
    Router::new()
        .route(
            "/cog/tiles/{z}/{x}/{y}",
            get(|Query(params): Query<TileParams>| async move {
                format!("{}|{}", params.url, params.rescale.unwrap_or_default())
            }),
        )
        .route(
            "/cog/slow",
            get(|| async {
                tokio::time::sleep(Duration::from_millis(30)).await;
                "slow"
            }),
        )
        .route(
            "/cog/private",
            get(|| async { ([(CACHE_CONTROL, "private, no-store")], "private") }),
        )
        .route("/cog/upload", post(|| async { "stored" }))
        .route("/healthz", get(|| async { "ok" }))
        .route("/v1/healthz", get(|| async { "ok" }))
}

fn full_pipeline() -> PipelineConfig {
    PipelineConfig::new()
        .with_cache_control(
            CacheControlConfig::new(CACHE_VALUE)
                .unwrap()
                .with_exclude(ExclusionSet::from_patterns(["/healthz"]).unwrap()),
        )
        .with_debug(true)
        .with_lower_case_query(true)
}

fn app(opener: MockOpener, pipeline: PipelineConfig) -> Router {
    compose(tile_router(), pipeline.build_stages(Arc::new(opener)))
}

fn default_opener() -> MockOpener {
    MockOpener::new().with_raster("s3://bucket/scene.tif", "GTiff")
}

// =============================================================================
// Cache-Control
// =============================================================================

#[tokio::test]
async fn test_cache_control_is_idempotent() {
    let app = app(default_opener(), full_pipeline());
    for _ in 0..3 {
        let response = get_uri(app.clone(), "/cog/tiles/1/2/3?url=s3://bucket/scene.tif").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get_all(CACHE_CONTROL).iter().count(),
            1
        );
        assert_eq!(header(&response, "cache-control").as_deref(), Some(CACHE_VALUE));
    }
}

#[tokio::test]
async fn test_handler_cache_control_preserved() {
    let response = get_uri(app(default_opener(), full_pipeline()), "/cog/private").await;
    assert_eq!(
        header(&response, "cache-control").as_deref(),
        Some("private, no-store")
    );
}

#[tokio::test]
async fn test_exclusions_match_from_path_start() {
    let app = app(default_opener(), full_pipeline());

    let response = get_uri(app.clone(), "/healthz").await;
    assert_eq!(header(&response, "cache-control"), None);

    let response = get_uri(app, "/v1/healthz").await;
    assert_eq!(header(&response, "cache-control").as_deref(), Some(CACHE_VALUE));
}

#[tokio::test]
async fn test_post_not_cached() {
    let request = Request::builder()
        .method("POST")
        .uri("/cog/upload")
        .body(Body::empty())
        .unwrap();
    let response = send(app(default_opener(), full_pipeline()), request).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(header(&response, "cache-control"), None);
}

// =============================================================================
// Server-Timing
// =============================================================================

#[tokio::test]
async fn test_server_timing_present_in_debug() {
    let response = get_uri(app(default_opener(), full_pipeline()), "/cog/slow").await;
    let timing = header(&response, "server-timing").unwrap();

    let ms: f64 = timing
        .strip_prefix("total;dur=")
        .unwrap()
        .parse()
        .unwrap();
    assert!(ms >= 25.0, "expected the handler delay in {}", timing);
}

#[tokio::test]
async fn test_server_timing_absent_without_debug() {
    let pipeline = PipelineConfig::new().with_lower_case_query(true);
    let response = get_uri(app(default_opener(), pipeline), "/cog/slow").await;
    assert_eq!(header(&response, "server-timing"), None);
}

#[tokio::test]
async fn test_stacked_timing_stages() {
    let pipeline = PipelineConfig::new().with_order(vec![
        StageKind::Timing,
        StageKind::CacheControl,
        StageKind::Timing,
    ]);
    let response = get_uri(app(default_opener(), pipeline), "/cog/slow").await;
    let timing = header(&response, "server-timing").unwrap();
    assert_eq!(timing.matches("total;dur=").count(), 2, "{}", timing);
}

// =============================================================================
// Query Normalization
// =============================================================================

#[tokio::test]
async fn test_mixed_case_query_keys() {
    let response = get_uri(
        app(default_opener(), full_pipeline()),
        "/cog/tiles/1/2/3?URL=s3://bucket/scene.tif&Rescale=0,255",
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await, "s3://bucket/scene.tif|0,255");
}

#[tokio::test]
async fn test_mixed_case_keys_rejected_without_normalization() {
    let pipeline = PipelineConfig::new();
    let response = get_uri(
        app(default_opener(), pipeline),
        "/cog/tiles/1/2/3?URL=s3://bucket/scene.tif",
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// =============================================================================
// Short-circuit
// =============================================================================

#[tokio::test]
async fn test_rejection_skips_inner_stages() {
    let opener = default_opener();
    let response = get_uri(
        app(opener.clone(), full_pipeline()),
        "/cog/tiles/1/2/3?url=s3://bucket/mosaic.vrt",
    )
    .await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(header(&response, "cache-control"), None);
    assert_eq!(header(&response, "server-timing"), None);
    assert_eq!(opener.open_count(), 0);
    assert_eq!(
        body_text(response).await,
        "VRT files are not supported in URL parameters."
    );
}

#[tokio::test]
async fn test_full_application_in_debug_mode() {
    let router = create_router(
        Arc::new(default_opener()),
        RouterConfig::new().with_pipeline(full_pipeline()),
    );
    let response = get_uri(router, "/cog/info?Url=s3://bucket/scene.tif").await;

    assert_eq!(response.status(), StatusCode::OK);
    assert!(header(&response, "server-timing").is_some());
    assert_eq!(header(&response, "cache-control").as_deref(), Some(CACHE_VALUE));
    assert_eq!(body_json(response).await["driver"], "GTiff");
}
