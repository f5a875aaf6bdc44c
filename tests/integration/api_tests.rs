//! API integration tests for the application routes.
//!
//! Tests verify:
//! - Health check, landing page and `/cog/info`
//! - Path prefix and disabled routes
//! - Error bodies and status codes
//! - CORS and compression wiring

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};

use tile_gateway::error::ProbeError;
use tile_gateway::{create_router, CacheControlConfig, PipelineConfig, RouterConfig};

use super::test_utils::{body_json, body_text, get, header, send, FailingOpener, MockOpener};

fn opener() -> Arc<MockOpener> {
    Arc::new(
        MockOpener::new()
            .with_raster("s3://bucket/scene.tif", "GTiff")
            .with_raster("https://host/preview.png", "PNG"),
    )
}

fn cached() -> PipelineConfig {
    PipelineConfig::new()
        .with_cache_control(CacheControlConfig::new("public, max-age=3600").unwrap())
}

// =============================================================================
// Health and Landing
// =============================================================================

#[tokio::test]
async fn test_health_check() {
    let router = create_router(opener(), RouterConfig::new());
    let response = get(router, "/healthz").await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json, serde_json::json!({"ping": "pong!"}));
}

#[tokio::test]
async fn test_health_check_never_cached() {
    let router = create_router(opener(), RouterConfig::new().with_pipeline(cached()));

    let response = get(router.clone(), "/healthz").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(header(&response, "cache-control"), None);

    let response = get(router, "/").await;
    assert_eq!(
        header(&response, "cache-control").as_deref(),
        Some("public, max-age=3600")
    );
}

#[tokio::test]
async fn test_landing_page() {
    let router = create_router(opener(), RouterConfig::new());
    let response = get(router, "/").await;

    assert_eq!(response.status(), StatusCode::OK);
    assert!(header(&response, "content-type")
        .unwrap()
        .starts_with("text/html"));
    assert!(body_text(response).await.contains("Tile Gateway"));
}

// =============================================================================
// COG Info
// =============================================================================

#[tokio::test]
async fn test_cog_info_success() {
    let router = create_router(opener(), RouterConfig::new());
    let response = get(router, "/cog/info?url=s3://bucket/scene.tif").await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["url"], "s3://bucket/scene.tif");
    assert_eq!(json["driver"], "GTiff");
}

#[tokio::test]
async fn test_cog_info_missing_url() {
    let router = create_router(opener(), RouterConfig::new());
    let response = get(router, "/cog/info").await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["error"], "invalid_request");
    assert_eq!(json["status"], 400);
}

#[tokio::test]
async fn test_cog_info_not_found() {
    let router = create_router(opener(), RouterConfig::new());
    let response = get(router, "/cog/info?url=s3://bucket/missing.tif").await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["error"], "not_found");
}

#[tokio::test]
async fn test_cog_info_unsupported_scheme() {
    let router = create_router(
        Arc::new(FailingOpener(ProbeError::UnsupportedScheme("ftp".to_string()))),
        RouterConfig::new(),
    );
    let response = get(router, "/cog/info?url=ftp://host/a.tif").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_cog_info_error_not_cached() {
    let router = create_router(
        Arc::new(FailingOpener(ProbeError::Io(
            tile_gateway::IoError::Connection("refused".to_string()),
        ))),
        RouterConfig::new().with_pipeline(cached()),
    );
    let response = get(router, "/cog/info?url=https://host/a.tif").await;

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    assert_eq!(header(&response, "cache-control"), None);
}

#[tokio::test]
async fn test_cog_routes_can_be_disabled() {
    let router = create_router(opener(), RouterConfig::new().with_cog(false));
    let response = get(router, "/cog/info?url=s3://bucket/scene.tif").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// =============================================================================
// Path Prefix
// =============================================================================

#[tokio::test]
async fn test_path_prefix() {
    let router = create_router(
        opener(),
        RouterConfig::new()
            .with_path_prefix("/api")
            .with_pipeline(cached()),
    );

    let response = get(router.clone(), "/api/healthz").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(header(&response, "cache-control"), None);

    let response = get(router.clone(), "/api/cog/info?url=s3://bucket/scene.tif").await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = get(router.clone(), "/api").await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = get(router, "/healthz").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_unknown_route_is_json_404() {
    let router = create_router(opener(), RouterConfig::new());
    let response = get(router, "/nope").await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["error"], "not_found");
}

// =============================================================================
// CORS and Compression
// =============================================================================

#[tokio::test]
async fn test_cors_any_origin() {
    let router = create_router(opener(), RouterConfig::new());
    let request = Request::builder()
        .uri("/healthz")
        .header("origin", "https://maps.example.com")
        .body(Body::empty())
        .unwrap();
    let response = send(router, request).await;

    assert_eq!(
        header(&response, "access-control-allow-origin").as_deref(),
        Some("*")
    );
}

#[tokio::test]
async fn test_cors_specific_origin() {
    let router = create_router(
        opener(),
        RouterConfig::new().with_cors_origins(vec!["https://maps.example.com".to_string()]),
    );

    let allowed = Request::builder()
        .uri("/healthz")
        .header("origin", "https://maps.example.com")
        .body(Body::empty())
        .unwrap();
    let response = send(router.clone(), allowed).await;
    assert_eq!(
        header(&response, "access-control-allow-origin").as_deref(),
        Some("https://maps.example.com")
    );

    let other = Request::builder()
        .uri("/healthz")
        .header("origin", "https://evil.example.com")
        .body(Body::empty())
        .unwrap();
    let response = send(router, other).await;
    assert_eq!(header(&response, "access-control-allow-origin"), None);
}

#[tokio::test]
async fn test_landing_page_is_compressed() {
    let router = create_router(opener(), RouterConfig::new());
    let request = Request::builder()
        .uri("/")
        .header("accept-encoding", "gzip")
        .body(Body::empty())
        .unwrap();
    let response = send(router, request).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(header(&response, "content-encoding").as_deref(), Some("gzip"));
}
