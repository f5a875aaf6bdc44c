//! Format guard integration tests.
//!
//! Tests verify:
//! - Path and `url` parameter checks, in that order
//! - Content probing with a mock opener and with the sniffing opener on
//!   real files
//! - Probe failures and timeouts letting requests through

use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use axum::http::StatusCode;

use tile_gateway::{
    create_router, FormatGuardConfig, PipelineConfig, RasterOpener, RouterConfig, SniffingOpener,
};

use super::test_utils::{body_json, body_text, get, header, MockOpener};

const PATH_MESSAGE: &str = "VRT files are not supported.";
const PARAM_MESSAGE: &str = "VRT files are not supported in URL parameters.";

fn router_with(opener: Arc<dyn RasterOpener>) -> axum::Router {
    create_router(opener, RouterConfig::new())
}

async fn assert_rejected(router: axum::Router, uri: &str, message: &str) {
    let response = get(router, uri).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN, "{}", uri);
    assert!(header(&response, "content-type")
        .unwrap()
        .starts_with("text/plain"));
    assert_eq!(body_text(response).await, message);
}

// =============================================================================
// Textual Checks
// =============================================================================

#[tokio::test]
async fn test_vrt_path_rejected() {
    let router = router_with(Arc::new(MockOpener::new()));
    assert_rejected(router.clone(), "/cog/preview.VRT", PATH_MESSAGE).await;
    assert_rejected(router.clone(), "/data/mosaic.vrt/tiles/1/2/3", PATH_MESSAGE).await;
    assert_rejected(router, "/data/mosaic%2Evrt", PATH_MESSAGE).await;
}

#[tokio::test]
async fn test_path_check_runs_before_parameter_check() {
    let router = router_with(Arc::new(MockOpener::new()));
    assert_rejected(router, "/a.vrt?url=b.vrt", PATH_MESSAGE).await;
}

#[tokio::test]
async fn test_vrt_url_parameter_rejected() {
    let opener = MockOpener::new();
    let router = router_with(Arc::new(opener.clone()));

    assert_rejected(router.clone(), "/cog/info?url=s3://b/Mosaic.VRT", PARAM_MESSAGE).await;
    assert_rejected(router.clone(), "/cog/info?URL=https://h/m.vrt", PARAM_MESSAGE).await;
    assert_rejected(router, "/cog/info?url=https%3A%2F%2Fh%2Fm%2Evrt", PARAM_MESSAGE).await;

    // Textual rejections never open anything
    assert_eq!(opener.open_count(), 0);
}

// =============================================================================
// Content Probe
// =============================================================================

#[tokio::test]
async fn test_disguised_vrt_rejected() {
    let opener = MockOpener::new().with_raster("s3://bucket/innocent.tif", "VRT");
    let router = router_with(Arc::new(opener.clone()));

    assert_rejected(router, "/cog/info?url=s3://bucket/Innocent.tif", PARAM_MESSAGE).await;
    assert_eq!(opener.opened(), vec!["s3://bucket/innocent.tif"]);
}

#[tokio::test]
async fn test_probe_allows_real_raster() {
    let opener = MockOpener::new().with_raster("s3://bucket/scene.tif", "GTiff");
    let router = router_with(Arc::new(opener.clone()));

    let response = get(router, "/cog/info?url=s3://bucket/scene.tif").await;
    assert_eq!(response.status(), StatusCode::OK);
    // Once by the guard, once by the handler
    assert_eq!(opener.open_count(), 2);
}

#[tokio::test]
async fn test_duplicate_url_keys_all_opened() {
    let opener = MockOpener::new()
        .with_raster("good.tif", "GTiff")
        .with_raster("evil.tif", "VRT");
    let router = router_with(Arc::new(opener));

    assert_rejected(router, "/cog/info?URL=good.tif&url=evil.tif", PARAM_MESSAGE).await;
}

#[tokio::test]
async fn test_probe_failure_lets_request_through() {
    let opener = MockOpener::new();
    let router = router_with(Arc::new(opener.clone()));

    let response = get(router, "/cog/info?url=s3://bucket/missing.tif").await;
    // The handler reports the missing object, the guard does not
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_probe_timeout_lets_request_through() {
    let opener = MockOpener::new()
        .with_raster("s3://bucket/slow.tif", "VRT")
        .with_delay(Duration::from_millis(500));
    let pipeline = PipelineConfig::new().with_format_guard(
        FormatGuardConfig::default().with_probe_timeout(Duration::from_millis(20)),
    );
    let router = create_router(
        Arc::new(opener),
        RouterConfig::new().with_cog(false).with_pipeline(pipeline),
    );

    let response = get(router, "/cog/info?url=s3://bucket/slow.tif").await;
    assert_ne!(response.status(), StatusCode::FORBIDDEN);
}

// =============================================================================
// Sniffing Opener on Real Files
// =============================================================================

fn sniffing_router() -> axum::Router {
    router_with(Arc::new(SniffingOpener::new(reqwest::Client::new())))
}

#[tokio::test]
async fn test_sniffed_vrt_behind_tif_extension() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("scene.tif");
    let mut file = std::fs::File::create(&path).unwrap();
    file.write_all(b"<?xml version=\"1.0\"?>\n<VRTDataset rasterXSize=\"512\" rasterYSize=\"512\">\n</VRTDataset>\n")
        .unwrap();

    let uri = format!(
        "/cog/info?url={}",
        urlencoding::encode(path.to_str().unwrap())
    );
    assert_rejected(sniffing_router(), &uri, PARAM_MESSAGE).await;
}

#[tokio::test]
async fn test_sniffed_geotiff_allowed() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("Scene.TIF");
    let mut file = std::fs::File::create(&path).unwrap();
    file.write_all(b"II*\x00\x08\x00\x00\x00\x00\x00").unwrap();

    let uri = format!(
        "/cog/info?url={}",
        urlencoding::encode(path.to_str().unwrap())
    );
    let response = get(sniffing_router(), &uri).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["driver"], "GTiff");
}

#[tokio::test]
async fn test_inline_vrt_rejected() {
    let uri = format!(
        "/cog/info?url={}",
        urlencoding::encode("<VRTDataset><VRTRasterBand band=\"1\"/></VRTDataset>")
    );
    assert_rejected(sniffing_router(), &uri, PARAM_MESSAGE).await;
}

#[tokio::test]
async fn test_unsupported_scheme_not_rejected() {
    let response = get(sniffing_router(), "/cog/info?url=ftp://host/a.tif").await;
    assert_ne!(response.status(), StatusCode::FORBIDDEN);
}
