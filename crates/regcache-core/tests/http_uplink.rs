//! Integration tests for the HTTP uplink and the fan-out synchronizer.
//!
//! These tests use a mock npm registry to avoid network calls.

use axum::{
    extract::Path,
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use regcache_core::manifest::{
    check_remote, registry_codes, FanoutSync, HttpUplink, SyncOptions, Uplink, UplinkSync,
};
use regcache_core::{Config, UplinkConfig};

const LEFT_PAD_ETAG: &str = "\"v1\"";

fn left_pad() -> serde_json::Value {
    serde_json::json!({
        "name": "left-pad",
        "readme": "# left-pad",
        "dist-tags": {"latest": "1.3.0"},
        "versions": {
            "1.3.0": {
                "name": "left-pad",
                "version": "1.3.0",
                "dist": {"tarball": "https://example.com/left-pad-1.3.0.tgz"}
            }
        },
        "time": {"1.3.0": "2018-04-09T00:00:00.000Z"}
    })
}

async fn handle_manifest(Path(name): Path<String>, headers: HeaderMap) -> Response {
    match name.as_str() {
        "left-pad" => {
            let cached = headers
                .get(header::IF_NONE_MATCH)
                .and_then(|v| v.to_str().ok())
                == Some(LEFT_PAD_ETAG);
            if cached {
                return StatusCode::NOT_MODIFIED.into_response();
            }
            (
                StatusCode::OK,
                [
                    (header::CONTENT_TYPE, "application/json"),
                    (header::ETAG, LEFT_PAD_ETAG),
                ],
                left_pad().to_string(),
            )
                .into_response()
        }
        "@scope/pkg" => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "application/json")],
            serde_json::json!({"name": "@scope/pkg", "versions": {"0.1.0": {}}}).to_string(),
        )
            .into_response(),
        "broken" => (StatusCode::INTERNAL_SERVER_ERROR, "oops").into_response(),
        "garbage" => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "application/json")],
            "{not json",
        )
            .into_response(),
        _ => (StatusCode::NOT_FOUND, "Not found").into_response(),
    }
}

/// Start the mock registry on an ephemeral port. Returns the base URL.
async fn start_mock_registry() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = Router::new().route("/:name", get(handle_manifest));

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://{addr}/")
}

/// A URL nothing is listening on.
async fn dead_registry() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}/")
}

async fn uplink() -> HttpUplink {
    let url = start_mock_registry().await;
    HttpUplink::new(&UplinkConfig::new("mock", url)).unwrap()
}

#[tokio::test]
async fn test_fetch_manifest_with_etag() {
    let uplink = uplink().await;

    let fetched = uplink.fetch("left-pad", None).await.unwrap().unwrap();
    assert_eq!(fetched.etag.as_deref(), Some(LEFT_PAD_ETAG));
    assert_eq!(fetched.manifest.name, "left-pad");
    assert_eq!(fetched.manifest.dist_tags["latest"], "1.3.0");
    assert_eq!(
        fetched.manifest.versions["1.3.0"].extra["dist"]["tarball"],
        "https://example.com/left-pad-1.3.0.tgz"
    );
}

#[tokio::test]
async fn test_fetch_not_modified() {
    let uplink = uplink().await;
    let fetched = uplink.fetch("left-pad", Some(LEFT_PAD_ETAG)).await.unwrap();
    assert!(fetched.is_none());
}

#[tokio::test]
async fn test_fetch_scoped_package() {
    let uplink = uplink().await;
    let fetched = uplink.fetch("@scope/pkg", None).await.unwrap().unwrap();
    assert_eq!(fetched.manifest.name, "@scope/pkg");
    assert_eq!(fetched.manifest.dist_tags["latest"], "0.1.0");
}

#[tokio::test]
async fn test_fetch_errors_carry_status() {
    let uplink = uplink().await;

    let missing = uplink.fetch("nope", None).await.unwrap_err();
    assert!(missing.is_not_found());

    let broken = uplink.fetch("broken", None).await.unwrap_err();
    assert_eq!(broken.status(), 500);
    assert_eq!(broken.code(), registry_codes::UPLINK_ERROR);

    let garbage = uplink.fetch("garbage", None).await.unwrap_err();
    assert_eq!(garbage.code(), registry_codes::BAD_DATA);
}

#[tokio::test]
async fn test_fetch_unreachable_uplink() {
    let url = dead_registry().await;
    let uplink = HttpUplink::new(&UplinkConfig::new("dead", url)).unwrap();

    let err = uplink.fetch("left-pad", None).await.unwrap_err();
    assert!(!err.is_not_found());
    assert_eq!(err.status(), 503);
}

#[tokio::test]
async fn test_fanout_from_config() {
    let config = Config::default()
        .with_uplink(UplinkConfig::new("mock", start_mock_registry().await))
        .with_uplink(UplinkConfig::new("dead", dead_registry().await));
    let sync = FanoutSync::from_config(&config).unwrap();

    let outcome = sync
        .sync("left-pad", None, SyncOptions::default())
        .await
        .unwrap();

    let manifest = outcome.manifest.unwrap();
    assert_eq!(manifest.readme.as_deref(), Some("# left-pad"));
    assert_eq!(manifest.uplinks["mock"].etag.as_deref(), Some(LEFT_PAD_ETAG));
    assert_eq!(outcome.uplink_errors.len(), 2);
    assert!(outcome.uplink_errors[0].is_none());
    assert_eq!(outcome.uplink_errors[1].as_ref().unwrap().status(), 503);
}

#[tokio::test]
async fn test_check_remote_against_registries() {
    let live = start_mock_registry().await;
    let dead = dead_registry().await;

    let only_live = FanoutSync::from_config(
        &Config::default().with_uplink(UplinkConfig::new("mock", live.clone())),
    )
    .unwrap();
    assert!(check_remote("brand-new", false, &only_live).await.is_ok());

    let err = check_remote("left-pad", false, &only_live)
        .await
        .unwrap_err();
    assert_eq!(err.code(), registry_codes::PACKAGE_EXISTS);

    let with_dead = FanoutSync::from_config(
        &Config::default()
            .with_uplink(UplinkConfig::new("mock", live))
            .with_uplink(UplinkConfig::new("dead", dead)),
    )
    .unwrap();
    let err = check_remote("brand-new", false, &with_dead)
        .await
        .unwrap_err();
    assert_eq!(err.code(), registry_codes::UPLINK_OFFLINE_PUBLISH);
    assert!(check_remote("brand-new", true, &with_dead).await.is_ok());
}
