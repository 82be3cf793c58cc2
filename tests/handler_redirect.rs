mod common;

use axum::{Router, routing::get};
use axum_test::TestServer;
use common::TestContext;
use serde_json::Value;
use zipway::api::handlers::{redirect_handler, resolve_handler};
use zipway::domain::entities::LinkStatus;

fn app(ctx: &TestContext) -> Router {
    Router::new()
        .route("/{slug}", get(redirect_handler))
        .route("/api/resolve/{slug}", get(resolve_handler))
        .with_state(ctx.state())
}

#[tokio::test]
async fn test_redirect_success() {
    let ctx = TestContext::new();
    ctx.links
        .insert("redirect1", "https://example.com/target", LinkStatus::Active);
    let server = TestServer::new(app(&ctx)).unwrap();

    let response = server.get("/redirect1").await;

    assert_eq!(response.status_code(), 301);
    assert_eq!(response.header("location"), "https://example.com/target");

    ctx.settle().await;
    assert_eq!(ctx.links.clicks("redirect1"), 1);
}

#[tokio::test]
async fn test_redirect_not_found() {
    let ctx = TestContext::new();
    let server = TestServer::new(app(&ctx)).unwrap();

    let response = server.get("/nonexistent").await;

    assert_eq!(response.status_code(), 404);
}

#[tokio::test]
async fn test_redirect_paused_renders_as_not_found() {
    let ctx = TestContext::new();
    ctx.links
        .insert("paused", "https://example.com", LinkStatus::Paused);
    let server = TestServer::new(app(&ctx)).unwrap();

    let paused = server.get("/paused").await;
    let missing = server.get("/missing").await;

    assert_eq!(paused.status_code(), 404);
    assert_eq!(paused.text(), missing.text());
}

#[tokio::test]
async fn test_resolve_returns_target_with_cache_headers() {
    let ctx = TestContext::new();
    ctx.links
        .insert("abc123", "https://example.com/x", LinkStatus::Active);
    let server = TestServer::new(app(&ctx)).unwrap();

    let response = server.get("/api/resolve/abc123").await;

    response.assert_status_ok();
    assert_eq!(
        response.header("cache-control"),
        "public, max-age=60, s-maxage=60, stale-while-revalidate=300"
    );
    let body: Value = response.json();
    assert_eq!(body["target_url"], "https://example.com/x");
}

#[tokio::test]
async fn test_resolve_not_found() {
    let ctx = TestContext::new();
    let server = TestServer::new(app(&ctx)).unwrap();

    let response = server.get("/api/resolve/unknown").await;

    assert_eq!(response.status_code(), 404);
    let body: Value = response.json();
    assert_eq!(body["error"]["message"], "Link not found");
    assert!(response.maybe_header("cache-control").is_none());
}
