mod common;

use common::TestContext;
use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;
use zipway::domain::cache_entry::{CachedLink, Decoded, link_key};
use zipway::domain::entities::LinkStatus;
use zipway::error::AppError;
use zipway::infrastructure::cache::CacheService;

#[tokio::test]
async fn test_round_trip_through_cache() {
    let ctx = TestContext::new();
    let service = ctx.link_service();

    let link = service
        .shorten_url("https://example.com/a", "", Some("user-1"))
        .await
        .unwrap();
    ctx.settle().await;

    let target = service.resolve_url(&link.short_id).await.unwrap();

    assert_eq!(target, "https://example.com/a");
    assert_eq!(ctx.links.get_calls(), 0);
}

#[tokio::test]
async fn test_round_trip_through_store() {
    let ctx = TestContext::new();
    let service = ctx.link_service();

    ctx.links
        .insert("dbonly", "https://example.com/b", LinkStatus::Active);

    let target = service.resolve_url("dbonly").await.unwrap();
    assert_eq!(target, "https://example.com/b");
    assert_eq!(ctx.links.get_calls(), 1);

    ctx.settle().await;
    let cached = ctx.cache.get(&link_key("dbonly")).await.unwrap().unwrap();
    assert!(matches!(CachedLink::decode(&cached), Decoded::Valid(_)));

    // Repopulated entry now serves the next resolution.
    service.resolve_url("dbonly").await.unwrap();
    assert_eq!(ctx.links.get_calls(), 1);
}

#[tokio::test]
async fn test_custom_slug_is_honored() {
    let ctx = TestContext::new();
    let service = ctx.link_service();

    let link = service
        .shorten_url("https://example.com", "my-slug", Some("user-1"))
        .await
        .unwrap();

    assert_eq!(link.short_id, "my-slug");
    assert_eq!(link.user_id.as_deref(), Some("user-1"));
    assert_eq!(link.status, LinkStatus::Active);
}

#[tokio::test]
async fn test_paused_link_is_blocked() {
    let ctx = TestContext::new();
    let service = ctx.link_service();

    ctx.links
        .insert("paused", "https://example.com", LinkStatus::Paused);

    let result = service.resolve_url("paused").await;
    assert!(matches!(result.unwrap_err(), AppError::Paused { .. }));
}

#[tokio::test]
async fn test_pause_takes_effect_when_cache_entry_expires() {
    let ctx = TestContext::new();
    let service = ctx.link_service().with_link_cache_ttl(1);

    service
        .shorten_url("https://example.com", "soon-paused", Some("user-1"))
        .await
        .unwrap();
    ctx.settle().await;

    ctx.links.set_status("soon-paused", LinkStatus::Paused);

    // The ACTIVE entry is still cached: resolution keeps succeeding until it expires.
    assert_eq!(
        service.resolve_url("soon-paused").await.unwrap(),
        "https://example.com"
    );

    tokio::time::sleep(Duration::from_millis(1100)).await;

    let result = service.resolve_url("soon-paused").await;
    assert!(matches!(result.unwrap_err(), AppError::Paused { .. }));
}

#[tokio::test]
async fn test_concurrent_custom_slug_conflict() {
    let ctx = TestContext::new();
    let service = Arc::new(ctx.link_service());

    let first = {
        let service = service.clone();
        tokio::spawn(async move {
            service
                .shorten_url("https://one.example.com", "race", Some("user-1"))
                .await
        })
    };
    let second = {
        let service = service.clone();
        tokio::spawn(async move {
            service
                .shorten_url("https://two.example.com", "race", Some("user-2"))
                .await
        })
    };

    let results = [first.await.unwrap(), second.await.unwrap()];

    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    assert_eq!(
        results
            .iter()
            .filter(|r| matches!(r, Err(AppError::Conflict { .. })))
            .count(),
        1
    );
    assert_eq!(ctx.links.len(), 1);
}

#[tokio::test]
async fn test_missing_owner_never_reaches_store() {
    let ctx = TestContext::new();
    let service = ctx.link_service();

    for owner in [None, Some("")] {
        let result = service
            .shorten_url("https://example.com", "slug", owner)
            .await;
        assert!(matches!(result.unwrap_err(), AppError::Validation { .. }));
    }

    assert_eq!(ctx.links.save_calls(), 0);
}

#[tokio::test]
async fn test_unknown_slug_is_not_found() {
    let ctx = TestContext::new();
    let service = ctx.link_service();

    let result = service.resolve_url("doesnotexist").await;

    assert!(matches!(result.unwrap_err(), AppError::NotFound { .. }));
}

#[tokio::test]
async fn test_clicks_are_counted_in_cache_and_store() {
    let ctx = TestContext::new();
    let service = ctx.link_service();

    ctx.links
        .insert("counted", "https://example.com", LinkStatus::Active);

    for _ in 0..3 {
        service.resolve_url("counted").await.unwrap();
    }
    ctx.settle().await;

    assert_eq!(ctx.links.clicks("counted"), 3);
    assert_eq!(
        ctx.cache.get("stats:counted").await.unwrap(),
        Some("3".to_string())
    );
}

#[tokio::test]
async fn test_click_failure_does_not_fail_resolution() {
    let mut ctx = TestContext::new();
    let service = ctx.link_service();

    ctx.links
        .insert("flaky", "https://example.com", LinkStatus::Active);
    ctx.links.fail_increments.store(true, Ordering::SeqCst);

    assert_eq!(
        service.resolve_url("flaky").await.unwrap(),
        "https://example.com"
    );
    ctx.settle().await;

    let failure = ctx.failures.recv().await.unwrap();
    assert_eq!(failure.task, "click_increment");
    assert_eq!(failure.key, "flaky");
}
