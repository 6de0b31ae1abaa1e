//! Integration tests for the location cache and its background refresh.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use rollcall_geo::{LocationCache, LocationError, LocationSample, LocationSource, RefreshConfig};

// =========================================================================
// Mock sources
// =========================================================================

/// Replays a fixed script of results, then keeps failing.
struct ScriptedSource {
    script: Mutex<VecDeque<Result<LocationSample, LocationError>>>,
}

impl ScriptedSource {
    fn new(script: Vec<Result<LocationSample, LocationError>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
        }
    }
}

impl LocationSource for ScriptedSource {
    async fn current_location(&self) -> Result<LocationSample, LocationError> {
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(LocationError::Unavailable("script exhausted".into())))
    }
}

/// Never answers.
struct HangingSource;

impl LocationSource for HangingSource {
    async fn current_location(&self) -> Result<LocationSample, LocationError> {
        std::future::pending().await
    }
}

fn campus() -> LocationSample {
    LocationSample::new(18.5204, 73.8567, 1_700_000_000)
}

fn fallback() -> LocationSample {
    LocationSample::new(0.0, 0.0, 0)
}

// =========================================================================
// get() / refresh()
// =========================================================================

#[tokio::test]
async fn test_get_before_any_refresh_returns_fallback() {
    let cache = LocationCache::new(ScriptedSource::new(vec![]), fallback());

    assert_eq!(cache.get().await, fallback());
    assert_eq!(cache.latest().await, None);
}

#[tokio::test]
async fn test_refresh_success_is_cached() {
    let cache = LocationCache::new(ScriptedSource::new(vec![Ok(campus())]), fallback());

    let sample = cache.refresh().await.expect("refresh should succeed");

    assert_eq!(sample, campus());
    assert_eq!(cache.get().await, campus());
}

#[tokio::test]
async fn test_refresh_failure_keeps_previous_sample() {
    let cache = LocationCache::new(
        ScriptedSource::new(vec![
            Ok(campus()),
            Err(LocationError::Unavailable("permission denied".into())),
        ]),
        fallback(),
    );
    cache.refresh().await.unwrap();

    let result = cache.refresh().await;

    assert!(matches!(result, Err(LocationError::Unavailable(_))));
    assert_eq!(cache.get().await, campus());
}

#[tokio::test]
async fn test_clones_share_the_same_cache() {
    let cache = LocationCache::new(ScriptedSource::new(vec![Ok(campus())]), fallback());
    let reader = cache.clone();

    cache.refresh().await.unwrap();

    assert_eq!(reader.get().await, campus());
}

#[tokio::test(start_paused = true)]
async fn test_refresh_within_times_out_on_hanging_source() {
    let cache = LocationCache::new(HangingSource, fallback());

    let result = cache.refresh_within(Duration::from_secs(2)).await;

    assert_eq!(result, Err(LocationError::Timeout(2_000)));
    assert_eq!(cache.get().await, fallback());
}

// =========================================================================
// Background refresh
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_spawn_refresh_polls_on_cadence() {
    let moved = LocationSample::new(18.5210, 73.8570, 1_700_000_030);
    let cache = LocationCache::new(
        ScriptedSource::new(vec![Ok(campus()), Ok(moved)]),
        fallback(),
    );

    let task = cache.spawn_refresh(RefreshConfig {
        interval_ms: 30_000,
        timeout_ms: 1_000,
    });

    tokio::time::sleep(Duration::from_millis(10)).await;
    assert_eq!(cache.latest().await, None);

    tokio::time::sleep(Duration::from_secs(30)).await;
    assert_eq!(cache.get().await, campus());

    tokio::time::sleep(Duration::from_secs(30)).await;
    assert_eq!(cache.get().await, moved);

    task.stop();
}

#[tokio::test(start_paused = true)]
async fn test_stopped_refresh_no_longer_polls() {
    let moved = LocationSample::new(18.5210, 73.8570, 1_700_000_001);
    let cache = LocationCache::new(
        ScriptedSource::new(vec![Ok(campus()), Ok(moved)]),
        fallback(),
    );

    let task = cache.spawn_refresh(RefreshConfig {
        interval_ms: 1_000,
        timeout_ms: 500,
    });
    tokio::time::sleep(Duration::from_millis(1_010)).await;
    task.stop();

    // The second scripted sample would land at t=2s if the loop were alive.
    tokio::time::sleep(Duration::from_secs(10)).await;
    assert_eq!(cache.latest().await, Some(campus()));
}
