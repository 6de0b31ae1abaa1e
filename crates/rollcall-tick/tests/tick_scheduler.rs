//! Integration tests for the fixed-cadence tick scheduler.
//!
//! Uses `start_paused = true` so Tokio auto-advances the clock whenever
//! every task is idle; `sleep_until` resolves instantly in test time.

use std::time::Duration;

use rollcall_tick::{TickConfig, TickScheduler};
use tokio::time::Instant;

fn rotation_cadence() -> TickConfig {
    TickConfig::every(Duration::from_secs(5))
}

// =========================================================================
// TickConfig
// =========================================================================

#[test]
fn test_default_config_is_idle_and_running() {
    let cfg = TickConfig::default();
    assert_eq!(cfg.interval(), None);
    assert!(!cfg.start_paused);
}

#[test]
fn test_every_sets_interval() {
    assert_eq!(rotation_cadence().interval(), Some(Duration::from_secs(5)));
}

#[test]
fn test_config_serde_uses_milliseconds() {
    let json = serde_json::to_string(&rotation_cadence()).unwrap();
    assert!(json.contains("\"interval_ms\":5000"), "{json}");

    let back: TickConfig = serde_json::from_str(&json).unwrap();
    assert_eq!(back, rotation_cadence());
}

// =========================================================================
// Firing
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_first_tick_lands_one_interval_after_creation() {
    let mut scheduler = TickScheduler::new(rotation_cadence());
    let created = Instant::now();

    let fired = scheduler.wait_for_tick().await;

    assert_eq!(fired.tick, 1);
    assert!(!fired.overrun);
    assert_eq!(created.elapsed(), Duration::from_secs(5));
}

#[tokio::test(start_paused = true)]
async fn test_tick_numbers_count_up_from_one() {
    let mut scheduler = TickScheduler::new(rotation_cadence());

    let numbers: Vec<u64> = {
        let mut seen = Vec::new();
        for _ in 0..4 {
            seen.push(scheduler.wait_for_tick().await.tick);
        }
        seen
    };

    assert_eq!(numbers, [1, 2, 3, 4]);
    assert_eq!(scheduler.tick_count(), 4);
}

#[tokio::test(start_paused = true)]
async fn test_idle_scheduler_never_fires() {
    let mut scheduler = TickScheduler::new(TickConfig::default());

    let waited = tokio::time::timeout(Duration::from_secs(60), scheduler.wait_for_tick()).await;
    assert!(waited.is_err(), "an idle scheduler has no deadline");
}

#[tokio::test(start_paused = true)]
async fn test_late_tick_drops_missed_ticks_instead_of_bursting() {
    let mut scheduler = TickScheduler::new(rotation_cadence());
    scheduler.wait_for_tick().await;

    // A rotation that stalled for 17 s: the deadline at 10 s was missed by 12 s.
    tokio::time::advance(Duration::from_secs(17)).await;
    let late = scheduler.wait_for_tick().await;
    assert_eq!(late.tick, 2);
    assert!(late.overrun);

    // The next tick is a whole interval away, not due immediately.
    let before = Instant::now();
    let next = scheduler.wait_for_tick().await;
    assert_eq!(next.tick, 3);
    assert!(!next.overrun);
    assert_eq!(before.elapsed(), Duration::from_secs(5));
}

// =========================================================================
// Pause / resume
// =========================================================================

#[test]
fn test_scheduler_can_start_paused() {
    let scheduler = TickScheduler::new(TickConfig {
        start_paused: true,
        ..rotation_cadence()
    });
    assert!(scheduler.is_paused());
    assert_eq!(scheduler.tick_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_paused_scheduler_stays_silent() {
    let mut scheduler = TickScheduler::new(rotation_cadence());
    scheduler.wait_for_tick().await;
    scheduler.pause();

    let waited = tokio::time::timeout(Duration::from_secs(30), scheduler.wait_for_tick()).await;
    assert!(waited.is_err(), "no tick while paused");
    assert_eq!(scheduler.tick_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_resume_after_long_pause_waits_a_full_interval() {
    let mut scheduler = TickScheduler::new(TickConfig {
        start_paused: true,
        ..rotation_cadence()
    });
    tokio::time::advance(Duration::from_secs(60)).await;

    scheduler.resume();
    let resumed = Instant::now();
    let fired = scheduler.wait_for_tick().await;

    assert_eq!(fired.tick, 1);
    assert!(!fired.overrun);
    assert_eq!(resumed.elapsed(), Duration::from_secs(5));
}

#[test]
fn test_pause_and_resume_are_idempotent() {
    let mut scheduler = TickScheduler::new(rotation_cadence());
    scheduler.pause();
    scheduler.pause();
    assert!(scheduler.is_paused());
    scheduler.resume();
    scheduler.resume();
    assert!(!scheduler.is_paused());
}

// =========================================================================
// Inside a select! loop, the way the rotation actor uses it
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_select_loop_stops_on_command() {
    let mut scheduler = TickScheduler::new(rotation_cadence());
    let (tx, mut rx) = tokio::sync::mpsc::channel::<&str>(4);

    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(16_000)).await;
        tx.send("end").await.ok();
    });

    let mut rotations = 0u64;
    loop {
        tokio::select! {
            Some(cmd) = rx.recv() => {
                assert_eq!(cmd, "end");
                break;
            }
            fired = scheduler.wait_for_tick() => {
                rotations += 1;
                assert_eq!(fired.tick, rotations);
            }
        }
    }

    assert_eq!(rotations, 3);
}
