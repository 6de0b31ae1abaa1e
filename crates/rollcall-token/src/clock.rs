//! Wall-clock time source.
//!
//! Token issue times are epoch seconds that the scanner compares against
//! its own clock, so they have to be wall-clock time, not a monotonic
//! instant. Everything that stamps or checks a token asks a [`Clock`], which
//! lets tests move time by hand.

use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};

/// Something that knows the current time in epoch seconds.
pub trait Clock: Send + Sync + 'static {
    fn now_epoch_seconds(&self) -> i64;
}

/// The system clock, via `chrono::Utc::now()`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_epoch_seconds(&self) -> i64 {
        chrono::Utc::now().timestamp()
    }
}

/// A clock that only moves when told to. Clones share the same time.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Arc<AtomicI64>,
}

impl ManualClock {
    pub fn new(now: i64) -> Self {
        Self {
            now: Arc::new(AtomicI64::new(now)),
        }
    }

    pub fn set(&self, now: i64) {
        self.now.store(now, Ordering::SeqCst);
    }

    pub fn advance(&self, seconds: i64) {
        self.now.fetch_add(seconds, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_epoch_seconds(&self) -> i64 {
        self.now.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_clock_clones_share_time() {
        let clock = ManualClock::new(1_000);
        let other = clock.clone();

        clock.advance(5);
        assert_eq!(other.now_epoch_seconds(), 1_005);

        other.set(42);
        assert_eq!(clock.now_epoch_seconds(), 42);
    }

    #[test]
    fn test_system_clock_is_after_2020() {
        assert!(SystemClock.now_epoch_seconds() > 1_577_836_800);
    }
}
