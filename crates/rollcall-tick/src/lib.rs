//! Fixed-cadence tick scheduler for Rollcall.
//!
//! Every periodic activity in Rollcall runs on one of these:
//!
//! - token rotation (default every 5 s while a session is active)
//! - the instructor's background location refresh (default every 30 s)
//! - the scanner's frame polling (default 10 frames per second)
//!
//! # Idle mode
//!
//! When `interval_ms` is 0 the scheduler is idle and
//! [`TickScheduler::wait_for_tick`] pends forever. The same happens while
//! the scheduler is paused, which is how the rotation controller keeps its
//! loop quiet while no session is running.
//!
//! # Late wake-ups
//!
//! A tick that fires late never causes a catch-up burst: the next deadline
//! is always one interval after the tick actually fired. Missed ticks are
//! simply gone, which is what token rotation wants.
//!
//! # Integration
//!
//! The scheduler is meant to sit inside an actor's `tokio::select!` loop:
//!
//! ```ignore
//! loop {
//!     tokio::select! {
//!         Some(cmd) = cmd_rx.recv() => { /* start / end / query */ }
//!         tick = scheduler.wait_for_tick() => { /* rotate the token */ }
//!     }
//! }
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::time::{self, Instant};
use tracing::{debug, trace, warn};

/// Configuration for a [`TickScheduler`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TickConfig {
    /// Milliseconds between ticks. 0 = idle (tick never fires).
    pub interval_ms: u64,
    /// Whether the scheduler starts paused.
    pub start_paused: bool,
}

impl TickConfig {
    /// Shortest supported interval. Anything faster than 100 Hz is a bug
    /// for the kind of work Rollcall schedules.
    pub const MIN_INTERVAL_MS: u64 = 10;

    pub fn every(interval: Duration) -> Self {
        Self {
            interval_ms: interval.as_millis() as u64,
            ..Default::default()
        }
    }

    /// `per_second` ticks a second; `0` yields an idle config.
    pub fn per_second(per_second: u32) -> Self {
        if per_second == 0 {
            return Self::default();
        }
        Self::every(Duration::from_millis(1_000 / u64::from(per_second)))
    }

    /// Raises a non-zero `interval_ms` below [`Self::MIN_INTERVAL_MS`] to
    /// that minimum. [`TickScheduler::new`] calls this for you.
    pub fn validated(mut self) -> Self {
        if self.interval_ms != 0 && self.interval_ms < Self::MIN_INTERVAL_MS {
            warn!(
                interval_ms = self.interval_ms,
                min = Self::MIN_INTERVAL_MS,
                "tick interval below minimum, clamping"
            );
            self.interval_ms = Self::MIN_INTERVAL_MS;
        }
        self
    }

    /// Duration of a single tick. `None` for idle mode.
    pub fn interval(&self) -> Option<Duration> {
        (self.interval_ms != 0).then(|| Duration::from_millis(self.interval_ms))
    }
}

/// What [`TickScheduler::wait_for_tick`] hands back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickInfo {
    /// Tick number, starting at 1.
    pub tick: u64,
    /// The tick fired more than a tenth of an interval after its deadline.
    pub overrun: bool,
}

/// Fixed-cadence tick scheduler. One per periodic task.
pub struct TickScheduler {
    interval: Option<Duration>,
    next_tick: Option<Instant>,
    paused: bool,
    tick_count: u64,
}

impl TickScheduler {
    pub fn new(config: TickConfig) -> Self {
        let config = config.validated();
        let interval = config.interval();

        match interval {
            None => debug!("tick scheduler created in idle mode"),
            Some(d) => debug!(
                interval_ms = d.as_millis() as u64,
                paused = config.start_paused,
                "tick scheduler created"
            ),
        }

        Self {
            interval,
            next_tick: interval.map(|d| Instant::now() + d),
            paused: config.start_paused,
            tick_count: 0,
        }
    }

    /// Waits until the next tick is due.
    ///
    /// In idle mode or while paused this future never resolves; other
    /// `select!` branches keep running.
    pub async fn wait_for_tick(&mut self) -> TickInfo {
        let (deadline, interval) = match (self.next_tick, self.interval) {
            (Some(deadline), Some(interval)) if !self.paused => (deadline, interval),
            _ => std::future::pending().await,
        };

        time::sleep_until(deadline).await;

        let fired = Instant::now();
        self.tick_count += 1;
        self.next_tick = Some(fired + interval);

        let late_by = fired.saturating_duration_since(deadline);
        let overrun = late_by > interval / 10;
        if late_by >= interval {
            warn!(
                tick = self.tick_count,
                late_ms = late_by.as_millis() as u64,
                "tick fired more than an interval late, missed ticks dropped"
            );
        }
        trace!(tick = self.tick_count, overrun, "tick fired");

        TickInfo {
            tick: self.tick_count,
            overrun,
        }
    }

    /// Stops ticking until [`resume`](Self::resume). Idempotent.
    pub fn pause(&mut self) {
        if !self.paused {
            self.paused = true;
            debug!(tick = self.tick_count, "tick scheduler paused");
        }
    }

    /// Picks the cadence back up. The first tick after a resume is a full
    /// interval away, however long the pause lasted. Idempotent.
    pub fn resume(&mut self) {
        if !self.paused {
            return;
        }
        self.paused = false;
        self.next_tick = self.interval.map(|d| Instant::now() + d);
        debug!(tick = self.tick_count, "tick scheduler resumed");
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Ticks fired so far. Pausing does not reset it.
    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }
}
