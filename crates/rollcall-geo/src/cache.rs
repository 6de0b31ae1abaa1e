//! The instructor's last known position.
//!
//! Rotation mints a token every few seconds and each token carries the
//! instructor's coordinates, but asking the OS for a fresh fix can take
//! seconds. So the two are decoupled:
//!
//! - a background [`RefreshTask`] polls the [`LocationSource`] on its own
//!   cadence and writes into the cache,
//! - rotation calls [`LocationCache::get`], which never waits on the source.
//!
//! When no fix has ever succeeded, `get` returns the fallback sample the
//! cache was built with.

use std::sync::Arc;
use std::time::Duration;

use rollcall_tick::{TickConfig, TickScheduler};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tokio::task::JoinHandle;

use crate::{LocationError, LocationSample, LocationSource};

/// Cadence and timeout of the background refresh.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RefreshConfig {
    /// Milliseconds between refresh attempts.
    pub interval_ms: u64,
    /// Give up on a single attempt after this many milliseconds.
    pub timeout_ms: u64,
}

impl RefreshConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            interval_ms: 30_000,
            timeout_ms: 10_000,
        }
    }
}

/// Shared, cheaply cloneable cache of the latest successful sample.
pub struct LocationCache<S: LocationSource> {
    source: Arc<S>,
    latest: Arc<RwLock<Option<LocationSample>>>,
    fallback: LocationSample,
}

impl<S: LocationSource> Clone for LocationCache<S> {
    fn clone(&self) -> Self {
        Self {
            source: Arc::clone(&self.source),
            latest: Arc::clone(&self.latest),
            fallback: self.fallback,
        }
    }
}

impl<S: LocationSource> LocationCache<S> {
    /// Creates an empty cache. Until the first successful refresh,
    /// [`get`](Self::get) returns `fallback`.
    pub fn new(source: S, fallback: LocationSample) -> Self {
        Self {
            source: Arc::new(source),
            latest: Arc::new(RwLock::new(None)),
            fallback,
        }
    }

    /// Asks the source for a fix and stores it on success.
    ///
    /// On failure the previously cached sample is kept and the error is
    /// returned for the caller to log or ignore.
    pub async fn refresh(&self) -> Result<LocationSample, LocationError> {
        match self.source.current_location().await {
            Ok(sample) => {
                *self.latest.write().await = Some(sample);
                tracing::debug!(%sample, "instructor location refreshed");
                Ok(sample)
            }
            Err(e) => {
                tracing::warn!(error = %e, "location refresh failed, keeping cached sample");
                Err(e)
            }
        }
    }

    /// Like [`refresh`](Self::refresh), but gives up after `timeout`.
    pub async fn refresh_within(&self, timeout: Duration) -> Result<LocationSample, LocationError> {
        match tokio::time::timeout(timeout, self.refresh()).await {
            Ok(result) => result,
            Err(_) => {
                let ms = timeout.as_millis() as u64;
                tracing::warn!(timeout_ms = ms, "location refresh timed out");
                Err(LocationError::Timeout(ms))
            }
        }
    }

    /// The most recent sample, or the fallback if none was ever cached.
    pub async fn get(&self) -> LocationSample {
        self.latest.read().await.unwrap_or(self.fallback)
    }

    /// The most recent sample, `None` if no refresh has succeeded yet.
    pub async fn latest(&self) -> Option<LocationSample> {
        *self.latest.read().await
    }

    pub fn fallback(&self) -> LocationSample {
        self.fallback
    }

    /// Starts the background refresh loop: one attempt per
    /// `config.interval_ms`, the first one a full interval from now. Take
    /// the initial fix with [`refresh_within`](Self::refresh_within).
    /// The loop lives until the returned [`RefreshTask`] is stopped or
    /// dropped.
    pub fn spawn_refresh(&self, config: RefreshConfig) -> RefreshTask {
        let cache = self.clone();
        let timeout = config.timeout();
        let mut scheduler = TickScheduler::new(TickConfig {
            interval_ms: config.interval_ms,
            ..Default::default()
        });

        let handle = tokio::spawn(async move {
            loop {
                scheduler.wait_for_tick().await;
                // Errors are already logged by refresh().
                let _ = cache.refresh_within(timeout).await;
            }
        });

        tracing::debug!(interval_ms = config.interval_ms, "location refresh started");
        RefreshTask { handle }
    }
}

/// Handle to a running background refresh loop. Aborts the loop when
/// stopped or dropped.
pub struct RefreshTask {
    handle: JoinHandle<()>,
}

impl RefreshTask {
    pub fn stop(&self) {
        if !self.handle.is_finished() {
            self.handle.abort();
            tracing::debug!("location refresh stopped");
        }
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for RefreshTask {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
