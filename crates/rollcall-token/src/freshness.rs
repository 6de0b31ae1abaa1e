//! How long a token stays scannable.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Token time-to-live.
///
/// A token is fresh while `now - issued_at <= ttl_seconds`. The default of
/// five minutes covers a student walking in late and fumbling for their
/// phone, while still making a screenshot forwarded from outside the room
/// go stale within the lecture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FreshnessConfig {
    pub ttl_seconds: i64,
}

impl FreshnessConfig {
    pub const DEFAULT_TTL_SECONDS: i64 = 300;

    pub fn new(ttl_seconds: i64) -> Self {
        Self { ttl_seconds }
    }

    /// Negative TTLs are meaningless; they clamp to zero (only tokens
    /// issued "now" or later are fresh).
    pub fn validated(mut self) -> Self {
        if self.ttl_seconds < 0 {
            self.ttl_seconds = 0;
        }
        self
    }

    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_seconds.max(0) as u64)
    }
}

impl Default for FreshnessConfig {
    fn default() -> Self {
        Self {
            ttl_seconds: Self::DEFAULT_TTL_SECONDS,
        }
    }
}
