//! Rotation configuration.

use std::time::Duration;

use rollcall_geo::{LocationSample, RefreshConfig};
use serde::{Deserialize, Serialize};

/// Configuration for a rotation controller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RotationConfig {
    /// Milliseconds between token rotations.
    pub interval_ms: u64,

    /// Largest sequence number before wrapping back to 1.
    pub sequence_ceiling: u32,

    /// How often the instructor's position is re-sampled during a session.
    pub refresh: RefreshConfig,

    /// Position written into tokens until the first successful fix.
    pub fallback_location: LocationSample,

    /// Capacity of the command channel. Senders wait when it is full.
    pub command_buffer: usize,
}

impl RotationConfig {
    pub const DEFAULT_INTERVAL_MS: u64 = 5_000;
    pub const DEFAULT_SEQUENCE_CEILING: u32 = 150;

    /// Replaces values the controller can't run with by the defaults.
    pub fn validated(mut self) -> Self {
        if self.interval_ms == 0 {
            tracing::warn!(
                default_ms = Self::DEFAULT_INTERVAL_MS,
                "rotation interval of 0 ms would never rotate, using default"
            );
            self.interval_ms = Self::DEFAULT_INTERVAL_MS;
        }
        if self.sequence_ceiling == 0 {
            tracing::warn!(
                default = Self::DEFAULT_SEQUENCE_CEILING,
                "sequence ceiling of 0 leaves no valid sequence numbers, using default"
            );
            self.sequence_ceiling = Self::DEFAULT_SEQUENCE_CEILING;
        }
        if self.command_buffer == 0 {
            self.command_buffer = 1;
        }
        self
    }

    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

impl Default for RotationConfig {
    fn default() -> Self {
        Self {
            interval_ms: Self::DEFAULT_INTERVAL_MS,
            sequence_ceiling: Self::DEFAULT_SEQUENCE_CEILING,
            refresh: RefreshConfig::default(),
            fallback_location: LocationSample::new(0.0, 0.0, 0),
            command_buffer: 32,
        }
    }
}
