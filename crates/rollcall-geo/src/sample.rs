//! A single geographic reading.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A GPS reading: where a device was, and when.
///
/// The instructor's and the student's samples are taken independently and
/// only ever compared, never merged.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LocationSample {
    /// Degrees north (negative = south).
    pub latitude: f64,
    /// Degrees east (negative = west).
    pub longitude: f64,
    /// Capture time, seconds since the Unix epoch.
    pub captured_at: i64,
}

impl LocationSample {
    pub fn new(latitude: f64, longitude: f64, captured_at: i64) -> Self {
        Self {
            latitude,
            longitude,
            captured_at,
        }
    }

    /// `true` if both coordinates are finite numbers.
    ///
    /// Range is not checked: a reading of 91° latitude is wrong but still
    /// yields a finite distance, and rejecting it is the source's job.
    pub fn is_finite(&self) -> bool {
        self.latitude.is_finite() && self.longitude.is_finite()
    }
}

/// Six decimals, like the instructor dashboard shows them (~0.1 m).
impl fmt::Display for LocationSample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.6}, {:.6}", self.latitude, self.longitude)
    }
}
