//! Error types for the location layer.

/// Errors a [`LocationSource`](crate::LocationSource) can report.
///
/// None of these are fatal: the instructor side falls back to the cached
/// or default location, and the student side simply can't be granted
/// attendance for that scan.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LocationError {
    /// The device could not produce a fix (no permission, no signal,
    /// hardware missing...).
    #[error("location unavailable: {0}")]
    Unavailable(String),

    /// The source did not answer within the refresh timeout.
    #[error("location request timed out after {0} ms")]
    Timeout(u64),
}
