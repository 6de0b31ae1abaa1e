//! The hook through which Rollcall asks a device where it is.
//!
//! Rollcall doesn't talk to GPS hardware itself. Browsers, phones and test
//! harnesses each have their own way of producing a fix, so the crate only
//! defines [`LocationSource`]: one async method returning a sample or an
//! error. The instructor's cache and the student's scanner both take one.

use crate::{LocationError, LocationSample};

/// Produces the current position of the device.
///
/// # Example
///
/// ```rust
/// use rollcall_geo::{LocationError, LocationSample, LocationSource};
///
/// /// Always reports the same spot. Handy for kiosks bolted to a wall.
/// struct FixedSource(LocationSample);
///
/// impl LocationSource for FixedSource {
///     async fn current_location(&self) -> Result<LocationSample, LocationError> {
///         Ok(self.0)
///     }
/// }
/// ```
pub trait LocationSource: Send + Sync + 'static {
    /// Returns the device's current position.
    ///
    /// May be slow (waiting on an OS location service). Callers that must
    /// not stall wrap it in a timeout or read a [`LocationCache`](crate::LocationCache)
    /// instead.
    fn current_location(
        &self,
    ) -> impl std::future::Future<Output = Result<LocationSample, LocationError>> + Send;
}
