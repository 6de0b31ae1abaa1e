//! Location handling for Rollcall.
//!
//! This crate answers one question: *is the student standing close enough
//! to the instructor?* It provides:
//!
//! 1. **Samples**: a GPS reading with its capture time ([`LocationSample`])
//! 2. **Sources**: where readings come from ([`LocationSource`] trait)
//! 3. **Caching**: the instructor's last known position, refreshed in the
//!    background with a documented fallback ([`LocationCache`])
//! 4. **Proximity**: haversine distance and the geofence threshold
//!    ([`ProximityValidator`])
//!
//! # How it fits in the stack
//!
//! ```text
//! Rotation (above)  ← reads the cached instructor location every tick
//!     ↕
//! Geo (this crate)  ← samples, cache, distance
//!     ↕
//! Tick (below)      ← cadence for the background refresh
//! ```

#![allow(async_fn_in_trait)]

mod cache;
mod error;
mod proximity;
mod sample;
mod source;

pub use cache::{LocationCache, RefreshConfig, RefreshTask};
pub use error::LocationError;
pub use proximity::{EARTH_RADIUS_METERS, ProximityConfig, ProximityValidator, distance_meters};
pub use sample::LocationSample;
pub use source::LocationSource;
