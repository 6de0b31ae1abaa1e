//! # Rollcall
//!
//! Geofenced, rotating-QR attendance for lecture halls.
//!
//! The instructor's screen shows a QR code that changes every few seconds
//! and carries where the instructor is standing. A student's phone scans
//! it, checks that the code is recent and that the student is in the
//! room, and the student is marked present.
//!
//! ## Crates
//!
//! ```text
//! rollcall           ← scanning, validation, roster (this crate)
//!     ↕
//! rollcall-rotation  ← the instructor-side session actor
//!     ↕
//! rollcall-token     ← token wire format and freshness
//!     ↕
//! rollcall-geo       ← samples, location cache, geofence
//!     ↕
//! rollcall-tick      ← cadence for every periodic task
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use rollcall::prelude::*;
//!
//! # struct Gps;
//! # impl LocationSource for Gps {
//! #     async fn current_location(&self) -> Result<LocationSample, LocationError> {
//! #         Ok(LocationSample::new(18.5204, 73.8567, 0))
//! #     }
//! # }
//! # async fn run() -> Result<(), RollcallError> {
//! let controller = spawn_controller(
//!     RotationConfig::default(),
//!     Gps,
//!     DelimitedCodec,
//!     SystemClock,
//! );
//!
//! let descriptor = SessionDescriptor::new(
//!     "SRM",
//!     LectureType::Theory,
//!     WHOLE_CLASS,
//!     chrono::Utc::now().date_naive(),
//!     TimeSlot::starting_at(9)?,
//! )?;
//! let token = controller.start_session(descriptor).await?;
//! println!("show this: {token}");
//! # Ok(())
//! # }
//! ```

mod attendance;
mod consumption;
mod error;
mod roster;
mod scanner;

pub use attendance::{AttendanceConfig, AttendanceValidator, Verdict};
pub use consumption::ConsumptionLog;
pub use error::RollcallError;
pub use roster::{
    AttendanceRecord, ROSTER_HEADER, ROSTER_TAB, Roster, RosterError, RosterSheetService,
    sheet_id_from_url,
};
pub use scanner::{QrDecoder, ScanEnd, ScanOutcome, ScanSession, Scanner, ScannerConfig};

/// Convenient re-exports for common usage.
///
/// ```rust
/// use rollcall::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{
        AttendanceConfig, AttendanceRecord, AttendanceValidator, QrDecoder, RollcallError, Roster,
        RosterError, RosterSheetService, ScanEnd, ScanOutcome, ScanSession, Scanner,
        ScannerConfig, Verdict,
    };
    pub use rollcall_geo::{
        LocationCache, LocationError, LocationSample, LocationSource, ProximityConfig,
        ProximityValidator, RefreshConfig, distance_meters,
    };
    pub use rollcall_rotation::{
        RotationConfig, RotationError, RotationHandle, RotationSnapshot, format_duration,
        spawn_controller,
    };
    pub use rollcall_tick::{TickConfig, TickScheduler};
    pub use rollcall_token::{
        Clock, DelimitedCodec, FreshnessConfig, LectureType, ManualClock, SessionDescriptor,
        SystemClock, TimeSlot, Token, TokenCodec, TokenError, TokenFields, WHOLE_CLASS,
        sheet_title,
    };
}
