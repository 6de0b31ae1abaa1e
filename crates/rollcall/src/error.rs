//! Unified error type for Rollcall.

use rollcall_geo::LocationError;
use rollcall_rotation::RotationError;
use rollcall_token::TokenError;

use crate::RosterError;

/// Top-level error that wraps every crate-specific error.
///
/// `#[from]` on each variant lets `?` lift sub-crate errors without
/// ceremony. Scan rejections are not errors; they are
/// [`Verdict`](crate::Verdict)s.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RollcallError {
    #[error(transparent)]
    Token(#[from] TokenError),

    /// Recovered by a fallback wherever it occurs; surfaced only to callers
    /// that ask a source directly.
    #[error(transparent)]
    Location(#[from] LocationError),

    #[error(transparent)]
    Rotation(#[from] RotationError),

    #[error(transparent)]
    Roster(#[from] RosterError),
}
