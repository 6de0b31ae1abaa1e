//! Session rotation for Rollcall.
//!
//! While a session is active, the instructor's screen shows a QR token that
//! is re-minted every few seconds with a fresh sequence number, issue time
//! and the instructor's latest position. This crate owns that loop.
//!
//! Each controller runs as an isolated Tokio task (actor model). The
//! outside world talks to it through a [`RotationHandle`]; session state is
//! never shared, so a tick can't interleave with a start or an end.
//!
//! # Key types
//!
//! - [`spawn_controller`]: starts the actor, returns its handle
//! - [`RotationHandle`]: start/end sessions, read the current token
//! - [`RotationState`]: the sequence and token bookkeeping
//! - [`RotationConfig`]: tick interval, sequence ceiling, location refresh
//! - [`RotationSnapshot`]: a read-only view for dashboards

mod config;
mod controller;
mod error;
mod state;

pub use config::RotationConfig;
pub use controller::{RotationHandle, spawn_controller};
pub use error::RotationError;
pub use state::{RotationSnapshot, RotationState, format_duration};
