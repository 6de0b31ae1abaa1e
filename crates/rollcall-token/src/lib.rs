//! The rotating QR token for Rollcall.
//!
//! This crate defines what a QR code on the lecture-hall screen actually
//! says, and how a scanner reads it back:
//!
//! - **Types** ([`SessionDescriptor`], [`LectureType`], [`TimeSlot`],
//!   [`Token`], [`TokenFields`]): what a session is and what a token carries.
//! - **Codec** ([`TokenCodec`] trait, [`DelimitedCodec`]): how those fields
//!   become a string and back.
//! - **Freshness** ([`FreshnessConfig`]): how long a token stays valid.
//! - **Clock** ([`Clock`], [`SystemClock`], [`ManualClock`]): where "now"
//!   comes from.
//! - **Errors** ([`TokenError`]).
//!
//! # Wire format
//!
//! ```text
//! SRM_Theory_Batch 1_9_10_2024_03_21_7_18.5204_73.8567_1711012523
//! │   │      │       │ │  │    │  │  │ │       │       └ issued at (epoch s)
//! │   │      │       │ │  │    │  │  │ │       └ longitude
//! │   │      │       │ │  │    │  │  │ └ latitude
//! │   │      │       │ │  │    │  │  └ sequence number
//! │   │      │       │ │  └────┴──┴ date (month and day zero-padded)
//! │   │      │       └─┴ time slot start / end hour
//! │   │      └ batch (may be empty)
//! │   └ lecture type
//! └ subject
//! ```
//!
//! Old and new scanning clients must agree on this layout field for field,
//! so it is the one boundary in Rollcall that is bit-exact.

mod clock;
mod codec;
mod error;
mod freshness;
mod types;

pub use clock::{Clock, ManualClock, SystemClock};
pub use codec::{DelimitedCodec, TokenCodec};
pub use error::TokenError;
pub use freshness::FreshnessConfig;
pub use types::{
    LectureType, SessionDescriptor, TimeSlot, Token, TokenFields, WHOLE_CLASS, sheet_title,
};
