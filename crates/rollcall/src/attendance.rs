//! Deciding whether one scan earns attendance.
//!
//! A scan passes three gates, in order: the string must be a token, the
//! token must be fresh, and the student must be standing within the
//! geofence of where the instructor was when the token was minted. The
//! first gate that fails names the [`Verdict`].

use std::fmt;

use rollcall_geo::{LocationSample, ProximityConfig, ProximityValidator};
use rollcall_token::{DelimitedCodec, FreshnessConfig, Token, TokenCodec, TokenFields};
use serde::{Deserialize, Serialize};

use crate::ConsumptionLog;

/// Configuration for an [`AttendanceValidator`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AttendanceConfig {
    pub freshness: FreshnessConfig,
    pub proximity: ProximityConfig,
    /// Remember this many accepted tokens and refuse them a second time.
    /// `None` (the default) disables replay protection: two students can
    /// both scan the same code on the screen, which is the point.
    pub replay_log_capacity: Option<usize>,
}

impl Default for AttendanceConfig {
    fn default() -> Self {
        Self {
            freshness: FreshnessConfig::default(),
            proximity: ProximityConfig::default(),
            replay_log_capacity: None,
        }
    }
}

impl AttendanceConfig {
    pub fn validated(mut self) -> Self {
        self.freshness = self.freshness.validated();
        self.proximity = self.proximity.validated();
        self
    }
}

/// Outcome of validating one scan.
#[derive(Debug, Clone, PartialEq)]
pub enum Verdict {
    /// Attendance granted.
    Accepted(TokenFields),
    /// The QR code is not a Rollcall token.
    Malformed,
    /// The token is older than the TTL.
    Expired,
    /// The student is too far from where the token was minted.
    OutOfRange { distance_m: f64 },
    /// This exact token was already accepted (replay log enabled only).
    AlreadyUsed,
    /// The student's own location could not be determined.
    LocationUnavailable,
}

impl Verdict {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted(_))
    }

    /// The accepted token's fields, if any.
    pub fn accepted(&self) -> Option<&TokenFields> {
        match self {
            Self::Accepted(fields) => Some(fields),
            _ => None,
        }
    }

    /// What the scanning student is told.
    pub fn message(&self) -> &'static str {
        match self {
            Self::Accepted(_) => "Attendance marked.",
            Self::Malformed => "Invalid QR code.",
            Self::Expired => "QR code has expired. Please scan a new one.",
            Self::OutOfRange { .. } => "You are out of range of the classroom.",
            Self::AlreadyUsed => "This QR code has already been used.",
            Self::LocationUnavailable => "Could not determine your location.",
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            Self::Accepted(_) => "accepted",
            Self::Malformed => "malformed",
            Self::Expired => "expired",
            Self::OutOfRange { .. } => "out_of_range",
            Self::AlreadyUsed => "already_used",
            Self::LocationUnavailable => "location_unavailable",
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfRange { distance_m } => write!(f, "out of range ({distance_m:.1} m)"),
            other => f.write_str(other.kind()),
        }
    }
}

/// Validates scanned strings against freshness and the geofence.
///
/// ```rust
/// use rollcall::{AttendanceValidator, Verdict};
/// use rollcall_geo::LocationSample;
///
/// let mut validator: AttendanceValidator = AttendanceValidator::default();
/// let here = LocationSample::new(18.5204, 73.8567, 0);
///
/// assert_eq!(validator.validate("not a token", &here, 0), Verdict::Malformed);
/// ```
#[derive(Debug)]
pub struct AttendanceValidator<C: TokenCodec = DelimitedCodec> {
    codec: C,
    freshness: FreshnessConfig,
    proximity: ProximityValidator,
    consumed: Option<ConsumptionLog>,
}

impl Default for AttendanceValidator<DelimitedCodec> {
    fn default() -> Self {
        Self::new(AttendanceConfig::default(), DelimitedCodec)
    }
}

impl<C: TokenCodec> AttendanceValidator<C> {
    pub fn new(config: AttendanceConfig, codec: C) -> Self {
        let config = config.validated();
        Self {
            codec,
            freshness: config.freshness,
            proximity: ProximityValidator::new(config.proximity),
            consumed: config.replay_log_capacity.map(ConsumptionLog::new),
        }
    }

    /// Runs all gates for a scan taken at `now` by a student at `student`.
    pub fn validate(&mut self, raw: &str, student: &LocationSample, now: i64) -> Verdict {
        match self.check_token(raw, now) {
            Ok(fields) => self.check_location(raw, fields, student),
            Err(rejected) => rejected,
        }
    }

    /// The token gates alone: decode, then freshness.
    ///
    /// Lets a scanner reject a stale code before spending time on a
    /// location fix.
    pub fn check_token(&self, raw: &str, now: i64) -> Result<TokenFields, Verdict> {
        let fields = match self.codec.decode(raw) {
            Ok(fields) => fields,
            Err(e) => {
                tracing::debug!(error = %e, "scan rejected");
                return Err(Verdict::Malformed);
            }
        };

        if !fields.is_fresh_at(now, self.freshness.ttl_seconds) {
            tracing::debug!(
                age_s = fields.age_at(now),
                ttl_s = self.freshness.ttl_seconds,
                "scan rejected: token expired"
            );
            return Err(Verdict::Expired);
        }

        Ok(fields)
    }

    /// The remaining gates for a token that passed [`check_token`](Self::check_token):
    /// proximity, then the replay log if enabled.
    pub fn check_location(
        &mut self,
        raw: &str,
        fields: TokenFields,
        student: &LocationSample,
    ) -> Verdict {
        let distance_m = self.proximity.distance(student, &fields.location);
        if !self.proximity.is_within_range(student, &fields.location) {
            tracing::debug!(
                distance_m,
                threshold_m = self.proximity.threshold_meters(),
                "scan rejected: out of range"
            );
            return Verdict::OutOfRange { distance_m };
        }

        if let Some(log) = &mut self.consumed {
            // Keyed on the re-encoded fields so "07" and "7" are one token.
            let key = self
                .codec
                .encode(
                    &fields.descriptor,
                    fields.sequence,
                    &fields.location,
                    fields.issued_at,
                )
                .map(Token::into_string)
                .unwrap_or_else(|_| raw.to_owned());
            if !log.record(&key) {
                tracing::debug!(sequence = fields.sequence, "scan rejected: token already used");
                return Verdict::AlreadyUsed;
            }
        }

        tracing::debug!(
            session = %fields.descriptor,
            sequence = fields.sequence,
            distance_m,
            "scan accepted"
        );
        Verdict::Accepted(fields)
    }

    pub fn ttl_seconds(&self) -> i64 {
        self.freshness.ttl_seconds
    }

    pub fn threshold_meters(&self) -> f64 {
        self.proximity.threshold_meters()
    }

    pub fn replay_protection(&self) -> bool {
        self.consumed.is_some()
    }
}
