//! Session and token types.
//!
//! A [`SessionDescriptor`] is what the instructor picks before pressing
//! "Create QR Codes": subject, lecture type, batch, date and time slot. It
//! never changes for the lifetime of a session. A [`Token`] is one rotation
//! of that session: descriptor plus sequence number, location and issue
//! time, flattened into the string the QR code shows.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate};
use rollcall_geo::LocationSample;
use serde::{Deserialize, Serialize};

use crate::TokenError;

/// Batch label the instructor UI selects by default once a lecture type
/// is chosen. An empty batch means the same thing.
pub const WHOLE_CLASS: &str = "Whole Class";

/// Character that separates token fields. No field may contain it.
pub(crate) const DELIMITER: char = '_';

// ---------------------------------------------------------------------------
// LectureType
// ---------------------------------------------------------------------------

/// The kind of class being held.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LectureType {
    Theory,
    Lab,
    Tutorial,
}

impl LectureType {
    pub const ALL: [LectureType; 3] = [Self::Theory, Self::Lab, Self::Tutorial];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Theory => "Theory",
            Self::Lab => "Lab",
            Self::Tutorial => "Tutorial",
        }
    }
}

impl fmt::Display for LectureType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Case-sensitive, matching what the instructor UI writes into tokens.
impl FromStr for LectureType {
    type Err = TokenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| TokenError::MalformedToken(format!("unknown lecture type {s:?}")))
    }
}

// ---------------------------------------------------------------------------
// TimeSlot
// ---------------------------------------------------------------------------

/// A lecture slot in whole hours, e.g. 9-10.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "(u8, u8)", into = "(u8, u8)")]
pub struct TimeSlot {
    start_hour: u8,
    end_hour: u8,
}

impl TimeSlot {
    /// First hour the instructor UI offers.
    pub const FIRST_STANDARD_HOUR: u8 = 9;
    /// Number of one-hour slots the instructor UI offers.
    pub const STANDARD_SLOT_COUNT: u8 = 10;

    /// # Errors
    /// [`TokenError::EncodingPrecondition`] unless `start_hour < end_hour <= 24`.
    pub fn new(start_hour: u8, end_hour: u8) -> Result<Self, TokenError> {
        if start_hour >= end_hour || end_hour > 24 {
            return Err(TokenError::EncodingPrecondition(format!(
                "invalid time slot {start_hour}-{end_hour}"
            )));
        }
        Ok(Self {
            start_hour,
            end_hour,
        })
    }

    /// The one-hour slot starting at `start_hour`.
    pub fn starting_at(start_hour: u8) -> Result<Self, TokenError> {
        Self::new(start_hour, start_hour.saturating_add(1))
    }

    /// The slots offered by the instructor UI: 9:00-10:00 through 18:00-19:00.
    pub fn standard_slots() -> Vec<TimeSlot> {
        (0..Self::STANDARD_SLOT_COUNT)
            .map(|i| {
                let start = Self::FIRST_STANDARD_HOUR + i;
                Self {
                    start_hour: start,
                    end_hour: start + 1,
                }
            })
            .collect()
    }

    pub fn start_hour(&self) -> u8 {
        self.start_hour
    }

    pub fn end_hour(&self) -> u8 {
        self.end_hour
    }
}

impl fmt::Display for TimeSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:00-{}:00", self.start_hour, self.end_hour)
    }
}

impl TryFrom<(u8, u8)> for TimeSlot {
    type Error = TokenError;

    fn try_from((start, end): (u8, u8)) -> Result<Self, Self::Error> {
        Self::new(start, end)
    }
}

impl From<TimeSlot> for (u8, u8) {
    fn from(slot: TimeSlot) -> Self {
        (slot.start_hour, slot.end_hour)
    }
}

// ---------------------------------------------------------------------------
// SessionDescriptor
// ---------------------------------------------------------------------------

/// Immutable configuration of one attendance session.
///
/// Fields are private so that every descriptor in existence has passed
/// [`SessionDescriptor::new`]'s checks; that is what lets the codec promise
/// that whatever it encodes will decode again.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "DescriptorParts")]
pub struct SessionDescriptor {
    subject: String,
    lecture_type: LectureType,
    batch: String,
    date: NaiveDate,
    time_slot: TimeSlot,
}

impl SessionDescriptor {
    /// Builds a descriptor.
    ///
    /// # Errors
    /// [`TokenError::EncodingPrecondition`] if the subject is empty or if
    /// the subject or batch contains the token delimiter `_`.
    pub fn new(
        subject: impl Into<String>,
        lecture_type: LectureType,
        batch: impl Into<String>,
        date: NaiveDate,
        time_slot: TimeSlot,
    ) -> Result<Self, TokenError> {
        let subject = subject.into();
        let batch = batch.into();

        if subject.is_empty() {
            return Err(TokenError::EncodingPrecondition(
                "subject must not be empty".into(),
            ));
        }
        for (name, value) in [("subject", &subject), ("batch", &batch)] {
            if value.contains(DELIMITER) {
                return Err(TokenError::EncodingPrecondition(format!(
                    "{name} {value:?} contains the token delimiter {DELIMITER:?}"
                )));
            }
        }

        Ok(Self {
            subject,
            lecture_type,
            batch,
            date,
            time_slot,
        })
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn lecture_type(&self) -> LectureType {
        self.lecture_type
    }

    /// The batch label; empty means the whole class.
    pub fn batch(&self) -> &str {
        &self.batch
    }

    pub fn is_whole_class(&self) -> bool {
        self.batch.is_empty() || self.batch == WHOLE_CLASS
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn time_slot(&self) -> TimeSlot {
        self.time_slot
    }

    /// Title of this session's roster sheet. See [`sheet_title`].
    pub fn sheet_title(&self) -> String {
        sheet_title(self)
    }
}

impl fmt::Display for SessionDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.subject, self.lecture_type)?;
        if !self.batch.is_empty() {
            write!(f, " - {}", self.batch)?;
        }
        write!(f, " at {} on {}", self.time_slot, self.date)
    }
}

/// Deserialization goes through [`SessionDescriptor::new`] so a config
/// file can't smuggle in a delimiter.
#[derive(Deserialize)]
struct DescriptorParts {
    subject: String,
    lecture_type: LectureType,
    #[serde(default)]
    batch: String,
    date: NaiveDate,
    time_slot: TimeSlot,
}

impl TryFrom<DescriptorParts> for SessionDescriptor {
    type Error = TokenError;

    fn try_from(p: DescriptorParts) -> Result<Self, Self::Error> {
        Self::new(p.subject, p.lecture_type, p.batch, p.date, p.time_slot)
    }
}

/// Deterministic roster sheet title for a session:
/// `{subject}_{lectureType}_{batch}_{start}-{end}_{year}_{month}_{day}`.
///
/// Month and day are zero-padded, matching the ISO date the sheet backend
/// splits them out of.
pub fn sheet_title(descriptor: &SessionDescriptor) -> String {
    let date = descriptor.date;
    format!(
        "{}_{}_{}_{}-{}_{}_{:02}_{:02}",
        descriptor.subject,
        descriptor.lecture_type,
        descriptor.batch,
        descriptor.time_slot.start_hour,
        descriptor.time_slot.end_hour,
        date.year(),
        date.month(),
        date.day(),
    )
}

// ---------------------------------------------------------------------------
// Token
// ---------------------------------------------------------------------------

/// An encoded token: the exact string a QR code displays.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Token(String);

impl Token {
    pub(crate) fn new(raw: String) -> Self {
        Self(raw)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Token {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Everything a decoded token says.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenFields {
    pub descriptor: SessionDescriptor,
    /// Position in the session's rotation, `1..=ceiling`.
    pub sequence: u32,
    /// Where the instructor was when the token was minted. `captured_at`
    /// equals `issued_at`.
    pub location: LocationSample,
    /// Issue time, epoch seconds.
    pub issued_at: i64,
}

impl TokenFields {
    /// Seconds since issue at `now`. Negative under clock skew.
    pub fn age_at(&self, now: i64) -> i64 {
        now.saturating_sub(self.issued_at)
    }

    /// `true` iff the token is at most `ttl_seconds` old at `now`.
    ///
    /// There is no lower bound: a token "from the future" (scanner clock
    /// behind the instructor's) counts as fresh.
    pub fn is_fresh_at(&self, now: i64, ttl_seconds: i64) -> bool {
        self.age_at(now) <= ttl_seconds
    }
}
