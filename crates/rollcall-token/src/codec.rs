//! Codec trait and the delimited token format.
//!
//! The rotation controller and the scanner only need *something* that turns
//! token fields into a string and back; they are generic over
//! [`TokenCodec`]. [`DelimitedCodec`] is the format deployed scanners
//! understand (see the crate docs for the layout).

use chrono::{Datelike, NaiveDate};
use rollcall_geo::LocationSample;

use crate::types::DELIMITER;
use crate::{LectureType, SessionDescriptor, TimeSlot, Token, TokenError, TokenFields};

/// Encodes session state into tokens and decodes scanned strings.
///
/// `Send + Sync + 'static` so a codec can live inside the rotation actor
/// and be shared with scanner tasks.
pub trait TokenCodec: Send + Sync + 'static {
    /// Builds the token for one rotation.
    ///
    /// # Errors
    /// [`TokenError::EncodingPrecondition`] if `sequence` is zero or the
    /// location is not finite. Descriptor fields were checked when the
    /// descriptor was built.
    fn encode(
        &self,
        descriptor: &SessionDescriptor,
        sequence: u32,
        location: &LocationSample,
        issued_at: i64,
    ) -> Result<Token, TokenError>;

    /// Parses a scanned string.
    ///
    /// # Errors
    /// [`TokenError::MalformedToken`] if the string is not a token.
    fn decode(&self, raw: &str) -> Result<TokenFields, TokenError>;

    /// `true` iff `raw` decodes and is at most `ttl_seconds` old at `now`.
    ///
    /// A string that doesn't decode is never fresh.
    fn is_fresh(&self, raw: &str, now: i64, ttl_seconds: i64) -> bool {
        self.decode(raw)
            .map(|fields| fields.is_fresh_at(now, ttl_seconds))
            .unwrap_or(false)
    }
}

// ---------------------------------------------------------------------------
// DelimitedCodec
// ---------------------------------------------------------------------------

/// Twelve `_`-separated fields in a fixed order.
///
/// ```rust
/// use chrono::NaiveDate;
/// use rollcall_geo::LocationSample;
/// use rollcall_token::{DelimitedCodec, LectureType, SessionDescriptor, TimeSlot, TokenCodec};
///
/// let descriptor = SessionDescriptor::new(
///     "SRM",
///     LectureType::Theory,
///     "Batch 1",
///     NaiveDate::from_ymd_opt(2024, 3, 21).unwrap(),
///     TimeSlot::starting_at(9).unwrap(),
/// )
/// .unwrap();
/// let here = LocationSample::new(18.5204, 73.8567, 1_711_012_523);
///
/// let token = DelimitedCodec.encode(&descriptor, 7, &here, 1_711_012_523).unwrap();
/// assert_eq!(
///     token.as_str(),
///     "SRM_Theory_Batch 1_9_10_2024_03_21_7_18.5204_73.8567_1711012523"
/// );
///
/// let fields = DelimitedCodec.decode(token.as_str()).unwrap();
/// assert_eq!(fields.descriptor, descriptor);
/// assert_eq!(fields.sequence, 7);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct DelimitedCodec;

impl DelimitedCodec {
    /// Number of fields in every token.
    pub const FIELD_COUNT: usize = 12;
}

impl TokenCodec for DelimitedCodec {
    fn encode(
        &self,
        descriptor: &SessionDescriptor,
        sequence: u32,
        location: &LocationSample,
        issued_at: i64,
    ) -> Result<Token, TokenError> {
        if sequence == 0 {
            return Err(TokenError::EncodingPrecondition(
                "sequence numbers start at 1".into(),
            ));
        }
        if !location.is_finite() {
            return Err(TokenError::EncodingPrecondition(format!(
                "location ({}, {}) is not finite",
                location.latitude, location.longitude
            )));
        }

        let date = descriptor.date();
        let slot = descriptor.time_slot();
        // f64 Display is the shortest string that parses back to the same
        // value, so coordinates survive the round trip exactly.
        let raw = format!(
            "{subject}{d}{kind}{d}{batch}{d}{start}{d}{end}{d}{year}{d}{month:02}{d}{day:02}{d}{sequence}{d}{lat}{d}{lon}{d}{issued_at}",
            d = DELIMITER,
            subject = descriptor.subject(),
            kind = descriptor.lecture_type(),
            batch = descriptor.batch(),
            start = slot.start_hour(),
            end = slot.end_hour(),
            year = date.year(),
            month = date.month(),
            day = date.day(),
            lat = location.latitude,
            lon = location.longitude,
        );
        Ok(Token::new(raw))
    }

    fn decode(&self, raw: &str) -> Result<TokenFields, TokenError> {
        let parts: Vec<&str> = raw.split(DELIMITER).collect();
        let [
            subject,
            kind,
            batch,
            start,
            end,
            year,
            month,
            day,
            sequence,
            lat,
            lon,
            issued_at,
        ] = parts[..]
        else {
            return Err(TokenError::MalformedToken(format!(
                "expected {} fields, found {}",
                Self::FIELD_COUNT,
                parts.len()
            )));
        };

        let lecture_type: LectureType = kind.parse()?;
        let start: u8 = field(start, "start hour")?;
        let end: u8 = field(end, "end hour")?;
        let year: i32 = field(year, "year")?;
        let month: u32 = field(month, "month")?;
        let day: u32 = field(day, "day")?;
        let sequence: u32 = field(sequence, "sequence")?;
        let latitude: f64 = field(lat, "latitude")?;
        let longitude: f64 = field(lon, "longitude")?;
        let issued_at: i64 = field(issued_at, "issue time")?;

        let date = NaiveDate::from_ymd_opt(year, month, day).ok_or_else(|| {
            TokenError::MalformedToken(format!("no such date {year}-{month}-{day}"))
        })?;
        if !latitude.is_finite() || !longitude.is_finite() {
            return Err(TokenError::MalformedToken(format!(
                "location ({lat}, {lon}) is not finite"
            )));
        }

        // Anything that fails these checks could never have been encoded,
        // so it is malformed rather than a precondition failure.
        let time_slot = TimeSlot::new(start, end).map_err(as_malformed)?;
        let descriptor = SessionDescriptor::new(subject, lecture_type, batch, date, time_slot)
            .map_err(as_malformed)?;

        Ok(TokenFields {
            descriptor,
            sequence,
            location: LocationSample::new(latitude, longitude, issued_at),
            issued_at,
        })
    }
}

fn field<T: std::str::FromStr>(value: &str, name: &str) -> Result<T, TokenError> {
    value
        .parse()
        .map_err(|_| TokenError::MalformedToken(format!("{name} {value:?} is not a number")))
}

fn as_malformed(err: TokenError) -> TokenError {
    match err {
        TokenError::EncodingPrecondition(msg) => TokenError::MalformedToken(msg),
        other => other,
    }
}
