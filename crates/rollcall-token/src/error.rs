//! Error types for the token layer.

/// Errors that can occur while building, encoding or decoding tokens.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    /// A scanned string is not a token: wrong field count, a field that
    /// doesn't parse, or a date that doesn't exist.
    ///
    /// The scanner treats this as "invalid QR code", never as a crash.
    #[error("malformed token: {0}")]
    MalformedToken(String),

    /// The inputs can't be turned into a token that would decode again:
    /// empty subject, a delimiter inside a field, a zero sequence number,
    /// non-finite coordinates, an impossible time slot.
    ///
    /// Surfaced to the instructor; the session does not start.
    #[error("cannot encode token: {0}")]
    EncodingPrecondition(String),
}
