//! Error types for the rotation layer.

use rollcall_token::TokenError;

/// Errors that can occur while driving a session.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RotationError {
    /// `start_session` was called while a session is running. End it first.
    #[error("a session is already active")]
    AlreadyActive,

    /// The first token of a session could not be minted, so the session
    /// did not start.
    #[error(transparent)]
    Encoding(#[from] TokenError),

    /// The controller task is gone (shut down or panicked).
    #[error("rotation controller is unavailable")]
    Unavailable,
}
