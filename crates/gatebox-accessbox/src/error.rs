//! Error types for the access box.

use gatebox_core::CryptoError;
use thiserror::Error;

/// Errors that can occur while packing, encoding or unpacking a box.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BoxError {
    /// Key material belongs to a different curve.
    #[error("curve mismatch")]
    CurveMismatch,

    /// Key agreement hit an invalid or degenerate point.
    #[error("invalid curve point")]
    InvalidPoint,

    /// A gate payload failed AEAD verification.
    #[error("authentication failed")]
    AuthenticationFailed,

    /// The key is not among the box's recipients.
    #[error("no gate data for key {0} was found")]
    NoMatchingGate(String),

    /// Wire decoding of the box, its tokens or a policy failed.
    #[error("malformed box: {0}")]
    MalformedBox(String),

    /// Any other failure of the crypto primitives.
    #[error("crypto error: {0}")]
    Crypto(CryptoError),
}

impl From<CryptoError> for BoxError {
    fn from(e: CryptoError) -> Self {
        match e {
            CryptoError::CurveMismatch => BoxError::CurveMismatch,
            CryptoError::InvalidPoint => BoxError::InvalidPoint,
            CryptoError::AuthenticationFailed => BoxError::AuthenticationFailed,
            other => BoxError::Crypto(other),
        }
    }
}

/// Result type for access box operations.
pub type Result<T> = std::result::Result<T, BoxError>;
