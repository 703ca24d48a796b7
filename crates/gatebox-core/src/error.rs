//! Error types for the gatebox core.

use thiserror::Error;

/// Errors raised by key handling and the crypto primitives.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CryptoError {
    /// The key bytes encode a point on a different curve than P-256.
    #[error("curve mismatch: key is not a P-256 point")]
    CurveMismatch,

    /// The public key is not a usable P-256 point, or key agreement
    /// produced the point at infinity.
    #[error("invalid curve point")]
    InvalidPoint,

    /// The private key bytes are not a valid P-256 scalar.
    #[error("invalid private key")]
    InvalidPrivateKey,

    /// AEAD tag verification failed.
    #[error("authentication failed")]
    AuthenticationFailed,

    /// HKDF expansion failed.
    #[error("key derivation error: {0}")]
    KeyDerivation(String),

    /// AEAD encryption failed.
    #[error("encryption error")]
    Encryption,

    /// The OS random source failed.
    #[error("random source error: {0}")]
    Random(String),
}

/// Errors raised while parsing identifiers and addresses.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum IdError {
    #[error("invalid hex: {0}")]
    Hex(#[from] hex::FromHexError),

    #[error("invalid address: {0}")]
    Address(String),
}

/// Result type for crypto operations.
pub type Result<T> = std::result::Result<T, CryptoError>;
