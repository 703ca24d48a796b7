//! Error types for the credential service.

use gatebox_accessbox::BoxError;
use gatebox_core::Address;
use gatebox_store::StoreError;
use thiserror::Error;

/// Errors that can occur during credential service operations.
#[derive(Debug, Error)]
pub enum CredentialsError {
    /// `put` was called without any recipient keys.
    #[error("no recipients given")]
    EmptyRecipients,

    /// `put` was called with an empty access box.
    #[error("access box is empty")]
    EmptyBox,

    /// No object at the given address.
    #[error("access box not found: {0}")]
    NotFound(Address),

    /// Any other backend failure, passed through unchanged.
    #[error("backend error: {0}")]
    Backend(StoreError),

    /// Decoding or decryption of the box failed.
    #[error("access box error: {0}")]
    Box(#[from] BoxError),
}

impl From<StoreError> for CredentialsError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(address) => CredentialsError::NotFound(address),
            other => CredentialsError::Backend(other),
        }
    }
}

/// Result type for credential service operations.
pub type Result<T> = std::result::Result<T, CredentialsError>;

#[cfg(test)]
mod tests {
    use super::*;
    use gatebox_core::{ContainerId, ObjectId};

    #[test]
    fn test_store_not_found_maps_to_not_found() {
        let address = Address::new(ContainerId::from_bytes([1; 32]), ObjectId::from_bytes([2; 32]));
        let err: CredentialsError = StoreError::NotFound(address).into();
        assert!(matches!(err, CredentialsError::NotFound(a) if a == address));
    }

    #[test]
    fn test_other_store_errors_map_to_backend() {
        let err: CredentialsError = StoreError::Task("join".into()).into();
        assert!(matches!(err, CredentialsError::Backend(StoreError::Task(_))));
    }
}
