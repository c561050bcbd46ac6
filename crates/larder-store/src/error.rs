//! Claim store errors

use crate::remote::RemoteError;
use crate::storage::StorageError;
use larder_core::{ClaimId, ClaimStatus, LarderError};
use larder_policy::DenyReason;

/// Errors raised by claim store operations
///
/// A duplicate claim is not an error; see
/// [`CreateOutcome::AlreadyClaimed`](crate::CreateOutcome::AlreadyClaimed).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClaimStoreError {
    /// The persistence backend failed
    #[error("Persistence unavailable: {0}")]
    PersistenceUnavailable(#[from] StorageError),

    /// The stored collection is not a JSON array; it is left untouched
    #[error("Stored claim collection is unreadable: {message}")]
    CorruptCollection {
        /// Parse failure
        message: String,
    },

    /// The store cannot be opened with this configuration
    #[error("Invalid claim store configuration: {message}")]
    InvalidConfiguration {
        /// Validation failure
        message: String,
    },

    /// An entry could not be encoded
    #[error("Serialization error: {message}")]
    Serialization {
        /// Encoding failure
        message: String,
    },

    /// The claim lifecycle does not allow this status change
    #[error("Claim cannot move from {from} to {to}")]
    IllegalTransition {
        /// Current status
        from: ClaimStatus,
        /// Requested status
        to: ClaimStatus,
    },

    /// No cached claim has this id
    #[error("Claim not found: {claim_id}")]
    NotFound {
        /// Requested claim
        claim_id: ClaimId,
    },

    /// The access policy refused the operation
    #[error("Policy denied: {0}")]
    PolicyDenied(DenyReason),

    /// The remote store failed in a way the store cannot absorb
    #[error("Remote store error: {0}")]
    Remote(RemoteError),
}

/// Result type for claim store operations
pub type ClaimStoreResult<T> = std::result::Result<T, ClaimStoreError>;

impl From<serde_json::Error> for ClaimStoreError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            message: err.to_string(),
        }
    }
}

impl From<LarderError> for ClaimStoreError {
    fn from(err: LarderError) -> Self {
        Self::Serialization {
            message: err.to_string(),
        }
    }
}

impl From<ClaimStoreError> for LarderError {
    fn from(err: ClaimStoreError) -> Self {
        match err {
            ClaimStoreError::PersistenceUnavailable(e) => LarderError::storage(e.to_string()),
            ClaimStoreError::CorruptCollection { message } => LarderError::storage(message),
            ClaimStoreError::InvalidConfiguration { message } => LarderError::invalid(message),
            ClaimStoreError::Serialization { message } => LarderError::serialization(message),
            ClaimStoreError::IllegalTransition { .. } => LarderError::invalid(err.to_string()),
            ClaimStoreError::NotFound { .. } => LarderError::not_found(err.to_string()),
            ClaimStoreError::PolicyDenied(reason) => {
                LarderError::permission_denied(reason.to_string())
            }
            ClaimStoreError::Remote(e) => LarderError::internal(e.to_string()),
        }
    }
}
