//! Remote document store seam
//!
//! The remote store is the source of truth. It evaluates the access policy
//! on every mutation and enforces one pending claim per donation.

use crate::entry::DonationSnapshot;
use async_trait::async_trait;
use larder_core::{Actor, Claim, ClaimId};
use larder_policy::DenyReason;

/// A claim as reported by the remote store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteClaim {
    /// Committed claim document
    pub claim: Claim,
    /// Current donation fields
    pub donation: DonationSnapshot,
}

/// Failures reported by the remote store
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RemoteError {
    /// The rule hook refused the mutation
    #[error("Remote store denied the request: {0}")]
    PolicyDenied(DenyReason),

    /// Another pending claim already holds the donation
    #[error("Donation already has an active claim")]
    AlreadyClaimed,

    /// The document does not exist remotely
    #[error("Claim not found on remote store")]
    NotFound,

    /// The store could not be reached
    #[error("Remote store unavailable: {message}")]
    Unavailable {
        /// Transport failure
        message: String,
    },
}

impl RemoteError {
    /// Create an unavailable error
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }
}

/// Claim operations on the remote document store, performed as `actor`
#[async_trait]
pub trait RemoteClaimSource: Send + Sync {
    /// Commit a new claim
    async fn create_claim(&self, actor: &Actor, claim: &Claim) -> Result<(), RemoteError>;

    /// Replace a committed claim
    async fn update_claim(&self, actor: &Actor, claim: &Claim) -> Result<(), RemoteError>;

    /// Delete a committed claim
    async fn delete_claim(&self, actor: &Actor, claim_id: &ClaimId) -> Result<(), RemoteError>;

    /// Every claim held by `actor`, with donation snapshots
    async fn claims_for(&self, actor: &Actor) -> Result<Vec<RemoteClaim>, RemoteError>;
}
