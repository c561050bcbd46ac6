//! Claims: a recipient's commitment to pick up a donation.

use super::{ActorId, ClaimId, DonationId};
use crate::time::{self, Timestamp};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lifecycle state of a claim
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClaimStatus {
    /// Committed, awaiting pickup
    Pending,
    /// Collected
    PickedUp,
    /// Abandoned by the claimant or invalidated
    Cancelled,
}

impl ClaimStatus {
    /// Every status
    pub const ALL: [ClaimStatus; 3] = [
        ClaimStatus::Pending,
        ClaimStatus::PickedUp,
        ClaimStatus::Cancelled,
    ];

    /// The only status changes a claimant may perform
    pub const TRANSITIONS: &'static [(ClaimStatus, ClaimStatus)] = &[
        (ClaimStatus::Pending, ClaimStatus::PickedUp),
        (ClaimStatus::Pending, ClaimStatus::Cancelled),
    ];

    /// Wire name of the status
    pub fn as_str(&self) -> &'static str {
        match self {
            ClaimStatus::Pending => "pending",
            ClaimStatus::PickedUp => "picked_up",
            ClaimStatus::Cancelled => "cancelled",
        }
    }

    /// Pending claims hold their donation; at most one may exist per donation
    pub fn is_active(&self) -> bool {
        *self == ClaimStatus::Pending
    }

    /// Whether a claimant may move a claim from `self` to `next`
    pub fn can_transition_to(&self, next: ClaimStatus) -> bool {
        Self::TRANSITIONS.contains(&(*self, next))
    }
}

impl fmt::Display for ClaimStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ClaimStatus {
    type Err = crate::LarderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| crate::LarderError::invalid(format!("Unknown claim status '{s}'")))
    }
}

/// One actor's commitment to a specific donation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Claim {
    /// Unique claim id
    pub id: ClaimId,
    /// The donation being claimed
    pub donation_id: DonationId,
    /// The claimant
    pub user_id: ActorId,
    /// Lifecycle state
    pub status: ClaimStatus,
    /// When the claim was made
    #[serde(with = "time::canonical")]
    pub claimed_at: Timestamp,
    /// Opaque pickup token shown as a QR code
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub qr_data: Option<String>,
}

impl Claim {
    /// Create a pending claim
    pub fn pending(
        id: ClaimId,
        donation_id: DonationId,
        user_id: ActorId,
        claimed_at: Timestamp,
    ) -> Self {
        Self {
            id,
            donation_id,
            user_id,
            status: ClaimStatus::Pending,
            claimed_at,
            qr_data: None,
        }
    }

    /// Builder-style pickup token
    pub fn with_qr_data(mut self, qr_data: impl Into<String>) -> Self {
        self.qr_data = Some(qr_data.into());
        self
    }

    /// Copy of this claim in a different status
    pub fn with_status(&self, status: ClaimStatus) -> Self {
        Self {
            status,
            ..self.clone()
        }
    }
}
