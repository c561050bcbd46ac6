//! Donations and their lifecycle.

use super::{ActorId, DonationId};
use crate::time::{self, Timestamp};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lifecycle state of a donation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DonationStatus {
    /// Listed and claimable
    Available,
    /// Held by a pending claim
    Claimed,
    /// Collected by the claimant
    PickedUp,
    /// Passed its expiry date
    Expired,
    /// Withdrawn by the donor
    Cancelled,
}

impl DonationStatus {
    /// Every status, in lifecycle order
    pub const ALL: [DonationStatus; 5] = [
        DonationStatus::Available,
        DonationStatus::Claimed,
        DonationStatus::PickedUp,
        DonationStatus::Expired,
        DonationStatus::Cancelled,
    ];

    /// Status changes a donor may perform, besides leaving the status unchanged
    pub const TRANSITIONS: &'static [(DonationStatus, DonationStatus)] = &[
        (DonationStatus::Available, DonationStatus::Claimed),
        (DonationStatus::Available, DonationStatus::Cancelled),
        (DonationStatus::Available, DonationStatus::Expired),
        (DonationStatus::Claimed, DonationStatus::Available),
        (DonationStatus::Claimed, DonationStatus::PickedUp),
        (DonationStatus::Claimed, DonationStatus::Cancelled),
        (DonationStatus::Claimed, DonationStatus::Expired),
    ];

    /// Wire name of the status
    pub fn as_str(&self) -> &'static str {
        match self {
            DonationStatus::Available => "available",
            DonationStatus::Claimed => "claimed",
            DonationStatus::PickedUp => "picked_up",
            DonationStatus::Expired => "expired",
            DonationStatus::Cancelled => "cancelled",
        }
    }

    /// No further transitions leave this status
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            DonationStatus::PickedUp | DonationStatus::Expired | DonationStatus::Cancelled
        )
    }

    /// Whether claims on a donation in this status must be invalidated
    pub fn invalidates_claims(&self) -> bool {
        matches!(self, DonationStatus::Expired | DonationStatus::Cancelled)
    }

    /// Whether an update may move a donation from `self` to `next`
    pub fn can_transition_to(&self, next: DonationStatus) -> bool {
        *self == next || Self::TRANSITIONS.contains(&(*self, next))
    }
}

impl fmt::Display for DonationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DonationStatus {
    type Err = crate::LarderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| crate::LarderError::invalid(format!("Unknown donation status '{s}'")))
    }
}

/// A food item offered for pickup
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Donation {
    /// Stable document id
    pub id: DonationId,
    /// The donor's actor id
    pub owner_id: ActorId,
    /// Short description shown in listings
    #[serde(default)]
    pub title: String,
    /// Longer free-text description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Free-text quantity, e.g. "3 trays"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<String>,
    /// Where the claimant collects the item
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pickup_location: Option<String>,
    /// Lifecycle state
    pub status: DonationStatus,
    /// When the item stops being safe to hand out
    #[serde(default, with = "time::canonical_option")]
    pub expiry_date: Option<Timestamp>,
    /// Creation time
    #[serde(with = "time::canonical")]
    pub created_at: Timestamp,
    /// Last modification time
    #[serde(with = "time::canonical")]
    pub updated_at: Timestamp,
}

impl Donation {
    /// Create an available donation owned by `owner_id`
    pub fn new(
        id: impl Into<DonationId>,
        owner_id: impl Into<ActorId>,
        title: impl Into<String>,
        now: Timestamp,
    ) -> Self {
        Self {
            id: id.into(),
            owner_id: owner_id.into(),
            title: title.into(),
            description: None,
            quantity: None,
            pickup_location: None,
            status: DonationStatus::Available,
            expiry_date: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether the donation has passed its expiry date at `now`
    pub fn is_expired_at(&self, now: Timestamp) -> bool {
        self.expiry_date.is_some_and(|expiry| expiry <= now)
    }

    /// Copy of this donation with a different status, stamped at `now`
    pub fn with_status(&self, status: DonationStatus, now: Timestamp) -> Self {
        Self {
            status,
            updated_at: now,
            ..self.clone()
        }
    }
}
