//! Local cache entries

use larder_core::serialization::{sanitize_str, to_wire, Value};
use larder_core::time::lenient_option;
use larder_core::{
    ActorId, Claim, ClaimId, ClaimStatus, Donation, DonationId, DonationStatus, Timestamp,
};
use serde::{Deserialize, Serialize};

/// How far an entry has travelled towards the remote store
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncState {
    /// Never committed remotely
    #[default]
    LocalOnly,
    /// Committed remotely, with a local change not yet pushed
    Dirty,
    /// Matches what the remote store last reported
    Synced,
}

impl SyncState {
    /// Whether the entry has something to push
    pub fn is_pending(&self) -> bool {
        !matches!(self, SyncState::Synced)
    }
}

/// Denormalized donation fields kept for offline display
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DonationSnapshot {
    /// Donation id
    pub id: DonationId,
    /// Donor
    pub owner_id: ActorId,
    /// Listing title
    #[serde(default)]
    pub title: String,
    /// Donation status when the snapshot was taken
    pub status: DonationStatus,
    /// When the item stops being safe to hand out
    #[serde(default, with = "lenient_option")]
    pub expiry_date: Option<Timestamp>,
    /// Where the claimant collects the item
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pickup_location: Option<String>,
}

impl From<&Donation> for DonationSnapshot {
    fn from(donation: &Donation) -> Self {
        Self {
            id: donation.id.clone(),
            owner_id: donation.owner_id.clone(),
            title: donation.title.clone(),
            status: donation.status,
            expiry_date: donation.expiry_date,
            pickup_location: donation.pickup_location.clone(),
        }
    }
}

/// A claim as cached on this device
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalCacheEntry {
    /// Claim id
    pub id: ClaimId,
    /// Claimed donation
    pub donation_id: DonationId,
    /// Claim holder
    pub user_id: ActorId,
    /// Claim status
    pub status: ClaimStatus,
    /// When the claim was made; `None` if the cached value was unreadable
    #[serde(default, with = "lenient_option")]
    pub claimed_at: Option<Timestamp>,
    /// Pickup code payload
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub qr_data: Option<String>,
    /// Donation fields for offline display
    pub donation: DonationSnapshot,
    /// Remote convergence marker
    #[serde(default)]
    pub sync: SyncState,
}

impl LocalCacheEntry {
    /// Build an entry from a claim and its donation snapshot
    pub fn from_claim(claim: Claim, donation: DonationSnapshot, sync: SyncState) -> Self {
        Self {
            id: claim.id,
            donation_id: claim.donation_id,
            user_id: claim.user_id,
            status: claim.status,
            claimed_at: Some(claim.claimed_at),
            qr_data: claim.qr_data,
            donation,
            sync,
        }
    }

    /// The claim document, if the entry still has a readable `claimedAt`
    pub fn to_claim(&self) -> Option<Claim> {
        Some(Claim {
            id: self.id.clone(),
            donation_id: self.donation_id.clone(),
            user_id: self.user_id.clone(),
            status: self.status,
            claimed_at: self.claimed_at?,
            qr_data: self.qr_data.clone(),
        })
    }

    /// Whether this entry holds its donation
    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }

    /// Persisted form: free text sanitized, timestamps in canonical text
    ///
    /// Identifiers are written exactly as given; they must keep matching
    /// the remote store's ids and the donation ids callers pass in.
    pub(crate) fn to_wire_json(&self) -> larder_core::Result<serde_json::Value> {
        let mut clean = self.clone();
        clean.qr_data = clean.qr_data.as_deref().map(sanitize_str);
        clean.donation.title = sanitize_str(&clean.donation.title);
        clean.donation.pickup_location =
            clean.donation.pickup_location.as_deref().map(sanitize_str);
        let value = Value::from(serde_json::to_value(&clean)?);
        to_wire(value).into_json()
    }

    /// The entry exactly as it will read back after persisting
    pub(crate) fn normalized(self) -> larder_core::Result<Self> {
        Ok(serde_json::from_value(self.to_wire_json()?)?)
    }
}
