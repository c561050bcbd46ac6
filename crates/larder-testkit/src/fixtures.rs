//! Common fixtures

use crate::clock::ManualClock;
use chrono::TimeZone;
use larder_core::{ActorId, Claim, ClaimStatus, Donation, DonationStatus, Timestamp};
use larder_store::{ClaimStore, ClaimStoreConfig, DonationSnapshot, MemoryStorage};
use std::sync::Arc;

/// 2024-05-01T09:30:00.125Z
pub fn instant() -> Timestamp {
    chrono::Utc.timestamp_millis_opt(1_714_555_800_125).unwrap()
}

/// An available donation
pub fn donation(id: &str, owner: &str) -> Donation {
    let mut donation = Donation::new(id, owner, format!("Donation {id}"), instant());
    donation.pickup_location = Some("Community hall".to_string());
    donation
}

/// Snapshot of an available donation
pub fn snapshot(id: &str, owner: &str) -> DonationSnapshot {
    DonationSnapshot::from(&donation(id, owner))
}

/// Snapshot of a donation in a given status
pub fn snapshot_with_status(id: &str, owner: &str, status: DonationStatus) -> DonationSnapshot {
    DonationSnapshot {
        status,
        ..snapshot(id, owner)
    }
}

/// A claim in any status
pub fn claim(id: &str, donation_id: &str, user: &str, status: ClaimStatus) -> Claim {
    Claim::pending(id.into(), donation_id.into(), user.into(), instant()).with_status(status)
}

/// Claim store for `owner` over fresh memory storage, with a manual clock
pub fn memory_claim_store(owner: &str) -> (MemoryStorage, Arc<ManualClock>, ClaimStore) {
    let storage = MemoryStorage::new();
    let clock = Arc::new(ManualClock::new(instant()));
    let store = ClaimStore::new(
        Arc::new(storage.clone()),
        ActorId::new(owner),
        &ClaimStoreConfig::default(),
    )
    .unwrap()
    .with_clock(clock.clone());
    (storage, clock, store)
}
