//! In-memory stand-in for the hosted document store

use async_trait::async_trait;
use indexmap::IndexMap;
use larder_core::{Actor, Claim, ClaimId, Donation, DonationId};
use larder_policy::{evaluate, AccessRequest, Decision};
use larder_store::{DonationSnapshot, RemoteClaim, RemoteClaimSource, RemoteError};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tokio::sync::RwLock;

#[derive(Debug, Default)]
struct RemoteState {
    claims: IndexMap<ClaimId, Claim>,
    donations: HashMap<DonationId, Donation>,
}

/// Remote document store held in memory
///
/// Runs every mutation through the access policy, rejects a second pending
/// claim for a donation, and can be switched offline.
#[derive(Debug)]
pub struct MemoryRemoteStore {
    state: RwLock<RemoteState>,
    online: AtomicBool,
    calls: AtomicUsize,
}

impl Default for MemoryRemoteStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryRemoteStore {
    /// Empty, reachable store
    pub fn new() -> Self {
        Self {
            state: RwLock::new(RemoteState::default()),
            online: AtomicBool::new(true),
            calls: AtomicUsize::new(0),
        }
    }

    /// Make the store reachable or not
    pub fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
    }

    /// Number of requests received, including failed ones
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Register a donation
    pub async fn add_donation(&self, donation: Donation) {
        let mut state = self.state.write().await;
        state.donations.insert(donation.id.clone(), donation);
    }

    /// Store a claim directly, bypassing policy and uniqueness checks
    pub async fn insert_claim(&self, claim: Claim) {
        let mut state = self.state.write().await;
        state.claims.insert(claim.id.clone(), claim);
    }

    /// Drop a claim directly
    pub async fn remove_claim(&self, claim_id: &ClaimId) -> Option<Claim> {
        let mut state = self.state.write().await;
        state.claims.shift_remove(claim_id)
    }

    /// A stored claim
    pub async fn claim(&self, claim_id: &ClaimId) -> Option<Claim> {
        self.state.read().await.claims.get(claim_id).cloned()
    }

    /// Every stored claim in insertion order
    pub async fn claims(&self) -> Vec<Claim> {
        self.state.read().await.claims.values().cloned().collect()
    }

    fn enter(&self) -> Result<(), RemoteError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.online.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(RemoteError::unavailable("remote store offline"))
        }
    }
}

fn check(request: &AccessRequest) -> Result<(), RemoteError> {
    match evaluate(request) {
        Decision::Allow => Ok(()),
        Decision::Deny { reason } => Err(RemoteError::PolicyDenied(reason)),
    }
}

fn held_elsewhere(state: &RemoteState, claim: &Claim) -> bool {
    claim.status.is_active()
        && state
            .claims
            .values()
            .any(|c| c.id != claim.id && c.donation_id == claim.donation_id && c.status.is_active())
}

#[async_trait]
impl RemoteClaimSource for MemoryRemoteStore {
    async fn create_claim(&self, actor: &Actor, claim: &Claim) -> Result<(), RemoteError> {
        self.enter()?;
        check(&AccessRequest::create_claim(actor, claim.clone()))?;
        let mut state = self.state.write().await;
        if state.claims.contains_key(&claim.id) || held_elsewhere(&state, claim) {
            return Err(RemoteError::AlreadyClaimed);
        }
        state.claims.insert(claim.id.clone(), claim.clone());
        Ok(())
    }

    async fn update_claim(&self, actor: &Actor, claim: &Claim) -> Result<(), RemoteError> {
        self.enter()?;
        let mut state = self.state.write().await;
        let existing = state
            .claims
            .get(&claim.id)
            .cloned()
            .ok_or(RemoteError::NotFound)?;
        check(&AccessRequest::update_claim(actor, existing, claim.clone()))?;
        if held_elsewhere(&state, claim) {
            return Err(RemoteError::AlreadyClaimed);
        }
        state.claims.insert(claim.id.clone(), claim.clone());
        Ok(())
    }

    async fn delete_claim(&self, actor: &Actor, claim_id: &ClaimId) -> Result<(), RemoteError> {
        self.enter()?;
        let mut state = self.state.write().await;
        let existing = state
            .claims
            .get(claim_id)
            .cloned()
            .ok_or(RemoteError::NotFound)?;
        check(&AccessRequest::delete_claim(actor, existing))?;
        state.claims.shift_remove(claim_id);
        Ok(())
    }

    async fn claims_for(&self, actor: &Actor) -> Result<Vec<RemoteClaim>, RemoteError> {
        self.enter()?;
        let state = self.state.read().await;
        let mut visible = Vec::new();
        for claim in state.claims.values().filter(|c| actor.is(&c.user_id)) {
            let Some(donation) = state.donations.get(&claim.donation_id) else {
                tracing::warn!(claim_id = %claim.id, "Claim references unknown donation");
                continue;
            };
            let request =
                AccessRequest::read_claim(actor, claim.clone(), Some(donation.owner_id.clone()));
            if check(&request).is_ok() {
                visible.push(RemoteClaim {
                    claim: claim.clone(),
                    donation: DonationSnapshot::from(donation),
                });
            }
        }
        Ok(visible)
    }
}
