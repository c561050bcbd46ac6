//! Remote convergence
//!
//! [`ClaimSync`] fronts a [`ClaimStore`] with the remote document store.
//! Every change lands locally first, is pre-checked against the same access
//! policy the remote store runs, and is then submitted once. Nothing is
//! retried automatically: unreachable submissions stay queued until the
//! caller runs [`ClaimSync::flush_pending`].

use crate::claim_store::{ClaimStore, CreateOutcome, MergeReport};
use crate::entry::{DonationSnapshot, LocalCacheEntry, SyncState};
use crate::error::{ClaimStoreError, ClaimStoreResult};
use crate::remote::{RemoteClaimSource, RemoteError};
use larder_core::{Actor, Claim, ClaimId, ClaimStatus};
use larder_policy::{evaluate, AccessRequest, Decision};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Result of submitting a change
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// The remote store accepted the change
    Committed(LocalCacheEntry),
    /// The remote store was unreachable; the change is kept locally
    Queued(LocalCacheEntry),
    /// The donation is already held by a pending claim
    AlreadyClaimed {
        /// The local claim holding it, when the guard was local
        existing: Option<ClaimId>,
    },
}

/// Counts from one [`ClaimSync::flush_pending`] pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlushReport {
    /// Entries the remote store accepted
    pub pushed: usize,
    /// Entries left pending because the remote store was unreachable
    pub queued: usize,
    /// Entries the remote store refused
    pub rejected: usize,
}

/// A claim store bound to a remote store and an authenticated actor
pub struct ClaimSync {
    store: Arc<ClaimStore>,
    remote: Arc<dyn RemoteClaimSource>,
    actor: Actor,
}

impl ClaimSync {
    /// Bind `store` to `remote`, acting as `actor`
    pub fn new(store: Arc<ClaimStore>, remote: Arc<dyn RemoteClaimSource>, actor: Actor) -> Self {
        Self {
            store,
            remote,
            actor,
        }
    }

    /// The underlying local store
    pub fn store(&self) -> &ClaimStore {
        &self.store
    }

    /// Claim a donation locally, then commit it remotely
    ///
    /// A remote uniqueness rejection or policy denial rolls the local entry
    /// back. An unreachable remote store leaves it queued as `local_only`.
    pub async fn submit_claim(
        &self,
        donation: DonationSnapshot,
        qr_data: Option<String>,
    ) -> ClaimStoreResult<SubmitOutcome> {
        let entry = match self.store.create_claim(donation, qr_data).await? {
            CreateOutcome::Created(entry) => entry,
            CreateOutcome::AlreadyClaimed { existing } => {
                return Ok(SubmitOutcome::AlreadyClaimed {
                    existing: Some(existing),
                })
            }
        };
        let claim = claim_of(&entry)?;

        if let Err(e) = self.precheck(AccessRequest::create_claim(&self.actor, claim.clone())) {
            self.store.delete_claim(&entry.id).await?;
            return Err(e);
        }

        match self.remote.create_claim(&self.actor, &claim).await {
            Ok(()) => self.committed(entry).await,
            Err(RemoteError::Unavailable { message }) => {
                info!(claim_id = %entry.id, %message, "Remote store unreachable, claim queued");
                Ok(SubmitOutcome::Queued(entry))
            }
            Err(RemoteError::AlreadyClaimed) => {
                info!(claim_id = %entry.id, "Remote store rejected duplicate claim");
                self.store.delete_claim(&entry.id).await?;
                Ok(SubmitOutcome::AlreadyClaimed { existing: None })
            }
            Err(e) => {
                self.store.delete_claim(&entry.id).await?;
                Err(remote_failure(e))
            }
        }
    }

    /// Change a claim's status locally, then commit it remotely
    ///
    /// A remote rejection restores the previous local entry. Entries never
    /// committed remotely stay queued for [`ClaimSync::flush_pending`].
    pub async fn submit_status(
        &self,
        claim_id: &ClaimId,
        status: ClaimStatus,
    ) -> ClaimStoreResult<SubmitOutcome> {
        let previous = self.find(claim_id).await?;
        if previous.status != status && !previous.status.can_transition_to(status) {
            return Err(ClaimStoreError::IllegalTransition {
                from: previous.status,
                to: status,
            });
        }
        let before = claim_of(&previous)?;
        let after = before.with_status(status);
        self.precheck(AccessRequest::update_claim(&self.actor, before, after.clone()))?;

        self.store.update_claim_status(claim_id, status).await?;
        let updated = self.find(claim_id).await?;
        if updated.sync == SyncState::LocalOnly {
            debug!(%claim_id, "Claim not yet committed, status change queued");
            return Ok(SubmitOutcome::Queued(updated));
        }

        match self.remote.update_claim(&self.actor, &after).await {
            Ok(()) => self.committed(updated).await,
            Err(RemoteError::Unavailable { message }) => {
                info!(%claim_id, %message, "Remote store unreachable, status change queued");
                Ok(SubmitOutcome::Queued(updated))
            }
            Err(e) => {
                self.store.restore_entry(previous).await?;
                Err(remote_failure(e))
            }
        }
    }

    /// Delete a claim locally and remotely
    ///
    /// Entries never committed remotely are only removed locally.
    pub async fn withdraw_claim(&self, claim_id: &ClaimId) -> ClaimStoreResult<bool> {
        let entry = match self.find(claim_id).await {
            Ok(entry) => entry,
            Err(ClaimStoreError::NotFound { .. }) => return Ok(false),
            Err(e) => return Err(e),
        };
        if entry.sync != SyncState::LocalOnly {
            self.precheck(AccessRequest::delete_claim(&self.actor, claim_of(&entry)?))?;
            match self.remote.delete_claim(&self.actor, claim_id).await {
                Ok(()) | Err(RemoteError::NotFound) => {}
                Err(e) => return Err(remote_failure(e)),
            }
        }
        self.store.delete_claim(claim_id).await
    }

    /// Push every `local_only` and `dirty` entry once
    pub async fn flush_pending(&self) -> ClaimStoreResult<FlushReport> {
        let mut report = FlushReport::default();
        for entry in self.store.list_claims().await {
            if !entry.sync.is_pending() {
                continue;
            }
            let Some(claim) = entry.to_claim() else {
                warn!(claim_id = %entry.id, "Skipping claim without readable claimedAt");
                report.rejected += 1;
                continue;
            };
            let pushed = match entry.sync {
                SyncState::LocalOnly => self.remote.create_claim(&self.actor, &claim).await,
                _ => self.remote.update_claim(&self.actor, &claim).await,
            };
            match pushed {
                Ok(()) => {
                    self.store.set_sync(&entry.id, SyncState::Synced).await?;
                    report.pushed += 1;
                }
                Err(RemoteError::Unavailable { .. }) => report.queued += 1,
                Err(e) => {
                    warn!(claim_id = %entry.id, error = %e, "Remote store refused pending claim");
                    if entry.sync == SyncState::LocalOnly {
                        self.store.delete_claim(&entry.id).await?;
                    }
                    report.rejected += 1;
                }
            }
        }
        info!(?report, "Flushed pending claims");
        Ok(report)
    }

    /// Merge the remote store's claims into the cache; the remote store wins
    pub async fn reconcile(&self) -> ClaimStoreResult<MergeReport> {
        let remote = self
            .remote
            .claims_for(&self.actor)
            .await
            .map_err(ClaimStoreError::Remote)?;
        self.store.merge_remote(remote).await
    }

    fn precheck(&self, request: AccessRequest) -> ClaimStoreResult<()> {
        match evaluate(&request) {
            Decision::Allow => Ok(()),
            Decision::Deny { reason } => {
                warn!(operation = %request.operation, %reason, "Local policy check denied");
                Err(ClaimStoreError::PolicyDenied(reason))
            }
        }
    }

    async fn committed(&self, entry: LocalCacheEntry) -> ClaimStoreResult<SubmitOutcome> {
        self.store.set_sync(&entry.id, SyncState::Synced).await?;
        info!(claim_id = %entry.id, "Claim committed remotely");
        Ok(SubmitOutcome::Committed(LocalCacheEntry {
            sync: SyncState::Synced,
            ..entry
        }))
    }

    async fn find(&self, claim_id: &ClaimId) -> ClaimStoreResult<LocalCacheEntry> {
        self.store
            .list_claims()
            .await
            .into_iter()
            .find(|entry| &entry.id == claim_id)
            .ok_or_else(|| ClaimStoreError::NotFound {
                claim_id: claim_id.clone(),
            })
    }
}

fn claim_of(entry: &LocalCacheEntry) -> ClaimStoreResult<Claim> {
    entry.to_claim().ok_or_else(|| ClaimStoreError::Serialization {
        message: format!("claim {} has no readable claimedAt", entry.id),
    })
}

fn remote_failure(err: RemoteError) -> ClaimStoreError {
    match err {
        RemoteError::PolicyDenied(reason) => {
            warn!(%reason, "Remote store denied the request");
            ClaimStoreError::PolicyDenied(reason)
        }
        other => ClaimStoreError::Remote(other),
    }
}
