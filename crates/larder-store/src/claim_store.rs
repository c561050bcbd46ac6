//! The offline claim store

use crate::config::ClaimStoreConfig;
use crate::entry::{DonationSnapshot, LocalCacheEntry, SyncState};
use crate::error::{ClaimStoreError, ClaimStoreResult};
use crate::remote::RemoteClaim;
use crate::storage::LocalStorage;
use larder_core::{
    sanitize_str, ActorId, Claim, ClaimId, ClaimStatus, Clock, DonationId, SystemClock,
};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Result of [`ClaimStore::create_claim`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreateOutcome {
    /// A new pending entry was persisted
    Created(LocalCacheEntry),
    /// The donation already has a pending claim; nothing changed
    AlreadyClaimed {
        /// The claim holding the donation
        existing: ClaimId,
    },
}

/// Counts from merging the remote claim list into the cache
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeReport {
    /// Remote claims new to this device
    pub added: usize,
    /// Cached entries replaced by a differing remote version
    pub updated: usize,
    /// Synced entries the remote store no longer has
    pub removed: usize,
    /// Unsynced pending entries dropped because the remote store holds the donation
    pub conflicts: usize,
}

impl MergeReport {
    /// Whether the merge changed the cache
    pub fn changed(&self) -> bool {
        self.added + self.updated + self.removed + self.conflicts > 0
    }
}

/// A persisted array element
#[derive(Debug, Clone)]
enum StoredEntry {
    Parsed(LocalCacheEntry),
    /// Unreadable element, written back as found
    Malformed(serde_json::Value),
}

impl StoredEntry {
    fn from_raw(raw: serde_json::Value) -> Self {
        match serde_json::from_value::<LocalCacheEntry>(raw.clone()) {
            Ok(entry) => StoredEntry::Parsed(entry),
            Err(e) => {
                warn!(error = %e, "Skipping malformed cache entry");
                StoredEntry::Malformed(raw)
            }
        }
    }

    fn parsed(&self) -> Option<&LocalCacheEntry> {
        match self {
            StoredEntry::Parsed(entry) => Some(entry),
            StoredEntry::Malformed(_) => None,
        }
    }

    fn parsed_mut(&mut self) -> Option<&mut LocalCacheEntry> {
        match self {
            StoredEntry::Parsed(entry) => Some(entry),
            StoredEntry::Malformed(_) => None,
        }
    }
}

/// What a mutation did to the loaded collection
struct Mutation<T> {
    value: T,
    write: bool,
}

impl<T> Mutation<T> {
    fn write(value: T) -> Self {
        Self { value, write: true }
    }

    fn keep(value: T) -> Self {
        Self {
            value,
            write: false,
        }
    }
}

/// One actor's cached claims
///
/// All mutations load the whole collection, change it, and write it back
/// in one `store` call while holding `write_lock`. Reads skip the lock; the
/// backend's per-key atomicity means they see either the old or the new
/// collection.
pub struct ClaimStore {
    storage: Arc<dyn LocalStorage>,
    clock: Arc<dyn Clock>,
    owner: ActorId,
    key: String,
    write_lock: Mutex<()>,
}

impl std::fmt::Debug for ClaimStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClaimStore")
            .field("owner", &self.owner)
            .field("key", &self.key)
            .finish_non_exhaustive()
    }
}

impl ClaimStore {
    /// Store for `owner`'s claims on top of `storage`
    ///
    /// Each actor gets its own collection key, so stores for different
    /// actors over one backend never see each other's entries.
    pub fn new(
        storage: Arc<dyn LocalStorage>,
        owner: ActorId,
        config: &ClaimStoreConfig,
    ) -> ClaimStoreResult<Self> {
        let key = config
            .collection_key(&owner)
            .map_err(|e| ClaimStoreError::InvalidConfiguration {
                message: e.to_string(),
            })?;
        Ok(Self {
            storage,
            clock: Arc::new(SystemClock),
            owner,
            key,
            write_lock: Mutex::new(()),
        })
    }

    /// Replace the clock used for `claimedAt`
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Actor whose claims this store holds
    pub fn owner(&self) -> &ActorId {
        &self.owner
    }

    /// Persistence key of the collection
    pub fn collection_key(&self) -> &str {
        &self.key
    }

    /// Every readable cached entry, in stored order
    ///
    /// Never fails: a missing collection is empty, and an unreadable one is
    /// logged and reported as empty.
    pub async fn list_claims(&self) -> Vec<LocalCacheEntry> {
        match self.load().await {
            Ok(entries) => entries
                .into_iter()
                .filter_map(|entry| match entry {
                    StoredEntry::Parsed(entry) => Some(entry),
                    StoredEntry::Malformed(_) => None,
                })
                .collect(),
            Err(e) => {
                warn!(key = %self.key, error = %e, "Claim cache unreadable, reporting empty");
                Vec::new()
            }
        }
    }

    /// The pending entry for a donation, if any
    pub async fn active_claim_for(&self, donation_id: &DonationId) -> Option<LocalCacheEntry> {
        self.list_claims()
            .await
            .into_iter()
            .find(|entry| entry.is_active() && &entry.donation_id == donation_id)
    }

    /// Claim a donation locally
    ///
    /// Returns [`CreateOutcome::AlreadyClaimed`] without writing when any
    /// cached entry already holds the donation in `pending`.
    pub async fn create_claim(
        &self,
        donation: DonationSnapshot,
        qr_data: Option<String>,
    ) -> ClaimStoreResult<CreateOutcome> {
        let claimed_at = self.clock.now();
        let owner = self.owner.clone();
        self.mutate(move |entries| {
            if let Some(existing) = entries
                .iter()
                .filter_map(StoredEntry::parsed)
                .find(|e| e.is_active() && e.donation_id == donation.id)
            {
                debug!(donation_id = %donation.id, "Donation already claimed locally");
                return Ok(Mutation::keep(CreateOutcome::AlreadyClaimed {
                    existing: existing.id.clone(),
                }));
            }

            let mut claim =
                Claim::pending(ClaimId::generate(), donation.id.clone(), owner, claimed_at);
            claim.qr_data = qr_data.map(|qr| sanitize_str(&qr));
            let entry = LocalCacheEntry::from_claim(claim, donation, SyncState::LocalOnly)
                .normalized()?;
            info!(claim_id = %entry.id, donation_id = %entry.donation_id, "Created local claim");
            entries.push(StoredEntry::Parsed(entry.clone()));
            Ok(Mutation::write(CreateOutcome::Created(entry)))
        })
        .await
    }

    /// Change a cached claim's status
    ///
    /// Returns `false` if no entry has this id. Setting the current status
    /// again is accepted without a write; any other move outside the claim
    /// lifecycle fails with [`ClaimStoreError::IllegalTransition`].
    pub async fn update_claim_status(
        &self,
        claim_id: &ClaimId,
        status: ClaimStatus,
    ) -> ClaimStoreResult<bool> {
        self.mutate(|entries| {
            let Some(entry) = find_mut(entries, claim_id) else {
                return Ok(Mutation::keep(false));
            };
            if entry.status == status {
                return Ok(Mutation::keep(true));
            }
            if !entry.status.can_transition_to(status) {
                return Err(ClaimStoreError::IllegalTransition {
                    from: entry.status,
                    to: status,
                });
            }
            entry.status = status;
            if entry.sync == SyncState::Synced {
                entry.sync = SyncState::Dirty;
            }
            info!(%claim_id, %status, "Updated local claim status");
            Ok(Mutation::write(true))
        })
        .await
    }

    /// Remove a cached claim, reporting whether it existed
    pub async fn delete_claim(&self, claim_id: &ClaimId) -> ClaimStoreResult<bool> {
        self.mutate(|entries| {
            let before = entries.len();
            entries.retain(|e| e.parsed().map_or(true, |entry| &entry.id != claim_id));
            let removed = entries.len() != before;
            if removed {
                info!(%claim_id, "Deleted local claim");
                Ok(Mutation::write(true))
            } else {
                Ok(Mutation::keep(false))
            }
        })
        .await
    }

    /// Drop every entry referencing a donation that expired or was cancelled
    ///
    /// Returns the number of entries removed.
    pub async fn invalidate_donation(&self, donation_id: &DonationId) -> ClaimStoreResult<usize> {
        self.mutate(|entries| {
            let before = entries.len();
            entries.retain(|e| {
                e.parsed()
                    .map_or(true, |entry| &entry.donation_id != donation_id)
            });
            let removed = before - entries.len();
            if removed == 0 {
                return Ok(Mutation::keep(0));
            }
            info!(%donation_id, removed, "Invalidated claims for donation");
            Ok(Mutation::write(removed))
        })
        .await
    }

    /// Remove the persisted collection
    pub async fn clear_all(&self) -> ClaimStoreResult<()> {
        let _guard = self.write_lock.lock().await;
        self.storage.remove(&self.key).await.map_err(|e| {
            warn!(key = %self.key, error = %e, "Failed to clear claim cache");
            ClaimStoreError::from(e)
        })?;
        info!(key = %self.key, "Cleared claim cache");
        Ok(())
    }

    /// Set an entry's sync marker
    pub(crate) async fn set_sync(
        &self,
        claim_id: &ClaimId,
        sync: SyncState,
    ) -> ClaimStoreResult<bool> {
        self.mutate(|entries| match find_mut(entries, claim_id) {
            Some(entry) if entry.sync != sync => {
                entry.sync = sync;
                Ok(Mutation::write(true))
            }
            Some(_) => Ok(Mutation::keep(true)),
            None => Ok(Mutation::keep(false)),
        })
        .await
    }

    /// Put back an entry as it was before a rejected change
    pub(crate) async fn restore_entry(&self, previous: LocalCacheEntry) -> ClaimStoreResult<bool> {
        self.mutate(move |entries| match find_mut(entries, &previous.id) {
            Some(entry) => {
                *entry = previous;
                Ok(Mutation::write(true))
            }
            None => Ok(Mutation::keep(false)),
        })
        .await
    }

    /// Merge the remote store's view of this actor's claims
    ///
    /// Remote versions replace cached ones, unknown remote claims are
    /// appended, synced entries the remote store dropped are removed, and
    /// unsynced pending entries are kept unless the remote store already
    /// holds their donation under another claim. Claims held by other
    /// actors are ignored.
    pub async fn merge_remote(&self, remote: Vec<RemoteClaim>) -> ClaimStoreResult<MergeReport> {
        let incoming = remote
            .into_iter()
            .filter(|rc| {
                let mine = rc.claim.user_id == self.owner;
                if !mine {
                    debug!(claim_id = %rc.claim.id, "Ignoring remote claim held by another actor");
                }
                mine
            })
            .map(|rc| {
                LocalCacheEntry::from_claim(rc.claim, rc.donation, SyncState::Synced).normalized()
            })
            .collect::<Result<Vec<_>, _>>()?;

        self.mutate(move |entries| {
            let mut report = MergeReport::default();
            let mut by_id: HashMap<ClaimId, LocalCacheEntry> =
                incoming.iter().map(|e| (e.id.clone(), e.clone())).collect();
            let held: HashMap<DonationId, ClaimId> = incoming
                .iter()
                .filter(|e| e.is_active())
                .map(|e| (e.donation_id.clone(), e.id.clone()))
                .collect();
            let mut seen = HashSet::new();

            let mut merged = Vec::with_capacity(entries.len() + incoming.len());
            for stored in entries.drain(..) {
                let local = match stored {
                    StoredEntry::Parsed(local) => local,
                    malformed @ StoredEntry::Malformed(_) => {
                        merged.push(malformed);
                        continue;
                    }
                };
                if let Some(theirs) = by_id.remove(&local.id) {
                    seen.insert(theirs.id.clone());
                    if theirs != local {
                        report.updated += 1;
                    }
                    merged.push(StoredEntry::Parsed(theirs));
                } else if local.sync == SyncState::Synced {
                    report.removed += 1;
                } else if local.is_active()
                    && held
                        .get(&local.donation_id)
                        .is_some_and(|holder| holder != &local.id)
                {
                    warn!(
                        claim_id = %local.id,
                        donation_id = %local.donation_id,
                        "Dropping local claim, donation held remotely"
                    );
                    report.conflicts += 1;
                } else {
                    merged.push(StoredEntry::Parsed(local));
                }
            }
            for entry in incoming {
                if !seen.contains(&entry.id) {
                    report.added += 1;
                    merged.push(StoredEntry::Parsed(entry));
                }
            }
            *entries = merged;

            if report.changed() {
                info!(?report, "Merged remote claims");
                Ok(Mutation::write(report))
            } else {
                Ok(Mutation::keep(report))
            }
        })
        .await
    }

    async fn load(&self) -> ClaimStoreResult<Vec<StoredEntry>> {
        let Some(bytes) = self.storage.retrieve(&self.key).await? else {
            return Ok(Vec::new());
        };
        let raw: serde_json::Value =
            serde_json::from_slice(&bytes).map_err(|e| ClaimStoreError::CorruptCollection {
                message: e.to_string(),
            })?;
        let serde_json::Value::Array(items) = raw else {
            return Err(ClaimStoreError::CorruptCollection {
                message: "expected a JSON array".to_string(),
            });
        };
        Ok(items.into_iter().map(StoredEntry::from_raw).collect())
    }

    async fn persist(&self, entries: &[StoredEntry]) -> ClaimStoreResult<()> {
        let mut items = Vec::with_capacity(entries.len());
        for entry in entries {
            items.push(match entry {
                StoredEntry::Parsed(entry) => entry.to_wire_json()?,
                StoredEntry::Malformed(raw) => raw.clone(),
            });
        }
        let bytes = serde_json::to_vec(&serde_json::Value::Array(items))?;
        self.storage.store(&self.key, bytes).await?;
        Ok(())
    }

    async fn mutate<T>(
        &self,
        change: impl FnOnce(&mut Vec<StoredEntry>) -> ClaimStoreResult<Mutation<T>>,
    ) -> ClaimStoreResult<T> {
        let _guard = self.write_lock.lock().await;
        let result = self.mutate_locked(change).await;
        if let Err(e) = &result {
            if matches!(
                e,
                ClaimStoreError::PersistenceUnavailable(_)
                    | ClaimStoreError::CorruptCollection { .. }
            ) {
                warn!(key = %self.key, error = %e, "Claim cache mutation failed");
            }
        }
        result
    }

    async fn mutate_locked<T>(
        &self,
        change: impl FnOnce(&mut Vec<StoredEntry>) -> ClaimStoreResult<Mutation<T>>,
    ) -> ClaimStoreResult<T> {
        let mut entries = self.load().await?;
        let mutation = change(&mut entries)?;
        if mutation.write {
            self.persist(&entries).await?;
        }
        Ok(mutation.value)
    }
}

fn find_mut<'a>(
    entries: &'a mut [StoredEntry],
    claim_id: &ClaimId,
) -> Option<&'a mut LocalCacheEntry> {
    entries
        .iter_mut()
        .filter_map(StoredEntry::parsed_mut)
        .find(|entry| &entry.id == claim_id)
}
