//! Claim store behaviour over memory and filesystem backends

use assert_matches::assert_matches;
use larder_core::{ActorId, ClaimId, ClaimStatus, DonationId, DonationStatus};
use larder_store::{
    ClaimStore, ClaimStoreConfig, ClaimStoreError, CreateOutcome, FilesystemStorage,
    LocalStorage, MemoryStorage, RemoteClaim, SyncState,
};
use larder_testkit::{
    claim, instant, memory_claim_store, snapshot, FailingStorage, ManualClock,
};
use std::sync::Arc;

const KEY: &str = "larder.u1.claims";

async fn created(store: &ClaimStore, donation: &str) -> larder_store::LocalCacheEntry {
    match store
        .create_claim(snapshot(donation, "donor"), None)
        .await
        .unwrap()
    {
        CreateOutcome::Created(entry) => entry,
        other => panic!("expected a new claim, got {other:?}"),
    }
}

#[tokio::test]
async fn empty_store_lists_nothing() {
    let (_storage, _clock, store) = memory_claim_store("u1");
    assert!(store.list_claims().await.is_empty());
}

#[tokio::test]
async fn create_then_list_round_trips_timestamps() {
    let (_storage, _clock, store) = memory_claim_store("u1");
    let entry = match store
        .create_claim(snapshot("d1", "donor"), Some("QR-1".to_string()))
        .await
        .unwrap()
    {
        CreateOutcome::Created(entry) => entry,
        other => panic!("unexpected {other:?}"),
    };

    let listed = store.list_claims().await;
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].status, ClaimStatus::Pending);
    assert_eq!(listed[0].claimed_at, Some(instant()));
    assert_eq!(listed[0].qr_data.as_deref(), Some("QR-1"));
    assert_eq!(listed[0], entry);
}

#[tokio::test]
async fn second_claim_for_same_donation_is_already_claimed() {
    let (storage, _clock, store) = memory_claim_store("u1");
    let first = created(&store, "d1").await;
    let bytes = storage.retrieve(KEY).await.unwrap();

    let outcome = store
        .create_claim(snapshot("d1", "donor"), None)
        .await
        .unwrap();
    assert_eq!(
        outcome,
        CreateOutcome::AlreadyClaimed {
            existing: first.id.clone()
        }
    );
    assert_eq!(storage.retrieve(KEY).await.unwrap(), bytes);
    assert_eq!(store.list_claims().await.len(), 1);
}

#[tokio::test]
async fn picked_up_claim_frees_the_donation() {
    let (_storage, clock, store) = memory_claim_store("u1");
    let first = created(&store, "d1").await;
    assert!(store
        .update_claim_status(&first.id, ClaimStatus::PickedUp)
        .await
        .unwrap());

    clock.advance(chrono::Duration::minutes(5));
    let second = created(&store, "d1").await;
    assert_ne!(second.id, first.id);
    assert_eq!(
        second.claimed_at,
        Some(instant() + chrono::Duration::minutes(5))
    );
    assert_eq!(
        store.active_claim_for(&"d1".into()).await.map(|e| e.id),
        Some(second.id)
    );
}

#[tokio::test]
async fn claim_duplicate_pickup_lifecycle() {
    let (_storage, clock, store) = memory_claim_store("u1");
    let first = match store
        .create_claim(snapshot("d1", "donor"), Some("qr-abc".to_string()))
        .await
        .unwrap()
    {
        CreateOutcome::Created(entry) => entry,
        other => panic!("unexpected {other:?}"),
    };
    assert_eq!(first.status, ClaimStatus::Pending);
    assert_eq!(first.claimed_at, Some(instant()));

    clock.advance(chrono::Duration::minutes(1));
    assert_eq!(
        store
            .create_claim(snapshot("d1", "donor"), Some("qr-abc".to_string()))
            .await
            .unwrap(),
        CreateOutcome::AlreadyClaimed {
            existing: first.id.clone()
        }
    );

    clock.advance(chrono::Duration::minutes(1));
    assert!(store
        .update_claim_status(&first.id, ClaimStatus::PickedUp)
        .await
        .unwrap());

    let listed = store.list_claims().await;
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, first.id);
    assert_eq!(listed[0].status, ClaimStatus::PickedUp);
    assert_eq!(listed[0].claimed_at, Some(instant()));
    assert_eq!(listed[0].qr_data.as_deref(), Some("qr-abc"));
}

#[tokio::test]
async fn padded_donation_id_still_gets_one_pending_claim() {
    let (_storage, _clock, store) = memory_claim_store("u1");
    let first = created(&store, " d1").await;
    assert_eq!(first.donation_id, DonationId::new(" d1"));

    assert_eq!(
        store
            .create_claim(snapshot(" d1", "donor"), None)
            .await
            .unwrap(),
        CreateOutcome::AlreadyClaimed {
            existing: first.id.clone()
        }
    );
    let pending: Vec<_> = store
        .list_claims()
        .await
        .into_iter()
        .filter(|entry| entry.is_active())
        .collect();
    assert_eq!(pending.len(), 1);

    // "<d2>" and "d2" are different donations
    created(&store, "<d2>").await;
    created(&store, "d2").await;
    assert_eq!(store.list_claims().await.len(), 3);
}

#[tokio::test]
async fn merged_remote_ids_are_kept_verbatim() {
    let (_storage, _clock, store) = memory_claim_store("u1");
    let remote = claim(" c<1> ", " d1", "u1", ClaimStatus::Pending);
    store
        .merge_remote(vec![RemoteClaim {
            claim: remote,
            donation: snapshot(" d1", "donor"),
        }])
        .await
        .unwrap();

    let listed = store.list_claims().await;
    assert_eq!(listed[0].id, ClaimId::new(" c<1> "));
    assert_eq!(listed[0].donation_id, DonationId::new(" d1"));
    assert!(store
        .update_claim_status(&ClaimId::new(" c<1> "), ClaimStatus::PickedUp)
        .await
        .unwrap());
}

#[tokio::test]
async fn actors_sharing_a_backend_are_isolated() {
    let storage = MemoryStorage::new();
    let config = ClaimStoreConfig::default();
    let open = |owner: &str| {
        ClaimStore::new(Arc::new(storage.clone()), ActorId::new(owner), &config)
            .unwrap()
            .with_clock(Arc::new(ManualClock::new(instant())))
    };
    let u1 = open("u1");
    let u2 = open("u2");
    assert_ne!(u1.collection_key(), u2.collection_key());

    let local = created(&u1, "d1").await;
    u1.merge_remote(vec![RemoteClaim {
        claim: local.to_claim().unwrap(),
        donation: local.donation.clone(),
    }])
    .await
    .unwrap();
    let mine = u1.list_claims().await.remove(0);
    assert_eq!(mine.sync, SyncState::Synced);
    assert!(u2.list_claims().await.is_empty());

    // u2's merge neither sees nor removes u1's synced entry, and drops
    // remote claims that belong to someone else
    let report = u2
        .merge_remote(vec![RemoteClaim {
            claim: claim("c9", "d9", "u1", ClaimStatus::Pending),
            donation: snapshot("d9", "donor"),
        }])
        .await
        .unwrap();
    assert!(!report.changed());
    assert!(u2.list_claims().await.is_empty());
    assert_eq!(u1.list_claims().await, vec![mine]);

    u2.clear_all().await.unwrap();
    assert_eq!(u1.list_claims().await.len(), 1);
}

#[test]
fn unsafe_owner_cannot_open_a_store() {
    let result = ClaimStore::new(
        Arc::new(MemoryStorage::new()),
        ActorId::new("../u1"),
        &ClaimStoreConfig::default(),
    );
    assert_matches!(result, Err(ClaimStoreError::InvalidConfiguration { .. }));
}

#[tokio::test]
async fn update_of_unknown_claim_is_a_no_op() {
    let (storage, _clock, store) = memory_claim_store("u1");
    created(&store, "d1").await;
    let bytes = storage.retrieve(KEY).await.unwrap();
    assert!(!store
        .update_claim_status(&"missing".into(), ClaimStatus::Cancelled)
        .await
        .unwrap());
    assert_eq!(storage.retrieve(KEY).await.unwrap(), bytes);
}

#[tokio::test]
async fn illegal_transition_fails_fast() {
    let (_storage, _clock, store) = memory_claim_store("u1");
    let entry = created(&store, "d1").await;
    store
        .update_claim_status(&entry.id, ClaimStatus::Cancelled)
        .await
        .unwrap();
    assert_matches!(
        store
            .update_claim_status(&entry.id, ClaimStatus::Pending)
            .await,
        Err(ClaimStoreError::IllegalTransition {
            from: ClaimStatus::Cancelled,
            to: ClaimStatus::Pending
        })
    );
    assert_eq!(store.list_claims().await[0].status, ClaimStatus::Cancelled);
}

#[tokio::test]
async fn delete_and_clear() {
    let (storage, _clock, store) = memory_claim_store("u1");
    let a = created(&store, "d1").await;
    created(&store, "d2").await;

    assert!(store.delete_claim(&a.id).await.unwrap());
    assert!(!store.delete_claim(&a.id).await.unwrap());
    assert_eq!(store.list_claims().await.len(), 1);

    store.clear_all().await.unwrap();
    assert_eq!(storage.retrieve(KEY).await.unwrap(), None);
    assert!(store.list_claims().await.is_empty());
}

#[tokio::test]
async fn invalidate_donation_cascades() {
    let (_storage, _clock, store) = memory_claim_store("u1");
    let first = created(&store, "d1").await;
    store
        .update_claim_status(&first.id, ClaimStatus::Cancelled)
        .await
        .unwrap();
    created(&store, "d1").await;
    let kept = created(&store, "d2").await;

    assert_eq!(store.invalidate_donation(&"d1".into()).await.unwrap(), 2);
    assert_eq!(store.invalidate_donation(&"d1".into()).await.unwrap(), 0);
    let remaining = store.list_claims().await;
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].id, kept.id);
}

#[tokio::test]
async fn unparseable_claimed_at_reads_as_null() {
    let (storage, _clock, store) = memory_claim_store("u1");
    let entry = created(&store, "d1").await;

    let mut raw: serde_json::Value =
        serde_json::from_slice(&storage.retrieve(KEY).await.unwrap().unwrap()).unwrap();
    raw[0]["claimedAt"] = serde_json::json!("the day before yesterday");
    storage
        .store(KEY, serde_json::to_vec(&raw).unwrap())
        .await
        .unwrap();

    let listed = store.list_claims().await;
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, entry.id);
    assert_eq!(listed[0].claimed_at, None);
}

#[tokio::test]
async fn malformed_entry_is_skipped_and_preserved() {
    let (storage, _clock, store) = memory_claim_store("u1");
    created(&store, "d1").await;

    let mut raw: serde_json::Value =
        serde_json::from_slice(&storage.retrieve(KEY).await.unwrap().unwrap()).unwrap();
    let junk = serde_json::json!({ "id": 42, "status": "teleported" });
    raw.as_array_mut().unwrap().insert(0, junk.clone());
    storage
        .store(KEY, serde_json::to_vec(&raw).unwrap())
        .await
        .unwrap();

    assert_eq!(store.list_claims().await.len(), 1);
    created(&store, "d2").await;
    assert_eq!(store.list_claims().await.len(), 2);

    let raw: serde_json::Value =
        serde_json::from_slice(&storage.retrieve(KEY).await.unwrap().unwrap()).unwrap();
    assert_eq!(raw.as_array().unwrap().len(), 3);
    assert_eq!(raw[0], junk);
}

#[tokio::test]
async fn corrupt_collection_reads_empty_and_is_never_overwritten() {
    let (storage, _clock, store) = memory_claim_store("u1");
    storage.store(KEY, b"{ not json".to_vec()).await.unwrap();

    assert!(store.list_claims().await.is_empty());
    assert_matches!(
        store.create_claim(snapshot("d1", "donor"), None).await,
        Err(ClaimStoreError::CorruptCollection { .. })
    );
    assert_eq!(
        storage.retrieve(KEY).await.unwrap(),
        Some(b"{ not json".to_vec())
    );
}

#[tokio::test]
async fn persistence_failures_become_errors() {
    let storage = Arc::new(FailingStorage::new());
    let store = ClaimStore::new(
        storage.clone(),
        ActorId::new("u1"),
        &ClaimStoreConfig::default(),
    )
    .unwrap();
    let entry = created(&store, "d1").await;

    storage.fail_writes(true);
    assert_matches!(
        store
            .update_claim_status(&entry.id, ClaimStatus::PickedUp)
            .await,
        Err(ClaimStoreError::PersistenceUnavailable(_))
    );
    assert_matches!(
        store.clear_all().await,
        Err(ClaimStoreError::PersistenceUnavailable(_))
    );
    storage.fail_writes(false);
    assert_eq!(store.list_claims().await[0].status, ClaimStatus::Pending);

    storage.fail_reads(true);
    assert!(store.list_claims().await.is_empty());
}

#[tokio::test]
async fn concurrent_creates_never_lose_entries() {
    let (_storage, _clock, store) = memory_claim_store("u1");
    let store = Arc::new(store);

    let mut tasks = Vec::new();
    for i in 0..16 {
        let store = store.clone();
        tasks.push(tokio::spawn(async move {
            store
                .create_claim(snapshot(&format!("d{i}"), "donor"), None)
                .await
        }));
    }
    for task in tasks {
        assert_matches!(task.await.unwrap(), Ok(CreateOutcome::Created(_)));
    }
    assert_eq!(store.list_claims().await.len(), 16);
}

#[tokio::test]
async fn concurrent_creates_for_one_donation_yield_one_entry() {
    let (_storage, _clock, store) = memory_claim_store("u1");
    let store = Arc::new(store);

    let mut tasks = Vec::new();
    for _ in 0..8 {
        let store = store.clone();
        tasks.push(tokio::spawn(async move {
            store.create_claim(snapshot("d1", "donor"), None).await
        }));
    }
    let mut created = 0;
    for task in tasks {
        if let Ok(CreateOutcome::Created(_)) = task.await.unwrap() {
            created += 1;
        }
    }
    assert_eq!(created, 1);
    assert_eq!(store.list_claims().await.len(), 1);
}

#[tokio::test]
async fn filesystem_backend_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let config = ClaimStoreConfig {
        namespace: "device-7".to_string(),
        storage_dir: Some(dir.path().to_path_buf()),
    };
    let clock = Arc::new(ManualClock::new(instant()));

    let first = {
        let storage = Arc::new(FilesystemStorage::new(dir.path()).unwrap());
        let store = ClaimStore::new(storage, ActorId::new("u1"), &config)
            .unwrap()
            .with_clock(clock.clone());
        created(&store, "d1").await
    };

    let storage = Arc::new(FilesystemStorage::new(dir.path()).unwrap());
    let store = ClaimStore::new(storage, ActorId::new("u1"), &config)
        .unwrap()
        .with_clock(clock);
    let listed = store.list_claims().await;
    assert_eq!(listed, vec![first]);
    assert_eq!(listed[0].sync, SyncState::LocalOnly);
    assert!(dir.path().join("device-7.u1.claims.dat").exists());
}

#[tokio::test]
async fn snapshot_fields_are_kept_for_offline_display() {
    let (_storage, _clock, store) = memory_claim_store("u1");
    let donation = larder_testkit::snapshot_with_status("d1", "donor", DonationStatus::Claimed);
    let entry = match store.create_claim(donation.clone(), None).await.unwrap() {
        CreateOutcome::Created(entry) => entry,
        other => panic!("unexpected {other:?}"),
    };
    assert_eq!(entry.donation, donation);
    assert_eq!(store.list_claims().await[0].donation.pickup_location.as_deref(), Some("Community hall"));
}
