//! # Larder Store - Offline Claim Store
//!
//! **Purpose**: Keep a device's claims durable and internally consistent
//! without connectivity, and converge with the remote document store when
//! it is reachable.
//!
//! The whole claim collection lives under one namespaced key
//! (`<namespace>.claims`) as a JSON array. Every mutation is a
//! read-modify-write of that array behind a per-store async mutex, so
//! concurrent callers never lose each other's entries.
//!
//! ```text
//! ClaimSync (policy pre-check, remote submit, reconcile)
//!     └── ClaimStore (one-active-claim guard, status transitions)
//!             └── dyn LocalStorage (memory, filesystem)
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod claim_store;
mod config;
mod entry;
mod error;
/// Remote document store seam
pub mod remote;
/// Local persistence backends
pub mod storage;
mod sync;

pub use claim_store::{ClaimStore, CreateOutcome, MergeReport};
pub use config::ClaimStoreConfig;
pub use entry::{DonationSnapshot, LocalCacheEntry, SyncState};
pub use error::{ClaimStoreError, ClaimStoreResult};
pub use remote::{RemoteClaim, RemoteClaimSource, RemoteError};
pub use storage::{FilesystemStorage, LocalStorage, MemoryStorage, StorageError};
pub use sync::{ClaimSync, FlushReport, SubmitOutcome};
