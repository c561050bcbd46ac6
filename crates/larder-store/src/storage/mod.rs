//! Local persistence backends
//!
//! A byte-oriented key/value seam. Each `store` replaces the value under a
//! key atomically: a concurrent reader sees the old bytes or the new bytes,
//! never a mix.

use async_trait::async_trait;

mod filesystem;
mod memory;

pub use filesystem::FilesystemStorage;
pub use memory::MemoryStorage;

/// Errors raised by persistence backends
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StorageError {
    /// Key is empty, too long or could escape the storage root
    #[error("Invalid storage key: {reason}")]
    InvalidKey {
        /// Why the key was rejected
        reason: String,
    },

    /// Reading a value failed
    #[error("Read failed: {0}")]
    ReadFailed(String),

    /// Writing a value failed
    #[error("Write failed: {0}")]
    WriteFailed(String),

    /// Removing a value failed
    #[error("Delete failed: {0}")]
    DeleteFailed(String),

    /// Backend could not be set up
    #[error("Storage configuration error: {reason}")]
    ConfigurationError {
        /// What went wrong
        reason: String,
    },
}

/// Durable key/value storage for the claim collection
#[async_trait]
pub trait LocalStorage: Send + Sync {
    /// Replace the value stored under `key`
    async fn store(&self, key: &str, value: Vec<u8>) -> Result<(), StorageError>;

    /// Read the value stored under `key`, `None` if absent
    async fn retrieve(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError>;

    /// Remove `key`, reporting whether it existed
    async fn remove(&self, key: &str) -> Result<bool, StorageError>;
}
