//! Storage backend that fails on demand

use async_trait::async_trait;
use larder_store::{LocalStorage, MemoryStorage, StorageError};
use std::sync::atomic::{AtomicBool, Ordering};

/// Memory storage whose reads and writes can be switched off
#[derive(Debug, Default)]
pub struct FailingStorage {
    inner: MemoryStorage,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
}

impl FailingStorage {
    /// Healthy storage
    pub fn new() -> Self {
        Self::default()
    }

    /// Healthy storage sharing data with `inner`
    pub fn wrapping(inner: MemoryStorage) -> Self {
        Self {
            inner,
            ..Self::default()
        }
    }

    /// Make `retrieve` fail
    pub fn fail_reads(&self, failing: bool) {
        self.fail_reads.store(failing, Ordering::SeqCst);
    }

    /// Make `store` and `remove` fail
    pub fn fail_writes(&self, failing: bool) {
        self.fail_writes.store(failing, Ordering::SeqCst);
    }

    /// The wrapped storage, bypassing failure injection
    pub fn inner(&self) -> &MemoryStorage {
        &self.inner
    }
}

#[async_trait]
impl LocalStorage for FailingStorage {
    async fn store(&self, key: &str, value: Vec<u8>) -> Result<(), StorageError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StorageError::WriteFailed("injected write failure".to_string()));
        }
        self.inner.store(key, value).await
    }

    async fn retrieve(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(StorageError::ReadFailed("injected read failure".to_string()));
        }
        self.inner.retrieve(key).await
    }

    async fn remove(&self, key: &str) -> Result<bool, StorageError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StorageError::DeleteFailed("injected delete failure".to_string()));
        }
        self.inner.remove(key).await
    }
}
