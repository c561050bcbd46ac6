//! Filesystem storage backend
//!
//! One file per key under a base directory. Writes go to a temporary file
//! that is synced and then renamed over the target, so a crash mid-write
//! leaves the previous value intact.

use super::{LocalStorage, StorageError};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

#[cfg(unix)]
const FILE_PERMISSIONS: u32 = 0o600;

/// File-per-key storage rooted at a directory
#[derive(Debug, Clone)]
pub struct FilesystemStorage {
    base_path: PathBuf,
}

impl FilesystemStorage {
    /// Open (creating if needed) storage rooted at `base_path`
    pub fn new(base_path: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let base_path = base_path.into();
        std::fs::create_dir_all(&base_path).map_err(|e| StorageError::ConfigurationError {
            reason: format!("Failed to create storage directory: {e}"),
        })?;
        info!(path = %base_path.display(), "Initialized filesystem storage");
        Ok(Self { base_path })
    }

    /// Directory holding the data files
    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    fn validate_key(key: &str) -> Result<(), StorageError> {
        if key.is_empty() {
            return Err(StorageError::InvalidKey {
                reason: "Key cannot be empty".to_string(),
            });
        }
        if key.len() > 255 {
            return Err(StorageError::InvalidKey {
                reason: "Key too long (max 255 characters)".to_string(),
            });
        }
        if key.starts_with('.')
            || key.contains("..")
            || key.contains('\0')
            || key.contains('/')
            || key.contains('\\')
        {
            return Err(StorageError::InvalidKey {
                reason: "Key contains invalid characters".to_string(),
            });
        }
        Ok(())
    }

    fn key_to_path(&self, key: &str) -> Result<PathBuf, StorageError> {
        Self::validate_key(key)?;
        Ok(self.base_path.join(format!("{key}.dat")))
    }

    async fn write_atomic(path: &Path, data: &[u8]) -> Result<(), StorageError> {
        let temp_path = path.with_extension("tmp");
        let mut file = fs::File::create(&temp_path)
            .await
            .map_err(|e| StorageError::WriteFailed(format!("Failed to create temp file: {e}")))?;
        file.write_all(data)
            .await
            .map_err(|e| StorageError::WriteFailed(format!("Failed to write data: {e}")))?;
        file.sync_all()
            .await
            .map_err(|e| StorageError::WriteFailed(format!("Failed to sync: {e}")))?;
        drop(file);

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&temp_path, std::fs::Permissions::from_mode(FILE_PERMISSIONS))
                .await
                .map_err(|e| {
                    StorageError::WriteFailed(format!("Failed to set permissions: {e}"))
                })?;
        }

        fs::rename(&temp_path, path)
            .await
            .map_err(|e| StorageError::WriteFailed(format!("Failed to rename temp file: {e}")))
    }
}

#[async_trait]
impl LocalStorage for FilesystemStorage {
    async fn store(&self, key: &str, value: Vec<u8>) -> Result<(), StorageError> {
        let path = self.key_to_path(key)?;
        Self::write_atomic(&path, &value).await?;
        debug!(key, bytes = value.len(), "Stored value");
        Ok(())
    }

    async fn retrieve(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        let path = self.key_to_path(key)?;
        match fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StorageError::ReadFailed(format!(
                "Failed to read {}: {e}",
                path.display()
            ))),
        }
    }

    async fn remove(&self, key: &str) -> Result<bool, StorageError> {
        let path = self.key_to_path(key)?;
        match fs::remove_file(&path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(StorageError::DeleteFailed(format!(
                "Failed to remove {}: {e}",
                path.display()
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_store_retrieve_remove() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FilesystemStorage::new(dir.path()).unwrap();

        assert_eq!(storage.retrieve("larder.claims").await.unwrap(), None);
        storage
            .store("larder.claims", b"[]".to_vec())
            .await
            .unwrap();
        assert_eq!(
            storage.retrieve("larder.claims").await.unwrap(),
            Some(b"[]".to_vec())
        );
        assert!(dir.path().join("larder.claims.dat").exists());
        assert!(!dir.path().join("larder.claims.tmp").exists());

        assert!(storage.remove("larder.claims").await.unwrap());
        assert!(!storage.remove("larder.claims").await.unwrap());
    }

    #[tokio::test]
    async fn test_overwrite_replaces_contents() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FilesystemStorage::new(dir.path()).unwrap();
        storage.store("k", b"first, longer".to_vec()).await.unwrap();
        storage.store("k", b"second".to_vec()).await.unwrap();
        assert_eq!(storage.retrieve("k").await.unwrap(), Some(b"second".to_vec()));
    }

    #[tokio::test]
    async fn test_rejects_traversal_keys() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FilesystemStorage::new(dir.path()).unwrap();
        for key in ["", "../escape", "a/b", ".hidden", "a\\b"] {
            assert!(
                matches!(
                    storage.store(key, Vec::new()).await,
                    Err(StorageError::InvalidKey { .. })
                ),
                "{key:?}"
            );
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_files_are_owner_only() {
        use std::os::unix::fs::PermissionsExt;
        let dir = tempfile::tempdir().unwrap();
        let storage = FilesystemStorage::new(dir.path()).unwrap();
        storage.store("k", b"v".to_vec()).await.unwrap();
        let mode = std::fs::metadata(dir.path().join("k.dat"))
            .unwrap()
            .permissions()
            .mode();
        assert_eq!(mode & 0o777, FILE_PERMISSIONS);
    }
}
