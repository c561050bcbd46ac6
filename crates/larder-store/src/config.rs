//! Claim store configuration

use larder_core::config::validate_key_segment;
use larder_core::{ActorId, ConfigValidation, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Where and under which key the claim collection is persisted
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClaimStoreConfig {
    /// Prefix of the persistence key
    pub namespace: String,
    /// Directory for the filesystem backend
    pub storage_dir: Option<PathBuf>,
}

impl Default for ClaimStoreConfig {
    fn default() -> Self {
        Self {
            namespace: "larder".to_string(),
            storage_dir: None,
        }
    }
}

impl ClaimStoreConfig {
    /// Configuration with the given namespace
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            ..Self::default()
        }
    }

    /// Persistence key of `owner`'s claim collection
    ///
    /// Fails if the actor id cannot be used as a key segment.
    pub fn collection_key(&self, owner: &ActorId) -> Result<String> {
        validate_key_segment("owner", owner.as_str())?;
        Ok(format!("{}.{owner}.claims", self.namespace))
    }

    /// Apply `LARDER_NAMESPACE` and `LARDER_STORAGE_DIR` from the process environment
    pub fn merge_env(&mut self) {
        self.merge_env_from(|name| std::env::var(name).ok());
    }

    /// Apply overrides from an arbitrary variable lookup
    pub fn merge_env_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(namespace) = lookup("LARDER_NAMESPACE") {
            self.namespace = namespace;
        }
        if let Some(dir) = lookup("LARDER_STORAGE_DIR") {
            self.storage_dir = Some(PathBuf::from(dir));
        }
    }
}

impl ConfigValidation for ClaimStoreConfig {
    fn validate(&self) -> Result<()> {
        validate_key_segment("store.namespace", &self.namespace)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_collection_key() {
        let owner = ActorId::new("u1");
        assert_eq!(
            ClaimStoreConfig::default().collection_key(&owner).unwrap(),
            "larder.u1.claims"
        );
        assert_eq!(
            ClaimStoreConfig::new("tenant-a").collection_key(&owner).unwrap(),
            "tenant-a.u1.claims"
        );
    }

    #[test]
    fn test_collection_key_rejects_unsafe_owner() {
        let config = ClaimStoreConfig::default();
        assert!(config.collection_key(&ActorId::new("../u1")).is_err());
        assert!(config.collection_key(&ActorId::new("")).is_err());
        assert!(config.collection_key(&ActorId::new("a/b")).is_err());
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> =
            [("LARDER_NAMESPACE", "qa"), ("LARDER_STORAGE_DIR", "/var/lib/larder")].into();
        let mut config = ClaimStoreConfig::default();
        config.merge_env_from(|name| env.get(name).map(|v| v.to_string()));
        assert_eq!(config.namespace, "qa");
        assert_eq!(config.storage_dir, Some(PathBuf::from("/var/lib/larder")));
    }

    #[test]
    fn test_validation() {
        assert!(ClaimStoreConfig::default().validate().is_ok());
        assert!(ClaimStoreConfig::new("").validate().is_err());
        assert!(ClaimStoreConfig::new("../../etc").validate().is_err());
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let json = serde_json::json!({ "storage_dir": "/tmp/larder" });
        let config: ClaimStoreConfig = serde_json::from_value(json).unwrap();
        assert_eq!(config.namespace, "larder");
        assert_eq!(config.storage_dir, Some(PathBuf::from("/tmp/larder")));
    }
}
