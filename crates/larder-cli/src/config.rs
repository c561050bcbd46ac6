//! CLI configuration
//!
//! ```toml
//! [store]
//! namespace = "larder"
//! storage_dir = ".larder/data"
//!
//! [logging]
//! filter = "info"
//! ```

use anyhow::{Context, Result};
use larder_core::{load_toml, ConfigValidation};
use larder_store::ClaimStoreConfig;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Directory used when neither the file nor the environment names one
pub const DEFAULT_STORAGE_DIR: &str = ".larder/data";

/// Top-level configuration file
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LarderConfig {
    /// Claim cache settings
    pub store: ClaimStoreConfig,
    /// Log filter settings
    pub logging: LoggingConfig,
}

/// Log filter settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `tracing` filter directive, e.g. `info,larder_store=debug`
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
        }
    }
}

impl LarderConfig {
    /// Load `path` if it exists, apply environment overrides, and validate
    pub fn load(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            load_toml(path).with_context(|| format!("loading {}", path.display()))?
        } else {
            Self::default()
        };
        config.merge_env_from(|name| std::env::var(name).ok());
        config.store.validate()?;
        Ok(config)
    }

    fn merge_env_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        self.store.merge_env_from(&lookup);
        if let Some(filter) = lookup("LARDER_LOG") {
            self.logging.filter = filter;
        }
    }

    /// Directory for the filesystem claim cache
    pub fn storage_dir(&self) -> PathBuf {
        self.store
            .storage_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_STORAGE_DIR))
    }
}
