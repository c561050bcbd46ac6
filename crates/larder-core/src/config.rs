//! Configuration loading and validation helpers

use crate::errors::{LarderError, Result};
use serde::de::DeserializeOwned;
use std::path::Path;

/// Trait for configuration validation
pub trait ConfigValidation {
    /// Validate this configuration
    fn validate(&self) -> Result<()>;
}

/// Read and parse a TOML configuration file
pub fn load_toml<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        LarderError::invalid(format!(
            "Failed to read config file {}: {e}",
            path.display()
        ))
    })?;
    Ok(toml::from_str(&content)?)
}

/// Check that a name is usable as a storage key segment
///
/// Allowed: ASCII letters, digits, `-`, `_` and `.` (not leading), at most 64
/// characters.
pub fn validate_key_segment(field: &str, value: &str) -> Result<()> {
    if value.is_empty() {
        return Err(LarderError::invalid(format!("Field '{field}' is required")));
    }
    if value.len() > 64 {
        return Err(LarderError::invalid(format!(
            "Field '{field}' must be at most 64 characters"
        )));
    }
    if value.starts_with('.')
        || value.contains("..")
        || !value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
    {
        return Err(LarderError::invalid(format!(
            "Field '{field}' has invalid format. Expected: [A-Za-z0-9._-], got: {value}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use std::io::Write;

    #[derive(Debug, Deserialize)]
    struct Sample {
        name: String,
    }

    #[test]
    fn test_load_toml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "name = \"larder\"").unwrap();
        let sample: Sample = load_toml(file.path()).unwrap();
        assert_eq!(sample.name, "larder");
    }

    #[test]
    fn test_load_toml_reports_bad_syntax() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "name = ").unwrap();
        let result: Result<Sample> = load_toml(file.path());
        assert!(matches!(result, Err(LarderError::Invalid { .. })));
    }

    #[test]
    fn test_key_segments() {
        assert!(validate_key_segment("namespace", "larder").is_ok());
        assert!(validate_key_segment("namespace", "app.v2_beta-1").is_ok());
        assert!(validate_key_segment("namespace", "").is_err());
        assert!(validate_key_segment("namespace", "../etc").is_err());
        assert!(validate_key_segment("namespace", "a/b").is_err());
        assert!(validate_key_segment("namespace", "a..b").is_err());
    }
}
