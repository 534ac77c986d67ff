//! # Application Configuration
//!
//! Optional TOML configuration for the Tessera binary. Everything here
//! has a CLI counterpart; the file exists so scripted deployments can
//! pin a store path and id scheme without repeating flags.
//!
//! ```toml
//! [store]
//! path = "/var/lib/tessera/main.db"
//!
//! [ids]
//! prefix = "node7"
//! ```

use serde::Deserialize;
use std::path::{Path, PathBuf};
use tessera_core::StoreError;

// =============================================================================
// CONFIGURATION TYPES
// =============================================================================

/// Top-level application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    /// Store file settings.
    #[serde(default)]
    pub store: StoreSection,

    /// Identifier generation settings.
    #[serde(default)]
    pub ids: IdSection,
}

/// `[store]` section.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StoreSection {
    /// Default snapshot file path, overridden by `--store`.
    pub path: Option<PathBuf>,
}

/// `[ids]` section.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IdSection {
    /// When set, new record ids are `<prefix><counter>` instead of
    /// random. Useful for reproducible fixtures; collisions across
    /// separate runs are the operator's problem.
    pub prefix: Option<String>,
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self, StoreError> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            StoreError::IoError(format!("Cannot read config '{}': {}", path.display(), e))
        })?;
        toml::from_str(&raw)
            .map_err(|e| StoreError::ConfigurationError(format!("Invalid config: {e}")))
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_parses_to_defaults() {
        let config: AppConfig = toml::from_str("").expect("parse");
        assert!(config.store.path.is_none());
        assert!(config.ids.prefix.is_none());
    }

    #[test]
    fn full_config_parses() {
        let config: AppConfig = toml::from_str(
            r#"
            [store]
            path = "main.db"

            [ids]
            prefix = "node7"
            "#,
        )
        .expect("parse");
        assert_eq!(config.store.path, Some(PathBuf::from("main.db")));
        assert_eq!(config.ids.prefix.as_deref(), Some("node7"));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let result: Result<AppConfig, _> = toml::from_str("[stor]\npath = \"x\"");
        assert!(result.is_err());
    }
}
