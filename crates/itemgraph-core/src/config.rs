//! Per-context configuration
//!
//! Loaded from TOML; every field has a default so an empty document is a
//! valid configuration.
//!
//! ```toml
//! max_undo_depth = 100
//! validate_on_commit = true
//! record_selection = true
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::errors::{ItemGraphError, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextConfig {
    /// Oldest transactions are dropped past this depth; `None` keeps all
    #[serde(default)]
    pub max_undo_depth: Option<usize>,
    /// Run structural validation before every commit
    #[serde(default = "default_true")]
    pub validate_on_commit: bool,
    /// Record selection deltas in transactions and restore on cancel
    #[serde(default = "default_true")]
    pub record_selection: bool,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            max_undo_depth: None,
            validate_on_commit: default_true(),
            record_selection: default_true(),
        }
    }
}

fn default_true() -> bool {
    true
}

impl ContextConfig {
    /// Parse a configuration document
    ///
    /// # Errors
    ///
    /// Returns `Config` if the document is not valid TOML or has fields of
    /// the wrong type.
    pub fn from_toml_str(input: &str) -> Result<Self> {
        toml::from_str(input).map_err(|e| ItemGraphError::Config {
            message: e.to_string(),
        })
    }

    /// Load a configuration file; a missing file yields the defaults
    ///
    /// # Errors
    ///
    /// Returns `Config` if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path).map_err(|e| ItemGraphError::Config {
            message: format!("failed to read {}: {e}", path.display()),
        })?;
        Self::from_toml_str(&content)
    }

    /// Render as TOML
    ///
    /// # Errors
    ///
    /// Returns `Config` if serialization fails.
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string(self).map_err(|e| ItemGraphError::Config {
            message: e.to_string(),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_gives_defaults() {
        let config = ContextConfig::from_toml_str("").unwrap();
        assert_eq!(config, ContextConfig::default());
        assert!(config.validate_on_commit);
        assert!(config.record_selection);
        assert_eq!(config.max_undo_depth, None);
    }

    #[test]
    fn test_partial_document() {
        let config = ContextConfig::from_toml_str("max_undo_depth = 3").unwrap();
        assert_eq!(config.max_undo_depth, Some(3));
        assert!(config.validate_on_commit);
    }

    #[test]
    fn test_malformed_document() {
        let err = ContextConfig::from_toml_str("validate_on_commit = \"yes\"").unwrap_err();
        assert!(matches!(err, ItemGraphError::Config { .. }));
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let config = ContextConfig::load(Path::new("/nonexistent/itemgraph.toml")).unwrap();
        assert_eq!(config, ContextConfig::default());
    }

    #[test]
    fn test_toml_round_trip() {
        let config = ContextConfig {
            max_undo_depth: Some(10),
            validate_on_commit: false,
            record_selection: true,
        };
        let text = config.to_toml_string().unwrap();
        assert_eq!(ContextConfig::from_toml_str(&text).unwrap(), config);
    }
}
