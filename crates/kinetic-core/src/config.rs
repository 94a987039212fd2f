//! Engine configuration for kinetic networks.
//!
//! Configuration is plain data loaded from TOML. Everything has a default, so
//! an empty file (or no file) yields the standard behavior: aggregates are
//! compared with exact floating-point equality.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

// ===========================================================================
// Errors
// ===========================================================================

/// Errors that can occur while loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The file could not be parsed as TOML or did not match the schema.
    #[error("parse error in {file}: {detail}")]
    Parse { file: PathBuf, detail: String },

    /// A field parsed but holds a value the engine cannot use.
    #[error("invalid value for '{field}': {reason}")]
    Invalid { field: &'static str, reason: String },

    /// An I/O error occurred.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

// ===========================================================================
// KineticConfig
// ===========================================================================

/// Settings shared by every network a directory creates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct KineticConfig {
    /// Largest aggregate movement that still counts as "unchanged" and so
    /// suppresses a broadcast. `0.0` means exact equality.
    pub change_tolerance: f32,
}

impl Default for KineticConfig {
    fn default() -> Self {
        Self {
            change_tolerance: 0.0,
        }
    }
}

impl KineticConfig {
    /// Parse and validate configuration from a TOML string.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Self::parse(content, Path::new("<inline>"))
    }

    /// Read, parse and validate a TOML configuration file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content, path)
    }

    fn parse(content: &str, file: &Path) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content).map_err(|e| ConfigError::Parse {
            file: file.to_path_buf(),
            detail: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Check that every field holds a usable value.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.change_tolerance.is_finite() || self.change_tolerance < 0.0 {
            return Err(ConfigError::Invalid {
                field: "change_tolerance",
                reason: format!("must be finite and >= 0, got {}", self.change_tolerance),
            });
        }
        Ok(())
    }
}

// ===========================================================================
// Tests
// ===========================================================================
