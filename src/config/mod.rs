//! Transformer configuration loaded from TOML.
//!
//! # Module Structure
//!
//! ```text
//! config/
//! ├── section/       # Configuration section definitions
//! │   ├── transform  # [transform]
//! │   ├── parse      # [parse]
//! │   └── log        # [log]
//! ├── error          # ConfigError
//! ├── options        # TransformOptions (per-call options)
//! └── mod.rs         # TransformConfig (this file)
//! ```
//!
//! # Sections
//!
//! | Section         | Purpose                                         |
//! |-----------------|-------------------------------------------------|
//! | `[transform]`   | Failure policy and document/fragment mode       |
//! | `[parse]`       | Parser knobs, forwarded only when set           |
//! | `[log]`         | Verbose logging                                 |

mod error;
mod options;
pub mod section;

pub use error::ConfigError;
pub use options::TransformOptions;
pub use section::{FailurePolicy, LogConfig, ParseOptions, TransformSectionConfig};

use crate::log;
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};

// ============================================================================
// root configuration
// ============================================================================

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TransformConfig {
    /// Engine settings
    #[serde(default)]
    pub transform: TransformSectionConfig,

    /// Parser options
    #[serde(default)]
    pub parse: ParseOptions,

    /// Logging settings
    #[serde(default)]
    pub log: LogConfig,
}

impl TransformConfig {
    /// Parse configuration from TOML string
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from file path with unknown field detection.
    ///
    /// Unknown fields are logged as warnings and otherwise ignored.
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;

        let (config, ignored) = Self::parse_with_ignored(&content)?;

        if !ignored.is_empty() {
            Self::print_unknown_fields_warning(&ignored, path);
        }

        config.validate()?;
        Ok(config)
    }

    /// Parse TOML content, collecting any unknown fields.
    fn parse_with_ignored(content: &str) -> Result<(Self, Vec<String>), ConfigError> {
        let mut ignored = Vec::new();
        let deserializer = toml::Deserializer::new(content);
        let config = serde_ignored::deserialize(deserializer, |path: serde_ignored::Path| {
            ignored.push(path.to_string());
        })?;
        Ok((config, ignored))
    }

    /// Print warning about unknown fields.
    fn print_unknown_fields_warning(fields: &[String], path: &Path) {
        let display_path = path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_else(|| path.to_string_lossy());
        log!("warning"; "unknown fields in {}, ignoring:", display_path);
        for field in fields {
            log!("warning"; "- {}", field);
        }
    }

    /// Reject combinations that can never succeed.
    fn validate(&self) -> Result<(), ConfigError> {
        // A dropped doctype is reported by the tree builder as an error.
        if self.parse.is_strict() && self.parse.drop_doctype == Some(true) {
            return Err(ConfigError::Validation(
                "`parse.strict` cannot be combined with `parse.drop_doctype`".into(),
            ));
        }
        Ok(())
    }

    /// Per-call options described by this configuration.
    pub fn options(&self) -> TransformOptions {
        TransformOptions {
            parse: self.parse.clone(),
            is_document: self.transform.is_document,
        }
    }
}

/// Parse a config snippet, failing the test on unknown fields.
#[cfg(test)]
pub fn test_parse_config(content: &str) -> TransformConfig {
    let (parsed, ignored) = TransformConfig::parse_with_ignored(content).unwrap();
    assert!(
        ignored.is_empty(),
        "test config has unknown fields: {:?}",
        ignored
    );
    parsed
}
