//! `[transform]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [transform]
//! failure_policy = "isolate"  # or "abort"
//! is_document = true          # omit to keep the parser's default mode
//! ```

use serde::{Deserialize, Serialize};

/// What a transform does when rule mutations fail.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Record failed mutations and serialize whatever succeeded (default).
    #[default]
    Isolate,
    /// Let every mutation settle, then fail the call if any of them failed.
    Abort,
}

/// Engine settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TransformSectionConfig {
    /// Failure handling for rule mutations.
    pub failure_policy: FailurePolicy,

    /// Parse input as a full document (`true`) or a fragment (`false`).
    /// Unset keeps the parser's default.
    pub is_document: Option<bool>,
}
