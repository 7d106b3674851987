//! `[log]` section configuration.

use serde::{Deserialize, Serialize};

/// Logging settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Print `debug!` lines (rule resolution, mutation failures).
    pub verbose: bool,
}
