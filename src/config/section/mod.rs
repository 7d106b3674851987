//! Configuration section definitions.
//!
//! Each module corresponds to a section in the config file:
//!
//! | Module      | TOML Section    | Purpose                              |
//! |-------------|-----------------|--------------------------------------|
//! | `transform` | `[transform]`   | Failure policy, document/fragment    |
//! | `parse`     | `[parse]`       | Parser pass-through options          |
//! | `log`       | `[log]`         | Verbose logging                      |

mod log;
mod parse;
mod transform;

pub use log::LogConfig;
pub use parse::ParseOptions;
pub use transform::{FailurePolicy, TransformSectionConfig};
