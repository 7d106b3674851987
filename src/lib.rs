//! html-rules: rule-based asynchronous HTML transformation.
//!
//! A [`Transformer`] holds an ordered list of [`TransformationRule`]s. Each
//! rule pairs CSS selectors with an async mutation that receives a
//! [`NodeHandle`] and a [`Document`] handle. A transform call parses the
//! input, runs every rule against every matching node concurrently, waits
//! for all of them to settle and serializes the result once.
//!
//! ```ignore
//! use html_rules::{TransformationRule, Transformer};
//!
//! let transformer = Transformer::new([TransformationRule::new(
//!     ["h1"],
//!     |node, doc| async move {
//!         doc.set_text(node, "Modified Title")?;
//!         anyhow::Ok(())
//!     },
//! )]);
//!
//! let html = transformer.transform("<h1>Original</h1>").await?;
//! assert!(html.contains("<h1>Modified Title</h1>"));
//! ```
//!
//! # Modules
//!
//! | Module     | Purpose                                              |
//! |------------|------------------------------------------------------|
//! | `engine`   | Rule collection and the transform pipeline           |
//! | `document` | Tree handle, input normalization, edit primitives    |
//! | `config`   | TOML configuration and per-call options              |
//! | `error`    | Call-level and edit-level error types                |
//! | `logger`   | `log!` / `debug!` macros                             |

pub mod logger;

mod config;
mod document;
mod engine;
mod error;

pub use config::{
    ConfigError, FailurePolicy, LogConfig, ParseOptions, TransformConfig, TransformOptions,
    TransformSectionConfig,
};
pub use document::{Document, DocumentMode, Input, NodeHandle};
pub use engine::{MutateFuture, TransformReport, TransformationRule, Transformer};
pub use error::{DocumentError, ErrorKind, MutationFailure, TransformError};
