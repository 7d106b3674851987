//! `[parse]` section configuration.
//!
//! Every knob is optional. Unset knobs are never written into the parser
//! options, so the parser keeps its own defaults for them.
//!
//! # Example
//!
//! ```toml
//! [parse]
//! scripting_enabled = false   # parse <noscript> content as markup
//! drop_doctype = false
//! strict = true               # fail on any recorded parse error
//! ```

use serde::{Deserialize, Serialize};

/// Pass-through options for the HTML parser.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ParseOptions {
    /// Whether scripting is considered enabled (affects `<noscript>`).
    pub scripting_enabled: Option<bool>,
    /// Parse as the `srcdoc` of an iframe (no quirks mode for missing doctype).
    pub iframe_srcdoc: Option<bool>,
    /// Drop the doctype from the tree.
    pub drop_doctype: Option<bool>,
    /// Report detailed parse error messages.
    pub exact_errors: Option<bool>,
    /// Discard a leading byte order mark.
    pub discard_bom: Option<bool>,
    /// Fail the parse if the tree builder recorded any error.
    pub strict: Option<bool>,
}

impl ParseOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn scripting_enabled(mut self, value: bool) -> Self {
        self.scripting_enabled = Some(value);
        self
    }

    pub fn iframe_srcdoc(mut self, value: bool) -> Self {
        self.iframe_srcdoc = Some(value);
        self
    }

    pub fn drop_doctype(mut self, value: bool) -> Self {
        self.drop_doctype = Some(value);
        self
    }

    pub fn exact_errors(mut self, value: bool) -> Self {
        self.exact_errors = Some(value);
        self
    }

    pub fn discard_bom(mut self, value: bool) -> Self {
        self.discard_bom = Some(value);
        self
    }

    pub fn strict(mut self, value: bool) -> Self {
        self.strict = Some(value);
        self
    }

    /// Whether recorded parse errors should fail the parse.
    pub fn is_strict(&self) -> bool {
        self.strict.unwrap_or(false)
    }
}
