//! Per-call transform options.

use super::ParseOptions;

/// Options for obtaining a document from raw input.
///
/// Both fields stay "unset" unless the caller sets them; the document
/// adapter only overrides parser behavior for values that are present.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransformOptions {
    /// Parser pass-through options.
    pub parse: ParseOptions,
    /// `Some(true)` parses a full document, `Some(false)` a fragment.
    pub is_document: Option<bool>,
}

impl TransformOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn parse_options(mut self, parse: ParseOptions) -> Self {
        self.parse = parse;
        self
    }

    pub fn document(mut self, is_document: bool) -> Self {
        self.is_document = Some(is_document);
        self
    }

    /// Shorthand for `TransformOptions::new().document(false)`.
    pub fn fragment() -> Self {
        Self::new().document(false)
    }
}
