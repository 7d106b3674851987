//! Parser option forwarding and tree construction.

use html5ever::driver::{self, ParseOpts};
use html5ever::tendril::TendrilSink;
use html5ever::{QualName, local_name, namespace_url, ns};
use scraper::Html;

use super::DocumentMode;
use crate::config::ParseOptions;
use crate::error::TransformError;

/// Build parser options, touching only the knobs the caller set.
pub(super) fn parse_opts(options: &ParseOptions) -> ParseOpts {
    let mut opts = ParseOpts::default();

    if let Some(enabled) = options.scripting_enabled {
        opts.tree_builder.scripting_enabled = enabled;
    }
    if let Some(srcdoc) = options.iframe_srcdoc {
        opts.tree_builder.iframe_srcdoc = srcdoc;
    }
    if let Some(drop) = options.drop_doctype {
        opts.tree_builder.drop_doctype = drop;
    }
    if let Some(exact) = options.exact_errors {
        opts.tokenizer.exact_errors = exact;
        opts.tree_builder.exact_errors = exact;
    }
    if let Some(discard) = options.discard_bom {
        opts.tokenizer.discard_bom = discard;
    }

    opts
}

/// Parse `text` into a tree in the given mode.
///
/// With `strict` set, any error recorded by the tree builder fails the parse.
pub(super) fn parse_html(
    text: &str,
    options: &ParseOptions,
    mode: DocumentMode,
) -> Result<Html, TransformError> {
    let opts = parse_opts(options);

    let html = match mode {
        DocumentMode::Document => driver::parse_document(Html::new_document(), opts).one(text),
        DocumentMode::Fragment => driver::parse_fragment(
            Html::new_fragment(),
            opts,
            QualName::new(None, ns!(html), local_name!("body")),
            Vec::new(),
        )
        .one(text),
    };

    if options.is_strict() && !html.errors.is_empty() {
        let errors = html.errors.iter().map(ToString::to_string).collect();
        return Err(TransformError::Parse(errors));
    }

    crate::debug!("parse"; "{:?} parsed ({} bytes, {} recoverable errors)", mode, text.len(), html.errors.len());
    Ok(html)
}

/// Decode a complete byte buffer as UTF-8.
pub(super) fn decode(bytes: &[u8]) -> Result<&str, TransformError> {
    std::str::from_utf8(bytes).map_err(TransformError::Decode)
}
