//! Document tree handle over `scraper::Html`.
//!
//! A [`Document`] is a cheap, clonable handle to one parsed tree. Clones
//! share the tree, so rule bodies can hold their own handle across await
//! points while other rules edit the same document.
//!
//! # Modules
//!
//! - `input`: input shapes and their normalization into a `Document`
//! - `parse`: parser option forwarding and fragment/document parsing
//! - `edit`: node edit primitives used by rule bodies
//!
//! Every primitive is synchronous and holds the tree borrow only for the
//! duration of the call, so no task can observe a half-applied edit.

mod edit;
mod input;
mod parse;
mod selector;

pub use input::Input;
pub(crate) use selector::CompiledSelector;

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use ego_tree::NodeId;
use scraper::{ElementRef, Html, Node};

use crate::config::TransformOptions;
use crate::error::{DocumentError, TransformError};

// =============================================================================
// Handles
// =============================================================================

/// Reference to one node of a [`Document`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeHandle(NodeId);

impl NodeHandle {
    #[inline]
    pub(crate) fn id(self) -> NodeId {
        self.0
    }
}

/// How input text is turned into a tree.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DocumentMode {
    /// Full document; missing `html`/`head`/`body` are synthesized.
    #[default]
    Document,
    /// Bare fragment parsed in `<body>` context; no wrappers are kept.
    Fragment,
}

impl DocumentMode {
    /// Map the `is_document` option onto a mode.
    ///
    /// Unset falls back to the tree library's default entry point,
    /// `Html::parse_document`.
    pub fn from_flag(is_document: Option<bool>) -> Self {
        match is_document {
            Some(false) => Self::Fragment,
            Some(true) | None => Self::default(),
        }
    }
}

// =============================================================================
// Document
// =============================================================================

/// Shared, single-threaded handle to a parsed HTML tree.
#[derive(Clone)]
pub struct Document {
    tree: Rc<RefCell<Html>>,
    mode: DocumentMode,
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Document")
            .field("mode", &self.mode)
            .field("nodes", &self.tree.try_borrow().map(|h| h.tree.nodes().count()).ok())
            .finish()
    }
}

impl From<Html> for Document {
    fn from(html: Html) -> Self {
        let mode = if matches!(html.tree.root().value(), Node::Fragment) {
            DocumentMode::Fragment
        } else {
            DocumentMode::Document
        };
        Self::from_html(html, mode)
    }
}

impl Document {
    pub(crate) fn from_html(html: Html, mode: DocumentMode) -> Self {
        Self {
            tree: Rc::new(RefCell::new(html)),
            mode,
        }
    }

    /// Parse text according to `options`.
    pub fn parse(text: &str, options: &TransformOptions) -> Result<Self, TransformError> {
        let mode = DocumentMode::from_flag(options.is_document);
        let html = parse::parse_html(text, &options.parse, mode)?;
        Ok(Self::from_html(html, mode))
    }

    /// Parse a full document with default parser options.
    pub fn parse_document(text: &str) -> Self {
        Self::from_html(Html::parse_document(text), DocumentMode::Document)
    }

    /// Parse a fragment with default parser options.
    pub fn parse_fragment(text: &str) -> Self {
        Self::from_html(Html::parse_fragment(text), DocumentMode::Fragment)
    }

    pub fn mode(&self) -> DocumentMode {
        self.mode
    }

    /// Whether both handles point at the same tree.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.tree, &other.tree)
    }

    /// Serialize the tree. Fragments serialize their own nodes only.
    ///
    /// A fragment tree is `Fragment -> <html> -> nodes`: the `<html>` root
    /// element is the parser's context wrapper, never serialized and never
    /// matched by [`Document::select`].
    pub fn html(&self) -> String {
        let html = self.tree.borrow();
        match self.mode {
            DocumentMode::Document => html.html(),
            DocumentMode::Fragment => html.root_element().inner_html(),
        }
    }

    /// Run `f` with read access to the underlying tree.
    ///
    /// Edits on this document fail with [`DocumentError::Busy`] while `f` runs.
    pub fn with_html<R>(&self, f: impl FnOnce(&Html) -> R) -> R {
        f(&self.tree.borrow())
    }

    // =========================================================================
    // Selection
    // =========================================================================

    /// All attached elements matching `selector`, in document order.
    pub fn select(&self, selector: &str) -> Result<Vec<NodeHandle>, TransformError> {
        let compiled = CompiledSelector::parse(selector)?;
        Ok(self.select_compiled(&compiled))
    }

    pub(crate) fn select_compiled(&self, selector: &CompiledSelector) -> Vec<NodeHandle> {
        let html = self.tree.borrow();
        // Walk from the root: detached nodes stay in the arena and must not match.
        let elements: Box<dyn Iterator<Item = ElementRef<'_>> + '_> = match self.mode {
            DocumentMode::Document => {
                Box::new(html.tree.root().descendants().filter_map(ElementRef::wrap))
            }
            DocumentMode::Fragment => Box::new(
                html.root_element()
                    .descendants()
                    .skip(1)
                    .filter_map(ElementRef::wrap),
            ),
        };
        let matched = selector.filter(elements);
        matched
            .into_iter()
            .map(|element| NodeHandle(element.id()))
            .collect()
    }

    // =========================================================================
    // Reads
    // =========================================================================

    pub fn tag_name(&self, node: NodeHandle) -> Result<String, DocumentError> {
        self.read_element(node, |element| element.value().name().to_string())
    }

    pub fn attr(&self, node: NodeHandle, name: &str) -> Result<Option<String>, DocumentError> {
        self.read_element(node, |element| element.value().attr(name).map(str::to_string))
    }

    pub fn has_class(&self, node: NodeHandle, class: &str) -> Result<bool, DocumentError> {
        self.read_element(node, |element| element.value().classes().any(|c| c == class))
    }

    /// Concatenated descendant text.
    pub fn text(&self, node: NodeHandle) -> Result<String, DocumentError> {
        self.read_element(node, |element| element.text().collect())
    }

    pub fn inner_html(&self, node: NodeHandle) -> Result<String, DocumentError> {
        self.read_element(node, |element| element.inner_html())
    }

    pub fn outer_html(&self, node: NodeHandle) -> Result<String, DocumentError> {
        self.read_element(node, |element| element.html())
    }

    fn read_element<R>(
        &self,
        node: NodeHandle,
        f: impl FnOnce(ElementRef<'_>) -> R,
    ) -> Result<R, DocumentError> {
        let html = self.tree.try_borrow().map_err(|_| DocumentError::Busy)?;
        let node_ref = html
            .tree
            .get(node.id())
            .ok_or(DocumentError::MissingNode(node))?;
        let element = ElementRef::wrap(node_ref).ok_or(DocumentError::NotAnElement(node))?;
        Ok(f(element))
    }

    /// Run an edit with exclusive access to the tree.
    fn edit<R>(
        &self,
        f: impl FnOnce(&mut Html) -> Result<R, DocumentError>,
    ) -> Result<R, DocumentError> {
        let mut html = self.tree.try_borrow_mut().map_err(|_| DocumentError::Busy)?;
        f(&mut html)
    }
}
