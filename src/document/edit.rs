//! Node edit primitives.
//!
//! These are what rule bodies call to mutate a [`Document`]. None of them
//! suspends: each call borrows the tree, applies one complete edit and
//! releases the borrow.
//!
//! Attribute edits rebuild the element value in place so the node handle
//! stays valid and selector caches (id, classes) are recomputed. Edits
//! address attributes in the null namespace; namespaced attributes such as
//! `xlink:href` are carried over untouched.

use ego_tree::{NodeId, NodeRef, Tree};
use html5ever::tendril::StrTendril;
use html5ever::tree_builder::{ElementFlags, NodeOrText, TreeSink};
use html5ever::{Attribute, LocalName, QualName, namespace_url, ns};
use scraper::{Html, Node};

use super::{Document, NodeHandle};
use crate::error::DocumentError;

impl Document {
    // =========================================================================
    // Content
    // =========================================================================

    /// Replace all children of `node` with one text node.
    pub fn set_text(&self, node: NodeHandle, text: &str) -> Result<(), DocumentError> {
        self.edit(|html| {
            element_parts(html, node)?;
            clear_children(&mut html.tree, node.id());
            if !text.is_empty() {
                html.append(
                    &node.id(),
                    NodeOrText::AppendText(StrTendril::from_slice(text)),
                );
            }
            Ok(())
        })
    }

    /// Parse `markup` as a fragment and insert it after the last child of `node`.
    pub fn append_html(&self, node: NodeHandle, markup: &str) -> Result<(), DocumentError> {
        let fragment = Html::parse_fragment(markup);
        self.edit(|html| {
            element_parts(html, node)?;
            for source in fragment.root_element().children() {
                graft(&mut html.tree, source, Placement::LastChildOf(node.id()));
            }
            Ok(())
        })
    }

    /// Parse `markup` as a fragment and insert it before the first child of `node`.
    pub fn prepend_html(&self, node: NodeHandle, markup: &str) -> Result<(), DocumentError> {
        let fragment = Html::parse_fragment(markup);
        self.edit(|html| {
            element_parts(html, node)?;
            let first = html
                .tree
                .get(node.id())
                .and_then(|n| n.first_child())
                .map(|child| child.id());
            let placement = match first {
                Some(first) => Placement::Before(first),
                None => Placement::LastChildOf(node.id()),
            };
            for source in fragment.root_element().children() {
                graft(&mut html.tree, source, placement);
            }
            Ok(())
        })
    }

    // =========================================================================
    // Attributes
    // =========================================================================

    /// Set (or overwrite) an attribute.
    pub fn set_attr(&self, node: NodeHandle, name: &str, value: &str) -> Result<(), DocumentError> {
        self.edit(|html| {
            let (qual, mut attrs) = element_parts(html, node)?;
            match attrs.iter_mut().find(|attr| is_named(attr, name)) {
                Some(attr) => attr.value = StrTendril::from_slice(value),
                None => attrs.push(attribute(name, value)),
            }
            rebuild_element(html, node, qual, attrs);
            Ok(())
        })
    }

    /// Remove an attribute. Missing attributes are ignored.
    pub fn remove_attr(&self, node: NodeHandle, name: &str) -> Result<(), DocumentError> {
        self.edit(|html| {
            let (qual, mut attrs) = element_parts(html, node)?;
            let before = attrs.len();
            attrs.retain(|attr| !is_named(attr, name));
            if attrs.len() != before {
                rebuild_element(html, node, qual, attrs);
            }
            Ok(())
        })
    }

    /// Add whitespace-separated classes, skipping ones already present.
    pub fn add_class(&self, node: NodeHandle, classes: &str) -> Result<(), DocumentError> {
        self.update_classes(node, |list| {
            let mut changed = false;
            for class in classes.split_ascii_whitespace() {
                if !list.iter().any(|c| c == class) {
                    list.push(class.to_string());
                    changed = true;
                }
            }
            changed
        })
    }

    /// Remove whitespace-separated classes. The `class` attribute is kept even if empty.
    pub fn remove_class(&self, node: NodeHandle, classes: &str) -> Result<(), DocumentError> {
        self.update_classes(node, |list| {
            let before = list.len();
            list.retain(|c| !classes.split_ascii_whitespace().any(|r| r == c));
            list.len() != before
        })
    }

    fn update_classes(
        &self,
        node: NodeHandle,
        update: impl FnOnce(&mut Vec<String>) -> bool,
    ) -> Result<(), DocumentError> {
        self.edit(|html| {
            let (qual, mut attrs) = element_parts(html, node)?;
            let index = attrs.iter().position(|attr| is_named(attr, "class"));

            let mut list: Vec<String> = index
                .map(|i| {
                    attrs[i]
                        .value
                        .split_ascii_whitespace()
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_default();

            if !update(&mut list) {
                return Ok(());
            }

            let value = list.join(" ");
            match index {
                Some(i) => attrs[i].value = StrTendril::from_slice(&value),
                None => attrs.push(attribute("class", &value)),
            }
            rebuild_element(html, node, qual, attrs);
            Ok(())
        })
    }

    // =========================================================================
    // Structure
    // =========================================================================

    /// Wrap `node` in the first element of `markup`.
    ///
    /// The node is placed inside the wrapper's innermost first element,
    /// so `<div><span></span></div>` wraps the node in the `span`.
    pub fn wrap(&self, node: NodeHandle, markup: &str) -> Result<(), DocumentError> {
        let fragment = Html::parse_fragment(markup);
        let wrapper = fragment
            .root_element()
            .children()
            .find(|child| child.value().is_element())
            .ok_or_else(|| DocumentError::EmptyWrapper(markup.to_string()))?;

        self.edit(|html| {
            require_parent(&html.tree, node)?;
            let wrapper_id = graft(&mut html.tree, wrapper, Placement::Before(node.id()))
                .ok_or(DocumentError::MissingNode(node))?;
            let inner = innermost_element(&html.tree, wrapper_id);

            let mut target = html
                .tree
                .get_mut(node.id())
                .ok_or(DocumentError::MissingNode(node))?;
            target.detach();
            if let Some(mut inner) = html.tree.get_mut(inner) {
                inner.append_id(node.id());
            }
            Ok(())
        })
    }

    /// Replace `node` with the nodes parsed from `markup`.
    pub fn replace_with_html(&self, node: NodeHandle, markup: &str) -> Result<(), DocumentError> {
        let fragment = Html::parse_fragment(markup);
        self.edit(|html| {
            require_parent(&html.tree, node)?;
            for source in fragment.root_element().children() {
                graft(&mut html.tree, source, Placement::Before(node.id()));
            }
            detach(&mut html.tree, node.id());
            Ok(())
        })
    }

    /// Detach `node` (and its subtree) from the document.
    pub fn remove(&self, node: NodeHandle) -> Result<(), DocumentError> {
        self.edit(|html| {
            require_parent(&html.tree, node)?;
            detach(&mut html.tree, node.id());
            Ok(())
        })
    }
}

// =============================================================================
// Tree helpers
// =============================================================================

/// Where a grafted subtree lands.
#[derive(Debug, Clone, Copy)]
enum Placement {
    LastChildOf(NodeId),
    Before(NodeId),
}

/// Copy `source` and its descendants into `tree`. Returns the new root id.
fn graft(tree: &mut Tree<Node>, source: NodeRef<'_, Node>, placement: Placement) -> Option<NodeId> {
    let value = source.value().clone();
    let id = match placement {
        Placement::LastChildOf(parent) => tree.get_mut(parent)?.append(value).id(),
        Placement::Before(sibling) => tree.get_mut(sibling)?.insert_before(value).id(),
    };
    for child in source.children() {
        graft(tree, child, Placement::LastChildOf(id));
    }
    Some(id)
}

/// Follow first element children down to the deepest one.
fn innermost_element(tree: &Tree<Node>, root: NodeId) -> NodeId {
    let mut current = root;
    while let Some(child) = tree
        .get(current)
        .and_then(|n| n.children().find(|c| c.value().is_element()))
    {
        current = child.id();
    }
    current
}

fn clear_children(tree: &mut Tree<Node>, id: NodeId) {
    let children: Vec<NodeId> = tree
        .get(id)
        .map(|n| n.children().map(|c| c.id()).collect())
        .unwrap_or_default();
    for child in children {
        detach(tree, child);
    }
}

fn detach(tree: &mut Tree<Node>, id: NodeId) {
    if let Some(mut node) = tree.get_mut(id) {
        node.detach();
    }
}

fn require_parent(tree: &Tree<Node>, node: NodeHandle) -> Result<(), DocumentError> {
    let node_ref = tree.get(node.id()).ok_or(DocumentError::MissingNode(node))?;
    match node_ref.parent() {
        Some(_) => Ok(()),
        None => Err(DocumentError::Detached(node)),
    }
}

// =============================================================================
// Element helpers
// =============================================================================

/// Element name and attribute list of `node`, in source order.
fn element_parts(
    html: &Html,
    node: NodeHandle,
) -> Result<(QualName, Vec<Attribute>), DocumentError> {
    let node_ref = html
        .tree
        .get(node.id())
        .ok_or(DocumentError::MissingNode(node))?;
    match node_ref.value() {
        Node::Element(element) => Ok((
            element.name.clone(),
            element
                .attrs
                .iter()
                .map(|(name, value)| Attribute {
                    name: name.clone(),
                    value: value.clone(),
                })
                .collect(),
        )),
        _ => Err(DocumentError::NotAnElement(node)),
    }
}

fn is_named(attr: &Attribute, name: &str) -> bool {
    attr.name.ns == ns!() && &*attr.name.local == name
}

fn attribute(name: &str, value: &str) -> Attribute {
    Attribute {
        name: QualName::new(None, ns!(), LocalName::from(name)),
        value: StrTendril::from_slice(value),
    }
}

/// Swap the element value of `node` for a freshly built one.
fn rebuild_element(html: &mut Html, node: NodeHandle, name: QualName, attrs: Vec<Attribute>) {
    // ego-tree never frees nodes; the scratch element stays detached in the arena.
    let scratch = html.create_element(name, attrs, ElementFlags::default());
    let fresh = html.tree.get(scratch).map(|n| n.value().clone());
    if let (Some(fresh), Some(mut target)) = (fresh, html.tree.get_mut(node.id())) {
        *target.value() = fresh;
    }
}
