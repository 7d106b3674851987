//! Transformation rules.

use std::fmt;
use std::future::Future;
use std::rc::Rc;

use futures::future::LocalBoxFuture;

use crate::document::{Document, NodeHandle};

/// Future returned by a rule's mutation.
pub type MutateFuture = LocalBoxFuture<'static, anyhow::Result<()>>;

type MutateFn = dyn Fn(NodeHandle, Document) -> MutateFuture;

struct RuleInner {
    selectors: Vec<String>,
    mutate: Box<MutateFn>,
}

/// A list of selectors paired with an async mutation.
///
/// Cloning is cheap and keeps identity: clones compare equal under
/// [`TransformationRule::ptr_eq`].
#[derive(Clone)]
pub struct TransformationRule(Rc<RuleInner>);

impl TransformationRule {
    /// Create a rule.
    ///
    /// # Example
    ///
    /// ```ignore
    /// let rule = TransformationRule::new(["h1", "h2"], |node, doc| async move {
    ///     doc.add_class(node, "heading")?;
    ///     anyhow::Ok(())
    /// });
    /// ```
    pub fn new<I, S, F, Fut>(selectors: I, mutate: F) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
        F: Fn(NodeHandle, Document) -> Fut + 'static,
        Fut: Future<Output = anyhow::Result<()>> + 'static,
    {
        Self(Rc::new(RuleInner {
            selectors: selectors.into_iter().map(Into::into).collect(),
            mutate: Box::new(move |node: NodeHandle, doc: Document| -> MutateFuture {
                Box::pin(mutate(node, doc))
            }),
        }))
    }

    pub fn selectors(&self) -> &[String] {
        &self.0.selectors
    }

    /// Whether `selector` is one of this rule's selectors, compared verbatim.
    pub fn has_selector(&self, selector: &str) -> bool {
        self.0.selectors.iter().any(|s| s == selector)
    }

    /// Whether both values are the same rule.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// Start the mutation for one node.
    pub(crate) fn mutate(&self, node: NodeHandle, doc: Document) -> MutateFuture {
        (self.0.mutate)(node, doc)
    }
}

impl fmt::Debug for TransformationRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransformationRule")
            .field("selectors", &self.0.selectors)
            .finish_non_exhaustive()
    }
}
