//! Error taxonomy for transforms and document edits.

use std::fmt;
use std::str::Utf8Error;

use thiserror::Error;

use crate::document::NodeHandle;

// ============================================================================
// TransformError
// ============================================================================

/// Call-level failures of [`Transformer::transform`](crate::Transformer::transform).
#[derive(Debug, Error)]
pub enum TransformError {
    #[error("input is not valid UTF-8")]
    Decode(#[source] Utf8Error),

    #[error("failed to parse input: {}", .0.join("; "))]
    Parse(Vec<String>),

    #[error("input stream failed")]
    Stream(#[source] std::io::Error),

    #[error("invalid selector `{selector}`: {message}")]
    Selector { selector: String, message: String },

    // NOTE: only produced under `FailurePolicy::Abort`
    #[error("{} mutation(s) failed, first: {}", .0.len(), first_failure(.0))]
    Mutations(Vec<MutationFailure>),
}

/// Coarse category of a [`TransformError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Input could not be decoded or parsed into a tree.
    ParseFailure,
    /// The input source failed while being drained.
    StreamFailure,
    /// A rule carried a malformed selector.
    SelectorResolutionFailure,
    /// One or more rule mutations failed.
    MutationFailure,
}

impl TransformError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Decode(_) | Self::Parse(_) => ErrorKind::ParseFailure,
            Self::Stream(_) => ErrorKind::StreamFailure,
            Self::Selector { .. } => ErrorKind::SelectorResolutionFailure,
            Self::Mutations(_) => ErrorKind::MutationFailure,
        }
    }
}

fn first_failure(failures: &[MutationFailure]) -> String {
    failures
        .first()
        .map(ToString::to_string)
        .unwrap_or_default()
}

// ============================================================================
// MutationFailure
// ============================================================================

/// A single failed node mutation.
#[derive(Debug)]
pub struct MutationFailure {
    /// Index of the rule in the collection at transform time
    pub rule: usize,
    /// Selector that produced the node
    pub selector: String,
    /// Node the mutation ran on
    pub node: NodeHandle,
    /// Error returned by the mutation
    pub error: anyhow::Error,
}

impl fmt::Display for MutationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "rule #{} (`{}`) on {:?}: {:#}",
            self.rule, self.selector, self.node, self.error
        )
    }
}

// ============================================================================
// DocumentError
// ============================================================================

/// Failures of the document read/edit primitives.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DocumentError {
    #[error("node {0:?} does not belong to this document")]
    MissingNode(NodeHandle),

    #[error("node {0:?} is not an element")]
    NotAnElement(NodeHandle),

    #[error("node {0:?} has no parent")]
    Detached(NodeHandle),

    #[error("wrapper markup `{0}` contains no element")]
    EmptyWrapper(String),

    #[error("document is already borrowed by another edit")]
    Busy,
}
