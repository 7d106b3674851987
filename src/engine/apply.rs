//! Rule application: compile, resolve, mutate, settle.
//!
//! ```text
//! compile all selectors ──► (any invalid → whole call fails, nothing mutated)
//!          │
//!          ▼
//! join_all(rules)            rules first polled in collection order
//!   └─ resolve selectors     against the tree as it is at that moment
//!   └─ join_all(nodes)       one future per (selector, node) match
//!          │
//!          ▼
//! Settled { applied, failures }
//! ```

use futures::future::join_all;

use super::TransformationRule;
use crate::debug;
use crate::document::{CompiledSelector, Document, NodeHandle};
use crate::error::{MutationFailure, TransformError};

/// A rule with its selectors parsed.
pub(super) struct CompiledRule<'a> {
    index: usize,
    rule: &'a TransformationRule,
    selectors: Vec<(&'a str, CompiledSelector)>,
}

/// Outcome of every scheduled mutation.
#[derive(Debug, Default)]
pub(super) struct Settled {
    pub applied: usize,
    pub failures: Vec<MutationFailure>,
}

impl Settled {
    fn merge(mut self, other: Settled) -> Self {
        self.applied += other.applied;
        self.failures.extend(other.failures);
        self
    }
}

/// Parse every selector of every rule, failing on the first invalid one.
pub(super) fn compile(rules: &[TransformationRule]) -> Result<Vec<CompiledRule<'_>>, TransformError> {
    rules
        .iter()
        .enumerate()
        .map(|(index, rule)| {
            let selectors = rule
                .selectors()
                .iter()
                .map(|s| Ok((s.as_str(), CompiledSelector::parse(s)?)))
                .collect::<Result<Vec<_>, TransformError>>()?;
            Ok(CompiledRule {
                index,
                rule,
                selectors,
            })
        })
        .collect()
}

/// Run every rule against `doc` and wait for all mutations to settle.
pub(super) async fn apply(rules: &[CompiledRule<'_>], doc: &Document) -> Settled {
    join_all(rules.iter().map(|rule| apply_rule(rule, doc)))
        .await
        .into_iter()
        .fold(Settled::default(), Settled::merge)
}

async fn apply_rule(rule: &CompiledRule<'_>, doc: &Document) -> Settled {
    let targets = resolve(rule, doc);
    debug!("transform"; "rule #{} {:?} matched {} nodes", rule.index, rule.rule.selectors(), targets.len());

    let results = join_all(targets.into_iter().map(|(selector, node)| async move {
        rule.rule
            .mutate(node, doc.clone())
            .await
            .map_err(|error| MutationFailure {
                rule: rule.index,
                selector: selector.to_string(),
                node,
                error,
            })
    }))
    .await;

    let mut settled = Settled::default();
    for result in results {
        match result {
            Ok(()) => settled.applied += 1,
            Err(failure) => {
                debug!("transform"; "mutation failed: {}", failure);
                settled.failures.push(failure);
            }
        }
    }
    settled
}

/// Concatenate per-selector matches in selector order, keeping duplicates.
fn resolve<'a>(rule: &CompiledRule<'a>, doc: &Document) -> Vec<(&'a str, NodeHandle)> {
    rule.selectors
        .iter()
        .flat_map(|(source, selector)| {
            doc.select_compiled(selector)
                .into_iter()
                .map(move |node| (*source, node))
        })
        .collect()
}
