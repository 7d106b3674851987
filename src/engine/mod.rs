//! Rule engine.
//!
//! A [`Transformer`] owns an ordered rule collection and turns one input into
//! one serialized document per [`Transformer::transform`] call:
//!
//! 1. the input is normalized into a [`Document`]
//! 2. every rule's selectors are compiled
//! 3. all rules run concurrently; each mutates every node it resolves to
//! 4. once every mutation has settled, the failure policy is applied
//! 5. the document is serialized exactly once
//!
//! Scheduling is single-threaded and cooperative: futures are `!Send`, so
//! drive them on a current-thread runtime or a `LocalSet`.

mod apply;
mod rule;

pub use rule::{MutateFuture, TransformationRule};

use crate::config::{FailurePolicy, TransformConfig, TransformOptions};
use crate::debug;
use crate::document::{Document, Input};
use crate::error::{MutationFailure, TransformError};

/// Result of a transform that finished serializing.
#[derive(Debug)]
pub struct TransformReport {
    /// Serialized document.
    pub html: String,
    /// Number of node mutations that succeeded.
    pub applied: usize,
    /// Node mutations that failed (always empty under `FailurePolicy::Abort`).
    pub failures: Vec<MutationFailure>,
}

/// Applies an ordered set of [`TransformationRule`]s to HTML input.
#[derive(Debug, Default)]
pub struct Transformer {
    rules: Vec<TransformationRule>,
    policy: FailurePolicy,
    options: TransformOptions,
}

impl Transformer {
    pub fn new(rules: impl IntoIterator<Item = TransformationRule>) -> Self {
        Self {
            rules: rules.into_iter().collect(),
            policy: FailurePolicy::default(),
            options: TransformOptions::default(),
        }
    }

    /// Build a transformer with the policy and default options from `config`.
    pub fn from_config(
        config: &TransformConfig,
        rules: impl IntoIterator<Item = TransformationRule>,
    ) -> Self {
        if config.log.verbose {
            crate::logger::set_verbose(true);
        }
        Self::new(rules)
            .with_failure_policy(config.transform.failure_policy)
            .with_options(config.options())
    }

    pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Options used by [`Transformer::transform`].
    pub fn with_options(mut self, options: TransformOptions) -> Self {
        self.options = options;
        self
    }

    pub fn failure_policy(&self) -> FailurePolicy {
        self.policy
    }

    pub fn options(&self) -> &TransformOptions {
        &self.options
    }

    // =========================================================================
    // Rule collection
    // =========================================================================

    /// The live rule collection, in application order.
    pub fn rules(&self) -> &[TransformationRule] {
        &self.rules
    }

    /// Append one rule.
    pub fn add_rule(&mut self, rule: TransformationRule) {
        self.rules.push(rule);
    }

    /// Append rules, keeping their relative order.
    pub fn add_rules(&mut self, rules: impl IntoIterator<Item = TransformationRule>) {
        self.rules.extend(rules);
    }

    /// Remove every rule listing `selector` verbatim. Returns how many were removed.
    pub fn remove_rule(&mut self, selector: &str) -> usize {
        let before = self.rules.len();
        self.rules.retain(|rule| !rule.has_selector(selector));
        before - self.rules.len()
    }

    pub fn clear_rules(&mut self) {
        self.rules.clear();
    }

    // =========================================================================
    // Transform
    // =========================================================================

    /// Transform `input` with this transformer's default options.
    pub async fn transform(&self, input: impl Into<Input>) -> Result<String, TransformError> {
        self.transform_with(input, &self.options).await
    }

    /// Transform `input` with explicit options.
    pub async fn transform_with(
        &self,
        input: impl Into<Input>,
        options: &TransformOptions,
    ) -> Result<String, TransformError> {
        Ok(self.transform_report(input, options).await?.html)
    }

    /// Transform `input` and report applied and failed mutations.
    pub async fn transform_report(
        &self,
        input: impl Into<Input>,
        options: &TransformOptions,
    ) -> Result<TransformReport, TransformError> {
        let doc: Document = input.into().into_document(options).await?;
        let compiled = apply::compile(&self.rules)?;

        let settled = apply::apply(&compiled, &doc).await;
        debug!(
            "transform";
            "{} rules settled: {} applied, {} failed",
            compiled.len(),
            settled.applied,
            settled.failures.len()
        );

        if self.policy == FailurePolicy::Abort && !settled.failures.is_empty() {
            return Err(TransformError::Mutations(settled.failures));
        }

        Ok(TransformReport {
            html: doc.html(),
            applied: settled.applied,
            failures: settled.failures,
        })
    }
}

impl Extend<TransformationRule> for Transformer {
    fn extend<I: IntoIterator<Item = TransformationRule>>(&mut self, iter: I) {
        self.add_rules(iter);
    }
}

#[cfg(test)]
mod tests;
