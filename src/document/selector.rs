//! CSS selector compilation and matching.
//!
//! Selectors are parsed with scraper's selector implementation but a parser
//! that also accepts `:has()`, `:is()`, `:where()` and `:nth-child(An+B of S)`.

use cssparser::ParserInput;
use scraper::ElementRef;
use scraper::error::SelectorErrorKind;
use scraper::selector::Simple;
use selectors::NthIndexCache;
use selectors::matching::{
    self, IgnoreNthChildForInvalidation, MatchingContext, MatchingMode, NeedsSelectorFlags,
    QuirksMode,
};
use selectors::parser::{ParseRelative, SelectorList, SelectorParseErrorKind};

use crate::error::TransformError;

struct RuleParser;

impl<'i> selectors::parser::Parser<'i> for RuleParser {
    type Impl = Simple;
    type Error = SelectorParseErrorKind<'i>;

    fn parse_has(&self) -> bool {
        true
    }

    fn parse_is_and_where(&self) -> bool {
        true
    }

    fn parse_nth_child_of(&self) -> bool {
        true
    }
}

/// A parsed, comma-separated selector group.
#[derive(Debug, Clone)]
pub(crate) struct CompiledSelector {
    list: SelectorList<Simple>,
}

impl CompiledSelector {
    pub(crate) fn parse(source: &str) -> Result<Self, TransformError> {
        let mut input = ParserInput::new(source);
        let mut parser = cssparser::Parser::new(&mut input);
        SelectorList::parse(&RuleParser, &mut parser, ParseRelative::No)
            .map(|list| Self { list })
            .map_err(|err| TransformError::Selector {
                selector: source.to_string(),
                message: SelectorErrorKind::from(err).to_string(),
            })
    }

    /// Filter `elements` down to the matching ones, keeping their order.
    pub(crate) fn filter<'a>(
        &self,
        elements: impl Iterator<Item = ElementRef<'a>>,
    ) -> Vec<ElementRef<'a>> {
        let mut cache = NthIndexCache::default();
        let mut context = MatchingContext::new(
            MatchingMode::Normal,
            None,
            &mut cache,
            QuirksMode::NoQuirks,
            NeedsSelectorFlags::No,
            IgnoreNthChildForInvalidation::No,
        );
        elements
            .filter(|element| {
                self.list
                    .0
                    .iter()
                    .any(|s| matching::matches_selector(s, 0, None, element, &mut context))
            })
            .collect()
    }
}
