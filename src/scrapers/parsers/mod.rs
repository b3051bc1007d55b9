//! Source parsers.
//!
//! Each parser turns one fetched document into zero or more business record
//! candidates. The four variants cover the markup shapes seen in the wild:
//! category sections, listing cards, table rows and loose text blocks.

mod blocks;
mod cards;
mod sections;
mod table;

pub use blocks::BlocksParser;
pub use cards::CardsParser;
pub use sections::SectionsParser;
pub use table::TableParser;

use std::collections::HashSet;

use scraper::ElementRef;

use super::extract::{parse_element, SelectorStrategy};
use crate::models::{BusinessRecord, ParserKind, SourceDefinition};

/// Errors from parsing a source document.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("Document is empty")]
    EmptyDocument,

    #[error("Invalid selector '{selector}': {message}")]
    Selector { selector: String, message: String },
}

/// Per-source values a parser needs besides the document.
#[derive(Debug, Clone, Copy)]
pub struct ParseContext<'a> {
    pub source: &'a SourceDefinition,
    /// Address used when none can be extracted.
    pub default_address: &'a str,
}

/// Turns a raw document into record candidates.
pub trait SourceParser: Send + Sync {
    fn kind(&self) -> ParserKind;

    /// Parse `html`, returning candidates in document order.
    fn parse(&self, html: &str, ctx: &ParseContext) -> Result<Vec<BusinessRecord>, ParseError>;
}

/// Build the parser a source asks for, honouring its selector override.
pub fn create_parser(source: &SourceDefinition) -> Result<Box<dyn SourceParser>, ParseError> {
    let overrides = (!source.selectors.is_empty()).then_some(source.selectors.as_slice());

    let parser: Box<dyn SourceParser> = match source.parser {
        ParserKind::Sections => Box::new(SectionsParser::new(overrides)?),
        ParserKind::Cards => Box::new(CardsParser::new(overrides)?),
        ParserKind::Table => Box::new(TableParser::new(overrides)?),
        ParserKind::Blocks => Box::new(BlocksParser::new(overrides)?),
    };
    Ok(parser)
}

/// Parse `selectors` when given, else the parser's defaults.
fn strategies(
    overrides: Option<&[String]>,
    defaults: &[&str],
) -> Result<Vec<SelectorStrategy>, ParseError> {
    match overrides {
        Some(selectors) => SelectorStrategy::parse_all(selectors),
        None => SelectorStrategy::parse_all(defaults),
    }
}

/// Reject blank documents before any selector work.
fn ensure_document(html: &str) -> Result<(), ParseError> {
    if html.trim().is_empty() {
        Err(ParseError::EmptyDocument)
    } else {
        Ok(())
    }
}

/// Apply the generic element parser to every node the strategies find.
///
/// A node nested inside, or wrapping, an already parsed node is skipped so
/// overlapping selectors do not yield the same listing twice.
fn parse_matches(
    root: ElementRef,
    strategies: &[SelectorStrategy],
    ctx: &ParseContext,
    mut skip: impl FnMut(ElementRef) -> bool,
) -> Vec<BusinessRecord> {
    let mut handled = HashSet::new();
    let mut records = Vec::new();

    for strategy in strategies {
        for el in strategy.select(root) {
            let overlaps = el.ancestors().any(|a| handled.contains(&a.id()))
                || el.descendants().any(|d| handled.contains(&d.id()));
            if overlaps || skip(el) {
                continue;
            }
            handled.insert(el.id());

            if let Some(record) = parse_element(el, &ctx.source.id, ctx.default_address) {
                records.push(record);
            }
        }
    }

    records
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_parser_matches_kind() {
        for kind in [
            ParserKind::Sections,
            ParserKind::Cards,
            ParserKind::Table,
            ParserKind::Blocks,
        ] {
            let source = SourceDefinition::new("s", "S", "https://example.com/", kind);
            assert_eq!(create_parser(&source).unwrap().kind(), kind);
        }
    }

    #[test]
    fn invalid_override_fails_for_that_source() {
        let mut source =
            SourceDefinition::new("s", "S", "https://example.com/", ParserKind::Cards);
        source.selectors = vec![".ok".to_string(), "div[".to_string()];
        assert!(matches!(
            create_parser(&source),
            Err(ParseError::Selector { .. })
        ));
    }

    #[test]
    fn blank_document_is_empty_error() {
        let source = SourceDefinition::new("s", "S", "https://example.com/", ParserKind::Table);
        let parser = create_parser(&source).unwrap();
        let ctx = ParseContext {
            source: &source,
            default_address: "Somewhere",
        };
        assert!(matches!(
            parser.parse("  \n", &ctx),
            Err(ParseError::EmptyDocument)
        ));
    }
}
