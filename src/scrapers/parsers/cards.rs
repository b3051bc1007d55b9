//! Card and listing directories, plus pages where the only reliable anchor
//! is a contact marker (a "Telephone" label, a local dialing prefix, a
//! mailto link).

use scraper::Html;

use super::{ensure_document, parse_matches, strategies, ParseContext, ParseError, SourceParser};
use crate::models::{BusinessRecord, ParserKind};
use crate::scrapers::extract::SelectorStrategy;

/// Tried in order; earlier selectors claim a node before later ones see it.
const DEFAULT_SELECTORS: &[&str] = &[
    ".business-card",
    ".listing-item",
    ".business-profile",
    ".search-result",
    ".business-listing",
    ".directory-item",
    r#"div:contains("Telephone")"#,
    r#"div:contains("Email")"#,
    r#"p:contains("01933")"#,
    r#"a[href*="mailto"]"#,
];

pub struct CardsParser {
    strategies: Vec<SelectorStrategy>,
}

impl CardsParser {
    pub fn new(overrides: Option<&[String]>) -> Result<Self, ParseError> {
        Ok(Self {
            strategies: strategies(overrides, DEFAULT_SELECTORS)?,
        })
    }
}

impl SourceParser for CardsParser {
    fn kind(&self) -> ParserKind {
        ParserKind::Cards
    }

    fn parse(&self, html: &str, ctx: &ParseContext) -> Result<Vec<BusinessRecord>, ParseError> {
        ensure_document(html)?;
        let document = Html::parse_document(html);
        Ok(parse_matches(
            document.root_element(),
            &self.strategies,
            ctx,
            |_| false,
        ))
    }
}
