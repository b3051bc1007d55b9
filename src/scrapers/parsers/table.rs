//! Tabular directories: one business per row or listing container.

use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};

use super::{ensure_document, parse_matches, strategies, ParseContext, ParseError, SourceParser};
use crate::models::{BusinessRecord, ParserKind};
use crate::scrapers::extract::{inline_text, SelectorStrategy};

const DEFAULT_SELECTORS: &[&str] = &[
    "tr",
    ".business-listing",
    ".company-listing",
    ".directory-entry",
];

/// Cell text that marks a header row.
const HEADER_TOKEN: &str = "Company Name";

static CELL_SELECTOR: LazyLock<Selector> = LazyLock::new(|| Selector::parse("td, th").unwrap());
static HEADER_CELL_SELECTOR: LazyLock<Selector> = LazyLock::new(|| Selector::parse("th").unwrap());

pub struct TableParser {
    strategies: Vec<SelectorStrategy>,
}

impl TableParser {
    pub fn new(overrides: Option<&[String]>) -> Result<Self, ParseError> {
        Ok(Self {
            strategies: strategies(overrides, DEFAULT_SELECTORS)?,
        })
    }
}

impl SourceParser for TableParser {
    fn kind(&self) -> ParserKind {
        ParserKind::Table
    }

    fn parse(&self, html: &str, ctx: &ParseContext) -> Result<Vec<BusinessRecord>, ParseError> {
        ensure_document(html)?;
        let document = Html::parse_document(html);
        Ok(parse_matches(
            document.root_element(),
            &self.strategies,
            ctx,
            is_header_row,
        ))
    }
}

fn is_header_row(el: ElementRef) -> bool {
    el.select(&HEADER_CELL_SELECTOR).next().is_some()
        || el
            .select(&CELL_SELECTOR)
            .any(|cell| inline_text(cell) == HEADER_TOKEN)
}
