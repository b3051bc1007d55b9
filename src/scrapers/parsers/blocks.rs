//! Loosely structured directories: free-text containers, falling back to a
//! "Name - Tel: number" scan over the page text.

use scraper::Html;
use tracing::debug;

use super::{ensure_document, parse_matches, strategies, ParseContext, ParseError, SourceParser};
use crate::models::{BusinessRecord, ParserKind};
use crate::scrapers::category::categorize;
use crate::scrapers::extract::{element_text, scan_text_listings, SelectorStrategy};

const DEFAULT_SELECTORS: &[&str] = &[
    ".listing",
    ".business-entry",
    ".directory-item",
    ".business-info",
];

pub struct BlocksParser {
    strategies: Vec<SelectorStrategy>,
}

impl BlocksParser {
    pub fn new(overrides: Option<&[String]>) -> Result<Self, ParseError> {
        Ok(Self {
            strategies: strategies(overrides, DEFAULT_SELECTORS)?,
        })
    }
}

impl SourceParser for BlocksParser {
    fn kind(&self) -> ParserKind {
        ParserKind::Blocks
    }

    fn parse(&self, html: &str, ctx: &ParseContext) -> Result<Vec<BusinessRecord>, ParseError> {
        ensure_document(html)?;
        let document = Html::parse_document(html);
        let root = document.root_element();

        let has_containers = self.strategies.iter().any(|s| !s.select(root).is_empty());
        if has_containers {
            return Ok(parse_matches(root, &self.strategies, ctx, |_| false));
        }

        debug!("No listing containers on {}, scanning page text", ctx.source.id);
        let records = scan_text_listings(&element_text(root))
            .into_iter()
            .filter_map(|(name, phone)| {
                let category = categorize(None, &name);
                BusinessRecord::new(&name, category, "", ctx.default_address, &ctx.source.id)
                    .map(|r| r.with_contact(Some(phone), None, None))
            })
            .collect();

        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Category, SourceDefinition};

    const LOCALITY: &str = "Wellingborough, Northamptonshire";

    fn parse(html: &str) -> Vec<BusinessRecord> {
        let source =
            SourceDefinition::new("blocks", "Blocks", "https://blocks.example/", ParserKind::Blocks);
        let ctx = ParseContext {
            source: &source,
            default_address: LOCALITY,
        };
        BlocksParser::new(None).unwrap().parse(html, &ctx).unwrap()
    }

    #[test]
    fn containers_use_element_parser() {
        let records = parse(
            r#"<div class="business-entry">
                 <h2>Riverside Gym</h2>
                 <div class="summary">Open 24 hours</div>
                 <p>info@riversidegym.example</p>
               </div>
               <div class="business-entry"><p>Tel: 01933 000000</p></div>"#,
        );

        assert_eq!(records.len(), 1);
        let gym = &records[0];
        assert_eq!(gym.name, "Riverside Gym");
        assert_eq!(gym.category, Category::SportsAndFitness);
        assert_eq!(gym.description.as_deref(), Some("Open 24 hours"));
        assert_eq!(gym.email.as_deref(), Some("info@riversidegym.example"));
        assert_eq!(gym.website, None);
    }

    #[test]
    fn text_scan_when_no_containers() {
        let records = parse(
            r#"<html><body><p>Local traders:</p>
               <p>Acme Plumbing Ltd - Tel: 01933 222333</p>
               <p>Riverside Bakery – 01933 444555</p></body></html>"#,
        );

        let names: Vec<_> = records.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["Acme Plumbing Ltd", "Riverside Bakery"]);
        assert_eq!(records[0].phone.as_deref(), Some("01933 222333"));
        assert_eq!(records[0].category, Category::HomeAndGarden);
        assert_eq!(records[1].category, Category::FoodAndDrink);
        assert!(records.iter().all(|r| r.address == LOCALITY));
    }
}
