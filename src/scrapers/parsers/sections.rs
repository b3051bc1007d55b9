//! Category-section directories: a heading names the category and the
//! section body lists one link per business.

use scraper::{Html, Selector};
use tracing::debug;
use url::Url;

use super::{ensure_document, ParseContext, ParseError, SourceParser};
use crate::models::{BusinessRecord, ParserKind, MIN_NAME_LEN};
use crate::scrapers::category::categorize;
use crate::scrapers::extract::{clean_name, inline_text, parse_css};

/// Section container, category heading, business links.
const DEFAULT_SELECTORS: [&str; 3] = [".q-and-a", ".question", ".answer a"];

pub struct SectionsParser {
    section: Selector,
    heading: Selector,
    link: Selector,
}

impl SectionsParser {
    /// `overrides`, when given, must hold exactly the section, heading and
    /// link selectors in that order.
    pub fn new(overrides: Option<&[String]>) -> Result<Self, ParseError> {
        let selectors: Vec<&str> = match overrides {
            Some(list) if list.len() == 3 => list.iter().map(String::as_str).collect(),
            Some(list) => {
                return Err(ParseError::Selector {
                    selector: list.join(", "),
                    message: "sections parser takes section, heading and link selectors"
                        .to_string(),
                })
            }
            None => DEFAULT_SELECTORS.to_vec(),
        };

        Ok(Self {
            section: parse_css(selectors[0])?,
            heading: parse_css(selectors[1])?,
            link: parse_css(selectors[2])?,
        })
    }
}

impl SourceParser for SectionsParser {
    fn kind(&self) -> ParserKind {
        ParserKind::Sections
    }

    fn parse(&self, html: &str, ctx: &ParseContext) -> Result<Vec<BusinessRecord>, ParseError> {
        ensure_document(html)?;
        let document = Html::parse_document(html);
        let base = Url::parse(&ctx.source.url).ok();
        let mut records = Vec::new();

        for section in document.select(&self.section) {
            let label = section
                .select(&self.heading)
                .map(inline_text)
                .find(|t| !t.is_empty());

            for link in section.select(&self.link) {
                let Some(href) = link.value().attr("href") else {
                    continue;
                };
                let name = clean_name(&inline_text(link));
                if name.chars().count() < MIN_NAME_LEN {
                    continue;
                }

                let category = categorize(label.as_deref(), &name);
                let source_url = resolve_link(base.as_ref(), href, &ctx.source.url);
                let description = format!(
                    "{} is a local {} business listed in the {} directory.",
                    name,
                    category.as_str().to_lowercase(),
                    ctx.source.name
                );

                debug!("Section '{}': {}", label.as_deref().unwrap_or("-"), name);
                if let Some(record) =
                    BusinessRecord::new(&name, category, "", ctx.default_address, &ctx.source.id)
                {
                    records.push(
                        record
                            .with_description(Some(description))
                            .with_source_url(Some(source_url)),
                    );
                }
            }
        }

        Ok(records)
    }
}

/// Absolute form of `href`, or the source page itself when it cannot be joined.
fn resolve_link(base: Option<&Url>, href: &str, fallback: &str) -> String {
    base.and_then(|b| b.join(href).ok())
        .map(String::from)
        .unwrap_or_else(|| fallback.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Category, SourceDefinition};

    const DIRECTORY: &str = r##"
        <div class="q-and-a">
          <div class="question"><a href="#">Food and Drink</a></div>
          <div class="answer">
            <a href="/directory/joes-cafe">1 - Joe's Cafe – breakfast all day</a>
            <a href="https://riverside.example/">Riverside Bakery</a>
            <a>No Link Ltd</a>
            <a href="/x">AB</a>
          </div>
        </div>
        <div class="q-and-a">
          <div class="question"><a href="#">Places to Stay</a></div>
          <div class="answer"><a href="/directory/hind">The Hind Hotel</a></div>
        </div>
    "##;

    fn source() -> SourceDefinition {
        SourceDefinition::new(
            "council",
            "Town Council",
            "https://council.example/business-directory/",
            ParserKind::Sections,
        )
    }

    #[test]
    fn parses_sections_with_labels_and_links() {
        let source = source();
        let ctx = ParseContext {
            source: &source,
            default_address: "Wellingborough, Northamptonshire",
        };
        let records = SectionsParser::new(None)
            .unwrap()
            .parse(DIRECTORY, &ctx)
            .unwrap();

        let names: Vec<_> = records.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["Joe's Cafe", "Riverside Bakery", "The Hind Hotel"]);

        let joes = &records[0];
        assert_eq!(joes.category, Category::FoodAndDrink);
        assert_eq!(
            joes.source_url.as_deref(),
            Some("https://council.example/directory/joes-cafe")
        );
        assert_eq!(
            joes.description.as_deref(),
            Some("Joe's Cafe is a local food & drink business listed in the Town Council directory.")
        );
        assert_eq!(joes.address, "Wellingborough, Northamptonshire");

        assert_eq!(
            records[1].source_url.as_deref(),
            Some("https://riverside.example/")
        );
        assert_eq!(records[2].category, Category::Accommodation);
    }

    #[test]
    fn override_must_have_three_selectors() {
        let overrides = vec![".a".to_string(), ".b".to_string()];
        assert!(matches!(
            SectionsParser::new(Some(&overrides)),
            Err(ParseError::Selector { .. })
        ));
    }

    #[test]
    fn document_without_sections_yields_nothing() {
        let source = source();
        let ctx = ParseContext {
            source: &source,
            default_address: "Somewhere",
        };
        let records = SectionsParser::new(None)
            .unwrap()
            .parse("<html><body><p>Maintenance</p></body></html>", &ctx)
            .unwrap();
        assert!(records.is_empty());
    }
}
