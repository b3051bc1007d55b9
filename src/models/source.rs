//! Source definitions for business directories.

use serde::{Deserialize, Serialize};

/// Structural parser used for a source's markup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParserKind {
    /// Category sections, each holding a list of business links.
    Sections,
    /// Card and listing containers, plus elements carrying contact markers.
    Cards,
    /// Table rows and listing containers.
    Table,
    /// Loosely structured free-text containers.
    Blocks,
}

impl ParserKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sections => "sections",
            Self::Cards => "cards",
            Self::Table => "table",
            Self::Blocks => "blocks",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "sections" => Some(Self::Sections),
            "cards" => Some(Self::Cards),
            "table" => Some(Self::Table),
            "blocks" => Some(Self::Blocks),
            _ => None,
        }
    }
}

fn default_true() -> bool {
    true
}

/// A business directory to scrape.
///
/// Static configuration: read once at startup, never changed during a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceDefinition {
    /// Stable identifier, stored on every record as its provenance.
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Directory page to fetch.
    pub url: String,
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Whether the page needs script execution before its markup is useful.
    #[serde(default)]
    pub requires_rendered_fetch: bool,
    pub parser: ParserKind,
    /// Replaces the parser's built-in selector list when non-empty.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub selectors: Vec<String>,
}

impl SourceDefinition {
    /// Create an enabled source with the parser's default selectors.
    pub fn new(id: &str, name: &str, url: &str, parser: ParserKind) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            url: url.to_string(),
            enabled: true,
            requires_rendered_fetch: false,
            parser,
            selectors: Vec::new(),
        }
    }

    pub fn rendered(mut self, requires_rendered_fetch: bool) -> Self {
        self.requires_rendered_fetch = requires_rendered_fetch;
        self
    }

    /// The built-in Wellingborough directories.
    pub fn builtin() -> Vec<Self> {
        vec![
            Self::new(
                "wellingborough-council",
                "Wellingborough Town Council",
                "https://www.wellingboroughtowncouncil.gov.uk/business-directory/",
                ParserKind::Sections,
            )
            .rendered(true),
            Self::new(
                "livelocalads",
                "LiveLocalAds",
                "https://livelocalads.co.uk/search-for-local-businesses/",
                ParserKind::Cards,
            )
            .rendered(true),
            Self::new(
                "business-magnet",
                "Business Magnet",
                "https://www.businessmagnet.co.uk/town/wellingborough.htm",
                ParserKind::Table,
            )
            .rendered(true),
            Self::new(
                "northampton",
                "Northampton.co.uk",
                "https://www.northampton.co.uk/in/wellingborough/",
                ParserKind::Blocks,
            )
            .rendered(true),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_sources_cover_every_parser() {
        let sources = SourceDefinition::builtin();
        for kind in [
            ParserKind::Sections,
            ParserKind::Cards,
            ParserKind::Table,
            ParserKind::Blocks,
        ] {
            assert!(sources.iter().any(|s| s.parser == kind));
        }
        assert!(sources.iter().all(|s| s.enabled));
    }

    #[test]
    fn deserialize_applies_defaults() {
        let source: SourceDefinition = toml::from_str(
            r#"
            id = "example"
            name = "Example"
            url = "https://example.com/"
            parser = "table"
            "#,
        )
        .unwrap();

        assert!(source.enabled);
        assert!(!source.requires_rendered_fetch);
        assert!(source.selectors.is_empty());
        assert_eq!(source.parser, ParserKind::Table);
    }
}
