//! Field extractors and the generic element parser.
//!
//! The pattern extractors are plain functions over text. The element parser
//! walks a DOM node with priority-ordered selector tables and hands the
//! result to the categorization engine.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Selector};

use super::category::categorize;
use super::parsers::ParseError;
use crate::models::{normalize_name, BusinessRecord};

// ============================================================================
// Pattern extractors
// ============================================================================

static PHONE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?:(?:\(?(?:0(?:0|11)\)?[\s-]?\(?|\+)44\)?[\s-]?(?:\(?0\)?[\s-]?)?)|\(?0)(?:\d{5}\)?[\s-]?\d{4,5}|\d{4}\)?[\s-]?(?:\d{3}[\s-]?\d{3}|\d{5})|\d{3}\)?[\s-]?\d{3}[\s-]?\d{3,4}|\d{2}\)?[\s-]?\d{4}[\s-]?\d{4})(?:[\s-]?(?:x|ext\.?\s?|#)\d+)?",
    )
    .unwrap()
});

static EMAIL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[a-zA-Z0-9._-]+@[a-zA-Z0-9._-]+\.[a-zA-Z0-9_-]+").unwrap());

static WEBSITE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:https?://)?(?:www\.)?[a-zA-Z0-9-]+(?:\.[a-zA-Z0-9-]+)*\.[a-zA-Z]{2,}(?:/[^\s<>]*)?")
        .unwrap()
});

/// Street line, then locality words joined by spaces or commas (or one per
/// line when capitalised), then an optional postcode on the same or next line.
static ADDRESS_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"(?:\d+[A-Za-z]?[ \t]+(?:[A-Za-z][A-Za-z'-]*[ \t]+){0,4}?|(?:[A-Z][A-Za-z'-]*[ \t]+)+?)",
        r"\b(?i:Street|St|Road|Rd|Avenue|Ave|Lane|Ln|Close|Cl|Drive|Dr|Way|Place|Pl|Square|Sq|Court|Ct|Crescent|Cres|Gardens|Gdns|Walk|Hill|Green)\b",
        r"(?:[ \t]*,[ \t]*[A-Za-z][A-Za-z'-]+\b",
        r"|[ \t]+[A-Z][a-z][A-Za-z'-]*\b",
        r"|[ \t]*,?[ \t]*\n[ \t]*[A-Z][A-Za-z'-]+(?:[ \t]+[A-Z][A-Za-z'-]+)*[ \t]*,?(?m:$))*",
        r"(?:(?:,?[ \t]+|[ \t]*,?[ \t]*\n[ \t]*)[A-Z]{1,2}\d[A-Z\d]?[ \t]*\d[A-Z]{2})?",
    ))
    .unwrap()
});

static POSTCODE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b[A-Z]{1,2}\d[A-Z\d]?[ \t]*\d[A-Z]{2}\b").unwrap());

/// "Name - Tel: 01xxx xxxxxx" lines in unstructured text.
static TEXT_LISTING_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"([A-Z][A-Za-z &'-]+(?:Ltd|Limited|LLP|plc)?)[ \t]*[-–][ \t]*(?:Phone|Tel|Telephone)?[ \t]*:?[ \t]*(01\d{3}[ \t]?\d{6})",
    )
    .unwrap()
});

static LEADING_NUMBERING: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[\d\s\-–]+").unwrap());

static TRAILING_SUFFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:\s*–|\s+-\s).*$").unwrap());

static CONTAINS_PSEUDO: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^(?P<base>.*?):contains\(\s*["']?(?P<needle>.*?)["']?\s*\)$"#).unwrap()
});

/// File extensions that look like domains but are assets or pages.
const NON_SITE_SUFFIXES: &[&str] = &[
    ".png", ".jpg", ".jpeg", ".gif", ".svg", ".webp", ".ico", ".css", ".js", ".html", ".htm",
    ".php", ".aspx",
];

/// Line prefixes that mark contact details rather than a business name.
const CONTACT_PREFIXES: &[&str] = &[
    "tel:", "tel.", "tel ", "telephone", "phone:", "mobile:", "fax:", "email", "e-mail",
    "website", "web:", "www.", "http",
];

/// First UK phone number in `text`, with internal whitespace collapsed.
pub fn extract_phone(text: &str) -> Option<String> {
    let text = text.split_whitespace().collect::<Vec<_>>().join(" ");
    PHONE_PATTERN.find(&text).map(|m| m.as_str().to_string())
}

/// First email address in `text`.
pub fn extract_email(text: &str) -> Option<String> {
    EMAIL_PATTERN
        .find(text)
        .map(|m| m.as_str().trim_end_matches('.').to_string())
}

/// First website-looking token in `text`, normalized to an `https://` URL.
///
/// Domains that belong to an email address are skipped.
pub fn extract_website(text: &str) -> Option<String> {
    WEBSITE_PATTERN
        .find_iter(text)
        .map(|m| (m.start(), m.end(), m.as_str().trim_end_matches(['.', ',', ')'])))
        .find(|(start, end, candidate)| {
            let before = text[..*start].chars().next_back();
            let after = text[*end..].chars().next();
            let lower = candidate.to_lowercase();
            before != Some('@')
                && after != Some('@')
                && !NON_SITE_SUFFIXES.iter().any(|s| lower.ends_with(s))
        })
        .map(|(_, _, candidate)| normalize_website(candidate))
}

/// Prefix `https://` unless a scheme is already present.
pub fn normalize_website(url: &str) -> String {
    if url.starts_with("http://") || url.starts_with("https://") {
        url.to_string()
    } else {
        format!("https://{}", url)
    }
}

/// First street address in `text`; an address spread over lines is joined
/// with ", ".
pub fn extract_address(text: &str) -> Option<String> {
    ADDRESS_PATTERN.find(text).map(|m| {
        m.as_str()
            .lines()
            .map(|line| line.trim().trim_end_matches(',').trim_end())
            .filter(|line| !line.is_empty())
            .collect::<Vec<_>>()
            .join(", ")
    })
}

/// UK postcode within `text`, upper-cased with a single inner space.
pub fn extract_postcode(text: &str) -> Option<String> {
    POSTCODE_PATTERN.find(text).map(|m| {
        let compact: String = m.as_str().split_whitespace().collect();
        let split = compact.len() - 3;
        format!("{} {}", &compact[..split], &compact[split..])
    })
}

/// Strip list numbering and trailing dash-delimited descriptions from a name.
pub fn clean_name(raw: &str) -> String {
    let name = normalize_name(raw);
    let name = LEADING_NUMBERING.replace(&name, "");
    TRAILING_SUFFIX.replace(&name, "").trim().to_string()
}

/// Whether a text line carries contact details instead of a name.
pub fn is_contact_line(line: &str) -> bool {
    let lower = line.trim().to_lowercase();
    lower.contains('@')
        || !lower.chars().any(char::is_alphabetic)
        || CONTACT_PREFIXES.iter().any(|p| lower.starts_with(p))
}

/// First line longer than three characters that is not a contact line.
pub fn fallback_name(text: &str) -> Option<String> {
    text.lines()
        .map(str::trim)
        .find(|line| line.chars().count() > 3 && !is_contact_line(line))
        .map(normalize_name)
}

/// `(name, phone)` pairs from "Name - Tel: 01xxx xxxxxx" text.
pub fn scan_text_listings(text: &str) -> Vec<(String, String)> {
    TEXT_LISTING_PATTERN
        .captures_iter(text)
        .filter_map(|caps| {
            let name = caps[1].trim().to_string();
            let len = name.chars().count();
            (len > 3 && len < 100).then(|| (name, caps[2].trim().to_string()))
        })
        .collect()
}

// ============================================================================
// Selector strategies
// ============================================================================

/// How a parser locates candidate nodes.
#[derive(Debug, Clone)]
pub enum SelectorStrategy {
    /// Plain CSS selector.
    Css(Selector),
    /// Elements matching `selector` whose text contains `needle`; only the
    /// innermost match of a nested chain is kept.
    ContainsText { selector: Selector, needle: String },
}

impl SelectorStrategy {
    /// Parse a selector, accepting a trailing `:contains("text")` pseudo-class.
    pub fn parse(raw: &str) -> Result<Self, ParseError> {
        let raw = raw.trim();
        if let Some(caps) = CONTAINS_PSEUDO.captures(raw) {
            let base = caps
                .name("base")
                .map(|m| m.as_str().trim())
                .filter(|b| !b.is_empty())
                .unwrap_or("*");
            return Ok(Self::ContainsText {
                selector: parse_css(base)?,
                needle: caps["needle"].to_string(),
            });
        }
        Ok(Self::Css(parse_css(raw)?))
    }

    /// Parse a list of selectors, failing on the first invalid one.
    pub fn parse_all<S: AsRef<str>>(selectors: &[S]) -> Result<Vec<Self>, ParseError> {
        selectors.iter().map(|s| Self::parse(s.as_ref())).collect()
    }

    /// Matching elements under `root`, in document order.
    pub fn select<'a>(&self, root: ElementRef<'a>) -> Vec<ElementRef<'a>> {
        match self {
            Self::Css(selector) => root.select(selector).collect(),
            Self::ContainsText { selector, needle } => {
                let matches: Vec<ElementRef<'a>> = root
                    .select(selector)
                    .filter(|el| el.text().any(|t| t.contains(needle.as_str())))
                    .collect();
                let ids: HashSet<_> = matches.iter().map(|el| el.id()).collect();
                matches
                    .into_iter()
                    .filter(|el| !el.descendants().skip(1).any(|d| ids.contains(&d.id())))
                    .collect()
            }
        }
    }
}

/// Parse a CSS selector into the parser error type.
pub fn parse_css(selector: &str) -> Result<Selector, ParseError> {
    Selector::parse(selector).map_err(|e| ParseError::Selector {
        selector: selector.to_string(),
        message: e.to_string(),
    })
}

fn compile(selectors: &[&str]) -> Vec<Selector> {
    selectors
        .iter()
        .map(|s| Selector::parse(s).unwrap())
        .collect()
}

/// Name markers, headings, emphasis, first table cell, anchor text.
static NAME_SELECTORS: LazyLock<Vec<Selector>> = LazyLock::new(|| {
    compile(&[
        ".business-name",
        ".company-name",
        ".title",
        ".name",
        "h3",
        "h2",
        "strong",
        "b",
        "td:first-child",
        "a",
    ])
});

static DESCRIPTION_SELECTORS: LazyLock<Vec<Selector>> = LazyLock::new(|| {
    compile(&[
        ".business-description",
        ".description",
        ".summary",
        ".details",
        "td:nth-child(2)",
    ])
});

static CATEGORY_SELECTORS: LazyLock<Vec<Selector>> =
    LazyLock::new(|| compile(&[".category", ".business-type", ".sector"]));

static LINK_SELECTOR: LazyLock<Selector> = LazyLock::new(|| Selector::parse("a[href]").unwrap());

// ============================================================================
// Generic element parser
// ============================================================================

/// Text nodes of `el`, trimmed, one per line.
pub fn element_text(el: ElementRef) -> String {
    el.text()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Text of `el` on a single line.
pub fn inline_text(el: ElementRef) -> String {
    normalize_name(&el.text().collect::<String>())
}

/// Inline text of the first descendant matching a selector, tried in order.
fn first_match_text<F>(el: ElementRef, selectors: &[Selector], accept: F) -> Option<String>
where
    F: Fn(&str) -> bool,
{
    selectors.iter().find_map(|selector| {
        el.select(selector)
            .map(inline_text)
            .find(|text| !text.is_empty() && accept(text))
    })
}

/// Website from an anchor whose text names it as one.
fn website_from_links(el: ElementRef) -> Option<String> {
    el.select(&LINK_SELECTOR).find_map(|a| {
        let href = a.value().attr("href")?;
        if !(href.starts_with("http://") || href.starts_with("https://")) {
            return None;
        }
        let label = inline_text(a).to_lowercase();
        (label.contains("website") || label.contains("visit") || label.starts_with("www."))
            .then(|| href.to_string())
    })
}

/// Email from a `mailto:` link.
fn email_from_links(el: ElementRef) -> Option<String> {
    el.select(&LINK_SELECTOR).find_map(|a| {
        let href = a.value().attr("href")?;
        let addr = href.strip_prefix("mailto:")?;
        extract_email(addr.split('?').next().unwrap_or(addr))
    })
}

/// Everything the generic element parser pulls out of one node.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ElementFields {
    pub name: Option<String>,
    pub description: Option<String>,
    pub category_label: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub website: Option<String>,
    pub address: Option<String>,
    pub postcode: Option<String>,
}

impl ElementFields {
    /// Turn extracted fields into a record, or `None` without a usable name.
    pub fn into_record(self, source_id: &str, default_address: &str) -> Option<BusinessRecord> {
        let name = self.name?;
        let keyword_text = match &self.description {
            Some(description) => format!("{} {}", name, description),
            None => name.clone(),
        };
        let category = categorize(self.category_label.as_deref(), &keyword_text);

        let record = BusinessRecord::new(
            &name,
            category,
            self.address.as_deref().unwrap_or(""),
            default_address,
            source_id,
        )?;
        Some(
            record
                .with_description(self.description)
                .with_contact(self.phone, self.email, self.website)
                .with_postcode(self.postcode),
        )
    }
}

/// Run every extractor over one DOM node.
pub fn extract_fields(el: ElementRef) -> ElementFields {
    let text = element_text(el);

    let name = first_match_text(el, &NAME_SELECTORS, |t| !is_contact_line(t))
        .or_else(|| fallback_name(&text));
    let description = first_match_text(el, &DESCRIPTION_SELECTORS, |t| {
        name.as_deref() != Some(t)
    });
    let category_label = first_match_text(el, &CATEGORY_SELECTORS, |_| true);

    // Names like "Green Lane Garage" would otherwise read as addresses.
    let body = text
        .lines()
        .filter(|line| Some(*line) != name.as_deref())
        .collect::<Vec<_>>()
        .join("\n");
    let address = extract_address(&body);
    let postcode = address.as_deref().and_then(extract_postcode);

    ElementFields {
        name,
        description,
        category_label,
        phone: extract_phone(&text),
        email: extract_email(&text).or_else(|| email_from_links(el)),
        website: extract_website(&text).or_else(|| website_from_links(el)),
        address,
        postcode,
    }
}

/// Generic element parser: extract fields from `el` and build a record.
pub fn parse_element(
    el: ElementRef,
    source_id: &str,
    default_address: &str,
) -> Option<BusinessRecord> {
    extract_fields(el).into_record(source_id, default_address)
}
