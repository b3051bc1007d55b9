//! Business records produced by the acquisition pipeline.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::Category;

/// Minimum length of a business name after normalization.
pub const MIN_NAME_LEN: usize = 3;

/// Hours for a single day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DayHours {
    Open { open: String, close: String },
    Closed { closed: bool },
}

impl DayHours {
    pub fn closed() -> Self {
        Self::Closed { closed: true }
    }
}

/// Opening hours keyed by lower-case day name ("monday", "tuesday", ...).
pub type OpeningHours = BTreeMap<String, DayHours>;

/// A normalized business listing.
///
/// Records are built once by a parser and never modified afterwards; the
/// deduplicator only drops records, it does not merge them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BusinessRecord {
    pub name: String,
    pub description: Option<String>,
    pub category: Category,
    pub subcategory: Option<String>,
    pub address: String,
    pub address_line2: Option<String>,
    pub postcode: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub website: Option<String>,
    pub opening_hours: Option<OpeningHours>,
    #[serde(default)]
    pub services: Vec<String>,
    #[serde(default)]
    pub specialties: Vec<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    /// Identifier of the source this record came from.
    pub source: String,
    pub source_url: Option<String>,
}

impl BusinessRecord {
    /// Create a record, or `None` if the normalized name is too short.
    ///
    /// A blank address falls back to `default_address`.
    pub fn new(
        name: &str,
        category: Category,
        address: &str,
        default_address: &str,
        source: &str,
    ) -> Option<Self> {
        let name = normalize_name(name);
        if name.chars().count() < MIN_NAME_LEN {
            return None;
        }

        let address = address.trim();
        let address = if address.is_empty() {
            default_address.trim()
        } else {
            address
        };

        Some(Self {
            name,
            description: None,
            category,
            subcategory: None,
            address: address.to_string(),
            address_line2: None,
            postcode: None,
            phone: None,
            email: None,
            website: None,
            opening_hours: None,
            services: Vec::new(),
            specialties: Vec::new(),
            latitude: None,
            longitude: None,
            source: source.to_string(),
            source_url: None,
        })
    }

    pub fn with_description(mut self, description: Option<String>) -> Self {
        self.description = description.filter(|d| !d.trim().is_empty());
        self
    }

    pub fn with_contact(
        mut self,
        phone: Option<String>,
        email: Option<String>,
        website: Option<String>,
    ) -> Self {
        self.phone = phone;
        self.email = email;
        self.website = website;
        self
    }

    pub fn with_postcode(mut self, postcode: Option<String>) -> Self {
        self.postcode = postcode;
        self
    }

    pub fn with_source_url(mut self, url: Option<String>) -> Self {
        self.source_url = url;
        self
    }

    pub fn with_location(mut self, latitude: Option<f64>, longitude: Option<f64>) -> Self {
        self.latitude = latitude;
        self.longitude = longitude;
        self
    }

    pub fn with_opening_hours(mut self, hours: Option<OpeningHours>) -> Self {
        self.opening_hours = hours.filter(|h| !h.is_empty());
        self
    }

    /// First comma-separated part of the address, used for fuzzy lookups.
    pub fn address_prefix(&self) -> &str {
        self.address.split(',').next().unwrap_or("").trim()
    }
}

/// Collapse runs of whitespace and trim.
pub fn normalize_name(name: &str) -> String {
    name.split_whitespace().collect::<Vec<_>>().join(" ")
}
