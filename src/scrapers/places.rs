//! Geo-places API integration.
//!
//! Runs a text search for every canonical category around a location, then
//! fetches details for each hit. Only operational places are kept. Place
//! types are mapped through the categorization engine's place-type table.

use std::time::Duration;

use serde::Deserialize;
use tracing::{debug, info, warn};
use url::Url;

use super::category::map_place_types;
use super::http_client::HttpClient;
use crate::models::{BusinessRecord, Category, DayHours, OpeningHours};

/// Places API base URL.
pub const DEFAULT_PLACES_ENDPOINT: &str = "https://maps.googleapis.com/maps/api/place/";

/// Provenance stored on records from this integration.
pub const PLACES_SOURCE_ID: &str = "google-places";

/// Default search location.
pub const DEFAULT_PLACES_LOCATION: &str = "Wellingborough, UK";

const DETAIL_FIELDS: &str =
    "name,formatted_address,formatted_phone_number,website,opening_hours,types,geometry,business_status";

const DAY_NAMES: [&str; 7] = [
    "sunday",
    "monday",
    "tuesday",
    "wednesday",
    "thursday",
    "friday",
    "saturday",
];

/// Errors from the places API.
#[derive(Debug, thiserror::Error)]
pub enum PlacesError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Places API returned {status}")]
    Api { status: String },

    #[error("Failed to decode places response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Invalid places endpoint: {0}")]
    Endpoint(#[from] url::ParseError),
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    status: String,
    #[serde(default)]
    results: Vec<SearchResult>,
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SearchResult {
    place_id: String,
}

#[derive(Debug, Deserialize)]
struct DetailsResponse {
    status: String,
    result: Option<PlaceDetails>,
    error_message: Option<String>,
}

/// Fields requested from the details endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct PlaceDetails {
    pub name: String,
    pub formatted_address: Option<String>,
    pub formatted_phone_number: Option<String>,
    pub website: Option<String>,
    pub opening_hours: Option<PlaceOpeningHours>,
    #[serde(default)]
    pub types: Vec<String>,
    pub geometry: Option<Geometry>,
    pub business_status: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Geometry {
    pub location: LatLng,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlaceOpeningHours {
    #[serde(default)]
    pub periods: Vec<Period>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Period {
    pub open: PeriodPoint,
    /// Absent for places open around the clock.
    pub close: Option<PeriodPoint>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PeriodPoint {
    /// 0 = Sunday.
    pub day: usize,
    /// "HHMM".
    pub time: String,
}

/// Client for the text search and details endpoints.
pub struct PlacesClient {
    client: HttpClient,
    endpoint: String,
    api_key: String,
    category_delay: Duration,
    detail_delay: Duration,
}

impl PlacesClient {
    pub fn new(client: HttpClient, api_key: &str) -> Self {
        Self {
            client,
            endpoint: DEFAULT_PLACES_ENDPOINT.to_string(),
            api_key: api_key.to_string(),
            category_delay: Duration::from_millis(1000),
            detail_delay: Duration::from_millis(100),
        }
    }

    pub fn with_endpoint(mut self, endpoint: &str) -> Self {
        self.endpoint = endpoint.to_string();
        self
    }

    pub fn with_delays(mut self, category_delay: Duration, detail_delay: Duration) -> Self {
        self.category_delay = category_delay;
        self.detail_delay = detail_delay;
        self
    }

    /// Text search URL for `query`.
    pub fn search_url(&self, query: &str) -> Result<Url, PlacesError> {
        let base = Url::parse(&self.endpoint)?.join("textsearch/json")?;
        Ok(Url::parse_with_params(
            base.as_str(),
            &[("query", query), ("key", self.api_key.as_str())],
        )?)
    }

    /// Details URL for `place_id`.
    pub fn details_url(&self, place_id: &str) -> Result<Url, PlacesError> {
        let base = Url::parse(&self.endpoint)?.join("details/json")?;
        Ok(Url::parse_with_params(
            base.as_str(),
            &[
                ("place_id", place_id),
                ("fields", DETAIL_FIELDS),
                ("key", self.api_key.as_str()),
            ],
        )?)
    }

    /// Collect operational places for every category around `location`.
    ///
    /// A failed detail lookup skips that place; a failed search ends the
    /// run and returns what was collected so far.
    pub async fn collect(&self, location: &str, default_address: &str) -> Vec<BusinessRecord> {
        let mut records = Vec::new();

        for category in Category::ALL {
            tokio::time::sleep(self.category_delay).await;

            let query = format!("{} in {}", category, location);
            let place_ids = match self.search(&query).await {
                Ok(ids) => ids,
                Err(e) => {
                    warn!("Places search '{}' failed: {}", query, e);
                    break;
                }
            };

            let before = records.len();
            for place_id in &place_ids {
                match self.details(place_id).await {
                    Ok(Some(details)) => {
                        if let Some(record) = details_to_record(details, default_address) {
                            records.push(record);
                        }
                    }
                    Ok(None) => debug!("No details for place {}", place_id),
                    Err(e) => warn!("Place details {} failed: {}", place_id, e),
                }
                tokio::time::sleep(self.detail_delay).await;
            }

            info!(
                "{}: {} result(s), {} operational",
                category,
                place_ids.len(),
                records.len() - before
            );
        }

        records
    }

    async fn search(&self, query: &str) -> Result<Vec<String>, PlacesError> {
        let url = self.search_url(query)?;
        let body = self.get_body(url).await?;
        let response: SearchResponse = serde_json::from_str(&body)?;

        match response.status.as_str() {
            "OK" | "ZERO_RESULTS" => Ok(response.results.into_iter().map(|r| r.place_id).collect()),
            _ => Err(api_error(response.status, response.error_message)),
        }
    }

    async fn details(&self, place_id: &str) -> Result<Option<PlaceDetails>, PlacesError> {
        let url = self.details_url(place_id)?;
        let body = self.get_body(url).await?;
        let response: DetailsResponse = serde_json::from_str(&body)?;

        match response.status.as_str() {
            "OK" => Ok(response.result),
            "NOT_FOUND" | "ZERO_RESULTS" => Ok(None),
            _ => Err(api_error(response.status, response.error_message)),
        }
    }

    async fn get_body(&self, url: Url) -> Result<String, PlacesError> {
        let response = self
            .client
            .get(url.as_str())
            .await
            .map_err(|e| PlacesError::Http(e.without_url()))?;
        if !response.is_success() {
            return Err(PlacesError::Api {
                status: format!("HTTP {}", response.status.as_u16()),
            });
        }
        response
            .text()
            .await
            .map_err(|e| PlacesError::Http(e.without_url()))
    }
}

fn api_error(status: String, message: Option<String>) -> PlacesError {
    PlacesError::Api {
        status: match message {
            Some(message) => format!("{}: {}", status, message),
            None => status,
        },
    }
}

/// Build a record from place details, or `None` unless the place is operational.
pub fn details_to_record(details: PlaceDetails, default_address: &str) -> Option<BusinessRecord> {
    if details.business_status.as_deref() != Some("OPERATIONAL") {
        return None;
    }

    let category = map_place_types(&details.types);
    let record = BusinessRecord::new(
        &details.name,
        category,
        details.formatted_address.as_deref().unwrap_or(""),
        default_address,
        PLACES_SOURCE_ID,
    )?;

    let location = details.geometry.map(|g| g.location);
    Some(
        record
            .with_contact(details.formatted_phone_number, None, details.website)
            .with_location(location.map(|l| l.lat), location.map(|l| l.lng))
            .with_opening_hours(details.opening_hours.as_ref().map(convert_opening_hours)),
    )
}

/// Convert weekly periods into per-day hours; days without a period are closed.
pub fn convert_opening_hours(hours: &PlaceOpeningHours) -> OpeningHours {
    let mut converted: OpeningHours = DAY_NAMES
        .iter()
        .map(|day| (day.to_string(), DayHours::closed()))
        .collect();

    for period in &hours.periods {
        let Some(day) = DAY_NAMES.get(period.open.day) else {
            continue;
        };
        let close = period
            .close
            .as_ref()
            .map(|c| format_time(&c.time))
            .unwrap_or_else(|| "23:59".to_string());

        converted.insert(
            day.to_string(),
            DayHours::Open {
                open: format_time(&period.open.time),
                close,
            },
        );
    }

    // A single period without a close time means open around the clock.
    if let [period] = hours.periods.as_slice() {
        if period.close.is_none() {
            for day in DAY_NAMES {
                converted.insert(
                    day.to_string(),
                    DayHours::Open {
                        open: "00:00".to_string(),
                        close: "23:59".to_string(),
                    },
                );
            }
        }
    }

    converted
}

/// "0930" -> "09:30"; anything else is returned unchanged.
fn format_time(time: &str) -> String {
    if time.len() == 4 && time.chars().all(|c| c.is_ascii_digit()) {
        format!("{}:{}", &time[..2], &time[2..])
    } else {
        time.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> PlacesClient {
        let http = HttpClient::new("places-test", Duration::from_secs(5)).unwrap();
        PlacesClient::new(http, "test-key")
    }

    #[test]
    fn search_url_encodes_query() {
        let url = client().search_url("Food & Drink in Wellingborough, UK").unwrap();
        assert_eq!(url.path(), "/maps/api/place/textsearch/json");
        let params: std::collections::HashMap<_, _> = url.query_pairs().into_owned().collect();
        assert_eq!(params["query"], "Food & Drink in Wellingborough, UK");
        assert_eq!(params["key"], "test-key");
    }

    #[test]
    fn details_url_requests_fields() {
        let url = client().details_url("abc123").unwrap();
        assert_eq!(url.path(), "/maps/api/place/details/json");
        let params: std::collections::HashMap<_, _> = url.query_pairs().into_owned().collect();
        assert_eq!(params["place_id"], "abc123");
        assert!(params["fields"].contains("business_status"));
    }

    fn details(json: serde_json::Value) -> PlaceDetails {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn operational_place_becomes_record() {
        let place = details(serde_json::json!({
            "name": "Joe's Cafe",
            "formatted_address": "1 Market Square, Wellingborough NN8 1AA, UK",
            "formatted_phone_number": "01933 123456",
            "website": "https://joescafe.example/",
            "types": ["cafe", "food", "establishment"],
            "geometry": { "location": { "lat": 52.3, "lng": -0.69 } },
            "business_status": "OPERATIONAL",
            "opening_hours": { "periods": [
                { "open": { "day": 1, "time": "0800" }, "close": { "day": 1, "time": "1600" } }
            ]}
        }));

        let record = details_to_record(place, "Default").unwrap();
        assert_eq!(record.category, Category::FoodAndDrink);
        assert_eq!(record.source, PLACES_SOURCE_ID);
        assert_eq!(record.latitude, Some(52.3));
        assert_eq!(record.phone.as_deref(), Some("01933 123456"));

        let hours = record.opening_hours.unwrap();
        assert_eq!(
            hours["monday"],
            DayHours::Open {
                open: "08:00".to_string(),
                close: "16:00".to_string()
            }
        );
        assert_eq!(hours["sunday"], DayHours::closed());
    }

    #[test]
    fn closed_places_are_skipped() {
        let place = details(serde_json::json!({
            "name": "Old Mill Bakery",
            "types": ["bakery"],
            "business_status": "CLOSED_PERMANENTLY"
        }));
        assert!(details_to_record(place, "Default").is_none());
    }

    #[test]
    fn always_open_period() {
        let hours: PlaceOpeningHours = serde_json::from_value(serde_json::json!({
            "periods": [{ "open": { "day": 0, "time": "0000" } }]
        }))
        .unwrap();
        let converted = convert_opening_hours(&hours);
        assert_eq!(converted.len(), 7);
        assert!(converted
            .values()
            .all(|h| matches!(h, DayHours::Open { open, .. } if open == "00:00")));
    }
}
