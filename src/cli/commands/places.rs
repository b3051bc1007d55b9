//! Places API command.

use std::path::Path;

use bizacquire::config::{Settings, PLACES_API_KEY_ENV};
use bizacquire::export::write_csv;
use bizacquire::scrapers::{summarize_categories, HttpClient, PlacesClient};

use crate::cli::helpers::{export_path, persist_and_report, print_category_summary};
use crate::cli::icons;

/// Collect businesses from the places API.
pub async fn cmd_places(
    settings: &Settings,
    location: Option<&str>,
    output: Option<&Path>,
    import: bool,
) -> anyhow::Result<()> {
    let Some(ref api_key) = settings.places_api_key else {
        println!("{} {} is not set", icons::error(), PLACES_API_KEY_ENV);
        return Ok(());
    };

    let location = location.unwrap_or(&settings.places_location);
    println!("{} Searching places in {}", icons::info(), location);

    let client = PlacesClient::new(HttpClient::new("places", settings.request_timeout())?, api_key);
    let records = client.collect(location, &settings.default_locality).await;

    if records.is_empty() {
        println!("{} No places found", icons::warn());
        return Ok(());
    }

    print_category_summary(&summarize_categories(&records));

    let path = export_path(settings, output, "places");
    write_csv(&path, &records)?;
    println!(
        "{} Exported {} business(es) to {}",
        icons::success(),
        records.len(),
        path.display()
    );

    if import {
        persist_and_report(settings, &records).await?;
    }
    Ok(())
}
