//! Import and export of reviewed CSV files.

use std::path::Path;

use bizacquire::config::Settings;
use bizacquire::export::{read_csv, write_csv};
use bizacquire::models::BusinessRecord;

use crate::cli::helpers::{export_path, open_store, persist_and_report};
use crate::cli::icons;

/// Persist a reviewed export file.
pub async fn cmd_import(settings: &Settings, file: &Path) -> anyhow::Result<()> {
    if !file.exists() {
        println!("{} File not found: {}", icons::error(), file.display());
        return Ok(());
    }

    let records = read_csv(file, &settings.default_locality)?;
    println!(
        "{} Read {} business(es) from {}",
        icons::info(),
        records.len(),
        file.display()
    );
    if records.is_empty() {
        return Ok(());
    }

    persist_and_report(settings, &records).await?;
    Ok(())
}

/// Export stored businesses.
pub async fn cmd_export(settings: &Settings, output: Option<&Path>) -> anyhow::Result<()> {
    let store = open_store(settings).await?;
    let records: Vec<BusinessRecord> = store
        .list_all()
        .await?
        .into_iter()
        .map(|stored| stored.record)
        .collect();

    if records.is_empty() {
        println!("{} No businesses stored yet", icons::warn());
        return Ok(());
    }

    let path = export_path(settings, output, "businesses");
    write_csv(&path, &records)?;
    println!(
        "{} Exported {} business(es) to {}",
        icons::success(),
        records.len(),
        path.display()
    );
    Ok(())
}
