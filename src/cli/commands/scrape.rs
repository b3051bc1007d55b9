//! Scrape and probe commands.

use std::path::Path;

use console::style;

use bizacquire::config::Settings;
use bizacquire::export::write_csv;
use bizacquire::models::SourceDefinition;
use bizacquire::scrapers::{Pipeline, RunReport, RunState};

use crate::cli::helpers::{
    build_resolver, export_path, persist_and_report, print_category_summary, stop_on_ctrl_c,
};
use crate::cli::icons;

/// Resolve requested source IDs; all enabled sources when none are named.
fn select_sources(
    settings: &Settings,
    source_ids: &[String],
    all: bool,
) -> anyhow::Result<Vec<SourceDefinition>> {
    if all || source_ids.is_empty() {
        return Ok(settings.enabled_sources());
    }

    source_ids
        .iter()
        .map(|id| {
            settings.source(id).cloned().ok_or_else(|| {
                anyhow::anyhow!("Source '{}' not found (see 'biz source list')", id)
            })
        })
        .collect()
}

fn print_outcomes(report: &RunReport) {
    for outcome in &report.sources {
        match (&outcome.error, outcome.strategy) {
            (None, strategy) => println!(
                "  {} {:<24} {} record(s) via {}",
                icons::success(),
                outcome.source_id,
                outcome.records,
                strategy.map(|s| s.as_str()).unwrap_or("-")
            ),
            (Some(error), _) => println!(
                "  {} {:<24} {}",
                icons::error(),
                outcome.source_id,
                style(error).red()
            ),
        }
    }
    if report.stopped_early {
        println!("{} Run stopped before every source was tried", icons::warn());
    }
}

/// Run the pipeline over the selected sources and export the aggregate.
pub async fn cmd_scrape(
    settings: &Settings,
    source_ids: &[String],
    all: bool,
    output: Option<&Path>,
    import: bool,
) -> anyhow::Result<()> {
    let sources = select_sources(settings, source_ids, all)?;
    if sources.is_empty() {
        println!("{} No enabled sources to scrape", icons::warn());
        return Ok(());
    }

    let resolver = build_resolver(settings, false)?;
    println!(
        "{} Scraping {} source(s){}",
        icons::info(),
        sources.len(),
        if resolver.has_rendering() {
            ""
        } else {
            " (direct fetch only)"
        }
    );

    // Named sources run even when disabled in config.
    let sources = sources
        .into_iter()
        .map(|mut s| {
            s.enabled = true;
            s
        })
        .collect();

    let mut pipeline = Pipeline::new(resolver, sources, &settings.default_locality)
        .with_politeness(settings.politeness());
    stop_on_ctrl_c(pipeline.stop_handle());
    let report = pipeline.run().await;

    print_outcomes(&report);
    finish(settings, &report, output, "scrape", import).await?;

    if report.state == RunState::PartiallyFailed {
        println!(
            "{} {} source(s) failed",
            icons::warn(),
            report.failed_sources().count()
        );
    }
    Ok(())
}

/// Scrape a single source with a direct fetch and summarize it by category.
pub async fn cmd_probe(settings: &Settings, source_id: &str, import: bool) -> anyhow::Result<()> {
    let mut source = settings
        .source(source_id)
        .cloned()
        .ok_or_else(|| anyhow::anyhow!("Source '{}' not found", source_id))?;
    source.enabled = true;

    println!(
        "{} Probing {} ({})",
        icons::info(),
        style(&source.name).bold(),
        source.url
    );

    let resolver = build_resolver(settings, true)?;
    let mut pipeline = Pipeline::new(resolver, vec![source], &settings.default_locality);
    let report = pipeline.run().await;

    print_outcomes(&report);
    if report.records.is_empty() {
        return Ok(());
    }

    println!("\n{}", style("Businesses by category").bold());
    print_category_summary(&report.category_summary());

    finish(settings, &report, None, source_id, import).await
}

async fn finish(
    settings: &Settings,
    report: &RunReport,
    output: Option<&Path>,
    prefix: &str,
    import: bool,
) -> anyhow::Result<()> {
    if report.records.is_empty() {
        println!("{} No businesses found", icons::warn());
        return Ok(());
    }

    let path = export_path(settings, output, prefix);
    write_csv(&path, &report.records)?;
    println!(
        "{} Exported {} business(es) to {}",
        icons::success(),
        report.records.len(),
        path.display()
    );

    if import {
        persist_and_report(settings, &report.records).await?;
    }
    Ok(())
}
