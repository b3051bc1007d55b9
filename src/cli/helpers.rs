//! Helper utilities for CLI commands.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};

use bizacquire::config::Settings;
use bizacquire::models::{BusinessRecord, Category};
use bizacquire::repository::{persist_records, DbPool, DieselBusinessStore, PersistReport};
use bizacquire::scrapers::{
    DirectFetcher, FetchStrategyResolver, HttpClient, RenderingFetcher,
};

use super::icons;

/// Truncate a string to a maximum length, adding "..." if truncated.
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Build the fetch resolver from settings.
///
/// Without a rendering credential, or with `direct_only`, every source is
/// fetched directly.
pub fn build_resolver(settings: &Settings, direct_only: bool) -> anyhow::Result<FetchStrategyResolver> {
    let mut builder = HttpClient::builder("direct", settings.request_timeout());
    if let Some(ref user_agent) = settings.user_agent {
        builder = builder.user_agent(user_agent);
    }
    let direct = Arc::new(DirectFetcher::new(builder.build()?));

    match settings.rendering_api_key.as_deref() {
        Some(api_key) if !direct_only => {
            let options = settings.render_options();
            let client = HttpClient::new("rendering", options.timeout)?;
            let rendered = Arc::new(RenderingFetcher::new(
                client,
                &settings.rendering_endpoint,
                api_key,
                options,
            ));
            Ok(FetchStrategyResolver::with_rendering(rendered, direct))
        }
        _ => {
            if !direct_only {
                warn!("No rendering credential configured; fetching every source directly");
            }
            Ok(FetchStrategyResolver::direct_only(direct))
        }
    }
}

/// Open the SQLite store, creating the schema if needed.
pub async fn open_store(settings: &Settings) -> anyhow::Result<DieselBusinessStore> {
    settings.ensure_directories()?;
    let store = DieselBusinessStore::new(DbPool::sqlite_from_path(&settings.database_path()));
    store.init_schema().await?;
    Ok(store)
}

/// Export path: the explicit one, or a timestamped file in the exports dir.
pub fn export_path(settings: &Settings, output: Option<&Path>, prefix: &str) -> PathBuf {
    match output {
        Some(path) => path.to_path_buf(),
        None => settings.exports_dir().join(format!(
            "{}-{}.csv",
            prefix,
            Utc::now().format("%Y%m%d-%H%M%S")
        )),
    }
}

/// Set `stop` when Ctrl-C is pressed.
pub fn stop_on_ctrl_c(stop: Arc<AtomicBool>) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            println!(
                "\n{} Stopping after the current source...",
                icons::warn()
            );
            stop.store(true, Ordering::SeqCst);
        }
    });
}

/// Persist records and print the counts.
pub async fn persist_and_report(
    settings: &Settings,
    records: &[BusinessRecord],
) -> anyhow::Result<PersistReport> {
    let store = open_store(settings).await?;
    let report = persist_records(&store, records).await;
    info!("Persisted {} record(s)", report.total());

    println!(
        "{} Imported: {} created, {} skipped as duplicates, {} failed",
        if report.failed == 0 {
            icons::success()
        } else {
            icons::warn()
        },
        report.created,
        report.skipped,
        report.failed
    );
    Ok(report)
}

/// Print per-category record counts.
pub fn print_category_summary<'a>(summary: impl IntoIterator<Item = (&'a Category, &'a usize)>) {
    for (category, count) in summary {
        println!("  {:<24} {}", category.as_str(), count);
    }
}
