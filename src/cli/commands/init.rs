//! Initialize command.

use bizacquire::config::Settings;

use crate::cli::helpers::open_store;
use crate::cli::icons;

/// Initialize the data directory and database.
pub async fn cmd_init(settings: &Settings) -> anyhow::Result<()> {
    let store = open_store(settings).await?;
    let existing = store.count().await?;

    println!(
        "{} Initialized bizacquire in {}",
        icons::success(),
        settings.data_dir.display()
    );
    println!("  Database: {}", settings.database_path().display());
    if existing > 0 {
        println!("  {} business(es) already stored", existing);
    }

    if settings.rendering_api_key.is_none() {
        println!(
            "{} {} is not set; sources will be fetched directly",
            icons::warn(),
            bizacquire::config::RENDERING_API_KEY_ENV
        );
    }

    Ok(())
}
