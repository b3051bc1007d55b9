//! Resolved runtime settings.

use std::env;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use crate::models::SourceDefinition;
use crate::scrapers::{PolitenessConfig, RenderOptions, DEFAULT_RENDER_ENDPOINT};
use crate::scrapers::places::DEFAULT_PLACES_LOCATION;

/// Default database filename.
pub const DEFAULT_DATABASE_FILENAME: &str = "bizacquire.db";

/// Generic locality used when no address can be extracted.
pub const DEFAULT_LOCALITY: &str = "Wellingborough, Northamptonshire";

/// Exports subdirectory name.
const EXPORTS_SUBDIR: &str = "exports";

/// Managed rendering credential. Without it every source is fetched directly.
pub const RENDERING_API_KEY_ENV: &str = "SCRAPINGBEE_API_KEY";
pub const PLACES_API_KEY_ENV: &str = "GOOGLE_PLACES_API_KEY";
pub const DATA_DIR_ENV: &str = "BIZ_DATA_DIR";

fn non_empty_env(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// Application settings.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Base data directory.
    pub data_dir: PathBuf,
    /// Database filename, relative to `data_dir`.
    pub database_filename: String,
    /// User agent config value for direct fetches.
    pub user_agent: Option<String>,
    /// Direct fetch timeout in seconds.
    pub request_timeout: u64,
    /// Rendered fetch timeout in seconds.
    pub rendered_timeout: u64,
    /// Delay after a directly fetched source, in milliseconds.
    pub politeness_delay_ms: u64,
    /// Delay after a rendered source, in milliseconds.
    pub rendered_delay_ms: u64,
    pub default_locality: String,
    pub rendering_endpoint: String,
    pub rendering_wait_ms: u64,
    pub rendering_api_key: Option<String>,
    pub places_api_key: Option<String>,
    pub places_location: String,
    pub sources: Vec<SourceDefinition>,
}

impl Default for Settings {
    fn default() -> Self {
        // Falls back: BIZ_DATA_DIR -> local data dir -> home dir -> current dir
        let data_dir = non_empty_env(DATA_DIR_ENV)
            .map(|d| PathBuf::from(shellexpand::tilde(&d).as_ref()))
            .unwrap_or_else(|| {
                dirs::data_local_dir()
                    .or_else(dirs::home_dir)
                    .unwrap_or_else(|| PathBuf::from("."))
                    .join("bizacquire")
            });

        Self {
            data_dir,
            database_filename: DEFAULT_DATABASE_FILENAME.to_string(),
            user_agent: None,
            request_timeout: 30,
            rendered_timeout: 45,
            politeness_delay_ms: 1000,
            rendered_delay_ms: 3000,
            default_locality: DEFAULT_LOCALITY.to_string(),
            rendering_endpoint: DEFAULT_RENDER_ENDPOINT.to_string(),
            rendering_wait_ms: 3000,
            rendering_api_key: non_empty_env(RENDERING_API_KEY_ENV),
            places_api_key: non_empty_env(PLACES_API_KEY_ENV),
            places_location: DEFAULT_PLACES_LOCATION.to_string(),
            sources: SourceDefinition::builtin(),
        }
    }
}

impl Settings {
    /// Create settings with a custom data directory.
    pub fn with_data_dir(data_dir: PathBuf) -> Self {
        Self {
            data_dir,
            ..Default::default()
        }
    }

    /// Full path to the SQLite database.
    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join(&self.database_filename)
    }

    pub fn database_exists(&self) -> bool {
        self.database_path().exists()
    }

    /// Default directory for exported files.
    pub fn exports_dir(&self) -> PathBuf {
        self.data_dir.join(EXPORTS_SUBDIR)
    }

    /// Ensure all directories exist.
    pub fn ensure_directories(&self) -> std::io::Result<()> {
        for (dir, label) in [(&self.data_dir, "data"), (&self.exports_dir(), "exports")] {
            fs::create_dir_all(dir).map_err(|e| {
                std::io::Error::new(
                    e.kind(),
                    format!(
                        "Failed to create {} directory '{}': {}",
                        label,
                        dir.display(),
                        e
                    ),
                )
            })?;
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout)
    }

    pub fn politeness(&self) -> PolitenessConfig {
        PolitenessConfig {
            direct_delay: Duration::from_millis(self.politeness_delay_ms),
            rendered_delay: Duration::from_millis(self.rendered_delay_ms),
        }
    }

    pub fn render_options(&self) -> RenderOptions {
        RenderOptions {
            wait_ms: self.rendering_wait_ms,
            timeout: Duration::from_secs(self.rendered_timeout),
            ..Default::default()
        }
    }

    pub fn source(&self, id: &str) -> Option<&SourceDefinition> {
        self.sources.iter().find(|s| s.id == id)
    }

    pub fn enabled_sources(&self) -> Vec<SourceDefinition> {
        self.sources.iter().filter(|s| s.enabled).cloned().collect()
    }
}
