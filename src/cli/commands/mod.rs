//! CLI commands implementation.
//!
//! This module contains the CLI parser and dispatches to command-specific modules.

mod import;
mod init;
mod places;
mod scrape;
mod source;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use bizacquire::config::{load_settings_with_options, LoadOptions};

#[derive(Parser)]
#[command(name = "biz")]
#[command(about = "Local business directory acquisition")]
#[command(version)]
pub struct Cli {
    /// Data directory (overrides config file and BIZ_DATA_DIR)
    #[arg(long, short = 'd', global = true)]
    data: Option<PathBuf>,

    /// Config file path (overrides auto-discovery)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Check if verbose mode is enabled (for early logging setup).
pub fn is_verbose() -> bool {
    std::env::args().any(|arg| arg == "-v" || arg == "--verbose")
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the data directory and database
    Init,

    /// Inspect configured directories
    Source {
        #[command(subcommand)]
        command: SourceCommands,
    },

    /// Scrape one or more directories and export the results
    Scrape {
        /// Source IDs to scrape (can specify multiple, or use --all)
        source_ids: Vec<String>,
        /// Scrape all enabled sources
        #[arg(short, long)]
        all: bool,
        /// Export file (default: timestamped file in the exports directory)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Also persist the results to the database
        #[arg(long)]
        import: bool,
    },

    /// Scrape a single directory with a direct fetch and summarize by category
    Probe {
        /// Source ID to probe
        source_id: String,
        /// Also persist the results to the database
        #[arg(long)]
        import: bool,
    },

    /// Collect businesses from the places API
    Places {
        /// Area to search (default from config)
        #[arg(short, long)]
        location: Option<String>,
        /// Export file (default: timestamped file in the exports directory)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Also persist the results to the database
        #[arg(long)]
        import: bool,
    },

    /// Persist a reviewed export file
    Import {
        /// CSV file to import
        file: PathBuf,
    },

    /// Export stored businesses
    Export {
        /// Export file (default: timestamped file in the exports directory)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
enum SourceCommands {
    /// List configured sources
    List,
}

pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let options = LoadOptions {
        config_path: cli.config,
        data_dir: cli.data,
    };
    let (settings, _config) = load_settings_with_options(options).await;

    match cli.command {
        Commands::Init => init::cmd_init(&settings).await,
        Commands::Source { command } => match command {
            SourceCommands::List => source::cmd_source_list(&settings),
        },
        Commands::Scrape {
            source_ids,
            all,
            output,
            import,
        } => scrape::cmd_scrape(&settings, &source_ids, all, output.as_deref(), import).await,
        Commands::Probe { source_id, import } => {
            scrape::cmd_probe(&settings, &source_id, import).await
        }
        Commands::Places {
            location,
            output,
            import,
        } => places::cmd_places(&settings, location.as_deref(), output.as_deref(), import).await,
        Commands::Import { file } => import::cmd_import(&settings, &file).await,
        Commands::Export { output } => import::cmd_export(&settings, output.as_deref()).await,
    }
}
