//! Source listing command.

use console::style;

use bizacquire::config::Settings;

use crate::cli::helpers::truncate;
use crate::cli::icons;

/// List configured sources.
pub fn cmd_source_list(settings: &Settings) -> anyhow::Result<()> {
    if settings.sources.is_empty() {
        println!("{} No sources configured.", icons::warn());
        return Ok(());
    }

    println!("\n{}", style("Business Directories").bold());
    println!("{}", "-".repeat(72));
    println!(
        "{:<24} {:<26} {:<9} {:<8} Render",
        "ID", "Name", "Parser", "Enabled"
    );
    println!("{}", "-".repeat(72));

    for source in &settings.sources {
        println!(
            "{:<24} {:<26} {:<9} {:<8} {}",
            truncate(&source.id, 23),
            truncate(&source.name, 25),
            source.parser.as_str(),
            if source.enabled { "yes" } else { "no" },
            if source.requires_rendered_fetch { "yes" } else { "no" }
        );
    }

    Ok(())
}
