//! Providers command - show the fallback order.

use shiptracker::config::ConfigFile;

use crate::error::CliError;

/// Print the providers in the order they are tried.
pub fn run(config: &ConfigFile) -> Result<(), CliError> {
    let providers = config.provider_list()?;
    let source = if config.providers.entries.is_empty() {
        "built-in"
    } else {
        "config.ini"
    };

    println!("Map providers ({source}), tried in order:");
    println!();
    for (i, provider) in providers.iter().enumerate() {
        println!("  {}. {}", i + 1, provider.name());
        println!("     {}", provider.url_template());
        println!("     max zoom {}", provider.max_zoom());
    }
    println!();
    println!(
        "Zoom {}, per-provider timeout {}s",
        config.map.zoom,
        config.providers.timeout.as_secs()
    );
    Ok(())
}
