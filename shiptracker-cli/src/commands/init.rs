//! Init command - write a config file with every setting spelled out.

use std::path::Path;

use shiptracker::config::ConfigFile;
use shiptracker::provider::BUILTIN_PROVIDERS;

use crate::error::CliError;

/// Run the init command.
///
/// Existing values are kept. An empty provider list is filled with the
/// built-in providers so the order can be edited in place.
pub fn run(path: &Path) -> Result<(), CliError> {
    let existed = path.exists();
    let mut config = ConfigFile::load_from(path)?;
    if config.providers.entries.is_empty() {
        config.providers.entries = BUILTIN_PROVIDERS
            .iter()
            .map(|(name, url)| (name.to_string(), url.to_string()))
            .collect();
    }
    config.save_to(path)?;

    if existed {
        println!("Updated configuration file: {}", path.display());
    } else {
        println!("Created configuration file: {}", path.display());
    }
    println!();
    if config.vessel.api_key.is_none() {
        println!("Set api_key in [vessel] (or VESSELFINDER_API_KEY) before rendering.");
    }
    println!("Edit this file to customize Shiptracker settings.");
    println!("CLI arguments override config file values when specified.");
    Ok(())
}
