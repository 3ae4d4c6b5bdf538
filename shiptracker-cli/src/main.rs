//! Shiptracker CLI - command-line interface
//!
//! Renders a tracked vessel onto a 1-bit map frame, either once to a file
//! or continuously over HTTP for an e-ink display to poll.

mod commands;
mod error;
mod runner;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use shiptracker::config::{config_file_path, ConfigFile};

use commands::common::OutputFormat;
use commands::config::ConfigCommands;
use commands::map::MapArgs;
use commands::render::RenderArgs;
use commands::serve::ServeArgs;
use error::CliError;
use runner::CliRunner;

#[derive(Parser)]
#[command(name = "shiptracker")]
#[command(version = shiptracker::VERSION)]
#[command(about = "Renders a vessel's live position onto a monochrome map for e-ink displays")]
struct Cli {
    /// Config file (default: ~/.shiptracker/config.ini)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log filter, e.g. "debug" or "shiptracker=trace" (overrides config)
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a config file with defaults and the built-in providers
    Init,

    /// View or change configuration settings
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// List map providers in fallback order
    Providers,

    /// Render a full display frame to a file
    Render {
        /// Output file (.bmp or .png)
        #[arg(short, long, default_value = "display.bmp")]
        output: PathBuf,

        /// Output format (default: from the file extension)
        #[arg(long, value_enum)]
        format: Option<OutputFormat>,

        /// Latitude; with --lon, skips the vessel API
        #[arg(long, allow_hyphen_values = true)]
        lat: Option<f64>,

        /// Longitude; with --lat, skips the vessel API
        #[arg(long, allow_hyphen_values = true)]
        lon: Option<f64>,
    },

    /// Render only the map for a position
    Map {
        /// Output file (.bmp or .png)
        #[arg(short, long, default_value = "map.png")]
        output: PathBuf,

        /// Output format (default: from the file extension)
        #[arg(long, value_enum)]
        format: Option<OutputFormat>,

        /// Latitude (default: vessel position)
        #[arg(long, allow_hyphen_values = true)]
        lat: Option<f64>,

        /// Longitude (default: vessel position)
        #[arg(long, allow_hyphen_values = true)]
        lon: Option<f64>,

        /// Map width in pixels
        #[arg(long)]
        width: Option<u32>,

        /// Map height in pixels
        #[arg(long)]
        height: Option<u32>,

        /// Tile zoom level
        #[arg(long)]
        zoom: Option<u8>,
    },

    /// Serve frames over HTTP
    Serve {
        /// Listen address (default: from config)
        #[arg(long)]
        host: Option<String>,

        /// Listen port (default: from config)
        #[arg(short, long)]
        port: Option<u16>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    let config_path = cli.config.clone().unwrap_or_else(config_file_path);

    match cli.command {
        Commands::Init => commands::init::run(&config_path),
        Commands::Config { command } => commands::config::run(command, &config_path),
        Commands::Providers => {
            let mut config = ConfigFile::load_from(&config_path)?;
            config.apply_env_with(|name| std::env::var(name).ok());
            commands::providers::run(&config)
        }
        Commands::Render {
            output,
            format,
            lat,
            lon,
        } => {
            let runner = CliRunner::new(Some(&config_path), cli.log_level.as_deref())?;
            commands::render::run(
                &runner,
                RenderArgs {
                    output,
                    format,
                    lat,
                    lon,
                },
            )
        }
        Commands::Map {
            output,
            format,
            lat,
            lon,
            width,
            height,
            zoom,
        } => {
            let runner = CliRunner::new(Some(&config_path), cli.log_level.as_deref())?;
            commands::map::run(
                &runner,
                MapArgs {
                    output,
                    format,
                    lat,
                    lon,
                    width,
                    height,
                    zoom,
                },
            )
        }
        Commands::Serve { host, port } => {
            let runner = CliRunner::new(Some(&config_path), cli.log_level.as_deref())?;
            commands::serve::run(&runner, ServeArgs { host, port })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_render_with_negative_coordinates() {
        let cli = Cli::try_parse_from([
            "shiptracker", "render", "--lat", "-33.8568", "--lon", "151.2153", "-o", "out.png",
        ])
        .unwrap();
        match cli.command {
            Commands::Render { lat, lon, output, .. } => {
                assert_eq!(lat, Some(-33.8568));
                assert_eq!(lon, Some(151.2153));
                assert_eq!(output, PathBuf::from("out.png"));
            }
            _ => panic!("expected render"),
        }
    }

    #[test]
    fn test_global_config_flag() {
        let cli =
            Cli::try_parse_from(["shiptracker", "providers", "--config", "/tmp/x.ini"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/x.ini")));
    }
}
