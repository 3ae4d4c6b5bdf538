//! Map command - render only the map for a position.

use std::path::PathBuf;

use shiptracker::map::TargetSize;

use super::common::{explicit_position, write_bitmap, OutputFormat};
use crate::error::CliError;
use crate::runner::CliRunner;

/// Arguments for the map command.
pub struct MapArgs {
    pub output: PathBuf,
    pub format: Option<OutputFormat>,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub zoom: Option<u8>,
}

/// Run the map command.
pub fn run(runner: &CliRunner, args: MapArgs) -> Result<(), CliError> {
    runner.log_startup("map");
    let format = OutputFormat::resolve(args.format, &args.output)?;

    // CLI takes precedence, then config
    let mut map_config = runner.map_config()?;
    if let Some(zoom) = args.zoom {
        map_config.zoom = zoom;
    }
    let target = TargetSize::new(
        args.width.unwrap_or(map_config.target.width()),
        args.height.unwrap_or(map_config.target.height()),
    );
    let renderer = runner.map_renderer(&map_config)?;

    let position = explicit_position(args.lat, args.lon)?;
    let vessel_client = match position {
        Some(_) => None,
        None => Some(runner.vessel_client()?),
    };

    let runtime = runner.runtime()?;
    let map = runtime.block_on(async {
        let position = match (position, vessel_client) {
            (Some(position), _) => position,
            (None, Some(client)) => client.current().await?.position()?,
            (None, None) => {
                return Err(CliError::Config("no position to render".to_string()));
            }
        };
        Ok::<_, CliError>(renderer.render(position, target).await)
    })?;

    write_bitmap(&map.bitmap, &args.output, Some(format))?;

    println!("Map {} written to {}", target, args.output.display());
    println!("Source: {}", map.source);
    for attempt in &map.attempts {
        let ms = attempt.elapsed.as_millis();
        match &attempt.error {
            None => println!("  {:<24} ok      {:>6} ms", attempt.provider, ms),
            Some(e) => println!("  {:<24} failed  {:>6} ms  {}", attempt.provider, ms, e),
        }
    }
    Ok(())
}
