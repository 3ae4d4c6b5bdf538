//! Render command - draw one full display frame to a file.

use std::path::PathBuf;

use shiptracker::display::DisplayAssembler;
use shiptracker::provider::ReqwestClient;
use shiptracker::vessel::{VesselClient, VesselData};
use tokio_util::sync::CancellationToken;

use super::common::{display_frame, explicit_position, write_bitmap, OutputFormat};
use crate::error::CliError;
use crate::runner::CliRunner;

/// Arguments for the render command.
pub struct RenderArgs {
    pub output: PathBuf,
    pub format: Option<OutputFormat>,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
}

enum Source {
    Manual(VesselData),
    Api(VesselClient<ReqwestClient>),
}

/// Run the render command.
pub fn run(runner: &CliRunner, args: RenderArgs) -> Result<(), CliError> {
    runner.log_startup("render");
    let config = runner.config();
    let format = OutputFormat::resolve(args.format, &args.output)?;
    let assembler = DisplayAssembler::new(config.display.width, config.display.height)?;
    let renderer = runner.map_renderer(&runner.map_config()?)?;

    // --lat/--lon skip the vessel API entirely
    let source = match explicit_position(args.lat, args.lon)? {
        Some(position) => Source::Manual(VesselData::at_position(position, &config.vessel.mmsi)),
        None => Source::Api(runner.vessel_client()?),
    };

    let runtime = runner.runtime()?;
    let (frame, map) = runtime.block_on(async {
        let (vessel, last_update) = match source {
            Source::Manual(vessel) => (Ok(vessel), None),
            Source::Api(client) => (client.current().await, client.last_update()),
        };
        display_frame(&assembler, &renderer, vessel, last_update, &CancellationToken::new()).await
    });

    write_bitmap(&frame, &args.output, Some(format))?;

    println!(
        "Wrote {}x{} frame to {}",
        frame.width(),
        frame.height(),
        args.output.display()
    );
    match map {
        Some(map) => println!("Map source: {}", map.source),
        None => println!("Map source: none (vessel data unavailable)"),
    }
    Ok(())
}
