//! Hiking Route Splitter - Command line front end
//!
//! Reads a GPX or JSON route, splits it into a bounded number of marker
//! segments and writes the result as JSON or GPX.

mod error;
mod io;
mod logging;
mod settings;

use error::AppError;
use hiking_route_lib::RouteSplitter;
use settings::Settings;

fn main() {
    logging::setup_logging();
    let settings = Settings::from_cli();

    if let Err(err) = run(&settings) {
        tracing::error!("{err}");
        std::process::exit(1);
    }
}

fn run(settings: &Settings) -> Result<(), AppError> {
    #[cfg(feature = "profiling")]
    profiling::scope!("main::run");

    let config = settings.split_config()?;
    let route = io::read_route(&settings.input)?;
    tracing::info!(
        "Loaded route {:?} with {} points from {}",
        route.name.as_deref().unwrap_or("unnamed"),
        route.total_points(),
        settings.input.display()
    );

    let splitter = RouteSplitter::new(settings.projector());
    let split = splitter.split(&route, &config)?;
    tracing::info!(
        "Split into {} segments (minimal length {} m, at most {} vertices)",
        split.simplified_segments().count(),
        config.minimal_segment_length,
        config.max_segments_number
    );

    io::write_route(&split, settings.output.as_deref(), settings.format)
}
