//! Reading and writing route files

use crate::error::AppError;
use crate::settings::OutputFormat;
use hiking_route_lib::Route;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

/// Placeholder path used in errors when writing to stdout
const STDOUT_PATH: &str = "<stdout>";

/// Read a route, choosing the parser from the file extension
pub fn read_route(path: &Path) -> Result<Route, AppError> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    if !matches!(extension.as_deref(), Some("gpx") | Some("json")) {
        return Err(AppError::UnsupportedFormat(path.to_path_buf()));
    }

    let file = File::open(path).map_err(|source| AppError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let reader = BufReader::new(file);

    let route = match extension.as_deref() {
        Some("gpx") => Route::read_gpx(reader)?,
        _ => serde_json::from_reader(reader).map_err(|source| AppError::Json {
            path: path.to_path_buf(),
            source,
        })?,
    };
    tracing::debug!("Read {} segments from {}", route.segments.len(), path.display());
    Ok(route)
}

/// Write a route to `output`, or to stdout when `None`
pub fn write_route(
    route: &Route,
    output: Option<&Path>,
    format: OutputFormat,
) -> Result<(), AppError> {
    let target = output.map_or_else(|| PathBuf::from(STDOUT_PATH), Path::to_path_buf);
    let io_error = |source: std::io::Error| AppError::Io {
        path: target.clone(),
        source,
    };

    let writer: Box<dyn Write> = match output {
        Some(path) => Box::new(File::create(path).map_err(io_error)?),
        None => Box::new(std::io::stdout().lock()),
    };
    let mut writer = BufWriter::new(writer);

    match format {
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut writer, route).map_err(|source| AppError::Json {
                path: target.clone(),
                source,
            })?;
            writeln!(writer).map_err(io_error)?;
        }
        OutputFormat::Gpx => route.write_gpx(&mut writer)?,
    }
    writer.flush().map_err(io_error)?;
    Ok(())
}
