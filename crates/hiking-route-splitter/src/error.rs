use hiking_route_lib::SplitError;
use std::path::PathBuf;

/// Failures of the command line front end
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Unsupported route format: {0} (expected .gpx or .json)")]
    UnsupportedFormat(PathBuf),

    #[error(transparent)]
    Split(#[from] SplitError),
}
