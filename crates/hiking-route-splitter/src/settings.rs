use crate::error::AppError;
use clap::{Parser, ValueEnum};
use hiking_route_lib::{Projector, SplitConfig, TransverseMercator, WebMercator};
use std::path::PathBuf;

/// Output encoding of the split route
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Route JSON (`name`, `segments[].routePoint`, `segments[].latlngs`)
    Json,
    /// GPX 1.1: one track segment per split segment, one waypoint per marker
    Gpx,
}

/// Planar projection used to measure distances
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ProjectionKind {
    /// Israeli Transverse Mercator grid
    Itm,
    /// Universal Transverse Mercator, see --utm-zone
    Utm,
    /// Spherical Web Mercator (EPSG:3857)
    WebMercator,
}

#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
/// Hiking Route Splitter - Splits dense GPS tracks into a bounded number of marker segments
pub struct Settings {
    /// Route to split (.gpx or .json)
    #[clap(value_name = "INPUT")]
    pub input: PathBuf,

    /// Where to write the split route (stdout when omitted)
    #[clap(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Output format
    #[clap(short, long, value_enum, default_value = "json")]
    pub format: OutputFormat,

    /// Projection used for distance computations
    #[clap(long, value_enum, default_value = "itm")]
    pub projection: ProjectionKind,

    /// UTM zone (1-60), only used with --projection utm
    #[clap(long, default_value = "36", value_parser = clap::value_parser!(u8).range(1..=60))]
    pub utm_zone: u8,

    /// Use the southern hemisphere variant of the UTM zone
    #[clap(long, default_value = "false")]
    pub utm_south: bool,

    /// JSON file with split settings (minimalSegmentLength, maxSegmentsNumber,
    /// initialSimplificationTolerance)
    #[clap(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Shortest desired segment in meters (overrides the config file)
    #[clap(long)]
    pub minimal_segment_length: Option<f64>,

    /// Maximum number of simplified vertices (overrides the config file)
    #[clap(long)]
    pub max_segments: Option<usize>,

    /// First simplification tolerance in meters (overrides the config file)
    #[clap(long)]
    pub initial_tolerance: Option<f64>,
}

impl Settings {
    /// Parse from the command line, exiting with usage help on error
    pub fn from_cli() -> Self {
        match Settings::try_parse() {
            Ok(settings) => settings,
            Err(e) => e.exit(),
        }
    }

    /// Split configuration: defaults, then the config file, then flags
    pub fn split_config(&self) -> Result<SplitConfig, AppError> {
        let mut config = match &self.config {
            Some(path) => {
                let file = std::fs::File::open(path).map_err(|source| AppError::Io {
                    path: path.clone(),
                    source,
                })?;
                serde_json::from_reader(std::io::BufReader::new(file)).map_err(|source| {
                    AppError::Json {
                        path: path.clone(),
                        source,
                    }
                })?
            }
            None => SplitConfig::default(),
        };

        if let Some(length) = self.minimal_segment_length {
            config.minimal_segment_length = length;
        }
        if let Some(max_segments) = self.max_segments {
            config.max_segments_number = max_segments;
        }
        if let Some(tolerance) = self.initial_tolerance {
            config.initial_simplification_tolerance = tolerance;
        }

        config.validate()?;
        Ok(config)
    }

    /// Build the projector selected on the command line
    pub fn projector(&self) -> Box<dyn Projector> {
        match self.projection {
            ProjectionKind::Itm => Box::new(TransverseMercator::israel_grid()),
            ProjectionKind::Utm => match TransverseMercator::utm(self.utm_zone, !self.utm_south) {
                Some(utm) => Box::new(utm),
                None => {
                    // Unreachable through clap's range check
                    tracing::warn!("Invalid UTM zone {}, using the Israeli grid", self.utm_zone);
                    Box::new(TransverseMercator::israel_grid())
                }
            },
            ProjectionKind::WebMercator => Box::new(WebMercator),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn parse(args: &[&str]) -> Settings {
        let mut argv = vec!["hiking-route-splitter"];
        argv.extend_from_slice(args);
        Settings::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_defaults() {
        let settings = parse(&["track.gpx"]);
        assert_eq!(settings.input, PathBuf::from("track.gpx"));
        assert_eq!(settings.format, OutputFormat::Json);
        assert_eq!(settings.projection, ProjectionKind::Itm);
        assert!(settings.output.is_none());
        assert_eq!(settings.split_config().unwrap(), SplitConfig::default());
        assert_eq!(settings.projector().name(), "Israeli Transverse Mercator");
    }

    #[test]
    fn test_flags_override_defaults() {
        let settings = parse(&[
            "track.gpx",
            "--format",
            "gpx",
            "--projection",
            "web-mercator",
            "--minimal-segment-length",
            "250",
            "--max-segments",
            "12",
            "--initial-tolerance",
            "5",
        ]);
        let config = settings.split_config().unwrap();

        assert_eq!(settings.format, OutputFormat::Gpx);
        assert_eq!(settings.projector().name(), "Web Mercator");
        assert!((config.minimal_segment_length - 250.0).abs() < f64::EPSILON);
        assert_eq!(config.max_segments_number, 12);
        assert!((config.initial_simplification_tolerance - 5.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_config_file_is_overlaid_by_flags() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"minimalSegmentLength": 1000, "maxSegmentsNumber": 8, "initialSplitSimplificationDistanceTolerance": 20}}"#
        )
        .unwrap();
        let path = file.path().to_str().unwrap().to_string();

        let settings = parse(&["track.json", "--config", &path, "--max-segments", "4"]);
        let config = settings.split_config().unwrap();

        assert!((config.minimal_segment_length - 1000.0).abs() < f64::EPSILON);
        assert_eq!(config.max_segments_number, 4);
        assert!((config.initial_simplification_tolerance - 20.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let settings = parse(&["track.gpx", "--max-segments", "0"]);
        assert!(matches!(settings.split_config(), Err(AppError::Split(_))));

        let argv = ["hiking-route-splitter", "track.gpx", "--utm-zone", "61"];
        assert!(Settings::try_parse_from(argv).is_err());
    }

    #[test]
    fn test_utm_projection() {
        let settings = parse(&["track.gpx", "--projection", "utm", "--utm-zone", "36"]);
        let projector = settings.projector();
        assert_eq!(projector.name(), "UTM");
        let origin = projector.project(0.0, 33.0).unwrap();
        assert!((origin.x - 500_000.0).abs() < 1e-6);
    }
}
