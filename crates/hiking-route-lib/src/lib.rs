//! Hiking Route Library - Adaptive Route Splitting
//!
//! This library reduces a dense GPS track into a short list of segments whose
//! boundaries are a simplified subset of the recorded points. The boundaries are
//! used as marker positions along a hiking route, so the number of segments is
//! bounded while the route keeps its overall shape.
//!
//! # Architecture
//!
//! - **[`Projector`]**: Geographic to planar conversion ([`TransverseMercator`], [`WebMercator`])
//! - **[`RouteSplitter`]**: Adaptive Douglas-Peucker search and segment reconstruction
//! - **[`Route`]** / **[`Segment`]** / **[`GeoPoint`]**: Route model, with GPX interop
//!
//! # Performance Characteristics
//!
//! - **Split Time**: O(R × N log N) where N=points, R=simplification rounds (logarithmic in tolerance)
//! - **Memory**: O(N) for the projected coordinates and the output segments
//! - **Batches**: [`RouteSplitter::split_all`] splits independent routes in parallel

mod point;
mod projection;
mod route;
mod segment;
mod splitter;

// Public API exports
pub use point::GeoPoint;
pub use projection::{
    Ellipsoid, ProjectionError, Projector, TransverseMercator, WebMercator,
};
pub use route::Route;
pub use segment::{Segment, SegmentKind};
pub use splitter::{RouteSplitter, SplitConfig, maximum_points};

/// Error types for route splitting
#[derive(Debug, thiserror::Error)]
pub enum SplitError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Projection error: {0}")]
    Projection(#[from] ProjectionError),

    #[error("Internal invariant violated: {0}")]
    InternalInvariant(String),

    #[error("GPX parsing error: {0}")]
    GpxParse(#[from] gpx::errors::GpxError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, SplitError>;
