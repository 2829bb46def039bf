//! Route splitting by adaptive Douglas-Peucker simplification
//!
//! The route is projected to planar meters, then simplified with a tolerance
//! that doubles until at most [`maximum_points`] vertices survive. The kept
//! vertices are carried as indices into the original point list, so the output
//! segments are cut from the untouched geographic points.

use crate::{GeoPoint, Projector, Result, Route, Segment, SplitError, TransverseMercator};
use geo::{Distance, Euclidean, LineString, SimplifyIdx};
use rayon::prelude::*;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Upper bound on tolerance doublings before the search is declared broken
pub const MAX_SIMPLIFICATION_ROUNDS: u32 = 256;

/// Tuning of the split: how long segments should be and how many there may be
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase", default))]
pub struct SplitConfig {
    /// Shortest desired segment, in projected meters. Short routes get fewer
    /// segments so that they stay at least this long on average.
    pub minimal_segment_length: f64,
    /// Upper bound on the number of simplified vertices
    pub max_segments_number: usize,
    /// Tolerance of the first simplification round, in projected meters
    #[cfg_attr(
        feature = "serde",
        serde(alias = "initialSplitSimplificationDistanceTolerance")
    )]
    pub initial_simplification_tolerance: f64,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            minimal_segment_length: 500.0,
            max_segments_number: 40,
            initial_simplification_tolerance: 50.0,
        }
    }
}

impl SplitConfig {
    /// Check that lengths are positive and finite and the segment cap is non-zero
    pub fn validate(&self) -> Result<()> {
        if !(self.minimal_segment_length.is_finite() && self.minimal_segment_length > 0.0) {
            return Err(SplitError::InvalidInput(format!(
                "Minimal segment length must be positive, got {}",
                self.minimal_segment_length
            )));
        }
        if self.max_segments_number == 0 {
            return Err(SplitError::InvalidInput(
                "Maximum number of segments must be at least 1".to_string(),
            ));
        }
        if !(self.initial_simplification_tolerance.is_finite()
            && self.initial_simplification_tolerance > 0.0)
        {
            return Err(SplitError::InvalidInput(format!(
                "Initial simplification tolerance must be positive, got {}",
                self.initial_simplification_tolerance
            )));
        }
        Ok(())
    }
}

/// Maximum number of simplified vertices for a planar route of `length`
///
/// `max(3, min(floor(length / minimal_segment_length), max_segments_number))`
#[inline]
pub fn maximum_points(length: f64, config: &SplitConfig) -> usize {
    // `as` saturates, so huge ratios clamp to usize::MAX and NaN becomes 0
    let by_length = (length / config.minimal_segment_length).floor() as usize;
    by_length.min(config.max_segments_number).max(3)
}

/// Splits routes into marker segments using an injected projection
#[derive(Debug, Clone, Default)]
pub struct RouteSplitter<P = TransverseMercator> {
    projector: P,
}

#[cfg_attr(feature = "profiling", profiling::all_functions)]
impl<P: Projector> RouteSplitter<P> {
    pub fn new(projector: P) -> Self {
        Self { projector }
    }

    #[inline]
    pub fn projector(&self) -> &P {
        &self.projector
    }

    /// Split a route into an anchor segment followed by simplified segments
    ///
    /// # Arguments
    /// * `route` - Input route; its segments are flattened (see [`Route::flattened_points`])
    /// * `config` - Segment length, segment count and tolerance settings
    ///
    /// # Returns
    /// A new route named like the input whose first segment is the start
    /// anchor, followed by at most `maximum_points - 1` simplified segments
    /// that share their boundary points.
    ///
    /// # Errors
    /// * [`SplitError::InvalidInput`] for fewer than 2 points or an invalid config
    /// * [`SplitError::Projection`] if a point is outside the projection's domain
    /// * [`SplitError::InternalInvariant`] if the simplification search misbehaves
    pub fn split(&self, route: &Route, config: &SplitConfig) -> Result<Route> {
        #[cfg(feature = "profiling")]
        profiling::scope!("splitter::split");

        config.validate()?;
        let points = route.flattened_points();
        if points.len() < 2 {
            return Err(SplitError::InvalidInput(format!(
                "A route needs at least 2 points to be split, got {}",
                points.len()
            )));
        }

        let line = LineString::from(self.projector.to_planar(&points)?);
        let length = planar_length(&line);
        let max_points = maximum_points(length, config);
        let kept = simplify_to_at_most(&line, max_points, config.initial_simplification_tolerance)?;

        let segments = build_segments(&points, &kept)?;
        tracing::debug!(
            "Split {} points ({:.0} m, {}) into {} segments (limit {})",
            points.len(),
            length,
            self.projector.name(),
            segments.len(),
            max_points
        );

        Ok(Route {
            name: route.name.clone(),
            segments,
        })
    }

    /// Split independent routes in parallel, preserving input order
    pub fn split_all(&self, routes: &[Route], config: &SplitConfig) -> Vec<Result<Route>> {
        #[cfg(feature = "profiling")]
        profiling::scope!("splitter::split_all");

        routes
            .par_iter()
            .map(|route| self.split(route, config))
            .collect()
    }
}

/// Euclidean length of a planar polyline
fn planar_length(line: &LineString<f64>) -> f64 {
    line.lines()
        .map(|segment| Euclidean.distance(segment.start_point(), segment.end_point()))
        .sum()
}

/// Douglas-Peucker with a doubling tolerance until at most `max_points` remain
///
/// Returns the indices of the kept vertices.
fn simplify_to_at_most(
    line: &LineString<f64>,
    max_points: usize,
    initial_tolerance: f64,
) -> Result<Vec<usize>> {
    let mut tolerance = initial_tolerance;
    for round in 0..MAX_SIMPLIFICATION_ROUNDS {
        if !tolerance.is_finite() {
            break;
        }
        let kept = line.simplify_idx(tolerance);
        tracing::trace!(
            "Simplification round {}: tolerance {:.3} kept {} of {} points",
            round,
            tolerance,
            kept.len(),
            line.0.len()
        );
        if kept.len() <= max_points {
            return Ok(kept);
        }
        tolerance *= 2.0;
    }

    Err(SplitError::InternalInvariant(format!(
        "Simplification did not reach {max_points} points (last tolerance {tolerance})"
    )))
}

/// Cut the original points at the kept indices
///
/// The first segment is the start anchor; each following segment spans two
/// consecutive kept indices, both inclusive.
fn build_segments(points: &[&GeoPoint], kept: &[usize]) -> Result<Vec<Segment>> {
    let last_index = points.len() - 1;
    if kept.first() != Some(&0) || kept.last() != Some(&last_index) {
        return Err(SplitError::InternalInvariant(format!(
            "Simplified vertices {:?}..{:?} do not span the route 0..{}",
            kept.first(),
            kept.last(),
            last_index
        )));
    }

    let mut segments = Vec::with_capacity(kept.len());
    segments.push(Segment::anchor(points[0]));
    for window in kept.windows(2) {
        let (start, end) = (window[0], window[1]);
        if end <= start {
            return Err(SplitError::InternalInvariant(format!(
                "Simplified vertex {end} does not follow vertex {start}"
            )));
        }
        let run = points[start..=end].iter().map(|&point| point.clone()).collect();
        segments.push(Segment::new(run)?);
    }
    Ok(segments)
}
