//! Route model and GPX interop
//!
//! A [`Route`] is an ordered list of [`Segment`]s. Consecutive segments share
//! their boundary point (the last point of one is the first point of the next),
//! which [`Route::flattened_points`] removes again.

use crate::{GeoPoint, Result, Segment, SegmentKind, SplitError};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};

/// Creator tag written into exported GPX files
const GPX_CREATOR: &str = "hiking-route-splitter";

/// A named route made of ordered segments
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Route {
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub name: Option<String>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub segments: Vec<Segment>,
}

#[cfg_attr(feature = "profiling", profiling::all_functions)]
impl Route {
    pub fn new(name: Option<String>, segments: Vec<Segment>) -> Self {
        Self { name, segments }
    }

    /// Create a route with a single segment holding all `points`
    ///
    /// # Errors
    /// [`SplitError::InvalidInput`] if `points` is empty
    pub fn from_points(name: Option<String>, points: Vec<GeoPoint>) -> Result<Self> {
        Ok(Self {
            name,
            segments: vec![Segment::new(points)?],
        })
    }

    /// All points of the route in order, as a single track
    ///
    /// Anchor segments are skipped, and a segment's first point is dropped when
    /// it is identical to the previous segment's last point (the shared
    /// boundary). Flattening a split route returns the flattened input route.
    pub fn flattened_points(&self) -> Vec<&GeoPoint> {
        let mut points: Vec<&GeoPoint> = Vec::new();
        for segment in self.segments.iter().filter(|s| !s.is_anchor()) {
            let mut segment_points = segment.points.iter();
            if let (Some(last), Some(first)) = (points.last(), segment.first_point()) {
                if *last == first {
                    segment_points.next();
                }
            }
            points.extend(segment_points);
        }
        points
    }

    /// Total number of distinct track points (see [`Route::flattened_points`])
    pub fn total_points(&self) -> usize {
        self.flattened_points().len()
    }

    /// The start anchor, if this route has been split
    #[inline]
    pub fn anchor(&self) -> Option<&Segment> {
        self.segments.first().filter(|s| s.is_anchor())
    }

    /// Segments that are real runs of points (everything but the anchor)
    pub fn simplified_segments(&self) -> impl Iterator<Item = &Segment> {
        self.segments
            .iter()
            .filter(|s| s.kind == SegmentKind::Simplified)
    }

    /// Build a route from GPX data
    ///
    /// Every non-empty track segment (across all tracks) becomes one segment.
    /// GPX routes are used when the file has no track points. The name is the
    /// first track or route name, falling back to the metadata name.
    pub fn from_gpx(gpx_data: &gpx::Gpx) -> Result<Self> {
        #[cfg(feature = "profiling")]
        profiling::scope!("route::from_gpx");

        let mut segments: Vec<Segment> = gpx_data
            .tracks
            .iter()
            .flat_map(|track| track.segments.iter())
            .filter(|segment| !segment.points.is_empty())
            .map(|segment| Segment::new(segment.points.iter().map(GeoPoint::from_waypoint).collect()))
            .collect::<Result<_>>()?;
        let mut name = gpx_data.tracks.iter().find_map(|t| t.name.clone());

        if segments.is_empty() {
            segments = gpx_data
                .routes
                .iter()
                .filter(|route| !route.points.is_empty())
                .map(|route| Segment::new(route.points.iter().map(GeoPoint::from_waypoint).collect()))
                .collect::<Result<_>>()?;
            name = gpx_data.routes.iter().find_map(|r| r.name.clone());
        }

        if segments.is_empty() {
            return Err(SplitError::InvalidInput(
                "GPX data contains no track or route points".to_string(),
            ));
        }

        let name = name.or_else(|| gpx_data.metadata.as_ref().and_then(|m| m.name.clone()));
        Ok(Self { name, segments })
    }

    /// Parse GPX from a reader and build a route from it
    pub fn read_gpx<R: Read>(reader: R) -> Result<Self> {
        let gpx_data = gpx::read(reader)?;
        Self::from_gpx(&gpx_data)
    }

    /// Export as GPX 1.1
    ///
    /// Produces one track whose track segments are the simplified segments, and
    /// one waypoint per segment route point (the anchor included).
    pub fn to_gpx(&self) -> gpx::Gpx {
        let mut track = gpx::Track::default();
        track.name = self.name.clone();
        track.segments = self
            .simplified_segments()
            .map(|segment| {
                let mut track_segment = gpx::TrackSegment::default();
                track_segment.points = segment.points.iter().map(GeoPoint::to_waypoint).collect();
                track_segment
            })
            .collect();

        let mut gpx_data = gpx::Gpx {
            version: gpx::GpxVersion::Gpx11,
            creator: Some(GPX_CREATOR.to_string()),
            ..Default::default()
        };
        gpx_data.waypoints = self
            .segments
            .iter()
            .map(|segment| segment.route_point.to_waypoint())
            .collect();
        gpx_data.tracks.push(track);
        gpx_data
    }

    /// Write the route as GPX 1.1
    pub fn write_gpx<W: Write>(&self, writer: W) -> Result<()> {
        gpx::write(&self.to_gpx(), writer)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gpx::{Gpx, Track, TrackSegment, Waypoint};

    fn create_test_waypoint(lat: f64, lon: f64) -> Waypoint {
        Waypoint::new(geo::Point::new(lon, lat))
    }

    fn create_test_gpx() -> Gpx {
        let mut gpx = Gpx::default();
        let mut track = Track::default();
        track.name = Some("Nahal Amud".to_string());

        // Two track segments around the Galilee
        let mut first = TrackSegment::default();
        first.points.push(create_test_waypoint(32.9170, 35.4890));
        first.points.push(create_test_waypoint(32.9180, 35.4900));
        let mut second = TrackSegment::default();
        second.points.push(create_test_waypoint(32.9190, 35.4910));

        track.segments.push(first);
        track.segments.push(TrackSegment::default());
        track.segments.push(second);
        gpx.tracks.push(track);
        gpx
    }

    #[test]
    fn test_from_gpx() {
        let route = Route::from_gpx(&create_test_gpx()).unwrap();

        assert_eq!(route.name.as_deref(), Some("Nahal Amud"));
        assert_eq!(route.segments.len(), 2);
        assert_eq!(route.total_points(), 3);
        assert!(route.anchor().is_none());
    }

    #[test]
    fn test_from_gpx_falls_back_to_routes() {
        let mut gpx = Gpx::default();
        let mut gpx_route = gpx::Route::default();
        gpx_route.name = Some("Planned".to_string());
        gpx_route.points.push(create_test_waypoint(31.0, 35.0));
        gpx_route.points.push(create_test_waypoint(31.1, 35.1));
        gpx.routes.push(gpx_route);

        let route = Route::from_gpx(&gpx).unwrap();
        assert_eq!(route.name.as_deref(), Some("Planned"));
        assert_eq!(route.total_points(), 2);
    }

    #[test]
    fn test_empty_gpx_fails() {
        let result = Route::from_gpx(&Gpx::default());
        assert!(matches!(result, Err(SplitError::InvalidInput(_))));
    }

    #[test]
    fn test_flattened_points_removes_shared_boundaries() {
        let a = GeoPoint::new(31.0, 35.0);
        let b = GeoPoint::new(31.1, 35.0);
        let c = GeoPoint::new(31.2, 35.0);
        let route = Route::new(
            None,
            vec![
                Segment::anchor(&a),
                Segment::new(vec![a.clone(), b.clone()]).unwrap(),
                Segment::new(vec![b.clone(), c.clone()]).unwrap(),
            ],
        );

        assert_eq!(route.flattened_points(), vec![&a, &b, &c]);
        assert_eq!(route.simplified_segments().count(), 2);
        assert!(route.anchor().is_some());
    }

    #[test]
    fn test_flattened_points_keeps_non_shared_boundaries() {
        let a = GeoPoint::new(31.0, 35.0);
        let b = GeoPoint::new(31.1, 35.0);
        let route = Route::new(
            None,
            vec![
                Segment::new(vec![a.clone()]).unwrap(),
                Segment::new(vec![b.clone(), b.clone()]).unwrap(),
            ],
        );

        // Only the boundary is deduplicated, repeated points inside a segment stay
        assert_eq!(route.flattened_points(), vec![&a, &b, &b]);
    }

    #[test]
    fn test_gpx_export_roundtrip() {
        let a = GeoPoint::new(31.0, 35.0).with_elevation(100.0);
        let b = GeoPoint::new(31.1, 35.0).with_elevation(120.0);
        let c = GeoPoint::new(31.2, 35.0).with_elevation(90.0);
        let route = Route::new(
            Some("Export".to_string()),
            vec![
                Segment::anchor(&a),
                Segment::new(vec![a.clone(), b.clone()]).unwrap(),
                Segment::new(vec![b.clone(), c.clone()]).unwrap(),
            ],
        );

        let mut buffer = Vec::new();
        route.write_gpx(&mut buffer).unwrap();
        let exported = gpx::read(buffer.as_slice()).unwrap();
        assert_eq!(exported.waypoints.len(), 3);
        assert_eq!(exported.tracks[0].segments.len(), 2);

        let reread = Route::read_gpx(buffer.as_slice()).unwrap();
        assert_eq!(reread.name.as_deref(), Some("Export"));
        assert_eq!(reread.flattened_points(), route.flattened_points());
    }
}
