//! Geographic track points

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// A recorded track point in WGS84 degrees with optional per-point data
///
/// Serialized in the `{ lat, lng, alt, timestamp }` shape used by route files.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct GeoPoint {
    #[cfg_attr(feature = "serde", serde(rename = "lat"))]
    pub latitude: f64,
    #[cfg_attr(feature = "serde", serde(rename = "lng"))]
    pub longitude: f64,
    /// Elevation in meters
    #[cfg_attr(
        feature = "serde",
        serde(rename = "alt", default, skip_serializing_if = "Option::is_none")
    )]
    pub elevation: Option<f64>,
    #[cfg_attr(
        feature = "serde",
        serde(
            default,
            skip_serializing_if = "Option::is_none",
            with = "time::serde::rfc3339::option"
        )
    )]
    pub timestamp: Option<OffsetDateTime>,
}

impl GeoPoint {
    /// Create a point without elevation or timestamp
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            elevation: None,
            timestamp: None,
        }
    }

    pub fn with_elevation(mut self, elevation: f64) -> Self {
        self.elevation = Some(elevation);
        self
    }

    pub fn with_timestamp(mut self, timestamp: OffsetDateTime) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// Convert a GPX waypoint, keeping its elevation and time
    pub fn from_waypoint(waypoint: &gpx::Waypoint) -> Self {
        let point = waypoint.point();
        Self {
            latitude: point.y(),
            longitude: point.x(),
            elevation: waypoint.elevation,
            timestamp: waypoint.time.clone().map(OffsetDateTime::from),
        }
    }

    /// Convert into a GPX waypoint
    pub fn to_waypoint(&self) -> gpx::Waypoint {
        let mut waypoint = gpx::Waypoint::new(geo::Point::new(self.longitude, self.latitude));
        waypoint.elevation = self.elevation;
        waypoint.time = self.timestamp.map(gpx::Time::from);
        waypoint
    }
}
