//! Route segments: runs of track points between two breakpoints

use crate::{GeoPoint, Result, SplitError};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Distinguishes the synthetic start anchor from real runs of points
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub enum SegmentKind {
    /// Zero-length segment holding two copies of the first route point.
    /// It only carries the route-start marker.
    Anchor,
    /// Contiguous run of original points ending at a breakpoint
    #[default]
    Simplified,
}

/// A contiguous run of points plus the point its marker is drawn at
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct Segment {
    #[cfg_attr(feature = "serde", serde(default))]
    pub kind: SegmentKind,
    /// Marker/label position for this segment
    pub route_point: GeoPoint,
    /// Points of the segment, in route order
    #[cfg_attr(feature = "serde", serde(rename = "latlngs"))]
    pub points: Vec<GeoPoint>,
}

impl Segment {
    /// Create a regular segment anchored on its last point
    ///
    /// # Errors
    /// [`SplitError::InvalidInput`] if `points` is empty
    pub fn new(points: Vec<GeoPoint>) -> Result<Self> {
        let route_point = points
            .last()
            .cloned()
            .ok_or_else(|| SplitError::InvalidInput("Segment without points".to_string()))?;
        Ok(Self {
            kind: SegmentKind::Simplified,
            route_point,
            points,
        })
    }

    /// Create the synthetic start segment for `first`
    pub fn anchor(first: &GeoPoint) -> Self {
        Self {
            kind: SegmentKind::Anchor,
            route_point: first.clone(),
            points: vec![first.clone(), first.clone()],
        }
    }

    #[inline]
    pub fn is_anchor(&self) -> bool {
        self.kind == SegmentKind::Anchor
    }

    /// First point of the segment, if any
    #[inline]
    pub fn first_point(&self) -> Option<&GeoPoint> {
        self.points.first()
    }

    /// Last point of the segment, if any
    #[inline]
    pub fn last_point(&self) -> Option<&GeoPoint> {
        self.points.last()
    }

    /// Number of points in the segment
    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}
