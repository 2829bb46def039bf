//! Geographic to planar projections
//!
//! Douglas-Peucker compares perpendicular distances, which is only meaningful in
//! a linear unit. Latitude/longitude degrees are not isotropic, so routes are
//! projected to metres before they are simplified.
//!
//! - [`TransverseMercator`]: ellipsoidal transverse Mercator (Israeli grid, UTM)
//! - [`WebMercator`]: spherical Web Mercator (EPSG:3857)

use crate::GeoPoint;
use geo::Coord;
use std::f64::consts::PI;
use std::sync::Arc;

/// Web Mercator bounds in meters (EPSG:3857)
pub const EARTH_MERCATOR_MAX: f64 = 20037508.34;

/// Maximum latitude that can be represented in Web Mercator
pub const MAX_MERCATOR_LATITUDE: f64 = 85.05112878;

/// Highest latitude accepted by the transverse Mercator series expansion
pub const MAX_TRANSVERSE_LATITUDE: f64 = 84.0;

/// Default longitude span (either side of the central meridian) a transverse
/// Mercator projection accepts, in degrees
pub const DEFAULT_MAX_LONGITUDE_OFFSET: f64 = 10.0;

const LON_TO_X_FACTOR: f64 = EARTH_MERCATOR_MAX / 180.0;
const Y_FACTOR: f64 = EARTH_MERCATOR_MAX / PI;
const X_TO_LON_FACTOR: f64 = 180.0 / EARTH_MERCATOR_MAX;
const Y_TO_LAT_FACTOR: f64 = PI / EARTH_MERCATOR_MAX;

/// Failure to map a coordinate through a projection
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ProjectionError {
    #[error("Coordinate (lat {latitude}, lon {longitude}) is outside the {projection} domain")]
    OutOfDomain {
        projection: &'static str,
        latitude: f64,
        longitude: f64,
    },

    #[error("Planar coordinate ({x}, {y}) cannot be unprojected from {projection}")]
    InvalidPlanar {
        projection: &'static str,
        x: f64,
        y: f64,
    },
}

/// A fixed transform between WGS84 degrees and a planar system in meters.
///
/// Implementations are immutable, so a single projector can be shared between
/// threads and injected once into a [`crate::RouteSplitter`].
pub trait Projector: Send + Sync {
    /// Short human readable name, used in errors and logs
    fn name(&self) -> &'static str;

    /// Project a WGS84 coordinate (degrees) to planar meters
    fn project(&self, latitude: f64, longitude: f64) -> Result<Coord<f64>, ProjectionError>;

    /// Map a planar coordinate back to `(latitude, longitude)` in degrees
    fn unproject(&self, coord: Coord<f64>) -> Result<(f64, f64), ProjectionError>;

    /// Project a sequence of points, preserving order one-to-one
    fn to_planar(&self, points: &[&GeoPoint]) -> Result<Vec<Coord<f64>>, ProjectionError> {
        points
            .iter()
            .map(|point| self.project(point.latitude, point.longitude))
            .collect()
    }

    /// Inverse of [`Projector::to_planar`], returning `(latitude, longitude)` pairs
    fn to_geographic(&self, coords: &[Coord<f64>]) -> Result<Vec<(f64, f64)>, ProjectionError> {
        coords.iter().map(|coord| self.unproject(*coord)).collect()
    }
}

impl<P: Projector + ?Sized> Projector for Box<P> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn project(&self, latitude: f64, longitude: f64) -> Result<Coord<f64>, ProjectionError> {
        (**self).project(latitude, longitude)
    }

    fn unproject(&self, coord: Coord<f64>) -> Result<(f64, f64), ProjectionError> {
        (**self).unproject(coord)
    }
}

impl<P: Projector + ?Sized> Projector for Arc<P> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn project(&self, latitude: f64, longitude: f64) -> Result<Coord<f64>, ProjectionError> {
        (**self).project(latitude, longitude)
    }

    fn unproject(&self, coord: Coord<f64>) -> Result<(f64, f64), ProjectionError> {
        (**self).unproject(coord)
    }
}

/// Spherical Web Mercator (EPSG:3857)
///
/// Distances are inflated by `1 / cos(latitude)`, so tolerances expressed in
/// Web Mercator meters are looser than ground meters away from the equator.
#[derive(Debug, Clone, Copy, Default)]
pub struct WebMercator;

#[cfg_attr(feature = "profiling", profiling::all_functions)]
impl Projector for WebMercator {
    fn name(&self) -> &'static str {
        "Web Mercator"
    }

    #[inline]
    fn project(&self, latitude: f64, longitude: f64) -> Result<Coord<f64>, ProjectionError> {
        if !latitude.is_finite()
            || !longitude.is_finite()
            || latitude.abs() > MAX_MERCATOR_LATITUDE
            || longitude.abs() > 180.0
        {
            return Err(ProjectionError::OutOfDomain {
                projection: self.name(),
                latitude,
                longitude,
            });
        }

        let lat_rad = latitude.to_radians();
        Ok(Coord {
            x: longitude * LON_TO_X_FACTOR,
            y: (lat_rad.tan() + (1.0 / lat_rad.cos())).ln() * Y_FACTOR,
        })
    }

    #[inline]
    fn unproject(&self, coord: Coord<f64>) -> Result<(f64, f64), ProjectionError> {
        let valid = coord.x.is_finite()
            && coord.y.is_finite()
            && coord.x.abs() <= EARTH_MERCATOR_MAX
            && coord.y.abs() <= EARTH_MERCATOR_MAX;
        if !valid {
            return Err(ProjectionError::InvalidPlanar {
                projection: self.name(),
                x: coord.x,
                y: coord.y,
            });
        }

        let lon = coord.x * X_TO_LON_FACTOR;
        let lat = (PI / 2.0 - 2.0 * ((-coord.y * Y_TO_LAT_FACTOR).exp()).atan()).to_degrees();
        Ok((lat, lon))
    }
}

/// Reference ellipsoid for [`TransverseMercator`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ellipsoid {
    /// Equatorial radius in meters
    pub semi_major_axis: f64,
    /// Inverse flattening (1/f)
    pub inverse_flattening: f64,
}

impl Ellipsoid {
    pub const WGS84: Ellipsoid = Ellipsoid {
        semi_major_axis: 6_378_137.0,
        inverse_flattening: 298.257_223_563,
    };

    pub const GRS80: Ellipsoid = Ellipsoid {
        semi_major_axis: 6_378_137.0,
        inverse_flattening: 298.257_222_101,
    };

    /// First eccentricity squared
    #[inline]
    pub fn eccentricity_squared(&self) -> f64 {
        let f = 1.0 / self.inverse_flattening;
        f * (2.0 - f)
    }
}

/// Ellipsoidal transverse Mercator projection (Snyder's series)
///
/// Accurate to well below a meter within a few degrees of the central
/// meridian. Points further than `max_longitude_offset` degrees from the
/// central meridian are rejected.
#[derive(Debug, Clone, PartialEq)]
pub struct TransverseMercator {
    name: &'static str,
    semi_major_axis: f64,
    e2: f64,
    ep2: f64,
    /// Latitude of origin in radians
    origin_latitude: f64,
    /// Central meridian in degrees
    central_meridian: f64,
    scale_factor: f64,
    false_easting: f64,
    false_northing: f64,
    max_longitude_offset: f64,
    /// Meridian arc length at the latitude of origin
    origin_arc: f64,
}

impl Default for TransverseMercator {
    fn default() -> Self {
        Self::israel_grid()
    }
}

#[cfg_attr(feature = "profiling", profiling::all_functions)]
impl TransverseMercator {
    /// Create a transverse Mercator projection
    ///
    /// # Arguments
    /// * `ellipsoid` - Reference ellipsoid
    /// * `origin_latitude` - Latitude of origin in degrees
    /// * `central_meridian` - Longitude of the central meridian in degrees
    /// * `scale_factor` - Scale factor on the central meridian (k0)
    /// * `false_easting` / `false_northing` - Offsets added to the result, in meters
    pub fn new(
        ellipsoid: Ellipsoid,
        origin_latitude: f64,
        central_meridian: f64,
        scale_factor: f64,
        false_easting: f64,
        false_northing: f64,
    ) -> Self {
        let e2 = ellipsoid.eccentricity_squared();
        let mut projection = Self {
            name: "Transverse Mercator",
            semi_major_axis: ellipsoid.semi_major_axis,
            e2,
            ep2: e2 / (1.0 - e2),
            origin_latitude: origin_latitude.to_radians(),
            central_meridian,
            scale_factor,
            false_easting,
            false_northing,
            max_longitude_offset: DEFAULT_MAX_LONGITUDE_OFFSET,
            origin_arc: 0.0,
        };
        projection.origin_arc = projection.meridian_arc(projection.origin_latitude);
        projection
    }

    /// Israeli Transverse Mercator grid (the "new Israeli grid")
    ///
    /// Coordinates are treated as already being on the grid's GRS80 datum.
    pub fn israel_grid() -> Self {
        let mut projection = Self::new(
            Ellipsoid::GRS80,
            31.0 + 44.0 / 60.0 + 3.817 / 3600.0,
            35.0 + 12.0 / 60.0 + 16.261 / 3600.0,
            1.000_006_7,
            219_529.584,
            626_907.390,
        );
        projection.name = "Israeli Transverse Mercator";
        projection
    }

    /// Universal Transverse Mercator zone on WGS84
    ///
    /// Returns `None` when `zone` is not in `1..=60`.
    pub fn utm(zone: u8, north: bool) -> Option<Self> {
        if !(1..=60).contains(&zone) {
            return None;
        }
        let central_meridian = f64::from(zone) * 6.0 - 183.0;
        let false_northing = if north { 0.0 } else { 10_000_000.0 };
        let mut projection = Self::new(
            Ellipsoid::WGS84,
            0.0,
            central_meridian,
            0.9996,
            500_000.0,
            false_northing,
        );
        projection.name = "UTM";
        Some(projection)
    }

    /// Override how far from the central meridian (degrees) input may lie
    pub fn with_max_longitude_offset(mut self, degrees: f64) -> Self {
        self.max_longitude_offset = degrees;
        self
    }

    /// Central meridian in degrees
    #[inline]
    pub fn central_meridian(&self) -> f64 {
        self.central_meridian
    }

    /// Distance along the meridian from the equator to latitude `phi` (radians)
    fn meridian_arc(&self, phi: f64) -> f64 {
        let e2 = self.e2;
        let e4 = e2 * e2;
        let e6 = e4 * e2;
        self.semi_major_axis
            * ((1.0 - e2 / 4.0 - 3.0 * e4 / 64.0 - 5.0 * e6 / 256.0) * phi
                - (3.0 * e2 / 8.0 + 3.0 * e4 / 32.0 + 45.0 * e6 / 1024.0) * (2.0 * phi).sin()
                + (15.0 * e4 / 256.0 + 45.0 * e6 / 1024.0) * (4.0 * phi).sin()
                - (35.0 * e6 / 3072.0) * (6.0 * phi).sin())
    }

    /// Longitude difference from the central meridian, wrapped to [-180, 180)
    #[inline]
    fn longitude_offset(&self, longitude: f64) -> f64 {
        (longitude - self.central_meridian + 180.0).rem_euclid(360.0) - 180.0
    }
}

impl Projector for TransverseMercator {
    fn name(&self) -> &'static str {
        self.name
    }

    fn project(&self, latitude: f64, longitude: f64) -> Result<Coord<f64>, ProjectionError> {
        let offset = self.longitude_offset(longitude);
        if !latitude.is_finite()
            || !longitude.is_finite()
            || latitude.abs() > MAX_TRANSVERSE_LATITUDE
            || offset.abs() > self.max_longitude_offset
        {
            return Err(ProjectionError::OutOfDomain {
                projection: self.name,
                latitude,
                longitude,
            });
        }

        let phi = latitude.to_radians();
        let (sin_phi, cos_phi) = phi.sin_cos();
        let tan_phi = sin_phi / cos_phi;
        let ep2 = self.ep2;

        let n = self.semi_major_axis / (1.0 - self.e2 * sin_phi * sin_phi).sqrt();
        let t = tan_phi * tan_phi;
        let c = ep2 * cos_phi * cos_phi;
        let a = offset.to_radians() * cos_phi;
        let a2 = a * a;
        let m = self.meridian_arc(phi);

        let x = self.false_easting
            + self.scale_factor
                * n
                * (a + (1.0 - t + c) * a2 * a / 6.0
                    + (5.0 - 18.0 * t + t * t + 72.0 * c - 58.0 * ep2) * a2 * a2 * a / 120.0);
        let y = self.false_northing
            + self.scale_factor
                * (m - self.origin_arc
                    + n * tan_phi
                        * (a2 / 2.0
                            + (5.0 - t + 9.0 * c + 4.0 * c * c) * a2 * a2 / 24.0
                            + (61.0 - 58.0 * t + t * t + 600.0 * c - 330.0 * ep2)
                                * a2
                                * a2
                                * a2
                                / 720.0));

        Ok(Coord { x, y })
    }

    fn unproject(&self, coord: Coord<f64>) -> Result<(f64, f64), ProjectionError> {
        if !coord.x.is_finite() || !coord.y.is_finite() {
            return Err(ProjectionError::InvalidPlanar {
                projection: self.name,
                x: coord.x,
                y: coord.y,
            });
        }

        let e2 = self.e2;
        let ep2 = self.ep2;
        let a = self.semi_major_axis;

        // Footpoint latitude
        let m1 = self.origin_arc + (coord.y - self.false_northing) / self.scale_factor;
        let mu = m1 / (a * (1.0 - e2 / 4.0 - 3.0 * e2 * e2 / 64.0 - 5.0 * e2 * e2 * e2 / 256.0));
        let sqrt_one_minus_e2 = (1.0 - e2).sqrt();
        let e1 = (1.0 - sqrt_one_minus_e2) / (1.0 + sqrt_one_minus_e2);
        let phi1 = mu
            + (3.0 * e1 / 2.0 - 27.0 * e1.powi(3) / 32.0) * (2.0 * mu).sin()
            + (21.0 * e1 * e1 / 16.0 - 55.0 * e1.powi(4) / 32.0) * (4.0 * mu).sin()
            + (151.0 * e1.powi(3) / 96.0) * (6.0 * mu).sin()
            + (1097.0 * e1.powi(4) / 512.0) * (8.0 * mu).sin();

        let (sin_phi1, cos_phi1) = phi1.sin_cos();
        let tan_phi1 = sin_phi1 / cos_phi1;
        let c1 = ep2 * cos_phi1 * cos_phi1;
        let t1 = tan_phi1 * tan_phi1;
        let denom = 1.0 - e2 * sin_phi1 * sin_phi1;
        let n1 = a / denom.sqrt();
        let r1 = a * (1.0 - e2) / denom.powf(1.5);
        let d = (coord.x - self.false_easting) / (n1 * self.scale_factor);
        let d2 = d * d;

        let phi = phi1
            - (n1 * tan_phi1 / r1)
                * (d2 / 2.0
                    - (5.0 + 3.0 * t1 + 10.0 * c1 - 4.0 * c1 * c1 - 9.0 * ep2) * d2 * d2 / 24.0
                    + (61.0 + 90.0 * t1 + 298.0 * c1 + 45.0 * t1 * t1 - 252.0 * ep2 - 3.0 * c1 * c1)
                        * d2
                        * d2
                        * d2
                        / 720.0);
        let lambda = (d - (1.0 + 2.0 * t1 + c1) * d2 * d / 6.0
            + (5.0 - 2.0 * c1 + 28.0 * t1 - 3.0 * c1 * c1 + 8.0 * ep2 + 24.0 * t1 * t1)
                * d2
                * d2
                * d
                / 120.0)
            / cos_phi1;

        let latitude = phi.to_degrees();
        let longitude = self.central_meridian + lambda.to_degrees();
        if !latitude.is_finite() || !longitude.is_finite() || latitude.abs() > 90.0 {
            return Err(ProjectionError::InvalidPlanar {
                projection: self.name,
                x: coord.x,
                y: coord.y,
            });
        }
        Ok((latitude, longitude))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn planar_distance(a: Coord<f64>, b: Coord<f64>) -> f64 {
        (a.x - b.x).hypot(a.y - b.y)
    }

    #[test]
    fn test_web_mercator_origin() {
        let point = WebMercator.project(0.0, 0.0).unwrap();
        assert!(point.x.abs() < 0.01);
        assert!(point.y.abs() < 0.01);
    }

    #[test]
    fn test_web_mercator_bounds() {
        let west = WebMercator.project(0.0, -180.0).unwrap();
        assert!((west.x + EARTH_MERCATOR_MAX).abs() < 1.0);

        let east = WebMercator.project(0.0, 180.0).unwrap();
        assert!((east.x - EARTH_MERCATOR_MAX).abs() < 1.0);
    }

    #[test]
    fn test_web_mercator_roundtrip() {
        let lat = 51.5074;
        let lon = -0.1278;

        let mercator = WebMercator.project(lat, lon).unwrap();
        let (lat2, lon2) = WebMercator.unproject(mercator).unwrap();

        assert!((lat - lat2).abs() < 0.0001);
        assert!((lon - lon2).abs() < 0.0001);
    }

    #[test]
    fn test_web_mercator_rejects_polar_latitude() {
        let err = WebMercator.project(89.0, 10.0).unwrap_err();
        assert!(matches!(err, ProjectionError::OutOfDomain { .. }));
        assert!(WebMercator.project(f64::NAN, 10.0).is_err());
        assert!(
            WebMercator
                .unproject(Coord {
                    x: EARTH_MERCATOR_MAX * 2.0,
                    y: 0.0
                })
                .is_err()
        );
    }

    #[test]
    fn test_israel_grid_origin_maps_to_false_origin() {
        let itm = TransverseMercator::israel_grid();
        let origin = itm
            .project(
                31.0 + 44.0 / 60.0 + 3.817 / 3600.0,
                35.0 + 12.0 / 60.0 + 16.261 / 3600.0,
            )
            .unwrap();
        assert!((origin.x - 219_529.584).abs() < 1e-6);
        assert!((origin.y - 626_907.390).abs() < 1e-6);
    }

    #[test]
    fn test_israel_grid_distances_are_metric() {
        let itm = TransverseMercator::israel_grid();
        let base = itm.project(31.77, 35.21).unwrap();
        let north = itm.project(31.78, 35.21).unwrap();
        let east = itm.project(31.77, 35.22).unwrap();

        // 0.01 degrees of latitude / longitude around Jerusalem on GRS80
        assert!((planar_distance(base, north) - 1108.8).abs() < 2.0);
        assert!((planar_distance(base, east) - 947.2).abs() < 2.0);
        assert!(north.y > base.y);
        assert!(east.x > base.x);
    }

    #[test]
    fn test_israel_grid_roundtrip() {
        let itm = TransverseMercator::israel_grid();
        for &(lat, lon) in &[(31.7683, 35.2137), (29.5577, 34.9519), (33.2, 35.6)] {
            let planar = itm.project(lat, lon).unwrap();
            let (lat2, lon2) = itm.unproject(planar).unwrap();
            assert!((lat - lat2).abs() < 1e-6, "lat {lat} -> {lat2}");
            assert!((lon - lon2).abs() < 1e-6, "lon {lon} -> {lon2}");
        }
    }

    #[test]
    fn test_transverse_mercator_rejects_far_longitudes() {
        let itm = TransverseMercator::israel_grid();
        let err = itm.project(31.0, 60.0).unwrap_err();
        assert_eq!(
            err,
            ProjectionError::OutOfDomain {
                projection: "Israeli Transverse Mercator",
                latitude: 31.0,
                longitude: 60.0,
            }
        );

        let wide = TransverseMercator::israel_grid().with_max_longitude_offset(30.0);
        assert!(wide.project(31.0, 60.0).is_ok());
        assert!(itm.project(f64::INFINITY, 35.0).is_err());
    }

    #[test]
    fn test_utm_zone_central_meridian() {
        let zone31 = TransverseMercator::utm(31, true).unwrap();
        assert!((zone31.central_meridian() - 3.0).abs() < f64::EPSILON);

        let on_equator = zone31.project(0.0, 3.0).unwrap();
        assert!((on_equator.x - 500_000.0).abs() < 1e-6);
        assert!(on_equator.y.abs() < 1e-6);

        let south = TransverseMercator::utm(31, false).unwrap();
        assert!((south.project(0.0, 3.0).unwrap().y - 10_000_000.0).abs() < 1e-6);

        assert!(TransverseMercator::utm(0, true).is_none());
        assert!(TransverseMercator::utm(61, true).is_none());
    }

    #[test]
    fn test_to_planar_preserves_order() {
        let points = [
            GeoPoint::new(31.0, 35.0),
            GeoPoint::new(31.1, 35.1),
            GeoPoint::new(31.2, 35.0),
        ];
        let refs: Vec<&GeoPoint> = points.iter().collect();
        let projector: Box<dyn Projector> = Box::new(TransverseMercator::israel_grid());

        let planar = projector.to_planar(&refs).unwrap();
        assert_eq!(planar.len(), 3);
        assert!(planar[1].y > planar[0].y);
        assert!(planar[2].y > planar[1].y);

        let back = projector.to_geographic(&planar).unwrap();
        for (point, (lat, lon)) in points.iter().zip(back) {
            assert!((point.latitude - lat).abs() < 1e-6);
            assert!((point.longitude - lon).abs() < 1e-6);
        }
    }

    #[test]
    fn test_to_planar_propagates_first_error() {
        let points = [GeoPoint::new(31.0, 35.0), GeoPoint::new(95.0, 35.0)];
        let refs: Vec<&GeoPoint> = points.iter().collect();
        let err = WebMercator.to_planar(&refs).unwrap_err();
        assert!(matches!(
            err,
            ProjectionError::OutOfDomain { latitude, .. } if latitude == 95.0
        ));
    }
}
