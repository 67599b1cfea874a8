//! Planar projection of geographic routes.
//!
//! Lengths and buffers are measured in a Universal Transverse Mercator zone
//! chosen from the region under comparison. UTM is conformal with a scale
//! error below 0.04% inside its zone, so planar distances are meters.

use geo::{Coord, LineString};
use thiserror::Error;

use crate::Route;

const SEMI_MAJOR_AXIS: f64 = 6_378_137.0;
const FLATTENING: f64 = 1.0 / 298.257_223_563;
const SCALE_FACTOR: f64 = 0.9996;
const FALSE_EASTING: f64 = 500_000.0;
const FALSE_NORTHING_SOUTH: f64 = 10_000_000.0;

/// Errors returned by [`PlanarProjection::project_coords`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProjectionError {
    /// Fewer than two vertices were supplied.
    #[error("cannot project a route with {vertices} vertices; at least two are required")]
    DegenerateRoute {
        /// Number of vertices supplied.
        vertices: usize,
    },
}

/// A UTM zone on the WGS84 ellipsoid.
///
/// # Examples
/// ```
/// use geo::Coord;
/// use routecompare_core::PlanarProjection;
///
/// let projection = PlanarProjection::for_region(Coord { x: 9.15, y: 48.83 });
/// assert_eq!(projection.zone(), 32);
/// assert_eq!(projection.epsg(), 32632);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlanarProjection {
    zone: u8,
    south: bool,
}

impl PlanarProjection {
    /// Select the zone containing `center`.
    ///
    /// Longitudes at the antimeridian fall into zone 60; latitudes below the
    /// equator use the southern false northing.
    pub fn for_region(center: Coord<f64>) -> Self {
        let raw = ((center.x + 180.0) / 6.0).floor() + 1.0;
        let zone = raw.clamp(1.0, 60.0) as u8;
        Self {
            zone,
            south: center.y < 0.0,
        }
    }

    /// UTM zone number, `1..=60`.
    pub fn zone(&self) -> u8 {
        self.zone
    }

    /// Whether the southern hemisphere variant is in use.
    pub fn is_south(&self) -> bool {
        self.south
    }

    /// EPSG code of the zone (`326xx` north, `327xx` south).
    pub fn epsg(&self) -> u32 {
        let base = if self.south { 32_700 } else { 32_600 };
        base + u32::from(self.zone)
    }

    fn central_meridian(&self) -> f64 {
        (f64::from(self.zone) - 1.0).mul_add(6.0, -180.0) + 3.0
    }

    /// Project a single geographic coordinate to easting/northing meters.
    pub fn project_point(&self, coord: Coord<f64>) -> Coord<f64> {
        let e2 = FLATTENING * (2.0 - FLATTENING);
        let e4 = e2 * e2;
        let e6 = e4 * e2;
        let ep2 = e2 / (1.0 - e2);

        let phi = coord.y.to_radians();
        let delta_lambda = (coord.x - self.central_meridian()).to_radians();
        let (sin_phi, cos_phi) = phi.sin_cos();
        let tan_phi = phi.tan();

        let n = SEMI_MAJOR_AXIS / (1.0 - e2 * sin_phi * sin_phi).sqrt();
        let t = tan_phi * tan_phi;
        let c = ep2 * cos_phi * cos_phi;
        let a = cos_phi * delta_lambda;

        let m = SEMI_MAJOR_AXIS
            * ((1.0 - e2 / 4.0 - 3.0 * e4 / 64.0 - 5.0 * e6 / 256.0) * phi
                - (3.0 * e2 / 8.0 + 3.0 * e4 / 32.0 + 45.0 * e6 / 1024.0) * (2.0 * phi).sin()
                + (15.0 * e4 / 256.0 + 45.0 * e6 / 1024.0) * (4.0 * phi).sin()
                - (35.0 * e6 / 3072.0) * (6.0 * phi).sin());

        let a2 = a * a;
        let a3 = a2 * a;
        let a4 = a3 * a;
        let a5 = a4 * a;
        let a6 = a5 * a;

        let easting = SCALE_FACTOR
            * n
            * (a + (1.0 - t + c) * a3 / 6.0
                + (5.0 - 18.0 * t + t * t + 72.0 * c - 58.0 * ep2) * a5 / 120.0)
            + FALSE_EASTING;
        let mut northing = SCALE_FACTOR
            * (m + n
                * tan_phi
                * (a2 / 2.0
                    + (5.0 - t + 9.0 * c + 4.0 * c * c) * a4 / 24.0
                    + (61.0 - 58.0 * t + t * t + 600.0 * c - 330.0 * ep2) * a6 / 720.0));
        if self.south {
            northing += FALSE_NORTHING_SOUTH;
        }
        Coord {
            x: easting,
            y: northing,
        }
    }

    /// Project an ordered vertex list.
    pub fn project_coords(&self, coords: &[Coord<f64>]) -> Result<PlanarRoute, ProjectionError> {
        PlanarRoute::new(coords.iter().map(|c| self.project_point(*c)).collect())
    }

    /// Project a validated route; routes always hold two or more vertices.
    pub fn project_route(&self, route: &Route) -> PlanarRoute {
        PlanarRoute {
            line: route
                .coords()
                .iter()
                .map(|c| self.project_point(*c))
                .collect(),
        }
    }
}

/// A route in projected meters.
#[derive(Debug, Clone, PartialEq)]
pub struct PlanarRoute {
    line: LineString<f64>,
}

impl PlanarRoute {
    /// Wrap coordinates that are already in projected meters.
    pub fn new(coords: Vec<Coord<f64>>) -> Result<Self, ProjectionError> {
        if coords.len() < 2 {
            return Err(ProjectionError::DegenerateRoute {
                vertices: coords.len(),
            });
        }
        Ok(Self {
            line: LineString::new(coords),
        })
    }

    /// Projected vertices.
    pub fn coords(&self) -> &[Coord<f64>] {
        &self.line.0
    }

    /// Borrow the underlying line string.
    pub fn line_string(&self) -> &LineString<f64> {
        &self.line
    }

    /// Sum of consecutive vertex distances in meters.
    pub fn length(&self) -> f64 {
        self.line.lines().map(|l| l.dx().hypot(l.dy())).sum()
    }
}
