//! Provider routes and the summary details that accompany them.
//!
//! A [`Route`] is a polyline of at least two WGS84 coordinates. A provider
//! either returns a [`ProviderRoute`] (geometry plus [`RouteDetails`]) or
//! signals that it found nothing via [`RouteOutcome::NoRoute`]. Absence is
//! never encoded as an empty geometry.

use std::collections::HashSet;

use geo::{Coord, LineString};
use thiserror::Error;

/// Errors returned by [`Route::new`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouteError {
    /// Fewer than two coordinates were supplied.
    #[error("route must contain at least two coordinates, found {found}")]
    TooFewCoordinates {
        /// Number of coordinates supplied.
        found: usize,
    },
    /// A coordinate contained NaN or an infinite value.
    #[error("route coordinate at index {index} is not finite")]
    NonFiniteCoordinate {
        /// Position of the offending coordinate.
        index: usize,
    },
}

/// An ordered polyline in geographic coordinates (`x = lon`, `y = lat`).
///
/// # Examples
/// ```
/// use geo::Coord;
/// use routecompare_core::Route;
///
/// let route = Route::new(vec![
///     Coord { x: 9.10, y: 48.78 },
///     Coord { x: 9.11, y: 48.79 },
/// ])?;
/// assert_eq!(route.coords().len(), 2);
/// # Ok::<(), routecompare_core::RouteError>(())
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Route {
    line: LineString<f64>,
}

impl Route {
    /// Validate and construct a route from ordered coordinates.
    pub fn new(coords: Vec<Coord<f64>>) -> Result<Self, RouteError> {
        if coords.len() < 2 {
            return Err(RouteError::TooFewCoordinates {
                found: coords.len(),
            });
        }
        if let Some(index) = coords
            .iter()
            .position(|c| !(c.x.is_finite() && c.y.is_finite()))
        {
            return Err(RouteError::NonFiniteCoordinate { index });
        }
        Ok(Self {
            line: LineString::new(coords),
        })
    }

    /// Build a route from `(lon, lat)` tuples.
    pub fn from_lon_lat<I>(points: I) -> Result<Self, RouteError>
    where
        I: IntoIterator<Item = (f64, f64)>,
    {
        Self::new(points.into_iter().map(|(x, y)| Coord { x, y }).collect())
    }

    /// Ordered vertices of the route.
    pub fn coords(&self) -> &[Coord<f64>] {
        &self.line.0
    }

    /// Borrow the underlying line string.
    pub fn line_string(&self) -> &LineString<f64> {
        &self.line
    }

    /// First vertex.
    pub fn start(&self) -> Coord<f64> {
        self.line.0.first().copied().unwrap_or_default()
    }

    /// Last vertex.
    pub fn end(&self) -> Coord<f64> {
        self.line.0.last().copied().unwrap_or_default()
    }
}

/// Errors returned by [`RouteDetails::new`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RouteDetailsError {
    /// Distance was negative, NaN or infinite.
    #[error("route distance must be a non-negative finite number of meters, got {value}")]
    InvalidDistance {
        /// Rejected value.
        value: f64,
    },
    /// Duration was negative, NaN or infinite.
    #[error("route duration must be a non-negative finite number of seconds, got {value}")]
    InvalidDuration {
        /// Rejected value.
        value: f64,
    },
}

/// Summary a provider returns alongside a route.
///
/// Instructions are de-duplicated on construction; the first occurrence of a
/// repeated instruction keeps its position.
///
/// # Examples
/// ```
/// use routecompare_core::RouteDetails;
///
/// let details = RouteDetails::new(5_000.0, 600.0, ["A", "B", "A", "C"])?;
/// assert_eq!(details.instructions(), ["A", "B", "C"]);
/// # Ok::<(), routecompare_core::RouteDetailsError>(())
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "RouteDetailsRecord"))]
pub struct RouteDetails {
    distance: f64,
    duration: f64,
    instructions: Vec<String>,
}

impl RouteDetails {
    /// Validate and construct route details.
    ///
    /// `distance` is in meters and `duration` in seconds.
    pub fn new<I, S>(
        distance: f64,
        duration: f64,
        instructions: I,
    ) -> Result<Self, RouteDetailsError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        if !(distance.is_finite() && distance >= 0.0) {
            return Err(RouteDetailsError::InvalidDistance { value: distance });
        }
        if !(duration.is_finite() && duration >= 0.0) {
            return Err(RouteDetailsError::InvalidDuration { value: duration });
        }
        Ok(Self {
            distance,
            duration,
            instructions: dedup_instructions(instructions),
        })
    }

    /// Route length in meters as reported by the provider.
    pub fn distance(&self) -> f64 {
        self.distance
    }

    /// Travel time in seconds as reported by the provider.
    pub fn duration(&self) -> f64 {
        self.duration
    }

    /// Human-readable manoeuvres in driving order.
    pub fn instructions(&self) -> &[String] {
        &self.instructions
    }
}

#[cfg(feature = "serde")]
#[derive(serde::Deserialize)]
struct RouteDetailsRecord {
    distance: f64,
    duration: f64,
    #[serde(default)]
    instructions: Vec<String>,
}

#[cfg(feature = "serde")]
impl TryFrom<RouteDetailsRecord> for RouteDetails {
    type Error = RouteDetailsError;

    fn try_from(record: RouteDetailsRecord) -> Result<Self, Self::Error> {
        Self::new(record.distance, record.duration, record.instructions)
    }
}

/// Remove repeated instructions, keeping the first occurrence of each.
///
/// # Examples
/// ```
/// use routecompare_core::route::dedup_instructions;
///
/// let unique = dedup_instructions(["A", "B", "A", "C"]);
/// assert_eq!(unique, vec!["A", "B", "C"]);
/// ```
pub fn dedup_instructions<I, S>(instructions: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut seen = HashSet::new();
    instructions
        .into_iter()
        .map(Into::into)
        .filter(|instruction| seen.insert(instruction.clone()))
        .collect()
}

/// A route geometry paired with its details.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderRoute {
    /// Route geometry.
    pub route: Route,
    /// Distance, duration and instructions for `route`.
    pub details: RouteDetails,
}

impl ProviderRoute {
    /// Pair a route with its details.
    pub fn new(route: Route, details: RouteDetails) -> Self {
        Self { route, details }
    }
}

/// Result of asking one provider for one origin/destination pair.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum RouteOutcome {
    /// The provider returned a route.
    Found(ProviderRoute),
    /// The provider found no route or failed; failures are absorbed upstream.
    #[default]
    NoRoute,
}

impl RouteOutcome {
    /// Borrow the route geometry, if any.
    pub fn route(&self) -> Option<&Route> {
        self.provider_route().map(|found| &found.route)
    }

    /// Borrow the route details, if any.
    pub fn details(&self) -> Option<&RouteDetails> {
        self.provider_route().map(|found| &found.details)
    }

    /// Borrow the full provider route, if any.
    pub fn provider_route(&self) -> Option<&ProviderRoute> {
        match self {
            Self::Found(found) => Some(found),
            Self::NoRoute => None,
        }
    }

    /// Whether the provider produced a route.
    pub fn is_found(&self) -> bool {
        matches!(self, Self::Found(_))
    }
}

impl From<Option<ProviderRoute>> for RouteOutcome {
    fn from(value: Option<ProviderRoute>) -> Self {
        value.map_or(Self::NoRoute, Self::Found)
    }
}
