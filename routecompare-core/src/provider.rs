//! Contracts implemented by routing provider adapters.
//!
//! Each adapter hides one vendor's wire format behind [`RouteProvider`].
//! Adapters own their transport concerns (timeouts, retries, credentials) and
//! must absorb every failure into [`RouteOutcome::NoRoute`]; the comparison
//! pipeline never sees a provider error.
//!
//! Coordinates are always passed as `geo::Coord { x: lon, y: lat }`. Adapters
//! reorder them for vendors that expect latitude first.

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use geo::Coord;
use thiserror::Error;

use crate::{RouteOutcome, RoutingOptions};

/// Identifies a routing provider in results and artefacts.
///
/// The lower-case name keys route collections (`google_routes.geojson`),
/// coverage maps and details maps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum ProviderKind {
    /// Google Directions API.
    Google,
    /// HERE Routing API v8.
    Here,
    /// OSRM route service (OpenStreetMap data).
    Osrm,
    /// GraphHopper routing API (OpenStreetMap data).
    #[cfg_attr(feature = "serde", serde(rename = "graphhopper"))]
    GraphHopper,
}

impl ProviderKind {
    /// Every provider kind, in result order.
    pub const ALL: [Self; 4] = [Self::Google, Self::Here, Self::Osrm, Self::GraphHopper];

    /// Lower-case identifier.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Google => "google",
            Self::Here => "here",
            Self::Osrm => "osrm",
            Self::GraphHopper => "graphhopper",
        }
    }

    /// Name suitable for prose.
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Google => "Google",
            Self::Here => "HERE",
            Self::Osrm => "OSRM",
            Self::GraphHopper => "GraphHopper",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown provider name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown provider {value:?}")]
pub struct ParseProviderError {
    /// Rejected input.
    pub value: String,
}

impl FromStr for ProviderKind {
    type Err = ParseProviderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == wanted)
            .ok_or_else(|| ParseProviderError {
                value: s.to_owned(),
            })
    }
}

/// Fetch a driving route between two coordinates.
///
/// Implementations must:
/// - honour [`RoutingOptions::strategy`], selecting alternatives client-side
///   when the vendor has no native minimum-distance mode;
/// - convert transport failures, error statuses, vendor error codes and empty
///   results into [`RouteOutcome::NoRoute`] instead of returning an error.
///
/// # Examples
///
/// ```rust
/// use async_trait::async_trait;
/// use geo::Coord;
/// use routecompare_core::{ProviderKind, RouteOutcome, RouteProvider, RoutingOptions};
///
/// struct NeverRoutes;
///
/// #[async_trait]
/// impl RouteProvider for NeverRoutes {
///     fn kind(&self) -> ProviderKind {
///         ProviderKind::Osrm
///     }
///
///     async fn route(
///         &self,
///         _origin: Coord<f64>,
///         _destination: Coord<f64>,
///         _options: &RoutingOptions,
///     ) -> RouteOutcome {
///         RouteOutcome::NoRoute
///     }
/// }
/// ```
#[async_trait]
pub trait RouteProvider: Send + Sync {
    /// Which provider this adapter talks to.
    fn kind(&self) -> ProviderKind;

    /// Return the preferred route from `origin` to `destination`.
    async fn route(
        &self,
        origin: Coord<f64>,
        destination: Coord<f64>,
        options: &RoutingOptions,
    ) -> RouteOutcome;
}

/// Errors from [`RoadSnapper::nearest_road`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SnapError {
    /// The provider answered but found no road near the point.
    #[error("no road found near the requested point")]
    NoRoadFound,
    /// The provider could not be reached or returned an error.
    #[error("road snapping unavailable: {message}")]
    Unavailable {
        /// Description of the failure.
        message: String,
    },
}

/// Move a raw coordinate onto the nearest routable road.
#[async_trait]
pub trait RoadSnapper: Send + Sync {
    /// Return the closest point on the road network to `point`.
    async fn nearest_road(&self, point: Coord<f64>) -> Result<Coord<f64>, SnapError>;
}
