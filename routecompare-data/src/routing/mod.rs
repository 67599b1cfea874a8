//! HTTP adapters implementing [`routecompare_core::RouteProvider`].
//!
//! Each adapter translates one vendor's request and response format into a
//! [`ProviderRoute`]. Failures of any kind are logged at `warn` and reported
//! to the comparator as [`RouteOutcome::NoRoute`].
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//! use geo::Coord;
//! use routecompare_core::{RouteProvider, RoutingOptions};
//! use routecompare_data::routing::{HttpProviderConfig, OsrmRouting};
//!
//! # async fn demo() -> Result<(), routecompare_data::routing::ProviderBuildError> {
//! let config = HttpProviderConfig::new("http://localhost:5000")
//!     .with_timeout(Duration::from_secs(10))
//!     .with_user_agent("my-app/1.0");
//! let provider = OsrmRouting::with_config(config)?;
//!
//! let outcome = provider
//!     .route(
//!         Coord { x: 9.11, y: 48.79 },
//!         Coord { x: 9.18, y: 48.86 },
//!         &RoutingOptions::default(),
//!     )
//!     .await;
//! println!("found: {}", outcome.is_found());
//! # Ok(())
//! # }
//! ```

mod config;
mod error;
mod google;
mod graphhopper;
mod here;
mod http;
mod osrm;
#[cfg(test)]
mod test_server;

use std::fmt;
use std::str::FromStr;

use log::{debug, warn};
use routecompare_core::{ProviderKind, ProviderRoute, RouteOutcome, RouteStrategy};
use thiserror::Error;

pub use config::{DEFAULT_USER_AGENT, HttpProviderConfig, ProviderBuildError};
pub use error::ProviderError;
pub use google::{GOOGLE_DIRECTIONS_URL, GoogleDirections, GoogleDirectionsConfig};
pub use graphhopper::{GRAPHHOPPER_ROUTE_URL, GraphHopperConfig, GraphHopperRouting};
pub use here::{HERE_ROUTES_URL, HereRouting, HereRoutingConfig};
pub use osrm::{OSRM_DEMO_URL, OsrmConfig, OsrmRouting, OsrmSnapper};

/// Log and drop an adapter failure.
fn absorb(kind: ProviderKind, result: Result<ProviderRoute, ProviderError>) -> RouteOutcome {
    match result {
        Ok(route) => RouteOutcome::Found(route),
        Err(err) => {
            warn!("{kind} returned no route: {err}");
            RouteOutcome::NoRoute
        }
    }
}

/// Convert a vendor's alternatives and pick one by strategy.
///
/// Alternatives that fail to convert are skipped. The first failure is
/// returned only when none survive.
fn choose_alternative<T>(
    kind: ProviderKind,
    alternatives: Vec<T>,
    strategy: RouteStrategy,
    convert: impl Fn(T) -> Result<ProviderRoute, ProviderError>,
) -> Result<ProviderRoute, ProviderError> {
    let mut routes = Vec::with_capacity(alternatives.len());
    let mut first_error = None;
    for alternative in alternatives {
        match convert(alternative) {
            Ok(route) => routes.push(route),
            Err(err) => {
                debug!("skipping unusable {kind} alternative: {err}");
                first_error.get_or_insert(err);
            }
        }
    }
    if routes.is_empty() {
        return Err(first_error.unwrap_or(ProviderError::NoRoute));
    }
    let chosen = match strategy {
        RouteStrategy::Fastest => routes.into_iter().next(),
        RouteStrategy::Shortest => strategy.select(routes),
    };
    chosen.ok_or(ProviderError::NoRoute)
}

/// Engine behind the open-data provider slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OpenDataBackend {
    /// OSRM route service.
    #[default]
    Osrm,
    /// GraphHopper routing API.
    GraphHopper,
}

impl OpenDataBackend {
    /// Provider kind the backend reports as.
    #[must_use]
    pub const fn kind(self) -> ProviderKind {
        match self {
            Self::Osrm => ProviderKind::Osrm,
            Self::GraphHopper => ProviderKind::GraphHopper,
        }
    }
}

impl fmt::Display for OpenDataBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.kind().as_str())
    }
}

/// Error returned when parsing an unknown backend name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown open-data backend {value:?}; expected \"osrm\" or \"graphhopper\"")]
pub struct ParseBackendError {
    /// Rejected input.
    pub value: String,
}

impl FromStr for OpenDataBackend {
    type Err = ParseBackendError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "osrm" => Ok(Self::Osrm),
            "graphhopper" => Ok(Self::GraphHopper),
            _ => Err(ParseBackendError {
                value: s.to_owned(),
            }),
        }
    }
}
