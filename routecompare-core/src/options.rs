//! Routing options shared by every provider.
//!
//! Provider-specific settings (travel mode, endpoint, credentials) live in
//! each adapter's own configuration type. This module only carries what the
//! comparison itself controls: which route a provider should prefer.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::ProviderRoute;

/// Which route a provider should return when several exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum RouteStrategy {
    /// Minimum travel time. Most vendors return this by default.
    Fastest,
    /// Minimum distance.
    #[default]
    Shortest,
}

impl RouteStrategy {
    /// Lower-case name used on the command line and in requests.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Fastest => "fastest",
            Self::Shortest => "shortest",
        }
    }

    /// Pick the preferred route among alternatives.
    ///
    /// `Fastest` keeps the minimum duration and `Shortest` the minimum
    /// distance. Ties keep the earliest candidate, preserving the vendor's own
    /// ranking.
    ///
    /// # Examples
    /// ```
    /// use routecompare_core::{ProviderRoute, Route, RouteDetails, RouteStrategy};
    ///
    /// let make = |distance: f64, duration: f64| {
    ///     let route = Route::from_lon_lat([(0.0, 0.0), (0.1, 0.1)]).unwrap();
    ///     ProviderRoute::new(route, RouteDetails::new(distance, duration, ["go"]).unwrap())
    /// };
    /// let picked = RouteStrategy::Shortest
    ///     .select(vec![make(900.0, 60.0), make(700.0, 90.0)])
    ///     .unwrap();
    /// assert_eq!(picked.details.distance(), 700.0);
    /// ```
    pub fn select<I>(self, routes: I) -> Option<ProviderRoute>
    where
        I: IntoIterator<Item = ProviderRoute>,
    {
        let iter = routes.into_iter();
        match self {
            Self::Fastest => {
                iter.min_by(|a, b| a.details.duration().total_cmp(&b.details.duration()))
            }
            Self::Shortest => {
                iter.min_by(|a, b| a.details.distance().total_cmp(&b.details.distance()))
            }
        }
    }
}

impl fmt::Display for RouteStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown strategy name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown routing strategy {value:?} (expected \"fastest\" or \"shortest\")")]
pub struct ParseStrategyError {
    /// Rejected input.
    pub value: String,
}

impl FromStr for RouteStrategy {
    type Err = ParseStrategyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fastest" => Ok(Self::Fastest),
            "shortest" => Ok(Self::Shortest),
            _ => Err(ParseStrategyError {
                value: s.to_owned(),
            }),
        }
    }
}

/// Options passed unchanged to every provider for one comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RoutingOptions {
    /// Route preference.
    pub strategy: RouteStrategy,
}

impl RoutingOptions {
    /// Options with the given strategy.
    pub const fn new(strategy: RouteStrategy) -> Self {
        Self { strategy }
    }

    /// Replace the strategy.
    #[must_use]
    pub const fn with_strategy(mut self, strategy: RouteStrategy) -> Self {
        self.strategy = strategy;
        self
    }
}
