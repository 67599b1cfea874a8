//! HERE Routing API v8 adapter.
//!
//! See: <https://www.here.com/docs/bundle/routing-api-v8-api-reference/page/index.html>

use std::time::Duration;

use async_trait::async_trait;
use geo::Coord;
use log::debug;
use routecompare_core::{
    ProviderKind, ProviderRoute, Route, RouteDetails, RouteOutcome, RouteProvider, RouteStrategy,
    RoutingOptions,
};
use serde::Deserialize;

use super::absorb;
use super::config::{HttpProviderConfig, ProviderBuildError, require_api_key};
use super::error::ProviderError;
use super::http::{JsonEndpoint, lat_lon};
use crate::polyline::decode_flexible;

/// Public routing endpoint.
pub const HERE_ROUTES_URL: &str = "https://router.hereapi.com/v8/routes";
const DEFAULT_TRANSPORT_MODE: &str = "car";

#[derive(Debug, Deserialize)]
pub(crate) struct RoutesResponse {
    #[serde(default)]
    routes: Vec<HereRoute>,
}

#[derive(Debug, Deserialize)]
struct HereRoute {
    #[serde(default)]
    sections: Vec<Section>,
}

#[derive(Debug, Deserialize)]
struct Section {
    polyline: String,
    summary: Summary,
    #[serde(default)]
    actions: Vec<Action>,
}

#[derive(Debug, Deserialize)]
struct Summary {
    length: f64,
    duration: f64,
}

#[derive(Debug, Deserialize)]
struct Action {
    #[serde(default)]
    instruction: Option<String>,
}

/// Settings for [`HereRouting`].
#[derive(Debug, Clone)]
pub struct HereRoutingConfig {
    /// Transport mode (`car`, `truck`, `pedestrian`, `bicycle`, `scooter`).
    pub transport_mode: String,
    /// Connection settings; defaults to [`HERE_ROUTES_URL`].
    pub http: HttpProviderConfig,
}

impl Default for HereRoutingConfig {
    fn default() -> Self {
        Self::from(HttpProviderConfig::new(HERE_ROUTES_URL))
    }
}

impl From<HttpProviderConfig> for HereRoutingConfig {
    fn from(http: HttpProviderConfig) -> Self {
        Self {
            transport_mode: DEFAULT_TRANSPORT_MODE.to_owned(),
            http,
        }
    }
}

impl HereRoutingConfig {
    /// Set the transport mode.
    #[must_use]
    pub fn with_transport_mode(mut self, transport_mode: impl Into<String>) -> Self {
        self.transport_mode = transport_mode.into();
        self
    }

    /// Set the endpoint URL.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.http.base_url = base_url.into();
        self
    }

    /// Set the request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.http = self.http.with_timeout(timeout);
        self
    }

    /// Set the user agent string.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.http = self.http.with_user_agent(user_agent);
        self
    }
}

/// Car routes from HERE, which implements both strategies natively through
/// `routingMode`.
#[derive(Debug, Clone)]
pub struct HereRouting {
    endpoint: JsonEndpoint,
    api_key: String,
    transport_mode: String,
}

impl HereRouting {
    /// Create an adapter against the public endpoint.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is blank or the HTTP client fails to build.
    pub fn new(api_key: impl Into<String>) -> Result<Self, ProviderBuildError> {
        Self::from_config(api_key, HereRoutingConfig::default())
    }

    /// Create an adapter with explicit connection settings and the default
    /// transport mode.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is blank or the HTTP client fails to build.
    pub fn with_config(
        api_key: impl Into<String>,
        config: HttpProviderConfig,
    ) -> Result<Self, ProviderBuildError> {
        Self::from_config(api_key, HereRoutingConfig::from(config))
    }

    /// Create an adapter from its full settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is blank or the HTTP client fails to build.
    pub fn from_config(
        api_key: impl Into<String>,
        config: HereRoutingConfig,
    ) -> Result<Self, ProviderBuildError> {
        Ok(Self {
            api_key: require_api_key(ProviderKind::Here.display_name(), api_key)?,
            endpoint: JsonEndpoint::new(config.http)?,
            transport_mode: config.transport_mode,
        })
    }

    fn query(
        &self,
        origin: Coord<f64>,
        destination: Coord<f64>,
        options: &RoutingOptions,
    ) -> Vec<(&'static str, String)> {
        let routing_mode = match options.strategy {
            RouteStrategy::Fastest => "fast",
            RouteStrategy::Shortest => "short",
        };
        vec![
            ("transportMode", self.transport_mode.clone()),
            ("origin", lat_lon(origin)),
            ("destination", lat_lon(destination)),
            ("return", "polyline,summary,actions,instructions".to_owned()),
            ("routingMode", routing_mode.to_owned()),
            ("apiKey", self.api_key.clone()),
        ]
    }

    async fn fetch(
        &self,
        origin: Coord<f64>,
        destination: Coord<f64>,
        options: &RoutingOptions,
    ) -> Result<ProviderRoute, ProviderError> {
        let url = self.endpoint.config().trimmed_base_url();
        let response: RoutesResponse = self
            .endpoint
            .get_json(url, &self.query(origin, destination, options))
            .await?;
        parse_routes(response)
    }
}

#[async_trait]
impl RouteProvider for HereRouting {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Here
    }

    async fn route(
        &self,
        origin: Coord<f64>,
        destination: Coord<f64>,
        options: &RoutingOptions,
    ) -> RouteOutcome {
        debug!("requesting HERE route with strategy {}", options.strategy);
        absorb(
            ProviderKind::Here,
            self.fetch(origin, destination, options).await,
        )
    }
}

/// Concatenate every section of the first route.
pub(crate) fn parse_routes(response: RoutesResponse) -> Result<ProviderRoute, ProviderError> {
    let route = response
        .routes
        .into_iter()
        .next()
        .ok_or(ProviderError::NoRoute)?;
    if route.sections.is_empty() {
        return Err(ProviderError::NoRoute);
    }

    let mut coords = Vec::new();
    let mut length = 0.0;
    let mut duration = 0.0;
    let mut instructions = Vec::new();
    for section in route.sections {
        coords.extend(decode_flexible(&section.polyline)?);
        length += section.summary.length;
        duration += section.summary.duration;
        instructions.extend(
            section
                .actions
                .into_iter()
                .filter_map(|action| action.instruction)
                .filter(|text| !text.is_empty()),
        );
    }

    let details = RouteDetails::new(length, duration, instructions)?;
    Ok(ProviderRoute::new(Route::new(coords)?, details))
}
