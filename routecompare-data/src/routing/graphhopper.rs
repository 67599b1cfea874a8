//! GraphHopper Routing API adapter.
//!
//! See: <https://docs.graphhopper.com/#tag/Routing-API>

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use geo::Coord;
use log::{debug, warn};
use routecompare_core::{
    ProviderKind, ProviderRoute, Route, RouteDetails, RouteOutcome, RouteProvider, RouteStrategy,
    RoutingOptions,
};
use serde::Deserialize;

use super::{absorb, choose_alternative};
use super::config::{HttpProviderConfig, ProviderBuildError, require_api_key};
use super::error::ProviderError;
use super::http::{JsonEndpoint, lat_lon};
use crate::DailyUsageCounter;

/// Public GraphHopper endpoint.
pub const GRAPHHOPPER_ROUTE_URL: &str = "https://graphhopper.com/api/1/route";
const DEFAULT_PROFILE: &str = "car";

#[derive(Debug, Deserialize)]
pub(crate) struct RouteResponse {
    #[serde(default)]
    paths: Vec<Path>,
}

#[derive(Debug, Deserialize)]
struct Path {
    distance: f64,
    /// Travel time in milliseconds.
    time: f64,
    points: Points,
    #[serde(default)]
    instructions: Vec<Instruction>,
}

#[derive(Debug, Deserialize)]
struct Points {
    coordinates: Vec<Vec<f64>>,
}

#[derive(Debug, Deserialize)]
struct Instruction {
    #[serde(default)]
    text: String,
}

/// Settings for [`GraphHopperRouting`].
#[derive(Debug, Clone)]
pub struct GraphHopperConfig {
    /// Vehicle profile (`car`, `bike`, `foot`).
    pub profile: String,
    /// Connection settings; defaults to [`GRAPHHOPPER_ROUTE_URL`].
    pub http: HttpProviderConfig,
}

impl Default for GraphHopperConfig {
    fn default() -> Self {
        Self::from(HttpProviderConfig::new(GRAPHHOPPER_ROUTE_URL))
    }
}

impl From<HttpProviderConfig> for GraphHopperConfig {
    fn from(http: HttpProviderConfig) -> Self {
        Self {
            profile: DEFAULT_PROFILE.to_owned(),
            http,
        }
    }
}

impl GraphHopperConfig {
    /// Set the vehicle profile.
    #[must_use]
    pub fn with_profile(mut self, profile: impl Into<String>) -> Self {
        self.profile = profile.into();
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

/// Car routes from GraphHopper.
///
/// `shortest` switches to the alternative-route algorithm and keeps the path
/// with the smallest distance. Every successful HTTP response is recorded
/// in the optional [`DailyUsageCounter`].
#[derive(Debug, Clone)]
pub struct GraphHopperRouting {
    endpoint: JsonEndpoint,
    api_key: String,
    profile: String,
    usage: Option<Arc<DailyUsageCounter>>,
}

impl GraphHopperRouting {
    /// Create an adapter against the public endpoint.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is blank or the HTTP client fails to build.
    pub fn new(api_key: impl Into<String>) -> Result<Self, ProviderBuildError> {
        Self::from_config(api_key, GraphHopperConfig::default())
    }

    /// Create an adapter with explicit connection settings and the default
    /// profile.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is blank or the HTTP client fails to build.
    pub fn with_config(
        api_key: impl Into<String>,
        config: HttpProviderConfig,
    ) -> Result<Self, ProviderBuildError> {
        Self::from_config(api_key, GraphHopperConfig::from(config))
    }

    /// Create an adapter from its full settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is blank or the HTTP client fails to build.
    pub fn from_config(
        api_key: impl Into<String>,
        config: GraphHopperConfig,
    ) -> Result<Self, ProviderBuildError> {
        Ok(Self {
            api_key: require_api_key(ProviderKind::GraphHopper.display_name(), api_key)?,
            endpoint: JsonEndpoint::new(config.http)?,
            profile: config.profile,
            usage: None,
        })
    }

    /// Count successful requests in `counter`.
    #[must_use]
    pub fn with_usage_counter(mut self, counter: Arc<DailyUsageCounter>) -> Self {
        self.usage = Some(counter);
        self
    }

    fn query(
        &self,
        origin: Coord<f64>,
        destination: Coord<f64>,
        options: &RoutingOptions,
    ) -> Vec<(&'static str, String)> {
        let mut query = vec![
            ("point", lat_lon(origin)),
            ("point", lat_lon(destination)),
            ("profile", self.profile.clone()),
            ("calc_points", "true".to_owned()),
            ("points_encoded", "false".to_owned()),
            ("instructions", "true".to_owned()),
            ("type", "json".to_owned()),
        ];
        if options.strategy == RouteStrategy::Shortest {
            query.push(("algorithm", "alternative_route".to_owned()));
        }
        query.push(("key", self.api_key.clone()));
        query
    }

    async fn fetch(
        &self,
        origin: Coord<f64>,
        destination: Coord<f64>,
        options: &RoutingOptions,
    ) -> Result<ProviderRoute, ProviderError> {
        let url = self.endpoint.config().trimmed_base_url();
        let response = self
            .endpoint
            .send(url, &self.query(origin, destination, options))
            .await?;
        self.record_usage().await;
        let body: RouteResponse = self.endpoint.read_json(url, response).await?;
        parse_paths(body, options.strategy)
    }

    async fn record_usage(&self) {
        let Some(counter) = self.usage.as_ref().map(Arc::clone) else {
            return;
        };
        match tokio::task::spawn_blocking(move || counter.increment()).await {
            Ok(Ok(count)) => debug!("GraphHopper requests today: {count}"),
            Ok(Err(err)) => warn!("failed to record GraphHopper usage: {err}"),
            Err(err) => warn!("usage counter task failed: {err}"),
        }
    }
}

#[async_trait]
impl RouteProvider for GraphHopperRouting {
    fn kind(&self) -> ProviderKind {
        ProviderKind::GraphHopper
    }

    async fn route(
        &self,
        origin: Coord<f64>,
        destination: Coord<f64>,
        options: &RoutingOptions,
    ) -> RouteOutcome {
        debug!(
            "requesting GraphHopper route with strategy {}",
            options.strategy
        );
        absorb(
            ProviderKind::GraphHopper,
            self.fetch(origin, destination, options).await,
        )
    }
}

pub(crate) fn parse_paths(
    response: RouteResponse,
    strategy: RouteStrategy,
) -> Result<ProviderRoute, ProviderError> {
    choose_alternative(ProviderKind::GraphHopper, response.paths, strategy, convert_path)
}

fn convert_path(path: Path) -> Result<ProviderRoute, ProviderError> {
    let coords = path
        .points
        .coordinates
        .iter()
        .map(|position| match position.as_slice() {
            [lon, lat, ..] => Ok(Coord { x: *lon, y: *lat }),
            _ => Err(ProviderError::Parse {
                message: format!("GraphHopper position has {} values", position.len()),
            }),
        })
        .collect::<Result<Vec<_>, _>>()?;
    let instructions = path
        .instructions
        .into_iter()
        .map(|instruction| instruction.text)
        .filter(|text| !text.is_empty());
    let details = RouteDetails::new(path.distance, path.time / 1000.0, instructions)?;
    Ok(ProviderRoute::new(Route::new(coords)?, details))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::test_server::{block_on, serve_once};
    use rstest::{fixture, rstest};

    #[fixture]
    fn two_paths() -> RouteResponse {
        serde_json::from_str(
            r#"{
                "hints": {"visited_nodes.sum": 58},
                "info": {"copyrights": ["GraphHopper", "OpenStreetMap contributors"]},
                "paths": [
                    {
                        "distance": 5120.4,
                        "time": 431000,
                        "points_encoded": false,
                        "points": {"type": "LineString", "coordinates": [[9.1, 48.8], [9.125, 48.8, 250.0], [9.15, 48.81]]},
                        "instructions": [
                            {"text": "Continue onto Solitudestraße", "distance": 300.0},
                            {"text": "Turn right onto Hauptstraße", "distance": 4820.4},
                            {"text": "Arrive at destination", "distance": 0.0}
                        ]
                    },
                    {
                        "distance": 4800.0,
                        "time": 498500,
                        "points": {"coordinates": [[9.1, 48.8], [9.15, 48.81]]}
                    }
                ]
            }"#,
        )
        .expect("fixture should deserialise")
    }

    #[rstest]
    fn converts_milliseconds_to_seconds(two_paths: RouteResponse) {
        let route = parse_paths(two_paths, RouteStrategy::Fastest).expect("route");
        assert_eq!(route.details.duration(), 431.0);
        assert_eq!(route.details.distance(), 5120.4);
        assert_eq!(route.route.coords().len(), 3);
        assert_eq!(route.details.instructions().len(), 3);
    }

    #[rstest]
    fn shortest_picks_minimum_distance(two_paths: RouteResponse) {
        let route = parse_paths(two_paths, RouteStrategy::Shortest).expect("route");
        assert_eq!(route.details.distance(), 4800.0);
        assert_eq!(route.details.duration(), 498.5);
    }

    #[rstest]
    fn no_paths_is_no_route() {
        let response: RouteResponse = serde_json::from_str(r#"{"paths": []}"#).expect("fixture");
        assert!(matches!(
            parse_paths(response, RouteStrategy::Fastest),
            Err(ProviderError::NoRoute)
        ));
    }

    #[rstest]
    fn short_positions_are_rejected() {
        let response: RouteResponse = serde_json::from_str(
            r#"{"paths": [{"distance": 1.0, "time": 1000, "points": {"coordinates": [[9.1], [9.2, 48.8]]}}]}"#,
        )
        .expect("fixture");
        assert!(matches!(
            parse_paths(response, RouteStrategy::Fastest),
            Err(ProviderError::Parse { .. })
        ));
    }

    #[rstest]
    fn query_repeats_point_and_maps_strategy() {
        let provider = GraphHopperRouting::new("secret").expect("provider should build");
        let query = provider.query(
            Coord { x: 9.1, y: 48.8 },
            Coord { x: 9.2, y: 48.85 },
            &RoutingOptions::new(RouteStrategy::Shortest),
        );
        let points: Vec<&str> = query
            .iter()
            .filter(|(name, _)| *name == "point")
            .map(|(_, value)| value.as_str())
            .collect();
        assert_eq!(points, ["48.8,9.1", "48.85,9.2"]);
        assert!(query.contains(&("algorithm", "alternative_route".to_owned())));
        assert!(query.contains(&("points_encoded", "false".to_owned())));
        assert!(query.contains(&("profile", "car".to_owned())));
    }

    #[rstest]
    fn profile_can_be_overridden() {
        let config = GraphHopperConfig::default().with_profile("bike");
        let provider =
            GraphHopperRouting::from_config("secret", config).expect("provider should build");
        let query = provider.query(
            Coord { x: 9.1, y: 48.8 },
            Coord { x: 9.2, y: 48.85 },
            &RoutingOptions::new(RouteStrategy::Fastest),
        );
        assert!(query.contains(&("profile", "bike".to_owned())));
        assert!(query.iter().all(|(name, _)| *name != "algorithm"));
    }

    #[rstest]
    fn unusable_alternative_is_skipped() {
        let response: RouteResponse = serde_json::from_str(
            r#"{"paths": [
                {"distance": 900.0, "time": 60000, "points": {"coordinates": [[9.1]]}},
                {"distance": 1500.0, "time": 90000, "points": {"coordinates": [[9.1, 48.8], [9.12, 48.8]]}}
            ]}"#,
        )
        .expect("fixture");
        let route = parse_paths(response, RouteStrategy::Shortest).expect("route");
        assert_eq!(route.details.distance(), 1500.0);
    }

    #[rstest]
    fn decode_failures_never_echo_the_api_key() {
        let server = serve_once("200 OK", "<html>maintenance</html>");
        let config = GraphHopperConfig::default().with_base_url(server.url());
        let provider = GraphHopperRouting::from_config("SECRET-KEY-123", config)
            .expect("provider should build");

        let err = block_on(provider.fetch(
            Coord { x: 9.1, y: 48.8 },
            Coord { x: 9.2, y: 48.85 },
            &RoutingOptions::default(),
        ))
        .expect_err("request should fail");

        assert!(server.request_line().contains("key=SECRET-KEY-123"));
        assert!(matches!(err, ProviderError::Parse { .. }));
        assert!(!err.to_string().contains("SECRET-KEY-123"), "{err}");
    }
}
