//! OSRM route and nearest services.
//!
//! See: <http://project-osrm.org/docs/v5.24.0/api/#route-service>

use std::time::Duration;

use async_trait::async_trait;
use geo::Coord;
use log::debug;
use routecompare_core::{
    ProviderKind, ProviderRoute, RoadSnapper, Route, RouteDetails, RouteOutcome, RouteProvider,
    RouteStrategy, RoutingOptions, SnapError,
};
use serde::Deserialize;

use super::{absorb, choose_alternative};
use super::config::{HttpProviderConfig, ProviderBuildError};
use super::error::ProviderError;
use super::http::JsonEndpoint;
use crate::polyline::decode_polyline;

/// Public OSRM demo server.
pub const OSRM_DEMO_URL: &str = "https://router.project-osrm.org";
const DEFAULT_PROFILE: &str = "driving";

/// OSRM Route API response.
///
/// `code` is `"Ok"` on success; `"NoRoute"` means the points are not
/// connected, other codes describe invalid requests.
#[derive(Debug, Deserialize)]
pub(crate) struct RouteResponse {
    code: String,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    routes: Vec<OsrmRoute>,
}

#[derive(Debug, Deserialize)]
struct OsrmRoute {
    geometry: String,
    distance: f64,
    duration: f64,
    #[serde(default)]
    legs: Vec<OsrmLeg>,
}

#[derive(Debug, Deserialize)]
struct OsrmLeg {
    #[serde(default)]
    steps: Vec<OsrmStep>,
}

#[derive(Debug, Deserialize)]
struct OsrmStep {
    #[serde(default)]
    name: String,
    maneuver: Maneuver,
}

#[derive(Debug, Deserialize)]
struct Maneuver {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    modifier: Option<String>,
}

/// OSRM Nearest API response.
#[derive(Debug, Deserialize)]
pub(crate) struct NearestResponse {
    code: String,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    waypoints: Vec<Waypoint>,
}

#[derive(Debug, Deserialize)]
struct Waypoint {
    location: [f64; 2],
}

/// Settings shared by [`OsrmRouting`] and [`OsrmSnapper`].
#[derive(Debug, Clone)]
pub struct OsrmConfig {
    /// Profile segment of the request path (`driving`, `bike`, `foot`).
    pub profile: String,
    /// Connection settings; defaults to [`OSRM_DEMO_URL`].
    pub http: HttpProviderConfig,
}

impl Default for OsrmConfig {
    fn default() -> Self {
        Self::from(HttpProviderConfig::new(OSRM_DEMO_URL))
    }
}

impl From<HttpProviderConfig> for OsrmConfig {
    fn from(http: HttpProviderConfig) -> Self {
        Self {
            profile: DEFAULT_PROFILE.to_owned(),
            http,
        }
    }
}

impl OsrmConfig {
    /// Set the routing profile.
    #[must_use]
    pub fn with_profile(mut self, profile: impl Into<String>) -> Self {
        self.profile = profile.into();
        self
    }

    /// Set the server URL.
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

/// Driving routes from an OSRM server.
///
/// OSRM always optimises for time, so `shortest` requests alternatives and
/// keeps the one with the smallest distance.
#[derive(Debug, Clone)]
pub struct OsrmRouting {
    endpoint: JsonEndpoint,
    profile: String,
}

impl OsrmRouting {
    /// Create an adapter for the OSRM server at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build.
    pub fn new(base_url: impl Into<String>) -> Result<Self, ProviderBuildError> {
        Self::from_config(OsrmConfig::default().with_base_url(base_url))
    }

    /// Create an adapter with explicit connection settings and the default
    /// profile.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build.
    pub fn with_config(config: HttpProviderConfig) -> Result<Self, ProviderBuildError> {
        Self::from_config(OsrmConfig::from(config))
    }

    /// Create an adapter from its full settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build.
    pub fn from_config(config: OsrmConfig) -> Result<Self, ProviderBuildError> {
        Ok(Self {
            endpoint: JsonEndpoint::new(config.http)?,
            profile: config.profile,
        })
    }

    /// Build the route URL: `{base_url}/route/v1/{profile}/{lon},{lat};{lon},{lat}`.
    fn route_url(&self, origin: Coord<f64>, destination: Coord<f64>) -> String {
        format!(
            "{}/route/v1/{}/{},{};{},{}",
            self.endpoint.config().trimmed_base_url(),
            self.profile,
            origin.x,
            origin.y,
            destination.x,
            destination.y
        )
    }

    fn query(options: &RoutingOptions) -> Vec<(&'static str, String)> {
        let mut query = vec![
            ("overview", "full".to_owned()),
            ("geometries", "polyline".to_owned()),
            ("steps", "true".to_owned()),
        ];
        if options.strategy == RouteStrategy::Shortest {
            query.push(("alternatives", "true".to_owned()));
        }
        query
    }

    async fn fetch(
        &self,
        origin: Coord<f64>,
        destination: Coord<f64>,
        options: &RoutingOptions,
    ) -> Result<ProviderRoute, ProviderError> {
        let url = self.route_url(origin, destination);
        let response: RouteResponse = self.endpoint.get_json(&url, &Self::query(options)).await?;
        parse_route_response(response, options.strategy)
    }
}

#[async_trait]
impl RouteProvider for OsrmRouting {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Osrm
    }

    async fn route(
        &self,
        origin: Coord<f64>,
        destination: Coord<f64>,
        options: &RoutingOptions,
    ) -> RouteOutcome {
        debug!("requesting OSRM route with strategy {}", options.strategy);
        absorb(
            ProviderKind::Osrm,
            self.fetch(origin, destination, options).await,
        )
    }
}

pub(crate) fn parse_route_response(
    response: RouteResponse,
    strategy: RouteStrategy,
) -> Result<ProviderRoute, ProviderError> {
    match response.code.as_str() {
        "Ok" => {}
        "NoRoute" => return Err(ProviderError::NoRoute),
        _ => {
            return Err(ProviderError::Service {
                code: response.code,
                message: response.message.unwrap_or_default(),
            });
        }
    }

    choose_alternative(ProviderKind::Osrm, response.routes, strategy, convert_route)
}

fn convert_route(route: OsrmRoute) -> Result<ProviderRoute, ProviderError> {
    let geometry = Route::new(decode_polyline(&route.geometry)?)?;
    let instructions = route
        .legs
        .iter()
        .flat_map(|leg| &leg.steps)
        .map(describe_step);
    let details = RouteDetails::new(route.distance, route.duration, instructions)?;
    Ok(ProviderRoute::new(geometry, details))
}

/// Render a manoeuvre as text, e.g. `"Turn left onto Hauptstraße"`.
fn describe_step(step: &OsrmStep) -> String {
    if step.maneuver.kind == "depart" {
        return format!("Head on {}", step.name).trim_end().to_owned();
    }
    let mut words = vec![title_case(&step.maneuver.kind.replace('_', " "))];
    words.extend(
        step.maneuver
            .modifier
            .iter()
            .filter(|modifier| !modifier.is_empty())
            .cloned(),
    );
    if !step.name.is_empty() {
        words.push(format!("onto {}", step.name));
    }
    words.join(" ")
}

fn title_case(text: &str) -> String {
    text.split(' ')
        .map(|word| {
            let mut chars = word.chars();
            chars.next().map_or_else(String::new, |first| {
                first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect()
            })
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Snaps points onto the nearest routable road with OSRM's nearest service.
#[derive(Debug, Clone)]
pub struct OsrmSnapper {
    endpoint: JsonEndpoint,
    profile: String,
}

impl OsrmSnapper {
    /// Create a snapper for the OSRM server at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build.
    pub fn new(base_url: impl Into<String>) -> Result<Self, ProviderBuildError> {
        Self::from_config(OsrmConfig::default().with_base_url(base_url))
    }

    /// Create a snapper with explicit connection settings and the default
    /// profile.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build.
    pub fn with_config(config: HttpProviderConfig) -> Result<Self, ProviderBuildError> {
        Self::from_config(OsrmConfig::from(config))
    }

    /// Create a snapper from its full settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build.
    pub fn from_config(config: OsrmConfig) -> Result<Self, ProviderBuildError> {
        Ok(Self {
            endpoint: JsonEndpoint::new(config.http)?,
            profile: config.profile,
        })
    }

    fn nearest_url(&self, point: Coord<f64>) -> String {
        format!(
            "{}/nearest/v1/{}/{},{}",
            self.endpoint.config().trimmed_base_url(),
            self.profile,
            point.x,
            point.y
        )
    }
}

#[async_trait]
impl RoadSnapper for OsrmSnapper {
    async fn nearest_road(&self, point: Coord<f64>) -> Result<Coord<f64>, SnapError> {
        let url = self.nearest_url(point);
        let response: NearestResponse = self
            .endpoint
            .get_json(&url, &[("number", "1".to_owned())])
            .await
            .map_err(|err| SnapError::Unavailable {
                message: err.to_string(),
            })?;
        parse_nearest(response)
    }
}

pub(crate) fn parse_nearest(response: NearestResponse) -> Result<Coord<f64>, SnapError> {
    match response.code.as_str() {
        "Ok" => {}
        "NoSegment" => return Err(SnapError::NoRoadFound),
        _ => {
            return Err(SnapError::Unavailable {
                message: format!(
                    "{}: {}",
                    response.code,
                    response.message.unwrap_or_default()
                ),
            });
        }
    }
    response
        .waypoints
        .first()
        .map(|waypoint| Coord {
            x: waypoint.location[0],
            y: waypoint.location[1],
        })
        .ok_or(SnapError::NoRoadFound)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};

    #[fixture]
    fn route_response() -> RouteResponse {
        serde_json::from_str(
            r#"{
                "code": "Ok",
                "routes": [
                    {
                        "geometry": "_gzhH_jpv@?g{Co}@g{C",
                        "distance": 4321.5,
                        "duration": 402.1,
                        "legs": [{"steps": [
                            {"name": "Solitudestraße", "maneuver": {"type": "depart", "bearing_after": 90}},
                            {"name": "Hauptstraße", "maneuver": {"type": "turn", "modifier": "left"}},
                            {"name": "", "maneuver": {"type": "end_of_road", "modifier": "right"}},
                            {"name": "Hauptstraße", "maneuver": {"type": "turn", "modifier": "left"}},
                            {"name": "Am Markt", "maneuver": {"type": "arrive"}}
                        ]}]
                    },
                    {
                        "geometry": "_p~iF~ps|U_ulLnnqC",
                        "distance": 3990.0,
                        "duration": 455.0,
                        "legs": []
                    }
                ],
                "waypoints": []
            }"#,
        )
        .expect("fixture should deserialise")
    }

    #[rstest]
    fn synthesises_instructions_from_steps(route_response: RouteResponse) {
        let route =
            parse_route_response(route_response, RouteStrategy::Fastest).expect("route");
        assert_eq!(route.details.distance(), 4321.5);
        assert_eq!(route.details.duration(), 402.1);
        assert_eq!(
            route.details.instructions(),
            [
                "Head on Solitudestraße",
                "Turn left onto Hauptstraße",
                "End Of Road right",
                "Arrive onto Am Markt",
            ]
        );
    }

    #[rstest]
    fn shortest_picks_minimum_distance(route_response: RouteResponse) {
        let route =
            parse_route_response(route_response, RouteStrategy::Shortest).expect("route");
        assert_eq!(route.details.distance(), 3990.0);
    }

    #[rstest]
    #[case(r#"{"code": "NoRoute", "message": "Impossible route between points"}"#)]
    #[case(r#"{"code": "Ok", "routes": []}"#)]
    fn missing_routes_are_no_route(#[case] json: &str) {
        let response: RouteResponse = serde_json::from_str(json).expect("fixture");
        assert!(matches!(
            parse_route_response(response, RouteStrategy::Fastest),
            Err(ProviderError::NoRoute)
        ));
    }

    #[rstest]
    fn invalid_queries_surface_service_error() {
        let response: RouteResponse =
            serde_json::from_str(r#"{"code": "InvalidQuery", "message": "Query string malformed"}"#)
                .expect("fixture");
        match parse_route_response(response, RouteStrategy::Fastest) {
            Err(ProviderError::Service { code, message }) => {
                assert_eq!(code, "InvalidQuery");
                assert_eq!(message, "Query string malformed");
            }
            other => panic!("expected service error, got {other:?}"),
        }
    }

    #[rstest]
    fn route_url_orders_lon_before_lat() {
        let provider = OsrmRouting::new("http://osrm.example.com/").expect("provider should build");
        let url = provider.route_url(Coord { x: 9.1, y: 48.8 }, Coord { x: 9.2, y: 48.85 });
        assert_eq!(
            url,
            "http://osrm.example.com/route/v1/driving/9.1,48.8;9.2,48.85"
        );
    }

    #[rstest]
    fn shortest_requests_alternatives() {
        let query = OsrmRouting::query(&RoutingOptions::new(RouteStrategy::Shortest));
        assert!(query.contains(&("alternatives", "true".to_owned())));
        let fastest = OsrmRouting::query(&RoutingOptions::new(RouteStrategy::Fastest));
        assert!(fastest.iter().all(|(name, _)| *name != "alternatives"));
    }

    #[rstest]
    fn nearest_returns_first_waypoint() {
        let response: NearestResponse = serde_json::from_str(
            r#"{"code": "Ok", "waypoints": [
                {"location": [9.1512, 48.8301], "distance": 12.4, "name": "Hauptstraße"}
            ]}"#,
        )
        .expect("fixture");
        assert_eq!(
            parse_nearest(response),
            Ok(Coord {
                x: 9.1512,
                y: 48.8301
            })
        );
    }

    #[rstest]
    #[case(r#"{"code": "NoSegment", "message": "Could not find a matching segment"}"#)]
    #[case(r#"{"code": "Ok", "waypoints": []}"#)]
    fn nearest_without_segment_is_no_road(#[case] json: &str) {
        let response: NearestResponse = serde_json::from_str(json).expect("fixture");
        assert_eq!(parse_nearest(response), Err(SnapError::NoRoadFound));
    }

    #[rstest]
    fn nearest_url_uses_single_coordinate() {
        let snapper = OsrmSnapper::new("http://osrm.example.com").expect("snapper should build");
        assert_eq!(
            snapper.nearest_url(Coord { x: 9.15, y: 48.83 }),
            "http://osrm.example.com/nearest/v1/driving/9.15,48.83"
        );
    }

    #[rstest]
    fn profile_is_part_of_the_path() {
        let config = OsrmConfig::default()
            .with_base_url("http://osrm.example.com")
            .with_profile("bike");
        let provider = OsrmRouting::from_config(config.clone()).expect("provider should build");
        assert_eq!(
            provider.route_url(Coord { x: 9.1, y: 48.8 }, Coord { x: 9.2, y: 48.85 }),
            "http://osrm.example.com/route/v1/bike/9.1,48.8;9.2,48.85"
        );
        let snapper = OsrmSnapper::from_config(config.with_profile("foot"))
            .expect("snapper should build");
        assert_eq!(
            snapper.nearest_url(Coord { x: 9.15, y: 48.83 }),
            "http://osrm.example.com/nearest/v1/foot/9.15,48.83"
        );
    }

    #[rstest]
    fn config_defaults_to_demo_server() {
        let config = OsrmConfig::default();
        assert_eq!(config.profile, "driving");
        assert_eq!(config.http.base_url, OSRM_DEMO_URL);
        assert_eq!(config.http.user_agent, crate::routing::DEFAULT_USER_AGENT);
    }
}
