//! Google Directions API adapter.
//!
//! See: <https://developers.google.com/maps/documentation/directions/get-directions>

use std::time::Duration;

use async_trait::async_trait;
use geo::Coord;
use log::debug;
use routecompare_core::{
    ProviderKind, ProviderRoute, Route, RouteDetails, RouteOutcome, RouteProvider, RouteStrategy,
    RoutingOptions,
};
use serde::Deserialize;

use super::{absorb, choose_alternative};
use super::config::{HttpProviderConfig, ProviderBuildError, require_api_key};
use super::error::ProviderError;
use super::http::{JsonEndpoint, lat_lon};
use crate::polyline::decode_polyline;

/// Public Directions endpoint.
pub const GOOGLE_DIRECTIONS_URL: &str = "https://maps.googleapis.com/maps/api/directions/json";
const DEFAULT_TRAVEL_MODE: &str = "driving";

#[derive(Debug, Deserialize)]
pub(crate) struct DirectionsResponse {
    status: String,
    #[serde(default)]
    error_message: Option<String>,
    #[serde(default)]
    routes: Vec<DirectionsRoute>,
}

#[derive(Debug, Deserialize)]
struct DirectionsRoute {
    overview_polyline: EncodedPoints,
    #[serde(default)]
    legs: Vec<Leg>,
}

#[derive(Debug, Deserialize)]
struct EncodedPoints {
    points: String,
}

#[derive(Debug, Deserialize)]
struct Leg {
    distance: Measure,
    duration: Measure,
    #[serde(default)]
    steps: Vec<Step>,
}

#[derive(Debug, Deserialize)]
struct Measure {
    value: f64,
}

#[derive(Debug, Deserialize)]
struct Step {
    #[serde(default)]
    html_instructions: String,
}

/// Settings for [`GoogleDirections`].
#[derive(Debug, Clone)]
pub struct GoogleDirectionsConfig {
    /// Travel mode (`driving`, `walking`, `bicycling`, `transit`).
    pub mode: String,
    /// Connection settings; defaults to [`GOOGLE_DIRECTIONS_URL`].
    pub http: HttpProviderConfig,
}

impl Default for GoogleDirectionsConfig {
    fn default() -> Self {
        Self::from(HttpProviderConfig::new(GOOGLE_DIRECTIONS_URL))
    }
}

impl From<HttpProviderConfig> for GoogleDirectionsConfig {
    fn from(http: HttpProviderConfig) -> Self {
        Self {
            mode: DEFAULT_TRAVEL_MODE.to_owned(),
            http,
        }
    }
}

impl GoogleDirectionsConfig {
    /// Set the travel mode.
    #[must_use]
    pub fn with_mode(mut self, mode: impl Into<String>) -> Self {
        self.mode = mode.into();
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

/// Driving directions from Google.
///
/// `fastest` keeps Google's first route; `shortest` asks for alternatives
/// and keeps the one with the smallest distance.
#[derive(Debug, Clone)]
pub struct GoogleDirections {
    endpoint: JsonEndpoint,
    api_key: String,
    mode: String,
}

impl GoogleDirections {
    /// Create an adapter against the public endpoint.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is blank or the HTTP client fails to build.
    pub fn new(api_key: impl Into<String>) -> Result<Self, ProviderBuildError> {
        Self::from_config(api_key, GoogleDirectionsConfig::default())
    }

    /// Create an adapter with explicit connection settings and the default
    /// travel mode.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is blank or the HTTP client fails to build.
    pub fn with_config(
        api_key: impl Into<String>,
        config: HttpProviderConfig,
    ) -> Result<Self, ProviderBuildError> {
        Self::from_config(api_key, GoogleDirectionsConfig::from(config))
    }

    /// Create an adapter from its full settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is blank or the HTTP client fails to build.
    pub fn from_config(
        api_key: impl Into<String>,
        config: GoogleDirectionsConfig,
    ) -> Result<Self, ProviderBuildError> {
        Ok(Self {
            api_key: require_api_key(ProviderKind::Google.display_name(), api_key)?,
            endpoint: JsonEndpoint::new(config.http)?,
            mode: config.mode,
        })
    }

    fn query(
        &self,
        origin: Coord<f64>,
        destination: Coord<f64>,
        options: &RoutingOptions,
    ) -> Vec<(&'static str, String)> {
        let mut query = vec![
            ("origin", lat_lon(origin)),
            ("destination", lat_lon(destination)),
            ("mode", self.mode.clone()),
        ];
        if options.strategy == RouteStrategy::Shortest {
            query.push(("alternatives", "true".to_owned()));
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
        let response: DirectionsResponse = self
            .endpoint
            .get_json(url, &self.query(origin, destination, options))
            .await?;
        parse_directions(response, options.strategy)
    }
}

#[async_trait]
impl RouteProvider for GoogleDirections {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Google
    }

    async fn route(
        &self,
        origin: Coord<f64>,
        destination: Coord<f64>,
        options: &RoutingOptions,
    ) -> RouteOutcome {
        debug!("requesting Google route with strategy {}", options.strategy);
        absorb(
            ProviderKind::Google,
            self.fetch(origin, destination, options).await,
        )
    }
}

pub(crate) fn parse_directions(
    response: DirectionsResponse,
    strategy: RouteStrategy,
) -> Result<ProviderRoute, ProviderError> {
    match response.status.as_str() {
        "OK" => {}
        "ZERO_RESULTS" | "NOT_FOUND" => return Err(ProviderError::NoRoute),
        _ => {
            return Err(ProviderError::Service {
                code: response.status,
                message: response.error_message.unwrap_or_default(),
            });
        }
    }

    choose_alternative(ProviderKind::Google, response.routes, strategy, convert_route)
}

fn convert_route(route: DirectionsRoute) -> Result<ProviderRoute, ProviderError> {
    let geometry = Route::new(decode_polyline(&route.overview_polyline.points)?)?;
    let leg = route.legs.into_iter().next().ok_or(ProviderError::Parse {
        message: "Google route has no legs".to_owned(),
    })?;
    let instructions = leg
        .steps
        .iter()
        .map(|step| strip_html(&step.html_instructions))
        .filter(|text| !text.is_empty());
    let details = RouteDetails::new(leg.distance.value, leg.duration.value, instructions)?;
    Ok(ProviderRoute::new(geometry, details))
}

/// Replace markup tags with spaces and collapse the whitespace left behind.
fn strip_html(html: &str) -> String {
    let mut text = String::with_capacity(html.len());
    let mut rest = html;
    while let Some(open) = rest.find('<') {
        text.push_str(&rest[..open]);
        let tail = &rest[open + 1..];
        let close = tail.find('>');
        let next_open = tail.find('<');
        match close {
            Some(close) if close > 0 && next_open.is_none_or(|next| close < next) => {
                text.push(' ');
                rest = &tail[close + 1..];
            }
            _ => {
                text.push('<');
                rest = tail;
            }
        }
    }
    text.push_str(rest);
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::test_server::{block_on, serve_once};
    use rstest::{fixture, rstest};

    fn parse(json: &str) -> DirectionsResponse {
        serde_json::from_str(json).expect("fixture should deserialise")
    }

    #[fixture]
    fn two_routes() -> DirectionsResponse {
        parse(
            r#"{
                "status": "OK",
                "routes": [
                    {
                        "overview_polyline": {"points": "_gzhH_jpv@?g{Co}@g{C"},
                        "legs": [{
                            "distance": {"value": 4200, "text": "4.2 km"},
                            "duration": {"value": 480, "text": "8 mins"},
                            "steps": [
                                {"html_instructions": "Head <b>east</b> on <b>Hauptstraße</b>"},
                                {"html_instructions": "Turn <b>left</b><div style=\"font-size:0.9em\">Destination will be on the right</div>"},
                                {"html_instructions": "Head <b>east</b> on <b>Hauptstraße</b>"}
                            ]
                        }]
                    },
                    {
                        "overview_polyline": {"points": "_p~iF~ps|U_ulLnnqC"},
                        "legs": [{
                            "distance": {"value": 3900},
                            "duration": {"value": 600},
                            "steps": []
                        }]
                    }
                ]
            }"#,
        )
    }

    #[rstest]
    fn fastest_keeps_first_route(two_routes: DirectionsResponse) {
        let route = parse_directions(two_routes, RouteStrategy::Fastest).expect("route");
        assert_eq!(route.details.distance(), 4200.0);
        assert_eq!(route.details.duration(), 480.0);
        assert_eq!(route.route.coords().len(), 3);
        assert!((route.route.start().x - 9.1).abs() < 1e-9);
        assert_eq!(
            route.details.instructions(),
            [
                "Head east on Hauptstraße",
                "Turn left Destination will be on the right",
            ]
        );
    }

    #[rstest]
    fn shortest_picks_minimum_distance(two_routes: DirectionsResponse) {
        let route = parse_directions(two_routes, RouteStrategy::Shortest).expect("route");
        assert_eq!(route.details.distance(), 3900.0);
        assert!(route.details.instructions().is_empty());
    }

    #[rstest]
    fn zero_results_is_no_route() {
        let response = parse(r#"{"status": "ZERO_RESULTS", "routes": []}"#);
        assert!(matches!(
            parse_directions(response, RouteStrategy::Fastest),
            Err(ProviderError::NoRoute)
        ));
    }

    #[rstest]
    fn vendor_errors_keep_their_code() {
        let response = parse(
            r#"{"status": "REQUEST_DENIED", "error_message": "The provided API key is invalid.", "routes": []}"#,
        );
        match parse_directions(response, RouteStrategy::Fastest) {
            Err(ProviderError::Service { code, message }) => {
                assert_eq!(code, "REQUEST_DENIED");
                assert_eq!(message, "The provided API key is invalid.");
            }
            other => panic!("expected service error, got {other:?}"),
        }
    }

    #[rstest]
    fn single_point_geometry_is_rejected() {
        let response = parse(
            r#"{"status": "OK", "routes": [{
                "overview_polyline": {"points": "_gzhH_jpv@"},
                "legs": [{"distance": {"value": 0}, "duration": {"value": 0}}]
            }]}"#,
        );
        assert!(matches!(
            parse_directions(response, RouteStrategy::Fastest),
            Err(ProviderError::Route(_))
        ));
    }

    #[rstest]
    fn alternative_without_legs_is_skipped(two_routes: DirectionsResponse) {
        let mut response = two_routes;
        response.routes[1].legs.clear();
        let route = parse_directions(response, RouteStrategy::Shortest).expect("route");
        assert_eq!(route.details.distance(), 4200.0);
    }

    #[rstest]
    #[case("plain", "plain")]
    #[case("Turn <b>right</b>", "Turn right")]
    #[case("x < y", "x < y")]
    #[case("<<b>x", "< x")]
    #[case("<>", "<>")]
    #[case("  ", "")]
    fn strips_markup(#[case] html: &str, #[case] expected: &str) {
        assert_eq!(strip_html(html), expected);
    }

    #[rstest]
    fn shortest_requests_alternatives() {
        let provider = GoogleDirections::new("secret").expect("provider should build");
        let query = provider.query(
            Coord { x: 9.1, y: 48.8 },
            Coord { x: 9.2, y: 48.85 },
            &RoutingOptions::new(RouteStrategy::Shortest),
        );
        assert!(query.contains(&("origin", "48.8,9.1".to_owned())));
        assert!(query.contains(&("destination", "48.85,9.2".to_owned())));
        assert!(query.contains(&("alternatives", "true".to_owned())));

        let fastest = provider.query(
            Coord { x: 9.1, y: 48.8 },
            Coord { x: 9.2, y: 48.85 },
            &RoutingOptions::new(RouteStrategy::Fastest),
        );
        assert!(fastest.iter().all(|(name, _)| *name != "alternatives"));
    }

    #[rstest]
    fn travel_mode_defaults_to_driving() {
        let origin = Coord { x: 9.1, y: 48.8 };
        let destination = Coord { x: 9.2, y: 48.85 };
        let options = RoutingOptions::default();
        let provider = GoogleDirections::new("secret").expect("provider should build");
        let query = provider.query(origin, destination, &options);
        assert!(query.contains(&("mode", "driving".to_owned())));

        let config = GoogleDirectionsConfig::default().with_mode("bicycling");
        let cycling =
            GoogleDirections::from_config("secret", config).expect("provider should build");
        let query = cycling.query(origin, destination, &options);
        assert!(query.contains(&("mode", "bicycling".to_owned())));
    }

    #[rstest]
    fn config_defaults_to_public_endpoint() {
        let config = GoogleDirectionsConfig::default()
            .with_timeout(Duration::from_secs(5))
            .with_user_agent("tester/1.0");
        assert_eq!(config.mode, "driving");
        assert_eq!(config.http.base_url, GOOGLE_DIRECTIONS_URL);
        assert_eq!(config.http.timeout, Duration::from_secs(5));
        assert_eq!(config.http.user_agent, "tester/1.0");

        let local = config.with_base_url("http://127.0.0.1:8080/directions");
        assert_eq!(local.http.base_url, "http://127.0.0.1:8080/directions");
    }

    #[rstest]
    #[case("403 Forbidden", "")]
    #[case("200 OK", "not json")]
    fn failures_never_echo_the_api_key(#[case] status: &'static str, #[case] body: &'static str) {
        let server = serve_once(status, body);
        let provider = GoogleDirections::with_config(
            "SECRET-KEY-123",
            HttpProviderConfig::new(server.url()),
        )
        .expect("provider should build");

        let err = block_on(provider.fetch(
            Coord { x: 9.1, y: 48.8 },
            Coord { x: 9.2, y: 48.85 },
            &RoutingOptions::default(),
        ))
        .expect_err("request should fail");

        assert!(server.request_line().contains("key=SECRET-KEY-123"));
        assert!(!err.to_string().contains("SECRET-KEY-123"), "{err}");
    }
}
