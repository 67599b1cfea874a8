//! GeoJSON and JSON shapes of comparison artefacts.

use std::collections::BTreeMap;

use geo::Coord;
use geojson::{Feature, FeatureCollection, GeoJson, Geometry, JsonObject, Value};
use routecompare_core::{
    BatchResult, CoverageStat, OdPair, PairComparison, ProviderKind, ProviderRoute, Route,
    RouteDetails,
};
use serde_json::{Value as JsonValue, json};

use super::StoreError;

/// A route read back from a `{provider}_routes.geojson` collection.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredRoute {
    /// Pair id the route was computed for.
    pub route_id: u32,
    /// Geometry and details.
    pub route: ProviderRoute,
}

/// File name of the route collection for `kind`.
pub fn routes_file_name(kind: ProviderKind) -> String {
    format!("{}_routes.geojson", kind.as_str())
}

/// Build the route collection of one provider from `(pair_id, route)`
/// entries.
///
/// # Errors
///
/// Returns an error if the instruction list cannot be encoded.
pub fn route_collection<'a, I>(routes: I) -> Result<FeatureCollection, StoreError>
where
    I: IntoIterator<Item = (u32, &'a ProviderRoute)>,
{
    let features = routes
        .into_iter()
        .map(|(route_id, route)| route_feature(route_id, route))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(collection(features))
}

fn route_feature(route_id: u32, route: &ProviderRoute) -> Result<Feature, StoreError> {
    let instructions = serde_json::to_string(route.details.instructions()).map_err(|source| {
        StoreError::Encode {
            artefact: "instructions".to_owned(),
            source,
        }
    })?;
    let mut properties = JsonObject::new();
    properties.insert("route_id".to_owned(), json!(route_id));
    properties.insert("distance".to_owned(), json!(route.details.distance()));
    properties.insert("duration".to_owned(), json!(route.details.duration()));
    properties.insert("instructions".to_owned(), JsonValue::String(instructions));

    let positions = route
        .route
        .coords()
        .iter()
        .map(|coord| vec![coord.x, coord.y])
        .collect();
    Ok(feature(Value::LineString(positions), properties))
}

/// Origin and destination points of every pair.
pub fn od_points<'a, I>(pairs: I) -> FeatureCollection
where
    I: IntoIterator<Item = &'a OdPair>,
{
    let features = pairs
        .into_iter()
        .flat_map(|pair| {
            [
                point_feature(pair.pair_id, pair.origin, "origin"),
                point_feature(pair.pair_id, pair.destination, "destination"),
            ]
        })
        .collect();
    collection(features)
}

fn point_feature(pair_id: u32, coord: Coord<f64>, role: &str) -> Feature {
    let mut properties = JsonObject::new();
    properties.insert("pair_id".to_owned(), json!(pair_id));
    properties.insert("type".to_owned(), json!(role));
    feature(Value::Point(vec![coord.x, coord.y]), properties)
}

/// Coverage statistics keyed by the pair id rendered as a string.
pub fn stats_by_pair<'a, I>(stats: I) -> BTreeMap<String, &'a CoverageStat>
where
    I: IntoIterator<Item = (u32, &'a CoverageStat)>,
{
    stats
        .into_iter()
        .map(|(pair_id, stat)| (pair_id.to_string(), stat))
        .collect()
}

/// The single-pair payload: one route collection per provider plus stats.
///
/// # Errors
///
/// Returns an error if any part fails to encode.
pub fn manual_result(comparison: &PairComparison) -> Result<JsonValue, StoreError> {
    let mut data = serde_json::Map::new();
    for result in &comparison.results {
        let routes = result
            .outcome
            .provider_route()
            .map(|route| (comparison.pair.pair_id, route));
        let key = format!("{}_routes", result.kind.as_str());
        data.insert(key.clone(), to_json(&key, &route_collection(routes)?)?);
    }
    let stats = stats_by_pair(
        comparison
            .stats
            .as_ref()
            .map(|stat| (comparison.pair.pair_id, stat)),
    );
    data.insert("stats".to_owned(), to_json("stats", &stats)?);
    Ok(json!({"type": "manual_result", "data": data}))
}

/// Serialise a batch's artefacts in memory, keyed by file name.
pub(crate) fn batch_artefacts(result: &BatchResult) -> Result<Vec<(String, String)>, StoreError> {
    let mut files = Vec::with_capacity(result.providers.len() + 2);
    for &kind in &result.providers {
        let name = routes_file_name(kind);
        let body = to_pretty(&name, &route_collection(result.routes_for(kind))?)?;
        files.push((name, body));
    }
    let pairs = result.pairs.iter().map(|comparison| &comparison.pair);
    files.push((
        super::OD_POINTS_FILE.to_owned(),
        to_pretty(super::OD_POINTS_FILE, &od_points(pairs))?,
    ));
    files.push((
        super::STATS_FILE.to_owned(),
        to_pretty(super::STATS_FILE, &stats_by_pair(result.stats()))?,
    ));
    Ok(files)
}

/// Parse a route collection written by the store.
///
/// # Errors
///
/// Returns an error when the text is not a feature collection or a feature
/// lacks a line geometry or one of the expected properties.
pub fn parse_route_collection(text: &str) -> Result<Vec<StoredRoute>, StoreError> {
    let geojson: GeoJson = text
        .parse()
        .map_err(|source| StoreError::Decode { source })?;
    let GeoJson::FeatureCollection(collection) = geojson else {
        return Err(invalid(0, "expected a FeatureCollection"));
    };
    collection
        .features
        .iter()
        .enumerate()
        .map(|(index, feature)| stored_route(index, feature))
        .collect()
}

fn stored_route(index: usize, feature: &Feature) -> Result<StoredRoute, StoreError> {
    let Some(Value::LineString(positions)) = feature.geometry.as_ref().map(|g| &g.value) else {
        return Err(invalid(index, "geometry is not a LineString"));
    };
    let coords = positions
        .iter()
        .map(|position| match position.as_slice() {
            [lon, lat, ..] => Ok(Coord { x: *lon, y: *lat }),
            _ => Err(invalid(index, "position has fewer than two values")),
        })
        .collect::<Result<Vec<_>, _>>()?;
    let route = Route::new(coords).map_err(|err| invalid(index, &err.to_string()))?;

    let number = |key: &str| {
        feature
            .property(key)
            .and_then(JsonValue::as_f64)
            .ok_or_else(|| invalid(index, &format!("missing numeric property {key}")))
    };
    let route_id = feature
        .property("route_id")
        .and_then(JsonValue::as_u64)
        .and_then(|id| u32::try_from(id).ok())
        .ok_or_else(|| invalid(index, "missing route_id"))?;
    let instructions: Vec<String> = match feature.property("instructions") {
        Some(JsonValue::String(encoded)) => serde_json::from_str(encoded)
            .map_err(|err| invalid(index, &format!("instructions: {err}")))?,
        Some(JsonValue::Array(items)) => items
            .iter()
            .filter_map(|item| item.as_str().map(str::to_owned))
            .collect(),
        _ => Vec::new(),
    };
    let details = RouteDetails::new(number("distance")?, number("duration")?, instructions)
        .map_err(|err| invalid(index, &err.to_string()))?;

    Ok(StoredRoute {
        route_id,
        route: ProviderRoute::new(route, details),
    })
}

fn invalid(index: usize, message: &str) -> StoreError {
    StoreError::InvalidFeature {
        index,
        message: message.to_owned(),
    }
}

fn feature(value: Value, properties: JsonObject) -> Feature {
    Feature {
        bbox: None,
        geometry: Some(Geometry::new(value)),
        id: None,
        properties: Some(properties),
        foreign_members: None,
    }
}

const fn collection(features: Vec<Feature>) -> FeatureCollection {
    FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    }
}

fn to_json<T: serde::Serialize>(artefact: &str, value: &T) -> Result<JsonValue, StoreError> {
    serde_json::to_value(value).map_err(|source| StoreError::Encode {
        artefact: artefact.to_owned(),
        source,
    })
}

fn to_pretty<T: serde::Serialize>(artefact: &str, value: &T) -> Result<String, StoreError> {
    serde_json::to_string_pretty(value).map_err(|source| StoreError::Encode {
        artefact: artefact.to_owned(),
        source,
    })
}
