//! Facade crate for the route comparison engine.
//!
//! This crate re-exports the core domain types and, behind the
//! `http-providers` feature, the HTTP provider adapters and artefact store.

#![forbid(unsafe_code)]

pub use routecompare_core::{
    BatchRequest, BatchResult, BatchStore, BoundingBox, Comparator, ComparisonError,
    CoverageStat, NarrationPrompt, NoProgress, OdPair, PairComparison, ProgressEvent,
    ProgressSink, ProviderKind, ProviderRoute, ProviderSet, RoadSnapper, Route, RouteDetails,
    RouteOutcome, RouteProvider, RouteStrategy, RoutingOptions, RunGuard, SnapError,
};

#[cfg(feature = "http-providers")]
pub use routecompare_data::{
    DailyUsageCounter, GeoJsonDirectoryStore, GoogleDirections, GoogleDirectionsConfig,
    GraphHopperConfig, GraphHopperRouting, HereRouting, HereRoutingConfig, HttpProviderConfig,
    OpenDataBackend, OsrmConfig, OsrmRouting, OsrmSnapper, ProviderError, StoreError,
};
