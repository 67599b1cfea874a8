//! Provider adapters and artefact storage for route comparison.
//!
//! Responsibilities:
//! - Talk to Google Directions, HERE Routing v8, OSRM and GraphHopper over
//!   HTTP and normalise their answers into `routecompare_core` routes.
//! - Decode the encoded polylines those services return.
//! - Persist batch results as GeoJSON and track daily GraphHopper usage.
//!
//! Boundaries:
//! - Comparison rules and coverage scoring live in `routecompare-core`.
//! - Adapters never surface errors to the comparator; failures become
//!   `RouteOutcome::NoRoute` after a `warn!` log line.
//!
//! Invariants:
//! - No global mutable state; the usage counter is an explicit, shared
//!   handle.
#![forbid(unsafe_code)]

mod fs;
pub mod polyline;
pub mod routing;
pub mod store;
mod usage;

pub use routing::{
    GoogleDirections, GoogleDirectionsConfig, GraphHopperConfig, GraphHopperRouting, HereRouting,
    HereRoutingConfig, HttpProviderConfig, OpenDataBackend, OsrmConfig, OsrmRouting, OsrmSnapper,
    ParseBackendError, ProviderBuildError, ProviderError,
};
pub use store::{
    GeoJsonDirectoryStore, StoreError, StoredRoute, manual_result, read_route_collection,
    read_stats,
};
pub use usage::{DEFAULT_USAGE_FILE, DailyUsageCounter, UsageCounterError};
