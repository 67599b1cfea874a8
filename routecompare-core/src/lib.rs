//! Core domain for comparing routes from several routing providers.
//!
//! The pipeline samples origin/destination pairs inside a bounding box,
//! asks every [`RouteProvider`] for a route concurrently, and scores each
//! candidate route by how much of it lies within a 30 m corridor around the
//! reference provider's route.
//!
//! Provider adapters live in `routecompare-data`; this crate only defines
//! their contract and stays free of network code. Constructors validate
//! their input and return `Result` so invalid geometry is rejected early.

mod bbox;
mod compare;
mod coverage;
mod narration;
mod options;
mod projection;
mod provider;
pub mod route;
mod sampler;

#[doc(hidden)]
pub mod test_support;

pub use bbox::{BoundingBox, BoundingBoxError};
pub use compare::{
    BatchRequest, BatchResult, BatchStore, Comparator, ComparisonError, CoverageStat, NoProgress,
    PairComparison, ProgressEvent, ProgressSink, ProviderResult, ProviderSet, RunGuard, RunPermit,
};
pub use coverage::{BUFFER_METERS, Corridor, CoverageError, CoverageScorer};
pub use narration::{NarrationPrompt, PROMPT_INSTRUCTION_LIMIT};
pub use options::{ParseStrategyError, RouteStrategy, RoutingOptions};
pub use projection::{PlanarProjection, PlanarRoute, ProjectionError};
pub use provider::{ParseProviderError, ProviderKind, RoadSnapper, RouteProvider, SnapError};
pub use route::{ProviderRoute, Route, RouteDetails, RouteDetailsError, RouteError, RouteOutcome};
pub use sampler::{NUM_ROUTES, OdPair, SnappedPoint, sample, sample_pairs, snap_or_original};
