//! Errors raised before or after the per-pair fetch loop.

use thiserror::Error;

use crate::{BoundingBoxError, ProviderKind};

/// Errors returned by the comparators.
///
/// Provider failures never appear here; adapters report them as
/// [`RouteOutcome::NoRoute`](crate::RouteOutcome::NoRoute).
#[derive(Debug, Error)]
pub enum ComparisonError {
    /// Another run holds the [`RunGuard`](crate::RunGuard).
    #[error("a comparison is already in progress")]
    AlreadyRunning,
    /// The batch bounding box cannot be sampled.
    #[error("invalid bounding box: {0}")]
    InvalidBoundingBox(#[from] BoundingBoxError),
    /// The batch asked for zero pairs.
    #[error("a batch needs at least one origin/destination pair")]
    EmptyBatch,
    /// A single-pair coordinate was not a valid WGS84 position.
    #[error("invalid {role} coordinate ({lon}, {lat})")]
    InvalidCoordinate {
        /// `"origin"` or `"destination"`.
        role: &'static str,
        /// Supplied longitude.
        lon: f64,
        /// Supplied latitude.
        lat: f64,
    },
    /// Two providers in one set share a kind.
    #[error("provider {kind} was registered more than once")]
    DuplicateProvider {
        /// Repeated provider kind.
        kind: ProviderKind,
    },
    /// The batch store rejected the result.
    #[error("failed to save comparison results: {source}")]
    Save {
        /// Error reported by the store.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl ComparisonError {
    /// Whether the error is the busy signal.
    pub fn is_busy(&self) -> bool {
        matches!(self, Self::AlreadyRunning)
    }
}

