//! Error types emitted by the routecompare CLI.
//!
//! Keep this error type reasonably small, as many CLI helpers return
//! `Result<_, CliError>`.

use std::sync::Arc;

use camino::Utf8PathBuf;
use routecompare_core::{BoundingBoxError, ComparisonError, ParseStrategyError, ProviderKind};
use routecompare_data::{ParseBackendError, ProviderBuildError, StoreError};
use thiserror::Error;

/// Errors emitted by the routecompare CLI.
#[derive(Debug, Error)]
pub enum CliError {
    /// Provided arguments failed Clap validation.
    #[error(transparent)]
    ArgumentParsing(#[from] clap::Error),
    /// Configuration layering failed (files, env, CLI).
    #[error("failed to load configuration: {0}")]
    Configuration(#[from] Arc<ortho_config::OrthoError>),
    /// A required option is missing after configuration merging.
    #[error("missing {field} (set --{field} or {env})")]
    MissingArgument {
        field: &'static str,
        env: &'static str,
    },
    /// The bounding box flag is not four comma-separated numbers.
    #[error("bbox {value:?} must be four comma-separated numbers: min_lon,min_lat,max_lon,max_lat")]
    BoundingBoxFormat { value: String },
    /// The bounding box numbers do not describe a valid region.
    #[error("invalid bbox: {0}")]
    InvalidBoundingBox(#[from] BoundingBoxError),
    /// A single-pair coordinate is not a `lon,lat` pair.
    #[error("{field} {value:?} must be a lon,lat pair")]
    CoordinateFormat { field: &'static str, value: String },
    /// The strategy flag names no known strategy.
    #[error(transparent)]
    InvalidStrategy(#[from] ParseStrategyError),
    /// The backend flag names no known open-data backend.
    #[error(transparent)]
    InvalidBackend(#[from] ParseBackendError),
    /// Constructing a provider adapter failed.
    #[error("failed to build {provider} provider: {source}")]
    BuildProvider {
        provider: ProviderKind,
        #[source]
        source: ProviderBuildError,
    },
    /// Starting the async runtime failed.
    #[error("failed to start the async runtime: {0}")]
    Runtime(#[source] std::io::Error),
    /// The comparison was rejected or its results could not be saved.
    #[error(transparent)]
    Comparison(#[from] ComparisonError),
    /// Reading or encoding artefacts failed.
    #[error(transparent)]
    Store(#[from] StoreError),
    /// The statistics file holds no entries.
    #[error("statistics file {path:?} holds no comparisons")]
    NoStatistics { path: Utf8PathBuf },
    /// The requested pair is absent from the statistics file.
    #[error("statistics file {path:?} has no entry for pair {pair}")]
    UnknownPair { pair: u32, path: Utf8PathBuf },
    /// Serialising a result line failed.
    #[error("failed to serialize result: {0}")]
    SerializeResult(#[source] serde_json::Error),
    /// Writing to stdout failed.
    #[error("failed to write output: {0}")]
    WriteOutput(#[source] std::io::Error),
}
