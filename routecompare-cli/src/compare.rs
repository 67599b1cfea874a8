//! Batch command: sample pairs in a bounding box, compare every provider and
//! write the artefacts.

use std::io::Write;

use camino::Utf8PathBuf;
use clap::Parser;
use log::info;
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use routecompare_core::{
    BatchRequest, BatchResult, BoundingBox, NUM_ROUTES, RouteStrategy, RoutingOptions,
};
use routecompare_data::GeoJsonDirectoryStore;
use routecompare_data::store::DEFAULT_OUTPUT_DIR;
use serde::{Deserialize, Serialize};

use crate::progress::JsonLinesProgress;
use crate::providers::{ComparatorFactory, CredentialEnv, ProviderFlags, ProviderSettings};
use crate::{
    ARG_BACKEND, ARG_BBOX, ARG_GOOGLE_API_KEY, ARG_GRAPHHOPPER_API_KEY, ARG_HERE_API_KEY,
    ARG_OSRM_BASE_URL, ARG_OUTPUT_DIR, ARG_PAIRS, ARG_SEED, ARG_SNAP, ARG_STRATEGY,
    ARG_USAGE_FILE, CliError, parse_strategy,
};

pub(crate) const COMPARE_ENV: CredentialEnv = CredentialEnv {
    google_api_key: "ROUTECOMPARE_CMDS_COMPARE_GOOGLE_API_KEY",
    here_api_key: "ROUTECOMPARE_CMDS_COMPARE_HERE_API_KEY",
    graphhopper_api_key: "ROUTECOMPARE_CMDS_COMPARE_GRAPHHOPPER_API_KEY",
};

/// CLI arguments for the `compare` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    long_about = "Sample random origin/destination pairs inside a bounding \
                 box, request a route for each pair from Google, HERE and an \
                 open-data router, score every route against Google's and \
                 write GeoJSON route collections plus stats.json.",
    about = "Compare providers over a batch of random pairs"
)]
#[ortho_config(prefix = "ROUTECOMPARE")]
pub(crate) struct CompareArgs {
    /// Google Directions API key.
    #[arg(long = ARG_GOOGLE_API_KEY, value_name = "key")]
    #[serde(default)]
    pub(crate) google_api_key: Option<String>,
    /// HERE Routing API key.
    #[arg(long = ARG_HERE_API_KEY, value_name = "key")]
    #[serde(default)]
    pub(crate) here_api_key: Option<String>,
    /// GraphHopper API key; required with `--backend graphhopper`.
    #[arg(long = ARG_GRAPHHOPPER_API_KEY, value_name = "key")]
    #[serde(default)]
    pub(crate) graphhopper_api_key: Option<String>,
    /// Open-data router: `osrm` (default) or `graphhopper`.
    #[arg(long = ARG_BACKEND, value_name = "name")]
    #[serde(default)]
    pub(crate) backend: Option<String>,
    /// Base URL of the OSRM server used for routing and snapping.
    #[arg(long = ARG_OSRM_BASE_URL, value_name = "url")]
    #[serde(default)]
    pub(crate) osrm_base_url: Option<String>,
    /// File tracking today's GraphHopper request count.
    #[arg(long = ARG_USAGE_FILE, value_name = "path")]
    #[serde(default)]
    pub(crate) usage_file: Option<Utf8PathBuf>,
    /// Region to sample as `min_lon,min_lat,max_lon,max_lat`.
    #[arg(long = ARG_BBOX, value_name = "bbox", allow_hyphen_values = true)]
    #[serde(default)]
    pub(crate) bbox: Option<String>,
    /// `fastest` or `shortest` (default).
    #[arg(long = ARG_STRATEGY, value_name = "strategy")]
    #[serde(default)]
    pub(crate) strategy: Option<String>,
    /// Number of pairs to compare.
    #[arg(long = ARG_PAIRS, value_name = "count")]
    #[serde(default)]
    pub(crate) pairs: Option<usize>,
    /// Seed for reproducible sampling.
    #[arg(long = ARG_SEED, value_name = "seed")]
    #[serde(default)]
    pub(crate) seed: Option<u64>,
    /// Move sampled points onto the nearest road before routing.
    #[arg(long = ARG_SNAP, value_name = "bool", num_args = 0..=1, default_missing_value = "true")]
    #[serde(default)]
    pub(crate) snap: Option<bool>,
    /// Directory receiving the artefacts.
    #[arg(long = ARG_OUTPUT_DIR, value_name = "dir")]
    #[serde(default)]
    pub(crate) output_dir: Option<Utf8PathBuf>,
}

impl CompareArgs {
    pub(crate) fn into_config(self) -> Result<CompareConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        CompareConfig::try_from(merged)
    }

    fn provider_flags(&self) -> ProviderFlags {
        ProviderFlags {
            google_api_key: self.google_api_key.clone(),
            here_api_key: self.here_api_key.clone(),
            graphhopper_api_key: self.graphhopper_api_key.clone(),
            backend: self.backend.clone(),
            osrm_base_url: self.osrm_base_url.clone(),
            usage_file: self.usage_file.clone(),
        }
    }
}

/// Resolved `compare` command configuration.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct CompareConfig {
    pub(crate) providers: ProviderSettings,
    pub(crate) bbox: BoundingBox,
    pub(crate) strategy: RouteStrategy,
    pub(crate) pairs: usize,
    pub(crate) seed: Option<u64>,
    pub(crate) snap: bool,
    pub(crate) output_dir: Utf8PathBuf,
}

impl CompareConfig {
    fn batch_request(&self) -> BatchRequest {
        let request = BatchRequest::new(self.bbox)
            .with_pair_count(self.pairs)
            .with_snapping(self.snap)
            .with_options(RoutingOptions::new(self.strategy));
        match self.seed {
            Some(seed) => request.with_seed(seed),
            None => request,
        }
    }
}

impl TryFrom<CompareArgs> for CompareConfig {
    type Error = CliError;

    fn try_from(args: CompareArgs) -> Result<Self, Self::Error> {
        let providers = ProviderSettings::resolve(args.provider_flags(), COMPARE_ENV)?;
        let bbox = args
            .bbox
            .as_deref()
            .map(parse_bbox)
            .transpose()?
            .unwrap_or_default();
        Ok(Self {
            providers,
            bbox,
            strategy: parse_strategy(args.strategy.as_deref())?,
            pairs: args.pairs.unwrap_or(NUM_ROUTES),
            seed: args.seed,
            snap: args.snap.unwrap_or(false),
            output_dir: args
                .output_dir
                .unwrap_or_else(|| Utf8PathBuf::from(DEFAULT_OUTPUT_DIR)),
        })
    }
}

/// Parse `min_lon,min_lat,max_lon,max_lat`.
pub(crate) fn parse_bbox(value: &str) -> Result<BoundingBox, CliError> {
    let format_error = || CliError::BoundingBoxFormat {
        value: value.to_owned(),
    };
    let numbers = value
        .split(',')
        .map(|part| part.trim().parse::<f64>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|_| format_error())?;
    let corners: [f64; 4] = numbers.try_into().map_err(|_| format_error())?;
    Ok(BoundingBox::from_array(corners)?)
}

pub(crate) async fn run_compare_with(
    args: CompareArgs,
    factory: &dyn ComparatorFactory,
    writer: &mut (dyn Write + Send),
) -> Result<BatchResult, CliError> {
    let config = args.into_config()?;
    execute_compare(&config, factory, writer).await
}

pub(crate) async fn execute_compare(
    config: &CompareConfig,
    factory: &dyn ComparatorFactory,
    writer: &mut (dyn Write + Send),
) -> Result<BatchResult, CliError> {
    let comparator = factory.build(&config.providers)?;
    let store = GeoJsonDirectoryStore::new(config.output_dir.clone());
    let progress = JsonLinesProgress::new(writer);
    info!(
        "comparing {} pairs in {:?} with {} as open-data backend",
        config.pairs,
        config.bbox.to_array(),
        config.providers.open_data_kind()
    );
    let result = comparator
        .run_batch(&config.batch_request(), &progress, &store)
        .await?;
    Ok(result)
}
