//! Single-pair command: compare one explicit origin/destination pair and
//! print the result as a `manual_result` JSON line.

use std::io::Write;

use camino::Utf8PathBuf;
use clap::Parser;
use geo::Coord;
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use routecompare_core::{PairComparison, RouteStrategy, RoutingOptions};
use routecompare_data::manual_result;
use serde::{Deserialize, Serialize};

use crate::progress::JsonLinesProgress;
use crate::providers::{ComparatorFactory, CredentialEnv, ProviderFlags, ProviderSettings};
use crate::{
    ARG_BACKEND, ARG_DESTINATION, ARG_GOOGLE_API_KEY, ARG_GRAPHHOPPER_API_KEY, ARG_HERE_API_KEY,
    ARG_ORIGIN, ARG_OSRM_BASE_URL, ARG_STRATEGY, ARG_USAGE_FILE, CliError, parse_strategy,
};

pub(crate) const SINGLE_ENV: CredentialEnv = CredentialEnv {
    google_api_key: "ROUTECOMPARE_CMDS_SINGLE_GOOGLE_API_KEY",
    here_api_key: "ROUTECOMPARE_CMDS_SINGLE_HERE_API_KEY",
    graphhopper_api_key: "ROUTECOMPARE_CMDS_SINGLE_GRAPHHOPPER_API_KEY",
};
const ENV_ORIGIN: &str = "ROUTECOMPARE_CMDS_SINGLE_ORIGIN";
const ENV_DESTINATION: &str = "ROUTECOMPARE_CMDS_SINGLE_DESTINATION";

/// CLI arguments for the `single` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    long_about = "Request a route between two explicit points from every \
                 provider, score the candidates against Google's route and \
                 print the routes and statistics as one JSON line.",
    about = "Compare providers for one origin/destination pair"
)]
#[ortho_config(prefix = "ROUTECOMPARE")]
pub(crate) struct SingleArgs {
    /// Start point as `lon,lat`.
    #[arg(long = ARG_ORIGIN, value_name = "lon,lat", allow_hyphen_values = true)]
    #[serde(default)]
    pub(crate) origin: Option<String>,
    /// End point as `lon,lat`.
    #[arg(long = ARG_DESTINATION, value_name = "lon,lat", allow_hyphen_values = true)]
    #[serde(default)]
    pub(crate) destination: Option<String>,
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
    /// Base URL of the OSRM server.
    #[arg(long = ARG_OSRM_BASE_URL, value_name = "url")]
    #[serde(default)]
    pub(crate) osrm_base_url: Option<String>,
    /// File tracking today's GraphHopper request count.
    #[arg(long = ARG_USAGE_FILE, value_name = "path")]
    #[serde(default)]
    pub(crate) usage_file: Option<Utf8PathBuf>,
    /// `fastest` or `shortest` (default).
    #[arg(long = ARG_STRATEGY, value_name = "strategy")]
    #[serde(default)]
    pub(crate) strategy: Option<String>,
}

impl SingleArgs {
    pub(crate) fn into_config(self) -> Result<SingleConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        SingleConfig::try_from(merged)
    }
}

/// Resolved `single` command configuration.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct SingleConfig {
    pub(crate) providers: ProviderSettings,
    pub(crate) origin: Coord<f64>,
    pub(crate) destination: Coord<f64>,
    pub(crate) strategy: RouteStrategy,
}

impl TryFrom<SingleArgs> for SingleConfig {
    type Error = CliError;

    fn try_from(args: SingleArgs) -> Result<Self, Self::Error> {
        let origin = args.origin.ok_or(CliError::MissingArgument {
            field: ARG_ORIGIN,
            env: ENV_ORIGIN,
        })?;
        let destination = args.destination.ok_or(CliError::MissingArgument {
            field: ARG_DESTINATION,
            env: ENV_DESTINATION,
        })?;
        let flags = ProviderFlags {
            google_api_key: args.google_api_key,
            here_api_key: args.here_api_key,
            graphhopper_api_key: args.graphhopper_api_key,
            backend: args.backend,
            osrm_base_url: args.osrm_base_url,
            usage_file: args.usage_file,
        };
        Ok(Self {
            providers: ProviderSettings::resolve(flags, SINGLE_ENV)?,
            origin: parse_lon_lat(ARG_ORIGIN, &origin)?,
            destination: parse_lon_lat(ARG_DESTINATION, &destination)?,
            strategy: parse_strategy(args.strategy.as_deref())?,
        })
    }
}

/// Parse `lon,lat`. Range checks happen in the comparator.
pub(crate) fn parse_lon_lat(field: &'static str, value: &str) -> Result<Coord<f64>, CliError> {
    let format_error = || CliError::CoordinateFormat {
        field,
        value: value.to_owned(),
    };
    let (lon, lat) = value.split_once(',').ok_or_else(format_error)?;
    let x = lon.trim().parse::<f64>().map_err(|_| format_error())?;
    let y = lat.trim().parse::<f64>().map_err(|_| format_error())?;
    Ok(Coord { x, y })
}

pub(crate) async fn run_single_with(
    args: SingleArgs,
    factory: &dyn ComparatorFactory,
    writer: &mut (dyn Write + Send),
) -> Result<PairComparison, CliError> {
    let config = args.into_config()?;
    execute_single(&config, factory, writer).await
}

pub(crate) async fn execute_single(
    config: &SingleConfig,
    factory: &dyn ComparatorFactory,
    writer: &mut (dyn Write + Send),
) -> Result<PairComparison, CliError> {
    let comparator = factory.build(&config.providers)?;
    let progress = JsonLinesProgress::new(writer);
    let comparison = comparator
        .compare_single(
            config.origin,
            config.destination,
            &RoutingOptions::new(config.strategy),
            &progress,
        )
        .await?;
    let out = progress.into_inner();
    let line = serde_json::to_string(&manual_result(&comparison)?)
        .map_err(CliError::SerializeResult)?;
    writeln!(out, "{line}")
        .and_then(|()| out.flush())
        .map_err(CliError::WriteOutput)?;
    Ok(comparison)
}
