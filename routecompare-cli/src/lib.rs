//! Command-line interface for comparing routing providers.
//!
//! `compare` runs a batch over random pairs and writes GeoJSON artefacts,
//! `single` compares one explicit pair and prints the result, and `prompt`
//! renders the narration prompt for a saved comparison. Options layer from
//! CLI flags, configuration files and `ROUTECOMPARE_*` environment
//! variables; a `.env` file is loaded first when present.
#![forbid(unsafe_code)]

use clap::{Parser, Subcommand};
use log::debug;
use routecompare_core::RouteStrategy;

mod compare;
mod error;
mod logging;
mod progress;
mod prompt;
mod providers;
mod single;

pub use error::CliError;

use compare::{CompareArgs, run_compare_with};
use prompt::{PromptArgs, run_prompt_with};
use providers::HttpComparatorFactory;
use single::{SingleArgs, run_single_with};

pub(crate) const ARG_GOOGLE_API_KEY: &str = "google-api-key";
pub(crate) const ARG_HERE_API_KEY: &str = "here-api-key";
pub(crate) const ARG_GRAPHHOPPER_API_KEY: &str = "graphhopper-api-key";
pub(crate) const ARG_BACKEND: &str = "backend";
pub(crate) const ARG_OSRM_BASE_URL: &str = "osrm-base-url";
pub(crate) const ARG_USAGE_FILE: &str = "usage-file";
pub(crate) const ARG_BBOX: &str = "bbox";
pub(crate) const ARG_STRATEGY: &str = "strategy";
pub(crate) const ARG_PAIRS: &str = "pairs";
pub(crate) const ARG_SEED: &str = "seed";
pub(crate) const ARG_SNAP: &str = "snap";
pub(crate) const ARG_OUTPUT_DIR: &str = "output-dir";
pub(crate) const ARG_ORIGIN: &str = "origin";
pub(crate) const ARG_DESTINATION: &str = "destination";
pub(crate) const ARG_STATS: &str = "stats";
pub(crate) const ARG_PAIR: &str = "pair";
pub(crate) const ARG_QUESTION: &str = "question";

/// Run the routecompare CLI with the current process arguments and
/// environment.
pub fn run() -> Result<(), CliError> {
    let dotenv = dotenv::dotenv();
    logging::init();
    if let Err(err) = dotenv {
        debug!("no .env file loaded: {err}");
    }
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) if !err.use_stderr() => err.exit(),
        Err(err) => return Err(CliError::ArgumentParsing(err)),
    };
    let mut stdout = std::io::stdout();
    match cli.command {
        Command::Compare(args) => {
            runtime()?.block_on(run_compare_with(args, &HttpComparatorFactory, &mut stdout))?;
        }
        Command::Single(args) => {
            runtime()?.block_on(run_single_with(args, &HttpComparatorFactory, &mut stdout))?;
        }
        Command::Prompt(args) => run_prompt_with(args, &mut stdout.lock())?,
    }
    Ok(())
}

fn runtime() -> Result<tokio::runtime::Runtime, CliError> {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(CliError::Runtime)
}

/// Parse the strategy flag, defaulting to shortest.
pub(crate) fn parse_strategy(value: Option<&str>) -> Result<RouteStrategy, CliError> {
    Ok(value
        .map(str::parse::<RouteStrategy>)
        .transpose()?
        .unwrap_or_default())
}

#[derive(Debug, Parser)]
#[command(
    name = "routecompare",
    about = "Compare routes from Google, HERE and open-data routers",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Compare providers over a batch of random pairs.
    Compare(CompareArgs),
    /// Compare providers for one origin/destination pair.
    Single(SingleArgs),
    /// Print the narration prompt for a saved comparison.
    Prompt(PromptArgs),
}

#[cfg(test)]
mod tests;
