//! Prompt command: render the narration prompt for one saved comparison.

use std::io::Write;

use camino::{Utf8Path, Utf8PathBuf};
use clap::Parser;
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use routecompare_core::NarrationPrompt;
use routecompare_data::read_stats;
use routecompare_data::store::{DEFAULT_OUTPUT_DIR, STATS_FILE};
use serde::{Deserialize, Serialize};

use crate::{ARG_PAIR, ARG_QUESTION, ARG_STATS, CliError};

/// Question used when none is configured.
pub(crate) const DEFAULT_QUESTION: &str =
    "Which route would you recommend, and how do the providers differ?";

/// CLI arguments for the `prompt` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    long_about = "Load stats.json from a previous compare run and print the \
                 analyst prompt describing one pair, ready to hand to a \
                 language model.",
    about = "Print the narration prompt for a saved comparison"
)]
#[ortho_config(prefix = "ROUTECOMPARE")]
pub(crate) struct PromptArgs {
    /// Statistics file written by `compare`.
    #[arg(long = ARG_STATS, value_name = "path")]
    #[serde(default)]
    pub(crate) stats: Option<Utf8PathBuf>,
    /// Pair id to describe; defaults to the lowest id in the file.
    #[arg(long = ARG_PAIR, value_name = "id")]
    #[serde(default)]
    pub(crate) pair: Option<u32>,
    /// Question appended to the prompt.
    #[arg(long = ARG_QUESTION, value_name = "text")]
    #[serde(default)]
    pub(crate) question: Option<String>,
}

impl PromptArgs {
    pub(crate) fn into_config(self) -> Result<PromptConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        Ok(PromptConfig::from(merged))
    }
}

/// Resolved `prompt` command configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct PromptConfig {
    pub(crate) stats: Utf8PathBuf,
    pub(crate) pair: Option<u32>,
    pub(crate) question: String,
}

impl From<PromptArgs> for PromptConfig {
    fn from(args: PromptArgs) -> Self {
        Self {
            stats: args
                .stats
                .unwrap_or_else(|| Utf8Path::new(DEFAULT_OUTPUT_DIR).join(STATS_FILE)),
            pair: args.pair,
            question: args
                .question
                .unwrap_or_else(|| DEFAULT_QUESTION.to_owned()),
        }
    }
}

pub(crate) fn run_prompt_with(args: PromptArgs, writer: &mut dyn Write) -> Result<(), CliError> {
    let config = args.into_config()?;
    execute_prompt(&config, writer)
}

pub(crate) fn execute_prompt(config: &PromptConfig, writer: &mut dyn Write) -> Result<(), CliError> {
    let stats = read_stats(&config.stats)?;
    let (pair, stat) = match config.pair {
        Some(pair) => stats
            .get_key_value(&pair)
            .ok_or_else(|| CliError::UnknownPair {
                pair,
                path: config.stats.clone(),
            })?,
        None => stats.first_key_value().ok_or_else(|| CliError::NoStatistics {
            path: config.stats.clone(),
        })?,
    };
    log::info!("rendering prompt for pair {pair}");
    let prompt = NarrationPrompt::new(stat, &config.question).render();
    writeln!(writer, "{prompt}").map_err(CliError::WriteOutput)?;
    Ok(())
}
