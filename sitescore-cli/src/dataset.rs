//! `score-dataset` command: batch scoring of a city's grid dataset.

use std::io::Write;

use camino::Utf8PathBuf;
use clap::Parser;
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use serde::{Deserialize, Serialize};
use sitescore_data::grid_dataset_path;
use sitescore_scorer::{ScoringEngine, score_city_dataset};

use crate::{
    ARG_SCORE_DATASET_CITY, CliError, DEFAULT_DATA_DIR, ENV_SCORE_DATASET_CITY, require_existing,
    write_json,
};

/// CLI arguments for the `score-dataset` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    long_about = "Score every point of a city's grid dataset against the \
                 city's own baseline. Writes the scored dataset, the bincode \
                 baseline artefact and the city statistics next to the grid, \
                 then prints the statistics as JSON.",
    about = "Score a city's grid dataset"
)]
#[ortho_config(prefix = "SITESCORE")]
pub(crate) struct ScoreDatasetArgs {
    /// City whose `<city>_grid.csv` is scored.
    #[arg(value_name = "city")]
    #[serde(default)]
    pub(crate) city: Option<String>,
    /// Directory holding the city datasets.
    #[arg(long = "data-dir", value_name = "dir")]
    #[serde(default)]
    pub(crate) data_dir: Option<Utf8PathBuf>,
}

impl ScoreDatasetArgs {
    pub(crate) fn into_config(self) -> Result<ScoreDatasetConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        ScoreDatasetConfig::try_from(merged)
    }
}

/// Resolved `score-dataset` command configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ScoreDatasetConfig {
    pub(crate) city: String,
    pub(crate) data_dir: Utf8PathBuf,
}

impl ScoreDatasetConfig {
    pub(crate) fn validate_sources(&self) -> Result<(), CliError> {
        require_existing(&grid_dataset_path(&self.data_dir, &self.city), "grid")
    }
}

impl TryFrom<ScoreDatasetArgs> for ScoreDatasetConfig {
    type Error = CliError;

    fn try_from(args: ScoreDatasetArgs) -> Result<Self, Self::Error> {
        let city = args.city.ok_or(CliError::MissingArgument {
            field: ARG_SCORE_DATASET_CITY,
            env: ENV_SCORE_DATASET_CITY,
        })?;
        Ok(Self {
            city,
            data_dir: args
                .data_dir
                .unwrap_or_else(|| Utf8PathBuf::from(DEFAULT_DATA_DIR)),
        })
    }
}

pub(crate) fn run_score_dataset_with(
    args: ScoreDatasetArgs,
    writer: &mut dyn Write,
) -> Result<(), CliError> {
    let config = args.into_config()?;
    config.validate_sources()?;
    let outcome = score_city_dataset(&config.data_dir, &config.city, &ScoringEngine::default())
        .map_err(|source| CliError::ScoreDataset {
            city: config.city.clone(),
            source,
        })?;
    log::info!(
        "wrote {}, {} and {}",
        outcome.scored_path,
        outcome.baseline_path,
        outcome.stats_path
    );
    write_json(writer, &outcome.stats)
}
