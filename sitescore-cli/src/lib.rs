//! Command-line interface for sitescore's offline tooling.
//!
//! Four subcommands cover the workflow: `extract` builds per-city grid
//! datasets from OpenStreetMap, `score-dataset` scores a grid against its
//! own baseline, `score` rates one location and `score-sites` rates a CSV
//! list of named sites. Options layer CLI flags over `SITESCORE_*`
//! environment variables and configuration files through `ortho_config`.
#![forbid(unsafe_code)]

use std::io::Write;

use camino::Utf8Path;
use clap::{Parser, Subcommand};
use indicatif::MultiProgress;
use serde::Serialize;

mod dataset;
mod error;
mod extract;
mod progress;
mod score;
mod sites;
mod source;

pub use error::CliError;
pub use progress::{IndicatifProgress, init_logging};

use dataset::{ScoreDatasetArgs, run_score_dataset_with};
use extract::{ExtractArgs, run_extract_with};
use score::{ScoreArgs, run_score_with};
use sites::{ScoreSitesArgs, run_score_sites_with};
use source::HttpSourceBuilder;

pub(crate) const ARG_SPACING: &str = "spacing";
pub(crate) const ARG_WORKERS: &str = "workers";
pub(crate) const ARG_RADIUS: &str = "radius";
pub(crate) const ARG_LATITUDE: &str = "latitude";
pub(crate) const ARG_LONGITUDE: &str = "longitude";
pub(crate) const ARG_SCORE_DATASET_CITY: &str = "city";
pub(crate) const ARG_SITES: &str = "sites";
pub(crate) const ENV_SCORE_LATITUDE: &str = "SITESCORE_CMDS_SCORE_LATITUDE";
pub(crate) const ENV_SCORE_LONGITUDE: &str = "SITESCORE_CMDS_SCORE_LONGITUDE";
pub(crate) const ENV_SCORE_DATASET_CITY: &str = "SITESCORE_CMDS_SCORE_DATASET_CITY";
pub(crate) const ENV_SCORE_SITES_SITES: &str = "SITESCORE_CMDS_SCORE_SITES_SITES";
pub(crate) const DEFAULT_DATA_DIR: &str = "data";
pub(crate) const DEFAULT_COUNTRY: &str = "France";

/// Run the sitescore CLI with the current process arguments and environment.
///
/// Progress bars are drawn into `multi`.
pub fn run(multi: &MultiProgress) -> Result<(), CliError> {
    let cli = Cli::try_parse().map_err(CliError::ArgumentParsing)?;
    let mut stdout = std::io::stdout().lock();
    let progress = IndicatifProgress::new(multi);
    match cli.command {
        Command::Extract(args) => {
            run_extract_with(args, &HttpSourceBuilder, &progress, &mut stdout)
        }
        Command::Score(args) => run_score_with(args, &HttpSourceBuilder, &mut stdout),
        Command::ScoreDataset(args) => run_score_dataset_with(args, &mut stdout),
        Command::ScoreSites(args) => {
            run_score_sites_with(args, &HttpSourceBuilder, &progress, &mut stdout)
        }
    }
}

#[derive(Debug, Parser)]
#[command(
    name = "sitescore",
    about = "Retail site suitability scoring over OpenStreetMap data",
    version
)]
pub(crate) struct Cli {
    #[command(subcommand)]
    pub(crate) command: Command,
}

#[derive(Debug, Subcommand)]
pub(crate) enum Command {
    /// Build per-city grid datasets from OpenStreetMap.
    Extract(ExtractArgs),
    /// Score a single location and print JSON.
    Score(ScoreArgs),
    /// Score a city's grid dataset and write its baseline and statistics.
    ScoreDataset(ScoreDatasetArgs),
    /// Score named sites listed in a CSV file.
    ScoreSites(ScoreSitesArgs),
}

pub(crate) fn require_existing(path: &Utf8Path, field: &'static str) -> Result<(), CliError> {
    match sitescore_fs::file_is_file(path) {
        Ok(true) => Ok(()),
        Ok(false) => Err(CliError::MissingSourceFile {
            field,
            path: path.to_path_buf(),
        }),
        Err(source) => Err(CliError::InspectSourcePath {
            field,
            path: path.to_path_buf(),
            source,
        }),
    }
}

pub(crate) fn write_line(writer: &mut dyn Write, line: &str) -> Result<(), CliError> {
    writer
        .write_all(line.as_bytes())
        .and_then(|()| writer.write_all(b"\n"))
        .map_err(CliError::WriteOutput)
}

pub(crate) fn write_json<T: Serialize + ?Sized>(
    writer: &mut dyn Write,
    value: &T,
) -> Result<(), CliError> {
    let payload = serde_json::to_string_pretty(value).map_err(CliError::SerialiseOutput)?;
    write_line(writer, &payload)
}

#[cfg(test)]
mod tests;
