//! `score-sites` command: score a list of named sites from CSV.
//!
//! The input needs `store_name`, `lat` and `lon` columns; `address` and
//! `city` are optional. A site without a city is attributed to the city its
//! coordinates fall in. Rows with invalid coordinates are skipped with a
//! warning.

use std::io::Write;

use camino::{Utf8Path, Utf8PathBuf};
use clap::Parser;
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use serde::{Deserialize, Serialize};
use sitescore_core::{FeatureCategory, GeoDataSource, ScoreRequest};
use sitescore_data::{ExtractionProgress, HttpGeoDataSourceConfig, SCORE_COLUMNS};
use sitescore_fs::{create_utf8_file, open_utf8_file};

use crate::score::location_scorer;
use crate::source::{SourceBuilder, SourceOverrides};
use crate::{
    ARG_SITES, CliError, DEFAULT_DATA_DIR, ENV_SCORE_SITES_SITES, require_existing, write_line,
};

const SITES_LABEL: &str = "sites";

/// CLI arguments for the `score-sites` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    long_about = "Score every site listed in a CSV file (store_name, address, \
                 lat, lon, city) and write the features, scores and \
                 normalization mode of each site to a new CSV file.",
    about = "Score named sites from a CSV file"
)]
#[ortho_config(prefix = "SITESCORE")]
pub(crate) struct ScoreSitesArgs {
    /// CSV file listing the sites.
    #[arg(value_name = "path")]
    #[serde(default)]
    pub(crate) sites: Option<Utf8PathBuf>,
    /// Output CSV; defaults to `<sites>_scored.csv` beside the input.
    #[arg(long = "output", value_name = "path")]
    #[serde(default)]
    pub(crate) output: Option<Utf8PathBuf>,
    /// Query radius in metres (100 to 2000).
    #[arg(long = "radius", value_name = "metres")]
    #[serde(default)]
    pub(crate) radius: Option<u32>,
    /// Directory holding city datasets.
    #[arg(long = "data-dir", value_name = "dir")]
    #[serde(default)]
    pub(crate) data_dir: Option<Utf8PathBuf>,
    /// Overpass interpreter URL.
    #[arg(long = "overpass-url", value_name = "url")]
    #[serde(default)]
    pub(crate) overpass_url: Option<String>,
    /// Per-request timeout in seconds.
    #[arg(long = "timeout-secs", value_name = "seconds")]
    #[serde(default)]
    pub(crate) timeout_secs: Option<u64>,
}

impl ScoreSitesArgs {
    pub(crate) fn into_config(self) -> Result<ScoreSitesConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        ScoreSitesConfig::try_from(merged)
    }
}

/// Resolved `score-sites` command configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ScoreSitesConfig {
    pub(crate) sites: Utf8PathBuf,
    pub(crate) output: Utf8PathBuf,
    pub(crate) radius: Option<u32>,
    pub(crate) data_dir: Utf8PathBuf,
    pub(crate) source: HttpGeoDataSourceConfig,
}

impl TryFrom<ScoreSitesArgs> for ScoreSitesConfig {
    type Error = CliError;

    fn try_from(args: ScoreSitesArgs) -> Result<Self, Self::Error> {
        let sites = args.sites.ok_or(CliError::MissingArgument {
            field: ARG_SITES,
            env: ENV_SCORE_SITES_SITES,
        })?;
        let output = args.output.unwrap_or_else(|| default_output(&sites));
        let source = SourceOverrides {
            overpass_url: args.overpass_url,
            nominatim_url: None,
            timeout_secs: args.timeout_secs,
        }
        .into_config();
        Ok(Self {
            sites,
            output,
            radius: args.radius,
            data_dir: args
                .data_dir
                .unwrap_or_else(|| Utf8PathBuf::from(DEFAULT_DATA_DIR)),
            source,
        })
    }
}

/// `stores.csv` becomes `stores_scored.csv` in the same directory.
pub(crate) fn default_output(sites: &Utf8Path) -> Utf8PathBuf {
    let stem = sites.file_stem().unwrap_or(SITES_LABEL);
    sites.with_file_name(format!("{stem}_scored.csv"))
}

/// One input row.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub(crate) struct Site {
    pub(crate) store_name: String,
    #[serde(default)]
    pub(crate) address: String,
    pub(crate) lat: f64,
    pub(crate) lon: f64,
    #[serde(default)]
    pub(crate) city: Option<String>,
}

pub(crate) fn read_sites(path: &Utf8Path) -> Result<Vec<Site>, CliError> {
    let file = open_utf8_file(path).map_err(|source| CliError::OpenSites {
        path: path.to_path_buf(),
        source,
    })?;
    csv::Reader::from_reader(file)
        .deserialize()
        .collect::<Result<Vec<Site>, _>>()
        .map_err(|source| CliError::ReadSites {
            path: path.to_path_buf(),
            source,
        })
}

fn header() -> Vec<&'static str> {
    let mut columns = vec!["store_name", "address", "lat", "lon", "city"];
    columns.extend(FeatureCategory::ALL.iter().map(|c| c.as_str()));
    columns.extend(SCORE_COLUMNS);
    columns.extend(["normalization_used", "degraded"]);
    columns
}

/// Score `sites` and return one output row per valid site.
pub(crate) fn score_sites<S: GeoDataSource>(
    sites: &[Site],
    source: S,
    config: &ScoreSitesConfig,
    progress: &dyn ExtractionProgress,
) -> Vec<Vec<String>> {
    let scorer = location_scorer(source, &config.data_dir);
    let total = sites.len();
    progress.started(SITES_LABEL, total);
    let mut rows = Vec::with_capacity(total);
    for (done, site) in sites.iter().enumerate() {
        match ScoreRequest::new(site.lat, site.lon, config.radius) {
            Ok(request) => {
                let scored = match &site.city {
                    Some(city) => scorer.score_in(&request, city.as_str()),
                    None => scorer.score(&request),
                };
                log::info!(
                    "{}: global {:.1} ({})",
                    site.store_name,
                    scored.scores.global_score,
                    scored.normalization
                );
                let scores = scored.scores.rounded();
                let mut row = vec![
                    site.store_name.clone(),
                    site.address.clone(),
                    site.lat.to_string(),
                    site.lon.to_string(),
                    scored.city,
                ];
                row.extend(scored.features.iter().map(|(_, count)| count.to_string()));
                row.extend(
                    [
                        scores.attractiveness,
                        scores.competition,
                        scores.accessibility,
                        scores.suitability,
                        scores.global_score,
                    ]
                    .map(|v| v.to_string()),
                );
                row.push(scored.normalization.to_string());
                row.push(scored.degraded.unwrap_or_default());
                rows.push(row);
            }
            Err(err) => log::warn!("skipping {}: {err}", site.store_name),
        }
        progress.advanced(SITES_LABEL, done + 1, total);
    }
    progress.finished(SITES_LABEL);
    rows
}

pub(crate) fn write_scored_sites(path: &Utf8Path, rows: &[Vec<String>]) -> Result<(), CliError> {
    let file = create_utf8_file(path).map_err(|source| CliError::CreateSites {
        path: path.to_path_buf(),
        source,
    })?;
    let csv_err = |source: csv::Error| CliError::WriteSites {
        path: path.to_path_buf(),
        source,
    };
    let mut writer = csv::Writer::from_writer(file);
    writer.write_record(header()).map_err(csv_err)?;
    for row in rows {
        writer.write_record(row).map_err(csv_err)?;
    }
    writer.flush().map_err(|source| CliError::CreateSites {
        path: path.to_path_buf(),
        source,
    })
}

pub(crate) fn run_score_sites_with(
    args: ScoreSitesArgs,
    builder: &dyn SourceBuilder,
    progress: &dyn ExtractionProgress,
    writer: &mut dyn Write,
) -> Result<(), CliError> {
    let config = args.into_config()?;
    require_existing(&config.sites, ARG_SITES)?;
    let sites = read_sites(&config.sites)?;
    let source = builder.build(&config.source)?;
    let rows = score_sites(&sites, source, &config, progress);
    write_scored_sites(&config.output, &rows)?;
    write_line(
        writer,
        &format!(
            "scored {} of {} sites -> {}",
            rows.len(),
            sites.len(),
            config.output
        ),
    )
}
