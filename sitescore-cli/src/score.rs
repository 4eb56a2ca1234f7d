//! Score command implementation for the sitescore CLI.

use std::io::Write;

use camino::{Utf8Path, Utf8PathBuf};
use clap::Parser;
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use serde::{Deserialize, Serialize};
use sitescore_core::{CityResolver, FeatureExtractor, GeoDataSource, ScoreRequest};
use sitescore_data::HttpGeoDataSourceConfig;
use sitescore_scorer::{
    BaselineCache, BaselineLoader, CityStats, LocationScorer, Ranking, ScoredLocation,
    ScoringEngine, read_stats_file, stats_path,
};

use crate::source::{SourceBuilder, SourceOverrides};
use crate::{
    ARG_LATITUDE, ARG_LONGITUDE, CliError, DEFAULT_DATA_DIR, ENV_SCORE_LATITUDE,
    ENV_SCORE_LONGITUDE, write_json,
};

/// CLI arguments for the `score` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    long_about = "Count retail features around one location and score it \
                 against the baseline of the city it falls in. Without a \
                 dataset for that city the fixed default divisors apply. The \
                 result is printed as JSON.",
    about = "Score a single location"
)]
#[ortho_config(prefix = "SITESCORE")]
pub(crate) struct ScoreArgs {
    /// Latitude in decimal degrees.
    #[arg(long = ARG_LATITUDE, value_name = "degrees", allow_hyphen_values = true)]
    #[serde(default)]
    pub(crate) latitude: Option<f64>,
    /// Longitude in decimal degrees.
    #[arg(long = ARG_LONGITUDE, value_name = "degrees", allow_hyphen_values = true)]
    #[serde(default)]
    pub(crate) longitude: Option<f64>,
    /// Query radius in metres (100 to 2000).
    #[arg(long = "radius", value_name = "metres")]
    #[serde(default)]
    pub(crate) radius: Option<u32>,
    /// Score against this city instead of the one the point falls in.
    #[arg(long = "city", value_name = "name")]
    #[serde(default)]
    pub(crate) city: Option<String>,
    /// Directory holding city datasets and statistics.
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

impl ScoreArgs {
    pub(crate) fn into_config(self) -> Result<ScoreConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        ScoreConfig::try_from(merged)
    }
}

/// Resolved `score` command configuration.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ScoreConfig {
    pub(crate) request: ScoreRequest,
    pub(crate) city: Option<String>,
    pub(crate) data_dir: Utf8PathBuf,
    pub(crate) source: HttpGeoDataSourceConfig,
}

impl TryFrom<ScoreArgs> for ScoreConfig {
    type Error = CliError;

    fn try_from(args: ScoreArgs) -> Result<Self, Self::Error> {
        let latitude = args.latitude.ok_or(CliError::MissingArgument {
            field: ARG_LATITUDE,
            env: ENV_SCORE_LATITUDE,
        })?;
        let longitude = args.longitude.ok_or(CliError::MissingArgument {
            field: ARG_LONGITUDE,
            env: ENV_SCORE_LONGITUDE,
        })?;
        let request = ScoreRequest::new(latitude, longitude, args.radius)?;
        let source = SourceOverrides {
            overpass_url: args.overpass_url,
            nominatim_url: None,
            timeout_secs: args.timeout_secs,
        }
        .into_config();
        Ok(Self {
            request,
            city: args.city,
            data_dir: args
                .data_dir
                .unwrap_or_else(|| Utf8PathBuf::from(DEFAULT_DATA_DIR)),
            source,
        })
    }
}

/// How a score compares with the rest of its city.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub(crate) struct Comparison {
    pub(crate) ranking: Ranking,
    pub(crate) label: &'static str,
    pub(crate) city_average: f64,
    pub(crate) top_10_percent_threshold: f64,
    pub(crate) bottom_10_percent_threshold: f64,
}

impl Comparison {
    pub(crate) fn against(stats: &CityStats, global_score: f64) -> Self {
        let ranking = stats.rank(global_score);
        Self {
            ranking,
            label: ranking.label(),
            city_average: stats.avg_global_score,
            top_10_percent_threshold: stats.top_10_percent_threshold,
            bottom_10_percent_threshold: stats.bottom_10_percent_threshold,
        }
    }
}

/// JSON document printed by `score`.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct ScoreReport {
    #[serde(flatten)]
    pub(crate) scored: ScoredLocation,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) comparison: Option<Comparison>,
}

/// Load the city's statistics if they exist; a broken file is logged and
/// ignored.
pub(crate) fn load_city_stats(data_dir: &Utf8Path, city: &str) -> Option<CityStats> {
    let path = stats_path(data_dir, city);
    match sitescore_fs::file_is_file(&path) {
        Ok(true) => read_stats_file(&path)
            .inspect_err(|err| log::warn!("ignoring statistics for {city}: {err}"))
            .ok(),
        Ok(false) => None,
        Err(err) => {
            log::warn!("cannot inspect {path}: {err}");
            None
        }
    }
}

/// Scores rounded for presentation, compared against the city when its
/// statistics are available.
pub(crate) fn report(scored: ScoredLocation, data_dir: &Utf8Path) -> ScoreReport {
    let comparison = load_city_stats(data_dir, &scored.city)
        .map(|stats| Comparison::against(&stats, scored.scores.global_score));
    ScoreReport {
        scored: ScoredLocation {
            scores: scored.scores.rounded(),
            ..scored
        },
        comparison,
    }
}

pub(crate) fn location_scorer<S: GeoDataSource>(
    source: S,
    data_dir: &Utf8Path,
) -> LocationScorer<S> {
    LocationScorer::new(
        FeatureExtractor::new(source),
        CityResolver::default(),
        BaselineCache::new(BaselineLoader::new(data_dir)),
        ScoringEngine::default(),
    )
}

pub(crate) fn run_score_with(
    args: ScoreArgs,
    builder: &dyn SourceBuilder,
    writer: &mut dyn Write,
) -> Result<(), CliError> {
    let config = args.into_config()?;
    let source = builder.build(&config.source)?;
    let scorer = location_scorer(source, &config.data_dir);
    let scored = match &config.city {
        Some(city) => scorer.score_in(&config.request, city.as_str()),
        None => scorer.score(&config.request),
    };
    if let Some(reason) = &scored.degraded {
        log::warn!("feature extraction degraded: {reason}");
    }
    write_json(writer, &report(scored, &config.data_dir))
}

#[cfg(test)]
pub(crate) fn config_from_layers_for_test(
    layers: Vec<ortho_config::MergeLayer<'static>>,
) -> Result<ScoreConfig, CliError> {
    let merged = ScoreArgs::merge_from_layers(layers).map_err(CliError::from)?;
    ScoreConfig::try_from(merged)
}
