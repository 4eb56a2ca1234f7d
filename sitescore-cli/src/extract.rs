//! Extract command implementation for the sitescore CLI.

use std::io::Write;

use camino::Utf8PathBuf;
use clap::Parser;
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use serde::{Deserialize, Serialize};
use sitescore_core::{MAX_RADIUS_M, MIN_RADIUS_M};
use sitescore_data::{
    CityCatalog, CityOutcome, CityRunner, ExtractionOptions, ExtractionProgress,
    HttpGeoDataSourceConfig,
};

use crate::source::{SourceBuilder, SourceOverrides};
use crate::{
    ARG_RADIUS, ARG_SPACING, ARG_WORKERS, CliError, DEFAULT_COUNTRY, DEFAULT_DATA_DIR,
    write_line,
};

/// CLI arguments for the `extract` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    long_about = "Resolve each city's boundary through Nominatim, sample it on a \
                 regular grid and count retail features around every grid \
                 point through Overpass. One grid dataset is written per city; \
                 a city that fails is reported and the others still run.",
    about = "Extract per-city grid datasets from OpenStreetMap"
)]
#[ortho_config(prefix = "SITESCORE")]
pub(crate) struct ExtractArgs {
    /// Cities to extract; defaults to the built-in catalog.
    #[arg(long = "cities", value_name = "city", value_delimiter = ',')]
    #[serde(default)]
    pub(crate) cities: Vec<String>,
    /// Country appended to boundary lookups.
    #[arg(long = "country", value_name = "name")]
    #[serde(default)]
    pub(crate) country: Option<String>,
    /// Directory receiving `<city>_grid.csv` files.
    #[arg(long = "data-dir", value_name = "dir")]
    #[serde(default)]
    pub(crate) data_dir: Option<Utf8PathBuf>,
    /// Grid spacing in metres.
    #[arg(long = ARG_SPACING, value_name = "metres")]
    #[serde(default)]
    pub(crate) spacing: Option<f64>,
    /// Worker threads; defaults to the available cores minus four.
    #[arg(long = ARG_WORKERS, value_name = "count")]
    #[serde(default)]
    pub(crate) workers: Option<usize>,
    /// Feature query radius in metres.
    #[arg(long = ARG_RADIUS, value_name = "metres")]
    #[serde(default)]
    pub(crate) radius: Option<u32>,
    /// Overpass interpreter URL.
    #[arg(long = "overpass-url", value_name = "url")]
    #[serde(default)]
    pub(crate) overpass_url: Option<String>,
    /// Nominatim base URL.
    #[arg(long = "nominatim-url", value_name = "url")]
    #[serde(default)]
    pub(crate) nominatim_url: Option<String>,
    /// Per-request timeout in seconds.
    #[arg(long = "timeout-secs", value_name = "seconds")]
    #[serde(default)]
    pub(crate) timeout_secs: Option<u64>,
}

impl ExtractArgs {
    pub(crate) fn into_config(self) -> Result<ExtractConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        ExtractConfig::try_from(merged)
    }
}

/// Resolved `extract` command configuration.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ExtractConfig {
    pub(crate) catalog: CityCatalog,
    pub(crate) data_dir: Utf8PathBuf,
    pub(crate) options: ExtractionOptions,
    pub(crate) source: HttpGeoDataSourceConfig,
}

impl TryFrom<ExtractArgs> for ExtractConfig {
    type Error = CliError;

    fn try_from(args: ExtractArgs) -> Result<Self, Self::Error> {
        let country = args.country.unwrap_or_else(|| DEFAULT_COUNTRY.to_owned());
        let mut catalog = if args.cities.is_empty() {
            CityCatalog::default()
        } else {
            CityCatalog::for_country(&country, args.cities)
        };
        if let Some(spacing) = args.spacing {
            if !(spacing.is_finite() && spacing > 0.0) {
                return Err(CliError::InvalidArgument {
                    field: ARG_SPACING,
                    reason: format!("{spacing} must be a positive number of metres"),
                });
            }
            catalog = catalog.with_spacing(spacing);
        }

        let mut options = ExtractionOptions::default();
        if let Some(workers) = args.workers {
            if workers == 0 {
                return Err(CliError::InvalidArgument {
                    field: ARG_WORKERS,
                    reason: "at least one worker is required".to_owned(),
                });
            }
            options = options.with_workers(workers);
        }
        if let Some(radius) = args.radius {
            if !(MIN_RADIUS_M..=MAX_RADIUS_M).contains(&radius) {
                return Err(CliError::InvalidArgument {
                    field: ARG_RADIUS,
                    reason: format!("{radius} m is outside {MIN_RADIUS_M}..={MAX_RADIUS_M} m"),
                });
            }
            options = options.with_radius(f64::from(radius));
        }

        let source = SourceOverrides {
            overpass_url: args.overpass_url,
            nominatim_url: args.nominatim_url,
            timeout_secs: args.timeout_secs,
        }
        .into_config();

        Ok(Self {
            catalog,
            data_dir: args
                .data_dir
                .unwrap_or_else(|| Utf8PathBuf::from(DEFAULT_DATA_DIR)),
            options,
            source,
        })
    }
}

pub(crate) fn run_extract_with(
    args: ExtractArgs,
    builder: &dyn SourceBuilder,
    progress: &dyn ExtractionProgress,
    writer: &mut dyn Write,
) -> Result<(), CliError> {
    let config = args.into_config()?;
    execute_extract(&config, builder, progress, writer)
}

pub(crate) fn execute_extract(
    config: &ExtractConfig,
    builder: &dyn SourceBuilder,
    progress: &dyn ExtractionProgress,
    writer: &mut dyn Write,
) -> Result<(), CliError> {
    let source = builder.build(&config.source)?;
    let runner =
        CityRunner::new(&*source, &config.data_dir).with_options(config.options.clone());
    let outcomes = runner.run_all(&config.catalog, progress);
    write_outcomes(writer, &outcomes)?;

    let total = outcomes.len();
    let failed = outcomes.iter().filter(|o| o.result.is_err()).count();
    if total > 0 && failed == total {
        return Err(CliError::ExtractionFailed { total });
    }
    Ok(())
}

fn write_outcomes(writer: &mut dyn Write, outcomes: &[CityOutcome]) -> Result<(), CliError> {
    for outcome in outcomes {
        let line = match &outcome.result {
            Ok(report) => format!(
                "{}: {} points ({} degraded) -> {}",
                report.city, report.points, report.degraded, report.dataset
            ),
            Err(err) => format!("{}: failed: {err}", outcome.city),
        };
        write_line(writer, &line)?;
    }
    Ok(())
}

#[cfg(test)]
pub(crate) fn config_from_layers_for_test(
    layers: Vec<ortho_config::MergeLayer<'static>>,
) -> Result<ExtractConfig, CliError> {
    let merged = ExtractArgs::merge_from_layers(layers).map_err(CliError::from)?;
    ExtractConfig::try_from(merged)
}
