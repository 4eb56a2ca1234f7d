//! Whole-city extraction runs.
//!
//! A run resolves the city's boundary, generates its grid, extracts every
//! point and writes the grid dataset. Multi-city batches isolate failures:
//! a city whose boundary cannot be resolved is reported and the batch moves
//! on to the next one.

use camino::{Utf8Path, Utf8PathBuf};
use sitescore_core::{
    CityBoundary, GeoDataError, GeoDataSource, GridError, GridGenerator,
};
use thiserror::Error;

use super::{
    ExtractionError, ExtractionOptions, ExtractionProgress, ExtractionSummary, extract_points,
};
use crate::dataset::{DatasetError, GridRecord, grid_dataset_path, write_grid_dataset};

/// Grid spacing used by the default catalog.
pub const DEFAULT_GRID_SPACING_M: f64 = 250.0;

/// A city to extract.
#[derive(Debug, Clone, PartialEq)]
pub struct CitySpec {
    /// City name as used in file names and reports.
    pub name: String,
    /// Country appended to the boundary lookup.
    pub country: String,
    /// Distance between grid points, in metres.
    pub grid_spacing_m: f64,
}

impl CitySpec {
    /// A city sampled at [`DEFAULT_GRID_SPACING_M`].
    pub fn new(name: impl Into<String>, country: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            country: country.into(),
            grid_spacing_m: DEFAULT_GRID_SPACING_M,
        }
    }

    /// Override the grid spacing.
    #[must_use]
    pub const fn with_spacing(mut self, grid_spacing_m: f64) -> Self {
        self.grid_spacing_m = grid_spacing_m;
        self
    }

    /// Query string for boundary lookups: `"<city>, <country>"`.
    pub fn place_name(&self) -> String {
        format!("{}, {}", self.name, self.country)
    }
}

/// Cities processed by a batch run.
#[derive(Debug, Clone, PartialEq)]
pub struct CityCatalog {
    /// Cities in processing order.
    pub cities: Vec<CitySpec>,
}

impl Default for CityCatalog {
    fn default() -> Self {
        Self::for_country(
            "France",
            ["Paris", "Lille", "Bordeaux", "Strasbourg", "Toulouse"],
        )
    }
}

impl CityCatalog {
    /// Catalog of `cities` in one country at the default spacing.
    pub fn for_country<I, S>(country: &str, cities: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            cities: cities
                .into_iter()
                .map(|name| CitySpec::new(name, country))
                .collect(),
        }
    }

    /// Apply one spacing to every city.
    #[must_use]
    pub fn with_spacing(mut self, grid_spacing_m: f64) -> Self {
        for city in &mut self.cities {
            city.grid_spacing_m = grid_spacing_m;
        }
        self
    }
}

/// Errors that end one city's run.
#[derive(Debug, Error)]
pub enum CityRunError {
    /// The boundary lookup failed.
    #[error("failed to resolve boundary for {city}")]
    Boundary {
        /// City being processed.
        city: String,
        /// Source failure.
        #[source]
        source: GeoDataError,
    },
    /// The grid could not be generated.
    #[error("failed to generate grid for {city}")]
    Grid {
        /// City being processed.
        city: String,
        /// Grid failure.
        #[source]
        source: GridError,
    },
    /// The worker pool failed.
    #[error(transparent)]
    Extraction(#[from] ExtractionError),
    /// The dataset could not be written.
    #[error(transparent)]
    Dataset(#[from] DatasetError),
}

/// Summary of a completed city run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CityReport {
    /// City name.
    pub city: String,
    /// Grid points extracted.
    pub points: usize,
    /// Points whose extraction degraded.
    pub degraded: usize,
    /// Grid dataset written for the city.
    pub dataset: Utf8PathBuf,
}

/// Result of one city within a batch.
#[derive(Debug)]
pub struct CityOutcome {
    /// City name.
    pub city: String,
    /// Report, or the error that stopped the city.
    pub result: Result<CityReport, CityRunError>,
}

/// Drives extraction runs for whole cities.
#[derive(Debug)]
pub struct CityRunner<'a, S: ?Sized> {
    source: &'a S,
    generator: GridGenerator,
    options: ExtractionOptions,
    data_dir: Utf8PathBuf,
}

impl<'a, S: GeoDataSource + ?Sized> CityRunner<'a, S> {
    /// Write datasets under `data_dir`.
    pub fn new(source: &'a S, data_dir: impl AsRef<Utf8Path>) -> Self {
        Self {
            source,
            generator: GridGenerator::default(),
            options: ExtractionOptions::default(),
            data_dir: data_dir.as_ref().to_path_buf(),
        }
    }

    /// Use custom extraction options.
    #[must_use]
    pub fn with_options(mut self, options: ExtractionOptions) -> Self {
        self.options = options;
        self
    }

    /// Use a custom grid generator.
    #[must_use]
    pub const fn with_generator(mut self, generator: GridGenerator) -> Self {
        self.generator = generator;
        self
    }

    /// Extract one city and write its grid dataset.
    pub fn run_city<P>(&self, spec: &CitySpec, progress: &P) -> Result<CityReport, CityRunError>
    where
        P: ExtractionProgress + ?Sized,
    {
        let city = spec.name.clone();
        let polygon = self
            .source
            .resolve_boundary(&spec.place_name())
            .map_err(|source| CityRunError::Boundary {
                city: city.clone(),
                source,
            })?;
        let grid = CityBoundary::new(&city, polygon, spec.grid_spacing_m)
            .and_then(|boundary| self.generator.generate(&boundary))
            .map_err(|source| CityRunError::Grid {
                city: city.clone(),
                source,
            })?;
        if grid.is_empty() {
            log::warn!("{city}: boundary contains no grid points");
        }

        let results = extract_points(self.source, &city, grid, &self.options, progress)?;
        let summary = ExtractionSummary::of(&results);
        let records: Vec<GridRecord> = results
            .into_iter()
            .map(|r| GridRecord {
                features: r.extraction.into_features(),
                point: r.point,
            })
            .collect();
        let dataset = grid_dataset_path(&self.data_dir, &city);
        write_grid_dataset(&dataset, &records)?;
        log::info!("{city}: wrote {} rows to {dataset}", records.len());

        Ok(CityReport {
            city,
            points: summary.total,
            degraded: summary.degraded,
            dataset,
        })
    }

    /// Extract every city in `catalog`, isolating per-city failures.
    pub fn run_all<P>(&self, catalog: &CityCatalog, progress: &P) -> Vec<CityOutcome>
    where
        P: ExtractionProgress + ?Sized,
    {
        catalog
            .cities
            .iter()
            .map(|spec| {
                log::info!("processing {}", spec.place_name());
                let result = self.run_city(spec, progress);
                if let Err(err) = &result {
                    log::warn!("{} failed: {}", spec.name, error_chain(err));
                }
                CityOutcome {
                    city: spec.name.clone(),
                    result,
                }
            })
            .collect()
    }
}

fn error_chain(err: &dyn std::error::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::read_grid_dataset;
    use crate::extraction::NullProgress;
    use rstest::{fixture, rstest};
    use sitescore_core::test_support::{StubGeoDataSource, square_boundary, tagged};
    use tempfile::TempDir;

    #[fixture]
    fn temp_dir() -> TempDir {
        TempDir::new().unwrap_or_else(|err| panic!("create temporary directory: {err}"))
    }

    fn data_dir(dir: &TempDir) -> Utf8PathBuf {
        Utf8PathBuf::from_path_buf(dir.path().to_path_buf())
            .unwrap_or_else(|p| panic!("non UTF-8 path {}", p.display()))
    }

    fn options() -> ExtractionOptions {
        ExtractionOptions::default().with_workers(2)
    }

    #[rstest]
    fn default_catalog_lists_french_cities() {
        let catalog = CityCatalog::default();
        let names: Vec<_> = catalog.cities.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["Paris", "Lille", "Bordeaux", "Strasbourg", "Toulouse"]);
        assert!(catalog.cities.iter().all(|c| c.grid_spacing_m == 250.0));
        assert_eq!(catalog.cities.first().map(CitySpec::place_name).as_deref(), Some("Paris, France"));
    }

    #[rstest]
    fn run_city_writes_grid_dataset(temp_dir: TempDir) {
        let source = StubGeoDataSource::with_features(vec![tagged(1, "shop", "shoes")])
            .and_boundary(square_boundary(50.60, 3.00, 0.01));
        let runner = CityRunner::new(&source, data_dir(&temp_dir)).with_options(options());
        let spec = CitySpec::new("Lille", "France").with_spacing(500.0);

        let report = runner.run_city(&spec, &NullProgress).expect("run succeeds");

        assert!(report.points > 0);
        assert_eq!(report.degraded, 0);
        assert_eq!(report.dataset, data_dir(&temp_dir).join("lille_grid.csv"));
        let rows = read_grid_dataset(&report.dataset).expect("dataset readable");
        assert_eq!(rows.len(), report.points);
        assert!(rows.iter().all(|r| r.features.shops_shoes == 1 && r.point.city == "Lille"));
    }

    #[rstest]
    fn missing_boundary_fails_only_that_city(temp_dir: TempDir) {
        let source = StubGeoDataSource::with_features(Vec::new());
        let runner = CityRunner::new(&source, data_dir(&temp_dir)).with_options(options());
        let catalog = CityCatalog::for_country("France", ["Atlantis", "Lyonesse"]);

        let outcomes = runner.run_all(&catalog, &NullProgress);

        assert_eq!(outcomes.len(), 2);
        assert!(outcomes.iter().all(|o| matches!(
            o.result,
            Err(CityRunError::Boundary {
                source: GeoDataError::BoundaryNotFound { .. },
                ..
            })
        )));
    }

    #[rstest]
    fn invalid_spacing_is_a_grid_error(temp_dir: TempDir) {
        let source = StubGeoDataSource::with_features(Vec::new())
            .and_boundary(square_boundary(50.60, 3.00, 0.01));
        let runner = CityRunner::new(&source, data_dir(&temp_dir)).with_options(options());
        let spec = CitySpec::new("Lille", "France").with_spacing(0.0);

        let err = runner.run_city(&spec, &NullProgress).expect_err("should fail");
        assert!(matches!(err, CityRunError::Grid { .. }));
    }
}
