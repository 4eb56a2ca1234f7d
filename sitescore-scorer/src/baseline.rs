//! Per-city normalization baselines.
//!
//! A baseline records, for one city, the largest count observed in each
//! feature category across the city's grid. The scoring engine divides by
//! these maxima so scores are relative to the city rather than to fixed
//! national constants.
//!
//! Baselines are derived data: [`BaselineLoader`] recomputes them from the
//! scored dataset when present, otherwise from the grid dataset, and reports
//! `None` when the city has neither.
#![forbid(unsafe_code)]

use std::io::{BufReader, BufWriter};

use bincode::Options;
use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};
use sitescore_core::{FeatureCategory, FeatureVector};
use sitescore_data::{
    grid_dataset_path, read_grid_dataset, read_scored_dataset, scored_dataset_path,
};
use sitescore_fs::{create_utf8_file, file_is_file, modified_time, open_utf8_file};

use crate::{BaselineError, bincode_options};

/// Maximum observed value per feature category for one city.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizationBaseline {
    city: String,
    points: u64,
    maxima: FeatureVector,
    max_tourism_total: u32,
    max_tourism_venues: u32,
}

impl NormalizationBaseline {
    /// Build a baseline from the feature vectors of one city's grid.
    ///
    /// Returns `None` when `features` is empty.
    ///
    /// # Examples
    /// ```
    /// use sitescore_core::{FeatureCategory, FeatureVector};
    /// use sitescore_scorer::NormalizationBaseline;
    ///
    /// let busy = FeatureVector { restaurants: 12, ..FeatureVector::default() };
    /// let quiet = FeatureVector { restaurants: 3, parks: 2, ..FeatureVector::default() };
    /// let baseline = NormalizationBaseline::from_features("Lille", [&busy, &quiet])
    ///     .expect("non-empty input");
    /// assert_eq!(baseline.max(FeatureCategory::Restaurants), 12);
    /// assert_eq!(baseline.max(FeatureCategory::Parks), 2);
    /// ```
    pub fn from_features<'a, I>(city: impl Into<String>, features: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a FeatureVector>,
    {
        let mut builder = BaselineBuilder::new(city);
        builder.extend(features);
        builder.build()
    }

    /// City the baseline belongs to.
    #[must_use]
    pub fn city(&self) -> &str {
        &self.city
    }

    /// Number of grid points the baseline was derived from.
    #[must_use]
    pub const fn points(&self) -> u64 {
        self.points
    }

    /// Per-category maxima.
    #[must_use]
    pub const fn maxima(&self) -> &FeatureVector {
        &self.maxima
    }

    /// Maximum observed for `category`.
    #[must_use]
    pub const fn max(&self, category: FeatureCategory) -> u32 {
        self.maxima.get(category)
    }

    /// Maximum `total_pois`, recorded as the tourism-total ceiling.
    #[must_use]
    pub const fn max_tourism_total(&self) -> u32 {
        self.max_tourism_total
    }

    /// Maximum of `hotels + attractions + museums` at any single point.
    #[must_use]
    pub const fn max_tourism_venues(&self) -> u32 {
        self.max_tourism_venues
    }

    /// Sum of the maxima of `categories`.
    #[must_use]
    pub fn sum_of_maxima(&self, categories: &[FeatureCategory]) -> u64 {
        categories
            .iter()
            .map(|&category| u64::from(self.max(category)))
            .sum()
    }
}

/// Incremental [`NormalizationBaseline`] construction.
#[derive(Debug, Clone)]
pub struct BaselineBuilder {
    city: String,
    points: u64,
    maxima: FeatureVector,
    max_tourism_venues: u32,
}

impl BaselineBuilder {
    /// Start an empty baseline for `city`.
    pub fn new(city: impl Into<String>) -> Self {
        Self {
            city: city.into(),
            points: 0,
            maxima: FeatureVector::default(),
            max_tourism_venues: 0,
        }
    }

    /// Fold one grid point's features into the maxima.
    pub fn add(&mut self, features: &FeatureVector) {
        self.points = self.points.saturating_add(1);
        self.maxima = self.maxima.max_with(features);
        let venues = features
            .hotels
            .saturating_add(features.attractions)
            .saturating_add(features.museums);
        self.max_tourism_venues = self.max_tourism_venues.max(venues);
    }

    /// Finish the baseline, or `None` if nothing was added.
    #[must_use]
    pub fn build(self) -> Option<NormalizationBaseline> {
        (self.points > 0).then(|| NormalizationBaseline {
            max_tourism_total: self.maxima.total_pois,
            city: self.city,
            points: self.points,
            maxima: self.maxima,
            max_tourism_venues: self.max_tourism_venues,
        })
    }
}

impl<'a> Extend<&'a FeatureVector> for BaselineBuilder {
    fn extend<T: IntoIterator<Item = &'a FeatureVector>>(&mut self, iter: T) {
        for features in iter {
            self.add(features);
        }
    }
}

/// Path of the baseline artefact for `city` under `data_dir`.
#[must_use]
pub fn baseline_path(data_dir: &Utf8Path, city: &str) -> Utf8PathBuf {
    data_dir.join(format!("{}_baseline.bin", city.to_lowercase()))
}

/// Persist `baseline` with `bincode`, creating parent directories.
///
/// # Errors
/// Returns [`BaselineError::WriteFile`] when the file cannot be created and
/// [`BaselineError::Serialise`] when encoding fails.
pub fn write_baseline_file(
    path: &Utf8Path,
    baseline: &NormalizationBaseline,
) -> Result<(), BaselineError> {
    let file = create_utf8_file(path).map_err(|source| BaselineError::WriteFile {
        path: path.to_path_buf(),
        source,
    })?;
    bincode_options()
        .serialize_into(BufWriter::new(file), baseline)
        .map_err(|source| BaselineError::Serialise {
            path: path.to_path_buf(),
            source,
        })
}

/// Read a baseline written by [`write_baseline_file`].
///
/// # Errors
/// Returns [`BaselineError::ReadFile`] when the file cannot be opened and
/// [`BaselineError::Deserialise`] when decoding fails.
pub fn read_baseline_file(path: &Utf8Path) -> Result<NormalizationBaseline, BaselineError> {
    let file = open_utf8_file(path).map_err(|source| BaselineError::ReadFile {
        path: path.to_path_buf(),
        source,
    })?;
    bincode_options()
        .deserialize_from(BufReader::new(file))
        .map_err(|source| BaselineError::Deserialise {
            path: path.to_path_buf(),
            source,
        })
}

/// Which dataset a baseline is derived from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatasetKind {
    /// `<city>_scored.csv`.
    Scored,
    /// `<city>_grid.csv`.
    Grid,
}

/// Recomputes baselines from the datasets under a data directory.
#[derive(Debug, Clone)]
pub struct BaselineLoader {
    data_dir: Utf8PathBuf,
}

impl BaselineLoader {
    /// Load from datasets under `data_dir`.
    pub fn new(data_dir: impl AsRef<Utf8Path>) -> Self {
        Self {
            data_dir: data_dir.as_ref().to_path_buf(),
        }
    }

    /// Directory holding the datasets.
    #[must_use]
    pub fn data_dir(&self) -> &Utf8Path {
        &self.data_dir
    }

    /// The dataset a baseline for `city` would be loaded from.
    ///
    /// The scored dataset wins unless the grid dataset was modified after it,
    /// which happens when a city is re-extracted but not yet re-scored.
    ///
    /// # Errors
    /// Returns [`BaselineError::Inspect`] when the filesystem cannot be
    /// queried.
    pub fn source_for(
        &self,
        city: &str,
    ) -> Result<Option<(DatasetKind, Utf8PathBuf)>, BaselineError> {
        let scored = scored_dataset_path(&self.data_dir, city);
        let grid = grid_dataset_path(&self.data_dir, city);
        match (existing(&scored)?, existing(&grid)?) {
            (true, true) if modified_after(&grid, &scored)? => {
                log::debug!("{grid} is newer than {scored}; using the grid dataset");
                Ok(Some((DatasetKind::Grid, grid)))
            }
            (true, _) => Ok(Some((DatasetKind::Scored, scored))),
            (false, true) => Ok(Some((DatasetKind::Grid, grid))),
            (false, false) => Ok(None),
        }
    }

    /// Recompute the baseline for `city`.
    ///
    /// Returns `Ok(None)` when the city has no dataset, or when its dataset
    /// has no rows.
    ///
    /// # Errors
    /// Returns [`BaselineError`] when a dataset exists but cannot be read.
    pub fn load(&self, city: &str) -> Result<Option<NormalizationBaseline>, BaselineError> {
        let Some((kind, path)) = self.source_for(city)? else {
            log::debug!("no dataset for {city} under {}", self.data_dir);
            return Ok(None);
        };
        let baseline = Self::load_from(city, kind, &path)?;
        if baseline.is_none() {
            log::warn!("{path} has no rows; {city} has no baseline");
        }
        Ok(baseline)
    }

    /// Recompute a baseline for `city` from the dataset at `path`.
    ///
    /// # Errors
    /// Returns [`BaselineError::Dataset`] when the dataset cannot be read.
    pub fn load_from(
        city: &str,
        kind: DatasetKind,
        path: &Utf8Path,
    ) -> Result<Option<NormalizationBaseline>, BaselineError> {
        let baseline = match kind {
            DatasetKind::Scored => {
                let rows = read_scored_dataset(path)?;
                NormalizationBaseline::from_features(city, rows.iter().map(|r| &r.features))
            }
            DatasetKind::Grid => {
                let rows = read_grid_dataset(path)?;
                NormalizationBaseline::from_features(city, rows.iter().map(|r| &r.features))
            }
        };
        if let Some(found) = &baseline {
            log::info!("loaded {city} baseline from {path} ({} points)", found.points());
        }
        Ok(baseline)
    }
}

fn existing(path: &Utf8Path) -> Result<bool, BaselineError> {
    file_is_file(path).map_err(|source| BaselineError::Inspect {
        path: path.to_path_buf(),
        source,
    })
}

/// Whether `path` was modified strictly after `other`. Unknown times compare
/// as not newer.
fn modified_after(path: &Utf8Path, other: &Utf8Path) -> Result<bool, BaselineError> {
    let stamp = |target: &Utf8Path| {
        modified_time(target).map_err(|source| BaselineError::Inspect {
            path: target.to_path_buf(),
            source,
        })
    };
    Ok(matches!((stamp(path)?, stamp(other)?), (Some(mine), Some(theirs)) if mine > theirs))
}
