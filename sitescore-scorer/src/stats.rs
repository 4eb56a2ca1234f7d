//! Summary statistics over a city's scored grid.
#![forbid(unsafe_code)]

use std::fmt;
use std::io::{BufReader, BufWriter};

use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};
use sitescore_core::ScoreSet;
use sitescore_fs::{create_utf8_file, open_utf8_file};

use crate::BaselineError;

const TOP_DECILE: f64 = 0.9;
const BOTTOM_DECILE: f64 = 0.1;

/// Means and global-score deciles for one city.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CityStats {
    /// City name.
    pub city: String,
    /// Number of scored grid points.
    pub total_points: usize,
    /// Mean attractiveness.
    pub avg_attractiveness: f64,
    /// Mean competition.
    pub avg_competition: f64,
    /// Mean accessibility.
    pub avg_accessibility: f64,
    /// Mean suitability.
    pub avg_suitability: f64,
    /// Mean global score.
    pub avg_global_score: f64,
    /// Global score at the 90th percentile.
    pub top_10_percent_threshold: f64,
    /// Global score at the 10th percentile.
    pub bottom_10_percent_threshold: f64,
}

/// Where a global score falls within a city's distribution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Ranking {
    /// Above the 90th percentile.
    Excellent,
    /// Above the city mean.
    AboveAverage,
    /// Above the 10th percentile.
    BelowAverage,
    /// At or below the 10th percentile.
    Poor,
}

impl Ranking {
    /// Human-readable label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Excellent => "excellent (top 10%)",
            Self::AboveAverage => "above average",
            Self::BelowAverage => "below average",
            Self::Poor => "poor (bottom 10%)",
        }
    }
}

impl fmt::Display for Ranking {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[expect(
    clippy::cast_precision_loss,
    reason = "point counts stay far below 2^53"
)]
const fn len_to_f64(len: usize) -> f64 {
    len as f64
}

#[expect(clippy::float_arithmetic, reason = "means divide sums by counts")]
fn mean(values: impl Iterator<Item = f64>, len: usize) -> f64 {
    values.sum::<f64>() / len_to_f64(len)
}

/// Linear-interpolated quantile of ascending `sorted` values.
#[expect(
    clippy::float_arithmetic,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    reason = "interpolation between neighbouring ranks"
)]
fn quantile(sorted: &[f64], q: f64) -> f64 {
    let last = sorted.len().saturating_sub(1);
    let position = q * len_to_f64(last);
    let lower = position.floor();
    let weight = position - lower;
    let index = lower as usize;
    let below = sorted.get(index).copied().unwrap_or(0.0);
    let above = sorted.get(index.saturating_add(1)).copied().unwrap_or(below);
    below + (above - below) * weight
}

impl CityStats {
    /// Summarise the scores of one city's grid, or `None` when empty.
    ///
    /// Percentiles interpolate linearly between neighbouring ranks.
    #[must_use]
    pub fn from_scores(city: impl Into<String>, scores: &[ScoreSet]) -> Option<Self> {
        if scores.is_empty() {
            return None;
        }
        let n = scores.len();
        let mut globals: Vec<f64> = scores.iter().map(|s| s.global_score).collect();
        globals.sort_by(f64::total_cmp);
        Some(Self {
            city: city.into(),
            total_points: n,
            avg_attractiveness: mean(scores.iter().map(|s| s.attractiveness), n),
            avg_competition: mean(scores.iter().map(|s| s.competition), n),
            avg_accessibility: mean(scores.iter().map(|s| s.accessibility), n),
            avg_suitability: mean(scores.iter().map(|s| s.suitability), n),
            avg_global_score: mean(globals.iter().copied(), n),
            top_10_percent_threshold: quantile(&globals, TOP_DECILE),
            bottom_10_percent_threshold: quantile(&globals, BOTTOM_DECILE),
        })
    }

    /// Rank a global score against this city.
    #[must_use]
    pub fn rank(&self, global_score: f64) -> Ranking {
        if global_score > self.top_10_percent_threshold {
            Ranking::Excellent
        } else if global_score > self.avg_global_score {
            Ranking::AboveAverage
        } else if global_score > self.bottom_10_percent_threshold {
            Ranking::BelowAverage
        } else {
            Ranking::Poor
        }
    }
}

/// Path of the statistics file for `city` under `data_dir`.
#[must_use]
pub fn stats_path(data_dir: &Utf8Path, city: &str) -> Utf8PathBuf {
    data_dir.join(format!("{}_stats.json", city.to_lowercase()))
}

/// Write `stats` as pretty-printed JSON.
///
/// # Errors
/// Returns [`BaselineError::WriteFile`] when the file cannot be created and
/// [`BaselineError::WriteStats`] when encoding fails.
pub fn write_stats_file(path: &Utf8Path, stats: &CityStats) -> Result<(), BaselineError> {
    let file = create_utf8_file(path).map_err(|source| BaselineError::WriteFile {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::to_writer_pretty(BufWriter::new(file), stats).map_err(|source| {
        BaselineError::WriteStats {
            path: path.to_path_buf(),
            source,
        }
    })
}

/// Read statistics written by [`write_stats_file`].
///
/// # Errors
/// Returns [`BaselineError::ReadFile`] when the file cannot be opened and
/// [`BaselineError::ReadStats`] when it is not valid statistics JSON.
pub fn read_stats_file(path: &Utf8Path) -> Result<CityStats, BaselineError> {
    let file = open_utf8_file(path).map_err(|source| BaselineError::ReadFile {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_reader(BufReader::new(file)).map_err(|source| BaselineError::ReadStats {
        path: path.to_path_buf(),
        source,
    })
}
