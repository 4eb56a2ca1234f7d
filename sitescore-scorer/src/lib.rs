//! Scoring for retail site suitability.
//!
//! The crate turns [`FeatureVector`](sitescore_core::FeatureVector)s into
//! [`ScoreSet`](sitescore_core::ScoreSet)s and manages the per-city data the
//! formulas are normalised by:
//! - **Scoring** applies fixed weighted linear formulas through
//!   [`ScoringEngine`], configured by an immutable [`ScoringConfig`].
//! - **Baselines** record each city's maximum count per category.
//!   [`BaselineLoader`] recomputes them from the city's datasets,
//!   [`BaselineCache`] shares snapshots between requests, and
//!   [`write_baseline_file`] persists them with `bincode`.
//! - **Batch scoring** scores a whole grid dataset against its own baseline
//!   and summarises the result as [`CityStats`].
//! - **Location scoring** resolves a request's city and scores one point
//!   through [`LocationScorer`].
//!
//! # Examples
//!
//! ```no_run
//! use camino::Utf8Path;
//! use sitescore_scorer::{ScoringEngine, score_city_dataset};
//!
//! let outcome = score_city_dataset(Utf8Path::new("data"), "Lille", &ScoringEngine::default())
//!     .expect("score Lille grid");
//! println!("{} points, mean {:.1}", outcome.stats.total_points, outcome.stats.avg_global_score);
//! ```

#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]

mod baseline;
mod batch;
mod cache;
pub mod config;
mod engine;
mod error;
mod location;
mod stats;

pub use baseline::{
    BaselineBuilder, BaselineLoader, DatasetKind, NormalizationBaseline, baseline_path,
    read_baseline_file, write_baseline_file,
};
pub use batch::{DatasetScoring, score_city_dataset};
pub use cache::BaselineCache;
pub use config::ScoringConfig;
pub use engine::{ScoringEngine, normalize};
pub use error::BaselineError;
pub use location::{LocationScorer, ScoredLocation};
pub use stats::{CityStats, Ranking, read_stats_file, stats_path, write_stats_file};

/// Bincode options used for baseline artefacts.
pub(crate) fn bincode_options() -> impl bincode::Options {
    bincode::DefaultOptions::new()
}

/// Public helper exposing the bincode configuration used for baseline files.
#[must_use]
pub fn baseline_bincode_options() -> impl bincode::Options {
    bincode_options()
}
