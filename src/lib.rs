//! Facade crate for the sitescore retail suitability engine.
//!
//! This crate re-exports the core domain types and exposes dataset
//! extraction and scoring behind feature flags.

#![forbid(unsafe_code)]

pub use sitescore_core::{
    CityResolver, CityTable, FeatureCategory, FeatureExtractor, FeatureVector, GeoDataError,
    GeoDataSource, GeoPoint, GridGenerator, GridPoint, NormalizationMode, ScoreRequest, ScoreSet,
};

#[cfg(feature = "data")]
pub use sitescore_data::{
    CityCatalog, CityRunner, ExtractionOptions, HttpGeoDataSource, HttpGeoDataSourceConfig,
    extract_points,
};

#[cfg(feature = "scorer")]
pub use sitescore_scorer::{
    BaselineCache, BaselineLoader, CityStats, LocationScorer, NormalizationBaseline, Ranking,
    ScoredLocation, ScoringConfig, ScoringEngine, score_city_dataset,
};
