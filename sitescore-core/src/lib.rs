//! Core domain types for the sitescore engine.
//!
//! This crate holds the pieces shared by every stage of the site suitability
//! pipeline: validated coordinates, the fixed-shape [`FeatureVector`], the
//! [`GeoDataSource`] seam to external geographic data, grid generation over
//! city boundaries, feature extraction and city resolution. Constructors
//! return `Result` so invalid input surfaces early.

#![forbid(unsafe_code)]

pub mod city;
pub mod extract;
pub mod features;
pub mod grid;
mod poi;
pub mod point;
pub mod request;
pub mod score;
pub mod source;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use city::{CityBounds, CityResolver, CityTable};
pub use extract::{DegradedReason, Extraction, FeatureExtractor};
pub use features::{FeatureCategory, FeatureVector, UnknownCategory};
pub use grid::{CityBoundary, GridError, GridGenerator, GridPoint};
pub use poi::{GeoFeature, Tags};
pub use point::{GeoPoint, GeoPointError};
pub use request::{DEFAULT_RADIUS_M, MAX_RADIUS_M, MIN_RADIUS_M, RequestError, ScoreRequest};
pub use score::{NormalizationMode, ScoreSet};
pub use source::{GeoDataError, GeoDataSource, TagFilter, TagMatch};
