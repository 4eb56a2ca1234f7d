//! Data access and extraction pipeline for site scoring.
//!
//! Responsibilities:
//! - Adapt OpenStreetMap HTTP services to [`sitescore_core::GeoDataSource`].
//! - Fan feature extraction out over city grids on a worker pool.
//! - Read and write the per-city CSV datasets.
//!
//! Boundaries:
//! - Do not encode scoring rules (live in `sitescore-scorer`).
//! - Keep network I/O behind the synchronous source trait; async clients stay
//!   inside the source implementation.
//!
//! Invariants:
//! - A run over `N` grid points always yields `N` extraction results.
//! - No global mutable state.

pub mod dataset;
pub mod extraction;
pub mod source;

pub use dataset::{
    DatasetError, GridRecord, SCORE_COLUMNS, ScoredRecord, grid_dataset_path, read_grid_dataset,
    read_scored_dataset, scored_dataset_path, write_grid_dataset, write_scored_dataset,
};
pub use extraction::{
    CityCatalog, CityOutcome, CityReport, CityRunError, CityRunner, CitySpec, ExtractionError,
    ExtractionOptions, ExtractionProgress, ExtractionSummary, NullProgress, PointExtraction,
    extract_points,
};
pub use source::{HttpGeoDataSource, HttpGeoDataSourceConfig, SourceBuildError};
