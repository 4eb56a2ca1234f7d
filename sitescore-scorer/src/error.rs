//! Error types raised while building, loading or persisting baselines.
#![forbid(unsafe_code)]

use camino::Utf8PathBuf;
use sitescore_data::DatasetError;
use thiserror::Error;

/// Errors raised by baseline and batch-scoring operations.
///
/// A city without a dataset is not an error: loaders report it as
/// `Ok(None)`.
#[derive(Debug, Error)]
pub enum BaselineError {
    /// Reading or writing a CSV dataset failed.
    #[error(transparent)]
    Dataset(#[from] DatasetError),
    /// Inspecting a dataset file on disk failed.
    #[error("failed to inspect {path}")]
    Inspect {
        /// Path being inspected.
        path: Utf8PathBuf,
        /// Source error from std I/O.
        #[source]
        source: std::io::Error,
    },
    /// A dataset exists but holds no rows to derive a baseline from.
    #[error("dataset {path} for {city} has no rows")]
    EmptyDataset {
        /// City being processed.
        city: String,
        /// Dataset path.
        path: Utf8PathBuf,
    },
    /// Creating an output file failed.
    #[error("failed to write {path}")]
    WriteFile {
        /// Target file path.
        path: Utf8PathBuf,
        /// Source error from std I/O.
        #[source]
        source: std::io::Error,
    },
    /// Opening an input file failed.
    #[error("failed to read {path}")]
    ReadFile {
        /// Input file path.
        path: Utf8PathBuf,
        /// Source error from std I/O.
        #[source]
        source: std::io::Error,
    },
    /// Serialising a baseline with `bincode` failed.
    #[error("failed to serialise baseline into {path}")]
    Serialise {
        /// Target file path.
        path: Utf8PathBuf,
        /// Source error from `bincode`.
        #[source]
        source: bincode::Error,
    },
    /// Decoding a baseline artefact failed.
    #[error("failed to decode baseline file at {path}")]
    Deserialise {
        /// Artefact path.
        path: Utf8PathBuf,
        /// Source error from `bincode`.
        #[source]
        source: bincode::Error,
    },
    /// Writing city statistics as JSON failed.
    #[error("failed to write city statistics to {path}")]
    WriteStats {
        /// Target file path.
        path: Utf8PathBuf,
        /// Source error from `serde_json`.
        #[source]
        source: serde_json::Error,
    },
    /// Reading city statistics JSON failed.
    #[error("failed to parse city statistics at {path}")]
    ReadStats {
        /// Input file path.
        path: Utf8PathBuf,
        /// Source error from `serde_json`.
        #[source]
        source: serde_json::Error,
    },
}
