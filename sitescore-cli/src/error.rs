//! Error types emitted by the sitescore CLI.
//!
//! Keep this error type reasonably small, as many CLI helpers return
//! `Result<_, CliError>` and the workspace enables `clippy::result_large_err`.

use std::sync::Arc;

use camino::Utf8PathBuf;
use sitescore_core::RequestError;
use sitescore_data::SourceBuildError;
use sitescore_scorer::BaselineError;
use thiserror::Error;

/// Errors emitted by the sitescore CLI.
#[derive(Debug, Error)]
pub enum CliError {
    /// Provided arguments failed Clap validation.
    #[error(transparent)]
    ArgumentParsing(#[from] clap::Error),
    /// Configuration layering failed (files, env, CLI).
    #[error("failed to load configuration: {0}")]
    Configuration(#[from] Arc<ortho_config::OrthoError>),
    /// A required option is missing after configuration merging.
    #[error("missing {field} (set --{field} or {env})")]
    MissingArgument {
        /// Option name as written on the command line.
        field: &'static str,
        /// Environment variable that also sets the option.
        env: &'static str,
    },
    /// An option was present but unusable.
    #[error("invalid {field}: {reason}")]
    InvalidArgument {
        /// Option name as written on the command line.
        field: &'static str,
        /// Why the value was rejected.
        reason: String,
    },
    /// A referenced input path does not exist on disk or is not a file.
    #[error("{field} path {path:?} does not exist or is not a file")]
    MissingSourceFile {
        /// Option name as written on the command line.
        field: &'static str,
        /// Path involved.
        path: Utf8PathBuf,
    },
    /// A referenced input path could not be inspected due to an IO error.
    #[error("failed to inspect {field} path {path:?}: {source}")]
    InspectSourcePath {
        /// Option name as written on the command line.
        field: &'static str,
        /// Path involved.
        path: Utf8PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },
    /// The scoring request failed validation.
    #[error("invalid scoring request: {0}")]
    InvalidRequest(#[from] RequestError),
    /// Constructing the HTTP geo data source failed.
    #[error("failed to build geo data source: {0}")]
    BuildSource(#[from] SourceBuildError),
    /// Every city in an extraction batch failed.
    #[error("extraction failed for all {total} cities")]
    ExtractionFailed {
        /// Cities in the batch.
        total: usize,
    },
    /// Scoring a city's grid dataset failed.
    #[error("failed to score the {city} dataset: {source}")]
    ScoreDataset {
        /// City whose dataset was scored.
        city: String,
        /// Underlying error.
        #[source]
        source: BaselineError,
    },
    /// Reading the sites CSV failed.
    #[error("failed to read sites from {path:?}: {source}")]
    ReadSites {
        /// Path involved.
        path: Utf8PathBuf,
        /// Underlying error.
        #[source]
        source: csv::Error,
    },
    /// Opening the sites CSV failed.
    #[error("failed to open sites file {path:?}: {source}")]
    OpenSites {
        /// Path involved.
        path: Utf8PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },
    /// Writing the scored sites CSV failed.
    #[error("failed to write scored sites to {path:?}: {source}")]
    WriteSites {
        /// Path involved.
        path: Utf8PathBuf,
        /// Underlying error.
        #[source]
        source: csv::Error,
    },
    /// Creating the scored sites CSV failed.
    #[error("failed to create scored sites file {path:?}: {source}")]
    CreateSites {
        /// Path involved.
        path: Utf8PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },
    /// Serialising command output failed.
    #[error("failed to serialise output: {0}")]
    SerialiseOutput(#[source] serde_json::Error),
    /// Writing command output failed.
    #[error("failed to write output: {0}")]
    WriteOutput(#[source] std::io::Error),
}
