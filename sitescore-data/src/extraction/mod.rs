//! Parallel feature extraction over grid points.
//!
//! [`extract_points`] fans one [`FeatureExtractor`] call per grid point out
//! over a fixed-size rayon pool. Point-level failures never abort the run:
//! source errors, empty responses and worker panics all become degraded,
//! zero-vector results, so `N` points in always yields `N` results out.
//! [`CityRunner`] drives whole cities from boundary lookup to persisted
//! dataset.

mod cities;
mod progress;

use std::any::Any;
use std::num::NonZeroUsize;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::atomic::{AtomicUsize, Ordering};

use rayon::prelude::*;
use sitescore_core::{
    DEFAULT_RADIUS_M, DegradedReason, Extraction, FeatureExtractor, GeoDataSource, GridPoint,
};
use thiserror::Error;

pub use cities::{CityCatalog, CityOutcome, CityReport, CityRunError, CityRunner, CitySpec};
pub use progress::{ExtractionProgress, NullProgress};

/// Cores left free for the rest of the system when sizing the pool.
pub const WORKER_RESERVE: usize = 4;

/// Default pool size: available parallelism minus [`WORKER_RESERVE`], at
/// least one.
pub fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map_or(1, NonZeroUsize::get)
        .saturating_sub(WORKER_RESERVE)
        .max(1)
}

/// Settings for an extraction run.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractionOptions {
    /// Worker threads in the pool.
    pub workers: usize,
    /// Query radius around each point, in metres.
    pub radius_m: f64,
}

impl Default for ExtractionOptions {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            radius_m: f64::from(DEFAULT_RADIUS_M),
        }
    }
}

impl ExtractionOptions {
    /// Use `workers` threads.
    #[must_use]
    pub const fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    /// Query `radius_m` metres around each point.
    #[must_use]
    pub const fn with_radius(mut self, radius_m: f64) -> Self {
        self.radius_m = radius_m;
        self
    }
}

/// Errors that abort an extraction run.
#[derive(Debug, Error)]
pub enum ExtractionError {
    /// Zero workers were requested.
    #[error("extraction needs at least one worker")]
    NoWorkers,
    /// The worker pool could not be created.
    #[error("failed to build extraction worker pool")]
    Pool(#[from] rayon::ThreadPoolBuildError),
}

/// A grid point with its extraction outcome.
#[derive(Debug, Clone, PartialEq)]
pub struct PointExtraction {
    /// Grid point queried.
    pub point: GridPoint,
    /// Outcome of the query.
    pub extraction: Extraction,
}

/// Counts of successful and degraded results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ExtractionSummary {
    /// Results tallied.
    pub total: usize,
    /// Results that degraded.
    pub degraded: usize,
}

impl ExtractionSummary {
    /// Tally `results`.
    pub fn of(results: &[PointExtraction]) -> Self {
        Self {
            total: results.len(),
            degraded: results
                .iter()
                .filter(|r| r.extraction.is_degraded())
                .count(),
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_owned())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic payload".to_owned())
}

/// Extract features for every point in `points`.
///
/// Results come back in input order, but points are processed concurrently
/// and progress events arrive in completion order.
///
/// # Examples
/// ```
/// use sitescore_core::{GeoPoint, GridPoint, test_support::StubGeoDataSource};
/// use sitescore_data::extraction::{ExtractionOptions, NullProgress, extract_points};
///
/// let source = StubGeoDataSource::with_features(Vec::new());
/// let points = vec![GridPoint::new("Paris", GeoPoint::new(48.85, 2.35)?)];
/// let results = extract_points(&source, "Paris", points, &ExtractionOptions::default().with_workers(2), &NullProgress)?;
/// assert_eq!(results.len(), 1);
/// assert!(results[0].extraction.is_degraded());
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn extract_points<S, P>(
    source: &S,
    city: &str,
    points: Vec<GridPoint>,
    options: &ExtractionOptions,
    progress: &P,
) -> Result<Vec<PointExtraction>, ExtractionError>
where
    S: GeoDataSource + ?Sized,
    P: ExtractionProgress + ?Sized,
{
    if options.workers == 0 {
        return Err(ExtractionError::NoWorkers);
    }
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(options.workers)
        .thread_name(|i| format!("sitescore-extract-{i}"))
        .build()?;

    let total = points.len();
    let log_every = (total / 10).max(1);
    let processed = AtomicUsize::new(0);
    let extractor = FeatureExtractor::new(source);
    log::info!(
        "extracting {total} points for {city} on {} workers",
        options.workers
    );
    progress.started(city, total);

    let results: Vec<PointExtraction> = pool.install(|| {
        points
            .into_par_iter()
            .map(|point| {
                let extraction = catch_unwind(AssertUnwindSafe(|| {
                    extractor.extract(point.location, options.radius_m)
                }))
                .unwrap_or_else(|payload| {
                    let message = panic_message(payload.as_ref());
                    log::warn!("extraction for {} panicked: {message}", point.point_id);
                    Extraction::degraded(DegradedReason::WorkerPanic(message))
                });
                let done = processed.fetch_add(1, Ordering::Relaxed) + 1;
                progress.advanced(city, done, total);
                if done % log_every == 0 || done == total {
                    log::info!("{city}: processed {done}/{total} points");
                }
                PointExtraction { point, extraction }
            })
            .collect()
    });

    let summary = ExtractionSummary::of(&results);
    if summary.degraded > 0 {
        log::warn!(
            "{city}: {} of {} extractions degraded to zero vectors",
            summary.degraded,
            summary.total
        );
    }
    progress.finished(city);
    Ok(results)
}
