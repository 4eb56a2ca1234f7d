//! Progress reporting for extraction runs.
//!
//! [`ExtractionProgress`] keeps the orchestrator independent of how progress
//! is shown: the CLI renders `indicatif` bars, tests count calls, and
//! [`NullProgress`] ignores everything.

/// Receives progress events from extraction runs.
///
/// Methods are called from worker threads, in no particular order between
/// points.
pub trait ExtractionProgress: Send + Sync {
    /// A city's grid is about to be extracted.
    fn started(&self, _city: &str, _total: usize) {}

    /// One more point has been processed.
    fn advanced(&self, _city: &str, _processed: usize, _total: usize) {}

    /// A city's extraction has finished.
    fn finished(&self, _city: &str) {}
}

/// Progress sink that ignores every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullProgress;

impl ExtractionProgress for NullProgress {}
