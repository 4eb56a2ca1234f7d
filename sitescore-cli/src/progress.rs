//! `indicatif` rendering of extraction progress and logger setup.
//!
//! Progress bars live in one [`MultiProgress`]; the logger is wrapped by
//! `indicatif-log-bridge` so log lines do not tear the bars while they
//! redraw.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use sitescore_data::ExtractionProgress;

/// One progress bar per city, added to a shared [`MultiProgress`].
pub struct IndicatifProgress {
    multi: MultiProgress,
    style: ProgressStyle,
    bars: Mutex<HashMap<String, ProgressBar>>,
}

impl IndicatifProgress {
    /// Render bars into `multi`.
    #[must_use]
    pub fn new(multi: &MultiProgress) -> Self {
        let style = ProgressStyle::with_template(
            "{msg:>12} {wide_bar:.cyan/dim} {pos}/{len} {percent}% [{eta}]",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("##-");
        Self {
            multi: multi.clone(),
            style,
            bars: Mutex::new(HashMap::new()),
        }
    }

    fn with_bar(&self, city: &str, f: impl FnOnce(&ProgressBar)) {
        let bars = self.bars.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(bar) = bars.get(city) {
            f(bar);
        }
    }
}

impl ExtractionProgress for IndicatifProgress {
    fn started(&self, city: &str, total: usize) {
        let bar = self
            .multi
            .add(ProgressBar::new(u64::try_from(total).unwrap_or(u64::MAX)));
        bar.set_style(self.style.clone());
        bar.set_message(city.to_owned());
        self.bars
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(city.to_owned(), bar);
    }

    fn advanced(&self, city: &str, processed: usize, _total: usize) {
        let position = u64::try_from(processed).unwrap_or(u64::MAX);
        self.with_bar(city, |bar| bar.set_position(position));
    }

    fn finished(&self, city: &str) {
        let removed = self
            .bars
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(city);
        if let Some(bar) = removed {
            bar.finish_with_message(format!("{city} done"));
        }
    }
}

/// Initialise `pretty_env_logger` behind `indicatif-log-bridge`.
///
/// Returns the [`MultiProgress`] every progress bar must be added to.
#[must_use]
pub fn init_logging() -> MultiProgress {
    let multi = MultiProgress::new();
    let logger = pretty_env_logger::formatted_builder()
        .parse_env("RUST_LOG")
        .build();
    let level = logger.filter();
    // A logger may already be installed when embedded in tests.
    indicatif_log_bridge::LogWrapper::new(multi.clone(), logger)
        .try_init()
        .ok();
    log::set_max_level(level);
    multi
}
