//! Per-city baseline cache keyed by dataset modification time.
#![forbid(unsafe_code)]

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::SystemTime;

use camino::{Utf8Path, Utf8PathBuf};
use sitescore_fs::modified_time;

use crate::{BaselineError, BaselineLoader, NormalizationBaseline};

#[derive(Debug, Clone)]
struct CacheEntry {
    source: Utf8PathBuf,
    modified: SystemTime,
    baseline: Option<Arc<NormalizationBaseline>>,
}

/// Shares baseline snapshots between scoring calls.
///
/// A snapshot is reused while its source dataset keeps the same path and
/// modification time. A changed dataset is reloaded and the new snapshot
/// replaces the old one under a write lock, so concurrent readers observe
/// one snapshot or the other. Datasets whose modification time cannot be
/// read are reloaded on every call.
#[derive(Debug)]
pub struct BaselineCache {
    loader: BaselineLoader,
    entries: RwLock<HashMap<String, CacheEntry>>,
}

impl BaselineCache {
    /// Cache baselines produced by `loader`.
    #[must_use]
    pub fn new(loader: BaselineLoader) -> Self {
        Self {
            loader,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Underlying loader.
    #[must_use]
    pub const fn loader(&self) -> &BaselineLoader {
        &self.loader
    }

    /// Baseline for `city`, loading it when absent or stale.
    ///
    /// # Errors
    /// Propagates [`BaselineError`] from inspecting or reading the dataset.
    pub fn get(&self, city: &str) -> Result<Option<Arc<NormalizationBaseline>>, BaselineError> {
        let Some((kind, source)) = self.loader.source_for(city)? else {
            self.evict(city);
            return Ok(None);
        };
        let modified = modified_time(&source).map_err(|err| BaselineError::Inspect {
            path: source.clone(),
            source: err,
        })?;

        if let Some(current) = modified
            && let Some(hit) = self.lookup(city, &source, current)
        {
            return Ok(hit);
        }

        let baseline = BaselineLoader::load_from(city, kind, &source)?.map(Arc::new);
        if let Some(stamp) = modified {
            log::debug!("caching {city} baseline from {source}");
            self.entries
                .write()
                .unwrap_or_else(PoisonError::into_inner)
                .insert(
                    city.to_owned(),
                    CacheEntry {
                        source,
                        modified: stamp,
                        baseline: baseline.clone(),
                    },
                );
        }
        Ok(baseline)
    }

    /// Drop any cached snapshot for `city`.
    pub fn evict(&self, city: &str) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(city);
    }

    /// Number of cities with a cached snapshot.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether nothing is cached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lookup(
        &self,
        city: &str,
        source: &Utf8Path,
        modified: SystemTime,
    ) -> Option<Option<Arc<NormalizationBaseline>>> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries
            .get(city)
            .filter(|entry| entry.source.as_path() == source && entry.modified == modified)
            .map(|entry| entry.baseline.clone())
    }
}
