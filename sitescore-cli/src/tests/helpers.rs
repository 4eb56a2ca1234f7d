//! Test helpers for composing CLI workspaces and stub data sources.

use std::sync::Arc;

use camino::{Utf8Path, Utf8PathBuf};
use sitescore_core::GeoDataSource;
use sitescore_core::test_support::StubGeoDataSource;
use sitescore_data::HttpGeoDataSourceConfig;
use tempfile::TempDir;

use crate::CliError;
use crate::source::SourceBuilder;

pub(super) fn utf8_tempdir() -> (TempDir, Utf8PathBuf) {
    let tmp = TempDir::new().expect("tempdir");
    let root = Utf8PathBuf::from_path_buf(tmp.path().to_path_buf()).expect("utf-8 workspace");
    (tmp, root)
}

pub(super) fn write_utf8(path: &Utf8Path, contents: &[u8]) {
    std::fs::write(path, contents).expect("write test file");
}

/// Hands out one shared stub regardless of the configured endpoints.
pub(super) struct StubSourceBuilder {
    source: Arc<StubGeoDataSource>,
}

impl StubSourceBuilder {
    pub(super) fn new(source: StubGeoDataSource) -> Self {
        Self {
            source: Arc::new(source),
        }
    }

    pub(super) fn queries(&self) -> usize {
        self.source.query_count()
    }
}

impl SourceBuilder for StubSourceBuilder {
    fn build(&self, _config: &HttpGeoDataSourceConfig) -> Result<Arc<dyn GeoDataSource>, CliError> {
        let source: Arc<dyn GeoDataSource> = self.source.clone();
        Ok(source)
    }
}
