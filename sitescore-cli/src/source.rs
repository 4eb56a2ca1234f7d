//! Geo data source construction shared by the commands that query OSM.

use std::sync::Arc;
use std::time::Duration;

use sitescore_core::GeoDataSource;
use sitescore_data::{HttpGeoDataSource, HttpGeoDataSourceConfig};

use crate::CliError;

/// Endpoint overrides accepted by every command that queries OSM.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct SourceOverrides {
    pub(crate) overpass_url: Option<String>,
    pub(crate) nominatim_url: Option<String>,
    pub(crate) timeout_secs: Option<u64>,
}

impl SourceOverrides {
    /// Apply the overrides on top of the public endpoints.
    pub(crate) fn into_config(self) -> HttpGeoDataSourceConfig {
        let mut config = HttpGeoDataSourceConfig::default();
        if let Some(url) = self.overpass_url {
            config = config.with_overpass_url(url);
        }
        if let Some(url) = self.nominatim_url {
            config = config.with_nominatim_url(url);
        }
        if let Some(secs) = self.timeout_secs {
            config = config.with_timeout(Duration::from_secs(secs));
        }
        config
    }
}

/// Builds the geo data source for the current invocation.
pub(crate) trait SourceBuilder {
    fn build(&self, config: &HttpGeoDataSourceConfig) -> Result<Arc<dyn GeoDataSource>, CliError>;
}

/// Talks to Overpass and Nominatim over HTTP.
pub(crate) struct HttpSourceBuilder;

impl SourceBuilder for HttpSourceBuilder {
    fn build(&self, config: &HttpGeoDataSourceConfig) -> Result<Arc<dyn GeoDataSource>, CliError> {
        let source = HttpGeoDataSource::with_config(config.clone())?;
        log::debug!(
            "querying {} and {}",
            config.overpass_url,
            config.nominatim_url
        );
        Ok(Arc::new(source))
    }
}
