//! Blocking [`GeoDataSource`] over the Overpass and Nominatim HTTP APIs.
//!
//! The [`GeoDataSource`] trait is synchronous so the extraction orchestrator
//! can call it from plain worker threads. The source bridges to async
//! `reqwest` calls by blocking on a Tokio runtime it owns.

use std::time::Duration;

use geo::MultiPolygon;
use reqwest::Client;
use serde::de::DeserializeOwned;
use sitescore_core::{GeoDataError, GeoDataSource, GeoFeature, GeoPoint, TagFilter};
use thiserror::Error;
use tokio::runtime::{Handle, Runtime, RuntimeFlavor};
use url::Url;

use super::nominatim::{Place, boundary_from_places};
use super::overpass::{OverpassResponse, build_query};

/// Errors raised while building an [`HttpGeoDataSource`].
#[derive(Debug, Error)]
pub enum SourceBuildError {
    /// Failed to build the HTTP client.
    #[error("failed to build HTTP client")]
    HttpClient(#[source] reqwest::Error),
    /// Failed to build the Tokio runtime.
    #[error("failed to build Tokio runtime")]
    Runtime(#[source] std::io::Error),
    /// A configured base URL could not be parsed.
    #[error("invalid service URL {url}")]
    InvalidUrl {
        /// The rejected URL.
        url: String,
        /// Parse failure.
        #[source]
        source: url::ParseError,
    },
}

/// Default user agent; Nominatim's usage policy requires one that identifies
/// the application.
pub const DEFAULT_USER_AGENT: &str = "sitescore/0.1";

/// Public Overpass interpreter endpoint.
pub const DEFAULT_OVERPASS_URL: &str = "https://overpass-api.de/api/interpreter";

/// Public Nominatim endpoint.
pub const DEFAULT_NOMINATIM_URL: &str = "https://nominatim.openstreetmap.org";

const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Configuration for [`HttpGeoDataSource`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpGeoDataSourceConfig {
    /// Overpass interpreter URL.
    pub overpass_url: String,
    /// Nominatim base URL; `/search` is appended.
    pub nominatim_url: String,
    /// Per-request timeout, also sent to Overpass as the query timeout.
    pub timeout: Duration,
    /// User agent sent with every request.
    pub user_agent: String,
}

impl Default for HttpGeoDataSourceConfig {
    fn default() -> Self {
        Self {
            overpass_url: DEFAULT_OVERPASS_URL.to_owned(),
            nominatim_url: DEFAULT_NOMINATIM_URL.to_owned(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            user_agent: DEFAULT_USER_AGENT.to_owned(),
        }
    }
}

impl HttpGeoDataSourceConfig {
    /// Use the given Overpass interpreter.
    #[must_use]
    pub fn with_overpass_url(mut self, url: impl Into<String>) -> Self {
        self.overpass_url = url.into();
        self
    }

    /// Use the given Nominatim instance.
    #[must_use]
    pub fn with_nominatim_url(mut self, url: impl Into<String>) -> Self {
        self.nominatim_url = url.into();
        self
    }

    /// Set the request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the user agent string.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }
}

/// HTTP geographic data source.
///
/// One instance is shared by every extraction worker. Calls made outside a
/// Tokio context block on the owned multi-threaded runtime, so concurrent
/// callers do not serialise on a single reactor. Calls made from inside a
/// multi-threaded runtime use that runtime through
/// [`tokio::task::block_in_place`].
///
/// # Example
///
/// ```no_run
/// use sitescore_core::{FeatureExtractor, GeoPoint};
/// use sitescore_data::source::{HttpGeoDataSource, HttpGeoDataSourceConfig};
///
/// let source = HttpGeoDataSource::with_config(HttpGeoDataSourceConfig::default())?;
/// let extraction = FeatureExtractor::new(&source).extract(GeoPoint::new(48.8566, 2.3522)?, 500.0);
/// println!("{:?}", extraction.features());
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct HttpGeoDataSource {
    client: Client,
    config: HttpGeoDataSourceConfig,
    overpass: Url,
    search: Url,
    runtime: Runtime,
}

impl std::fmt::Debug for HttpGeoDataSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpGeoDataSource")
            .field("config", &self.config)
            .field("runtime", &"<tokio::runtime::Runtime>")
            .finish_non_exhaustive()
    }
}

fn parse_url(raw: &str) -> Result<Url, SourceBuildError> {
    Url::parse(raw).map_err(|source| SourceBuildError::InvalidUrl {
        url: raw.to_owned(),
        source,
    })
}

impl HttpGeoDataSource {
    /// Build a source with the public endpoints.
    pub fn new() -> Result<Self, SourceBuildError> {
        Self::with_config(HttpGeoDataSourceConfig::default())
    }

    /// Build a source with explicit configuration.
    pub fn with_config(config: HttpGeoDataSourceConfig) -> Result<Self, SourceBuildError> {
        let overpass = parse_url(&config.overpass_url)?;
        let search = parse_url(&format!(
            "{}/search",
            config.nominatim_url.trim_end_matches('/')
        ))?;
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .connect_timeout(config.timeout)
            .timeout(config.timeout)
            .build()
            .map_err(SourceBuildError::HttpClient)?;
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .thread_name("sitescore-http")
            .enable_all()
            .build()
            .map_err(SourceBuildError::Runtime)?;
        Ok(Self {
            client,
            config,
            overpass,
            search,
            runtime,
        })
    }

    /// Active configuration.
    pub const fn config(&self) -> &HttpGeoDataSourceConfig {
        &self.config
    }

    fn overpass_url(&self, point: GeoPoint, radius_m: f64, filter: &TagFilter) -> Url {
        let query = build_query(point, radius_m, filter, self.config.timeout.as_secs());
        let mut url = self.overpass.clone();
        url.query_pairs_mut().append_pair("data", &query);
        url
    }

    fn search_url(&self, place: &str) -> Url {
        let mut url = self.search.clone();
        url.query_pairs_mut()
            .append_pair("q", place)
            .append_pair("format", "jsonv2")
            .append_pair("polygon_geojson", "1")
            .append_pair("limit", "1");
        url
    }

    async fn fetch_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, GeoDataError> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|err| self.convert_reqwest_error(&err, &url))?
            .error_for_status()
            .map_err(|err| self.convert_reqwest_error(&err, &url))?;
        response
            .json::<T>()
            .await
            .map_err(|err| GeoDataError::Parse {
                message: err.to_string(),
            })
    }

    fn convert_reqwest_error(&self, error: &reqwest::Error, url: &Url) -> GeoDataError {
        let url = url.as_str().to_owned();
        if error.is_timeout() {
            return GeoDataError::Timeout {
                url,
                timeout_secs: self.config.timeout.as_secs(),
            };
        }
        if let Some(status) = error.status() {
            return GeoDataError::Http {
                url,
                status: status.as_u16(),
                message: error.to_string(),
            };
        }
        GeoDataError::Network {
            url,
            message: error.to_string(),
        }
    }

    fn block_on<F: Future>(&self, future: F) -> F::Output {
        match Handle::try_current() {
            Ok(handle) if handle.runtime_flavor() == RuntimeFlavor::MultiThread => {
                tokio::task::block_in_place(|| handle.block_on(future))
            }
            _ => self.runtime.block_on(future),
        }
    }
}

impl GeoDataSource for HttpGeoDataSource {
    fn query_features_near(
        &self,
        point: GeoPoint,
        radius_m: f64,
        filter: &TagFilter,
    ) -> Result<Vec<GeoFeature>, GeoDataError> {
        if !(radius_m.is_finite() && radius_m > 0.0) {
            return Err(GeoDataError::InvalidRadius { radius_m });
        }
        let url = self.overpass_url(point, radius_m, filter);
        let response: OverpassResponse = self.block_on(self.fetch_json(url.clone()))?;
        if let Some(remark) = response.error_remark() {
            return Err(GeoDataError::Service {
                url: url.as_str().to_owned(),
                message: remark.to_owned(),
            });
        }
        Ok(response.into_features())
    }

    fn resolve_boundary(&self, place: &str) -> Result<MultiPolygon<f64>, GeoDataError> {
        let url = self.search_url(place);
        let places: Vec<Place> = self.block_on(self.fetch_json(url))?;
        let boundary = boundary_from_places(place, places)?;
        log::debug!("resolved boundary for {place} with {} parts", boundary.0.len());
        Ok(boundary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};

    #[fixture]
    fn source() -> HttpGeoDataSource {
        let config = HttpGeoDataSourceConfig::default()
            .with_overpass_url("http://overpass.test/api/interpreter")
            .with_nominatim_url("http://nominatim.test/");
        HttpGeoDataSource::with_config(config).expect("source should build")
    }

    #[rstest]
    fn search_url_requests_geojson_outline(source: HttpGeoDataSource) {
        let url = source.search_url("Lille, France");
        assert_eq!(
            url.as_str(),
            "http://nominatim.test/search?q=Lille%2C+France&format=jsonv2&polygon_geojson=1&limit=1"
        );
    }

    #[rstest]
    fn overpass_url_carries_query(source: HttpGeoDataSource) {
        let point = GeoPoint::new(48.85, 2.35).expect("valid point");
        let filter = TagFilter::new().with_any("shop");
        let url = source.overpass_url(point, 500.0, &filter);
        let data = url
            .query_pairs()
            .find(|(key, _)| key == "data")
            .map(|(_, value)| value.into_owned())
            .expect("data parameter");
        assert!(url.as_str().starts_with("http://overpass.test/api/interpreter?data="));
        assert!(data.contains("nwr[\"shop\"](around:500,48.85,2.35);"));
        assert!(data.starts_with("[out:json][timeout:30];"));
    }

    #[rstest]
    fn invalid_radius_short_circuits(source: HttpGeoDataSource) {
        let point = GeoPoint::new(48.85, 2.35).expect("valid point");
        let err = source
            .query_features_near(point, 0.0, &TagFilter::retail())
            .expect_err("should fail");
        assert!(matches!(err, GeoDataError::InvalidRadius { .. }));
    }

    #[rstest]
    fn invalid_base_url_is_rejected() {
        let config = HttpGeoDataSourceConfig::default().with_overpass_url("not a url");
        let err = HttpGeoDataSource::with_config(config).expect_err("should fail");
        assert!(matches!(err, SourceBuildError::InvalidUrl { .. }));
    }

    #[rstest]
    fn config_builder_pattern() {
        let config = HttpGeoDataSourceConfig::default()
            .with_timeout(Duration::from_secs(60))
            .with_user_agent("test-agent/1.0");
        assert_eq!(config.timeout, Duration::from_secs(60));
        assert_eq!(config.user_agent, "test-agent/1.0");
        assert_eq!(config.overpass_url, DEFAULT_OVERPASS_URL);
    }
}
