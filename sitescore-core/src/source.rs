//! Access to external geographic data.
//!
//! The [`GeoDataSource`] trait abstracts the two lookups the pipeline needs:
//! tagged features around a point and the boundary polygon of a named place.
//! [`TagFilter`] describes which features a query should return.

use std::collections::BTreeMap;
use std::sync::Arc;

use geo::MultiPolygon;
use thiserror::Error;

use crate::{GeoFeature, GeoPoint};

/// Errors from [`GeoDataSource`] implementations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeoDataError {
    /// The query radius was zero, negative or not finite.
    #[error("query radius must be a positive distance in metres, got {radius_m}")]
    InvalidRadius {
        /// Radius supplied by the caller.
        radius_m: f64,
    },
    /// The request did not complete before the configured timeout.
    #[error("request to {url} timed out after {timeout_secs} seconds")]
    Timeout {
        /// URL of the request that timed out.
        url: String,
        /// Timeout applied to the request.
        timeout_secs: u64,
    },
    /// The service answered with a non-success status.
    #[error("service at {url} returned status {status}: {message}")]
    Http {
        /// URL of the failing request.
        url: String,
        /// HTTP status code.
        status: u16,
        /// Message describing the failure.
        message: String,
    },
    /// The service answered but reported a failure in its payload.
    #[error("service at {url} reported an error: {message}")]
    Service {
        /// URL of the failing request.
        url: String,
        /// Message reported by the service.
        message: String,
    },
    /// The request could not reach the service.
    #[error("network error contacting {url}: {message}")]
    Network {
        /// URL of the failing request.
        url: String,
        /// Message describing the failure.
        message: String,
    },
    /// The response body could not be understood.
    #[error("failed to parse response: {message}")]
    Parse {
        /// Message describing the failure.
        message: String,
    },
    /// No boundary exists for the requested place.
    #[error("no boundary found for {place}")]
    BoundaryNotFound {
        /// Place name that was looked up.
        place: String,
    },
    /// The boundary exists but is not an areal geometry.
    #[error("boundary for {place} is a {kind}, expected a polygon")]
    UnsupportedGeometry {
        /// Place name that was looked up.
        place: String,
        /// Geometry type returned by the service.
        kind: String,
    },
}

/// How a tag key is matched by a [`TagFilter`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagMatch {
    /// Any value of the key matches.
    Any,
    /// Only the listed values match.
    OneOf(Vec<String>),
}

/// Set of tag constraints, joined by "or": a feature matches when any entry
/// matches.
///
/// Keys are kept sorted so generated queries are stable.
///
/// # Examples
/// ```
/// use sitescore_core::{GeoFeature, TagFilter};
///
/// let filter = TagFilter::new()
///     .with_any("shop")
///     .with_values("amenity", ["bank"]);
///
/// assert!(filter.matches(&GeoFeature::new(1, None, [("shop", "bakery")])));
/// assert!(!filter.matches(&GeoFeature::new(2, None, [("amenity", "cafe")])));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TagFilter {
    entries: BTreeMap<String, TagMatch>,
}

impl TagFilter {
    /// An empty filter that matches nothing.
    pub fn new() -> Self {
        Self::default()
    }

    /// The retail filter used by the feature extractor.
    pub fn retail() -> Self {
        Self::new()
            .with_any("shop")
            .with_values(
                "amenity",
                ["restaurant", "fast_food", "bank", "pharmacy", "parking"],
            )
            .with_any("public_transport")
            .with_values("highway", ["bus_stop", "pedestrian", "footway", "cycleway"])
            .with_any("tourism")
            .with_any("leisure")
            .with_any("office")
            .with_values("railway", ["station"])
            .with_values("building", ["residential", "office"])
            .with_values("landuse", ["residential"])
    }

    /// Accept any value for `key`.
    #[must_use]
    pub fn with_any(mut self, key: impl Into<String>) -> Self {
        self.entries.insert(key.into(), TagMatch::Any);
        self
    }

    /// Accept only `values` for `key`.
    #[must_use]
    pub fn with_values<I, V>(mut self, key: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<String>,
    {
        let values = values.into_iter().map(Into::into).collect();
        self.entries.insert(key.into(), TagMatch::OneOf(values));
        self
    }

    /// Iterate over `(key, match)` entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &TagMatch)> {
        self.entries.iter().map(|(key, m)| (key.as_str(), m))
    }

    /// Whether the filter has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether `feature` satisfies at least one entry.
    pub fn matches(&self, feature: &GeoFeature) -> bool {
        self.entries.iter().any(|(key, m)| match (m, feature.tag(key)) {
            (_, None) => false,
            (TagMatch::Any, Some(_)) => true,
            (TagMatch::OneOf(values), Some(value)) => values.iter().any(|v| v == value),
        })
    }
}

/// Source of tagged features and place boundaries.
///
/// Implementations must be shareable across worker threads; the extraction
/// orchestrator calls [`GeoDataSource::query_features_near`] concurrently.
///
/// # Examples
/// ```
/// use geo::MultiPolygon;
/// use sitescore_core::{GeoDataError, GeoDataSource, GeoFeature, GeoPoint, TagFilter};
///
/// struct Empty;
///
/// impl GeoDataSource for Empty {
///     fn query_features_near(
///         &self,
///         _point: GeoPoint,
///         _radius_m: f64,
///         _filter: &TagFilter,
///     ) -> Result<Vec<GeoFeature>, GeoDataError> {
///         Ok(Vec::new())
///     }
///
///     fn resolve_boundary(&self, place: &str) -> Result<MultiPolygon<f64>, GeoDataError> {
///         Err(GeoDataError::BoundaryNotFound { place: place.to_owned() })
///     }
/// }
///
/// let point = GeoPoint::new(48.85, 2.35).expect("valid point");
/// assert!(Empty.query_features_near(point, 500.0, &TagFilter::retail())?.is_empty());
/// # Ok::<(), GeoDataError>(())
/// ```
pub trait GeoDataSource: Send + Sync {
    /// Return features within `radius_m` metres of `point` that match
    /// `filter`.
    fn query_features_near(
        &self,
        point: GeoPoint,
        radius_m: f64,
        filter: &TagFilter,
    ) -> Result<Vec<GeoFeature>, GeoDataError>;

    /// Return the boundary polygon for `place`.
    fn resolve_boundary(&self, place: &str) -> Result<MultiPolygon<f64>, GeoDataError>;
}

impl<T: GeoDataSource + ?Sized> GeoDataSource for &T {
    fn query_features_near(
        &self,
        point: GeoPoint,
        radius_m: f64,
        filter: &TagFilter,
    ) -> Result<Vec<GeoFeature>, GeoDataError> {
        (**self).query_features_near(point, radius_m, filter)
    }

    fn resolve_boundary(&self, place: &str) -> Result<MultiPolygon<f64>, GeoDataError> {
        (**self).resolve_boundary(place)
    }
}

impl<T: GeoDataSource + ?Sized> GeoDataSource for Arc<T> {
    fn query_features_near(
        &self,
        point: GeoPoint,
        radius_m: f64,
        filter: &TagFilter,
    ) -> Result<Vec<GeoFeature>, GeoDataError> {
        (**self).query_features_near(point, radius_m, filter)
    }

    fn resolve_boundary(&self, place: &str) -> Result<MultiPolygon<f64>, GeoDataError> {
        (**self).resolve_boundary(place)
    }
}
