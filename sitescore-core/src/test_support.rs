//! Test doubles for [`GeoDataSource`].

use std::sync::atomic::{AtomicUsize, Ordering};

use geo::{MultiPolygon, Rect, coord};

use crate::{GeoDataError, GeoDataSource, GeoFeature, GeoPoint, TagFilter};

#[derive(Debug, Clone)]
enum StubResponse {
    Features(Vec<GeoFeature>),
    Error(GeoDataError),
    Panic,
}

/// Configurable in-memory [`GeoDataSource`].
///
/// Feature queries return the configured features filtered by the query's
/// [`TagFilter`], ignoring location and radius. Boundary lookups return the
/// configured polygon or [`GeoDataError::BoundaryNotFound`].
#[derive(Debug)]
pub struct StubGeoDataSource {
    response: StubResponse,
    boundary: Option<MultiPolygon<f64>>,
    queries: AtomicUsize,
}

impl StubGeoDataSource {
    fn from_response(response: StubResponse) -> Self {
        Self {
            response,
            boundary: None,
            queries: AtomicUsize::new(0),
        }
    }

    /// Answer every query with `features`.
    pub fn with_features(features: Vec<GeoFeature>) -> Self {
        Self::from_response(StubResponse::Features(features))
    }

    /// Fail every query with `error`.
    pub fn with_error(error: GeoDataError) -> Self {
        Self::from_response(StubResponse::Error(error))
    }

    /// Panic on every query.
    pub fn panicking() -> Self {
        Self::from_response(StubResponse::Panic)
    }

    /// Return `boundary` from boundary lookups.
    #[must_use]
    pub fn and_boundary(mut self, boundary: MultiPolygon<f64>) -> Self {
        self.boundary = Some(boundary);
        self
    }

    /// Number of feature queries received.
    pub fn query_count(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }
}

impl GeoDataSource for StubGeoDataSource {
    fn query_features_near(
        &self,
        _point: GeoPoint,
        _radius_m: f64,
        filter: &TagFilter,
    ) -> Result<Vec<GeoFeature>, GeoDataError> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        match &self.response {
            StubResponse::Features(features) => Ok(features
                .iter()
                .filter(|f| filter.matches(f))
                .cloned()
                .collect()),
            StubResponse::Error(err) => Err(err.clone()),
            StubResponse::Panic => panic!("stub data source panicked"),
        }
    }

    fn resolve_boundary(&self, place: &str) -> Result<MultiPolygon<f64>, GeoDataError> {
        self.boundary
            .clone()
            .ok_or_else(|| GeoDataError::BoundaryNotFound {
                place: place.to_owned(),
            })
    }
}

/// A square boundary of side `size` degrees with its south-west corner at
/// `(lat, lon)`.
pub fn square_boundary(lat: f64, lon: f64, size: f64) -> MultiPolygon<f64> {
    let rect = Rect::new(
        coord! { x: lon, y: lat },
        coord! { x: lon + size, y: lat + size },
    );
    MultiPolygon(vec![rect.to_polygon()])
}

/// A feature carrying a single tag.
pub fn tagged(id: u64, key: &str, value: &str) -> GeoFeature {
    GeoFeature::new(id, None, [(key, value)])
}
