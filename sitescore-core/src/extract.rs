//! Turn raw features around a point into a [`FeatureVector`].
//!
//! Extraction never fails outright. When the source errors or returns nothing
//! the result is [`Extraction::Degraded`], carrying an all-zero vector and the
//! reason, so batch callers can keep going and still see what went wrong.

use std::fmt;

use crate::{FeatureVector, GeoDataError, GeoDataSource, GeoFeature, GeoPoint, TagFilter};

/// Why an extraction produced a zero vector.
#[derive(Debug, Clone, PartialEq)]
pub enum DegradedReason {
    /// The data source returned an error.
    Source(GeoDataError),
    /// The data source returned no features.
    NoFeatures,
    /// The worker running the extraction panicked.
    WorkerPanic(String),
}

impl fmt::Display for DegradedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Source(err) => write!(f, "data source error: {err}"),
            Self::NoFeatures => f.write_str("no features returned"),
            Self::WorkerPanic(message) => write!(f, "worker panicked: {message}"),
        }
    }
}

/// Outcome of extracting features for one point.
#[derive(Debug, Clone, PartialEq)]
pub enum Extraction {
    /// Features were counted from a non-empty source response.
    Success(FeatureVector),
    /// A zero vector stands in for the point's features.
    Degraded {
        /// Always the all-zero vector.
        features: FeatureVector,
        /// What went wrong.
        reason: DegradedReason,
    },
}

impl Extraction {
    /// Build a degraded outcome with a zero vector.
    pub fn degraded(reason: DegradedReason) -> Self {
        Self::Degraded {
            features: FeatureVector::default(),
            reason,
        }
    }

    /// The feature vector, zero when degraded.
    pub const fn features(&self) -> &FeatureVector {
        match self {
            Self::Success(features) | Self::Degraded { features, .. } => features,
        }
    }

    /// Consume the outcome and return its vector.
    pub fn into_features(self) -> FeatureVector {
        match self {
            Self::Success(features) | Self::Degraded { features, .. } => features,
        }
    }

    /// Whether the outcome is degraded.
    pub const fn is_degraded(&self) -> bool {
        matches!(self, Self::Degraded { .. })
    }

    /// The degradation reason, if any.
    pub const fn reason(&self) -> Option<&DegradedReason> {
        match self {
            Self::Success(_) => None,
            Self::Degraded { reason, .. } => Some(reason),
        }
    }
}

/// Count features per category.
///
/// `total_pois` is the raw number of features, so a feature that matches no
/// category still counts toward it.
///
/// # Examples
/// ```
/// use sitescore_core::{GeoFeature, extract::reduce_features};
///
/// let features = [
///     GeoFeature::new(1, None, [("shop", "shoes")]),
///     GeoFeature::new(2, None, [("shop", "bakery")]),
///     GeoFeature::new(3, None, [("amenity", "fast_food")]),
/// ];
/// let vector = reduce_features(&features);
/// assert_eq!(vector.shops_total, 2);
/// assert_eq!(vector.shops_shoes, 1);
/// assert_eq!(vector.restaurants, 1);
/// assert_eq!(vector.total_pois, 3);
/// ```
pub fn reduce_features(features: &[GeoFeature]) -> FeatureVector {
    fn bump(counter: &mut u32, hit: bool) {
        if hit {
            *counter = counter.saturating_add(1);
        }
    }

    let mut v = FeatureVector::default();
    for f in features {
        bump(&mut v.shops_total, f.has_tag("shop"));
        bump(&mut v.shops_shoes, f.tag_is("shop", "shoes"));
        bump(
            &mut v.restaurants,
            f.tag_in("amenity", &["restaurant", "fast_food"]),
        );
        bump(&mut v.banks, f.tag_is("amenity", "bank"));
        bump(&mut v.pharmacy, f.tag_is("amenity", "pharmacy"));
        bump(&mut v.parking, f.tag_is("amenity", "parking"));
        bump(&mut v.metro_station, f.tag_is("railway", "station"));
        bump(&mut v.bus_stop, f.tag_is("highway", "bus_stop"));
        bump(&mut v.hotels, f.tag_is("tourism", "hotel"));
        bump(&mut v.attractions, f.tag_is("tourism", "attraction"));
        bump(&mut v.museums, f.tag_is("tourism", "museum"));
        bump(&mut v.parks, f.tag_is("leisure", "park"));
        bump(&mut v.business_centers, f.has_tag("office"));
        bump(
            &mut v.residential_buildings,
            f.tag_is("building", "residential"),
        );
        bump(
            &mut v.residential_buildings,
            f.tag_is("landuse", "residential"),
        );
        bump(
            &mut v.walkability_score,
            f.tag_in("highway", &["pedestrian", "footway", "cycleway"]),
        );
    }
    v.total_pois = u32::try_from(features.len()).unwrap_or(u32::MAX);
    v
}

/// Queries a [`GeoDataSource`] and reduces the response.
///
/// # Examples
/// ```
/// use geo::MultiPolygon;
/// use sitescore_core::{
///     FeatureExtractor, GeoDataError, GeoDataSource, GeoFeature, GeoPoint, TagFilter,
/// };
///
/// struct OneShoeShop;
///
/// impl GeoDataSource for OneShoeShop {
///     fn query_features_near(
///         &self,
///         _point: GeoPoint,
///         _radius_m: f64,
///         _filter: &TagFilter,
///     ) -> Result<Vec<GeoFeature>, GeoDataError> {
///         Ok(vec![GeoFeature::new(1, None, [("shop", "shoes")])])
///     }
///
///     fn resolve_boundary(&self, place: &str) -> Result<MultiPolygon<f64>, GeoDataError> {
///         Err(GeoDataError::BoundaryNotFound { place: place.to_owned() })
///     }
/// }
///
/// let extractor = FeatureExtractor::new(OneShoeShop);
/// let outcome = extractor.extract(GeoPoint::new(48.85, 2.35)?, 500.0);
/// assert_eq!(outcome.features().shops_shoes, 1);
/// assert!(!outcome.is_degraded());
/// # Ok::<(), sitescore_core::GeoPointError>(())
/// ```
#[derive(Debug, Clone)]
pub struct FeatureExtractor<S> {
    source: S,
    filter: TagFilter,
}

impl<S: GeoDataSource> FeatureExtractor<S> {
    /// Use the retail tag filter.
    pub fn new(source: S) -> Self {
        Self::with_filter(source, TagFilter::retail())
    }

    /// Use a custom tag filter.
    pub const fn with_filter(source: S, filter: TagFilter) -> Self {
        Self { source, filter }
    }

    /// Borrow the underlying source.
    pub const fn source(&self) -> &S {
        &self.source
    }

    /// The filter sent with every query.
    pub const fn filter(&self) -> &TagFilter {
        &self.filter
    }

    /// Extract the feature vector for `point` within `radius_m` metres.
    pub fn extract(&self, point: GeoPoint, radius_m: f64) -> Extraction {
        if !(radius_m.is_finite() && radius_m > 0.0) {
            return Extraction::degraded(DegradedReason::Source(GeoDataError::InvalidRadius {
                radius_m,
            }));
        }
        match self
            .source
            .query_features_near(point, radius_m, &self.filter)
        {
            Ok(features) if features.is_empty() => {
                log::debug!(
                    "no features near ({}, {})",
                    point.latitude(),
                    point.longitude()
                );
                Extraction::degraded(DegradedReason::NoFeatures)
            }
            Ok(features) => Extraction::Success(reduce_features(&features)),
            Err(err) => {
                log::warn!(
                    "feature query failed near ({}, {}): {err}",
                    point.latitude(),
                    point.longitude()
                );
                Extraction::degraded(DegradedReason::Source(err))
            }
        }
    }
}
