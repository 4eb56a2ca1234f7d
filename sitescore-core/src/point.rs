//! Validated WGS84 coordinates.

use geo::{Coord, Point};
use thiserror::Error;

/// Errors returned by [`GeoPoint::new`].
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum GeoPointError {
    /// Latitude was not a finite value in `[-90, 90]`.
    #[error("latitude {0} must be a finite value between -90 and 90")]
    LatitudeOutOfRange(f64),
    /// Longitude was not a finite value in `[-180, 180]`.
    #[error("longitude {0} must be a finite value between -180 and 180")]
    LongitudeOutOfRange(f64),
}

/// A location on the globe in decimal degrees.
///
/// The type is immutable once built; [`GeoPoint::new`] is the only way to
/// obtain one, so every instance holds in-range, finite coordinates.
///
/// # Examples
/// ```
/// use sitescore_core::GeoPoint;
///
/// let point = GeoPoint::new(48.8566, 2.3522)?;
/// assert_eq!(point.latitude(), 48.8566);
/// assert_eq!(point.coord().x, 2.3522);
/// # Ok::<(), sitescore_core::GeoPointError>(())
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(try_from = "RawGeoPoint", into = "RawGeoPoint")
)]
pub struct GeoPoint {
    latitude: f64,
    longitude: f64,
}

impl GeoPoint {
    /// Validate and construct a point.
    ///
    /// NaN and infinities fail the range checks.
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, GeoPointError> {
        if !(-90.0..=90.0).contains(&latitude) {
            return Err(GeoPointError::LatitudeOutOfRange(latitude));
        }
        if !(-180.0..=180.0).contains(&longitude) {
            return Err(GeoPointError::LongitudeOutOfRange(longitude));
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }

    /// Latitude in degrees.
    #[must_use]
    pub const fn latitude(self) -> f64 {
        self.latitude
    }

    /// Longitude in degrees.
    #[must_use]
    pub const fn longitude(self) -> f64 {
        self.longitude
    }

    /// The point as a `geo` coordinate (`x = longitude`, `y = latitude`).
    #[must_use]
    pub const fn coord(self) -> Coord<f64> {
        Coord {
            x: self.longitude,
            y: self.latitude,
        }
    }

    /// The point as a `geo` point.
    #[must_use]
    pub fn point(self) -> Point<f64> {
        Point::from(self.coord())
    }
}

impl TryFrom<Coord<f64>> for GeoPoint {
    type Error = GeoPointError;

    fn try_from(coord: Coord<f64>) -> Result<Self, Self::Error> {
        Self::new(coord.y, coord.x)
    }
}

#[cfg(feature = "serde")]
#[derive(serde::Serialize, serde::Deserialize)]
struct RawGeoPoint {
    latitude: f64,
    longitude: f64,
}

#[cfg(feature = "serde")]
impl TryFrom<RawGeoPoint> for GeoPoint {
    type Error = GeoPointError;

    fn try_from(raw: RawGeoPoint) -> Result<Self, Self::Error> {
        Self::new(raw.latitude, raw.longitude)
    }
}

#[cfg(feature = "serde")]
impl From<GeoPoint> for RawGeoPoint {
    fn from(point: GeoPoint) -> Self {
        Self {
            latitude: point.latitude,
            longitude: point.longitude,
        }
    }
}
