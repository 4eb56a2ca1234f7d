//! Validated scoring requests.

use thiserror::Error;

use crate::{GeoPoint, GeoPointError};

/// Radius used when a request does not specify one.
pub const DEFAULT_RADIUS_M: u32 = 500;
/// Smallest accepted radius.
pub const MIN_RADIUS_M: u32 = 100;
/// Largest accepted radius.
pub const MAX_RADIUS_M: u32 = 2_000;

/// Errors returned by [`ScoreRequest::new`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RequestError {
    /// Latitude or longitude was invalid.
    #[error(transparent)]
    Coordinates(#[from] GeoPointError),
    /// Radius fell outside the accepted range.
    #[error("radius {radius_m} m must be between 100 and 2000 m")]
    RadiusOutOfRange {
        /// Radius supplied by the caller.
        radius_m: u32,
    },
}

/// A request to score one location.
///
/// # Examples
/// ```
/// use sitescore_core::ScoreRequest;
///
/// let request = ScoreRequest::new(48.8566, 2.3522, None)?;
/// assert_eq!(request.radius_m(), 500);
/// assert!(ScoreRequest::new(48.8566, 2.3522, Some(50)).is_err());
/// # Ok::<(), sitescore_core::RequestError>(())
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreRequest {
    location: GeoPoint,
    radius_m: u32,
}

impl ScoreRequest {
    /// Validate coordinates and radius.
    pub fn new(latitude: f64, longitude: f64, radius_m: Option<u32>) -> Result<Self, RequestError> {
        let location = GeoPoint::new(latitude, longitude)?;
        Self::at(location, radius_m)
    }

    /// Validate the radius for an already valid location.
    pub fn at(location: GeoPoint, radius_m: Option<u32>) -> Result<Self, RequestError> {
        let radius_m = radius_m.unwrap_or(DEFAULT_RADIUS_M);
        if !(MIN_RADIUS_M..=MAX_RADIUS_M).contains(&radius_m) {
            return Err(RequestError::RadiusOutOfRange { radius_m });
        }
        Ok(Self { location, radius_m })
    }

    /// Location to score.
    pub const fn location(&self) -> GeoPoint {
        self.location
    }

    /// Query radius in metres.
    pub const fn radius_m(&self) -> u32 {
        self.radius_m
    }
}
