//! Regular candidate grids over city boundaries.
//!
//! The generator widens the boundary's bounding box by a buffer, walks a
//! lattice of latitude/longitude steps sized from the requested spacing in
//! metres, and keeps only lattice points strictly inside the boundary.

use geo::{BoundingRect, Contains, Coord, MultiPolygon, Rect};
use thiserror::Error;

use crate::{GeoPoint, GeoPointError};

/// Metres spanned by one degree of latitude.
pub const METRES_PER_DEGREE: f64 = 111_000.0;

/// Default widening applied to the boundary's bounding box.
pub const DEFAULT_BUFFER_M: f64 = 2_000.0;

/// Errors raised while preparing or generating a grid.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GridError {
    /// Spacing was zero, negative or not finite.
    #[error("grid spacing must be a positive distance in metres, got {spacing_m}")]
    InvalidSpacing {
        /// Spacing supplied by the caller.
        spacing_m: f64,
    },
    /// Buffer was negative or not finite.
    #[error("grid buffer must be a non-negative distance in metres, got {buffer_m}")]
    InvalidBuffer {
        /// Buffer supplied by the caller.
        buffer_m: f64,
    },
    /// The boundary polygon has no extent.
    #[error("boundary for {city} is empty")]
    EmptyBoundary {
        /// City whose boundary was empty.
        city: String,
    },
    /// The boundary is too close to a pole for a longitude step.
    #[error("boundary for {city} is too close to a pole to build a grid")]
    DegenerateLongitude {
        /// City whose boundary was degenerate.
        city: String,
    },
    /// A lattice point fell outside valid coordinates.
    #[error("grid point outside valid coordinates: {0}")]
    Coordinates(#[from] GeoPointError),
}

/// A city's boundary polygon and the grid spacing used to sample it.
#[derive(Debug, Clone, PartialEq)]
pub struct CityBoundary {
    name: String,
    polygon: MultiPolygon<f64>,
    spacing_m: f64,
    bounds: Rect<f64>,
}

impl CityBoundary {
    /// Validate and construct a boundary.
    ///
    /// # Examples
    /// ```
    /// use geo::{MultiPolygon, Rect, coord};
    /// use sitescore_core::CityBoundary;
    ///
    /// let square = Rect::new(coord! { x: 2.3, y: 48.8 }, coord! { x: 2.4, y: 48.9 }).to_polygon();
    /// let boundary = CityBoundary::new("Paris", MultiPolygon(vec![square]), 250.0)?;
    /// assert_eq!(boundary.name(), "Paris");
    /// # Ok::<(), sitescore_core::GridError>(())
    /// ```
    pub fn new(
        name: impl Into<String>,
        polygon: MultiPolygon<f64>,
        spacing_m: f64,
    ) -> Result<Self, GridError> {
        let name = name.into();
        if !(spacing_m.is_finite() && spacing_m > 0.0) {
            return Err(GridError::InvalidSpacing { spacing_m });
        }
        let Some(bounds) = polygon.bounding_rect() else {
            return Err(GridError::EmptyBoundary { city: name });
        };
        Ok(Self {
            name,
            polygon,
            spacing_m,
            bounds,
        })
    }

    /// City name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Boundary polygon.
    pub const fn polygon(&self) -> &MultiPolygon<f64> {
        &self.polygon
    }

    /// Grid spacing in metres.
    pub const fn spacing_m(&self) -> f64 {
        self.spacing_m
    }

    /// Bounding box of the polygon.
    pub const fn bounds(&self) -> Rect<f64> {
        self.bounds
    }
}

/// A grid sample location.
#[derive(Debug, Clone, PartialEq)]
pub struct GridPoint {
    /// Deterministic identifier derived from city and location.
    pub point_id: String,
    /// City the point was sampled for.
    pub city: String,
    /// Sampled coordinates.
    pub location: GeoPoint,
}

impl GridPoint {
    /// Build a grid point, deriving its identifier from city and location.
    pub fn new(city: impl Into<String>, location: GeoPoint) -> Self {
        let city = city.into();
        Self {
            point_id: point_id(&city, location),
            city,
            location,
        }
    }
}

/// Deterministic identifier `"{city}_{lat:.6}_{lon:.6}"`.
///
/// # Examples
/// ```
/// use sitescore_core::{GeoPoint, grid::point_id};
///
/// let location = GeoPoint::new(48.85, 2.35)?;
/// assert_eq!(point_id("Paris", location), "Paris_48.850000_2.350000");
/// # Ok::<(), sitescore_core::GeoPointError>(())
/// ```
pub fn point_id(city: &str, location: GeoPoint) -> String {
    format!(
        "{city}_{:.6}_{:.6}",
        location.latitude(),
        location.longitude()
    )
}

/// Lattice parameters derived from a boundary.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Lattice {
    /// Bounding box widened by the buffer.
    pub expanded: Rect<f64>,
    /// Latitude step in degrees.
    pub lat_step: f64,
    /// Longitude step in degrees.
    pub lon_step: f64,
    /// Exclusive latitude stop, one metre beyond the expanded box.
    pub lat_stop: f64,
    /// Exclusive longitude stop, one metre beyond the expanded box.
    pub lon_stop: f64,
}

impl Lattice {
    fn steps(start: f64, stop: f64, step: f64) -> impl Iterator<Item = f64> {
        let span = ((stop - start) / step).ceil();
        let count = if span.is_finite() && span > 0.0 {
            span as u64
        } else {
            0
        };
        // Index-based so rounding error does not accumulate along the axis.
        (0..count).map(move |i| start + (i as f64) * step)
    }

    /// Latitudes visited by the lattice, south to north.
    pub fn latitudes(&self) -> impl Iterator<Item = f64> {
        Self::steps(self.expanded.min().y, self.lat_stop, self.lat_step)
    }

    /// Longitudes visited by the lattice, west to east.
    pub fn longitudes(&self) -> impl Iterator<Item = f64> {
        Self::steps(self.expanded.min().x, self.lon_stop, self.lon_step)
    }
}

/// Generates candidate grids for city boundaries.
///
/// # Examples
/// ```
/// use geo::{MultiPolygon, Rect, coord};
/// use sitescore_core::{CityBoundary, GridGenerator};
///
/// let square = Rect::new(coord! { x: 2.30, y: 48.80 }, coord! { x: 2.32, y: 48.82 }).to_polygon();
/// let boundary = CityBoundary::new("Paris", MultiPolygon(vec![square]), 500.0)?;
/// let points = GridGenerator::default().generate(&boundary)?;
/// assert!(!points.is_empty());
/// assert!(points.iter().all(|p| p.point_id.starts_with("Paris_")));
/// # Ok::<(), sitescore_core::GridError>(())
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridGenerator {
    buffer_m: f64,
}

impl Default for GridGenerator {
    fn default() -> Self {
        Self {
            buffer_m: DEFAULT_BUFFER_M,
        }
    }
}

impl GridGenerator {
    /// Use a custom buffer around the bounding box.
    pub fn with_buffer(buffer_m: f64) -> Result<Self, GridError> {
        if !(buffer_m.is_finite() && buffer_m >= 0.0) {
            return Err(GridError::InvalidBuffer { buffer_m });
        }
        Ok(Self { buffer_m })
    }

    /// Buffer in metres.
    pub const fn buffer_m(&self) -> f64 {
        self.buffer_m
    }

    /// Compute the lattice for `boundary`.
    pub fn lattice(&self, boundary: &CityBoundary) -> Result<Lattice, GridError> {
        let bounds = boundary.bounds();
        let mean_lat = (bounds.min().y + bounds.max().y) / 2.0;
        let lat_deg_per_m = 1.0 / METRES_PER_DEGREE;
        let lon_deg_per_m = 1.0 / (METRES_PER_DEGREE * mean_lat.to_radians().cos());
        if !(lon_deg_per_m.is_finite() && lon_deg_per_m > 0.0) {
            return Err(GridError::DegenerateLongitude {
                city: boundary.name().to_owned(),
            });
        }

        let lat_buffer = self.buffer_m * lat_deg_per_m;
        let lon_buffer = self.buffer_m * lon_deg_per_m;
        let expanded = Rect::new(
            Coord {
                x: bounds.min().x - lon_buffer,
                y: bounds.min().y - lat_buffer,
            },
            Coord {
                x: bounds.max().x + lon_buffer,
                y: bounds.max().y + lat_buffer,
            },
        );
        Ok(Lattice {
            expanded,
            lat_step: boundary.spacing_m() * lat_deg_per_m,
            lon_step: boundary.spacing_m() * lon_deg_per_m,
            lat_stop: expanded.max().y + lat_deg_per_m,
            lon_stop: expanded.max().x + lon_deg_per_m,
        })
    }

    /// Generate the grid points strictly inside `boundary`.
    ///
    /// Points are ordered by latitude, then longitude.
    pub fn generate(&self, boundary: &CityBoundary) -> Result<Vec<GridPoint>, GridError> {
        let lattice = self.lattice(boundary)?;
        let mut points = Vec::new();
        for lat in lattice.latitudes() {
            for lon in lattice.longitudes() {
                let candidate = Coord { x: lon, y: lat };
                if boundary.polygon().contains(&candidate) {
                    let location = GeoPoint::new(lat, lon)?;
                    points.push(GridPoint::new(boundary.name(), location));
                }
            }
        }
        log::debug!(
            "generated {} grid points for {} at {} m spacing",
            points.len(),
            boundary.name(),
            boundary.spacing_m()
        );
        Ok(points)
    }
}
