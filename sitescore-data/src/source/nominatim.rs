//! Nominatim search response types and boundary extraction.
//!
//! Boundary lookups use `search?format=jsonv2&polygon_geojson=1&limit=1`; the
//! first place's `geojson` member carries the outline.
//! See: <https://nominatim.org/release-docs/latest/api/Search/>

use geo::{Geometry, MultiPolygon};
use serde::Deserialize;
use sitescore_core::GeoDataError;

/// One search result.
#[derive(Debug, Deserialize)]
pub struct Place {
    /// Human-readable name of the match.
    pub display_name: Option<String>,
    /// Outline requested through `polygon_geojson=1`.
    pub geojson: Option<geojson::Geometry>,
}

/// Extract a polygonal boundary for `query` from search results.
pub fn boundary_from_places(
    query: &str,
    places: Vec<Place>,
) -> Result<MultiPolygon<f64>, GeoDataError> {
    let not_found = || GeoDataError::BoundaryNotFound {
        place: query.to_owned(),
    };
    let place = places.into_iter().next().ok_or_else(not_found)?;
    let outline = place.geojson.ok_or_else(not_found)?;
    let geometry =
        Geometry::<f64>::try_from(outline).map_err(|err| GeoDataError::Parse {
            message: format!("invalid boundary geometry for {query}: {err}"),
        })?;
    match geometry {
        Geometry::Polygon(polygon) => Ok(MultiPolygon(vec![polygon])),
        Geometry::MultiPolygon(polygons) => Ok(polygons),
        other => Err(GeoDataError::UnsupportedGeometry {
            place: query.to_owned(),
            kind: geometry_kind(&other).to_owned(),
        }),
    }
}

const fn geometry_kind(geometry: &Geometry<f64>) -> &'static str {
    match geometry {
        Geometry::Point(_) => "Point",
        Geometry::Line(_) => "Line",
        Geometry::LineString(_) => "LineString",
        Geometry::Polygon(_) => "Polygon",
        Geometry::MultiPoint(_) => "MultiPoint",
        Geometry::MultiLineString(_) => "MultiLineString",
        Geometry::MultiPolygon(_) => "MultiPolygon",
        Geometry::GeometryCollection(_) => "GeometryCollection",
        Geometry::Rect(_) => "Rect",
        Geometry::Triangle(_) => "Triangle",
    }
}
