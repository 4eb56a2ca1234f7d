//! Map coordinates to the city whose normalization baseline applies.

use crate::GeoPoint;

/// Inclusive latitude/longitude box for one city.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CityBounds {
    /// City name reported on a match.
    pub name: String,
    /// Southern edge, inclusive.
    pub min_lat: f64,
    /// Northern edge, inclusive.
    pub max_lat: f64,
    /// Western edge, inclusive.
    pub min_lon: f64,
    /// Eastern edge, inclusive.
    pub max_lon: f64,
}

impl CityBounds {
    /// Construct a box from its name and corner coordinates.
    pub fn new(
        name: impl Into<String>,
        (min_lat, max_lat): (f64, f64),
        (min_lon, max_lon): (f64, f64),
    ) -> Self {
        Self {
            name: name.into(),
            min_lat,
            max_lat,
            min_lon,
            max_lon,
        }
    }

    /// Whether `point` lies inside the box, edges included.
    pub fn contains(&self, point: GeoPoint) -> bool {
        (self.min_lat..=self.max_lat).contains(&point.latitude())
            && (self.min_lon..=self.max_lon).contains(&point.longitude())
    }
}

/// Ordered table of city boxes with a fallback city.
///
/// The default table covers the French cities the extraction pipeline ships
/// with and falls back to Paris.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CityTable {
    cities: Vec<CityBounds>,
    default_city: String,
}

impl Default for CityTable {
    fn default() -> Self {
        Self::new(
            vec![
                CityBounds::new("Paris", (48.7, 49.0), (2.1, 2.5)),
                CityBounds::new("Lille", (50.5, 50.8), (2.9, 3.2)),
                CityBounds::new("Bordeaux", (44.7, 45.0), (-0.7, -0.4)),
                CityBounds::new("Strasbourg", (48.4, 48.7), (7.6, 7.9)),
                CityBounds::new("Toulouse", (43.4, 43.8), (1.3, 1.6)),
            ],
            "Paris",
        )
    }
}

impl CityTable {
    /// Build a table; earlier entries win on overlap.
    pub fn new(cities: Vec<CityBounds>, default_city: impl Into<String>) -> Self {
        Self {
            cities,
            default_city: default_city.into(),
        }
    }

    /// Configured boxes in match order.
    pub fn cities(&self) -> &[CityBounds] {
        &self.cities
    }

    /// Fallback city for points outside every box.
    pub fn default_city(&self) -> &str {
        &self.default_city
    }
}

/// Resolves points to city names.
///
/// # Examples
/// ```
/// use sitescore_core::{CityResolver, GeoPoint};
///
/// let resolver = CityResolver::default();
/// assert_eq!(resolver.resolve(GeoPoint::new(50.63, 3.06)?), "Lille");
/// // Outside every box: the fallback city.
/// assert_eq!(resolver.resolve(GeoPoint::new(0.0, 0.0)?), "Paris");
/// # Ok::<(), sitescore_core::GeoPointError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CityResolver {
    table: CityTable,
}

impl CityResolver {
    /// Resolve using `table`.
    pub const fn new(table: CityTable) -> Self {
        Self { table }
    }

    /// The table in use.
    pub const fn table(&self) -> &CityTable {
        &self.table
    }

    /// Name of the first city whose box contains `point`, or the default.
    pub fn resolve(&self, point: GeoPoint) -> &str {
        self.table
            .cities
            .iter()
            .find(|bounds| bounds.contains(point))
            .map_or(self.table.default_city(), |bounds| bounds.name.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn at(lat: f64, lon: f64) -> GeoPoint {
        GeoPoint::new(lat, lon).expect("valid point")
    }

    #[rstest]
    #[case(48.8566, 2.3522, "Paris")]
    #[case(44.84, -0.58, "Bordeaux")]
    #[case(48.58, 7.75, "Strasbourg")]
    #[case(43.6, 1.44, "Toulouse")]
    #[case(45.76, 4.83, "Paris")]
    fn resolves_default_table(#[case] lat: f64, #[case] lon: f64, #[case] city: &str) {
        assert_eq!(CityResolver::default().resolve(at(lat, lon)), city);
    }

    #[rstest]
    #[case(50.5, 2.9)]
    #[case(50.8, 3.2)]
    fn box_edges_are_inclusive(#[case] lat: f64, #[case] lon: f64) {
        assert_eq!(CityResolver::default().resolve(at(lat, lon)), "Lille");
    }

    #[rstest]
    fn first_match_wins_on_overlap() {
        let table = CityTable::new(
            vec![
                CityBounds::new("A", (0.0, 2.0), (0.0, 2.0)),
                CityBounds::new("B", (1.0, 3.0), (1.0, 3.0)),
            ],
            "Z",
        );
        let resolver = CityResolver::new(table);
        assert_eq!(resolver.resolve(at(1.5, 1.5)), "A");
        assert_eq!(resolver.resolve(at(2.5, 2.5)), "B");
        assert_eq!(resolver.resolve(at(-1.0, -1.0)), "Z");
    }
}
