use std::collections::HashMap;

use geo::Coord;

/// Free-form OpenStreetMap-style key/value tags.
pub type Tags = HashMap<String, String>;

/// A tagged feature returned by a geographic data source.
///
/// Coordinates are WGS84 with `x = longitude` and `y = latitude`. Overpass
/// reports ways and relations by their centre; features without any resolvable
/// position carry `None`.
///
/// # Examples
/// ```
/// use geo::Coord;
/// use sitescore_core::GeoFeature;
///
/// let shop = GeoFeature::new(1, Some(Coord { x: 2.35, y: 48.85 }), [("shop", "shoes")]);
///
/// assert_eq!(shop.tag("shop"), Some("shoes"));
/// assert!(shop.has_tag("shop"));
/// assert!(!shop.has_tag("amenity"));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct GeoFeature {
    /// OpenStreetMap element id.
    pub id: u64,
    /// Position, or `None` when the source gave no centre.
    pub location: Option<Coord<f64>>,
    /// OpenStreetMap tags.
    pub tags: Tags,
}

impl GeoFeature {
    /// Construct a feature from any iterable of string-like pairs.
    pub fn new<I, K, V>(id: u64, location: Option<Coord<f64>>, tags: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let tags = tags
            .into_iter()
            .map(|(key, value)| (key.into(), value.into()))
            .collect();
        Self { id, location, tags }
    }

    /// Construct a feature without tags.
    pub fn with_empty_tags(id: u64, location: Option<Coord<f64>>) -> Self {
        Self {
            id,
            location,
            tags: Tags::new(),
        }
    }

    /// Return the value for `key`, if present.
    pub fn tag(&self, key: &str) -> Option<&str> {
        self.tags.get(key).map(String::as_str)
    }

    /// Whether the feature carries `key` with any value.
    pub fn has_tag(&self, key: &str) -> bool {
        self.tags.contains_key(key)
    }

    /// Whether the feature carries `key` with exactly `value`.
    pub fn tag_is(&self, key: &str, value: &str) -> bool {
        self.tag(key) == Some(value)
    }

    /// Whether the feature carries `key` with one of `values`.
    pub fn tag_in(&self, key: &str, values: &[&str]) -> bool {
        self.tag(key).is_some_and(|v| values.contains(&v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("restaurant", true)]
    #[case("fast_food", true)]
    #[case("bank", false)]
    fn tag_in_matches_listed_values(#[case] value: &str, #[case] expected: bool) {
        let feature = GeoFeature::new(7, None, [("amenity", value)]);
        assert_eq!(feature.tag_in("amenity", &["restaurant", "fast_food"]), expected);
    }

    #[rstest]
    fn missing_tag_never_matches() {
        let feature = GeoFeature::with_empty_tags(1, None);
        assert!(!feature.tag_is("shop", "shoes"));
        assert!(!feature.tag_in("shop", &["shoes"]));
    }
}
