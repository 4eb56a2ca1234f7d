//! Overpass API query construction and response types.
//!
//! Queries select nodes, ways and relations (`nwr`) around a point for every
//! entry of a [`TagFilter`] and ask for centres so ways and relations carry a
//! position. See: <https://wiki.openstreetmap.org/wiki/Overpass_API/Overpass_QL>

use std::collections::HashMap;

use geo::Coord;
use serde::Deserialize;
use sitescore_core::{GeoFeature, GeoPoint, TagFilter, TagMatch};

/// Build an Overpass QL query for features around `point`.
///
/// ```text
/// [out:json][timeout:30];
/// (
///   nwr["shop"](around:500,48.8566,2.3522);
///   nwr["amenity"~"^(bank|pharmacy)$"](around:500,48.8566,2.3522);
/// );
/// out center tags;
/// ```
pub fn build_query(point: GeoPoint, radius_m: f64, filter: &TagFilter, timeout_secs: u64) -> String {
    let around = format!(
        "(around:{radius_m},{},{})",
        point.latitude(),
        point.longitude()
    );
    let statements: String = filter
        .iter()
        .map(|(key, matcher)| {
            let escaped = escape(key);
            let selector = match matcher {
                TagMatch::Any => format!("[\"{escaped}\"]"),
                TagMatch::OneOf(values) => {
                    let alternatives = values
                        .iter()
                        .map(|v| escape(v))
                        .collect::<Vec<_>>()
                        .join("|");
                    format!("[\"{escaped}\"~\"^({alternatives})$\"]")
                }
            };
            format!("  nwr{selector}{around};\n")
        })
        .collect();
    format!("[out:json][timeout:{timeout_secs}];\n(\n{statements});\nout center tags;")
}

fn escape(raw: &str) -> String {
    raw.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Overpass JSON response.
#[derive(Debug, Deserialize)]
pub struct OverpassResponse {
    /// Matched elements.
    #[serde(default)]
    pub elements: Vec<Element>,
    /// Diagnostic text; Overpass reports runtime errors here with HTTP 200.
    pub remark: Option<String>,
}

impl OverpassResponse {
    /// A remark describing a failed query, if present.
    pub fn error_remark(&self) -> Option<&str> {
        self.remark
            .as_deref()
            .filter(|remark| remark.contains("error"))
    }

    /// Convert every element into a [`GeoFeature`].
    pub fn into_features(self) -> Vec<GeoFeature> {
        self.elements.into_iter().map(Element::into_feature).collect()
    }
}

/// One node, way or relation.
#[derive(Debug, Deserialize)]
pub struct Element {
    /// `node`, `way` or `relation`.
    #[serde(rename = "type")]
    pub kind: String,
    /// OSM identifier, unique per element type.
    pub id: u64,
    /// Node latitude.
    pub lat: Option<f64>,
    /// Node longitude.
    pub lon: Option<f64>,
    /// Centre of a way or relation.
    pub center: Option<Center>,
    /// Element tags.
    #[serde(default)]
    pub tags: HashMap<String, String>,
}

/// Centre coordinate reported for ways and relations.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct Center {
    /// Latitude.
    pub lat: f64,
    /// Longitude.
    pub lon: f64,
}

impl Element {
    fn location(&self) -> Option<Coord<f64>> {
        match (self.lat, self.lon, self.center) {
            (Some(lat), Some(lon), _) | (_, _, Some(Center { lat, lon })) => {
                Some(Coord { x: lon, y: lat })
            }
            _ => None,
        }
    }

    /// Convert to a [`GeoFeature`].
    pub fn into_feature(self) -> GeoFeature {
        let location = self.location();
        GeoFeature {
            id: self.id,
            location,
            tags: self.tags,
        }
    }
}
