//! Fixed-shape POI category counts for one location.
//!
//! Every extraction produces a [`FeatureVector`] with the same sixteen
//! categories in the same order. Categories that were not observed are zero,
//! so consumers never deal with missing keys.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// One POI category counted by the feature extractor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum FeatureCategory {
    /// Features carrying any `shop` tag.
    ShopsTotal,
    /// `shop=shoes`.
    ShopsShoes,
    /// `amenity=restaurant` or `amenity=fast_food`.
    Restaurants,
    /// `amenity=bank`.
    Banks,
    /// `amenity=pharmacy`.
    Pharmacy,
    /// `railway=station`.
    MetroStation,
    /// `highway=bus_stop`.
    BusStop,
    /// `amenity=parking`.
    Parking,
    /// `tourism=hotel`.
    Hotels,
    /// `tourism=attraction`.
    Attractions,
    /// `tourism=museum`.
    Museums,
    /// `leisure=park`.
    Parks,
    /// Features carrying any `office` tag.
    BusinessCenters,
    /// `building=residential` plus `landuse=residential`.
    ResidentialBuildings,
    /// Pedestrian, footway and cycleway segments.
    WalkabilityScore,
    /// Every feature returned by the source.
    TotalPois,
}

impl FeatureCategory {
    /// All categories in dataset column order.
    pub const ALL: [Self; 16] = [
        Self::ShopsTotal,
        Self::ShopsShoes,
        Self::Restaurants,
        Self::Banks,
        Self::Pharmacy,
        Self::MetroStation,
        Self::BusStop,
        Self::Parking,
        Self::Hotels,
        Self::Attractions,
        Self::Museums,
        Self::Parks,
        Self::BusinessCenters,
        Self::ResidentialBuildings,
        Self::WalkabilityScore,
        Self::TotalPois,
    ];

    /// The snake-case column name.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ShopsTotal => "shops_total",
            Self::ShopsShoes => "shops_shoes",
            Self::Restaurants => "restaurants",
            Self::Banks => "banks",
            Self::Pharmacy => "pharmacy",
            Self::MetroStation => "metro_station",
            Self::BusStop => "bus_stop",
            Self::Parking => "parking",
            Self::Hotels => "hotels",
            Self::Attractions => "attractions",
            Self::Museums => "museums",
            Self::Parks => "parks",
            Self::BusinessCenters => "business_centers",
            Self::ResidentialBuildings => "residential_buildings",
            Self::WalkabilityScore => "walkability_score",
            Self::TotalPois => "total_pois",
        }
    }
}

impl fmt::Display for FeatureCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown category name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown feature category: {0}")]
pub struct UnknownCategory(pub String);

impl FromStr for FeatureCategory {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|category| category.as_str() == s)
            .ok_or_else(|| UnknownCategory(s.to_owned()))
    }
}

/// Counts of nearby POIs per [`FeatureCategory`].
///
/// The default value is the all-zero vector used for degraded extractions.
///
/// # Examples
/// ```
/// use sitescore_core::{FeatureCategory, FeatureVector};
///
/// let mut features = FeatureVector::default();
/// features.set(FeatureCategory::ShopsShoes, 3);
/// assert_eq!(features.shops_shoes, 3);
/// assert_eq!(features.get(FeatureCategory::Banks), 0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct FeatureVector {
    /// Any `shop=*`.
    pub shops_total: u32,
    /// `shop=shoes`.
    pub shops_shoes: u32,
    /// `amenity=restaurant` and `amenity=fast_food`.
    pub restaurants: u32,
    /// `amenity=bank`.
    pub banks: u32,
    /// `amenity=pharmacy`.
    pub pharmacy: u32,
    /// `railway=station`.
    pub metro_station: u32,
    /// `highway=bus_stop`.
    pub bus_stop: u32,
    /// `amenity=parking`.
    pub parking: u32,
    /// `tourism=hotel`.
    pub hotels: u32,
    /// `tourism=attraction`.
    pub attractions: u32,
    /// `tourism=museum`.
    pub museums: u32,
    /// `leisure=park`.
    pub parks: u32,
    /// Any `office=*`.
    pub business_centers: u32,
    /// `building=residential` or `landuse=residential`.
    pub residential_buildings: u32,
    /// Pedestrian, foot and cycle ways.
    pub walkability_score: u32,
    /// Every feature returned for the point.
    pub total_pois: u32,
}

impl FeatureVector {
    /// Read one category.
    pub const fn get(&self, category: FeatureCategory) -> u32 {
        match category {
            FeatureCategory::ShopsTotal => self.shops_total,
            FeatureCategory::ShopsShoes => self.shops_shoes,
            FeatureCategory::Restaurants => self.restaurants,
            FeatureCategory::Banks => self.banks,
            FeatureCategory::Pharmacy => self.pharmacy,
            FeatureCategory::MetroStation => self.metro_station,
            FeatureCategory::BusStop => self.bus_stop,
            FeatureCategory::Parking => self.parking,
            FeatureCategory::Hotels => self.hotels,
            FeatureCategory::Attractions => self.attractions,
            FeatureCategory::Museums => self.museums,
            FeatureCategory::Parks => self.parks,
            FeatureCategory::BusinessCenters => self.business_centers,
            FeatureCategory::ResidentialBuildings => self.residential_buildings,
            FeatureCategory::WalkabilityScore => self.walkability_score,
            FeatureCategory::TotalPois => self.total_pois,
        }
    }

    /// Mutable access to one category.
    pub const fn get_mut(&mut self, category: FeatureCategory) -> &mut u32 {
        match category {
            FeatureCategory::ShopsTotal => &mut self.shops_total,
            FeatureCategory::ShopsShoes => &mut self.shops_shoes,
            FeatureCategory::Restaurants => &mut self.restaurants,
            FeatureCategory::Banks => &mut self.banks,
            FeatureCategory::Pharmacy => &mut self.pharmacy,
            FeatureCategory::MetroStation => &mut self.metro_station,
            FeatureCategory::BusStop => &mut self.bus_stop,
            FeatureCategory::Parking => &mut self.parking,
            FeatureCategory::Hotels => &mut self.hotels,
            FeatureCategory::Attractions => &mut self.attractions,
            FeatureCategory::Museums => &mut self.museums,
            FeatureCategory::Parks => &mut self.parks,
            FeatureCategory::BusinessCenters => &mut self.business_centers,
            FeatureCategory::ResidentialBuildings => &mut self.residential_buildings,
            FeatureCategory::WalkabilityScore => &mut self.walkability_score,
            FeatureCategory::TotalPois => &mut self.total_pois,
        }
    }

    /// Overwrite one category.
    pub const fn set(&mut self, category: FeatureCategory, value: u32) {
        *self.get_mut(category) = value;
    }

    /// Iterate over `(category, count)` pairs in column order.
    pub fn iter(&self) -> impl Iterator<Item = (FeatureCategory, u32)> + '_ {
        FeatureCategory::ALL
            .into_iter()
            .map(move |category| (category, self.get(category)))
    }

    /// Whether every category is zero.
    pub fn is_zero(&self) -> bool {
        self.iter().all(|(_, count)| count == 0)
    }

    /// Category-wise maximum of `self` and `other`.
    #[must_use]
    pub fn max_with(mut self, other: &Self) -> Self {
        for category in FeatureCategory::ALL {
            let slot = self.get_mut(category);
            *slot = (*slot).max(other.get(category));
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn category_names_round_trip_through_from_str() {
        for category in FeatureCategory::ALL {
            assert_eq!(category.as_str().parse::<FeatureCategory>(), Ok(category));
        }
    }

    #[rstest]
    fn unknown_category_is_rejected() {
        assert!("shoes".parse::<FeatureCategory>().is_err());
    }

    #[rstest]
    fn max_with_takes_largest_per_category() {
        let mut a = FeatureVector::default();
        a.shops_total = 10;
        a.parks = 1;
        let mut b = FeatureVector::default();
        b.shops_total = 4;
        b.parks = 3;

        let merged = a.max_with(&b);
        assert_eq!(merged.shops_total, 10);
        assert_eq!(merged.parks, 3);
        assert_eq!(merged.banks, 0);
    }

    #[rstest]
    fn default_vector_is_zero() {
        assert!(FeatureVector::default().is_zero());
    }
}
