//! Score values produced by the scoring engine.

use std::fmt;

/// Which normalization divisors produced a [`ScoreSet`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum NormalizationMode {
    /// Divisors came from the city's baseline.
    CitySpecific,
    /// No baseline was available; fixed default divisors were used.
    Default,
}

impl NormalizationMode {
    /// The snake-case label.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::CitySpecific => "city_specific",
            Self::Default => "default",
        }
    }
}

impl fmt::Display for NormalizationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The four component scores and their mean.
///
/// # Examples
/// ```
/// use sitescore_core::ScoreSet;
///
/// let scores = ScoreSet::from_components(10.0, 20.0, 30.0, 40.0);
/// assert_eq!(scores.global_score, 25.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ScoreSet {
    /// Food, services, parks and business presence, 0 to 100.
    pub attractiveness: f64,
    /// Shoe and general retail density, 1 to 100.
    pub competition: f64,
    /// Transit, walkability and parking, 0 to 100.
    pub accessibility: f64,
    /// Blend of low competition, retail environment and customer base.
    pub suitability: f64,
    /// Mean of the four components.
    pub global_score: f64,
}

impl ScoreSet {
    /// Build a set, deriving `global_score` as the mean of the components.
    pub fn from_components(
        attractiveness: f64,
        competition: f64,
        accessibility: f64,
        suitability: f64,
    ) -> Self {
        Self {
            attractiveness,
            competition,
            accessibility,
            suitability,
            global_score: (attractiveness + competition + accessibility + suitability) / 4.0,
        }
    }

    /// A copy with every score rounded to two decimals for presentation.
    #[must_use]
    pub fn rounded(&self) -> Self {
        fn round2(value: f64) -> f64 {
            (value * 100.0).round() / 100.0
        }
        Self {
            attractiveness: round2(self.attractiveness),
            competition: round2(self.competition),
            accessibility: round2(self.accessibility),
            suitability: round2(self.suitability),
            global_score: round2(self.global_score),
        }
    }
}
