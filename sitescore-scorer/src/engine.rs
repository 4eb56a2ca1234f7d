//! Weighted linear scoring of feature vectors.
//!
//! Every term divides a feature count (or a sum of counts) by a divisor and
//! scales the ratio to a percentage. With a baseline the divisor is the
//! city's maximum for the same categories and the ratio is left unclamped;
//! without one the configured default divisor is used and the ratio is
//! clamped to `0.0..=1.0`. Each component score is clamped to its range.
#![forbid(unsafe_code)]

use sitescore_core::{FeatureCategory, FeatureVector, NormalizationMode, ScoreSet};

use crate::{NormalizationBaseline, ScoringConfig, config::Term};

const PERCENT: f64 = 100.0;

const FOOD_ENTERTAINMENT: [FeatureCategory; 4] = [
    FeatureCategory::Restaurants,
    FeatureCategory::Hotels,
    FeatureCategory::Attractions,
    FeatureCategory::Museums,
];
const SERVICES: [FeatureCategory; 2] = [FeatureCategory::Banks, FeatureCategory::Pharmacy];
const RETAIL_ENVIRONMENT: [FeatureCategory; 2] =
    [FeatureCategory::ShopsTotal, FeatureCategory::Restaurants];
const CUSTOMER_BASE: [FeatureCategory; 2] = [
    FeatureCategory::ResidentialBuildings,
    FeatureCategory::BusinessCenters,
];

/// Divide `value` by `max`, treating a zero `max` as a zero ratio.
///
/// ```
/// use sitescore_scorer::normalize;
///
/// assert_eq!(normalize(5.0, 10.0), 0.5);
/// assert_eq!(normalize(5.0, 0.0), 0.0);
/// ```
#[must_use]
#[expect(
    clippy::float_arithmetic,
    reason = "normalization is a ratio of counts"
)]
pub const fn normalize(value: f64, max: f64) -> f64 {
    if max == 0.0 { 0.0 } else { value / max }
}

fn sum(features: &FeatureVector, categories: &[FeatureCategory]) -> f64 {
    let total = categories
        .iter()
        .map(|&category| u64::from(features.get(category)))
        .sum::<u64>();
    count_to_f64(total)
}

#[expect(
    clippy::cast_precision_loss,
    reason = "feature counts stay far below 2^53"
)]
const fn count_to_f64(count: u64) -> f64 {
    count as f64
}

/// Divisor selection for one scoring run.
#[derive(Clone, Copy)]
enum Divisors<'a> {
    City(&'a NormalizationBaseline),
    Default,
}

impl Divisors<'_> {
    /// Ratio of the summed `categories` to their divisor, as a percentage.
    #[expect(
        clippy::float_arithmetic,
        reason = "percentages scale normalised ratios"
    )]
    fn percent(self, features: &FeatureVector, categories: &[FeatureCategory], term: Term) -> f64 {
        let value = sum(features, categories);
        let ratio = match self {
            Self::City(baseline) => {
                normalize(value, count_to_f64(baseline.sum_of_maxima(categories)))
            }
            Self::Default => normalize(value, term.default_divisor).clamp(0.0, 1.0),
        };
        ratio * PERCENT
    }

    #[expect(clippy::float_arithmetic, reason = "terms are weighted percentages")]
    fn weighted(self, features: &FeatureVector, categories: &[FeatureCategory], term: Term) -> f64 {
        term.weight * self.percent(features, categories, term)
    }
}

/// Applies the scoring formulas with a fixed [`ScoringConfig`].
///
/// The engine never fails: a zero divisor contributes a zero term and every
/// component is clamped.
///
/// # Examples
/// ```
/// use sitescore_core::{FeatureVector, NormalizationMode};
/// use sitescore_scorer::ScoringEngine;
///
/// let (scores, mode) = ScoringEngine::default().score(&FeatureVector::default(), None);
/// assert_eq!(mode, NormalizationMode::Default);
/// assert_eq!(scores.competition, 1.0);
/// assert!((scores.suitability - 39.6).abs() < 1e-9);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ScoringEngine {
    config: ScoringConfig,
}

impl ScoringEngine {
    /// Build an engine with explicit weights and divisors.
    #[must_use]
    pub const fn new(config: ScoringConfig) -> Self {
        Self { config }
    }

    /// Active configuration.
    #[must_use]
    pub const fn config(&self) -> &ScoringConfig {
        &self.config
    }

    /// Score `features`, normalising by `baseline` when one is supplied.
    ///
    /// Returns the scores together with the mode that produced them.
    #[must_use]
    pub fn score(
        &self,
        features: &FeatureVector,
        baseline: Option<&NormalizationBaseline>,
    ) -> (ScoreSet, NormalizationMode) {
        let (divisors, mode) = baseline.map_or(
            (Divisors::Default, NormalizationMode::Default),
            |b| (Divisors::City(b), NormalizationMode::CitySpecific),
        );
        let attractiveness = self.attractiveness(features, divisors);
        let competition = self.competition(features, divisors);
        let accessibility = self.accessibility(features, divisors);
        let suitability = self.suitability(features, divisors, competition, accessibility);
        (
            ScoreSet::from_components(attractiveness, competition, accessibility, suitability),
            mode,
        )
    }

    #[expect(clippy::float_arithmetic, reason = "component is a weighted sum")]
    fn attractiveness(&self, features: &FeatureVector, divisors: Divisors<'_>) -> f64 {
        let c = &self.config.attractiveness;
        let total = divisors.weighted(features, &FOOD_ENTERTAINMENT, c.food_entertainment)
            + divisors.weighted(features, &SERVICES, c.services)
            + divisors.weighted(features, &[FeatureCategory::Parks], c.parks)
            + divisors.weighted(features, &[FeatureCategory::BusinessCenters], c.business);
        total.clamp(0.0, PERCENT)
    }

    #[expect(clippy::float_arithmetic, reason = "component is a weighted sum")]
    fn competition(&self, features: &FeatureVector, divisors: Divisors<'_>) -> f64 {
        let c = &self.config.competition;
        let total = divisors.weighted(features, &[FeatureCategory::ShopsShoes], c.shoe_shops)
            + divisors.weighted(features, &[FeatureCategory::ShopsTotal], c.all_shops);
        // `clamp` panics on a floor above 100 or NaN.
        total.max(c.floor).min(PERCENT)
    }

    #[expect(clippy::float_arithmetic, reason = "component is a weighted sum")]
    fn accessibility(&self, features: &FeatureVector, divisors: Divisors<'_>) -> f64 {
        let c = &self.config.accessibility;
        let total = divisors.weighted(features, &[FeatureCategory::MetroStation], c.metro)
            + divisors.weighted(features, &[FeatureCategory::WalkabilityScore], c.walkability)
            + divisors.weighted(features, &[FeatureCategory::BusStop], c.bus)
            + divisors.weighted(features, &[FeatureCategory::Parking], c.parking);
        total.clamp(0.0, PERCENT)
    }

    #[expect(clippy::float_arithmetic, reason = "component is a weighted sum")]
    fn suitability(
        &self,
        features: &FeatureVector,
        divisors: Divisors<'_>,
        competition: f64,
        accessibility: f64,
    ) -> f64 {
        let c = &self.config.suitability;
        let total = c.low_competition * (PERCENT - competition.min(PERCENT))
            + divisors.weighted(features, &RETAIL_ENVIRONMENT, c.retail_environment)
            + c.accessibility * accessibility
            + divisors.weighted(features, &CUSTOMER_BASE, c.customer_base);
        total.clamp(0.0, PERCENT)
    }
}
