//! Weights and default divisors for the scoring formulas.
#![forbid(unsafe_code)]

/// One weighted, normalised term of a component score.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Term {
    /// Share of the component carried by this term.
    pub weight: f64,
    /// Divisor used when no city baseline is available.
    pub default_divisor: f64,
}

impl Term {
    /// Build a term from its weight and default divisor.
    #[must_use]
    pub const fn new(weight: f64, default_divisor: f64) -> Self {
        Self {
            weight,
            default_divisor,
        }
    }
}

/// Terms of the attractiveness score.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AttractivenessConfig {
    /// Restaurants, hotels, attractions and museums.
    pub food_entertainment: Term,
    /// Banks and pharmacies.
    pub services: Term,
    /// Parks.
    pub parks: Term,
    /// Business centres.
    pub business: Term,
}

/// Terms of the competition score.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompetitionConfig {
    /// Shoe shops.
    pub shoe_shops: Term,
    /// All shops.
    pub all_shops: Term,
    /// Lowest value the score may take.
    pub floor: f64,
}

/// Terms of the accessibility score.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AccessibilityConfig {
    /// Metro and rail stations.
    pub metro: Term,
    /// Pedestrian and cycle ways.
    pub walkability: Term,
    /// Bus stops.
    pub bus: Term,
    /// Parking.
    pub parking: Term,
}

/// Terms of the suitability score.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SuitabilityConfig {
    /// Weight of `100 - competition`.
    pub low_competition: f64,
    /// Shops plus restaurants.
    pub retail_environment: Term,
    /// Weight of the accessibility score.
    pub accessibility: f64,
    /// Residential buildings plus business centres.
    pub customer_base: Term,
}

/// Immutable configuration for [`ScoringEngine`](crate::ScoringEngine).
///
/// [`Default`] carries the reference weights and divisors. Tests and callers
/// substitute their own values by building the struct directly.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoringConfig {
    /// Attractiveness terms.
    pub attractiveness: AttractivenessConfig,
    /// Competition terms.
    pub competition: CompetitionConfig,
    /// Accessibility terms.
    pub accessibility: AccessibilityConfig,
    /// Suitability terms.
    pub suitability: SuitabilityConfig,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            attractiveness: AttractivenessConfig {
                food_entertainment: Term::new(0.30, 500.0),
                services: Term::new(0.25, 50.0),
                parks: Term::new(0.25, 100.0),
                business: Term::new(0.20, 100.0),
            },
            competition: CompetitionConfig {
                shoe_shops: Term::new(0.70, 100.0),
                all_shops: Term::new(0.30, 1500.0),
                floor: 1.0,
            },
            accessibility: AccessibilityConfig {
                metro: Term::new(0.40, 10.0),
                walkability: Term::new(0.30, 10.0),
                bus: Term::new(0.20, 50.0),
                parking: Term::new(0.10, 100.0),
            },
            suitability: SuitabilityConfig {
                low_competition: 0.40,
                retail_environment: Term::new(0.30, 1800.0),
                accessibility: 0.20,
                customer_base: Term::new(0.10, 200.0),
            },
        }
    }
}
