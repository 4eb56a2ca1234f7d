//! Request-time scoring of a single location.
//!
//! The scorer resolves the request's city, fetches that city's baseline from
//! the cache, extracts features around the point and applies the engine.
//! It never fails: an unreadable baseline falls back to default divisors
//! and a failed extraction scores a zero vector, with both outcomes
//! reported on the result.
#![forbid(unsafe_code)]

use serde::Serialize;
use sitescore_core::{
    CityResolver, FeatureExtractor, FeatureVector, GeoDataSource, GeoPoint,
    NormalizationMode, ScoreRequest, ScoreSet,
};

use crate::{BaselineCache, ScoringEngine};

/// Scores, features and diagnostics for one location.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredLocation {
    /// Scored point.
    pub location: GeoPoint,
    /// City whose baseline applied.
    pub city: String,
    /// Query radius in metres.
    pub radius_m: u32,
    /// Component and global scores.
    pub scores: ScoreSet,
    /// Extracted feature counts.
    pub features: FeatureVector,
    /// Divisors used for the scores.
    pub normalization: NormalizationMode,
    /// Why extraction degraded to a zero vector, if it did.
    pub degraded: Option<String>,
}

/// Scores ad hoc locations against per-city baselines.
#[derive(Debug)]
pub struct LocationScorer<S> {
    extractor: FeatureExtractor<S>,
    resolver: CityResolver,
    baselines: BaselineCache,
    engine: ScoringEngine,
}

impl<S: GeoDataSource> LocationScorer<S> {
    /// Assemble a scorer from its collaborators.
    #[must_use]
    pub const fn new(
        extractor: FeatureExtractor<S>,
        resolver: CityResolver,
        baselines: BaselineCache,
        engine: ScoringEngine,
    ) -> Self {
        Self {
            extractor,
            resolver,
            baselines,
            engine,
        }
    }

    /// City resolver in use.
    #[must_use]
    pub const fn resolver(&self) -> &CityResolver {
        &self.resolver
    }

    /// Baseline cache in use.
    #[must_use]
    pub const fn baselines(&self) -> &BaselineCache {
        &self.baselines
    }

    /// Score the location described by `request`, normalising against
    /// the city its coordinates resolve to.
    #[must_use]
    pub fn score(&self, request: &ScoreRequest) -> ScoredLocation {
        let city = self.resolver.resolve(request.location()).to_owned();
        self.score_in(request, city)
    }

    /// Score `request` against `city_name`'s baseline regardless of where the
    /// point lies.
    #[must_use]
    pub fn score_in(&self, request: &ScoreRequest, city_name: impl Into<String>) -> ScoredLocation {
        let location = request.location();
        let city: String = city_name.into();
        let baseline = self.baselines.get(&city).unwrap_or_else(|err| {
            log::warn!("baseline for {city} unavailable, using defaults: {err}");
            None
        });
        if baseline.is_none() {
            log::debug!("no baseline for {city}; scoring with default divisors");
        }

        let extraction = self
            .extractor
            .extract(location, f64::from(request.radius_m()));
        let (scores, normalization) = self.engine.score(extraction.features(), baseline.as_deref());
        let degraded = extraction.reason().map(ToString::to_string);

        ScoredLocation {
            location,
            city,
            radius_m: request.radius_m(),
            scores,
            features: extraction.into_features(),
            normalization,
            degraded,
        }
    }
}
