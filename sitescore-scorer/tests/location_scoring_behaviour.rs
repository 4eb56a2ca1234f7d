//! Behavioural coverage for scoring ad hoc locations.

use std::cell::RefCell;

use camino::Utf8PathBuf;
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use sitescore_core::test_support::{StubGeoDataSource, tagged};
use sitescore_core::{
    CityResolver, FeatureExtractor, FeatureVector, GeoFeature, GeoPoint, GridPoint,
    NormalizationMode, ScoreRequest, ScoreSet,
};
use sitescore_data::{
    GridRecord, ScoredRecord, grid_dataset_path, scored_dataset_path, write_grid_dataset,
    write_scored_dataset,
};
use sitescore_scorer::{BaselineCache, BaselineLoader, LocationScorer, ScoredLocation, ScoringEngine};
use tempfile::TempDir;

struct DataDir {
    _guard: TempDir,
    path: Utf8PathBuf,
}

#[fixture]
fn data_dir() -> RefCell<Option<DataDir>> {
    RefCell::new(None)
}

#[fixture]
fn source() -> RefCell<Option<StubGeoDataSource>> {
    RefCell::new(None)
}

#[fixture]
fn scored() -> RefCell<Option<ScoredLocation>> {
    RefCell::new(None)
}

fn ensure_dir(data_dir: &RefCell<Option<DataDir>>) -> Utf8PathBuf {
    let mut slot = data_dir.borrow_mut();
    if let Some(existing) = slot.as_ref() {
        return existing.path.clone();
    }
    let guard = TempDir::new().unwrap_or_else(|err| panic!("create temporary directory: {err}"));
    let path = Utf8PathBuf::from_path_buf(guard.path().to_path_buf())
        .unwrap_or_else(|p| panic!("non UTF-8 path {}", p.display()));
    *slot = Some(DataDir {
        _guard: guard,
        path: path.clone(),
    });
    path
}

fn paris_point() -> GridPoint {
    let location = GeoPoint::new(48.86, 2.34).unwrap_or_else(|err| panic!("{err}"));
    GridPoint::new("Paris", location)
}

fn known_maxima(restaurants: u32) -> FeatureVector {
    FeatureVector {
        restaurants,
        hotels: 5,
        attractions: 10,
        museums: 5,
        banks: 10,
        pharmacy: 5,
        parks: 10,
        business_centers: 10,
        ..FeatureVector::default()
    }
}

fn recorded(scored: &RefCell<Option<ScoredLocation>>) -> ScoredLocation {
    scored
        .borrow()
        .clone()
        .unwrap_or_else(|| panic!("a location must have been scored"))
}

#[expect(clippy::float_arithmetic, reason = "assertions compare floats")]
fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-9,
        "expected {expected}, got {actual}"
    );
}

#[given("no datasets for any city")]
fn no_datasets(data_dir: &RefCell<Option<DataDir>>) {
    ensure_dir(data_dir);
}

#[given("a Paris grid dataset with known maxima")]
fn paris_grid(data_dir: &RefCell<Option<DataDir>>) {
    let dir = ensure_dir(data_dir);
    let rows = [GridRecord {
        point: paris_point(),
        features: known_maxima(20),
    }];
    write_grid_dataset(&grid_dataset_path(&dir, "Paris"), &rows)
        .unwrap_or_else(|err| panic!("write grid: {err}"));
}

#[given("a Paris scored dataset with twice the restaurant maximum")]
fn paris_scored(data_dir: &RefCell<Option<DataDir>>) {
    let dir = ensure_dir(data_dir);
    let rows = [ScoredRecord {
        point: paris_point(),
        features: known_maxima(40),
        scores: ScoreSet::default(),
    }];
    write_scored_dataset(&scored_dataset_path(&dir, "Paris"), &rows)
        .unwrap_or_else(|err| panic!("write scored: {err}"));
}

#[given("a data source with nothing nearby")]
fn empty_source(source: &RefCell<Option<StubGeoDataSource>>) {
    *source.borrow_mut() = Some(StubGeoDataSource::with_features(Vec::new()));
}

#[given("a data source with ten restaurants, five parks and two business centres")]
fn busy_source(source: &RefCell<Option<StubGeoDataSource>>) {
    let restaurants = (0..10).map(|id| tagged(id, "amenity", "restaurant"));
    let parks = (10..15).map(|id| tagged(id, "leisure", "park"));
    let offices = (15..17).map(|id| tagged(id, "office", "company"));
    let features: Vec<GeoFeature> = restaurants.chain(parks).chain(offices).collect();
    *source.borrow_mut() = Some(StubGeoDataSource::with_features(features));
}

fn score_at(
    lat: f64,
    lon: f64,
    data_dir: &RefCell<Option<DataDir>>,
    source: &RefCell<Option<StubGeoDataSource>>,
    scored: &RefCell<Option<ScoredLocation>>,
) {
    let dir = ensure_dir(data_dir);
    let Some(stub) = source.borrow_mut().take() else {
        panic!("data source must be configured")
    };
    let scorer = LocationScorer::new(
        FeatureExtractor::new(stub),
        CityResolver::default(),
        BaselineCache::new(BaselineLoader::new(dir)),
        ScoringEngine::default(),
    );
    let request = ScoreRequest::new(lat, lon, None).unwrap_or_else(|err| panic!("{err}"));
    *scored.borrow_mut() = Some(scorer.score(&request));
}

#[when("I score a point in central Paris")]
fn score_paris(
    data_dir: &RefCell<Option<DataDir>>,
    source: &RefCell<Option<StubGeoDataSource>>,
    scored: &RefCell<Option<ScoredLocation>>,
) {
    score_at(48.8566, 2.3522, data_dir, source, scored);
}

#[when("I score a point in Lyon")]
fn score_lyon(
    data_dir: &RefCell<Option<DataDir>>,
    source: &RefCell<Option<StubGeoDataSource>>,
    scored: &RefCell<Option<ScoredLocation>>,
) {
    score_at(45.764, 4.8357, data_dir, source, scored);
}

#[then("the scores use default normalization")]
fn default_mode(scored: &RefCell<Option<ScoredLocation>>) {
    assert_eq!(recorded(scored).normalization, NormalizationMode::Default);
}

#[then("the scores use city-specific normalization")]
fn city_mode(scored: &RefCell<Option<ScoredLocation>>) {
    assert_eq!(
        recorded(scored).normalization,
        NormalizationMode::CitySpecific
    );
}

#[then("attractiveness is 0, competition is 1, accessibility is 0 and suitability is 39.6")]
fn empty_scores(scored: &RefCell<Option<ScoredLocation>>) {
    let scores = recorded(scored).scores;
    assert_close(scores.attractiveness, 0.0);
    assert_close(scores.competition, 1.0);
    assert_close(scores.accessibility, 0.0);
    assert_close(scores.suitability, 39.6);
}

#[then("attractiveness is 24")]
fn attractiveness_24(scored: &RefCell<Option<ScoredLocation>>) {
    assert_close(recorded(scored).scores.attractiveness, 24.0);
}

#[then("attractiveness is 21.5")]
fn attractiveness_21_5(scored: &RefCell<Option<ScoredLocation>>) {
    assert_close(recorded(scored).scores.attractiveness, 21.5);
}

#[then("the point is attributed to Paris")]
fn attributed_to_paris(scored: &RefCell<Option<ScoredLocation>>) {
    assert_eq!(recorded(scored).city, "Paris");
}

#[scenario(path = "tests/features/location_scoring.feature", index = 0)]
fn empty_neighbourhood(
    data_dir: RefCell<Option<DataDir>>,
    source: RefCell<Option<StubGeoDataSource>>,
    scored: RefCell<Option<ScoredLocation>>,
) {
    let _ = (data_dir, source, scored);
}

#[scenario(path = "tests/features/location_scoring.feature", index = 1)]
fn attractiveness_against_baseline(
    data_dir: RefCell<Option<DataDir>>,
    source: RefCell<Option<StubGeoDataSource>>,
    scored: RefCell<Option<ScoredLocation>>,
) {
    let _ = (data_dir, source, scored);
}

#[scenario(path = "tests/features/location_scoring.feature", index = 2)]
fn scored_dataset_wins(
    data_dir: RefCell<Option<DataDir>>,
    source: RefCell<Option<StubGeoDataSource>>,
    scored: RefCell<Option<ScoredLocation>>,
) {
    let _ = (data_dir, source, scored);
}

#[scenario(path = "tests/features/location_scoring.feature", index = 3)]
fn outside_cities_default_to_paris(
    data_dir: RefCell<Option<DataDir>>,
    source: RefCell<Option<StubGeoDataSource>>,
    scored: RefCell<Option<ScoredLocation>>,
) {
    let _ = (data_dir, source, scored);
}
