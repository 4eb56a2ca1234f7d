//! Behavioural coverage for multi-city extraction runs.

use std::cell::RefCell;

use camino::Utf8PathBuf;
use geo::MultiPolygon;
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use sitescore_core::test_support::{StubGeoDataSource, square_boundary, tagged};
use sitescore_core::{GeoDataError, GeoDataSource, GeoFeature, GeoPoint, TagFilter};
use sitescore_data::{
    CityCatalog, CityOutcome, CityRunError, CityRunner, ExtractionOptions, NullProgress,
    read_grid_dataset,
};
use tempfile::TempDir;

/// Source that only knows the boundaries of named cities.
struct Atlas {
    features: StubGeoDataSource,
    known: Vec<(&'static str, MultiPolygon<f64>)>,
}

impl GeoDataSource for Atlas {
    fn query_features_near(
        &self,
        point: GeoPoint,
        radius_m: f64,
        filter: &TagFilter,
    ) -> Result<Vec<GeoFeature>, GeoDataError> {
        self.features.query_features_near(point, radius_m, filter)
    }

    fn resolve_boundary(&self, place: &str) -> Result<MultiPolygon<f64>, GeoDataError> {
        self.known
            .iter()
            .find(|(name, _)| place.starts_with(name))
            .map(|(_, polygon)| polygon.clone())
            .ok_or_else(|| GeoDataError::BoundaryNotFound {
                place: place.to_owned(),
            })
    }
}

struct Run {
    _dir: TempDir,
    outcomes: Vec<CityOutcome>,
}

#[fixture]
fn atlas() -> RefCell<Option<Atlas>> {
    RefCell::new(None)
}

#[fixture]
fn catalog() -> RefCell<Option<CityCatalog>> {
    RefCell::new(None)
}

#[fixture]
fn run() -> RefCell<Option<Run>> {
    RefCell::new(None)
}

fn lille() -> (&'static str, MultiPolygon<f64>) {
    ("Lille", square_boundary(50.60, 3.00, 0.01))
}

fn outcome_for<'a>(run: &'a Run, city: &str) -> &'a CityOutcome {
    run.outcomes
        .iter()
        .find(|o| o.city == city)
        .unwrap_or_else(|| panic!("no outcome for {city}"))
}

fn lille_dataset(run: &RefCell<Option<Run>>) -> Utf8PathBuf {
    let borrowed = run.borrow();
    let Some(run) = borrowed.as_ref() else {
        panic!("extraction must have run")
    };
    match &outcome_for(run, "Lille").result {
        Ok(report) => report.dataset.clone(),
        Err(err) => panic!("Lille failed: {err}"),
    }
}

#[given("a data source that knows the boundary of Lille")]
fn lille_source(atlas: &RefCell<Option<Atlas>>) {
    *atlas.borrow_mut() = Some(Atlas {
        features: StubGeoDataSource::with_features(vec![
            tagged(1, "shop", "clothes"),
            tagged(2, "amenity", "restaurant"),
        ]),
        known: vec![lille()],
    });
}

#[given("a data source that knows Lille but rejects every feature query")]
fn failing_source(atlas: &RefCell<Option<Atlas>>) {
    *atlas.borrow_mut() = Some(Atlas {
        features: StubGeoDataSource::with_error(GeoDataError::Http {
            url: "http://overpass.test/api/interpreter".to_owned(),
            status: 429,
            message: "too many requests".to_owned(),
        }),
        known: vec![lille()],
    });
}

#[given("a catalog containing Lille")]
fn lille_catalog(catalog: &RefCell<Option<CityCatalog>>) {
    *catalog.borrow_mut() = Some(CityCatalog::for_country("France", ["Lille"]).with_spacing(500.0));
}

#[given("a catalog containing Atlantis and Lille")]
fn mixed_catalog(catalog: &RefCell<Option<CityCatalog>>) {
    *catalog.borrow_mut() =
        Some(CityCatalog::for_country("France", ["Atlantis", "Lille"]).with_spacing(500.0));
}

#[when("I run the extraction")]
fn run_extraction(
    atlas: &RefCell<Option<Atlas>>,
    catalog: &RefCell<Option<CityCatalog>>,
    run: &RefCell<Option<Run>>,
) {
    let atlas_ref = atlas.borrow();
    let Some(source) = atlas_ref.as_ref() else {
        panic!("data source must be configured")
    };
    let catalog_ref = catalog.borrow();
    let Some(cities) = catalog_ref.as_ref() else {
        panic!("catalog must be configured")
    };
    let dir = TempDir::new().unwrap_or_else(|err| panic!("create temporary directory: {err}"));
    let data_dir = Utf8PathBuf::from_path_buf(dir.path().to_path_buf())
        .unwrap_or_else(|path| panic!("non UTF-8 path {}", path.display()));
    let runner = CityRunner::new(source, &data_dir)
        .with_options(ExtractionOptions::default().with_workers(2));
    let outcomes = runner.run_all(cities, &NullProgress);
    *run.borrow_mut() = Some(Run {
        _dir: dir,
        outcomes,
    });
}

#[then("Lille is reported as extracted")]
fn lille_extracted(run: &RefCell<Option<Run>>) {
    let borrowed = run.borrow();
    let Some(run) = borrowed.as_ref() else {
        panic!("extraction must have run")
    };
    match &outcome_for(run, "Lille").result {
        Ok(report) => {
            assert!(report.points > 0);
            assert!(report.dataset.as_str().ends_with("lille_grid.csv"));
        }
        Err(err) => panic!("Lille failed: {err}"),
    }
}

#[then("Atlantis is reported as a boundary failure")]
fn atlantis_failed(run: &RefCell<Option<Run>>) {
    let borrowed = run.borrow();
    let Some(run) = borrowed.as_ref() else {
        panic!("extraction must have run")
    };
    assert!(matches!(
        outcome_for(run, "Atlantis").result,
        Err(CityRunError::Boundary { .. })
    ));
}

#[then("the Lille grid dataset has one row per grid point")]
fn dataset_matches_report(run: &RefCell<Option<Run>>) {
    let path = lille_dataset(run);
    let rows = read_grid_dataset(&path).unwrap_or_else(|err| panic!("read {path}: {err}"));
    assert!(!rows.is_empty());
    assert!(rows.iter().all(|row| row.features.shops_total == 1
        && row.features.restaurants == 1
        && row.features.total_pois == 2));
}

#[then("every extracted Lille point is degraded")]
fn all_degraded(run: &RefCell<Option<Run>>) {
    let borrowed = run.borrow();
    let Some(run) = borrowed.as_ref() else {
        panic!("extraction must have run")
    };
    match &outcome_for(run, "Lille").result {
        Ok(report) => assert_eq!(report.degraded, report.points),
        Err(err) => panic!("Lille failed: {err}"),
    }
}

#[then("every row of the Lille grid dataset is zero")]
fn rows_zero(run: &RefCell<Option<Run>>) {
    let path = lille_dataset(run);
    let rows = read_grid_dataset(&path).unwrap_or_else(|err| panic!("read {path}: {err}"));
    assert!(rows.iter().all(|row| row.features.is_zero()));
}

#[scenario(path = "tests/features/city_extraction.feature", index = 0)]
fn known_city_is_extracted(
    atlas: RefCell<Option<Atlas>>,
    catalog: RefCell<Option<CityCatalog>>,
    run: RefCell<Option<Run>>,
) {
    let _ = (atlas, catalog, run);
}

#[scenario(path = "tests/features/city_extraction.feature", index = 1)]
fn unknown_city_is_isolated(
    atlas: RefCell<Option<Atlas>>,
    catalog: RefCell<Option<CityCatalog>>,
    run: RefCell<Option<Run>>,
) {
    let _ = (atlas, catalog, run);
}

#[scenario(path = "tests/features/city_extraction.feature", index = 2)]
fn failing_source_zero_fills(
    atlas: RefCell<Option<Atlas>>,
    catalog: RefCell<Option<CityCatalog>>,
    run: RefCell<Option<Run>>,
) {
    let _ = (atlas, catalog, run);
}
