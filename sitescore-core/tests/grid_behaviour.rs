//! Behavioural coverage for grid generation.

use std::cell::RefCell;

use geo::Contains;
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use sitescore_core::test_support::square_boundary;
use sitescore_core::{CityBoundary, GridError, GridGenerator, GridPoint};

#[fixture]
fn boundary() -> RefCell<Option<Result<CityBoundary, GridError>>> {
    RefCell::new(None)
}

#[fixture]
fn grids() -> RefCell<Vec<Vec<GridPoint>>> {
    RefCell::new(Vec::new())
}

fn built(boundary: &RefCell<Option<Result<CityBoundary, GridError>>>) -> CityBoundary {
    match boundary.borrow().as_ref() {
        Some(Ok(b)) => b.clone(),
        Some(Err(err)) => panic!("boundary should be valid, got {err}"),
        None => panic!("boundary must be initialised"),
    }
}

#[given("a square city boundary with 250 metre spacing")]
fn square_with_spacing(boundary: &RefCell<Option<Result<CityBoundary, GridError>>>) {
    let polygon = square_boundary(48.80, 2.30, 0.03);
    *boundary.borrow_mut() = Some(CityBoundary::new("Paris", polygon, 250.0));
}

#[given("a square city boundary with zero spacing")]
fn square_with_zero_spacing(boundary: &RefCell<Option<Result<CityBoundary, GridError>>>) {
    let polygon = square_boundary(48.80, 2.30, 0.03);
    *boundary.borrow_mut() = Some(CityBoundary::new("Paris", polygon, 0.0));
}

#[when("I generate the grid")]
fn generate_once(
    boundary: &RefCell<Option<Result<CityBoundary, GridError>>>,
    grids: &RefCell<Vec<Vec<GridPoint>>>,
) {
    let city = built(boundary);
    let points = GridGenerator::default()
        .generate(&city)
        .unwrap_or_else(|err| panic!("grid generation failed: {err}"));
    grids.borrow_mut().push(points);
}

#[when("I generate the grid twice")]
fn generate_twice(
    boundary: &RefCell<Option<Result<CityBoundary, GridError>>>,
    grids: &RefCell<Vec<Vec<GridPoint>>>,
) {
    generate_once(boundary, grids);
    generate_once(boundary, grids);
}

#[then("every grid point lies strictly inside the boundary")]
fn points_inside(
    boundary: &RefCell<Option<Result<CityBoundary, GridError>>>,
    grids: &RefCell<Vec<Vec<GridPoint>>>,
) {
    let city = built(boundary);
    let grids = grids.borrow();
    let Some(points) = grids.first() else {
        panic!("grid must be generated")
    };
    assert!(!points.is_empty(), "expected grid points");
    for point in points {
        assert!(
            city.polygon().contains(&point.location.coord()),
            "{} lies outside the boundary",
            point.point_id
        );
    }
}

#[then("every grid point identifier encodes the city and coordinates")]
fn identifiers_encode_location(grids: &RefCell<Vec<Vec<GridPoint>>>) {
    let grids = grids.borrow();
    let Some(points) = grids.first() else {
        panic!("grid must be generated")
    };
    for point in points {
        let expected = format!(
            "Paris_{:.6}_{:.6}",
            point.location.latitude(),
            point.location.longitude()
        );
        assert_eq!(point.point_id, expected);
    }
}

#[then("both grids are identical")]
fn grids_identical(grids: &RefCell<Vec<Vec<GridPoint>>>) {
    let grids = grids.borrow();
    let [first, second] = grids.as_slice() else {
        panic!("expected exactly two grids")
    };
    assert_eq!(first, second);
}

#[then("the boundary is rejected as invalid spacing")]
fn spacing_rejected(boundary: &RefCell<Option<Result<CityBoundary, GridError>>>) {
    assert!(matches!(
        boundary.borrow().as_ref(),
        Some(Err(GridError::InvalidSpacing { .. }))
    ));
}

#[scenario(path = "tests/features/grid_generation.feature", index = 0)]
fn grid_points_inside_boundary(
    boundary: RefCell<Option<Result<CityBoundary, GridError>>>,
    grids: RefCell<Vec<Vec<GridPoint>>>,
) {
    let _ = (boundary, grids);
}

#[scenario(path = "tests/features/grid_generation.feature", index = 1)]
fn grid_is_deterministic(
    boundary: RefCell<Option<Result<CityBoundary, GridError>>>,
    grids: RefCell<Vec<Vec<GridPoint>>>,
) {
    let _ = (boundary, grids);
}

#[scenario(path = "tests/features/grid_generation.feature", index = 2)]
fn zero_spacing_rejected(
    boundary: RefCell<Option<Result<CityBoundary, GridError>>>,
    grids: RefCell<Vec<Vec<GridPoint>>>,
) {
    let _ = (boundary, grids);
}
