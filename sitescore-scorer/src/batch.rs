//! Offline scoring of a whole city grid.
#![forbid(unsafe_code)]

use camino::{Utf8Path, Utf8PathBuf};
use sitescore_data::{
    ScoredRecord, grid_dataset_path, read_grid_dataset, scored_dataset_path,
    write_scored_dataset,
};

use crate::{
    BaselineError, CityStats, NormalizationBaseline, ScoringEngine, baseline_path, stats_path,
    write_baseline_file, write_stats_file,
};

/// Artefacts produced by [`score_city_dataset`].
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetScoring {
    /// Baseline derived from the grid dataset.
    pub baseline: NormalizationBaseline,
    /// Summary of the scored grid.
    pub stats: CityStats,
    /// Scored dataset location.
    pub scored_path: Utf8PathBuf,
    /// Baseline artefact location.
    pub baseline_path: Utf8PathBuf,
    /// Statistics file location.
    pub stats_path: Utf8PathBuf,
}

/// Score every row of a city's grid dataset against its own baseline.
///
/// Reads `<city>_grid.csv` under `data_dir` and writes `<city>_scored.csv`,
/// `<city>_baseline.bin` and `<city>_stats.json` beside it.
///
/// # Errors
/// Returns [`BaselineError::EmptyDataset`] when the grid has no rows, and
/// propagates dataset and artefact I/O failures.
pub fn score_city_dataset(
    data_dir: &Utf8Path,
    city: &str,
    engine: &ScoringEngine,
) -> Result<DatasetScoring, BaselineError> {
    let grid_path = grid_dataset_path(data_dir, city);
    let rows = read_grid_dataset(&grid_path)?;
    let baseline = NormalizationBaseline::from_features(city, rows.iter().map(|r| &r.features))
        .ok_or_else(|| BaselineError::EmptyDataset {
            city: city.to_owned(),
            path: grid_path.clone(),
        })?;

    let scored: Vec<ScoredRecord> = rows
        .into_iter()
        .map(|row| {
            let (scores, _) = engine.score(&row.features, Some(&baseline));
            ScoredRecord {
                point: row.point,
                features: row.features,
                scores,
            }
        })
        .collect();
    let all_scores: Vec<_> = scored.iter().map(|r| r.scores).collect();
    let stats = CityStats::from_scores(city, &all_scores).ok_or_else(|| {
        BaselineError::EmptyDataset {
            city: city.to_owned(),
            path: grid_path.clone(),
        }
    })?;

    let scored_path = scored_dataset_path(data_dir, city);
    write_scored_dataset(&scored_path, &scored)?;
    let artefact = baseline_path(data_dir, city);
    write_baseline_file(&artefact, &baseline)?;
    let stats_file = stats_path(data_dir, city);
    write_stats_file(&stats_file, &stats)?;
    log::info!(
        "{city}: scored {} points from {grid_path} into {scored_path}",
        stats.total_points
    );

    Ok(DatasetScoring {
        baseline,
        stats,
        scored_path,
        baseline_path: artefact,
        stats_path: stats_file,
    })
}

#[cfg(test)]
mod tests {
    //! Unit coverage for batch scoring.

    use camino::Utf8PathBuf;
    use rstest::{fixture, rstest};
    use sitescore_core::{FeatureCategory, FeatureVector, GeoPoint, GridPoint, NormalizationMode};
    use sitescore_data::{GridRecord, grid_dataset_path, read_scored_dataset, write_grid_dataset};
    use tempfile::TempDir;

    use super::score_city_dataset;
    use crate::{BaselineError, BaselineLoader, ScoringEngine, read_baseline_file};

    #[fixture]
    fn data_dir() -> (TempDir, Utf8PathBuf) {
        let dir = TempDir::new().unwrap_or_else(|err| panic!("create temporary directory: {err}"));
        let path = Utf8PathBuf::from_path_buf(dir.path().to_path_buf())
            .unwrap_or_else(|p| panic!("non UTF-8 path {}", p.display()));
        (dir, path)
    }

    fn grid_row(lat: f64, shops_shoes: u32, parks: u32) -> GridRecord {
        let location = GeoPoint::new(lat, -0.58).unwrap_or_else(|err| panic!("{err}"));
        GridRecord {
            point: GridPoint::new("Bordeaux", location),
            features: FeatureVector {
                shops_shoes,
                parks,
                ..FeatureVector::default()
            },
        }
    }

    #[rstest]
    fn scores_grid_and_writes_artefacts(data_dir: (TempDir, Utf8PathBuf)) {
        let (_guard, dir) = data_dir;
        let rows = [grid_row(44.84, 4, 1), grid_row(44.85, 2, 3), grid_row(44.86, 0, 0)];
        write_grid_dataset(&grid_dataset_path(&dir, "Bordeaux"), &rows)
            .unwrap_or_else(|err| panic!("write: {err}"));

        let outcome = score_city_dataset(&dir, "Bordeaux", &ScoringEngine::default())
            .unwrap_or_else(|err| panic!("score: {err}"));

        let scored = read_scored_dataset(&outcome.scored_path)
            .unwrap_or_else(|err| panic!("read scored: {err}"));
        assert_eq!(scored.len(), 3);
        let busiest = scored
            .first()
            .unwrap_or_else(|| panic!("first row"));
        assert!((busiest.scores.competition - 70.0).abs() < 1e-9);
        assert_eq!(outcome.stats.total_points, 3);

        let artefact = read_baseline_file(&outcome.baseline_path)
            .unwrap_or_else(|err| panic!("read baseline: {err}"));
        assert_eq!(artefact, outcome.baseline);
        assert_eq!(artefact.max(FeatureCategory::Parks), 3);
        assert!(outcome.stats_path.as_str().ends_with("bordeaux_stats.json"));
    }

    #[rstest]
    fn scored_dataset_reproduces_the_grid_baseline(data_dir: (TempDir, Utf8PathBuf)) {
        let (_guard, dir) = data_dir;
        let rows = [grid_row(44.84, 4, 1), grid_row(44.85, 2, 3)];
        write_grid_dataset(&grid_dataset_path(&dir, "Bordeaux"), &rows)
            .unwrap_or_else(|err| panic!("write: {err}"));
        let outcome = score_city_dataset(&dir, "Bordeaux", &ScoringEngine::default())
            .unwrap_or_else(|err| panic!("score: {err}"));

        let reloaded = BaselineLoader::new(&dir)
            .load("Bordeaux")
            .unwrap_or_else(|err| panic!("load: {err}"))
            .unwrap_or_else(|| panic!("baseline expected"));
        assert_eq!(reloaded, outcome.baseline);

        let scored = read_scored_dataset(&outcome.scored_path)
            .unwrap_or_else(|err| panic!("read scored: {err}"));
        let engine = ScoringEngine::default();
        for row in scored {
            let (rescored, mode) = engine.score(&row.features, Some(&reloaded));
            assert_eq!(mode, NormalizationMode::CitySpecific);
            assert!((rescored.global_score - row.scores.global_score).abs() < 1e-9);
        }
    }

    #[rstest]
    fn empty_grid_is_rejected(data_dir: (TempDir, Utf8PathBuf)) {
        let (_guard, dir) = data_dir;
        write_grid_dataset(&grid_dataset_path(&dir, "Bordeaux"), &[])
            .unwrap_or_else(|err| panic!("write: {err}"));
        let err = score_city_dataset(&dir, "Bordeaux", &ScoringEngine::default()).err();
        assert!(matches!(err, Some(BaselineError::EmptyDataset { .. })));
    }

    #[rstest]
    fn missing_grid_is_a_dataset_error(data_dir: (TempDir, Utf8PathBuf)) {
        let (_guard, dir) = data_dir;
        let err = score_city_dataset(&dir, "Bordeaux", &ScoringEngine::default()).err();
        assert!(matches!(err, Some(BaselineError::Dataset(_))));
    }
}
