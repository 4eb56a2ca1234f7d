//! Per-city CSV datasets.
//!
//! A grid dataset holds one row per grid point: `point_id`, `city`, `lat`,
//! `lon`, then one column per [`FeatureCategory`]. A scored dataset adds the
//! five score columns. Readers locate columns by header name, so column order
//! is free and a missing category column reads as zero.

use std::collections::HashMap;
use std::io;

use camino::{Utf8Path, Utf8PathBuf};
use csv::StringRecord;
use sitescore_core::{
    FeatureCategory, FeatureVector, GeoPoint, GeoPointError, GridPoint, ScoreSet,
};
use sitescore_fs::{create_utf8_file, open_utf8_file};
use thiserror::Error;

/// Score columns appended to scored datasets, in order.
pub const SCORE_COLUMNS: [&str; 5] = [
    "attractiveness_score",
    "competition_score",
    "accessibility_score",
    "suitability_score",
    "global_score",
];

const ID_COLUMNS: [&str; 4] = ["point_id", "city", "lat", "lon"];

/// Path of the grid dataset for `city` under `data_dir`.
///
/// ```
/// use camino::Utf8Path;
/// use sitescore_data::dataset::grid_dataset_path;
///
/// assert_eq!(grid_dataset_path(Utf8Path::new("data"), "Lille"), "data/lille_grid.csv");
/// ```
pub fn grid_dataset_path(data_dir: &Utf8Path, city: &str) -> Utf8PathBuf {
    data_dir.join(format!("{}_grid.csv", city.to_lowercase()))
}

/// Path of the scored dataset for `city` under `data_dir`.
pub fn scored_dataset_path(data_dir: &Utf8Path, city: &str) -> Utf8PathBuf {
    data_dir.join(format!("{}_scored.csv", city.to_lowercase()))
}

/// Errors raised while reading or writing datasets.
#[derive(Debug, Error)]
pub enum DatasetError {
    /// The dataset could not be opened.
    #[error("failed to open dataset at {path}")]
    Open {
        /// Dataset path.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
    /// The dataset could not be created.
    #[error("failed to create dataset at {path}")]
    Create {
        /// Dataset path.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
    /// CSV encoding or decoding failed.
    #[error("CSV error in {path}")]
    Csv {
        /// Dataset path.
        path: Utf8PathBuf,
        /// Underlying CSV error.
        #[source]
        source: csv::Error,
    },
    /// A required column is absent from the header.
    #[error("{path} has no {column} column")]
    MissingColumn {
        /// Dataset path.
        path: Utf8PathBuf,
        /// Column name.
        column: &'static str,
    },
    /// A cell could not be parsed.
    #[error("{path} line {line}: invalid {column} value {value:?}")]
    InvalidValue {
        /// Dataset path.
        path: Utf8PathBuf,
        /// One-based line number.
        line: u64,
        /// Column name.
        column: String,
        /// Raw cell content.
        value: String,
    },
    /// A row holds coordinates outside the valid range.
    #[error("{path} line {line}: invalid coordinates")]
    Coordinates {
        /// Dataset path.
        path: Utf8PathBuf,
        /// One-based line number.
        line: u64,
        /// Validation failure.
        #[source]
        source: GeoPointError,
    },
}

/// One row of a grid dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct GridRecord {
    /// Where the row was sampled.
    pub point: GridPoint,
    /// Counts at the point.
    pub features: FeatureVector,
}

/// One row of a scored dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredRecord {
    /// Where the row was sampled.
    pub point: GridPoint,
    /// Counts at the point.
    pub features: FeatureVector,
    /// Scores computed against the city baseline.
    pub scores: ScoreSet,
}

fn header(with_scores: bool) -> Vec<&'static str> {
    let mut columns: Vec<&'static str> = ID_COLUMNS.to_vec();
    columns.extend(FeatureCategory::ALL.iter().map(|c| c.as_str()));
    if with_scores {
        columns.extend(SCORE_COLUMNS);
    }
    columns
}

fn row_prefix(point: &GridPoint, features: &FeatureVector) -> Vec<String> {
    let mut row = vec![
        point.point_id.clone(),
        point.city.clone(),
        point.location.latitude().to_string(),
        point.location.longitude().to_string(),
    ];
    row.extend(features.iter().map(|(_, count)| count.to_string()));
    row
}

fn write_rows<I>(path: &Utf8Path, with_scores: bool, rows: I) -> Result<(), DatasetError>
where
    I: IntoIterator<Item = Vec<String>>,
{
    let file = create_utf8_file(path).map_err(|source| DatasetError::Create {
        path: path.to_path_buf(),
        source,
    })?;
    let csv_err = |source: csv::Error| DatasetError::Csv {
        path: path.to_path_buf(),
        source,
    };
    let mut writer = csv::Writer::from_writer(file);
    writer.write_record(header(with_scores)).map_err(csv_err)?;
    for row in rows {
        writer.write_record(&row).map_err(csv_err)?;
    }
    writer.flush().map_err(|source| DatasetError::Create {
        path: path.to_path_buf(),
        source,
    })
}

/// Write a grid dataset, replacing any existing file.
pub fn write_grid_dataset(path: &Utf8Path, records: &[GridRecord]) -> Result<(), DatasetError> {
    write_rows(
        path,
        false,
        records.iter().map(|r| row_prefix(&r.point, &r.features)),
    )
}

/// Write a scored dataset, replacing any existing file.
pub fn write_scored_dataset(
    path: &Utf8Path,
    records: &[ScoredRecord],
) -> Result<(), DatasetError> {
    write_rows(
        path,
        true,
        records.iter().map(|r| {
            let mut row = row_prefix(&r.point, &r.features);
            let s = &r.scores;
            row.extend(
                [
                    s.attractiveness,
                    s.competition,
                    s.accessibility,
                    s.suitability,
                    s.global_score,
                ]
                .map(|v| v.to_string()),
            );
            row
        }),
    )
}

struct Columns {
    path: Utf8PathBuf,
    index: HashMap<String, usize>,
}

impl Columns {
    fn new(path: &Utf8Path, headers: &StringRecord) -> Self {
        let index = headers
            .iter()
            .enumerate()
            .map(|(i, name)| (name.trim().to_owned(), i))
            .collect();
        Self {
            path: path.to_path_buf(),
            index,
        }
    }

    fn require(&self, column: &'static str) -> Result<(), DatasetError> {
        if self.index.contains_key(column) {
            Ok(())
        } else {
            Err(DatasetError::MissingColumn {
                path: self.path.clone(),
                column,
            })
        }
    }

    fn cell<'r>(&self, record: &'r StringRecord, column: &str) -> Option<&'r str> {
        self.index
            .get(column)
            .and_then(|&i| record.get(i))
            .map(str::trim)
    }

    fn parse<T: std::str::FromStr>(
        &self,
        record: &StringRecord,
        column: &str,
    ) -> Result<Option<T>, DatasetError> {
        match self.cell(record, column) {
            None | Some("") => Ok(None),
            Some(raw) => raw.parse().map(Some).map_err(|_| DatasetError::InvalidValue {
                path: self.path.clone(),
                line: line_of(record),
                column: column.to_owned(),
                value: raw.to_owned(),
            }),
        }
    }

    fn required<T: std::str::FromStr>(
        &self,
        record: &StringRecord,
        column: &'static str,
    ) -> Result<T, DatasetError> {
        self.parse(record, column)?
            .ok_or_else(|| DatasetError::InvalidValue {
                path: self.path.clone(),
                line: line_of(record),
                column: column.to_owned(),
                value: String::new(),
            })
    }

    fn features(&self, record: &StringRecord) -> Result<FeatureVector, DatasetError> {
        let mut features = FeatureVector::default();
        for category in FeatureCategory::ALL {
            features.set(category, self.count(record, category.as_str())?);
        }
        Ok(features)
    }

    /// Reads a count cell. Counts may have been written as whole floats
    /// (`3.0`) by other tools; negative, fractional and non-finite values
    /// are rejected.
    fn count(&self, record: &StringRecord, column: &str) -> Result<u32, DatasetError> {
        let Some(raw) = self.cell(record, column).filter(|raw| !raw.is_empty()) else {
            return Ok(0);
        };
        raw.parse::<u32>()
            .ok()
            .or_else(|| raw.parse::<f64>().ok().and_then(float_count))
            .ok_or_else(|| DatasetError::InvalidValue {
                path: self.path.clone(),
                line: line_of(record),
                column: column.to_owned(),
                value: raw.to_owned(),
            })
    }

    fn point(&self, record: &StringRecord) -> Result<GridPoint, DatasetError> {
        let lat: f64 = self.required(record, "lat")?;
        let lon: f64 = self.required(record, "lon")?;
        let location = GeoPoint::new(lat, lon).map_err(|source| DatasetError::Coordinates {
            path: self.path.clone(),
            line: line_of(record),
            source,
        })?;
        let city = self.cell(record, "city").unwrap_or_default().to_owned();
        let point_id = self.cell(record, "point_id").unwrap_or_default().to_owned();
        Ok(GridPoint {
            point_id,
            city,
            location,
        })
    }

    fn scores(&self, record: &StringRecord) -> Result<ScoreSet, DatasetError> {
        let [a, c, acc, s, g] = SCORE_COLUMNS;
        Ok(ScoreSet {
            attractiveness: self.required(record, a)?,
            competition: self.required(record, c)?,
            accessibility: self.required(record, acc)?,
            suitability: self.required(record, s)?,
            global_score: self.required(record, g)?,
        })
    }
}

fn float_count(value: f64) -> Option<u32> {
    let whole = value.is_finite() && value.fract() == 0.0;
    (whole && value >= 0.0 && value <= f64::from(u32::MAX)).then(|| value as u32)
}

fn line_of(record: &StringRecord) -> u64 {
    record.position().map_or(0, csv::Position::line)
}

fn read_rows<T>(
    path: &Utf8Path,
    required: &[&'static str],
    mut parse: impl FnMut(&Columns, &StringRecord) -> Result<T, DatasetError>,
) -> Result<Vec<T>, DatasetError> {
    let file = open_utf8_file(path).map_err(|source| DatasetError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    let csv_err = |source: csv::Error| DatasetError::Csv {
        path: path.to_path_buf(),
        source,
    };
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(file);
    let columns = Columns::new(path, reader.headers().map_err(csv_err)?);
    for &column in required {
        columns.require(column)?;
    }
    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(csv_err)?;
        rows.push(parse(&columns, &record)?);
    }
    Ok(rows)
}

/// Read a grid dataset. Scored datasets read as grid datasets too; their
/// score columns are ignored.
pub fn read_grid_dataset(path: &Utf8Path) -> Result<Vec<GridRecord>, DatasetError> {
    read_rows(path, &["lat", "lon"], |columns, record| {
        Ok(GridRecord {
            point: columns.point(record)?,
            features: columns.features(record)?,
        })
    })
}

/// Read a scored dataset.
pub fn read_scored_dataset(path: &Utf8Path) -> Result<Vec<ScoredRecord>, DatasetError> {
    let mut required = vec!["lat", "lon"];
    required.extend(SCORE_COLUMNS);
    read_rows(path, &required, |columns, record| {
        Ok(ScoredRecord {
            point: columns.point(record)?,
            features: columns.features(record)?,
            scores: columns.scores(record)?,
        })
    })
}
