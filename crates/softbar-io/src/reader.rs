//! CSV series readers with full input validation.

use std::collections::HashMap;
use std::fs::File;
use std::path::{Path, PathBuf};

use softbar_sdtw::{MultiSeries, TimeSeries};
use tracing::{debug, info, instrument};

use crate::IoError;
use crate::domain::{Dataset, SeriesData, SeriesId};

/// Reads univariate series from a wide CSV file.
///
/// Expected CSV format:
/// - Header row required (first column is the series ID, remaining are positional time steps)
/// - `series_id,t0,t1,...,tn`
/// - One row per series, every row has as many columns as the header
/// - Trailing cells may be left empty, so series can differ in length
///
/// # Errors
///
/// | Variant | Condition |
/// |---|---|
/// | [`IoError::FileNotFound`] | File doesn't exist or is unreadable |
/// | [`IoError::CsvParse`] | Malformed CSV record |
/// | [`IoError::InvalidHeader`] | Header has no time step column |
/// | [`IoError::EmptyDataset`] | Zero data rows after header |
/// | [`IoError::InconsistentRowLength`] | Row has different column count than header |
/// | [`IoError::MissingSeriesId`] | First cell of a row is empty |
/// | [`IoError::NonFiniteValue`] | Cell is NaN, Inf, or unparseable float |
/// | [`IoError::GapInSeries`] | An empty cell is followed by a value |
/// | [`IoError::DuplicateSeriesId`] | Same series ID appears twice |
/// | [`IoError::InvalidSeries`] | A row has no values at all |
pub struct TimeSeriesReader {
    path: PathBuf,
}

impl TimeSeriesReader {
    /// Create a new reader for the given CSV file path.
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
        }
    }

    /// Read and validate the CSV file, returning a univariate [`Dataset`].
    #[instrument(skip(self), fields(path = %self.path.display()))]
    pub fn read(&self) -> Result<Dataset, IoError> {
        let mut rdr = open_csv(&self.path)?;
        let expected_cols = header_len(&self.path, &mut rdr, 2)?;

        let mut ids = Vec::new();
        let mut series = Vec::new();
        let mut seen: HashMap<String, usize> = HashMap::new();

        for (row_index, result) in rdr.records().enumerate() {
            let record = result.map_err(|e| csv_error(&self.path, e))?;
            let series_id = row_id(&self.path, &record, row_index, expected_cols)?;

            if let Some(&first_row) = seen.get(&series_id) {
                return Err(IoError::DuplicateSeriesId {
                    path: self.path.clone(),
                    series_id,
                    first_row,
                    second_row: row_index,
                });
            }
            seen.insert(series_id.clone(), row_index);

            // Values end at the first empty cell; anything after it must be empty too.
            let cells: Vec<&str> = record.iter().skip(1).collect();
            let len = cells.iter().position(|c| c.is_empty()).unwrap_or(cells.len());
            if cells[len..].iter().any(|c| !c.is_empty()) {
                return Err(IoError::GapInSeries {
                    path: self.path.clone(),
                    row_index,
                    series_id,
                    col_index: len,
                });
            }

            let values = cells[..len]
                .iter()
                .enumerate()
                .map(|(col_index, raw)| parse_value(&self.path, row_index, col_index, raw))
                .collect::<Result<Vec<f64>, IoError>>()?;

            let ts = TimeSeries::new(values).map_err(|source| IoError::InvalidSeries {
                path: self.path.clone(),
                series_id: series_id.clone(),
                source,
            })?;

            ids.push(SeriesId::new(series_id));
            series.push(ts);
        }

        if ids.is_empty() {
            return Err(IoError::EmptyDataset {
                path: self.path.clone(),
            });
        }

        info!(
            n_series = ids.len(),
            max_len = series.iter().map(TimeSeries::len).max().unwrap_or(0),
            "dataset loaded"
        );

        Ok(Dataset {
            ids,
            data: SeriesData::Univariate(series),
        })
    }
}

/// Reads multivariate series from a long CSV file.
///
/// Expected CSV format:
/// - Header row required: `series_id,step,x0,x1,...,xd`
/// - One row per time step; the point dimension is the number of `x` columns
/// - Rows of one series need not be contiguous, but their steps must run
///   `0, 1, 2, ...` in file order
/// - Series are returned in order of first appearance
///
/// # Errors
///
/// | Variant | Condition |
/// |---|---|
/// | [`IoError::FileNotFound`] | File doesn't exist or is unreadable |
/// | [`IoError::CsvParse`] | Malformed CSV record |
/// | [`IoError::InvalidHeader`] | Header has no coordinate column |
/// | [`IoError::EmptyDataset`] | Zero data rows after header |
/// | [`IoError::InconsistentRowLength`] | Row has different column count than header |
/// | [`IoError::MissingSeriesId`] | First cell of a row is empty |
/// | [`IoError::StepOutOfOrder`] | Step is not the next index for its series |
/// | [`IoError::NonFiniteValue`] | Coordinate is NaN, Inf, or unparseable float |
pub struct MultiSeriesReader {
    path: PathBuf,
}

impl MultiSeriesReader {
    /// Create a new reader for the given CSV file path.
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
        }
    }

    /// Read and validate the CSV file, returning a multivariate [`Dataset`].
    #[instrument(skip(self), fields(path = %self.path.display()))]
    pub fn read(&self) -> Result<Dataset, IoError> {
        let mut rdr = open_csv(&self.path)?;
        let expected_cols = header_len(&self.path, &mut rdr, 3)?;
        let dim = expected_cols - 2;

        let mut order: Vec<String> = Vec::new();
        let mut values: HashMap<String, Vec<f64>> = HashMap::new();

        for (row_index, result) in rdr.records().enumerate() {
            let record = result.map_err(|e| csv_error(&self.path, e))?;
            let series_id = row_id(&self.path, &record, row_index, expected_cols)?;

            if !values.contains_key(&series_id) {
                order.push(series_id.clone());
            }
            let slot = values.entry(series_id.clone()).or_default();

            let expected = slot.len() / dim;
            let raw_step = record.get(1).unwrap_or("");
            if raw_step.parse::<usize>().ok() != Some(expected) {
                return Err(IoError::StepOutOfOrder {
                    path: self.path.clone(),
                    row_index,
                    series_id,
                    expected,
                    raw: raw_step.to_string(),
                });
            }

            for col_index in 2..expected_cols {
                let raw = record.get(col_index).unwrap_or("");
                slot.push(parse_value(&self.path, row_index, col_index - 1, raw)?);
            }
        }

        if order.is_empty() {
            return Err(IoError::EmptyDataset {
                path: self.path.clone(),
            });
        }

        let mut ids = Vec::with_capacity(order.len());
        let mut series = Vec::with_capacity(order.len());
        for series_id in order {
            let flat = values.remove(&series_id).unwrap_or_default();
            let ms = MultiSeries::new(flat, dim).map_err(|source| IoError::InvalidSeries {
                path: self.path.clone(),
                series_id: series_id.clone(),
                source,
            })?;
            ids.push(SeriesId::new(series_id));
            series.push(ms);
        }

        info!(n_series = ids.len(), dim, "dataset loaded");

        Ok(Dataset {
            ids,
            data: SeriesData::Multivariate(series),
        })
    }
}

fn open_csv(path: &Path) -> Result<csv::Reader<File>, IoError> {
    let file = File::open(path).map_err(|e| IoError::FileNotFound {
        path: path.to_path_buf(),
        source: e,
    })?;
    // flexible(true) allows rows with varying column counts so that our own
    // InconsistentRowLength check fires instead of a low-level CsvParse error.
    Ok(csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(file))
}

fn csv_error(path: &Path, e: csv::Error) -> IoError {
    IoError::CsvParse {
        path: path.to_path_buf(),
        offset: e.position().map_or(0, |p| p.byte()),
        source: e,
    }
}

fn header_len(path: &Path, rdr: &mut csv::Reader<File>, min_cols: usize) -> Result<usize, IoError> {
    let header = rdr.headers().map_err(|e| csv_error(path, e))?;
    let found = header.len();
    if found < min_cols {
        return Err(IoError::InvalidHeader {
            path: path.to_path_buf(),
            min_cols,
            found,
        });
    }
    debug!(expected_cols = found, "read CSV header");
    Ok(found)
}

/// Check the column count of a row and return its series ID.
fn row_id(
    path: &Path,
    record: &csv::StringRecord,
    row_index: usize,
    expected_cols: usize,
) -> Result<String, IoError> {
    let series_id = record.get(0).unwrap_or("").to_string();
    if record.len() != expected_cols {
        return Err(IoError::InconsistentRowLength {
            path: path.to_path_buf(),
            row_index,
            series_id,
            expected: expected_cols,
            got: record.len(),
        });
    }
    if series_id.is_empty() {
        return Err(IoError::MissingSeriesId {
            path: path.to_path_buf(),
            row_index,
        });
    }
    Ok(series_id)
}

fn parse_value(path: &Path, row_index: usize, col_index: usize, raw: &str) -> Result<f64, IoError> {
    match raw.parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(value),
        _ => Err(IoError::NonFiniteValue {
            path: path.to_path_buf(),
            row_index,
            col_index,
            raw: raw.to_string(),
        }),
    }
}
