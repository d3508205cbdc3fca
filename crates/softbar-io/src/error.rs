//! I/O error types for softbar-io.

use std::path::PathBuf;

use softbar_sdtw::SdtwError;

/// Errors from file I/O, CSV parsing, and result serialization.
#[derive(Debug, thiserror::Error)]
pub enum IoError {
    /// Returned when the input file does not exist or is unreadable.
    #[error("file not found: {path}")]
    FileNotFound {
        /// Path that was attempted.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Returned when the CSV parser encounters a malformed record.
    #[error("CSV parse error in {path} at byte offset {offset}")]
    CsvParse {
        /// Path to the CSV file.
        path: PathBuf,
        /// Byte offset where the error occurred.
        offset: u64,
        /// Underlying CSV error.
        source: csv::Error,
    },

    /// Returned when the header has too few columns for the expected layout.
    #[error("invalid header in {path}: expected at least {min_cols} columns, found {found}")]
    InvalidHeader {
        /// Path to the CSV file.
        path: PathBuf,
        /// Minimum number of columns for this layout.
        min_cols: usize,
        /// Number of header columns found.
        found: usize,
    },

    /// Returned when the CSV file contains a header but zero data rows.
    #[error("empty dataset (no data rows) in {path}")]
    EmptyDataset {
        /// Path to the CSV file.
        path: PathBuf,
    },

    /// Returned when a data row has a different number of columns than the header.
    #[error("inconsistent row length in {path}: row {row_index} (series {series_id}) has {got} columns, expected {expected}")]
    InconsistentRowLength {
        /// Path to the CSV file.
        path: PathBuf,
        /// Zero-based row index (excluding header).
        row_index: usize,
        /// Series ID of the offending row.
        series_id: String,
        /// Expected number of columns (from header).
        expected: usize,
        /// Actual number of columns in this row.
        got: usize,
    },

    /// Returned when the series ID cell is empty.
    #[error("missing series ID in {path}: row {row_index}")]
    MissingSeriesId {
        /// Path to the CSV file.
        path: PathBuf,
        /// Zero-based row index (excluding header).
        row_index: usize,
    },

    /// Returned when a cell value is NaN, Inf, or otherwise not a finite float.
    #[error("non-finite value in {path}: row {row_index}, column {col_index}, raw value \"{raw}\"")]
    NonFiniteValue {
        /// Path to the CSV file.
        path: PathBuf,
        /// Zero-based row index (excluding header).
        row_index: usize,
        /// Zero-based column index (excluding the series ID column).
        col_index: usize,
        /// The raw string value that failed to parse.
        raw: String,
    },

    /// Returned when a wide-format row has an empty cell before a non-empty one.
    #[error("gap in {path}: row {row_index} (series {series_id}) is empty at column {col_index} but has later values")]
    GapInSeries {
        /// Path to the CSV file.
        path: PathBuf,
        /// Zero-based row index (excluding header).
        row_index: usize,
        /// Series ID of the offending row.
        series_id: String,
        /// Zero-based column index of the first empty cell.
        col_index: usize,
    },

    /// Returned when the same series ID appears on more than one wide-format row.
    #[error("duplicate series ID \"{series_id}\" in {path}: first at row {first_row}, again at row {second_row}")]
    DuplicateSeriesId {
        /// Path to the CSV file.
        path: PathBuf,
        /// The duplicated series ID.
        series_id: String,
        /// Zero-based row index of the first occurrence.
        first_row: usize,
        /// Zero-based row index of the second occurrence.
        second_row: usize,
    },

    /// Returned when a long-format step is not the next index for its series.
    #[error("step out of order in {path}: row {row_index} (series {series_id}) has step \"{raw}\", expected {expected}")]
    StepOutOfOrder {
        /// Path to the CSV file.
        path: PathBuf,
        /// Zero-based row index (excluding header).
        row_index: usize,
        /// Series ID of the offending row.
        series_id: String,
        /// The step index that was expected next.
        expected: usize,
        /// The raw step cell.
        raw: String,
    },

    /// Returned when parsed values cannot form a valid series.
    #[error("invalid series \"{series_id}\" in {path}")]
    InvalidSeries {
        /// Path to the CSV file.
        path: PathBuf,
        /// Series ID of the offending series.
        series_id: String,
        /// Underlying validation error.
        source: SdtwError,
    },

    /// Returned when the experiment name contains characters outside `[a-zA-Z0-9_-]`.
    #[error("invalid experiment name \"{name}\": must match [a-zA-Z0-9_-]+")]
    InvalidExperimentName {
        /// The invalid name.
        name: String,
    },

    /// Returned when the output directory cannot be created.
    #[error("cannot create output directory {path}")]
    OutputDirCreate {
        /// Path that was attempted.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Returned when the weights recorded with a result do not match its series.
    #[error("{weights} weights given for {series} series in {path}")]
    WeightCountMismatch {
        /// Path the artifact was destined for.
        path: PathBuf,
        /// Number of weights supplied.
        weights: usize,
        /// Number of series IDs supplied.
        series: usize,
    },

    /// Returned when a result artifact cannot be serialized.
    #[error("cannot serialize result for {path}")]
    Serialize {
        /// Path the artifact was destined for.
        path: PathBuf,
        /// Underlying serialization error.
        source: serde_json::Error,
    },

    /// Returned when a result file cannot be written.
    #[error("cannot write file {path}")]
    WriteFile {
        /// Path that was attempted.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
}
