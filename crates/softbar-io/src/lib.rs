//! File I/O, validation, and serialization for the softbar pipeline.

mod domain;
mod error;
mod reader;
mod writer;

pub use domain::{Dataset, ExperimentName, SeriesData, SeriesId};
pub use error::IoError;
pub use reader::{MultiSeriesReader, TimeSeriesReader};
pub use writer::ResultWriter;
