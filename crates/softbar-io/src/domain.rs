//! Domain types for softbar-io.

use softbar_sdtw::{MultiSeries, MultiSeriesView, PointMode, TimeSeries, TimeSeriesView};

use crate::IoError;

/// A series identifier.
///
/// Wraps a non-empty string parsed from the first column of the input CSV.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SeriesId(String);

impl SeriesId {
    /// Create a new series ID from a non-empty string.
    pub(crate) fn new(id: String) -> Self {
        debug_assert!(!id.is_empty(), "series ID must not be empty");
        Self(id)
    }

    /// Return the series ID as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SeriesId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A validated experiment name for output file naming.
///
/// Must match `[a-zA-Z0-9_-]+`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExperimentName(String);

impl ExperimentName {
    /// Parse and validate an experiment name.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::InvalidExperimentName`] if the name is empty or
    /// contains characters outside `[a-zA-Z0-9_-]`.
    pub fn new(name: String) -> Result<Self, IoError> {
        if name.is_empty()
            || !name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            return Err(IoError::InvalidExperimentName { name });
        }
        Ok(Self(name))
    }

    /// Return the experiment name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ExperimentName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Series of one point kind, in dataset order.
#[derive(Debug, Clone)]
pub enum SeriesData {
    /// Scalar series from the wide layout.
    Univariate(Vec<TimeSeries>),
    /// Vector series from the long layout, all of the same dimension.
    Multivariate(Vec<MultiSeries>),
}

impl SeriesData {
    /// Return the number of series.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Univariate(s) => s.len(),
            Self::Multivariate(s) => s.len(),
        }
    }

    /// Return true if there are no series.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Return the point kind.
    #[must_use]
    pub fn mode(&self) -> PointMode {
        match self {
            Self::Univariate(_) => PointMode::Univariate,
            Self::Multivariate(_) => PointMode::Multivariate,
        }
    }

    /// Return the point dimension (1 for univariate data).
    #[must_use]
    pub fn dim(&self) -> usize {
        match self {
            Self::Univariate(_) => 1,
            Self::Multivariate(s) => s.first().map_or(0, MultiSeries::dim),
        }
    }

    /// Borrow univariate series as views, or `None` for multivariate data.
    #[must_use]
    pub fn univariate_views(&self) -> Option<Vec<TimeSeriesView<'_>>> {
        match self {
            Self::Univariate(s) => Some(s.iter().map(TimeSeries::as_view).collect()),
            Self::Multivariate(_) => None,
        }
    }

    /// Borrow multivariate series as views, or `None` for univariate data.
    #[must_use]
    pub fn multivariate_views(&self) -> Option<Vec<MultiSeriesView<'_>>> {
        match self {
            Self::Univariate(_) => None,
            Self::Multivariate(s) => Some(s.iter().map(MultiSeries::as_view).collect()),
        }
    }
}

/// A dataset of series with associated identifiers.
///
/// Produced by [`TimeSeriesReader`](crate::TimeSeriesReader) and
/// [`MultiSeriesReader`](crate::MultiSeriesReader). `ids[i]` corresponds to
/// the `i`-th series in `data`.
#[derive(Debug)]
pub struct Dataset {
    /// Series identifiers in insertion order.
    pub ids: Vec<SeriesId>,
    /// Validated series in the same order as `ids`.
    pub data: SeriesData,
}

impl Dataset {
    /// Return the number of series.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Return true if the dataset holds no series.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Return the position of the series with the given ID.
    #[must_use]
    pub fn position(&self, id: &str) -> Option<usize> {
        self.ids.iter().position(|s| s.as_str() == id)
    }
}
