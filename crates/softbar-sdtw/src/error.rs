//! Error types for soft-DTW evaluation and centroid refinement.

/// Errors from sequence validation and soft-DTW barycenter evaluation.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SdtwError {
    /// Returned when an empty slice is provided as a time series.
    #[error("time series must be non-empty")]
    EmptySeries,

    /// Returned when a time series contains NaN, infinity, or negative infinity.
    #[error("time series contains non-finite value at index {index}")]
    NonFiniteValue {
        /// Position of the first non-finite value found (flat index).
        index: usize,
    },

    /// Returned when a multivariate series is built with `dim == 0`.
    #[error("point dimension must be at least 1")]
    ZeroDimension,

    /// Returned when flat multivariate data is not a whole number of points.
    #[error("{len} values cannot be split into points of dimension {dim}")]
    RaggedValues {
        /// Number of flat values provided.
        len: usize,
        /// Requested point dimension.
        dim: usize,
    },

    /// Returned when the smoothing parameter is not positive and finite.
    #[error("gamma must be positive and finite, got {0}")]
    InvalidGamma(f64),

    /// Returned when a batch contains no series.
    #[error("batch must contain at least one series")]
    EmptyBatch,

    /// Returned when a series' point dimension differs from the centroid's.
    #[error("series {series} has point dimension {found}, centroid has {expected}")]
    DimensionMismatch {
        /// Index of the offending series in the batch.
        series: usize,
        /// Centroid point dimension.
        expected: usize,
        /// Series point dimension.
        found: usize,
    },

    /// Returned when the number of weights differs from the number of series.
    #[error("got {weights} weights for {series} series")]
    WeightCountMismatch {
        /// Number of weights provided.
        weights: usize,
        /// Number of series in the batch.
        series: usize,
    },

    /// Returned when a weight is negative or non-finite.
    #[error("weight {index} must be non-negative and finite, got {weight}")]
    NegativeWeight {
        /// Index of the offending weight.
        index: usize,
        /// The rejected value.
        weight: f64,
    },

    /// Returned when a scratch workspace cannot hold the requested lengths.
    #[error(
        "workspace sized for centroid length {m} and series length {n_max} \
         cannot hold centroid length {need_m} and series length {need_n}"
    )]
    WorkspaceTooSmall {
        /// Centroid length the workspace was sized for.
        m: usize,
        /// Longest series length the workspace was sized for.
        n_max: usize,
        /// Centroid length requested.
        need_m: usize,
        /// Series length requested.
        need_n: usize,
    },
}

/// Errors from soft-DTW centroid refinement.
#[derive(Debug, thiserror::Error)]
pub enum CentroidError {
    /// Returned when `average()` is called with an empty slice of series.
    #[error("cannot compute barycenter of an empty cluster")]
    EmptyCluster,

    /// Returned when mean initialization is requested for series of different lengths.
    #[error("mean initialization needs equal lengths, series {index} has {found} points, expected {expected}")]
    UnequalLengths {
        /// Index of the first series whose length differs.
        index: usize,
        /// Length of the first series.
        expected: usize,
        /// Length of the offending series.
        found: usize,
    },

    /// Returned when caller-supplied initial values are not a whole number of points.
    #[error("initial centroid has {len} values, not a multiple of point dimension {dim}")]
    InitMismatch {
        /// Series point dimension.
        dim: usize,
        /// Number of initial values supplied.
        len: usize,
    },

    /// Wraps a soft-DTW error encountered during evaluation.
    #[error("soft-DTW error during centroid refinement: {0}")]
    Sdtw(#[from] SdtwError),
}
