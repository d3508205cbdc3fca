//! Soft-DTW barycenter loss, gradient, and centroid refinement.
//!
//! Pure math library with no I/O. Evaluates the weighted soft-DTW objective
//! between a candidate centroid and a batch of series, together with its
//! gradient with respect to every centroid coordinate. The backward pass
//! keeps only two rows of the responsibility table alive, so memory grows
//! with `m * n_max` for the forward tables and `n_max` for the gradient
//! machinery. Scalar and vector points share one generic code path.

mod backward;
mod batch;
mod centroid;
mod dispatch;
mod error;
mod forward;
mod gradient;
mod point;
mod series;
mod table;
mod workspace;

pub use backward::backward_pass;
pub use batch::{BarycenterLoss, SoftDtwBarycenter};
pub use centroid::{CentroidInit, SdtwCentroidConfig, SdtwCentroidResult};
pub use dispatch::{PointMode, SeriesBatch};
pub use error::{CentroidError, SdtwError};
pub use forward::{ForwardAligner, SoftDtw, soft_dtw, soft_dtw_divergence};
pub use gradient::{Gradient, GradientAccumulator};
pub use point::Point;
pub use series::{FromValues, MultiSeries, MultiSeriesView, Sequence, TimeSeries, TimeSeriesView};
pub use table::Table;
pub use workspace::{ResponsibilityRows, Workspace, exit_col, exit_row};
