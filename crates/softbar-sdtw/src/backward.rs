//! Backward soft-DTW pass: alignment responsibilities, two rows at a time.
//!
//! Given the forward tables in a [`Workspace`], row `i` of the responsibility
//! table is
//!
//! ```text
//! a = exp((R(i+1, j)   - R(i, j) - D(i, j-1)) / g)
//! b = exp((R(i, j+1)   - R(i, j) - D(i-1, j)) / g)
//! c = exp((R(i+1, j+1) - R(i, j) - D(i, j))   / g)
//! E(i, j) = a E(i+1, j) + b E(i, j+1) + c E(i+1, j+1)
//! ```
//!
//! for `j = n..=1`, and rows run `i = m..=1`. `E(i, j)` is the Gibbs-weighted
//! probability that centroid point `i` is aligned with series point `j`.
//!
//! For a well-formed forward table every exponent is at most zero, so the
//! recurrence cannot overflow; it relies on the forward pass for stability.

use crate::error::SdtwError;
use crate::table::Table;
use crate::workspace::{ResponsibilityRows, Workspace};

/// Run the backward recurrence for a centroid of length `m` and a series of length `n`.
///
/// The forward pass for this pair must already have filled `ws`. Seeds the
/// boundary with [`Workspace::reset_for_series`], then computes rows `m` down
/// to `1`, handing each finished row to `visit(i, row)` before the next row
/// overwrites its slot. `row[j]` holds `E(i, j)` for `1 <= j <= n`; `row[0]`
/// and `row[n+1..]` are padding.
///
/// `gamma` is not validated here; a non-positive value yields non-finite rows.
///
/// # Errors
///
/// Returns [`SdtwError::WorkspaceTooSmall`] before any buffer write if `ws`
/// cannot hold an `m x n` problem.
pub fn backward_pass<F>(
    ws: &mut Workspace,
    m: usize,
    n: usize,
    gamma: f64,
    mut visit: F,
) -> Result<(), SdtwError>
where
    F: FnMut(usize, &[f64]),
{
    ws.reset_for_series(m, n)?;
    for i in (1..=m).rev() {
        update_row(i, n, gamma, &ws.cost, &ws.dist, &mut ws.resp);
        visit(i, ws.resp.row(i));
        if i == m {
            ws.clear_seed(m, n);
        }
    }
    Ok(())
}

fn update_row(
    i: usize,
    n: usize,
    gamma: f64,
    cost: &Table,
    dist: &Table,
    rows: &mut ResponsibilityRows,
) {
    let (current, next) = rows.current_and_next(i);
    for j in (1..=n).rev() {
        let r = cost[(i, j)];
        let a = ((cost[(i + 1, j)] - r - dist[(i, j - 1)]) / gamma).exp();
        let b = ((cost[(i, j + 1)] - r - dist[(i - 1, j)]) / gamma).exp();
        let c = ((cost[(i + 1, j + 1)] - r - dist[(i, j)]) / gamma).exp();
        current[j] = a * next[j] + b * current[j + 1] + c * next[j + 1];
    }
}
