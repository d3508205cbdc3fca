//! Reusable scratch buffers for the forward and backward soft-DTW passes.
//!
//! For a centroid of length `m` and a series of length `n` the buffers hold:
//!
//! | Buffer | Shape | Interior | Boundary after [`Workspace::reset_for_series`] |
//! |---|---|---|---|
//! | cost `R` | `(m+2) x (n+2)` | `R(1..=m, 1..=n)` from the forward pass | `R(i, n+1) = -inf` for `1 <= i <= m`, `R(m+1, j) = -inf` for `1 <= j <= n`, `R(m+1, n+1) = R(m, n)` |
//! | distance `D` | `(m+1) x (n+1)` | `D(0..m, 0..n)` squared distances | `D(i, n) = 0` for all `i`, `D(m, j) = 0` for all `j` |
//! | responsibility `E` | `2 x (n+2)` | rows selected by parity | all zero except the seed `E(m+1, n+1) = 1` |
//!
//! Buffers are sized for the largest problem of a batch; every series re-seeds
//! the boundary for its own `n`, so nothing left behind by a longer series is
//! ever read.

use crate::error::SdtwError;
use crate::table::Table;

/// Index of the padding row that sits past the last centroid point.
#[inline]
#[must_use]
pub const fn exit_row(m: usize) -> usize {
    m + 1
}

/// Index of the padding column that sits past the last series point.
#[inline]
#[must_use]
pub const fn exit_col(n: usize) -> usize {
    n + 1
}

/// Two live rows of the responsibility table, addressed by logical row index.
///
/// Logical row `i` lives in slot `i % 2`. While row `i` is being computed it
/// is the *current* row and row `i + 1` (computed one step earlier) is the
/// *next* row.
#[derive(Debug, Clone, PartialEq)]
pub struct ResponsibilityRows {
    slots: [Vec<f64>; 2],
}

impl ResponsibilityRows {
    /// Create two zeroed rows of `width` cells.
    #[must_use]
    pub fn new(width: usize) -> Self {
        Self {
            slots: [vec![0.0; width], vec![0.0; width]],
        }
    }

    /// Number of cells per row.
    #[must_use]
    pub fn width(&self) -> usize {
        self.slots[0].len()
    }

    /// Zero both rows.
    pub fn reset(&mut self) {
        for slot in &mut self.slots {
            slot.fill(0.0);
        }
    }

    /// Read `E(i, j)` from the slot currently holding logical row `i`.
    #[must_use]
    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.slots[i % 2][j]
    }

    /// Write `E(i, j)` into the slot for logical row `i`.
    pub fn set(&mut self, i: usize, j: usize, value: f64) {
        self.slots[i % 2][j] = value;
    }

    /// Borrow logical row `i`.
    #[must_use]
    pub fn row(&self, i: usize) -> &[f64] {
        &self.slots[i % 2]
    }

    /// Split into `(current, next)`: row `i` mutably and row `i + 1` shared.
    pub fn current_and_next(&mut self, i: usize) -> (&mut [f64], &[f64]) {
        let [even, odd] = &mut self.slots;
        if i % 2 == 0 {
            (even.as_mut_slice(), odd.as_slice())
        } else {
            (odd.as_mut_slice(), even.as_slice())
        }
    }
}

/// Scratch buffers owned by one batch evaluation and reused across its series.
#[derive(Debug, Clone)]
pub struct Workspace {
    m: usize,
    n_max: usize,
    pub(crate) cost: Table,
    pub(crate) dist: Table,
    pub(crate) resp: ResponsibilityRows,
}

impl Workspace {
    /// Allocate buffers for a centroid of length `m` and series of length up to `n_max`.
    #[must_use]
    pub fn new(m: usize, n_max: usize) -> Self {
        Self {
            m,
            n_max,
            cost: Table::new(m + 2, n_max + 2, 0.0),
            dist: Table::new(m + 1, n_max + 1, 0.0),
            resp: ResponsibilityRows::new(n_max + 2),
        }
    }

    /// Centroid length this workspace can hold.
    #[must_use]
    pub fn max_centroid_len(&self) -> usize {
        self.m
    }

    /// Longest series length this workspace can hold.
    #[must_use]
    pub fn max_series_len(&self) -> usize {
        self.n_max
    }

    /// Return true if a centroid of length `m` and a series of length `n` fit.
    #[must_use]
    pub fn fits(&self, m: usize, n: usize) -> bool {
        m <= self.m && n <= self.n_max
    }

    /// Check that a centroid of length `m` and a series of length `n` fit.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`SdtwError::WorkspaceTooSmall`] | `m` or `n` exceeds the allocated capacity |
    pub fn check(&self, m: usize, n: usize) -> Result<(), SdtwError> {
        if self.fits(m, n) {
            Ok(())
        } else {
            Err(SdtwError::WorkspaceTooSmall {
                m: self.m,
                n_max: self.n_max,
                need_m: m,
                need_n: n,
            })
        }
    }

    /// Grow the buffers so that `m` and `n_max` fit. Never shrinks.
    pub fn reserve(&mut self, m: usize, n_max: usize) {
        if !self.fits(m, n_max) {
            *self = Self::new(self.m.max(m), self.n_max.max(n_max));
        }
    }

    /// Borrow the cost table `R`.
    #[must_use]
    pub fn cost(&self) -> &Table {
        &self.cost
    }

    /// Borrow the distance table `D`.
    #[must_use]
    pub fn dist(&self) -> &Table {
        &self.dist
    }

    /// Borrow the two live responsibility rows.
    #[must_use]
    pub fn responsibility(&self) -> &ResponsibilityRows {
        &self.resp
    }

    /// Seed the padding cells for a centroid of length `m` and a series of length `n`.
    ///
    /// Must run after the forward pass for this pair and before the backward
    /// pass. Establishes the boundary column of the table in the module docs.
    ///
    /// # Errors
    ///
    /// Returns [`SdtwError::WorkspaceTooSmall`] if the pair does not fit; no
    /// buffer is touched in that case.
    pub fn reset_for_series(&mut self, m: usize, n: usize) -> Result<(), SdtwError> {
        self.check(m, n)?;
        let (row_out, col_out) = (exit_row(m), exit_col(n));

        for i in 0..=m {
            self.dist[(i, n)] = 0.0;
        }
        for j in 0..=n {
            self.dist[(m, j)] = 0.0;
        }
        for i in 1..=m {
            self.cost[(i, col_out)] = f64::NEG_INFINITY;
        }
        for j in 1..=n {
            self.cost[(row_out, j)] = f64::NEG_INFINITY;
        }
        self.cost[(row_out, col_out)] = self.cost[(m, n)];

        self.resp.reset();
        self.resp.set(row_out, col_out, 1.0);
        Ok(())
    }

    /// Value of the one-shot seed cell `E(m+1, n+1)`.
    #[must_use]
    pub fn seed_cell(&self, m: usize, n: usize) -> f64 {
        self.resp.get(exit_row(m), exit_col(n))
    }

    /// Clear the one-shot seed cell once row `m` has been computed.
    pub(crate) fn clear_seed(&mut self, m: usize, n: usize) {
        self.resp.set(exit_row(m), exit_col(n), 0.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shapes_follow_capacity() {
        let ws = Workspace::new(3, 5);
        assert_eq!((ws.cost().rows(), ws.cost().cols()), (5, 7));
        assert_eq!((ws.dist().rows(), ws.dist().cols()), (4, 6));
        assert_eq!(ws.responsibility().width(), 7);
    }

    #[test]
    fn check_rejects_oversized() {
        let ws = Workspace::new(3, 5);
        assert!(ws.check(3, 5).is_ok());
        assert!(ws.check(2, 1).is_ok());
        assert!(matches!(
            ws.check(3, 6),
            Err(SdtwError::WorkspaceTooSmall { m: 3, n_max: 5, need_m: 3, need_n: 6 })
        ));
        assert!(ws.check(4, 5).is_err());
    }

    #[test]
    fn reserve_only_grows() {
        let mut ws = Workspace::new(3, 5);
        ws.reserve(2, 2);
        assert_eq!((ws.max_centroid_len(), ws.max_series_len()), (3, 5));
        ws.reserve(4, 2);
        assert_eq!((ws.max_centroid_len(), ws.max_series_len()), (4, 5));
    }

    #[test]
    fn reset_seeds_boundary_for_short_series() {
        let mut ws = Workspace::new(2, 4);
        ws.cost.fill(7.0);
        ws.dist.fill(7.0);
        ws.cost[(2, 2)] = 3.5;
        ws.resp.set(0, 1, 9.0);

        ws.reset_for_series(2, 2).unwrap();

        for i in 0..=2 {
            assert_eq!(ws.dist()[(i, 2)], 0.0);
        }
        for j in 0..=2 {
            assert_eq!(ws.dist()[(2, j)], 0.0);
        }
        for i in 1..=2 {
            assert_eq!(ws.cost()[(i, 3)], f64::NEG_INFINITY);
        }
        for j in 1..=2 {
            assert_eq!(ws.cost()[(3, j)], f64::NEG_INFINITY);
        }
        assert_eq!(ws.cost()[(3, 3)], 3.5);
        // Interior is untouched.
        assert_eq!(ws.dist()[(1, 1)], 7.0);

        assert_eq!(ws.seed_cell(2, 2), 1.0);
        assert_eq!(ws.responsibility().get(0, 1), 0.0);
        let total: f64 = (0..2)
            .flat_map(|r| ws.responsibility().row(r).to_vec())
            .sum();
        assert_eq!(total, 1.0);
    }

    #[test]
    fn reset_rejects_series_longer_than_capacity() {
        let mut ws = Workspace::new(2, 2);
        ws.dist.fill(7.0);
        let before = ws.dist().clone();

        assert!(matches!(
            ws.reset_for_series(2, 3),
            Err(SdtwError::WorkspaceTooSmall { need_n: 3, .. })
        ));
        assert_eq!(ws.dist(), &before);
    }

    #[test]
    fn current_and_next_follow_parity() {
        let mut rows = ResponsibilityRows::new(3);
        rows.set(5, 1, 2.0);
        {
            let (current, next) = rows.current_and_next(4);
            assert_eq!(next[1], 2.0);
            current[2] = 8.0;
        }
        assert_eq!(rows.get(4, 2), 8.0);
        assert_eq!(rows.get(6, 2), 8.0);
        let (_, next) = rows.current_and_next(3);
        assert_eq!(next[2], 8.0);
    }

    #[test]
    fn boundary_index_helpers() {
        assert_eq!(exit_row(3), 4);
        assert_eq!(exit_col(0), 1);
    }
}
