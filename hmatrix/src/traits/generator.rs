//! Matrix entry generators
use rlst::RlstScalar;

/// Lazy access to the entries of a dense matrix.
///
/// Indices are always given in the original (user) numbering of targets and sources. Assembly calls
/// generators from several threads at once, so implementations used with the builder must be `Sync`.
pub trait Generator {
    /// Scalar type
    type Scalar: RlstScalar;

    /// Number of rows (targets)
    fn n_rows(&self) -> usize;

    /// Number of columns (sources)
    fn n_cols(&self) -> usize;

    /// Write the sub-block `A[rows, cols]` into `result` in column-major order, so that entry
    /// `(i, j)` lands at `result[i + j * rows.len()]`.
    ///
    /// # Arguments
    /// * `rows` - Row indices in original numbering.
    /// * `cols` - Column indices in original numbering.
    /// * `result` - Output buffer of length `rows.len() * cols.len()`.
    fn copy_submatrix(&self, rows: &[usize], cols: &[usize], result: &mut [Self::Scalar]);
}
