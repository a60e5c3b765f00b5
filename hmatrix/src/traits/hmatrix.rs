//! Hierarchical matrix traits
use rlst::RlstScalar;

use super::types::Result;

/// Interface exposed to iterative solvers sitting on top of a distributed hierarchical matrix.
///
/// Vectors come in two orderings. The global product consumes and returns vectors in the original
/// numbering of sources and targets, whereas the local product works in cluster ordering, reading the
/// full permuted input and writing only this worker's contiguous slice of the output.
pub trait DistributedOperator {
    /// Scalar type
    type Scalar: RlstScalar;

    /// Number of rows, equal to the number of target points.
    fn n_rows(&self) -> usize;

    /// Number of columns, equal to the number of source points.
    fn n_cols(&self) -> usize;

    /// Start of this worker's row range in cluster ordering.
    fn local_offset(&self) -> usize;

    /// Length of this worker's row range in cluster ordering.
    fn local_size(&self) -> usize;

    /// Local product, `y_local = A[local rows, :] x_cluster`.
    ///
    /// # Arguments
    /// * `x_cluster` - Input of length `n_cols`, in source cluster ordering.
    /// * `y_local` - Output of length `local_size`, overwritten.
    fn local_matvec(&self, x_cluster: &[Self::Scalar], y_local: &mut [Self::Scalar]) -> Result<()>;

    /// Local product with `n_vecs` column-major right hand sides.
    ///
    /// # Arguments
    /// * `x_cluster` - Input of shape `[n_cols, n_vecs]`, in source cluster ordering.
    /// * `n_vecs` - Number of right hand sides.
    /// * `y_local` - Output of shape `[local_size, n_vecs]`, overwritten.
    fn local_matmat(
        &self,
        x_cluster: &[Self::Scalar],
        n_vecs: usize,
        y_local: &mut [Self::Scalar],
    ) -> Result<()>;

    /// Global product, `y = A x` in original ordering. Collective over all workers, each of which
    /// receives the full result.
    fn matvec(&self, x: &[Self::Scalar]) -> Result<Vec<Self::Scalar>>;

    /// Global product with `n_vecs` column-major right hand sides, collective over all workers.
    fn matmat(&self, x: &[Self::Scalar], n_vecs: usize) -> Result<Vec<Self::Scalar>>;

    /// Permute a vector from original source ordering into source cluster ordering.
    fn source_to_cluster(&self, x: &[Self::Scalar], x_cluster: &mut [Self::Scalar]) -> Result<()>;

    /// Permute a vector from target cluster ordering back into original target ordering.
    fn cluster_to_target(&self, y_cluster: &[Self::Scalar], y: &mut [Self::Scalar]) -> Result<()>;
}
