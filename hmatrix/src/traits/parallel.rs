//! Collective communication between workers
use rlst::RlstScalar;

use super::types::Result;

/// The collective operations required by distributed hierarchical matrices.
///
/// A single process implementation is provided by [`crate::SingleProcess`], MPI communicators implement
/// this trait when the `mpi` feature is enabled.
pub trait Collective<Scalar>
where
    Scalar: RlstScalar,
{
    /// Rank of this worker
    fn rank(&self) -> usize;

    /// Number of workers
    fn size(&self) -> usize;

    /// Gather variable sized contributions from all workers into `result` on every worker, in rank order.
    ///
    /// # Arguments
    /// * `local` - This worker's contribution, of length `counts[rank]`.
    /// * `counts` - Contribution length of each worker.
    /// * `result` - Output buffer of length `sum(counts)`.
    fn all_gather_varcount(&self, local: &[Scalar], counts: &[usize], result: &mut [Scalar])
        -> Result<()>;

    /// Element-wise sum of `local` over all workers, used for diagnostics.
    fn all_reduce_sum(&self, local: &[f64], result: &mut [f64]) -> Result<()>;

    /// Element-wise maximum of `local` over all workers, used for diagnostics.
    fn all_reduce_max(&self, local: &[f64], result: &mut [f64]) -> Result<()>;
}
