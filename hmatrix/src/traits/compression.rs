//! Low rank compression of matrix blocks
use rlst::RlstScalar;

use crate::linalg::types::LowRankFactors;

use super::generator::Generator;

/// Interface for low rank compression algorithms applied to admissible blocks.
pub trait LowRankCompressor<Scalar>
where
    Scalar: RlstScalar,
{
    /// Compute factors `U` (m x k) and `V` (k x n) with `U V` approximating `A[rows, cols]` to relative
    /// Frobenius accuracy `epsilon`.
    ///
    /// Returns `None` if the block isn't worth compressing, i.e. if the required rank `k` satisfies
    /// `2k > min(m, n)`. The caller is then expected to store the block densely.
    ///
    /// # Arguments
    /// * `generator` - Entry access for the full matrix.
    /// * `rows` - Row indices of the block in original numbering.
    /// * `cols` - Column indices of the block in original numbering.
    /// * `epsilon` - Relative compression tolerance.
    fn compress<G>(
        &self,
        generator: &G,
        rows: &[usize],
        cols: &[usize],
        epsilon: Scalar::Real,
    ) -> Option<LowRankFactors<Scalar>>
    where
        G: Generator<Scalar = Scalar>;
}
