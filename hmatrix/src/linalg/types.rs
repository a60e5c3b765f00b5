//! Dense and low rank block storage.
use rlst::{
    empty_array, rlst_dynamic_array2, Array, BaseArray, MultIntoResize, RlstScalar, Shape,
    VectorContainer,
};

/// Alias for a dynamically allocated, column major rlst matrix
pub type Matrix<T> = Array<T, BaseArray<T, VectorContainer<T>, 2>, 2>;

/// Factors of a low rank approximation `U V` of an m x n block.
pub struct LowRankFactors<Scalar>
where
    Scalar: RlstScalar,
{
    /// Left factor, of shape [m, k]
    pub u: Matrix<Scalar>,

    /// Right factor, of shape [k, n]
    pub v: Matrix<Scalar>,
}

impl<Scalar> LowRankFactors<Scalar>
where
    Scalar: RlstScalar,
{
    /// Assemble factors from the column vectors of `U` and the row vectors of `V`.
    ///
    /// # Arguments
    /// * `n_rows` - Number of rows m of the approximated block.
    /// * `n_cols` - Number of columns n of the approximated block.
    /// * `us` - Columns of `U`, each of length m.
    /// * `vs` - Rows of `V`, each of length n.
    pub fn from_terms(
        n_rows: usize,
        n_cols: usize,
        us: &[Vec<Scalar>],
        vs: &[Vec<Scalar>],
    ) -> Self {
        let rank = us.len();
        let mut u = rlst_dynamic_array2!(Scalar, [n_rows, rank]);
        let mut v = rlst_dynamic_array2!(Scalar, [rank, n_cols]);

        for (l, column) in us.iter().enumerate() {
            for (i, &value) in column.iter().enumerate() {
                u[[i, l]] = value;
            }
        }

        for (l, row) in vs.iter().enumerate() {
            for (j, &value) in row.iter().enumerate() {
                v[[l, j]] = value;
            }
        }

        Self { u, v }
    }

    /// Number of rows of the approximated block
    pub fn n_rows(&self) -> usize {
        self.u.shape()[0]
    }

    /// Number of columns of the approximated block
    pub fn n_cols(&self) -> usize {
        self.v.shape()[1]
    }

    /// Rank of the approximation
    pub fn rank(&self) -> usize {
        self.u.shape()[1]
    }

    /// Number of scalars stored, `k (m + n)`
    pub fn n_entries(&self) -> usize {
        self.rank() * (self.n_rows() + self.n_cols())
    }

    /// Reconstruct the dense m x n block `U V`.
    pub fn to_dense(&self) -> Matrix<Scalar> {
        if self.rank() == 0 {
            return rlst_dynamic_array2!(Scalar, [self.n_rows(), self.n_cols()]);
        }
        empty_array::<Scalar, 2>().simple_mult_into_resize(self.u.view(), self.v.view())
    }

    /// Compute `U (V x)` for a block `x` of shape [n, n_vecs].
    pub fn apply(&self, x: &Matrix<Scalar>) -> Matrix<Scalar> {
        if self.rank() == 0 {
            return rlst_dynamic_array2!(Scalar, [self.n_rows(), x.shape()[1]]);
        }
        empty_array::<Scalar, 2>().simple_mult_into_resize(
            self.u.view(),
            empty_array::<Scalar, 2>().simple_mult_into_resize(self.v.view(), x.view()),
        )
    }
}
