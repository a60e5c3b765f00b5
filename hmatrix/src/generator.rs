//! # Matrix Generators
//!
//! Implementations of [`Generator`] for entries given by a closure, and for kernel matrices built from
//! [`green_kernels`] kernels evaluated between target and source points.
use std::marker::PhantomData;

use green_kernels::{traits::Kernel, types::EvalType};
use rlst::RlstScalar;

use crate::traits::generator::Generator;
use crate::traits::types::{HMatrixError, Result};
use crate::tree::constants::DIM;

/// Matrix entries given by a closure `(i, j) -> A[i, j]`.
pub struct FnGenerator<Scalar, F>
where
    Scalar: RlstScalar,
    F: Fn(usize, usize) -> Scalar,
{
    n_rows: usize,
    n_cols: usize,
    entry: F,
    phantom: PhantomData<Scalar>,
}

impl<Scalar, F> FnGenerator<Scalar, F>
where
    Scalar: RlstScalar,
    F: Fn(usize, usize) -> Scalar,
{
    /// Constructor
    ///
    /// # Arguments
    /// * `n_rows` - Number of rows.
    /// * `n_cols` - Number of columns.
    /// * `entry` - Closure returning the entry at a given row and column, in original numbering.
    pub fn new(n_rows: usize, n_cols: usize, entry: F) -> Self {
        Self {
            n_rows,
            n_cols,
            entry,
            phantom: PhantomData,
        }
    }
}

impl<Scalar, F> Generator for FnGenerator<Scalar, F>
where
    Scalar: RlstScalar,
    F: Fn(usize, usize) -> Scalar,
{
    type Scalar = Scalar;

    fn n_rows(&self) -> usize {
        self.n_rows
    }

    fn n_cols(&self) -> usize {
        self.n_cols
    }

    fn copy_submatrix(&self, rows: &[usize], cols: &[usize], result: &mut [Scalar]) {
        let m = rows.len();
        for (j, &col) in cols.iter().enumerate() {
            for (i, &row) in rows.iter().enumerate() {
                result[i + j * m] = (self.entry)(row, col);
            }
        }
    }
}

/// Kernel matrix `A[i, j] = K(x_i, y_j)` between targets `x_i` and sources `y_j`.
pub struct KernelGenerator<Scalar, K>
where
    Scalar: RlstScalar,
    K: Kernel<T = Scalar>,
{
    kernel: K,
    targets: Vec<Scalar::Real>,
    sources: Vec<Scalar::Real>,
}

impl<Scalar, K> KernelGenerator<Scalar, K>
where
    Scalar: RlstScalar,
    K: Kernel<T = Scalar>,
{
    /// Constructor
    ///
    /// # Arguments
    /// * `kernel` - Kernel to evaluate.
    /// * `targets` - Interleaved target coordinates, one per row.
    /// * `sources` - Interleaved source coordinates, one per column.
    pub fn new(kernel: K, targets: &[Scalar::Real], sources: &[Scalar::Real]) -> Result<Self> {
        if targets.len() % DIM != 0 || sources.len() % DIM != 0 {
            return Err(HMatrixError::InvalidInput(
                "kernel generator expects three dimensional points".to_string(),
            ));
        }

        Ok(Self {
            kernel,
            targets: targets.to_vec(),
            sources: sources.to_vec(),
        })
    }
}

impl<Scalar, K> Generator for KernelGenerator<Scalar, K>
where
    Scalar: RlstScalar,
    K: Kernel<T = Scalar>,
{
    type Scalar = Scalar;

    fn n_rows(&self) -> usize {
        self.targets.len() / DIM
    }

    fn n_cols(&self) -> usize {
        self.sources.len() / DIM
    }

    fn copy_submatrix(&self, rows: &[usize], cols: &[usize], result: &mut [Scalar]) {
        let m = rows.len();
        let n = cols.len();

        let mut sources = Vec::with_capacity(DIM * n);
        for &col in cols.iter() {
            sources.extend_from_slice(&self.sources[DIM * col..DIM * (col + 1)]);
        }

        // One target at a time, so the kernel's output layout never matters
        let mut row = vec![Scalar::zero(); n];
        for (i, &target) in rows.iter().enumerate() {
            self.kernel.assemble_st(
                EvalType::Value,
                &sources,
                &self.targets[DIM * target..DIM * (target + 1)],
                &mut row,
            );
            for (j, &value) in row.iter().enumerate() {
                result[i + j * m] = value;
            }
        }
    }
}

#[cfg(test)]
mod test {
    use green_kernels::laplace_3d::Laplace3dKernel;

    use crate::traits::generator::Generator;

    use super::{FnGenerator, KernelGenerator};

    #[test]
    fn test_fn_generator_column_major() {
        let generator = FnGenerator::new(4, 5, |i, j| (10 * i + j) as f64);
        let mut result = vec![0.0; 6];
        generator.copy_submatrix(&[3, 1], &[0, 4, 2], &mut result);
        assert_eq!(result, vec![30.0, 10.0, 34.0, 14.0, 32.0, 12.0]);
        assert_eq!(generator.n_rows(), 4);
        assert_eq!(generator.n_cols(), 5);
    }

    #[test]
    fn test_kernel_generator() {
        let targets = [0.0, 0.0, 0.0, 0.0, 0.0, 2.0];
        let sources = [1.0, 0.0, 0.0, 0.0, 3.0, 0.0, 0.0, 0.0, 4.0];
        let generator =
            KernelGenerator::new(Laplace3dKernel::<f64>::new(), &targets, &sources).unwrap();
        assert_eq!(generator.n_rows(), 2);
        assert_eq!(generator.n_cols(), 3);

        let mut result = vec![0.0; 6];
        generator.copy_submatrix(&[0, 1], &[0, 1, 2], &mut result);

        let scale = 1. / (4. * std::f64::consts::PI);
        let expected = [
            1.0,
            1. / 5f64.sqrt(),
            1. / 3.0,
            1. / 13f64.sqrt(),
            1. / 4.0,
            1. / 2.0,
        ];
        for (e, r) in expected.iter().zip(result.iter()) {
            assert!((e * scale - r).abs() < 1e-14);
        }

        let kernel = Laplace3dKernel::<f64>::new();
        assert!(KernelGenerator::new(kernel, &targets[0..2], &sources).is_err());
    }
}
