//! Partially pivoted adaptive cross approximation (ACA).
//!
//! Builds a low rank approximation of a matrix block from a small number of its rows and columns,
//! without ever forming the block. Pivots are chosen deterministically, so repeated compressions of the
//! same block produce identical factors.
use num::{Float, One, Zero};
use rlst::RlstScalar;

use crate::hmatrix::constants::{ACA_CONVERGED_STEPS, ACA_SAFETY_FACTOR};
use crate::linalg::types::LowRankFactors;
use crate::traits::compression::LowRankCompressor;
use crate::traits::general::{real, Epsilon};
use crate::traits::generator::Generator;

/// Partially pivoted ACA compressor.
#[derive(Clone, Copy, Debug, Default)]
pub struct PartialAca {
    /// Optional cap on the rank of any approximation, blocks needing more are stored densely.
    pub max_rank: Option<usize>,
}

impl PartialAca {
    /// Constructor
    ///
    /// # Arguments
    /// * `max_rank` - Optional cap on the rank of any approximation.
    pub fn new(max_rank: Option<usize>) -> Self {
        Self { max_rank }
    }
}

/// Index of the entry of largest magnitude among those not yet used, ties go to the lowest index.
fn exclusive_argmax<Scalar>(values: &[Scalar], used: &[bool]) -> Option<usize>
where
    Scalar: RlstScalar,
{
    let mut result: Option<(usize, Scalar::Real)> = None;
    for (i, (value, &used)) in values.iter().zip(used.iter()).enumerate() {
        if used {
            continue;
        }
        let magnitude = value.abs();
        match result {
            Some((_, max)) if magnitude <= max => {}
            _ => result = Some((i, magnitude)),
        }
    }
    result.map(|(i, _)| i)
}

/// Hermitian inner product `a^H b`
fn dot<Scalar>(a: &[Scalar], b: &[Scalar]) -> Scalar
where
    Scalar: RlstScalar,
{
    a.iter()
        .zip(b.iter())
        .fold(Scalar::zero(), |acc, (&x, &y)| acc + x.conj() * y)
}

/// Squared Euclidean norm
fn norm_squared<Scalar>(a: &[Scalar]) -> Scalar::Real
where
    Scalar: RlstScalar,
{
    a.iter().fold(Scalar::Real::zero(), |acc, &x| {
        let magnitude = x.abs();
        acc + magnitude * magnitude
    })
}

impl<Scalar> LowRankCompressor<Scalar> for PartialAca
where
    Scalar: RlstScalar + Epsilon,
{
    fn compress<G>(
        &self,
        generator: &G,
        rows: &[usize],
        cols: &[usize],
        epsilon: Scalar::Real,
    ) -> Option<LowRankFactors<Scalar>>
    where
        G: Generator<Scalar = Scalar>,
    {
        let m = rows.len();
        let n = cols.len();
        let min_dim = m.min(n);

        if min_dim == 0 {
            return Some(LowRankFactors::from_terms(m, n, &[], &[]));
        }

        let max_rank = self.max_rank.map_or(min_dim, |r| r.min(min_dim));
        let epsilon = Float::max(epsilon, Scalar::epsilon());
        let machine_epsilon = Scalar::epsilon();
        let two = Scalar::Real::one() + Scalar::Real::one();
        let safety = real::<Scalar::Real>(ACA_SAFETY_FACTOR);

        let mut used_rows = vec![false; m];
        let mut used_cols = vec![false; n];

        let mut us: Vec<Vec<Scalar>> = Vec::new();
        let mut vs: Vec<Vec<Scalar>> = Vec::new();

        let mut row = vec![Scalar::zero(); n];
        let mut col = vec![Scalar::zero(); m];

        // Squared Frobenius norm of the current approximation
        let mut approximation_norm = Scalar::Real::zero();

        // Magnitude of the first accepted pivot, residuals far below it count as zero
        let mut pivot_scale = Scalar::Real::zero();

        let mut pivot_row = Some(0);
        let mut converged_steps = 0;

        while let Some(i_star) = pivot_row {
            // Residual row
            generator.copy_submatrix(&rows[i_star..i_star + 1], cols, &mut row);
            for (u, v) in us.iter().zip(vs.iter()) {
                let scale = u[i_star];
                row.iter_mut().zip(v.iter()).for_each(|(r, &vj)| *r -= scale * vj);
            }
            used_rows[i_star] = true;

            let j_star = exclusive_argmax(&row, &used_cols);
            let pivot = j_star.map(|j| row[j]);

            let negligible = match pivot {
                Some(p) => {
                    p.abs() == Scalar::Real::zero() || p.abs() <= machine_epsilon * pivot_scale
                }
                None => true,
            };

            if negligible {
                // Nothing left in this row, try the next unused one
                pivot_row = used_rows.iter().position(|&u| !u);
                continue;
            }

            let (j_star, pivot) = match (j_star, pivot) {
                (Some(j), Some(p)) => (j, p),
                _ => break,
            };

            if us.is_empty() {
                pivot_scale = pivot.abs();
            }

            used_cols[j_star] = true;

            // Residual column
            generator.copy_submatrix(rows, &cols[j_star..j_star + 1], &mut col);
            for (u, v) in us.iter().zip(vs.iter()) {
                let scale = v[j_star];
                col.iter_mut().zip(u.iter()).for_each(|(c, &ui)| *c -= ui * scale);
            }

            let u_k = col.clone();
            let v_k = row.iter().map(|&r| r / pivot).collect::<Vec<_>>();

            let u_norm = norm_squared(&u_k);
            let v_norm = norm_squared(&v_k);

            // |S_k|^2 = |S_{k-1}|^2 + |u_k|^2 |v_k|^2 + 2 Re sum_l (u_l^H u_k)(v_l^H v_k)
            let cross = us
                .iter()
                .zip(vs.iter())
                .fold(Scalar::Real::zero(), |acc, (u, v)| {
                    acc + (dot(u, &u_k) * dot(v, &v_k)).re()
                });
            approximation_norm = approximation_norm + u_norm * v_norm + two * cross;

            us.push(u_k);
            vs.push(v_k);

            if 2 * us.len() > min_dim {
                return None;
            }

            // The update estimates the residual, which it can underestimate on a single step
            let converged = Float::sqrt(u_norm * v_norm)
                <= safety * epsilon * Float::sqrt(Float::abs(approximation_norm));
            converged_steps = if converged { converged_steps + 1 } else { 0 };

            if converged_steps >= ACA_CONVERGED_STEPS {
                break;
            }

            if us.len() >= max_rank {
                // The rank cap was hit before the tolerance was met
                return None;
            }

            pivot_row = us
                .last()
                .and_then(|u| exclusive_argmax(u, &used_rows))
                .or_else(|| used_rows.iter().position(|&u| !u));
        }

        Some(LowRankFactors::from_terms(m, n, &us, &vs))
    }
}

#[cfg(test)]
mod test {
    use approx::assert_relative_eq;
    use num::Zero;
    use green_kernels::{laplace_3d::Laplace3dKernel, traits::Kernel, types::EvalType};
    use rlst::{c64, RawAccess, RlstScalar};

    use crate::generator::{FnGenerator, KernelGenerator};
    use crate::traits::compression::LowRankCompressor;
    use crate::traits::generator::Generator;
    use crate::tree::helpers::points_fixture;

    use super::{exclusive_argmax, PartialAca};

    fn relative_error<Scalar: RlstScalar, G: Generator<Scalar = Scalar>>(
        generator: &G,
        rows: &[usize],
        cols: &[usize],
        factors: &crate::linalg::types::LowRankFactors<Scalar>,
    ) -> Scalar::Real {
        let mut block = vec![Scalar::zero(); rows.len() * cols.len()];
        generator.copy_submatrix(rows, cols, &mut block);

        let dense = factors.to_dense();
        let mut error = Scalar::Real::zero();
        let mut norm = Scalar::Real::zero();
        for (&a, &b) in block.iter().zip(dense.data().iter()) {
            let diff = (a - b).abs();
            error += diff * diff;
            norm += a.abs() * a.abs();
        }
        num::Float::sqrt(error / norm)
    }

    #[test]
    fn test_exclusive_argmax() {
        let values = [1.0, -5.0, 5.0, 2.0];
        assert_eq!(exclusive_argmax(&values, &[false; 4]), Some(1));
        assert_eq!(exclusive_argmax(&values, &[false, true, false, false]), Some(2));
        assert_eq!(exclusive_argmax(&values, &[true; 4]), None);

        let values = [c64::new(0.0, 3.0), c64::new(2.0, 0.0)];
        assert_eq!(exclusive_argmax(&values, &[false; 2]), Some(0));
    }

    #[test]
    fn test_aca_laplace() {
        let n = 200;
        let sources = points_fixture::<f64>(n, Some(0.0), Some(1.0), Some(0));
        let targets = points_fixture::<f64>(n, Some(3.0), Some(4.0), Some(1));

        let generator = KernelGenerator::new(
            Laplace3dKernel::<f64>::new(),
            targets.data(),
            sources.data(),
        )
        .unwrap();

        let rows = (0..n).collect::<Vec<_>>();
        let cols = (0..n).collect::<Vec<_>>();

        for epsilon in [1e-3, 1e-6] {
            let factors = PartialAca::default()
                .compress(&generator, &rows, &cols, epsilon)
                .unwrap();
            assert!(factors.rank() < 40);
            assert!(relative_error(&generator, &rows, &cols, &factors) <= epsilon);
        }

        // Check the kernel evaluation agrees with the generator
        let mut expected = vec![0.0; n];
        Laplace3dKernel::<f64>::new().assemble_st(
            EvalType::Value,
            sources.data(),
            &targets.data()[0..3],
            &mut expected,
        );
        let mut found = vec![0.0; n];
        generator.copy_submatrix(&[0], &cols, &mut found);
        for (e, f) in expected.iter().zip(found.iter()) {
            assert_relative_eq!(e, f, epsilon = 1e-14);
        }
    }

    #[test]
    fn test_aca_complex() {
        let n = 100;
        let sources = points_fixture::<f64>(n, Some(0.0), Some(1.0), Some(2)).data().to_vec();
        let targets = points_fixture::<f64>(n, Some(3.0), Some(4.0), Some(3)).data().to_vec();
        let wavenumber = 2.0;

        let generator = FnGenerator::new(n, n, |i, j| {
            let r = (0..3)
                .map(|d| (targets[3 * i + d] - sources[3 * j + d]).powi(2))
                .sum::<f64>()
                .sqrt();
            c64::new((wavenumber * r).cos(), (wavenumber * r).sin()) / c64::new(r, 0.0)
        });

        let rows = (0..n).collect::<Vec<_>>();
        let cols = (0..n).collect::<Vec<_>>();
        let epsilon = 1e-5;
        let factors = PartialAca::default()
            .compress(&generator, &rows, &cols, epsilon)
            .unwrap();
        assert!(relative_error(&generator, &rows, &cols, &factors) <= epsilon);
    }

    #[test]
    fn test_aca_deterministic() {
        let n = 80;
        let sources = points_fixture::<f64>(n, Some(0.0), Some(1.0), Some(4)).data().to_vec();
        let targets = points_fixture::<f64>(n, Some(2.0), Some(3.0), Some(5)).data().to_vec();
        let generator = FnGenerator::new(n, n, |i, j| {
            let r2 = (0..3)
                .map(|d| (targets[3 * i + d] - sources[3 * j + d]).powi(2))
                .sum::<f64>();
            1.0 / r2
        });

        let rows = (0..n).rev().collect::<Vec<_>>();
        let cols = (0..n).collect::<Vec<_>>();
        let a = PartialAca::default().compress(&generator, &rows, &cols, 1e-4).unwrap();
        let b = PartialAca::default().compress(&generator, &rows, &cols, 1e-4).unwrap();
        assert_eq!(a.u.data(), b.u.data());
        assert_eq!(a.v.data(), b.v.data());
    }

    #[test]
    fn test_aca_constant_block() {
        let generator = FnGenerator::new(30, 40, |_, _| 1.0f64);
        let rows = (0..30).collect::<Vec<_>>();
        let cols = (0..40).collect::<Vec<_>>();
        let factors = PartialAca::default()
            .compress(&generator, &rows, &cols, 1e-8)
            .unwrap();
        assert_eq!(factors.rank(), 1);
        assert_eq!(factors.to_dense()[[29, 39]], 1.0);
    }

    #[test]
    fn test_aca_zero_block() {
        let generator = FnGenerator::new(10, 10, |_, _| 0.0f64);
        let rows = (0..10).collect::<Vec<_>>();
        let factors = PartialAca::default()
            .compress(&generator, &rows, &rows, 1e-3)
            .unwrap();
        assert_eq!(factors.rank(), 0);
        assert_eq!(factors.n_entries(), 0);
    }

    #[test]
    fn test_aca_zero_leading_row() {
        // Only the last row is non zero, found by falling through the zero rows
        let generator = FnGenerator::new(8, 8, |i, j| if i == 7 { 1.0 + j as f64 } else { 0.0 });
        let rows = (0..8).collect::<Vec<_>>();
        let factors = PartialAca::default()
            .compress(&generator, &rows, &rows, 1e-6)
            .unwrap();
        assert_eq!(factors.rank(), 1);
        let dense = factors.to_dense();
        assert_relative_eq!(dense[[7, 3]], 4.0, epsilon = 1e-14);
        assert_relative_eq!(dense[[0, 3]], 0.0);
    }

    #[test]
    fn test_aca_incompressible() {
        // The identity has full rank, so compression can't pay off
        let generator = FnGenerator::new(10, 10, |i, j| if i == j { 1.0f64 } else { 0.0 });
        let rows = (0..10).collect::<Vec<_>>();
        assert!(PartialAca::default()
            .compress(&generator, &rows, &rows, 1e-3)
            .is_none());

        // As is a smooth block once the rank cap is hit
        let generator = FnGenerator::new(20, 20, |i, j| {
            1.0 / (1.0 + (i as f64 - j as f64).abs() + 20.0)
        });
        let rows = (0..20).collect::<Vec<_>>();
        assert!(PartialAca::new(Some(1))
            .compress(&generator, &rows, &rows, 1e-12)
            .is_none());
    }
}
