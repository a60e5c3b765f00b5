//! Helper functions used in testing cluster trees and hierarchical matrices, specifically test point
//! generators.
use num::Float;
use rand::prelude::*;
use rlst::RlstScalar;
use rlst::{rlst_dynamic_array2, Array, BaseArray, VectorContainer};

use crate::traits::general::real;

/// Alias for an rlst container for point data, expected with shape [3, n_points], so that the column
/// major data buffer holds interleaved coordinates.
pub type PointsMat<T> = Array<T, BaseArray<T, VectorContainer<T>, 2>, 2>;

/// Points fixture for testing, uniformly samples in each axis from min to max.
///
/// # Arguments
/// * `n_points` - The number of points to sample.
/// * `min` - The minimum coordinate value along each axis, defaults to 0.
/// * `max` - The maximum coordinate value along each axis, defaults to 1.
/// * `seed` - Random seed, defaults to 0.
pub fn points_fixture<T: Float + RlstScalar + rand::distributions::uniform::SampleUniform>(
    n_points: usize,
    min: Option<T>,
    max: Option<T>,
    seed: Option<u64>,
) -> PointsMat<T> {
    let mut rng = StdRng::seed_from_u64(seed.unwrap_or(0));

    let between = match (min, max) {
        (Some(min), Some(max)) => rand::distributions::Uniform::from(min..max),
        _ => rand::distributions::Uniform::from(T::zero()..T::one()),
    };

    let mut points = rlst_dynamic_array2!(T, [3, n_points]);

    for i in 0..n_points {
        points[[0, i]] = between.sample(&mut rng);
        points[[1, i]] = between.sample(&mut rng);
        points[[2, i]] = between.sample(&mut rng);
    }

    points
}

/// Points fixture for testing, uniformly samples on the surface of a sphere of diameter 1 centred at
/// `(0.5, 0.5, 0.5)`.
///
/// # Arguments
/// * `n_points` - The number of points to sample.
/// * `seed` - Random seed, defaults to 0.
pub fn points_fixture_sphere<T: Float + RlstScalar + rand::distributions::uniform::SampleUniform>(
    n_points: usize,
    seed: Option<u64>,
) -> PointsMat<T> {
    let mut rng = StdRng::seed_from_u64(seed.unwrap_or(0));
    let two = real::<T>(2.0);
    let half = real::<T>(0.5);
    let pi = real::<T>(std::f64::consts::PI);

    let between = rand::distributions::Uniform::from(T::zero()..T::one());

    let mut points = rlst_dynamic_array2!(T, [3, n_points]);

    for i in 0..n_points {
        let phi = between.sample(&mut rng) * two * pi;
        let theta = Float::acos((between.sample(&mut rng) - half) * two);

        points[[0, i]] = half * Float::sin(theta) * Float::cos(phi) + half;
        points[[1, i]] = half * Float::sin(theta) * Float::sin(phi) + half;
        points[[2, i]] = half * Float::cos(theta) + half;
    }

    points
}

/// Points on a planar grid with unit spacing at height `z`, filled row by row with `ceil(sqrt(n))`
/// points per row.
///
/// # Arguments
/// * `n_points` - The number of points.
/// * `z` - Height of the plane.
pub fn grid_points<T: Float + RlstScalar>(n_points: usize, z: T) -> PointsMat<T> {
    let side = ((n_points as f64).sqrt().ceil() as usize).max(1);

    let mut points = rlst_dynamic_array2!(T, [3, n_points]);

    for i in 0..n_points {
        points[[0, i]] = real::<T>((i % side) as f64);
        points[[1, i]] = real::<T>((i / side) as f64);
        points[[2, i]] = z;
    }

    points
}
