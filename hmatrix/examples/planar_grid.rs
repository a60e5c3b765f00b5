use hmatrix::traits::generator::Generator;
use hmatrix::traits::hmatrix::DistributedOperator;
use hmatrix::tree::helpers::grid_points;
use hmatrix::{Configuration, FnGenerator, HMatrixBuilder, SingleProcess};
use rlst::RawAccess;

extern crate blas_src;
extern crate lapack_src;

fn main() {
    // Points on a planar grid
    let n_points = 1000;
    let points = grid_points::<f64>(n_points, 1.0);
    let coordinates = points.data().to_vec();

    let generator = FnGenerator::new(n_points, n_points, |i, j| {
        let r2 = (0..3)
            .map(|d| (coordinates[3 * i + d] - coordinates[3 * j + d]).powi(2))
            .sum::<f64>();
        1.0 / (1e-5 + r2)
    });

    // Compression parameters
    let configuration = Configuration {
        epsilon: 1e-3,
        eta: 100.0,
        min_leaf_size: 10,
        ..Default::default()
    };

    let hmatrix = HMatrixBuilder::<f64, _>::new(SingleProcess)
        .configuration(configuration)
        .unwrap()
        .tree(points.data(), None)
        .unwrap()
        .build(&generator)
        .unwrap();

    // Product with a vector of ones
    let x = vec![1.0; n_points];
    let y = hmatrix.matvec(&x).unwrap();

    // Dense reference
    let indices = (0..n_points).collect::<Vec<_>>();
    let mut dense = vec![0.0; n_points * n_points];
    generator.copy_submatrix(&indices, &indices, &mut dense);
    let expected = (0..n_points)
        .map(|i| (0..n_points).map(|j| dense[i + j * n_points]).sum::<f64>())
        .collect::<Vec<_>>();

    let error = y
        .iter()
        .zip(expected.iter())
        .map(|(a, b)| (a - b).powi(2))
        .sum::<f64>()
        .sqrt()
        / expected.iter().map(|b| b.powi(2)).sum::<f64>().sqrt();

    let (_, frobenius) = hmatrix.frobenius_error(&generator).unwrap();

    println!("{}", hmatrix.infos());
    println!("relative product error: {:e}", error);
    println!("relative Frobenius error: {:e}", frobenius);

    hmatrix
        .target_tree()
        .save_partition("planar_grid_clusters.csv", &[1, 2, 3, 4])
        .unwrap();
    hmatrix
        .save_block_partition("planar_grid_blocks.csv")
        .unwrap();
}
