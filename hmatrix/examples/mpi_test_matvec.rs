//? mpirun -n {{NPROCESSES}} --features "mpi"

extern crate blas_src;
extern crate lapack_src;

#[cfg(feature = "mpi")]
fn main() {
    use hmatrix::traits::generator::Generator;
    use hmatrix::traits::hmatrix::DistributedOperator;
    use hmatrix::tree::helpers::points_fixture;
    use hmatrix::{Configuration, FnGenerator, HMatrixBuilder};
    use mpi::traits::Communicator;
    use rlst::RawAccess;

    let universe = mpi::initialize().unwrap();
    let world = universe.world();
    let rank = world.rank();

    // Every process holds the same points
    let n_points = 2000;
    let points = points_fixture::<f64>(n_points, Some(0.0), Some(10.0), Some(0));
    let coordinates = points.data().to_vec();

    let generator = FnGenerator::new(n_points, n_points, |i, j| {
        let r2 = (0..3)
            .map(|d| (coordinates[3 * i + d] - coordinates[3 * j + d]).powi(2))
            .sum::<f64>();
        1.0 / (1.0 + r2)
    });

    let configuration = Configuration {
        epsilon: 1e-4,
        ..Default::default()
    };

    let hmatrix = HMatrixBuilder::<f64, _>::new(world)
        .configuration(configuration)
        .unwrap()
        .tree(points.data(), None)
        .unwrap()
        .build(&generator)
        .unwrap();

    // Distributed product, every rank receives the full result
    let x = (0..n_points)
        .map(|i| (i as f64 / n_points as f64).sin())
        .collect::<Vec<_>>();
    let y = hmatrix.matvec(&x).unwrap();

    // Dense reference for the rows owned by this rank
    let offset = hmatrix.local_offset();
    let size = hmatrix.local_size();
    let rows = hmatrix.target_tree().global_indices[offset..offset + size].to_vec();
    let cols = (0..n_points).collect::<Vec<_>>();
    let mut block = vec![0.0; size * n_points];
    generator.copy_submatrix(&rows, &cols, &mut block);

    let mut error = 0.0;
    let mut norm = 0.0;
    for (i, &row) in rows.iter().enumerate() {
        let expected = (0..n_points).map(|j| block[i + j * size] * x[j]).sum::<f64>();
        error += (y[row] - expected).powi(2);
        norm += expected.powi(2);
    }
    let error = (error / norm).sqrt();
    assert!(error <= 1e-3);

    let infos = hmatrix.global_infos().unwrap();
    let (_, frobenius) = hmatrix.frobenius_error(&generator).unwrap();

    if rank == 0 {
        println!("{}", infos);
        println!("relative Frobenius error: {:e}", frobenius);
        println!("...test_matvec passed");
    }
}

#[cfg(not(feature = "mpi"))]
fn main() {}
