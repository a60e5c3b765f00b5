use std::time::Duration;

use criterion::{criterion_group, criterion_main, Criterion};
use green_kernels::laplace_3d::Laplace3dKernel;
use hmatrix::tree::helpers::{points_fixture, points_fixture_sphere};
use hmatrix::{Configuration, HMatrixBuilder, KernelGenerator, SingleProcess};
use rlst::RawAccess;

extern crate blas_src;
extern crate lapack_src;

fn laplace_assembly_f64(c: &mut Criterion) {
    let mut group = c.benchmark_group("F64 Assembly");

    group
        .sample_size(10)
        .measurement_time(Duration::from_secs(15));

    let n_points = 10000;
    let cube = points_fixture::<f64>(n_points, None, None, Some(0));
    let sphere = points_fixture_sphere::<f64>(n_points, Some(1));

    for (name, points) in [("cube", &cube), ("sphere", &sphere)] {
        let generator =
            KernelGenerator::new(Laplace3dKernel::<f64>::new(), points.data(), points.data())
                .unwrap();

        for digits in [3, 6] {
            let configuration = Configuration {
                epsilon: 10f64.powi(-digits),
                ..Default::default()
            };

            group.bench_function(format!("points={name} digits={digits}"), |b| {
                b.iter(|| {
                    HMatrixBuilder::<f64, _>::new(SingleProcess)
                        .configuration(configuration)
                        .unwrap()
                        .tree(points.data(), None)
                        .unwrap()
                        .build(&generator)
                        .unwrap()
                })
            });
        }
    }

    group.finish();
}

criterion_group!(assembly, laplace_assembly_f64);
criterion_main!(assembly);
