//! # Distributed Hierarchical Matrices
//!
//! Compressed representation of dense kernel matrices arising from pairwise interactions between two point
//! clouds, based on \[1\].
//!
//! Notable features of this library are:
//! * Geometric clustering of points into a binary (or n-ary) cluster tree, split along principal axes.
//! * Block partitioning driven by an admissibility condition, with far-field blocks compressed using partial
//!   adaptive cross approximation (ACA).
//! * Distributed matrix-vector products over MPI, each worker owning a contiguous row range of the matrix.
//!
//! ## Example Usage
//!
//! ```rust
//! # extern crate blas_src;
//! # extern crate lapack_src;
//! use hmatrix::{Configuration, FnGenerator, HMatrixBuilder, SingleProcess};
//! use hmatrix::traits::hmatrix::DistributedOperator;
//! use hmatrix::tree::helpers::grid_points;
//! use rlst::RawAccess;
//!
//! let n_points = 400;
//! let points = grid_points::<f64>(n_points, 1.0);
//! let coordinates = points.data().to_vec();
//!
//! let generator = FnGenerator::new(n_points, n_points, |i, j| {
//!     let r2: f64 = (0..3)
//!         .map(|d| (coordinates[3 * i + d] - coordinates[3 * j + d]).powi(2))
//!         .sum();
//!     1. / (1e-5 + r2)
//! });
//!
//! let hmatrix = HMatrixBuilder::<f64, _>::new(SingleProcess)
//!     .configuration(Configuration::default())
//!     .unwrap()
//!     .tree(points.data(), None)
//!     .unwrap()
//!     .build(&generator)
//!     .unwrap();
//!
//! let x = vec![1.0; n_points];
//! let y = hmatrix.matvec(&x).unwrap();
//! assert_eq!(y.len(), n_points);
//! ```
//!
//! ## References
//! \[1\] Hackbusch, W. (2015). Hierarchical matrices: algorithms and analysis. Springer.
#![cfg_attr(feature = "strict", deny(warnings))]
#![warn(missing_docs)]

pub mod generator;
pub mod hmatrix;
pub mod linalg;
pub mod traits;
pub mod tree;

// Public API
#[doc(inline)]
pub use generator::{FnGenerator, KernelGenerator};
#[doc(inline)]
pub use hmatrix::types::{Configuration, HMatrix, HMatrixBuilder, Infos, SingleProcess};
#[doc(inline)]
pub use linalg::aca::PartialAca;
#[doc(inline)]
pub use traits::types::{HMatrixError, Result};
#[doc(inline)]
pub use tree::types::ClusterTree;
