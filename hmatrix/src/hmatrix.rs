//! # Hierarchical Matrices
//!
//! Assembly and application of distributed hierarchical matrices. A [`HMatrixBuilder`](types::HMatrixBuilder)
//! clusters targets and sources, partitions the matrix into blocks and compresses the admissible ones,
//! each worker assembling the blocks whose rows it owns.
pub mod block_tree;
pub mod constants;
pub mod types;

mod assembly;
mod builder;
mod communication;
pub mod infos;
mod matvec;
