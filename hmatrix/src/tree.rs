//! # Geometric Cluster Trees
//!
//! Recursive partitions of a point cloud into clusters of contiguous points, built by splitting each
//! cluster along its principal axis. The first split of the root creates one subtree per worker, whose
//! point ranges define the distributed row layout of a hierarchical matrix.
pub mod constants;
pub mod types;

mod cluster;
mod construction;
pub mod export;
pub mod helpers;
mod layout;
