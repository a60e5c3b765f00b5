//! # Trait Definitions
pub mod compression;
pub mod general;
pub mod generator;
pub mod hmatrix;
pub mod parallel;
pub mod tree;
pub mod types;
