//! Crate wide constants for cluster trees

/// Number of power iterations used to find the principal axis of a cluster
pub const POWER_ITERATIONS: usize = 32;

/// Relative change in the Rayleigh quotient below which power iteration stops early
pub const POWER_ITERATION_TOLERANCE: f64 = 1e-10;

/// Dimension of the ambient space
pub const DIM: usize = 3;
