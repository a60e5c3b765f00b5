//! Crate wide constants

/// Default relative compression tolerance.
pub const DEFAULT_EPSILON: f64 = 1e-3;

/// Default admissibility parameter.
pub const DEFAULT_ETA: f64 = 10.0;

/// Default value chosen for the maximum number of points per leaf cluster.
pub const DEFAULT_MIN_LEAF_SIZE: usize = 10;

/// Default bound on the depth of cluster trees.
pub const DEFAULT_MAX_DEPTH: u64 = 32;

/// Default number of children created by each split below the worker level.
pub const DEFAULT_BRANCHING_FACTOR: usize = 2;

/// Smallest block dimension for which low rank compression is attempted.
pub(crate) const MIN_COMPRESSIBLE_SIZE: usize = 2;

/// Scale applied to the tolerance in the ACA stopping test.
pub(crate) const ACA_SAFETY_FACTOR: f64 = 0.1;

/// Number of consecutive ACA updates that must pass the stopping test.
pub(crate) const ACA_CONVERGED_STEPS: usize = 2;
