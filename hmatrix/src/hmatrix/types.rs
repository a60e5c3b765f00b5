//! Data structures for distributed hierarchical matrices.
use std::sync::atomic::{AtomicU64, AtomicUsize};
use std::sync::Arc;
use std::time::Duration;

use rlst::RlstScalar;

use crate::linalg::types::{LowRankFactors, Matrix};
use crate::traits::parallel::Collective;
use crate::tree::types::ClusterTree;

/// Parameters controlling clustering, partitioning and compression.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Configuration {
    /// Relative compression tolerance of admissible blocks, defaults to 1e-3.
    pub epsilon: f64,

    /// Admissibility parameter, larger values compress more blocks. Defaults to 10.
    pub eta: f64,

    /// Clusters at or below this size are not split further, defaults to 10.
    pub min_leaf_size: usize,

    /// Clusters at this depth are not split further, defaults to 32.
    pub max_depth: u64,

    /// Number of children per split below the worker level, defaults to 2.
    pub branching_factor: usize,
}

/// The communicator of a program running a single worker.
#[derive(Clone, Copy, Debug, Default)]
pub struct SingleProcess;

/// Outcome of classifying a pair of clusters.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BlockType {
    /// Admissible leaf, stored as a low rank approximation
    LowRank,

    /// Inadmissible leaf, stored densely
    Dense,

    /// Interior block, refined by the children of both clusters
    Recurse,
}

/// A block of the matrix, the product of a target cluster and a source cluster.
#[derive(Clone, Debug)]
pub struct BlockNode {
    /// Position of this block in the block tree
    pub index: usize,

    /// Arena index of the target cluster
    pub target: usize,

    /// Arena index of the source cluster
    pub source: usize,

    /// Classification of the block
    pub block_type: BlockType,

    /// Indices of the children, empty for leaves
    pub children: Vec<usize>,
}

/// The block partition owned by one worker, rooted at the product of the worker's local target root and
/// the source root.
#[derive(Clone, Debug, Default)]
pub struct BlockTree {
    /// Rank of the owning worker
    pub rank: usize,

    /// Arena of blocks, the root is stored at index 0
    pub nodes: Vec<BlockNode>,

    /// Indices of the leaf blocks, in depth first order
    pub leaves: Vec<usize>,
}

/// Storage of a leaf block.
pub enum LeafData<Scalar>
where
    Scalar: RlstScalar,
{
    /// Entries in column major order
    Dense(Matrix<Scalar>),

    /// Factors of a low rank approximation
    LowRank(LowRankFactors<Scalar>),
}

/// A leaf block together with its position in cluster ordering.
pub struct Leaf<Scalar>
where
    Scalar: RlstScalar,
{
    /// First row in target cluster ordering
    pub target_offset: usize,

    /// Number of rows
    pub target_size: usize,

    /// First column in source cluster ordering
    pub source_offset: usize,

    /// Number of columns
    pub source_size: usize,

    /// Rank of the worker owning the leaf's rows
    pub rank: usize,

    /// Stored entries
    pub data: LeafData<Scalar>,
}

/// A distributed hierarchical matrix.
///
/// Each worker holds the leaves covering its own row range of the matrix, the trees and layout are
/// replicated on every worker.
///
/// # Fields
/// - `configuration` - Parameters the matrix was built with.
///
/// - `target_tree` - Cluster tree over targets, defines the row ordering and row distribution.
///
/// - `source_tree` - Cluster tree over sources, the same tree as `target_tree` for symmetric problems.
///
/// - `block_tree` - The block partition of this worker's rows.
///
/// - `leaves` - Assembled leaves, in the order of `block_tree.leaves`.
///
/// - `communicator` - Used for the global product and for global diagnostics.
pub struct HMatrix<Scalar, Comm>
where
    Scalar: RlstScalar,
    Comm: Collective<Scalar>,
{
    /// Parameters the matrix was built with
    pub configuration: Configuration,

    /// Cluster tree over targets
    pub target_tree: Arc<ClusterTree<Scalar::Real>>,

    /// Cluster tree over sources
    pub source_tree: Arc<ClusterTree<Scalar::Real>>,

    /// Block partition of this worker's rows
    pub block_tree: BlockTree,

    /// Assembled leaves
    pub leaves: Vec<Leaf<Scalar>>,

    /// Communicator
    pub communicator: Comm,

    /// Wall time spent assembling leaves
    pub assembly_time: Duration,

    pub(crate) n_matvecs: AtomicUsize,

    pub(crate) matvec_nanos: AtomicU64,
}

/// Staged construction of a [`HMatrix`].
///
/// Optionally set a configuration first, then the clustering of targets and sources, then build by
/// assembling the matrix from a generator.
pub struct HMatrixBuilder<Scalar, Comm>
where
    Scalar: RlstScalar,
    Comm: Collective<Scalar>,
{
    /// Communicator
    pub communicator: Comm,

    /// Configuration, validated when set
    pub configuration: Configuration,

    /// Cluster tree over targets
    pub target_tree: Option<Arc<ClusterTree<Scalar::Real>>>,

    /// Cluster tree over sources
    pub source_tree: Option<Arc<ClusterTree<Scalar::Real>>>,
}

/// Diagnostics describing the structure and usage of a hierarchical matrix.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Infos {
    /// Number of rows
    pub n_rows: usize,

    /// Number of columns
    pub n_cols: usize,

    /// Number of workers
    pub n_workers: usize,

    /// Number of dense leaves
    pub n_dense_leaves: usize,

    /// Number of low rank leaves
    pub n_low_rank_leaves: usize,

    /// Smallest rank of any low rank leaf, zero if there are none
    pub min_rank: usize,

    /// Largest rank of any low rank leaf
    pub max_rank: usize,

    /// Mean rank of low rank leaves
    pub mean_rank: f64,

    /// Number of scalars stored
    pub stored_entries: usize,

    /// Number of matrix entries covered by the leaves
    pub covered_entries: usize,

    /// Ratio of stored to covered entries
    pub compression_ratio: f64,

    /// Wall time spent assembling leaves, in seconds
    pub assembly_time: f64,

    /// Number of products applied
    pub n_matvecs: usize,

    /// Wall time spent in products, in seconds
    pub matvec_time: f64,
}
