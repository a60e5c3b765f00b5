//! Data structures for geometric cluster trees.
use num::Float;
use rlst::RlstScalar;

/// A cluster, covering the contiguous range `[offset, offset + size)` of points in cluster ordering.
///
/// Nodes are stored in an arena owned by a [`ClusterTree`], and refer to their parent and children by
/// arena index. Equality, ordering and hashing use the arena index only.
#[derive(Clone, Debug)]
pub struct ClusterNode<T>
where
    T: RlstScalar + Float,
{
    /// Position of this node in the arena
    pub index: usize,

    /// First point in cluster ordering
    pub offset: usize,

    /// Number of points
    pub size: usize,

    /// Distance from the root
    pub depth: u64,

    /// Weighted centre of the points
    pub centre: [T; 3],

    /// Smallest radius around `centre` enclosing all points, including their own radii
    pub radius: T,

    /// Arena index of the parent
    pub parent: Option<usize>,

    /// Arena indices of the children, in point order
    pub children: Vec<usize>,
}

/// Distribution of cluster ordered points over workers.
///
/// Worker `r` owns the contiguous range `master_offsets[r]`, which coincides with the point range of
/// the worker's local subtree root. Ranges appear in rank order and tile `[0, n_points)`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Layout {
    /// `(offset, size)` of each worker's range
    pub master_offsets: Vec<(usize, usize)>,

    /// Arena index of each worker's local subtree root
    pub local_roots: Vec<usize>,
}

/// A cluster tree over a set of three dimensional points.
///
/// Points are reordered so that every node covers a contiguous range, `global_indices[i]` holds the
/// original index of the point found at cluster position `i`.
///
/// # Fields
/// - `nodes` - Arena of nodes, the root is stored at index 0 and children of a node are contiguous.
///
/// - `coordinates` - Coordinates in cluster ordering, interleaved as `[x_1, y_1, z_1, ..., x_n, y_n, z_n]`.
///
/// - `global_indices` - Original index of each point in cluster ordering.
///
/// - `layout` - Distribution of points over workers.
///
/// - `depth` - Maximum depth of any node.
#[derive(Clone, Debug)]
pub struct ClusterTree<T>
where
    T: RlstScalar + Float,
{
    /// Arena of nodes
    pub nodes: Vec<ClusterNode<T>>,

    /// Coordinates in cluster ordering
    pub coordinates: Vec<T>,

    /// Original index of each point in cluster ordering
    pub global_indices: Vec<usize>,

    /// Distribution over workers
    pub layout: Layout,

    /// Maximum depth of any node
    pub depth: u64,
}
