//! Tree Traits
use std::hash::Hash;

use num::traits::{Float, One, Zero};
use rlst::RlstScalar;

use super::types::Result;

/// A node of a geometric cluster tree, covering a contiguous range of points in cluster ordering.
pub trait TreeNode
where
    Self: Hash + Eq + Ord,
{
    /// Scalar type
    type Scalar: RlstScalar + Float;

    /// Position of this node in the tree's node storage
    fn index(&self) -> usize;

    /// First point covered by this node, in cluster ordering
    fn offset(&self) -> usize;

    /// Number of points covered by this node
    fn size(&self) -> usize;

    /// Depth of this node, the root has depth 0
    fn depth(&self) -> u64;

    /// Geometric centre
    fn centre(&self) -> &[Self::Scalar; 3];

    /// Radius of the bounding sphere around the centre
    fn radius(&self) -> Self::Scalar;

    /// Indices of the children, in point order
    fn children(&self) -> &[usize];

    /// Index of the parent, `None` for the root
    fn parent(&self) -> Option<usize>;

    /// Whether this node has no children
    fn is_leaf(&self) -> bool {
        self.children().is_empty()
    }

    /// Diameter of the bounding sphere
    fn diameter(&self) -> Self::Scalar {
        (Self::Scalar::one() + Self::Scalar::one()) * self.radius()
    }

    /// Gap between the bounding spheres of two nodes, zero if they intersect
    fn distance(&self, other: &Self) -> Self::Scalar {
        let centre_distance = self
            .centre()
            .iter()
            .zip(other.centre().iter())
            .map(|(&a, &b)| (a - b) * (a - b))
            .fold(Self::Scalar::zero(), |acc, d| acc + d);
        let gap = Float::sqrt(centre_distance) - self.radius() - other.radius();
        Float::max(gap, Self::Scalar::zero())
    }
}

/// Cluster trees over a fixed set of points
pub trait Tree {
    /// Scalar type
    type Scalar: RlstScalar + Float;

    /// A tree node.
    type Node: TreeNode<Scalar = Self::Scalar>;

    /// Root node
    fn root(&self) -> &Self::Node;

    /// Node stored at a given index
    fn node(&self, index: usize) -> Option<&Self::Node>;

    /// Total number of nodes
    fn n_nodes(&self) -> usize;

    /// Number of points clustered
    fn n_points(&self) -> usize;

    /// Get depth of tree.
    fn depth(&self) -> u64;

    /// Number of workers the tree was partitioned for
    fn n_workers(&self) -> usize;

    /// Root of the subtree owned by a given worker
    fn local_root(&self, rank: usize) -> Option<&Self::Node>;

    /// Original index of the point at each cluster position
    fn global_indices(&self) -> &[usize];

    /// All leaves in depth first, left to right order
    fn leaves(&self) -> Vec<&Self::Node>;

    /// Permute data from original ordering into cluster ordering, `output[i] = input[global_indices[i]]`
    fn global_to_cluster<T: Copy>(&self, input: &[T], output: &mut [T]) -> Result<()>;

    /// Permute data from cluster ordering into original ordering, `output[global_indices[i]] = input[i]`
    fn cluster_to_global<T: Copy>(&self, input: &[T], output: &mut [T]) -> Result<()>;
}
