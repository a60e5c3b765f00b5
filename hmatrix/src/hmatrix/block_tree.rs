//! Block partitioning driven by the admissibility condition.
use num::Float;

use crate::hmatrix::constants::MIN_COMPRESSIBLE_SIZE;
use crate::hmatrix::types::{BlockNode, BlockTree, BlockType};
use crate::traits::tree::{Tree, TreeNode};
use crate::traits::types::{HMatrixError, Result};

/// Whether a pair of clusters is well separated, `min(diam_t, diam_s) < eta * dist(t, s)`.
///
/// The test is strict, so clusters whose bounding spheres touch are never admissible and `eta = 0`
/// disables compression entirely.
pub fn is_admissible<N>(target: &N, source: &N, eta: N::Scalar) -> bool
where
    N: TreeNode,
{
    let diameter = Float::min(target.diameter(), source.diameter());
    diameter < eta * target.distance(source)
}

/// Classify a pair of clusters.
pub fn classify<N>(target: &N, source: &N, eta: N::Scalar) -> BlockType
where
    N: TreeNode,
{
    if is_admissible(target, source, eta)
        && target.size().min(source.size()) >= MIN_COMPRESSIBLE_SIZE
    {
        BlockType::LowRank
    } else if target.is_leaf() || source.is_leaf() {
        BlockType::Dense
    } else {
        BlockType::Recurse
    }
}

impl BlockTree {
    /// Partition the rows owned by a worker against all columns.
    ///
    /// # Arguments
    /// * `target_tree` - Cluster tree over targets.
    /// * `source_tree` - Cluster tree over sources.
    /// * `rank` - Worker whose local target root starts the recursion.
    /// * `eta` - Admissibility parameter.
    pub fn new<T>(target_tree: &T, source_tree: &T, rank: usize, eta: T::Scalar) -> Result<Self>
    where
        T: Tree,
    {
        let local_root = target_tree.local_root(rank).ok_or_else(|| {
            HMatrixError::InvalidInput(format!(
                "rank {} outside of a layout over {} workers",
                rank,
                target_tree.n_workers()
            ))
        })?;

        let missing = |index: usize| {
            HMatrixError::InvalidInput(format!("cluster {} missing from tree", index))
        };

        let mut nodes = vec![BlockNode {
            index: 0,
            target: local_root.index(),
            source: source_tree.root().index(),
            block_type: BlockType::Recurse,
            children: Vec::new(),
        }];

        let mut stack = vec![0usize];
        while let Some(index) = stack.pop() {
            let target = target_tree
                .node(nodes[index].target)
                .ok_or_else(|| missing(nodes[index].target))?;
            let source = source_tree
                .node(nodes[index].source)
                .ok_or_else(|| missing(nodes[index].source))?;

            let block_type = classify(target, source, eta);
            nodes[index].block_type = block_type;

            if block_type != BlockType::Recurse {
                continue;
            }

            let first_child = nodes.len();
            for &t in target.children() {
                for &s in source.children() {
                    nodes.push(BlockNode {
                        index: nodes.len(),
                        target: t,
                        source: s,
                        block_type: BlockType::Recurse,
                        children: Vec::new(),
                    });
                }
            }
            nodes[index].children = (first_child..nodes.len()).collect();
            stack.extend((first_child..nodes.len()).rev());
        }

        let mut leaves = Vec::new();
        let mut stack = vec![0usize];
        while let Some(index) = stack.pop() {
            if nodes[index].children.is_empty() {
                leaves.push(index);
            } else {
                stack.extend(nodes[index].children.iter().rev());
            }
        }

        Ok(BlockTree {
            rank,
            nodes,
            leaves,
        })
    }

    /// Leaf blocks in depth first order
    pub fn leaves(&self) -> impl Iterator<Item = &BlockNode> {
        self.leaves.iter().map(|&i| &self.nodes[i])
    }

    /// Number of leaves of a given type
    pub fn n_leaves(&self, block_type: BlockType) -> usize {
        self.leaves()
            .filter(|block| block.block_type == block_type)
            .count()
    }
}

#[cfg(test)]
mod test {
    use rlst::RawAccess;

    use crate::hmatrix::types::{BlockTree, BlockType, Configuration};
    use crate::traits::tree::{Tree, TreeNode};
    use crate::tree::helpers::{grid_points, points_fixture};
    use crate::tree::types::ClusterTree;

    use super::is_admissible;

    /// Count how often each matrix entry is covered by the leaves of all workers.
    fn coverage(tree: &ClusterTree<f64>, eta: f64) -> Vec<usize> {
        let n = tree.n_points();
        let mut counts = vec![0; n * n];
        for rank in 0..tree.n_workers() {
            let block_tree = BlockTree::new(tree, tree, rank, eta).unwrap();
            let (offset, size) = tree.layout.range(rank).unwrap();
            for block in block_tree.leaves() {
                let t = tree.node(block.target).unwrap();
                let s = tree.node(block.source).unwrap();
                assert!(t.offset >= offset && t.offset + t.size <= offset + size);
                for i in t.offset..t.offset + t.size {
                    for j in s.offset..s.offset + s.size {
                        counts[i + j * n] += 1;
                    }
                }
            }
        }
        counts
    }

    #[test]
    fn test_leaves_tile_matrix() {
        let points = points_fixture::<f64>(300, None, None, Some(0));
        let configuration = Configuration {
            min_leaf_size: 8,
            ..Default::default()
        };

        for n_workers in [1, 2, 3] {
            let tree = ClusterTree::new(points.data(), n_workers, &configuration).unwrap();
            for eta in [0.0, 1.0, 10.0, 1e10] {
                assert!(coverage(&tree, eta).iter().all(|&c| c == 1));
            }
        }
    }

    #[test]
    fn test_zero_eta_disables_compression() {
        let points = grid_points::<f64>(400, 0.0);
        let tree = ClusterTree::new(points.data(), 1, &Configuration::default()).unwrap();
        let block_tree = BlockTree::new(&tree, &tree, 0, 0.0).unwrap();
        assert_eq!(block_tree.n_leaves(BlockType::LowRank), 0);
        assert!(block_tree.n_leaves(BlockType::Dense) > 0);
    }

    #[test]
    fn test_larger_eta_compresses_more() {
        let points = grid_points::<f64>(1000, 0.0);
        let tree = ClusterTree::new(points.data(), 1, &Configuration::default()).unwrap();
        let low = BlockTree::new(&tree, &tree, 0, 1.0).unwrap();
        let high = BlockTree::new(&tree, &tree, 0, 1e10).unwrap();
        assert!(low.n_leaves(BlockType::LowRank) > 0);
        assert!(high.n_leaves(BlockType::Dense) <= low.n_leaves(BlockType::Dense));
    }

    #[test]
    fn test_admissibility() {
        let coordinates = [0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 10.0, 0.0, 0.0, 11.0, 0.0, 0.0];
        let configuration = Configuration {
            min_leaf_size: 2,
            ..Default::default()
        };
        let tree = ClusterTree::new(&coordinates, 1, &configuration).unwrap();
        let root = tree.root();
        let left = tree.node(root.children()[0]).unwrap();
        let right = tree.node(root.children()[1]).unwrap();

        // diameter 1, distance 9
        assert!(is_admissible(left, right, 0.2));
        assert!(!is_admissible(left, right, 1.0 / 9.0));
        assert!(!is_admissible(left, left, 1e10));
        assert!(!is_admissible(left, right, 0.0));

        let block_tree = BlockTree::new(&tree, &tree, 0, 1.0).unwrap();
        assert_eq!(block_tree.nodes[0].block_type, BlockType::Recurse);
        assert_eq!(block_tree.n_leaves(BlockType::LowRank), 2);
        assert_eq!(block_tree.n_leaves(BlockType::Dense), 2);

        assert!(BlockTree::new(&tree, &tree, 1, 1.0).is_err());
    }

    #[test]
    fn test_single_point_blocks_are_dense() {
        let coordinates = [0.0, 0.0, 0.0, 100.0, 0.0, 0.0];
        let configuration = Configuration {
            min_leaf_size: 1,
            ..Default::default()
        };
        let tree = ClusterTree::new(&coordinates, 1, &configuration).unwrap();
        let block_tree = BlockTree::new(&tree, &tree, 0, 1e10).unwrap();
        assert_eq!(block_tree.n_leaves(BlockType::LowRank), 0);
        assert_eq!(block_tree.n_leaves(BlockType::Dense), 4);
    }
}
