//! Implementation of tree traits for cluster trees.
use std::cmp::Ordering;
use std::hash::{Hash, Hasher};

use num::Float;
use rlst::RlstScalar;

use crate::traits::tree::{Tree, TreeNode};
use crate::traits::types::{HMatrixError, Result};
use crate::tree::types::{ClusterNode, ClusterTree};

impl<T> PartialEq for ClusterNode<T>
where
    T: RlstScalar + Float,
{
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index
    }
}

impl<T> Eq for ClusterNode<T> where T: RlstScalar + Float {}

impl<T> Ord for ClusterNode<T>
where
    T: RlstScalar + Float,
{
    fn cmp(&self, other: &Self) -> Ordering {
        self.index.cmp(&other.index)
    }
}

impl<T> PartialOrd for ClusterNode<T>
where
    T: RlstScalar + Float,
{
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Hash for ClusterNode<T>
where
    T: RlstScalar + Float,
{
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.index.hash(state);
    }
}

impl<T> TreeNode for ClusterNode<T>
where
    T: RlstScalar + Float,
{
    type Scalar = T;

    fn index(&self) -> usize {
        self.index
    }

    fn offset(&self) -> usize {
        self.offset
    }

    fn size(&self) -> usize {
        self.size
    }

    fn depth(&self) -> u64 {
        self.depth
    }

    fn centre(&self) -> &[T; 3] {
        &self.centre
    }

    fn radius(&self) -> T {
        self.radius
    }

    fn children(&self) -> &[usize] {
        &self.children
    }

    fn parent(&self) -> Option<usize> {
        self.parent
    }
}

/// Check that a permutation source and destination match the number of points.
fn check_lengths(n_points: usize, input: usize, output: usize) -> Result<()> {
    if input != n_points || output != n_points {
        return Err(HMatrixError::InvalidInput(format!(
            "expected buffers of length {}, found input {} and output {}",
            n_points, input, output
        )));
    }
    Ok(())
}

impl<T> Tree for ClusterTree<T>
where
    T: RlstScalar + Float,
{
    type Scalar = T;
    type Node = ClusterNode<T>;

    fn root(&self) -> &Self::Node {
        &self.nodes[0]
    }

    fn node(&self, index: usize) -> Option<&Self::Node> {
        self.nodes.get(index)
    }

    fn n_nodes(&self) -> usize {
        self.nodes.len()
    }

    fn n_points(&self) -> usize {
        self.global_indices.len()
    }

    fn depth(&self) -> u64 {
        self.depth
    }

    fn n_workers(&self) -> usize {
        self.layout.n_workers()
    }

    fn local_root(&self, rank: usize) -> Option<&Self::Node> {
        self.layout
            .local_roots
            .get(rank)
            .and_then(|&index| self.nodes.get(index))
    }

    fn global_indices(&self) -> &[usize] {
        &self.global_indices
    }

    fn leaves(&self) -> Vec<&Self::Node> {
        let mut leaves = Vec::new();
        let mut stack = vec![0usize];
        while let Some(index) = stack.pop() {
            let node = &self.nodes[index];
            if node.children.is_empty() {
                leaves.push(node);
            } else {
                stack.extend(node.children.iter().rev());
            }
        }
        leaves
    }

    fn global_to_cluster<U: Copy>(&self, input: &[U], output: &mut [U]) -> Result<()> {
        check_lengths(self.n_points(), input.len(), output.len())?;
        output
            .iter_mut()
            .zip(self.global_indices.iter())
            .for_each(|(o, &g)| *o = input[g]);
        Ok(())
    }

    fn cluster_to_global<U: Copy>(&self, input: &[U], output: &mut [U]) -> Result<()> {
        check_lengths(self.n_points(), input.len(), output.len())?;
        input
            .iter()
            .zip(self.global_indices.iter())
            .for_each(|(&i, &g)| output[g] = i);
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use rlst::RawAccess;

    use crate::hmatrix::types::Configuration;
    use crate::traits::tree::{Tree, TreeNode};
    use crate::tree::helpers::points_fixture;
    use crate::tree::types::ClusterTree;

    #[test]
    fn test_permutation_round_trip() {
        let n_points = 200;
        let points = points_fixture::<f64>(n_points, None, None, Some(0));
        let tree = ClusterTree::new(points.data(), 2, &Configuration::default()).unwrap();

        let x = (0..n_points).map(|i| i as f64).collect::<Vec<_>>();
        let mut x_cluster = vec![0.0; n_points];
        let mut y = vec![0.0; n_points];

        tree.global_to_cluster(&x, &mut x_cluster).unwrap();
        for (i, &g) in tree.global_indices().iter().enumerate() {
            assert_eq!(x_cluster[i], x[g]);
        }

        tree.cluster_to_global(&x_cluster, &mut y).unwrap();
        assert_eq!(x, y);

        let mut short = vec![0.0; n_points - 1];
        assert!(tree.global_to_cluster(&x, &mut short).is_err());
    }

    #[test]
    fn test_node_distance() {
        let coordinates: [f64; 12] = [0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 10.0, 0.0, 0.0, 11.0, 0.0, 0.0];
        let configuration = Configuration {
            min_leaf_size: 2,
            ..Default::default()
        };
        let tree = ClusterTree::new(&coordinates, 1, &configuration).unwrap();
        let root = tree.root();
        let left = tree.node(root.children()[0]).unwrap();
        let right = tree.node(root.children()[1]).unwrap();

        assert!((left.diameter() - 1.0).abs() < 1e-14);
        assert!((left.distance(right) - 9.0).abs() < 1e-14);
        assert_eq!(root.distance(left), 0.0);
        assert_ne!(left, right);
        assert!(left < right);
    }
}
