//! Construction of cluster trees by recursive principal axis splitting.
use std::cmp::Ordering;

use num::Float;
use rlst::RlstScalar;

use crate::hmatrix::types::Configuration;
use crate::traits::general::real;
use crate::traits::types::{HMatrixError, Result};
use crate::tree::constants::{DIM, POWER_ITERATIONS, POWER_ITERATION_TOLERANCE};
use crate::tree::types::{ClusterNode, ClusterTree, Layout};

/// Borrowed per point data, indexed by input position.
struct PointData<'a, T> {
    coordinates: &'a [T],
    radii: Option<&'a [T]>,
    weights: Option<&'a [T]>,
}

impl<'a, T> PointData<'a, T>
where
    T: RlstScalar<Real = T> + Float,
{
    fn point(&self, position: usize) -> [T; 3] {
        let i = DIM * position;
        [
            self.coordinates[i],
            self.coordinates[i + 1],
            self.coordinates[i + 2],
        ]
    }

    fn radius(&self, position: usize) -> T {
        self.radii.map_or(T::zero(), |r| r[position])
    }

    fn weight(&self, position: usize) -> T {
        self.weights.map_or(T::one(), |w| w[position])
    }

    /// Weights used for a cluster, unit weights replace weights summing to zero.
    fn cluster_weights(&self, positions: &[usize]) -> Vec<T> {
        let weights = positions.iter().map(|&p| self.weight(p)).collect::<Vec<_>>();
        let total = weights.iter().fold(T::zero(), |acc, &w| acc + w);
        if total > T::zero() {
            weights
        } else {
            vec![T::one(); positions.len()]
        }
    }

    /// Weighted centre and enclosing radius of a cluster
    fn geometry(&self, positions: &[usize]) -> ([T; 3], T) {
        let weights = self.cluster_weights(positions);
        let total = weights.iter().fold(T::zero(), |acc, &w| acc + w);

        let mut centre = [T::zero(); 3];
        for (&p, &w) in positions.iter().zip(weights.iter()) {
            let x = self.point(p);
            for d in 0..DIM {
                centre[d] = centre[d] + w * x[d];
            }
        }
        centre.iter_mut().for_each(|c| *c = *c / total);

        let radius = positions.iter().fold(T::zero(), |acc, &p| {
            let x = self.point(p);
            let distance = Float::sqrt(
                (0..DIM)
                    .map(|d| (x[d] - centre[d]) * (x[d] - centre[d]))
                    .fold(T::zero(), |a, b| a + b),
            );
            Float::max(acc, distance + self.radius(p))
        });

        (centre, radius)
    }

    /// Dominant eigenvector of the weighted covariance of a cluster, found by power iteration started
    /// from the axis of largest extent. Degenerate clusters return the axis of largest extent.
    fn principal_axis(&self, positions: &[usize], centre: &[T; 3]) -> [T; 3] {
        let weights = self.cluster_weights(positions);

        let mut min = [T::infinity(); 3];
        let mut max = [T::neg_infinity(); 3];
        let mut covariance = [[T::zero(); 3]; 3];

        for (&p, &w) in positions.iter().zip(weights.iter()) {
            let x = self.point(p);
            for a in 0..DIM {
                min[a] = Float::min(min[a], x[a]);
                max[a] = Float::max(max[a], x[a]);
                for b in 0..DIM {
                    covariance[a][b] =
                        covariance[a][b] + w * (x[a] - centre[a]) * (x[b] - centre[b]);
                }
            }
        }

        let mut largest = 0;
        for a in 1..DIM {
            if max[a] - min[a] > max[largest] - min[largest] {
                largest = a;
            }
        }

        let mut axis = [T::zero(); 3];
        axis[largest] = T::one();

        let tolerance = real::<T>(POWER_ITERATION_TOLERANCE);
        let mut rayleigh = T::zero();

        for _ in 0..POWER_ITERATIONS {
            let mut next = [T::zero(); 3];
            for a in 0..DIM {
                for b in 0..DIM {
                    next[a] = next[a] + covariance[a][b] * axis[b];
                }
            }

            let norm = Float::sqrt(next.iter().fold(T::zero(), |acc, &v| acc + v * v));
            if norm <= T::zero() || !Float::is_finite(norm) {
                break;
            }

            next.iter_mut().for_each(|v| *v = *v / norm);
            axis = next;

            if Float::abs(norm - rayleigh) <= tolerance * norm {
                break;
            }
            rayleigh = norm;
        }

        axis
    }

    /// Sort a cluster's points by projection onto `axis` and cut them into `n_chunks` non-empty
    /// contiguous chunks holding roughly equal weight. Ties in the projection are broken by label.
    ///
    /// Returns the size of each chunk.
    fn split(
        &self,
        positions: &mut [usize],
        labels: &[usize],
        centre: &[T; 3],
        axis: &[T; 3],
        n_chunks: usize,
    ) -> Vec<usize> {
        let mut projected = positions
            .iter()
            .map(|&p| {
                let x = self.point(p);
                let projection = (0..DIM)
                    .map(|d| (x[d] - centre[d]) * axis[d])
                    .fold(T::zero(), |a, b| a + b);
                (projection, labels[p], p)
            })
            .collect::<Vec<_>>();

        projected.sort_by(|a, b| {
            a.0.partial_cmp(&b.0)
                .unwrap_or(Ordering::Equal)
                .then(a.1.cmp(&b.1))
        });

        positions
            .iter_mut()
            .zip(projected.iter())
            .for_each(|(p, &(_, _, sorted))| *p = sorted);

        let weights = self.cluster_weights(positions);
        let mut prefix = Vec::with_capacity(weights.len() + 1);
        prefix.push(T::zero());
        for &w in weights.iter() {
            let last = prefix[prefix.len() - 1];
            prefix.push(last + w);
        }
        let total = prefix[prefix.len() - 1];

        let size = positions.len();
        let mut boundaries = Vec::with_capacity(n_chunks + 1);
        boundaries.push(0usize);

        for chunk in 1..n_chunks {
            let target = total * real::<T>(chunk as f64) / real::<T>(n_chunks as f64);
            let boundary = prefix.partition_point(|&p| p < target);
            let lower = boundaries[chunk - 1] + 1;
            let upper = size - (n_chunks - chunk);
            boundaries.push(boundary.clamp(lower, upper));
        }
        boundaries.push(size);

        boundaries.windows(2).map(|w| w[1] - w[0]).collect()
    }
}

impl<T> ClusterTree<T>
where
    T: RlstScalar<Real = T> + Float,
{
    /// Construct a cluster tree over a set of points.
    ///
    /// # Arguments
    /// * `coordinates` - Interleaved coordinates `[x_1, y_1, z_1, ..., x_n, y_n, z_n]`.
    /// * `n_workers` - Number of workers, the root is split into one subtree per worker.
    /// * `configuration` - Splitting parameters.
    pub fn new(coordinates: &[T], n_workers: usize, configuration: &Configuration) -> Result<Self> {
        Self::with_data(coordinates, None, None, None, n_workers, configuration)
    }

    /// Construct a cluster tree over a set of points carrying optional radii, weights and labels.
    ///
    /// # Arguments
    /// * `coordinates` - Interleaved coordinates `[x_1, y_1, z_1, ..., x_n, y_n, z_n]`.
    /// * `radii` - Non-negative radius of each point, zero by default. Enlarges cluster radii.
    /// * `weights` - Non-negative weight of each point, one by default. Moves cluster centres and
    ///   balances splits by weight rather than by count.
    /// * `labels` - Original index of each point, a permutation of `0..n`. Defaults to `0..n`.
    /// * `n_workers` - Number of workers, the root is split into one subtree per worker.
    /// * `configuration` - Splitting parameters.
    pub fn with_data(
        coordinates: &[T],
        radii: Option<&[T]>,
        weights: Option<&[T]>,
        labels: Option<&[usize]>,
        n_workers: usize,
        configuration: &Configuration,
    ) -> Result<Self> {
        configuration.validate()?;

        if coordinates.len() % DIM != 0 {
            return Err(HMatrixError::InvalidInput(format!(
                "coordinate buffer of length {} does not hold three dimensional points",
                coordinates.len()
            )));
        }

        let n_points = coordinates.len() / DIM;

        if n_points == 0 {
            return Err(HMatrixError::InvalidInput(
                "cannot cluster an empty point set".to_string(),
            ));
        }

        if coordinates.iter().any(|c| !Float::is_finite(*c)) {
            return Err(HMatrixError::InvalidInput(
                "coordinates must be finite".to_string(),
            ));
        }

        if n_workers == 0 || n_workers > n_points {
            return Err(HMatrixError::InvalidConfiguration(format!(
                "cannot distribute {} points over {} workers",
                n_points, n_workers
            )));
        }

        for (name, data) in [("radii", radii), ("weights", weights)] {
            if let Some(data) = data {
                if data.len() != n_points {
                    return Err(HMatrixError::InvalidInput(format!(
                        "expected {} {}, found {}",
                        n_points,
                        name,
                        data.len()
                    )));
                }
                if data.iter().any(|&v| !Float::is_finite(v) || v < T::zero()) {
                    return Err(HMatrixError::InvalidInput(format!(
                        "{} must be finite and non-negative",
                        name
                    )));
                }
            }
        }

        let labels = match labels {
            Some(labels) => {
                if labels.len() != n_points {
                    return Err(HMatrixError::InvalidInput(format!(
                        "expected {} labels, found {}",
                        n_points,
                        labels.len()
                    )));
                }
                let mut seen = vec![false; n_points];
                for &label in labels.iter() {
                    if label >= n_points || seen[label] {
                        return Err(HMatrixError::InvalidInput(
                            "labels must be a permutation of 0..n".to_string(),
                        ));
                    }
                    seen[label] = true;
                }
                labels.to_vec()
            }
            None => (0..n_points).collect(),
        };

        let data = PointData {
            coordinates,
            radii,
            weights,
        };

        let min_leaf_size = configuration.min_leaf_size;
        let max_depth = configuration.max_depth;
        let branching_factor = configuration.branching_factor;

        // Input positions in cluster ordering
        let mut positions = (0..n_points).collect::<Vec<_>>();

        let (centre, radius) = data.geometry(&positions);
        let mut nodes = vec![ClusterNode {
            index: 0,
            offset: 0,
            size: n_points,
            depth: 0,
            centre,
            radius,
            parent: None,
            children: Vec::new(),
        }];

        let mut stack = vec![0usize];
        while let Some(index) = stack.pop() {
            let ClusterNode {
                offset,
                size,
                depth,
                centre,
                ..
            } = nodes[index].clone();

            let n_children = if index == 0 && n_workers > 1 {
                n_workers
            } else if size <= min_leaf_size || depth >= max_depth || size < branching_factor {
                continue;
            } else {
                branching_factor
            };

            let cluster = &mut positions[offset..offset + size];
            let axis = data.principal_axis(cluster, &centre);
            let sizes = data.split(cluster, &labels, &centre, &axis, n_children);

            let first_child = nodes.len();
            let mut child_offset = offset;
            for child_size in sizes {
                let (child_centre, child_radius) =
                    data.geometry(&positions[child_offset..child_offset + child_size]);
                nodes.push(ClusterNode {
                    index: nodes.len(),
                    offset: child_offset,
                    size: child_size,
                    depth: depth + 1,
                    centre: child_centre,
                    radius: child_radius,
                    parent: Some(index),
                    children: Vec::new(),
                });
                child_offset += child_size;
            }

            nodes[index].children = (first_child..nodes.len()).collect();
            stack.extend((first_child..nodes.len()).rev());
        }

        let layout = if n_workers == 1 {
            Layout {
                master_offsets: vec![(0, n_points)],
                local_roots: vec![0],
            }
        } else {
            Layout {
                master_offsets: nodes[0]
                    .children
                    .iter()
                    .map(|&c| (nodes[c].offset, nodes[c].size))
                    .collect(),
                local_roots: nodes[0].children.clone(),
            }
        };

        let depth = nodes.iter().map(|n| n.depth).max().unwrap_or(0);

        let truncated = nodes
            .iter()
            .filter(|n| n.children.is_empty() && n.size > min_leaf_size)
            .count();
        if truncated > 0 {
            log::warn!(
                "{} leaves exceed the minimum leaf size of {} after reaching depth {}",
                truncated,
                min_leaf_size,
                depth
            );
        }

        let mut sorted_coordinates = Vec::with_capacity(DIM * n_points);
        for &p in positions.iter() {
            sorted_coordinates.extend_from_slice(&data.point(p));
        }

        let global_indices = positions.iter().map(|&p| labels[p]).collect::<Vec<_>>();

        log::debug!(
            "Cluster tree over {} points: {} nodes, depth {}, {} workers",
            n_points,
            nodes.len(),
            depth,
            n_workers
        );

        Ok(ClusterTree {
            nodes,
            coordinates: sorted_coordinates,
            global_indices,
            layout,
            depth,
        })
    }
}

#[cfg(test)]
mod test {
    use itertools::Itertools;
    use rlst::RawAccess;

    use crate::hmatrix::types::Configuration;
    use crate::traits::tree::{Tree, TreeNode};
    use crate::tree::helpers::{grid_points, points_fixture};
    use crate::tree::types::ClusterTree;

    fn configuration(min_leaf_size: usize) -> Configuration {
        Configuration {
            min_leaf_size,
            ..Default::default()
        }
    }

    #[test]
    fn test_children_tile_parents() {
        let n_points = 1000;
        let points = points_fixture::<f64>(n_points, None, None, Some(1));
        let tree = ClusterTree::new(points.data(), 1, &configuration(10)).unwrap();

        for node in tree.nodes.iter() {
            if node.is_leaf() {
                continue;
            }
            let mut offset = node.offset;
            for &c in node.children.iter() {
                let child = tree.node(c).unwrap();
                assert!(child.size > 0);
                assert_eq!(child.offset, offset);
                assert_eq!(child.parent, Some(node.index));
                assert_eq!(child.depth, node.depth + 1);
                offset += child.size;
            }
            assert_eq!(offset, node.offset + node.size);
        }

        // Leaves tile the root
        let mut offset = 0;
        for leaf in tree.leaves() {
            assert_eq!(leaf.offset, offset);
            assert!(leaf.size <= 10);
            offset += leaf.size;
        }
        assert_eq!(offset, n_points);
    }

    #[test]
    fn test_global_indices_permutation() {
        let n_points = 500;
        let points = points_fixture::<f64>(n_points, None, None, Some(2));
        let tree = ClusterTree::new(points.data(), 3, &configuration(10)).unwrap();

        let sorted = tree.global_indices.iter().copied().sorted().collect_vec();
        assert_eq!(sorted, (0..n_points).collect_vec());

        // Coordinates follow the permutation
        for (i, &g) in tree.global_indices.iter().enumerate() {
            for d in 0..3 {
                assert_eq!(tree.coordinates[3 * i + d], points.data()[3 * g + d]);
            }
        }
    }

    #[test]
    fn test_bounding_spheres() {
        let n_points = 300;
        let points = points_fixture::<f64>(n_points, Some(-1.0), Some(1.0), Some(3));
        let tree = ClusterTree::new(points.data(), 1, &configuration(5)).unwrap();

        for node in tree.nodes.iter() {
            for i in node.offset..node.offset + node.size {
                let distance = (0..3)
                    .map(|d| (tree.coordinates[3 * i + d] - node.centre[d]).powi(2))
                    .sum::<f64>()
                    .sqrt();
                assert!(distance <= node.radius + 1e-12);
            }
        }
    }

    #[test]
    fn test_split_along_principal_axis() {
        // Points spread along the diagonal, the first split must separate the two ends
        let n_points = 100;
        let coordinates = (0..n_points)
            .flat_map(|i| {
                let t = i as f64;
                [t, t, 0.01 * (i % 3) as f64]
            })
            .collect_vec();

        let tree = ClusterTree::new(&coordinates, 1, &configuration(10)).unwrap();
        let root = tree.root();
        assert_eq!(root.children.len(), 2);

        let left = tree.node(root.children[0]).unwrap();
        let right = tree.node(root.children[1]).unwrap();
        assert_eq!(left.size, 50);
        assert_eq!(right.size, 50);

        let mut left_indices = tree.global_indices[left.offset..left.offset + left.size].to_vec();
        left_indices.sort();
        let lower = (0..50).collect_vec();
        let upper = (50..100).collect_vec();
        assert!(left_indices == lower || left_indices == upper);
    }

    #[test]
    fn test_weighted_centre_and_split() {
        // Two points, the heavier one pulls the centre
        let coordinates: [f64; 6] = [0.0, 0.0, 0.0, 1.0, 0.0, 0.0];
        let weights = [3.0, 1.0];
        let tree =
            ClusterTree::with_data(&coordinates, None, Some(&weights), None, 1, &configuration(1))
                .unwrap();
        assert!((tree.root().centre[0] - 0.25).abs() < 1e-14);
        assert!((tree.root().radius - 0.75).abs() < 1e-14);
        assert_eq!(tree.root().children.len(), 2);
    }

    #[test]
    fn test_point_radii_enlarge_clusters() {
        let coordinates: [f64; 6] = [0.0, 0.0, 0.0, 2.0, 0.0, 0.0];
        let radii = [0.5, 0.5];
        let tree =
            ClusterTree::with_data(&coordinates, Some(&radii), None, None, 1, &configuration(10))
                .unwrap();
        assert!((tree.root().radius - 1.5).abs() < 1e-14);
    }

    #[test]
    fn test_labels() {
        let coordinates = [0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 2.0, 0.0, 0.0];
        let labels = [2, 0, 1];
        let tree =
            ClusterTree::with_data(&coordinates, None, None, Some(&labels), 1, &configuration(1))
                .unwrap();
        let sorted = tree.global_indices.iter().copied().sorted().collect_vec();
        assert_eq!(sorted, vec![0, 1, 2]);

        let invalid = [0, 0, 1];
        assert!(
            ClusterTree::with_data(&coordinates, None, None, Some(&invalid), 1, &configuration(1))
                .is_err()
        );
    }

    #[test]
    fn test_identical_points_terminate() {
        let coordinates = vec![1.0f64; 3 * 64];
        let tree = ClusterTree::new(&coordinates, 2, &configuration(4)).unwrap();

        for leaf in tree.leaves() {
            assert!(leaf.size <= 4);
        }
        assert_eq!(tree.layout.master_offsets, vec![(0, 32), (32, 32)]);
    }

    #[test]
    fn test_worker_split() {
        let n_points = 1000;
        let points = grid_points::<f64>(n_points, 0.0);

        for n_workers in [1, 2, 3, 4, 7] {
            let tree = ClusterTree::new(points.data(), n_workers, &configuration(10)).unwrap();
            assert_eq!(tree.n_workers(), n_workers);
            assert_eq!(tree.layout.master_offsets.len(), n_workers);

            let mut offset = 0;
            for rank in 0..n_workers {
                let (o, s) = tree.layout.master_offsets[rank];
                let local_root = tree.local_root(rank).unwrap();
                assert_eq!(o, offset);
                assert_eq!(local_root.offset, o);
                assert_eq!(local_root.size, s);
                assert!(s > 0);
                offset += s;
            }
            assert_eq!(offset, n_points);
        }
    }

    #[test]
    fn test_max_depth() {
        let n_points = 1000;
        let points = points_fixture::<f64>(n_points, None, None, Some(4));
        let configuration = Configuration {
            min_leaf_size: 1,
            max_depth: 3,
            ..Default::default()
        };
        let tree = ClusterTree::new(points.data(), 1, &configuration).unwrap();
        assert_eq!(tree.depth(), 3);
        assert_eq!(tree.leaves().len(), 8);
    }

    #[test]
    fn test_branching_factor() {
        let n_points = 270;
        let points = points_fixture::<f64>(n_points, None, None, Some(5));
        let configuration = Configuration {
            min_leaf_size: 10,
            branching_factor: 3,
            ..Default::default()
        };
        let tree = ClusterTree::new(points.data(), 1, &configuration).unwrap();
        for node in tree.nodes.iter().filter(|n| !n.is_leaf()) {
            assert_eq!(node.children.len(), 3);
        }
    }

    #[test]
    fn test_invalid_inputs() {
        let configuration = configuration(10);
        assert!(ClusterTree::<f64>::new(&[], 1, &configuration).is_err());
        assert!(ClusterTree::<f64>::new(&[0.0, 1.0], 1, &configuration).is_err());
        assert!(ClusterTree::<f64>::new(&[0.0, 1.0, 2.0], 2, &configuration).is_err());
        assert!(ClusterTree::<f64>::new(&[0.0, 1.0, 2.0], 0, &configuration).is_err());
        assert!(ClusterTree::<f64>::new(&[0.0, f64::NAN, 2.0], 1, &configuration).is_err());
    }

    #[test]
    fn test_deterministic() {
        let points = points_fixture::<f64>(400, None, None, Some(6));
        let a = ClusterTree::new(points.data(), 2, &configuration(10)).unwrap();
        let b = ClusterTree::new(points.data(), 2, &configuration(10)).unwrap();
        assert_eq!(a.global_indices, b.global_indices);
        assert_eq!(a.nodes.len(), b.nodes.len());
    }
}
