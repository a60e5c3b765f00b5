//! Local and global products with distributed hierarchical matrices.
use std::sync::atomic::Ordering;
use std::time::Instant;

use rlst::{
    empty_array, rlst_dynamic_array2, MultIntoResize, RawAccess, RawAccessMut, RlstScalar,
};

use crate::hmatrix::types::{BlockTree, HMatrix, Leaf, LeafData};
use crate::traits::hmatrix::DistributedOperator;
use crate::traits::parallel::Collective;
use crate::traits::tree::Tree;
use crate::traits::types::{HMatrixError, Result};
use crate::tree::types::ClusterTree;

impl<Scalar, Comm> HMatrix<Scalar, Comm>
where
    Scalar: RlstScalar,
    Comm: Collective<Scalar>,
{
    /// Rank of this worker
    pub fn rank(&self) -> usize {
        self.block_tree.rank
    }

    /// Number of workers
    pub fn n_workers(&self) -> usize {
        self.target_tree.layout.n_workers()
    }

    /// Assembled leaves of this worker, in block tree order
    pub fn leaves(&self) -> &[Leaf<Scalar>] {
        &self.leaves
    }

    /// Block partition of this worker's rows
    pub fn block_tree(&self) -> &BlockTree {
        &self.block_tree
    }

    /// Cluster tree over targets
    pub fn target_tree(&self) -> &ClusterTree<Scalar::Real> {
        &self.target_tree
    }

    /// Cluster tree over sources
    pub fn source_tree(&self) -> &ClusterTree<Scalar::Real> {
        &self.source_tree
    }

    fn record_matvec(&self, start: Instant) {
        let elapsed = start.elapsed();
        self.n_matvecs.fetch_add(1, Ordering::Relaxed);
        self.matvec_nanos
            .fetch_add(elapsed.as_nanos() as u64, Ordering::Relaxed);
        log::debug!("Rank {} product in {:?}", self.rank(), elapsed);
    }
}

impl<Scalar, Comm> DistributedOperator for HMatrix<Scalar, Comm>
where
    Scalar: RlstScalar,
    Comm: Collective<Scalar>,
{
    type Scalar = Scalar;

    fn n_rows(&self) -> usize {
        self.target_tree.n_points()
    }

    fn n_cols(&self) -> usize {
        self.source_tree.n_points()
    }

    fn local_offset(&self) -> usize {
        self.target_tree
            .layout
            .range(self.rank())
            .map_or(0, |(offset, _)| offset)
    }

    fn local_size(&self) -> usize {
        self.target_tree
            .layout
            .range(self.rank())
            .map_or(0, |(_, size)| size)
    }

    fn local_matvec(&self, x_cluster: &[Scalar], y_local: &mut [Scalar]) -> Result<()> {
        self.local_matmat(x_cluster, 1, y_local)
    }

    fn local_matmat(
        &self,
        x_cluster: &[Scalar],
        n_vecs: usize,
        y_local: &mut [Scalar],
    ) -> Result<()> {
        let n_cols = self.n_cols();
        let local_offset = self.local_offset();
        let local_size = self.local_size();

        if x_cluster.len() != n_cols * n_vecs || y_local.len() != local_size * n_vecs {
            return Err(HMatrixError::InvalidInput(format!(
                "expected input of length {} and output of length {}, found {} and {}",
                n_cols * n_vecs,
                local_size * n_vecs,
                x_cluster.len(),
                y_local.len()
            )));
        }

        y_local.iter_mut().for_each(|y| *y = Scalar::zero());

        if n_vecs == 0 {
            return Ok(());
        }

        for leaf in self.leaves.iter() {
            if leaf.target_size == 0 || leaf.source_size == 0 {
                continue;
            }
            let rows = leaf.target_offset - local_offset;

            // Gather the leaf's slice of every right hand side into one [source_size, n_vecs] block
            let mut x_leaf = rlst_dynamic_array2!(Scalar, [leaf.source_size, n_vecs]);
            for (v, column) in x_leaf
                .data_mut()
                .chunks_exact_mut(leaf.source_size)
                .enumerate()
            {
                let start = v * n_cols + leaf.source_offset;
                column.copy_from_slice(&x_cluster[start..start + leaf.source_size]);
            }

            let y_leaf = match &leaf.data {
                LeafData::Dense(block) => {
                    empty_array::<Scalar, 2>().simple_mult_into_resize(block.view(), x_leaf.view())
                }
                LeafData::LowRank(factors) => factors.apply(&x_leaf),
            };

            for (v, column) in y_leaf.data().chunks_exact(leaf.target_size).enumerate() {
                let start = v * local_size + rows;
                y_local[start..start + leaf.target_size]
                    .iter_mut()
                    .zip(column.iter())
                    .for_each(|(y, &value)| *y += value);
            }
        }

        Ok(())
    }

    fn matvec(&self, x: &[Scalar]) -> Result<Vec<Scalar>> {
        self.matmat(x, 1)
    }

    fn matmat(&self, x: &[Scalar], n_vecs: usize) -> Result<Vec<Scalar>> {
        let start = Instant::now();

        let n_rows = self.n_rows();
        let n_cols = self.n_cols();
        let local_size = self.local_size();

        if x.len() != n_cols * n_vecs {
            return Err(HMatrixError::InvalidInput(format!(
                "expected input of length {}, found {}",
                n_cols * n_vecs,
                x.len()
            )));
        }

        let mut x_cluster = vec![Scalar::zero(); n_cols * n_vecs];
        for (input, output) in x.chunks(n_cols).zip(x_cluster.chunks_mut(n_cols)) {
            self.source_tree.global_to_cluster(input, output)?;
        }

        let mut y_local = vec![Scalar::zero(); local_size * n_vecs];
        self.local_matmat(&x_cluster, n_vecs, &mut y_local)?;

        // Each worker contributes its rows of every vector, gathered in rank order
        let layout = &self.target_tree.layout;
        let counts = layout
            .counts()
            .iter()
            .map(|&c| c * n_vecs)
            .collect::<Vec<_>>();
        let mut gathered = vec![Scalar::zero(); n_rows * n_vecs];
        self.communicator
            .all_gather_varcount(&y_local, &counts, &mut gathered)?;

        let mut y_cluster = vec![Scalar::zero(); n_rows * n_vecs];
        for (&(offset, size), &displacement) in
            layout.master_offsets.iter().zip(layout.displacements().iter())
        {
            let chunk = &gathered[displacement * n_vecs..(displacement + size) * n_vecs];
            for v in 0..n_vecs {
                y_cluster[v * n_rows + offset..v * n_rows + offset + size]
                    .copy_from_slice(&chunk[v * size..(v + 1) * size]);
            }
        }

        let mut y = vec![Scalar::zero(); n_rows * n_vecs];
        for (input, output) in y_cluster.chunks(n_rows).zip(y.chunks_mut(n_rows)) {
            self.target_tree.cluster_to_global(input, output)?;
        }

        self.record_matvec(start);

        Ok(y)
    }

    fn source_to_cluster(&self, x: &[Scalar], x_cluster: &mut [Scalar]) -> Result<()> {
        self.source_tree.global_to_cluster(x, x_cluster)
    }

    fn cluster_to_target(&self, y_cluster: &[Scalar], y: &mut [Scalar]) -> Result<()> {
        self.target_tree.cluster_to_global(y_cluster, y)
    }
}
