//! Builder objects to construct hierarchical matrices
use std::sync::atomic::{AtomicU64, AtomicUsize};
use std::sync::Arc;
use std::time::Instant;

use num::Float;
use rlst::RlstScalar;

use crate::hmatrix::assembly::assemble_leaves;
use crate::hmatrix::constants::{
    DEFAULT_BRANCHING_FACTOR, DEFAULT_EPSILON, DEFAULT_ETA, DEFAULT_MAX_DEPTH,
    DEFAULT_MIN_LEAF_SIZE,
};
use crate::hmatrix::types::{BlockTree, Configuration, HMatrix, HMatrixBuilder};
use crate::linalg::aca::PartialAca;
use crate::traits::compression::LowRankCompressor;
use crate::traits::general::{real, Epsilon};
use crate::traits::generator::Generator;
use crate::traits::parallel::Collective;
use crate::traits::tree::Tree;
use crate::traits::types::{HMatrixError, Result};
use crate::tree::types::ClusterTree;

impl Default for Configuration {
    fn default() -> Self {
        Self {
            epsilon: DEFAULT_EPSILON,
            eta: DEFAULT_ETA,
            min_leaf_size: DEFAULT_MIN_LEAF_SIZE,
            max_depth: DEFAULT_MAX_DEPTH,
            branching_factor: DEFAULT_BRANCHING_FACTOR,
        }
    }
}

impl Configuration {
    /// Check that all parameters lie in their valid ranges.
    pub fn validate(&self) -> Result<()> {
        if !self.epsilon.is_finite() || self.epsilon <= 0.0 {
            return Err(HMatrixError::InvalidConfiguration(format!(
                "epsilon must be positive and finite, found {}",
                self.epsilon
            )));
        }

        if !self.eta.is_finite() || self.eta < 0.0 {
            return Err(HMatrixError::InvalidConfiguration(format!(
                "eta must be non-negative and finite, found {}",
                self.eta
            )));
        }

        if self.min_leaf_size == 0 {
            return Err(HMatrixError::InvalidConfiguration(
                "min_leaf_size must be at least 1".to_string(),
            ));
        }

        if self.max_depth == 0 {
            return Err(HMatrixError::InvalidConfiguration(
                "max_depth must be at least 1".to_string(),
            ));
        }

        if self.branching_factor < 2 {
            return Err(HMatrixError::InvalidConfiguration(format!(
                "branching_factor must be at least 2, found {}",
                self.branching_factor
            )));
        }

        Ok(())
    }
}

impl<Scalar, Comm> HMatrixBuilder<Scalar, Comm>
where
    Scalar: RlstScalar + Epsilon,
    Comm: Collective<Scalar>,
{
    /// Initialise an empty builder, with the default configuration.
    ///
    /// # Arguments
    /// * `communicator` - Communicator over all participating workers.
    pub fn new(communicator: Comm) -> Self {
        Self {
            communicator,
            configuration: Configuration::default(),
            target_tree: None,
            source_tree: None,
        }
    }

    /// Set the configuration, must be called before trees are built.
    ///
    /// # Arguments
    /// * `configuration` - Parameters controlling clustering, partitioning and compression.
    pub fn configuration(mut self, configuration: Configuration) -> Result<Self> {
        configuration.validate()?;

        if self.target_tree.is_some() {
            return Err(HMatrixError::InvalidInput(
                "configuration must be set before the cluster trees".to_string(),
            ));
        }

        self.configuration = configuration;
        Ok(self)
    }

    /// Cluster targets and sources.
    ///
    /// # Arguments
    /// * `targets` - Interleaved target coordinates `[x_1, y_1, z_1, ..., x_n, y_n, z_n]`.
    /// * `sources` - Interleaved source coordinates, if `None` sources coincide with targets and a
    ///   single tree is shared.
    pub fn tree(
        mut self,
        targets: &[Scalar::Real],
        sources: Option<&[Scalar::Real]>,
    ) -> Result<Self> {
        let n_workers = self.communicator.size();

        let target_tree = Arc::new(ClusterTree::new(targets, n_workers, &self.configuration)?);
        let source_tree = match sources {
            Some(sources) => Arc::new(ClusterTree::new(sources, n_workers, &self.configuration)?),
            None => Arc::clone(&target_tree),
        };

        self.target_tree = Some(target_tree);
        self.source_tree = Some(source_tree);
        Ok(self)
    }

    /// Use cluster trees built elsewhere, for example with point radii or weights.
    ///
    /// # Arguments
    /// * `target_tree` - Cluster tree over targets, partitioned for the communicator's size.
    /// * `source_tree` - Cluster tree over sources, may be the same tree as `target_tree`.
    pub fn trees(
        mut self,
        target_tree: Arc<ClusterTree<Scalar::Real>>,
        source_tree: Arc<ClusterTree<Scalar::Real>>,
    ) -> Result<Self> {
        let n_workers = self.communicator.size();

        if target_tree.n_workers() != n_workers {
            return Err(HMatrixError::InvalidConfiguration(format!(
                "target tree is partitioned over {} workers, communicator has {}",
                target_tree.n_workers(),
                n_workers
            )));
        }

        self.target_tree = Some(target_tree);
        self.source_tree = Some(source_tree);
        Ok(self)
    }

    /// Assemble the hierarchical matrix, compressing admissible blocks with partial ACA.
    ///
    /// # Arguments
    /// * `generator` - Access to the entries of the dense matrix, in original numbering.
    pub fn build<G>(self, generator: &G) -> Result<HMatrix<Scalar, Comm>>
    where
        G: Generator<Scalar = Scalar> + Sync,
        Scalar: Send + Sync,
        <Scalar as RlstScalar>::Real: Send + Sync,
    {
        self.build_with(generator, &PartialAca::default())
    }

    /// Assemble the hierarchical matrix with a given low rank compressor.
    ///
    /// # Arguments
    /// * `generator` - Access to the entries of the dense matrix, in original numbering.
    /// * `compressor` - Compression algorithm applied to admissible blocks.
    pub fn build_with<G, C>(self, generator: &G, compressor: &C) -> Result<HMatrix<Scalar, Comm>>
    where
        G: Generator<Scalar = Scalar> + Sync,
        C: LowRankCompressor<Scalar> + Sync,
        Scalar: Send + Sync,
        <Scalar as RlstScalar>::Real: Send + Sync,
    {
        let (target_tree, source_tree) = match (self.target_tree, self.source_tree) {
            (Some(t), Some(s)) => (t, s),
            _ => {
                return Err(HMatrixError::InvalidInput(
                    "cluster trees must be set before building".to_string(),
                ))
            }
        };

        if generator.n_rows() != target_tree.n_points()
            || generator.n_cols() != source_tree.n_points()
        {
            return Err(HMatrixError::InvalidInput(format!(
                "generator of shape [{}, {}] does not match {} targets and {} sources",
                generator.n_rows(),
                generator.n_cols(),
                target_tree.n_points(),
                source_tree.n_points()
            )));
        }

        let rank = self.communicator.rank();
        let eta = real::<Scalar::Real>(self.configuration.eta);
        let epsilon = real::<Scalar::Real>(self.configuration.epsilon);

        if Float::max(epsilon, Scalar::epsilon()) > epsilon {
            log::warn!(
                "compression tolerance {} is below machine precision",
                self.configuration.epsilon
            );
        }

        let block_tree = BlockTree::new(target_tree.as_ref(), source_tree.as_ref(), rank, eta)?;

        let start = Instant::now();
        let leaves = assemble_leaves(
            generator,
            compressor,
            target_tree.as_ref(),
            source_tree.as_ref(),
            &block_tree,
            epsilon,
        );
        let assembly_time = start.elapsed();

        log::info!(
            "Rank {} assembled {} leaves in {:?}",
            rank,
            leaves.len(),
            assembly_time
        );

        Ok(HMatrix {
            configuration: self.configuration,
            target_tree,
            source_tree,
            block_tree,
            leaves,
            communicator: self.communicator,
            assembly_time,
            n_matvecs: AtomicUsize::new(0),
            matvec_nanos: AtomicU64::new(0),
        })
    }
}
