//! Diagnostics and accuracy checks for hierarchical matrices.
use std::collections::BTreeMap;
use std::fmt;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::atomic::Ordering;
use std::time::Duration;

use num::Zero;
use rlst::{RawAccess, RlstScalar};

use crate::hmatrix::types::{HMatrix, Infos, LeafData};
use crate::traits::general::to_f64;
use crate::traits::generator::Generator;
use crate::traits::parallel::Collective;
use crate::traits::tree::Tree;
use crate::traits::types::Result;

impl fmt::Display for Infos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (key, value) in self.to_map() {
            writeln!(f, "{}: {}", key, value)?;
        }
        Ok(())
    }
}

impl Infos {
    /// Key value view of the diagnostics, sorted by key
    pub fn to_map(&self) -> BTreeMap<String, String> {
        let entries = [
            ("n_rows", self.n_rows.to_string()),
            ("n_cols", self.n_cols.to_string()),
            ("n_workers", self.n_workers.to_string()),
            ("n_dense_leaves", self.n_dense_leaves.to_string()),
            ("n_low_rank_leaves", self.n_low_rank_leaves.to_string()),
            ("min_rank", self.min_rank.to_string()),
            ("max_rank", self.max_rank.to_string()),
            ("mean_rank", format!("{:.2}", self.mean_rank)),
            ("stored_entries", self.stored_entries.to_string()),
            ("covered_entries", self.covered_entries.to_string()),
            ("compression_ratio", format!("{:.4}", self.compression_ratio)),
            ("assembly_time", format!("{:.6}", self.assembly_time)),
            ("n_matvecs", self.n_matvecs.to_string()),
            ("matvec_time", format!("{:.6}", self.matvec_time)),
        ];

        entries
            .into_iter()
            .map(|(key, value)| (key.to_string(), value))
            .collect()
    }
}

impl<Scalar, Comm> HMatrix<Scalar, Comm>
where
    Scalar: RlstScalar,
    Comm: Collective<Scalar>,
{
    /// Diagnostics of the leaves held by this worker
    pub fn infos(&self) -> Infos {
        let mut infos = Infos {
            n_rows: self.target_tree.n_points(),
            n_cols: self.source_tree.n_points(),
            n_workers: self.target_tree.layout.n_workers(),
            assembly_time: self.assembly_time.as_secs_f64(),
            n_matvecs: self.n_matvecs.load(Ordering::Relaxed),
            matvec_time: Duration::from_nanos(self.matvec_nanos.load(Ordering::Relaxed))
                .as_secs_f64(),
            ..Default::default()
        };

        let mut min_rank = usize::MAX;
        let mut rank_sum = 0;

        for leaf in self.leaves.iter() {
            infos.covered_entries += leaf.target_size * leaf.source_size;
            match &leaf.data {
                LeafData::Dense(_) => {
                    infos.n_dense_leaves += 1;
                    infos.stored_entries += leaf.target_size * leaf.source_size;
                }
                LeafData::LowRank(factors) => {
                    infos.n_low_rank_leaves += 1;
                    infos.stored_entries += factors.n_entries();
                    min_rank = min_rank.min(factors.rank());
                    infos.max_rank = infos.max_rank.max(factors.rank());
                    rank_sum += factors.rank();
                }
            }
        }

        if infos.n_low_rank_leaves > 0 {
            infos.min_rank = min_rank;
            infos.mean_rank = rank_sum as f64 / infos.n_low_rank_leaves as f64;
        }

        if infos.covered_entries > 0 {
            infos.compression_ratio = infos.stored_entries as f64 / infos.covered_entries as f64;
        }

        infos
    }

    /// Diagnostics combined over all workers, collective.
    ///
    /// Counts and storage are summed, rank extremes and times are maxima over workers.
    pub fn global_infos(&self) -> Result<Infos> {
        let local = self.infos();
        let rank_sum = local.mean_rank * local.n_low_rank_leaves as f64;

        let sums = [
            local.n_dense_leaves as f64,
            local.n_low_rank_leaves as f64,
            rank_sum,
            local.stored_entries as f64,
            local.covered_entries as f64,
        ];
        let mut global_sums = [0f64; 5];
        self.communicator.all_reduce_sum(&sums, &mut global_sums)?;

        // Minimum rank found as the negated maximum, workers without low rank leaves don't contribute
        let maxima = [
            local.max_rank as f64,
            if local.n_low_rank_leaves > 0 {
                -(local.min_rank as f64)
            } else {
                f64::MIN
            },
            local.assembly_time,
            local.matvec_time,
        ];
        let mut global_maxima = [0f64; 4];
        self.communicator.all_reduce_max(&maxima, &mut global_maxima)?;

        let n_low_rank_leaves = global_sums[1] as usize;
        let stored_entries = global_sums[3] as usize;
        let covered_entries = global_sums[4] as usize;

        Ok(Infos {
            n_dense_leaves: global_sums[0] as usize,
            n_low_rank_leaves,
            min_rank: if n_low_rank_leaves > 0 {
                (-global_maxima[1]) as usize
            } else {
                0
            },
            max_rank: global_maxima[0] as usize,
            mean_rank: if n_low_rank_leaves > 0 {
                global_sums[2] / n_low_rank_leaves as f64
            } else {
                0.0
            },
            stored_entries,
            covered_entries,
            compression_ratio: if covered_entries > 0 {
                stored_entries as f64 / covered_entries as f64
            } else {
                0.0
            },
            assembly_time: global_maxima[2],
            matvec_time: global_maxima[3],
            ..local
        })
    }

    /// Squared Frobenius norms of the error `A - H` and of `A`, restricted to this worker's leaves.
    ///
    /// Evaluates every entry of the covered blocks, only intended for testing on small problems.
    pub fn local_frobenius_error<G>(&self, generator: &G) -> (Scalar::Real, Scalar::Real)
    where
        G: Generator<Scalar = Scalar>,
    {
        let target_indices = self.target_tree.global_indices();
        let source_indices = self.source_tree.global_indices();

        let mut error = Scalar::Real::zero();
        let mut norm = Scalar::Real::zero();

        for leaf in self.leaves.iter() {
            let rows = &target_indices[leaf.target_offset..leaf.target_offset + leaf.target_size];
            let cols = &source_indices[leaf.source_offset..leaf.source_offset + leaf.source_size];
            let m = rows.len();

            let mut block = vec![Scalar::zero(); m * cols.len()];
            generator.copy_submatrix(rows, cols, &mut block);

            let mut accumulate = |approximate: &[Scalar]| {
                for (&exact, &approximate) in block.iter().zip(approximate.iter()) {
                    let difference = (exact - approximate).abs();
                    let magnitude = exact.abs();
                    error = error + difference * difference;
                    norm = norm + magnitude * magnitude;
                }
            };

            match &leaf.data {
                LeafData::Dense(dense) => accumulate(dense.data()),
                LeafData::LowRank(factors) => accumulate(factors.to_dense().data()),
            }
        }

        (error, norm)
    }

    /// Absolute and relative Frobenius norm errors of the compressed matrix, collective.
    ///
    /// Evaluates every entry of the matrix, only intended for testing on small problems.
    pub fn frobenius_error<G>(&self, generator: &G) -> Result<(f64, f64)>
    where
        G: Generator<Scalar = Scalar>,
    {
        let (error, norm) = self.local_frobenius_error(generator);
        let local = [to_f64(error), to_f64(norm)];
        let mut global = [0f64; 2];
        self.communicator.all_reduce_sum(&local, &mut global)?;

        let absolute = global[0].sqrt();
        let relative = if global[1] > 0.0 {
            absolute / global[1].sqrt()
        } else {
            absolute
        };

        Ok((absolute, relative))
    }

    /// Write this worker's block partition as CSV, one row per leaf with columns
    /// `target_offset,target_size,source_offset,source_size,kind,rank`.
    ///
    /// The rank column holds the rank of low rank leaves, and the smaller block dimension for dense
    /// leaves.
    pub fn write_block_partition<W: Write>(&self, writer: &mut W) -> Result<()> {
        writeln!(
            writer,
            "target_offset,target_size,source_offset,source_size,kind,rank"
        )?;

        for leaf in self.leaves.iter() {
            let (kind, rank) = match &leaf.data {
                LeafData::Dense(_) => ("dense", leaf.target_size.min(leaf.source_size)),
                LeafData::LowRank(factors) => ("lowrank", factors.rank()),
            };
            writeln!(
                writer,
                "{},{},{},{},{},{}",
                leaf.target_offset,
                leaf.target_size,
                leaf.source_offset,
                leaf.source_size,
                kind,
                rank
            )?;
        }

        Ok(())
    }

    /// Save this worker's block partition as a CSV file, see [`HMatrix::write_block_partition`].
    pub fn save_block_partition<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let mut writer = BufWriter::new(File::create(path)?);
        self.write_block_partition(&mut writer)?;
        writer.flush()?;
        Ok(())
    }
}
