//! Export of cluster partitions for visualisation.
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use num::Float;
use rlst::RlstScalar;

use crate::traits::types::Result;
use crate::tree::types::ClusterTree;

impl<T> ClusterTree<T>
where
    T: RlstScalar + Float,
{
    /// Label of the cluster containing each point at a given depth, in cluster ordering.
    ///
    /// Clusters are numbered in depth first order. Points under a leaf shallower than `depth` take
    /// the label of that leaf.
    pub fn partition_labels(&self, depth: u64) -> Vec<usize> {
        let mut labels = vec![0; self.global_indices.len()];
        let mut label = 0;
        let mut stack = vec![0usize];

        while let Some(index) = stack.pop() {
            let node = &self.nodes[index];
            if node.depth == depth || node.children.is_empty() {
                labels[node.offset..node.offset + node.size]
                    .iter_mut()
                    .for_each(|l| *l = label);
                label += 1;
            } else {
                stack.extend(node.children.iter().rev());
            }
        }

        labels
    }

    /// Write the cluster partition as CSV, one row per point in cluster ordering with columns
    /// `index,x,y,z` followed by the cluster label at each requested depth.
    ///
    /// # Arguments
    /// * `writer` - Destination.
    /// * `depths` - Depths at which to label clusters.
    pub fn write_partition<W: Write>(&self, writer: &mut W, depths: &[u64]) -> Result<()> {
        let labels = depths
            .iter()
            .map(|&d| self.partition_labels(d))
            .collect::<Vec<_>>();

        write!(writer, "index,x,y,z")?;
        for d in depths.iter() {
            write!(writer, ",depth_{}", d)?;
        }
        writeln!(writer)?;

        for (i, &global_index) in self.global_indices.iter().enumerate() {
            let x = &self.coordinates[3 * i..3 * i + 3];
            write!(writer, "{},{},{},{}", global_index, x[0], x[1], x[2])?;
            for l in labels.iter() {
                write!(writer, ",{}", l[i])?;
            }
            writeln!(writer)?;
        }

        Ok(())
    }

    /// Save the cluster partition as a CSV file, see [`ClusterTree::write_partition`].
    pub fn save_partition<P: AsRef<Path>>(&self, path: P, depths: &[u64]) -> Result<()> {
        let mut writer = BufWriter::new(File::create(path)?);
        self.write_partition(&mut writer, depths)?;
        writer.flush()?;
        Ok(())
    }
}
