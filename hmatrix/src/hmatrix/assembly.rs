//! Assembly of leaf blocks.
use rayon::prelude::*;
use rlst::{rlst_dynamic_array2, RawAccessMut, RlstScalar};

use crate::hmatrix::types::{BlockTree, BlockType, Leaf, LeafData};
use crate::traits::compression::LowRankCompressor;
use crate::traits::generator::Generator;
use crate::traits::tree::{Tree, TreeNode};
use crate::tree::types::ClusterTree;

/// Dense storage of the block `A[rows, cols]`.
fn dense_block<Scalar, G>(generator: &G, rows: &[usize], cols: &[usize]) -> LeafData<Scalar>
where
    Scalar: RlstScalar,
    G: Generator<Scalar = Scalar>,
{
    let mut block = rlst_dynamic_array2!(Scalar, [rows.len(), cols.len()]);
    generator.copy_submatrix(rows, cols, block.data_mut());
    LeafData::Dense(block)
}

/// Assemble all leaves of a block tree, in the order of the block tree's leaves.
///
/// Leaves are independent and assembled in parallel. Admissible blocks the compressor declines are
/// stored densely.
pub(crate) fn assemble_leaves<Scalar, G, C>(
    generator: &G,
    compressor: &C,
    target_tree: &ClusterTree<Scalar::Real>,
    source_tree: &ClusterTree<Scalar::Real>,
    block_tree: &BlockTree,
    epsilon: Scalar::Real,
) -> Vec<Leaf<Scalar>>
where
    Scalar: RlstScalar + Send + Sync,
    <Scalar as RlstScalar>::Real: Send + Sync,
    G: Generator<Scalar = Scalar> + Sync,
    C: LowRankCompressor<Scalar> + Sync,
{
    let target_indices = target_tree.global_indices();
    let source_indices = source_tree.global_indices();

    block_tree
        .leaves
        .par_iter()
        .map(|&index| {
            let block = &block_tree.nodes[index];
            let target = &target_tree.nodes[block.target];
            let source = &source_tree.nodes[block.source];

            let rows = &target_indices[target.offset()..target.offset() + target.size()];
            let cols = &source_indices[source.offset()..source.offset() + source.size()];

            let rank = target_tree
                .layout
                .rank_from_index(target.offset)
                .unwrap_or(block_tree.rank);

            let data = match block.block_type {
                BlockType::LowRank => match compressor.compress(generator, rows, cols, epsilon) {
                    Some(factors) => LeafData::LowRank(factors),
                    None => {
                        log::debug!(
                            "Block [{}, {}) x [{}, {}) not compressible, stored densely",
                            target.offset,
                            target.offset + target.size,
                            source.offset,
                            source.offset + source.size
                        );
                        dense_block(generator, rows, cols)
                    }
                },
                _ => dense_block(generator, rows, cols),
            };

            Leaf {
                target_offset: target.offset,
                target_size: target.size,
                source_offset: source.offset,
                source_size: source.size,
                rank,
                data,
            }
        })
        .collect::<Vec<_>>()
}
