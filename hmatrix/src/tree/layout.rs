//! Used for discovering the distribution of points over workers
use itertools::Itertools;

use crate::tree::types::Layout;

impl Layout {
    /// Number of workers
    pub fn n_workers(&self) -> usize {
        self.master_offsets.len()
    }

    /// Total number of points distributed
    pub fn n_points(&self) -> usize {
        self.master_offsets.iter().map(|&(_, size)| size).sum()
    }

    /// `(offset, size)` of the range owned by a worker
    pub fn range(&self, rank: usize) -> Option<(usize, usize)> {
        self.master_offsets.get(rank).copied()
    }

    /// Number of points owned by each worker, in rank order
    pub fn counts(&self) -> Vec<usize> {
        self.master_offsets.iter().map(|&(_, size)| size).collect_vec()
    }

    /// Offsets of each worker's range, in rank order
    pub fn displacements(&self) -> Vec<usize> {
        self.master_offsets
            .iter()
            .map(|&(offset, _)| offset)
            .collect_vec()
    }

    /// Rank owning a position in cluster ordering
    pub fn rank_from_index(&self, index: usize) -> Option<usize> {
        let rank = self
            .master_offsets
            .partition_point(|&(offset, size)| offset + size <= index);
        self.master_offsets
            .get(rank)
            .and_then(|&(offset, size)| (index >= offset && index < offset + size).then_some(rank))
    }
}

#[cfg(test)]
mod test {
    use crate::tree::types::Layout;

    #[test]
    fn test_rank_from_index() {
        let layout = Layout {
            master_offsets: vec![(0, 3), (3, 5), (8, 2)],
            local_roots: vec![1, 2, 3],
        };

        assert_eq!(layout.n_workers(), 3);
        assert_eq!(layout.n_points(), 10);
        assert_eq!(layout.counts(), vec![3, 5, 2]);
        assert_eq!(layout.displacements(), vec![0, 3, 8]);
        assert_eq!(layout.rank_from_index(0), Some(0));
        assert_eq!(layout.rank_from_index(2), Some(0));
        assert_eq!(layout.rank_from_index(3), Some(1));
        assert_eq!(layout.rank_from_index(7), Some(1));
        assert_eq!(layout.rank_from_index(9), Some(2));
        assert_eq!(layout.rank_from_index(10), None);
        assert_eq!(layout.range(1), Some((3, 5)));
        assert_eq!(layout.range(3), None);
    }
}
