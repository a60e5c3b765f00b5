//! Implementations of collective operations.
use rlst::RlstScalar;

use crate::hmatrix::types::SingleProcess;
use crate::traits::parallel::Collective;
use crate::traits::types::{HMatrixError, Result};

/// Check that a gather's buffers match the announced counts.
fn check_gather(local: usize, counts: &[usize], rank: usize, result: usize) -> Result<()> {
    if counts.get(rank) != Some(&local) {
        return Err(HMatrixError::Communication(format!(
            "rank {} contributes {} entries, expected {:?}",
            rank,
            local,
            counts.get(rank)
        )));
    }

    let total = counts.iter().sum::<usize>();
    if total != result {
        return Err(HMatrixError::Communication(format!(
            "gather of {} entries into buffer of length {}",
            total, result
        )));
    }

    Ok(())
}

/// Check that a reduction's buffers agree in length.
fn check_reduce(local: usize, result: usize) -> Result<()> {
    if local != result {
        return Err(HMatrixError::Communication(format!(
            "reduction of {} entries into buffer of length {}",
            local, result
        )));
    }
    Ok(())
}

impl<Scalar> Collective<Scalar> for SingleProcess
where
    Scalar: RlstScalar,
{
    fn rank(&self) -> usize {
        0
    }

    fn size(&self) -> usize {
        1
    }

    fn all_gather_varcount(
        &self,
        local: &[Scalar],
        counts: &[usize],
        result: &mut [Scalar],
    ) -> Result<()> {
        check_gather(local.len(), counts, 0, result.len())?;
        result.copy_from_slice(local);
        Ok(())
    }

    fn all_reduce_sum(&self, local: &[f64], result: &mut [f64]) -> Result<()> {
        check_reduce(local.len(), result.len())?;
        result.copy_from_slice(local);
        Ok(())
    }

    fn all_reduce_max(&self, local: &[f64], result: &mut [f64]) -> Result<()> {
        check_reduce(local.len(), result.len())?;
        result.copy_from_slice(local);
        Ok(())
    }
}

#[cfg(feature = "mpi")]
mod mpi_collective {
    use itertools::Itertools;
    use mpi::collective::SystemOperation;
    use mpi::datatype::PartitionMut;
    use mpi::topology::SimpleCommunicator;
    use mpi::traits::{CommunicatorCollectives, Communicator, Equivalence};
    use mpi::Count;
    use rlst::RlstScalar;

    use crate::traits::parallel::Collective;
    use crate::traits::types::{HMatrixError, Result};

    use super::{check_gather, check_reduce};

    fn to_count(n: usize) -> Result<Count> {
        Count::try_from(n).map_err(|_| {
            HMatrixError::Communication(format!("{} entries exceed the MPI count range", n))
        })
    }

    impl<Scalar> Collective<Scalar> for SimpleCommunicator
    where
        Scalar: RlstScalar + Equivalence,
    {
        fn rank(&self) -> usize {
            Communicator::rank(self) as usize
        }

        fn size(&self) -> usize {
            Communicator::size(self) as usize
        }

        fn all_gather_varcount(
            &self,
            local: &[Scalar],
            counts: &[usize],
            result: &mut [Scalar],
        ) -> Result<()> {
            let rank = <Self as Collective<Scalar>>::rank(self);
            check_gather(local.len(), counts, rank, result.len())?;

            let counts = counts
                .iter()
                .map(|&c| to_count(c))
                .collect::<Result<Vec<_>>>()?;
            let displacements = counts
                .iter()
                .scan(0, |acc, &x| {
                    let tmp = *acc;
                    *acc += x;
                    Some(tmp)
                })
                .collect_vec();

            {
                let mut partition = PartitionMut::new(result, &counts[..], &displacements[..]);
                self.all_gather_varcount_into(local, &mut partition);
            }

            Ok(())
        }

        fn all_reduce_sum(&self, local: &[f64], result: &mut [f64]) -> Result<()> {
            check_reduce(local.len(), result.len())?;
            self.all_reduce_into(local, result, SystemOperation::sum());
            Ok(())
        }

        fn all_reduce_max(&self, local: &[f64], result: &mut [f64]) -> Result<()> {
            check_reduce(local.len(), result.len())?;
            self.all_reduce_into(local, result, SystemOperation::max());
            Ok(())
        }
    }
}
