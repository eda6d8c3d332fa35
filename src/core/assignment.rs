//! Leaf-to-worker assignment.
//!
//! Leaves are dealt to workers round-robin by id (`id % nworkers`), so a
//! power-of-two worker count with a matching leafsize (see
//! [`leafsize_for_workers`](crate::core::dispatch::leafsize_for_workers))
//! gives each worker one leaf.

use crate::core::error::DecompositionError;
use crate::core::leaf::{Leaf, LeafId};

/// Mapping from leaves to worker ranks.
///
/// # Examples
///
/// ```rust
/// use domain_decomp::prelude::*;
///
/// let points = generate_random_points_in_box_seeded(160, &DomainBox::<2>::unit(), 4);
/// let leaves = kdtree(&points, [0.0; 2], [1.0; 2], 10).unwrap();
/// let assignment = assign_leaves_round_robin(&leaves, 3).unwrap();
///
/// assert_eq!(assignment.worker_of(0), Some(0));
/// assert_eq!(assignment.worker_of(4), Some(1));
/// assert_eq!(assignment.leaves_for(2), &[2, 5, 8, 11, 14]);
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WorkerAssignment {
    owners: Vec<usize>,
    by_worker: Vec<Vec<LeafId>>,
}

impl WorkerAssignment {
    /// Deals `leaves` to `nworkers` workers by `id % nworkers`.
    ///
    /// # Errors
    ///
    /// Returns [`DecompositionError::InvalidParameter`] if `nworkers` is zero or
    /// the leaf ids are not `0..leaves.len()` in order.
    pub fn round_robin<const D: usize>(
        leaves: &[Leaf<D>],
        nworkers: usize,
    ) -> Result<Self, DecompositionError> {
        if nworkers == 0 {
            return Err(DecompositionError::invalid(
                "nworkers",
                "at least one worker is required",
            ));
        }
        if let Some((position, leaf)) = leaves
            .iter()
            .enumerate()
            .find(|(position, leaf)| leaf.id() != *position)
        {
            return Err(DecompositionError::invalid(
                "leaves",
                format!("leaf at position {position} has id {}", leaf.id()),
            ));
        }

        let mut by_worker = vec![Vec::new(); nworkers];
        let owners = leaves
            .iter()
            .map(|leaf| {
                let worker = leaf.id() % nworkers;
                by_worker[worker].push(leaf.id());
                worker
            })
            .collect();

        if leaves.len() < nworkers {
            tracing::warn!(
                leaves = leaves.len(),
                nworkers,
                "fewer leaves than workers; some workers stay idle"
            );
        }
        Ok(Self { owners, by_worker })
    }

    /// Number of workers.
    #[must_use]
    pub fn nworkers(&self) -> usize {
        self.by_worker.len()
    }

    /// The worker owning leaf `id`.
    #[must_use]
    pub fn worker_of(&self, id: LeafId) -> Option<usize> {
        self.owners.get(id).copied()
    }

    /// Leaves owned by `worker`, ascending. Empty for an unknown worker.
    #[must_use]
    pub fn leaves_for(&self, worker: usize) -> &[LeafId] {
        self.by_worker.get(worker).map_or(&[], Vec::as_slice)
    }
}

/// Shorthand for [`WorkerAssignment::round_robin`].
///
/// # Errors
///
/// See [`WorkerAssignment::round_robin`].
pub fn assign_leaves_round_robin<const D: usize>(
    leaves: &[Leaf<D>],
    nworkers: usize,
) -> Result<WorkerAssignment, DecompositionError> {
    WorkerAssignment::round_robin(leaves, nworkers)
}
