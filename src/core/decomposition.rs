//! The result of one decomposition run.
//!
//! A [`Decomposition`] is a flat arena of [`Leaf`] records (leaf `i` has id `i`)
//! plus the split tree that produced them. The split tree is what makes
//! [`Decomposition::locate`] possible: points inserted after the initial
//! decomposition are routed to the leaf whose box contains them without
//! scanning every leaf.

use crate::core::dispatch::Algorithm;
use crate::core::error::DecompositionError;
use crate::core::leaf::{Leaf, LeafId};
use crate::core::neighbors::NeighborResolver;
use crate::geometry::bounds::DomainBox;
use crate::topology::periodic::{PeriodicDomain, Periodicity};

/// One node of the split tree, addressed by position in the node arena.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) enum SplitNode {
    /// A terminal node.
    Leaf(LeafId),
    /// An internal node: points with `coord[axis] < at` went left.
    Split {
        axis: usize,
        at: f64,
        left: usize,
        right: usize,
    },
}

/// Leaves of one run, together with the split tree and root domain.
///
/// # Examples
///
/// ```rust
/// use domain_decomp::prelude::*;
///
/// let points = generate_random_points_in_box_seeded(200, &DomainBox::<2>::unit(), 7);
/// let decomposition = decompose(
///     &points,
///     DomainBox::unit(),
///     false,
///     &DecompositionOptions::with_leafsize(25),
/// )
/// .unwrap();
///
/// assert!(decomposition.number_of_leaves() >= 8);
/// let id = decomposition.locate(&[0.3, 0.6]).unwrap();
/// assert!(decomposition.leaf(id).unwrap().contains(&[0.3, 0.6]));
/// assert!(decomposition.locate(&[1.5, 0.5]).is_none());
/// ```
#[derive(Clone, Debug)]
pub struct Decomposition<const D: usize> {
    algorithm: Algorithm,
    domain: PeriodicDomain<D>,
    leaves: Vec<Leaf<D>>,
    nodes: Vec<SplitNode>,
    npts: usize,
}

impl<const D: usize> Decomposition<D> {
    /// Assembles a decomposition; the root of `nodes` is its last element.
    pub(crate) fn from_parts(
        algorithm: Algorithm,
        bounds: DomainBox<D>,
        leaves: Vec<Leaf<D>>,
        nodes: Vec<SplitNode>,
        npts: usize,
    ) -> Self {
        debug_assert!(
            leaves.iter().enumerate().all(|(i, leaf)| leaf.id() == i),
            "leaf ids must match arena positions"
        );
        Self {
            algorithm,
            domain: PeriodicDomain::euclidean(bounds),
            leaves,
            nodes,
            npts,
        }
    }

    /// The strategy that produced this decomposition.
    #[must_use]
    pub const fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    /// The root domain.
    #[must_use]
    pub const fn domain(&self) -> &DomainBox<D> {
        self.domain.bounds()
    }

    /// Periodic flags used for neighbor resolution and point location.
    #[must_use]
    pub const fn periodicity(&self) -> &Periodicity<D> {
        self.domain.periodicity()
    }

    /// The leaves, ordered by id.
    #[must_use]
    pub fn leaves(&self) -> &[Leaf<D>] {
        &self.leaves
    }

    /// The leaf with `id`, if any.
    #[must_use]
    pub fn leaf(&self, id: LeafId) -> Option<&Leaf<D>> {
        self.leaves.get(id)
    }

    /// Number of leaves.
    #[must_use]
    pub fn number_of_leaves(&self) -> usize {
        self.leaves.len()
    }

    /// Number of points partitioned.
    #[must_use]
    pub const fn npts(&self) -> usize {
        self.npts
    }

    /// Size of the largest leaf.
    #[must_use]
    pub fn max_leaf_size(&self) -> usize {
        self.leaves.iter().map(Leaf::npts).max().unwrap_or(0)
    }

    /// Returns `true` once neighbor sets have been computed.
    #[must_use]
    pub fn neighbors_resolved(&self) -> bool {
        self.leaves.iter().all(|leaf| leaf.neighbors().is_some())
    }

    /// Consumes the decomposition, returning the ordered leaves.
    #[must_use]
    pub fn into_leaves(self) -> Vec<Leaf<D>> {
        self.leaves
    }

    /// Computes and stores neighbor sets for every leaf.
    ///
    /// # Errors
    ///
    /// - [`DecompositionError::NotImplemented`] if adjacency is unsupported for
    ///   `D` under `periodicity`.
    /// - [`DecompositionError::InvalidParameter`] if neighbors were already
    ///   resolved, or a periodic axis has zero width.
    pub fn resolve_neighbors(
        &mut self,
        periodicity: impl Into<Periodicity<D>>,
    ) -> Result<(), DecompositionError> {
        if self.leaves.iter().any(|leaf| leaf.neighbors().is_some()) {
            return Err(DecompositionError::invalid(
                "neighbors",
                "neighbor sets are populated once per decomposition",
            ));
        }
        let resolver = NeighborResolver::new(*self.domain.bounds(), periodicity)?;
        resolver.resolve(&mut self.leaves)?;
        self.domain = *resolver.domain();
        Ok(())
    }

    /// Finds the leaf whose box contains `coords`.
    ///
    /// Coordinates on periodic axes are wrapped into the domain first. Points
    /// exactly on a split face go to the higher side. Returns `None` when the
    /// point is outside the domain (after wrapping) or not finite.
    #[must_use]
    pub fn locate(&self, coords: &[f64; D]) -> Option<LeafId> {
        let mut coords = *coords;
        self.domain.canonicalize_point(&mut coords);
        if !self.domain.bounds().contains(&coords) {
            return None;
        }

        let mut node = self.nodes.len().checked_sub(1)?;
        loop {
            match self.nodes[node] {
                SplitNode::Leaf(id) => return Some(id),
                SplitNode::Split {
                    axis,
                    at,
                    left,
                    right,
                } => node = if coords[axis] < at { left } else { right },
            }
        }
    }

    /// Iterates the leaves in id order.
    pub fn iter(&self) -> std::slice::Iter<'_, Leaf<D>> {
        self.leaves.iter()
    }
}

impl<'a, const D: usize> IntoIterator for &'a Decomposition<D> {
    type Item = &'a Leaf<D>;
    type IntoIter = std::slice::Iter<'a, Leaf<D>>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
