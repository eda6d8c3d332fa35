//! Balanced k-d tree partitioning.
//!
//! The k-d strategy recursively bisects the root box until every region
//! holds at most `leafsize` points. The split policy is fixed and part of the
//! public contract, since leaf boundaries must be reproducible run to run:
//!
//! 1. **Axis**: the axis of greatest extent of the node's *box* (not of its
//!    points); ties go to the lowest axis index.
//! 2. **Position**: exact median. Indices are ordered along the axis by
//!    `(coordinate, index)` using `f64::total_cmp`, so ties are broken by
//!    point index. The left child takes the `ceil(n/2)` smallest, the right
//!    child the `floor(n/2)` largest.
//! 3. **Face**: the split coordinate is the coordinate of the smallest point
//!    of the right child, copied verbatim into both child boxes. Boxes never
//!    go through floating-point arithmetic, so repeated runs are bit-identical.
//! 4. **Ids**: assigned depth-first, left child before right.
//!
//! Sibling subtrees are independent once a split is chosen. With the
//! `parallel` feature, subtrees above the parallel threshold are built with
//! `rayon::join`; each branch owns a disjoint slice of the index permutation
//! and only reads the shared point slice. Ids are assigned afterwards by a
//! sequential walk, so parallel and sequential builds are identical.

use std::cmp::Ordering;

use crate::core::config::default_parallel_threshold;
use crate::core::decomposition::{Decomposition, SplitNode};
use crate::core::dispatch::Algorithm;
use crate::core::error::DecompositionError;
use crate::core::leaf::Leaf;
use crate::core::traits::partitioner::{Partitioner, validate_points};
use crate::geometry::bounds::DomainBox;
use crate::geometry::point::Point;

/// Smallest `leafsize` that can hold the two points straddling a split face.
///
/// A `leafsize` of 1 is only accepted when no split is needed at all.
pub const MIN_SPLITTABLE_LEAFSIZE: usize = 2;

/// Subtree produced by the recursive pass, before ids are assigned.
#[derive(Debug)]
enum BuildNode<const D: usize> {
    Leaf {
        indices: Vec<usize>,
        bounds: DomainBox<D>,
    },
    Split {
        axis: usize,
        at: f64,
        left: Box<Self>,
        right: Box<Self>,
    },
}

/// The k-d tree partitioner.
///
/// # Examples
///
/// ```rust
/// use domain_decomp::prelude::*;
///
/// let domain = DomainBox::<3>::unit();
/// let points = generate_random_points_in_box_seeded(100, &domain, 42);
///
/// let decomposition = KdTree::new(10).partition(&points, &domain).unwrap();
/// assert!(decomposition.number_of_leaves() >= 10);
/// assert!(decomposition.leaves().iter().all(|leaf| leaf.npts() <= 10));
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct KdTree {
    leafsize: usize,
    parallel_threshold: usize,
}

impl KdTree {
    /// Creates a k-d partitioner with the given `leafsize`.
    ///
    /// The parallel threshold comes from
    /// [`default_parallel_threshold`](crate::core::config::default_parallel_threshold).
    #[must_use]
    pub fn new(leafsize: usize) -> Self {
        Self {
            leafsize,
            parallel_threshold: default_parallel_threshold(),
        }
    }

    /// Overrides the subtree size above which construction forks.
    #[must_use]
    pub const fn with_parallel_threshold(mut self, parallel_threshold: usize) -> Self {
        self.parallel_threshold = parallel_threshold;
        self
    }

    /// Maximum number of points per leaf.
    #[must_use]
    pub const fn leafsize(&self) -> usize {
        self.leafsize
    }

    /// Subtree size above which construction forks.
    #[must_use]
    pub const fn parallel_threshold(&self) -> usize {
        self.parallel_threshold
    }

    fn validate_leafsize(&self, npts: usize) -> Result<(), DecompositionError> {
        if self.leafsize < 1 {
            return Err(DecompositionError::invalid(
                "leafsize",
                "leafsize must be at least 1",
            ));
        }
        if self.leafsize < MIN_SPLITTABLE_LEAFSIZE && npts > self.leafsize {
            return Err(DecompositionError::invalid(
                "leafsize",
                format!(
                    "leafsize {} cannot partition {npts} points: a median split needs leaves \
                     of at least {MIN_SPLITTABLE_LEAFSIZE} points",
                    self.leafsize
                ),
            ));
        }
        Ok(())
    }

    fn build<const D: usize>(
        &self,
        points: &[Point<D>],
        indices: &mut [usize],
        bounds: DomainBox<D>,
        depth: usize,
    ) -> Result<BuildNode<D>, DecompositionError> {
        let n = indices.len();
        if n <= self.leafsize {
            let mut owned = indices.to_vec();
            owned.sort_unstable();
            return Ok(BuildNode::Leaf {
                indices: owned,
                bounds,
            });
        }

        let axis = bounds
            .longest_axis()
            .filter(|&axis| bounds.width_along(axis) > 0.0)
            .ok_or_else(|| {
                DecompositionError::invalid(
                    "leafsize",
                    format!(
                        "{n} points exceed leafsize {} in a box with zero extent on every axis",
                        self.leafsize
                    ),
                )
            })?;
        if all_coincident(points, indices) {
            return Err(DecompositionError::invalid(
                "leafsize",
                format!(
                    "{n} coincident points exceed leafsize {}; no split can separate them",
                    self.leafsize
                ),
            ));
        }

        let mid = n.div_ceil(2);
        indices.select_nth_unstable_by(mid, |&a, &b| compare_along(points, axis, a, b));
        let at = points[indices[mid]].coords()[axis];
        let (left_box, right_box) = bounds.split(axis, at);
        let (left_indices, right_indices) = indices.split_at_mut(mid);

        tracing::trace!(depth, n, axis, at, "k-d split");

        let (left, right) = self.build_children(
            points,
            (left_indices, left_box),
            (right_indices, right_box),
            depth + 1,
        );
        Ok(BuildNode::Split {
            axis,
            at,
            left: Box::new(left?),
            right: Box::new(right?),
        })
    }

    #[cfg(feature = "parallel")]
    fn build_children<const D: usize>(
        &self,
        points: &[Point<D>],
        (left_indices, left_box): (&mut [usize], DomainBox<D>),
        (right_indices, right_box): (&mut [usize], DomainBox<D>),
        depth: usize,
    ) -> (
        Result<BuildNode<D>, DecompositionError>,
        Result<BuildNode<D>, DecompositionError>,
    ) {
        if left_indices.len() + right_indices.len() > self.parallel_threshold {
            rayon::join(
                || self.build(points, left_indices, left_box, depth),
                || self.build(points, right_indices, right_box, depth),
            )
        } else {
            (
                self.build(points, left_indices, left_box, depth),
                self.build(points, right_indices, right_box, depth),
            )
        }
    }

    #[cfg(not(feature = "parallel"))]
    fn build_children<const D: usize>(
        &self,
        points: &[Point<D>],
        (left_indices, left_box): (&mut [usize], DomainBox<D>),
        (right_indices, right_box): (&mut [usize], DomainBox<D>),
        depth: usize,
    ) -> (
        Result<BuildNode<D>, DecompositionError>,
        Result<BuildNode<D>, DecompositionError>,
    ) {
        (
            self.build(points, left_indices, left_box, depth),
            self.build(points, right_indices, right_box, depth),
        )
    }
}

impl<const D: usize> Partitioner<D> for KdTree {
    fn algorithm(&self) -> Algorithm {
        Algorithm::KdTree
    }

    fn partition(
        &self,
        points: &[Point<D>],
        domain: &DomainBox<D>,
    ) -> Result<Decomposition<D>, DecompositionError> {
        self.validate_leafsize(points.len())?;
        validate_points(points, domain)?;

        let mut indices: Vec<usize> = (0..points.len()).collect();
        let root = self.build(points, &mut indices, *domain, 0)?;

        let mut leaves = Vec::new();
        let mut nodes = Vec::new();
        flatten(root, &mut leaves, &mut nodes);

        tracing::debug!(
            npts = points.len(),
            leafsize = self.leafsize,
            leaves = leaves.len(),
            dim = D,
            "k-d decomposition built"
        );
        Ok(Decomposition::from_parts(
            Algorithm::KdTree,
            *domain,
            leaves,
            nodes,
            points.len(),
        ))
    }
}

/// Partitions `points` in the box `[left_edge, right_edge]` with a k-d tree.
///
/// Returns the leaves ordered by id. Neighbors are not resolved.
///
/// # Errors
///
/// Returns [`DecompositionError::InvalidParameter`] for an invalid box, points
/// outside it, `leafsize < 1`, or a `leafsize` that no sequence of median splits
/// can satisfy (see [`MIN_SPLITTABLE_LEAFSIZE`]).
///
/// # Examples
///
/// ```rust
/// use domain_decomp::prelude::*;
///
/// let points = generate_random_points_in_box_seeded(100, &DomainBox::<2>::unit(), 1);
/// let leaves = kdtree(&points, [0.0, 0.0], [1.0, 1.0], 10).unwrap();
/// assert_eq!(leaves.iter().map(Leaf::npts).sum::<usize>(), 100);
///
/// assert!(matches!(
///     kdtree(&points, [0.0, 0.0], [1.0, 1.0], 1),
///     Err(DecompositionError::InvalidParameter { .. })
/// ));
/// ```
pub fn kdtree<const D: usize>(
    points: &[Point<D>],
    left_edge: [f64; D],
    right_edge: [f64; D],
    leafsize: usize,
) -> Result<Vec<Leaf<D>>, DecompositionError> {
    let domain = DomainBox::new(left_edge, right_edge)?;
    KdTree::new(leafsize)
        .partition(points, &domain)
        .map(Decomposition::into_leaves)
}

#[inline]
fn compare_along<const D: usize>(points: &[Point<D>], axis: usize, a: usize, b: usize) -> Ordering {
    points[a].coords()[axis]
        .total_cmp(&points[b].coords()[axis])
        .then(a.cmp(&b))
}

fn all_coincident<const D: usize>(points: &[Point<D>], indices: &[usize]) -> bool {
    let Some((&first, rest)) = indices.split_first() else {
        return true;
    };
    let reference = points[first].coords();
    rest.iter().all(|&i| points[i].coords() == reference)
}

/// Assigns ids depth-first (left before right); the root node is pushed last.
fn flatten<const D: usize>(
    node: BuildNode<D>,
    leaves: &mut Vec<Leaf<D>>,
    nodes: &mut Vec<SplitNode>,
) -> usize {
    match node {
        BuildNode::Leaf { indices, bounds } => {
            let id = leaves.len();
            leaves.push(Leaf::from_bounds(id, indices, bounds));
            nodes.push(SplitNode::Leaf(id));
        }
        BuildNode::Split {
            axis,
            at,
            left,
            right,
        } => {
            let left = flatten(*left, leaves, nodes);
            let right = flatten(*right, leaves, nodes);
            nodes.push(SplitNode::Split {
                axis,
                at,
                left,
                right,
            });
        }
    }
    nodes.len() - 1
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::util::point_generation::generate_random_points_in_box_seeded;

    fn covered_once<const D: usize>(leaves: &[Leaf<D>], n: usize) -> bool {
        let mut seen = vec![false; n];
        for &i in leaves.iter().flat_map(Leaf::indices) {
            if i >= n || seen[i] {
                return false;
            }
            seen[i] = true;
        }
        seen.into_iter().all(|s| s)
    }

    #[test]
    fn test_kdtree_2d_and_3d() {
        let pts2 = generate_random_points_in_box_seeded(100, &DomainBox::<2>::unit(), 11);
        let pts3 = generate_random_points_in_box_seeded(100, &DomainBox::<3>::unit(), 12);

        let leaves2 = kdtree(&pts2, [0.0; 2], [1.0; 2], 10).unwrap();
        let leaves3 = kdtree(&pts3, [0.0; 3], [1.0; 3], 10).unwrap();

        // 100 -> 50 -> 25 -> 13/12 -> 7/6: sixteen leaves.
        assert_eq!(leaves2.len(), 16);
        assert_eq!(leaves3.len(), 16);
        assert!(covered_once(&leaves2, 100));
        assert!(covered_once(&leaves3, 100));
        for (i, leaf) in leaves2.iter().enumerate() {
            assert_eq!(leaf.id(), i);
            assert!(leaf.npts() <= 10);
            assert!(leaf.indices().windows(2).all(|w| w[0] < w[1]));
        }
    }

    #[test]
    fn test_balanced_halves_and_first_split() {
        // Points on a diagonal: the first split is on x (tie -> axis 0) at the median.
        let points: Vec<Point<2>> = (0..7)
            .map(|i| Point::new([f64::from(i) / 10.0, f64::from(i) / 10.0]))
            .collect();
        let leaves = kdtree(&points, [0.0; 2], [1.0; 2], 4).unwrap();
        assert_eq!(leaves.len(), 2);
        assert_eq!(leaves[0].indices(), &[0, 1, 2, 3]);
        assert_eq!(leaves[1].indices(), &[4, 5, 6]);
        assert_eq!(leaves[0].right_edge(), &[0.4, 1.0]);
        assert_eq!(leaves[1].left_edge(), &[0.4, 0.0]);
    }

    #[test]
    fn test_median_ties_break_by_index() {
        // Three points tie at x = 0.5 across the median; the lower indices go left.
        let points: Vec<Point<2>> = [(0.1, 0.2), (0.5, 0.9), (0.5, 0.1), (0.5, 0.5), (0.9, 0.3)]
            .into_iter()
            .map(|(x, y)| Point::new([x, y]))
            .collect();
        let leaves = kdtree(&points, [0.0; 2], [1.0; 2], 3).unwrap();
        assert_eq!(leaves.len(), 2);
        assert_eq!(leaves[0].indices(), &[0, 1, 2]);
        assert_eq!(leaves[1].indices(), &[3, 4]);
        assert_eq!(leaves[0].right_edge()[0], 0.5);
        assert_eq!(leaves[1].left_edge()[0], 0.5);
        for leaf in &leaves {
            for &i in leaf.indices() {
                assert!(leaf.contains(points[i].coords()));
            }
        }

        // Same ties, scrambled input order.
        let points: Vec<Point<2>> = [(0.5, 0.9), (0.9, 0.3), (0.5, 0.1), (0.1, 0.2), (0.5, 0.5)]
            .into_iter()
            .map(|(x, y)| Point::new([x, y]))
            .collect();
        let leaves = kdtree(&points, [0.0; 2], [1.0; 2], 3).unwrap();
        assert_eq!(leaves[0].indices(), &[0, 2, 3]);
        assert_eq!(leaves[1].indices(), &[1, 4]);
        assert_eq!(leaves[0].right_edge()[0], 0.5);
        assert!(leaves[1].contains(points[4].coords()));
    }

    #[test]
    fn test_leafsize_validation() {
        let points = generate_random_points_in_box_seeded(100, &DomainBox::<2>::unit(), 3);
        for leafsize in [0, 1] {
            assert!(matches!(
                kdtree(&points, [0.0; 2], [1.0; 2], leafsize),
                Err(DecompositionError::InvalidParameter {
                    parameter: "leafsize",
                    ..
                })
            ));
        }
        // leafsize 1 is fine when nothing has to be split.
        let single = kdtree(&points[..1], [0.0; 2], [1.0; 2], 1).unwrap();
        assert_eq!(single.len(), 1);
        assert!(kdtree(&points, [0.0; 2], [1.0; 2], 2).is_ok());
    }

    #[test]
    fn test_empty_point_set_yields_one_empty_leaf() {
        let leaves = kdtree::<3>(&[], [0.0; 3], [1.0; 3], 10).unwrap();
        assert_eq!(leaves.len(), 1);
        assert!(leaves[0].is_empty());
        assert_eq!(leaves[0].bounds(), &DomainBox::<3>::unit());
    }

    #[test]
    fn test_coincident_points_rejected() {
        let points = vec![Point::new([0.5, 0.5]); 5];
        assert!(matches!(
            kdtree(&points, [0.0; 2], [1.0; 2], 2),
            Err(DecompositionError::InvalidParameter { .. })
        ));
        // ...unless they fit in one leaf.
        assert_eq!(kdtree(&points, [0.0; 2], [1.0; 2], 5).unwrap().len(), 1);
    }

    #[test]
    fn test_zero_extent_domain_rejected() {
        let points = vec![Point::new([0.5, 0.5]), Point::new([0.5, 0.5]), Point::new([0.5, 0.5])];
        assert!(kdtree(&points, [0.5; 2], [0.5; 2], 2).is_err());
    }

    #[test]
    fn test_points_outside_domain_rejected() {
        let points = vec![Point::new([0.5, 2.0])];
        assert!(matches!(
            kdtree(&points, [0.0; 2], [1.0; 2], 10),
            Err(DecompositionError::InvalidParameter {
                parameter: "points",
                ..
            })
        ));
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let domain = DomainBox::<3>::unit();
        let points = generate_random_points_in_box_seeded(5_000, &domain, 99);
        let parallel = KdTree::new(16)
            .with_parallel_threshold(64)
            .partition(&points, &domain)
            .unwrap()
            .into_leaves();
        let sequential = KdTree::new(16)
            .with_parallel_threshold(usize::MAX)
            .partition(&points, &domain)
            .unwrap()
            .into_leaves();
        assert_eq!(parallel, sequential);
    }

    #[test]
    fn test_locate_agrees_with_ownership() {
        let domain = DomainBox::<2>::unit();
        let points = generate_random_points_in_box_seeded(500, &domain, 5);
        let decomposition = KdTree::new(20).partition(&points, &domain).unwrap();
        for leaf in decomposition.leaves() {
            for &i in leaf.indices() {
                assert_eq!(decomposition.locate(points[i].coords()), Some(leaf.id()));
            }
        }
    }
}
