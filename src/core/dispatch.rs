//! Strategy selection and the top-level decomposition entry points.
//!
//! [`leaves`] is the name-driven façade: it resolves an algorithm tag through
//! [`Algorithm`]'s [`FromStr`] implementation, builds the matching
//! [`Partitioner`], runs it and annotates the result with neighbor sets.
//! [`decompose`] is the typed equivalent taking a [`DecompositionOptions`].

use std::fmt;
use std::str::FromStr;

use crate::core::algorithms::kdtree::{KdTree, MIN_SPLITTABLE_LEAFSIZE};
use crate::core::config::DecompositionOptions;
use crate::core::decomposition::Decomposition;
use crate::core::error::DecompositionError;
use crate::core::leaf::Leaf;
use crate::core::neighbors::NeighborResolver;
use crate::core::traits::partitioner::Partitioner;
use crate::geometry::bounds::DomainBox;
use crate::geometry::point::Point;
use crate::topology::periodic::Periodicity;

/// Registered partitioning strategies.
///
/// # Examples
///
/// ```rust
/// use domain_decomp::core::dispatch::Algorithm;
///
/// assert_eq!("kdtree".parse::<Algorithm>().unwrap(), Algorithm::KdTree);
/// assert_eq!(" KDTree ".parse::<Algorithm>().unwrap(), Algorithm::KdTree);
/// assert!("invalid".parse::<Algorithm>().is_err());
/// assert_eq!(Algorithm::KdTree.to_string(), "kdtree");
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum Algorithm {
    /// Balanced k-d tree with median splits along the longest box axis.
    #[default]
    KdTree,
}

impl Algorithm {
    /// Every registered strategy, in registration order.
    pub const ALL: &'static [Self] = &[Self::KdTree];

    /// The tag accepted by [`FromStr`].
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::KdTree => "kdtree",
        }
    }

    /// Builds the partitioner for this strategy.
    #[must_use]
    pub fn partitioner<const D: usize>(
        self,
        options: &DecompositionOptions,
    ) -> Box<dyn Partitioner<D>> {
        match self {
            Self::KdTree => Box::new(
                KdTree::new(options.leafsize).with_parallel_threshold(options.parallel_threshold),
            ),
        }
    }

    fn known_names() -> String {
        Self::ALL
            .iter()
            .map(|a| a.name())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Algorithm {
    type Err = DecompositionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let tag = s.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|a| a.name().eq_ignore_ascii_case(tag))
            .ok_or_else(|| DecompositionError::UnknownAlgorithm {
                name: s.to_string(),
                known: Self::known_names(),
            })
    }
}

/// Partitions `points` inside `domain` and, when requested, resolves neighbors.
///
/// Neighbors are resolved when `options.compute_neighbors` is set or any axis
/// of `periodicity` is periodic. Support for the requested periodic mode is
/// checked before any partitioning work.
///
/// # Errors
///
/// - [`DecompositionError::NotImplemented`] for unsupported periodic requests.
/// - [`DecompositionError::InvalidParameter`] for invalid points, leafsize, or
///   a periodic axis of zero width.
///
/// # Examples
///
/// ```rust
/// use domain_decomp::prelude::*;
///
/// let domain = DomainBox::<2>::unit();
/// let points = generate_random_points_in_box_seeded(400, &domain, 3);
/// let decomposition =
///     decompose(&points, domain, [true, false], &DecompositionOptions::with_leafsize(50)).unwrap();
///
/// assert!(decomposition.neighbors_resolved());
/// assert!(decomposition.periodicity().is_periodic(0));
/// ```
pub fn decompose<const D: usize>(
    points: &[Point<D>],
    domain: DomainBox<D>,
    periodicity: impl Into<Periodicity<D>>,
    options: &DecompositionOptions,
) -> Result<Decomposition<D>, DecompositionError> {
    let periodicity = periodicity.into();
    let resolve = options.compute_neighbors || periodicity.any();
    if resolve {
        NeighborResolver::<D>::check_supported(&periodicity)?;
    }

    let mut decomposition = options
        .algorithm
        .partitioner::<D>(options)
        .partition(points, &domain)?;

    if resolve {
        decomposition.resolve_neighbors(periodicity)?;
    }
    Ok(decomposition)
}

/// Decomposes `points` with the strategy named `algorithm_name`.
///
/// Returns the leaves ordered by id, each annotated with its neighbor sets.
/// When `periodic` is true every axis wraps.
///
/// # Errors
///
/// - [`DecompositionError::UnknownAlgorithm`] for an unregistered name.
/// - [`DecompositionError::NotImplemented`] when `periodic` is requested in a
///   dimensionality without periodic support.
/// - [`DecompositionError::InvalidParameter`] for an invalid box, points, or
///   `leafsize`.
///
/// # Examples
///
/// ```rust
/// use domain_decomp::prelude::*;
///
/// let points = generate_random_points_in_box_seeded(100, &DomainBox::<3>::unit(), 0);
/// let out = leaves("kdtree", &points, [0.0; 3], [1.0; 3], false, 10).unwrap();
/// assert!(out.len() >= 10);
///
/// assert!(matches!(
///     leaves("invalid", &points, [0.0; 3], [1.0; 3], false, 10),
///     Err(DecompositionError::UnknownAlgorithm { .. })
/// ));
/// ```
pub fn leaves<const D: usize>(
    algorithm_name: &str,
    points: &[Point<D>],
    left_edge: [f64; D],
    right_edge: [f64; D],
    periodic: bool,
    leafsize: usize,
) -> Result<Vec<Leaf<D>>, DecompositionError> {
    let algorithm = algorithm_name.parse::<Algorithm>()?;
    let domain = DomainBox::new(left_edge, right_edge)?;
    let options = DecompositionOptions {
        algorithm,
        ..DecompositionOptions::with_leafsize(leafsize)
    };
    decompose(points, domain, periodic, &options).map(Decomposition::into_leaves)
}

/// The leafsize that splits `npts` points into one leaf per worker slot.
///
/// `nworkers` is rounded up to a power of two (the k-d tree always produces
/// a power-of-two number of leaves when the input splits evenly), and the
/// result is `npts / nleaves + 1`, never less than
/// [`MIN_SPLITTABLE_LEAFSIZE`].
///
/// # Errors
///
/// Returns [`DecompositionError::InvalidParameter`] if `nworkers` is zero or its
/// power-of-two round-up overflows.
///
/// # Examples
///
/// ```rust
/// use domain_decomp::core::dispatch::leafsize_for_workers;
///
/// assert_eq!(leafsize_for_workers(1_000, 4).unwrap(), 251);
/// assert_eq!(leafsize_for_workers(1_000, 3).unwrap(), 251);
/// assert_eq!(leafsize_for_workers(1_000, 1).unwrap(), 1_001);
/// assert!(leafsize_for_workers(1_000, 0).is_err());
/// ```
pub fn leafsize_for_workers(npts: usize, nworkers: usize) -> Result<usize, DecompositionError> {
    if nworkers == 0 {
        return Err(DecompositionError::invalid(
            "nworkers",
            "at least one worker is required",
        ));
    }
    let nleaves = nworkers.checked_next_power_of_two().ok_or_else(|| {
        DecompositionError::invalid(
            "nworkers",
            format!("{nworkers} workers cannot be rounded up to a power of two"),
        )
    })?;
    Ok((npts / nleaves + 1).max(MIN_SPLITTABLE_LEAFSIZE))
}
