//! Leaf adjacency ("neighbor") resolution.
//!
//! Two leaves are neighbors through axis `k` when their boxes abut along `k`
//! (one's right edge equals the other's left edge) and their open extents
//! overlap on every other axis, i.e. they share a patch of a (D-1)-face.
//! Leaves that only touch along an edge or a corner are not neighbors.
//!
//! With periodic boundaries, the domain's low and high faces along a periodic
//! axis are identified: a leaf touching the low face is a left neighbor of
//! every overlapping leaf touching the high face, and vice versa. A leaf that
//! spans an entire periodic axis is its own neighbor through both faces.
//!
//! Resolution is a read-only pass over leaf geometry. Face coordinates are
//! compared exactly: they are copied from the same split coordinate during
//! partitioning, so abutting faces are bit-identical.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::core::collections::{
    FastHashMap, FastHashSet, SmallBuffer, fast_hash_map_with_capacity,
    fast_hash_set_with_capacity,
};
use crate::core::error::DecompositionError;
use crate::core::leaf::{Leaf, LeafId};
use crate::geometry::bounds::DomainBox;
use crate::topology::periodic::{PeriodicDomain, Periodicity};

/// Highest dimension for which periodic neighbor resolution is provided.
///
/// Periodic leaves feed periodic triangulation back ends, which exist for
/// 2-D and 3-D domains (1-D is the trivial ring).
pub const MAX_PERIODIC_DIMENSION: usize = 3;

/// Leaves sharing one face coordinate on one axis; most buckets are tiny.
const FACE_BUCKET_INLINE_CAPACITY: usize = 8;

// =============================================================================
// FACE KEYS
// =============================================================================

/// Low or high side of a box along an axis.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Side {
    /// The `left_edge` face.
    Left,
    /// The `right_edge` face.
    Right,
}

impl Side {
    /// The other side.
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::Left => Self::Right,
            Self::Right => Self::Left,
        }
    }
}

/// One face of a leaf box: an axis and a side.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Face {
    /// Axis normal to the face.
    pub axis: usize,
    /// Which side of the box along `axis`.
    pub side: Side,
}

impl Face {
    /// Creates a face key.
    #[must_use]
    pub const fn new(axis: usize, side: Side) -> Self {
        Self { axis, side }
    }

    /// The low face along `axis`.
    #[must_use]
    pub const fn left(axis: usize) -> Self {
        Self::new(axis, Side::Left)
    }

    /// The high face along `axis`.
    #[must_use]
    pub const fn right(axis: usize) -> Self {
        Self::new(axis, Side::Right)
    }

    /// The face a neighbor sees looking back.
    #[must_use]
    pub const fn opposite(self) -> Self {
        Self::new(self.axis, self.side.opposite())
    }
}

impl fmt::Display for Face {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = match self.side {
            Side::Left => '-',
            Side::Right => '+',
        };
        write!(f, "axis{}{sign}", self.axis)
    }
}

// =============================================================================
// LEAF NEIGHBORS
// =============================================================================

/// Neighbor sets of one leaf, keyed by [`Face`].
///
/// Ids within a set iterate in ascending order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LeafNeighbors<const D: usize> {
    left: [BTreeSet<LeafId>; D],
    right: [BTreeSet<LeafId>; D],
    periodic_left: [bool; D],
    periodic_right: [bool; D],
}

impl<const D: usize> LeafNeighbors<D> {
    fn empty(periodic_left: [bool; D], periodic_right: [bool; D]) -> Self {
        Self {
            left: std::array::from_fn(|_| BTreeSet::new()),
            right: std::array::from_fn(|_| BTreeSet::new()),
            periodic_left,
            periodic_right,
        }
    }

    /// Neighbors through `face`, or `None` if `face.axis >= D`.
    #[must_use]
    pub fn get(&self, face: Face) -> Option<&BTreeSet<LeafId>> {
        match face.side {
            Side::Left => self.left.get(face.axis),
            Side::Right => self.right.get(face.axis),
        }
    }

    /// Neighbors through the low face along `axis`.
    ///
    /// # Panics
    ///
    /// Panics if `axis >= D`.
    #[must_use]
    pub fn left(&self, axis: usize) -> &BTreeSet<LeafId> {
        &self.left[axis]
    }

    /// Neighbors through the high face along `axis`.
    ///
    /// # Panics
    ///
    /// Panics if `axis >= D`.
    #[must_use]
    pub fn right(&self, axis: usize) -> &BTreeSet<LeafId> {
        &self.right[axis]
    }

    /// Returns `true` if `face` lies on a periodic face of the domain, so
    /// every neighbor through it is a wrapped image.
    #[must_use]
    pub fn is_periodic_face(&self, face: Face) -> bool {
        let flags = match face.side {
            Side::Left => &self.periodic_left,
            Side::Right => &self.periodic_right,
        };
        flags.get(face.axis).copied().unwrap_or(false)
    }

    /// Iterates every face with its neighbor set, low faces first per axis.
    pub fn iter(&self) -> impl Iterator<Item = (Face, &BTreeSet<LeafId>)> + '_ {
        (0..D).flat_map(move |axis| {
            [
                (Face::left(axis), &self.left[axis]),
                (Face::right(axis), &self.right[axis]),
            ]
        })
    }

    /// Union of all neighbor sets, excluding `own_id`.
    #[must_use]
    pub fn union_excluding(&self, own_id: LeafId) -> BTreeSet<LeafId> {
        self.iter()
            .flat_map(|(_, ids)| ids.iter().copied())
            .filter(|&id| id != own_id)
            .collect()
    }

    /// Returns `true` if no face has a neighbor.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.iter().all(|(_, ids)| ids.is_empty())
    }

    fn insert(&mut self, face: Face, id: LeafId) {
        match face.side {
            Side::Left => self.left[face.axis].insert(id),
            Side::Right => self.right[face.axis].insert(id),
        };
    }
}

/// Dimension-erased form used for serialization.
#[derive(Serialize, Deserialize)]
pub(crate) struct NeighborRecord {
    left: Vec<BTreeSet<LeafId>>,
    right: Vec<BTreeSet<LeafId>>,
    periodic_left: Vec<bool>,
    periodic_right: Vec<bool>,
}

impl<const D: usize> From<&LeafNeighbors<D>> for NeighborRecord {
    fn from(neighbors: &LeafNeighbors<D>) -> Self {
        Self {
            left: neighbors.left.to_vec(),
            right: neighbors.right.to_vec(),
            periodic_left: neighbors.periodic_left.to_vec(),
            periodic_right: neighbors.periodic_right.to_vec(),
        }
    }
}

impl<const D: usize> TryFrom<NeighborRecord> for LeafNeighbors<D> {
    type Error = DecompositionError;

    fn try_from(record: NeighborRecord) -> Result<Self, Self::Error> {
        let mismatch =
            || DecompositionError::invalid("neighbors", format!("expected {D} axes per face list"));
        Ok(Self {
            left: record.left.try_into().map_err(|_| mismatch())?,
            right: record.right.try_into().map_err(|_| mismatch())?,
            periodic_left: record.periodic_left.try_into().map_err(|_| mismatch())?,
            periodic_right: record.periodic_right.try_into().map_err(|_| mismatch())?,
        })
    }
}

// =============================================================================
// RESOLVER
// =============================================================================

/// Exact face coordinate key; `-0.0` and `0.0` hash alike.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
struct FaceKey {
    axis: usize,
    bits: u64,
}

impl FaceKey {
    fn new(axis: usize, coordinate: f64) -> Self {
        let normalized = if coordinate == 0.0 { 0.0 } else { coordinate };
        Self {
            axis,
            bits: normalized.to_bits(),
        }
    }
}

/// Computes face adjacency between the leaves of one decomposition.
///
/// # Examples
///
/// ```rust
/// use domain_decomp::core::neighbors::{Face, NeighborResolver};
/// use domain_decomp::core::leaf::Leaf;
/// use domain_decomp::geometry::bounds::DomainBox;
///
/// let domain = DomainBox::<2>::unit();
/// let mut leaves = vec![
///     Leaf::new(0, vec![0], [0.0, 0.0], [0.5, 1.0]).unwrap(),
///     Leaf::new(1, vec![1], [0.5, 0.0], [1.0, 1.0]).unwrap(),
/// ];
///
/// NeighborResolver::new(domain, true)
///     .unwrap()
///     .resolve(&mut leaves)
///     .unwrap();
///
/// let n0 = leaves[0].neighbors().unwrap();
/// assert!(n0.right(0).contains(&1));
/// // Through the periodic x faces the two leaves also meet on the other side.
/// assert!(n0.left(0).contains(&1));
/// assert!(n0.is_periodic_face(Face::left(0)));
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NeighborResolver<const D: usize> {
    domain: PeriodicDomain<D>,
}

impl<const D: usize> NeighborResolver<D> {
    /// Creates a resolver for leaves tessellating `bounds`.
    ///
    /// # Errors
    ///
    /// - [`DecompositionError::NotImplemented`] when the dimensionality is
    ///   unsupported for the requested mode (see [`Self::check_supported`]).
    /// - [`DecompositionError::InvalidParameter`] when a periodic axis has zero width.
    pub fn new(
        bounds: DomainBox<D>,
        periodicity: impl Into<Periodicity<D>>,
    ) -> Result<Self, DecompositionError> {
        let periodicity = periodicity.into();
        Self::check_supported(&periodicity)?;
        Ok(Self {
            domain: PeriodicDomain::new(bounds, periodicity)?,
        })
    }

    /// Reports whether adjacency can be determined for `D` under `periodicity`.
    ///
    /// Non-periodic resolution works for every `D >= 1`; periodic resolution
    /// for `1 <= D <= MAX_PERIODIC_DIMENSION`.
    ///
    /// # Errors
    ///
    /// Returns [`DecompositionError::NotImplemented`] otherwise.
    pub fn check_supported(periodicity: &Periodicity<D>) -> Result<(), DecompositionError> {
        if D == 0 {
            return Err(DecompositionError::not_implemented(
                "neighbor resolution for zero-dimensional domains",
            ));
        }
        if periodicity.any() && D > MAX_PERIODIC_DIMENSION {
            return Err(DecompositionError::not_implemented(format!(
                "periodic neighbor resolution in {D} dimensions \
                 (supported: 1 to {MAX_PERIODIC_DIMENSION})"
            )));
        }
        Ok(())
    }

    /// The domain (with periodic flags) this resolver works in.
    #[must_use]
    pub const fn domain(&self) -> &PeriodicDomain<D> {
        &self.domain
    }

    /// Computes neighbor sets for `leaves` without modifying them.
    ///
    /// The result is index-aligned with `leaves`; sets contain leaf ids.
    ///
    /// # Errors
    ///
    /// Returns [`DecompositionError::InvalidParameter`] if two leaves share an id
    /// or a leaf box is not nested in the domain.
    pub fn compute(&self, leaves: &[Leaf<D>]) -> Result<Vec<LeafNeighbors<D>>, DecompositionError> {
        self.validate_leaves(leaves)?;

        let bounds = self.domain.bounds();
        let periodicity = self.domain.periodicity();

        let mut low_faces: FastHashMap<FaceKey, SmallBuffer<usize, FACE_BUCKET_INLINE_CAPACITY>> =
            fast_hash_map_with_capacity(leaves.len() * D);
        for (pos, leaf) in leaves.iter().enumerate() {
            for axis in 0..D {
                low_faces
                    .entry(FaceKey::new(axis, leaf.left_edge()[axis]))
                    .or_default()
                    .push(pos);
            }
        }

        let mut result: Vec<LeafNeighbors<D>> = leaves
            .iter()
            .map(|leaf| {
                LeafNeighbors::empty(
                    std::array::from_fn(|axis| {
                        self.domain.on_periodic_face(leaf.bounds(), axis, Side::Left)
                    }),
                    std::array::from_fn(|axis| {
                        self.domain.on_periodic_face(leaf.bounds(), axis, Side::Right)
                    }),
                )
            })
            .collect();

        let mut links = 0_usize;
        for (pos, leaf) in leaves.iter().enumerate() {
            for axis in 0..D {
                // Leaves whose low face coincides with this leaf's high face.
                if let Some(candidates) =
                    low_faces.get(&FaceKey::new(axis, leaf.right_edge()[axis]))
                {
                    for &other in candidates {
                        if other != pos && leaf.bounds().overlaps_except(leaves[other].bounds(), axis)
                        {
                            link(&mut result, leaves, pos, other, axis);
                            links += 1;
                        }
                    }
                }

                // Wrap from the domain's high face back to its low face.
                if periodicity.is_periodic(axis)
                    && leaf.right_edge()[axis] == bounds.right_edge()[axis]
                    && let Some(candidates) =
                        low_faces.get(&FaceKey::new(axis, bounds.left_edge()[axis]))
                {
                    for &other in candidates {
                        if leaf.bounds().overlaps_except(leaves[other].bounds(), axis) {
                            link(&mut result, leaves, pos, other, axis);
                            links += 1;
                        }
                    }
                }
            }
        }

        let degenerate = leaves.iter().filter(|leaf| leaf.bounds().is_degenerate()).count();
        if degenerate > 0 {
            tracing::warn!(
                degenerate,
                "leaves with zero extent along an axis only neighbor through that axis"
            );
        }
        tracing::debug!(
            leaves = leaves.len(),
            links,
            periodic = periodicity.any(),
            "resolved leaf neighbors"
        );
        Ok(result)
    }

    /// Computes neighbors and stores them on each leaf.
    ///
    /// # Errors
    ///
    /// See [`Self::compute`]. On error no leaf is modified.
    pub fn resolve(&self, leaves: &mut [Leaf<D>]) -> Result<(), DecompositionError> {
        let neighbors = self.compute(leaves)?;
        for (leaf, n) in leaves.iter_mut().zip(neighbors) {
            leaf.set_neighbors(n);
        }
        Ok(())
    }

    fn validate_leaves(&self, leaves: &[Leaf<D>]) -> Result<(), DecompositionError> {
        let mut seen: FastHashSet<LeafId> = fast_hash_set_with_capacity(leaves.len());
        for leaf in leaves {
            if !seen.insert(leaf.id()) {
                return Err(DecompositionError::invalid(
                    "leaves",
                    format!("duplicate leaf id {}", leaf.id()),
                ));
            }
            if !leaf.bounds().is_nested_in(self.domain.bounds()) {
                return Err(DecompositionError::invalid(
                    "leaves",
                    format!("leaf {} extends outside the domain", leaf.id()),
                ));
            }
        }
        Ok(())
    }
}

/// Records `leaves[high]` as right neighbor of `leaves[low]` through `axis`, and back.
fn link<const D: usize>(
    result: &mut [LeafNeighbors<D>],
    leaves: &[Leaf<D>],
    low: usize,
    high: usize,
    axis: usize,
) {
    let (low_id, high_id) = (leaves[low].id(), leaves[high].id());
    result[low].insert(Face::right(axis), high_id);
    result[high].insert(Face::left(axis), low_id);
}
