//! Leaves: the terminal partitions of a decomposition.
//!
//! A [`Leaf`] owns a subset of point indices and the box that delimits them.
//! Both are fixed at construction. The only later change a leaf ever sees is
//! the one-time population of its neighbor sets by the
//! [`NeighborResolver`](crate::core::neighbors::NeighborResolver).

use std::collections::BTreeSet;

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize, Serializer};

use crate::core::error::DecompositionError;
use crate::core::neighbors::{LeafNeighbors, NeighborRecord};
use crate::geometry::bounds::DomainBox;

/// Identifier of a leaf, unique within one decomposition.
pub type LeafId = usize;

/// One terminal partition: an id, owned point indices, and a box.
///
/// # Examples
///
/// ```rust
/// use domain_decomp::core::leaf::Leaf;
///
/// let leaf = Leaf::new(0, (0..100).collect(), [0.0, 0.0], [1.0, 1.0]).unwrap();
/// assert_eq!(leaf.id(), 0);
/// assert_eq!(leaf.npts(), 100);
/// assert_eq!(leaf.left_edge(), &[0.0, 0.0]);
/// assert!(leaf.neighbors().is_none());
///
/// // An empty leaf is valid (e.g. the single leaf of an empty point set).
/// assert!(Leaf::new(1, vec![], [0.0], [1.0]).unwrap().is_empty());
///
/// // Inverted boxes are rejected.
/// assert!(Leaf::new(2, vec![], [1.0], [0.0]).is_err());
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct Leaf<const D: usize> {
    id: LeafId,
    indices: Vec<usize>,
    bounds: DomainBox<D>,
    neighbors: Option<LeafNeighbors<D>>,
}

impl<const D: usize> Leaf<D> {
    /// Creates a leaf from raw edge vectors.
    ///
    /// # Errors
    ///
    /// Returns [`DecompositionError::InvalidParameter`] if the edges do not form
    /// a valid box (non-finite or `left_edge[i] > right_edge[i]`).
    pub fn new(
        id: LeafId,
        indices: Vec<usize>,
        left_edge: [f64; D],
        right_edge: [f64; D],
    ) -> Result<Self, DecompositionError> {
        let bounds = DomainBox::new(left_edge, right_edge)?;
        Ok(Self::from_bounds(id, indices, bounds))
    }

    /// Creates a leaf from an already validated box.
    #[must_use]
    pub const fn from_bounds(id: LeafId, indices: Vec<usize>, bounds: DomainBox<D>) -> Self {
        Self {
            id,
            indices,
            bounds,
            neighbors: None,
        }
    }

    /// The leaf id.
    #[inline]
    #[must_use]
    pub const fn id(&self) -> LeafId {
        self.id
    }

    /// Indices of the points owned by this leaf.
    #[inline]
    #[must_use]
    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    /// Number of points owned.
    #[inline]
    #[must_use]
    pub fn npts(&self) -> usize {
        self.indices.len()
    }

    /// Returns `true` if the leaf owns no points.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// The leaf box.
    #[inline]
    #[must_use]
    pub const fn bounds(&self) -> &DomainBox<D> {
        &self.bounds
    }

    /// Low corner of the leaf box.
    #[inline]
    #[must_use]
    pub const fn left_edge(&self) -> &[f64; D] {
        self.bounds.left_edge()
    }

    /// High corner of the leaf box.
    #[inline]
    #[must_use]
    pub const fn right_edge(&self) -> &[f64; D] {
        self.bounds.right_edge()
    }

    /// Returns `true` if `coords` lies in the closed leaf box.
    #[must_use]
    pub fn contains(&self, coords: &[f64; D]) -> bool {
        self.bounds.contains(coords)
    }

    /// Neighbor sets, if they have been resolved.
    #[must_use]
    pub const fn neighbors(&self) -> Option<&LeafNeighbors<D>> {
        self.neighbors.as_ref()
    }

    /// Every neighboring leaf id (excluding this leaf), if resolved.
    #[must_use]
    pub fn all_neighbors(&self) -> Option<BTreeSet<LeafId>> {
        self.neighbors
            .as_ref()
            .map(|n| n.union_excluding(self.id))
    }

    pub(crate) fn set_neighbors(&mut self, neighbors: LeafNeighbors<D>) {
        debug_assert!(
            self.neighbors.is_none(),
            "neighbors of leaf {} resolved twice",
            self.id
        );
        self.neighbors = Some(neighbors);
    }
}

// =============================================================================
// SERIALIZATION
// =============================================================================

#[derive(Serialize, Deserialize)]
struct LeafRecord {
    id: LeafId,
    indices: Vec<usize>,
    left_edge: Vec<f64>,
    right_edge: Vec<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    neighbors: Option<NeighborRecord>,
}

impl<const D: usize> From<&Leaf<D>> for LeafRecord {
    fn from(leaf: &Leaf<D>) -> Self {
        Self {
            id: leaf.id,
            indices: leaf.indices.clone(),
            left_edge: leaf.left_edge().to_vec(),
            right_edge: leaf.right_edge().to_vec(),
            neighbors: leaf.neighbors.as_ref().map(NeighborRecord::from),
        }
    }
}

impl<const D: usize> TryFrom<LeafRecord> for Leaf<D> {
    type Error = DecompositionError;

    fn try_from(record: LeafRecord) -> Result<Self, Self::Error> {
        let mismatch = |edge: &str, len: usize| {
            DecompositionError::invalid(
                "leaf",
                format!("{edge} has {len} coordinates, expected {D}"),
            )
        };
        let left_len = record.left_edge.len();
        let right_len = record.right_edge.len();
        let left: [f64; D] = record
            .left_edge
            .try_into()
            .map_err(|_| mismatch("left_edge", left_len))?;
        let right: [f64; D] = record
            .right_edge
            .try_into()
            .map_err(|_| mismatch("right_edge", right_len))?;

        let mut leaf = Self::new(record.id, record.indices, left, right)?;
        leaf.neighbors = record.neighbors.map(LeafNeighbors::try_from).transpose()?;
        Ok(leaf)
    }
}

impl<const D: usize> Serialize for Leaf<D> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        LeafRecord::from(self).serialize(serializer)
    }
}

impl<'de, const D: usize> Deserialize<'de> for Leaf<D> {
    fn deserialize<De>(deserializer: De) -> Result<Self, De::Error>
    where
        De: Deserializer<'de>,
    {
        let record = LeafRecord::deserialize(deserializer)?;
        Self::try_from(record).map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_leaf_2d_and_3d() {
        let leaf2 = Leaf::new(0, (0..100).collect(), [0.0; 2], [1.0; 2]).unwrap();
        let leaf3 = Leaf::new(0, (0..100).collect(), [0.0; 3], [1.0; 3]).unwrap();
        assert_eq!(leaf2.npts(), 100);
        assert_eq!(leaf3.npts(), 100);
        assert_eq!(leaf3.right_edge(), &[1.0, 1.0, 1.0]);
        assert!(leaf2.contains(&[0.5, 1.0]));
        assert!(!leaf2.contains(&[0.5, 1.5]));
        assert!(leaf2.all_neighbors().is_none());
    }

    #[test]
    fn test_leaf_rejects_bad_box() {
        let err = Leaf::new(0, vec![], [0.0, f64::NAN], [1.0, 1.0]).unwrap_err();
        assert!(matches!(
            err,
            DecompositionError::InvalidParameter {
                parameter: "domain",
                ..
            }
        ));
    }

    #[test]
    fn test_leaf_deserialize_checks_dimension() {
        let json = r#"{"id":3,"indices":[1,2],"left_edge":[0.0,0.0],"right_edge":[1.0,1.0]}"#;
        let leaf: Leaf<2> = serde_json::from_str(json).unwrap();
        assert_eq!(leaf.id(), 3);
        assert_eq!(leaf.indices(), &[1, 2]);
        assert!(serde_json::from_str::<Leaf<3>>(json).is_err());
    }
}
