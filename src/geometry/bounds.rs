//! Axis-aligned domain boxes.
//!
//! A [`DomainBox`] is the pair of corner vectors (`left_edge`, `right_edge`)
//! that delimits the root domain of a decomposition and every leaf in it.
//! The invariant `left_edge[i] <= right_edge[i]` (with finite values) is
//! checked once at construction; everything downstream relies on it.
//!
//! Child boxes are produced by [`DomainBox::split`], which copies the split
//! coordinate verbatim into both children. Two sibling boxes therefore share
//! a face whose coordinate compares exactly equal, which is what neighbor
//! resolution keys on.

#![forbid(unsafe_code)]

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize, Serializer};
use thiserror::Error;

/// Errors raised when validating a [`DomainBox`].
#[derive(Clone, Debug, Error, PartialEq)]
#[non_exhaustive]
pub enum DomainBoxError {
    /// An edge coordinate is NaN or infinite.
    #[error("Non-finite edge on axis {axis}: left={left}, right={right}")]
    NonFiniteEdge {
        /// Offending axis.
        axis: usize,
        /// Left edge value on that axis.
        left: f64,
        /// Right edge value on that axis.
        right: f64,
    },

    /// The left edge lies beyond the right edge.
    #[error("Inverted box on axis {axis}: left edge {left} exceeds right edge {right}")]
    InvertedAxis {
        /// Offending axis.
        axis: usize,
        /// Left edge value on that axis.
        left: f64,
        /// Right edge value on that axis.
        right: f64,
    },

    /// Both edges are finite but their difference is not representable.
    #[error("Width of axis {axis} overflows: left={left}, right={right}")]
    WidthOverflow {
        /// Offending axis.
        axis: usize,
        /// Left edge value on that axis.
        left: f64,
        /// Right edge value on that axis.
        right: f64,
    },

    /// The edge vectors do not have `D` entries (deserialization only).
    #[error("Expected {expected} coordinates per edge, found left={left}, right={right}")]
    DimensionMismatch {
        /// The dimension of the box being built.
        expected: usize,
        /// Number of left-edge coordinates supplied.
        left: usize,
        /// Number of right-edge coordinates supplied.
        right: usize,
    },
}

/// An axis-aligned box `[left_edge, right_edge]` in D dimensions.
///
/// # Examples
///
/// ```rust
/// use domain_decomp::geometry::bounds::DomainBox;
///
/// let domain = DomainBox::new([0.0, 0.0], [2.0, 1.0]).unwrap();
/// assert_eq!(domain.width(), [2.0, 1.0]);
/// assert_eq!(domain.longest_axis(), Some(0));
///
/// let (left, right) = domain.split(0, 0.5);
/// assert_eq!(left.right_edge(), &[0.5, 1.0]);
/// assert_eq!(right.left_edge(), &[0.5, 0.0]);
/// assert!(!left.interiors_overlap(&right));
///
/// assert!(DomainBox::new([1.0], [0.0]).is_err());
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DomainBox<const D: usize> {
    left_edge: [f64; D],
    right_edge: [f64; D],
}

impl<const D: usize> DomainBox<D> {
    /// Creates a box, validating that every edge and width is finite and
    /// that the edges are ordered.
    ///
    /// # Errors
    ///
    /// Returns [`DomainBoxError::NonFiniteEdge`] for NaN/infinite edges,
    /// [`DomainBoxError::InvertedAxis`] when `left_edge[i] > right_edge[i]`,
    /// and [`DomainBoxError::WidthOverflow`] when `right_edge[i] - left_edge[i]`
    /// is infinite.
    pub fn new(left_edge: [f64; D], right_edge: [f64; D]) -> Result<Self, DomainBoxError> {
        for (axis, (&left, &right)) in left_edge.iter().zip(right_edge.iter()).enumerate() {
            if !left.is_finite() || !right.is_finite() {
                return Err(DomainBoxError::NonFiniteEdge { axis, left, right });
            }
            if left > right {
                return Err(DomainBoxError::InvertedAxis { axis, left, right });
            }
            if !(right - left).is_finite() {
                return Err(DomainBoxError::WidthOverflow { axis, left, right });
            }
        }
        Ok(Self {
            left_edge,
            right_edge,
        })
    }

    /// The unit box `[0, 1]^D`.
    #[must_use]
    pub const fn unit() -> Self {
        Self {
            left_edge: [0.0; D],
            right_edge: [1.0; D],
        }
    }

    /// Low corner.
    #[inline]
    #[must_use]
    pub const fn left_edge(&self) -> &[f64; D] {
        &self.left_edge
    }

    /// High corner.
    #[inline]
    #[must_use]
    pub const fn right_edge(&self) -> &[f64; D] {
        &self.right_edge
    }

    /// Extent along every axis.
    #[must_use]
    pub fn width(&self) -> [f64; D] {
        std::array::from_fn(|axis| self.width_along(axis))
    }

    /// Extent along `axis`.
    ///
    /// # Panics
    ///
    /// Panics if `axis >= D`.
    #[inline]
    #[must_use]
    pub fn width_along(&self, axis: usize) -> f64 {
        self.right_edge[axis] - self.left_edge[axis]
    }

    /// Product of the extents (1.0 for `D == 0`).
    #[must_use]
    pub fn volume(&self) -> f64 {
        self.width().iter().product()
    }

    /// Returns `true` if the box has zero extent along some axis.
    #[must_use]
    pub fn is_degenerate(&self) -> bool {
        self.width().iter().any(|&w| w <= 0.0)
    }

    /// Axis of greatest extent; ties resolve to the lowest axis index.
    ///
    /// Returns `None` only for `D == 0`.
    #[must_use]
    pub fn longest_axis(&self) -> Option<usize> {
        let mut best: Option<(usize, f64)> = None;
        for (axis, width) in self.width().into_iter().enumerate() {
            match best {
                Some((_, best_width)) if width <= best_width => {}
                _ => best = Some((axis, width)),
            }
        }
        best.map(|(axis, _)| axis)
    }

    /// Returns `true` if `coords` lies inside the closed box.
    #[must_use]
    pub fn contains(&self, coords: &[f64; D]) -> bool {
        coords
            .iter()
            .zip(self.left_edge.iter().zip(self.right_edge.iter()))
            .all(|(&c, (&l, &r))| l <= c && c <= r)
    }

    /// Splits the box along `axis` at coordinate `at`.
    ///
    /// The left child keeps `[left_edge, at]` and the right child `[at, right_edge]`
    /// along `axis`; all other axes are copied unchanged.
    ///
    /// # Panics
    ///
    /// Panics if `axis >= D`. In debug builds, also panics if `at` lies outside the box.
    #[must_use]
    pub fn split(&self, axis: usize, at: f64) -> (Self, Self) {
        debug_assert!(
            self.left_edge[axis] <= at && at <= self.right_edge[axis],
            "split coordinate {at} outside [{}, {}] on axis {axis}",
            self.left_edge[axis],
            self.right_edge[axis]
        );
        let mut left = *self;
        let mut right = *self;
        left.right_edge[axis] = at;
        right.left_edge[axis] = at;
        (left, right)
    }

    /// Returns `true` if this box lies inside `outer` (faces may coincide).
    #[must_use]
    pub fn is_nested_in(&self, outer: &Self) -> bool {
        (0..D).all(|axis| {
            outer.left_edge[axis] <= self.left_edge[axis]
                && self.right_edge[axis] <= outer.right_edge[axis]
        })
    }

    /// Returns `true` if the open interiors of the two boxes intersect.
    ///
    /// Boxes that merely touch along a face, edge, or corner do not overlap.
    #[must_use]
    pub fn interiors_overlap(&self, other: &Self) -> bool {
        (0..D).all(|axis| spans_overlap(self, other, axis))
    }

    /// Returns `true` if the two boxes' open extents overlap on every axis
    /// except `skip`.
    #[must_use]
    pub fn overlaps_except(&self, other: &Self, skip: usize) -> bool {
        (0..D)
            .filter(|&axis| axis != skip)
            .all(|axis| spans_overlap(self, other, axis))
    }
}

#[inline]
fn spans_overlap<const D: usize>(a: &DomainBox<D>, b: &DomainBox<D>, axis: usize) -> bool {
    a.left_edge[axis] < b.right_edge[axis] && b.left_edge[axis] < a.right_edge[axis]
}

// =============================================================================
// SERIALIZATION
// =============================================================================

#[derive(Serialize, Deserialize)]
struct BoxRecord {
    left_edge: Vec<f64>,
    right_edge: Vec<f64>,
}

impl<const D: usize> TryFrom<BoxRecord> for DomainBox<D> {
    type Error = DomainBoxError;

    fn try_from(record: BoxRecord) -> Result<Self, Self::Error> {
        let (left_len, right_len) = (record.left_edge.len(), record.right_edge.len());
        let mismatch = || DomainBoxError::DimensionMismatch {
            expected: D,
            left: left_len,
            right: right_len,
        };
        let left: [f64; D] = record.left_edge.try_into().map_err(|_| mismatch())?;
        let right: [f64; D] = record.right_edge.try_into().map_err(|_| mismatch())?;
        Self::new(left, right)
    }
}

impl<const D: usize> Serialize for DomainBox<D> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        BoxRecord {
            left_edge: self.left_edge.to_vec(),
            right_edge: self.right_edge.to_vec(),
        }
        .serialize(serializer)
    }
}

/// Deserialization re-validates the box invariant.
impl<'de, const D: usize> Deserialize<'de> for DomainBox<D> {
    fn deserialize<De>(deserializer: De) -> Result<Self, De::Error>
    where
        De: Deserializer<'de>,
    {
        let record = BoxRecord::deserialize(deserializer)?;
        Self::try_from(record).map_err(de::Error::custom)
    }
}
