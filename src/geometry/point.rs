//! Data and operations on d-dimensional points.
//!
//! A [`Point`] is a fixed-size array of `f64` coordinates. Point sets are
//! passed around as `&[Point<D>]` and referenced by index; nothing in this
//! crate mutates a point once it has been handed to a partitioner.

#![forbid(unsafe_code)]

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize, Serializer};

// =============================================================================
// POINT STRUCT DEFINITION
// =============================================================================

/// A point in D-dimensional space with double-precision coordinates.
///
/// # Examples
///
/// ```rust
/// use domain_decomp::geometry::point::Point;
///
/// let p = Point::new([0.25, 0.75]);
/// assert_eq!(p.coords(), &[0.25, 0.75]);
/// assert_eq!(p.get(1), Some(0.75));
/// assert_eq!(p.get(2), None);
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Point<const D: usize> {
    coords: [f64; D],
}

// =============================================================================
// PUBLIC API
// =============================================================================

impl<const D: usize> Point<D> {
    /// Creates a point from its coordinates.
    #[inline]
    #[must_use]
    pub const fn new(coords: [f64; D]) -> Self {
        Self { coords }
    }

    /// Returns a reference to the coordinate array.
    #[inline]
    #[must_use]
    pub const fn coords(&self) -> &[f64; D] {
        &self.coords
    }

    /// Returns the coordinates by value.
    #[inline]
    #[must_use]
    pub const fn to_array(&self) -> [f64; D] {
        self.coords
    }

    /// Returns the coordinate along `axis`, or `None` if `axis >= D`.
    #[inline]
    #[must_use]
    pub fn get(&self, axis: usize) -> Option<f64> {
        self.coords.get(axis).copied()
    }

    /// Returns `true` if no coordinate is NaN or infinite.
    #[inline]
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.coords.iter().all(|c| c.is_finite())
    }

    /// Returns the dimension `D`.
    #[inline]
    #[must_use]
    pub const fn dim(&self) -> usize {
        D
    }
}

// =============================================================================
// CONVERSIONS
// =============================================================================

impl<const D: usize> From<[f64; D]> for Point<D> {
    #[inline]
    fn from(coords: [f64; D]) -> Self {
        Self::new(coords)
    }
}

impl<const D: usize> From<Point<D>> for [f64; D] {
    #[inline]
    fn from(point: Point<D>) -> Self {
        point.coords
    }
}

impl<const D: usize> AsRef<[f64; D]> for Point<D> {
    #[inline]
    fn as_ref(&self) -> &[f64; D] {
        &self.coords
    }
}

// =============================================================================
// SERIALIZATION
// =============================================================================

/// Points serialize as a plain coordinate sequence.
impl<const D: usize> Serialize for Point<D> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.coords.as_slice().serialize(serializer)
    }
}

impl<'de, const D: usize> Deserialize<'de> for Point<D> {
    fn deserialize<De>(deserializer: De) -> Result<Self, De::Error>
    where
        De: Deserializer<'de>,
    {
        let coords = Vec::<f64>::deserialize(deserializer)?;
        let len = coords.len();
        let coords: [f64; D] = coords.try_into().map_err(|_| {
            de::Error::invalid_length(len, &format!("{D} coordinates").as_str())
        })?;
        Ok(Self::new(coords))
    }
}
