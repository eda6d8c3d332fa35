//! Periodic (wrap-around) boundary conditions.
//!
//! A [`PeriodicDomain`] pairs a root [`DomainBox`] with per-axis
//! [`Periodicity`] flags. Along a periodic axis the domain's low and high faces
//! are identified, so the domain behaves like a torus in that direction: the
//! period is the box width, and coordinates outside `[left, right)` wrap back
//! into it.

use crate::core::error::DecompositionError;
use crate::core::neighbors::Side;
use crate::geometry::bounds::DomainBox;

/// Per-axis periodic flags.
///
/// # Examples
///
/// ```rust
/// use domain_decomp::topology::periodic::Periodicity;
///
/// let all: Periodicity<3> = true.into();
/// assert!(all.is_periodic(2));
///
/// let slab = Periodicity::new([true, true, false]);
/// assert_eq!(slab.periodic_axes().collect::<Vec<_>>(), vec![0, 1]);
/// assert!(!Periodicity::<3>::none().any());
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Periodicity<const D: usize> {
    axes: [bool; D],
}

impl<const D: usize> Periodicity<D> {
    /// Creates periodicity flags from an explicit per-axis array.
    #[must_use]
    pub const fn new(axes: [bool; D]) -> Self {
        Self { axes }
    }

    /// No periodic axes.
    #[must_use]
    pub const fn none() -> Self {
        Self { axes: [false; D] }
    }

    /// Every axis periodic.
    #[must_use]
    pub const fn all() -> Self {
        Self { axes: [true; D] }
    }

    /// Returns `true` if `axis` wraps. Out-of-range axes never wrap.
    #[inline]
    #[must_use]
    pub fn is_periodic(&self, axis: usize) -> bool {
        self.axes.get(axis).copied().unwrap_or(false)
    }

    /// Returns `true` if at least one axis wraps.
    #[must_use]
    pub fn any(&self) -> bool {
        self.axes.iter().any(|&p| p)
    }

    /// Iterates the indices of periodic axes in ascending order.
    pub fn periodic_axes(&self) -> impl Iterator<Item = usize> + '_ {
        self.axes
            .iter()
            .enumerate()
            .filter_map(|(axis, &p)| p.then_some(axis))
    }

    /// The raw per-axis flags.
    #[must_use]
    pub const fn as_array(&self) -> &[bool; D] {
        &self.axes
    }
}

impl<const D: usize> Default for Periodicity<D> {
    fn default() -> Self {
        Self::none()
    }
}

impl<const D: usize> From<bool> for Periodicity<D> {
    fn from(periodic: bool) -> Self {
        Self {
            axes: [periodic; D],
        }
    }
}

impl<const D: usize> From<[bool; D]> for Periodicity<D> {
    fn from(axes: [bool; D]) -> Self {
        Self::new(axes)
    }
}

/// A root domain together with its wrap-around axes.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PeriodicDomain<const D: usize> {
    bounds: DomainBox<D>,
    periodicity: Periodicity<D>,
}

impl<const D: usize> PeriodicDomain<D> {
    /// Creates a periodic domain.
    ///
    /// # Errors
    ///
    /// Returns [`DecompositionError::InvalidParameter`] if a periodic axis has
    /// zero width, since such an axis has no period to wrap by.
    pub fn new(
        bounds: DomainBox<D>,
        periodicity: impl Into<Periodicity<D>>,
    ) -> Result<Self, DecompositionError> {
        let periodicity = periodicity.into();
        if let Some(axis) = periodicity
            .periodic_axes()
            .find(|&axis| bounds.width_along(axis) <= 0.0)
        {
            return Err(DecompositionError::invalid(
                "periodic",
                format!("axis {axis} is periodic but the domain has zero width along it"),
            ));
        }
        Ok(Self {
            bounds,
            periodicity,
        })
    }

    /// A domain with no periodic axes.
    #[must_use]
    pub const fn euclidean(bounds: DomainBox<D>) -> Self {
        Self {
            bounds,
            periodicity: Periodicity::none(),
        }
    }

    /// The root box.
    #[must_use]
    pub const fn bounds(&self) -> &DomainBox<D> {
        &self.bounds
    }

    /// The periodic flags.
    #[must_use]
    pub const fn periodicity(&self) -> &Periodicity<D> {
        &self.periodicity
    }

    /// The period along each axis (the domain width).
    #[must_use]
    pub fn domain_width(&self) -> [f64; D] {
        self.bounds.width()
    }

    /// Returns `true` if `bounds` touches the domain face `side` of a periodic `axis`.
    #[must_use]
    pub fn on_periodic_face(&self, bounds: &DomainBox<D>, axis: usize, side: Side) -> bool {
        if !self.periodicity.is_periodic(axis) {
            return false;
        }
        match side {
            Side::Left => bounds.left_edge()[axis] == self.bounds.left_edge()[axis],
            Side::Right => bounds.right_edge()[axis] == self.bounds.right_edge()[axis],
        }
    }

    /// Offset that maps a neighbor reached through the periodic face `side` of
    /// `axis` into the frame of the leaf looking through it.
    ///
    /// A neighbor seen through the low face sits one period below (`-width`),
    /// one seen through the high face one period above (`+width`). Non-periodic
    /// axes have no image and return `0.0`.
    #[must_use]
    pub fn image_shift(&self, axis: usize, side: Side) -> f64 {
        if !self.periodicity.is_periodic(axis) {
            return 0.0;
        }
        let width = self.bounds.width_along(axis);
        match side {
            Side::Left => -width,
            Side::Right => width,
        }
    }

    /// Translates `bounds` by the periodic image shift for (`axis`, `side`).
    ///
    /// # Errors
    ///
    /// Returns [`DecompositionError::InvalidParameter`] if the translated box
    /// is not representable, i.e. an edge leaves the finite `f64` range.
    pub fn shifted_image(
        &self,
        bounds: &DomainBox<D>,
        axis: usize,
        side: Side,
    ) -> Result<DomainBox<D>, DecompositionError> {
        let shift = self.image_shift(axis, side);
        let mut left = *bounds.left_edge();
        let mut right = *bounds.right_edge();
        left[axis] += shift;
        right[axis] += shift;
        Ok(DomainBox::new(left, right)?)
    }

    /// Wraps coordinates on periodic axes into `[left, right)`.
    ///
    /// Non-periodic axes are left untouched.
    pub fn canonicalize_point(&self, coords: &mut [f64; D]) {
        for axis in self.periodicity.periodic_axes() {
            let left = self.bounds.left_edge()[axis];
            let right = self.bounds.right_edge()[axis];
            let width = right - left;
            let c = coords[axis];
            if !c.is_finite() || (left <= c && c < right) {
                continue;
            }
            let wrapped = left + (c - left).rem_euclid(width);
            coords[axis] = if wrapped < right { wrapped } else { left };
        }
    }
}
