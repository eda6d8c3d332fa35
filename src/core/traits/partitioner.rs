//! Common contract for partitioning strategies.
//!
//! Every strategy selectable through [`Algorithm`] implements
//! [`Partitioner`]: it consumes a read-only point slice and a root box and
//! returns a [`Decomposition`] whose leaves cover every point index exactly
//! once and whose boxes tessellate the root box.

use std::fmt;

use crate::core::decomposition::Decomposition;
use crate::core::dispatch::Algorithm;
use crate::core::error::DecompositionError;
use crate::geometry::bounds::DomainBox;
use crate::geometry::point::Point;

/// A partitioning strategy.
pub trait Partitioner<const D: usize>: fmt::Debug + Send + Sync {
    /// The registry tag of this strategy.
    fn algorithm(&self) -> Algorithm;

    /// Partitions `points` inside `domain` into leaves.
    ///
    /// # Errors
    ///
    /// Returns [`DecompositionError::InvalidParameter`] when the inputs cannot
    /// yield a valid partition (see [`validate_points`] and the strategy's own
    /// constraints).
    fn partition(
        &self,
        points: &[Point<D>],
        domain: &DomainBox<D>,
    ) -> Result<Decomposition<D>, DecompositionError>;
}

/// Checks that every point is finite and inside the closed `domain`.
///
/// # Errors
///
/// Returns [`DecompositionError::InvalidParameter`] naming the first offending index.
pub fn validate_points<const D: usize>(
    points: &[Point<D>],
    domain: &DomainBox<D>,
) -> Result<(), DecompositionError> {
    for (index, point) in points.iter().enumerate() {
        if !point.is_finite() {
            return Err(DecompositionError::invalid(
                "points",
                format!("point {index} has non-finite coordinates {:?}", point.coords()),
            ));
        }
        if !domain.contains(point.coords()) {
            return Err(DecompositionError::invalid(
                "points",
                format!(
                    "point {index} at {:?} lies outside the domain [{:?}, {:?}]",
                    point.coords(),
                    domain.left_edge(),
                    domain.right_edge()
                ),
            ));
        }
    }
    Ok(())
}
