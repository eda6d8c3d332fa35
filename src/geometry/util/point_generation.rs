//! Point generation inside a domain box.
//!
//! Helpers for producing test, benchmark, and demo inputs for the
//! partitioners. Every generated point lies in the closed box it was
//! generated for, so the output can be passed straight to
//! [`decompose`](crate::core::dispatch::decompose).

use rand::{Rng, SeedableRng};

use crate::core::error::DecompositionError;
use crate::geometry::bounds::DomainBox;
use crate::geometry::point::Point;

/// Generate `n_points` uniformly random points in `domain`.
///
/// Axes with zero width yield the left edge coordinate.
///
/// # Examples
///
/// ```
/// use domain_decomp::geometry::bounds::DomainBox;
/// use domain_decomp::geometry::util::generate_random_points_in_box;
///
/// let domain = DomainBox::new([-1.0, 0.0], [1.0, 10.0]).unwrap();
/// let points = generate_random_points_in_box(100, &domain);
/// assert_eq!(points.len(), 100);
/// assert!(points.iter().all(|p| domain.contains(p.coords())));
/// ```
#[must_use]
pub fn generate_random_points_in_box<const D: usize>(
    n_points: usize,
    domain: &DomainBox<D>,
) -> Vec<Point<D>> {
    let mut rng = rand::rng();
    sample_box(&mut rng, n_points, domain)
}

/// Generate random points with a seeded RNG for reproducible results.
///
/// # Examples
///
/// ```
/// use domain_decomp::geometry::bounds::DomainBox;
/// use domain_decomp::geometry::util::generate_random_points_in_box_seeded;
///
/// let domain = DomainBox::<3>::unit();
/// let a = generate_random_points_in_box_seeded(50, &domain, 42);
/// let b = generate_random_points_in_box_seeded(50, &domain, 42);
/// assert_eq!(a, b);
/// assert_ne!(a, generate_random_points_in_box_seeded(50, &domain, 43));
/// ```
#[must_use]
pub fn generate_random_points_in_box_seeded<const D: usize>(
    n_points: usize,
    domain: &DomainBox<D>,
    seed: u64,
) -> Vec<Point<D>> {
    let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
    sample_box(&mut rng, n_points, domain)
}

fn sample_box<R: Rng, const D: usize>(
    rng: &mut R,
    n_points: usize,
    domain: &DomainBox<D>,
) -> Vec<Point<D>> {
    let (left, right) = (domain.left_edge(), domain.right_edge());
    (0..n_points)
        .map(|_| {
            Point::new(std::array::from_fn(|axis| {
                if left[axis] < right[axis] {
                    rng.random_range(left[axis]..right[axis])
                } else {
                    left[axis]
                }
            }))
        })
        .collect()
}

/// Generate a regular grid of `points_per_dim^D` cell-centered points.
///
/// The box is divided into `points_per_dim` equal cells per axis and one
/// point is placed at the center of each cell, so no point lies on a cell
/// face. Points are emitted in row-major order (last axis fastest) using a
/// mixed-radix counter.
///
/// # Errors
///
/// Returns [`DecompositionError::InvalidParameter`] if `points_per_dim` is zero
/// or the total point count overflows `usize`.
///
/// # Examples
///
/// ```
/// use domain_decomp::geometry::bounds::DomainBox;
/// use domain_decomp::geometry::util::generate_grid_points;
///
/// let grid = generate_grid_points(2, &DomainBox::<2>::unit()).unwrap();
/// assert_eq!(grid.len(), 4);
/// assert_eq!(grid[0].coords(), &[0.25, 0.25]);
/// assert_eq!(grid[1].coords(), &[0.25, 0.75]);
/// assert_eq!(grid[3].coords(), &[0.75, 0.75]);
/// ```
pub fn generate_grid_points<const D: usize>(
    points_per_dim: usize,
    domain: &DomainBox<D>,
) -> Result<Vec<Point<D>>, DecompositionError> {
    if points_per_dim == 0 {
        return Err(DecompositionError::invalid(
            "points_per_dim",
            "a grid needs at least one point per axis",
        ));
    }
    let total_points = (0..D).try_fold(1_usize, |acc, _| {
        acc.checked_mul(points_per_dim).ok_or_else(|| {
            DecompositionError::invalid(
                "points_per_dim",
                format!("grid size {points_per_dim}^{D} overflows usize"),
            )
        })
    })?;

    #[allow(clippy::cast_precision_loss)]
    let cells = points_per_dim as f64;
    let width = domain.width();
    let left = domain.left_edge();

    let mut points = Vec::with_capacity(total_points);
    let mut idx = [0_usize; D];
    for _ in 0..total_points {
        #[allow(clippy::cast_precision_loss)]
        let coords = std::array::from_fn(|d| left[d] + width[d] * (idx[d] as f64 + 0.5) / cells);
        points.push(Point::new(coords));

        for d in (0..D).rev() {
            idx[d] += 1;
            if idx[d] < points_per_dim {
                break;
            }
            idx[d] = 0;
        }
    }
    Ok(points)
}
