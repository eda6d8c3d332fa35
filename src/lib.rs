//! # domain-decomp
//!
//! Spatial domain decomposition for parallel and out-of-core geometry.
//!
//! This library partitions a set of D-dimensional points into balanced,
//! box-delimited groups called *leaves*, so that each leaf can be handed to a
//! separate worker (for example, a worker building a local Delaunay
//! triangulation). It also determines which leaves share a face, optionally
//! across periodic (wrap-around) domain boundaries.
//!
//! # Features
//!
//! - Balanced k-d tree partitioning with a reproducible split policy
//! - Name-based strategy selection through [`core::dispatch::leaves`]
//! - Face adjacency between leaves, with per-axis periodic boundaries
//! - Point location in an existing decomposition
//! - Round-robin assignment of leaves to workers
//! - Parallel subtree construction with `rayon` (`parallel` feature, on by default)
//! - `serde` support for [`geometry::bounds::DomainBox`] and [`core::leaf::Leaf`]
//!
//! # Basic usage
//!
//! ```rust
//! use domain_decomp::prelude::*;
//!
//! let points = generate_random_points_in_box_seeded(100, &DomainBox::<2>::unit(), 42);
//! let leaves = leaves("kdtree", &points, [0.0, 0.0], [1.0, 1.0], false, 10).unwrap();
//!
//! // Every point index is owned by exactly one leaf.
//! let mut owned: Vec<usize> = leaves.iter().flat_map(|l| l.indices().iter().copied()).collect();
//! owned.sort_unstable();
//! assert_eq!(owned, (0..100).collect::<Vec<_>>());
//!
//! // No leaf holds more than `leafsize` points, and neighbors are resolved.
//! assert!(leaves.iter().all(|l| l.npts() <= 10));
//! assert!(leaves.iter().all(|l| l.neighbors().is_some()));
//! ```
//!
//! # Periodic domains
//!
//! With `periodic = true`, leaves touching opposite faces of the domain are
//! neighbors of each other. Periodic resolution is available in one to three
//! dimensions; higher-dimensional periodic requests fail with
//! [`DecompositionError::NotImplemented`](core::error::DecompositionError::NotImplemented)
//! before any partitioning work is done.
//!
//! ```rust
//! use domain_decomp::prelude::*;
//!
//! let points = generate_random_points_in_box_seeded(64, &DomainBox::<2>::unit(), 1);
//! let periodic = leaves("kdtree", &points, [0.0; 2], [1.0; 2], true, 16).unwrap();
//! let leftmost = periodic.iter().find(|l| l.left_edge()[0] == 0.0).unwrap();
//! assert!(!leftmost.neighbors().unwrap().left(0).is_empty());
//!
//! let points4 = generate_random_points_in_box_seeded(64, &DomainBox::<4>::unit(), 1);
//! assert!(matches!(
//!     leaves("kdtree", &points4, [0.0; 4], [1.0; 4], true, 16),
//!     Err(DecompositionError::NotImplemented { .. })
//! ));
//! ```
//!
//! # Configuration
//!
//! [`core::config::DecompositionOptions`] carries the algorithm, leafsize,
//! neighbor and parallelism settings for [`core::dispatch::decompose`]. The
//! subtree size above which construction forks onto the rayon pool can be set
//! process-wide with the `DOMAIN_DECOMP_PARALLEL_THRESHOLD` environment variable.
//!
//! # Logging
//!
//! The crate emits [`tracing`] events (`debug` per run, `trace` per split,
//! `warn` for degenerate but valid outcomes). It never installs a subscriber.

#![forbid(unsafe_code)]

#[macro_use]
extern crate derive_builder;

/// Leaves, partitioning strategies, dispatch, and neighbor resolution.
pub mod core {
    /// Partitioning algorithms
    pub mod algorithms {
        pub mod kdtree;
        pub use kdtree::*;
    }
    pub mod assignment;
    pub mod collections;
    pub mod config;
    pub mod decomposition;
    pub mod dispatch;
    pub mod error;
    pub mod leaf;
    pub mod neighbors;
    /// Traits shared by partitioning strategies
    pub mod traits {
        pub mod partitioner;
        pub use partitioner::*;
    }

    pub use assignment::*;
    pub use config::*;
    pub use decomposition::*;
    pub use dispatch::*;
    pub use error::*;
    pub use leaf::*;
    pub use neighbors::*;
    pub use traits::*;
}

/// Points, boxes, and point generation helpers.
pub mod geometry {
    pub mod bounds;
    pub mod point;
    /// Utility functions for producing point sets
    pub mod util {
        pub mod point_generation;
        pub use point_generation::*;
    }

    pub use bounds::*;
    pub use point::*;
    pub use util::*;
}

/// Periodic boundary handling.
pub mod topology {
    pub mod periodic;
    pub use periodic::*;
}

/// A prelude module that re-exports commonly used types and functions.
pub mod prelude {
    pub use crate::core::{
        algorithms::kdtree::{KdTree, MIN_SPLITTABLE_LEAFSIZE, kdtree},
        assignment::{WorkerAssignment, assign_leaves_round_robin},
        config::{DecompositionOptions, DecompositionOptionsBuilder},
        decomposition::Decomposition,
        dispatch::{Algorithm, decompose, leafsize_for_workers, leaves},
        error::DecompositionError,
        leaf::{Leaf, LeafId},
        neighbors::{Face, LeafNeighbors, NeighborResolver, Side},
        traits::partitioner::Partitioner,
    };

    pub use crate::core::collections::{
        FastHashMap, FastHashSet, SmallBuffer, fast_hash_map_with_capacity,
        fast_hash_set_with_capacity,
    };

    pub use crate::geometry::{
        bounds::{DomainBox, DomainBoxError},
        point::Point,
        util::*,
    };

    pub use crate::topology::periodic::{PeriodicDomain, Periodicity};
}

/// The function `is_normal` checks that structs implement `auto` traits.
/// Traits are checked at compile time, so this function is only used for
/// testing.
#[must_use]
pub const fn is_normal<T: Sized + Send + Sync + Unpin>() -> bool {
    true
}

// =============================================================================
// TESTS
// =============================================================================
