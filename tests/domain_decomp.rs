//! Integration tests for the public decomposition entry points.
//!
//! Covers `Leaf` construction, the `kdtree` partitioner, and the `leaves`
//! dispatcher in 2-D and 3-D with 100 uniformly random points and a
//! leafsize of 10, plus the three error scenarios.

use domain_decomp::prelude::*;

const N: usize = 100;
const LEAFSIZE: usize = 10;

fn init_tracing() {
    static INIT: std::sync::Once = std::sync::Once::new();
    INIT.call_once(|| {
        let filter = tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init();
    });
}

fn points<const D: usize>(seed: u64) -> Vec<Point<D>> {
    generate_random_points_in_box_seeded(N, &DomainBox::<D>::unit(), seed)
}

fn assert_partition<const D: usize>(leaves: &[Leaf<D>], points: &[Point<D>]) {
    let mut owned: Vec<usize> = leaves
        .iter()
        .flat_map(|leaf| leaf.indices().iter().copied())
        .collect();
    owned.sort_unstable();
    assert_eq!(owned, (0..points.len()).collect::<Vec<_>>());

    for (i, leaf) in leaves.iter().enumerate() {
        assert_eq!(leaf.id(), i);
        assert!(leaf.npts() <= LEAFSIZE);
        for &p in leaf.indices() {
            assert!(leaf.contains(points[p].coords()));
        }
    }
}

// =============================================================================
// LEAF
// =============================================================================

#[test]
fn test_leaf() {
    let leaf2 = Leaf::new(0, (0..N).collect(), [0.0; 2], [1.0; 2]).unwrap();
    let leaf3 = Leaf::new(0, (0..N).collect(), [0.0; 3], [1.0; 3]).unwrap();
    assert_eq!(leaf2.npts(), N);
    assert_eq!(leaf3.npts(), N);
    assert_eq!(leaf2.left_edge(), &[0.0; 2]);
    assert_eq!(leaf3.right_edge(), &[1.0; 3]);
}

// =============================================================================
// KDTREE
// =============================================================================

#[test]
fn test_kdtree() {
    init_tracing();
    let pts2 = points::<2>(100);
    let pts3 = points::<3>(101);

    let leaves2 = kdtree(&pts2, [0.0; 2], [1.0; 2], LEAFSIZE).unwrap();
    let leaves3 = kdtree(&pts3, [0.0; 3], [1.0; 3], LEAFSIZE).unwrap();
    assert!(leaves2.len() >= N / LEAFSIZE);
    assert!(leaves3.len() >= N / LEAFSIZE);
    assert_partition(&leaves2, &pts2);
    assert_partition(&leaves3, &pts3);

    assert!(matches!(
        kdtree(&pts2, [0.0; 2], [1.0; 2], 1),
        Err(DecompositionError::InvalidParameter { .. })
    ));
}

#[test]
fn test_kdtree_boxes_tessellate_domain() {
    let pts3 = points::<3>(7);
    let leaves = kdtree(&pts3, [0.0; 3], [1.0; 3], LEAFSIZE).unwrap();

    let total: f64 = leaves.iter().map(|leaf| leaf.bounds().volume()).sum();
    approx::assert_relative_eq!(total, 1.0, epsilon = 1e-12);
    for (i, a) in leaves.iter().enumerate() {
        assert!(a.bounds().is_nested_in(&DomainBox::unit()));
        for b in &leaves[i + 1..] {
            assert!(!a.bounds().interiors_overlap(b.bounds()));
        }
    }
}

#[test]
fn test_kdtree_is_deterministic() {
    let pts2 = points::<2>(55);
    let first = kdtree(&pts2, [0.0; 2], [1.0; 2], LEAFSIZE).unwrap();
    let second = kdtree(&pts2, [0.0; 2], [1.0; 2], LEAFSIZE).unwrap();
    assert_eq!(first, second);
}

// =============================================================================
// LEAVES
// =============================================================================

#[test]
fn test_leaves() {
    init_tracing();
    let pts2 = points::<2>(200);
    let pts3 = points::<3>(201);

    let leaves2 = leaves("kdtree", &pts2, [0.0; 2], [1.0; 2], false, LEAFSIZE).unwrap();
    let leaves3 = leaves("kdtree", &pts3, [0.0; 3], [1.0; 3], false, LEAFSIZE).unwrap();
    assert_partition(&leaves2, &pts2);
    assert_partition(&leaves3, &pts3);
    assert!(leaves2.iter().all(|leaf| leaf.neighbors().is_some()));
    assert!(leaves3.iter().all(|leaf| leaf.neighbors().is_some()));

    assert!(matches!(
        leaves("invalid", &pts2, [0.0; 2], [1.0; 2], false, LEAFSIZE),
        Err(DecompositionError::UnknownAlgorithm { .. })
    ));
}

#[test]
fn test_leaves_periodic() {
    let pts2 = points::<2>(300);
    let pts3 = points::<3>(301);

    let leaves2 = leaves("kdtree", &pts2, [0.0; 2], [1.0; 2], true, LEAFSIZE).unwrap();
    let leaves3 = leaves("kdtree", &pts3, [0.0; 3], [1.0; 3], true, LEAFSIZE).unwrap();

    // On a torus every face of every leaf has at least one neighbor.
    for leaf in &leaves2 {
        let neighbors = leaf.neighbors().unwrap();
        assert!(neighbors.iter().all(|(_, set)| !set.is_empty()), "leaf {}", leaf.id());
    }
    for leaf in &leaves3 {
        let neighbors = leaf.neighbors().unwrap();
        assert!(neighbors.iter().all(|(_, set)| !set.is_empty()), "leaf {}", leaf.id());
    }

    let pts4 = points::<4>(302);
    assert!(matches!(
        leaves("kdtree", &pts4, [0.0; 4], [1.0; 4], true, LEAFSIZE),
        Err(DecompositionError::NotImplemented { .. })
    ));
}

#[test]
fn test_worker_pipeline() {
    let pts3 = points::<3>(400);
    let nworkers = 4;
    let leafsize = leafsize_for_workers(pts3.len(), nworkers).unwrap();
    let leaves = leaves("kdtree", &pts3, [0.0; 3], [1.0; 3], false, leafsize).unwrap();
    assert_eq!(leaves.len(), nworkers);

    let assignment = assign_leaves_round_robin(&leaves, nworkers).unwrap();
    for worker in 0..nworkers {
        assert_eq!(assignment.leaves_for(worker), &[worker]);
    }
}

#[test]
fn test_decomposition_locates_new_points() {
    let domain = DomainBox::<3>::unit();
    let pts3 = points::<3>(500);
    let decomposition =
        decompose(&pts3, domain, true, &DecompositionOptions::with_leafsize(LEAFSIZE)).unwrap();

    for query in generate_random_points_in_box_seeded(50, &domain, 501) {
        let id = decomposition.locate(query.coords()).unwrap();
        assert!(decomposition.leaf(id).unwrap().contains(query.coords()));
    }
    // Wrapped back into the domain on every periodic axis.
    assert!(decomposition.locate(&[1.25, -0.5, 2.0]).is_some());
}
