//! Integration tests for leaf adjacency.
//!
//! Checks the neighbor sets produced through the public entry points:
//! symmetry across shared faces, geometric consistency of every reported
//! pair, agreement with a pairwise face-contact scan, and wrap-around
//! adjacency on periodic axes.

use domain_decomp::prelude::*;
use proptest::prelude::*;
use std::collections::BTreeSet;

/// Returns `true` if `a` and `b` overlap as open intervals on every axis except `skip`.
fn overlaps_except<const D: usize>(a: &Leaf<D>, b: &Leaf<D>, skip: usize) -> bool {
    (0..D).filter(|&k| k != skip).all(|k| {
        a.left_edge()[k] < b.right_edge()[k] && b.left_edge()[k] < a.right_edge()[k]
    })
}

/// Right-hand neighbors of `leaves[pos]` along `axis` by a pairwise scan of
/// every leaf, wrapping from the domain's high face to its low face when
/// `periodic` is set.
fn face_contact_scan<const D: usize>(
    leaves: &[Leaf<D>],
    domain: &DomainBox<D>,
    periodic: bool,
    pos: usize,
    axis: usize,
) -> BTreeSet<LeafId> {
    let leaf = &leaves[pos];
    let wraps = periodic && leaf.right_edge()[axis] == domain.right_edge()[axis];
    leaves
        .iter()
        .enumerate()
        .filter(|&(other_pos, other)| {
            let direct = other_pos != pos && other.left_edge()[axis] == leaf.right_edge()[axis];
            let wrapped = wraps && other.left_edge()[axis] == domain.left_edge()[axis];
            (direct || wrapped) && overlaps_except(leaf, other, axis)
        })
        .map(|(_, other)| other.id())
        .collect()
}

fn assert_symmetric<const D: usize>(leaves: &[Leaf<D>]) {
    for leaf in leaves {
        let neighbors = leaf.neighbors().unwrap();
        for axis in 0..D {
            for &other in neighbors.right(axis) {
                assert!(
                    leaves[other].neighbors().unwrap().left(axis).contains(&leaf.id()),
                    "leaf {} lists {other} on its right along axis {axis}, not reciprocated",
                    leaf.id()
                );
            }
            for &other in neighbors.left(axis) {
                assert!(leaves[other].neighbors().unwrap().right(axis).contains(&leaf.id()));
            }
        }
    }
}

#[test]
fn test_grid_neighbors_2d() {
    // 8x8 cell-centered points, four per leaf: a regular 4x4 layout of leaf boxes.
    let domain = DomainBox::<2>::unit();
    let points = generate_grid_points(8, &domain).unwrap();
    let leaves = leaves("kdtree", &points, [0.0; 2], [1.0; 2], false, 4).unwrap();
    assert_eq!(leaves.len(), 16);
    assert_symmetric(&leaves);

    for leaf in &leaves {
        let neighbors = leaf.neighbors().unwrap();
        for axis in 0..2 {
            // Non-periodic: faces on the domain boundary have no neighbors.
            assert_eq!(neighbors.left(axis).is_empty(), leaf.left_edge()[axis] == 0.0);
            assert_eq!(neighbors.right(axis).is_empty(), leaf.right_edge()[axis] == 1.0);
            assert!(!neighbors.is_periodic_face(Face::left(axis)));
        }
    }

    // Interior leaves of a regular 4x4 layout have exactly four face neighbors.
    let interior = leaves
        .iter()
        .filter(|l| l.left_edge().iter().chain(l.right_edge()).all(|&c| c != 0.0 && c != 1.0))
        .collect::<Vec<_>>();
    assert_eq!(interior.len(), 4);
    for leaf in interior {
        assert_eq!(leaf.all_neighbors().unwrap().len(), 4);
    }
}

#[test]
fn test_periodic_wrap_2d() {
    let domain = DomainBox::<2>::unit();
    let points = generate_grid_points(8, &domain).unwrap();
    let leaves = leaves("kdtree", &points, [0.0; 2], [1.0; 2], true, 4).unwrap();
    assert_symmetric(&leaves);

    for leaf in &leaves {
        let neighbors = leaf.neighbors().unwrap();
        assert_eq!(leaf.all_neighbors().unwrap().len(), 4, "leaf {}", leaf.id());
        for axis in 0..2 {
            if leaf.left_edge()[axis] == 0.0 {
                assert!(neighbors.is_periodic_face(Face::left(axis)));
                for &other in neighbors.left(axis) {
                    assert_eq!(leaves[other].right_edge()[axis], 1.0);
                }
            }
        }
    }
}

#[test]
fn test_partial_periodicity() {
    let domain = DomainBox::new([0.0, 0.0, 0.0], [2.0, 1.0, 1.0]).unwrap();
    let points = generate_random_points_in_box_seeded(400, &domain, 17);
    let decomposition = decompose(
        &points,
        domain,
        [false, true, false],
        &DecompositionOptions::with_leafsize(25),
    )
    .unwrap();
    let leaves = decomposition.leaves();
    assert_symmetric(leaves);

    for leaf in leaves {
        let neighbors = leaf.neighbors().unwrap();
        if leaf.left_edge()[0] == 0.0 {
            assert!(neighbors.left(0).is_empty());
        }
        if leaf.left_edge()[1] == 0.0 {
            assert!(!neighbors.left(1).is_empty());
        }
    }
}

#[test]
fn test_neighbor_sets_serialize() {
    let points = generate_random_points_in_box_seeded(50, &DomainBox::<2>::unit(), 3);
    let leaves = leaves("kdtree", &points, [0.0; 2], [1.0; 2], true, 10).unwrap();
    let json = serde_json::to_string(&leaves).unwrap();
    let back: Vec<Leaf<2>> = serde_json::from_str(&json).unwrap();
    assert_eq!(back, leaves);
}

proptest! {
    #[test]
    fn prop_neighbors_are_symmetric_and_touching(
        seed in any::<u64>(),
        n in 1_usize..400,
        leafsize in 2_usize..50,
    ) {
        let domain = DomainBox::<3>::unit();
        let points = generate_random_points_in_box_seeded(n, &domain, seed);
        let leaves = leaves("kdtree", &points, [0.0; 3], [1.0; 3], false, leafsize).unwrap();

        for leaf in &leaves {
            let neighbors = leaf.neighbors().unwrap();
            prop_assert!(!leaf.all_neighbors().unwrap().contains(&leaf.id()));
            for axis in 0..3 {
                for &other in neighbors.right(axis) {
                    let other = &leaves[other];
                    prop_assert_eq!(leaf.right_edge()[axis], other.left_edge()[axis]);
                    prop_assert!(overlaps_except(leaf, other, axis));
                    prop_assert!(other.neighbors().unwrap().left(axis).contains(&leaf.id()));
                }
            }
        }
    }

    #[test]
    fn prop_neighbors_match_face_contact_scan(
        seed in any::<u64>(),
        n in 1_usize..300,
        leafsize in 2_usize..40,
        periodic in any::<bool>(),
    ) {
        let domain = DomainBox::new([0.0, -1.0, 0.0], [1.0, 1.0, 0.5]).unwrap();
        let points = generate_random_points_in_box_seeded(n, &domain, seed);
        let leaves = leaves(
            "kdtree",
            &points,
            *domain.left_edge(),
            *domain.right_edge(),
            periodic,
            leafsize,
        )
        .unwrap();

        for (pos, leaf) in leaves.iter().enumerate() {
            let neighbors = leaf.neighbors().unwrap();
            for axis in 0..3 {
                let expected = face_contact_scan(&leaves, &domain, periodic, pos, axis);
                prop_assert_eq!(
                    neighbors.right(axis),
                    &expected,
                    "leaf {} axis {} periodic {}",
                    leaf.id(),
                    axis,
                    periodic
                );
            }
        }
    }
}
