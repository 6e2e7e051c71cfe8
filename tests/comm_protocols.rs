//! Multi-rank reduction protocols over the in-process fabric.
#![cfg(feature = "local-fabric")]

use std::rc::Rc;

use ume::comm::Op;
use ume::testing::{
    ghosted_point_mesh, run_ranks, shared_point_mesh, validate_entity_sharing,
    SHARED_COPY_POINT, SHARED_SOURCE_POINT,
};
use ume::vec3::Vec3;

#[test]
fn gathscat_sum_doubles_the_shared_value_on_both_ranks() {
    let results = run_ranks(2, |rank, transport| {
        let mesh = shared_point_mesh(rank, Rc::new(transport));
        let shared = if rank == 0 { SHARED_SOURCE_POINT } else { SHARED_COPY_POINT };

        // Both ranks hold the global index of the shared point.
        let mut field = vec![0.0; mesh.points.size()];
        field[shared] = SHARED_SOURCE_POINT as f64;

        mesh.points
            .gathscat(mesh.comm(), Op::Sum, &mut field)
            .unwrap();
        (shared, field)
    });

    for (shared, field) in &results {
        assert_eq!(field[*shared], 2.0 * SHARED_SOURCE_POINT as f64);
        // Unshared entries are untouched.
        for (p, &v) in field.iter().enumerate() {
            if p != *shared {
                assert_eq!(v, 0.0);
            }
        }
    }
}

#[test]
fn gather_reduces_on_the_source_only() {
    let results = run_ranks(2, |rank, transport| {
        let mesh = shared_point_mesh(rank, Rc::new(transport));
        let shared = if rank == 0 { SHARED_SOURCE_POINT } else { SHARED_COPY_POINT };

        let mut field = vec![0; mesh.points.size()];
        field[shared] = if rank == 0 { 10 } else { 42 };
        mesh.points.gather(mesh.comm(), Op::Max, &mut field).unwrap();
        field[shared]
    });

    // The source reduced in the copy's larger value; the copy did not
    // hear back (gather has no return phase), so it still holds 42
    // while a scatter would be needed to publish the merged 42.
    assert_eq!(results[0], 42);
    assert_eq!(results[1], 42);

    let results = run_ranks(2, |rank, transport| {
        let mesh = shared_point_mesh(rank, Rc::new(transport));
        let shared = if rank == 0 { SHARED_SOURCE_POINT } else { SHARED_COPY_POINT };
        let mut field = vec![0; mesh.points.size()];
        field[shared] = if rank == 0 { 10 } else { 5 };
        mesh.points.gather(mesh.comm(), Op::Max, &mut field).unwrap();
        field[shared]
    });

    // With the copy smaller, the source keeps its own maximum and the
    // copy is left untouched.
    assert_eq!(results, vec![10, 5]);
}

#[test]
fn scatter_overwrites_copies_and_ghosts() {
    let results = run_ranks(2, |rank, transport| {
        let mesh = ghosted_point_mesh(rank, Rc::new(transport));
        let mut field = vec![Vec3::zero(); mesh.points.size()];
        if rank == 0 {
            field[SHARED_SOURCE_POINT] = Vec3::new(1.0, 2.0, 3.0);
        }
        mesh.points.scatter(mesh.comm(), &mut field).unwrap();
        *field.last().unwrap()
    });

    // Rank 1's last index is the ghost; it must now mirror the source.
    assert_eq!(results[1], Vec3::new(1.0, 2.0, 3.0));
}

#[test]
fn repeated_exchanges_rotate_tags_without_cross_talk() {
    let results = run_ranks(2, |rank, transport| {
        let mesh = shared_point_mesh(rank, Rc::new(transport));
        let shared = if rank == 0 { SHARED_SOURCE_POINT } else { SHARED_COPY_POINT };
        let mut field = vec![0.0; mesh.points.size()];
        field[shared] = 1.0;
        for _ in 0..32 {
            mesh.points
                .gathscat(mesh.comm(), Op::Max, &mut field)
                .unwrap();
        }
        field[shared]
    });
    assert_eq!(results, vec![1.0, 1.0]);
}

#[test]
fn point_normals_agree_across_ranks_after_parallel_sum() {
    let results = run_ranks(2, |rank, transport| {
        let mesh = shared_point_mesh(rank, Rc::new(transport));
        let shared = if rank == 0 { SHARED_SOURCE_POINT } else { SHARED_COPY_POINT };
        let norm = mesh.caccess_vec3v("point_norm");
        (norm[shared], norm[(shared + 1) % 8])
    });

    // The two cubes' outward diagonals at the shared corner cancel:
    // the summed normal is zero on both ranks, identically.
    assert_eq!(results[0].0, Vec3::zero());
    assert_eq!(results[1].0, Vec3::zero());
    // Unshared boundary points keep their unit normals.
    assert!((results[0].1.mag() - 1.0).abs() < 1e-12);
    assert!((results[1].1.mag() - 1.0).abs() < 1e-12);
}

#[test]
fn ghost_addressing_round_trip_validates() {
    let ents = run_ranks(2, |rank, transport| {
        let mesh = ghosted_point_mesh(rank, Rc::new(transport));
        mesh.points.ent.clone()
    });
    let refs: Vec<_> = ents.iter().collect();
    validate_entity_sharing(&refs).unwrap();
}

#[test]
fn broken_ghost_addressing_fails_validation() {
    let mut ents = run_ranks(2, |rank, transport| {
        let mesh = ghosted_point_mesh(rank, Rc::new(transport));
        mesh.points.ent.clone()
    });
    // Point the ghost at a bogus remote index.
    ents[1].src_idx[0] = 999;
    let refs: Vec<_> = ents.iter().collect();
    assert!(validate_entity_sharing(&refs).is_err());
}
