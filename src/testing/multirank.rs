//! Multi-rank fixtures over the in-process fabric.

use super::brick::brick_mesh;
use crate::comm::{LocalFabric, LocalTransport};
use crate::mesh::{comm_type, Mesh};
use crate::comm::Neighbor;
use crate::vec3::Vec3;
use std::rc::Rc;

/// Run one closure per simulated rank, each on its own thread with its
/// endpoint of a fresh [`LocalFabric`]. Results come back in rank order;
/// a panicking rank panics the caller.
pub fn run_ranks<T, F>(numpe: usize, f: F) -> Vec<T>
where
    T: Send,
    F: Fn(usize, LocalTransport) -> T + Sync,
{
    let transports = LocalFabric::new(numpe);
    let f = &f;
    std::thread::scope(|scope| {
        let handles: Vec<_> = transports
            .into_iter()
            .enumerate()
            .map(|(rank, t)| scope.spawn(move || f(rank, t)))
            .collect();
        handles
            .into_iter()
            .map(|h| h.join().expect("rank thread panicked"))
            .collect()
    })
}

/// The point index both ranks of the shared fixtures agree on: the
/// source rank's cube corner at (1, 1, 1).
pub const SHARED_SOURCE_POINT: usize = 7;

/// The copy rank's local index of the shared point.
pub const SHARED_COPY_POINT: usize = 0;

/// A two-rank fixture sharing one point.
///
/// Each rank holds its own unit cube; rank 0's point (1,1,1) is the
/// SOURCE and rank 1's point (0,0,0) is its COPY. The neighbor
/// descriptors wire the pair for the reduction protocols.
pub fn shared_point_mesh(rank: usize, comm: Rc<dyn crate::comm::Transport>) -> Mesh {
    let mut mesh = brick_mesh(1, 1, 1, comm);
    mesh.mype = rank as i32;
    mesh.numpe = 2;
    match rank {
        0 => {
            mesh.points.ent.comm_type[SHARED_SOURCE_POINT] = comm_type::SOURCE;
            mesh.points.ent.my_cpys = vec![Neighbor {
                pe: 1,
                elements: vec![SHARED_SOURCE_POINT as i32],
            }];
        }
        1 => {
            mesh.points.ent.comm_type[SHARED_COPY_POINT] = comm_type::COPY;
            mesh.points.ent.my_srcs = vec![Neighbor {
                pe: 0,
                elements: vec![SHARED_COPY_POINT as i32],
            }];
        }
        other => panic!("shared_point_mesh is a two-rank fixture, got rank {other}"),
    }
    mesh
}

/// A two-rank fixture where rank 1 holds a ghost of rank 0's point.
///
/// Rank 1's point table grows by one ghost index mirroring rank 0's
/// point (1,1,1), with the full ghost address triple filled in, so the
/// sharing round-trip can be validated and scatters reach the ghost.
pub fn ghosted_point_mesh(rank: usize, comm: Rc<dyn crate::comm::Transport>) -> Mesh {
    let mut mesh = brick_mesh(1, 1, 1, comm);
    mesh.mype = rank as i32;
    mesh.numpe = 2;
    let ds = mesh.ds();
    match rank {
        0 => {
            mesh.points.ent.comm_type[SHARED_SOURCE_POINT] = comm_type::SOURCE;
            mesh.points.ent.my_cpys = vec![Neighbor {
                pe: 1,
                elements: vec![SHARED_SOURCE_POINT as i32],
            }];
        }
        1 => {
            let local = mesh.points.local_size();
            let ghost = local; // the new index
            mesh.points.resize(&ds, local, local + 1, 1);
            mesh.points.ent.mask[ghost] = -1;
            mesh.points.ent.comm_type[ghost] = comm_type::GHOST;
            mesh.points.ent.cpy_idx[0] = ghost as i32;
            mesh.points.ent.src_pe[0] = 0;
            mesh.points.ent.src_idx[0] = SHARED_SOURCE_POINT as i32;
            mesh.points.ent.ghost_mask[0] = 1;
            mesh.points.ent.my_srcs = vec![Neighbor { pe: 0, elements: vec![ghost as i32] }];
            ds.access_vec3v("pcoord")[ghost] = Vec3::new(1.0, 1.0, 1.0);
        }
        other => panic!("ghosted_point_mesh is a two-rank fixture, got rank {other}"),
    }
    mesh
}
