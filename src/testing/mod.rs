//! Testing utilities: mesh fixtures, multi-rank harnesses, and the
//! sharing validator.
//!
//! This module is part of the public API so downstream solvers can test
//! against real meshes without shipping dump files:
//!
//! - [`unit_cube_mesh`] / [`two_zone_mesh`] / [`brick_mesh`] build
//!   structured bricks with full unstructured connectivity on a single
//!   rank;
//! - [`run_ranks`] plus [`shared_point_mesh`] / [`ghosted_point_mesh`]
//!   simulate multi-rank runs over the in-process fabric (requires the
//!   `local-fabric` feature);
//! - [`validate_entity_sharing`] checks the ghost/source addressing
//!   round-trip across a whole set of ranks;
//! - the assertion helpers compare floating-point fields with
//!   tolerances.

pub mod assertions;
pub mod brick;

#[cfg(feature = "local-fabric")]
pub mod multirank;

pub use assertions::*;
pub use brick::{brick_mesh, two_zone_mesh, unit_cube_mesh};

#[cfg(feature = "local-fabric")]
pub use multirank::{
    ghosted_point_mesh, run_ranks, shared_point_mesh, SHARED_COPY_POINT, SHARED_SOURCE_POINT,
};

use crate::mesh::Entity;
use anyhow::{bail, Result};

/// Validate the ghost/source addressing invariant across ranks.
///
/// `ents` holds the same entity family from every rank, indexed by PE.
/// For every ghost `g` on PE `p`, `(src_pe[g-lsize], src_idx[g-lsize])`
/// must name a real entity on a valid remote PE; that PE's `my_cpys`
/// must reach back to `p` at the matching wire position; and `p`'s
/// `my_srcs` must list the ghost under the source PE. Wire order is
/// compared positionally, since element order defines the exchange
/// layout.
pub fn validate_entity_sharing(ents: &[&Entity]) -> Result<()> {
    let numpe = ents.len();

    for (pe, ent) in ents.iter().enumerate() {
        let nghost = ent.size() - ent.local_size();
        if ent.cpy_idx.len() != nghost
            || ent.src_pe.len() != nghost
            || ent.src_idx.len() != nghost
            || ent.ghost_mask.len() != nghost
        {
            bail!(
                "pe {pe}: ghost arrays are {}/{}/{}/{} rows, expected {nghost}",
                ent.cpy_idx.len(),
                ent.src_pe.len(),
                ent.src_idx.len(),
                ent.ghost_mask.len()
            );
        }

        for g in 0..nghost {
            let local = ent.cpy_idx[g] as usize;
            if local < ent.local_size() || local >= ent.size() {
                bail!("pe {pe}: ghost row {g} names local index {local} outside the ghost range");
            }
            let sp = ent.src_pe[g];
            if sp < 0 || sp as usize >= numpe || sp as usize == pe {
                bail!("pe {pe}: ghost row {g} names invalid source pe {sp}");
            }
            let si = ent.src_idx[g] as usize;
            if si >= ents[sp as usize].local_size() {
                bail!(
                    "pe {pe}: ghost row {g} names index {si} beyond pe {sp}'s {} reals",
                    ents[sp as usize].local_size()
                );
            }
        }
    }

    // Pairwise wire-order comparison: p's receive list from q must be
    // the mirror of q's send list to p.
    for (pe, ent) in ents.iter().enumerate() {
        for srcs in &ent.my_srcs {
            let q = srcs.pe as usize;
            if q >= numpe {
                bail!("pe {pe}: my_srcs names unknown pe {q}");
            }
            let Some(cpys) = ents[q].my_cpys.iter().find(|n| n.pe as usize == pe) else {
                bail!("pe {q}: my_cpys has no entry reaching back to pe {pe}");
            };
            if cpys.elements.len() != srcs.elements.len() {
                bail!(
                    "pe {pe}<->{q}: wire lengths disagree ({} vs {})",
                    srcs.elements.len(),
                    cpys.elements.len()
                );
            }
            for (k, &local) in srcs.elements.iter().enumerate() {
                let local = local as usize;
                if local >= ent.size() {
                    bail!("pe {pe}: my_srcs[{q}] element {k} out of range");
                }
                if local >= ent.local_size() {
                    // A ghost: its address triple must agree with the
                    // paired source element.
                    let Some(g) = ent.cpy_idx.iter().position(|&c| c as usize == local) else {
                        bail!("pe {pe}: ghost {local} has no address row");
                    };
                    if ent.src_pe[g] as usize != q {
                        bail!(
                            "pe {pe}: ghost {local} is sourced from pe {} but exchanged with {q}",
                            ent.src_pe[g]
                        );
                    }
                    if ent.src_idx[g] != cpys.elements[k] {
                        bail!(
                            "pe {pe}: ghost {local} addresses remote index {} but pe {q} sends \
                             index {} at that wire position",
                            ent.src_idx[g],
                            cpys.elements[k]
                        );
                    }
                }
            }
        }
        // The reverse direction: every my_cpys entry must have a
        // matching my_srcs on the peer.
        for cpys in &ent.my_cpys {
            let q = cpys.pe as usize;
            if q >= numpe {
                bail!("pe {pe}: my_cpys names unknown pe {q}");
            }
            if !ents[q].my_srcs.iter().any(|n| n.pe as usize == pe) {
                bail!("pe {q}: my_srcs has no entry reaching back to pe {pe}");
            }
        }
    }
    Ok(())
}
