//! Mesh sides: the principal entity for volumetric calculations.
//!
//! A side is a subzonal tetrahedron formed by a zone centroid, the
//! centroid of a face on that zone, and an edge of that face. It
//! carries a lot of connectivity, since most geometric derivations walk
//! side indices.

use super::entity::Entity;
use super::family::{expect_tag, maps_eq, read_maps, resize_maps, write_maps, write_tag};
use super::Mesh;
use crate::datastore::{Datastore, Entry, Kind, Value};
use crate::io::{skip_line, write_terminator};
use crate::vec3::{crossprod, dotprod, Vec3};
use anyhow::Result;
use std::io::{BufRead, Write};
use std::ops::{Deref, DerefMut};

const TAG: &str = "sides";
const MAPS: &[&str] = &[
    "m:s>z", "m:s>p1", "m:s>p2", "m:s>e", "m:s>f", "m:s>c1", "m:s>c2", "m:s>s2", "m:s>s3",
    "m:s>s4", "m:s>s5",
];

/// SoA representation of mesh sides.
#[derive(Debug, Default)]
pub struct Sides {
    pub ent: Entity,
}

impl Deref for Sides {
    type Target = Entity;
    fn deref(&self) -> &Entity {
        &self.ent
    }
}

impl DerefMut for Sides {
    fn deref_mut(&mut self) -> &mut Entity {
        &mut self.ent
    }
}

impl Sides {
    pub(crate) fn register(ds: &Datastore) -> Result<()> {
        // Parent zone index.
        ds.insert("m:s>z", Entry::raw(Kind::IntVec))?;
        // Endpoint indices of the characteristic edge (redundant with
        // the edge maps, but heavily used).
        ds.insert("m:s>p1", Entry::raw(Kind::IntVec))?;
        ds.insert("m:s>p2", Entry::raw(Kind::IntVec))?;
        // Characteristic edge index.
        ds.insert("m:s>e", Entry::raw(Kind::IntVec))?;
        // The face of z containing e.
        ds.insert("m:s>f", Entry::raw(Kind::IntVec))?;
        // The corners of z intersected by this side.
        ds.insert("m:s>c1", Entry::raw(Kind::IntVec))?;
        ds.insert("m:s>c2", Entry::raw(Kind::IntVec))?;
        // Adjacent side indices; s2 belongs to another zone (or is the
        // boundary placeholder across the face).
        ds.insert("m:s>s2", Entry::raw(Kind::IntVec))?;
        ds.insert("m:s>s3", Entry::raw(Kind::IntVec))?;
        ds.insert("m:s>s4", Entry::raw(Kind::IntVec))?;
        ds.insert("m:s>s5", Entry::raw(Kind::IntVec))?;
        ds.insert("side_area_norm", Entry::computed(Kind::Vec3Vec, init_side_area_norm))?;
        ds.insert("side_surz", Entry::computed(Kind::Vec3Vec, init_side_surz))?;
        ds.insert("side_vol", Entry::computed(Kind::DblVec, init_side_vol))?;
        Ok(())
    }

    pub(crate) fn write_bin<W: Write>(&self, ds: &Datastore, w: &mut W) -> Result<()> {
        write_tag(w, TAG)?;
        self.ent.write_bin(w)?;
        write_maps(ds, MAPS, w)?;
        write_terminator(w)
    }

    pub(crate) fn read_bin<R: BufRead>(&mut self, ds: &Datastore, r: &mut R) -> Result<()> {
        expect_tag(r, TAG)?;
        self.ent.read_bin(r)?;
        read_maps(ds, MAPS, r)?;
        skip_line(r)
    }

    pub(crate) fn eq(&self, ds: &Datastore, other: &Sides, ods: &Datastore) -> bool {
        self.ent == other.ent && maps_eq(ds, ods, MAPS)
    }

    /// Resize the entity record and its maps.
    pub fn resize(&mut self, ds: &Datastore, local: usize, total: usize, ghost: usize) {
        self.ent.resize(local, total, ghost);
        resize_maps(ds, MAPS, total);
    }
}

/// Side area normals.
///
/// Interior sides use the half cross product of the edge and face
/// centers about the zone center. Boundary sides use a quarter cross
/// product of the edge endpoints about the face center; the p1/p2 order
/// there is deliberate and fixes the outward orientation.
fn init_side_area_norm(mesh: &Mesh) -> Result<Value> {
    let sl = mesh.sides.local_size();
    let sll = mesh.sides.size();
    let s2p1 = mesh.caccess_intv("m:s>p1");
    let s2p2 = mesh.caccess_intv("m:s>p2");
    let s2e = mesh.caccess_intv("m:s>e");
    let s2f = mesh.caccess_intv("m:s>f");
    let s2z = mesh.caccess_intv("m:s>z");

    let ex = mesh.caccess_vec3v("ecoord");
    let fx = mesh.caccess_vec3v("fcoord");
    let px = mesh.caccess_vec3v("pcoord");
    let zx = mesh.caccess_vec3v("zcoord");
    let smask = &mesh.sides.mask;

    let mut side_area_norm = vec![Vec3::zero(); sll];
    for s in 0..sl {
        if smask[s] > 0 {
            // A (non-ghost) side in the interior of the mesh.
            let zc = zx[s2z[s] as usize];
            let ep = ex[s2e[s] as usize];
            let fp = fx[s2f[s] as usize];
            side_area_norm[s] = crossprod(ep - zc, fp - zc) / 2.0;
        } else if smask[s] < 0 {
            // A side on a mesh boundary face.
            let fc = fx[s2f[s] as usize];
            let p1 = px[s2p1[s] as usize];
            let p2 = px[s2p2[s] as usize];
            side_area_norm[s] = crossprod(p1 - fc, p2 - fc) / 4.0; // Deliberate
        }
    }
    Ok(Value::Vec3Vec(side_area_norm))
}

/// Flat side surface vectors.
///
/// The surface of the side's triangle in the face plane, oriented out of
/// the side's zone. Its magnitude is the side's flat area, and summing
/// it over a hull point's sides yields the outward surface normal.
fn init_side_surz(mesh: &Mesh) -> Result<Value> {
    let sl = mesh.sides.local_size();
    let sll = mesh.sides.size();
    let s2p1 = mesh.caccess_intv("m:s>p1");
    let s2p2 = mesh.caccess_intv("m:s>p2");
    let s2f = mesh.caccess_intv("m:s>f");
    let fx = mesh.caccess_vec3v("fcoord");
    let px = mesh.caccess_vec3v("pcoord");
    let smask = &mesh.sides.mask;

    let mut side_surz = vec![Vec3::zero(); sll];
    for s in 0..sl {
        if smask[s] > 0 {
            let fc = fx[s2f[s] as usize];
            let p1 = px[s2p1[s] as usize];
            let p2 = px[s2p2[s] as usize];
            side_surz[s] = crossprod(p2 - fc, p1 - fc) / 2.0;
        }
    }
    Ok(Value::Vec3Vec(side_surz))
}

/// Signed side volumes.
///
/// The volume of the tetrahedron formed by the zone center, face
/// center, and edge endpoints. The p2/p1 operand order fixes the sign
/// convention: sides wound consistently with their zone come out
/// positive.
fn init_side_vol(mesh: &Mesh) -> Result<Value> {
    let sl = mesh.sides.local_size();
    let sll = mesh.sides.size();
    let s2z = mesh.caccess_intv("m:s>z");
    let s2p1 = mesh.caccess_intv("m:s>p1");
    let s2p2 = mesh.caccess_intv("m:s>p2");
    let s2f = mesh.caccess_intv("m:s>f");
    let px = mesh.caccess_vec3v("pcoord");
    let zx = mesh.caccess_vec3v("zcoord");
    let fx = mesh.caccess_vec3v("fcoord");
    let smask = &mesh.sides.mask;

    let mut side_vol = vec![0.0; sll];
    for s in 0..sl {
        if smask[s] > 0 {
            let zc = zx[s2z[s] as usize];
            let fc = fx[s2f[s] as usize];
            let a = px[s2p2[s] as usize];
            let b = px[s2p1[s] as usize];
            side_vol[s] = dotprod(fc - zc, crossprod(a - zc, b - zc)) / 6.0;
        }
    }
    Ok(Value::DblVec(side_vol))
}
