//! Mesh points and their field variables.

use super::entity::Entity;
use super::family::{expect_tag, write_tag};
use super::Mesh;
use crate::comm::Op;
use crate::datastore::{Datastore, Entry, Kind, Value};
use crate::io::{read_vec, write_vec};
use crate::ragged::Ragged;
use crate::vec3::Vec3;
use anyhow::Result;
use std::io::{BufRead, Write};
use std::ops::{Deref, DerefMut};

const TAG: &str = "points";

/// SoA representation of mesh points.
#[derive(Debug, Default)]
pub struct Points {
    pub ent: Entity,
}

impl Deref for Points {
    type Target = Entity;
    fn deref(&self) -> &Entity {
        &self.ent
    }
}

impl DerefMut for Points {
    fn deref_mut(&mut self) -> &mut Entity {
        &mut self.ent
    }
}

impl Points {
    pub(crate) fn register(ds: &Datastore) -> Result<()> {
        // Spatial coordinates of each point.
        ds.insert("pcoord", Entry::raw(Kind::Vec3Vec))?;
        ds.insert("point_norm", Entry::computed(Kind::Vec3Vec, init_point_norm))?;
        ds.insert("m:p>zs", Entry::computed(Kind::IntRag, init_point_to_zones))?;
        ds.insert("m:p>rc", Entry::computed(Kind::IntRag, init_point_to_real_corners))?;
        Ok(())
    }

    pub(crate) fn write_bin<W: Write>(&self, ds: &Datastore, w: &mut W) -> Result<()> {
        write_tag(w, TAG)?;
        self.ent.write_bin(w)?;
        write_vec(w, &ds.caccess_vec3v("pcoord"))
    }

    pub(crate) fn read_bin<R: BufRead>(&mut self, ds: &Datastore, r: &mut R) -> Result<()> {
        expect_tag(r, TAG)?;
        self.ent.read_bin(r)?;
        *ds.access_vec3v("pcoord") = read_vec(r)?;
        Ok(())
    }

    pub(crate) fn eq(&self, ds: &Datastore, other: &Points, ods: &Datastore) -> bool {
        self.ent == other.ent && *ds.caccess_vec3v("pcoord") == *ods.caccess_vec3v("pcoord")
    }

    /// Resize the entity record and the coordinate array.
    pub fn resize(&mut self, ds: &Datastore, local: usize, total: usize, ghost: usize) {
        self.ent.resize(local, total, ghost);
        ds.access_vec3v("pcoord").resize(total, Vec3::zero());
    }
}

/// Outward surface normals at boundary points.
///
/// Each boundary side contributes its real partner's flat surface
/// vector to both edge endpoints; the sums are combined across ranks
/// with a parallel SUM (points are shared among adjacent partitions)
/// and then normalized in place for boundary points.
fn init_point_norm(mesh: &Mesh) -> Result<Value> {
    let pll = mesh.points.size();
    let pl = mesh.points.local_size();
    let sl = mesh.sides.local_size();
    let s2s2 = mesh.caccess_intv("m:s>s2");
    let s2p1 = mesh.caccess_intv("m:s>p1");
    let s2p2 = mesh.caccess_intv("m:s>p2");
    let side_surz = mesh.caccess_vec3v("side_surz");
    let smask = &mesh.sides.mask;
    let pmask = &mesh.points.mask;

    let mut point_norm = vec![Vec3::zero(); pll];
    for s in 0..sl {
        if smask[s] == -1 {
            // A boundary side, outside the real mesh; s2 is the
            // corresponding real side.
            let s2 = s2s2[s] as usize;
            let p1 = s2p1[s2] as usize;
            let p2 = s2p2[s2] as usize;
            point_norm[p1] += side_surz[s2];
            point_norm[p2] += side_surz[s2];
        }
    }

    mesh.points.gathscat(mesh.comm(), Op::Sum, &mut point_norm)?;
    for p in 0..pl {
        if pmask[p] < 0 {
            point_norm[p].normalize();
        }
    }
    Ok(Value::Vec3Vec(point_norm))
}

/// Point to zones: for each corner whose point and zone are in range,
/// push the zone onto the point's list; each list is sorted ascending.
fn init_point_to_zones(mesh: &Mesh) -> Result<Value> {
    let pll = mesh.points.size();
    let cll = mesh.corners.size();
    let zll = mesh.zones.size();
    let c2z = mesh.caccess_intv("m:c>z");
    let c2p = mesh.caccess_intv("m:c>p");

    let mut accum: Vec<Vec<i32>> = vec![Vec::new(); pll];
    for c in 0..cll {
        let z = c2z[c];
        let p = c2p[c];
        // Ghost corners may carry out-of-range links.
        if (p as usize) < pll && (z as usize) < zll {
            accum[p as usize].push(z);
        }
    }

    let mut p2zs = Ragged::new(pll);
    for p in 0..pll {
        accum[p].sort_unstable();
        p2zs.assign(p, &accum[p]);
    }
    Ok(Value::IntRag(p2zs))
}

/// Point to real corners: like the zone map, but keeping only corners
/// with an active mask.
fn init_point_to_real_corners(mesh: &Mesh) -> Result<Value> {
    let pll = mesh.points.size();
    let cl = mesh.corners.local_size();
    let c2p = mesh.caccess_intv("m:c>p");
    let cmask = &mesh.corners.mask;

    let mut accum: Vec<Vec<i32>> = vec![Vec::new(); pll];
    for c in 0..cl {
        if cmask[c] < 1 {
            continue; // only non-ghost, non-boundary corners
        }
        accum[c2p[c] as usize].push(c as i32);
    }

    let mut p2rc = Ragged::new(pll);
    for p in 0..pll {
        p2rc.assign(p, &accum[p]);
    }
    Ok(Value::IntRag(p2rc))
}
