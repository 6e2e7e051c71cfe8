//! Mesh zones: the volumetric cells of the mesh.

use super::entity::Entity;
use super::Mesh;
use crate::datastore::{Datastore, Entry, Kind, Value};
use crate::ragged::Ragged;
use crate::vec3::Vec3;
use anyhow::Result;
use std::collections::BTreeSet;
use std::io::{BufRead, Write};
use std::ops::{Deref, DerefMut};

// Zones historically carry no tag string and no extra maps in the dump
// format: the record is the bare entity.

/// SoA representation of mesh zones.
#[derive(Debug, Default)]
pub struct Zones {
    pub ent: Entity,
}

impl Deref for Zones {
    type Target = Entity;
    fn deref(&self) -> &Entity {
        &self.ent
    }
}

impl DerefMut for Zones {
    fn deref_mut(&mut self) -> &mut Entity {
        &mut self.ent
    }
}

impl Zones {
    pub(crate) fn register(ds: &Datastore) -> Result<()> {
        ds.insert("zcoord", Entry::computed(Kind::Vec3Vec, init_zcoord))?;
        ds.insert("m:z>pz", Entry::computed(Kind::IntRag, init_zone_to_pt_zone))?;
        ds.insert("m:z>p", Entry::computed(Kind::IntRag, init_zone_to_points))?;
        Ok(())
    }

    pub(crate) fn write_bin<W: Write>(&self, _ds: &Datastore, w: &mut W) -> Result<()> {
        self.ent.write_bin(w)
    }

    pub(crate) fn read_bin<R: BufRead>(&mut self, _ds: &Datastore, r: &mut R) -> Result<()> {
        self.ent.read_bin(r)
    }

    pub(crate) fn eq(&self, _ds: &Datastore, other: &Zones, _ods: &Datastore) -> bool {
        self.ent == other.ent
    }

    /// Resize the entity record.
    pub fn resize(&mut self, _ds: &Datastore, local: usize, total: usize, ghost: usize) {
        self.ent.resize(local, total, ghost);
    }
}

/// Zone centers: the arithmetic mean of the points of the zone's active
/// corners, scattered to copies afterwards so every rank sees the source
/// value. A zone that accumulated no points is never divided.
fn init_zcoord(mesh: &Mesh) -> Result<Value> {
    let zl = mesh.zones.local_size();
    let zll = mesh.zones.size();
    let cl = mesh.corners.local_size();
    let c2z = mesh.caccess_intv("m:c>z");
    let c2p = mesh.caccess_intv("m:c>p");
    let pcoord = mesh.caccess_vec3v("pcoord");
    let cmask = &mesh.corners.mask;

    let mut zcoord = vec![Vec3::zero(); zll];
    let mut num_zone_pts = vec![0usize; zl];
    for c in 0..cl {
        if cmask[c] != 0 {
            let z = c2z[c] as usize;
            zcoord[z] += pcoord[c2p[c] as usize];
            num_zone_pts[z] += 1;
        }
    }

    let zmask = &mesh.zones.mask;
    for z in 0..zl {
        if zmask[z] != 0 && num_zone_pts[z] > 0 {
            zcoord[z] /= num_zone_pts[z] as f64;
        }
    }
    mesh.zones.scatter(mesh.comm(), &mut zcoord)?;
    Ok(Value::Vec3Vec(zcoord))
}

/// Zone to point-connected neighbor zones: the union, over the zone's
/// corners, of the zones sharing each corner point, minus the zone
/// itself, stored ascending.
fn init_zone_to_pt_zone(mesh: &Mesh) -> Result<Value> {
    let pll = mesh.points.size();
    let zll = mesh.zones.size();
    let cll = mesh.corners.size();
    let p2zs = mesh.caccess_intrr("m:p>zs");
    let c2p = mesh.caccess_intv("m:c>p");
    let c2z = mesh.caccess_intv("m:c>z");

    let mut accum: Vec<BTreeSet<i32>> = vec![BTreeSet::new(); zll];
    for c in 0..cll {
        let p = c2p[c];
        let z = c2z[c];
        if (p as usize) < pll && (z as usize) < zll {
            accum[z as usize].extend(p2zs[p as usize].iter().copied());
        }
    }

    let mut z2pz = Ragged::new(zll);
    for z in 0..zll {
        accum[z].remove(&(z as i32));
        let row: Vec<i32> = accum[z].iter().copied().collect();
        z2pz.assign(z, &row);
    }
    Ok(Value::IntRag(z2pz))
}

/// Zone to points: the union over the zone's corners of their points,
/// sorted ascending.
fn init_zone_to_points(mesh: &Mesh) -> Result<Value> {
    let pll = mesh.points.size();
    let zll = mesh.zones.size();
    let cll = mesh.corners.size();
    let c2p = mesh.caccess_intv("m:c>p");
    let c2z = mesh.caccess_intv("m:c>z");

    let mut accum: Vec<Vec<i32>> = vec![Vec::new(); zll];
    for c in 0..cll {
        let p = c2p[c];
        let z = c2z[c];
        if (p as usize) < pll && (z as usize) < zll {
            accum[z as usize].push(p);
        }
    }

    let mut z2p = Ragged::new(zll);
    for z in 0..zll {
        accum[z].sort_unstable();
        z2p.assign(z, &accum[z]);
    }
    Ok(Value::IntRag(z2p))
}
