//! Mesh corners: the subzonal volume at a point of a zone.
//!
//! A corner is bounded by a zone centroid, one of the zone's points, and
//! the midpoints of the zone faces and edges adjacent to that point.

use super::entity::Entity;
use super::family::{maps_eq, read_maps, resize_maps, write_maps};
use super::Mesh;
use crate::datastore::{Datastore, Entry, Kind, Value};
use crate::io::{skip_line, write_terminator};
use crate::vec3::Vec3;
use anyhow::Result;
use std::io::{BufRead, Write};
use std::ops::{Deref, DerefMut};

// Corners historically carry no tag string in the dump format.
const MAPS: &[&str] = &["m:c>p", "m:c>z"];

/// SoA representation of mesh corners.
#[derive(Debug, Default)]
pub struct Corners {
    pub ent: Entity,
}

impl Deref for Corners {
    type Target = Entity;
    fn deref(&self) -> &Entity {
        &self.ent
    }
}

impl DerefMut for Corners {
    fn deref_mut(&mut self) -> &mut Entity {
        &mut self.ent
    }
}

impl Corners {
    pub(crate) fn register(ds: &Datastore) -> Result<()> {
        // Index of the characteristic point and parent zone.
        ds.insert("m:c>p", Entry::raw(Kind::IntVec))?;
        ds.insert("m:c>z", Entry::raw(Kind::IntVec))?;
        ds.insert("corner_vol", Entry::computed(Kind::DblVec, init_corner_vol))?;
        ds.insert("corner_csurf", Entry::computed(Kind::Vec3Vec, init_corner_csurf))?;
        Ok(())
    }

    pub(crate) fn write_bin<W: Write>(&self, ds: &Datastore, w: &mut W) -> Result<()> {
        self.ent.write_bin(w)?;
        write_maps(ds, MAPS, w)?;
        write_terminator(w)
    }

    pub(crate) fn read_bin<R: BufRead>(&mut self, ds: &Datastore, r: &mut R) -> Result<()> {
        self.ent.read_bin(r)?;
        read_maps(ds, MAPS, r)?;
        skip_line(r)
    }

    pub(crate) fn eq(&self, ds: &Datastore, other: &Corners, ods: &Datastore) -> bool {
        self.ent == other.ent && maps_eq(ds, ods, MAPS)
    }

    /// Resize the entity record and its maps.
    pub fn resize(&mut self, ds: &Datastore, local: usize, total: usize, ghost: usize) {
        self.ent.resize(local, total, ghost);
        resize_maps(ds, MAPS, total);
    }
}

/// Corner control volumes: each interior side credits half of its
/// signed volume to both of the corners it intersects.
fn init_corner_vol(mesh: &Mesh) -> Result<Value> {
    let cll = mesh.corners.size();
    let sl = mesh.sides.local_size();
    let s2c1 = mesh.caccess_intv("m:s>c1");
    let s2c2 = mesh.caccess_intv("m:s>c2");
    let side_vol = mesh.caccess_dblv("side_vol");
    let smask = &mesh.sides.mask;

    let mut corner_vol = vec![0.0; cll];
    for s in 0..sl {
        if smask[s] > 0 {
            let hsv = 0.5 * side_vol[s];
            corner_vol[s2c1[s] as usize] += hsv;
            corner_vol[s2c2[s] as usize] += hsv;
        }
    }
    Ok(Value::DblVec(corner_vol))
}

/// Corner surface vectors: the sum of the area-weighted side normals
/// over each corner's interior sides, accumulated into both corners of
/// the side.
fn init_corner_csurf(mesh: &Mesh) -> Result<Value> {
    let cll = mesh.corners.size();
    let sl = mesh.sides.local_size();
    let s2c1 = mesh.caccess_intv("m:s>c1");
    let s2c2 = mesh.caccess_intv("m:s>c2");
    let side_area_norm = mesh.caccess_vec3v("side_area_norm");
    let smask = &mesh.sides.mask;

    let mut csurf = vec![Vec3::zero(); cll];
    for s in 0..sl {
        if smask[s] > 0 {
            let san = side_area_norm[s];
            csurf[s2c1[s] as usize] += san;
            csurf[s2c2[s] as usize] += san;
        }
    }
    Ok(Value::Vec3Vec(csurf))
}
