//! Mesh faces: the entity separating two zones.

use super::entity::Entity;
use super::family::{expect_tag, maps_eq, read_maps, resize_maps, write_maps, write_tag};
use super::Mesh;
use crate::datastore::{Datastore, Entry, Kind, Value};
use crate::vec3::Vec3;
use anyhow::Result;
use std::io::{BufRead, Write};
use std::ops::{Deref, DerefMut};

const TAG: &str = "faces";
const MAPS: &[&str] = &["m:f>z1", "m:f>z2"];

/// SoA representation of mesh faces.
#[derive(Debug, Default)]
pub struct Faces {
    pub ent: Entity,
}

impl Deref for Faces {
    type Target = Entity;
    fn deref(&self) -> &Entity {
        &self.ent
    }
}

impl DerefMut for Faces {
    fn deref_mut(&mut self) -> &mut Entity {
        &mut self.ent
    }
}

impl Faces {
    pub(crate) fn register(ds: &Datastore) -> Result<()> {
        // Adjacent zone indices of each face.
        ds.insert("m:f>z1", Entry::raw(Kind::IntVec))?;
        ds.insert("m:f>z2", Entry::raw(Kind::IntVec))?;
        ds.insert("fcoord", Entry::computed(Kind::Vec3Vec, init_fcoord))?;
        Ok(())
    }

    pub(crate) fn write_bin<W: Write>(&self, ds: &Datastore, w: &mut W) -> Result<()> {
        write_tag(w, TAG)?;
        self.ent.write_bin(w)?;
        write_maps(ds, MAPS, w)
    }

    pub(crate) fn read_bin<R: BufRead>(&mut self, ds: &Datastore, r: &mut R) -> Result<()> {
        expect_tag(r, TAG)?;
        self.ent.read_bin(r)?;
        read_maps(ds, MAPS, r)
    }

    pub(crate) fn eq(&self, ds: &Datastore, other: &Faces, ods: &Datastore) -> bool {
        self.ent == other.ent && maps_eq(ds, ods, MAPS)
    }

    /// Resize the entity record and its maps.
    pub fn resize(&mut self, ds: &Datastore, local: usize, total: usize, ghost: usize) {
        self.ent.resize(local, total, ghost);
        resize_maps(ds, MAPS, total);
    }
}

/// Face centers: the arithmetic mean of the first endpoint of each side
/// incident on the face. Inactive faces get zero, and a face that
/// accumulated no points is never divided.
fn init_fcoord(mesh: &Mesh) -> Result<Value> {
    let fl = mesh.faces.local_size();
    let fll = mesh.faces.size();
    let sl = mesh.sides.local_size();
    let s2f = mesh.caccess_intv("m:s>f");
    let s2p1 = mesh.caccess_intv("m:s>p1");
    let pcoord = mesh.caccess_vec3v("pcoord");
    let smask = &mesh.sides.mask;

    let mut fcoord = vec![Vec3::zero(); fll];
    let mut num_face_pts = vec![0usize; fl];
    for s in 0..sl {
        if smask[s] != 0 {
            let f = s2f[s] as usize;
            fcoord[f] += pcoord[s2p1[s] as usize];
            num_face_pts[f] += 1;
        }
    }

    let fmask = &mesh.faces.mask;
    for f in 0..fl {
        if fmask[f] != 0 && num_face_pts[f] > 0 {
            fcoord[f] /= num_face_pts[f] as f64;
        }
    }
    Ok(Value::Vec3Vec(fcoord))
}
