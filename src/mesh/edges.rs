//! Mesh edges: the entity connecting two points.

use super::entity::Entity;
use super::family::{expect_tag, maps_eq, read_maps, resize_maps, write_maps, write_tag};
use super::Mesh;
use crate::datastore::{Datastore, Entry, Kind, Value};
use crate::vec3::Vec3;
use anyhow::Result;
use std::io::{BufRead, Write};
use std::ops::{Deref, DerefMut};

const TAG: &str = "edges";
const MAPS: &[&str] = &["m:e>p1", "m:e>p2"];

/// SoA representation of mesh edges.
#[derive(Debug, Default)]
pub struct Edges {
    pub ent: Entity,
}

impl Deref for Edges {
    type Target = Entity;
    fn deref(&self) -> &Entity {
        &self.ent
    }
}

impl DerefMut for Edges {
    fn deref_mut(&mut self) -> &mut Entity {
        &mut self.ent
    }
}

impl Edges {
    pub(crate) fn register(ds: &Datastore) -> Result<()> {
        // Endpoint indices of each edge.
        ds.insert("m:e>p1", Entry::raw(Kind::IntVec))?;
        ds.insert("m:e>p2", Entry::raw(Kind::IntVec))?;
        ds.insert("ecoord", Entry::computed(Kind::Vec3Vec, init_ecoord))?;
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

    pub(crate) fn eq(&self, ds: &Datastore, other: &Edges, ods: &Datastore) -> bool {
        self.ent == other.ent && maps_eq(ds, ods, MAPS)
    }

    /// Resize the entity record and its maps.
    pub fn resize(&mut self, ds: &Datastore, local: usize, total: usize, ghost: usize) {
        self.ent.resize(local, total, ghost);
        resize_maps(ds, MAPS, total);
    }
}

/// Edge centers: the midpoint of the two endpoints. Inactive edges get
/// zero.
fn init_ecoord(mesh: &Mesh) -> Result<Value> {
    let el = mesh.edges.local_size();
    let ell = mesh.edges.size();
    let e2p1 = mesh.caccess_intv("m:e>p1");
    let e2p2 = mesh.caccess_intv("m:e>p2");
    let pcoord = mesh.caccess_vec3v("pcoord");
    let emask = &mesh.edges.mask;

    let mut ecoord = vec![Vec3::zero(); ell];
    for e in 0..el {
        if emask[e] != 0 {
            ecoord[e] = (pcoord[e2p1[e] as usize] + pcoord[e2p2[e] as usize]) * 0.5;
        }
    }
    Ok(Value::Vec3Vec(ecoord))
}
