//! Mesh iotas: the optional half-side tetrahedral subdivision.
//!
//! An iota stores information on a finer scale than a side: each is one
//! half of a side, a tetrahedron bounded by the point set {z, f, p, e}.
//! The family is data-model only; no derived kernel consumes it.

use super::entity::Entity;
use super::family::{expect_tag, maps_eq, read_maps, resize_maps, write_maps, write_tag};
use crate::datastore::{Datastore, Entry, Kind};
use anyhow::Result;
use std::io::{BufRead, Write};
use std::ops::{Deref, DerefMut};

const TAG: &str = "iotas";
const MAPS: &[&str] = &["m:a>z", "m:a>f", "m:a>p", "m:a>e", "m:a>s"];

/// SoA representation of mesh iotas.
#[derive(Debug, Default)]
pub struct Iotas {
    pub ent: Entity,
}

impl Deref for Iotas {
    type Target = Entity;
    fn deref(&self) -> &Entity {
        &self.ent
    }
}

impl DerefMut for Iotas {
    fn deref_mut(&mut self) -> &mut Entity {
        &mut self.ent
    }
}

impl Iotas {
    pub(crate) fn register(ds: &Datastore) -> Result<()> {
        // Parent zone, containing face, characteristic point/edge, and
        // owning side of each tet.
        for name in MAPS {
            ds.insert(name, Entry::raw(Kind::IntVec))?;
        }
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

    pub(crate) fn eq(&self, ds: &Datastore, other: &Iotas, ods: &Datastore) -> bool {
        self.ent == other.ent && maps_eq(ds, ods, MAPS)
    }

    /// Resize the entity record and its maps.
    pub fn resize(&mut self, ds: &Datastore, local: usize, total: usize, ghost: usize) {
        self.ent.resize(local, total, ghost);
        resize_maps(ds, MAPS, total);
    }
}
