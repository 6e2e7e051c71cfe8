//! The struct-of-arrays mesh aggregate and its entity families.
//!
//! A [`Mesh`] is one rank's partition of the decomposed problem: one
//! instance of each entity family, a geometry tag, the rank ids, a root
//! [`Datastore`] holding every connectivity map and field variable, and
//! a handle to the communication transport. Entity families do not point
//! back at the mesh; anything that needs both (kernels, lazy field
//! initialization) takes `&Mesh`.
//!
//! Field access goes through the typed accessor pairs
//! (`access_*`/`caccess_*`): the first access of a computed field runs
//! its init procedure, which may recursively pull on other fields and
//! invoke parallel reductions; the result is cached in the datastore for
//! the life of the mesh.

pub mod entity;
mod family;

pub mod corners;
pub mod edges;
pub mod faces;
#[cfg(feature = "iotas")]
pub mod iotas;
pub mod points;
pub mod sides;
pub mod zones;

pub use corners::Corners;
pub use edges::Edges;
pub use entity::{comm_type, Entity, Subset};
pub use faces::Faces;
#[cfg(feature = "iotas")]
pub use iotas::Iotas;
pub use points::Points;
pub use sides::Sides;
pub use zones::Zones;

use crate::comm::Transport;
use crate::datastore::{Datastore, FieldMut, FieldRef};
use crate::io::{read_scalar, write_scalar};
use crate::ragged::Ragged;
use crate::vec3::Vec3;
use anyhow::{bail, Result};
use serde::Serialize;
use std::fmt;
use std::io::{BufRead, Write};
use std::rc::Rc;

/// Coordinate system of the mesh.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum Geometry {
    Cartesian,
    Cylindrical,
    Spherical,
}

impl Geometry {
    fn to_wire(self) -> i32 {
        match self {
            Geometry::Cartesian => 0,
            Geometry::Cylindrical => 1,
            Geometry::Spherical => 2,
        }
    }

    fn from_wire(v: i32) -> Result<Self> {
        Ok(match v {
            0 => Geometry::Cartesian,
            1 => Geometry::Cylindrical,
            2 => Geometry::Spherical,
            _ => bail!("unknown geometry tag {v}"),
        })
    }
}

impl fmt::Display for Geometry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Geometry::Cartesian => "Cartesian",
            Geometry::Cylindrical => "Cylindrical",
            Geometry::Spherical => "Spherical",
        })
    }
}

/// One rank's partition of a decomposed unstructured mesh.
pub struct Mesh {
    /// This rank's PE id.
    pub mype: i32,
    /// Total number of PEs in the decomposition.
    pub numpe: i32,
    /// Coordinate system tag.
    pub geo: Geometry,
    pub points: Points,
    pub edges: Edges,
    pub faces: Faces,
    pub sides: Sides,
    pub corners: Corners,
    pub zones: Zones,
    #[cfg(feature = "iotas")]
    pub iotas: Iotas,
    ds: Rc<Datastore>,
    comm: Rc<dyn Transport>,
}

impl fmt::Debug for Mesh {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("Mesh");
        s.field("mype", &self.mype)
            .field("numpe", &self.numpe)
            .field("geo", &self.geo)
            .field("points", &self.points)
            .field("edges", &self.edges)
            .field("faces", &self.faces)
            .field("sides", &self.sides)
            .field("corners", &self.corners)
            .field("zones", &self.zones);
        #[cfg(feature = "iotas")]
        s.field("iotas", &self.iotas);
        s.finish_non_exhaustive()
    }
}

impl Mesh {
    /// Build an empty mesh with every family registered in a fresh root
    /// datastore.
    pub fn new(mype: i32, numpe: i32, geo: Geometry, comm: Rc<dyn Transport>) -> Mesh {
        let ds = Datastore::create_root();
        Self::register_families(&ds).expect("field registration in a fresh datastore");
        Mesh {
            mype,
            numpe,
            geo,
            points: Points::default(),
            edges: Edges::default(),
            faces: Faces::default(),
            sides: Sides::default(),
            corners: Corners::default(),
            zones: Zones::default(),
            #[cfg(feature = "iotas")]
            iotas: Iotas::default(),
            ds,
            comm,
        }
    }

    fn register_families(ds: &Rc<Datastore>) -> Result<()> {
        Points::register(ds)?;
        Edges::register(ds)?;
        Faces::register(ds)?;
        Sides::register(ds)?;
        Corners::register(ds)?;
        Zones::register(ds)?;
        #[cfg(feature = "iotas")]
        Iotas::register(ds)?;
        Ok(())
    }

    /// Handle to the root datastore.
    pub fn ds(&self) -> Rc<Datastore> {
        Rc::clone(&self.ds)
    }

    /// The communication transport.
    pub fn comm(&self) -> &dyn Transport {
        self.comm.as_ref()
    }

    /// Shared handle to the transport.
    pub fn transport(&self) -> Rc<dyn Transport> {
        Rc::clone(&self.comm)
    }

    /// Spatial dimensionality; the runtime is 3-D throughout.
    pub const fn ndims(&self) -> usize {
        3
    }

    /// Drop a computed field so its next access re-runs initialization.
    pub fn release(&self, name: &str) {
        self.ds.release(name);
    }

    /// Binary write of this rank's partition.
    pub fn write_bin<W: Write>(&self, w: &mut W) -> Result<()> {
        write_scalar(w, self.mype)?;
        write_scalar(w, self.numpe)?;
        write_scalar(w, self.geo.to_wire())?;
        self.points.write_bin(&self.ds, w)?;
        self.edges.write_bin(&self.ds, w)?;
        self.faces.write_bin(&self.ds, w)?;
        self.sides.write_bin(&self.ds, w)?;
        self.corners.write_bin(&self.ds, w)?;
        self.zones.write_bin(&self.ds, w)?;
        #[cfg(feature = "iotas")]
        self.iotas.write_bin(&self.ds, w)?;
        Ok(())
    }

    /// Binary read of one rank's partition, attached to `comm`.
    pub fn read_bin<R: BufRead>(r: &mut R, comm: Rc<dyn Transport>) -> Result<Mesh> {
        let mut mesh = Mesh::new(0, 0, Geometry::Cartesian, comm);
        let ds = mesh.ds();
        mesh.mype = read_scalar::<i32, R>(r)?;
        mesh.numpe = read_scalar::<i32, R>(r)?;
        mesh.geo = Geometry::from_wire(read_scalar::<i32, R>(r)?)?;
        mesh.points.read_bin(&ds, r)?;
        mesh.edges.read_bin(&ds, r)?;
        mesh.faces.read_bin(&ds, r)?;
        mesh.sides.read_bin(&ds, r)?;
        mesh.corners.read_bin(&ds, r)?;
        mesh.zones.read_bin(&ds, r)?;
        #[cfg(feature = "iotas")]
        mesh.iotas.read_bin(&ds, r)?;
        Ok(mesh)
    }

    /// Per-family size summary for diagnostics.
    pub fn stats(&self) -> MeshStats {
        MeshStats {
            mype: self.mype,
            numpe: self.numpe,
            geometry: self.geo,
            points: FamilySizes::of(&self.points.ent),
            edges: FamilySizes::of(&self.edges.ent),
            faces: FamilySizes::of(&self.faces.ent),
            sides: FamilySizes::of(&self.sides.ent),
            corners: FamilySizes::of(&self.corners.ent),
            zones: FamilySizes::of(&self.zones.ent),
        }
    }
}

impl PartialEq for Mesh {
    fn eq(&self, rhs: &Mesh) -> bool {
        self.mype == rhs.mype
            && self.numpe == rhs.numpe
            && self.geo == rhs.geo
            && self.points.eq(&self.ds, &rhs.points, &rhs.ds)
            && self.edges.eq(&self.ds, &rhs.edges, &rhs.ds)
            && self.faces.eq(&self.ds, &rhs.faces, &rhs.ds)
            && self.sides.eq(&self.ds, &rhs.sides, &rhs.ds)
            && self.corners.eq(&self.ds, &rhs.corners, &rhs.ds)
            && self.zones.eq(&self.ds, &rhs.zones, &rhs.ds)
            && self.iotas_eq(rhs)
    }
}

impl Mesh {
    #[cfg(feature = "iotas")]
    fn iotas_eq(&self, rhs: &Mesh) -> bool {
        self.iotas.eq(&self.ds, &rhs.iotas, &rhs.ds)
    }

    #[cfg(not(feature = "iotas"))]
    fn iotas_eq(&self, _rhs: &Mesh) -> bool {
        true
    }
}

macro_rules! mesh_access {
    ($( $suffix:ident : $ty:ty ),* $(,)?) => {
        impl Mesh {
            paste::paste! {$(
                /// Shared typed view of a field, initializing it first if
                /// it is a computed field that has not run yet.
                pub fn [<caccess_ $suffix>](&self, name: &str) -> FieldRef<$ty> {
                    self.ds.init_entry(self, name);
                    self.ds.[<caccess_ $suffix>](name)
                }

                /// Mutable typed view of a field, initializing it first if
                /// it is a computed field that has not run yet.
                pub fn [<access_ $suffix>](&self, name: &str) -> FieldMut<$ty> {
                    self.ds.init_entry(self, name);
                    self.ds.[<access_ $suffix>](name)
                }
            )*}
        }
    };
}

mesh_access! {
    int: i32,
    intv: Vec<i32>,
    intrr: Ragged<i32>,
    dbl: f64,
    dblv: Vec<f64>,
    dblrr: Ragged<f64>,
    vec3: Vec3,
    vec3v: Vec<Vec3>,
    vec3rr: Ragged<Vec3>,
}

/// Local/total index counts of one entity family.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct FamilySizes {
    pub local: usize,
    pub total: usize,
}

impl FamilySizes {
    fn of(ent: &Entity) -> Self {
        FamilySizes { local: ent.local_size(), total: ent.size() }
    }
}

/// Diagnostic summary of a mesh partition, printable and
/// JSON-serializable for driver programs.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct MeshStats {
    pub mype: i32,
    pub numpe: i32,
    pub geometry: Geometry,
    pub points: FamilySizes,
    pub edges: FamilySizes,
    pub faces: FamilySizes,
    pub sides: FamilySizes,
    pub corners: FamilySizes,
    pub zones: FamilySizes,
}

impl fmt::Display for MeshStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "\tDecomposed rank {} ({}/{})",
            self.mype,
            self.mype + 1,
            self.numpe
        )?;
        writeln!(f, "\tCoordinate system: {}", self.geometry)?;
        writeln!(f, "\tPoints: {} {}", self.points.local, self.points.total)?;
        writeln!(f, "\tZones: {} {}", self.zones.local, self.zones.total)?;
        writeln!(f, "\tSides: {} {}", self.sides.local, self.sides.total)?;
        writeln!(f, "\tEdges: {} {}", self.edges.local, self.edges.total)?;
        writeln!(f, "\tFaces: {} {}", self.faces.local, self.faces.total)?;
        write!(f, "\tCorners: {} {}", self.corners.local, self.corners.total)
    }
}
