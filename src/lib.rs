//! # Ume
//!
//! An **unstructured 3-D mesh runtime** for finite-volume style physics
//! solvers decomposed across many processing elements (PEs). Each rank
//! loads one partition of the mesh and works through three tightly
//! coupled subsystems:
//!
//! - **Mesh connectivity** — a struct-of-arrays representation of six
//!   entity families (points, edges, faces, sides, corners, zones, plus
//!   an optional tetrahedral subdivision behind the `iotas` feature)
//!   with ghost/copy bookkeeping for distributed operation.
//! - **Parallel communication** — one-directional copy-to-source
//!   neighbor descriptors, aggregated pack/exchange/unpack buffers, and
//!   the gather / scatter / gather-scatter protocols that keep shared
//!   entities consistent across ranks.
//! - **The lazy field datastore** — a keyed container of field
//!   variables whose initialization fires on first access and
//!   recursively resolves dependencies, faulting loudly on cycles.
//!
//! ## Quick start
//!
//! ```
//! use ume::testing::unit_cube_mesh;
//!
//! // A single-zone unit cube on one rank (dummy transport).
//! let mesh = unit_cube_mesh();
//!
//! // First access computes the field and everything it depends on.
//! let zcoord = mesh.caccess_vec3v("zcoord");
//! assert_eq!(zcoord[0], ume::vec3::Vec3::new(0.5, 0.5, 0.5));
//!
//! // Signed side volumes of a unit cube sum to its volume.
//! let vol: f64 = mesh.caccess_dblv("side_vol").iter().sum();
//! assert!((vol - 1.0).abs() < 1e-12);
//! ```
//!
//! ## Core concepts
//!
//! ### `Mesh`
//!
//! A [`Mesh`] is one rank's partition: the entity families, a geometry
//! tag, the rank ids, a root [`Datastore`], and a handle to the
//! communication [`Transport`]. Connectivity maps live in the datastore
//! under canonical names (`m:s>z`, `m:c>p`, `pcoord`, ...), not as
//! fields on the family structs.
//!
//! ### The datastore
//!
//! Field access goes through the typed accessor pairs on `Mesh`
//! (`access_intv`/`caccess_intv`, `access_vec3v`/`caccess_vec3v`, ...).
//! Computed fields carry an init procedure that runs on first access;
//! it may pull on other fields, which initializes them recursively.
//! Re-running a field after upstream data changed is explicit:
//! [`Mesh::release`] resets it so the next access recomputes.
//!
//! ### Parallel reductions
//!
//! Entity families expose three protocols, each a thin composition of
//! buffer packing and a tagged transport exchange:
//!
//! - `gather(op)` — copies travel to their source and reduce under
//!   `op` (SUM, MIN, MAX, OVERWRITE);
//! - `scatter` — sources overwrite every copy, ghosts included;
//! - `gathscat(op)` — both phases; afterwards every rank sharing an
//!   entity holds the identical reduced value.
//!
//! ### Transports
//!
//! [`Transport`] is the seam for the message fabric. The crate ships
//! [`DummyTransport`] (single-rank; every exchange silently succeeds)
//! and, behind the default `local-fabric` feature, [`LocalFabric`]: an
//! in-process channel fabric that runs real multi-rank exchanges on
//! threads, used heavily by the test suite. An MPI binding would
//! implement the same trait out of tree.
//!
//! ### Derived-field kernels
//!
//! Geometry and connectivity derivations (`ecoord`, `fcoord`, `zcoord`,
//! `side_area_norm`, `side_surz`, `side_vol`, `corner_vol`,
//! `corner_csurf`, `point_norm`, and the inverse connectivity maps) are
//! computed datastore entries registered by the entity families.
//! Driver-level kernels live in [`face_area`] and [`gradient`].
//!
//! ## Binary dumps
//!
//! Each rank reads and writes its partition as a pinned little-endian
//! dump (`<basename>.<pe>.ume`); see [`io`]. Round-trips are bitwise
//! (`read(write(m)) == m`) within a single build.
//!
//! ## Concurrency model
//!
//! Each PE runs a single cooperative thread. Nothing in the core is
//! reentrant or shareable across threads; the only blocking points are
//! inside `Transport::exchange_*`. Parallelism between ranks is
//! expressed solely through the explicit exchange protocols.

pub mod comm;
pub mod datastore;
pub mod face_area;
pub mod gradient;
pub mod io;
pub mod mesh;
pub mod ragged;
pub mod testing;
pub mod utils;
pub mod vec3;

pub use comm::{Buffers, DummyTransport, Neighbor, Neighbors, Op, Transport};
#[cfg(feature = "local-fabric")]
pub use comm::{LocalFabric, LocalTransport};
pub use datastore::{Datastore, Entry, InitState, Kind, Value};
pub use face_area::calc_face_area;
pub use gradient::{gradzatp, gradzatz};
pub use mesh::{comm_type, Entity, Geometry, Mesh, MeshStats, Subset};
pub use ragged::Ragged;
pub use vec3::{crossprod, dotprod, normalize, vectormag, Vec3};
