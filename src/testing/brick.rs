//! Structured brick fixtures with full unstructured connectivity.
//!
//! The generator lays out an `nx x ny x nz` grid of unit hexahedral
//! zones and derives every family the runtime expects: canonical edges
//! and faces, one corner per (zone, point), 24 volumetric sides per
//! zone, and one boundary placeholder side (mask −1) per volumetric
//! side on a hull face, with the `s2` partner wiring the kernels rely
//! on. Face loops are wound so that signed side volumes come out
//! positive and flat side surface vectors point out of their zone.

use crate::comm::Transport;
use crate::mesh::{comm_type, Geometry, Mesh};
use crate::vec3::Vec3;
use std::collections::HashMap;
use std::rc::Rc;

/// Local vertex offsets of a hex cell, in (di, dj, dk).
const VERTS: [(usize, usize, usize); 8] = [
    (0, 0, 0),
    (1, 0, 0),
    (1, 1, 0),
    (0, 1, 0),
    (0, 0, 1),
    (1, 0, 1),
    (1, 1, 1),
    (0, 1, 1),
];

/// The six face loops of a hex cell, as local vertex ids.
///
/// Each loop is wound so its normal points *into* the cell, which makes
/// the tetrahedral side volumes positive and the flat surface vectors
/// outward under the runtime's sign conventions.
const FACE_LOOPS: [[usize; 4]; 6] = [
    [0, 1, 2, 3], // k = 0
    [4, 7, 6, 5], // k = 1
    [0, 4, 5, 1], // j = 0
    [3, 2, 6, 7], // j = 1
    [0, 3, 7, 4], // i = 0
    [1, 5, 6, 2], // i = 1
];

#[derive(Clone, Copy)]
struct SideRec {
    z: i32,
    p1: i32,
    p2: i32,
    e: i32,
    f: i32,
    c1: i32,
    c2: i32,
    s2: i32,
    s3: i32,
    s4: i32,
    s5: i32,
    mask: i16,
}

struct BrickBuilder {
    nx: usize,
    ny: usize,
    nz: usize,
    pijk: Vec<(usize, usize, usize)>,
    edge_ids: HashMap<(usize, usize), usize>,
    e2p: Vec<(usize, usize)>,
    face_ids: HashMap<[usize; 4], usize>,
    f2z: Vec<(i32, i32)>,
    sides: Vec<SideRec>,
    face_edge_side: HashMap<(usize, usize), usize>,
    zone_edge_side: HashMap<(usize, usize), usize>,
}

impl BrickBuilder {
    fn new(nx: usize, ny: usize, nz: usize) -> Self {
        let npts = (nx + 1) * (ny + 1) * (nz + 1);
        let mut pijk = Vec::with_capacity(npts);
        for k in 0..=nz {
            for j in 0..=ny {
                for i in 0..=nx {
                    pijk.push((i, j, k));
                }
            }
        }
        BrickBuilder {
            nx,
            ny,
            nz,
            pijk,
            edge_ids: HashMap::new(),
            e2p: Vec::new(),
            face_ids: HashMap::new(),
            f2z: Vec::new(),
            sides: Vec::new(),
            face_edge_side: HashMap::new(),
            zone_edge_side: HashMap::new(),
        }
    }

    fn pid(&self, i: usize, j: usize, k: usize) -> usize {
        i + (self.nx + 1) * (j + (self.ny + 1) * k)
    }

    fn intern_edge(&mut self, a: usize, b: usize) -> usize {
        let key = (a.min(b), a.max(b));
        if let Some(&e) = self.edge_ids.get(&key) {
            return e;
        }
        let e = self.e2p.len();
        self.edge_ids.insert(key, e);
        self.e2p.push(key);
        e
    }

    fn intern_face(&mut self, pts: [usize; 4], zone: usize) -> usize {
        let mut key = pts;
        key.sort_unstable();
        if let Some(&f) = self.face_ids.get(&key) {
            self.f2z[f].1 = zone as i32;
            return f;
        }
        let f = self.f2z.len();
        self.face_ids.insert(key, f);
        self.f2z.push((zone as i32, -1));
        f
    }

    fn add_zone(&mut self, zi: usize, zj: usize, zk: usize) {
        let z = zi + self.nx * (zj + self.ny * zk);
        let vert_pids: Vec<usize> = VERTS
            .iter()
            .map(|&(di, dj, dk)| self.pid(zi + di, zj + dj, zk + dk))
            .collect();

        for loop_verts in FACE_LOOPS {
            let gpts = [
                vert_pids[loop_verts[0]],
                vert_pids[loop_verts[1]],
                vert_pids[loop_verts[2]],
                vert_pids[loop_verts[3]],
            ];
            let f = self.intern_face(gpts, z);

            let mut loop_sides = [0usize; 4];
            for m in 0..4 {
                let a = gpts[m];
                let b = gpts[(m + 1) % 4];
                let e = self.intern_edge(a, b);
                let s = self.sides.len();
                self.sides.push(SideRec {
                    z: z as i32,
                    p1: a as i32,
                    p2: b as i32,
                    e: e as i32,
                    f: f as i32,
                    c1: (z * 8 + loop_verts[m]) as i32,
                    c2: (z * 8 + loop_verts[(m + 1) % 4]) as i32,
                    s2: -1,
                    s3: -1,
                    s4: -1,
                    s5: -1,
                    mask: 1,
                });
                loop_sides[m] = s;

                // Pair across the face with the adjacent zone's side.
                if let Some(&other) = self.face_edge_side.get(&(f, e)) {
                    self.sides[other].s2 = s as i32;
                    self.sides[s].s2 = other as i32;
                } else {
                    self.face_edge_side.insert((f, e), s);
                }

                // Pair within the zone across the edge (the same edge
                // appears on exactly two faces of the cell).
                if let Some(&other) = self.zone_edge_side.get(&(z, e)) {
                    self.sides[other].s3 = s as i32;
                    self.sides[s].s3 = other as i32;
                } else {
                    self.zone_edge_side.insert((z, e), s);
                }
            }

            // Loop neighbors within the face.
            for m in 0..4 {
                self.sides[loop_sides[m]].s4 = loop_sides[(m + 1) % 4] as i32;
                self.sides[loop_sides[m]].s5 = loop_sides[(m + 3) % 4] as i32;
            }
        }
    }

    /// Append one boundary placeholder (mask −1) for each volumetric
    /// side still unpaired after all zones were added.
    fn add_boundary_sides(&mut self) {
        let nreal = self.sides.len();
        for s in 0..nreal {
            if self.sides[s].s2 >= 0 {
                continue;
            }
            let real = self.sides[s];
            let b = self.sides.len();
            self.sides.push(SideRec {
                z: real.z,
                p1: real.p2, // reversed: wound as seen from outside
                p2: real.p1,
                e: real.e,
                f: real.f,
                c1: real.c2,
                c2: real.c1,
                s2: s as i32,
                s3: -1,
                s4: -1,
                s5: -1,
                mask: -1,
            });
            self.sides[s].s2 = b as i32;
        }
    }

    fn on_hull(&self, p: usize) -> bool {
        let (i, j, k) = self.pijk[p];
        i == 0 || i == self.nx || j == 0 || j == self.ny || k == 0 || k == self.nz
    }

    fn edge_on_hull(&self, a: usize, b: usize) -> bool {
        let (ai, aj, ak) = self.pijk[a];
        let (bi, bj, bk) = self.pijk[b];
        (ai == 0 && bi == 0)
            || (ai == self.nx && bi == self.nx)
            || (aj == 0 && bj == 0)
            || (aj == self.ny && bj == self.ny)
            || (ak == 0 && bk == 0)
            || (ak == self.nz && bk == self.nz)
    }

    fn build(mut self, comm: Rc<dyn Transport>) -> Mesh {
        for zk in 0..self.nz {
            for zj in 0..self.ny {
                for zi in 0..self.nx {
                    self.add_zone(zi, zj, zk);
                }
            }
        }
        self.add_boundary_sides();

        let np = self.pijk.len();
        let ne = self.e2p.len();
        let nf = self.f2z.len();
        let ns = self.sides.len();
        let nz_zones = self.nx * self.ny * self.nz;
        let nc = nz_zones * 8;

        let mut mesh = Mesh::new(0, 1, Geometry::Cartesian, comm);
        let ds = mesh.ds();

        // Points.
        mesh.points.resize(&ds, np, np, 0);
        {
            let mut pcoord = ds.access_vec3v("pcoord");
            for (p, &(i, j, k)) in self.pijk.iter().enumerate() {
                pcoord[p] = Vec3::new(i as f64, j as f64, k as f64);
            }
        }
        for p in 0..np {
            mesh.points.ent.mask[p] = if self.on_hull(p) { -1 } else { 1 };
            mesh.points.ent.comm_type[p] = comm_type::INTERNAL;
        }

        // Edges.
        mesh.edges.resize(&ds, ne, ne, 0);
        {
            let mut e2p1 = ds.access_intv("m:e>p1");
            let mut e2p2 = ds.access_intv("m:e>p2");
            for (e, &(a, b)) in self.e2p.iter().enumerate() {
                e2p1[e] = a as i32;
                e2p2[e] = b as i32;
            }
        }
        for (e, &(a, b)) in self.e2p.iter().enumerate() {
            mesh.edges.ent.mask[e] = if self.edge_on_hull(a, b) { -1 } else { 1 };
            mesh.edges.ent.comm_type[e] = comm_type::INTERNAL;
        }

        // Faces.
        mesh.faces.resize(&ds, nf, nf, 0);
        {
            let mut f2z1 = ds.access_intv("m:f>z1");
            let mut f2z2 = ds.access_intv("m:f>z2");
            for (f, &(z1, z2)) in self.f2z.iter().enumerate() {
                f2z1[f] = z1;
                f2z2[f] = z2;
            }
        }
        for (f, &(_, z2)) in self.f2z.iter().enumerate() {
            mesh.faces.ent.mask[f] = if z2 < 0 { -1 } else { 1 };
            mesh.faces.ent.comm_type[f] = comm_type::INTERNAL;
        }

        // Sides.
        mesh.sides.resize(&ds, ns, ns, 0);
        {
            let put = |name: &str, get: &dyn Fn(&SideRec) -> i32| {
                let mut map = ds.access_intv(name);
                for (s, rec) in self.sides.iter().enumerate() {
                    map[s] = get(rec);
                }
            };
            put("m:s>z", &|r| r.z);
            put("m:s>p1", &|r| r.p1);
            put("m:s>p2", &|r| r.p2);
            put("m:s>e", &|r| r.e);
            put("m:s>f", &|r| r.f);
            put("m:s>c1", &|r| r.c1);
            put("m:s>c2", &|r| r.c2);
            put("m:s>s2", &|r| r.s2);
            put("m:s>s3", &|r| r.s3);
            put("m:s>s4", &|r| r.s4);
            put("m:s>s5", &|r| r.s5);
        }
        for (s, rec) in self.sides.iter().enumerate() {
            mesh.sides.ent.mask[s] = rec.mask;
            mesh.sides.ent.comm_type[s] = comm_type::INTERNAL;
        }

        // Corners.
        mesh.corners.resize(&ds, nc, nc, 0);
        {
            let mut c2p = ds.access_intv("m:c>p");
            let mut c2z = ds.access_intv("m:c>z");
            for zk in 0..self.nz {
                for zj in 0..self.ny {
                    for zi in 0..self.nx {
                        let z = zi + self.nx * (zj + self.ny * zk);
                        for (v, &(di, dj, dk)) in VERTS.iter().enumerate() {
                            c2p[z * 8 + v] = self.pid(zi + di, zj + dj, zk + dk) as i32;
                            c2z[z * 8 + v] = z as i32;
                        }
                    }
                }
            }
        }
        for c in 0..nc {
            mesh.corners.ent.mask[c] = 1;
            mesh.corners.ent.comm_type[c] = comm_type::INTERNAL;
        }

        // Zones.
        mesh.zones.resize(&ds, nz_zones, nz_zones, 0);
        for z in 0..nz_zones {
            mesh.zones.ent.mask[z] = 1;
            mesh.zones.ent.comm_type[z] = comm_type::INTERNAL;
        }

        mesh
    }
}

/// A structured brick of `nx x ny x nz` unit zones on a single rank.
pub fn brick_mesh(nx: usize, ny: usize, nz: usize, comm: Rc<dyn Transport>) -> Mesh {
    BrickBuilder::new(nx, ny, nz).build(comm)
}

/// A single unit-cube zone with a dummy transport.
pub fn unit_cube_mesh() -> Mesh {
    brick_mesh(1, 1, 1, Rc::new(crate::comm::DummyTransport::new()))
}

/// Two unit zones sharing one interior face, with a dummy transport.
pub fn two_zone_mesh() -> Mesh {
    brick_mesh(2, 1, 1, Rc::new(crate::comm::DummyTransport::new()))
}
