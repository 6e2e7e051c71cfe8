//! Geometric derivations on small structured fixtures.

use ume::testing::{assert_close, assert_vec3_close, two_zone_mesh, unit_cube_mesh};
use ume::vec3::{dotprod, Vec3};

#[test]
fn edge_centers_are_midpoints() {
    let mesh = unit_cube_mesh();
    let ecoord = mesh.caccess_vec3v("ecoord");
    let e2p1 = mesh.caccess_intv("m:e>p1");
    let e2p2 = mesh.caccess_intv("m:e>p2");
    let pcoord = mesh.caccess_vec3v("pcoord");
    for e in 0..mesh.edges.local_size() {
        let mid = (pcoord[e2p1[e] as usize] + pcoord[e2p2[e] as usize]) * 0.5;
        assert_vec3_close(ecoord[e], mid, 1e-14);
    }
}

#[test]
fn inactive_edges_get_zero_centers() {
    let mut mesh = unit_cube_mesh();
    mesh.edges.ent.mask[0] = 0;
    let ecoord = mesh.caccess_vec3v("ecoord");
    assert_eq!(ecoord[0], Vec3::zero());
    assert_ne!(ecoord[1], Vec3::zero());
}

#[test]
fn face_centers_are_centroids() {
    let mesh = unit_cube_mesh();
    let fcoord = mesh.caccess_vec3v("fcoord");
    // Every unit-cube face centroid has two 0.5 components and one 0/1.
    for f in 0..mesh.faces.local_size() {
        let c = fcoord[f];
        let halves = (0..3).filter(|&i| (c[i] - 0.5).abs() < 1e-14).count();
        assert_eq!(halves, 2, "face {f} centroid {c} is not a unit-face center");
    }
}

#[test]
fn faces_with_no_incident_points_are_not_divided() {
    let mut mesh = unit_cube_mesh();
    let ds = mesh.ds();
    let nf = mesh.faces.size();
    // An active face no side refers to: it must stay at the zero
    // sentinel without dividing.
    mesh.faces.resize(&ds, nf + 1, nf + 1, 0);
    mesh.faces.ent.mask[nf] = 1;
    let fcoord = mesh.caccess_vec3v("fcoord");
    assert_eq!(fcoord[nf], Vec3::zero());
    assert!(fcoord.iter().all(|v| v[0].is_finite()));
}

#[test]
fn zone_centers_match_analytic_centroids() {
    let mesh = unit_cube_mesh();
    let zcoord = mesh.caccess_vec3v("zcoord");
    assert_vec3_close(zcoord[0], Vec3::new(0.5, 0.5, 0.5), 1e-14);

    let mesh = two_zone_mesh();
    let zcoord = mesh.caccess_vec3v("zcoord");
    assert_vec3_close(zcoord[0], Vec3::new(0.5, 0.5, 0.5), 1e-14);
    assert_vec3_close(zcoord[1], Vec3::new(1.5, 0.5, 0.5), 1e-14);
}

#[test]
fn side_volumes_are_positive_and_sum_to_zone_volume() {
    let mesh = two_zone_mesh();
    let side_vol = mesh.caccess_dblv("side_vol");
    let s2z = mesh.caccess_intv("m:s>z");
    let smask = &mesh.sides.mask;

    let mut zone_vol = vec![0.0; mesh.zones.size()];
    for s in 0..mesh.sides.local_size() {
        if smask[s] > 0 {
            // The p2/p1 winding makes consistently wound sides positive.
            assert!(side_vol[s] > 0.0, "side {s} has non-positive volume");
            assert_close(side_vol[s], 1.0 / 24.0, 1e-14);
            zone_vol[s2z[s] as usize] += side_vol[s];
        } else {
            assert_eq!(side_vol[s], 0.0, "boundary side {s} must not carry volume");
        }
    }
    assert_close(zone_vol[0], 1.0, 1e-12);
    assert_close(zone_vol[1], 1.0, 1e-12);
}

#[test]
fn corner_volumes_split_the_zone_evenly() {
    let mesh = unit_cube_mesh();
    let corner_vol = mesh.caccess_dblv("corner_vol");
    assert_eq!(corner_vol.len(), 8);
    for c in 0..8 {
        assert_close(corner_vol[c], 1.0 / 8.0, 1e-12);
    }
    assert_close(corner_vol.iter().sum::<f64>(), 1.0, 1e-12);
}

#[test]
fn flat_side_surfaces_point_out_of_their_zone() {
    let mesh = unit_cube_mesh();
    let surz = mesh.caccess_vec3v("side_surz");
    let san = mesh.caccess_vec3v("side_area_norm");
    let s2f = mesh.caccess_intv("m:s>f");
    let s2z = mesh.caccess_intv("m:s>z");
    let fx = mesh.caccess_vec3v("fcoord");
    let zx = mesh.caccess_vec3v("zcoord");
    let smask = &mesh.sides.mask;

    for s in 0..mesh.sides.local_size() {
        let outward = fx[s2f[s] as usize] - zx[s2z[s] as usize];
        if smask[s] > 0 {
            // A quarter of a unit face each.
            assert_close(surz[s].mag(), 0.25, 1e-13);
            assert!(dotprod(surz[s], outward) > 0.0, "side {s} surz points inward");
            assert!(san[s].mag() > 0.0);
        } else {
            assert_eq!(surz[s], Vec3::zero());
            // Boundary sides carry the quarter-weighted face normal,
            // also outward.
            assert!(dotprod(san[s], outward) > 0.0, "boundary side {s} normal inward");
            assert_close(san[s].mag(), 0.125, 1e-13);
        }
    }
}

#[test]
fn boundary_point_normals_are_outward_corner_diagonals() {
    let mesh = unit_cube_mesh();
    let point_norm = mesh.caccess_vec3v("point_norm");
    let pcoord = mesh.caccess_vec3v("pcoord");
    let inv_sqrt3 = 1.0 / 3.0_f64.sqrt();

    for p in 0..mesh.points.local_size() {
        let c = pcoord[p];
        let expect = Vec3::new(
            if c[0] == 0.0 { -inv_sqrt3 } else { inv_sqrt3 },
            if c[1] == 0.0 { -inv_sqrt3 } else { inv_sqrt3 },
            if c[2] == 0.0 { -inv_sqrt3 } else { inv_sqrt3 },
        );
        assert_vec3_close(point_norm[p], expect, 1e-12);
        assert_close(point_norm[p].mag(), 1.0, 1e-12);
    }
}

#[test]
fn inverse_connectivity_maps_are_sorted_and_complete() {
    let mesh = two_zone_mesh();

    let p2zs = mesh.caccess_intrr("m:p>zs");
    let c2p = mesh.caccess_intv("m:c>p");
    let c2z = mesh.caccess_intv("m:c>z");

    // The four points on the shared face belong to both zones.
    let pcoord = mesh.caccess_vec3v("pcoord");
    for p in 0..mesh.points.local_size() {
        let zones = &p2zs[p];
        let shared = (pcoord[p][0] - 1.0).abs() < 1e-14;
        if shared {
            assert_eq!(zones, &[0, 1]);
        } else {
            assert_eq!(zones.len(), 1);
        }
        assert!(zones.windows(2).all(|w| w[0] < w[1]));
    }

    // Real-corner lists cover every corner exactly once.
    let p2rc = mesh.caccess_intrr("m:p>rc");
    let mut seen = vec![0usize; mesh.corners.size()];
    for p in 0..mesh.points.size() {
        for &c in &p2rc[p] {
            assert_eq!(c2p[c as usize] as usize, p);
            seen[c as usize] += 1;
        }
    }
    assert!(seen.iter().all(|&n| n == 1));

    // Zone-to-point and zone-to-zone neighbor maps.
    let z2p = mesh.caccess_intrr("m:z>p");
    for z in 0..mesh.zones.size() {
        assert_eq!(z2p[z].len(), 8);
        assert!(z2p[z].windows(2).all(|w| w[0] < w[1]));
        for &p in &z2p[z] {
            assert!(p2zs[p as usize].contains(&(z as i32)));
        }
    }

    let z2pz = mesh.caccess_intrr("m:z>pz");
    assert_eq!(&z2pz[0], &[1]);
    assert_eq!(&z2pz[1], &[0]);

    // Corner maps stay in range.
    for c in 0..mesh.corners.size() {
        assert!((c2z[c] as usize) < mesh.zones.size());
        assert!((c2p[c] as usize) < mesh.points.size());
    }
}
