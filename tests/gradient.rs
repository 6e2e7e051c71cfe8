//! Zone-field gradients at points and zone centers.

use ume::gradient::{gradzatp, gradzatz};
use ume::testing::{two_zone_mesh, unit_cube_mesh};
use ume::vec3::{dotprod, Vec3};

#[test]
fn point_gradient_is_finite_and_tangent_at_boundary_points() -> anyhow::Result<()> {
    let mesh = unit_cube_mesh();
    let zone_field = vec![3.0; mesh.zones.size()];
    let mut point_gradient = Vec::new();
    gradzatp(&mesh, &zone_field, &mut point_gradient)?;

    assert_eq!(point_gradient.len(), mesh.points.size());
    let point_norm = mesh.caccess_vec3v("point_norm");
    for p in 0..mesh.points.local_size() {
        let g = point_gradient[p];
        assert!(g[0].is_finite() && g[1].is_finite() && g[2].is_finite());
        // Every unit-cube point is a boundary point; the outward-normal
        // component must have been removed.
        assert!(mesh.points.mask[p] < 0);
        assert!(dotprod(g, point_norm[p]).abs() < 1e-10, "gradient not tangent at {p}");
    }
    Ok(())
}

#[test]
fn zone_gradient_is_volume_weighted_corner_average() -> anyhow::Result<()> {
    let mesh = two_zone_mesh();
    let zone_field: Vec<f64> = (0..mesh.zones.size()).map(|z| z as f64).collect();
    let mut zone_gradient = Vec::new();
    let mut point_gradient = Vec::new();
    gradzatz(&mesh, &zone_field, &mut zone_gradient, &mut point_gradient)?;

    assert_eq!(zone_gradient.len(), mesh.zones.size());
    assert_eq!(point_gradient.len(), mesh.points.size());

    // Recompute the weighted average directly from the maps.
    let c2z = mesh.caccess_intv("m:c>z");
    let c2p = mesh.caccess_intv("m:c>p");
    let corner_vol = mesh.caccess_dblv("corner_vol");
    let mut zone_vol = vec![0.0; mesh.zones.size()];
    for c in 0..mesh.corners.local_size() {
        if mesh.corners.mask[c] >= 1 {
            zone_vol[c2z[c] as usize] += corner_vol[c];
        }
    }
    let mut expect = vec![Vec3::zero(); mesh.zones.size()];
    for c in 0..mesh.corners.local_size() {
        if mesh.corners.mask[c] >= 1 {
            let z = c2z[c] as usize;
            expect[z] += point_gradient[c2p[c] as usize] * (corner_vol[c] / zone_vol[z]);
        }
    }
    for z in 0..mesh.zones.size() {
        assert!((zone_gradient[z] - expect[z]).mag() < 1e-12);
    }
    Ok(())
}

#[test]
fn constant_field_gradients_are_consistent_between_runs() -> anyhow::Result<()> {
    let mesh = unit_cube_mesh();
    let zone_field = vec![7.5; mesh.zones.size()];
    let mut first = Vec::new();
    gradzatp(&mesh, &zone_field, &mut first)?;
    let mut second = Vec::new();
    gradzatp(&mesh, &zone_field, &mut second)?;
    assert_eq!(first, second);
    Ok(())
}
