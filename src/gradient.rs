//! Gradients of zone-centered fields.

use crate::comm::Op;
use crate::mesh::Mesh;
use crate::vec3::{dotprod, Vec3};
use anyhow::Result;

/// Calculate the gradient of a zone-centered field at mesh points.
///
/// Computes the point-centered gradient as a piecewise-constant contour
/// integral around each point control volume: every interior corner
/// credits its surface vector weighted by the zone value, and its
/// control volume, to its point. Both accumulations are summed across
/// ranks (points are shared), then the gradient is divided by the
/// control volume. At points on the outer perimeter of the mesh
/// (mask −1) the outward-normal component is removed first, using the
/// point normals. Finishes by scattering the gradient to point copies.
pub fn gradzatp(mesh: &Mesh, zone_field: &[f64], point_gradient: &mut Vec<Vec3>) -> Result<()> {
    let csurf = mesh.caccess_vec3v("corner_csurf");
    let corner_volume = mesh.caccess_dblv("corner_vol");
    let point_normal = mesh.caccess_vec3v("point_norm");
    let c_to_p_map = mesh.caccess_intv("m:c>p");
    let c_to_z_map = mesh.caccess_intv("m:c>z");
    let corner_type = &mesh.corners.mask;
    let point_type = &mesh.points.mask;

    let pll = mesh.points.size();
    let pl = mesh.points.local_size();
    let cl = mesh.corners.local_size();

    let mut point_volume = vec![0.0; pll];
    point_gradient.clear();
    point_gradient.resize(pll, Vec3::zero());

    for c in 0..cl {
        if corner_type[c] < 1 {
            continue; // interior corners only
        }
        let z = c_to_z_map[c] as usize;
        let p = c_to_p_map[c] as usize;
        point_volume[p] += corner_volume[c];
        point_gradient[p] += csurf[c] * zone_field[z];
    }

    mesh.points.gathscat(mesh.comm(), Op::Sum, &mut point_volume)?;
    mesh.points.gathscat(mesh.comm(), Op::Sum, point_gradient)?;

    for p in 0..pl {
        if point_type[p] > 0 {
            point_gradient[p] /= point_volume[p];
        } else if point_type[p] == -1 {
            // Mesh boundary point: remove the outward-normal component.
            let ppdot = dotprod(point_gradient[p], point_normal[p]);
            point_gradient[p] =
                (point_gradient[p] - point_normal[p] * ppdot) / point_volume[p];
        }
    }
    mesh.points.scatter(mesh.comm(), point_gradient)
}

/// Calculate the gradient of a zone-centered field at the zone centers.
///
/// Builds on [`gradzatp`]: the zone gradient is the volume-weighted
/// average of the point gradients over the zone's interior corners.
/// Returns both the zone-centered and point-centered gradients.
pub fn gradzatz(
    mesh: &Mesh,
    zone_field: &[f64],
    zone_gradient: &mut Vec<Vec3>,
    point_gradient: &mut Vec<Vec3>,
) -> Result<()> {
    let cl = mesh.corners.local_size();
    let zll = mesh.zones.size();

    // Field gradient at each mesh point.
    gradzatp(mesh, zone_field, point_gradient)?;

    let c_to_z_map = mesh.caccess_intv("m:c>z");
    let c_to_p_map = mesh.caccess_intv("m:c>p");
    let corner_type = &mesh.corners.mask;
    let corner_volume = mesh.caccess_dblv("corner_vol");

    let mut zone_volume = vec![0.0; zll];
    for c in 0..cl {
        if corner_type[c] < 1 {
            continue;
        }
        zone_volume[c_to_z_map[c] as usize] += corner_volume[c];
    }

    zone_gradient.clear();
    zone_gradient.resize(zll, Vec3::zero());
    for c in 0..cl {
        if corner_type[c] < 1 {
            continue;
        }
        let z = c_to_z_map[c] as usize;
        let p = c_to_p_map[c] as usize;
        let c_z_vol_ratio = corner_volume[c] / zone_volume[z];
        zone_gradient[z] += point_gradient[p] * c_z_vol_ratio;
    }

    mesh.zones.scatter(mesh.comm(), zone_gradient)
}
