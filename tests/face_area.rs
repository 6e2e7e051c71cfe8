//! Face-area accumulation, including the shared-face single count.

use ume::calc_face_area;
use ume::testing::{assert_close, two_zone_mesh, unit_cube_mesh};

#[test]
fn unit_cube_faces_have_unit_area() -> anyhow::Result<()> {
    let mesh = unit_cube_mesh();
    let mut face_area = vec![0.0; mesh.faces.size()];
    calc_face_area(&mesh, &mut face_area)?;
    for f in 0..mesh.faces.local_size() {
        assert_close(face_area[f], 1.0, 1e-12);
    }
    Ok(())
}

#[test]
fn shared_face_is_credited_exactly_once() -> anyhow::Result<()> {
    let mesh = two_zone_mesh();
    let mut face_area = vec![0.0; mesh.faces.size()];
    calc_face_area(&mesh, &mut face_area)?;

    let f2z2 = mesh.caccess_intv("m:f>z2");
    let mut interior_faces = 0;
    for f in 0..mesh.faces.local_size() {
        // Both zones' sides touch the shared face; the side-pair tag
        // must keep it from being counted twice.
        assert_close(face_area[f], 1.0, 1e-12);
        if f2z2[f] >= 0 {
            interior_faces += 1;
        }
    }
    assert_eq!(interior_faces, 1);

    // 2x1x1 brick: 10 hull faces + 1 shared.
    assert_eq!(mesh.faces.local_size(), 11);
    let total: f64 = face_area.iter().sum();
    assert_close(total, 11.0, 1e-12);
    Ok(())
}

#[test]
fn rerunning_face_areas_clears_stale_values() -> anyhow::Result<()> {
    let mesh = unit_cube_mesh();
    let mut face_area = vec![999.0; mesh.faces.size()];
    calc_face_area(&mesh, &mut face_area)?;
    assert_close(face_area.iter().sum::<f64>(), 6.0, 1e-12);
    Ok(())
}
