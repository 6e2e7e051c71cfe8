//! Flat face areas.

use crate::mesh::{comm_type, Mesh};
use crate::vec3::vectormag;
use anyhow::Result;

/// Compute the flat area of each face.
///
/// Accumulates the magnitudes of the flat side surface vectors of
/// internal sides into their faces, once per side pair: the two sides
/// sharing a face and an edge belong to the zones on either side of the
/// face, and only one of them may contribute. Only internal and source
/// faces accumulate locally; a final scatter pushes the results out to
/// copies.
///
/// `face_area` must be sized to the face count; it is cleared first.
pub fn calc_face_area(mesh: &Mesh, face_area: &mut [f64]) -> Result<()> {
    assert_eq!(face_area.len(), mesh.faces.size(), "face_area length != face count");
    let side_type = &mesh.sides.mask;
    let face_comm_type = &mesh.faces.comm_type;
    let s_to_f_map = mesh.caccess_intv("m:s>f");
    let s_to_s2_map = mesh.caccess_intv("m:s>s2");
    let surz = mesh.caccess_vec3v("side_surz");

    let sl = mesh.sides.local_size();

    face_area.fill(0.0);
    let mut side_tag = vec![0u8; mesh.sides.size()];

    for s in 0..sl {
        if side_type[s] < 1 {
            continue; // internal sides only
        }
        if side_tag[s] == 1 {
            continue; // already counted via its pair
        }

        let f = s_to_f_map[s] as usize;
        if face_comm_type[f] < comm_type::COPY {
            // An internal or source face.
            face_area[f] += vectormag(surz[s]);
            side_tag[s_to_s2_map[s] as usize] = 1;
        }
    }

    mesh.faces.scatter(mesh.comm(), face_area)
}
