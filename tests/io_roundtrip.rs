//! Binary dump round trips and rank-file discovery.

use std::io::Cursor;
use std::rc::Rc;

use ume::comm::DummyTransport;
use ume::io::{discover_rank_files, rank_file_name, read_mesh, write_mesh};
use ume::mesh::{Mesh, Subset};
use ume::testing::{two_zone_mesh, unit_cube_mesh};

fn roundtrip(mesh: &Mesh) -> Mesh {
    let mut buf = Vec::new();
    mesh.write_bin(&mut buf).unwrap();
    Mesh::read_bin(&mut Cursor::new(&buf), Rc::new(DummyTransport::new())).unwrap()
}

#[test]
fn meshes_roundtrip_bitwise() {
    for mesh in [unit_cube_mesh(), two_zone_mesh()] {
        let back = roundtrip(&mesh);
        assert!(back == mesh, "read(write(mesh)) differs from mesh");

        // And the rewritten bytes are identical.
        let mut a = Vec::new();
        mesh.write_bin(&mut a).unwrap();
        let mut b = Vec::new();
        back.write_bin(&mut b).unwrap();
        assert_eq!(a, b);
    }
}

#[test]
fn subsets_and_ghost_rows_survive_the_dump() {
    let mut mesh = unit_cube_mesh();
    mesh.points.ent.subsets.push(Subset {
        name: "hull".to_string(),
        lsize: 8,
        elements: (0..8).collect(),
        mask: vec![1; 8],
    });
    let ds = mesh.ds();
    let np = mesh.points.size();
    mesh.points.resize(&ds, np, np + 1, 1);
    mesh.points.ent.cpy_idx[0] = np as i32;
    mesh.points.ent.src_pe[0] = 1;
    mesh.points.ent.src_idx[0] = 3;
    mesh.points.ent.ghost_mask[0] = 1;

    let back = roundtrip(&mesh);
    assert!(back == mesh);
    assert_eq!(back.points.ent.subsets, mesh.points.ent.subsets);
    assert_eq!(back.points.ent.src_idx, vec![3]);
}

#[cfg(feature = "iotas")]
#[test]
fn iota_maps_roundtrip() {
    let mut mesh = unit_cube_mesh();
    let ds = mesh.ds();
    mesh.iotas.resize(&ds, 4, 4, 0);
    mesh.iotas.ent.mask = vec![1; 4];
    mesh.iotas.ent.comm_type = vec![1; 4];
    *ds.access_intv("m:a>z") = vec![0, 0, 0, 0];
    *ds.access_intv("m:a>s") = vec![0, 1, 2, 3];

    let back = roundtrip(&mesh);
    assert!(back == mesh);
    assert_eq!(*back.ds().caccess_intv("m:a>s"), vec![0, 1, 2, 3]);
}

#[test]
fn truncated_dumps_are_input_errors() {
    let mesh = unit_cube_mesh();
    let mut buf = Vec::new();
    mesh.write_bin(&mut buf).unwrap();
    buf.truncate(buf.len() / 2);
    let err = Mesh::read_bin(&mut Cursor::new(&buf), Rc::new(DummyTransport::new()));
    assert!(err.is_err());
}

#[test]
fn corrupt_tags_are_input_errors() {
    let mesh = unit_cube_mesh();
    let mut buf = Vec::new();
    mesh.write_bin(&mut buf).unwrap();
    // The first family tag is "points"; break it.
    let pos = buf.windows(6).position(|w| w == b"points").unwrap();
    buf[pos] = b'q';
    let err = Mesh::read_bin(&mut Cursor::new(&buf), Rc::new(DummyTransport::new()));
    let msg = format!("{:#}", err.unwrap_err());
    assert!(msg.contains("unexpected entity tag"), "got: {msg}");
}

#[test]
fn rank_files_are_discovered_in_pe_order() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let base = dir.path().join("box");
    let base = base.to_str().unwrap();

    for pe in [2, 0, 1] {
        let mut mesh = unit_cube_mesh();
        mesh.mype = pe;
        mesh.numpe = 3;
        write_mesh(rank_file_name(base, pe), &mesh)?;
    }
    // A decoy that must not match.
    std::fs::write(dir.path().join("box.notarank.ume"), b"junk")?;

    let files = discover_rank_files(base)?;
    assert_eq!(files.len(), 3);
    for (i, (pe, path)) in files.iter().enumerate() {
        assert_eq!(*pe, i as i32);
        let mesh = read_mesh(path, Rc::new(DummyTransport::new()))?;
        assert_eq!(mesh.mype, *pe);
        assert_eq!(mesh.numpe, 3);
    }
    Ok(())
}

#[test]
fn missing_rank_files_error() {
    let dir = tempfile::tempdir().unwrap();
    let base = dir.path().join("absent");
    assert!(discover_rank_files(base.to_str().unwrap()).is_err());
}
