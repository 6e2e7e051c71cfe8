//! One-way communication pattern descriptors.

use crate::io::{read_scalar, read_vec, skip_line, write_scalar, write_terminator, write_vec};
use anyhow::Result;
use std::io::{BufRead, Write};

/// The remote PE and the local entity indices of one communication
/// pattern.
///
/// For sends, `elements` is the list of entity indices gathered into the
/// send buffer; for receives, it is the scatter pattern from the buffer
/// back into the entity. The order of `elements` is the wire order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Neighbor {
    pub pe: i32,
    pub elements: Vec<i32>,
}

/// One descriptor per communicating peer.
pub type Neighbors = Vec<Neighbor>;

/// Binary write for a neighbor list.
pub fn write_neighbors<W: Write>(w: &mut W, nvec: &Neighbors) -> Result<()> {
    write_scalar(w, nvec.len() as u64)?;
    for n in nvec {
        write_scalar(w, n.pe)?;
        write_vec(w, &n.elements)?;
        write_terminator(w)?;
    }
    write_terminator(w)
}

/// Binary read for a neighbor list.
pub fn read_neighbors<R: BufRead>(r: &mut R) -> Result<Neighbors> {
    let len = read_scalar::<u64, R>(r)? as usize;
    let mut nvec = Neighbors::with_capacity(len);
    for _ in 0..len {
        let pe = read_scalar::<i32, R>(r)?;
        let elements = read_vec(r)?;
        skip_line(r)?;
        nvec.push(Neighbor { pe, elements });
    }
    skip_line(r)?;
    Ok(nvec)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn neighbor_lists_roundtrip() {
        let nvec = vec![
            Neighbor { pe: 1, elements: vec![0, 4, 2] },
            Neighbor { pe: 3, elements: vec![] },
        ];
        let mut buf = Vec::new();
        write_neighbors(&mut buf, &nvec).unwrap();
        assert_eq!(read_neighbors(&mut Cursor::new(&buf)).unwrap(), nvec);

        let empty: Neighbors = Vec::new();
        let mut buf = Vec::new();
        write_neighbors(&mut buf, &empty).unwrap();
        assert_eq!(read_neighbors(&mut Cursor::new(&buf)).unwrap(), empty);
    }
}
