//! Record information common to all mesh entity families.

use crate::comm::{
    read_neighbors, write_neighbors, Buffers, CommElem, Neighbors, Op, Transport,
};
use crate::io::{
    read_scalar, read_vec, skip_line, write_scalar, write_terminator, write_vec,
};
use anyhow::Result;
use std::io::{BufRead, Write};

/// Communication classification of an entity index.
///
/// Stored as raw ints in [`Entity::comm_type`] to match the dump format.
pub mod comm_type {
    /// Not on a communication boundary.
    pub const INTERNAL: i32 = 1;
    /// The source entity in a group of shared copies.
    pub const SOURCE: i32 = 2;
    /// Non-source entity in a group of shared copies.
    pub const COPY: i32 = 3;
    /// A non-shared ghost copy of a remote entity.
    pub const GHOST: i32 = 4;
}

/// A named index subset of an entity family, with its own mask.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Subset {
    pub name: String,
    pub lsize: i32,
    pub elements: Vec<i32>,
    pub mask: Vec<i16>,
}

/// Common base of the entity families.
///
/// Entities that are shared across rank boundaries live among the real
/// entries in `[0, lsize)`; exactly one rank holds the SOURCE instance
/// and every other holder has a COPY. Ghosts, which mirror remote reals
/// but are not iterated in calculations, occupy the upper index range
/// `[lsize, size)`; ghost row `i` is addressed back to its source by the
/// pair `(src_pe[i], src_idx[i])`.
///
/// The connectivity is one-directional: a copy knows where its source
/// is, and the two neighbor lists drive the exchanges. `my_cpys` lives
/// on the source-owning rank and lists, per peer, the local source
/// indices that have copies on that peer; `my_srcs` lives on a
/// copy-holding rank and lists, per source peer, the local copy indices.
/// Shared values are combined with the gather-scatter paradigm, or
/// simply scattered from the source so every partition computes on the
/// same value.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Entity {
    /// Mask flag: >=1 active real, 0 null, <=-1 boundary/ghost class.
    pub mask: Vec<i16>,
    /// Communication type per index; see [`comm_type`].
    pub comm_type: Vec<i32>,
    /// Local indices of copies, one row per ghost.
    pub cpy_idx: Vec<i32>,
    /// The rank that owns the source entity, one row per ghost.
    pub src_pe: Vec<i32>,
    /// The index of the source entity on `src_pe`, one row per ghost.
    pub src_idx: Vec<i32>,
    /// The type of ghost, one row per ghost.
    pub ghost_mask: Vec<i32>,
    /// Per-peer local source indices with remote copies.
    pub my_cpys: Neighbors,
    /// Per-peer local copy indices with remote sources.
    pub my_srcs: Neighbors,
    /// Named index subsets.
    pub subsets: Vec<Subset>,
    /// The number of local (non-ghost) entities.
    pub lsize: usize,
}

impl Entity {
    /// Total number of indices, ghosts included.
    pub fn size(&self) -> usize {
        self.mask.len()
    }

    /// Number of real (non-ghost) indices.
    pub fn local_size(&self) -> usize {
        self.lsize
    }

    /// Number of ghost indices.
    pub fn ghost_size(&self) -> usize {
        self.size() - self.lsize
    }

    /// Resize to `total` indices, of which `local` are real, with
    /// `ghost` ghost-address rows.
    pub fn resize(&mut self, local: usize, total: usize, ghost: usize) {
        self.mask.resize(total, 0);
        self.comm_type.resize(total, 0);
        self.cpy_idx.resize(ghost, 0);
        self.src_pe.resize(ghost, 0);
        self.src_idx.resize(ghost, 0);
        self.ghost_mask.resize(ghost, 0);
        self.lsize = local;
    }

    /// Move copy values to their sources and reduce them there under
    /// `op`. Source-side values include the source's own contribution
    /// only through `field` itself; copies' values arrive via the wire.
    pub fn gather<T: CommElem>(
        &self,
        comm: &dyn Transport,
        op: Op,
        field: &mut [T],
    ) -> Result<()> {
        assert_eq!(field.len(), self.size(), "field length != entity size");
        let mut cpys = Buffers::<T>::new(&self.my_cpys);
        let mut srcs = Buffers::<T>::new(&self.my_srcs);
        // Send local copies to the remote sources.
        srcs.pack(field);
        T::exchange(comm, &srcs, &mut cpys)?;
        cpys.unpack(field, op);
        Ok(())
    }

    /// Push source values out to every copy (ghosts included),
    /// overwriting them.
    pub fn scatter<T: CommElem>(&self, comm: &dyn Transport, field: &mut [T]) -> Result<()> {
        assert_eq!(field.len(), self.size(), "field length != entity size");
        let mut cpys = Buffers::<T>::new(&self.my_cpys);
        let mut srcs = Buffers::<T>::new(&self.my_srcs);
        // Send local sources to the remote copies.
        cpys.pack(field);
        T::exchange(comm, &cpys, &mut srcs)?;
        srcs.unpack(field, Op::Overwrite);
        Ok(())
    }

    /// Gather copies into the sources under `op`, then scatter the
    /// merged source values back out. On return every shared entity
    /// holds the same value on all ranks that share it.
    pub fn gathscat<T: CommElem>(
        &self,
        comm: &dyn Transport,
        op: Op,
        field: &mut [T],
    ) -> Result<()> {
        assert_eq!(field.len(), self.size(), "field length != entity size");
        let mut cpys = Buffers::<T>::new(&self.my_cpys);
        let mut srcs = Buffers::<T>::new(&self.my_srcs);
        srcs.pack(field);
        T::exchange(comm, &srcs, &mut cpys)?;
        // cpys now holds the remote copy values; merge them in.
        cpys.unpack(field, op);
        // Refill from the merged field and push back out.
        cpys.pack(field);
        T::exchange(comm, &cpys, &mut srcs)?;
        srcs.unpack(field, Op::Overwrite);
        Ok(())
    }

    /// Binary write of the base entity record.
    pub fn write_bin<W: Write>(&self, w: &mut W) -> Result<()> {
        write_scalar(w, self.lsize as i32)?;
        write_vec(w, &self.mask)?;
        write_vec(w, &self.comm_type)?;
        write_vec(w, &self.cpy_idx)?;
        write_vec(w, &self.src_pe)?;
        write_vec(w, &self.src_idx)?;
        write_vec(w, &self.ghost_mask)?;
        write_neighbors(w, &self.my_cpys)?;
        write_neighbors(w, &self.my_srcs)?;
        write_subsets(w, &self.subsets)?;
        write_terminator(w)
    }

    /// Binary read of the base entity record.
    pub fn read_bin<R: BufRead>(&mut self, r: &mut R) -> Result<()> {
        self.lsize = read_scalar::<i32, R>(r)? as usize;
        self.mask = read_vec(r)?;
        self.comm_type = read_vec(r)?;
        self.cpy_idx = read_vec(r)?;
        self.src_pe = read_vec(r)?;
        self.src_idx = read_vec(r)?;
        self.ghost_mask = read_vec(r)?;
        self.my_cpys = read_neighbors(r)?;
        self.my_srcs = read_neighbors(r)?;
        self.subsets = read_subsets(r)?;
        skip_line(r)
    }
}

/// Binary write for a subset list.
pub fn write_subsets<W: Write>(w: &mut W, subsets: &[Subset]) -> Result<()> {
    write_scalar(w, subsets.len() as u64)?;
    for s in subsets {
        crate::io::write_string(w, &s.name)?;
        write_scalar(w, s.lsize)?;
        write_vec(w, &s.elements)?;
        write_vec(w, &s.mask)?;
        write_terminator(w)?;
    }
    write_terminator(w)
}

/// Binary read for a subset list.
pub fn read_subsets<R: BufRead>(r: &mut R) -> Result<Vec<Subset>> {
    let len = read_scalar::<u64, R>(r)? as usize;
    let mut subsets = Vec::with_capacity(len);
    for _ in 0..len {
        let name = crate::io::read_string(r)?;
        let lsize = read_scalar::<i32, R>(r)?;
        let elements = read_vec(r)?;
        let mask = read_vec(r)?;
        skip_line(r)?;
        subsets.push(Subset { name, lsize, elements, mask });
    }
    skip_line(r)?;
    Ok(subsets)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn sample_entity() -> Entity {
        let mut e = Entity::default();
        e.resize(4, 6, 2);
        e.mask = vec![1, 1, -1, 1, -1, -1];
        e.comm_type = vec![
            comm_type::INTERNAL,
            comm_type::SOURCE,
            comm_type::COPY,
            comm_type::INTERNAL,
            comm_type::GHOST,
            comm_type::GHOST,
        ];
        e.cpy_idx = vec![4, 5];
        e.src_pe = vec![1, 1];
        e.src_idx = vec![0, 3];
        e.ghost_mask = vec![1, 1];
        e.my_cpys = vec![crate::comm::Neighbor { pe: 1, elements: vec![1] }];
        e.my_srcs = vec![crate::comm::Neighbor { pe: 1, elements: vec![2, 4, 5] }];
        e.subsets = vec![Subset {
            name: "hull".to_string(),
            lsize: 2,
            elements: vec![2, 4],
            mask: vec![1, 1],
        }];
        e
    }

    #[test]
    fn sizes_follow_resize() {
        let e = sample_entity();
        assert_eq!(e.size(), 6);
        assert_eq!(e.local_size(), 4);
        assert_eq!(e.ghost_size(), 2);
    }

    #[test]
    fn entity_record_roundtrips() {
        let e = sample_entity();
        let mut buf = Vec::new();
        e.write_bin(&mut buf).unwrap();
        let mut back = Entity::default();
        back.read_bin(&mut Cursor::new(&buf)).unwrap();
        assert_eq!(back, e);
    }

    #[test]
    fn empty_entity_roundtrips() {
        let e = Entity::default();
        let mut buf = Vec::new();
        e.write_bin(&mut buf).unwrap();
        let mut back = Entity::default();
        back.read_bin(&mut Cursor::new(&buf)).unwrap();
        assert_eq!(back, e);
    }
}
