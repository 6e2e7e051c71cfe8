//! Aggregated pack/exchange/unpack buffers.
//!
//! One [`Buffers`] instance covers *all* of an entity's peers: per-peer
//! spans are recorded in [`Remote`] entries over a single flat buffer of
//! the field's base scalar type. Filling or draining the buffer is then
//! a pure map through the buffer-to-entity index table, which is the
//! form accelerators want.

use super::neighbors::Neighbors;
use super::transport::Transport;
use crate::vec3::Vec3;
use anyhow::Result;

/// Reduction applied when unpacking a receive buffer into a field.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Op {
    Overwrite,
    Max,
    Min,
    Sum,
}

/// A field element that can travel through a [`Buffers`].
///
/// Implemented for the three supported field kinds: `i32`, `f64`, and
/// [`Vec3`]. `Base` is the scalar type that actually goes on the wire;
/// a `Vec3` packs as three consecutive doubles.
pub trait CommElem: Copy + Default + 'static {
    /// Wire scalar type.
    type Base: Copy + Default + PartialEq + std::fmt::Debug;
    /// Number of base scalars per element.
    const ELEM_LEN: usize;

    /// Write this element into `dst` (exactly `ELEM_LEN` scalars).
    fn pack(&self, dst: &mut [Self::Base]);
    /// Read one element from `src` (exactly `ELEM_LEN` scalars).
    fn unpack(src: &[Self::Base]) -> Self;
    /// Merge an incoming element into the current field value.
    fn reduce(op: Op, current: Self, incoming: Self) -> Self;
    /// Dispatch to the transport entry point for this element kind.
    fn exchange(
        comm: &dyn Transport,
        sends: &Buffers<Self>,
        recvs: &mut Buffers<Self>,
    ) -> Result<()>;
}

impl CommElem for i32 {
    type Base = i32;
    const ELEM_LEN: usize = 1;

    fn pack(&self, dst: &mut [i32]) {
        dst[0] = *self;
    }
    fn unpack(src: &[i32]) -> Self {
        src[0]
    }
    fn reduce(op: Op, current: Self, incoming: Self) -> Self {
        match op {
            Op::Overwrite => incoming,
            Op::Max => current.max(incoming),
            Op::Min => current.min(incoming),
            Op::Sum => current + incoming,
        }
    }
    fn exchange(comm: &dyn Transport, sends: &Buffers<i32>, recvs: &mut Buffers<i32>) -> Result<()> {
        comm.exchange_ints(sends, recvs)
    }
}

impl CommElem for f64 {
    type Base = f64;
    const ELEM_LEN: usize = 1;

    fn pack(&self, dst: &mut [f64]) {
        dst[0] = *self;
    }
    fn unpack(src: &[f64]) -> Self {
        src[0]
    }
    fn reduce(op: Op, current: Self, incoming: Self) -> Self {
        match op {
            Op::Overwrite => incoming,
            Op::Max => current.max(incoming),
            Op::Min => current.min(incoming),
            Op::Sum => current + incoming,
        }
    }
    fn exchange(comm: &dyn Transport, sends: &Buffers<f64>, recvs: &mut Buffers<f64>) -> Result<()> {
        comm.exchange_dbls(sends, recvs)
    }
}

impl CommElem for Vec3 {
    type Base = f64;
    const ELEM_LEN: usize = 3;

    fn pack(&self, dst: &mut [f64]) {
        dst.copy_from_slice(&self.0);
    }
    fn unpack(src: &[f64]) -> Self {
        Vec3::new(src[0], src[1], src[2])
    }
    // MIN and MAX act componentwise on vectors.
    fn reduce(op: Op, current: Self, incoming: Self) -> Self {
        match op {
            Op::Overwrite => incoming,
            Op::Max => Vec3::new(
                current[0].max(incoming[0]),
                current[1].max(incoming[1]),
                current[2].max(incoming[2]),
            ),
            Op::Min => Vec3::new(
                current[0].min(incoming[0]),
                current[1].min(incoming[1]),
                current[2].min(incoming[2]),
            ),
            Op::Sum => current + incoming,
        }
    }
    fn exchange(
        comm: &dyn Transport,
        sends: &Buffers<Vec3>,
        recvs: &mut Buffers<Vec3>,
    ) -> Result<()> {
        comm.exchange_vec3s(sends, recvs)
    }
}

/// Location of one peer's span in the aggregated buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Remote {
    /// Peer PE id (virtual id when rank translation is active).
    pub pe: i32,
    /// Start of this peer's span, in base scalars.
    pub offset: usize,
    /// Length of this peer's span, in base scalars.
    pub len: usize,
}

/// The aggregated wire buffer for one neighbor list.
pub struct Buffers<T: CommElem> {
    /// Per-peer span table.
    pub remotes: Vec<Remote>,
    /// Buffer-to-entity index map: entry `i` names the entity index
    /// behind positions `[i*ELEM_LEN, (i+1)*ELEM_LEN)` of `buf`.
    b2e: Vec<usize>,
    /// The flat wire buffer.
    pub buf: Vec<T::Base>,
}

impl<T: CommElem> Buffers<T> {
    /// Lay out an aggregated buffer over `neighs`.
    pub fn new(neighs: &Neighbors) -> Self {
        let mut remotes = Vec::with_capacity(neighs.len());
        let mut b2e = Vec::new();
        let mut count = 0usize;
        for n in neighs {
            remotes.push(Remote {
                pe: n.pe,
                offset: count * T::ELEM_LEN,
                len: n.elements.len() * T::ELEM_LEN,
            });
            b2e.extend(n.elements.iter().map(|&e| e as usize));
            count += n.elements.len();
        }
        Buffers { remotes, b2e, buf: vec![T::Base::default(); count * T::ELEM_LEN] }
    }

    /// Number of field elements covered by the buffer.
    pub fn num_entries(&self) -> usize {
        self.b2e.len()
    }

    /// The buffer-to-entity index map.
    pub fn buf2ent(&self) -> &[usize] {
        &self.b2e
    }

    /// Gather `field` values into the wire buffer.
    pub fn pack(&mut self, field: &[T]) {
        for (i, &e) in self.b2e.iter().enumerate() {
            field[e].pack(&mut self.buf[i * T::ELEM_LEN..(i + 1) * T::ELEM_LEN]);
        }
    }

    /// Scatter the wire buffer back into `field` under `op`.
    ///
    /// For `Op::Overwrite`, debug builds verify that no entity index is
    /// written twice in a single unpack; a repeat means a malformed
    /// neighbor descriptor.
    pub fn unpack(&self, field: &mut [T], op: Op) {
        #[cfg(debug_assertions)]
        let mut seen = std::collections::HashSet::new();
        for (i, &e) in self.b2e.iter().enumerate() {
            let val = T::unpack(&self.buf[i * T::ELEM_LEN..(i + 1) * T::ELEM_LEN]);
            if op == Op::Overwrite {
                #[cfg(debug_assertions)]
                assert!(seen.insert(e), "duplicate overwrite target {e} in unpack");
                field[e] = val;
            } else {
                field[e] = T::reduce(op, field[e], val);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::comm::Neighbor;

    fn neighbors() -> Neighbors {
        vec![
            Neighbor { pe: 2, elements: vec![3, 1] },
            Neighbor { pe: 5, elements: vec![0] },
        ]
    }

    #[test]
    fn layout_aggregates_peers() {
        let b: Buffers<Vec3> = Buffers::new(&neighbors());
        assert_eq!(b.num_entries(), 3);
        assert_eq!(b.buf.len(), 9);
        assert_eq!(b.remotes[0], Remote { pe: 2, offset: 0, len: 6 });
        assert_eq!(b.remotes[1], Remote { pe: 5, offset: 6, len: 3 });
        assert_eq!(b.buf2ent(), &[3, 1, 0]);
    }

    #[test]
    fn pack_then_overwrite_unpack_is_identity_on_listed_elements() {
        let field = vec![10.0, 11.0, 12.0, 13.0];
        let mut b: Buffers<f64> = Buffers::new(&neighbors());
        b.pack(&field);
        let mut out = vec![0.0; 4];
        b.unpack(&mut out, Op::Overwrite);
        assert_eq!(out, vec![10.0, 11.0, 0.0, 13.0]);
    }

    #[test]
    fn reduction_unpacks() {
        let field = vec![1, 2, 3, 4];
        let mut b: Buffers<i32> = Buffers::new(&neighbors());
        b.pack(&field);
        let mut sum = vec![100; 4];
        b.unpack(&mut sum, Op::Sum);
        assert_eq!(sum, vec![101, 102, 100, 104]);
        let mut mx = vec![2; 4];
        b.unpack(&mut mx, Op::Max);
        assert_eq!(mx, vec![2, 2, 2, 4]);
        let mut mn = vec![2; 4];
        b.unpack(&mut mn, Op::Min);
        assert_eq!(mn, vec![1, 2, 2, 2]);
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "duplicate overwrite target")]
    fn duplicate_overwrite_target_is_fatal_in_debug() {
        let neighs = vec![Neighbor { pe: 1, elements: vec![0, 0] }];
        let mut b: Buffers<i32> = Buffers::new(&neighs);
        b.pack(&[7]);
        let mut out = vec![0];
        b.unpack(&mut out, Op::Overwrite);
    }
}
