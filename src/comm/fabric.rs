//! In-process rank fabric over channels.
//!
//! [`LocalFabric::new`] builds one [`LocalTransport`] per simulated PE;
//! each is moved onto its own thread, where it behaves like any other
//! [`Transport`] binding. Messages are typed channel packets rather than
//! raw bytes, staged out of order on the receive side and matched by
//! (sender, tag), which reproduces the post-receives/post-sends/await
//! semantics of a real fabric.
//!
//! The fabric also implements the optional virtual-rank layer: a PE may
//! register a virtual id with [`LocalTransport::register_virtual_rank`],
//! which runs an all-gather over the reserved tag 0; subsequent sends
//! and receives then address peers by virtual id.

use super::buffers::{Buffers, Remote};
use super::transport::{Transport, MAX_TAG};
use crate::vec3::Vec3;
use anyhow::{anyhow, bail, Result};
use crossbeam_channel::{unbounded, Receiver, Sender};
use std::cell::{Cell, RefCell};
use std::collections::{HashMap, VecDeque};

#[derive(Clone, Debug)]
enum Payload {
    Ints(Vec<i32>),
    Dbls(Vec<f64>),
}

#[derive(Clone, Debug)]
struct Packet {
    src: i32,
    tag: i32,
    payload: Payload,
}

/// Wire scalar of the fabric; maps a buffer slice to a channel payload.
trait WireScalar: Copy {
    fn wrap(data: Vec<Self>) -> Payload;
    fn unwrap_payload(p: Payload) -> Result<Vec<Self>>;
}

impl WireScalar for i32 {
    fn wrap(data: Vec<i32>) -> Payload {
        Payload::Ints(data)
    }
    fn unwrap_payload(p: Payload) -> Result<Vec<i32>> {
        match p {
            Payload::Ints(v) => Ok(v),
            Payload::Dbls(_) => bail!("expected integer payload, got doubles"),
        }
    }
}

impl WireScalar for f64 {
    fn wrap(data: Vec<f64>) -> Payload {
        Payload::Dbls(data)
    }
    fn unwrap_payload(p: Payload) -> Result<Vec<f64>> {
        match p {
            Payload::Dbls(v) => Ok(v),
            Payload::Ints(_) => bail!("expected double payload, got integers"),
        }
    }
}

/// Factory for a set of connected in-process transports.
pub struct LocalFabric;

impl LocalFabric {
    /// Build `numpe` connected transports, one per simulated PE.
    ///
    /// Move each into its own thread; they are not shareable.
    pub fn new(numpe: usize) -> Vec<LocalTransport> {
        let mut senders = Vec::with_capacity(numpe);
        let mut receivers = Vec::with_capacity(numpe);
        for _ in 0..numpe {
            let (tx, rx) = unbounded();
            senders.push(tx);
            receivers.push(rx);
        }
        receivers
            .into_iter()
            .enumerate()
            .map(|(rank, receiver)| LocalTransport {
                rank: rank as i32,
                numpe: numpe as i32,
                wire_id: Cell::new(rank as i32),
                senders: senders.clone(),
                receiver,
                next_tag: Cell::new(1),
                staged: RefCell::new(HashMap::new()),
                vranks: RefCell::new(HashMap::new()),
            })
            .collect()
    }
}

/// One PE's endpoint in a [`LocalFabric`].
pub struct LocalTransport {
    rank: i32,
    numpe: i32,
    /// The id this PE stamps on outgoing packets: the real rank, or the
    /// virtual rank once registered.
    wire_id: Cell<i32>,
    senders: Vec<Sender<Packet>>,
    receiver: Receiver<Packet>,
    next_tag: Cell<i32>,
    /// Packets that arrived ahead of the exchange expecting them.
    staged: RefCell<HashMap<(i32, i32), VecDeque<Payload>>>,
    /// Virtual-to-real rank map; empty until registration.
    vranks: RefCell<HashMap<i32, i32>>,
}

impl LocalTransport {
    /// This endpoint's real rank.
    pub fn rank(&self) -> i32 {
        self.rank
    }

    /// Number of PEs in the fabric.
    pub fn numpe(&self) -> i32 {
        self.numpe
    }

    fn fresh_tag(&self) -> i32 {
        let mut t = self.next_tag.get();
        if t >= MAX_TAG {
            t = 1;
        }
        self.next_tag.set(t + 1);
        t
    }

    /// Map a peer id from a neighbor descriptor to a real channel index.
    fn translate(&self, pe: i32) -> Result<usize> {
        let vranks = self.vranks.borrow();
        let real = if vranks.is_empty() {
            pe
        } else {
            *vranks
                .get(&pe)
                .ok_or_else(|| anyhow!("unknown virtual rank {pe}"))?
        };
        if real < 0 || real >= self.numpe {
            bail!("peer rank {real} outside fabric of {} PEs", self.numpe);
        }
        Ok(real as usize)
    }

    /// Register this PE's virtual rank via an all-gather on tag 0.
    ///
    /// Collective: every PE in the fabric must call this before any
    /// further exchange. Afterwards neighbor descriptors address peers
    /// by virtual id.
    pub fn register_virtual_rank(&self, vrank: i32) -> Result<()> {
        for peer in 0..self.numpe {
            if peer != self.rank {
                self.senders[peer as usize]
                    .send(Packet {
                        src: self.rank,
                        tag: 0,
                        payload: Payload::Ints(vec![vrank]),
                    })
                    .map_err(|_| anyhow!("fabric peer {peer} is gone"))?;
            }
        }
        let mut vranks = self.vranks.borrow_mut();
        vranks.insert(vrank, self.rank);
        for _ in 0..self.numpe - 1 {
            let (src, payload) = self.await_tag0()?;
            let data = <i32 as WireScalar>::unwrap_payload(payload)?;
            vranks.insert(data[0], src);
        }
        self.wire_id.set(vrank);
        Ok(())
    }

    fn await_tag0(&self) -> Result<(i32, Payload)> {
        {
            let mut staged = self.staged.borrow_mut();
            let key = staged.keys().find(|&&(_, tag)| tag == 0).copied();
            if let Some(key) = key {
                let q = staged.get_mut(&key).expect("staged key");
                let payload = q.pop_front().expect("staged payload");
                if q.is_empty() {
                    staged.remove(&key);
                }
                return Ok((key.0, payload));
            }
        }
        loop {
            let pkt = self
                .receiver
                .recv()
                .map_err(|_| anyhow!("fabric disconnected during rank registration"))?;
            if pkt.tag == 0 {
                return Ok((pkt.src, pkt.payload));
            }
            self.stage(pkt);
        }
    }

    fn stage(&self, pkt: Packet) {
        self.staged
            .borrow_mut()
            .entry((pkt.src, pkt.tag))
            .or_default()
            .push_back(pkt.payload);
    }

    /// Wait for the packet from `src` (as named on the wire) with `tag`.
    fn await_packet(&self, src: i32, tag: i32) -> Result<Payload> {
        if let Some(q) = self.staged.borrow_mut().get_mut(&(src, tag)) {
            if let Some(p) = q.pop_front() {
                return Ok(p);
            }
        }
        loop {
            let pkt = self
                .receiver
                .recv()
                .map_err(|_| anyhow!("fabric disconnected while awaiting pe {src} tag {tag}"))?;
            if pkt.src == src && pkt.tag == tag {
                return Ok(pkt.payload);
            }
            self.stage(pkt);
        }
    }

    fn exchange_impl<B: WireScalar>(
        &self,
        send_remotes: &[Remote],
        send_buf: &[B],
        recv_remotes: &[Remote],
        recv_buf: &mut [B],
    ) -> Result<()> {
        let tag = self.fresh_tag();
        for r in send_remotes {
            let dest = self.translate(r.pe)?;
            let span = send_buf[r.offset..r.offset + r.len].to_vec();
            self.senders[dest]
                .send(Packet {
                    src: self.wire_id.get(),
                    tag,
                    payload: B::wrap(span),
                })
                .map_err(|_| anyhow!("fabric peer {} is gone", r.pe))?;
        }
        for r in recv_remotes {
            let data = B::unwrap_payload(self.await_packet(r.pe, tag)?)?;
            if data.len() != r.len {
                bail!(
                    "exchange length mismatch from pe {}: got {}, expected {}",
                    r.pe,
                    data.len(),
                    r.len
                );
            }
            recv_buf[r.offset..r.offset + r.len].copy_from_slice(&data);
        }
        Ok(())
    }
}

impl Transport for LocalTransport {
    fn exchange_ints(&self, sends: &Buffers<i32>, recvs: &mut Buffers<i32>) -> Result<()> {
        let recv_remotes = recvs.remotes.clone();
        self.exchange_impl(&sends.remotes, &sends.buf, &recv_remotes, &mut recvs.buf)
    }
    fn exchange_dbls(&self, sends: &Buffers<f64>, recvs: &mut Buffers<f64>) -> Result<()> {
        let recv_remotes = recvs.remotes.clone();
        self.exchange_impl(&sends.remotes, &sends.buf, &recv_remotes, &mut recvs.buf)
    }
    fn exchange_vec3s(&self, sends: &Buffers<Vec3>, recvs: &mut Buffers<Vec3>) -> Result<()> {
        let recv_remotes = recvs.remotes.clone();
        self.exchange_impl(&sends.remotes, &sends.buf, &recv_remotes, &mut recvs.buf)
    }
    fn id(&self) -> i32 {
        self.rank
    }
    fn stop(&self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::comm::{Neighbor, Op};
    use std::thread;

    #[test]
    fn two_rank_exchange_moves_spans() {
        let mut fabric = LocalFabric::new(2);
        let t1 = fabric.pop().unwrap();
        let t0 = fabric.pop().unwrap();

        let h = thread::spawn(move || {
            // Rank 1 receives three ints from rank 0.
            let sends: Buffers<i32> = Buffers::new(&Vec::new());
            let mut recvs: Buffers<i32> =
                Buffers::new(&vec![Neighbor { pe: 0, elements: vec![0, 1, 2] }]);
            t1.exchange_ints(&sends, &mut recvs).unwrap();
            let mut field = vec![0i32; 3];
            recvs.unpack(&mut field, Op::Overwrite);
            field
        });

        let mut sends: Buffers<i32> =
            Buffers::new(&vec![Neighbor { pe: 1, elements: vec![2, 0, 1] }]);
        sends.pack(&[10, 20, 30]);
        let mut recvs: Buffers<i32> = Buffers::new(&Vec::new());
        t0.exchange_ints(&sends, &mut recvs).unwrap();

        assert_eq!(h.join().unwrap(), vec![30, 10, 20]);
    }

    #[test]
    fn virtual_ranks_translate_on_the_wire() {
        let mut fabric = LocalFabric::new(2);
        let t1 = fabric.pop().unwrap();
        let t0 = fabric.pop().unwrap();

        // Swap ids: real rank 0 is virtual 7, real rank 1 is virtual 3.
        let h = thread::spawn(move || {
            t1.register_virtual_rank(3).unwrap();
            let mut sends: Buffers<f64> =
                Buffers::new(&vec![Neighbor { pe: 7, elements: vec![0] }]);
            sends.pack(&[2.5]);
            let mut recvs: Buffers<f64> = Buffers::new(&Vec::new());
            t1.exchange_dbls(&sends, &mut recvs).unwrap();
        });

        t0.register_virtual_rank(7).unwrap();
        let sends: Buffers<f64> = Buffers::new(&Vec::new());
        let mut recvs: Buffers<f64> = Buffers::new(&vec![Neighbor { pe: 3, elements: vec![0] }]);
        t0.exchange_dbls(&sends, &mut recvs).unwrap();
        let mut field = vec![0.0];
        recvs.unpack(&mut field, Op::Overwrite);
        assert_eq!(field, vec![2.5]);
        h.join().unwrap();
    }
}
