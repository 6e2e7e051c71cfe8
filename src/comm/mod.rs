//! Communication between mesh partitions.
//!
//! The layer has three pieces:
//!
//! - [`Neighbor`] descriptors: for each remote PE, the ordered list of
//!   local entity indices taking part in an exchange. Element order
//!   defines the wire order.
//! - [`Buffers`]: the aggregation of a whole neighbor list into a single
//!   contiguous wire buffer, so pack/unpack is a pure map over a
//!   buffer-to-entity index table.
//! - [`Transport`]: the low-level message mover. The trait is the seam
//!   where MPI, shared memory, or any other fabric would plug in; this
//!   crate ships [`DummyTransport`] for single-rank drivers and, behind
//!   the `local-fabric` feature, an in-process channel fabric for
//!   multi-rank runs inside one OS process.

mod buffers;
mod neighbors;
mod transport;

#[cfg(feature = "local-fabric")]
mod fabric;

pub use buffers::{Buffers, CommElem, Op, Remote};
pub use neighbors::{read_neighbors, write_neighbors, Neighbor, Neighbors};
pub use transport::{DummyTransport, Transport, MAX_TAG};

#[cfg(feature = "local-fabric")]
pub use fabric::{LocalFabric, LocalTransport};
