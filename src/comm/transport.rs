//! The message transport seam.

use super::buffers::Buffers;
use crate::vec3::Vec3;
use anyhow::Result;

/// Upper bound (exclusive) for exchange message tags.
///
/// Hard-coded rather than queried from the fabric: the original MPI
/// binding found the advertised tag bound inconsistent across ranks.
/// Tags rotate through `[1, MAX_TAG)`; because a PE has at most one
/// exchange in flight, reuse after wraparound is safe. Tag 0 is reserved
/// for fabric-internal traffic.
pub const MAX_TAG: i32 = 32000;

/// Low-level mover of aggregated exchange buffers.
///
/// The buffers associate wire data with entity fields; an implementation
/// only has to move bytes. Semantics of one `exchange_*` call: post a
/// non-blocking receive for every entry in `recvs.remotes`, post a
/// non-blocking send for every entry in `sends.remotes` under the same
/// fresh tag, then block until the whole batch completes. Exchanges on
/// one PE are linearized by invocation order; each uses a fresh tag, so
/// no cross-exchange reordering is possible.
///
/// A failed exchange is fatal to the run: implementations return an
/// error (or call [`Transport::abort`]) and callers do not attempt
/// recovery.
pub trait Transport {
    /// Exchange integer field elements.
    fn exchange_ints(&self, sends: &Buffers<i32>, recvs: &mut Buffers<i32>) -> Result<()>;

    /// Exchange double-precision field elements.
    fn exchange_dbls(&self, sends: &Buffers<f64>, recvs: &mut Buffers<f64>) -> Result<()>;

    /// Exchange 3-vector field elements.
    fn exchange_vec3s(&self, sends: &Buffers<Vec3>, recvs: &mut Buffers<Vec3>) -> Result<()>;

    /// Some identifier for this node in the transport graph.
    fn id(&self) -> i32 {
        -1
    }

    /// Release transport resources.
    fn stop(&self) -> Result<()>;

    /// Terminate the process with a diagnostic.
    fn abort(&self, message: &str) -> ! {
        eprintln!("Transport::abort: {message}");
        std::process::abort();
    }
}

/// A null transport for single-rank drivers: every exchange silently
/// succeeds without moving anything.
pub struct DummyTransport;

impl DummyTransport {
    pub fn new() -> Self {
        tracing::warn!(
            "dummy transport instantiated: all communications will silently succeed without \
             moving data"
        );
        DummyTransport
    }
}

impl Default for DummyTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for DummyTransport {
    fn exchange_ints(&self, _sends: &Buffers<i32>, _recvs: &mut Buffers<i32>) -> Result<()> {
        Ok(())
    }
    fn exchange_dbls(&self, _sends: &Buffers<f64>, _recvs: &mut Buffers<f64>) -> Result<()> {
        Ok(())
    }
    fn exchange_vec3s(&self, _sends: &Buffers<Vec3>, _recvs: &mut Buffers<Vec3>) -> Result<()> {
        Ok(())
    }
    fn stop(&self) -> Result<()> {
        Ok(())
    }
}
