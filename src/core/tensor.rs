//! Tensor ownership and the memory ledger.
//!
//! Every [`Tensor`] carries a lease on the [`MemoryLedger`] that created it. The
//! lease is returned exactly once, when the tensor is dropped or consumed by
//! [`Tensor::release`]. Tensors are move-only, so releasing twice or reading a
//! released tensor does not compile.
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use ndarray::{ArrayD, ArrayViewD, Axis, IxDyn};
use serde::Serialize;
use tracing::{debug, warn};

use crate::models::BackendError;
use crate::types::Stage;

#[derive(Debug, Default)]
struct LedgerState {
    allocations: AtomicU64,
    releases: AtomicU64,
    live_bytes: AtomicU64,
    peak_bytes: AtomicU64,
}

impl LedgerState {
    fn allocate(&self, bytes: u64) {
        self.allocations.fetch_add(1, Ordering::Relaxed);
        let live = self.live_bytes.fetch_add(bytes, Ordering::Relaxed) + bytes;
        self.peak_bytes.fetch_max(live, Ordering::Relaxed);
    }

    fn release(&self, bytes: u64) {
        self.releases.fetch_add(1, Ordering::Relaxed);
        self.live_bytes.fetch_sub(bytes, Ordering::Relaxed);
    }
}

/// Point-in-time view of the ledger counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct MemorySnapshot {
    pub allocations: u64,
    pub releases: u64,
    pub live_bytes: u64,
    pub peak_bytes: u64,
}

impl MemorySnapshot {
    pub fn live_tensors(&self) -> u64 {
        self.allocations.saturating_sub(self.releases)
    }

    pub fn is_balanced(&self) -> bool {
        self.allocations == self.releases
    }
}

/// Counts tensor allocations and releases for one engine context.
#[derive(Debug, Clone, Default)]
pub struct MemoryLedger {
    state: Arc<LedgerState>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take ownership of `data` and register it as a live tensor.
    pub fn track(&self, data: ArrayD<f32>) -> Tensor {
        let bytes = (data.len() * std::mem::size_of::<f32>()) as u64;
        self.state.allocate(bytes);
        Tensor {
            data,
            lease: Lease {
                state: Arc::clone(&self.state),
                bytes,
            },
        }
    }

    pub fn from_shape_vec(&self, shape: &[usize], data: Vec<f32>) -> Result<Tensor, BackendError> {
        let array = ArrayD::from_shape_vec(IxDyn(shape), data)
            .map_err(|e| BackendError::Shape(e.to_string()))?;
        Ok(self.track(array))
    }

    pub fn zeros(&self, shape: &[usize]) -> Tensor {
        self.track(ArrayD::zeros(IxDyn(shape)))
    }

    pub fn snapshot(&self) -> MemorySnapshot {
        MemorySnapshot {
            allocations: self.state.allocations.load(Ordering::Relaxed),
            releases: self.state.releases.load(Ordering::Relaxed),
            live_bytes: self.state.live_bytes.load(Ordering::Relaxed),
            peak_bytes: self.state.peak_bytes.load(Ordering::Relaxed),
        }
    }

    /// Run one pipeline stage. Anything the stage allocates is dropped when the
    /// closure returns, on every exit path; only the returned tensor survives.
    /// A stage that leaves other tensors alive is reported.
    pub fn tidy<E, F>(&self, stage: Stage, f: F) -> Result<Tensor, E>
    where
        F: FnOnce(&MemoryLedger) -> Result<Tensor, E>,
    {
        let before = self.snapshot();
        let out = f(self);
        let after = self.snapshot();

        let kept = u64::from(out.is_ok());
        let grown = after.live_tensors().saturating_sub(before.live_tensors());
        if grown > kept {
            warn!(
                stage = %stage,
                leaked = grown - kept,
                "stage left tensors alive beyond its output"
            );
        } else {
            debug!(
                stage = %stage,
                allocated = after.allocations - before.allocations,
                "stage scope closed"
            );
        }
        out
    }
}

struct Lease {
    state: Arc<LedgerState>,
    bytes: u64,
}

impl Drop for Lease {
    fn drop(&mut self) {
        self.state.release(self.bytes);
    }
}

/// An `f32` tensor owned by exactly one holder.
pub struct Tensor {
    data: ArrayD<f32>,
    lease: Lease,
}

impl Tensor {
    pub fn shape(&self) -> &[usize] {
        self.data.shape()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn size_bytes(&self) -> u64 {
        self.lease.bytes
    }

    pub fn view(&self) -> ArrayViewD<'_, f32> {
        self.data.view()
    }

    pub fn array(&self) -> &ArrayD<f32> {
        &self.data
    }

    /// Copy of the values in logical (row-major) order.
    pub fn to_vec(&self) -> Vec<f32> {
        self.data.iter().copied().collect()
    }

    /// Drop the leading batch dimension of size 1. Reuses the same storage and lease.
    pub fn squeeze_batch(self) -> Result<Tensor, BackendError> {
        match self.data.shape().first() {
            Some(&1) if self.data.ndim() > 1 => {}
            _ => {
                return Err(BackendError::Shape(format!(
                    "expected a leading batch dimension of 1, got {:?}",
                    self.data.shape()
                )));
            }
        }
        let Tensor { data, lease } = self;
        Ok(Tensor {
            data: data.index_axis_move(Axis(0), 0),
            lease,
        })
    }

    /// Give the tensor back to the ledger.
    pub fn release(self) {
        drop(self);
    }
}

impl std::fmt::Debug for Tensor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tensor")
            .field("shape", &self.data.shape())
            .field("bytes", &self.lease.bytes)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drop_and_release_are_counted_once() {
        let ledger = MemoryLedger::new();
        let a = ledger.zeros(&[1, 1, 1, 100]);
        let b = ledger.zeros(&[2, 2]);
        assert_eq!(ledger.snapshot().live_tensors(), 2);
        assert_eq!(ledger.snapshot().live_bytes, 416);

        a.release();
        drop(b);

        let snap = ledger.snapshot();
        assert!(snap.is_balanced());
        assert_eq!(snap.allocations, 2);
        assert_eq!(snap.live_bytes, 0);
        assert_eq!(snap.peak_bytes, 416);
    }

    #[test]
    fn squeeze_keeps_the_lease() {
        let ledger = MemoryLedger::new();
        let t = ledger.zeros(&[1, 4, 5, 3]);
        let squeezed = t.squeeze_batch().unwrap();
        assert_eq!(squeezed.shape(), &[4, 5, 3]);
        assert_eq!(ledger.snapshot().allocations, 1);
        drop(squeezed);
        assert!(ledger.snapshot().is_balanced());
    }

    #[test]
    fn squeeze_rejects_real_batches() {
        let ledger = MemoryLedger::new();
        let t = ledger.zeros(&[2, 4, 4, 3]);
        assert!(t.squeeze_batch().is_err());
        // the failed squeeze consumed and released the tensor
        assert!(ledger.snapshot().is_balanced());
    }

    #[test]
    fn tidy_releases_intermediates_on_error() {
        let ledger = MemoryLedger::new();
        let result: Result<Tensor, BackendError> = ledger.tidy(Stage::Blend, |l| {
            let _scratch = l.zeros(&[10]);
            Err(BackendError::Runtime("boom".into()))
        });
        assert!(result.is_err());
        assert!(ledger.snapshot().is_balanced());
    }

    #[test]
    fn tidy_keeps_only_the_output() {
        let ledger = MemoryLedger::new();
        let out: Result<Tensor, BackendError> = ledger.tidy(Stage::EncodeStyle, |l| {
            let input = l.zeros(&[1, 8, 8, 3]);
            let out = l.zeros(&[1, 1, 1, 100]);
            input.release();
            Ok(out)
        });
        assert_eq!(ledger.snapshot().live_tensors(), 1);
        drop(out);
        assert!(ledger.snapshot().is_balanced());
    }

    #[test]
    fn from_shape_vec_checks_length() {
        let ledger = MemoryLedger::new();
        assert!(ledger.from_shape_vec(&[2, 2], vec![1.0; 3]).is_err());
        assert_eq!(ledger.snapshot().allocations, 0);
    }
}
