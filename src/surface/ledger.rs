//! Live and peak accounting of surface memory
//!
//! Every [`Surface`](crate::surface::buffer::Surface) holds a [`SurfaceLease`]
//! for the bytes of its pixel buffer. The lease is returned when the surface
//! is released or dropped, on success and error paths alike.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Shared counter of bytes held by live surfaces
#[derive(Debug, Default)]
pub struct SurfaceLedger {
    live: AtomicUsize,
    peak: AtomicUsize,
    acquisitions: AtomicUsize,
}

impl SurfaceLedger {
    /// Create an empty ledger
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Record an allocation of `bytes` and return its lease
    pub fn acquire(self: &Arc<Self>, bytes: usize) -> SurfaceLease {
        let live = self.live.fetch_add(bytes, Ordering::AcqRel) + bytes;
        self.peak.fetch_max(live, Ordering::AcqRel);
        self.acquisitions.fetch_add(1, Ordering::Relaxed);
        SurfaceLease {
            ledger: Arc::clone(self),
            bytes,
        }
    }

    /// Bytes currently held by live surfaces
    pub fn live_bytes(&self) -> usize {
        self.live.load(Ordering::Acquire)
    }

    /// Highest simultaneous byte count observed
    pub fn peak_bytes(&self) -> usize {
        self.peak.load(Ordering::Acquire)
    }

    /// Number of surfaces ever acquired through this ledger
    pub fn acquisitions(&self) -> usize {
        self.acquisitions.load(Ordering::Relaxed)
    }
}

/// Claim on ledger bytes, returned on drop
#[derive(Debug)]
pub struct SurfaceLease {
    ledger: Arc<SurfaceLedger>,
    bytes: usize,
}

impl SurfaceLease {
    /// Bytes covered by this lease
    pub const fn bytes(&self) -> usize {
        self.bytes
    }
}

impl Drop for SurfaceLease {
    fn drop(&mut self) {
        self.ledger.live.fetch_sub(self.bytes, Ordering::AcqRel);
    }
}
