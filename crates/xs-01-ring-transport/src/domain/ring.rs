//! # Ring View and Chunk Arithmetic
//!
//! A `RingView` borrows one ring's buffer and its two indices. The same view
//! type serves both directions: the store produces on the response ring and
//! consumes on the request ring, and a guest does the opposite.
//!
//! ## Full/Empty Convention
//!
//! Indices are free-running `u32` counters so `prod - cons == RING_CAPACITY`
//! is distinguishable from empty. The producer nevertheless keeps one slot
//! free and never publishes a window of exactly `RING_CAPACITY`; the consumer
//! accepts any window up to `RING_CAPACITY` so a guest that fills the ring
//! completely is still served.

use crate::domain::errors::RingError;
use crate::domain::interface::{mask_idx, RingIdx, RING_CAPACITY};
use std::sync::atomic::{fence, AtomicU32, AtomicU8, Ordering};

/// Most bytes a producer keeps in flight.
pub const PRODUCER_LIMIT: usize = RING_CAPACITY - 1;

/// A validated `(cons, prod)` snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RingIndexes {
    pub cons: RingIdx,
    pub prod: RingIdx,
}

impl RingIndexes {
    /// Validate `0 <= prod - cons <= RING_CAPACITY`.
    pub fn checked(cons: RingIdx, prod: RingIdx) -> Result<Self, RingError> {
        if prod.wrapping_sub(cons) as usize > RING_CAPACITY {
            return Err(RingError::Corrupted { cons, prod });
        }
        Ok(Self { cons, prod })
    }

    /// Bytes currently queued.
    pub fn used(&self) -> usize {
        self.prod.wrapping_sub(self.cons) as usize
    }

    /// Offset and length of the contiguous free run starting at `prod`.
    ///
    /// Bounded by the physical end of the buffer and by the reserved slot.
    pub fn output_chunk(&self) -> (usize, usize) {
        let start = mask_idx(self.prod);
        let to_wrap = RING_CAPACITY - start;
        let free = PRODUCER_LIMIT.saturating_sub(self.used());
        (start, to_wrap.min(free))
    }

    /// Offset and length of the contiguous queued run starting at `cons`.
    pub fn input_chunk(&self) -> (usize, usize) {
        let start = mask_idx(self.cons);
        let to_wrap = RING_CAPACITY - start;
        (start, to_wrap.min(self.used()))
    }
}

/// Borrowed view over a single ring.
#[derive(Clone, Copy)]
pub struct RingView<'a> {
    buf: &'a [AtomicU8; RING_CAPACITY],
    cons: &'a AtomicU32,
    prod: &'a AtomicU32,
}

impl<'a> RingView<'a> {
    pub(crate) fn new(
        buf: &'a [AtomicU8; RING_CAPACITY],
        cons: &'a AtomicU32,
        prod: &'a AtomicU32,
    ) -> Self {
        Self { buf, cons, prod }
    }

    /// Load both indices once, then fence, then validate.
    ///
    /// Nothing read from the buffer afterwards may be observed as older than
    /// the indices that describe it.
    pub fn indexes(&self) -> Result<RingIndexes, RingError> {
        let cons = self.cons.load(Ordering::Relaxed);
        let prod = self.prod.load(Ordering::Relaxed);
        fence(Ordering::Acquire);
        RingIndexes::checked(cons, prod)
    }

    /// Copy as much of `data` as fits into the next contiguous free run and
    /// publish the new producer index.
    ///
    /// Returns the number of bytes accepted, possibly zero.
    pub fn produce(&self, data: &[u8]) -> Result<usize, RingError> {
        let idx = self.indexes()?;
        let (start, avail) = idx.output_chunk();
        let len = data.len().min(avail);

        for (slot, byte) in self.buf[start..start + len].iter().zip(&data[..len]) {
            slot.store(*byte, Ordering::Relaxed);
        }

        fence(Ordering::Release);
        self.prod
            .store(idx.prod.wrapping_add(len as RingIdx), Ordering::Relaxed);
        Ok(len)
    }

    /// Copy the next contiguous queued run into `out` and publish the new
    /// consumer index.
    ///
    /// Returns the number of bytes received, possibly zero.
    pub fn consume(&self, out: &mut [u8]) -> Result<usize, RingError> {
        let idx = self.indexes()?;
        let (start, avail) = idx.input_chunk();
        let len = out.len().min(avail);

        for (dst, slot) in out[..len].iter_mut().zip(&self.buf[start..start + len]) {
            *dst = slot.load(Ordering::Relaxed);
        }

        fence(Ordering::Release);
        self.cons
            .store(idx.cons.wrapping_add(len as RingIdx), Ordering::Relaxed);
        Ok(len)
    }

    /// Raw consumer index cell, for driving a hostile peer in tests.
    #[cfg(any(test, feature = "test-utils"))]
    pub fn cons_cell(&self) -> &'a AtomicU32 {
        self.cons
    }

    /// Raw producer index cell, for driving a hostile peer in tests.
    #[cfg(any(test, feature = "test-utils"))]
    pub fn prod_cell(&self) -> &'a AtomicU32 {
        self.prod
    }

    /// Whether the consumer has anything to read. Unvalidated.
    pub fn has_data(&self) -> bool {
        self.cons.load(Ordering::Relaxed) != self.prod.load(Ordering::Relaxed)
    }

    /// Whether a producer would be refused all bytes right now.
    ///
    /// A corrupted window is not full: the next `produce` must get to see it
    /// and report it.
    pub fn is_full(&self) -> bool {
        let used = self
            .prod
            .load(Ordering::Relaxed)
            .wrapping_sub(self.cons.load(Ordering::Relaxed)) as usize;
        (PRODUCER_LIMIT..=RING_CAPACITY).contains(&used)
    }
}

impl std::fmt::Debug for RingView<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RingView")
            .field("cons", &self.cons.load(Ordering::Relaxed))
            .field("prod", &self.prod.load(Ordering::Relaxed))
            .finish()
    }
}
