//! # Shared Page Layout
//!
//! The page shared with a guest holds two unidirectional byte rings and
//! their free-running indices:
//!
//! ```text
//! offset 0      req[RING_CAPACITY]   guest -> store
//! offset 1024   rsp[RING_CAPACITY]   store -> guest
//! offset 2048   req_cons  (store writes)
//! offset 2052   req_prod  (guest writes)
//! offset 2056   rsp_cons  (guest writes)
//! offset 2060   rsp_prod  (store writes)
//! ```
//!
//! Every field is an atomic so that the guest's concurrent stores are never
//! undefined behaviour on our side; the byte atomics have the same size and
//! alignment as `u8`, preserving the guest ABI.

use crate::domain::ring::RingView;
use std::sync::atomic::{AtomicU32, AtomicU8, Ordering};

/// Size of each ring in bytes. Must be a power of two.
pub const RING_CAPACITY: usize = 1024;

/// Size of the shared page.
pub const PAGE_SIZE: usize = 4096;

/// Free-running ring index. Only differences are meaningful.
pub type RingIdx = u32;

/// Reduce a free-running index to a buffer offset.
#[inline]
pub const fn mask_idx(idx: RingIdx) -> usize {
    (idx as usize) & (RING_CAPACITY - 1)
}

const _: () = assert!(RING_CAPACITY.is_power_of_two());
const _: () = assert!(std::mem::size_of::<RingInterface>() <= PAGE_SIZE);

/// View over one domain's shared page.
#[repr(C)]
pub struct RingInterface {
    req: [AtomicU8; RING_CAPACITY],
    rsp: [AtomicU8; RING_CAPACITY],
    req_cons: AtomicU32,
    req_prod: AtomicU32,
    rsp_cons: AtomicU32,
    rsp_prod: AtomicU32,
}

impl RingInterface {
    /// A zeroed interface, as found on a freshly granted page.
    pub fn new() -> Self {
        Self {
            req: std::array::from_fn(|_| AtomicU8::new(0)),
            rsp: std::array::from_fn(|_| AtomicU8::new(0)),
            req_cons: AtomicU32::new(0),
            req_prod: AtomicU32::new(0),
            rsp_cons: AtomicU32::new(0),
            rsp_prod: AtomicU32::new(0),
        }
    }

    /// Guest-to-store ring. The store is the consumer.
    pub fn request_ring(&self) -> RingView<'_> {
        RingView::new(&self.req, &self.req_cons, &self.req_prod)
    }

    /// Store-to-guest ring. The store is the producer.
    pub fn response_ring(&self) -> RingView<'_> {
        RingView::new(&self.rsp, &self.rsp_cons, &self.rsp_prod)
    }

    /// Zero all four indices.
    ///
    /// Used when a domain is (re-)introduced; any bytes still in flight are
    /// abandoned.
    pub fn reset_indexes(&self) {
        self.req_cons.store(0, Ordering::Relaxed);
        self.req_prod.store(0, Ordering::Relaxed);
        self.rsp_cons.store(0, Ordering::Relaxed);
        self.rsp_prod.store(0, Ordering::Relaxed);
        std::sync::atomic::fence(Ordering::Release);
    }

    /// Raw snapshot `(req_cons, req_prod, rsp_cons, rsp_prod)`.
    pub fn raw_indexes(&self) -> (RingIdx, RingIdx, RingIdx, RingIdx) {
        (
            self.req_cons.load(Ordering::Relaxed),
            self.req_prod.load(Ordering::Relaxed),
            self.rsp_cons.load(Ordering::Relaxed),
            self.rsp_prod.load(Ordering::Relaxed),
        )
    }
}

impl Default for RingInterface {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for RingInterface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let (req_cons, req_prod, rsp_cons, rsp_prod) = self.raw_indexes();
        f.debug_struct("RingInterface")
            .field("req_cons", &req_cons)
            .field("req_prod", &req_prod)
            .field("rsp_cons", &rsp_cons)
            .field("rsp_prod", &rsp_prod)
            .finish()
    }
}
