//! `BoundedResource` (spec §4.8, §9 "inheritance / virtual resource"): a
//! fallible allocation sink with an atomically mutable byte limit.
//!
//! The C++ original extends an "upstream resource" base class; per §9 we
//! model the same shape as a trait (`Upstream`) the bounded resource holds
//! an owning handle to, so a caller can swap in a tracking/no-op/testing
//! upstream without the bounded accounting logic changing.

use std::sync::atomic::{AtomicU64, Ordering};

/// An allocation sink a [`BoundedResource`] draws from once its own
/// reservation succeeds. `System` is the only implementation the core
/// ships; tests substitute a failing upstream to exercise the
/// self-disable path.
pub trait Upstream: std::fmt::Debug + Send + Sync {
    /// Attempt to actually back `bytes` of the reservation. `false` means
    /// the upstream refuses (OOM); the caller must revert its reservation.
    fn try_reserve(&self, bytes: u64) -> bool;
    /// Release a previously-reserved amount back to the upstream.
    fn release(&self, bytes: u64);
}

/// An upstream that always succeeds (the process allocator is assumed to
/// have effectively unlimited headroom relative to the bounded resource's
/// own limit).
#[derive(Debug, Default)]
pub struct SystemUpstream;

impl Upstream for SystemUpstream {
    fn try_reserve(&self, _bytes: u64) -> bool {
        true
    }
    fn release(&self, _bytes: u64) {}
}

/// A fallible allocation sink with an atomically mutable `limit_bytes` (`0`
/// = unlimited) and a live `allocated_bytes` counter (spec §3's
/// `BoundedResource`).
#[derive(Debug)]
pub struct BoundedResource {
    limit_bytes: AtomicU64,
    allocated_bytes: AtomicU64,
    upstream: Box<dyn Upstream>,
}

impl Default for BoundedResource {
    fn default() -> Self {
        Self::new(Box::new(SystemUpstream))
    }
}

impl BoundedResource {
    /// Build an unlimited bounded resource over `upstream`.
    #[must_use]
    pub fn new(upstream: Box<dyn Upstream>) -> Self {
        Self {
            limit_bytes: AtomicU64::new(0),
            allocated_bytes: AtomicU64::new(0),
            upstream,
        }
    }

    /// Current limit; `0` means unlimited.
    #[must_use]
    pub fn limit(&self) -> u64 {
        self.limit_bytes.load(Ordering::SeqCst)
    }

    /// Currently reserved bytes.
    #[must_use]
    pub fn allocated(&self) -> u64 {
        self.allocated_bytes.load(Ordering::SeqCst)
    }

    /// Bytes still available under the current limit; `u64::MAX` when
    /// unlimited.
    #[must_use]
    pub fn remaining(&self) -> u64 {
        let limit = self.limit();
        if limit == 0 {
            return u64::MAX;
        }
        limit.saturating_sub(self.allocated())
    }

    /// Set a new limit. Never reduces below `allocated_bytes` (spec §4.8):
    /// the effective new limit is `max(n, allocated_bytes)`.
    pub fn set_limit(&self, n: u64) {
        let floor = self.allocated();
        self.limit_bytes.store(n.max(floor), Ordering::SeqCst);
    }

    /// Reserve `bytes`: first an atomic compare-and-swap against the local
    /// limit, then a call into the upstream; on upstream failure the local
    /// reservation is reverted and `false` is returned.
    pub fn allocate(&self, bytes: u64) -> bool {
        loop {
            let current = self.allocated_bytes.load(Ordering::SeqCst);
            let limit = self.limit();
            let Some(next) = current.checked_add(bytes) else {
                return false;
            };
            if limit != 0 && next > limit {
                return false;
            }
            if self
                .allocated_bytes
                .compare_exchange(current, next, Ordering::SeqCst, Ordering::SeqCst)
                .is_ok()
            {
                break;
            }
        }
        if self.upstream.try_reserve(bytes) {
            true
        } else {
            self.allocated_bytes.fetch_sub(bytes, Ordering::SeqCst);
            false
        }
    }

    /// Release a previously-allocated reservation.
    pub fn deallocate(&self, bytes: u64) {
        self.allocated_bytes.fetch_sub(bytes, Ordering::SeqCst);
        self.upstream.release(bytes);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default)]
    struct FailingUpstream;
    impl Upstream for FailingUpstream {
        fn try_reserve(&self, _bytes: u64) -> bool {
            false
        }
        fn release(&self, _bytes: u64) {}
    }

    #[test]
    fn unlimited_by_default() {
        let r = BoundedResource::default();
        assert_eq!(r.remaining(), u64::MAX);
        assert!(r.allocate(1_000_000));
    }

    #[test]
    fn set_limit_enforces_subsequent_allocations() {
        let r = BoundedResource::default();
        r.set_limit(100);
        assert!(r.allocate(100));
        assert!(!r.allocate(1));
        r.deallocate(100);
        assert!(r.allocate(100));
    }

    #[test]
    fn set_limit_never_drops_below_allocated() {
        let r = BoundedResource::default();
        r.set_limit(1000);
        assert!(r.allocate(500));
        r.set_limit(10);
        assert_eq!(r.limit(), 500);
    }

    #[test]
    fn upstream_failure_reverts_local_reservation() {
        let r = BoundedResource::new(Box::new(FailingUpstream));
        assert!(!r.allocate(10));
        assert_eq!(r.allocated(), 0);
    }
}
