//! Runtime substrate (spec §4.8): the bounded allocator, memory governor,
//! optional memory ballast, sharded result cache, and thread-local progress
//! prefix that keep long searches stable under memory pressure.
//!
//! Per spec §9 "Global mutable state", the C++ original's process-wide
//! singletons (epoch counter, OOM-reported flag, governor, default bounded
//! resource) are modeled here as a single owned [`RuntimeContext`] the
//! driver constructs once and threads through every engine, rather than as
//! `static`s — idiomatic Rust has no need for the singleton indirection the
//! original used to work around C++'s lack of an obvious "owned by the
//! driver" home for this state.

pub mod ballast;
pub mod bounded_resource;
pub mod cache;
pub mod governor;
pub mod progress;

use std::sync::atomic::{AtomicU64, Ordering};

use bounded_resource::BoundedResource;
use governor::MemoryGovernor;

/// Owned runtime state for one driver invocation (spec §9's collapsed
/// singleton set), shared by reference across every engine/worker it spawns.
#[derive(Debug, Default)]
pub struct RuntimeContext {
    /// The default allocation sink searches and caches reserve against.
    pub bounded_resource: BoundedResource,
    /// Memory-pressure sampling and hysteresis.
    pub governor: MemoryGovernor,
    /// Monotonic run-epoch counter, incremented once per driver invocation;
    /// lets long-lived caches distinguish stale entries across runs.
    epoch: AtomicU64,
    /// Set once the first `[OOM]` self-disable has been reported, so later
    /// ones stay silent (spec §7: "a single `[OOM]` report").
    oom_reported: std::sync::atomic::AtomicBool,
}

impl RuntimeContext {
    /// A fresh context with an unlimited bounded resource and a disabled
    /// governor; callers opt into limits via `bounded_resource.set_limit`
    /// and `governor.enable`.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance and return the new run epoch.
    pub fn next_epoch(&self) -> u64 {
        self.epoch.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Report an OOM self-disable event exactly once; returns `true` the
    /// first time it's called (the caller should log then), `false` on
    /// every subsequent call.
    pub fn report_oom_once(&self) -> bool {
        self.oom_reported
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }
}
