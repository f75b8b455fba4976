//! `MemoryGovernor` (spec §4.8): rate-limited system-memory sampling with
//! hysteresis, used to flip a `pressure` flag that caches and the search
//! engine consult before growing.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use super::bounded_resource::BoundedResource;

/// Process-wide-in-spirit (but driver-owned, per §9) memory pressure
/// sampler. `poll_if_needed` rate-limits to at most one sample per
/// `interval_ns` via an atomic compare-exchange on `last_poll_ns`, so many
/// threads can call it without contention beyond the occasional winner.
#[derive(Debug)]
pub struct MemoryGovernor {
    enabled: AtomicBool,
    pressure: AtomicBool,
    headroom_bytes: AtomicU64,
    hysteresis_bytes: AtomicU64,
    interval_ns: AtomicU64,
    last_poll_ns: AtomicU64,
}

impl Default for MemoryGovernor {
    fn default() -> Self {
        Self {
            enabled: AtomicBool::new(false),
            pressure: AtomicBool::new(false),
            headroom_bytes: AtomicU64::new(0),
            hysteresis_bytes: AtomicU64::new(0),
            interval_ns: AtomicU64::new(Duration::from_millis(200).as_nanos() as u64),
            last_poll_ns: AtomicU64::new(0),
        }
    }
}

impl MemoryGovernor {
    /// Enable pressure tracking with the given headroom (bytes of free RAM
    /// the governor tries to keep available) and a hysteresis band half
    /// that wide, to avoid flapping at the boundary.
    pub fn enable(&self, headroom_bytes: u64) {
        self.enabled.store(true, Ordering::SeqCst);
        self.headroom_bytes.store(headroom_bytes, Ordering::SeqCst);
        self.hysteresis_bytes
            .store(headroom_bytes / 4, Ordering::SeqCst);
    }

    /// Whether the governor is currently enabled.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    /// Whether the system is currently considered under memory pressure.
    #[must_use]
    pub fn under_pressure(&self) -> bool {
        self.pressure.load(Ordering::SeqCst)
    }

    /// Set the poll cadence.
    pub fn set_poll_interval(&self, interval: Duration) {
        self.interval_ns
            .store(interval.as_nanos() as u64, Ordering::SeqCst);
    }

    /// Rate-limited sample: if at least `interval_ns` has elapsed since the
    /// last successful poll, call `sample_avail_bytes` and feed the result
    /// through [`Self::update_from_system_sample`]. Returns `true` if this
    /// call actually sampled (lost the race otherwise).
    pub fn poll_if_needed(
        &self,
        now_ns: u64,
        bounded: &BoundedResource,
        sample_avail_bytes: impl FnOnce() -> u64,
    ) -> bool {
        if !self.is_enabled() {
            return false;
        }
        let interval = self.interval_ns.load(Ordering::SeqCst);
        let last = self.last_poll_ns.load(Ordering::SeqCst);
        if now_ns.saturating_sub(last) < interval {
            return false;
        }
        if self
            .last_poll_ns
            .compare_exchange(last, now_ns, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return false;
        }
        let avail = sample_avail_bytes();
        self.update_from_system_sample(avail, bounded);
        true
    }

    /// Flip `pressure` with hysteresis given a fresh `avail` (free bytes)
    /// sample, and, while pressured, tighten `bounded`'s limit to
    /// `min(suggested, allocated + slack)`.
    pub fn update_from_system_sample(&self, avail_bytes: u64, bounded: &BoundedResource) {
        let headroom = self.headroom_bytes.load(Ordering::SeqCst);
        let hysteresis = self.hysteresis_bytes.load(Ordering::SeqCst);
        let was_pressured = self.pressure.load(Ordering::SeqCst);
        let now_pressured = if was_pressured {
            avail_bytes < headroom.saturating_add(hysteresis)
        } else {
            avail_bytes < headroom
        };
        self.pressure.store(now_pressured, Ordering::SeqCst);
        if now_pressured {
            let slack = hysteresis.max(1);
            let allocated = bounded.allocated();
            let suggested = avail_bytes.saturating_add(allocated);
            bounded.set_limit(suggested.min(allocated.saturating_add(slack)));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_governor_never_reports_pressure() {
        let gov = MemoryGovernor::default();
        let bounded = BoundedResource::default();
        assert!(!gov.poll_if_needed(0, &bounded, || 0));
        assert!(!gov.under_pressure());
    }

    #[test]
    fn enters_pressure_below_headroom() {
        let gov = MemoryGovernor::default();
        gov.enable(1_000_000);
        let bounded = BoundedResource::default();
        gov.update_from_system_sample(10, &bounded);
        assert!(gov.under_pressure());
    }

    #[test]
    fn hysteresis_keeps_pressure_until_clearly_recovered() {
        let gov = MemoryGovernor::default();
        gov.enable(1_000_000);
        let bounded = BoundedResource::default();
        gov.update_from_system_sample(10, &bounded);
        assert!(gov.under_pressure());
        // Just above headroom but still inside the hysteresis band: stays pressured.
        gov.update_from_system_sample(1_000_100, &bounded);
        assert!(gov.under_pressure());
        // Clearly recovered.
        gov.update_from_system_sample(2_000_000, &bounded);
        assert!(!gov.under_pressure());
    }

    #[test]
    fn rate_limits_polling() {
        let gov = MemoryGovernor::default();
        gov.enable(1000);
        gov.set_poll_interval(Duration::from_secs(1));
        let bounded = BoundedResource::default();
        assert!(gov.poll_if_needed(0, &bounded, || 0));
        assert!(!gov.poll_if_needed(100, &bounded, || 0));
        assert!(gov.poll_if_needed(2_000_000_000, &bounded, || 0));
    }
}
