//! Per-depth memoization table (spec §3's `MemoizationTable`, §4.5 step 4):
//! `BranchPair -> best weight observed so far at that depth`. Best-effort:
//! self-disables under memory pressure or on simulated allocation failure
//! and then always answers "do not prune", never aborting the search.

use std::collections::HashMap;

use crate::error::SelfDisableReason;
use crate::runtime::bounded_resource::BoundedResource;
use crate::runtime::governor::MemoryGovernor;
use crate::types::BranchPair;

/// Approximate accounting cost of one memo entry, charged against the
/// shared [`BoundedResource`] so a long run's memo table participates in
/// the same pressure accounting as everything else.
const ENTRY_BYTES: u64 = 32;

/// Per-depth `BranchPair -> weight` table.
#[derive(Debug)]
pub struct MemoizationTable {
    depth_maps: Vec<HashMap<u64, u32>>,
    disabled: bool,
    disable_reason: Option<SelfDisableReason>,
}

impl MemoizationTable {
    /// Build a table with one map per depth `0..=round_count`.
    #[must_use]
    pub fn new(round_count: u32) -> Self {
        Self {
            depth_maps: (0..=round_count).map(|_| HashMap::new()).collect(),
            disabled: false,
            disable_reason: None,
        }
    }

    /// Whether this table has self-disabled.
    #[must_use]
    pub const fn is_disabled(&self) -> bool {
        self.disabled
    }

    /// Why this table self-disabled, if it has.
    #[must_use]
    pub const fn disable_reason(&self) -> Option<SelfDisableReason> {
        self.disable_reason
    }

    fn disable(&mut self, reason: SelfDisableReason) {
        self.disabled = true;
        self.disable_reason = Some(reason);
    }

    /// Spec §4.5 step 4: look up `(depth, boundary)`; if a prior weight `<=
    /// accumulated` exists, return `true` (prune this node). Otherwise
    /// record the new minimum and return `false`. Always returns `false`
    /// (never prunes) once disabled.
    pub fn should_prune(
        &mut self,
        depth: u32,
        boundary: BranchPair,
        accumulated: u32,
        bounded: &BoundedResource,
        governor: &MemoryGovernor,
    ) -> bool {
        if self.disabled {
            return false;
        }
        if governor.under_pressure() {
            self.disable(SelfDisableReason::MemoryPressure);
            return false;
        }
        let Some(map) = self.depth_maps.get_mut(depth as usize) else {
            return false;
        };
        let key = boundary.memo_key();
        if let Some(&prev) = map.get(&key) {
            if prev <= accumulated {
                return true;
            }
        }
        if !bounded.allocate(ENTRY_BYTES) {
            self.disable(SelfDisableReason::ResourceExhausted);
            return false;
        }
        map.insert(key, accumulated);
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_visit_with_no_improvement_is_pruned() {
        let mut memo = MemoizationTable::new(4);
        let bounded = BoundedResource::default();
        let governor = MemoryGovernor::default();
        let boundary = BranchPair::new(1, 2);
        assert!(!memo.should_prune(1, boundary, 5, &bounded, &governor));
        assert!(memo.should_prune(1, boundary, 5, &bounded, &governor));
        assert!(memo.should_prune(1, boundary, 9, &bounded, &governor));
    }

    #[test]
    fn improvement_is_not_pruned() {
        let mut memo = MemoizationTable::new(4);
        let bounded = BoundedResource::default();
        let governor = MemoryGovernor::default();
        let boundary = BranchPair::new(1, 2);
        assert!(!memo.should_prune(1, boundary, 5, &bounded, &governor));
        assert!(!memo.should_prune(1, boundary, 3, &bounded, &governor));
    }

    #[test]
    fn pressure_disables_and_stops_pruning() {
        let mut memo = MemoizationTable::new(4);
        let bounded = BoundedResource::default();
        let governor = MemoryGovernor::default();
        governor.enable(1_000_000);
        governor.update_from_system_sample(0, &bounded);
        let boundary = BranchPair::new(1, 2);
        assert!(!memo.should_prune(1, boundary, 5, &bounded, &governor));
        assert!(memo.is_disabled());
        assert!(!memo.should_prune(1, boundary, 5, &bounded, &governor));
    }
}
