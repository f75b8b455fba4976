//! `SearchContext` (spec §3): mutable run state threaded through one DFS —
//! the visited-node counter, the current global best, the working trail
//! stack, the memoization table, stop flags, and optional checkpoint
//! writer.

use std::time::Instant;

use crate::checkpoint::{CheckpointInfo, CheckpointWriter};
use crate::error::StopReasons;
use crate::search::memo::MemoizationTable;
use crate::types::{BranchPair, RoundTrailStep};

/// Mutable state for one engine run.
pub struct SearchContext {
    /// The search start boundary (the round-`round_count` output mask pair).
    pub start: BranchPair,
    /// Total DFS nodes visited so far.
    pub nodes_visited: u64,
    /// Current global best weight (`u32::MAX` until the first terminal hit).
    pub best_weight: u32,
    /// Best input masks found so far.
    pub best_input: Option<BranchPair>,
    /// Best trail found so far, in the order recorded by the DFS (last
    /// round first).
    pub best_trail: Vec<RoundTrailStep>,
    /// The trail currently being built by the in-progress DFS path.
    pub working_trail: Vec<RoundTrailStep>,
    /// Per-depth memoization table, if enabled.
    pub memo: Option<MemoizationTable>,
    /// Stop flags consulted at every node boundary.
    pub stop: StopReasons,
    /// Run start, for wall-clock budget checks.
    pub started_at: Instant,
    /// Optional checkpoint writer; fired on every best-weight improvement.
    pub checkpoint: Option<CheckpointWriter>,
}

impl SearchContext {
    /// A fresh context for `start`, with memoization enabled according to
    /// `memoize` and `round_count` depth slots reserved.
    #[must_use]
    pub fn new(start: BranchPair, round_count: u32, memoize: bool) -> Self {
        Self {
            start,
            nodes_visited: 0,
            best_weight: u32::MAX,
            best_input: None,
            best_trail: Vec::new(),
            working_trail: Vec::with_capacity(round_count as usize),
            memo: memoize.then(|| MemoizationTable::new(round_count)),
            stop: StopReasons::none(),
            started_at: Instant::now(),
            checkpoint: None,
        }
    }

    /// Elapsed wall-clock seconds since the run started.
    #[must_use]
    pub fn elapsed_sec(&self) -> f64 {
        self.started_at.elapsed().as_secs_f64()
    }

    /// Record an improvement: the working trail (cloned) becomes the new
    /// best, and a checkpoint block is written if a writer is configured.
    pub fn record_improvement(&mut self, weight: u32, input: BranchPair, rounds: u32) {
        self.best_weight = weight;
        self.best_input = Some(input);
        self.best_trail = self.working_trail.clone();
        if let Some(writer) = &mut self.checkpoint {
            let info = CheckpointInfo {
                reason: "new best weight",
                rounds,
                start: self.start,
                best_weight: weight,
                nodes_visited: self.nodes_visited,
                elapsed_sec: self.elapsed_sec(),
                best_input: input,
                trail: &self.best_trail,
            };
            // Checkpoint I/O failures are not fatal to the search: they are
            // a diagnostics side channel, not part of the search contract.
            let _ = writer.write_block(&info);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_context_has_no_best_yet() {
        let ctx = SearchContext::new(BranchPair::new(1, 0), 4, true);
        assert_eq!(ctx.best_weight, u32::MAX);
        assert!(ctx.best_input.is_none());
        assert!(ctx.memo.is_some());
    }

    #[test]
    fn record_improvement_snapshots_the_working_trail() {
        let mut ctx = SearchContext::new(BranchPair::new(1, 0), 1, false);
        ctx.working_trail.push(RoundTrailStep {
            round_index: 0,
            out_mask_a: 1,
            out_mask_b: 0,
            in_mask_a: 1,
            in_mask_b: 0,
            sub_weights: [0; 6],
            round_weight: 0,
        });
        ctx.record_improvement(0, BranchPair::new(1, 0), 1);
        assert_eq!(ctx.best_weight, 0);
        assert_eq!(ctx.best_trail.len(), 1);
    }
}
