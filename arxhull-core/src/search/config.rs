//! `SearchConfiguration` (spec §3, §4.5): the immutable bag of options a
//! single engine run is parameterized by.

use crate::kernel::KernelLimits;

/// How the remaining-rounds lower-bound table is obtained (spec §4.5).
#[derive(Debug, Clone)]
pub enum RemainingRoundPolicy {
    /// A user-supplied table, one entry per `rounds_left`.
    Provided(Vec<u32>),
    /// Auto-generate by running the engine exhaustively (no heuristic caps)
    /// for `1, 2, …, R` rounds on the configured start. `strict` mirrors
    /// `strict_lower_bound`: when `true` and the generation itself used a
    /// node/time budget, the resulting table must be rejected (logged) in
    /// favour of all-zero rather than trusted as a strict bound.
    AutoGenerate {
        /// Reject a budget-truncated auto-generated table rather than use it.
        strict: bool,
    },
    /// No bound (`LB[_] = 0` everywhere): always safe, weakest pruning.
    AllZero,
}

impl Default for RemainingRoundPolicy {
    fn default() -> Self {
        Self::AllZero
    }
}

/// Immutable per-run configuration (spec §3's `SearchConfiguration`).
#[derive(Debug, Clone)]
pub struct SearchConfiguration {
    /// Number of rounds to search.
    pub round_count: u32,
    /// Hard per-round weight ceiling passed to the kernel in addition to
    /// the live Matsui slack (spec §4.3/§4.4's "per-gate weight caps").
    pub gate_weight_cap: u32,
    /// Per-gate candidate count / injection-subspace / round-predecessor
    /// ceilings (spec §4.3/§4.4's remaining per-gate caps).
    pub kernel_limits: KernelLimits,
    /// Node budget; `0` means unlimited.
    pub max_nodes: u64,
    /// Wall-clock budget in seconds; `None` means unlimited.
    pub max_seconds: Option<f64>,
    /// Stop as soon as a trail of this weight or lower is found.
    pub target_weight: Option<u32>,
    /// Whether the per-depth memoization table is used at all.
    pub memoization_enabled: bool,
    /// Remaining-round lower-bound policy.
    pub remaining_round_policy: RemainingRoundPolicy,
    /// Progress/log verbosity (0 = silent).
    pub verbosity: u8,
}

impl SearchConfiguration {
    /// A permissive default: unlimited budgets, no target, memoization on,
    /// all-zero remaining-round bound. Round count must still be set.
    #[must_use]
    pub fn new(round_count: u32) -> Self {
        Self {
            round_count,
            gate_weight_cap: crate::weight::MAX_WEIGHT,
            kernel_limits: KernelLimits::default(),
            max_nodes: 0,
            max_seconds: None,
            target_weight: None,
            memoization_enabled: true,
            remaining_round_policy: RemainingRoundPolicy::AllZero,
            verbosity: 0,
        }
    }

    /// Node-count cadence at which the engine polls the memory governor and
    /// (if a time budget is set) samples the wall clock (spec §4.5 step 1):
    /// `2^10` on small budgets (`max_seconds <= 10`), else `2^18`.
    #[must_use]
    pub fn poll_cadence(&self) -> u64 {
        match self.max_seconds {
            Some(s) if s <= 10.0 => 1 << 10,
            _ => 1 << 18,
        }
    }
}
