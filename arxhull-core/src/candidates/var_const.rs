//! Var-const candidate generator (spec §4.3).
//!
//! **Known approximation** (spec §9 Open Question, preserved verbatim): full
//! enumeration of input masks `alpha` for a fixed output mask `beta` is
//! infeasible, so this generator tries only a small heuristic neighborhood —
//! `beta`, `0`, `0xFFFF_FFFF`, and `beta ^ (1 << i)` for `i < 12` — filtered
//! by the exact operator of [`crate::weight::add_var_const`] against the
//! weight cap, deduplicated, and sorted by weight. It may miss the true best
//! mask and therefore the global best weight; an implementer replacing this
//! with a provably complete enumerator must document that policy change (see
//! `DESIGN.md`).

use crate::types::GateCandidate;
use crate::weight::add_var_const;

/// Candidate `alpha` neighborhood size (the heuristic pool before filtering).
const LOW_BIT_FLIPS: u32 = 12;

/// Enumerate heuristic candidates for fixed output mask `beta` on `y = x ⊞ konst`
/// (or `x ⊟ konst`, with `konst` already rewritten via
/// [`add_var_const::sub_const_as_add`] by the caller), filtered to
/// `weight <= cap` and sorted ascending by `(weight, alpha)`.
#[must_use]
pub fn enumerate(beta: u32, konst: u32, cap: u32) -> Vec<GateCandidate> {
    let mut pool = vec![beta, 0, 0xFFFF_FFFF];
    for i in 0..LOW_BIT_FLIPS {
        pool.push(beta ^ (1 << i));
    }
    pool.sort_unstable();
    pool.dedup();

    let mut out: Vec<GateCandidate> = pool
        .into_iter()
        .filter_map(|alpha| {
            add_var_const::weight(alpha, beta, konst).and_then(|w| {
                (w <= cap).then_some(GateCandidate {
                    weight: w,
                    mask_in_1: alpha,
                    mask_in_2: 0,
                })
            })
        })
        .collect();
    out.sort();
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn always_includes_the_all_zero_candidate_when_feasible() {
        let beta = 0x1234_5678;
        let konst = 0x9999_9999;
        let candidates = enumerate(beta, konst, 32);
        assert!(candidates
            .iter()
            .any(|c| c.mask_in_1 == 0 || c.mask_in_1 == beta));
    }

    #[test]
    fn sorted_ascending_by_weight() {
        let candidates = enumerate(0xDEAD_BEEF, 0x1, 32);
        assert!(candidates.windows(2).all(|w| w[0].weight <= w[1].weight));
    }

    #[test]
    fn respects_cap() {
        let candidates = enumerate(0xDEAD_BEEF, 0x1, 2);
        assert!(candidates.iter().all(|c| c.weight <= 2));
    }
}
