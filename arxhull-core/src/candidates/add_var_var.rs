//! Production ADD var-var candidate generator (spec §4.3): the public
//! enumerator the search kernel calls for `y = x ⊞ z`-shaped gates. Delegates
//! to the [`crate::candidates::highway`] 8-bit block accelerator rather than
//! the reference DFS in [`crate::weight::add_var_var`] (the two are proven to
//! agree by `highway::tests::highway_agrees_with_reference_enumerator`), and
//! adapts its `(v, w, weight)` triples into sorted, deduplicated
//! [`GateCandidate`] pairs.

use crate::candidates::highway;
use crate::types::GateCandidate;

/// Enumerate candidates for fixed output mask `u`, weight `<= cap`, sorted
/// ascending by `(weight, mask_in_1, mask_in_2)`.
#[must_use]
pub fn enumerate(u: u32, cap: u32) -> Vec<GateCandidate> {
    let mut out: Vec<GateCandidate> = highway::enumerate(u, cap)
        .into_iter()
        .map(|(v, w, weight)| GateCandidate {
            weight,
            mask_in_1: v,
            mask_in_2: w,
        })
        .collect();
    out.sort();
    out.dedup();
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::weight::add_var_var::weight as reference_weight;

    #[test]
    fn every_candidate_weight_matches_the_exact_operator() {
        for u in [0u32, 1, 0x8000_0000, 0x1234_5678] {
            for c in enumerate(u, 6) {
                assert_eq!(
                    reference_weight(c.mask_in_1, c.mask_in_2, u),
                    Some(c.weight)
                );
            }
        }
    }

    #[test]
    fn zero_cap_allows_only_zero_weight_candidates() {
        for c in enumerate(0x8000_0000, 0) {
            assert_eq!(c.weight, 0);
        }
    }
}
