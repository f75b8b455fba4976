//! Wallén's CCZ-equivalence closed form for the same ADD var-var correlation
//! (spec §4.1), grounded in `examples/original_source/include/MELCC/wallen_fast.hpp`
//! and `include/arx_analysis_operators/modular_addition_ccz.hpp` (Theorem 4).
//!
//! `z* = M_n^T(u ⊕ v ⊕ w)`; feasible iff `(u⊕v) ≼ z*` and `(u⊕w) ≼ z*`;
//! weight `= popcount(z*)`. This must agree with
//! [`crate::weight::add_var_var::weight`] on every input — enforced by
//! `tests/operator_exactness.rs`.

use crate::bitops::{leq_bitwise, popcount, suffix_xor};

/// Feasibility + weight via the Wallén CCZ identity. `None` if infeasible.
#[must_use]
pub const fn weight(u: u32, v: u32, w: u32) -> Option<u32> {
    let z_star = suffix_xor(u ^ v ^ w);
    let uv = u ^ v;
    let uw = u ^ w;
    if !leq_bitwise(uv, z_star) || !leq_bitwise(uw, z_star) {
        return None;
    }
    Some(popcount(z_star))
}

/// Run the self-test mandated by spec §4.1: the two forms must agree on
/// every 4-bit `(u, v, w)` triple. Exposed as a function (not just a test)
/// so callers/CLIs can run it as a runtime `--selftest`.
///
/// # Panics
/// Panics with a descriptive message on the first disagreement found.
pub fn self_test_agrees_with_schulte_geers() {
    for u in 0u32..16 {
        for v in 0u32..16 {
            for w in 0u32..16 {
                let shift = 28;
                let (su, sv, sw) = (u << shift, v << shift, w << shift);
                let a = weight(su, sv, sw);
                let b = crate::weight::add_var_var::weight(su, sv, sw);
                assert!(
                    a == b,
                    "Wallén/Schulte-Geers disagreement at u={u:#x} v={v:#x} w={w:#x}: {a:?} vs {b:?}"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn self_test_passes() {
        self_test_agrees_with_schulte_geers();
    }

    #[test]
    fn exhaustive_4bit_matches_schulte_geers() {
        self_test_agrees_with_schulte_geers();
    }

    #[test]
    fn random_spot_checks_at_32_bits() {
        let mut state = 0x9E37_79B9_7F4A_7C15_u64;
        let mut next = || {
            state ^= state << 13;
            state ^= state >> 7;
            state ^= state << 17;
            state
        };
        for _ in 0..2000 {
            let u = next() as u32;
            let v = next() as u32;
            let w = next() as u32;
            assert_eq!(
                weight(u, v, w),
                crate::weight::add_var_var::weight(u, v, w),
                "u={u:#010x} v={v:#010x} w={w:#010x}"
            );
        }
    }
}
