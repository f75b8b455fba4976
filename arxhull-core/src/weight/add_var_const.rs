//! ADD/SUB var-const linear weight (spec §4.1): a per-bit `{0,1} × {0,1}`
//! carry-state DP over `x ∈ {0,1}` for `y = x ⊞ K` (or `x ⊟ K`, rewritten as
//! addition of `K' = (-K) mod 2^32`).
//!
//! The DP accumulates two Walsh sums (one per carry-in state); the absolute
//! correlation is `|S| / 2^n` where `S` is the final sum. Weight is the
//! ceiling integer `n - floor(log2|S|)` for nonzero `S`, or infeasible when
//! the sum is zero.

/// Exact dyadic correlation numerator `S` (denominator implicit `2^n`) for
/// `y = x ⊞ konst mod 2^n` under input mask `alpha` and output mask `beta`,
/// both taken mod `2^n`. `None` when the correlation is exactly zero.
#[must_use]
pub fn correlation_numerator_n(alpha: u32, beta: u32, konst: u32, n: u32) -> Option<i64> {
    debug_assert!(n >= 1 && n <= 32);
    // carry_sum[c] = sum over assignments so far (bits 0..i) of
    // (-1)^{parity(alpha & x-bits) ^ parity(beta & y-bits)} with carry-out c
    // into bit i+1. Two states: c in {0, 1}.
    let mut carry_sum = [1i64, 0i64]; // carry-in to bit 0 is always 0
    for i in 0..n {
        let ai = (alpha >> i) & 1;
        let bi = (beta >> i) & 1;
        let ki = (konst >> i) & 1;
        let mut next = [0i64; 2];
        for (carry_in, &sum_here) in carry_sum.iter().enumerate() {
            if sum_here == 0 {
                continue;
            }
            for xi in 0..2u32 {
                let total = xi + ki + carry_in as u32;
                let yi = total & 1;
                let carry_out = (total >> 1) as usize;
                let sign_exp = (ai & xi) ^ (bi & yi);
                let sign = if sign_exp == 0 { 1i64 } else { -1i64 };
                next[carry_out] += sign * sum_here;
            }
        }
        carry_sum = next;
    }
    // Modular addition drops the final carry-out; both ending carry states
    // map to the same (already reduced mod 2^n) y, so they simply sum.
    let total = carry_sum[0] + carry_sum[1];
    if total == 0 {
        None
    } else {
        Some(total)
    }
}

/// [`correlation_numerator_n`] at the cipher's native width (32).
#[must_use]
pub fn correlation_numerator(alpha: u32, beta: u32, konst: u32) -> Option<i64> {
    correlation_numerator_n(alpha, beta, konst, 32)
}

/// Ceiling-integer weight `n - floor(log2|S|)` for nonzero `S`, `None` if
/// the correlation is exactly zero (infeasible).
#[must_use]
pub fn weight_n(alpha: u32, beta: u32, konst: u32, n: u32) -> Option<u32> {
    let s = correlation_numerator_n(alpha, beta, konst, n)?;
    let mag = s.unsigned_abs();
    debug_assert!(mag > 0);
    let log2_floor = 63 - mag.leading_zeros();
    Some(n - log2_floor)
}

/// [`weight_n`] at the cipher's native width (32).
#[must_use]
pub fn weight(alpha: u32, beta: u32, konst: u32) -> Option<u32> {
    weight_n(alpha, beta, konst, 32)
}

/// Rewrite subtraction-by-constant as addition of the two's complement:
/// `x ⊟ K == x ⊞ ((-K) mod 2^32)`.
#[must_use]
pub const fn sub_const_as_add(konst: u32) -> u32 {
    konst.wrapping_neg()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn brute_force_correlation(alpha: u32, beta: u32, konst: u32, n: u32) -> f64 {
        let mask = (1u64 << n) - 1;
        let mut sum = 0i64;
        for x in 0..=mask {
            let y = x.wrapping_add(u64::from(konst)) & mask;
            let exp =
                ((u64::from(alpha) & x).count_ones() + (u64::from(beta) & y).count_ones()) & 1;
            sum += if exp == 0 { 1 } else { -1 };
        }
        sum as f64 / f64::from(1u32 << n)
    }

    #[test]
    fn exhaustive_4bit_matches_brute_force() {
        let n = 4u32;
        let m = 1u32 << n;
        for alpha in 0..m {
            for konst in 0..m {
                for beta in 0..m {
                    let got = weight_n(alpha, beta, konst, n);
                    let brute = brute_force_correlation(alpha, beta, konst, n).abs();
                    if brute == 0.0 {
                        assert!(got.is_none(), "alpha={alpha} beta={beta} konst={konst}");
                    } else {
                        let expect = (-brute.log2()).round() as u32;
                        assert_eq!(
                            got,
                            Some(expect),
                            "alpha={alpha} beta={beta} konst={konst} brute={brute}"
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn zero_masks_always_feasible_weight_zero() {
        assert_eq!(weight(0, 0, 0x1234_5678), Some(0));
    }

    #[test]
    fn sub_const_rewrite_matches_two_complement() {
        assert_eq!(sub_const_as_add(1), u32::MAX);
        assert_eq!(sub_const_as_add(0), 0);
    }

    #[test]
    fn full_width_weight_in_range() {
        for (alpha, beta, konst) in [
            (0x1u32, 0x1u32, 0x1u32),
            (0xFFFF_FFFFu32, 0x8000_0000u32, 0x1u32),
            (0x8000_0000u32, 0x8000_0000u32, 0x8000_0000u32),
        ] {
            if let Some(w) = weight(alpha, beta, konst) {
                assert!(w <= 32, "weight out of range: {w}");
            }
        }
    }
}
