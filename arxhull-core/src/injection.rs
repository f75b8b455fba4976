//! Quadratic injection model (spec §4.2).
//!
//! Each injection `f: GF(2)^32 -> GF(2)^32` is a vector-quadratic function.
//! For a fixed output mask `u`, `g_u(x) = <u, f(x)>` is a quadratic form with
//! bilinear matrix `S(u)` and linear coefficient vector `l(u)`, both derived
//! offline from two tables supplied by the consumer (spec §6): `f_basis[i] =
//! f(e_i)` and `quad_second_diff[{i,j}] = f(0) ^ f(e_i) ^ f(e_j) ^ f(e_i^e_j)`.

use crate::bitops::{parity, popcount};
use crate::types::{AffineMaskSubspace, InjectionTransition};

/// Offline-computed tables for one injection function, built once per cipher
/// description (spec §4.2, compile-time or one-time init).
#[derive(Debug, Clone)]
pub struct InjectionTables {
    /// `f(0)`.
    pub f_zero: u32,
    /// `f(e_i)` for `i = 0..32`.
    pub f_basis: [u32; 32],
    /// `quad_second_diff[{i,j}] = f(0) ^ f(e_i) ^ f(e_j) ^ f(e_i ^ e_j)` for `i < j`,
    /// stored as a flat upper-triangular array of the 496 entries, indexed by
    /// [`pair_index`].
    pub quad_second_diff: Vec<u32>,
}

/// Flat index for the `(i, j)` entry of an upper-triangular `i < j < 32`
/// table (496 = C(32, 2) entries), row-major by `i`.
#[must_use]
pub const fn pair_index(i: usize, j: usize) -> usize {
    debug_assert!(i < j && j < 32);
    // Number of pairs with first coordinate < i is i*(63-i)/2 (triangular
    // count for rows 0..i over columns i+1..32).
    let rows_before = i * (63 - i) / 2;
    rows_before + (j - i - 1)
}

impl InjectionTables {
    /// Build from the raw `f(0)`, `f(e_i)`, and `f(e_i ^ e_j)` outputs.
    #[must_use]
    pub fn new(f_zero: u32, f_basis: [u32; 32], f_pairwise_xor: &[[u32; 32]; 32]) -> Self {
        let mut quad_second_diff = vec![0u32; 32 * 31 / 2];
        for i in 0..32usize {
            for j in (i + 1)..32usize {
                let diff = f_zero ^ f_basis[i] ^ f_basis[j] ^ f_pairwise_xor[i][j];
                quad_second_diff[pair_index(i, j)] = diff;
            }
        }
        Self {
            f_zero,
            f_basis,
            quad_second_diff,
        }
    }

    /// `l(u)_i = parity(u & f(e_i)) ^ parity(u & f(0))`.
    #[must_use]
    pub fn linear_coefficients(&self, u: u32) -> u32 {
        let base = parity(u & self.f_zero);
        let mut l = 0u32;
        for i in 0..32u32 {
            let bit = parity(u & self.f_basis[i as usize]) ^ base;
            l |= bit << i;
        }
        l
    }

    /// Row `i` of the bilinear matrix `S(u)`: XOR of per-output-bit
    /// precomputed bilinear sub-rows (`quad_second_diff[{i,j}]`) for every
    /// bit set in `u`, restricted to column `j`. Returns the full 32x32
    /// matrix as 32 rows (each row a `u32` bitmask over columns).
    #[must_use]
    pub fn bilinear_matrix(&self, u: u32) -> [u32; 32] {
        let mut rows = [0u32; 32];
        for i in 0..32usize {
            let mut row = 0u32;
            for j in 0..32usize {
                if i == j {
                    continue;
                }
                let (lo, hi) = if i < j { (i, j) } else { (j, i) };
                let diff = self.quad_second_diff[pair_index(lo, hi)];
                let bit = parity(u & diff);
                row |= bit << j;
            }
            rows[i] = row;
        }
        rows
    }

    /// Compile the [`InjectionTransition`] for a fixed output mask `u`: the
    /// affine subspace `V(u) = l(u) XOR im(S(u))` and weight `ceil(rank/2)`.
    ///
    /// `u = 0` is the trivial transition (empty subspace, weight 0).
    #[must_use]
    pub fn transition(&self, u: u32) -> InjectionTransition {
        if u == 0 {
            return InjectionTransition::trivial();
        }
        let l = self.linear_coefficients(u);
        let rows = self.bilinear_matrix(u);
        // im(S(u)) is spanned by the columns of S(u); since S(u) is
        // symmetric over GF(2) for a quadratic form's polar bilinear map,
        // the rows span the same space as the columns.
        let subspace = AffineMaskSubspace::from_spanning_set(l, &rows);
        let rank = subspace.rank();
        let weight = rank.div_ceil(2);
        InjectionTransition { subspace, weight }
    }
}

/// Rank of a boolean bilinear-form matrix given as 32 row-masks, via
/// GF(2) linear-basis insertion (spec §4.2: "classic XOR basis").
#[must_use]
pub fn matrix_rank(rows: &[u32; 32]) -> u32 {
    let mut lb = crate::bitops::LinearBasis::new();
    for &row in rows {
        lb.insert(row);
    }
    lb.rank()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity_tables() -> InjectionTables {
        // f(x) = x: a linear (rank-0 quadratic part) function. Every u gives
        // S(u) = 0 (no quadratic term), l(u) = u (since f(e_i) = e_i).
        let mut f_basis = [0u32; 32];
        for (i, slot) in f_basis.iter_mut().enumerate() {
            *slot = 1 << i;
        }
        let mut pairwise = [[0u32; 32]; 32];
        for i in 0..32 {
            for j in 0..32 {
                pairwise[i][j] = (1u32 << i) | (1u32 << j);
            }
        }
        InjectionTables::new(0, f_basis, &pairwise)
    }

    #[test]
    fn linear_injection_has_zero_weight_everywhere() {
        let tables = identity_tables();
        for u in [1u32, 0xFF, 0x8000_0000, 0x1234_5678] {
            let t = tables.transition(u);
            assert_eq!(t.weight, 0, "u={u:#010x}");
            assert_eq!(t.subspace.rank(), 0);
            assert_eq!(t.subspace.offset, u);
        }
    }

    #[test]
    fn zero_mask_is_trivial() {
        let tables = identity_tables();
        let t = tables.transition(0);
        assert_eq!(t.weight, 0);
        assert_eq!(t.subspace.cardinality(), 1);
    }

    #[test]
    fn pair_index_is_injective_over_full_range() {
        let mut seen = std::collections::HashSet::new();
        for i in 0..32usize {
            for j in (i + 1)..32usize {
                assert!(seen.insert(pair_index(i, j)));
            }
        }
        assert_eq!(seen.len(), 32 * 31 / 2);
    }
}
