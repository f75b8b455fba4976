//! The 8-bit block "highway" accelerator for ADD var-var candidate
//! generation (spec §4.3, §4.4 Highway in the glossary).
//!
//! The 32-bit Schulte-Geers recurrence (see
//! [`crate::weight::add_var_var`]) is decomposed into four 8-bit blocks,
//! processed from the most-significant block down to the least. Each block
//! carries a single "connection" bit: the incoming `z` value at its top bit
//! (the block above's outgoing carry-support value). For each
//! `(u_byte, connection_bit_in, exclude_top_z31)` key we enumerate the local
//! 8-bit solutions `(v_byte, w_byte, next_connection_bit, local_weight)`,
//! sorted by weight, and cache them thread-locally with a bounded capacity.
//! A 4-block DP then threads the connection bit from the top block down,
//! pruned by a `min_remaining_weight[block][connection_in]` lower-bound
//! table.

use std::cell::RefCell;
use std::collections::HashMap;

/// One 8-bit block's local solution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocalSolution {
    /// The 8 input-mask bits chosen for `v` in this block.
    pub v_byte: u8,
    /// The 8 input-mask bits chosen for `w` in this block.
    pub w_byte: u8,
    /// The `z` connection value entering the block *below* this one (i.e.
    /// `z` at the bottom bit of this block, which is this block's bit 0).
    pub next_connection: u8,
    /// Weight contribution (popcount of the 8 `z` bits produced in this block).
    pub local_weight: u32,
}

/// Key identifying one highway cache entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct HighwayKey {
    u_byte: u8,
    connection_in: u8,
    exclude_top_z31: bool,
}

const HIGHWAY_CACHE_CAP: usize = 4096;

thread_local! {
    static HIGHWAY_CACHE: RefCell<HashMap<HighwayKey, Vec<LocalSolution>>> =
        RefCell::new(HashMap::new());
}

/// Enumerate (or fetch cached) local solutions for one byte block.
///
/// `connection_in` is the `z` value entering the top of this block (i.e.
/// `z` at bit index `block_top + 1`, the bit above this block's MSB); when
/// `exclude_top_z31` is set, bit 7 of this block is the cipher's bit 31 and
/// its `z` is hard-fixed to 0 (ignoring `connection_in`).
fn local_solutions(u_byte: u8, connection_in: u8, exclude_top_z31: bool) -> Vec<LocalSolution> {
    let key = HighwayKey {
        u_byte,
        connection_in,
        exclude_top_z31,
    };
    if let Some(hit) = HIGHWAY_CACHE.with(|c| c.borrow().get(&key).cloned()) {
        return hit;
    }
    let mut out = Vec::new();
    let z7 = if exclude_top_z31 { 0 } else { u32::from(connection_in) };
    descend_block(u_byte, 7, z7, 0, 0, 0, &mut out);
    out.sort_by(|a, b| {
        a.local_weight
            .cmp(&b.local_weight)
            .then(a.v_byte.cmp(&b.v_byte))
            .then(a.w_byte.cmp(&b.w_byte))
    });
    HIGHWAY_CACHE.with(|c| {
        let mut cache = c.borrow_mut();
        if cache.len() < HIGHWAY_CACHE_CAP {
            cache.insert(key, out.clone());
        }
    });
    out
}

/// Descend the 8 bits of one block from bit 7 (MSB) to bit 0 (LSB),
/// threading the true `z_i` value explicitly through `z_current` (the
/// Schulte-Geers recurrence restricted to one block). `z_current` is `z_i`
/// for the bit about to be processed; on entry to bit 7 it is either the
/// incoming connection bit or the hard-fixed 0 for the cipher's bit 31.
fn descend_block(
    u_byte: u8,
    bit: i32,
    z_current: u32,
    acc_v: u8,
    acc_w: u8,
    weight_acc: u32,
    out: &mut Vec<LocalSolution>,
) {
    if bit < 0 {
        out.push(LocalSolution {
            v_byte: acc_v,
            w_byte: acc_w,
            next_connection: z_current as u8,
            local_weight: weight_acc,
        });
        return;
    }
    let ui = u32::from((u_byte >> bit) & 1);
    if z_current == 0 {
        // forced: v_i = w_i = u_i, z_{i-1} = 0 ^ u_i ^ u_i ^ u_i = u_i
        descend_block(
            u_byte,
            bit - 1,
            ui,
            acc_v | ((ui as u8) << bit),
            acc_w | ((ui as u8) << bit),
            weight_acc,
            out,
        );
    } else {
        for vi in 0..=1u32 {
            for wi in 0..=1u32 {
                let next_z = z_current ^ ui ^ vi ^ wi;
                descend_block(
                    u_byte,
                    bit - 1,
                    next_z,
                    acc_v | ((vi as u8) << bit),
                    acc_w | ((wi as u8) << bit),
                    weight_acc + next_z,
                    out,
                );
            }
        }
    }
}

/// Run the 4-block highway DP top-down, producing predecessor `(v, w)` pairs
/// for fixed output mask `u`, pruned to `cap` total weight via
/// `min_remaining_weight`. Results are **not** globally sorted across blocks
/// boundaries beyond weight order within the DP frontier, matching the
/// production accelerator's frontier-expansion order; callers that need a
/// fully sorted list should sort the returned vector (as
/// [`crate::candidates::add_var_var::enumerate`] does).
#[must_use]
pub fn enumerate(u: u32, cap: u32) -> Vec<(u32, u32, u32)> {
    let min_remaining = build_lower_bound_table(u);
    let mut frontier: Vec<(u8, u32, u32, u32)> = vec![(0, 0, 0, 0)]; // (connection_in, acc_v, acc_w, weight)
    for block in (0..4u32).rev() {
        let u_byte = ((u >> (block * 8)) & 0xFF) as u8;
        let exclude_top = block == 3;
        let mut next_frontier = Vec::new();
        for &(connection_in, acc_v, acc_w, weight) in &frontier {
            let lb_here = min_remaining[block as usize][connection_in as usize];
            if weight + lb_here > cap {
                continue;
            }
            for sol in local_solutions(u_byte, connection_in, exclude_top) {
                let new_weight = weight + sol.local_weight;
                if new_weight > cap {
                    break; // sorted by weight ascending
                }
                next_frontier.push((
                    sol.next_connection,
                    acc_v | (u32::from(sol.v_byte) << (block * 8)),
                    acc_w | (u32::from(sol.w_byte) << (block * 8)),
                    new_weight,
                ));
            }
        }
        frontier = next_frontier;
    }
    frontier
        .into_iter()
        .map(|(_, v, w, wgt)| (v, w, wgt))
        .collect()
}

/// `min_remaining_weight[block][connection_in]`: a lower bound on the
/// weight contributed by blocks `0..=block` (inclusive, counting from the
/// bottom) given that `connection_in` enters the top of `block`. Built by
/// taking, for every reachable local solution at each block, the minimum
/// achievable suffix sum via a backward pass.
fn build_lower_bound_table(u: u32) -> [[u32; 2]; 4] {
    let mut table = [[0u32; 2]; 4];
    // best_suffix_from[block][connection_in] = min total weight of blocks
    // 0..=block given this connection entering `block`.
    let mut best_suffix_from = [[u32::MAX; 2]; 4];
    for block in 0..4u32 {
        let u_byte = ((u >> (block * 8)) & 0xFF) as u8;
        let exclude_top = block == 3;
        for connection_in in 0..2u8 {
            let sols = local_solutions(u_byte, connection_in, exclude_top);
            let Some(best_local) = sols.first().map(|s| s.local_weight) else {
                continue;
            };
            if block == 0 {
                best_suffix_from[block as usize][connection_in as usize] = best_local;
            } else {
                let mut best = u32::MAX;
                for sol in &sols {
                    let below = best_suffix_from[(block - 1) as usize][sol.next_connection as usize];
                    if below == u32::MAX {
                        continue;
                    }
                    best = best.min(sol.local_weight + below);
                }
                best_suffix_from[block as usize][connection_in as usize] = best;
            }
        }
    }
    for block in 0..4usize {
        for c in 0..2usize {
            table[block][c] = best_suffix_from[block][c].min(u32::MAX - 1);
        }
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::weight::add_var_var;

    #[test]
    fn highway_agrees_with_reference_enumerator() {
        for u in [0x0000_0001u32, 0x8000_0000, 0x1234_5678, 0xFFFF_FFFF] {
            let cap = 5;
            let mut expect = add_var_var::enumerate(u, cap);
            let mut got = enumerate(u, cap);
            expect.sort();
            got.sort();
            assert_eq!(expect, got, "u={u:#010x}");
        }
    }
}
