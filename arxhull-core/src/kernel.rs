//! Round kernel: reverse propagation through one round (spec §4.4).
//!
//! Each round composes, forward, two symmetric subrounds — `(ADD1, SUB1,
//! XOR-ROT mix, L1, injection B→A)` then `(ADD2, SUB2, XOR-ROT mix, L2,
//! injection A→B)` — terminated by XOR with two round constants. XOR with a
//! constant and pure linear maps preserve `|correlation|`, so only the four
//! modular gates and two injections are charged weight.
//!
//! The kernel walks this in reverse from a round's output boundary
//! `(mask_a, mask_b)` to its predecessors, following the seven steps of
//! spec §4.4 exactly: strip the terminal constants, resolve the A→B
//! injection, mix through the XOR-rotate pair into `ADD2`/`SUB2`'s fixed
//! output masks, resolve `SUB2` then `ADD2`, resolve the B→A injection, mix
//! into `ADD1`/`SUB1`, resolve `SUB1` then `ADD1`. Every enumeration level is
//! cut off by the live Matsui slack: `budget - weight accumulated so far in
//! this round`.
//!
//! Reuse of the round-constant table as the `SUB1`/`SUB2` operands (rather
//! than a separate field) is a concrete wiring decision recorded in
//! `DESIGN.md`, since spec §4.4 only fixes the seven-step shape and treats
//! `L1`/`L2`/the injections as an opaque external black box.

use crate::bitops::rotr;
use crate::candidates::{add_var_var, injection_walk, var_const};
use crate::cipher::CipherDescription;
use crate::types::{BranchPair, GateCandidate, RoundTrailStep};

/// Hard ceilings applied on top of the live Matsui slack, so a single round
/// expansion can never blow an unbounded amount of memory/time even when the
/// slack is generous.
#[derive(Debug, Clone, Copy)]
pub struct KernelLimits {
    /// Max candidates kept per gate enumeration (after the weight-cap filter).
    pub max_candidates_per_gate: usize,
    /// Max distinct masks walked out of one injection's affine subspace.
    pub injection_max_elements: usize,
    /// Node budget passed to the injection subspace walker.
    pub injection_node_budget: u64,
    /// Max predecessors returned per round (after weight-sort truncation).
    pub max_round_predecessors: usize,
}

impl Default for KernelLimits {
    fn default() -> Self {
        Self {
            max_candidates_per_gate: 64,
            injection_max_elements: 256,
            injection_node_budget: 4096,
            max_round_predecessors: 256,
        }
    }
}

/// The two round-constant operands used as `SUB1`'s and `SUB2`'s constants
/// for `round_index`, drawn (cyclically, mod 8) from
/// [`CipherDescription::round_constants`]: `(c_sub2, c_sub1)`, matching the
/// pair also XORed in as this round's terminal constants.
fn round_sub_constants(desc: &CipherDescription, round_index: u32) -> (u32, u32) {
    let base = ((round_index % 8) * 2) as usize;
    (desc.round_constants[base], desc.round_constants[base + 1])
}

/// Expand one round's output boundary into its predecessors, in ascending
/// `round_weight` order, truncated to `limits.max_round_predecessors`.
///
/// `budget` is the live Matsui slack for this round (`best_weight -
/// accumulated_weight - LB[rounds_left - 1]` from spec §4.5 step 5); any
/// partial combination whose running weight exceeds it is pruned
/// immediately rather than completed.
#[must_use]
pub fn predecessors(
    desc: &CipherDescription,
    round_index: u32,
    out: BranchPair,
    budget: u32,
    limits: &KernelLimits,
) -> Vec<RoundTrailStep> {
    let mut results = Vec::new();
    if out.is_zero() {
        return results;
    }
    let (konst_sub2, konst_sub1) = round_sub_constants(desc, round_index);

    // Step 1: XOR with the two terminal round constants doesn't move the mask.
    let mask_a0 = out.mask_a;
    let mask_b0 = out.mask_b;

    // Step 2: A→B injection, charged against the output mask it produced (b).
    let inj_ab = desc.injection_a.transition(mask_b0);
    if inj_ab.weight > budget {
        return results;
    }
    let budget_after_inj_ab = budget - inj_ab.weight;

    let inj_ab_candidates = injection_walk::walk(
        &inj_ab.subspace,
        limits.injection_max_elements,
        limits.injection_node_budget,
    );

    for m in inj_ab_candidates {
        // Step 3: XOR-rotate mix into ADD2's/SUB2's fixed output masks.
        let add2_out = mask_a0 ^ m;
        let sub2_out = mask_b0 ^ rotr(m, desc.rotation_r1);

        // Step 4: SUB2 (var-const) then ADD2 (var-var), cut by remaining slack.
        let sub2_candidates = truncate(
            var_const::enumerate(sub2_out, konst_sub2, budget_after_inj_ab),
            limits.max_candidates_per_gate,
        );
        for sub2 in &sub2_candidates {
            if inj_ab.weight + sub2.weight > budget {
                break;
            }
            let budget_after_sub2 = budget_after_inj_ab - sub2.weight;
            let add2_candidates = truncate(
                add_var_var::enumerate(add2_out, budget_after_sub2),
                limits.max_candidates_per_gate,
            );
            for add2 in &add2_candidates {
                if inj_ab.weight + sub2.weight + add2.weight > budget {
                    break;
                }
                let budget_after_add2 = budget_after_sub2 - add2.weight;
                let intermediate_a = add2.mask_in_1;
                let intermediate_b = add2.mask_in_2 ^ sub2.mask_in_1;

                // Step 5: B→A injection on the intermediate A mask.
                let inj_ba = desc.injection_b.transition(intermediate_a);
                if inj_ba.weight > budget_after_add2 {
                    continue;
                }
                let budget_after_inj_ba = budget_after_add2 - inj_ba.weight;
                let inj_ba_candidates = injection_walk::walk(
                    &inj_ba.subspace,
                    limits.injection_max_elements,
                    limits.injection_node_budget,
                );

                for n in inj_ba_candidates {
                    // Step 6: symmetric XOR-rotate mix for ADD1/SUB1.
                    let add1_out = intermediate_a ^ rotr(n, desc.rotation_r0);
                    let sub1_out = intermediate_b ^ n;

                    let sub1_candidates = truncate(
                        var_const::enumerate(sub1_out, konst_sub1, budget_after_inj_ba),
                        limits.max_candidates_per_gate,
                    );
                    for sub1 in &sub1_candidates {
                        if inj_ba.weight + sub1.weight > budget_after_add2 {
                            break;
                        }
                        let budget_after_sub1 = budget_after_inj_ba - sub1.weight;
                        let add1_candidates = truncate(
                            add_var_var::enumerate(add1_out, budget_after_sub1),
                            limits.max_candidates_per_gate,
                        );
                        for add1 in &add1_candidates {
                            let round_weight = inj_ab.weight
                                + sub2.weight
                                + add2.weight
                                + inj_ba.weight
                                + sub1.weight
                                + add1.weight;
                            if round_weight > budget {
                                break;
                            }
                            // Step 7: record the predecessor.
                            let in_mask_a = add1.mask_in_1;
                            let in_mask_b = add1.mask_in_2 ^ sub1.mask_in_1;
                            results.push(RoundTrailStep {
                                round_index,
                                out_mask_a: out.mask_a,
                                out_mask_b: out.mask_b,
                                in_mask_a,
                                in_mask_b,
                                sub_weights: [
                                    inj_ab.weight,
                                    sub2.weight,
                                    add2.weight,
                                    inj_ba.weight,
                                    sub1.weight,
                                    add1.weight,
                                ],
                                round_weight,
                            });
                        }
                    }
                }
            }
        }
    }

    results.sort_by(|a, b| {
        a.round_weight
            .cmp(&b.round_weight)
            .then(a.in_mask_a.cmp(&b.in_mask_a))
            .then(a.in_mask_b.cmp(&b.in_mask_b))
    });
    results.dedup_by(|a, b| a.in_mask_a == b.in_mask_a && a.in_mask_b == b.in_mask_b);
    results.truncate(limits.max_round_predecessors);
    results
}

fn truncate(mut v: Vec<GateCandidate>, cap: usize) -> Vec<GateCandidate> {
    v.truncate(cap);
    v
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::neoalzette;

    #[test]
    fn zero_boundary_has_no_predecessors() {
        let desc = neoalzette::cipher_description();
        let preds = predecessors(
            &desc,
            0,
            BranchPair::new(0, 0),
            32,
            &KernelLimits::default(),
        );
        assert!(preds.is_empty());
    }

    #[test]
    fn predecessors_are_sorted_ascending_by_round_weight() {
        let desc = neoalzette::cipher_description();
        let preds = predecessors(
            &desc,
            0,
            BranchPair::new(0x0000_0001, 0x0000_0000),
            8,
            &KernelLimits::default(),
        );
        assert!(preds.windows(2).all(|w| w[0].round_weight <= w[1].round_weight));
        for p in &preds {
            assert!(p.round_weight <= 8);
            assert_eq!(
                p.round_weight,
                p.sub_weights.iter().sum::<u32>(),
                "round_weight must equal the sum of sub_weights"
            );
        }
    }

    #[test]
    fn zero_budget_only_ever_yields_zero_weight_predecessors() {
        let desc = neoalzette::cipher_description();
        let preds = predecessors(
            &desc,
            0,
            BranchPair::new(0x0000_0001, 0x0000_0000),
            0,
            &KernelLimits::default(),
        );
        assert!(preds.iter().all(|p| p.round_weight == 0));
    }
}
