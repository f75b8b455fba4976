//! The Matsui search engine (spec §4.5): a recursive best-weight DFS over
//! round boundaries with pruning, memoization, a remaining-round lower
//! bound, node/time budgets, and target-weight early exit.

use tracing::{debug, trace, warn};

use crate::cipher::CipherDescription;
use crate::error::StopReasons;
use crate::kernel;
use crate::runtime::RuntimeContext;
use crate::search::config::{RemainingRoundPolicy, SearchConfiguration};
use crate::search::context::SearchContext;
use crate::types::BranchPair;

/// A cap on the per-round-count budget used while bootstrapping an
/// auto-generated remaining-round table when the caller leaves
/// `max_nodes` unlimited: auto-generation must still terminate in bounded
/// time, so it never runs a fully unbounded sub-search.
const AUTO_LB_NODE_BUDGET_FALLBACK: u64 = 200_000;

/// Primary output of one engine run (spec §6's "primary output").
#[derive(Debug, Clone)]
pub struct SearchOutcome {
    /// Whether any feasible trail was found within budget.
    pub found: bool,
    /// Best weight found (meaningless if `!found`).
    pub best_weight: u32,
    /// Best input mask pair found (`None` if `!found`).
    pub best_input: Option<BranchPair>,
    /// Best trail, last round first (empty if `!found`).
    pub trail: Vec<crate::types::RoundTrailStep>,
    /// Total DFS nodes visited.
    pub nodes_visited: u64,
    /// Which budgets (if any) were hit.
    pub stop_reasons: StopReasons,
}

/// One engine run's fixed inputs: the cipher description, configuration,
/// and shared runtime substrate.
pub struct Engine<'a> {
    desc: &'a CipherDescription,
    config: &'a SearchConfiguration,
    runtime: &'a RuntimeContext,
    remaining_round_lb: Vec<u32>,
}

impl<'a> Engine<'a> {
    /// Build an engine, resolving the remaining-round lower-bound table
    /// from `config.remaining_round_policy` up front.
    #[must_use]
    pub fn new(
        desc: &'a CipherDescription,
        config: &'a SearchConfiguration,
        runtime: &'a RuntimeContext,
        start: BranchPair,
    ) -> Self {
        let remaining_round_lb = resolve_remaining_round_lb(desc, config, runtime, start);
        Self {
            desc,
            config,
            runtime,
            remaining_round_lb,
        }
    }

    /// Run the DFS to completion (or until a budget/target stop fires).
    pub fn run(&self, ctx: &mut SearchContext) -> SearchOutcome {
        self.dfs(ctx, 0, ctx.start, 0);
        SearchOutcome {
            found: ctx.best_input.is_some(),
            best_weight: ctx.best_weight,
            best_input: ctx.best_input,
            trail: ctx.best_trail.clone(),
            nodes_visited: ctx.nodes_visited,
            stop_reasons: ctx.stop,
        }
    }

    fn lb(&self, rounds_left: u32) -> u32 {
        self.remaining_round_lb
            .get(rounds_left as usize)
            .copied()
            .unwrap_or(0)
    }

    fn dfs(&self, ctx: &mut SearchContext, depth: u32, boundary: BranchPair, accumulated: u32) {
        // --- Step 1: stop checks ---
        if ctx.stop.any() {
            return;
        }
        ctx.nodes_visited += 1;
        if self.config.max_nodes != 0 && ctx.nodes_visited > self.config.max_nodes {
            ctx.stop.hit_max_nodes = true;
            return;
        }
        if ctx.nodes_visited % self.config.poll_cadence() == 0 {
            let now_ns = ctx.started_at.elapsed().as_nanos() as u64;
            self.runtime.governor.poll_if_needed(
                now_ns,
                &self.runtime.bounded_resource,
                || u64::MAX,
            );
            if let Some(max_seconds) = self.config.max_seconds {
                if ctx.elapsed_sec() >= max_seconds {
                    ctx.stop.hit_max_seconds = true;
                    return;
                }
            }
        }

        // --- Step 2: prune ---
        if accumulated >= ctx.best_weight {
            return;
        }
        let rounds_left = self.config.round_count - depth;
        if accumulated.saturating_add(self.lb(rounds_left)) >= ctx.best_weight {
            return;
        }

        // --- Step 3: terminal ---
        if depth == self.config.round_count {
            ctx.record_improvement(accumulated, boundary, self.config.round_count);
            if let Some(target) = self.config.target_weight {
                if accumulated <= target {
                    ctx.stop.hit_target = true;
                }
            }
            return;
        }

        // --- Step 4: memoize ---
        if let Some(memo) = &mut ctx.memo {
            if memo.should_prune(
                depth,
                boundary,
                accumulated,
                &self.runtime.bounded_resource,
                &self.runtime.governor,
            ) {
                trace!(depth, ?boundary, "memoization prune");
                return;
            }
        }

        // --- Step 5: expand ---
        let rounds_left_after = rounds_left - 1;
        let available = if ctx.best_weight == u32::MAX {
            self.config.gate_weight_cap
        } else {
            ctx.best_weight
                .saturating_sub(accumulated)
                .saturating_sub(self.lb(rounds_left_after))
        };
        if available == 0 {
            return;
        }
        let round_cap = available.min(self.config.gate_weight_cap);
        let predecessors = kernel::predecessors(
            self.desc,
            depth,
            boundary,
            round_cap,
            &self.config.kernel_limits,
        );

        // --- Step 6: recurse ---
        for step in predecessors {
            if ctx.stop.any() {
                return;
            }
            let next_accumulated = accumulated.saturating_add(step.round_weight);
            if ctx.best_weight != u32::MAX && next_accumulated >= ctx.best_weight {
                break;
            }
            let next_boundary = step.in_boundary();
            ctx.working_trail.push(step);
            self.dfs(ctx, depth + 1, next_boundary, next_accumulated);
            ctx.working_trail.pop();
        }
    }
}

fn resolve_remaining_round_lb(
    desc: &CipherDescription,
    config: &SearchConfiguration,
    runtime: &RuntimeContext,
    start: BranchPair,
) -> Vec<u32> {
    match &config.remaining_round_policy {
        RemainingRoundPolicy::AllZero => vec![0u32; config.round_count as usize + 1],
        RemainingRoundPolicy::Provided(table) => {
            let mut lb = vec![0u32; config.round_count as usize + 1];
            for (i, slot) in lb.iter_mut().enumerate() {
                *slot = table.get(i).copied().unwrap_or(0);
            }
            lb
        }
        RemainingRoundPolicy::AutoGenerate { strict } => {
            auto_generate_remaining_round_lb(desc, config, runtime, start, *strict)
        }
    }
}

/// Bootstrap the remaining-round lower bound by running the same engine,
/// exhaustively in spirit (only the gate weight cap, no candidate/node
/// budget beyond a generation-time safety valve), for `1, 2, …,
/// round_count` rounds rooted at `start` (spec §4.5). Under `strict`, a
/// generation run that itself hit a budget is discarded (logged) in favour
/// of an all-zero bound for that entry, since a budget-truncated best
/// weight is not a valid lower bound.
fn auto_generate_remaining_round_lb(
    desc: &CipherDescription,
    config: &SearchConfiguration,
    runtime: &RuntimeContext,
    start: BranchPair,
    strict: bool,
) -> Vec<u32> {
    let mut lb = vec![0u32; config.round_count as usize + 1];
    let node_budget = if config.max_nodes == 0 {
        AUTO_LB_NODE_BUDGET_FALLBACK
    } else {
        config.max_nodes
    };
    for k in 1..=config.round_count {
        let sub_config = SearchConfiguration {
            round_count: k,
            max_nodes: node_budget,
            remaining_round_policy: RemainingRoundPolicy::AllZero,
            ..config.clone()
        };
        let engine = Engine::new(desc, &sub_config, runtime, start);
        let mut sub_ctx = SearchContext::new(start, k, sub_config.memoization_enabled);
        let outcome = engine.run(&mut sub_ctx);
        if strict && outcome.stop_reasons.any() {
            warn!(
                rounds = k,
                "auto-generated remaining-round bound discarded: generation run hit a budget"
            );
            continue;
        }
        if outcome.found {
            lb[k as usize] = outcome.best_weight;
            debug!(rounds = k, weight = outcome.best_weight, "remaining-round LB bootstrapped");
        }
    }
    lb
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::neoalzette;

    #[test]
    fn scenario_1_identity_trail_has_zero_weight() {
        let desc = neoalzette::cipher_description();
        let config = SearchConfiguration::new(1);
        let runtime = RuntimeContext::new();
        let start = BranchPair::new(0x0000_0001, 0x0000_0000);
        let engine = Engine::new(&desc, &config, &runtime, start);
        let mut ctx = SearchContext::new(start, 1, true);
        let outcome = engine.run(&mut ctx);
        assert!(outcome.found);
        assert_eq!(outcome.best_weight, 0);
    }

    #[test]
    fn scenario_2_msb_preserved_at_zero_weight() {
        let desc = neoalzette::cipher_description();
        let config = SearchConfiguration::new(1);
        let runtime = RuntimeContext::new();
        let start = BranchPair::new(0x8000_0000, 0x0000_0000);
        let engine = Engine::new(&desc, &config, &runtime, start);
        let mut ctx = SearchContext::new(start, 1, true);
        let outcome = engine.run(&mut ctx);
        assert!(outcome.found);
        assert_eq!(outcome.best_weight, 0);
    }

    #[test]
    fn scenario_4_tiny_node_budget_reports_not_found() {
        let desc = neoalzette::cipher_description();
        let mut config = SearchConfiguration::new(1);
        config.max_nodes = 1;
        let runtime = RuntimeContext::new();
        let start = BranchPair::new(0x0000_0001, 0x0000_0000);
        let engine = Engine::new(&desc, &config, &runtime, start);
        let mut ctx = SearchContext::new(start, 1, true);
        let outcome = engine.run(&mut ctx);
        assert!(!outcome.found);
        assert!(outcome.stop_reasons.hit_max_nodes);
    }

    #[test]
    fn deterministic_across_repeated_runs() {
        let desc = neoalzette::cipher_description();
        let mut config = SearchConfiguration::new(2);
        config.gate_weight_cap = 6;
        config.max_nodes = 1_000_000;
        let runtime = RuntimeContext::new();
        let start = BranchPair::new(0x0000_0001, 0x0000_0001);

        let run_once = || {
            let engine = Engine::new(&desc, &config, &runtime, start);
            let mut ctx = SearchContext::new(start, 2, true);
            engine.run(&mut ctx)
        };
        let first = run_once();
        let second = run_once();
        assert_eq!(first.best_weight, second.best_weight);
        assert_eq!(first.best_input, second.best_input);
        assert!(first.found);
        assert!(first.best_weight <= 6);
    }

    #[test]
    fn doubling_the_gate_weight_cap_never_worsens_best_weight() {
        let desc = neoalzette::cipher_description();
        let runtime = RuntimeContext::new();
        let start = BranchPair::new(0x1234_5678, 0x9ABC_DEF0);

        let mut small = SearchConfiguration::new(2);
        small.gate_weight_cap = 4;
        small.max_nodes = 2_000_000;
        let engine_small = Engine::new(&desc, &small, &runtime, start);
        let mut ctx_small = SearchContext::new(start, 2, true);
        let out_small = engine_small.run(&mut ctx_small);

        let mut large = SearchConfiguration::new(2);
        large.gate_weight_cap = 8;
        large.max_nodes = 2_000_000;
        let engine_large = Engine::new(&desc, &large, &runtime, start);
        let mut ctx_large = SearchContext::new(start, 2, true);
        let out_large = engine_large.run(&mut ctx_large);

        if out_small.found && out_large.found {
            assert!(out_large.best_weight <= out_small.best_weight);
        } else if out_small.found {
            assert!(out_large.found);
        }
    }
}
