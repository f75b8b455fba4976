//! Auto driver (spec §4.6): breadth scan over a generated mask-pair
//! neighborhood, keep the top-K feasible results, then deep-search the
//! single best candidate with its upper bound seeded from the breadth
//! result.

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::info;

use crate::checkpoint::CheckpointWriter;
use crate::cipher::CipherDescription;
use crate::runtime::progress::ProgressPrefixGuard;
use crate::runtime::RuntimeContext;
use crate::search::config::{RemainingRoundPolicy, SearchConfiguration};
use crate::search::context::SearchContext;
use crate::search::engine::{Engine, SearchOutcome};
use crate::types::BranchPair;

/// Knobs for the breadth stage (spec §6's `--auto-breadth-*` flags).
#[derive(Debug, Clone)]
pub struct AutoBreadthConfig {
    /// Target number of unique candidate pairs to build.
    pub candidate_count: usize,
    /// How many top breadth results to keep for the deep stage's selection.
    pub top_k: usize,
    /// Worker thread count for the breadth scan.
    pub threads: usize,
    /// RNG seed for the pseudo-random fill; derived from `start` if `None`.
    pub seed: Option<u64>,
    /// Per-candidate node budget during breadth.
    pub max_nodes: u64,
    /// Per-candidate round-predecessor cap during breadth (kept small).
    pub max_round_predecessors: usize,
    /// Cap on the bit-flip count used by the pseudo-random fill.
    pub max_bit_flips: u32,
}

impl Default for AutoBreadthConfig {
    fn default() -> Self {
        Self {
            candidate_count: 64,
            top_k: 4,
            threads: 4,
            seed: None,
            max_nodes: 50_000,
            max_round_predecessors: 8,
            max_bit_flips: 6,
        }
    }
}

/// Knobs for the deep stage.
#[derive(Debug, Clone, Default)]
pub struct AutoDeepConfig {
    /// Node budget for the deep search; `0` = unlimited.
    pub max_nodes: u64,
    /// Wall-clock budget in seconds.
    pub max_seconds: Option<f64>,
    /// Early-exit target weight.
    pub target_weight: Option<u32>,
    /// If set, the deep run appends checkpoint blocks to this path.
    pub checkpoint_path: Option<std::path::PathBuf>,
}

/// One breadth-stage result.
#[derive(Debug, Clone)]
pub struct BreadthResult {
    /// The candidate mask pair this result is for.
    pub start: BranchPair,
    /// Index into the original candidate list (used as a tie-break).
    pub job_index: usize,
    /// Best weight found within the breadth budget.
    pub best_weight: u32,
    /// Best input masks found within the breadth budget.
    pub best_input: BranchPair,
    /// The trail found, to seed the deep search.
    pub trail: Vec<crate::types::RoundTrailStep>,
    /// Nodes visited during this candidate's breadth run.
    pub nodes_visited: u64,
}

/// Full auto-driver result.
#[derive(Debug, Clone)]
pub struct AutoResult {
    /// Feasible breadth results, best first (spec §4.6 step 3's lex order).
    pub breadth_top_k: Vec<BreadthResult>,
    /// The deep search outcome for the #1 breadth candidate.
    pub deep: SearchOutcome,
    /// Which candidate the deep stage actually searched.
    pub deep_start: BranchPair,
}

/// Deterministically expand `start` into a neighborhood of unique mask
/// pairs (spec §4.6 step 1): the exact start, every single-bit XOR flip on
/// either lane, every byte toggle, every nibble toggle, then a
/// pseudo-random fill of multi-bit flips (geometrically biased count,
/// capped by `max_bit_flips`) until `candidate_count` unique pairs exist.
#[must_use]
pub fn build_candidate_set(
    start: BranchPair,
    candidate_count: usize,
    seed: Option<u64>,
    max_bit_flips: u32,
) -> Vec<BranchPair> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    let mut push = |p: BranchPair, seen: &mut HashSet<(u32, u32)>, out: &mut Vec<BranchPair>| {
        if seen.insert((p.mask_a, p.mask_b)) {
            out.push(p);
        }
    };
    push(start, &mut seen, &mut out);

    for bit in 0..32u32 {
        push(
            BranchPair::new(start.mask_a ^ (1 << bit), start.mask_b),
            &mut seen,
            &mut out,
        );
        push(
            BranchPair::new(start.mask_a, start.mask_b ^ (1 << bit)),
            &mut seen,
            &mut out,
        );
    }
    for byte in 0..4u32 {
        let m = 0xFFu32 << (byte * 8);
        push(
            BranchPair::new(start.mask_a ^ m, start.mask_b),
            &mut seen,
            &mut out,
        );
        push(
            BranchPair::new(start.mask_a, start.mask_b ^ m),
            &mut seen,
            &mut out,
        );
    }
    for nibble in 0..8u32 {
        let m = 0xFu32 << (nibble * 4);
        push(
            BranchPair::new(start.mask_a ^ m, start.mask_b),
            &mut seen,
            &mut out,
        );
        push(
            BranchPair::new(start.mask_a, start.mask_b ^ m),
            &mut seen,
            &mut out,
        );
    }

    let seed = seed.unwrap_or_else(|| {
        u64::from(start.mask_a) << 32 | u64::from(start.mask_b)
    });
    let mut rng = StdRng::seed_from_u64(seed);
    let max_bit_flips = max_bit_flips.max(1);
    while out.len() < candidate_count {
        // Geometric-ish bias toward few flips: repeated coin flips.
        let mut flips = 1u32;
        while flips < max_bit_flips && rng.gen_bool(0.5) {
            flips += 1;
        }
        let mut mask_a = start.mask_a;
        let mut mask_b = start.mask_b;
        for _ in 0..flips {
            let bit = rng.gen_range(0..64u32);
            if bit < 32 {
                mask_a ^= 1 << bit;
            } else {
                mask_b ^= 1 << (bit - 32);
            }
        }
        push(BranchPair::new(mask_a, mask_b), &mut seen, &mut out);
        if seen.len() >= candidate_count.max(1) * 4 && out.len() < candidate_count {
            // The neighborhood has been exhausted well beyond what's
            // reachable; avoid spinning forever on a tiny candidate_count.
            break;
        }
    }
    out.truncate(candidate_count.max(out.len().min(candidate_count)));
    out
}

fn reduced_breadth_config(base: &SearchConfiguration, breadth: &AutoBreadthConfig) -> SearchConfiguration {
    let mut cfg = base.clone();
    cfg.max_nodes = breadth.max_nodes;
    cfg.max_seconds = None;
    cfg.target_weight = None;
    cfg.kernel_limits.max_round_predecessors = breadth.max_round_predecessors;
    cfg.remaining_round_policy = RemainingRoundPolicy::AllZero;
    cfg
}

/// Run the breadth scan over `candidates` using a worker pool that pulls
/// indices from an atomic counter (spec §4.6 step 2), maintaining a
/// mutex-guarded top-K ordered by `(best_weight, job_index, mask_a,
/// mask_b, nodes)` (step 3).
pub fn run_breadth(
    desc: &CipherDescription,
    base_config: &SearchConfiguration,
    candidates: &[BranchPair],
    breadth: &AutoBreadthConfig,
    runtime: &RuntimeContext,
) -> Vec<BreadthResult> {
    let reduced = reduced_breadth_config(base_config, breadth);
    let next_index = AtomicUsize::new(0);
    let top_k: Mutex<Vec<BreadthResult>> = Mutex::new(Vec::new());
    let active: Vec<AtomicUsize> = (0..breadth.threads.max(1)).map(|_| AtomicUsize::new(0)).collect();
    let done = std::sync::atomic::AtomicBool::new(false);

    std::thread::scope(|scope| {
        for worker_id in 0..breadth.threads.max(1) {
            let next_index = &next_index;
            let top_k = &top_k;
            let active = &active;
            let reduced = &reduced;
            scope.spawn(move || {
                let _prefix = ProgressPrefixGuard::set(format!("[breadth/worker-{worker_id}] "));
                loop {
                    let idx = next_index.fetch_add(1, Ordering::SeqCst);
                    if idx >= candidates.len() {
                        active[worker_id].store(0, Ordering::SeqCst);
                        break;
                    }
                    active[worker_id].store(idx + 1, Ordering::SeqCst);
                    let start = candidates[idx];
                    let engine = Engine::new(desc, reduced, runtime, start);
                    let mut ctx = SearchContext::new(start, reduced.round_count, reduced.memoization_enabled);
                    let outcome = engine.run(&mut ctx);
                    if let (true, Some(best_input)) = (outcome.found, outcome.best_input) {
                        let result = BreadthResult {
                            start,
                            job_index: idx,
                            best_weight: outcome.best_weight,
                            best_input,
                            trail: outcome.trail,
                            nodes_visited: outcome.nodes_visited,
                        };
                        let mut guard = top_k.lock().expect("top-k mutex poisoned");
                        guard.push(result);
                        guard.sort_by(|a, b| {
                            a.best_weight
                                .cmp(&b.best_weight)
                                .then(a.job_index.cmp(&b.job_index))
                                .then(a.start.mask_a.cmp(&b.start.mask_a))
                                .then(a.start.mask_b.cmp(&b.start.mask_b))
                                .then(a.nodes_visited.cmp(&b.nodes_visited))
                        });
                        guard.truncate(breadth.top_k.max(1));
                    }
                }
            });
        }

        scope.spawn(|| {
            let _prefix = ProgressPrefixGuard::set("[breadth/monitor] ".to_owned());
            while !done.load(Ordering::SeqCst) {
                let snapshot: Vec<usize> = active.iter().map(|a| a.load(Ordering::SeqCst)).collect();
                let processed = next_index.load(Ordering::SeqCst).min(candidates.len());
                info!(processed, total = candidates.len(), ?snapshot, "breadth progress");
                std::thread::sleep(Duration::from_millis(50));
                if processed >= candidates.len() && snapshot.iter().all(|&a| a == 0) {
                    break;
                }
            }
        });
    });
    done.store(true, Ordering::SeqCst);

    top_k.into_inner().expect("top-k mutex poisoned")
}

/// Run the deep stage on `candidate` (spec §4.6 step 4): unlimited round
/// predecessors, deep node/time budgets, an upper bound seeded from the
/// breadth result so the deep run never reports worse, and an optional
/// checkpoint writer.
pub fn run_deep(
    desc: &CipherDescription,
    base_config: &SearchConfiguration,
    candidate: &BreadthResult,
    deep: &AutoDeepConfig,
    runtime: &RuntimeContext,
) -> SearchOutcome {
    let mut cfg = base_config.clone();
    cfg.kernel_limits.max_round_predecessors = usize::MAX;
    cfg.max_nodes = deep.max_nodes;
    cfg.max_seconds = deep.max_seconds;
    cfg.target_weight = deep.target_weight;

    let engine = Engine::new(desc, &cfg, runtime, candidate.start);
    let mut ctx = SearchContext::new(candidate.start, cfg.round_count, cfg.memoization_enabled);
    ctx.best_weight = candidate.best_weight;
    ctx.best_input = Some(candidate.best_input);
    ctx.best_trail = candidate.trail.clone();
    if let Some(path) = &deep.checkpoint_path {
        if let Ok(writer) = CheckpointWriter::open(path) {
            ctx.checkpoint = Some(writer);
        }
    }
    engine.run(&mut ctx)
}

/// Run the full two-stage auto driver (spec §4.6).
pub fn run(
    desc: &CipherDescription,
    base_config: &SearchConfiguration,
    start: BranchPair,
    breadth: &AutoBreadthConfig,
    deep: &AutoDeepConfig,
    runtime: &RuntimeContext,
) -> Option<AutoResult> {
    let candidates = build_candidate_set(start, breadth.candidate_count, breadth.seed, breadth.max_bit_flips);
    let breadth_top_k = run_breadth(desc, base_config, &candidates, breadth, runtime);
    let best = breadth_top_k.first()?;
    let deep_outcome = run_deep(desc, base_config, best, deep, runtime);
    Some(AutoResult {
        deep_start: best.start,
        breadth_top_k,
        deep: deep_outcome,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn candidate_set_always_includes_start_first() {
        let start = BranchPair::new(0x1, 0x0);
        let candidates = build_candidate_set(start, 16, Some(42), 4);
        assert_eq!(candidates[0], start);
    }

    #[test]
    fn candidate_set_is_deterministic_given_a_seed() {
        let start = BranchPair::new(0x1234_5678, 0x9ABC_DEF0);
        let a = build_candidate_set(start, 32, Some(7), 5);
        let b = build_candidate_set(start, 32, Some(7), 5);
        assert_eq!(a, b);
    }

    #[test]
    fn candidate_set_contains_single_bit_flips() {
        let start = BranchPair::new(0, 0);
        let candidates = build_candidate_set(start, 16, Some(1), 3);
        assert!(candidates.contains(&BranchPair::new(1, 0)));
        assert!(candidates.contains(&BranchPair::new(0, 1)));
    }
}
