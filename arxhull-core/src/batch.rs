//! Parallel batch driver (spec §4.7): many independent mask-pair jobs, a
//! parallel breadth pass with a global top-K, then a parallel deep pass on
//! the K selected jobs, aggregated to a single best result.

use std::io::BufRead;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::info;

use crate::checkpoint::CheckpointWriter;
use crate::cipher::CipherDescription;
use crate::error::SearchSetupError;
use crate::runtime::progress::ProgressPrefixGuard;
use crate::runtime::RuntimeContext;
use crate::search::config::{RemainingRoundPolicy, SearchConfiguration};
use crate::search::context::SearchContext;
use crate::search::engine::{Engine, SearchOutcome};
use crate::types::{BranchPair, RoundTrailStep};

/// One batch job: a start mask pair with its own round count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchJob {
    /// Round count to search this job for.
    pub round_count: u32,
    /// Start boundary.
    pub start: BranchPair,
}

/// Parse a batch file (spec §6's "Batch file format"): UTF-8, `#` line
/// comments, blank lines ignored, commas treated as whitespace, each
/// non-blank line is either `MASK_A MASK_B` (using `default_round_count`)
/// or `ROUNDS MASK_A MASK_B`. `(0, 0)` is rejected.
pub fn parse_batch_file(
    path: impl AsRef<Path>,
    default_round_count: u32,
) -> Result<Vec<BatchJob>, SearchSetupError> {
    let file = std::fs::File::open(path.as_ref())
        .map_err(|source| SearchSetupError::BatchFileIo(source.to_string()))?;
    let reader = std::io::BufReader::new(file);
    let mut jobs = Vec::new();
    for (line_no, line) in reader.lines().enumerate() {
        let line = line.map_err(|source| SearchSetupError::BatchFileIo(source.to_string()))?;
        let line = line.replace(',', " ");
        let line = match line.split_once('#') {
            Some((before, _)) => before,
            None => &line,
        };
        let tokens: Vec<&str> = line.split_whitespace().collect();
        if tokens.is_empty() {
            continue;
        }
        let job = match tokens.as_slice() {
            [mask_a, mask_b] => BatchJob {
                round_count: default_round_count,
                start: BranchPair::new(
                    parse_word(mask_a, &line, line_no)?,
                    parse_word(mask_b, &line, line_no)?,
                ),
            },
            [rounds, mask_a, mask_b] => BatchJob {
                round_count: parse_word(rounds, &line, line_no)?,
                start: BranchPair::new(
                    parse_word(mask_a, &line, line_no)?,
                    parse_word(mask_b, &line, line_no)?,
                ),
            },
            _ => {
                return Err(SearchSetupError::MalformedBatchLine {
                    line: line_no + 1,
                    text: line.to_owned(),
                })
            }
        };
        if job.start.mask_a == 0 && job.start.mask_b == 0 {
            return Err(SearchSetupError::ZeroMaskPairInBatchFile { line: line_no + 1 });
        }
        jobs.push(job);
    }
    Ok(jobs)
}

fn parse_word(token: &str, line: &str, line_no: usize) -> Result<u32, SearchSetupError> {
    let trimmed = token.trim();
    let parsed = if let Some(hex) = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
    {
        u32::from_str_radix(hex, 16)
    } else {
        trimmed.parse::<u32>()
    };
    parsed.map_err(|_| SearchSetupError::MalformedBatchLine {
        line: line_no + 1,
        text: line.to_owned(),
    })
}

/// Build `count` jobs from an RNG seed (spec §4.7 step 1's RNG-job path):
/// each job gets an independent uniformly random mask pair, rejecting
/// `(0, 0)`.
#[must_use]
pub fn build_rng_jobs(count: usize, round_count: u32, seed: u64) -> Vec<BatchJob> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut jobs = Vec::with_capacity(count);
    while jobs.len() < count {
        let mask_a: u32 = rng.gen();
        let mask_b: u32 = rng.gen();
        if mask_a == 0 && mask_b == 0 {
            continue;
        }
        jobs.push(BatchJob {
            round_count,
            start: BranchPair::new(mask_a, mask_b),
        });
    }
    jobs
}

/// A breadth-stage result for one batch job.
#[derive(Debug, Clone)]
struct BreadthSlot {
    job_index: usize,
    job: BatchJob,
    best_weight: u32,
    best_input: BranchPair,
    trail: Vec<RoundTrailStep>,
    nodes_visited: u64,
}

/// A deep-stage result for one selected job.
#[derive(Debug, Clone)]
pub struct BatchDeepResult {
    /// Index into the original `jobs[]` list.
    pub job_index: usize,
    /// The job that was deep-searched.
    pub job: BatchJob,
    /// The deep search outcome.
    pub outcome: SearchOutcome,
}

/// Full batch-driver result (spec §4.7 step 4's aggregate).
#[derive(Debug, Clone)]
pub struct BatchResult {
    /// Deep results for the K selected jobs, in selection order.
    pub deep_results: Vec<BatchDeepResult>,
    /// Index into `deep_results` of the overall winner (smallest weight,
    /// ties broken by job index).
    pub winner: usize,
}

/// Knobs for the batch breadth stage.
#[derive(Debug, Clone)]
pub struct BatchBreadthConfig {
    /// Per-job node budget during breadth.
    pub max_nodes: u64,
    /// Per-job round-predecessor cap during breadth.
    pub max_round_predecessors: usize,
    /// Worker thread count.
    pub threads: usize,
}

impl Default for BatchBreadthConfig {
    fn default() -> Self {
        Self {
            max_nodes: 50_000,
            max_round_predecessors: 8,
            threads: 4,
        }
    }
}

/// Knobs for the batch deep stage.
#[derive(Debug, Clone, Default)]
pub struct BatchDeepConfig {
    /// Node budget for each deep run; `0` = unlimited.
    pub max_nodes: u64,
    /// Wall-clock budget in seconds, per job.
    pub max_seconds: Option<f64>,
    /// Early-exit target weight.
    pub target_weight: Option<u32>,
    /// Directory checkpoint files are written into; `None` disables
    /// checkpointing for the batch run.
    pub checkpoint_dir: Option<std::path::PathBuf>,
}

fn reduced_breadth_config(base: &SearchConfiguration, job: BatchJob, breadth: &BatchBreadthConfig) -> SearchConfiguration {
    let mut cfg = base.clone();
    cfg.round_count = job.round_count;
    cfg.max_nodes = breadth.max_nodes;
    cfg.max_seconds = None;
    cfg.target_weight = None;
    cfg.kernel_limits.max_round_predecessors = breadth.max_round_predecessors;
    cfg.remaining_round_policy = RemainingRoundPolicy::AllZero;
    cfg
}

fn run_breadth(
    desc: &CipherDescription,
    base_config: &SearchConfiguration,
    jobs: &[BatchJob],
    breadth: &BatchBreadthConfig,
    top_k_count: usize,
    runtime: &RuntimeContext,
) -> Vec<BreadthSlot> {
    let next_index = AtomicUsize::new(0);
    let top_k: Mutex<Vec<BreadthSlot>> = Mutex::new(Vec::new());
    let active: Vec<AtomicUsize> = (0..breadth.threads.max(1)).map(|_| AtomicUsize::new(0)).collect();
    let done = std::sync::atomic::AtomicBool::new(false);

    std::thread::scope(|scope| {
        for worker_id in 0..breadth.threads.max(1) {
            let next_index = &next_index;
            let top_k = &top_k;
            let active = &active;
            scope.spawn(move || {
                let _prefix = ProgressPrefixGuard::set(format!("[batch-breadth/worker-{worker_id}] "));
                loop {
                    let idx = next_index.fetch_add(1, Ordering::SeqCst);
                    if idx >= jobs.len() {
                        active[worker_id].store(0, Ordering::SeqCst);
                        break;
                    }
                    active[worker_id].store(idx + 1, Ordering::SeqCst);
                    let job = jobs[idx];
                    let reduced = reduced_breadth_config(base_config, job, breadth);
                    let engine = Engine::new(desc, &reduced, runtime, job.start);
                    let mut ctx = SearchContext::new(job.start, reduced.round_count, reduced.memoization_enabled);
                    let outcome = engine.run(&mut ctx);
                    if let (true, Some(best_input)) = (outcome.found, outcome.best_input) {
                        let slot = BreadthSlot {
                            job_index: idx,
                            job,
                            best_weight: outcome.best_weight,
                            best_input,
                            trail: outcome.trail,
                            nodes_visited: outcome.nodes_visited,
                        };
                        let mut guard = top_k.lock().expect("batch top-k mutex poisoned");
                        guard.push(slot);
                        guard.sort_by(|a, b| {
                            a.best_weight
                                .cmp(&b.best_weight)
                                .then(a.job_index.cmp(&b.job_index))
                                .then(a.job.start.mask_a.cmp(&b.job.start.mask_a))
                                .then(a.job.start.mask_b.cmp(&b.job.start.mask_b))
                                .then(a.nodes_visited.cmp(&b.nodes_visited))
                        });
                        guard.truncate(top_k_count.max(1));
                    }
                }
            });
        }

        scope.spawn(|| {
            let _prefix = ProgressPrefixGuard::set("[batch-breadth/monitor] ".to_owned());
            while !done.load(Ordering::SeqCst) {
                let snapshot: Vec<usize> = active.iter().map(|a| a.load(Ordering::SeqCst)).collect();
                let processed = next_index.load(Ordering::SeqCst).min(jobs.len());
                info!(processed, total = jobs.len(), ?snapshot, "batch breadth progress");
                std::thread::sleep(Duration::from_millis(50));
                if processed >= jobs.len() && snapshot.iter().all(|&a| a == 0) {
                    break;
                }
            }
        });
    });
    done.store(true, Ordering::SeqCst);

    top_k.into_inner().expect("batch top-k mutex poisoned")
}

fn run_deep(
    desc: &CipherDescription,
    base_config: &SearchConfiguration,
    selected: &[BreadthSlot],
    deep: &BatchDeepConfig,
    runtime: &RuntimeContext,
) -> Vec<BatchDeepResult> {
    let results: Mutex<Vec<BatchDeepResult>> = Mutex::new(Vec::with_capacity(selected.len()));
    let next_index = AtomicUsize::new(0);

    std::thread::scope(|scope| {
        for worker_id in 0..selected.len().max(1) {
            let next_index = &next_index;
            let results = &results;
            scope.spawn(move || {
                let _prefix = ProgressPrefixGuard::set(format!("[batch-deep/worker-{worker_id}] "));
                loop {
                    let idx = next_index.fetch_add(1, Ordering::SeqCst);
                    let Some(slot) = selected.get(idx) else {
                        break;
                    };
                    let mut cfg = base_config.clone();
                    cfg.round_count = slot.job.round_count;
                    cfg.kernel_limits.max_round_predecessors = usize::MAX;
                    cfg.max_nodes = deep.max_nodes;
                    cfg.max_seconds = deep.max_seconds;
                    cfg.target_weight = deep.target_weight;

                    let engine = Engine::new(desc, &cfg, runtime, slot.job.start);
                    let mut ctx = SearchContext::new(slot.job.start, cfg.round_count, cfg.memoization_enabled);
                    ctx.best_weight = slot.best_weight;
                    ctx.best_input = Some(slot.best_input);
                    ctx.best_trail = slot.trail.clone();
                    if let Some(dir) = &deep.checkpoint_dir {
                        let path = dir.join(format!(
                            "batch-r{}-{:08x}-{:08x}-job{}.log",
                            slot.job.round_count, slot.job.start.mask_a, slot.job.start.mask_b, slot.job_index
                        ));
                        if let Ok(writer) = CheckpointWriter::open(path) {
                            ctx.checkpoint = Some(writer);
                        }
                    }
                    let outcome = engine.run(&mut ctx);
                    results
                        .lock()
                        .expect("batch deep results mutex poisoned")
                        .push(BatchDeepResult {
                            job_index: slot.job_index,
                            job: slot.job,
                            outcome,
                        });
                }
            });
        }
    });

    let mut results = results.into_inner().expect("batch deep results mutex poisoned");
    results.sort_by_key(|r| r.job_index);
    results
}

/// Run the full batch driver (spec §4.7) over `jobs`.
#[must_use]
pub fn run(
    desc: &CipherDescription,
    base_config: &SearchConfiguration,
    jobs: &[BatchJob],
    breadth: &BatchBreadthConfig,
    deep: &BatchDeepConfig,
    runtime: &RuntimeContext,
) -> Option<BatchResult> {
    if jobs.is_empty() {
        return None;
    }
    let top_k_count = jobs.len().min(breadth.threads.max(1));
    let selected = run_breadth(desc, base_config, jobs, breadth, top_k_count, runtime);
    if selected.is_empty() {
        return None;
    }
    let deep_results = run_deep(desc, base_config, &selected, deep, runtime);

    let mut winner = 0;
    for (i, result) in deep_results.iter().enumerate() {
        if !result.outcome.found {
            continue;
        }
        let current = &deep_results[winner];
        let better = !current.outcome.found
            || result.outcome.best_weight < current.outcome.best_weight
            || (result.outcome.best_weight == current.outcome.best_weight
                && result.job_index < current.job_index);
        if better {
            winner = i;
        }
    }

    Some(BatchResult {
        deep_results,
        winner,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn parses_two_and_three_column_lines_ignoring_comments_and_commas() {
        let dir = std::env::temp_dir();
        let path = dir.join(format!("arxhull-batch-test-{}.txt", std::process::id()));
        {
            let mut f = std::fs::File::create(&path).unwrap();
            writeln!(f, "# a comment").unwrap();
            writeln!(f, "0x1, 0x2").unwrap();
            writeln!(f, "3 0x10 0x20 # trailing comment").unwrap();
            writeln!(f).unwrap();
        }
        let jobs = parse_batch_file(&path, 5).expect("parse");
        std::fs::remove_file(&path).ok();
        assert_eq!(jobs.len(), 2);
        assert_eq!(jobs[0].round_count, 5);
        assert_eq!(jobs[0].start, BranchPair::new(1, 2));
        assert_eq!(jobs[1].round_count, 3);
        assert_eq!(jobs[1].start, BranchPair::new(0x10, 0x20));
    }

    #[test]
    fn rejects_the_zero_mask_pair() {
        let dir = std::env::temp_dir();
        let path = dir.join(format!("arxhull-batch-zero-test-{}.txt", std::process::id()));
        {
            let mut f = std::fs::File::create(&path).unwrap();
            writeln!(f, "0 0").unwrap();
        }
        let result = parse_batch_file(&path, 5);
        std::fs::remove_file(&path).ok();
        assert!(result.is_err());
    }

    #[test]
    fn rng_jobs_never_produce_the_zero_mask_pair() {
        let jobs = build_rng_jobs(32, 4, 99);
        assert_eq!(jobs.len(), 32);
        assert!(jobs.iter().all(|j| j.start.mask_a != 0 || j.start.mask_b != 0));
    }
}
