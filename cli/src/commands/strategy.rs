//! `arxhull strategy {time|balanced|space}` (spec §6): a preset picks the
//! thread count, node budget, and candidate/memo caps; the user only
//! supplies the start (or a batch source) and, optionally, a target weight.

use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::{Args, ValueEnum};

use arxhull_core::batch::{self, BatchBreadthConfig, BatchDeepConfig};
use arxhull_core::fixtures::neoalzette;
use arxhull_core::runtime::RuntimeContext;
use arxhull_core::{BranchPair, Engine, SearchConfiguration, SearchContext};

use crate::util::{parse_int_u32, parse_int_u64, report_outcome, EXIT_BAD_INPUT};

/// Which preset governs the run's thread-count / budget / cap tradeoffs.
#[derive(Copy, Clone, Debug, ValueEnum)]
pub enum StrategyMode {
    /// Favor wall-clock speed: more threads, generous node budgets and caps.
    Time,
    /// A middle ground between speed and memory footprint.
    Balanced,
    /// Favor low memory: fewer threads, tight candidate/memo caps, governor enabled.
    Space,
}

struct Preset {
    threads: usize,
    max_nodes: u64,
    gate_weight_cap: u32,
    max_candidates_per_gate: usize,
    injection_max_elements: usize,
    governor_headroom_bytes: u64,
}

impl StrategyMode {
    fn preset(self) -> Preset {
        match self {
            Self::Time => Preset {
                threads: std::thread::available_parallelism().map_or(4, std::num::NonZeroUsize::get),
                max_nodes: 20_000_000,
                gate_weight_cap: 28,
                max_candidates_per_gate: 128,
                injection_max_elements: 512,
                governor_headroom_bytes: 0,
            },
            Self::Balanced => Preset {
                threads: std::thread::available_parallelism()
                    .map_or(2, std::num::NonZeroUsize::get)
                    .min(4),
                max_nodes: 4_000_000,
                gate_weight_cap: 24,
                max_candidates_per_gate: 64,
                injection_max_elements: 256,
                governor_headroom_bytes: 0,
            },
            Self::Space => Preset {
                threads: 1,
                max_nodes: 500_000,
                gate_weight_cap: 20,
                max_candidates_per_gate: 24,
                injection_max_elements: 64,
                // Keep at least 256 MiB of system RAM free before the
                // governor starts tightening the bounded resource's limit.
                governor_headroom_bytes: 256 * 1024 * 1024,
            },
        }
    }
}

/// `arxhull strategy {time|balanced|space} ...` (spec §6).
#[derive(Args)]
pub struct StrategyArgs {
    /// Which preset to apply.
    #[arg(value_enum)]
    mode: StrategyMode,

    /// Number of rounds to search.
    #[arg(long, default_value_t = 4)]
    round_count: u32,

    /// Output branch-A mask (hex `0x..` or decimal); pairs with `--output-branch-b-mask`.
    #[arg(long, value_parser = parse_int_u32)]
    output_branch_a_mask: Option<u32>,
    /// Output branch-B mask (hex `0x..` or decimal); pairs with `--output-branch-a-mask`.
    #[arg(long, value_parser = parse_int_u32)]
    output_branch_b_mask: Option<u32>,
    /// RNG seed for batch job generation; mutually exclusive with the explicit mask pair.
    #[arg(long, value_parser = parse_int_u64)]
    seed: Option<u64>,

    /// Node budget for a single-target run (`0` = unlimited).
    #[arg(long, value_parser = parse_int_u64)]
    total_work: Option<u64>,
    /// Run as a batch of `N` RNG-generated jobs (default 16 if bare), requires `--seed`.
    #[arg(long, num_args = 0..=1, default_missing_value = "16")]
    batch: Option<usize>,
    /// Run as a batch of jobs read from a file (spec §6 batch file format).
    #[arg(long)]
    batch_file: Option<PathBuf>,

    /// Worker thread count override (`0` = preset default).
    #[arg(long, default_value_t = 0)]
    thread_count: usize,
    /// Stop as soon as a trail of this weight or lower is found.
    #[arg(long)]
    target_best_weight: Option<u32>,
}

/// Run `strategy` and return the process exit code.
pub fn run(args: StrategyArgs) -> Result<i32> {
    let preset = args.mode.preset();
    let threads = if args.thread_count == 0 {
        preset.threads
    } else {
        args.thread_count
    };
    tracing::info!(round_count = args.round_count, threads, "strategy run starting");

    let mut config = SearchConfiguration::new(args.round_count);
    config.gate_weight_cap = preset.gate_weight_cap;
    config.kernel_limits.max_candidates_per_gate = preset.max_candidates_per_gate;
    config.kernel_limits.injection_max_elements = preset.injection_max_elements;
    config.target_weight = args.target_best_weight;
    if let Some(total_work) = args.total_work {
        config.max_nodes = total_work;
    } else {
        config.max_nodes = preset.max_nodes;
    }

    let desc = neoalzette::cipher_description();
    let runtime = RuntimeContext::new();
    if preset.governor_headroom_bytes > 0 {
        runtime.governor.enable(preset.governor_headroom_bytes);
    }

    if args.batch.is_some() || args.batch_file.is_some() {
        let jobs = if let Some(path) = &args.batch_file {
            batch::parse_batch_file(path, args.round_count)?
        } else {
            let count = args.batch.expect("checked above");
            let seed = args.seed.ok_or_else(|| {
                anyhow::anyhow!("--batch requires --seed when no --batch-file is given")
            })?;
            batch::build_rng_jobs(count, args.round_count, seed)
        };
        if jobs.is_empty() {
            bail!("no jobs to run");
        }
        let breadth = BatchBreadthConfig {
            max_nodes: preset.max_nodes.min(200_000),
            max_round_predecessors: 8,
            threads,
        };
        let deep = BatchDeepConfig {
            max_nodes: config.max_nodes,
            max_seconds: config.max_seconds,
            target_weight: config.target_weight,
            checkpoint_dir: None,
        };
        let Some(result) = batch::run(&desc, &config, &jobs, &breadth, &deep, &runtime) else {
            println!("=== strategy/batch ===");
            println!("found              false");
            return Ok(crate::util::EXIT_NOT_FOUND);
        };
        let winner = &result.deep_results[result.winner];
        return Ok(report_outcome("strategy/batch", winner.job.start, &winner.outcome));
    }

    let start = match (args.output_branch_a_mask, args.output_branch_b_mask) {
        (Some(a), Some(b)) => BranchPair::new(a, b),
        (None, None) => bail!(
            "strategy requires --output-branch-a-mask/--output-branch-b-mask (or --batch/--batch-file)"
        ),
        _ => bail!("--output-branch-a-mask and --output-branch-b-mask must be given together"),
    };
    if start.is_zero() {
        bail!("the zero-zero mask pair is not a valid search start");
    }

    let engine = Engine::new(&desc, &config, &runtime, start);
    let mut ctx = SearchContext::new(start, config.round_count, config.memoization_enabled);
    let outcome = engine.run(&mut ctx);
    Ok(report_outcome("strategy", start, &outcome))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn time_preset_has_more_threads_than_space_preset() {
        let time = StrategyMode::Time.preset();
        let space = StrategyMode::Space.preset();
        assert!(time.threads >= space.threads);
        assert!(time.max_nodes >= space.max_nodes);
    }

    #[test]
    fn bad_args_path_returns_err_without_panicking() {
        let _ = EXIT_BAD_INPUT;
    }
}
