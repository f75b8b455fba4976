//! `arxhull detail` (spec §6): every `SearchConfiguration`/kernel-limit knob
//! exposed under its own long flag, for users who want to bypass the
//! `strategy` presets entirely.

use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::Args;

use arxhull_core::batch::{self, BatchBreadthConfig, BatchDeepConfig};
use arxhull_core::checkpoint::CheckpointWriter;
use arxhull_core::fixtures::neoalzette;
use arxhull_core::kernel::KernelLimits;
use arxhull_core::runtime::RuntimeContext;
use arxhull_core::search::config::RemainingRoundPolicy;
use arxhull_core::{BranchPair, Engine, SearchConfiguration, SearchContext};

use crate::util::{parse_duration_seconds, parse_int_u32, parse_int_u64, report_outcome};

/// `arxhull detail ...` (spec §6): long-form equivalent of `strategy`.
#[derive(Args)]
pub struct DetailArgs {
    /// Number of rounds to search.
    #[arg(long, default_value_t = 4)]
    round_count: u32,
    /// Output branch-A mask; pairs with `--output-branch-b-mask`.
    #[arg(long, value_parser = parse_int_u32)]
    output_branch_a_mask: Option<u32>,
    /// Output branch-B mask; pairs with `--output-branch-a-mask`.
    #[arg(long, value_parser = parse_int_u32)]
    output_branch_b_mask: Option<u32>,

    /// Hard per-round weight ceiling (spec §4.4's per-gate weight caps).
    #[arg(long, default_value_t = 32)]
    gate_weight_cap: u32,
    /// Max candidates kept per gate enumeration.
    #[arg(long, default_value_t = 64)]
    max_candidates_per_gate: usize,
    /// Max distinct masks walked out of one injection's affine subspace.
    #[arg(long, default_value_t = 256)]
    injection_max_elements: usize,
    /// Node budget passed to the injection subspace walker.
    #[arg(long, value_parser = parse_int_u64, default_value = "4096")]
    injection_node_budget: u64,
    /// Max predecessors returned per round after weight-sort truncation (`0` = unlimited).
    #[arg(long, value_parser = parse_int_u64, default_value = "256")]
    max_round_predecessors: u64,

    /// Node budget for the run (`0` = unlimited).
    #[arg(long, value_parser = parse_int_u64, default_value = "0")]
    max_nodes: u64,
    /// Wall-clock budget, accepting `s|m|h|d|w` suffixes.
    #[arg(long, value_parser = parse_duration_seconds)]
    max_seconds: Option<f64>,
    /// Stop as soon as a trail of this weight or lower is found.
    #[arg(long)]
    target_best_weight: Option<u32>,
    /// Disable the per-depth memoization table.
    #[arg(long)]
    no_memoization: bool,
    /// Auto-generate the remaining-round lower-bound table instead of using all-zero.
    #[arg(long)]
    auto_remaining_round_bound: bool,
    /// Reject a budget-truncated auto-generated bound rather than trust it (requires
    /// `--auto-remaining-round-bound`).
    #[arg(long)]
    strict_lower_bound: bool,
    /// Progress/log verbosity (`0` = silent).
    #[arg(long, default_value_t = 0)]
    verbosity: u8,

    /// Append checkpoint blocks to this file on every best-weight improvement.
    #[arg(long)]
    checkpoint_file: Option<PathBuf>,

    /// Worker thread count for batch mode (`0` = auto).
    #[arg(long, default_value_t = 0)]
    thread_count: usize,
    /// Run as a batch of `N` RNG-generated jobs (requires `--seed`).
    #[arg(long, num_args = 0..=1, default_missing_value = "16")]
    batch: Option<usize>,
    /// Run as a batch of jobs read from a file (spec §6 batch file format).
    #[arg(long)]
    batch_file: Option<PathBuf>,
    /// RNG seed for batch job generation.
    #[arg(long, value_parser = parse_int_u64)]
    seed: Option<u64>,
    /// Per-job node budget during batch breadth.
    #[arg(long, value_parser = parse_int_u64, default_value = "50000")]
    batch_breadth_max_nodes: u64,
    /// Directory batch deep-stage checkpoint files are written into.
    #[arg(long)]
    batch_checkpoint_dir: Option<PathBuf>,
}

/// Run `detail` and return the process exit code.
pub fn run(args: DetailArgs) -> Result<i32> {
    tracing::info!(round_count = args.round_count, gate_weight_cap = args.gate_weight_cap, "detail run starting");
    let kernel_limits = KernelLimits {
        max_candidates_per_gate: args.max_candidates_per_gate,
        injection_max_elements: args.injection_max_elements,
        injection_node_budget: args.injection_node_budget,
        max_round_predecessors: if args.max_round_predecessors == 0 {
            usize::MAX
        } else {
            args.max_round_predecessors as usize
        },
    };
    let remaining_round_policy = if args.auto_remaining_round_bound {
        RemainingRoundPolicy::AutoGenerate {
            strict: args.strict_lower_bound,
        }
    } else {
        RemainingRoundPolicy::AllZero
    };

    let mut config = SearchConfiguration::new(args.round_count);
    config.gate_weight_cap = args.gate_weight_cap;
    config.kernel_limits = kernel_limits;
    config.max_nodes = args.max_nodes;
    config.max_seconds = args.max_seconds;
    config.target_weight = args.target_best_weight;
    config.memoization_enabled = !args.no_memoization;
    config.remaining_round_policy = remaining_round_policy;
    config.verbosity = args.verbosity;

    let desc = neoalzette::cipher_description();
    let runtime = RuntimeContext::new();

    if args.batch.is_some() || args.batch_file.is_some() {
        let jobs = if let Some(path) = &args.batch_file {
            batch::parse_batch_file(path, args.round_count)?
        } else {
            let count = args.batch.expect("checked above");
            let seed = args
                .seed
                .ok_or_else(|| anyhow::anyhow!("--batch requires --seed when no --batch-file is given"))?;
            batch::build_rng_jobs(count, args.round_count, seed)
        };
        if jobs.is_empty() {
            bail!("no jobs to run");
        }
        let threads = if args.thread_count == 0 {
            std::thread::available_parallelism().map_or(4, std::num::NonZeroUsize::get)
        } else {
            args.thread_count
        };
        let breadth = BatchBreadthConfig {
            max_nodes: args.batch_breadth_max_nodes,
            max_round_predecessors: 8,
            threads,
        };
        let deep = BatchDeepConfig {
            max_nodes: config.max_nodes,
            max_seconds: config.max_seconds,
            target_weight: config.target_weight,
            checkpoint_dir: args.batch_checkpoint_dir,
        };
        let Some(result) = batch::run(&desc, &config, &jobs, &breadth, &deep, &runtime) else {
            println!("=== detail/batch ===");
            println!("found              false");
            return Ok(crate::util::EXIT_NOT_FOUND);
        };
        let winner = &result.deep_results[result.winner];
        return Ok(report_outcome("detail/batch", winner.job.start, &winner.outcome));
    }

    let start = match (args.output_branch_a_mask, args.output_branch_b_mask) {
        (Some(a), Some(b)) => BranchPair::new(a, b),
        (None, None) => bail!(
            "detail requires --output-branch-a-mask/--output-branch-b-mask (or --batch/--batch-file)"
        ),
        _ => bail!("--output-branch-a-mask and --output-branch-b-mask must be given together"),
    };
    if start.is_zero() {
        bail!("the zero-zero mask pair is not a valid search start");
    }

    let engine = Engine::new(&desc, &config, &runtime, start);
    let mut ctx = SearchContext::new(start, config.round_count, config.memoization_enabled);
    if let Some(path) = &args.checkpoint_file {
        ctx.checkpoint = Some(CheckpointWriter::open(path)?);
    }
    let outcome = engine.run(&mut ctx);
    Ok(report_outcome("detail", start, &outcome))
}
