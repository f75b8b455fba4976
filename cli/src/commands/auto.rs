//! `arxhull auto` (spec §6, §4.6): breadth scan over a generated mask-pair
//! neighborhood, then a deep search on the single best candidate seeded
//! with the breadth result's upper bound.

use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::Args;

use arxhull_core::auto::{self, AutoBreadthConfig, AutoDeepConfig};
use arxhull_core::fixtures::neoalzette;
use arxhull_core::runtime::RuntimeContext;
use arxhull_core::{BranchPair, SearchConfiguration};

use crate::util::{parse_duration_seconds, parse_int_u32, parse_int_u64, report_outcome};

/// `arxhull auto --round-count R --output-branch-a-mask MA --output-branch-b-mask MB ...` (spec §6).
#[derive(Args)]
pub struct AutoArgs {
    /// Number of rounds to search.
    #[arg(long)]
    round_count: u32,
    /// Output branch-A mask.
    #[arg(long, value_parser = parse_int_u32)]
    output_branch_a_mask: u32,
    /// Output branch-B mask.
    #[arg(long, value_parser = parse_int_u32)]
    output_branch_b_mask: u32,

    /// Target number of unique breadth candidate pairs to build.
    #[arg(long, default_value_t = 64)]
    auto_breadth_jobs: usize,
    /// How many top breadth results to keep.
    #[arg(long = "auto-breadth-top_candidates", default_value_t = 4)]
    auto_breadth_top_candidates: usize,
    /// Worker thread count for the breadth scan (`0` = auto).
    #[arg(long, default_value_t = 0)]
    auto_breadth_threads: usize,
    /// RNG seed for the breadth neighborhood's pseudo-random fill.
    #[arg(long, value_parser = parse_int_u64)]
    auto_breadth_seed: Option<u64>,
    /// Per-candidate node budget during breadth.
    #[arg(long, value_parser = parse_int_u64, default_value = "50000")]
    auto_breadth_maxnodes: u64,
    /// Per-candidate round-predecessor cap during breadth.
    #[arg(long, default_value_t = 8)]
    auto_breadth_hcap: usize,
    /// Cap on the bit-flip count used by the breadth neighborhood's pseudo-random fill.
    #[arg(long, default_value_t = 6)]
    auto_breadth_max_bitflips: u32,

    /// Node budget for the deep stage (`0` = unlimited).
    #[arg(long, value_parser = parse_int_u64, default_value = "0")]
    auto_deep_maxnodes: u64,
    /// Wall-clock budget for the deep stage, accepting `s|m|h|d|w` suffixes.
    #[arg(long, value_parser = parse_duration_seconds)]
    auto_max_time: Option<f64>,
    /// Early-exit target weight for the deep stage.
    #[arg(long)]
    auto_target_best_weight: Option<u32>,

    /// Append checkpoint blocks to this file for the deep stage.
    #[arg(long)]
    checkpoint_file: Option<PathBuf>,
}

/// Run `auto` and return the process exit code.
pub fn run(args: AutoArgs) -> Result<i32> {
    let start = BranchPair::new(args.output_branch_a_mask, args.output_branch_b_mask);
    if start.is_zero() {
        bail!("the zero-zero mask pair is not a valid search start");
    }
    tracing::info!(round_count = args.round_count, ?start, "auto run starting");

    let base_config = SearchConfiguration::new(args.round_count);
    let desc = neoalzette::cipher_description();
    let runtime = RuntimeContext::new();

    let threads = if args.auto_breadth_threads == 0 {
        std::thread::available_parallelism().map_or(4, std::num::NonZeroUsize::get)
    } else {
        args.auto_breadth_threads
    };
    let breadth = AutoBreadthConfig {
        candidate_count: args.auto_breadth_jobs,
        top_k: args.auto_breadth_top_candidates,
        threads,
        seed: args.auto_breadth_seed,
        max_nodes: args.auto_breadth_maxnodes,
        max_round_predecessors: args.auto_breadth_hcap,
        max_bit_flips: args.auto_breadth_max_bitflips,
    };
    let deep = AutoDeepConfig {
        max_nodes: args.auto_deep_maxnodes,
        max_seconds: args.auto_max_time,
        target_weight: args.auto_target_best_weight,
        checkpoint_path: args.checkpoint_file,
    };

    let Some(result) = auto::run(&desc, &base_config, start, &breadth, &deep, &runtime) else {
        println!("=== auto ===");
        println!("found              false");
        println!("reason             breadth scan produced no feasible candidate");
        return Ok(crate::util::EXIT_NOT_FOUND);
    };

    println!("=== auto/breadth ===");
    for (rank, candidate) in result.breadth_top_k.iter().enumerate() {
        println!(
            "  #{rank} weight={} start=(0x{:08x}, 0x{:08x}) nodes={}",
            candidate.best_weight, candidate.start.mask_a, candidate.start.mask_b, candidate.nodes_visited
        );
    }
    Ok(report_outcome("auto/deep", result.deep_start, &result.deep))
}
