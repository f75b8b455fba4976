//! arxhull CLI
//!
//! Front-end for the NeoAlzette linear-hull threshold search (spec §6):
//! `strategy` (preset-driven), `detail` (every knob exposed), and `auto`
//! (breadth-then-deep driver over a single start pair).

mod commands;
mod util;

use anyhow::Result;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "arxhull")]
#[command(about = "Matsui-style threshold search for NeoAlzette linear trails", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Preset-driven search: pick a strategy and let it pick the knobs.
    Strategy(commands::StrategyArgs),
    /// Every knob exposed under its long name.
    Detail(commands::DetailArgs),
    /// Breadth scan over a mask-pair neighborhood, then a seeded deep search.
    Auto(commands::AutoArgs),
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .init();

    let cli = Cli::parse();

    let exit_code = match cli.command {
        Commands::Strategy(args) => commands::run_strategy(args)?,
        Commands::Detail(args) => commands::run_detail(args)?,
        Commands::Auto(args) => commands::run_auto(args)?,
    };
    std::process::exit(exit_code);
}
