//! CLI commands: `strategy` (preset-driven), `detail` (every knob exposed),
//! and `auto` (breadth → deep driver), per spec §6.

mod auto;
mod detail;
mod strategy;

pub use auto::{run as run_auto, AutoArgs};
pub use detail::{run as run_detail, DetailArgs};
pub use strategy::{run as run_strategy, StrategyArgs, StrategyMode};
