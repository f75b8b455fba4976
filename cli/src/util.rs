//! Shared CLI value parsers (spec §6): durations with `s|m|h|d|w` suffixes
//! and integers accepting `0x` hex or decimal; shared report printers for
//! the primary output (spec §6) so `strategy`/`detail`/`auto` render it
//! identically.

use arxhull_core::{BranchPair, SearchOutcome};

/// Exit code for a feasible result (spec §6).
pub const EXIT_FOUND: i32 = 0;
/// Exit code for bad CLI arguments or fatal resource exhaustion (spec §6).
pub const EXIT_BAD_INPUT: i32 = 1;
/// Exit code for a search that completed without a trail inside budget (spec §6).
pub const EXIT_NOT_FOUND: i32 = 2;

/// Parse a duration string like `30s`, `5m`, `2h`, `1d`, `1w`, or a bare
/// number of seconds, into seconds.
pub fn parse_duration_seconds(text: &str) -> Result<f64, String> {
    let text = text.trim();
    let (number, multiplier) = match text.chars().last() {
        Some('s') => (&text[..text.len() - 1], 1.0),
        Some('m') => (&text[..text.len() - 1], 60.0),
        Some('h') => (&text[..text.len() - 1], 3_600.0),
        Some('d') => (&text[..text.len() - 1], 86_400.0),
        Some('w') => (&text[..text.len() - 1], 604_800.0),
        _ => (text, 1.0),
    };
    number
        .trim()
        .parse::<f64>()
        .map(|n| n * multiplier)
        .map_err(|_| format!("invalid duration: {text:?}"))
}

/// Parse an integer that may be `0x`/`0X`-prefixed hex or plain decimal.
pub fn parse_int_u32(text: &str) -> Result<u32, String> {
    let text = text.trim();
    if let Some(hex) = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        u32::from_str_radix(hex, 16).map_err(|_| format!("invalid integer: {text:?}"))
    } else {
        text.parse::<u32>()
            .map_err(|_| format!("invalid integer: {text:?}"))
    }
}

/// Parse an integer that may be `0x`/`0X`-prefixed hex or plain decimal,
/// widened to `u64` (node budgets, RNG seeds).
pub fn parse_int_u64(text: &str) -> Result<u64, String> {
    let text = text.trim();
    if let Some(hex) = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        u64::from_str_radix(hex, 16).map_err(|_| format!("invalid integer: {text:?}"))
    } else {
        text.parse::<u64>()
            .map_err(|_| format!("invalid integer: {text:?}"))
    }
}

/// Print one engine run's primary output (spec §6) under a `=== label ===`
/// banner, and return the process exit code it implies: `0` on a feasible
/// result, `2` if the search completed within budget without finding one
/// (spec §7's "no trail found" final line enumerates which limits were
/// hit).
pub fn report_outcome(label: &str, start: BranchPair, outcome: &SearchOutcome) -> i32 {
    println!("=== {label} ===");
    println!("start_mask_a       0x{:08x}", start.mask_a);
    println!("start_mask_b       0x{:08x}", start.mask_b);
    println!("nodes_visited      {}", outcome.nodes_visited);
    if !outcome.found {
        println!("found              false");
        println!("stop_reasons       {}", outcome.stop_reasons.describe());
        return EXIT_NOT_FOUND;
    }
    let input = outcome.best_input.unwrap_or(start);
    println!("found              true");
    println!("best_weight        {}", outcome.best_weight);
    println!("best_input_mask_a  0x{:08x}", input.mask_a);
    println!("best_input_mask_b  0x{:08x}", input.mask_b);
    println!("stop_reasons       {}", outcome.stop_reasons.describe());
    println!("trail_steps        {}", outcome.trail.len());
    for step in &outcome.trail {
        println!(
            "  round {:>3}  weight {:>3}  out=(0x{:08x}, 0x{:08x})  in=(0x{:08x}, 0x{:08x})",
            step.round_index,
            step.round_weight,
            step.out_mask_a,
            step.out_mask_b,
            step.in_mask_a,
            step.in_mask_b,
        );
    }
    EXIT_FOUND
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_suffixed_durations() {
        assert_eq!(parse_duration_seconds("30s").unwrap(), 30.0);
        assert_eq!(parse_duration_seconds("5m").unwrap(), 300.0);
        assert_eq!(parse_duration_seconds("2h").unwrap(), 7_200.0);
        assert_eq!(parse_duration_seconds("1d").unwrap(), 86_400.0);
        assert_eq!(parse_duration_seconds("1w").unwrap(), 604_800.0);
        assert_eq!(parse_duration_seconds("10").unwrap(), 10.0);
    }

    #[test]
    fn parses_hex_and_decimal_integers() {
        assert_eq!(parse_int_u32("0x10").unwrap(), 16);
        assert_eq!(parse_int_u32("16").unwrap(), 16);
        assert_eq!(parse_int_u64("0xFF").unwrap(), 255);
    }
}
