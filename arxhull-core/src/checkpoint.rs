//! Checkpoint writer (spec §6): an append-only, human-readable log of
//! best-weight improvements, one `=== checkpoint ===` block per
//! improvement.

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::Local;

use crate::types::{BranchPair, RoundTrailStep};

/// Everything one checkpoint block reports (spec §6's exact field list).
#[derive(Debug, Clone)]
pub struct CheckpointInfo<'a> {
    /// Why this checkpoint fired (e.g. `"new best weight"`).
    pub reason: &'a str,
    /// Round count of the run that produced this checkpoint.
    pub rounds: u32,
    /// The search start boundary.
    pub start: BranchPair,
    /// The best weight found so far.
    pub best_weight: u32,
    /// Nodes visited so far.
    pub nodes_visited: u64,
    /// Wall-clock seconds elapsed so far.
    pub elapsed_sec: f64,
    /// The best input mask pair found so far.
    pub best_input: BranchPair,
    /// The current best trail, in the order recorded by the DFS (last round
    /// first, matching the primary output's documented order).
    pub trail: &'a [RoundTrailStep],
}

/// An append-only checkpoint log file, owned by exactly one engine run
/// (spec §5: "checkpoint writer | owning engine only | not shared").
#[derive(Debug)]
pub struct CheckpointWriter {
    path: PathBuf,
    file: File,
}

impl CheckpointWriter {
    /// Open (creating if necessary) `path` for appending.
    pub fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self { path, file })
    }

    /// The path this writer appends to.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one checkpoint block.
    pub fn write_block(&mut self, info: &CheckpointInfo<'_>) -> io::Result<()> {
        let timestamp_local = Local::now().to_rfc3339();
        writeln!(self.file, "=== checkpoint ===")?;
        writeln!(self.file, "timestamp_local {timestamp_local}")?;
        writeln!(self.file, "reason {}", info.reason)?;
        writeln!(self.file, "rounds {}", info.rounds)?;
        writeln!(self.file, "start_mask_a {}", hex(info.start.mask_a))?;
        writeln!(self.file, "start_mask_b {}", hex(info.start.mask_b))?;
        writeln!(self.file, "best_weight {}", info.best_weight)?;
        writeln!(self.file, "nodes_visited {}", info.nodes_visited)?;
        writeln!(self.file, "elapsed_sec {:.6}", info.elapsed_sec)?;
        writeln!(
            self.file,
            "best_input_mask_a {}",
            hex(info.best_input.mask_a)
        )?;
        writeln!(
            self.file,
            "best_input_mask_b {}",
            hex(info.best_input.mask_b)
        )?;
        writeln!(self.file, "trail_steps {}", info.trail.len())?;
        for step in info.trail {
            writeln!(
                self.file,
                "{} {} {} {} {} {}",
                step.round_index,
                step.round_weight,
                hex(step.out_mask_a),
                hex(step.out_mask_b),
                hex(step.in_mask_a),
                hex(step.in_mask_b),
            )?;
        }
        self.file.flush()
    }
}

fn hex(word: u32) -> String {
    format!("0x{word:08x}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    #[test]
    fn writes_well_formed_block() {
        let dir = std::env::temp_dir();
        let path = dir.join(format!(
            "arxhull-checkpoint-test-{}.log",
            std::process::id()
        ));
        let mut writer = CheckpointWriter::open(&path).expect("open checkpoint file");
        let trail = vec![RoundTrailStep {
            round_index: 0,
            out_mask_a: 0x1,
            out_mask_b: 0x2,
            in_mask_a: 0x3,
            in_mask_b: 0x4,
            sub_weights: [0, 0, 0, 0, 0, 0],
            round_weight: 0,
        }];
        writer
            .write_block(&CheckpointInfo {
                reason: "new best weight",
                rounds: 1,
                start: BranchPair::new(0x1, 0x2),
                best_weight: 0,
                nodes_visited: 10,
                elapsed_sec: 0.001,
                best_input: BranchPair::new(0x3, 0x4),
                trail: &trail,
            })
            .expect("write block");
        drop(writer);

        let mut contents = String::new();
        File::open(&path)
            .unwrap()
            .read_to_string(&mut contents)
            .unwrap();
        assert!(contents.contains("=== checkpoint ==="));
        assert!(contents.contains("best_weight 0"));
        assert!(contents.contains("0x00000003"));
        assert!(contents.contains("0 0 0x00000001 0x00000002 0x00000003 0x00000004"));
        std::fs::remove_file(&path).ok();
    }
}
