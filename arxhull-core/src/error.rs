//! Error taxonomy (spec §7).
//!
//! Only [`BadInput`](SearchSetupError) is a "real" error that a caller must handle —
//! everything else (`ResourceExhausted`, `Budget`, `Infeasible`) is a recoverable,
//! expected outcome modeled as data (a stop-reason flag, a self-disable, a skipped
//! candidate) rather than a propagated [`Result`]. See [`crate::search::engine`] and
//! [`crate::runtime`] for where those are threaded through as plain state.

use thiserror::Error;

/// Invalid configuration or CLI input, caught before a search ever starts.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SearchSetupError {
    /// `(mask_a, mask_b) == (0, 0)` was given as a search start.
    #[error("zero-zero mask pair is not a valid search start")]
    ZeroZeroMaskPair,
    /// An RNG seed was required (batch RNG jobs) but none was supplied.
    #[error("RNG job generation requires a seed")]
    MissingSeed,
    /// `round_count` is zero or otherwise out of range.
    #[error("invalid round count: {0}")]
    InvalidRoundCount(u32),
    /// A batch file line could not be parsed.
    #[error("malformed batch file line {line}: {text:?}")]
    MalformedBatchLine {
        /// 1-based line number.
        line: usize,
        /// The offending line text.
        text: String,
    },
    /// `(0, 0)` was given as a batch file job's mask pair.
    #[error("zero-zero mask pair rejected at batch file line {line}")]
    ZeroMaskPairInBatchFile {
        /// 1-based line number.
        line: usize,
    },
    /// The batch file could not be opened or read.
    #[error("could not read batch file: {0}")]
    BatchFileIo(String),
}

/// Why a recoverable component (memoization table, candidate cache) stopped
/// contributing to a run. Never propagated as an `Err` — read by callers that
/// want to report it (e.g. the checkpoint writer's final "HIT ..." summary).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelfDisableReason {
    /// The bounded allocator refused an allocation for this component.
    ResourceExhausted,
    /// The memory governor is under pressure and this component yields to it.
    MemoryPressure,
}

/// Why a search engine run stopped without exhausting the DFS.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StopReasons {
    /// `max_nodes` was reached.
    pub hit_max_nodes: bool,
    /// `max_seconds` was reached.
    pub hit_max_seconds: bool,
    /// `target_weight` was reached.
    pub hit_target: bool,
}

impl StopReasons {
    /// No stop flags set — the DFS ran to natural completion.
    #[must_use]
    pub const fn none() -> Self {
        Self {
            hit_max_nodes: false,
            hit_max_seconds: false,
            hit_target: false,
        }
    }

    /// Whether any stop flag is set.
    #[must_use]
    pub const fn any(&self) -> bool {
        self.hit_max_nodes || self.hit_max_seconds || self.hit_target
    }

    /// Render as the `HIT max_nodes | HIT max_seconds | HIT target` line from §7.
    #[must_use]
    pub fn describe(&self) -> String {
        let mut parts = Vec::new();
        if self.hit_max_nodes {
            parts.push("HIT max_nodes");
        }
        if self.hit_max_seconds {
            parts.push("HIT max_seconds");
        }
        if self.hit_target {
            parts.push("HIT target");
        }
        if parts.is_empty() {
            "exhausted search space".to_owned()
        } else {
            parts.join(" | ")
        }
    }
}
