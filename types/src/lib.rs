//! Shared configuration types for liveparse.
//!
//! These are plain serde structs so the same definitions can be read from a
//! TOML config file, overridden from the command line, and passed into the
//! decode pipeline without conversion.

pub mod formatting;

use serde::{Deserialize, Serialize};

/// Records decoded per scheduling slice before the pump hands control back.
pub const DEFAULT_YIELD_EVERY: usize = 200;

/// Compressed message size above which progress is reported.
pub const DEFAULT_PROGRESS_MIN_BYTES: usize = 102_400;

/// Consecutive unknown-kind failures before a protocol mismatch is reported.
pub const DEFAULT_MISMATCH_WARN_THRESHOLD: u32 = 5;

/// How inbound messages are decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecodeMode {
    /// Decode on the caller's task, yielding cooperatively between slices.
    #[default]
    Inline,
    /// Round-robin messages across a fixed pool of worker threads.
    Parallel,
}

/// Configuration for one pipeline instance (one per transport connection).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub mode: DecodeMode,
    /// Pool size in parallel mode. Ignored inline.
    pub workers: usize,
    pub yield_every: usize,
    pub progress_min_bytes: usize,
    pub mismatch_warn_threshold: u32,
    /// When set, only records belonging to this encounter are emitted.
    /// Flag records always pass.
    pub encounter_uid: Option<String>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            mode: DecodeMode::Inline,
            workers: 3,
            yield_every: DEFAULT_YIELD_EVERY,
            progress_min_bytes: DEFAULT_PROGRESS_MIN_BYTES,
            mismatch_warn_threshold: DEFAULT_MISMATCH_WARN_THRESHOLD,
            encounter_uid: None,
        }
    }
}

impl PipelineConfig {
    /// Number of decode workers actually used, never zero.
    pub fn pool_size(&self) -> usize {
        match self.mode {
            DecodeMode::Inline => 1,
            DecodeMode::Parallel => self.workers.max(1),
        }
    }

    /// Yield threshold clamped to at least one record per slice.
    pub fn slice_len(&self) -> usize {
        self.yield_every.max(1)
    }
}
