//! Command pipelines.
//!
//! Each pipeline has a synchronous core working on an already loaded tree and
//! in-memory assignments, and an async [`AppContext`](crate::ctx::AppContext)
//! entry point doing the file I/O around it.

use std::path::PathBuf;

/// Build a profile's fragment list and merge it.
pub mod assemble;

/// Merge fragments into a full or minimal configuration.
pub mod merge;

/// Split a configuration into per-section fragments.
pub mod split;

/// What a command wrote.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Stats {
    /// Number of symbols written.
    pub nb_symbols: usize,
    /// Files written; empty when writing to stdout.
    pub files: Vec<PathBuf>,
}
