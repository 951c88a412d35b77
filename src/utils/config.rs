//! Application configuration constants.
//! Tuning and defaults in one place.

use std::time::Duration;

// ---- Worker threads ----

/// Limits for the walker pool when the caller does not pick a size.
/// Use [`WorkerThreadLimits::current()`] to fill `all_threads` from rayon; the rest are const.
#[derive(Clone, Copy, Debug)]
pub struct WorkerThreadLimits {
    /// Available threads (from rayon); set by [`WorkerThreadLimits::current()`].
    pub all_threads: usize,
    /// Never fewer than this, even on a single core: walks are I/O bound.
    pub floor: usize,
    /// Upper bound; more threads mostly add contention on one filesystem.
    pub max: usize,
}

impl Default for WorkerThreadLimits {
    fn default() -> Self {
        Self {
            all_threads: 0, // use current() to set from rayon
            floor: Self::FLOOR_THREADS,
            max: Self::MAX_THREADS,
        }
    }
}

impl WorkerThreadLimits {
    pub const FLOOR_THREADS: usize = 2;
    pub const MAX_THREADS: usize = 16;

    /// Build limits with `all_threads` set from `rayon::current_num_threads()`.
    pub fn current() -> Self {
        Self {
            all_threads: rayon::current_num_threads(),
            ..Self::default()
        }
    }
}

// ---- Result stream ----

/// Capacity of the Result Stream. A full stream blocks the walk (backpressure).
pub const RESULT_CHANNEL_CAP: usize = 1000;

/// How often a producer blocked on a full stream re-checks for cancellation.
pub const SEND_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Capacity of the output sink channel (blocks of text, not lines).
pub const OUTPUT_CHANNEL_CAP: usize = 256;

// ---- Softlinks ----

/// Suffix appended to a symlink when `softlinks rewrite` replaces it.
pub const BACKUP_SUFFIX: &str = ".softlink-bak";

// ---- Listing ----

/// Column width for `walk ls` short listings.
pub const DEFAULT_LIST_WIDTH: usize = 80;

// ---- Dropbox ----

/// Marker Dropbox inserts into the name of a conflicted copy.
pub const CONFLICT_PATTERN: &str = r"\(.* conflicted copy \d{4}-\d{2}-\d{2}\)";

// ---- Hashing ----

/// Hashing I/O thresholds and buffer sizes.
pub struct HashingConsts;

impl HashingConsts {
    /// File size above which hashing uses memory-mapped I/O (bytes). 100 MB.
    pub const HASH_MMAP_THRESHOLD: u64 = 100 * 1024 * 1024;
    /// Chunk size for reading files below mmap threshold (bytes). 1 MB.
    pub const HASH_READ_CHUNK_SIZE: usize = 1024 * 1024;
}

// ---- Config file ----

/// Optional per-directory settings file read by the CLI.
pub fn config_filename() -> String {
    format!(".{}.toml", env!("CARGO_PKG_NAME"))
}
