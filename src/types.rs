//! Public and internal types for the syncwalk API and pipeline.

use serde::Serialize;
use std::ffi::{OsStr, OsString};
use std::fs::Metadata;
use std::path::{Path, PathBuf};

use crate::pipeline::CancelToken;

/// Entry type as seen by `lstat` (symlinks are not followed).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    File,
    Dir,
    Symlink,
    Other,
}

impl FileKind {
    pub fn from_metadata(meta: &Metadata) -> Self {
        let ft = meta.file_type();
        if ft.is_symlink() {
            FileKind::Symlink
        } else if ft.is_dir() {
            FileKind::Dir
        } else if ft.is_file() {
            FileKind::File
        } else {
            FileKind::Other
        }
    }

    /// Single-letter code used by the match language (`d`, `f`, `l`). `Other` has none.
    pub fn code(self) -> Option<char> {
        match self {
            FileKind::Dir => Some('d'),
            FileKind::File => Some('f'),
            FileKind::Symlink => Some('l'),
            FileKind::Other => None,
        }
    }

    pub fn from_code(code: char) -> Option<Self> {
        match code {
            'd' => Some(FileKind::Dir),
            'f' => Some(FileKind::File),
            'l' => Some(FileKind::Symlink),
            _ => None,
        }
    }
}

/// One directory entry with its metadata. Immutable once read.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Entry {
    /// Lossy UTF-8 form of `file_name`, for matching and display.
    pub name: String,
    /// Name exactly as the filesystem returned it; used to build paths.
    pub file_name: OsString,
    pub kind: FileKind,
    /// Size in bytes (as reported by lstat; symlinks report the target string length).
    pub size: u64,
    /// Modification time in nanoseconds since epoch (0 when unavailable).
    pub mtime_ns: i64,
}

impl Entry {
    pub fn new(file_name: impl Into<OsString>, kind: FileKind, size: u64, mtime_ns: i64) -> Self {
        let file_name = file_name.into();
        Entry {
            name: file_name.to_string_lossy().into_owned(),
            file_name,
            kind,
            size,
            mtime_ns,
        }
    }

    pub fn from_metadata(file_name: OsString, meta: &Metadata) -> Self {
        let mtime_ns = meta
            .modified()
            .ok()
            .and_then(|t| t.duration_since(std::time::UNIX_EPOCH).ok())
            .map(|d| d.as_nanos() as i64)
            .unwrap_or(0);
        Entry::new(file_name, FileKind::from_metadata(meta), meta.len(), mtime_ns)
    }

    /// Same entry under the name it was listed as.
    pub fn with_file_name(self, file_name: OsString) -> Self {
        Entry::new(file_name, self.kind, self.size, self.mtime_ns)
    }

    pub fn is_dir(&self) -> bool {
        self.kind == FileKind::Dir
    }

    pub fn is_symlink(&self) -> bool {
        self.kind == FileKind::Symlink
    }
}

/// A match emitted by a filtered traversal. `name` is empty when the directory itself matched.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct Found {
    #[serde(serialize_with = "serialize_lossy_path")]
    pub prefix: PathBuf,
    /// Lossy UTF-8 name, for display and JSON.
    pub name: String,
    /// Exact name; [`Found::path`] joins this one.
    #[serde(skip)]
    pub file_name: OsString,
}

impl Found {
    pub fn new(prefix: impl Into<PathBuf>, name: impl Into<OsString>) -> Self {
        let file_name = name.into();
        Found {
            prefix: prefix.into(),
            name: file_name.to_string_lossy().into_owned(),
            file_name,
        }
    }

    /// The directory `prefix` itself matched.
    pub fn dir(prefix: impl Into<PathBuf>) -> Self {
        Found::new(prefix, OsString::new())
    }

    pub fn is_dir_match(&self) -> bool {
        self.file_name.is_empty()
    }

    /// Full path of the match. Directory matches keep a trailing `/` when displayed.
    pub fn path(&self) -> PathBuf {
        if self.is_dir_match() {
            self.prefix.clone()
        } else {
            self.prefix.join(&self.file_name)
        }
    }

    pub fn display(&self) -> String {
        let p = self.path();
        if self.is_dir_match() {
            format!("{}/", p.display())
        } else {
            p.display().to_string()
        }
    }
}

fn serialize_lossy_path<S: serde::Serializer>(path: &Path, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&path.to_string_lossy())
}

/// Options for [`Walker`](crate::pipeline::Walker).
#[derive(Clone, Debug, Default)]
pub struct WalkOpts {
    /// Worker pool size. When None, derived from core count and FD limit. `Some(1)` walks serially.
    pub num_threads: Option<usize>,
    /// Result Stream capacity. When None, [`RESULT_CHANNEL_CAP`](crate::utils::config::RESULT_CHANNEL_CAP).
    pub channel_cap: Option<usize>,
    /// Cancellation signal shared with the caller. When None, the walker makes its own.
    pub cancel: Option<CancelToken>,
}

/// Full options (CLI). Use [`WalkOpts`] for lib.
#[derive(Clone, Debug)]
pub struct Opts {
    pub num_threads: Option<usize>,
    pub channel_cap: usize,
    pub backup_suffix: String,
    /// Column width for short listings.
    pub width: usize,
    /// Verbose logging and progress counter.
    pub verbose: bool,
}

impl Default for Opts {
    fn default() -> Self {
        use crate::utils::config::{BACKUP_SUFFIX, DEFAULT_LIST_WIDTH, RESULT_CHANNEL_CAP};
        Opts {
            num_threads: None,
            channel_cap: RESULT_CHANNEL_CAP,
            backup_suffix: BACKUP_SUFFIX.to_string(),
            width: DEFAULT_LIST_WIDTH,
            verbose: false,
        }
    }
}

impl Opts {
    pub fn walk_opts(&self, cancel: &CancelToken) -> WalkOpts {
        WalkOpts {
            num_threads: self.num_threads,
            channel_cap: Some(self.channel_cap),
            cancel: Some(cancel.clone()),
        }
    }
}

/// Base name used when matching a directory path (falls back to the whole path for `/` or `.`).
pub fn dir_name(path: &Path) -> OsString {
    path.file_name()
        .unwrap_or_else(|| path.as_os_str())
        .to_os_string()
}

/// `name` with `suffix` removed, without a lossy UTF-8 round trip.
pub fn strip_os_suffix<'a>(name: &'a OsStr, suffix: &str) -> Option<&'a OsStr> {
    let bytes = name.as_encoded_bytes().strip_suffix(suffix.as_bytes())?;
    // SAFETY: `suffix` is valid UTF-8, so the cut falls on a boundary of the encoding.
    Some(unsafe { OsStr::from_encoded_bytes_unchecked(bytes) })
}

/// `path` with its first `old` prefix (plain string prefix, not components) replaced by `new`.
pub fn replace_path_prefix(path: &Path, old: &str, new: &str) -> Option<PathBuf> {
    let rest = path.as_os_str().as_encoded_bytes().strip_prefix(old.as_bytes())?;
    // SAFETY: `old` is valid UTF-8, so the cut falls on a boundary of the encoding.
    let rest = unsafe { OsStr::from_encoded_bytes_unchecked(rest) };
    let mut out = OsString::from(new);
    out.push(rest);
    Some(PathBuf::from(out))
}
