//! Dropbox conflicted copies: find them, and optionally compare each with its original.

use anyhow::{Context, Result};
use regex::Regex;
use std::ffi::OsStr;
use std::fmt::Write as _;
use std::path::PathBuf;

use crate::fs::FileSystem;
use crate::engine::hashing::same_contents;
use crate::matcher::{MatchError, MatchExpr};
use crate::pipeline::FindOpts;
use crate::types::Found;
use crate::utils::config::CONFLICT_PATTERN;

/// Find filters selecting conflicted copies (files and directories).
pub fn conflict_find_opts() -> Result<FindOpts, MatchError> {
    Ok(FindOpts {
        prefix: MatchExpr::parse(&[CONFLICT_PATTERN])?,
        file: MatchExpr::empty(),
        prune: false,
    })
}

/// Derives original names from conflicted-copy names.
#[derive(Clone, Debug)]
pub struct ConflictNames {
    re: Regex,
}

impl ConflictNames {
    pub fn new() -> Result<Self, MatchError> {
        let pattern = format!("(.*) {}(.*)", CONFLICT_PATTERN);
        let re = Regex::new(&pattern).map_err(|source| MatchError::InvalidRegex { pattern, source })?;
        Ok(ConflictNames { re })
    }

    /// `a (Jane's conflicted copy 2021-05-01).txt` → `a.txt`.
    pub fn original_name(&self, name: &str) -> String {
        self.re.replace_all(name, "$1$2").into_owned()
    }
}

/// Outcome of comparing a conflicted copy with its original.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConflictReport {
    pub prefix: PathBuf,
    pub conflict: String,
    pub original: String,
    pub conflict_newer: bool,
    pub differ: bool,
}

impl ConflictReport {
    pub fn render(&self) -> String {
        let mut s = format!("{}\n", self.prefix.display());
        if self.differ {
            let cmp = if self.conflict_newer { ">" } else { "<=" };
            let _ = writeln!(
                s,
                "files differ, mod times: {:?} {} {:?}",
                self.conflict, cmp, self.original
            );
        }
        s
    }
}

/// Compare the conflicted file in `found` with its original: newer mtime, then size, then blake3.
pub fn compare<F: FileSystem + ?Sized>(fs: &F, names: &ConflictNames, found: &Found) -> Result<ConflictReport> {
    let original = names.original_name(&found.name);
    let cpath = fs.join(&found.prefix, &found.file_name);
    let opath = fs.join(&found.prefix, OsStr::new(&original));
    let ci = fs
        .lstat(&cpath)
        .with_context(|| format!("lstat {}", cpath.display()))?;
    let oi = fs
        .lstat(&opath)
        .with_context(|| format!("lstat {}", opath.display()))?;
    let differ = !same_contents(&cpath, ci.size, &opath, oi.size)?;
    Ok(ConflictReport {
        prefix: found.prefix.clone(),
        conflict: found.name.clone(),
        original,
        conflict_newer: ci.mtime_ns > oi.mtime_ns,
        differ,
    })
}
