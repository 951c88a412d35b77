//! Read-only filesystem accessors the walker is generic over.
//!
//! Every call may fail on its own; nothing is cached. [`LocalFs`] is the
//! `std::fs` backed implementation; tests plug in an in-memory tree.

use std::ffi::{OsStr, OsString};
use std::io;
use std::path::{Path, PathBuf};

use crate::types::{Entry, dir_name};

pub trait FileSystem: Send + Sync {
    /// Metadata for `path`, following symlinks.
    fn stat(&self, path: &Path) -> io::Result<Entry>;

    /// Metadata for `path` without following a final symlink.
    fn lstat(&self, path: &Path) -> io::Result<Entry>;

    /// Child names of `path`, exactly as stored. Order is not significant.
    fn read_dir(&self, path: &Path) -> io::Result<Vec<OsString>>;

    fn join(&self, dir: &Path, name: &OsStr) -> PathBuf {
        dir.join(name)
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct LocalFs;

impl LocalFs {
    pub fn new() -> Self {
        LocalFs
    }
}

impl FileSystem for LocalFs {
    fn stat(&self, path: &Path) -> io::Result<Entry> {
        let meta = std::fs::metadata(path)?;
        Ok(Entry::from_metadata(dir_name(path), &meta))
    }

    fn lstat(&self, path: &Path) -> io::Result<Entry> {
        let meta = std::fs::symlink_metadata(path)?;
        Ok(Entry::from_metadata(dir_name(path), &meta))
    }

    fn read_dir(&self, path: &Path) -> io::Result<Vec<OsString>> {
        std::fs::read_dir(path)?
            .map(|res| res.map(|d| d.file_name()))
            .collect()
    }
}

impl<F: FileSystem + ?Sized> FileSystem for std::sync::Arc<F> {
    fn stat(&self, path: &Path) -> io::Result<Entry> {
        (**self).stat(path)
    }

    fn lstat(&self, path: &Path) -> io::Result<Entry> {
        (**self).lstat(path)
    }

    fn read_dir(&self, path: &Path) -> io::Result<Vec<OsString>> {
        (**self).read_dir(path)
    }

    fn join(&self, dir: &Path, name: &OsStr) -> PathBuf {
        (**self).join(dir, name)
    }
}
