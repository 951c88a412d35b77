//! In-memory filesystem for walker tests: fault injection and slow reads.
#![allow(dead_code)]

use std::collections::{BTreeMap, HashSet};
use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use syncwalk::{Entry, FileKind, FileSystem};

#[derive(Default)]
pub struct MemFs {
    nodes: BTreeMap<PathBuf, FileKind>,
    unreadable: HashSet<PathBuf>,
    bad_lstat: HashSet<PathBuf>,
    read_delay: Option<Duration>,
    pub reads: AtomicUsize,
}

impl MemFs {
    pub fn new() -> Self {
        Self::default()
    }

    fn insert(mut self, path: &str, kind: FileKind) -> Self {
        let path = PathBuf::from(path);
        for anc in path.ancestors().skip(1) {
            if anc.as_os_str().is_empty() {
                break;
            }
            self.nodes.entry(anc.to_path_buf()).or_insert(FileKind::Dir);
        }
        self.nodes.insert(path, kind);
        self
    }

    pub fn dir(self, path: &str) -> Self {
        self.insert(path, FileKind::Dir)
    }

    pub fn file(self, path: &str) -> Self {
        self.insert(path, FileKind::File)
    }

    pub fn symlink(self, path: &str) -> Self {
        self.insert(path, FileKind::Symlink)
    }

    /// `read_dir` on `path` fails with permission denied.
    pub fn unreadable(mut self, path: &str) -> Self {
        self.unreadable.insert(PathBuf::from(path));
        self
    }

    /// `lstat` on `path` fails.
    pub fn bad_lstat(mut self, path: &str) -> Self {
        self.bad_lstat.insert(PathBuf::from(path));
        self
    }

    pub fn read_delay(mut self, d: Duration) -> Self {
        self.read_delay = Some(d);
        self
    }

    /// `root/d{i}/f{j}` for a regular tree.
    pub fn tree(mut self, root: &str, dirs: usize, files: usize) -> Self {
        for i in 0..dirs {
            for j in 0..files {
                self = self.file(&format!("{root}/d{i}/f{j}"));
            }
        }
        self
    }

    fn entry(&self, path: &Path) -> io::Result<Entry> {
        let kind = self
            .nodes
            .get(path)
            .copied()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "no such file or directory"))?;
        let name = path.file_name().unwrap_or(path.as_os_str());
        let size = if kind == FileKind::File { 10 } else { 0 };
        Ok(Entry::new(name, kind, size, 0))
    }
}

impl FileSystem for MemFs {
    fn stat(&self, path: &Path) -> io::Result<Entry> {
        self.entry(path)
    }

    fn lstat(&self, path: &Path) -> io::Result<Entry> {
        if self.bad_lstat.contains(path) {
            return Err(io::Error::other("injected lstat failure"));
        }
        self.entry(path)
    }

    fn read_dir(&self, path: &Path) -> io::Result<Vec<OsString>> {
        self.reads.fetch_add(1, Ordering::Relaxed);
        if let Some(d) = self.read_delay {
            std::thread::sleep(d);
        }
        if self.unreadable.contains(path) {
            return Err(io::Error::new(io::ErrorKind::PermissionDenied, "permission denied"));
        }
        if self.nodes.get(path) != Some(&FileKind::Dir) {
            return Err(io::Error::other("not a directory"));
        }
        Ok(self
            .nodes
            .keys()
            .filter(|p| p.parent() == Some(path))
            .filter_map(|p| p.file_name().map(|n| n.to_os_string()))
            .collect())
    }
}
