//! Symlink visitors: rewrite, verify, and restore or delete the backups a rewrite leaves.
//!
//! All four share [`SymlinkVisitor`]: every symlink found is handed to a [`LinkHandler`],
//! report lines are buffered per directory and written as one block when the directory is done.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use crate::engine::tools::{backup_path, create_symlink, strip_backup_suffix};
use crate::pipeline::{ErrorAggregator, OutputSink};
use crate::types::{Entry, replace_path_prefix};
use crate::visitor::{Step, Visitor};

/// Domain action for one symlink. Returns the line to report, if any.
pub trait LinkHandler: Send + Sync {
    fn handle(&self, path: &Path, info: &Entry) -> Result<Option<String>>;
}

pub struct SymlinkVisitor<H> {
    handler: H,
    out: OutputSink,
}

impl<H: LinkHandler> SymlinkVisitor<H> {
    pub fn new(handler: H, out: OutputSink) -> Self {
        SymlinkVisitor { handler, out }
    }

    pub fn handler(&self) -> &H {
        &self.handler
    }
}

impl<H: LinkHandler> Visitor for SymlinkVisitor<H> {
    /// Report lines for this directory.
    type State = Vec<String>;

    fn new_state(&self) -> Self::State {
        Vec::new()
    }

    fn prefix(&self, _: &mut Vec<String>, _: &Path, info: Result<&Entry, &anyhow::Error>) -> Result<Step> {
        Ok(if info.is_ok() { Step::Descend } else { Step::Skip })
    }

    fn contents(
        &self,
        lines: &mut Vec<String>,
        dir: &Path,
        entries: Vec<Entry>,
        errors: &ErrorAggregator,
    ) -> Result<Vec<Entry>> {
        let mut children = Vec::with_capacity(entries.len());
        for entry in entries {
            if entry.is_dir() {
                children.push(entry);
                continue;
            }
            if !entry.is_symlink() {
                continue;
            }
            let path = dir.join(&entry.file_name);
            match self.handler.handle(&path, &entry) {
                Ok(Some(line)) => lines.push(line),
                Ok(None) => {}
                Err(e) => errors.append(e),
            }
        }
        Ok(children)
    }

    fn done(&self, lines: Vec<String>, _: &Path, _: Option<&anyhow::Error>) -> Result<()> {
        if !lines.is_empty() {
            self.out.write_block(lines.join("\n"));
        }
        Ok(())
    }
}

fn read_link(path: &Path) -> Result<PathBuf> {
    std::fs::read_link(path).with_context(|| format!("readlink {}", path.display()))
}

/// Re-point links whose target starts with `old_root` at `new_root`, keeping the old link as a backup.
#[derive(Clone, Debug)]
pub struct Rewriter {
    pub old_root: String,
    pub new_root: String,
    pub backup_suffix: String,
}

impl LinkHandler for Rewriter {
    fn handle(&self, path: &Path, _: &Entry) -> Result<Option<String>> {
        if strip_backup_suffix(path, &self.backup_suffix).is_some() {
            return Ok(None);
        }
        let target = read_link(path)?;
        let Some(moved) = replace_path_prefix(&target, &self.old_root, &self.new_root) else {
            return Ok(None);
        };
        let backup = backup_path(path, &self.backup_suffix);
        std::fs::rename(path, &backup)
            .with_context(|| format!("rename {} to {}", path.display(), backup.display()))?;
        create_symlink(&moved, path)
            .with_context(|| format!("symlink {} -> {}", path.display(), moved.display()))?;
        Ok(Some(format!(
            "replacing {} with {}",
            target.display(),
            moved.display()
        )))
    }
}

/// Flag absolute links that point outside `new_root`.
#[derive(Clone, Debug)]
pub struct Verifier {
    pub old_root: String,
    pub new_root: String,
    pub backup_suffix: String,
    /// Also report links that are fine.
    pub show_all: bool,
}

impl LinkHandler for Verifier {
    fn handle(&self, path: &Path, _: &Entry) -> Result<Option<String>> {
        if strip_backup_suffix(path, &self.backup_suffix).is_some() {
            return Ok(None);
        }
        let target = read_link(path)?;
        let under = |root: &str| replace_path_prefix(&target, root, "").is_some();
        if target.is_absolute() && !under(&self.new_root) {
            let note = if !self.old_root.is_empty() && under(&self.old_root) {
                " (still under old root)"
            } else {
                ""
            };
            return Ok(Some(format!("\u{274c}  {}{}", path.display(), note)));
        }
        Ok(self
            .show_all
            .then(|| format!("\u{2705}  {}", path.display())))
    }
}

/// Move `<link><suffix>` back to `<link>`.
#[derive(Clone, Debug)]
pub struct BackupRestore {
    pub backup_suffix: String,
}

impl LinkHandler for BackupRestore {
    fn handle(&self, path: &Path, _: &Entry) -> Result<Option<String>> {
        let Some(restored) = strip_backup_suffix(path, &self.backup_suffix) else {
            return Ok(None);
        };
        std::fs::rename(path, &restored)
            .with_context(|| format!("restore {} to {}", path.display(), restored.display()))?;
        Ok(Some(format!(
            "restoring {} to {}",
            path.display(),
            restored.display()
        )))
    }
}

/// Remove `<link><suffix>` backups.
#[derive(Clone, Debug)]
pub struct BackupDelete {
    pub backup_suffix: String,
}

impl LinkHandler for BackupDelete {
    fn handle(&self, path: &Path, _: &Entry) -> Result<Option<String>> {
        if strip_backup_suffix(path, &self.backup_suffix).is_none() {
            return Ok(None);
        }
        std::fs::remove_file(path).with_context(|| format!("delete {}", path.display()))?;
        Ok(Some(format!("deleting {}", path.display())))
    }
}
