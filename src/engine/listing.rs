//! `walk ls`: per-directory listings, each written as one block.

use anyhow::Result;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::engine::format::{ColumnFormatter, format_long};
use crate::engine::tools::is_hidden;
use crate::pipeline::{ErrorAggregator, OutputSink};
use crate::types::Entry;
use crate::visitor::{Step, Visitor};

#[derive(Clone, Debug)]
pub struct ListOpts {
    pub recurse: bool,
    /// Only count; print nothing per directory.
    pub count_only: bool,
    pub long: bool,
    /// Include dot-files (and descend into dot-directories).
    pub all: bool,
    pub width: usize,
}

pub struct ListVisitor {
    opts: ListOpts,
    out: OutputSink,
    entries: AtomicU64,
    dirs: AtomicU64,
}

impl ListVisitor {
    pub fn new(opts: ListOpts, out: OutputSink) -> Self {
        ListVisitor {
            opts,
            out,
            entries: AtomicU64::new(0),
            dirs: AtomicU64::new(0),
        }
    }

    /// `(entries, directories)` seen so far.
    pub fn totals(&self) -> (u64, u64) {
        (
            self.entries.load(Ordering::Relaxed),
            self.dirs.load(Ordering::Relaxed),
        )
    }
}

impl Visitor for ListVisitor {
    type State = ColumnFormatter;

    fn new_state(&self) -> Self::State {
        ColumnFormatter::new(self.opts.width)
    }

    fn prefix(&self, _: &mut ColumnFormatter, _: &Path, info: Result<&Entry, &anyhow::Error>) -> Result<Step> {
        Ok(if info.is_ok() { Step::Descend } else { Step::Skip })
    }

    fn contents(
        &self,
        cols: &mut ColumnFormatter,
        _: &Path,
        entries: Vec<Entry>,
        _: &ErrorAggregator,
    ) -> Result<Vec<Entry>> {
        self.entries
            .fetch_add(entries.len() as u64, Ordering::Relaxed);
        let mut children = Vec::new();
        for entry in entries {
            let hidden = !self.opts.all && is_hidden(&entry.name);
            let suffix = if entry.is_dir() {
                self.dirs.fetch_add(1, Ordering::Relaxed);
                "/"
            } else if entry.is_symlink() {
                "@"
            } else {
                ""
            };
            if hidden || self.opts.count_only {
                if entry.is_dir() && self.opts.recurse && !hidden {
                    children.push(entry);
                }
                continue;
            }
            if self.opts.long {
                cols.push_line(&format_long(&entry));
            } else {
                cols.append(&format!("{}{}", entry.name, suffix));
            }
            if entry.is_dir() && self.opts.recurse {
                children.push(entry);
            }
        }
        Ok(children)
    }

    fn done(&self, cols: ColumnFormatter, dir: &Path, err: Option<&anyhow::Error>) -> Result<()> {
        if self.opts.count_only || err.is_some() {
            return Ok(());
        }
        let body = cols.finish();
        let block = if body.is_empty() {
            format!("{}\n\n", dir.display())
        } else {
            format!("{}\n{}\n\n", dir.display(), body)
        };
        self.out.write_block(block);
        Ok(())
    }
}
